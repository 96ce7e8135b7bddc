//! Sync engine driver: timers, host commands and the single device writer.
//!
//! One task owns the [`SyncState`] and runs a `select!` loop over:
//!
//! | Source | Effect |
//! |--------|--------|
//! | shutdown token | drop the in-flight call, go idle, exit |
//! | in-flight device call | record success or failure |
//! | refresh interval | render request, absorbs an armed debounce |
//! | cycle interval | next screen plus render request |
//! | debounce deadline | render request for entity changes |
//! | command channel | [`EngineHandle`] requests |
//! | dashboard watch | new screen count plus render request |
//!
//! The engine holds the dashboard channel's sender, so a screen-count change
//! republishes the resized dashboard to every subscriber and comes back
//! through the same watch as a file reload.
//!
//! Rendering and encoding run inline; device calls are the only suspension
//! points. At most one device call is in flight. Every call is bounded by
//! the profile timeout.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::state::{Connectivity, Job, Phase, SyncState, Trigger};
use crate::canvas::Frame;
use crate::compose::ScreenComposer;
use crate::config::{DashboardConfig, DeviceProfile, SyncSettings};
use crate::controls::clamp_brightness;
use crate::error::{EngineStopped, TransportError, TransportResult};
use crate::state::EntityStateResolver;
use crate::transport::{DeviceTransport, Upload};

// =============================================================================
// Public Types
// =============================================================================

/// Requests from the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Refresh,
    NextScreen,
    PreviousScreen,
    SelectScreen(usize),
    SetBrightness(i64),
    SetRefreshInterval(u32),
    SetCycleInterval(u32),
    SetScreenCount(usize),
    EntityChanged(String),
}

/// Read-only indicators published after every step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub phase: Phase,
    pub connectivity: Connectivity,
    pub active_screen: usize,
    pub active_screen_name: Option<String>,
    pub screen_count: usize,
    pub generation: u64,
    pub last_successful_generation: Option<u64>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub brightness: Option<u8>,
    pub refresh_interval: Duration,
    pub cycle_interval: Option<Duration>,
}

/// Last frame the device accepted, with a PNG copy for host previews.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preview {
    pub frame: Frame,
    pub png: Vec<u8>,
}

/// Control surface of a running engine. Cheap to clone.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SyncStatus>,
    preview: watch::Receiver<Option<Arc<Preview>>>,
    cancel: CancellationToken,
}

impl EngineHandle {
    fn send(
        &self,
        command: Command,
    ) -> Result<(), EngineStopped> {
        self.commands.send(command).map_err(|_| EngineStopped)
    }

    pub fn refresh_now(&self) -> Result<(), EngineStopped> { self.send(Command::Refresh) }

    pub fn next_screen(&self) -> Result<(), EngineStopped> { self.send(Command::NextScreen) }

    pub fn previous_screen(&self) -> Result<(), EngineStopped> { self.send(Command::PreviousScreen) }

    pub fn select_screen(
        &self,
        index: usize,
    ) -> Result<(), EngineStopped> {
        self.send(Command::SelectScreen(index))
    }

    /// Any integer; clamped to 0-100.
    pub fn set_brightness(
        &self,
        value: i64,
    ) -> Result<(), EngineStopped> {
        self.send(Command::SetBrightness(value))
    }

    pub fn set_refresh_interval(
        &self,
        secs: u32,
    ) -> Result<(), EngineStopped> {
        self.send(Command::SetRefreshInterval(secs))
    }

    /// 0 disables cycling.
    pub fn set_cycle_interval(
        &self,
        secs: u32,
    ) -> Result<(), EngineStopped> {
        self.send(Command::SetCycleInterval(secs))
    }

    /// Grow or shrink the dashboard; clamped to 1-10 screens.
    pub fn set_screen_count(
        &self,
        count: usize,
    ) -> Result<(), EngineStopped> {
        self.send(Command::SetScreenCount(count))
    }

    /// Host notification that an entity changed state.
    pub fn notify_entity_changed(
        &self,
        entity_id: &str,
    ) -> Result<(), EngineStopped> {
        self.send(Command::EntityChanged(entity_id.to_string()))
    }

    pub fn status(&self) -> SyncStatus { self.status.borrow().clone() }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> { self.status.clone() }

    pub fn last_preview(&self) -> Option<Arc<Preview>> { self.preview.borrow().clone() }

    /// Stop the engine, abandoning any in-flight device call.
    pub fn shutdown(&self) { self.cancel.cancel() }
}

// =============================================================================
// Engine
// =============================================================================

/// Everything the engine needs; [`DeviceSyncEngine::spawn`] starts it.
pub struct DeviceSyncEngine {
    composer: ScreenComposer,
    resolver: EntityStateResolver,
    transport: Arc<dyn DeviceTransport>,
    profile: DeviceProfile,
    settings: SyncSettings,
    dashboard: watch::Sender<Arc<DashboardConfig>>,
}

impl DeviceSyncEngine {
    pub fn new(
        composer: ScreenComposer,
        resolver: EntityStateResolver,
        transport: Arc<dyn DeviceTransport>,
        profile: DeviceProfile,
        settings: SyncSettings,
        dashboard: watch::Sender<Arc<DashboardConfig>>,
    ) -> Self {
        Self { composer, resolver, transport, profile, settings, dashboard }
    }

    /// Start the engine task on the current runtime.
    pub fn spawn(self) -> (EngineHandle, JoinHandle<()>) { self.spawn_with_token(CancellationToken::new()) }

    /// Start with an external shutdown token.
    pub fn spawn_with_token(
        self,
        cancel: CancellationToken,
    ) -> (EngineHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SyncStatus::default());
        let (preview_tx, preview_rx) = watch::channel(None);
        let handle = EngineHandle { commands: commands_tx, status: status_rx, preview: preview_rx, cancel: cancel.clone() };

        let runner = Runner::new(self, status_tx, preview_tx);
        let task = tokio::spawn(runner.run(commands_rx, cancel));
        (handle, task)
    }
}

// =============================================================================
// Runner
// =============================================================================

enum Outcome {
    Upload { generation: u64, frame: Frame, result: TransportResult<()> },
    Brightness { value: u8, result: TransportResult<()> },
}

type InFlight = Pin<Box<dyn Future<Output = Outcome> + Send>>;

struct Runner {
    engine: DeviceSyncEngine,
    state: SyncState,
    refresh: Interval,
    cycle: Option<Interval>,
    in_flight: Option<InFlight>,
    dashboard: watch::Receiver<Arc<DashboardConfig>>,
    status: watch::Sender<SyncStatus>,
    preview: watch::Sender<Option<Arc<Preview>>>,
}

impl Runner {
    fn new(
        engine: DeviceSyncEngine,
        status: watch::Sender<SyncStatus>,
        preview: watch::Sender<Option<Arc<Preview>>>,
    ) -> Self {
        let mut dashboard = engine.dashboard.subscribe();
        let screen_count = dashboard.borrow_and_update().len();
        let state = SyncState::new(screen_count, engine.settings.failure_threshold());
        let refresh = periodic(engine.settings.refresh_interval());
        let cycle = engine.settings.cycle_interval().map(periodic);
        Self { engine, state, refresh, cycle, in_flight: None, dashboard, status, preview }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        cancel: CancellationToken,
    ) {
        info!(
            host = %self.engine.profile.host,
            screens = self.state.screen_count(),
            refresh = ?self.engine.settings.refresh_interval(),
            "sync engine started"
        );
        if let Some(value) = self.engine.settings.brightness() {
            self.state.request_brightness(value);
        }
        self.state.request_render(Trigger::Startup);

        let mut commands_open = true;
        let mut config_open = true;
        loop {
            if self.in_flight.is_none() {
                self.start_next_job();
            }
            self.publish();

            let debounce = self.state.debounce_deadline();
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                outcome = poll_in_flight(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.finish(outcome);
                }
                _ = self.refresh.tick() => {
                    let generation = self.state.refresh_tick();
                    debug!(generation, "refresh tick");
                }
                () = tick_optional(&mut self.cycle) => {
                    let generation = self.state.cycle_tick();
                    debug!(generation, screen = self.state.active_screen(), "cycle tick");
                }
                () = sleep_optional(debounce) => {
                    if let Some(generation) = self.state.debounce_fired() {
                        debug!(generation, "entity change render");
                    }
                }
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.handle(command),
                    None => commands_open = false,
                },
                changed = self.dashboard.changed(), if config_open => match changed {
                    Ok(()) => self.config_changed(),
                    Err(_) => config_open = false,
                },
            }
        }

        if self.in_flight.take().is_some() {
            debug!("abandoned in-flight device call");
        }
        self.state.abort();
        self.publish();
        info!("sync engine stopped");
    }

    fn handle(
        &mut self,
        command: Command,
    ) {
        match command {
            Command::Refresh => {
                self.state.request_render(Trigger::Manual);
            }
            Command::NextScreen => {
                self.state.next_screen();
            }
            Command::PreviousScreen => {
                self.state.previous_screen();
            }
            Command::SelectScreen(index) => {
                self.state.select_screen(index);
            }
            Command::SetBrightness(value) => self.state.request_brightness(clamp_brightness(value)),
            Command::SetRefreshInterval(secs) => {
                self.engine.settings.refresh_interval = secs;
                let period = self.engine.settings.refresh_interval();
                self.refresh = periodic(period);
                info!(?period, "refresh interval changed");
            }
            Command::SetCycleInterval(secs) => {
                self.engine.settings.cycle_interval = secs;
                let period = self.engine.settings.cycle_interval();
                self.cycle = period.map(periodic);
                info!(?period, "cycle interval changed");
            }
            Command::SetScreenCount(count) => {
                let mut dashboard = DashboardConfig::clone(&self.dashboard.borrow());
                dashboard.resize(count);
                self.engine.dashboard.send_replace(Arc::new(dashboard));
                // Apply now so commands queued behind this one see the new count
                self.config_changed();
            }
            Command::EntityChanged(entity_id) => {
                if self.references(&entity_id)
                    && self.state.entity_changed(Instant::now(), self.engine.settings.debounce())
                {
                    debug!(entity = %entity_id, "entity change debounce armed");
                }
            }
        }
    }

    fn config_changed(&mut self) {
        let count = self.dashboard.borrow_and_update().len();
        let generation = self.state.set_screen_count(count);
        info!(screens = count, generation, "dashboard updated");
    }

    /// Whether the active screen shows `entity_id`.
    fn references(
        &self,
        entity_id: &str,
    ) -> bool {
        let dashboard = self.dashboard.borrow();
        dashboard.screen(self.state.active_screen()).is_some_and(|screen| screen.entity_ids().contains(entity_id))
    }

    // -------------------------------------------------------------------------
    // Jobs
    // -------------------------------------------------------------------------

    fn start_next_job(&mut self) {
        // A render that fails before upload leaves the machine idle, so keep
        // pulling until something is in flight or nothing is left.
        while let Some(job) = self.state.next_job() {
            let op = match job {
                Job::Brightness(value) => Some(self.brightness_op(value)),
                Job::Render { generation, screen, trigger } => self.render_op(generation, screen, trigger),
            };
            if op.is_some() {
                self.in_flight = op;
                return;
            }
        }
    }

    fn render_op(
        &mut self,
        generation: u64,
        screen: usize,
        trigger: Trigger,
    ) -> Option<InFlight> {
        let dashboard = self.dashboard.borrow().clone();
        let now = Local::now().fixed_offset();
        let profile = &self.engine.profile;
        let frame =
            match self.engine.composer.compose_dashboard(&dashboard, screen, profile, &self.engine.resolver, now, generation) {
                Ok(frame) => frame,
                Err(err) => {
                    error!(generation, screen, error = %err, "render failed");
                    self.state.render_failed(err.to_string());
                    return None;
                }
            };

        self.state.begin_encoding();
        let bytes = match frame.encode(profile.format, profile.jpeg_quality()) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(generation, error = %err, "encode failed");
                self.state.render_failed(err.to_string());
                return None;
            }
        };

        self.state.begin_upload();
        debug!(generation, screen = %frame.screen_id, bytes = bytes.len(), ?trigger, "uploading");
        let upload = Upload { filename: profile.filename(), format: profile.format, bytes };
        let transport = Arc::clone(&self.engine.transport);
        let limit = profile.timeout();
        Some(Box::pin(async move {
            let filename = upload.filename.clone();
            let result = with_timeout(limit, async {
                transport.upload(upload).await?;
                transport.show(&filename).await
            })
            .await;
            Outcome::Upload { generation, frame, result }
        }))
    }

    fn brightness_op(
        &mut self,
        value: u8,
    ) -> InFlight {
        let transport = Arc::clone(&self.engine.transport);
        let limit = self.engine.profile.timeout();
        Box::pin(async move {
            let result = with_timeout(limit, transport.set_brightness(value)).await;
            Outcome::Brightness { value, result }
        })
    }

    fn finish(
        &mut self,
        outcome: Outcome,
    ) {
        match outcome {
            Outcome::Upload { generation, frame, result: Ok(()) } => {
                let previous = self.state.upload_succeeded(generation);
                debug!(generation, screen = %frame.screen_id, "frame shown");
                self.log_connectivity(previous);
                match frame.to_png() {
                    Ok(png) => {
                        self.preview.send_replace(Some(Arc::new(Preview { frame, png })));
                    }
                    Err(err) => warn!(generation, error = %err, "preview encoding failed"),
                }
            }
            Outcome::Upload { generation, result: Err(err), .. } => {
                warn!(generation, error = %err, "upload failed");
                let previous = self.state.transport_failed(err.to_string());
                self.log_connectivity(previous);
            }
            Outcome::Brightness { value, result: Ok(()) } => {
                debug!(brightness = value, "brightness applied");
                let previous = self.state.brightness_succeeded(value);
                self.log_connectivity(previous);
            }
            Outcome::Brightness { value, result: Err(err) } => {
                warn!(brightness = value, error = %err, "brightness failed");
                let previous = self.state.transport_failed(err.to_string());
                self.log_connectivity(previous);
            }
        }
    }

    fn log_connectivity(
        &self,
        previous: Option<Connectivity>,
    ) {
        let Some(previous) = previous else {
            return;
        };
        match self.state.connectivity() {
            Connectivity::Connected => info!(from = previous.name(), "device connected"),
            Connectivity::Disconnected => {
                warn!(failures = self.state.consecutive_failures(), "device disconnected");
            }
            Connectivity::Unknown => {}
        }
    }

    fn publish(&self) {
        let dashboard = self.dashboard.borrow();
        let next = SyncStatus {
            phase: self.state.phase(),
            connectivity: self.state.connectivity(),
            active_screen: self.state.active_screen(),
            active_screen_name: dashboard.screen(self.state.active_screen()).map(|s| s.display_name().to_string()),
            screen_count: self.state.screen_count(),
            generation: self.state.generation(),
            last_successful_generation: self.state.last_successful_generation(),
            consecutive_failures: self.state.consecutive_failures(),
            last_error: self.state.last_error().map(str::to_string),
            brightness: self.state.brightness(),
            refresh_interval: self.engine.settings.refresh_interval(),
            cycle_interval: self.engine.settings.cycle_interval(),
        };
        self.status.send_if_modified(|status| {
            if *status == next {
                return false;
            }
            *status = next;
            true
        });
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Interval whose first tick is one period away; missed ticks are skipped.
fn periodic(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn poll_in_flight(op: &mut Option<InFlight>) -> Outcome {
    match op {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

async fn tick_optional(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn sleep_optional(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn with_timeout<T, F>(
    limit: Duration,
    op: F,
) -> TransportResult<T>
where
    F: Future<Output = TransportResult<T>>,
{
    tokio::time::timeout(limit, op).await.unwrap_or_else(|_| Err(TransportError::Timeout(limit)))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use smalltv_common::LayoutType;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::config::{Screen, Slot, WidgetOptions};
    use crate::state::{EntityState, MemoryStateProvider};
    use crate::transport::{DeviceState, StorageInfo};

    // =========================================================================
    // Fake transport
    // =========================================================================

    #[derive(Default)]
    struct FakeTransport {
        uploads: Mutex<Vec<Upload>>,
        brightness: Mutex<Vec<u8>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
        failures_left: AtomicU32,
        gate: Option<Arc<Semaphore>>,
    }

    impl FakeTransport {
        fn gated(gate: Arc<Semaphore>) -> Self { Self { gate: Some(gate), ..Self::default() } }

        fn failing(times: u32) -> Self { Self { failures_left: AtomicU32::new(times), ..Self::default() } }

        fn upload_count(&self) -> usize { self.uploads.lock().unwrap().len() }

        fn max_active(&self) -> usize { self.max_active.load(Ordering::SeqCst) }

        fn fail(&self) -> TransportResult<()> {
            let failing = self.failures_left.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok();
            if failing { Err(TransportError::Connection("connection refused".into())) } else { Ok(()) }
        }
    }

    #[async_trait]
    impl DeviceTransport for FakeTransport {
        async fn upload(
            &self,
            upload: Upload,
        ) -> TransportResult<()> {
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.fail()?;
            self.uploads.lock().unwrap().push(upload);
            Ok(())
        }

        async fn show(
            &self,
            _filename: &str,
        ) -> TransportResult<()> {
            Ok(())
        }

        async fn set_brightness(
            &self,
            value: u8,
        ) -> TransportResult<()> {
            self.brightness.lock().unwrap().push(value);
            Ok(())
        }

        async fn device_state(&self) -> TransportResult<DeviceState> { Ok(DeviceState::default()) }

        async fn storage(&self) -> TransportResult<StorageInfo> { Ok(StorageInfo::default()) }

        async fn clear_images(&self) -> TransportResult<()> { Ok(()) }
    }

    // =========================================================================
    // Harness
    // =========================================================================

    fn screen(id: &str) -> Screen {
        Screen::new(
            id,
            LayoutType::Split,
            vec![
                Slot::new("entity").entity("sensor.power"),
                Slot::new("text").options(WidgetOptions::new().with("text", id)),
            ],
        )
    }

    fn two_screens() -> DashboardConfig { DashboardConfig::new(vec![screen("first"), screen("second")]) }

    fn settings() -> SyncSettings { SyncSettings { refresh_interval: 300, debounce_ms: 20, ..SyncSettings::default() } }

    fn start(
        transport: Arc<FakeTransport>,
        dashboard: DashboardConfig,
        settings: SyncSettings,
    ) -> (EngineHandle, JoinHandle<()>, watch::Sender<Arc<DashboardConfig>>) {
        let provider = MemoryStateProvider::new();
        provider.set_state(EntityState::new("sensor.power", "412").attribute("unit_of_measurement", "W"));
        let (config_tx, _) = watch::channel(Arc::new(dashboard));
        let profile = DeviceProfile { host: "fake".into(), ..DeviceProfile::default() };
        let engine = DeviceSyncEngine::new(
            ScreenComposer::default(),
            EntityStateResolver::new(Arc::new(provider)),
            transport,
            profile,
            settings,
            config_tx.clone(),
        );
        let (handle, task) = engine.spawn();
        (handle, task, config_tx)
    }

    async fn wait_for(
        handle: &EngineHandle,
        predicate: impl FnMut(&SyncStatus) -> bool,
    ) -> SyncStatus {
        let mut rx = handle.subscribe();
        let status = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for status")
            .expect("engine stopped")
            .clone();
        status
    }

    // =========================================================================
    // Tests
    // =========================================================================

    #[tokio::test]
    async fn test_single_upload_in_flight_and_latest_generation_wins() {
        let gate = Arc::new(Semaphore::new(0));
        let transport = Arc::new(FakeTransport::gated(Arc::clone(&gate)));
        let (handle, task, _config) = start(Arc::clone(&transport), two_screens(), settings());

        wait_for(&handle, |s| s.phase == Phase::Uploading && s.generation == 1).await;

        // A manual refresh and a screen change land while generation 1 is uploading
        handle.refresh_now().unwrap();
        handle.next_screen().unwrap();
        let status = wait_for(&handle, |s| s.generation == 3).await;
        assert_eq!(status.phase, Phase::Uploading);
        assert_eq!(status.active_screen, 1);
        assert_eq!(status.active_screen_name.as_deref(), Some("second"));

        gate.add_permits(10);
        let status = wait_for(&handle, |s| s.last_successful_generation == Some(3) && s.phase == Phase::Idle).await;
        assert_eq!(status.connectivity, Connectivity::Connected);
        assert_eq!(transport.upload_count(), 2, "generation 2 was superseded");
        assert_eq!(transport.max_active(), 1);

        let preview = handle.last_preview().unwrap();
        assert_eq!(preview.frame.generation, 3);
        assert_eq!(preview.frame.screen_id, "second");
        assert!(preview.png.starts_with(&[0x89, b'P', b'N', b'G']));

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_failures_disconnect_then_success_reconnects() {
        let transport = Arc::new(FakeTransport::failing(3));
        let (handle, task, _config) = start(Arc::clone(&transport), two_screens(), settings());

        let status = wait_for(&handle, |s| s.consecutive_failures == 1 && s.phase == Phase::Idle).await;
        assert_eq!(status.connectivity, Connectivity::Unknown);
        handle.refresh_now().unwrap();
        wait_for(&handle, |s| s.consecutive_failures == 2 && s.phase == Phase::Idle).await;
        handle.refresh_now().unwrap();
        let status = wait_for(&handle, |s| s.consecutive_failures == 3 && s.phase == Phase::Idle).await;
        assert_eq!(status.connectivity, Connectivity::Disconnected);
        assert!(status.last_error.as_deref().is_some_and(|e| e.contains("refused")));

        handle.refresh_now().unwrap();
        let status = wait_for(&handle, |s| s.connectivity == Connectivity::Connected).await;
        assert_eq!(status.consecutive_failures, 0);
        assert_eq!(status.last_error, None);
        assert_eq!(status.last_successful_generation, Some(4));
        assert_eq!(transport.upload_count(), 1);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_brightness_is_clamped_and_applied() {
        let transport = Arc::new(FakeTransport::default());
        let settings = SyncSettings { brightness: Some(150), ..settings() };
        let (handle, task, _config) = start(Arc::clone(&transport), two_screens(), settings);

        wait_for(&handle, |s| s.brightness == Some(100) && s.last_successful_generation == Some(1)).await;
        handle.set_brightness(-5).unwrap();
        wait_for(&handle, |s| s.brightness == Some(0)).await;
        assert_eq!(*transport.brightness.lock().unwrap(), vec![100, 0]);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_entity_changes_are_debounced_and_filtered() {
        let transport = Arc::new(FakeTransport::default());
        let (handle, task, _config) = start(Arc::clone(&transport), two_screens(), settings());
        wait_for(&handle, |s| s.last_successful_generation == Some(1) && s.phase == Phase::Idle).await;

        handle.notify_entity_changed("sensor.unrelated").unwrap();
        handle.notify_entity_changed("sensor.power").unwrap();
        handle.notify_entity_changed("sensor.power").unwrap();
        wait_for(&handle, |s| s.last_successful_generation == Some(2) && s.phase == Phase::Idle).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.status().generation, 2);
        assert_eq!(transport.upload_count(), 2);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_screen_selection_wraps() {
        let transport = Arc::new(FakeTransport::default());
        let (handle, task, _config) = start(transport, two_screens(), settings());

        handle.previous_screen().unwrap();
        let status = wait_for(&handle, |s| s.active_screen == 1).await;
        assert_eq!(status.screen_count, 2);
        handle.select_screen(4).unwrap();
        wait_for(&handle, |s| s.active_screen == 0 && s.generation == 3).await;

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_screen_count_resizes_and_republishes() {
        let transport = Arc::new(FakeTransport::default());
        let (handle, task, config) = start(transport, two_screens(), settings());
        let mut published = config.subscribe();

        handle.set_screen_count(4).unwrap();
        handle.select_screen(3).unwrap();
        let status = wait_for(&handle, |s| s.screen_count == 4 && s.active_screen == 3).await;
        assert_eq!(status.active_screen_name.as_deref(), Some("Screen 4"));
        assert_eq!(published.borrow_and_update().len(), 4);

        handle.set_screen_count(2).unwrap();
        let status = wait_for(&handle, |s| s.screen_count == 2).await;
        assert!(status.active_screen < 2);
        let ids: Vec<String> = published.borrow_and_update().screens.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, ["first", "second"]);

        handle.set_screen_count(0).unwrap();
        let status = wait_for(&handle, |s| s.screen_count == 1).await;
        assert_eq!(status.active_screen, 0);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_config_error_keeps_engine_alive() {
        let transport = Arc::new(FakeTransport::default());
        let mut broken = screen("broken");
        broken.layout = "mosaic".into();
        let (handle, task, config) = start(Arc::clone(&transport), DashboardConfig::new(vec![broken]), settings());

        let status = wait_for(&handle, |s| s.last_error.is_some() && s.phase == Phase::Idle).await;
        assert_eq!(status.connectivity, Connectivity::Unknown);
        assert_eq!(status.consecutive_failures, 0);
        assert_eq!(transport.upload_count(), 0);

        // Hot reload with a valid dashboard recovers
        config.send_replace(Arc::new(two_screens()));
        let status = wait_for(&handle, |s| s.last_successful_generation.is_some()).await;
        assert_eq!(status.screen_count, 2);
        assert_eq!(status.last_error, None);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_abandons_in_flight_upload() {
        let gate = Arc::new(Semaphore::new(0));
        let transport = Arc::new(FakeTransport::gated(gate));
        let (handle, task, _config) = start(transport, two_screens(), settings());

        wait_for(&handle, |s| s.phase == Phase::Uploading).await;
        handle.shutdown();
        tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert_eq!(handle.status().phase, Phase::Idle);
        assert!(handle.refresh_now().is_err());
    }
}
