//! Pure sync state machine.
//!
//! ```text
//!            request_render / request_brightness
//!                        │
//!   ┌────────────────────▼───────────────────┐
//!   │ Idle ──> Rendering ──> Encoding ──> Uploading ──┐
//!   │  ▲                                              │
//!   │  └──────── success / failure (last_error) ──────┘
//!   └─ triggers while busy replace `pending` (latest wins)
//! ```
//!
//! The machine never touches the network or the clock. The engine feeds it
//! triggers and outcomes and asks [`SyncState::next_job`] what to do when it
//! is idle. Every render trigger bumps the generation; only the newest
//! pending render survives.

use std::time::Duration;

use tokio::time::Instant;

// =============================================================================
// Indicators
// =============================================================================

/// Where the engine is in the render/upload sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Rendering,
    Encoding,
    Uploading,
}

impl Phase {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Rendering => "rendering",
            Self::Encoding => "encoding",
            Self::Uploading => "uploading",
        }
    }
}

/// Device reachability as seen by the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Connectivity {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl Connectivity {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}

/// What asked for a render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Refresh,
    Cycle,
    Manual,
    ScreenChange,
    EntityChange,
    ConfigChange,
}

/// Newest requested render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRender {
    pub trigger: Trigger,
    pub generation: u64,
}

/// Work the engine should start next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Job {
    Render { generation: u64, screen: usize, trigger: Trigger },
    Brightness(u8),
}

// =============================================================================
// State
// =============================================================================

#[derive(Clone, Debug)]
pub struct SyncState {
    phase: Phase,
    connectivity: Connectivity,
    active_screen: usize,
    screen_count: usize,
    generation: u64,
    last_successful_generation: Option<u64>,
    consecutive_failures: u32,
    failure_threshold: u32,
    last_error: Option<String>,
    brightness: Option<u8>,
    pending: Option<PendingRender>,
    pending_brightness: Option<u8>,
    debounce_deadline: Option<Instant>,
}

impl SyncState {
    pub fn new(
        screen_count: usize,
        failure_threshold: u32,
    ) -> Self {
        Self {
            phase: Phase::Idle,
            connectivity: Connectivity::Unknown,
            active_screen: 0,
            screen_count,
            generation: 0,
            last_successful_generation: None,
            consecutive_failures: 0,
            failure_threshold: failure_threshold.max(1),
            last_error: None,
            brightness: None,
            pending: None,
            pending_brightness: None,
            debounce_deadline: None,
        }
    }

    pub fn phase(&self) -> Phase { self.phase }

    pub fn is_idle(&self) -> bool { self.phase == Phase::Idle }

    pub fn connectivity(&self) -> Connectivity { self.connectivity }

    pub fn active_screen(&self) -> usize { self.active_screen }

    pub fn screen_count(&self) -> usize { self.screen_count }

    pub fn generation(&self) -> u64 { self.generation }

    pub fn last_successful_generation(&self) -> Option<u64> { self.last_successful_generation }

    pub fn consecutive_failures(&self) -> u32 { self.consecutive_failures }

    pub fn last_error(&self) -> Option<&str> { self.last_error.as_deref() }

    /// Last brightness the device accepted.
    pub fn brightness(&self) -> Option<u8> { self.brightness }

    pub fn pending(&self) -> Option<PendingRender> { self.pending }

    pub fn debounce_deadline(&self) -> Option<Instant> { self.debounce_deadline }

    // -------------------------------------------------------------------------
    // Triggers
    // -------------------------------------------------------------------------

    /// Record a render request; replaces any pending one. Returns its generation.
    pub fn request_render(
        &mut self,
        trigger: Trigger,
    ) -> u64 {
        self.generation += 1;
        self.pending = Some(PendingRender { trigger, generation: self.generation });
        self.generation
    }

    /// Refresh timer: renders and absorbs an armed entity debounce.
    pub fn refresh_tick(&mut self) -> u64 {
        self.debounce_deadline = None;
        self.request_render(Trigger::Refresh)
    }

    /// Cycle timer: advance one screen, then render.
    pub fn cycle_tick(&mut self) -> u64 {
        self.active_screen = self.wrap(self.active_screen + 1);
        self.request_render(Trigger::Cycle)
    }

    pub fn next_screen(&mut self) -> u64 {
        self.active_screen = self.wrap(self.active_screen + 1);
        self.request_render(Trigger::ScreenChange)
    }

    pub fn previous_screen(&mut self) -> u64 {
        let count = self.screen_count.max(1);
        self.active_screen = (self.active_screen + count - 1) % count;
        self.request_render(Trigger::ScreenChange)
    }

    /// Jump to `index`, wrapping around the screen count.
    pub fn select_screen(
        &mut self,
        index: usize,
    ) -> u64 {
        self.active_screen = self.wrap(index);
        self.request_render(Trigger::ScreenChange)
    }

    /// New screen count after a configuration change; keeps the active index
    /// in range and renders.
    pub fn set_screen_count(
        &mut self,
        count: usize,
    ) -> u64 {
        self.screen_count = count;
        self.active_screen = self.wrap(self.active_screen);
        self.request_render(Trigger::ConfigChange)
    }

    /// Arm the entity debounce unless one is already armed. Returns whether
    /// this call armed it.
    pub fn entity_changed(
        &mut self,
        now: Instant,
        debounce: Duration,
    ) -> bool {
        if self.debounce_deadline.is_some() {
            return false;
        }
        self.debounce_deadline = Some(now + debounce);
        true
    }

    /// Debounce deadline reached.
    pub fn debounce_fired(&mut self) -> Option<u64> {
        self.debounce_deadline.take().map(|_| self.request_render(Trigger::EntityChange))
    }

    /// Keep only the newest brightness request.
    pub fn request_brightness(
        &mut self,
        value: u8,
    ) {
        self.pending_brightness = Some(value);
    }

    fn wrap(
        &self,
        index: usize,
    ) -> usize {
        index % self.screen_count.max(1)
    }

    // -------------------------------------------------------------------------
    // Sequence
    // -------------------------------------------------------------------------

    /// Take the next job when idle. Brightness goes before renders.
    pub fn next_job(&mut self) -> Option<Job> {
        if !self.is_idle() {
            return None;
        }
        if let Some(value) = self.pending_brightness.take() {
            self.phase = Phase::Uploading;
            return Some(Job::Brightness(value));
        }
        let pending = self.pending.take()?;
        self.phase = Phase::Rendering;
        Some(Job::Render { generation: pending.generation, screen: self.active_screen, trigger: pending.trigger })
    }

    pub fn begin_encoding(&mut self) { self.phase = Phase::Encoding; }

    pub fn begin_upload(&mut self) { self.phase = Phase::Uploading; }

    /// Upload of `generation` succeeded. Returns the previous connectivity
    /// when it changed.
    pub fn upload_succeeded(
        &mut self,
        generation: u64,
    ) -> Option<Connectivity> {
        self.last_successful_generation = Some(self.last_successful_generation.map_or(generation, |g| g.max(generation)));
        self.device_answered()
    }

    pub fn brightness_succeeded(
        &mut self,
        value: u8,
    ) -> Option<Connectivity> {
        self.brightness = Some(value);
        self.device_answered()
    }

    fn device_answered(&mut self) -> Option<Connectivity> {
        self.phase = Phase::Idle;
        self.consecutive_failures = 0;
        self.last_error = None;
        self.set_connectivity(Connectivity::Connected)
    }

    /// A device call failed or timed out. Returns the previous connectivity
    /// when it changed.
    pub fn transport_failed(
        &mut self,
        error: String,
    ) -> Option<Connectivity> {
        self.phase = Phase::Idle;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error);
        if self.consecutive_failures >= self.failure_threshold {
            self.set_connectivity(Connectivity::Disconnected)
        } else {
            None
        }
    }

    /// Composition or encoding failed; connectivity is untouched.
    pub fn render_failed(
        &mut self,
        error: String,
    ) {
        self.phase = Phase::Idle;
        self.last_error = Some(error);
    }

    /// Drop whatever was in flight.
    pub fn abort(&mut self) { self.phase = Phase::Idle; }

    fn set_connectivity(
        &mut self,
        next: Connectivity,
    ) -> Option<Connectivity> {
        let previous = self.connectivity;
        self.connectivity = next;
        (previous != next).then_some(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_job(state: &mut SyncState) -> u64 {
        match state.next_job() {
            Some(Job::Render { generation, .. }) => generation,
            other => panic!("expected render, got {other:?}"),
        }
    }

    #[test]
    fn test_latest_pending_render_wins() {
        let mut state = SyncState::new(2, 3);
        state.request_render(Trigger::Startup);
        assert_eq!(render_job(&mut state), 1);
        state.begin_encoding();
        state.begin_upload();

        // Busy: both triggers collapse into the newest one
        state.refresh_tick();
        state.cycle_tick();
        assert_eq!(state.next_job(), None);
        assert_eq!(state.pending().map(|p| p.generation), Some(3));

        state.upload_succeeded(1);
        assert!(state.is_idle());
        assert_eq!(state.next_job(), Some(Job::Render { generation: 3, screen: 1, trigger: Trigger::Cycle }));
        assert_eq!(state.next_job(), None);
    }

    #[test]
    fn test_failures_flip_connectivity_and_recover() {
        let mut state = SyncState::new(1, 3);
        assert_eq!(state.transport_failed("refused".into()), None);
        assert_eq!(state.transport_failed("refused".into()), None);
        assert_eq!(state.connectivity(), Connectivity::Unknown);
        assert_eq!(state.transport_failed("refused".into()), Some(Connectivity::Unknown));
        assert_eq!(state.connectivity(), Connectivity::Disconnected);
        assert_eq!(state.consecutive_failures(), 3);
        assert_eq!(state.last_error(), Some("refused"));

        assert_eq!(state.upload_succeeded(4), Some(Connectivity::Disconnected));
        assert_eq!(state.connectivity(), Connectivity::Connected);
        assert_eq!(state.consecutive_failures(), 0);
        assert_eq!(state.last_error(), None);
        assert_eq!(state.last_successful_generation(), Some(4));
    }

    #[test]
    fn test_render_failure_keeps_connectivity() {
        let mut state = SyncState::new(1, 3);
        state.upload_succeeded(1);
        state.render_failed("unknown layout".into());
        assert_eq!(state.connectivity(), Connectivity::Connected);
        assert_eq!(state.consecutive_failures(), 0);
        assert_eq!(state.last_error(), Some("unknown layout"));
        assert!(state.is_idle());
    }

    #[test]
    fn test_screen_navigation_wraps() {
        let mut state = SyncState::new(3, 3);
        state.previous_screen();
        assert_eq!(state.active_screen(), 2);
        state.next_screen();
        assert_eq!(state.active_screen(), 0);
        state.select_screen(7);
        assert_eq!(state.active_screen(), 1);
        state.set_screen_count(1);
        assert_eq!(state.active_screen(), 0);
        state.set_screen_count(0);
        state.next_screen();
        assert_eq!(state.active_screen(), 0);
    }

    #[test]
    fn test_entity_debounce_coalesces_with_refresh() {
        let mut state = SyncState::new(1, 3);
        let now = Instant::now();
        assert!(state.entity_changed(now, Duration::from_secs(2)));
        assert!(!state.entity_changed(now, Duration::from_secs(2)));
        assert_eq!(state.debounce_deadline(), Some(now + Duration::from_secs(2)));

        state.refresh_tick();
        assert_eq!(state.debounce_deadline(), None);
        assert_eq!(state.debounce_fired(), None);
        assert_eq!(state.generation(), 1);

        state.entity_changed(now, Duration::from_secs(2));
        assert_eq!(state.debounce_fired(), Some(2));
        assert_eq!(state.pending().map(|p| p.trigger), Some(Trigger::EntityChange));
    }

    #[test]
    fn test_brightness_runs_before_render() {
        let mut state = SyncState::new(1, 3);
        state.request_render(Trigger::Manual);
        state.request_brightness(30);
        state.request_brightness(60);
        assert_eq!(state.next_job(), Some(Job::Brightness(60)));
        assert_eq!(state.phase(), Phase::Uploading);
        state.brightness_succeeded(60);
        assert_eq!(state.brightness(), Some(60));
        assert_eq!(render_job(&mut state), 1);
    }
}
