// Crate-level lints: pixel math casts between u32, i32 and f32 are deliberate
#![allow(clippy::cast_possible_truncation)] // f32->i32, u32->i32 for pixel math
#![allow(clippy::cast_precision_loss)] // u32/i32/f64->f32 in graphics calculations
#![allow(clippy::cast_possible_wrap)] // u32->i32 within canvas bounds
#![allow(clippy::cast_sign_loss)] // i32->u32 where the sign is known positive
#![allow(clippy::similar_names)]
#![allow(clippy::module_name_repetitions)]

//! Dashboard renderer and sync engine for GeekMagic SmallTV displays.
//!
//! A dashboard is a list of screens. Each screen picks a layout, which
//! partitions the 240×240 canvas into slots, and fills every slot with a
//! widget bound to entities of the host's state provider. The sync engine
//! renders the active screen, encodes it and uploads it to the device over
//! its HTTP API.
//!
//! # Architecture
//!
//! ```text
//! AppConfig ──> DashboardConfig ──watch──┐
//!                                        v
//! StateProvider ──> EntityStateResolver ──> ScreenComposer ──> Frame
//!                                        ^                       │
//!          timers, EngineHandle ──> DeviceSyncEngine <───────────┘
//!                                        │
//!                                        v
//!                              DeviceTransport (HTTP)
//! ```
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | TOML configuration, screens and slots |
//! | [`canvas`] | Rgb565 canvas, slot regions, encoded frames |
//! | [`icons`] | bundled glyph catalog |
//! | [`state`] | entity states, history and snapshots |
//! | [`widgets`] | widget renderers and registry |
//! | [`compose`] | screen to frame |
//! | [`transport`] | device HTTP protocol |
//! | [`sync`] | state machine and engine task |
//! | [`controls`] | host control bounds |
//! | [`samples`] | demo dashboard |
//!
//! Layout geometry, size variants, colors and font tiers live in the
//! `no_std` `smalltv-common` crate.

pub mod canvas;
pub mod compose;
pub mod config;
pub mod controls;
pub mod error;
pub mod icons;
pub mod samples;
pub mod state;
pub mod sync;
pub mod transport;
pub mod widgets;
