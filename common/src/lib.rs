//! Common types and constants for the SmallTV dashboard.
//!
//! This crate contains the platform-agnostic pieces of the renderer:
//!
//! - [`colors`]: RGB565 palette and contrast helpers
//! - [`styles`]: Font tiers and pre-computed text styles
//! - [`layout`]: Slot geometry for every supported layout
//! - [`variant`]: Widget size variants and breakpoint tables
//! - [`widgets`]: Drawing primitives generic over `DrawTarget<Color = Rgb565>`
//!
//! # no_std Compatibility
//!
//! This crate is `no_std` compatible. It performs no allocation and no I/O,
//! so layout and drawing can be unit tested on the host without a canvas
//! implementation.

#![no_std]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod colors;
pub mod layout;
pub mod styles;
pub mod variant;
pub mod widgets;

// Re-export commonly used items
pub use colors::*;
pub use layout::{LayoutOptions, LayoutType, Slots, UnknownLayout};
pub use styles::FontTier;
pub use variant::{CellSpan, SizeTable, SizeVariant};
