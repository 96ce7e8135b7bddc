//! Drawing primitives shared across widgets.
//!
//! All primitives are generic over `DrawTarget<Color = Rgb565>` for platform independence.

mod primitives;

pub use primitives::{draw_bar, draw_panel, draw_sparkline, draw_timeline, fill_width, series_range};
