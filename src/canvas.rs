//! In-memory canvas, frames and bitmaps.
//!
//! [`Canvas`] is a plain Rgb565 framebuffer implementing `DrawTarget`, so every
//! widget draws with embedded-graphics exactly as it would on a panel driver.
//! Widgets receive a [`Region`] of the canvas: its origin is the slot corner
//! and anything drawn outside the slot is discarded.
//!
//! A finished canvas becomes a [`Frame`]: an immutable RGB888 raster tagged
//! with its screen and generation, encoded to JPEG or PNG only at upload time.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use smalltv_common::colors::{BLACK, from_rgb8, to_rgb8};

use crate::config::UploadFormat;
use crate::error::EncodeError;

// =============================================================================
// Canvas
// =============================================================================

/// Rgb565 framebuffer, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb565>,
}

impl Canvas {
    /// Black canvas of the given size.
    pub fn new(
        width: u32,
        height: u32,
    ) -> Self {
        Self { width, height, pixels: vec![BLACK; (width as usize) * (height as usize)] }
    }

    #[inline]
    fn index(
        &self,
        point: Point,
    ) -> Option<usize> {
        let (x, y) = (u32::try_from(point.x).ok()?, u32::try_from(point.y).ok()?);
        if x < self.width && y < self.height { Some((y * self.width + x) as usize) } else { None }
    }

    pub fn pixel(
        &self,
        point: Point,
    ) -> Option<Rgb565> {
        self.index(point).map(|i| self.pixels[i])
    }

    /// Expand to RGB888, three bytes per pixel.
    pub fn to_rgb888(&self) -> Vec<u8> { self.pixels.iter().flat_map(|p| to_rgb8(*p)).collect() }

    /// Translated, clipped view of `area`.
    pub fn region(
        &mut self,
        area: Rectangle,
    ) -> Region<'_> {
        let area = area.intersection(&self.bounding_box());
        Region { canvas: self, area }
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size { Size::new(self.width, self.height) }
}

impl DrawTarget for Canvas {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(i) = self.index(point) {
                self.pixels[i] = color;
            }
        }
        Ok(())
    }

    fn fill_solid(
        &mut self,
        area: &Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        for y in area.top_left.y..=bottom_right.y {
            let row = (y as u32 * self.width) as usize;
            let start = row + area.top_left.x as usize;
            let end = row + bottom_right.x as usize + 1;
            self.pixels[start..end].fill(color);
        }
        Ok(())
    }

    fn clear(
        &mut self,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        self.pixels.fill(color);
        Ok(())
    }
}

// =============================================================================
// Region
// =============================================================================

/// Slot-local draw target: `(0, 0)` is the slot corner, drawing is clipped to
/// the slot.
#[derive(Debug)]
pub struct Region<'a> {
    canvas: &'a mut Canvas,
    area: Rectangle,
}

impl OriginDimensions for Region<'_> {
    fn size(&self) -> Size { self.area.size }
}

impl DrawTarget for Region<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let area = self.area;
        let offset = area.top_left;
        self.canvas.draw_iter(
            pixels.into_iter().map(|Pixel(p, c)| Pixel(p + offset, c)).filter(|Pixel(p, _)| area.contains(*p)),
        )
    }

    fn fill_solid(
        &mut self,
        area: &Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let translated = Rectangle::new(area.top_left + self.area.top_left, area.size);
        self.canvas.fill_solid(&translated.intersection(&self.area), color)
    }
}

// =============================================================================
// Frame
// =============================================================================

/// One rendered screen, ready for encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub screen_id: String,
    pub generation: u64,
    pub width: u32,
    pub height: u32,
    /// RGB888, row-major.
    pub raster: Vec<u8>,
}

impl Frame {
    pub fn from_canvas(
        canvas: &Canvas,
        screen_id: &str,
        generation: u64,
    ) -> Self {
        let size = canvas.size();
        Self {
            screen_id: screen_id.to_string(),
            generation,
            width: size.width,
            height: size.height,
            raster: canvas.to_rgb888(),
        }
    }

    /// Encode for upload. `quality` applies to JPEG only.
    pub fn encode(
        &self,
        format: UploadFormat,
        quality: u8,
    ) -> Result<Vec<u8>, EncodeError> {
        let expected = (self.width as usize) * (self.height as usize) * 3;
        if self.raster.len() != expected || expected == 0 {
            return Err(EncodeError::RasterSize { width: self.width, height: self.height, len: self.raster.len() });
        }

        let mut out = Vec::new();
        match format {
            UploadFormat::Jpeg => JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).write_image(
                &self.raster,
                self.width,
                self.height,
                ExtendedColorType::Rgb8,
            )?,
            UploadFormat::Png => {
                PngEncoder::new(&mut out).write_image(&self.raster, self.width, self.height, ExtendedColorType::Rgb8)?;
            }
        }
        Ok(out)
    }

    /// Lossless PNG, used for previews.
    pub fn to_png(&self) -> Result<Vec<u8>, EncodeError> { self.encode(UploadFormat::Png, 100) }
}

// =============================================================================
// Bitmap
// =============================================================================

/// Decoded raster image, such as media artwork.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<Rgb565>,
}

impl Bitmap {
    /// Decode a JPEG or PNG payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, EncodeError> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let pixels = rgb.pixels().map(|p| from_rgb8(p[0], p[1], p[2])).collect();
        Ok(Self { width: rgb.width(), height: rgb.height(), pixels })
    }

    /// Build from raw pixels. Returns `None` when the length does not match.
    pub fn from_pixels(
        width: u32,
        height: u32,
        pixels: Vec<Rgb565>,
    ) -> Option<Self> {
        ((width as usize) * (height as usize) == pixels.len()).then_some(Self { width, height, pixels })
    }

    pub fn size(&self) -> Size { Size::new(self.width, self.height) }

    /// Draw scaled to cover `area` (nearest neighbour, aspect ratio kept,
    /// centered crop).
    pub fn draw_cover<D>(
        &self,
        target: &mut D,
        area: Rectangle,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        if self.width == 0 || self.height == 0 || area.size.width == 0 || area.size.height == 0 {
            return;
        }
        let (aw, ah) = (u64::from(area.size.width), u64::from(area.size.height));
        let (bw, bh) = (u64::from(self.width), u64::from(self.height));
        // Source window with the same aspect ratio as the area
        let (src_w, src_h) = if bw * ah > bh * aw { (bh * aw / ah, bh) } else { (bw, bw * ah / aw) };
        let (off_x, off_y) = ((bw - src_w) / 2, (bh - src_h) / 2);

        let pixels = (0..ah).flat_map(move |y| {
            (0..aw).map(move |x| {
                let sx = off_x + x * src_w / aw;
                let sy = off_y + y * src_h / ah;
                let color = self.pixels[(sy * bw + sx) as usize];
                Pixel(area.top_left + Point::new(x as i32, y as i32), color)
            })
        });
        target.draw_iter(pixels).ok();
    }

    /// Draw scaled to fit inside `area`, centered, leaving the rest untouched.
    pub fn draw_contain<D>(
        &self,
        target: &mut D,
        area: Rectangle,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let (aw, ah) = (u64::from(area.size.width), u64::from(area.size.height));
        let (bw, bh) = (u64::from(self.width), u64::from(self.height));
        let (w, h) = if bw * ah > bh * aw { (aw, bh * aw / bw) } else { (bw * ah / bh, ah) };
        self.draw_cover(target, Rectangle::with_center(area.center(), Size::new(w as u32, h as u32)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::PrimitiveStyle;
    use smalltv_common::colors::{RED, WHITE};

    #[test]
    fn test_draw_clips_to_bounds() {
        let mut canvas = Canvas::new(4, 4);
        canvas.draw_iter([Pixel(Point::new(-1, 0), WHITE), Pixel(Point::new(4, 0), WHITE), Pixel(Point::new(3, 3), WHITE)]).unwrap();
        assert_eq!(canvas.pixel(Point::new(3, 3)), Some(WHITE));
        assert_eq!(canvas.pixel(Point::new(0, 0)), Some(BLACK));
        assert_eq!(canvas.pixel(Point::new(4, 0)), None);
    }

    #[test]
    fn test_fill_solid_clips() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_solid(&Rectangle::new(Point::new(2, 2), Size::new(10, 10)), RED).unwrap();
        assert_eq!(canvas.pixel(Point::new(3, 3)), Some(RED));
        assert_eq!(canvas.pixel(Point::new(1, 1)), Some(BLACK));
        // Fully outside is a no-op
        canvas.fill_solid(&Rectangle::new(Point::new(-8, -8), Size::new(4, 4)), WHITE).unwrap();
        assert_eq!(canvas.pixel(Point::new(0, 0)), Some(BLACK));
    }

    #[test]
    fn test_region_clips_to_slot() {
        let mut canvas = Canvas::new(10, 10);
        let slot = Rectangle::new(Point::new(2, 2), Size::new(3, 3));
        {
            let mut region = canvas.region(slot);
            assert_eq!(region.size(), Size::new(3, 3));
            Rectangle::new(Point::new(-5, -5), Size::new(40, 40))
                .into_styled(PrimitiveStyle::with_fill(WHITE))
                .draw(&mut region)
                .unwrap();
        }
        assert_eq!(canvas.pixel(Point::new(2, 2)), Some(WHITE));
        assert_eq!(canvas.pixel(Point::new(4, 4)), Some(WHITE));
        assert_eq!(canvas.pixel(Point::new(5, 5)), Some(BLACK));
        assert_eq!(canvas.pixel(Point::new(1, 1)), Some(BLACK));
    }

    #[test]
    fn test_region_translates_pixels() {
        let mut canvas = Canvas::new(10, 10);
        let slot = Rectangle::new(Point::new(4, 5), Size::new(3, 3));
        canvas.region(slot).draw_iter([Pixel(Point::new(0, 0), RED), Pixel(Point::new(3, 0), RED)]).unwrap();
        assert_eq!(canvas.pixel(Point::new(4, 5)), Some(RED));
        // x = 3 is outside the 3px wide slot
        assert_eq!(canvas.pixel(Point::new(7, 5)), Some(BLACK));
    }

    #[test]
    fn test_frame_raster_is_rgb888() {
        let mut canvas = Canvas::new(2, 1);
        canvas.draw_iter([Pixel(Point::new(1, 0), WHITE)]).unwrap();
        let frame = Frame::from_canvas(&canvas, "s", 7);
        assert_eq!(frame.raster, vec![0, 0, 0, 255, 255, 255]);
        assert_eq!(frame.generation, 7);
    }

    #[test]
    fn test_encode_signatures() {
        let frame = Frame::from_canvas(&Canvas::new(16, 16), "s", 1);
        let jpeg = frame.encode(UploadFormat::Jpeg, 92).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let png = frame.to_png().unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_encode_rejects_bad_raster() {
        let frame = Frame { screen_id: "s".into(), generation: 1, width: 4, height: 4, raster: vec![0; 5] };
        assert!(matches!(frame.encode(UploadFormat::Png, 100), Err(EncodeError::RasterSize { .. })));
    }

    #[test]
    fn test_bitmap_decode_and_cover() {
        let mut canvas = Canvas::new(2, 2);
        canvas.clear(RED).unwrap();
        let png = Frame::from_canvas(&canvas, "s", 1).to_png().unwrap();
        let bitmap = Bitmap::decode(&png).unwrap();
        assert_eq!(bitmap.size(), Size::new(2, 2));

        let mut target = Canvas::new(8, 8);
        bitmap.draw_cover(&mut target, Rectangle::new(Point::new(1, 1), Size::new(5, 3)));
        assert_eq!(target.pixel(Point::new(1, 1)), Some(RED));
        assert_eq!(target.pixel(Point::new(5, 3)), Some(RED));
        assert_eq!(target.pixel(Point::new(6, 4)), Some(BLACK));
    }

    #[test]
    fn test_bitmap_contain_letterboxes() {
        let bitmap = Bitmap::from_pixels(2, 2, vec![RED; 4]).unwrap();
        let mut target = Canvas::new(6, 2);
        bitmap.draw_contain(&mut target, Rectangle::new(Point::zero(), Size::new(6, 2)));
        assert_eq!(target.pixel(Point::new(2, 0)), Some(RED));
        assert_eq!(target.pixel(Point::new(3, 1)), Some(RED));
        assert_eq!(target.pixel(Point::new(1, 0)), Some(BLACK));
        assert_eq!(target.pixel(Point::new(4, 1)), Some(BLACK));
    }

    #[test]
    fn test_bitmap_from_pixels_checks_length() {
        assert!(Bitmap::from_pixels(2, 2, vec![RED; 3]).is_none());
        assert!(Bitmap::from_pixels(2, 2, vec![RED; 4]).is_some());
    }
}
