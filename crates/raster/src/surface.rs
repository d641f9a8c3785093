//! Owned RGBA pixel surfaces.
//!
//! A [`PixelSurface`] is a straight-alpha RGBA8 buffer plus a clip stack.
//! Fills honour the innermost clip; surface-to-surface copies take an explicit
//! destination region and ignore the stack.

use crate::geometry::{Point, Rect, Size};
use anyhow::{Result as AnyResult, anyhow};
use core::ops::{Deref, DerefMut};
use image::{ColorType, ImageEncoder as _, Pixel as _, Rgba, RgbaImage, codecs::png::PngEncoder};
use log::{debug, warn};
use smallvec::SmallVec;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// An 8-bit RGBA color.
pub type Color = Rgba<u8>;

/// Fully transparent black.
pub const TRANSPARENT: Color = Rgba([0, 0, 0, 0]);

/// Largest pixel count a surface may allocate unless configured otherwise.
pub const DEFAULT_MAX_PIXELS: u64 = 1 << 28;

/// Build a color from its channels.
#[inline]
#[must_use]
pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Color {
    Rgba([red, green, blue, alpha])
}

/// How source pixels combine with destination pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blend {
    /// Source-over alpha compositing.
    #[default]
    Over,
    /// Replace destination pixels.
    Copy,
}

/// Convert an already-clamped coordinate to a buffer index.
fn coord(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

/// A resizable RGBA pixel buffer with a scoped clip stack.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    /// Backing pixels.
    pixels: RgbaImage,
    /// Active clip rects, innermost last. Each entry is already intersected
    /// with the one below it.
    clip: SmallVec<Rect, 4>,
}

impl Default for PixelSurface {
    fn default() -> Self {
        Self {
            pixels: RgbaImage::new(0, 0),
            clip: SmallVec::new(),
        }
    }
}

impl PixelSurface {
    /// Allocate a transparent surface of `size`.
    ///
    /// # Errors
    /// Returns an error if `size` exceeds `max_pixels` or the allocation fails.
    pub fn allocate(size: Size, max_pixels: u64) -> AnyResult<Self> {
        if size.area() > max_pixels {
            return Err(anyhow!(
                "surface {}x{} exceeds the {max_pixels} pixel limit",
                size.width,
                size.height
            ));
        }
        let len = usize::try_from(size.area() * 4)
            .map_err(|err| anyhow!("surface {}x{} too large: {err}", size.width, size.height))?;
        let mut raw = Vec::new();
        raw.try_reserve_exact(len).map_err(|err| {
            anyhow!(
                "failed to allocate {}x{} surface: {err}",
                size.width,
                size.height
            )
        })?;
        raw.resize(len, 0);
        let pixels = RgbaImage::from_raw(size.width, size.height, raw)
            .ok_or_else(|| anyhow!("pixel buffer does not match {}x{}", size.width, size.height))?;
        debug!(target: "raster::surface", "allocated {}x{} surface", size.width, size.height);
        Ok(Self {
            pixels,
            clip: SmallVec::new(),
        })
    }

    /// Reallocate to `size`, clearing the contents.
    ///
    /// Returns `Ok(false)` without touching the buffer when either dimension
    /// is zero or the size is unchanged. On error the previous buffer is kept.
    ///
    /// # Errors
    /// Returns an error if the new buffer cannot be allocated.
    pub fn resize(&mut self, size: Size, max_pixels: u64) -> AnyResult<bool> {
        if size.is_empty() || size == self.size() {
            return Ok(false);
        }
        let fresh = Self::allocate(size, max_pixels)?;
        if !self.clip.is_empty() {
            warn!(target: "raster::surface", "resizing a surface with {} open clip scopes", self.clip.len());
        }
        self.pixels = fresh.pixels;
        self.clip.clear();
        Ok(true)
    }

    /// Current extent.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.pixels.width(), self.pixels.height())
    }

    /// The whole surface as a rectangle at the origin.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.size())
    }

    /// True when no pixels are allocated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    /// Borrow the backing image.
    #[inline]
    #[must_use]
    pub const fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Color at `point`, or `None` outside the surface.
    #[inline]
    #[must_use]
    pub fn pixel(&self, point: Point) -> Option<Color> {
        self.bounds()
            .contains(point)
            .then(|| *self.pixels.get_pixel(coord(point.x), coord(point.y)))
    }

    /// Innermost clip, or the full bounds when no scope is open.
    #[inline]
    #[must_use]
    pub fn clip_rect(&self) -> Rect {
        self.clip
            .last()
            .map_or_else(|| self.bounds(), |top| top.intersect(self.bounds()))
    }

    /// Number of open clip scopes.
    #[inline]
    #[must_use]
    pub fn clip_depth(&self) -> usize {
        self.clip.len()
    }

    /// Open a clip scope restricted to `rect` within the current clip.
    ///
    /// The scope is popped when the returned guard drops, so bounds pushed
    /// for one subtree never leak into its siblings.
    #[inline]
    pub fn push_bounds(&mut self, rect: Rect) -> ClipScope<'_> {
        let clipped = self.clip_rect().intersect(rect);
        self.clip.push(clipped);
        ClipScope { surface: self }
    }

    /// Fill `rect` within the current clip.
    pub fn fill_rect(&mut self, rect: Rect, color: Color, blend: Blend) {
        let area = rect.intersect(self.clip_rect());
        if area.is_empty() {
            return;
        }
        for row in coord(area.y)..coord(area.bottom()) {
            for column in coord(area.x)..coord(area.right()) {
                let target = self.pixels.get_pixel_mut(column, row);
                match blend {
                    Blend::Copy => *target = color,
                    Blend::Over => target.blend(&color),
                }
            }
        }
    }

    /// Overwrite every pixel with `color`, ignoring the clip stack.
    #[inline]
    pub fn clear(&mut self, color: Color) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = color;
        }
    }

    /// Copy `source_rect` of `source` so its top-left lands at `dest`.
    ///
    /// Both ends are clamped to their buffers; the clip stack is not
    /// consulted. Returns the destination region actually written, which is
    /// empty when nothing overlapped.
    pub fn draw_from(
        &mut self,
        source: &Self,
        source_rect: Rect,
        dest: Point,
        blend: Blend,
    ) -> Rect {
        let src = source_rect.intersect(source.bounds());
        if src.is_empty() {
            return Rect::EMPTY;
        }
        let shift = dest - source_rect.origin();
        let written = src.translate(shift).intersect(self.bounds());
        if written.is_empty() {
            return Rect::EMPTY;
        }
        let read = written.translate(Point::ZERO - shift);
        match blend {
            Blend::Copy => self.copy_rows(source, read, written),
            Blend::Over => {
                for row in 0..written.height {
                    for column in 0..written.width {
                        let from = *source
                            .pixels
                            .get_pixel(coord(read.x) + column, coord(read.y) + row);
                        self.pixels
                            .get_pixel_mut(coord(written.x) + column, coord(written.y) + row)
                            .blend(&from);
                    }
                }
            }
        }
        written
    }

    /// Row-wise memcpy of equally sized, in-bounds regions.
    fn copy_rows(&mut self, source: &Self, read: Rect, written: Rect) {
        let src_stride = source.pixels.width() as usize * 4;
        let dst_stride = self.pixels.width() as usize * 4;
        let span = written.width as usize * 4;
        let src_raw: &[u8] = source.pixels.as_raw();
        let dst_raw: &mut [u8] = &mut self.pixels;
        for row in 0..written.height as usize {
            let src_start = (coord(read.y) as usize + row) * src_stride + coord(read.x) as usize * 4;
            let dst_start =
                (coord(written.y) as usize + row) * dst_stride + coord(written.x) as usize * 4;
            dst_raw[dst_start..dst_start + span]
                .copy_from_slice(&src_raw[src_start..src_start + span]);
        }
    }

    /// Encode the surface as PNG into `out`.
    ///
    /// # Errors
    /// Returns an error if the surface is empty or encoding fails.
    pub fn encode_png<W: Write>(&self, out: W) -> AnyResult<()> {
        if self.is_empty() {
            return Err(anyhow!("cannot encode an empty surface"));
        }
        PngEncoder::new(out).write_image(
            self.pixels.as_raw(),
            self.pixels.width(),
            self.pixels.height(),
            ColorType::Rgba8.into(),
        )?;
        Ok(())
    }

    /// Write the surface to `path` as PNG.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or encoding fails.
    pub fn save_png(&self, path: &Path) -> AnyResult<()> {
        let file = File::create(path)
            .map_err(|err| anyhow!("failed to create {}: {err}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.encode_png(&mut writer)?;
        writer.flush()?;
        debug!(target: "raster::surface", "saved {}", path.display());
        Ok(())
    }
}

/// A clip scope on a [`PixelSurface`]. Pops its rect when dropped.
///
/// Derefs to the surface, so drawing and nested scopes go through the guard.
#[derive(Debug)]
pub struct ClipScope<'surface> {
    /// Surface whose clip stack this scope pushed onto.
    surface: &'surface mut PixelSurface,
}

impl ClipScope<'_> {
    /// True when the scope leaves any pixel drawable.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.surface.clip_rect().is_empty()
    }
}

impl Deref for ClipScope<'_> {
    type Target = PixelSurface;

    #[inline]
    fn deref(&self) -> &PixelSurface {
        self.surface
    }
}

impl DerefMut for ClipScope<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut PixelSurface {
        self.surface
    }
}

impl Drop for ClipScope<'_> {
    fn drop(&mut self) {
        self.surface.clip.pop();
    }
}
