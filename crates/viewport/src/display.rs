//! Display surfaces: where finished root viewports are uploaded.
//!
//! [`DisplaySurface`] abstracts the window's presentable image so the engine
//! can run against a real window or the in-memory [`MemoryDisplay`].

use anyhow::Result as AnyResult;
use core::fmt::Debug;
use core::mem;
use log::debug;
use raster::{Blend, DamageTracker, PixelSurface, Point, Rect, Size};

/// Whether an upload replaces the whole window or part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadKind {
    /// The main viewport, uploaded in full.
    Full,
    /// A sub-rectangle or a popup/overlay layer.
    Region,
}

/// One copy from a viewport surface to the display.
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'src> {
    /// Surface to read from.
    pub source: &'src PixelSurface,
    /// Region of `source` to copy.
    pub source_rect: Rect,
    /// Window position of the region's top-left corner.
    pub dest: Point,
    /// How the region combines with what is already displayed.
    pub blend: Blend,
    /// Upload category.
    pub kind: UploadKind,
}

impl UploadRequest<'_> {
    /// Window rectangle this request covers.
    #[inline]
    #[must_use]
    pub const fn dest_rect(&self) -> Rect {
        Rect::from_origin_size(self.dest, self.source_rect.size())
    }
}

/// Presentable window image.
pub trait DisplaySurface: Debug {
    /// Current size in pixels.
    fn size(&self) -> Size;

    /// Resize the display. Contents are undefined until the next full upload.
    ///
    /// # Errors
    /// Returns an error if the backing image cannot be reallocated.
    fn resize(&mut self, size: Size) -> AnyResult<()>;

    /// Copy a region of a viewport surface onto the display.
    fn upload(&mut self, request: &UploadRequest<'_>);

    /// Present everything uploaded since the last publish.
    fn publish(&mut self);
}

/// Record of one upload, kept by [`MemoryDisplay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadRecord {
    /// Window rectangle actually written.
    pub dest: Rect,
    /// Upload category.
    pub kind: UploadKind,
    /// Blend mode used.
    pub blend: Blend,
}

/// In-memory display that keeps the window image, an upload log and the
/// damage of the last publish.
#[derive(Debug, Clone)]
pub struct MemoryDisplay {
    /// Window image.
    image: PixelSurface,
    /// Uploads since the last publish.
    pending: Vec<UploadRecord>,
    /// Uploads of the last publish.
    published: Vec<UploadRecord>,
    /// Damage accumulated since the last publish.
    damage: DamageTracker,
    /// Damage presented by the last publish.
    last_damage: Vec<Rect>,
    /// Number of publishes.
    publishes: u64,
    /// Allocation guard.
    max_pixels: u64,
}

impl MemoryDisplay {
    /// Create a transparent display of `size`.
    ///
    /// # Errors
    /// Returns an error if the image cannot be allocated.
    pub fn new(size: Size, max_pixels: u64) -> AnyResult<Self> {
        Ok(Self {
            image: PixelSurface::allocate(size, max_pixels)?,
            pending: Vec::new(),
            published: Vec::new(),
            damage: DamageTracker::new(size),
            last_damage: Vec::new(),
            publishes: 0,
            max_pixels,
        })
    }

    /// The window image.
    #[inline]
    #[must_use]
    pub const fn image(&self) -> &PixelSurface {
        &self.image
    }

    /// Uploads presented by the last publish, in order.
    #[inline]
    #[must_use]
    pub fn uploads(&self) -> &[UploadRecord] {
        &self.published
    }

    /// Uploads not yet published.
    #[inline]
    #[must_use]
    pub fn pending_uploads(&self) -> &[UploadRecord] {
        &self.pending
    }

    /// Damage rectangles presented by the last publish.
    #[inline]
    #[must_use]
    pub fn last_damage(&self) -> &[Rect] {
        &self.last_damage
    }

    /// Number of publishes so far.
    #[inline]
    #[must_use]
    pub const fn publishes(&self) -> u64 {
        self.publishes
    }
}

impl DisplaySurface for MemoryDisplay {
    fn size(&self) -> Size {
        self.image.size()
    }

    fn resize(&mut self, size: Size) -> AnyResult<()> {
        if self.image.resize(size, self.max_pixels)? {
            self.damage.resize(size);
        }
        Ok(())
    }

    fn upload(&mut self, request: &UploadRequest<'_>) {
        let written = self.image.draw_from(
            request.source,
            request.source_rect,
            request.dest,
            request.blend,
        );
        if written.is_empty() {
            return;
        }
        self.damage.damage(written);
        self.pending.push(UploadRecord {
            dest: written,
            kind: request.kind,
            blend: request.blend,
        });
    }

    fn publish(&mut self) {
        self.publishes += 1;
        self.published = mem::take(&mut self.pending);
        self.last_damage = self.damage.take();
        debug!(
            target: "viewport::display",
            "publish #{}: {} upload(s), {} damage rect(s)",
            self.publishes,
            self.published.len(),
            self.last_damage.len()
        );
    }
}
