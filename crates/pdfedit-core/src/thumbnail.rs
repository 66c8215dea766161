//! Thumbnail slots kept parallel to the document's pages
//!
//! Each page position owns one slot. A slot starts `Unrendered` and becomes
//! `Rendered` once a preview has been cached for it. Reordering carries slots
//! along with their pages; rotation and structural changes reset them.

use crate::engine::PageSize;
use image::RgbaImage;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub enum ThumbnailSlot {
    #[default]
    Unrendered,
    Rendered(Arc<RgbaImage>),
}

impl ThumbnailSlot {
    pub fn is_rendered(&self) -> bool {
        matches!(self, ThumbnailSlot::Rendered(_))
    }

    pub fn image(&self) -> Option<&Arc<RgbaImage>> {
        match self {
            ThumbnailSlot::Rendered(image) => Some(image),
            ThumbnailSlot::Unrendered => None,
        }
    }
}

/// The slot sequence, one entry per page position
#[derive(Debug, Clone, Default)]
pub struct ThumbnailStrip {
    slots: Vec<ThumbnailSlot>,
}

impl ThumbnailStrip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with `count` unrendered slots
    pub fn reset(&mut self, count: usize) {
        self.slots.clear();
        self.slots.resize(count, ThumbnailSlot::Unrendered);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[ThumbnailSlot] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&ThumbnailSlot> {
        self.slots.get(index)
    }

    /// Insert `count` unrendered slots starting at `index`
    pub fn insert_unrendered(&mut self, index: usize, count: usize) {
        self.slots.splice(
            index..index,
            std::iter::repeat(ThumbnailSlot::Unrendered).take(count),
        );
    }

    pub fn remove(&mut self, index: usize) {
        self.slots.remove(index);
    }

    pub fn invalidate(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = ThumbnailSlot::Unrendered;
        }
    }

    pub fn store(&mut self, index: usize, image: Arc<RgbaImage>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = ThumbnailSlot::Rendered(image);
        }
    }

    /// Rebuild the strip for a new page order of 1-indexed page numbers.
    ///
    /// Position `i` takes the slot previously at `order[i] - 1`, so rendered
    /// previews follow their pages and duplicates share the same bitmap.
    /// Callers validate `order` against the current length first.
    pub fn reorder(&mut self, order: &[u32]) {
        let rebuilt = order
            .iter()
            .map(|&page| self.slots[page as usize - 1].clone())
            .collect();
        self.slots = rebuilt;
    }
}

/// Tuning for thumbnail rasterization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailGeometry {
    /// Smallest allowed edge of the bounding box
    pub min_edge: u32,
    /// Page size multiplier applied before fitting
    pub oversample: f32,
}

impl Default for ThumbnailGeometry {
    fn default() -> Self {
        Self {
            min_edge: 16,
            oversample: 2.0,
        }
    }
}

impl ThumbnailGeometry {
    /// Compute the raster size for a page shown in a `max_width` x `max_height` box.
    ///
    /// The page size is oversampled and truncated, then shrunk to fit the box
    /// keeping its aspect ratio. Pages already inside the box keep their size.
    pub fn fit(&self, page: PageSize, max_width: u32, max_height: u32) -> (u32, u32) {
        let box_w = u64::from(max_width.max(self.min_edge));
        let box_h = u64::from(max_height.max(self.min_edge));

        let page_w = clamp_edge(page.width * self.oversample);
        let page_h = clamp_edge(page.height * self.oversample);
        if page_w == 0 || page_h == 0 {
            return (box_w as u32, box_h as u32);
        }
        if page_w <= box_w && page_h <= box_h {
            return (page_w as u32, page_h as u32);
        }

        // Width is the limiting edge when box_w / page_w <= box_h / page_h
        if box_w * page_h <= box_h * page_w {
            (box_w as u32, (page_h * box_w / page_w).max(1) as u32)
        } else {
            ((page_w * box_h / page_h).max(1) as u32, box_h as u32)
        }
    }
}

/// Truncate an oversampled edge to `0..=u32::MAX`; NaN becomes 0.
/// Keeps the cross products in `fit` within u64.
fn clamp_edge(edge: f32) -> u64 {
    edge.max(0.0).min(u32::MAX as f32) as u64
}
