//! Document engine boundary
//!
//! The session never looks inside a document. Everything it needs from the
//! binary format goes through [`DocumentEngine`]; [`crate::LopdfEngine`] is
//! the bundled implementation.

use crate::error::EngineError;
use crate::page_range::PageRange;
use image::RgbaImage;
use std::io::Write;

/// Page size in points (1 point = 1/72 inch), as displayed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// US Letter, used when a page has no usable MediaBox
    pub const LETTER: PageSize = PageSize::new(612.0, 792.0);

    pub fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Clockwise page rotation in quarter turns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Half,
    Clockwise270,
}

impl Rotation {
    const ALL: [Rotation; 4] = [
        Rotation::None,
        Rotation::Clockwise90,
        Rotation::Half,
        Rotation::Clockwise270,
    ];

    pub fn from_quarter_turns(turns: i64) -> Self {
        Self::ALL[turns.rem_euclid(4) as usize]
    }

    /// Normalize any multiple of 90 degrees; other angles round down to a quarter turn
    pub fn from_degrees(degrees: i64) -> Self {
        Self::from_quarter_turns(degrees.rem_euclid(360) / 90)
    }

    pub fn quarter_turns(self) -> i64 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 1,
            Rotation::Half => 2,
            Rotation::Clockwise270 => 3,
        }
    }

    pub fn degrees(self) -> i64 {
        self.quarter_turns() * 90
    }

    /// One quarter turn counter-clockwise
    pub fn rotated_left(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() - 1)
    }

    /// One quarter turn clockwise
    pub fn rotated_right(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 1)
    }

    pub fn is_sideways(self) -> bool {
        matches!(self, Rotation::Clockwise90 | Rotation::Clockwise270)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub dpi_x: u32,
    pub dpi_y: u32,
    /// Draw annotations on top of page content
    pub annotations: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi_x: 96,
            dpi_y: 96,
            annotations: true,
        }
    }
}

/// Operations the session consumes from a document engine.
///
/// Page indices are 0-based; [`PageRange`] values are 1-based, matching the
/// engine's own addressing. Implementations may assume indices have already
/// been validated but must still report out-of-range access as an error.
pub trait DocumentEngine {
    type Document: Clone;

    fn load(&self, bytes: &[u8]) -> Result<Self::Document, EngineError>;

    fn create_empty(&self) -> Self::Document;

    fn page_count(&self, doc: &Self::Document) -> usize;

    /// Displayed size, with width and height swapped for sideways pages
    fn page_size(&self, doc: &Self::Document, index: usize) -> Result<PageSize, EngineError>;

    fn rotation(&self, doc: &Self::Document, index: usize) -> Result<Rotation, EngineError>;

    fn render(
        &self,
        doc: &Self::Document,
        index: usize,
        width: u32,
        height: u32,
        options: RenderOptions,
    ) -> Result<RgbaImage, EngineError>;

    fn delete_page(&self, doc: &mut Self::Document, index: usize) -> Result<(), EngineError>;

    fn rotate_page(
        &self,
        doc: &mut Self::Document,
        index: usize,
        rotation: Rotation,
    ) -> Result<(), EngineError>;

    /// Import the pages of `src` selected by `range` (all when `None`) so the
    /// first imported page lands at `dest_index`.
    fn import_pages(
        &self,
        dest: &mut Self::Document,
        src: &Self::Document,
        range: Option<&PageRange>,
        dest_index: usize,
    ) -> Result<(), EngineError>;

    /// Build a new document from the pages selected by `range` in range
    /// order (all when `None`). Repeated pages are duplicated.
    fn compose(
        &self,
        doc: &Self::Document,
        range: Option<&PageRange>,
    ) -> Result<Self::Document, EngineError>;

    fn save(&self, doc: &mut Self::Document, out: &mut dyn Write) -> Result<(), EngineError>;
}
