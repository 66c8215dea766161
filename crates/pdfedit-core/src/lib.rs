//! Page-order and document-state engine for PDF editing
//!
//! An [`EditSession`] holds one open document together with a thumbnail slot
//! per page and the saved/modified state. Structural edits (move, copy,
//! insert, delete, rotate) keep pages and slots in lockstep, and saving goes
//! through a backup so an existing file is never lost to a failed write.
//!
//! PDF parsing and serialization sit behind [`DocumentEngine`]; the bundled
//! [`LopdfEngine`] uses lopdf.

pub mod config;
pub mod engine;
pub mod error;
pub mod lopdf_engine;
pub mod page_order;
pub mod page_range;
pub mod session;
pub mod state;
pub mod storage;
pub mod thumbnail;

#[cfg(test)]
mod test_support;

pub use config::{SessionConfig, ThumbnailConfig};
pub use engine::{DocumentEngine, PageSize, RenderOptions, Rotation};
pub use error::{EngineError, PdfEditError};
pub use lopdf_engine::LopdfEngine;
pub use page_order::{compute_copy_order, compute_move_order};
pub use page_range::PageRange;
pub use session::EditSession;
pub use state::{DocumentState, ObserverId};
pub use storage::{FsStorage, Storage};
pub use thumbnail::{ThumbnailGeometry, ThumbnailSlot};
