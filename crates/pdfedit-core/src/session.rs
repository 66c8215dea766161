//! Editing session over a single document
//!
//! `EditSession` owns the engine document and the thumbnail strip together,
//! so page count and slot count can never drift apart. Every public method
//! validates page indices before touching the engine.
//!
//! Indices taken by the session API are 0-based. Page ranges given as text
//! (for export) are 1-based, as users write them.

use crate::config::SessionConfig;
use crate::engine::{DocumentEngine, PageSize, Rotation};
use crate::error::{EngineError, PdfEditError};
use crate::page_order::{compute_copy_order, compute_move_order};
use crate::page_range::PageRange;
use crate::state::{DocumentState, ObserverId};
use crate::storage::{backup_path, FsStorage, Storage};
use crate::thumbnail::{ThumbnailSlot, ThumbnailStrip};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct EditSession<E: DocumentEngine, S: Storage = FsStorage> {
    engine: E,
    storage: S,
    config: SessionConfig,
    document: Option<E::Document>,
    thumbnails: ThumbnailStrip,
    state: DocumentState,
}

impl<E: DocumentEngine> EditSession<E, FsStorage> {
    /// Create an empty session reading and writing the local filesystem
    pub fn new(engine: E) -> Self {
        Self::with_storage(engine, FsStorage, SessionConfig::default())
    }
}

impl<E: DocumentEngine, S: Storage> EditSession<E, S> {
    pub fn with_storage(engine: E, storage: S, config: SessionConfig) -> Self {
        Self {
            engine,
            storage,
            config,
            document: None,
            thumbnails: ThumbnailStrip::new(),
            state: DocumentState::new(),
        }
    }

    // ---- queries ----

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn document(&self) -> Option<&E::Document> {
        self.document.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    pub fn page_count(&self) -> usize {
        self.document
            .as_ref()
            .map_or(0, |doc| self.engine.page_count(doc))
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.state.source_path()
    }

    pub fn is_modified(&self) -> bool {
        self.state.is_modified()
    }

    pub fn thumbnails(&self) -> &[ThumbnailSlot] {
        self.thumbnails.slots()
    }

    pub fn page_size(&self, index: usize) -> Result<PageSize, PdfEditError> {
        self.check_page(index)?;
        self.engine
            .page_size(self.doc()?, index)
            .map_err(PdfEditError::Operation)
    }

    pub fn rotation(&self, index: usize) -> Result<Rotation, PdfEditError> {
        self.check_page(index)?;
        self.engine
            .rotation(self.doc()?, index)
            .map_err(PdfEditError::Operation)
    }

    /// Register a callback fired whenever the source path or modified flag is set
    pub fn subscribe(&mut self, observer: impl FnMut(&DocumentState) + 'static) -> ObserverId {
        self.state.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.state.unsubscribe(id)
    }

    // ---- lifecycle ----

    /// Replace the session's document with one parsed from `bytes`.
    ///
    /// Nothing changes if the bytes fail to parse.
    pub fn open(&mut self, bytes: &[u8], source_path: Option<&Path>) -> Result<(), PdfEditError> {
        let document = self.engine.load(bytes).map_err(PdfEditError::Load)?;
        let page_count = self.engine.page_count(&document);

        self.document = Some(document);
        self.thumbnails.reset(page_count);
        self.state.set_source_path(source_path.map(Path::to_path_buf));
        self.state.set_modified(false);

        info!(
            "Opened document with {} pages from {}",
            page_count,
            source_path.map_or("memory".to_string(), |p| p.display().to_string())
        );
        Ok(())
    }

    pub fn open_file(&mut self, path: &Path) -> Result<(), PdfEditError> {
        let bytes = self.read(path)?;
        self.open(&bytes, Some(path))
    }

    pub fn close(&mut self) {
        self.document = None;
        self.thumbnails.clear();
        self.state.set_source_path(None);
        self.state.set_modified(false);
        debug!("Closed document");
    }

    // ---- structural edits ----

    /// Insert every page of `source` so the first lands at `dest`
    pub fn insert_document(
        &mut self,
        source: &E::Document,
        dest: usize,
    ) -> Result<(), PdfEditError> {
        self.check_insertion_point(dest)?;
        let inserted = self.engine.page_count(source);

        let engine = &self.engine;
        let document = self.document.get_or_insert_with(|| engine.create_empty());
        engine
            .import_pages(document, source, None, dest)
            .map_err(PdfEditError::Import)?;

        self.thumbnails.insert_unrendered(dest, inserted);
        self.state.set_modified(true);

        debug!("Inserted {} pages at {}", inserted, dest);
        Ok(())
    }

    pub fn insert_bytes(&mut self, bytes: &[u8], dest: usize) -> Result<(), PdfEditError> {
        self.check_insertion_point(dest)?;
        let source = self.engine.load(bytes).map_err(PdfEditError::Import)?;
        self.insert_document(&source, dest)
    }

    pub fn insert_file(&mut self, path: &Path, dest: usize) -> Result<(), PdfEditError> {
        self.check_insertion_point(dest)?;
        let bytes = self.read(path)?;
        self.insert_bytes(&bytes, dest)
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), PdfEditError> {
        self.insert_bytes(bytes, self.page_count())
    }

    pub fn append_file(&mut self, path: &Path) -> Result<(), PdfEditError> {
        self.insert_file(path, self.page_count())
    }

    /// Delete pages `first..=last`.
    ///
    /// Afterwards the document counts as modified unless it is now empty and
    /// was never saved.
    pub fn delete_pages(&mut self, first: usize, last: usize) -> Result<(), PdfEditError> {
        self.check_span(first, last)?;
        let document = self.document.as_mut().ok_or(PdfEditError::NoDocument)?;

        let mut outcome = Ok(());
        for _ in first..=last {
            // Each removal shifts the rest of the span down onto `first`
            if let Err(e) = self.engine.delete_page(document, first) {
                outcome = Err(PdfEditError::Operation(e));
                break;
            }
            self.thumbnails.remove(first);
        }

        let has_pages = !self.thumbnails.is_empty();
        let modified = has_pages || self.state.source_path().is_some();
        self.state.set_modified(modified);

        if outcome.is_err() {
            warn!("Deleting pages {}..={} stopped part way", first, last);
        } else {
            debug!("Deleted pages {}..={}", first, last);
        }
        outcome
    }

    /// Standalone document bytes holding only page `index`
    pub fn extract_page(&self, index: usize) -> Result<Vec<u8>, PdfEditError> {
        self.check_page(index)?;
        let range = PageRange::from_pages(&[index as u32 + 1]);
        self.serialize(self.doc()?, Some(&range))
            .map_err(PdfEditError::Operation)
    }

    /// Move pages `first..=last` so they start at insertion point `dest`
    pub fn move_pages(&mut self, dest: usize, first: usize, last: usize) -> Result<(), PdfEditError> {
        self.doc()?;
        let order = compute_move_order(self.page_count(), first, last, dest)?;
        debug!("Moving pages {}..={} to {}", first, last, dest);
        self.apply_order(&order)
    }

    /// Copy pages `first..=last` to insertion point `dest`, keeping the originals
    pub fn copy_pages(&mut self, dest: usize, first: usize, last: usize) -> Result<(), PdfEditError> {
        self.doc()?;
        let order = compute_copy_order(self.page_count(), first, last, dest)?;
        debug!("Copying pages {}..={} to {}", first, last, dest);
        self.apply_order(&order)
    }

    /// Rebuild the document with the given 1-indexed page order.
    ///
    /// Pages may repeat, which duplicates them. The current document is only
    /// replaced once the reordered one has been built.
    pub fn apply_order(&mut self, order: &[u32]) -> Result<(), PdfEditError> {
        let page_count = self.page_count();
        let document = self.document.as_mut().ok_or(PdfEditError::NoDocument)?;

        let range = PageRange::from_pages(order);
        range.validate(page_count as u32)?;

        let reordered = self
            .engine
            .compose(document, Some(&range))
            .map_err(PdfEditError::Operation)?;
        *document = reordered;

        self.thumbnails.reorder(order);
        self.state.set_modified(true);

        debug!("Applied page order {}", range);
        Ok(())
    }

    /// Rotate pages `first..=last` a quarter turn. `first > last` does nothing.
    pub fn rotate_pages(
        &mut self,
        first: usize,
        last: usize,
        rotate_left: bool,
    ) -> Result<(), PdfEditError> {
        if first > last {
            return Ok(());
        }
        self.check_span(first, last)?;
        let document = self.document.as_mut().ok_or(PdfEditError::NoDocument)?;

        let mut outcome = Ok(());
        for index in first..=last {
            let rotated = self.engine.rotation(document, index).and_then(|current| {
                let next = if rotate_left {
                    current.rotated_left()
                } else {
                    current.rotated_right()
                };
                self.engine.rotate_page(document, index, next)
            });
            if let Err(e) = rotated {
                outcome = Err(PdfEditError::Operation(e));
                break;
            }
            self.thumbnails.invalidate(index);
            self.state.set_modified(true);
        }

        debug!(
            "Rotated pages {}..={} {}",
            first,
            last,
            if rotate_left { "left" } else { "right" }
        );
        outcome
    }

    // ---- persistence ----

    /// Write the document to `path`, keeping a backup of any existing file
    /// until the new contents are in place.
    ///
    /// On failure the session is unchanged and the backup, if one was made,
    /// stays next to the target. Once the target is written the save counts
    /// as done, even if the backup cannot be removed.
    pub fn save_to(&mut self, path: &Path) -> Result<(), PdfEditError> {
        let document = self.doc()?;
        let backup = backup_path(path, self.config.backup_extension());

        if self.storage.exists(&backup) {
            self.storage
                .remove(&backup)
                .map_err(|e| PdfEditError::save(path, format!("removing stale backup: {}", e)))?;
        }
        if self.storage.exists(path) {
            self.storage
                .copy(path, &backup)
                .map_err(|e| PdfEditError::save(path, format!("creating backup: {}", e)))?;
        }

        // Serialize fully before touching the target
        let bytes = self
            .serialize(document, None)
            .map_err(|e| PdfEditError::save(path, e))?;
        self.storage
            .write(path, &bytes)
            .map_err(|e| PdfEditError::save(path, e))?;

        self.state.set_source_path(Some(path.to_path_buf()));
        self.state.set_modified(false);

        if self.storage.exists(&backup) {
            if let Err(e) = self.storage.remove(&backup) {
                warn!(
                    "Saved {} but could not remove backup {}: {}",
                    path.display(),
                    backup.display(),
                    e
                );
            }
        }

        info!("Saved {} pages to {}", self.page_count(), path.display());
        Ok(())
    }

    /// Save back to the path the document came from
    pub fn save(&mut self) -> Result<(), PdfEditError> {
        let path = self
            .state
            .source_path()
            .map(Path::to_path_buf)
            .ok_or(PdfEditError::NoSourcePath)?;
        self.save_to(&path)
    }

    /// Write the pages named by `page_range` (all pages when `None`) to
    /// `path` without changing the session.
    pub fn export(&self, path: &Path, page_range: Option<&str>) -> Result<(), PdfEditError> {
        let document = self.doc()?;
        let range = match page_range {
            Some(text) => {
                let range: PageRange = text.parse()?;
                range.validate(self.engine.page_count(document) as u32)?;
                Some(range)
            }
            None => None,
        };

        let bytes = self
            .serialize(document, range.as_ref())
            .map_err(|e| PdfEditError::export(path, e))?;
        self.storage
            .write(path, &bytes)
            .map_err(|e| PdfEditError::export(path, e))?;

        info!(
            "Exported {} to {}",
            range.map_or("all pages".to_string(), |r| format!("pages {}", r)),
            path.display()
        );
        Ok(())
    }

    // ---- thumbnails ----

    /// Render page `index` to fit a `max_width` x `max_height` box.
    ///
    /// Does not read or update the page's thumbnail slot.
    pub fn thumbnail_of(
        &self,
        index: usize,
        max_width: u32,
        max_height: u32,
    ) -> Result<RgbaImage, PdfEditError> {
        let size = self.page_size(index)?;
        let thumbnail = &self.config.thumbnail;
        let (width, height) = thumbnail.geometry().fit(size, max_width, max_height);

        self.engine
            .render(self.doc()?, index, width, height, thumbnail.render_options())
            .map_err(PdfEditError::Render)
    }

    /// Store a rendered thumbnail in slot `index`
    pub fn cache_thumbnail(&mut self, index: usize, image: Arc<RgbaImage>) -> Result<(), PdfEditError> {
        self.check_page(index)?;
        self.thumbnails.store(index, image);
        Ok(())
    }

    /// Return the cached thumbnail for `index`, rendering it first if needed
    pub fn ensure_thumbnail(
        &mut self,
        index: usize,
        max_width: u32,
        max_height: u32,
    ) -> Result<Arc<RgbaImage>, PdfEditError> {
        self.check_page(index)?;
        if let Some(image) = self.thumbnails.get(index).and_then(ThumbnailSlot::image) {
            return Ok(Arc::clone(image));
        }

        let image = Arc::new(self.thumbnail_of(index, max_width, max_height)?);
        self.thumbnails.store(index, Arc::clone(&image));
        Ok(image)
    }

    // ---- helpers ----

    fn doc(&self) -> Result<&E::Document, PdfEditError> {
        self.document.as_ref().ok_or(PdfEditError::NoDocument)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, PdfEditError> {
        self.storage.read(path).map_err(|source| PdfEditError::Read {
            path: PathBuf::from(path),
            source,
        })
    }

    /// Compose the selected pages into a fresh document and serialize it
    fn serialize(
        &self,
        document: &E::Document,
        range: Option<&PageRange>,
    ) -> Result<Vec<u8>, EngineError> {
        let mut composed = self.engine.compose(document, range)?;
        let mut bytes = Vec::new();
        self.engine.save(&mut composed, &mut bytes)?;
        Ok(bytes)
    }

    fn check_page(&self, index: usize) -> Result<(), PdfEditError> {
        if self.document.is_none() {
            return Err(PdfEditError::NoDocument);
        }
        let count = self.page_count();
        if index >= count {
            return Err(PdfEditError::InvalidRange(format!(
                "Page {} does not exist (document has {} pages)",
                index, count
            )));
        }
        Ok(())
    }

    fn check_span(&self, first: usize, last: usize) -> Result<(), PdfEditError> {
        if first > last {
            return Err(PdfEditError::InvalidRange(format!(
                "First page {} is after last page {}",
                first, last
            )));
        }
        self.check_page(last)
    }

    fn check_insertion_point(&self, dest: usize) -> Result<(), PdfEditError> {
        let count = self.page_count();
        if dest > count {
            return Err(PdfEditError::InvalidRange(format!(
                "Insertion point {} is past the end (document has {} pages)",
                dest, count
            )));
        }
        Ok(())
    }
}
