//! Shared fixtures for unit tests

use crate::engine::{DocumentEngine, PageSize, RenderOptions, Rotation};
use crate::error::EngineError;
use crate::lopdf_engine::LopdfEngine;
use crate::page_range::PageRange;
use image::{Rgba, RgbaImage};
use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};
use std::cell::Cell;
use std::io::Write;

/// Create a valid PDF with `num_pages` pages.
///
/// Page `n` (1-indexed) is `100 + n` points wide, so tests can identify
/// pages by width after reordering.
pub(crate) fn create_test_pdf(num_pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();

    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new("Td", vec![Object::Integer(10), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Page {}", i + 1).into_bytes(),
                        lopdf::StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(101 + i as i64),
                    Object::Integer(792),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Unrotated page widths, which identify the pages of `create_test_pdf`
pub(crate) fn page_widths<E: DocumentEngine>(engine: &E, doc: &E::Document) -> Vec<u32> {
    (0..engine.page_count(doc))
        .map(|i| {
            let size = engine.page_size(doc, i).unwrap();
            let size = if engine.rotation(doc, i).unwrap().is_sideways() {
                size.swapped()
            } else {
                size
            };
            size.width as u32
        })
        .collect()
}

/// lopdf engine with a solid-colour renderer and switchable failures
#[derive(Default)]
pub(crate) struct TestEngine {
    inner: LopdfEngine,
    pub fail_save: Cell<bool>,
    /// Fail `delete_page` once this many deletions have succeeded
    pub fail_delete_after: Cell<Option<usize>>,
    pub fail_import: Cell<bool>,
    pub renders: Cell<usize>,
    deletes: Cell<usize>,
}

impl DocumentEngine for TestEngine {
    type Document = Document;

    fn load(&self, bytes: &[u8]) -> Result<Document, EngineError> {
        self.inner.load(bytes)
    }

    fn create_empty(&self) -> Document {
        self.inner.create_empty()
    }

    fn page_count(&self, doc: &Document) -> usize {
        self.inner.page_count(doc)
    }

    fn page_size(&self, doc: &Document, index: usize) -> Result<PageSize, EngineError> {
        self.inner.page_size(doc, index)
    }

    fn rotation(&self, doc: &Document, index: usize) -> Result<Rotation, EngineError> {
        self.inner.rotation(doc, index)
    }

    fn render(
        &self,
        doc: &Document,
        index: usize,
        width: u32,
        height: u32,
        _options: RenderOptions,
    ) -> Result<RgbaImage, EngineError> {
        self.inner.page_size(doc, index)?;
        self.renders.set(self.renders.get() + 1);
        Ok(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
    }

    fn delete_page(&self, doc: &mut Document, index: usize) -> Result<(), EngineError> {
        if self.fail_delete_after.get() == Some(self.deletes.get()) {
            return Err(EngineError::Malformed("injected delete failure".into()));
        }
        self.inner.delete_page(doc, index)?;
        self.deletes.set(self.deletes.get() + 1);
        Ok(())
    }

    fn rotate_page(
        &self,
        doc: &mut Document,
        index: usize,
        rotation: Rotation,
    ) -> Result<(), EngineError> {
        self.inner.rotate_page(doc, index, rotation)
    }

    fn import_pages(
        &self,
        dest: &mut Document,
        src: &Document,
        range: Option<&PageRange>,
        dest_index: usize,
    ) -> Result<(), EngineError> {
        if self.fail_import.get() {
            return Err(EngineError::Malformed("injected import failure".into()));
        }
        self.inner.import_pages(dest, src, range, dest_index)
    }

    fn compose(&self, doc: &Document, range: Option<&PageRange>) -> Result<Document, EngineError> {
        self.inner.compose(doc, range)
    }

    fn save(&self, doc: &mut Document, out: &mut dyn Write) -> Result<(), EngineError> {
        if self.fail_save.get() {
            return Err(EngineError::Serialize("injected save failure".into()));
        }
        self.inner.save(doc, out)
    }
}
