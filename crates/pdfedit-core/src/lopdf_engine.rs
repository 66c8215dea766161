//! `DocumentEngine` implementation on top of lopdf
//!
//! Documents are kept with a flat page tree: every page is a direct kid of
//! the root `Pages` node and carries its own copy of the inheritable
//! attributes. That keeps reordering, importing and duplicating pages a
//! matter of rewriting one `Kids` array.

use crate::engine::{DocumentEngine, PageSize, RenderOptions, Rotation};
use crate::error::EngineError;
use crate::page_range::PageRange;
use image::RgbaImage;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;
use std::io::Write;

/// Page attributes a page may inherit from its ancestors
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guard against cyclic Parent chains in broken files
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentEngine for LopdfEngine {
    type Document = Document;

    fn load(&self, bytes: &[u8]) -> Result<Document, EngineError> {
        let mut doc = Document::load_mem(bytes).map_err(|e| EngineError::Parse(e.to_string()))?;
        flatten_page_tree(&mut doc)?;
        Ok(doc)
    }

    fn create_empty(&self) -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(Vec::new())),
            ("Count", Object::Integer(0)),
        ]));
        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc
    }

    fn page_count(&self, doc: &Document) -> usize {
        doc.get_pages().len()
    }

    fn page_size(&self, doc: &Document, index: usize) -> Result<PageSize, EngineError> {
        let page_id = page_id(doc, index)?;

        let size = inherited(doc, page_id, b"MediaBox")
            .and_then(|obj| resolve(doc, obj).as_array().ok())
            .and_then(|array| parse_box_array(doc, array))
            .map(|[x1, y1, x2, y2]| PageSize::new((x2 - x1).abs() as f32, (y2 - y1).abs() as f32))
            .unwrap_or(PageSize::LETTER);

        if page_rotation(doc, page_id).is_sideways() {
            Ok(size.swapped())
        } else {
            Ok(size)
        }
    }

    fn rotation(&self, doc: &Document, index: usize) -> Result<Rotation, EngineError> {
        Ok(page_rotation(doc, page_id(doc, index)?))
    }

    fn render(
        &self,
        _doc: &Document,
        _index: usize,
        _width: u32,
        _height: u32,
        _options: RenderOptions,
    ) -> Result<RgbaImage, EngineError> {
        Err(EngineError::Unsupported("rasterizing pages"))
    }

    fn delete_page(&self, doc: &mut Document, index: usize) -> Result<(), EngineError> {
        let mut refs = page_refs(doc);
        if index >= refs.len() {
            return Err(EngineError::PageOutOfRange {
                index,
                count: refs.len(),
            });
        }
        refs.remove(index);
        set_page_refs(doc, &refs)
    }

    fn rotate_page(
        &self,
        doc: &mut Document,
        index: usize,
        rotation: Rotation,
    ) -> Result<(), EngineError> {
        let page_id = page_id(doc, index)?;
        match doc.objects.get_mut(&page_id) {
            Some(Object::Dictionary(page)) => {
                page.set("Rotate", Object::Integer(rotation.degrees()));
                Ok(())
            }
            _ => Err(EngineError::Malformed(format!(
                "Page {} is not a dictionary",
                index + 1
            ))),
        }
    }

    fn import_pages(
        &self,
        dest: &mut Document,
        src: &Document,
        range: Option<&PageRange>,
        dest_index: usize,
    ) -> Result<(), EngineError> {
        let mut refs = page_refs(dest);
        if dest_index > refs.len() {
            return Err(EngineError::PageOutOfRange {
                index: dest_index,
                count: refs.len(),
            });
        }

        let source = self.compose(src, range)?;
        let source_pages = page_refs(&source);
        let source_max_id = source.max_id;

        // Shift every source object past the destination's ids
        let id_offset = dest.max_id;
        for (old_id, object) in source.objects.into_iter() {
            let new_id = (old_id.0 + id_offset, old_id.1);
            dest.objects
                .insert(new_id, remap_object_refs(object, id_offset));
        }
        dest.max_id = dest.max_id.max(source_max_id + id_offset);

        refs.splice(
            dest_index..dest_index,
            source_pages.iter().map(|id| (id.0 + id_offset, id.1)),
        );
        set_page_refs(dest, &refs)?;

        // Drop the source's catalog and page tree root
        dest.prune_objects();
        Ok(())
    }

    fn compose(&self, doc: &Document, range: Option<&PageRange>) -> Result<Document, EngineError> {
        let mut out = doc.clone();
        flatten_page_tree(&mut out)?;
        let refs = page_refs(&out);

        let selected = match range {
            None => refs,
            Some(range) => {
                let mut seen = HashSet::new();
                let mut selected = Vec::with_capacity(range.len());
                for page in range.pages() {
                    let id = page
                        .checked_sub(1)
                        .and_then(|i| refs.get(i as usize))
                        .copied()
                        .ok_or(EngineError::PageOutOfRange {
                            index: (page as usize).saturating_sub(1),
                            count: refs.len(),
                        })?;
                    if seen.insert(id) {
                        selected.push(id);
                    } else {
                        selected.push(duplicate_page(&mut out, id)?);
                    }
                }
                selected
            }
        };

        set_page_refs(&mut out, &selected)?;
        out.prune_objects();
        Ok(out)
    }

    fn save(&self, doc: &mut Document, out: &mut dyn Write) -> Result<(), EngineError> {
        let mut out = out;
        doc.compress();
        doc.save_to(&mut out)
            .map_err(|e| EngineError::Serialize(e.to_string()))
    }
}

/// Page object ids in page order
fn page_refs(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

fn page_id(doc: &Document, index: usize) -> Result<ObjectId, EngineError> {
    let refs = page_refs(doc);
    refs.get(index)
        .copied()
        .ok_or(EngineError::PageOutOfRange {
            index,
            count: refs.len(),
        })
}

/// Follow a single indirect reference
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.objects.get(id).unwrap_or(obj),
        other => other,
    }
}

/// Look up `key` on a page, falling back to its ancestors
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.objects.get(&page_id)?.as_dict().ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent_id = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.objects.get(&parent_id)?.as_dict().ok()?;
    }
    None
}

fn page_rotation(doc: &Document, page_id: ObjectId) -> Rotation {
    inherited(doc, page_id, b"Rotate")
        .and_then(|obj| resolve(doc, obj).as_i64().ok())
        .map(Rotation::from_degrees)
        .unwrap_or_default()
}

/// Parse a box array [x1, y1, x2, y2]
fn parse_box_array(doc: &Document, array: &[Object]) -> Option<[f64; 4]> {
    if array.len() != 4 {
        return None;
    }

    let mut result = [0.0; 4];
    for (i, obj) in array.iter().enumerate() {
        result[i] = match resolve(doc, obj) {
            Object::Integer(n) => *n as f64,
            Object::Real(n) => *n as f64,
            _ => return None,
        };
    }

    Some(result)
}

/// Find the root Pages node through the trailer's catalog
fn pages_root_id(doc: &Document) -> Result<ObjectId, EngineError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .map_err(|_| EngineError::Malformed("No Root in trailer".into()))?
        .as_reference()
        .map_err(|_| EngineError::Malformed("Root is not a reference".into()))?;

    let catalog = doc
        .objects
        .get(&catalog_id)
        .ok_or_else(|| EngineError::Malformed("Catalog not found".into()))?
        .as_dict()
        .map_err(|_| EngineError::Malformed("Invalid catalog".into()))?;

    catalog
        .get(b"Pages")
        .map_err(|_| EngineError::Malformed("No Pages in catalog".into()))?
        .as_reference()
        .map_err(|_| EngineError::Malformed("Pages is not a reference".into()))
}

/// Make `refs` the complete, flat page list of the document
fn set_page_refs(doc: &mut Document, refs: &[ObjectId]) -> Result<(), EngineError> {
    let pages_id = pages_root_id(doc)?;

    for id in refs {
        match doc.objects.get_mut(id) {
            Some(Object::Dictionary(page)) => page.set("Parent", Object::Reference(pages_id)),
            _ => {
                return Err(EngineError::Malformed(format!(
                    "Page object {} {} is missing",
                    id.0, id.1
                )))
            }
        }
    }

    if let Some(Object::Dictionary(ref mut pages_dict)) = doc.objects.get_mut(&pages_id) {
        let kids = refs
            .iter()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<_>>();
        pages_dict.set("Kids", Object::Array(kids));
        pages_dict.set("Count", Object::Integer(refs.len() as i64));
        Ok(())
    } else {
        Err(EngineError::Malformed("Invalid pages dictionary".into()))
    }
}

/// Copy inherited attributes onto each page and hang all pages off the root
fn flatten_page_tree(doc: &mut Document) -> Result<(), EngineError> {
    let refs = page_refs(doc);

    for &id in &refs {
        let missing = missing_inherited(doc, id);
        if let Some(Object::Dictionary(page)) = doc.objects.get_mut(&id) {
            for (key, value) in missing {
                page.set(key, value);
            }
        }
    }

    set_page_refs(doc, &refs)
}

fn missing_inherited(doc: &Document, page_id: ObjectId) -> Vec<(&'static [u8], Object)> {
    let Some(page) = doc.objects.get(&page_id).and_then(|obj| obj.as_dict().ok()) else {
        return Vec::new();
    };

    INHERITABLE
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .filter_map(|key| inherited(doc, page_id, key).map(|value| (key, value.clone())))
        .collect()
}

/// Give a page that appears twice its own page object; content is shared
fn duplicate_page(doc: &mut Document, id: ObjectId) -> Result<ObjectId, EngineError> {
    let page = doc
        .objects
        .get(&id)
        .cloned()
        .ok_or_else(|| EngineError::Malformed(format!("Page object {} {} is missing", id.0, id.1)))?;
    Ok(doc.add_object(page))
}

/// Recursively remap object references in an object
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}
