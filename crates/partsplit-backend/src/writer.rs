//! Per-instrument PDF output.
//!
//! Each split becomes its own document: a copy of the source whose page tree
//! is replaced by a flat list of the split's pages, in the order given.
//! Objects only the dropped pages referenced are pruned before saving.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use lopdf::{Document, Object, ObjectId};
use thiserror::Error;

use partsplit_core::{Split, split_file_name};

/// Page attributes a page may inherit from its `Pages` ancestors.
const INHERITED_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Deepest page tree walked when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 32;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to parse PDF: {0}")]
    Parse(String),
    #[error("invalid page range: {0}")]
    InvalidRange(String),
    #[error("failed to save PDF: {0}")]
    Save(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for WriteError {
    fn from(e: lopdf::Error) -> Self {
        WriteError::Parse(e.to_string())
    }
}

/// Extract the given pages (1-based) of the PDF in `bytes` into a new PDF.
///
/// Pages appear in the output in the order listed. Listing a page twice is
/// an error.
pub fn extract_pages(bytes: &[u8], pages: &[u32]) -> Result<Vec<u8>, WriteError> {
    if pages.is_empty() {
        return Err(WriteError::InvalidRange("no pages specified".into()));
    }

    let doc = Document::load_mem(bytes)?;
    build_part(&doc, pages)
}

/// Resolve 1-based page numbers to page object ids, rejecting unknown and
/// repeated pages.
fn page_ids(doc: &Document, pages: &[u32]) -> Result<Vec<ObjectId>, WriteError> {
    let all = doc.get_pages();
    let mut seen = HashSet::with_capacity(pages.len());
    pages
        .iter()
        .map(|&page| {
            if page == 0 {
                return Err(WriteError::InvalidRange("page numbers start at 1".into()));
            }
            if !seen.insert(page) {
                return Err(WriteError::InvalidRange(format!("page {page} listed twice")));
            }
            all.get(&page).copied().ok_or_else(|| {
                WriteError::InvalidRange(format!(
                    "page {} does not exist (document has {} pages)",
                    page,
                    all.len()
                ))
            })
        })
        .collect()
}

/// First value of `key` on the `Pages` chain above `node`.
fn inherited(doc: &Document, node: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(node).ok()?.get(b"Parent").ok()?.as_reference().ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn build_part(doc: &Document, pages: &[u32]) -> Result<Vec<u8>, WriteError> {
    let ids = page_ids(doc, pages)?;
    let root = doc.catalog()?.get(b"Pages")?.as_reference()?;

    let mut out = doc.clone();
    for &id in &ids {
        // pages get reparented to the root, so copy down what they inherited
        let missing: Vec<(&[u8], Object)> = INHERITED_KEYS
            .iter()
            .filter(|key| doc.get_dictionary(id).is_ok_and(|d| !d.has(key)))
            .filter_map(|&key| inherited(doc, id, key).map(|value| (key, value)))
            .collect();

        let page = out.get_object_mut(id)?.as_dict_mut()?;
        for (key, value) in missing {
            page.set(key, value);
        }
        page.set("Parent", Object::Reference(root));
    }

    let tree = out.get_object_mut(root)?.as_dict_mut()?;
    tree.set(
        "Kids",
        Object::Array(ids.iter().copied().map(Object::Reference).collect()),
    );
    tree.set("Count", Object::Integer(ids.len() as i64));

    out.prune_objects();
    out.compress();

    let mut buffer = Vec::new();
    out.save_to(&mut buffer)
        .map_err(|e| WriteError::Save(e.to_string()))?;
    Ok(buffer)
}

/// Write one PDF per split into `out_dir`, named `<source stem>-<Instrument>.pdf`.
///
/// When two splits share an instrument the later files get a `-2`, `-3`, ...
/// suffix instead of overwriting the first. Returns the written paths in
/// split order.
pub fn write_splits(
    source: &Path,
    splits: &[Split],
    out_dir: &Path,
) -> Result<Vec<PathBuf>, WriteError> {
    let bytes = std::fs::read(source)?;
    let doc = Document::load_mem(&bytes)?;
    std::fs::create_dir_all(out_dir)?;

    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "split".to_string());

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut written = Vec::with_capacity(splits.len());
    for split in splits {
        let mut file_name = split_file_name(&base, &split.instrument);
        let count = seen.entry(file_name.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            let stem = file_name.trim_end_matches(".pdf");
            file_name = format!("{stem}-{count}.pdf");
        }

        if split.pages.is_empty() {
            return Err(WriteError::InvalidRange(format!(
                "split {:?} has no pages",
                split.instrument
            )));
        }
        let pages = split
            .pages
            .iter()
            .map(|&p| {
                u32::try_from(p).map_err(|_| {
                    WriteError::InvalidRange(format!("page {p} is out of range for a PDF"))
                })
            })
            .collect::<Result<Vec<u32>, _>>()?;
        let pdf = build_part(&doc, &pages)?;

        let path = out_dir.join(&file_name);
        std::fs::write(&path, pdf)?;
        tracing::info!(
            instrument = %split.instrument,
            range = %split.page_range_label(),
            path = %path.display(),
            "split written"
        );
        written.push(path);
    }
    Ok(written)
}
