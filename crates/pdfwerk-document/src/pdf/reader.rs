// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: load documents from memory, merge several into one, and cut
// a page range out of one, using the `lopdf` crate.

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::types::PageRange;
use tracing::{debug, info, instrument, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guard against cyclic `/Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// Reads and restructures existing PDF files.
///
/// Wraps `lopdf::Document`. Operations never modify the source; they return
/// the serialised bytes of a new document.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            PdfwerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    // -- Split ----------------------------------------------------------------

    /// Copy pages `range.start..=range.end` into a new document.
    ///
    /// The range is validated against this document first; pages outside it
    /// are removed from a copy and unreachable objects are pruned.
    #[instrument(skip(self), fields(start = range.start, end = range.end))]
    pub fn split(&self, range: PageRange) -> Result<Vec<u8>> {
        let total = self.page_count();
        range.validate(total)?;

        info!(total, kept = range.len(), "Splitting PDF");

        let mut doc = self.document.clone();
        let outside: Vec<u32> = (1..=total)
            .filter(|page| *page < range.start || *page > range.end)
            .collect();
        if !outside.is_empty() {
            doc.delete_pages(&outside);
        }
        doc.prune_objects();

        let output = serialise(&mut doc, "split")?;
        debug!(output_bytes = output.len(), "Split complete");
        Ok(output)
    }

    // -- Merge ----------------------------------------------------------------

    /// Merge `documents` into one PDF. Pages appear in input order, and in
    /// page order within each input.
    ///
    /// Fewer than two documents is an input error.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub fn merge(documents: Vec<PdfReader>) -> Result<Vec<u8>> {
        if documents.len() < 2 {
            return Err(PdfwerkError::InputValidation(
                "select at least two PDF files to merge".into(),
            ));
        }

        let mut merged = Document::with_version("1.5");
        let mut page_ids: Vec<ObjectId> = Vec::new();
        let mut next_id = 1;

        for (index, reader) in documents.into_iter().enumerate() {
            let mut doc = reader.document;
            doc.renumber_objects_with(next_id);

            // `get_pages` is keyed by page number, so values come out in
            // page order.
            let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
            for &page_id in &pages {
                materialize_inherited(&mut doc, page_id)?;
            }
            debug!(input = index + 1, pages = pages.len(), "Collected pages");

            next_id = doc.max_id + 1;
            for (id, object) in doc.objects {
                // Each input's catalog and page-tree nodes are replaced by a
                // single new tree below.
                if is_tree_node(&object) {
                    continue;
                }
                merged.objects.insert(id, object);
            }
            page_ids.extend(pages);
        }

        let pages_id = (next_id, 0);
        let catalog_id = (next_id + 1, 0);

        for page_id in &page_ids {
            match merged.objects.get_mut(page_id) {
                Some(Object::Dictionary(page)) => page.set("Parent", Object::Reference(pages_id)),
                _ => warn!(?page_id, "Page object missing after renumbering"),
            }
        }

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(page_ids.len() as i64));
        pages.set(
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        );
        merged.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        merged.objects.insert(catalog_id, Object::Dictionary(catalog));

        merged.trailer.set("Root", Object::Reference(catalog_id));
        merged.max_id = catalog_id.0;

        merged.prune_objects();
        merged.compress();

        info!(pages = page_ids.len(), "Merged PDFs");
        let output = serialise(&mut merged, "merged")?;
        debug!(output_bytes = output.len(), "Merge complete");
        Ok(output)
    }

    /// [`PdfReader::merge`] over raw byte buffers.
    pub fn merge_bytes<B: AsRef<[u8]>>(inputs: &[B]) -> Result<Vec<u8>> {
        if inputs.len() < 2 {
            return Err(PdfwerkError::InputValidation(
                "select at least two PDF files to merge".into(),
            ));
        }
        let readers = inputs
            .iter()
            .enumerate()
            .map(|(index, bytes)| {
                Self::from_bytes(bytes.as_ref()).map_err(|err| {
                    PdfwerkError::PdfError(format!("input #{}: {}", index + 1, err))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::merge(readers)
    }
}

// -- Helpers ------------------------------------------------------------------

fn serialise(doc: &mut Document, what: &str) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    doc.save_to(&mut output).map_err(|err| {
        PdfwerkError::PdfError(format!("failed to serialise {} PDF: {}", what, err))
    })?;
    Ok(output)
}

fn is_tree_node(object: &Object) -> bool {
    let Ok(dict) = object.as_dict() else {
        return false;
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Catalog") | Ok(b"Pages")
    )
}

/// Copy inherited attributes onto the page itself, so the page keeps its
/// size and resources once it is moved under a different parent.
fn materialize_inherited(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let page = doc.get_dictionary(page_id).map_err(|err| {
        PdfwerkError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
    })?;

    let mut missing: Vec<&[u8]> = INHERITABLE
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut inherited: Vec<(Vec<u8>, Object)> = Vec::new();
    let mut depth = 0;

    while let Some(node_id) = parent {
        if missing.is_empty() || depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                inherited.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    if inherited.is_empty() {
        return Ok(());
    }
    let page = doc.get_dictionary_mut(page_id).map_err(|err| {
        PdfwerkError::PdfError(format!("cannot update page object {:?}: {}", page_id, err))
    })?;
    for (key, value) in inherited {
        page.set(key, value);
    }
    Ok(())
}
