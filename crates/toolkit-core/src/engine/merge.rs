//! PDF Merge algorithm
//!
//! Combines multiple PDFs into a single document.

use super::{
    inherited_attribute, load_pdf, save_document, TransformOutput, INHERITABLE_ATTRIBUTES,
};
use crate::error::ToolkitError;
use crate::file_set::SelectedFile;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Merge PDFs into one, in file order then page order
///
/// The algorithm:
/// 1. If empty, return error
/// 2. Create a new destination document with an empty page tree
/// 3. For each source document:
///    a. Renumber its objects above the destination's highest ID
///    b. Copy inherited page attributes onto each page
///    c. Import every object except its catalog and page-tree nodes
///    d. Re-parent its pages under the destination page tree
/// 4. Compress and return the merged result
pub async fn merge_pdfs(files: &[SelectedFile]) -> Result<TransformOutput, ToolkitError> {
    if files.is_empty() {
        return Err(ToolkitError::OperationError("No documents to merge".into()));
    }

    let mut dest = Document::with_version("1.7");
    let pages_id = dest.new_object_id();
    let mut kids: Vec<ObjectId> = Vec::new();

    for file in files {
        let bytes = file.read().await?;
        let source = load_pdf(&file.name, &bytes)?;
        let page_ids = append_document(&mut dest, source, pages_id)?;
        tracing::debug!(name = %file.name, pages = page_ids.len(), "merged document");
        kids.extend(page_ids);
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        (
            "Kids",
            Object::Array(kids.iter().map(|&id| Object::Reference(id)).collect()),
        ),
    ]);
    dest.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = dest.add_object(catalog);
    dest.trailer.set("Root", Object::Reference(catalog_id));

    // Drop source trailers, info dictionaries and outlines nothing points at anymore
    dest.prune_objects();
    dest.compress();

    save_document(&mut dest)
}

/// Move every page of `source` into `dest`, returning the new page IDs in order
fn append_document(
    dest: &mut Document,
    mut source: Document,
    parent: ObjectId,
) -> Result<Vec<ObjectId>, ToolkitError> {
    source.renumber_objects_with(dest.max_id + 1);

    let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
    for &page_id in &page_ids {
        flatten_inherited_attributes(&mut source, page_id);
    }

    let catalog_id = source
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .ok();
    let source_max_id = source.max_id;

    for (id, object) in source.objects {
        if Some(id) == catalog_id || is_page_tree_node(&object) {
            continue;
        }
        dest.objects.insert(id, object);
    }
    dest.max_id = dest.max_id.max(source_max_id);

    for &page_id in &page_ids {
        match dest.objects.get_mut(&page_id) {
            Some(Object::Dictionary(page)) => page.set("Parent", Object::Reference(parent)),
            _ => {
                return Err(ToolkitError::OperationError(format!(
                    "Page object {} {} R is not a dictionary",
                    page_id.0, page_id.1
                )))
            }
        }
    }

    Ok(page_ids)
}

/// Copy attributes the page inherits from its old page tree onto the page itself
fn flatten_inherited_attributes(doc: &mut Document, page_id: ObjectId) {
    let inherited: Vec<(&[u8], Object)> = match doc.get_dictionary(page_id) {
        Ok(page) => INHERITABLE_ATTRIBUTES
            .iter()
            .filter(|key| !page.has(key))
            .filter_map(|&key| inherited_attribute(doc, page, key).map(|value| (key, value)))
            .collect(),
        Err(_) => return,
    };

    if inherited.is_empty() {
        return;
    }

    if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
        for (key, value) in inherited {
            page.set(key.to_vec(), value);
        }
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    object
        .as_dict()
        .ok()
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(|kind| kind.as_name().ok())
        == Some(b"Pages".as_slice())
}
