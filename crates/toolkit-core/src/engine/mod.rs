//! Transformation engine
//!
//! Turns a tool identity plus the staged files into a single PDF buffer.
//! Byte-level PDF work is done with lopdf; this module owns dispatch,
//! file reading, and error mapping.

mod images;
mod merge;
mod rotate;

pub use images::images_to_pdf;
pub use merge::merge_pdfs;
pub use rotate::{effective_rotation, normalize_rotation, rotate_pdf};

use crate::error::ToolkitError;
use crate::file_set::SelectedFile;
use crate::profile::ToolId;
use futures::future::LocalBoxFuture;
use lopdf::{Dictionary, Document, Object};

/// Signature every serialized PDF starts with
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Check the output-integrity gate
pub fn has_pdf_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_SIGNATURE)
}

/// Everything a transformation needs, detached from the pipeline
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub tool: ToolId,
    pub files: Vec<SelectedFile>,
    /// Only read by `RotatePdf`
    pub angle_degrees: i32,
}

/// Serialized result of a transformation
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub bytes: Vec<u8>,
    pub page_count: u32,
}

/// A transformation backend.
///
/// The returned future must not outlive the request; it runs on the caller's
/// thread and never blocks other pending work beyond its own I/O.
pub trait Transform {
    fn transform<'a>(
        &'a self,
        request: &'a TransformRequest,
    ) -> LocalBoxFuture<'a, Result<TransformOutput, ToolkitError>>;
}

/// The lopdf-backed engine
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl Transform for LopdfEngine {
    fn transform<'a>(
        &'a self,
        request: &'a TransformRequest,
    ) -> LocalBoxFuture<'a, Result<TransformOutput, ToolkitError>> {
        Box::pin(async move {
            match request.tool {
                ToolId::MergePdf => merge_pdfs(&request.files).await,
                ToolId::RotatePdf => {
                    let file = request.files.first().ok_or_else(|| {
                        ToolkitError::OperationError("No PDF selected to rotate".into())
                    })?;
                    rotate_pdf(file, request.angle_degrees).await
                }
                ToolId::ImageToPdf => images_to_pdf(&request.files).await,
            }
        })
    }
}

/// Parse a selected file as a PDF
pub(crate) fn load_pdf(name: &str, bytes: &[u8]) -> Result<Document, ToolkitError> {
    Document::load_mem(bytes).map_err(|e| ToolkitError::InvalidPdfInput {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Attributes a page may inherit from its ancestors in the page tree
pub(crate) const INHERITABLE_ATTRIBUTES: [&[u8]; 4] =
    [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic /Parent chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

/// Resolve `key` on the nearest ancestor of `page` that defines it
pub(crate) fn inherited_attribute(
    doc: &Document,
    page: &Dictionary,
    key: &[u8],
) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(parent_id) = parent {
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        let node = doc.get_dictionary(parent_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    None
}

/// Serialize a finished document
pub(crate) fn save_document(doc: &mut Document) -> Result<TransformOutput, ToolkitError> {
    let page_count = doc.get_pages().len() as u32;

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ToolkitError::OperationError(format!("Failed to save PDF: {}", e)))?;

    Ok(TransformOutput {
        bytes: buffer,
        page_count,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};

    /// Create a PDF with `num_pages` pages whose content reads "{prefix}-Page-{n}"
    pub fn create_test_pdf(num_pages: u32, prefix: &str) -> Vec<u8> {
        create_test_pdf_with_rotation(num_pages, prefix, None)
    }

    /// Same as `create_test_pdf`, with an optional /Rotate on the page tree root
    pub fn create_test_pdf_with_rotation(
        num_pages: u32,
        prefix: &str,
        inherited_rotation: Option<i64>,
    ) -> Vec<u8> {
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
                    Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            format!("{}-Page-{}", prefix, i + 1).into_bytes(),
                            lopdf::StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
            ]);
            let page_id = doc.add_object(page);
            page_ids.push(page_id);
        }

        let mut pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(num_pages as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
        ]);
        if let Some(rotation) = inherited_rotation {
            pages.set("Rotate", Object::Integer(rotation));
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    /// Page texts of a document in page order
    pub fn page_texts(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|&page_id| {
                String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
            })
            .collect()
    }
}
