//! Page rotation
//!
//! Rotation is metadata only: each page's /Rotate entry is updated and the
//! content streams are left untouched.

use super::{inherited_attribute, load_pdf, save_document, TransformOutput};
use crate::error::ToolkitError;
use crate::file_set::SelectedFile;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Rotate every page of `file` by `angle_degrees`.
///
/// The new rotation is `(current + angle) mod 360`, applied uniformly to all
/// pages. Any integer angle is accepted; callers restrict it to quarter turns.
pub async fn rotate_pdf(
    file: &SelectedFile,
    angle_degrees: i32,
) -> Result<TransformOutput, ToolkitError> {
    let bytes = file.read().await?;
    let mut doc = load_pdf(&file.name, &bytes)?;

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    for &page_id in &page_ids {
        let current = effective_rotation(&doc, page_id);
        let rotation = add_rotation(current, angle_degrees);

        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| {
                ToolkitError::OperationError(format!(
                    "Page object {} {} R is not a dictionary: {}",
                    page_id.0, page_id.1, e
                ))
            })?;
        page.set("Rotate", Object::Integer(rotation as i64));
    }

    tracing::debug!(
        name = %file.name,
        pages = page_ids.len(),
        angle = angle_degrees,
        "rotated pages"
    );

    save_document(&mut doc)
}

/// Rotation of a page in degrees, normalized to [0, 360)
///
/// Reads /Rotate from the page, inheriting from the page tree if necessary.
pub fn effective_rotation(doc: &Document, page_id: ObjectId) -> i32 {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return 0;
    };
    rotation_of(doc, page)
}

fn rotation_of(doc: &Document, page: &Dictionary) -> i32 {
    let declared = match page.get(b"Rotate") {
        Ok(value) => Some(value.clone()),
        Err(_) => inherited_attribute(doc, page, b"Rotate"),
    };

    declared
        .and_then(|value| value.as_i64().ok())
        .map(|angle| angle.rem_euclid(360) as i32)
        .unwrap_or(0)
}

/// Normalize rotation to [0, 360)
pub fn normalize_rotation(angle: i32) -> i32 {
    angle.rem_euclid(360)
}

fn add_rotation(current: i32, angle: i32) -> i32 {
    (i64::from(current) + i64::from(angle)).rem_euclid(360) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{create_test_pdf, create_test_pdf_with_rotation};
    use pretty_assertions::assert_eq;

    fn rotations(bytes: &[u8]) -> Vec<i32> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .into_values()
            .map(|page_id| effective_rotation(&doc, page_id))
            .collect()
    }

    #[test]
    fn test_normalize_rotation() {
        assert_eq!(normalize_rotation(0), 0);
        assert_eq!(normalize_rotation(90), 90);
        assert_eq!(normalize_rotation(180), 180);
        assert_eq!(normalize_rotation(270), 270);
        assert_eq!(normalize_rotation(360), 0);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(-90), 270);
    }

    #[test]
    fn test_add_rotation_handles_extremes() {
        assert_eq!(add_rotation(270, 90), 0);
        assert_eq!(add_rotation(90, -180), 270);
        assert_eq!(add_rotation(0, i32::MAX), i32::MAX.rem_euclid(360));
        assert_eq!(
            add_rotation(270, i32::MIN),
            (270 + i64::from(i32::MIN)).rem_euclid(360) as i32
        );
    }

    #[tokio::test]
    async fn test_rotate_all_pages() {
        let file =
            SelectedFile::from_bytes("doc.pdf", "application/pdf", create_test_pdf(3, "R"));

        let output = rotate_pdf(&file, 90).await.unwrap();
        assert_eq!(output.page_count, 3);
        assert_eq!(rotations(&output.bytes), vec![90, 90, 90]);
    }

    #[tokio::test]
    async fn test_rotate_adds_to_inherited_rotation() {
        let bytes = create_test_pdf_with_rotation(2, "R", Some(180));
        let file = SelectedFile::from_bytes("doc.pdf", "application/pdf", bytes);

        let output = rotate_pdf(&file, 270).await.unwrap();
        assert_eq!(rotations(&output.bytes), vec![90, 90]);
    }

    #[tokio::test]
    async fn test_four_quarter_turns_restore_rotation() {
        let mut bytes = create_test_pdf_with_rotation(2, "R", Some(270));
        let original = rotations(&bytes);

        for _ in 0..4 {
            let file = SelectedFile::from_bytes("doc.pdf", "application/pdf", bytes);
            bytes = rotate_pdf(&file, 90).await.unwrap().bytes;
        }

        assert_eq!(rotations(&bytes), original);
    }

    #[tokio::test]
    async fn test_rotate_360_keeps_rotation() {
        let file =
            SelectedFile::from_bytes("doc.pdf", "application/pdf", create_test_pdf(1, "R"));
        let output = rotate_pdf(&file, 360).await.unwrap();
        assert_eq!(rotations(&output.bytes), vec![0]);
    }

    #[tokio::test]
    async fn test_rotate_rejects_non_pdf() {
        let file =
            SelectedFile::from_bytes("photo.png", "image/png", vec![0x89, b'P', b'N', b'G']);
        let err = rotate_pdf(&file, 90).await.unwrap_err();
        assert!(matches!(err, ToolkitError::InvalidPdfInput { .. }));
    }
}
