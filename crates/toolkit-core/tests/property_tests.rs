//! Property-based tests for toolkit-core
//!
//! Checks the FileSet selection laws, reordering, rotation arithmetic and
//! file-size formatting using proptest.

use futures::executor::block_on;
use lopdf::{Dictionary, Document, Object};
use proptest::prelude::*;
use toolkit_core::engine::{effective_rotation, normalize_rotation, rotate_pdf};
use toolkit_core::profile::{self, ToolId};
use toolkit_core::{format_file_size, Direction, FileSet, SelectedFile};

fn named_files(prefix: &str, count: usize) -> Vec<SelectedFile> {
    (0..count)
        .map(|i| {
            SelectedFile::from_bytes(format!("{}-{}.pdf", prefix, i), "application/pdf", vec![])
        })
        .collect()
}

fn names(set: &FileSet) -> Vec<String> {
    set.iter().map(|f| f.name.clone()).collect()
}

/// One-page PDF with an explicit /Rotate
fn rotated_pdf(rotation: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Rotate", Object::Integer(rotation)),
    ]));
    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(1)),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
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

fn first_page_rotation(bytes: &[u8]) -> i32 {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    effective_rotation(&doc, page_id)
}

fn quarter_turn() -> impl Strategy<Value = i32> {
    prop_oneof![Just(90), Just(180), Just(270), Just(360)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ============================================================
    // FileSet selection laws
    // ============================================================

    #[test]
    fn multiple_mode_appends_every_batch(batches in prop::collection::vec(0usize..5, 1..6)) {
        let merge = profile::lookup(ToolId::MergePdf).unwrap();
        let mut set = FileSet::new();
        let mut expected = Vec::new();

        for (i, count) in batches.iter().enumerate() {
            let batch = named_files(&format!("batch{}", i), *count);
            expected.extend(batch.iter().map(|f| f.name.clone()));
            set.set_from_selection(batch, merge);
        }

        prop_assert_eq!(set.len(), batches.iter().sum::<usize>());
        prop_assert_eq!(names(&set), expected);
    }

    #[test]
    fn single_mode_replaces_with_first_file(before in 0usize..3, batch_len in 1usize..5) {
        let rotate = profile::lookup(ToolId::RotatePdf).unwrap();
        let mut set = FileSet::new();
        set.set_from_selection(named_files("old", before), rotate);

        set.set_from_selection(named_files("new", batch_len), rotate);

        prop_assert_eq!(names(&set), vec!["new-0.pdf".to_string()]);
    }

    // ============================================================
    // Reordering
    // ============================================================

    #[test]
    fn swap_adjacent_is_an_involution(len in 1usize..10, index in 0usize..12, up in any::<bool>()) {
        let merge = profile::lookup(ToolId::MergePdf).unwrap();
        let mut set = FileSet::new();
        set.set_from_selection(named_files("f", len), merge);
        let original = names(&set);

        let direction = if up { Direction::Up } else { Direction::Down };
        if set.swap_adjacent(index, direction) {
            let moved_to = if up { index - 1 } else { index + 1 };
            prop_assert!(set.swap_adjacent(moved_to, direction.reverse()));
        }

        prop_assert_eq!(names(&set), original);
    }

    // ============================================================
    // Rotation
    // ============================================================

    #[test]
    fn normalized_rotation_is_in_range(angle in any::<i32>()) {
        let normalized = normalize_rotation(angle);
        prop_assert!((0..360).contains(&normalized));
        prop_assert_eq!(normalize_rotation(normalized), normalized);
    }

    #[test]
    fn rotation_adds_modulo_360(
        initial in prop_oneof![Just(0i64), Just(90), Just(180), Just(270)],
        angle in quarter_turn()
    ) {
        let file = SelectedFile::from_bytes("doc.pdf", "application/pdf", rotated_pdf(initial));
        let output = block_on(rotate_pdf(&file, angle)).unwrap();

        let expected = (initial as i32 + angle).rem_euclid(360);
        prop_assert_eq!(first_page_rotation(&output.bytes), expected);
    }

    #[test]
    fn four_identical_turns_restore_rotation(
        initial in prop_oneof![Just(0i64), Just(90), Just(180), Just(270)],
        angle in quarter_turn()
    ) {
        let mut bytes = rotated_pdf(initial);
        for _ in 0..4 {
            let file = SelectedFile::from_bytes("doc.pdf", "application/pdf", bytes);
            bytes = block_on(rotate_pdf(&file, angle)).unwrap().bytes;
        }

        prop_assert_eq!(first_page_rotation(&bytes), initial as i32);
    }

    // ============================================================
    // File sizes
    // ============================================================

    #[test]
    fn file_size_has_known_unit(bytes in any::<u64>()) {
        let label = format_file_size(bytes);
        let (value, unit) = label.split_once(' ').unwrap();
        prop_assert!(["Bytes", "KB", "MB", "GB"].contains(&unit));
        prop_assert!(value.parse::<f64>().is_ok());
    }
}
