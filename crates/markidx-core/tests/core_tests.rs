use std::fs;

use tempfile::TempDir;

use markidx_core::config::Config;
use markidx_core::memory::{MarkupData, MemoryDocument};
use markidx_core::traits::MarkupSource;
use markidx_core::Error;

#[test]
fn load_from_file_overlays_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("markidx.toml");
    fs::write(
        &path,
        "[caps]\nmin_indexed = 5000\nmax_indexed = 10\n\n[rebuild]\nbackground_chunk = 8\n",
    )
    .unwrap();

    let cfg = Config::load_from(path.to_string_lossy()).expect("load");
    let settings = cfg.index_settings().expect("settings");
    // swapped bounds are reordered, not rejected
    assert_eq!(settings.caps.min_indexed, 10);
    assert_eq!(settings.caps.max_indexed, 5000);
    assert_eq!(settings.rebuild.background_chunk, 8);
    assert_eq!(cfg.get::<usize>("rebuild.forced_chunk").unwrap(), 32);
}

#[test]
fn load_from_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    assert!(Config::load_from(missing.to_string_lossy()).is_err());
}

#[test]
fn memory_document_mutations() {
    let mut doc = MemoryDocument::new(3);
    let a = doc.add_markup(0, MarkupData::note("text", "steel beam")).unwrap();
    let b = doc.add_markup(0, MarkupData::measurement(2.5)).unwrap();
    assert_eq!(doc.page_markups(0).unwrap(), vec![a, b]);
    assert_eq!(doc.markup_measurement_value(&b), Some(2.5));
    assert_eq!(doc.markup_measurement_value(&a), None);

    assert_eq!(doc.move_markup(a.handle, 2).unwrap(), (0, 2));
    assert_eq!(doc.page_markups(2).unwrap().len(), 1);
    assert_eq!(doc.remove_markup(b.handle).unwrap(), 0);
    assert!(doc.markup_kind_tag(&b).is_none());
    assert!(matches!(doc.remove_markup(b.handle), Err(Error::MarkupNotFound(_))));

    doc.fail_page(1, true);
    assert!(doc.page_markups(1).is_err());
    assert_eq!(doc.take_reads(), vec![0, 2, 1]);
    assert!(doc.take_reads().is_empty());
}

#[test]
fn documents_get_distinct_identities() {
    let a = MemoryDocument::new(1);
    let b = MemoryDocument::new(1);
    assert_ne!(a.document_identity(), b.document_identity());
}
