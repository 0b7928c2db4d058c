use markidx_core::memory::{MarkupData, MemoryDocument};
use markidx_core::types::ViewPhase;
use markidx_index::MarkupIndex;

#[tokio::test]
async fn drive_publishes_final_view_to_subscribers() {
    let doc = MemoryDocument::with_notes(50, 3);
    let mut index = MarkupIndex::default();
    let mut rx = index.subscribe();

    let generation = index.refresh(&doc, None, false);
    assert_eq!(rx.borrow_and_update().result.total_matching, 0);
    index.drive(&doc).await;

    assert!(rx.has_changed().unwrap());
    let view = rx.borrow_and_update().clone();
    assert_eq!(view.generation, generation);
    assert_eq!(view.phase, ViewPhase::Final);
    assert_eq!(view.result.total_matching, 150);
    assert_eq!(index.stats(&doc).search_entries, 150);
}

#[tokio::test]
async fn interleaved_commits_publish_latest_generation() {
    let mut doc = MemoryDocument::with_notes(200, 1);
    let mut index = MarkupIndex::default();
    index.refresh(&doc, None, false);
    // a couple of slices of the cold start, then the user edits
    index.pump(&doc);
    tokio::task::yield_now().await;
    index.pump(&doc);

    let added = doc.add_markup(199, MarkupData::note("text", "late addition")).unwrap();
    index.mark_page_dirty(199);
    let latest = index.commit(&doc, Some(added), false);
    index.drive(&doc).await;

    let view = index.current_view();
    assert_eq!(view.generation, latest);
    assert_eq!(view.result.total_matching, 201);
    assert_eq!(index.selection(), Some(&added));
    assert_eq!(index.dirty_page_count(&doc), 0);
}
