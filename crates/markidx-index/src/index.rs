use std::collections::VecDeque;

use markidx_core::cap::{effective_cap, CapConfiguration};
use markidx_core::config::IndexSettings;
use markidx_core::traits::{IndexObserver, MarkupSource};
use markidx_core::types::{
    DocumentIdentity, Generation, IndexView, IndexViewResult, MarkupRecord, MeasurementSummary, PageIndex, ViewPhase,
};
use markidx_text::{normalize_filter, WarmupStep};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::publish::{publish, PublishRequest};
use crate::scheduler::{ChunkOutcome, RebuildJob, Task, WarmupJob};
use crate::state::IndexState;
use crate::status::status_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub generation: u64,
    pub cached_pages: usize,
    pub dirty_pages: usize,
    pub cached_records: usize,
    pub search_entries: usize,
    pub queued_tasks: usize,
}

/// Incremental, filterable markup list over one open document.
///
/// All state is owned here and mutated only through `&mut self`, from the
/// one thread that also drives `pump`/`drive`. Callers report changes with
/// `mark_page_dirty` followed by `commit`; every refresh takes a fresh
/// generation, and queued work from older generations is dropped the next
/// time it comes up instead of publishing.
pub struct MarkupIndex {
    settings: IndexSettings,
    identity: Option<DocumentIdentity>,
    page_count: usize,
    state: IndexState,
    filter: String,
    generation: Generation,
    published: Generation,
    tasks: VecDeque<Task>,
    view: IndexView,
    selection: Option<MarkupRecord>,
    observers: Vec<Box<dyn IndexObserver>>,
    view_tx: watch::Sender<IndexView>,
}

impl Default for MarkupIndex {
    fn default() -> Self {
        Self::new(IndexSettings::default())
    }
}

impl MarkupIndex {
    pub fn new(settings: IndexSettings) -> Self {
        let (view_tx, _) = watch::channel(IndexView::default());
        Self {
            settings: settings.normalized(),
            identity: None,
            page_count: 0,
            state: IndexState::default(),
            filter: String::new(),
            generation: Generation::default(),
            published: Generation::default(),
            tasks: VecDeque::new(),
            view: IndexView::default(),
            selection: None,
            observers: Vec::new(),
            view_tx,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn IndexObserver>) {
        self.observers.push(observer);
    }

    /// Receiver that is updated on every publish, provisional or final.
    pub fn subscribe(&self) -> watch::Receiver<IndexView> {
        self.view_tx.subscribe()
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Takes effect on the next publish.
    pub fn configure_caps(&mut self, caps: CapConfiguration) {
        self.settings.caps = caps.normalized();
    }

    pub fn effective_cap(&self) -> usize {
        effective_cap(self.page_count, &self.settings.caps)
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Replaces the filter and refreshes, keeping the current selection if it
    /// still matches.
    pub fn set_filter(&mut self, source: &dyn MarkupSource, text: &str) -> Generation {
        self.filter = normalize_filter(text);
        self.refresh(source, self.selection, false)
    }

    pub fn mark_page_dirty(&mut self, page: PageIndex) {
        trace!(page, "page marked dirty");
        self.state.cache.mark_dirty(page);
    }

    /// Pages were inserted or removed: nothing cached can be trusted by position.
    pub fn invalidate_all(&mut self) {
        debug!(pages = self.state.cache.page_len(), "invalidating every cached page");
        self.state.cache.mark_all_dirty();
    }

    /// Drops all state and starts over for `identity`, cancelling queued work.
    pub fn reset_document(&mut self, identity: DocumentIdentity) {
        info!(identity = identity.0, "resetting markup index for document");
        self.identity = Some(identity);
        self.state.clear();
        self.tasks.clear();
        self.page_count = 0;
        self.generation = self.generation.next();
        let view = IndexView {
            generation: self.generation,
            phase: ViewPhase::Final,
            filter: self.filter.clone(),
            cap: self.effective_cap(),
            result: IndexViewResult::default(),
        };
        self.emit(view);
        self.notify_selection(None);
    }

    /// The one entry point for "something in the document changed".
    pub fn commit(&mut self, source: &dyn MarkupSource, select: Option<MarkupRecord>, force_immediate: bool) -> Generation {
        for observer in &mut self.observers {
            observer.document_modified();
        }
        self.refresh(source, select, force_immediate)
    }

    /// Starts a new generation. Forced refreshes rebuild and publish before
    /// returning; others queue a rebuild for `pump`/`drive`.
    pub fn refresh(&mut self, source: &dyn MarkupSource, select: Option<MarkupRecord>, force_immediate: bool) -> Generation {
        self.sync_document(source);
        self.page_count = source.page_count();
        self.generation = self.generation.next();
        let generation = self.generation;

        let pages = self.state.cache.dirty_pages(self.page_count);
        if pages.is_empty() {
            debug!(%generation, "no dirty pages");
            self.finish(generation, select, source);
            return generation;
        }

        let job = RebuildJob::new(generation, pages, force_immediate, select, &self.settings.rebuild).with_cold_start(
            self.state.cache.is_empty(),
            self.filter.is_empty(),
            &self.settings.provisional,
        );
        debug!(
            %generation,
            dirty = job.planned(),
            chunk = job.chunk_size(),
            force_immediate,
            cold_start = job.is_cold_start(),
            "rebuild scheduled"
        );
        if force_immediate {
            self.run_to_completion(job, source);
        } else {
            self.tasks.push_back(Task::Rebuild(job));
        }
        generation
    }

    /// Runs one cooperative slice: a rebuild chunk or a warmup slice.
    /// Returns whether work remains.
    pub fn pump(&mut self, source: &dyn MarkupSource) -> bool {
        let Some(task) = self.tasks.pop_front() else {
            return false;
        };
        if self.identity != Some(source.document_identity()) {
            debug!("document changed under queued work; restarting");
            self.refresh(source, None, false);
            return !self.tasks.is_empty();
        }
        if task.generation() != self.generation {
            debug!(stale = %task.generation(), current = %self.generation, "dropping superseded task");
            return !self.tasks.is_empty();
        }
        match task {
            Task::Rebuild(job) => self.step_rebuild(job, source),
            Task::Warmup(job) => self.step_warmup(job, source),
        }
        !self.tasks.is_empty()
    }

    pub fn run_until_idle(&mut self, source: &dyn MarkupSource) {
        while self.pump(source) {}
    }

    /// Drains queued work, yielding to the runtime between slices.
    pub async fn drive(&mut self, source: &dyn MarkupSource) {
        while self.pump(source) {
            tokio::task::yield_now().await;
        }
    }

    pub fn current_view(&self) -> &IndexView {
        &self.view
    }

    pub fn selection(&self) -> Option<&MarkupRecord> {
        self.selection.as_ref()
    }

    pub fn measurement_summary(&self) -> MeasurementSummary {
        self.state.measurements.total()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// True while a rebuild for the current generation is still queued.
    pub fn is_busy(&self) -> bool {
        self.tasks
            .iter()
            .any(|t| matches!(t, Task::Rebuild(job) if job.generation == self.generation))
    }

    /// `(processed, planned)` pages of the current rebuild, if one is queued.
    pub fn rebuild_progress(&self) -> Option<(usize, usize)> {
        self.tasks.iter().find_map(|t| match t {
            Task::Rebuild(job) if job.generation == self.generation => Some((job.processed(), job.planned())),
            _ => None,
        })
    }

    pub fn status_label(&self) -> String {
        status_label(&self.view, self.is_busy())
    }

    pub fn cached_page(&self, page: PageIndex) -> Option<&[MarkupRecord]> {
        self.state.cache.get(page)
    }

    pub fn is_page_dirty(&self, page: PageIndex) -> bool {
        self.state.cache.is_dirty(page)
    }

    /// Pages a refresh right now would rescan, measured against the
    /// document's current page count.
    pub fn dirty_page_count(&self, source: &dyn MarkupSource) -> usize {
        self.state.cache.dirty_pages(source.page_count()).len()
    }

    pub fn stats(&self, source: &dyn MarkupSource) -> IndexStats {
        IndexStats {
            generation: self.generation.0,
            cached_pages: self.state.cache.page_len(),
            dirty_pages: self.dirty_page_count(source),
            cached_records: self.state.cache.total_count(),
            search_entries: self.state.search.len(),
            queued_tasks: self.tasks.len(),
        }
    }

    fn sync_document(&mut self, source: &dyn MarkupSource) {
        let identity = source.document_identity();
        if self.identity != Some(identity) {
            self.reset_document(identity);
        }
    }

    fn run_to_completion(&mut self, mut job: RebuildJob, source: &dyn MarkupSource) {
        while job.run_chunk(&mut self.state, source) == ChunkOutcome::Pending {}
        self.finish(job.generation, job.select, source);
    }

    fn step_rebuild(&mut self, mut job: RebuildJob, source: &dyn MarkupSource) {
        match job.run_chunk(&mut self.state, source) {
            ChunkOutcome::Complete => self.finish(job.generation, job.select, source),
            ChunkOutcome::Pending => {
                if let Some(prefix) = job.take_provisional(&self.state, &self.settings.provisional) {
                    self.publish_provisional(job.generation, prefix, source);
                }
                self.tasks.push_front(Task::Rebuild(job));
            }
        }
    }

    fn step_warmup(&mut self, mut job: WarmupJob, source: &dyn MarkupSource) {
        if self.state.cache.has_dirty(source.page_count()) {
            trace!("dirty pages pending; warmup stopped");
            return;
        }
        match job.run_slice(&mut self.state, source, self.settings.warmup.slice_budget) {
            WarmupStep::Continue => self.tasks.push_back(Task::Warmup(job)),
            WarmupStep::Done => debug!(warmed = job.warmed(), "search warmup finished"),
        }
    }

    fn finish(&mut self, generation: Generation, select: Option<MarkupRecord>, source: &dyn MarkupSource) {
        self.page_count = source.page_count();
        let cap = self.effective_cap();
        let request = PublishRequest { filter: &self.filter, is_final: true, scanned_prefix: self.page_count, cap };
        let result = publish(&self.state.cache, &mut self.state.search, source, &request);
        info!(
            %generation,
            listed = result.listed.len(),
            total = result.total_matching,
            truncated = result.truncated,
            "published markup view"
        );
        self.emit(IndexView { generation, phase: ViewPhase::Final, filter: self.filter.clone(), cap, result });

        let restored = select.and_then(|s| self.view.result.listed.iter().find(|r| **r == s).copied());
        self.notify_selection(restored);

        if self.settings.warmup.enabled {
            if let Some(identity) = self.identity {
                self.tasks.push_back(Task::Warmup(WarmupJob::new(generation, identity)));
            }
        }
    }

    fn publish_provisional(&mut self, generation: Generation, scanned_prefix: usize, source: &dyn MarkupSource) {
        let cap = self.effective_cap();
        let request = PublishRequest { filter: &self.filter, is_final: false, scanned_prefix, cap };
        let result = publish(&self.state.cache, &mut self.state.search, source, &request);
        debug!(%generation, scanned_prefix, listed = result.listed.len(), "published provisional view");
        self.emit(IndexView { generation, phase: ViewPhase::Provisional, filter: self.filter.clone(), cap, result });
    }

    fn emit(&mut self, view: IndexView) {
        debug_assert!(view.generation >= self.published, "publish went backwards in generation");
        if view.generation < self.published {
            return;
        }
        self.published = view.generation;
        self.view = view;
        self.view_tx.send_replace(self.view.clone());
        for observer in &mut self.observers {
            observer.view_changed(&self.view);
        }
    }

    fn notify_selection(&mut self, selection: Option<MarkupRecord>) {
        self.selection = selection;
        for observer in &mut self.observers {
            observer.selection_changed(selection.as_ref());
        }
    }
}
