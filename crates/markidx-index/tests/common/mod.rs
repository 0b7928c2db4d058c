use std::cell::RefCell;
use std::rc::Rc;

use markidx_core::traits::IndexObserver;
use markidx_core::types::{IndexView, MarkupRecord};

#[derive(Debug, Default)]
pub struct Log {
    pub views: Vec<IndexView>,
    pub modified: usize,
    pub selections: Vec<Option<MarkupRecord>>,
}

/// Observer that records every callback into a shared log.
pub struct Recorder(pub Rc<RefCell<Log>>);

impl Recorder {
    pub fn new() -> (Box<dyn IndexObserver>, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        (Box::new(Recorder(Rc::clone(&log))), log)
    }
}

impl IndexObserver for Recorder {
    fn view_changed(&mut self, view: &IndexView) {
        self.0.borrow_mut().views.push(view.clone());
    }

    fn document_modified(&mut self) {
        self.0.borrow_mut().modified += 1;
    }

    fn selection_changed(&mut self, selection: Option<&MarkupRecord>) {
        self.0.borrow_mut().selections.push(selection.copied());
    }
}
