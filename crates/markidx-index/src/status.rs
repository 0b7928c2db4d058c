use markidx_core::types::IndexView;

/// Count label for the markup list.
///
/// Provisional views read as loading, a final view with newer work behind it
/// reads as updating, and a truncated view asks the user to narrow the filter.
pub fn status_label(view: &IndexView, busy: bool) -> String {
    let listed = view.result.listed.len();
    let total = view.result.total_matching;
    if view.is_provisional() {
        return format!("Loading… {} shown", listed);
    }
    if busy {
        return "Updating…".to_string();
    }
    if view.result.truncated {
        return format!("{} of {} items (refine filter)", listed, total);
    }
    match total {
        1 => "1 item".to_string(),
        n => format!("{} items", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markidx_core::types::{IndexViewResult, MarkupHandle, MarkupRecord, ViewPhase};

    fn view(listed: usize, total: usize, phase: ViewPhase) -> IndexView {
        let listed = (0..listed as u64).map(|i| MarkupRecord::new(MarkupHandle(i), 0)).collect();
        IndexView { phase, result: IndexViewResult { listed, total_matching: total, truncated: total > 3 }, ..Default::default() }
    }

    #[test]
    fn labels() {
        assert_eq!(status_label(&view(2, 2, ViewPhase::Provisional), false), "Loading… 2 shown");
        assert_eq!(status_label(&view(2, 2, ViewPhase::Final), true), "Updating…");
        assert_eq!(status_label(&view(3, 9, ViewPhase::Final), false), "3 of 9 items (refine filter)");
        assert_eq!(status_label(&view(1, 1, ViewPhase::Final), false), "1 item");
        assert_eq!(status_label(&view(0, 0, ViewPhase::Final), false), "0 items");
    }
}
