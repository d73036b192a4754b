use std::cmp::Ordering;

use tracing::debug;

use crate::model::{Chart, SongSet};

use super::criteria::{Criteria, SortMode};
use super::library::Library;
use super::view::{CarouselView, ChartPanel, PanelState, SetPanel};

/// Quiescence window for debounced filter passes, in microseconds.
pub const FILTER_DEBOUNCE_US: i64 = 250_000;

/// Build the ordered, visibility-annotated view for the given criteria.
///
/// Sets are stably sorted by the criteria's sort key, string keys compared
/// case-sensitively, so equal keys keep library insertion order. Charts
/// inside a set are always ordered (ruleset, rating) ascending regardless
/// of the set-level sort mode.
pub fn build_view(library: &Library, criteria: &Criteria) -> CarouselView {
    let needle = criteria.search.to_lowercase();

    let mut order: Vec<&SongSet> = library.sets().iter().collect();
    order.sort_by(|a, b| compare_sets(a, b, criteria.sort));

    let panels = order
        .into_iter()
        .map(|set| build_set_panel(set, criteria, &needle))
        .collect();

    debug!("filter pass over {} sets", library.len());
    CarouselView { panels }
}

fn build_set_panel(set: &SongSet, criteria: &Criteria, needle: &str) -> SetPanel {
    let mut rows: Vec<&Chart> = set.charts.iter().collect();
    rows.sort_by(|a, b| {
        a.ruleset
            .cmp(&b.ruleset)
            .then_with(|| a.rating.total_cmp(&b.rating))
    });

    let charts: Vec<ChartPanel> = rows
        .into_iter()
        .map(|chart| ChartPanel {
            chart_id: chart.id,
            visible: !chart.hidden && criteria.matches_lowered(needle, set, chart),
            state: PanelState::NotSelected,
        })
        .collect();

    let visible = charts.iter().any(|c| c.visible);
    SetPanel {
        set_id: set.id,
        visible,
        state: PanelState::NotSelected,
        charts,
    }
}

fn compare_sets(a: &SongSet, b: &SongSet, sort: SortMode) -> Ordering {
    match sort {
        SortMode::Title => a.title.cmp(&b.title),
        SortMode::Artist => a.artist.cmp(&b.artist),
        SortMode::Author => a.author.cmp(&b.author),
        SortMode::Rating => a.max_rating().total_cmp(&b.max_rating()),
        // newest imports first
        SortMode::DateAdded => b.added_at.cmp(&a.added_at),
    }
}

/// Cancel-and-replace scheduler for debounced filter passes.
///
/// Holds at most one pending pass; a later `defer` supersedes an earlier
/// one, so only the last call in a burst executes. The superseded pass is
/// simply never run. Dropping the owner drops the pending pass with it.
#[derive(Default)]
pub struct FilterScheduler {
    pending: Option<(Criteria, i64)>,
}

impl FilterScheduler {
    /// Schedule `criteria`, restarting the quiescence window from `now_us`.
    pub fn defer(&mut self, criteria: Criteria, now_us: i64) {
        self.pending = Some((criteria, now_us + FILTER_DEBOUNCE_US));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Take the pending criteria once its quiescence window has elapsed.
    pub fn take_due(&mut self, now_us: i64) -> Option<Criteria> {
        match &self.pending {
            Some((_, deadline)) if now_us >= *deadline => {
                self.pending.take().map(|(criteria, _)| criteria)
            }
            _ => None,
        }
    }

    /// Take the pending criteria regardless of the window. Structural
    /// mutations recompute on the latest criteria immediately.
    pub fn take_latest(&mut self) -> Option<Criteria> {
        self.pending.take().map(|(criteria, _)| criteria)
    }
}
