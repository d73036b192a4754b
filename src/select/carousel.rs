use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::debug;

use crate::clock::{Clock, MonotonicClock};
use crate::model::{Chart, ChartId, SetId, SongSet};

use super::criteria::Criteria;
use super::filter::{build_view, FilterScheduler};
use super::library::{Library, MembershipChange};
use super::selection::{Direction, RandomMode, Recommender, SelectionController};
use super::view::CarouselView;

/// Outward notification, drained by the embedding client via
/// `take_events`. Membership events fire only on structural add/remove,
/// decoupled from per-filter visibility churn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarouselEvent {
    SetAdded(SetId),
    SetRemoved(SetId),
    SelectionChanged(Option<ChartId>),
}

/// The song-select carousel: hierarchy, criteria, computed view and
/// selection state behind one facade.
///
/// All entry points are expected to run serialized on one logical owner
/// thread; the debounced filter pass is the only deferred work, and it
/// fires from `update`, never from another thread.
pub struct Carousel {
    library: Library,
    criteria: Criteria,
    view: CarouselView,
    selection: SelectionController,
    scheduler: FilterScheduler,
    clock: Rc<dyn Clock>,
    rng: SmallRng,
    events: Vec<CarouselEvent>,
}

impl Carousel {
    pub fn new() -> Self {
        Self::with_clock(Rc::new(MonotonicClock::new()))
    }

    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            library: Library::new(),
            criteria: Criteria::default(),
            view: CarouselView::default(),
            selection: SelectionController::new(),
            scheduler: FilterScheduler::default(),
            clock,
            rng: SmallRng::from_entropy(),
            events: Vec::new(),
        }
    }

    /// Reseed the random source. Deterministic tests call this before
    /// loading the hierarchy.
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    // ---- hierarchy mutation ----

    /// Wholesale replace of the hierarchy. A previously requested chart
    /// survives by identity when the new collection still contains it.
    pub fn replace_all(&mut self, sets: Vec<SongSet>) {
        let change = self.library.replace_all(sets);
        self.emit_membership(change);
        self.refilter_now();
    }

    pub fn upsert(&mut self, set: SongSet) {
        let change = self.library.upsert(set);
        self.emit_membership(change);
        self.refilter_now();
    }

    pub fn remove(&mut self, id: SetId) {
        let change = self.library.remove(id);
        self.emit_membership(change);
        self.refilter_now();
    }

    pub fn set_chart_hidden(&mut self, id: ChartId, hidden: bool) {
        if self.library.set_chart_hidden(id, hidden) {
            self.refilter_now();
        }
    }

    pub fn set_chart_rating(&mut self, id: ChartId, rating: f64) {
        if self.library.set_chart_rating(id, rating) {
            self.refilter_now();
        }
    }

    // ---- filtering ----

    /// Apply new criteria. Debounced application defers the pass by the
    /// quiescence window, superseding any pass already pending; the
    /// synchronous path runs immediately.
    pub fn apply_criteria(&mut self, criteria: Criteria, debounce: bool) {
        if debounce {
            self.scheduler.defer(criteria, self.clock.now_us());
        } else {
            self.scheduler.cancel();
            self.criteria = criteria;
            self.run_pass();
        }
    }

    /// Frame pump. Fires the pending debounced pass once its quiescence
    /// window has elapsed; otherwise does nothing.
    pub fn update(&mut self) {
        if let Some(criteria) = self.scheduler.take_due(self.clock.now_us()) {
            debug!("debounced filter pass firing");
            self.criteria = criteria;
            self.run_pass();
        }
    }

    pub fn is_filter_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    // ---- selection & navigation ----

    pub fn select(&mut self, target: ChartId, bypass_filters: bool) {
        let before = self.selection.effective();
        self.selection.select(target, bypass_filters, &self.view);
        self.finish_selection(before);
    }

    pub fn select_next(&mut self, direction: Direction, skip_to_next_set: bool) {
        let before = self.selection.effective();
        self.selection
            .select_next(direction, skip_to_next_set, &self.library, &self.view);
        self.finish_selection(before);
    }

    pub fn select_next_random(&mut self) {
        let before = self.selection.effective();
        self.selection
            .select_next_random(&self.library, &self.view, &mut self.rng);
        self.finish_selection(before);
    }

    pub fn select_previous_random(&mut self) {
        let before = self.selection.effective();
        self.selection
            .select_previous_random(&self.library, &self.view);
        self.finish_selection(before);
    }

    pub fn set_random_mode(&mut self, mode: RandomMode) {
        self.selection.set_random_mode(mode);
    }

    pub fn set_recommender(&mut self, recommender: Option<Recommender>) {
        self.selection.set_recommender(recommender);
    }

    // ---- queries ----

    /// The effective selection and its owning set.
    pub fn selected(&self) -> Option<(&SongSet, &Chart)> {
        self.selection
            .effective()
            .and_then(|id| self.library.chart(id))
    }

    pub fn selected_id(&self) -> Option<ChartId> {
        self.selection.effective()
    }

    pub fn requested_id(&self) -> Option<ChartId> {
        self.selection.requested()
    }

    pub fn view(&self) -> &CarouselView {
        &self.view
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn random_history(&self) -> &[SetId] {
        self.selection.random_history()
    }

    /// Drain queued notifications, oldest first.
    pub fn take_events(&mut self) -> Vec<CarouselEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- internals ----

    /// Synchronous pass after a structural mutation. A pending debounced
    /// pass is superseded: its criteria are adopted now, the stale pass
    /// never runs.
    fn refilter_now(&mut self) {
        if let Some(latest) = self.scheduler.take_latest() {
            self.criteria = latest;
        }
        self.run_pass();
    }

    fn run_pass(&mut self) {
        self.view = build_view(&self.library, &self.criteria);
        let before = self.selection.effective();
        self.selection
            .reconcile(&self.library, &self.view, &mut self.rng);
        self.finish_selection(before);
    }

    fn finish_selection(&mut self, before: Option<ChartId>) {
        let now = self.selection.effective();
        if now != before {
            self.events.push(CarouselEvent::SelectionChanged(now));
        }
        let owner = now.and_then(|id| self.library.owner_of(id));
        self.view.apply_selection(now, owner);
    }

    fn emit_membership(&mut self, change: MembershipChange) {
        for id in change.removed {
            self.events.push(CarouselEvent::SetRemoved(id));
        }
        for id in change.added {
            self.events.push(CarouselEvent::SetAdded(id));
        }
    }
}

impl Default for Carousel {
    fn default() -> Self {
        Self::new()
    }
}
