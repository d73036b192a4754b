use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Chart, ChartId, SetId};

use super::library::Library;
use super::view::CarouselView;

/// How random traversal picks among visible sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RandomMode {
    /// Uniform over visible sets; immediate repeats allowed.
    Random,
    /// Uniform over visible sets not yet in the history; once every visible
    /// set has been consumed the history resets and repeats become possible.
    #[default]
    RandomPermutation,
}

/// Direction of sequential traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Chooses the default chart of a set, given its visible charts.
pub type Recommender = Box<dyn Fn(&[&Chart]) -> Option<ChartId>>;

/// Tracks the requested and effective selection and implements sequential
/// and random traversal over the visible view.
///
/// `requested` is what the caller last explicitly asked for and survives
/// being filtered out; `effective` is what is actually reported selected
/// and is only ever a visible chart, unless a bypassing select forced it.
#[derive(Default)]
pub struct SelectionController {
    requested: Option<ChartId>,
    effective: Option<ChartId>,
    random_history: Vec<SetId>,
    random_mode: RandomMode,
    recommender: Option<Recommender>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effective(&self) -> Option<ChartId> {
        self.effective
    }

    pub fn requested(&self) -> Option<ChartId> {
        self.requested
    }

    pub fn random_history(&self) -> &[SetId] {
        &self.random_history
    }

    pub fn random_mode(&self) -> RandomMode {
        self.random_mode
    }

    pub fn set_random_mode(&mut self, mode: RandomMode) {
        self.random_mode = mode;
    }

    pub fn set_recommender(&mut self, recommender: Option<Recommender>) {
        self.recommender = recommender;
    }

    /// Explicit selection. Always records `requested`; `effective` follows
    /// only when the target is visible or the caller bypasses filters
    /// (reserved for callers that pre-validated visibility).
    pub fn select(&mut self, target: ChartId, bypass_filters: bool, view: &CarouselView) {
        self.requested = Some(target);
        if bypass_filters || view.is_chart_visible(target) {
            self.effective = Some(target);
        }
    }

    /// Recompute `effective` from `requested` against the current view.
    /// Runs after every structural or filter change.
    pub fn reconcile<R: Rng>(&mut self, library: &Library, view: &CarouselView, rng: &mut R) {
        self.effective = if let Some(requested) = self.requested {
            if view.is_chart_visible(requested) {
                Some(requested)
            } else if let Some(owner) = library.owner_of(requested) {
                // The set survives but the requested chart is filtered out:
                // a recommender may substitute a sibling without forgetting
                // the original request. No recommender means no selection.
                self.recommended_of(owner, library, view)
            } else {
                // The requested chart's set is gone; behave as if nothing
                // was ever requested.
                self.random_fallback(library, view, rng)
            }
        } else {
            self.random_fallback(library, view, rng)
        };
    }

    /// Move one position through the flattened circular sequence of the
    /// visible view. With `skip_to_next_set`, the sequence has one entry
    /// per visible set, landing on its default chart.
    pub fn select_next(
        &mut self,
        direction: Direction,
        skip_to_next_set: bool,
        library: &Library,
        view: &CarouselView,
    ) {
        if skip_to_next_set {
            self.step_sets(direction, library, view);
        } else {
            self.step_charts(direction, view);
        }
    }

    /// Jump to a random visible set, honoring the random mode, and select
    /// its default chart. The pick is pushed onto the history.
    pub fn select_next_random<R: Rng>(
        &mut self,
        library: &Library,
        view: &CarouselView,
        rng: &mut R,
    ) {
        let visible = view.visible_set_ids();
        let Some(set_id) = self.pick_random_set(&visible, rng) else {
            return;
        };
        self.random_history.push(set_id);
        if let Some(chart) = self.default_chart_of(set_id, library, view) {
            debug!("random jump to set {:?}", set_id);
            self.requested = Some(chart);
            self.effective = Some(chart);
        }
    }

    /// Pop the most recent random pick and restore selection to it. Popped
    /// sets that no longer have a visible chart are discarded and the pop
    /// continues. An empty history is a no-op.
    pub fn select_previous_random(&mut self, library: &Library, view: &CarouselView) {
        while let Some(set_id) = self.random_history.pop() {
            if let Some(chart) = self.default_chart_of(set_id, library, view) {
                self.requested = Some(chart);
                self.effective = Some(chart);
                return;
            }
        }
    }

    fn step_charts(&mut self, direction: Direction, view: &CarouselView) {
        let flat = view.visible_chart_ids();
        if flat.is_empty() {
            return;
        }
        let position = self
            .effective
            .and_then(|id| flat.iter().position(|&c| c == id));
        let next = match position {
            Some(index) => flat[wrap_step(index, direction, flat.len())],
            // nothing selected yet: seed at the near end
            None => match direction {
                Direction::Forward => flat[0],
                Direction::Backward => flat[flat.len() - 1],
            },
        };
        self.requested = Some(next);
        self.effective = Some(next);
    }

    fn step_sets(&mut self, direction: Direction, library: &Library, view: &CarouselView) {
        let sets = view.visible_set_ids();
        if sets.is_empty() {
            return;
        }
        let position = self
            .effective
            .and_then(|id| library.owner_of(id))
            .and_then(|owner| sets.iter().position(|&s| s == owner));
        let target = match position {
            Some(index) => sets[wrap_step(index, direction, sets.len())],
            None => match direction {
                Direction::Forward => sets[0],
                Direction::Backward => sets[sets.len() - 1],
            },
        };
        if let Some(chart) = self.default_chart_of(target, library, view) {
            self.requested = Some(chart);
            self.effective = Some(chart);
        }
    }

    /// The set's recommended chart if a recommender is installed and its
    /// pick is visible, otherwise the first visible chart.
    fn default_chart_of(
        &self,
        set_id: SetId,
        library: &Library,
        view: &CarouselView,
    ) -> Option<ChartId> {
        let visible = view.visible_charts_of(set_id);
        if visible.is_empty() {
            return None;
        }
        self.recommended_of(set_id, library, view)
            .or_else(|| visible.first().copied())
    }

    /// Strictly the recommender's pick over the set's visible charts;
    /// `None` when no recommender is installed, the pick is not among the
    /// visible charts, or nothing in the set is visible.
    fn recommended_of(
        &self,
        set_id: SetId,
        library: &Library,
        view: &CarouselView,
    ) -> Option<ChartId> {
        let recommender = self.recommender.as_ref()?;
        let ids = view.visible_charts_of(set_id);
        if ids.is_empty() {
            return None;
        }
        let charts: Vec<&Chart> = ids
            .iter()
            .filter_map(|&id| library.chart(id).map(|(_, chart)| chart))
            .collect();
        recommender(&charts).filter(|pick| ids.contains(pick))
    }

    /// Reconciliation rule for "nothing usable requested": pick a random
    /// visible set so the user is never left without a selection when one
    /// exists. The pick becomes the new `requested`.
    fn random_fallback<R: Rng>(
        &mut self,
        library: &Library,
        view: &CarouselView,
        rng: &mut R,
    ) -> Option<ChartId> {
        let visible = view.visible_set_ids();
        let set_id = self.pick_random_set(&visible, rng)?;
        self.random_history.push(set_id);
        let chart = self.default_chart_of(set_id, library, view)?;
        self.requested = Some(chart);
        Some(chart)
    }

    fn pick_random_set<R: Rng>(&mut self, visible: &[SetId], rng: &mut R) -> Option<SetId> {
        if visible.is_empty() {
            return None;
        }
        match self.random_mode {
            RandomMode::Random => visible.choose(rng).copied(),
            RandomMode::RandomPermutation => {
                let fresh: Vec<SetId> = visible
                    .iter()
                    .copied()
                    .filter(|id| !self.random_history.contains(id))
                    .collect();
                match fresh.choose(rng) {
                    Some(&pick) => Some(pick),
                    None => {
                        // every visible set consumed: start a new permutation
                        self.random_history.clear();
                        visible.choose(rng).copied()
                    }
                }
            }
        }
    }
}

fn wrap_step(index: usize, direction: Direction, len: usize) -> usize {
    match direction {
        Direction::Forward => (index + 1) % len,
        Direction::Backward => (index + len - 1) % len,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::model::{Ruleset, SongSet};
    use crate::select::criteria::Criteria;
    use crate::select::filter::build_view;

    fn library_of(count: u64, charts_per_set: u64) -> Library {
        let mut library = Library::new();
        let sets = (1..=count)
            .map(|set| {
                SongSet::new(
                    SetId(set),
                    format!("artist {set:03}"),
                    format!("title {set:03}"),
                    "author",
                )
                .with_charts(
                    (1..=charts_per_set)
                        .map(|n| {
                            Chart::new(
                                ChartId(set * 100 + n),
                                SetId(set),
                                Ruleset(0),
                                n as f64,
                                format!("chart {n}"),
                            )
                        })
                        .collect(),
                )
            })
            .collect();
        library.replace_all(sets);
        library
    }

    fn view_of(library: &Library) -> CarouselView {
        build_view(library, &Criteria::default())
    }

    #[test]
    fn select_records_requested_even_when_invisible() {
        let library = library_of(1, 2);
        let view = build_view(&library, &Criteria::with_search("no match"));
        let mut controller = SelectionController::new();

        controller.select(ChartId(101), false, &view);
        assert_eq!(controller.requested(), Some(ChartId(101)));
        assert_eq!(controller.effective(), None);

        controller.select(ChartId(101), true, &view);
        assert_eq!(controller.effective(), Some(ChartId(101)));
    }

    #[test]
    fn reconcile_keeps_visible_requested() {
        let library = library_of(2, 2);
        let view = view_of(&library);
        let mut controller = SelectionController::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        controller.select(ChartId(102), false, &view);
        controller.reconcile(&library, &view, &mut rng);
        assert_eq!(controller.effective(), Some(ChartId(102)));
    }

    #[test]
    fn reconcile_without_recommender_yields_no_selection() {
        let library = library_of(1, 3);
        let mut controller = SelectionController::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        controller.select(ChartId(102), false, &view_of(&library));

        // requested chart filtered out, siblings visible, no recommender
        let mut criteria = Criteria::default();
        criteria.user_rating_range = Some(crate::select::RatingRange::at_least(3.0));
        let view = build_view(&library, &criteria);
        controller.reconcile(&library, &view, &mut rng);
        assert_eq!(controller.effective(), None);
        assert_eq!(controller.requested(), Some(ChartId(102)));
    }

    #[test]
    fn reconcile_with_recommender_substitutes_sibling() {
        let library = library_of(1, 3);
        let mut controller = SelectionController::new();
        controller.set_recommender(Some(Box::new(|charts: &[&Chart]| {
            charts
                .iter()
                .max_by(|a, b| a.rating.total_cmp(&b.rating))
                .map(|c| c.id)
        })));
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        controller.select(ChartId(101), false, &view_of(&library));

        let mut criteria = Criteria::default();
        criteria.user_rating_range = Some(crate::select::RatingRange::at_least(2.0));
        let view = build_view(&library, &criteria);
        controller.reconcile(&library, &view, &mut rng);

        // highest visible sibling substituted, original request retained
        assert_eq!(controller.effective(), Some(ChartId(103)));
        assert_eq!(controller.requested(), Some(ChartId(101)));
    }

    #[test]
    fn reconcile_picks_randomly_when_requested_set_is_gone() {
        let mut library = library_of(3, 1);
        let mut controller = SelectionController::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        controller.select(ChartId(201), false, &view_of(&library));
        library.remove(SetId(2));
        let view = view_of(&library);
        controller.reconcile(&library, &view, &mut rng);

        let effective = controller.effective().unwrap();
        assert_ne!(library.owner_of(effective), Some(SetId(2)));
        assert_eq!(controller.requested(), Some(effective));
    }

    #[test]
    fn reconcile_on_empty_view_clears_selection() {
        let library = Library::new();
        let view = view_of(&library);
        let mut controller = SelectionController::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        controller.reconcile(&library, &view, &mut rng);
        assert_eq!(controller.effective(), None);
    }

    #[test]
    fn step_charts_wraps_both_ways() {
        let library = library_of(2, 2);
        let view = view_of(&library);
        let mut controller = SelectionController::new();

        controller.select(ChartId(101), false, &view);
        controller.select_next(Direction::Backward, false, &library, &view);
        assert_eq!(controller.effective(), Some(ChartId(202)));
        controller.select_next(Direction::Forward, false, &library, &view);
        assert_eq!(controller.effective(), Some(ChartId(101)));
    }

    #[test]
    fn first_step_seeds_at_the_near_end() {
        let library = library_of(2, 2);
        let view = view_of(&library);

        let mut controller = SelectionController::new();
        controller.select_next(Direction::Forward, false, &library, &view);
        assert_eq!(controller.effective(), Some(ChartId(101)));

        let mut controller = SelectionController::new();
        controller.select_next(Direction::Backward, false, &library, &view);
        assert_eq!(controller.effective(), Some(ChartId(202)));
    }

    #[test]
    fn step_sets_lands_on_default_chart() {
        let library = library_of(3, 3);
        let view = view_of(&library);
        let mut controller = SelectionController::new();

        controller.select(ChartId(103), false, &view);
        controller.select_next(Direction::Forward, true, &library, &view);
        assert_eq!(controller.effective(), Some(ChartId(201)));
        controller.select_next(Direction::Backward, true, &library, &view);
        assert_eq!(controller.effective(), Some(ChartId(101)));
    }

    #[test]
    fn navigation_on_empty_view_is_a_noop() {
        let library = Library::new();
        let view = view_of(&library);
        let mut controller = SelectionController::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        controller.select_next(Direction::Forward, false, &library, &view);
        controller.select_next(Direction::Backward, true, &library, &view);
        controller.select_next_random(&library, &view, &mut rng);
        controller.select_previous_random(&library, &view);
        assert_eq!(controller.effective(), None);
    }

    #[test]
    fn permutation_mode_never_repeats_until_exhausted() {
        let library = library_of(8, 1);
        let view = view_of(&library);
        let mut controller = SelectionController::new();
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        for _ in 0..8 {
            controller.select_next_random(&library, &view, &mut rng);
        }
        let mut seen: Vec<SetId> = controller.random_history().to_vec();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 8);

        // ninth pick starts a fresh permutation
        controller.select_next_random(&library, &view, &mut rng);
        assert_eq!(controller.random_history().len(), 1);
    }

    #[test]
    fn plain_random_mode_keeps_growing_history() {
        let library = library_of(3, 1);
        let view = view_of(&library);
        let mut controller = SelectionController::new();
        controller.set_random_mode(RandomMode::Random);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        for _ in 0..10 {
            controller.select_next_random(&library, &view, &mut rng);
        }
        assert_eq!(controller.random_history().len(), 10);
    }

    #[test]
    fn previous_random_walks_back_through_history() {
        let library = library_of(5, 1);
        let view = view_of(&library);
        let mut controller = SelectionController::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        controller.select_next_random(&library, &view, &mut rng);
        let first = controller.effective().unwrap();
        controller.select_next_random(&library, &view, &mut rng);

        // pop the current pick, then the one before it
        controller.select_previous_random(&library, &view);
        controller.select_previous_random(&library, &view);
        assert_eq!(controller.effective(), Some(first));
        assert!(controller.random_history().is_empty());

        // empty history: no-op
        controller.select_previous_random(&library, &view);
        assert_eq!(controller.effective(), Some(first));
    }

    #[test]
    fn previous_random_skips_vanished_sets() {
        let mut library = library_of(3, 1);
        let view = view_of(&library);
        let mut controller = SelectionController::new();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        controller.select_next_random(&library, &view, &mut rng);
        let first = controller.effective().unwrap();
        let first_set = library.owner_of(first).unwrap();
        controller.select_next_random(&library, &view, &mut rng);
        let second_set = library.owner_of(controller.effective().unwrap()).unwrap();
        assert_ne!(first_set, second_set);

        library.remove(second_set);
        let view = view_of(&library);
        controller.select_previous_random(&library, &view);
        controller.select_previous_random(&library, &view);
        assert_eq!(controller.effective(), Some(first));
    }
}
