use serde::{Deserialize, Serialize};

use crate::model::{Chart, Ruleset, SongSet};

/// Set-level sort key for the carousel view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortMode {
    #[default]
    Title,
    Artist,
    Author,
    /// By the set's highest chart rating.
    Rating,
    /// Newest imports first.
    DateAdded,
}

/// Numeric range over star ratings with explicit inclusivity on both bounds.
///
/// Both bounds are inclusive unless the matching `*_exclusive` flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_exclusive: bool,
    pub max_exclusive: bool,
}

impl RatingRange {
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            ..Self::default()
        }
    }

    pub fn at_most(max: f64) -> Self {
        Self {
            max: Some(max),
            ..Self::default()
        }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        if let Some(min) = self.min {
            if value < min || (self.min_exclusive && value == min) {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max || (self.max_exclusive && value == max) {
                return false;
            }
        }
        true
    }
}

/// The active filter + sort configuration.
///
/// Immutable value: a new `Criteria` replaces the old one wholesale, there
/// is no incremental mutation of a live filter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Criteria {
    /// Case-insensitive substring over artist/title/author/chart name.
    pub search: String,
    pub ruleset: Option<Ruleset>,
    /// Range derived by the client from play history.
    pub rating_range: Option<RatingRange>,
    /// Range chosen explicitly by the user, intersected with the computed one.
    pub user_rating_range: Option<RatingRange>,
    pub sort: SortMode,
}

impl Criteria {
    pub fn with_search(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..Self::default()
        }
    }

    pub fn with_sort(sort: SortMode) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    /// Whether the chart passes this filter. The `hidden` flag is the
    /// store's concern, not the criteria's.
    pub fn matches(&self, set: &SongSet, chart: &Chart) -> bool {
        self.matches_lowered(&self.search.to_lowercase(), set, chart)
    }

    /// Same as `matches` with the search needle lowercased once by the
    /// caller, so a full filter pass does not re-lowercase per chart.
    pub(crate) fn matches_lowered(&self, needle: &str, set: &SongSet, chart: &Chart) -> bool {
        if let Some(ruleset) = self.ruleset {
            if chart.ruleset != ruleset {
                return false;
            }
        }
        if let Some(range) = &self.rating_range {
            if !range.contains(chart.rating) {
                return false;
            }
        }
        if let Some(range) = &self.user_rating_range {
            if !range.contains(chart.rating) {
                return false;
            }
        }
        if needle.is_empty() {
            return true;
        }
        set.artist.to_lowercase().contains(needle)
            || set.title.to_lowercase().contains(needle)
            || set.author.to_lowercase().contains(needle)
            || chart.name.to_lowercase().contains(needle)
    }
}
