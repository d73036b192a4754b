use serde::{Deserialize, Serialize};

use super::chart::{Chart, ChartId};

/// Identity of a song set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct SetId(pub u64);

/// A grouping of charts sharing one song's metadata.
///
/// Chart order is insertion order and is never rearranged in place; sorting
/// only ever affects the computed view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SongSet {
    pub id: SetId,
    pub artist: String,
    pub title: String,
    pub author: String,
    /// Unix seconds at import time, supplied by the importer.
    pub added_at: i64,
    pub charts: Vec<Chart>,
}

impl SongSet {
    pub fn new(
        id: SetId,
        artist: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id,
            artist: artist.into(),
            title: title.into(),
            author: author.into(),
            added_at: 0,
            charts: Vec::new(),
        }
    }

    pub fn with_charts(mut self, charts: Vec<Chart>) -> Self {
        self.charts = charts;
        self
    }

    pub fn chart(&self, id: ChartId) -> Option<&Chart> {
        self.charts.iter().find(|c| c.id == id)
    }

    /// Highest star rating over the set's charts; 0.0 for an empty set.
    pub fn max_rating(&self) -> f64 {
        self.charts.iter().map(|c| c.rating).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Ruleset;

    #[test]
    fn max_rating_over_charts() {
        let set = SongSet::new(SetId(1), "a", "t", "au").with_charts(vec![
            Chart::new(ChartId(1), SetId(1), Ruleset(0), 2.5, "easy"),
            Chart::new(ChartId(2), SetId(1), Ruleset(0), 6.1, "hard"),
        ]);
        assert_eq!(set.max_rating(), 6.1);
    }

    #[test]
    fn max_rating_empty_set() {
        let set = SongSet::new(SetId(1), "a", "t", "au");
        assert_eq!(set.max_rating(), 0.0);
    }
}
