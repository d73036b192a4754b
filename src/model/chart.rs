use serde::{Deserialize, Serialize};

use super::song_set::SetId;

/// Identity of a single chart. Unique across the whole library.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ChartId(pub u64);

/// Opaque ruleset identifier. Charts of the same set are displayed grouped
/// by ruleset, so the identifier is ordered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Ruleset(pub u8);

/// A single selectable chart (difficulty) within a song set.
///
/// `rating` and `hidden` are the only fields that change after insertion,
/// and only through the library's update calls. Everything else is fixed by
/// the importer that supplied the record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chart {
    pub id: ChartId,
    /// Owning set. Non-owning back-reference, resolved through the library.
    pub set_id: SetId,
    pub ruleset: Ruleset,
    /// Star rating.
    pub rating: f64,
    /// Version name shown on the panel.
    pub name: String,
    /// Permanently hidden by the user; filtered out regardless of criteria.
    pub hidden: bool,
}

impl Chart {
    pub fn new(
        id: ChartId,
        set_id: SetId,
        ruleset: Ruleset,
        rating: f64,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            set_id,
            ruleset,
            rating,
            name: name.into(),
            hidden: false,
        }
    }
}
