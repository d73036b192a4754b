mod chart;
mod song_set;

pub use chart::{Chart, ChartId, Ruleset};
pub use song_set::{SetId, SongSet};
