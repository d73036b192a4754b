//! Carousel core of a music-game client: the set/chart hierarchy behind
//! the song-select screen, the filter/sort criteria applied to it, and the
//! selection state that survives both changing. Import, storage, rendering,
//! audio preview and input handling live in the embedding client.

pub mod clock;
pub mod model;
pub mod select;
