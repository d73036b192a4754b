mod carousel;
mod criteria;
mod filter;
mod library;
mod query;
mod selection;
mod view;

pub use carousel::{Carousel, CarouselEvent};
pub use criteria::{Criteria, RatingRange, SortMode};
pub use filter::{build_view, FILTER_DEBOUNCE_US};
pub use library::{Library, MembershipChange};
pub use query::QueryError;
pub use selection::{Direction, RandomMode, Recommender, SelectionController};
pub use view::{CarouselView, ChartPanel, PanelState, SetPanel};
