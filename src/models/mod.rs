pub mod catalog;
pub mod filters;
pub mod media;

pub use catalog::{CatalogEntity, PrecomputedEntry};
pub use filters::{Category, DateRange, FilterState, MonetizationType, NumericRange, SortBy};
pub use media::{Entity, MediaType, Page};
