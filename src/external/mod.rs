pub mod cache;
pub mod tmdb;

pub use cache::{DiscoverCache, MemoryCache};
pub use tmdb::TmdbDiscoverClient;
