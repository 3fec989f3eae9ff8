pub mod compiler;
pub mod controller;
pub mod location;
pub mod store;

pub use compiler::{compile, QueryParams};
pub use controller::{
    debounce_from_env, ControllerState, DebouncedFetchController, DiscoveryFetcher,
    DiscoverySnapshot, FetchError, DEFAULT_DEBOUNCE,
};
pub use store::InfiniteResultStore;
