pub mod precompute;

pub use precompute::{
    rank_similar, rank_trending, PrecomputeReport, PrecomputeRepository,
    RecommendationPrecomputer, SIMILAR_LIST_SIZE, TRENDING_LIST_SIZE,
};
