pub mod error;
pub mod limiters;
pub mod similarity;
pub mod size_estimator;

pub use similarity::cosine_similarity;
