pub mod normalizer;
pub mod products;
pub mod recommendation_client;

pub use normalizer::IdNormalizer;
pub use products::{ProductService, ProductsPlan};
pub use recommendation_client::{HttpRecommendationClient, RecommendationClient};
