// Core algorithm exports
pub mod criteria;
pub mod matcher;
pub mod ranking;
pub mod repository;
pub mod scoring;
pub mod similarity;

pub use criteria::{CapacitySpec, Criteria, CriteriaWarning};
pub use matcher::{MatchError, MatchOutcome, Matcher};
pub use ranking::{rank, TOP_K};
pub use repository::{RepositoryError, VenueRepository};
pub use scoring::{capacity_score, label_score, presentation_score, score_venue, SemanticMode};
pub use similarity::{cosine_similarity, Embedder, EmbeddingSimilarity, SemanticSimilarity, SimilarityError};
