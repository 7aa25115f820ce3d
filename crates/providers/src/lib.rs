pub mod candidates;
pub mod google;
pub mod request;
pub mod traits;
pub mod types;
pub(crate) mod util;

// Re-exports for convenience.
pub use candidates::{select_candidate, SelectedCandidate};
pub use google::GeminiClient;
pub use request::build_request;
pub use traits::GenerativeBackend;
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, Part, Probability,
    SafetyRating,
};
