// Individual normalizer implementations
pub mod crossref;
pub mod hal;
pub mod openalex;

// Re-export the main components
pub use crossref::CrossrefNormalizer;
pub use hal::HalNormalizer;
pub use openalex::{reconstruct_abstract, OpenAlexNormalizer};
