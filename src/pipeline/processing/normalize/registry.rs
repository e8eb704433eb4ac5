use std::collections::HashMap;

use super::normalizers::{CrossrefNormalizer, HalNormalizer, OpenAlexNormalizer};
use super::{MetricsNormalizer, SourceNormalizer};
use crate::domain::{CanonicalWork, Source};
use crate::types::RawWorkData;

/// Registry for source-specific normalization strategies
pub struct NormalizationRegistry {
    normalizers: HashMap<Source, Box<dyn SourceNormalizer>>,
}

impl NormalizationRegistry {
    /// Create a new normalization registry with the built-in normalizers
    pub fn new() -> Self {
        let mut normalizers: HashMap<Source, Box<dyn SourceNormalizer>> = HashMap::new();

        normalizers.insert(Source::OpenAlex, Box::new(MetricsNormalizer::new(OpenAlexNormalizer::new())));
        normalizers.insert(Source::Crossref, Box::new(MetricsNormalizer::new(CrossrefNormalizer::new())));
        normalizers.insert(Source::Hal, Box::new(MetricsNormalizer::new(HalNormalizer::new())));

        Self { normalizers }
    }

    /// Register (or replace) the normalizer for its source
    pub fn register(&mut self, normalizer: Box<dyn SourceNormalizer>) {
        self.normalizers.insert(normalizer.source(), normalizer);
    }

    /// Get the normalizer for a source
    pub fn get_normalizer(&self, source: Source) -> Option<&dyn SourceNormalizer> {
        self.normalizers.get(&source).map(|n| n.as_ref())
    }

    /// Normalize a batch of raw records from `source`.
    /// Returns `None` only when no normalizer is registered for it.
    pub fn normalize_batch(&self, source: Source, raws: &[RawWorkData]) -> Option<Vec<CanonicalWork>> {
        self.get_normalizer(source).map(|n| n.normalize_batch(raws))
    }

    /// List all registered sources
    pub fn list_sources(&self) -> Vec<Source> {
        let mut sources: Vec<Source> = self.normalizers.keys().copied().collect();
        sources.sort();
        sources
    }
}

impl Default for NormalizationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
