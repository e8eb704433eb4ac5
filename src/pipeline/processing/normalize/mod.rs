pub mod normalizers;
pub mod registry;

pub use registry::NormalizationRegistry;

use crate::domain::{CanonicalWork, Source};
use crate::observability::metrics::{emit_source_counter, MetricName};
use crate::types::RawWorkData;

/// Trait for translating one raw source record into the canonical schema.
///
/// Implementations are total: any JSON value yields a record, with missing or
/// malformed optional fields mapped to `None` or empty collections.
pub trait SourceNormalizer: Send + Sync {
    /// Translate a raw record from this source into a canonical work
    fn normalize(&self, raw: &RawWorkData) -> CanonicalWork;

    /// The source this normalizer handles
    fn source(&self) -> Source;

    /// Get a human-readable name for this normalizer
    fn name(&self) -> &str;

    /// Translate a whole batch, preserving order
    fn normalize_batch(&self, raws: &[RawWorkData]) -> Vec<CanonicalWork> {
        raws.iter().map(|raw| self.normalize(raw)).collect()
    }
}

/// A wrapper that adds metrics to any normalizer implementation
pub struct MetricsNormalizer<N: SourceNormalizer> {
    inner: N,
}

impl<N: SourceNormalizer> MetricsNormalizer<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

impl<N: SourceNormalizer> SourceNormalizer for MetricsNormalizer<N> {
    fn normalize(&self, raw: &RawWorkData) -> CanonicalWork {
        let work = self.inner.normalize(raw);
        emit_source_counter(MetricName::NormalizeRecordsProcessed, self.inner.source(), 1);
        if work.doi.is_none() {
            emit_source_counter(MetricName::NormalizeRecordsWithoutDoi, self.inner.source(), 1);
        }
        work
    }

    fn source(&self) -> Source {
        self.inner.source()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
