//! Leaf source backed by a `ShardIndex`.

use crate::builder::LeafSource;
use crate::stream::{BoxedStream, LeafStream, ScanStream};
use quarry_core::{EngineConfig, NodeId, Result};
use quarry_index::{ScanOptions, ShardIndex, ShardRange, TermStatus};
use tracing::debug;

/// Opens leaf streams over an in-memory [`ShardIndex`].
///
/// Unindexed fields give `Unindexed` leaves, terms no shard holds give
/// `Absent` leaves, everything else is scanned lazily. Shards over the
/// configured uid threshold come back infinite.
#[derive(Debug, Clone)]
pub struct IndexLeafSource<'a> {
    index: &'a ShardIndex,
    options: ScanOptions,
}

impl<'a> IndexLeafSource<'a> {
    /// Creates a source over `index`, taking the uid threshold from `config`.
    pub fn new(index: &'a ShardIndex, config: &EngineConfig) -> Self {
        let mut options = ScanOptions::new();
        if let Some(threshold) = config.shard_uid_threshold {
            options = options.with_uid_threshold(threshold);
        }
        Self { index, options }
    }

    /// Restricts every scan to shards within `range`.
    pub fn with_range(mut self, range: ShardRange) -> Self {
        self.options = self.options.with_range(range);
        self
    }

    /// Returns the options every scan runs with.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }
}

impl<'a> LeafSource<'a> for IndexLeafSource<'a> {
    fn scan(&mut self, node: NodeId, field: &str, value: &str) -> Result<BoxedStream<'a>> {
        let label = format!("{field} == '{value}'");
        let stream: BoxedStream<'a> = match self.index.term_status(field, value) {
            TermStatus::Unindexed => {
                debug!(node = %node, field, "field is not indexed");
                Box::new(LeafStream::unindexed(Some(node)).with_label(label))
            }
            TermStatus::Missing => {
                debug!(node = %node, field, value, "term not in index");
                Box::new(LeafStream::absent(Some(node)).with_label(label))
            }
            TermStatus::Found => {
                let scan = self.index.scan(field, value, Some(node), &self.options);
                Box::new(ScanStream::new(Some(node), scan.map(Ok)).with_label(label))
            }
        };
        Ok(stream)
    }
}
