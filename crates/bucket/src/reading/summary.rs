//! Per-node coverage summaries derived from a reading.

use super::{Reading, Span};
use std::fmt;

/// Definition and hit totals of one node, joined
#[derive(Debug, Clone, PartialEq)]
pub struct PointSummary {
    /// Node name
    pub name: String,
    /// Node description
    pub description: String,
    /// Node-count offset
    pub start: usize,
    /// Depth below the reading root
    pub depth: usize,
    /// Buckets in this subtree
    pub buckets: usize,
    /// Sum of positive targets
    pub target: i64,
    /// Clamped hits
    pub hits: u64,
    /// Buckets with a positive target
    pub target_buckets: usize,
    /// Buckets with at least one counted hit
    pub hit_buckets: usize,
    /// Buckets that reached their target
    pub full_buckets: usize,
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 100.0; // Vacuously complete
    }
    part / whole * 100.0
}

impl PointSummary {
    /// Clamped hits as a percentage of the target
    #[must_use]
    pub fn hit_percent(&self) -> f64 {
        percent(self.hits as f64, self.target as f64)
    }

    /// Hit buckets as a percentage of target buckets
    #[must_use]
    pub fn bucket_hit_percent(&self) -> f64 {
        percent(self.hit_buckets as f64, self.target_buckets as f64)
    }

    /// Full buckets as a percentage of target buckets
    #[must_use]
    pub fn bucket_full_percent(&self) -> f64 {
        percent(self.full_buckets as f64, self.target_buckets as f64)
    }

    /// Whether every target bucket reached its target
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.full_buckets == self.target_buckets
    }
}

impl fmt::Display for PointSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:indent$}{}: {:.1}% hits, {}/{} buckets full",
            "",
            self.name,
            self.hit_percent(),
            self.full_buckets,
            self.target_buckets,
            indent = self.depth * 2
        )
    }
}

/// Summarise every node of a reading, in pre-order
#[must_use]
pub fn summarize(reading: &dyn Reading) -> Vec<PointSummary> {
    reading
        .iter_points(Span::all(), 0)
        .zip(reading.iter_point_hits(Span::all(), 0))
        .map(|(point, hits)| PointSummary {
            buckets: point.buckets(),
            name: point.name,
            description: point.description,
            start: point.start,
            depth: point.depth,
            target: point.target,
            hits: hits.hits,
            target_buckets: point.target_buckets,
            hit_buckets: hits.hit_buckets,
            full_buckets: hits.full_buckets,
        })
        .collect()
}
