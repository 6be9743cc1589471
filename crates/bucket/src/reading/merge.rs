//! Merging readings.
//!
//! Only bucket hits are merged. Node totals are recomputed on read by
//! replaying each node's bucket range against the per-bucket targets, so the
//! merge itself knows nothing about the hierarchy.

use super::{
    AxisTuple, AxisValueTuple, BucketGoalTuple, BucketHitTuple, GoalTuple, PointHitTuple,
    PointTuple, Reading, Span, TupleIter,
};
use crate::coverpoint::HitStats;
use crate::result::{BucketError, BucketResult};

/// A reading that sums the bucket hits of compatible readings
///
/// Everything except bucket and node hits is served by the master reading.
pub struct MergeReading<'r> {
    master: &'r dyn Reading,
    bucket_hits: Vec<u64>,
    bucket_targets: Vec<i64>,
}

impl<'r> MergeReading<'r> {
    /// Start from `master`, then merge `others` into it
    pub fn new(master: &'r dyn Reading, others: &[&dyn Reading]) -> BucketResult<Self> {
        let goal_targets: Vec<i64> = master.iter_goals(Span::all()).map(|g| g.target).collect();
        let bucket_targets: Vec<i64> = master
            .iter_bucket_goals(Span::all())
            .map(|bg| goal_targets.get(bg.goal).copied().unwrap_or(0))
            .collect();

        let mut bucket_hits = vec![0; bucket_targets.len()];
        for hit in master.iter_bucket_hits(Span::all()) {
            if let Some(slot) = bucket_hits.get_mut(hit.start) {
                *slot = hit.hits;
            }
        }

        let mut merged = Self {
            master,
            bucket_hits,
            bucket_targets,
        };
        merged.merge(others)?;
        Ok(merged)
    }

    /// Add the bucket hits of `others`
    ///
    /// Every reading is checked, and every sum computed, before any hits are
    /// stored; on error nothing has changed.
    pub fn merge(&mut self, others: &[&dyn Reading]) -> BucketResult<()> {
        let master = self.master;
        let def_sha = master.def_sha()?;
        let rec_sha = master.rec_sha()?;

        for other in others {
            let other_def = other.def_sha()?;
            if other_def != def_sha {
                return Err(BucketError::DefinitionHashMismatch {
                    expected: def_sha.to_string(),
                    found: other_def.to_string(),
                });
            }
            let other_rec = other.rec_sha()?;
            if other_rec != rec_sha {
                return Err(BucketError::RecordHashMismatch {
                    expected: rec_sha.to_string(),
                    found: other_rec.to_string(),
                });
            }
            if let Some(hit) = other
                .iter_bucket_hits(Span::all())
                .find(|hit| hit.start >= self.bucket_hits.len())
            {
                return Err(BucketError::BucketCountMismatch {
                    expected: self.bucket_hits.len(),
                    found: hit.start + 1,
                });
            }
        }

        let mut staged = self.bucket_hits.clone();
        for other in others {
            for hit in other.iter_bucket_hits(Span::all()) {
                if let Some(slot) = staged.get_mut(hit.start) {
                    *slot = slot
                        .checked_add(hit.hits)
                        .ok_or(BucketError::HitCountOverflow { bucket: hit.start })?;
                }
            }
        }
        self.bucket_hits = staged;

        if !others.is_empty() {
            tracing::info!(
                def_sha,
                readings = others.len(),
                buckets = self.bucket_hits.len(),
                "merged readings"
            );
        }
        Ok(())
    }

    /// Merged raw hits, by bucket offset
    #[must_use]
    pub fn bucket_hits(&self) -> &[u64] {
        &self.bucket_hits
    }
}

impl Reading for MergeReading<'_> {
    fn def_sha(&self) -> BucketResult<&str> {
        self.master.def_sha()
    }

    fn rec_sha(&self) -> BucketResult<&str> {
        self.master.rec_sha()
    }

    fn iter_points(&self, span: Span, depth: usize) -> TupleIter<'_, PointTuple> {
        self.master.iter_points(span, depth)
    }

    fn iter_bucket_goals(&self, span: Span) -> TupleIter<'_, BucketGoalTuple> {
        self.master.iter_bucket_goals(span)
    }

    fn iter_axes(&self, span: Span) -> TupleIter<'_, AxisTuple> {
        self.master.iter_axes(span)
    }

    fn iter_axis_values(&self, span: Span) -> TupleIter<'_, AxisValueTuple> {
        self.master.iter_axis_values(span)
    }

    fn iter_goals(&self, span: Span) -> TupleIter<'_, GoalTuple> {
        self.master.iter_goals(span)
    }

    fn iter_point_hits(&self, span: Span, depth: usize) -> TupleIter<'_, PointHitTuple> {
        Box::new(self.master.iter_points(span, depth).map(move |point| {
            let range = Span::new(point.bucket_start, point.bucket_end);
            let bucket_hits = range.slice(&self.bucket_hits);
            let targets = range.slice(&self.bucket_targets);
            let mut stats = HitStats::default();
            for (&hits, &target) in bucket_hits.iter().zip(targets) {
                stats.add_bucket(hits, target);
            }
            PointHitTuple {
                start: point.start,
                depth: point.depth,
                hits: stats.hits,
                hit_buckets: stats.hit_buckets,
                full_buckets: stats.full_buckets,
            }
        }))
    }

    fn iter_bucket_hits(&self, span: Span) -> TupleIter<'_, BucketHitTuple> {
        let range = span.bounds(self.bucket_hits.len());
        let start = range.start;
        Box::new(
            self.bucket_hits[range]
                .iter()
                .enumerate()
                .map(move |(offset, &hits)| BucketHitTuple {
                    start: start + offset,
                    hits,
                }),
        )
    }
}

impl std::fmt::Debug for MergeReading<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeReading")
            .field("def_sha", &self.master.def_sha().ok())
            .field("rec_sha", &self.master.rec_sha().ok())
            .field("buckets", &self.bucket_hits.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::reading::PuppetReading;

    /// One point over three buckets with targets 2, 0 and 5
    fn reading(hits: [u64; 3]) -> PuppetReading {
        PuppetReading {
            def_sha: Some("def".into()),
            rec_sha: Some("rec".into()),
            points: vec![PointTuple {
                start: 0,
                depth: 0,
                end: 1,
                axis_start: 0,
                axis_end: 1,
                axis_value_start: 0,
                axis_value_end: 3,
                goal_start: 0,
                goal_end: 3,
                bucket_start: 0,
                bucket_end: 3,
                target: 7,
                target_buckets: 2,
                name: "p".into(),
                description: String::new(),
            }],
            goals: [("DEFAULT", 2), ("ignore", 0), ("big", 5)]
                .into_iter()
                .enumerate()
                .map(|(start, (name, target))| GoalTuple {
                    start,
                    target,
                    name: name.into(),
                    description: String::new(),
                })
                .collect(),
            bucket_goals: (0..3).map(|i| BucketGoalTuple { start: i, goal: i }).collect(),
            bucket_hits: hits
                .iter()
                .enumerate()
                .map(|(start, &hits)| BucketHitTuple { start, hits })
                .collect(),
            ..PuppetReading::new()
        }
    }

    #[test]
    fn test_single_reading_is_identity() {
        let a = reading([1, 4, 3]);
        let merged = MergeReading::new(&a, &[]).unwrap();
        assert_eq!(merged.bucket_hits(), [1, 4, 3]);
        assert_eq!(merged.def_sha().unwrap(), "def");
    }

    #[test]
    fn test_point_hits_recomputed_with_clamping() {
        let a = reading([1, 4, 3]);
        let b = reading([2, 0, 9]);
        let merged = MergeReading::new(&a, &[&b]).unwrap();
        assert_eq!(merged.bucket_hits(), [3, 4, 12]);

        let ph = merged.iter_point_hits(Span::all(), 0).next().unwrap();
        assert_eq!(ph.hits, 2 + 5);
        assert_eq!(ph.hit_buckets, 2);
        assert_eq!(ph.full_buckets, 2);
    }

    #[test]
    fn test_bucket_hit_slices() {
        let a = reading([1, 4, 3]);
        let merged = MergeReading::new(&a, &[&a]).unwrap();
        let tail: Vec<BucketHitTuple> = merged.iter_bucket_hits(Span::from(1..)).collect();
        assert_eq!(
            tail,
            [
                BucketHitTuple { start: 1, hits: 8 },
                BucketHitTuple { start: 2, hits: 6 }
            ]
        );
    }

    #[test]
    fn test_mismatch_leaves_state_untouched() {
        let a = reading([1, 1, 1]);
        let good = reading([1, 1, 1]);
        let mut bad_def = reading([1, 1, 1]);
        bad_def.def_sha = Some("other".into());
        let mut bad_rec = reading([1, 1, 1]);
        bad_rec.rec_sha = Some("other".into());

        let mut merged = MergeReading::new(&a, &[]).unwrap();
        let err = merged.merge(&[&good, &bad_def]).unwrap_err();
        assert!(matches!(err, BucketError::DefinitionHashMismatch { .. }));
        let err = merged.merge(&[&good, &bad_rec]).unwrap_err();
        assert!(matches!(err, BucketError::RecordHashMismatch { .. }));
        assert_eq!(merged.bucket_hits(), [1, 1, 1]);
    }

    #[test]
    fn test_longer_reading_is_rejected() {
        let a = reading([1, 1, 1]);
        let mut long = reading([1, 1, 1]);
        long.bucket_hits.push(BucketHitTuple { start: 3, hits: 1 });
        let err = MergeReading::new(&a, &[&long]).unwrap_err();
        assert!(matches!(
            err,
            BucketError::BucketCountMismatch {
                expected: 3,
                found: 4
            }
        ));
    }

    #[test]
    fn test_overflow_is_rejected_atomically() {
        let full = reading([1, u64::MAX, 0]);
        let one = reading([1, 1, 1]);
        let err = MergeReading::new(&full, &[&one]).unwrap_err();
        assert!(matches!(err, BucketError::HitCountOverflow { bucket: 1 }));

        let mut merged = MergeReading::new(&full, &[]).unwrap();
        assert!(merged.merge(&[&one]).is_err());
        assert_eq!(merged.bucket_hits(), [1, u64::MAX, 0]);
    }

    #[test]
    fn test_missing_hash_fails() {
        let a = reading([0, 0, 0]);
        let mut anon = reading([0, 0, 0]);
        anon.rec_sha = None;
        let err = MergeReading::new(&a, &[&anon]).unwrap_err();
        assert!(matches!(err, BucketError::MissingHash { which: "rec_sha" }));
    }

    #[test]
    fn test_merges_nest() {
        let a = reading([1, 0, 1]);
        let b = reading([0, 1, 1]);
        let c = reading([1, 1, 0]);
        let ab = MergeReading::new(&a, &[&b]).unwrap();
        let ab_c = MergeReading::new(&ab, &[&c]).unwrap();
        let bc = MergeReading::new(&b, &[&c]).unwrap();
        let a_bc = MergeReading::new(&a, &[&bc]).unwrap();
        assert_eq!(ab_c.bucket_hits(), a_bc.bucket_hits());
        assert_eq!(ab_c.bucket_hits(), [2, 2, 2]);
    }
}
