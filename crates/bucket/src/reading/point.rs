//! Reading a live coverage tree.

use super::{
    AxisTuple, AxisValueTuple, BucketGoalTuple, BucketHitTuple, GoalTuple, PointHitTuple,
    PointTuple, PuppetReading,
};
use crate::chain::{Chain, ItemRef};
use crate::node::NodeRef;

/// Builds [`PuppetReading`]s from a tree by running both chain passes
#[derive(Debug, Clone)]
pub struct PointReader {
    rec_sha: String,
}

impl PointReader {
    /// Reader stamping every reading with `rec_sha`
    ///
    /// `rec_sha` identifies the sampling context (typically a source
    /// revision or a hash of the test configuration). Only readings with
    /// equal record hashes can be merged.
    #[must_use]
    pub fn new(rec_sha: impl Into<String>) -> Self {
        Self {
            rec_sha: rec_sha.into(),
        }
    }

    /// Record hash stamped on every reading
    #[must_use]
    pub fn rec_sha(&self) -> &str {
        &self.rec_sha
    }

    /// Flatten `node` and everything below it
    pub fn read<'a, T: 'a>(&self, node: impl Into<NodeRef<'a, T>>) -> PuppetReading {
        let node = node.into();
        let mut reading = PuppetReading {
            rec_sha: Some(self.rec_sha.clone()),
            ..PuppetReading::new()
        };

        let def = Chain::definition(node);
        reading.def_sha = Some(def.def_sha());
        for link in def.index.nodes_sorted() {
            reading.points.push(PointTuple::from_link(&link));
            if let ItemRef::Point(point) = link.item {
                let goal_start = link.start.goal;
                reading.bucket_goals.extend(
                    point
                        .bucket_goal_indices()
                        .iter()
                        .enumerate()
                        .map(|(offset, &goal)| BucketGoalTuple {
                            start: link.start.bucket + offset,
                            goal: goal_start + goal,
                        }),
                );
            }
        }

        for link in def.index.axes() {
            let ItemRef::Axis(axis) = link.item else {
                continue;
            };
            reading.axes.push(AxisTuple {
                start: link.start.axis,
                value_start: link.start.axis_value,
                value_end: link.end.axis_value,
                name: axis.name().to_string(),
                description: axis.description().to_string(),
            });
            reading
                .axis_values
                .extend(axis.value_names().enumerate().map(|(offset, value)| {
                    AxisValueTuple {
                        start: link.start.axis_value + offset,
                        value: value.to_string(),
                    }
                }));
        }

        for link in def.index.goals() {
            let ItemRef::Goal(goal) = link.item else {
                continue;
            };
            reading.goals.push(GoalTuple {
                start: link.start.goal,
                target: goal.target(),
                name: goal.name().to_string(),
                description: goal.description().to_string(),
            });
        }

        let run = Chain::run(node);
        for link in run.index.nodes_sorted() {
            reading.point_hits.push(PointHitTuple::from_link(&link));
            if let ItemRef::Point(point) = link.item {
                reading.bucket_hits.extend(
                    point
                        .bucket_hits()
                        .iter()
                        .enumerate()
                        .map(|(offset, &hits)| BucketHitTuple {
                            start: link.start.bucket + offset,
                            hits,
                        }),
                );
            }
        }

        tracing::debug!(
            root = node.name(),
            points = reading.points.len(),
            buckets = reading.bucket_hits.len(),
            "read coverage"
        );
        reading
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::bucket::Bucket;
    use crate::config::CoverConfig;
    use crate::context::CoverageContext;
    use crate::coverpoint::{BucketView, Coverpoint, PointDefinition, PointSetup};
    use crate::goal::{Goal, GoalSet};
    use crate::reading::{Reading, Span};
    use crate::result::BucketResult;

    struct Grid;

    impl PointDefinition<(i64, i64)> for Grid {
        fn setup(&mut self, setup: &mut PointSetup, _: &CoverageContext) -> BucketResult<()> {
            setup.add_axis("row", vec![0, 1], "rows")?;
            setup.add_axis("col", vec![0, 1, 2], "columns")?;
            setup.add_goal("corner", 2, "corners twice")
        }

        fn apply_goals<'g>(&self, bucket: &BucketView<'_>, goals: &'g GoalSet) -> Option<&'g Goal> {
            (bucket.is("col", "0") || bucket.is("col", "2"))
                .then(|| goals.get("corner"))
                .flatten()
        }

        fn sample(&mut self, bucket: &mut Bucket<'_>, trace: &(i64, i64)) -> BucketResult<()> {
            bucket.hit_with([("row", trace.0), ("col", trace.1)])
        }
    }

    fn grid() -> Coverpoint<(i64, i64)> {
        Coverpoint::new("grid", "a grid", Grid, &CoverageContext::new()).unwrap()
    }

    #[test]
    fn test_single_point_reading() {
        let mut point = grid();
        let config = CoverConfig::default();
        for trace in [(0, 0), (0, 0), (0, 0), (1, 1)] {
            point.sample(&trace, &config).unwrap();
        }

        let reading = PointReader::new("rec").read(&point);
        assert_eq!(reading.rec_sha().unwrap(), "rec");
        assert_eq!(reading.def_sha().unwrap().len(), 64);

        assert_eq!(reading.points.len(), 1);
        let p = &reading.points[0];
        assert_eq!((p.start, p.end, p.depth), (0, 1, 0));
        assert_eq!((p.bucket_start, p.bucket_end), (0, 6));
        assert_eq!((p.axis_start, p.axis_end), (0, 2));
        assert_eq!((p.axis_value_start, p.axis_value_end), (0, 5));
        assert_eq!((p.goal_start, p.goal_end), (0, 2));
        assert_eq!(p.target, 4 * 2 + 2 * 10);
        assert_eq!(p.target_buckets, 6);
        assert!(p.is_coverpoint());

        let goals: Vec<usize> = reading.bucket_goals.iter().map(|b| b.goal).collect();
        assert_eq!(goals, [1, 0, 1, 1, 0, 1]);

        let values: Vec<&str> = reading.axis_values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(values, ["0", "1", "0", "1", "2"]);
        assert_eq!(reading.axes[1].value_start, 2);

        let hits: Vec<u64> = reading.bucket_hits.iter().map(|b| b.hits).collect();
        assert_eq!(hits, [3, 0, 0, 0, 1, 0]);

        let ph = reading.point_hits[0];
        assert_eq!(ph.hits, 3);
        assert_eq!(ph.hit_buckets, 2);
        assert_eq!(ph.full_buckets, 1);
    }

    #[test]
    fn test_hits_do_not_change_def_sha() {
        let mut point = grid();
        let reader = PointReader::new("rec");
        let before = reader.read(&point);
        point.sample(&(1, 2), &CoverConfig::default()).unwrap();
        let after = reader.read(&point);
        assert_eq!(before.def_sha, after.def_sha);
        assert_ne!(before.bucket_hits, after.bucket_hits);
        assert_eq!(after.iter_bucket_hits(Span::new(5, 6)).next().unwrap().hits, 1);
    }
}
