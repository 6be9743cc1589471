//! A reading that owns its tuples.

use super::{
    AxisTuple, AxisValueTuple, BucketGoalTuple, BucketHitTuple, GoalTuple, PointHitTuple,
    PointTuple, Reading, Span, TupleIter,
};
use crate::result::{BucketError, BucketResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reading stored directly in vectors
///
/// Produced by [`PointReader`](super::PointReader) and by the archives, and
/// the form in which readings are serialised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuppetReading {
    /// Definition hash, if known
    pub def_sha: Option<String>,
    /// Record hash, if known
    pub rec_sha: Option<String>,
    /// Nodes, pre-order
    pub points: Vec<PointTuple>,
    /// Goal of every bucket
    pub bucket_goals: Vec<BucketGoalTuple>,
    /// Axes
    pub axes: Vec<AxisTuple>,
    /// Axis values
    pub axis_values: Vec<AxisValueTuple>,
    /// Goals
    pub goals: Vec<GoalTuple>,
    /// Node hit totals, pre-order
    pub point_hits: Vec<PointHitTuple>,
    /// Raw bucket hits
    pub bucket_hits: Vec<BucketHitTuple>,
}

impl PuppetReading {
    /// Empty reading with no hashes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every tuple out of another reading
    #[must_use]
    pub fn from_reading(reading: &dyn Reading) -> Self {
        Self {
            def_sha: reading.def_sha().ok().map(str::to_string),
            rec_sha: reading.rec_sha().ok().map(str::to_string),
            points: reading.iter_points(Span::all(), 0).collect(),
            bucket_goals: reading.iter_bucket_goals(Span::all()).collect(),
            axes: reading.iter_axes(Span::all()).collect(),
            axis_values: reading.iter_axis_values(Span::all()).collect(),
            goals: reading.iter_goals(Span::all()).collect(),
            point_hits: reading.iter_point_hits(Span::all(), 0).collect(),
            bucket_hits: reading.iter_bucket_hits(Span::all()).collect(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> BucketResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> BucketResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write as JSON to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> BucketResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read JSON from `path`
    pub fn load(path: impl AsRef<Path>) -> BucketResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Reading for PuppetReading {
    fn def_sha(&self) -> BucketResult<&str> {
        self.def_sha
            .as_deref()
            .ok_or(BucketError::MissingHash { which: "def_sha" })
    }

    fn rec_sha(&self) -> BucketResult<&str> {
        self.rec_sha
            .as_deref()
            .ok_or(BucketError::MissingHash { which: "rec_sha" })
    }

    fn iter_points(&self, span: Span, depth: usize) -> TupleIter<'_, PointTuple> {
        Box::new(span.shifted(depth).slice(&self.points).iter().cloned())
    }

    fn iter_bucket_goals(&self, span: Span) -> TupleIter<'_, BucketGoalTuple> {
        Box::new(span.slice(&self.bucket_goals).iter().copied())
    }

    fn iter_axes(&self, span: Span) -> TupleIter<'_, AxisTuple> {
        Box::new(span.slice(&self.axes).iter().cloned())
    }

    fn iter_axis_values(&self, span: Span) -> TupleIter<'_, AxisValueTuple> {
        Box::new(span.slice(&self.axis_values).iter().cloned())
    }

    fn iter_goals(&self, span: Span) -> TupleIter<'_, GoalTuple> {
        Box::new(span.slice(&self.goals).iter().cloned())
    }

    fn iter_point_hits(&self, span: Span, depth: usize) -> TupleIter<'_, PointHitTuple> {
        Box::new(span.shifted(depth).slice(&self.point_hits).iter().copied())
    }

    fn iter_bucket_hits(&self, span: Span) -> TupleIter<'_, BucketHitTuple> {
        Box::new(span.slice(&self.bucket_hits).iter().copied())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn node(start: usize, depth: usize, end: usize, name: &str) -> PointTuple {
        PointTuple {
            start,
            depth,
            end,
            axis_start: 0,
            axis_end: 0,
            axis_value_start: 0,
            axis_value_end: 0,
            goal_start: 0,
            goal_end: 0,
            bucket_start: 0,
            bucket_end: 0,
            target: 0,
            target_buckets: 0,
            name: name.to_string(),
            description: String::new(),
        }
    }

    /// top { g { p, q }, r }
    fn reading() -> PuppetReading {
        PuppetReading {
            def_sha: Some("def".into()),
            points: vec![
                node(0, 0, 4, "top"),
                node(0, 1, 3, "g"),
                node(0, 2, 1, "p"),
                node(1, 2, 2, "q"),
                node(3, 1, 4, "r"),
            ],
            bucket_hits: (0..4).map(|start| BucketHitTuple { start, hits: 1 }).collect(),
            ..PuppetReading::new()
        }
    }

    #[test]
    fn test_missing_hashes() {
        let reading = reading();
        assert_eq!(reading.def_sha().unwrap(), "def");
        assert!(matches!(
            reading.rec_sha(),
            Err(BucketError::MissingHash { which: "rec_sha" })
        ));
    }

    #[test]
    fn test_subtree_slice_by_depth() {
        let reading = reading();
        let g = reading.points[1].clone();
        let names: Vec<String> = reading
            .iter_points(Span::new(g.start, g.end), g.depth)
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["g", "p", "q"]);

        let all: Vec<String> = reading
            .iter_points(Span::all(), 0)
            .map(|p| p.name)
            .collect();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_bucket_slice() {
        let reading = reading();
        let starts: Vec<usize> = reading
            .iter_bucket_hits(Span::new(1, 3))
            .map(|b| b.start)
            .collect();
        assert_eq!(starts, [1, 2]);
        assert_eq!(reading.iter_bucket_hits(Span::from(10..)).count(), 0);
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reading.json");
        let reading = reading();
        reading.save(&path).unwrap();
        let loaded = PuppetReading::load(&path).unwrap();
        assert_eq!(loaded, reading);
        assert_eq!(PuppetReading::from_reading(&loaded), reading);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            PuppetReading::from_json("{ not json"),
            Err(BucketError::Json(_))
        ));
    }
}
