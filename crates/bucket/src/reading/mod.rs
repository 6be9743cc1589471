//! Flattened, range-queryable views of a coverage tree.
//!
//! A [`Reading`] exposes seven tuple kinds, each a flat array indexed by the
//! offsets the chain encoder assigned:
//!
//! ```text
//! points        ─ one per node, pre-order; slice with (span, depth)
//! bucket_goals  ─ one per bucket: which goal applies
//! axes          ─ one per axis, with its axis-value range
//! axis_values   ─ one per axis value name
//! goals         ─ one per goal, with its target
//! point_hits    ─ one per node, pre-order; slice with (span, depth)
//! bucket_hits   ─ one per bucket: raw hit count
//! ```
//!
//! plus two identity hashes: `def_sha` identifies the shape of the tree and
//! `rec_sha` the sampling context supplied by the caller.
//!
//! Implementations:
//! - [`PuppetReading`]: owns its tuples; serialises to JSON.
//! - [`PointReader`]: builds a puppet reading from a live tree.
//! - [`MergeReading`]: sums bucket hits across compatible readings.

mod archive;
mod merge;
mod point;
mod puppet;
mod summary;

pub use archive::{JsonArchive, MemoryArchive, Reader, RecordRef, Writer};
pub use merge::MergeReading;
pub use point::PointReader;
pub use puppet::PuppetReading;
pub use summary::{summarize, PointSummary};

use crate::chain::{DefCounters, Link, RunCounters};
use crate::result::BucketResult;
use serde::{Deserialize, Serialize};
use std::ops::{Range, RangeFrom, RangeFull};

/// A node of the tree, as laid out by the definition pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointTuple {
    /// Node-count offset at the start of the node
    pub start: usize,
    /// Depth below the reading root
    pub depth: usize,
    /// Node-count offset at the end of the node
    pub end: usize,
    /// First axis
    pub axis_start: usize,
    /// One past the last axis
    pub axis_end: usize,
    /// First axis value
    pub axis_value_start: usize,
    /// One past the last axis value
    pub axis_value_end: usize,
    /// First goal
    pub goal_start: usize,
    /// One past the last goal
    pub goal_end: usize,
    /// First bucket
    pub bucket_start: usize,
    /// One past the last bucket
    pub bucket_end: usize,
    /// Sum of positive bucket targets in this subtree
    pub target: i64,
    /// Buckets with a positive target in this subtree
    pub target_buckets: usize,
    /// Node name
    pub name: String,
    /// Node description
    pub description: String,
}

impl PointTuple {
    pub(crate) fn from_link<T>(link: &Link<'_, DefCounters, T>) -> Self {
        Self {
            start: link.start.point,
            depth: link.depth,
            end: link.end.point,
            axis_start: link.start.axis,
            axis_end: link.end.axis,
            axis_value_start: link.start.axis_value,
            axis_value_end: link.end.axis_value,
            goal_start: link.start.goal,
            goal_end: link.end.goal,
            bucket_start: link.start.bucket,
            bucket_end: link.end.bucket,
            target: link.end.target - link.start.target,
            target_buckets: link.end.target_buckets - link.start.target_buckets,
            name: link.item.name().to_string(),
            description: link.item.description().to_string(),
        }
    }

    /// Number of buckets in this subtree
    #[must_use]
    pub const fn buckets(&self) -> usize {
        self.bucket_end - self.bucket_start
    }

    /// Whether this node is a coverpoint rather than a covergroup
    ///
    /// Every coverpoint owns at least its default goal; covergroups own none.
    #[must_use]
    pub const fn is_coverpoint(&self) -> bool {
        self.end - self.start == 1 && self.goal_end > self.goal_start
    }
}

/// The goal applying to one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketGoalTuple {
    /// Bucket offset
    pub start: usize,
    /// Goal offset
    pub goal: usize,
}

/// One axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisTuple {
    /// Axis offset
    pub start: usize,
    /// First axis value
    pub value_start: usize,
    /// One past the last axis value
    pub value_end: usize,
    /// Axis name
    pub name: String,
    /// Axis description
    pub description: String,
}

/// One named axis value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisValueTuple {
    /// Axis value offset
    pub start: usize,
    /// Value name
    pub value: String,
}

/// One goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalTuple {
    /// Goal offset
    pub start: usize,
    /// Target hit count; zero ignores, negative is illegal
    pub target: i64,
    /// Goal name
    pub name: String,
    /// Goal description
    pub description: String,
}

/// Clamped hit totals of one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointHitTuple {
    /// Node-count offset at the start of the node
    pub start: usize,
    /// Depth below the reading root
    pub depth: usize,
    /// Clamped hits
    pub hits: u64,
    /// Buckets with at least one counted hit
    pub hit_buckets: usize,
    /// Buckets that reached their target
    pub full_buckets: usize,
}

impl PointHitTuple {
    pub(crate) fn from_link<T>(link: &Link<'_, RunCounters, T>) -> Self {
        Self {
            start: link.start.point,
            depth: link.depth,
            hits: link.end.hits - link.start.hits,
            hit_buckets: link.end.hit_buckets - link.start.hit_buckets,
            full_buckets: link.end.full_buckets - link.start.full_buckets,
        }
    }
}

/// Raw hit count of one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketHitTuple {
    /// Bucket offset
    pub start: usize,
    /// Raw hits
    pub hits: u64,
}

/// A half-open slice of a flat tuple array; `end: None` runs to the end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// First offset
    pub start: usize,
    /// One past the last offset
    pub end: Option<usize>,
}

impl Span {
    /// Everything
    #[must_use]
    pub const fn all() -> Self {
        Self {
            start: 0,
            end: None,
        }
    }

    /// `start..end`
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Shift both bounds by `offset`
    #[must_use]
    pub fn shifted(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end.map(|e| e + offset),
        }
    }

    /// Concrete bounds within a sequence of `len` items, clamped so slicing
    /// past the end yields nothing rather than panicking
    #[must_use]
    pub fn bounds(&self, len: usize) -> Range<usize> {
        let end = self.end.map_or(len, |e| e.min(len));
        let start = self.start.min(end);
        start..end
    }

    /// Slice `items` by this span
    #[must_use]
    pub fn slice<'s, I>(&self, items: &'s [I]) -> &'s [I] {
        &items[self.bounds(items.len())]
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl From<RangeFrom<usize>> for Span {
    fn from(range: RangeFrom<usize>) -> Self {
        Self {
            start: range.start,
            end: None,
        }
    }
}

impl From<RangeFull> for Span {
    fn from(_: RangeFull) -> Self {
        Self::all()
    }
}

/// Boxed tuple iterator returned by [`Reading`]
pub type TupleIter<'r, I> = Box<dyn Iterator<Item = I> + 'r>;

/// Uniform access to coverage data, independent of where it is stored
///
/// Point and point-hit slices take a `depth` as well as a span: the tuple of
/// a node lives at `start + depth`, so `iter_points(Span::new(p.start, p.end),
/// p.depth)` yields the node `p` followed by its whole subtree.
pub trait Reading {
    /// Hash identifying the shape of the tree
    fn def_sha(&self) -> BucketResult<&str>;

    /// Hash identifying the sampling context
    fn rec_sha(&self) -> BucketResult<&str>;

    /// Nodes in pre-order
    fn iter_points(&self, span: Span, depth: usize) -> TupleIter<'_, PointTuple>;

    /// Goal of every bucket
    fn iter_bucket_goals(&self, span: Span) -> TupleIter<'_, BucketGoalTuple>;

    /// Axes in traversal order
    fn iter_axes(&self, span: Span) -> TupleIter<'_, AxisTuple>;

    /// Axis value names in traversal order
    fn iter_axis_values(&self, span: Span) -> TupleIter<'_, AxisValueTuple>;

    /// Goals in traversal order
    fn iter_goals(&self, span: Span) -> TupleIter<'_, GoalTuple>;

    /// Clamped hit totals of every node, in pre-order
    fn iter_point_hits(&self, span: Span, depth: usize) -> TupleIter<'_, PointHitTuple>;

    /// Raw hits of every bucket
    fn iter_bucket_hits(&self, span: Span) -> TupleIter<'_, BucketHitTuple>;
}
