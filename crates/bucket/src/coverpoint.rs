//! Coverpoints: axes crossed into a bucket space, with a goal per bucket.
//!
//! The bucket space is the cartesian product of the axes' value names, laid
//! out flat with the first-declared axis varying slowest. Goals are resolved
//! once per bucket when the coverpoint is built, by calling
//! [`PointDefinition::apply_goals`], and the resolved goal of every bucket is
//! folded into the coverpoint's structural hash.

use crate::axis::{Axis, AxisValues};
use crate::bucket::Bucket;
use crate::config::CoverConfig;
use crate::context::CoverageContext;
use crate::goal::{Goal, GoalSet};
use crate::hash::{Digest, StructuralHash};
use crate::node::NodeMeta;
use crate::result::{BucketError, BucketResult};
use std::fmt;

/// User-supplied behaviour of a coverpoint
pub trait PointDefinition<T> {
    /// Declare axes and goals
    fn setup(&mut self, setup: &mut PointSetup, ctx: &CoverageContext) -> BucketResult<()>;

    /// Pick the goal for one bucket; `None` selects the default goal
    fn apply_goals<'g>(&self, _bucket: &BucketView<'_>, _goals: &'g GoalSet) -> Option<&'g Goal> {
        None
    }

    /// Record hits for one trace
    fn sample(&mut self, bucket: &mut Bucket<'_>, trace: &T) -> BucketResult<()>;
}

/// Collects axes and goals while a coverpoint is set up
#[derive(Debug)]
pub struct PointSetup {
    point: String,
    axes: Vec<Axis>,
    goals: GoalSet,
}

impl PointSetup {
    fn new(point: &str) -> Self {
        Self {
            point: point.to_string(),
            axes: Vec::new(),
            goals: GoalSet::new(),
        }
    }

    /// Declare an axis
    pub fn add_axis(
        &mut self,
        name: &str,
        values: impl Into<AxisValues>,
        description: &str,
    ) -> BucketResult<()> {
        self.push_axis(Axis::new(name, values, description)?)
    }

    /// Declare an axis whose unmatched values land in a bucket named `other`
    pub fn add_axis_with_other(
        &mut self,
        name: &str,
        values: impl Into<AxisValues>,
        description: &str,
        other: &str,
    ) -> BucketResult<()> {
        self.push_axis(Axis::with_other(name, values, description, other)?)
    }

    /// Declare a pre-built axis
    pub fn push_axis(&mut self, axis: Axis) -> BucketResult<()> {
        if self.axes.iter().any(|a| a.name() == axis.name()) {
            return Err(BucketError::DuplicateAxis {
                point: self.point.clone(),
                axis: axis.name().to_string(),
            });
        }
        self.axes.push(axis);
        Ok(())
    }

    /// Declare a goal; names are case-insensitive
    pub fn add_goal(&mut self, name: &str, target: i64, description: &str) -> BucketResult<()> {
        self.goals
            .add(&self.point, name, target, description)
            .map(|_| ())
    }

    /// Axes declared so far
    #[must_use]
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Goals declared so far
    #[must_use]
    pub fn goals(&self) -> &GoalSet {
        &self.goals
    }
}

/// One bucket of a coverpoint, as seen by [`PointDefinition::apply_goals`]
#[derive(Debug, Clone, Copy)]
pub struct BucketView<'a> {
    axes: &'a [Axis],
    values: &'a [&'a str],
}

impl<'a> BucketView<'a> {
    /// Value name of `axis` in this bucket
    #[must_use]
    pub fn get(&self, axis: &str) -> Option<&'a str> {
        self.axes
            .iter()
            .position(|a| a.name() == axis)
            .and_then(|i| self.values.get(i).copied())
    }

    /// Whether `axis` has value name `value` in this bucket
    #[must_use]
    pub fn is(&self, axis: &str, value: &str) -> bool {
        self.get(axis) == Some(value)
    }

    /// Whether `axis` has any of `values` in this bucket
    #[must_use]
    pub fn is_any(&self, axis: &str, values: &[&str]) -> bool {
        self.get(axis).is_some_and(|v| values.contains(&v))
    }

    /// Value names in axis order
    #[must_use]
    pub fn values(&self) -> &'a [&'a str] {
        self.values
    }
}

/// Flat layout of a cartesian product; the first axis varies slowest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSpace {
    sizes: Vec<usize>,
    len: usize,
}

impl BucketSpace {
    /// Layout for axes of the given sizes
    #[must_use]
    pub fn new(sizes: Vec<usize>) -> Self {
        let len = sizes.iter().product();
        Self { sizes, len }
    }

    /// Number of buckets
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the space has no buckets
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Axis sizes
    #[must_use]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Flat offset of per-axis positions
    #[must_use]
    pub fn encode(&self, positions: &[usize]) -> Option<usize> {
        if positions.len() != self.sizes.len() {
            return None;
        }
        let mut offset = 0;
        for (&pos, &size) in positions.iter().zip(&self.sizes) {
            if pos >= size {
                return None;
            }
            offset = offset * size + pos;
        }
        Some(offset)
    }

    /// Per-axis positions of a flat offset
    #[must_use]
    pub fn decode(&self, offset: usize) -> Option<Vec<usize>> {
        if offset >= self.len {
            return None;
        }
        let mut rest = offset;
        let mut positions = vec![0; self.sizes.len()];
        for (slot, &size) in positions.iter_mut().zip(&self.sizes).rev() {
            *slot = rest % size;
            rest /= size;
        }
        Some(positions)
    }
}

/// Definition-side totals of one coverpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointStats {
    /// Number of buckets
    pub buckets: usize,
    /// Sum of positive targets
    pub target: i64,
    /// Buckets with a positive target
    pub target_buckets: usize,
}

/// Run-side totals, with each bucket's hits clamped to its target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitStats {
    /// Sum of clamped hits
    pub hits: u64,
    /// Buckets with at least one counted hit
    pub hit_buckets: usize,
    /// Buckets that reached their target
    pub full_buckets: usize,
}

impl HitStats {
    /// Account one bucket
    pub fn add_bucket(&mut self, hits: u64, target: i64) {
        if target <= 0 {
            return;
        }
        let target = target as u64;
        let effective = hits.min(target);
        if effective > 0 {
            self.hit_buckets += 1;
            if effective == target {
                self.full_buckets += 1;
            }
            self.hits += effective;
        }
    }
}

/// A named set of axes with goal assignments over their bucket space
pub struct Coverpoint<T> {
    meta: NodeMeta,
    axes: Vec<Axis>,
    goals: GoalSet,
    space: BucketSpace,
    bucket_goals: Vec<usize>,
    bucket_hits: Vec<u64>,
    sha: Digest,
    definition: Box<dyn PointDefinition<T>>,
}

impl<T> Coverpoint<T> {
    /// Build a coverpoint, running `setup` and resolving every bucket's goal
    pub fn new<D>(
        name: impl Into<String>,
        description: impl Into<String>,
        definition: D,
        ctx: &CoverageContext,
    ) -> BucketResult<Self>
    where
        D: PointDefinition<T> + 'static,
    {
        let meta = NodeMeta::new(name.into(), description.into());
        let mut definition = definition;
        let mut setup = PointSetup::new(meta.name());
        definition.setup(&mut setup, ctx)?;
        let PointSetup { axes, goals, .. } = setup;

        let space = BucketSpace::new(axes.iter().map(Axis::size).collect());
        let bucket_goals = resolve_goals::<T, D>(&definition, &axes, &goals, &space);

        let mut hash = StructuralHash::new(meta.name(), meta.description());
        for axis in &axes {
            hash.absorb(&axis.sha());
        }
        for goal in &goals {
            hash.absorb(&goal.sha());
        }
        for &goal in &bucket_goals {
            if let Some(goal) = goals.at(goal) {
                hash.absorb(&goal.sha());
            }
        }

        tracing::debug!(
            point = meta.name(),
            axes = axes.len(),
            goals = goals.len(),
            buckets = space.len(),
            "built coverpoint"
        );

        Ok(Self {
            meta,
            bucket_hits: vec![0; space.len()],
            axes,
            goals,
            space,
            bucket_goals,
            sha: hash.finish(),
            definition: Box::new(definition),
        })
    }

    /// Assign a tier
    #[must_use]
    pub fn with_tier(mut self, tier: u32) -> Self {
        self.meta.set_tier(tier);
        self
    }

    /// Assign tags, replacing any existing ones
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.meta.set_tags(tags);
        self
    }

    /// Node metadata
    #[must_use]
    pub fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    /// Coverpoint name
    #[must_use]
    pub fn name(&self) -> &str {
        self.meta.name()
    }

    /// Coverpoint description
    #[must_use]
    pub fn description(&self) -> &str {
        self.meta.description()
    }

    /// Whether the coverpoint is sampled
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.meta.is_active()
    }

    /// Axes in declaration order
    #[must_use]
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Goals in declaration order
    #[must_use]
    pub fn goals(&self) -> &GoalSet {
        &self.goals
    }

    /// Structural hash over name, description, axes, goals and bucket goals
    #[must_use]
    pub const fn sha(&self) -> Digest {
        self.sha
    }

    /// Bucket layout
    #[must_use]
    pub fn space(&self) -> &BucketSpace {
        &self.space
    }

    /// Number of buckets
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.space.len()
    }

    /// Goal index of each bucket, in flat order
    #[must_use]
    pub fn bucket_goal_indices(&self) -> &[usize] {
        &self.bucket_goals
    }

    /// Hit count of each bucket, in flat order
    #[must_use]
    pub fn bucket_hits(&self) -> &[u64] {
        &self.bucket_hits
    }

    /// Goal of the bucket at `offset`
    #[must_use]
    pub fn bucket_goal(&self, offset: usize) -> Option<&Goal> {
        self.bucket_goals
            .get(offset)
            .and_then(|&g| self.goals.at(g))
    }

    /// Value names of the bucket at `offset`, in axis order
    #[must_use]
    pub fn bucket_key(&self, offset: usize) -> Option<Vec<&str>> {
        let positions = self.space.decode(offset)?;
        positions
            .iter()
            .zip(&self.axes)
            .map(|(&pos, axis)| axis.value_names().nth(pos))
            .collect()
    }

    /// Flat offset of the bucket with the given value names
    #[must_use]
    pub fn bucket_offset(&self, key: &[&str]) -> Option<usize> {
        if key.len() != self.axes.len() {
            return None;
        }
        let positions: Option<Vec<usize>> = key
            .iter()
            .zip(&self.axes)
            .map(|(name, axis)| axis.position(name))
            .collect();
        self.space.encode(&positions?)
    }

    /// Raw hit count of the bucket with the given value names
    #[must_use]
    pub fn hits(&self, key: &[&str]) -> Option<u64> {
        self.bucket_offset(key)
            .and_then(|offset| self.bucket_hits.get(offset).copied())
    }

    /// Bucket, target and target-bucket totals
    #[must_use]
    pub fn definition_stats(&self) -> PointStats {
        let mut stats = PointStats {
            buckets: self.space.len(),
            ..PointStats::default()
        };
        for offset in 0..self.space.len() {
            let target = self.bucket_goal(offset).map_or(0, Goal::target);
            if target > 0 {
                stats.target += target;
                stats.target_buckets += 1;
            }
        }
        stats
    }

    /// Clamped hit totals
    #[must_use]
    pub fn run_stats(&self) -> HitStats {
        let mut stats = HitStats::default();
        for (offset, &hits) in self.bucket_hits.iter().enumerate() {
            let target = self.bucket_goal(offset).map_or(0, Goal::target);
            stats.add_bucket(hits, target);
        }
        stats
    }

    /// Feed one trace through the user's `sample`, unless inactive
    pub fn sample(&mut self, trace: &T, config: &CoverConfig) -> BucketResult<()> {
        if !self.meta.is_active() {
            return Ok(());
        }
        let mut bucket = Bucket::new(
            self.meta.name(),
            &self.axes,
            &self.goals,
            &self.space,
            &self.bucket_goals,
            &mut self.bucket_hits,
            config,
        );
        self.definition.sample(&mut bucket, trace)
    }

    /// Zero every bucket counter
    pub fn reset_hits(&mut self) {
        self.bucket_hits.iter_mut().for_each(|h| *h = 0);
    }

    pub(crate) fn meta_mut(&mut self) -> &mut NodeMeta {
        &mut self.meta
    }

    pub(crate) fn apply_filter(
        &mut self,
        matcher: &dyn Fn(&NodeMeta) -> bool,
        match_state: Option<bool>,
        mismatch_state: Option<bool>,
    ) -> bool {
        let state = if matcher(&self.meta) {
            match_state
        } else {
            mismatch_state
        };
        if let Some(state) = state {
            self.meta.set_active(state);
        }
        self.meta.is_active()
    }
}

impl<T> fmt::Debug for Coverpoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coverpoint")
            .field("meta", &self.meta)
            .field("axes", &self.axes.iter().map(Axis::name).collect::<Vec<_>>())
            .field("goals", &self.goals.len())
            .field("buckets", &self.space.len())
            .field("sha", &self.sha.to_hex())
            .finish_non_exhaustive()
    }
}

fn resolve_goals<T, D>(definition: &D, axes: &[Axis], goals: &GoalSet, space: &BucketSpace) -> Vec<usize>
where
    D: PointDefinition<T> + ?Sized,
{
    let names: Vec<Vec<&str>> = axes.iter().map(|a| a.value_names().collect()).collect();
    let mut bucket_goals = Vec::with_capacity(space.len());
    let mut key: Vec<&str> = Vec::with_capacity(axes.len());
    for offset in 0..space.len() {
        key.clear();
        if let Some(positions) = space.decode(offset) {
            key.extend(positions.iter().zip(&names).map(|(&p, n)| n[p]));
        }
        let view = BucketView { axes, values: &key };
        let goal = definition
            .apply_goals(&view, goals)
            .and_then(|g| goals.position(g.name()))
            .unwrap_or(0);
        bucket_goals.push(goal);
    }
    bucket_goals
}
