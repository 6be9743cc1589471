//! Nested-interval flattening of a coverage tree.
//!
//! Every node visited by a pass is given a closed interval over a set of
//! counters. A node's interval starts where its parent's does (first child)
//! or where its previous sibling's ended, and ends at its last child's end
//! plus its own contribution:
//!
//! ```text
//!   group  [0 ................................ 5)
//!     point [0 ... 1)  point [1 ... 2)  group [2 ...... 4)
//!                                         point [2 .. 3)
//! ```
//!
//! Two passes share the same traversal order:
//!
//! | Pass                     | Counters        | Visits                    |
//! |--------------------------|-----------------|---------------------------|
//! | [`Chain::definition`]    | [`DefCounters`] | groups, points, axes, goals |
//! | [`Chain::run`]           | [`RunCounters`] | groups, points            |
//!
//! so the Nth node of one pass is the Nth node of the other. Sorting closed
//! node links by `(start.point, depth)` recovers pre-order, and
//! `start.point + depth` is a node's pre-order position.

use crate::axis::Axis;
use crate::covergroup::Covergroup;
use crate::coverpoint::Coverpoint;
use crate::goal::Goal;
use crate::hash::Digest;
use crate::node::NodeRef;
use std::fmt;
use std::ops::Add;

/// Additive counters carried along a chain
pub trait Counters: Copy + Default + Add<Output = Self> + fmt::Debug {
    /// Node-count dimension
    fn point(&self) -> usize;
}

/// Definition-pass counters
///
/// Addition sums every count and folds the right-hand digest into the
/// left-hand one, so the digest at the end of a chain covers every node
/// visited, in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefCounters {
    /// Nodes (coverpoints and covergroups)
    pub point: usize,
    /// Axes
    pub axis: usize,
    /// Axis values
    pub axis_value: usize,
    /// Goals
    pub goal: usize,
    /// Buckets
    pub bucket: usize,
    /// Sum of positive bucket targets
    pub target: i64,
    /// Buckets with a positive target
    pub target_buckets: usize,
    /// Running structural digest
    pub sha: Digest,
}

impl Add for DefCounters {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            point: self.point + rhs.point,
            axis: self.axis + rhs.axis,
            axis_value: self.axis_value + rhs.axis_value,
            goal: self.goal + rhs.goal,
            bucket: self.bucket + rhs.bucket,
            target: self.target + rhs.target,
            target_buckets: self.target_buckets + rhs.target_buckets,
            sha: self.sha.combine(rhs.sha),
        }
    }
}

impl Counters for DefCounters {
    fn point(&self) -> usize {
        self.point
    }
}

/// Run-pass counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Nodes (coverpoints and covergroups)
    pub point: usize,
    /// Buckets
    pub bucket: usize,
    /// Clamped hits
    pub hits: u64,
    /// Buckets with at least one counted hit
    pub hit_buckets: usize,
    /// Buckets that reached their target
    pub full_buckets: usize,
}

impl Add for RunCounters {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            point: self.point + rhs.point,
            bucket: self.bucket + rhs.bucket,
            hits: self.hits + rhs.hits,
            hit_buckets: self.hit_buckets + rhs.hit_buckets,
            full_buckets: self.full_buckets + rhs.full_buckets,
        }
    }
}

impl Counters for RunCounters {
    fn point(&self) -> usize {
        self.point
    }
}

/// The item a link was closed over
pub enum ItemRef<'a, T> {
    /// A coverpoint
    Point(&'a Coverpoint<T>),
    /// A covergroup
    Group(&'a Covergroup<T>),
    /// An axis of a coverpoint
    Axis(&'a Axis),
    /// A goal of a coverpoint
    Goal(&'a Goal),
}

impl<T> ItemRef<'_, T> {
    /// Name of the item
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Point(p) => p.name(),
            Self::Group(g) => g.name(),
            Self::Axis(a) => a.name(),
            Self::Goal(g) => g.name(),
        }
    }

    /// Description of the item
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Point(p) => p.description(),
            Self::Group(g) => g.description(),
            Self::Axis(a) => a.description(),
            Self::Goal(g) => g.description(),
        }
    }
}

impl<T> Clone for ItemRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ItemRef<'_, T> {}

impl<T> fmt::Debug for ItemRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Point(_) => "Point",
            Self::Group(_) => "Group",
            Self::Axis(_) => "Axis",
            Self::Goal(_) => "Goal",
        };
        f.debug_tuple(kind).field(&self.name()).finish()
    }
}

impl<'a, T> From<NodeRef<'a, T>> for ItemRef<'a, T> {
    fn from(node: NodeRef<'a, T>) -> Self {
        match node {
            NodeRef::Point(p) => Self::Point(p),
            NodeRef::Group(g) => Self::Group(g),
        }
    }
}

/// A link whose start is known but whose end is not
#[derive(Debug, Clone, Copy)]
pub struct OpenLink<C> {
    /// Counters at the start of the interval
    pub start: C,
    /// Depth below the chain root
    pub depth: usize,
}

impl<C: Counters> OpenLink<C> {
    /// Open the root of a chain, with every counter at zero
    #[must_use]
    pub fn root() -> Self {
        Self {
            start: C::default(),
            depth: 0,
        }
    }

    /// Open the first child of this link
    #[must_use]
    pub fn link_down(&self) -> Self {
        Self {
            start: self.start,
            depth: self.depth + 1,
        }
    }

    /// Close this link over `item` and record it in `index`
    ///
    /// The end is `child.end + contribution` when the item has children,
    /// otherwise `start + contribution`.
    pub fn close<'a, T>(
        &self,
        index: &mut ChainIndex<'a, C, T>,
        item: ItemRef<'a, T>,
        child: Option<&Link<'a, C, T>>,
        contribution: C,
    ) -> Link<'a, C, T> {
        let base = child.map_or(self.start, |c| c.end);
        let link = Link {
            start: self.start,
            end: base + contribution,
            depth: self.depth,
            item,
        };
        index.push(link);
        link
    }
}

/// A closed interval over one item
pub struct Link<'a, C, T> {
    /// Counters at the start of the interval
    pub start: C,
    /// Counters at the end of the interval
    pub end: C,
    /// Depth below the chain root
    pub depth: usize,
    /// The item this interval covers
    pub item: ItemRef<'a, T>,
}

impl<C: Counters, T> Link<'_, C, T> {
    /// Open the next sibling, starting where this link ends
    #[must_use]
    pub fn link_across(&self) -> OpenLink<C> {
        OpenLink {
            start: self.end,
            depth: self.depth,
        }
    }

    /// Pre-order position among the chain's nodes
    #[must_use]
    pub fn position(&self) -> usize {
        self.start.point() + self.depth
    }
}

impl<C: Copy, T> Clone for Link<'_, C, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Copy, T> Copy for Link<'_, C, T> {}

impl<C: fmt::Debug, T> fmt::Debug for Link<'_, C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("item", &self.item)
            .field("depth", &self.depth)
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

/// Closed links, grouped by item type in closing order
pub struct ChainIndex<'a, C, T> {
    nodes: Vec<Link<'a, C, T>>,
    axes: Vec<Link<'a, C, T>>,
    goals: Vec<Link<'a, C, T>>,
}

impl<'a, C: Counters, T> ChainIndex<'a, C, T> {
    /// Empty index
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            axes: Vec::new(),
            goals: Vec::new(),
        }
    }

    fn push(&mut self, link: Link<'a, C, T>) {
        match link.item {
            ItemRef::Point(_) | ItemRef::Group(_) => self.nodes.push(link),
            ItemRef::Axis(_) => self.axes.push(link),
            ItemRef::Goal(_) => self.goals.push(link),
        }
    }

    /// Node links in closing (post-) order
    #[must_use]
    pub fn nodes(&self) -> &[Link<'a, C, T>] {
        &self.nodes
    }

    /// Node links in pre-order
    #[must_use]
    pub fn nodes_sorted(&self) -> Vec<Link<'a, C, T>> {
        let mut nodes = self.nodes.clone();
        nodes.sort_by_key(|link| (link.start.point(), link.depth));
        nodes
    }

    /// Axis links in traversal order
    #[must_use]
    pub fn axes(&self) -> &[Link<'a, C, T>] {
        &self.axes
    }

    /// Goal links in traversal order
    #[must_use]
    pub fn goals(&self) -> &[Link<'a, C, T>] {
        &self.goals
    }
}

impl<C: Counters, T> Default for ChainIndex<'_, C, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: fmt::Debug, T> fmt::Debug for ChainIndex<'_, C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainIndex")
            .field("nodes", &self.nodes)
            .field("axes", &self.axes)
            .field("goals", &self.goals)
            .finish()
    }
}

/// The result of one pass over a tree
pub struct Chain<'a, C, T> {
    /// Counters at the end of the root interval
    pub end: C,
    /// Every closed link
    pub index: ChainIndex<'a, C, T>,
}

impl<'a, T> Chain<'a, DefCounters, T> {
    /// Definition pass: counts structure and folds structural digests
    pub fn definition(node: impl Into<NodeRef<'a, T>>) -> Self {
        let mut index = ChainIndex::new();
        let root = chain_def(node.into(), OpenLink::root(), &mut index);
        Self {
            end: root.end,
            index,
        }
    }

    /// Hex digest identifying the shape of the tree
    #[must_use]
    pub fn def_sha(&self) -> String {
        self.end.sha.to_hex()
    }
}

impl<'a, T> Chain<'a, RunCounters, T> {
    /// Run pass: counts clamped hits from the live bucket counters
    pub fn run(node: impl Into<NodeRef<'a, T>>) -> Self {
        let mut index = ChainIndex::new();
        let root = chain_run(node.into(), OpenLink::root(), &mut index);
        Self {
            end: root.end,
            index,
        }
    }
}

impl<C: fmt::Debug, T> fmt::Debug for Chain<'_, C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("end", &self.end)
            .field("index", &self.index)
            .finish()
    }
}

type Visit<'a, C, T> = fn(NodeRef<'a, T>, OpenLink<C>, &mut ChainIndex<'a, C, T>) -> Link<'a, C, T>;

fn chain_group<'a, C: Counters, T>(
    group: &'a Covergroup<T>,
    open: OpenLink<C>,
    index: &mut ChainIndex<'a, C, T>,
    contribution: C,
    visit: Visit<'a, C, T>,
) -> Link<'a, C, T> {
    let mut child_open = open.link_down();
    let mut last = None;
    for child in group.children() {
        let link = visit(child, child_open, index);
        child_open = link.link_across();
        last = Some(link);
    }
    open.close(index, ItemRef::Group(group), last.as_ref(), contribution)
}

fn chain_def<'a, T>(
    node: NodeRef<'a, T>,
    open: OpenLink<DefCounters>,
    index: &mut ChainIndex<'a, DefCounters, T>,
) -> Link<'a, DefCounters, T> {
    match node {
        NodeRef::Group(group) => {
            let contribution = DefCounters {
                point: 1,
                sha: group.sha(),
                ..DefCounters::default()
            };
            chain_group(group, open, index, contribution, chain_def)
        }
        NodeRef::Point(point) => {
            let mut child_open = open.link_down();
            let mut last = None;
            for axis in point.axes() {
                let contribution = DefCounters {
                    axis: 1,
                    axis_value: axis.size(),
                    sha: axis.sha(),
                    ..DefCounters::default()
                };
                let link = child_open.close(index, ItemRef::Axis(axis), None, contribution);
                child_open = link.link_across();
                last = Some(link);
            }
            for goal in point.goals() {
                let contribution = DefCounters {
                    goal: 1,
                    sha: goal.sha(),
                    ..DefCounters::default()
                };
                let link = child_open.close(index, ItemRef::Goal(goal), None, contribution);
                child_open = link.link_across();
                last = Some(link);
            }

            let stats = point.definition_stats();
            let contribution = DefCounters {
                point: 1,
                bucket: stats.buckets,
                target: stats.target,
                target_buckets: stats.target_buckets,
                sha: point.sha(),
                ..DefCounters::default()
            };
            open.close(index, ItemRef::Point(point), last.as_ref(), contribution)
        }
    }
}

fn chain_run<'a, T>(
    node: NodeRef<'a, T>,
    open: OpenLink<RunCounters>,
    index: &mut ChainIndex<'a, RunCounters, T>,
) -> Link<'a, RunCounters, T> {
    match node {
        NodeRef::Group(group) => {
            let contribution = RunCounters {
                point: 1,
                ..RunCounters::default()
            };
            chain_group(group, open, index, contribution, chain_run)
        }
        NodeRef::Point(point) => {
            let stats = point.run_stats();
            let contribution = RunCounters {
                point: 1,
                bucket: point.bucket_count(),
                hits: stats.hits,
                hit_buckets: stats.hit_buckets,
                full_buckets: stats.full_buckets,
            };
            open.close(index, ItemRef::Point(point), None, contribution)
        }
    }
}
