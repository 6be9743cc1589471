//! Covergroups: named containers of coverpoints and child covergroups.
//!
//! Children are visited coverpoints first, then covergroups, each sorted by
//! name. Every traversal (sampling, filtering, both chain passes) uses that
//! order, which keeps the flattened offsets stable between passes.

use crate::config::CoverConfig;
use crate::context::CoverageContext;
use crate::coverpoint::Coverpoint;
use crate::hash::{Digest, StructuralHash};
use crate::node::{NodeMeta, NodeMut, NodeRef};
use crate::result::{BucketError, BucketResult};
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

/// User-supplied behaviour of a covergroup
pub trait GroupDefinition<T> {
    /// Attach children
    fn setup(&mut self, children: &mut Children<T>, ctx: &CoverageContext) -> BucketResult<()>;

    /// Return false to skip this subtree for `trace`
    fn should_sample(&self, _trace: &T) -> bool {
        true
    }
}

impl<T, F> GroupDefinition<T> for F
where
    F: FnMut(&mut Children<T>, &CoverageContext) -> BucketResult<()>,
{
    fn setup(&mut self, children: &mut Children<T>, ctx: &CoverageContext) -> BucketResult<()> {
        self(children, ctx)
    }
}

/// Children collected while a covergroup is set up
pub struct Children<T> {
    parent: String,
    points: BTreeMap<String, Coverpoint<T>>,
    groups: BTreeMap<String, Covergroup<T>>,
}

impl<T> Children<T> {
    fn new(parent: &str) -> Self {
        Self {
            parent: parent.to_string(),
            points: BTreeMap::new(),
            groups: BTreeMap::new(),
        }
    }

    fn check_unique(&self, name: &str) -> BucketResult<()> {
        if self.points.contains_key(name) || self.groups.contains_key(name) {
            return Err(BucketError::DuplicateChild {
                parent: self.parent.clone(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Attach a coverpoint
    pub fn add_coverpoint(&mut self, point: Coverpoint<T>) -> BucketResult<()> {
        self.check_unique(point.name())?;
        self.points.insert(point.name().to_string(), point);
        Ok(())
    }

    /// Attach a covergroup
    pub fn add_covergroup(&mut self, group: Covergroup<T>) -> BucketResult<()> {
        self.check_unique(group.name())?;
        self.groups.insert(group.name().to_string(), group);
        Ok(())
    }

    /// Number of children attached so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len() + self.groups.len()
    }

    /// Whether no children have been attached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> fmt::Debug for Children<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Children")
            .field("parent", &self.parent)
            .field("points", &self.points.keys().collect::<Vec<_>>())
            .field("groups", &self.groups.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A named container composing coverpoints and child covergroups
pub struct Covergroup<T> {
    meta: NodeMeta,
    sha: Digest,
    points: BTreeMap<String, Coverpoint<T>>,
    groups: BTreeMap<String, Covergroup<T>>,
    definition: Box<dyn GroupDefinition<T>>,
}

impl<T> Covergroup<T> {
    /// Build a covergroup, running `setup` to attach its children
    pub fn new<D>(
        name: impl Into<String>,
        description: impl Into<String>,
        definition: D,
        ctx: &CoverageContext,
    ) -> BucketResult<Self>
    where
        D: GroupDefinition<T> + 'static,
    {
        let meta = NodeMeta::new(name.into(), description.into());
        let mut definition = definition;
        let mut children = Children::new(meta.name());
        definition.setup(&mut children, ctx)?;

        let sha = StructuralHash::new(meta.name(), meta.description()).finish();
        tracing::debug!(
            group = meta.name(),
            points = children.points.len(),
            groups = children.groups.len(),
            "built covergroup"
        );

        Ok(Self {
            meta,
            sha,
            points: children.points,
            groups: children.groups,
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

    /// Covergroup name
    #[must_use]
    pub fn name(&self) -> &str {
        self.meta.name()
    }

    /// Covergroup description
    #[must_use]
    pub fn description(&self) -> &str {
        self.meta.description()
    }

    /// Whether any part of this subtree is sampled
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.meta.is_active()
    }

    /// Structural hash over name and description
    #[must_use]
    pub const fn sha(&self) -> Digest {
        self.sha
    }

    /// Child coverpoints, sorted by name
    pub fn coverpoints(&self) -> impl Iterator<Item = &Coverpoint<T>> + '_ {
        self.points.values()
    }

    /// Child covergroups, sorted by name
    pub fn covergroups(&self) -> impl Iterator<Item = &Covergroup<T>> + '_ {
        self.groups.values()
    }

    /// Children in traversal order: coverpoints, then covergroups
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'_, T>> + '_ {
        self.points
            .values()
            .map(NodeRef::Point)
            .chain(self.groups.values().map(NodeRef::Group))
    }

    /// Every node of this subtree in pre-order, starting with this group
    #[must_use]
    pub fn walk(&self) -> Vec<NodeRef<'_, T>> {
        let mut nodes = vec![NodeRef::Group(self)];
        for point in self.points.values() {
            nodes.push(NodeRef::Point(point));
        }
        for group in self.groups.values() {
            nodes.extend(group.walk());
        }
        nodes
    }

    /// Look up an immediate child
    #[must_use]
    pub fn get_child(&self, name: &str) -> Option<NodeRef<'_, T>> {
        self.points
            .get(name)
            .map(NodeRef::Point)
            .or_else(|| self.groups.get(name).map(NodeRef::Group))
    }

    /// Look up an immediate child mutably
    pub fn get_child_mut(&mut self, name: &str) -> Option<NodeMut<'_, T>> {
        if let Some(point) = self.points.get_mut(name) {
            return Some(NodeMut::Point(point));
        }
        self.groups.get_mut(name).map(NodeMut::Group)
    }

    /// Look up a descendant by a dot-separated path relative to this group
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<NodeRef<'_, T>> {
        let mut parts = path.split('.');
        let mut node = self.get_child(parts.next()?)?;
        for part in parts {
            node = node.as_group()?.get_child(part)?;
        }
        Some(node)
    }

    /// Look up a descendant mutably by a dot-separated path
    pub fn get_path_mut(&mut self, path: &str) -> Option<NodeMut<'_, T>> {
        match path.split_once('.') {
            None => self.get_child_mut(path),
            Some((head, rest)) => self.groups.get_mut(head)?.get_path_mut(rest),
        }
    }

    /// Render the hierarchy below this group as indented text
    #[must_use]
    pub fn tree(&self) -> String {
        let mut out = format!("* {}: {}\n", self.name(), self.description());
        self.write_tree(&mut out, 1);
        out
    }

    fn write_tree(&self, out: &mut String, level: usize) {
        let indent = "    ".repeat(level);
        for point in self.points.values() {
            let _ = writeln!(out, "{indent}|-- {}: {}", point.name(), point.description());
        }
        for group in self.groups.values() {
            let _ = writeln!(out, "{indent}|-- {}: {}", group.name(), group.description());
            group.write_tree(out, level + 1);
        }
    }

    /// Feed one trace to every active descendant
    pub fn sample(&mut self, trace: &T, config: &CoverConfig) -> BucketResult<()> {
        if !self.meta.is_active() || !self.definition.should_sample(trace) {
            return Ok(());
        }
        for point in self.points.values_mut() {
            point.sample(trace, config)?;
        }
        for group in self.groups.values_mut() {
            group.sample(trace, config)?;
        }
        Ok(())
    }

    /// Zero every bucket counter in this subtree
    pub fn reset_hits(&mut self) {
        self.points.values_mut().for_each(Coverpoint::reset_hits);
        self.groups.values_mut().for_each(Self::reset_hits);
    }

    /// Force the activity of this whole subtree
    pub(crate) fn set_active(&mut self, active: bool) {
        self.meta.set_active(active);
        for point in self.points.values_mut() {
            point.meta_mut().set_active(active);
        }
        for group in self.groups.values_mut() {
            group.set_active(active);
        }
    }

    /// Apply a filter to this subtree, returning whether it is left active
    ///
    /// A matching node takes `match_state` for itself and every descendant
    /// (or is left alone when `None`). A non-matching coverpoint takes
    /// `mismatch_state` (or is left alone), and a non-matching covergroup
    /// recurses and is active iff any child ends up active. A non-matching
    /// covergroup without children is treated like a coverpoint.
    pub(crate) fn apply_filter(
        &mut self,
        matcher: &dyn Fn(&NodeMeta) -> bool,
        match_state: Option<bool>,
        mismatch_state: Option<bool>,
    ) -> bool {
        if matcher(&self.meta) {
            if let Some(state) = match_state {
                self.set_active(state);
            }
            return self.meta.is_active();
        }

        if self.points.is_empty() && self.groups.is_empty() {
            if let Some(state) = mismatch_state {
                self.meta.set_active(state);
            }
            return self.meta.is_active();
        }

        let mut any_active = false;
        for point in self.points.values_mut() {
            any_active |= point.apply_filter(matcher, match_state, mismatch_state);
        }
        for group in self.groups.values_mut() {
            any_active |= group.apply_filter(matcher, match_state, mismatch_state);
        }
        self.meta.set_active(any_active);
        any_active
    }
}

impl<T> fmt::Debug for Covergroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Covergroup")
            .field("meta", &self.meta)
            .field("points", &self.points)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}
