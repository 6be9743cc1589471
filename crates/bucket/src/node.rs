//! Tree nodes.
//!
//! A coverage tree has two kinds of node, [`Coverpoint`] and [`Covergroup`].
//! Both carry a [`NodeMeta`] with the data filters match against, and both
//! are reached through the [`NodeRef`] / [`NodeMut`] tagged unions.

use crate::covergroup::Covergroup;
use crate::coverpoint::Coverpoint;
use std::collections::BTreeSet;
use std::fmt;

/// Name, description and filter state of a tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMeta {
    name: String,
    description: String,
    tier: Option<u32>,
    tags: BTreeSet<String>,
    active: bool,
}

impl NodeMeta {
    pub(crate) fn new(name: String, description: String) -> Self {
        Self {
            name,
            description,
            tier: None,
            tags: BTreeSet::new(),
            active: true,
        }
    }

    /// Node name, unique among siblings
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Tier, if assigned; lower tiers are more fundamental
    #[must_use]
    pub const fn tier(&self) -> Option<u32> {
        self.tier
    }

    /// Lower-cased tags
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Whether the node is sampled
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_tier(&mut self, tier: u32) {
        self.tier = Some(tier);
    }

    pub(crate) fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags.into_iter().map(|t| t.as_ref().to_lowercase()).collect();
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Shared reference to a tree node
pub enum NodeRef<'a, T> {
    /// A coverpoint
    Point(&'a Coverpoint<T>),
    /// A covergroup
    Group(&'a Covergroup<T>),
}

impl<'a, T> NodeRef<'a, T> {
    /// Node metadata
    #[must_use]
    pub fn meta(&self) -> &'a NodeMeta {
        match *self {
            Self::Point(p) => p.meta(),
            Self::Group(g) => g.meta(),
        }
    }

    /// Node name
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.meta().name()
    }

    /// Whether the node is sampled
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.meta().is_active()
    }

    /// The coverpoint, if this is one
    #[must_use]
    pub const fn as_point(&self) -> Option<&'a Coverpoint<T>> {
        match *self {
            Self::Point(p) => Some(p),
            Self::Group(_) => None,
        }
    }

    /// The covergroup, if this is one
    #[must_use]
    pub const fn as_group(&self) -> Option<&'a Covergroup<T>> {
        match *self {
            Self::Point(_) => None,
            Self::Group(g) => Some(g),
        }
    }
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<T> fmt::Debug for NodeRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point(p) => f.debug_tuple("Point").field(&p.name()).finish(),
            Self::Group(g) => f.debug_tuple("Group").field(&g.name()).finish(),
        }
    }
}

impl<'a, T> From<&'a Coverpoint<T>> for NodeRef<'a, T> {
    fn from(point: &'a Coverpoint<T>) -> Self {
        Self::Point(point)
    }
}

impl<'a, T> From<&'a Covergroup<T>> for NodeRef<'a, T> {
    fn from(group: &'a Covergroup<T>) -> Self {
        Self::Group(group)
    }
}

/// Mutable reference to a tree node
pub enum NodeMut<'a, T> {
    /// A coverpoint
    Point(&'a mut Coverpoint<T>),
    /// A covergroup
    Group(&'a mut Covergroup<T>),
}

impl<T> NodeMut<'_, T> {
    /// Node metadata
    #[must_use]
    pub fn meta(&self) -> &NodeMeta {
        match self {
            Self::Point(p) => p.meta(),
            Self::Group(g) => g.meta(),
        }
    }

    /// Zero every bucket counter below this node
    pub fn reset_hits(&mut self) {
        match self {
            Self::Point(p) => p.reset_hits(),
            Self::Group(g) => g.reset_hits(),
        }
    }
}

impl<T> fmt::Debug for NodeMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point(p) => f.debug_tuple("Point").field(&p.name()).finish(),
            Self::Group(g) => f.debug_tuple("Group").field(&g.name()).finish(),
        }
    }
}
