//! The root of a coverage tree.
//!
//! [`CoverTop`] owns the root covergroup together with the sampling
//! configuration, and is where filters are applied. The first filter applied
//! to a fresh tree behaves slightly differently for `include`: nodes that do
//! not match are switched off, so that including "a" selects only "a" rather
//! than leaving everything active.

use crate::config::CoverConfig;
use crate::covergroup::Covergroup;
use crate::filter;
use crate::node::{NodeMeta, NodeRef};
use crate::result::BucketResult;

/// Rewrites each trace before it reaches the tree
type TraceProcessor<T> = Box<dyn Fn(&T) -> T>;

/// Root covergroup plus sampling configuration
pub struct CoverTop<T> {
    root: Covergroup<T>,
    config: CoverConfig,
    filter_applied: bool,
    processor: Option<TraceProcessor<T>>,
}

impl<T> CoverTop<T> {
    /// Wrap a root covergroup
    #[must_use]
    pub const fn new(root: Covergroup<T>, config: CoverConfig) -> Self {
        Self {
            root,
            config,
            filter_applied: false,
            processor: None,
        }
    }

    /// Preprocess every trace with `processor` before sampling
    ///
    /// The tree sees only the processed trace. Without a processor traces
    /// are passed through unchanged.
    #[must_use]
    pub fn with_trace_processor(mut self, processor: impl Fn(&T) -> T + 'static) -> Self {
        self.processor = Some(Box::new(processor));
        self
    }

    /// Root covergroup
    #[must_use]
    pub const fn root(&self) -> &Covergroup<T> {
        &self.root
    }

    /// Root covergroup, mutably
    pub fn root_mut(&mut self) -> &mut Covergroup<T> {
        &mut self.root
    }

    /// Sampling configuration
    #[must_use]
    pub const fn config(&self) -> &CoverConfig {
        &self.config
    }

    /// Whether any filter has been applied since construction
    #[must_use]
    pub const fn filter_applied(&self) -> bool {
        self.filter_applied
    }

    /// Feed one trace, after preprocessing, to every active coverpoint
    pub fn sample(&mut self, trace: &T) -> BucketResult<()> {
        match &self.processor {
            Some(process) => {
                let processed = process(trace);
                self.root.sample(&processed, &self.config)
            }
            None => self.root.sample(trace, &self.config),
        }
    }

    /// Render the hierarchy as indented text
    #[must_use]
    pub fn tree(&self) -> String {
        self.root.tree()
    }

    /// Zero every bucket counter
    pub fn reset_hits(&mut self) {
        self.root.reset_hits();
    }

    fn apply(
        &mut self,
        kind: &str,
        matcher: &dyn Fn(&NodeMeta) -> bool,
        match_state: Option<bool>,
        mismatch_state: Option<bool>,
    ) -> &mut Self {
        let active = self.root.apply_filter(matcher, match_state, mismatch_state);
        self.filter_applied = true;
        tracing::debug!(filter = kind, root_active = active, "applied filter");
        self
    }

    /// Activate matching nodes and their subtrees
    ///
    /// On the first filter of a fresh tree, non-matching coverpoints are
    /// deactivated; afterwards they keep their state.
    pub fn include_by_function(&mut self, matcher: impl Fn(&NodeMeta) -> bool) -> &mut Self {
        let mismatch = if self.filter_applied { None } else { Some(false) };
        self.apply("include", &matcher, Some(true), mismatch)
    }

    /// Deactivate every coverpoint that does not match
    pub fn restrict_by_function(&mut self, matcher: impl Fn(&NodeMeta) -> bool) -> &mut Self {
        self.apply("restrict", &matcher, None, Some(false))
    }

    /// Deactivate matching nodes and their subtrees
    pub fn exclude_by_function(&mut self, matcher: impl Fn(&NodeMeta) -> bool) -> &mut Self {
        self.apply("exclude", &matcher, Some(false), None)
    }

    /// [`include_by_function`](Self::include_by_function) over name substrings
    pub fn include_by_name<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include_by_function(filter::by_name(names))
    }

    /// [`restrict_by_function`](Self::restrict_by_function) over name substrings
    pub fn restrict_by_name<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.restrict_by_function(filter::by_name(names))
    }

    /// [`exclude_by_function`](Self::exclude_by_function) over name substrings
    pub fn exclude_by_name<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_by_function(filter::by_name(names))
    }

    /// [`include_by_function`](Self::include_by_function) over tags
    pub fn include_by_tags<I, S>(&mut self, tags: I, match_all: bool) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include_by_function(filter::by_tags(tags, match_all))
    }

    /// [`restrict_by_function`](Self::restrict_by_function) over tags
    pub fn restrict_by_tags<I, S>(&mut self, tags: I, match_all: bool) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.restrict_by_function(filter::by_tags(tags, match_all))
    }

    /// [`exclude_by_function`](Self::exclude_by_function) over tags
    pub fn exclude_by_tags<I, S>(&mut self, tags: I, match_all: bool) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_by_function(filter::by_tags(tags, match_all))
    }

    /// Deactivate every node whose tier is above `level`
    pub fn set_tier_level(&mut self, level: u32) -> &mut Self {
        self.exclude_by_function(filter::above_tier(level))
    }
}

impl<T> std::fmt::Debug for CoverTop<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverTop")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("filter_applied", &self.filter_applied)
            .field("processor", &self.processor.is_some())
            .finish()
    }
}

impl<'a, T> From<&'a CoverTop<T>> for NodeRef<'a, T> {
    fn from(top: &'a CoverTop<T>) -> Self {
        NodeRef::Group(&top.root)
    }
}
