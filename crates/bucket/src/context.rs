//! Coverage context.
//!
//! A [`CoverageContext`] is a typed key/value bag handed to every `setup` call,
//! so a coverage model can be parameterised (ISA variant, enabled features,
//! name lists) without globals. [`ContextStack`] layers contexts for callers
//! that build several trees with slightly different settings.

use crate::result::{BucketError, BucketResult};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Immutable typed key/value bag
#[derive(Clone, Default)]
pub struct CoverageContext {
    entries: BTreeMap<String, Rc<dyn Any>>,
}

impl CoverageContext {
    /// Empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry
    #[must_use]
    pub fn with<V: Any>(mut self, key: impl Into<String>, value: V) -> Self {
        self.entries.insert(key.into(), Rc::new(value));
        self
    }

    /// Typed lookup; `None` when missing or of another type
    #[must_use]
    pub fn get<V: Any>(&self, key: &str) -> Option<&V> {
        self.entries.get(key).and_then(|v| v.downcast_ref::<V>())
    }

    /// Whether `key` is present
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the context has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A new context with `other`'s entries laid over this one
    ///
    /// Fails if a key already exists and `replace` is false.
    pub fn overlay(&self, other: &Self, replace: bool) -> BucketResult<Self> {
        let mut entries = self.entries.clone();
        for (key, value) in &other.entries {
            if !replace && entries.contains_key(key) {
                return Err(BucketError::ContextKeyExists { key: key.clone() });
            }
            entries.insert(key.clone(), Rc::clone(value));
        }
        Ok(Self { entries })
    }
}

impl fmt::Debug for CoverageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoverageContext")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Owned stack of contexts; the bottom entry is never popped
#[derive(Debug, Clone)]
pub struct ContextStack {
    stack: Vec<CoverageContext>,
}

impl ContextStack {
    /// Stack holding one empty context
    #[must_use]
    pub fn new() -> Self {
        Self::with_base(CoverageContext::new())
    }

    /// Stack holding `base`
    #[must_use]
    pub fn with_base(base: CoverageContext) -> Self {
        Self { stack: vec![base] }
    }

    /// Push a context as-is
    pub fn push(&mut self, ctx: CoverageContext) {
        self.stack.push(ctx);
    }

    /// Push `ctx` laid over the current context
    pub fn push_overlay(&mut self, ctx: &CoverageContext, replace: bool) -> BucketResult<()> {
        let next = self.current().overlay(ctx, replace)?;
        self.stack.push(next);
        Ok(())
    }

    /// Pop the top context; the base stays
    pub fn pop(&mut self) -> Option<CoverageContext> {
        if self.stack.len() > 1 {
            self.stack.pop()
        } else {
            None
        }
    }

    /// Top of the stack
    #[must_use]
    pub fn current(&self) -> &CoverageContext {
        &self.stack[self.stack.len() - 1]
    }

    /// Number of contexts, including the base
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Run `f` with `ctx` overlaid, popping it afterwards
    pub fn scoped<R>(
        &mut self,
        ctx: &CoverageContext,
        replace: bool,
        f: impl FnOnce(&CoverageContext) -> R,
    ) -> BucketResult<R> {
        self.push_overlay(ctx, replace)?;
        let out = f(self.current());
        self.pop();
        Ok(out)
    }
}

impl Default for ContextStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_typed_lookup() {
        let ctx = CoverageContext::new()
            .with("isa", "RV32I".to_string())
            .with("lanes", 4_u32);
        assert_eq!(ctx.get::<String>("isa").unwrap(), "RV32I");
        assert_eq!(*ctx.get::<u32>("lanes").unwrap(), 4);
        assert!(ctx.get::<i64>("lanes").is_none());
        assert!(ctx.get::<u32>("missing").is_none());
        assert_eq!(ctx.keys().collect::<Vec<_>>(), ["isa", "lanes"]);
    }

    #[test]
    fn test_overlay_refuses_replace() {
        let base = CoverageContext::new().with("isa", "a");
        let extra = CoverageContext::new().with("isa", "b");
        let err = base.overlay(&extra, false).unwrap_err();
        assert!(matches!(err, BucketError::ContextKeyExists { ref key } if key == "isa"));

        let replaced = base.overlay(&extra, true).unwrap();
        assert_eq!(*replaced.get::<&str>("isa").unwrap(), "b");
        assert_eq!(*base.get::<&str>("isa").unwrap(), "a");
    }

    #[test]
    fn test_stack_layers() {
        let mut stack = ContextStack::with_base(CoverageContext::new().with("a", 1_i32));
        stack
            .push_overlay(&CoverageContext::new().with("b", 2_i32), false)
            .unwrap();
        assert_eq!(stack.depth(), 2);
        assert!(stack.current().contains("a"));
        assert!(stack.current().contains("b"));

        assert!(stack.pop().is_some());
        assert!(!stack.current().contains("b"));
        assert!(stack.pop().is_none());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_scoped() {
        let mut stack = ContextStack::new();
        let len = stack
            .scoped(&CoverageContext::new().with("x", ()), false, CoverageContext::len)
            .unwrap();
        assert_eq!(len, 1);
        assert!(stack.current().is_empty());
    }
}
