//! Node matchers for tree filtering.
//!
//! Each constructor returns a predicate over [`NodeMeta`] that can be handed to
//! the `*_by_function` filters on [`CoverTop`](crate::CoverTop).

use crate::node::NodeMeta;

/// Matches nodes whose name contains any of `names`, ignoring case
pub fn by_name<I, S>(names: I) -> impl Fn(&NodeMeta) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: Vec<String> = names
        .into_iter()
        .map(|n| n.as_ref().to_lowercase())
        .collect();
    move |meta| {
        let name = meta.name().to_lowercase();
        names.iter().any(|n| name.contains(n.as_str()))
    }
}

/// Matches nodes carrying any (or, with `match_all`, every) tag in `tags`
pub fn by_tags<I, S>(tags: I, match_all: bool) -> impl Fn(&NodeMeta) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tags: Vec<String> = tags.into_iter().map(|t| t.as_ref().to_lowercase()).collect();
    move |meta| {
        let has = |t: &String| meta.tags().contains(t);
        if match_all {
            tags.iter().all(has)
        } else {
            tags.iter().any(has)
        }
    }
}

/// Matches nodes with a tier above `level`
pub fn above_tier(level: u32) -> impl Fn(&NodeMeta) -> bool {
    move |meta| meta.tier().is_some_and(|tier| tier > level)
}
