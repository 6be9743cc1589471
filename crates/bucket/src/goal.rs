//! Bucket goals.
//!
//! A goal classifies a bucket by its `target`:
//! - `target > 0`: hits count towards coverage, up to `target`
//! - `target == 0`: hits are ignored
//! - `target < 0`: any hit is illegal

use crate::hash::{Digest, StructuralHash};
use crate::result::{BucketError, BucketResult};
use std::collections::HashMap;

/// Name of the goal every coverpoint starts with
pub const DEFAULT_GOAL_NAME: &str = "DEFAULT";

/// Target of the default goal
pub const DEFAULT_GOAL_TARGET: i64 = 10;

/// How a goal treats hits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalKind {
    /// Hits count towards a target
    Target,
    /// Hits are ignored
    Ignore,
    /// Hits are illegal
    Illegal,
}

/// A named classification with an integer target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    name: String,
    description: String,
    target: i64,
    sha: Digest,
}

impl Goal {
    /// Create a goal
    #[must_use]
    pub fn new(name: impl Into<String>, target: i64, description: impl Into<String>) -> Self {
        let name = name.into();
        let description = description.into();
        let mut hash = StructuralHash::new(&name, &description);
        hash.update_str(&target.to_string());
        Self {
            name,
            description,
            target,
            sha: hash.finish(),
        }
    }

    /// Goal name as declared
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Goal description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Hit target
    #[must_use]
    pub const fn target(&self) -> i64 {
        self.target
    }

    /// Structural hash over name, description and target
    #[must_use]
    pub const fn sha(&self) -> Digest {
        self.sha
    }

    /// Classification derived from the target
    #[must_use]
    pub const fn kind(&self) -> GoalKind {
        match self.target {
            t if t > 0 => GoalKind::Target,
            0 => GoalKind::Ignore,
            _ => GoalKind::Illegal,
        }
    }
}

impl Default for Goal {
    fn default() -> Self {
        Self::new(DEFAULT_GOAL_NAME, DEFAULT_GOAL_TARGET, "")
    }
}

/// The goals of one coverpoint, in declaration order
///
/// Always starts with the default goal. Names are case-insensitive and
/// stored upper case.
#[derive(Debug, Clone)]
pub struct GoalSet {
    goals: Vec<Goal>,
    positions: HashMap<String, usize>,
}

impl GoalSet {
    /// A set holding only the default goal
    #[must_use]
    pub fn new() -> Self {
        let mut positions = HashMap::new();
        positions.insert(DEFAULT_GOAL_NAME.to_string(), 0);
        Self {
            goals: vec![Goal::default()],
            positions,
        }
    }

    /// Declare a goal for coverpoint `point`
    pub fn add(
        &mut self,
        point: &str,
        name: &str,
        target: i64,
        description: &str,
    ) -> BucketResult<usize> {
        let key = name.to_uppercase();
        if self.positions.contains_key(&key) {
            return Err(BucketError::DuplicateGoal {
                point: point.to_string(),
                goal: key,
            });
        }
        let position = self.goals.len();
        self.goals.push(Goal::new(name, target, description));
        self.positions.insert(key, position);
        Ok(position)
    }

    /// Look up a goal by name, ignoring case
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Goal> {
        self.position(name).map(|i| &self.goals[i])
    }

    /// Declaration index of a goal, ignoring case
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(&name.to_uppercase()).copied()
    }

    /// Goal by declaration index
    #[must_use]
    pub fn at(&self, position: usize) -> Option<&Goal> {
        self.goals.get(position)
    }

    /// The default goal
    #[must_use]
    pub fn default_goal(&self) -> &Goal {
        &self.goals[0]
    }

    /// Goals in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, Goal> {
        self.goals.iter()
    }

    /// Number of goals, including the default
    #[must_use]
    pub fn len(&self) -> usize {
        self.goals.len()
    }

    /// Always false; the default goal is always present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}

impl Default for GoalSet {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a GoalSet {
    type Item = &'a Goal;
    type IntoIter = std::slice::Iter<'a, Goal>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_default_goal() {
        let goal = Goal::default();
        assert_eq!(goal.name(), "DEFAULT");
        assert_eq!(goal.target(), 10);
        assert_eq!(goal.kind(), GoalKind::Target);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Goal::new("a", 0, "").kind(), GoalKind::Ignore);
        assert_eq!(Goal::new("a", -1, "").kind(), GoalKind::Illegal);
        assert_eq!(Goal::new("a", 50, "").kind(), GoalKind::Target);
    }

    #[test]
    fn test_hash_includes_target() {
        assert_eq!(Goal::new("a", 1, "d").sha(), Goal::new("a", 1, "d").sha());
        assert_ne!(Goal::new("a", 1, "d").sha(), Goal::new("a", 2, "d").sha());
        assert_ne!(Goal::new("a", 1, "d").sha(), Goal::new("a", 1, "e").sha());
    }

    #[test]
    fn test_set_starts_with_default() {
        let set = GoalSet::new();
        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());
        assert_eq!(set.default_goal().name(), DEFAULT_GOAL_NAME);
        assert_eq!(set.position("default"), Some(0));
    }

    #[test]
    fn test_add_is_case_insensitive() {
        let mut set = GoalSet::new();
        assert_eq!(set.add("p", "Stick", 50, "Yay sticks!").unwrap(), 1);
        assert_eq!(set.get("STICK").unwrap().target(), 50);
        assert_eq!(set.get("stick").unwrap().name(), "Stick");

        let err = set.add("p", "sTiCk", 1, "").unwrap_err();
        assert!(matches!(err, BucketError::DuplicateGoal { ref goal, .. } if goal == "STICK"));

        let err = set.add("p", "default", 1, "").unwrap_err();
        assert!(matches!(err, BucketError::DuplicateGoal { .. }));
    }

    #[test]
    fn test_declaration_order() {
        let mut set = GoalSet::new();
        set.add("p", "b", -1, "").unwrap();
        set.add("p", "a", 0, "").unwrap();
        let names: Vec<&str> = set.iter().map(Goal::name).collect();
        assert_eq!(names, ["DEFAULT", "b", "a"]);
        assert_eq!(set.at(2).unwrap().kind(), GoalKind::Ignore);
        assert!(set.at(3).is_none());
    }
}
