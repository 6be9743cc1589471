//! Sampling cursor.
//!
//! A fresh [`Bucket`] is handed to [`PointDefinition::sample`](crate::PointDefinition::sample)
//! for every trace. Set a value for each axis, then call [`Bucket::hit`].
//! Values stay set after a hit, so several buckets differing in one axis can
//! be hit by changing only that axis.

use crate::axis::{Axis, AxisValue};
use crate::config::CoverConfig;
use crate::coverpoint::BucketSpace;
use crate::goal::{GoalKind, GoalSet};
use crate::result::{BucketError, BucketResult};

/// Cursor over one coverpoint's buckets
#[derive(Debug)]
pub struct Bucket<'p> {
    point: &'p str,
    axes: &'p [Axis],
    goals: &'p GoalSet,
    space: &'p BucketSpace,
    bucket_goals: &'p [usize],
    hits: &'p mut [u64],
    config: &'p CoverConfig,
    values: Vec<Option<AxisValue>>,
}

impl<'p> Bucket<'p> {
    pub(crate) fn new(
        point: &'p str,
        axes: &'p [Axis],
        goals: &'p GoalSet,
        space: &'p BucketSpace,
        bucket_goals: &'p [usize],
        hits: &'p mut [u64],
        config: &'p CoverConfig,
    ) -> Self {
        Self {
            point,
            axes,
            goals,
            space,
            bucket_goals,
            hits,
            config,
            values: vec![None; axes.len()],
        }
    }

    /// Set the raw value of one axis, overwriting any earlier value
    pub fn set(&mut self, axis: &str, value: impl Into<AxisValue>) -> BucketResult<&mut Self> {
        let index = self
            .axes
            .iter()
            .position(|a| a.name() == axis)
            .ok_or_else(|| BucketError::UnknownAxis {
                point: self.point.to_string(),
                axis: axis.to_string(),
            })?;
        self.values[index] = Some(value.into());
        Ok(self)
    }

    /// Set several axes at once
    pub fn set_all<I, K, V>(&mut self, values: I) -> BucketResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AxisValue>,
    {
        for (axis, value) in values {
            self.set(axis.as_ref(), value)?;
        }
        Ok(self)
    }

    /// Forget every axis value
    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|v| *v = None);
    }

    /// Set several axes, then hit
    pub fn hit_with<I, K, V>(&mut self, values: I) -> BucketResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AxisValue>,
    {
        self.set_all(values)?;
        self.hit()
    }

    /// Count a hit on the bucket selected by the current axis values
    ///
    /// Every axis must be set. Ignored buckets are not counted. Hits on
    /// illegal buckets are logged, or returned as [`BucketError::IllegalBucket`]
    /// when `except_on_illegal` is set.
    pub fn hit(&mut self) -> BucketResult<()> {
        let mut names = Vec::with_capacity(self.axes.len());
        let mut positions = Vec::with_capacity(self.axes.len());
        for (axis, value) in self.axes.iter().zip(&self.values) {
            let value = value.as_ref().ok_or_else(|| BucketError::AxisNotSet {
                point: self.point.to_string(),
                axis: axis.name().to_string(),
            })?;
            let name = axis.get_named_value(value.clone())?;
            let position = axis
                .position(&name)
                .ok_or_else(|| BucketError::UnrecognisedValue {
                    axis: axis.name().to_string(),
                    value: value.to_string(),
                })?;
            names.push(name);
            positions.push(position);
        }

        let Some(offset) = self.space.encode(&positions) else {
            return Ok(());
        };
        let Some(goal) = self
            .bucket_goals
            .get(offset)
            .and_then(|&g| self.goals.at(g))
        else {
            return Ok(());
        };

        match goal.kind() {
            GoalKind::Target => {
                if let Some(hits) = self.hits.get_mut(offset) {
                    *hits += 1;
                }
            }
            GoalKind::Ignore => {}
            GoalKind::Illegal => {
                let bucket = self.render(&names);
                if self.config.except_on_illegal {
                    return Err(BucketError::IllegalBucket {
                        point: self.point.to_string(),
                        goal: goal.name().to_string(),
                        bucket,
                    });
                }
                tracing::error!(
                    point = self.point,
                    goal = goal.name(),
                    bucket = %bucket,
                    "illegal bucket hit"
                );
            }
        }
        Ok(())
    }

    fn render(&self, names: &[String]) -> String {
        let pairs: Vec<String> = self
            .axes
            .iter()
            .zip(names)
            .map(|(axis, name)| format!("{}={name}", axis.name()))
            .collect();
        format!("{{{}}}", pairs.join(", "))
    }
}
