//! Axes: named, ordered sets of value buckets.
//!
//! An axis is declared from either a named map (`{"low": [0, 10], "ten": 10}`)
//! or a list of scalars and two-element ranges. Either form is normalised into
//! a map from bucket name to [`ValueSpec`], sorted by name. Sampled values are
//! resolved to a bucket name with [`Axis::get_named_value`].

use crate::hash::{Digest, StructuralHash};
use crate::result::{BucketError, BucketResult};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Default name of the catch-all bucket
pub const DEFAULT_OTHER_NAME: &str = "Other";

/// A raw value, either supplied when declaring an axis or sampled from a trace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    /// Integer value
    Int(i64),
    /// String value
    Str(String),
}

impl AxisValue {
    /// Integer payload, if any
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Str(_) => None,
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// A value as written in an axis declaration: a scalar, or a range of bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Single value
    Scalar(AxisValue),
    /// Range bounds, validated to exactly two integers on normalisation
    Range(Vec<AxisValue>),
}

impl RawValue {
    /// Inclusive integer range
    #[must_use]
    pub fn range(lo: i64, hi: i64) -> Self {
        Self::Range(vec![AxisValue::Int(lo), AxisValue::Int(hi)])
    }
}

macro_rules! impl_int_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for AxisValue {
                fn from(v: $t) -> Self {
                    Self::Int(v as i64)
                }
            }

            impl From<$t> for RawValue {
                fn from(v: $t) -> Self {
                    Self::Scalar(AxisValue::from(v))
                }
            }
        )*
    };
}

impl_int_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

/// `true` and `false` become the integers `1` and `0`.
///
/// A bool-valued list axis therefore has buckets named `"0"` and `"1"`, and a
/// bool trace value resolves against integer-valued axes such as
/// [`enabled`](crate::axis_utils::enabled) or
/// [`read_write`](crate::axis_utils::read_write).
impl From<bool> for AxisValue {
    fn from(v: bool) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for AxisValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AxisValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&String> for AxisValue {
    fn from(v: &String) -> Self {
        Self::Str(v.clone())
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        Self::Scalar(v.into())
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Scalar(v.into())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::Scalar(v.into())
    }
}

impl From<AxisValue> for RawValue {
    fn from(v: AxisValue) -> Self {
        Self::Scalar(v)
    }
}

impl From<(i64, i64)> for RawValue {
    fn from((lo, hi): (i64, i64)) -> Self {
        Self::range(lo, hi)
    }
}

impl From<[i64; 2]> for RawValue {
    fn from([lo, hi]: [i64; 2]) -> Self {
        Self::range(lo, hi)
    }
}

/// Values supplied when declaring an axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisValues {
    /// Explicitly named buckets; keys must be strings
    Named(Vec<(AxisValue, RawValue)>),
    /// Anonymous buckets, named after their value (or `"lo -> hi"` for ranges)
    List(Vec<RawValue>),
    /// A lone scalar, which is not a valid declaration
    Scalar(AxisValue),
}

impl AxisValues {
    /// Named buckets
    pub fn named<K, V, I>(entries: I) -> Self
    where
        K: Into<AxisValue>,
        V: Into<RawValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Named(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Anonymous buckets
    pub fn list<V, I>(values: I) -> Self
    where
        V: Into<RawValue>,
        I: IntoIterator<Item = V>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<RawValue>> From<Vec<V>> for AxisValues {
    fn from(values: Vec<V>) -> Self {
        Self::list(values)
    }
}

impl From<BTreeMap<String, RawValue>> for AxisValues {
    fn from(values: BTreeMap<String, RawValue>) -> Self {
        Self::named(values)
    }
}

/// A normalised bucket definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSpec {
    /// Matches one value
    Exact(AxisValue),
    /// Matches integers in `lo..=hi`
    Range {
        /// Lower bound
        lo: i64,
        /// Upper bound
        hi: i64,
    },
    /// Matches anything not matched by another bucket
    Other,
}

fn validate_range(axis: &str, bounds: &[AxisValue]) -> BucketResult<(i64, i64)> {
    if bounds.len() != 2 {
        return Err(BucketError::RangeIncorrectLength {
            axis: axis.to_string(),
            len: bounds.len(),
        });
    }
    let mut ints = [0_i64; 2];
    for (slot, bound) in ints.iter_mut().zip(bounds) {
        *slot = bound.as_int().ok_or_else(|| BucketError::RangeNotInt {
            axis: axis.to_string(),
            value: bound.to_string(),
        })?;
    }
    Ok((ints[0].min(ints[1]), ints[0].max(ints[1])))
}

fn spec_for(axis: &str, raw: RawValue) -> BucketResult<ValueSpec> {
    match raw {
        RawValue::Scalar(v) => Ok(ValueSpec::Exact(v)),
        RawValue::Range(bounds) => {
            let (lo, hi) = validate_range(axis, &bounds)?;
            Ok(ValueSpec::Range { lo, hi })
        }
    }
}

/// Normalise declared values into a name-sorted bucket map
///
/// When `other` is given, a catch-all bucket of that name is added.
pub fn normalize(
    axis: &str,
    values: AxisValues,
    other: Option<&str>,
) -> BucketResult<BTreeMap<String, ValueSpec>> {
    let mut map = BTreeMap::new();
    match values {
        AxisValues::Named(entries) => {
            for (key, raw) in entries {
                let AxisValue::Str(name) = key else {
                    return Err(BucketError::IncorrectNameFormat {
                        axis: axis.to_string(),
                        key: key.to_string(),
                    });
                };
                let spec = spec_for(axis, raw)?;
                map.insert(name, spec);
            }
        }
        AxisValues::List(entries) => {
            for raw in entries {
                let (name, spec) = match raw {
                    RawValue::Scalar(v) => (v.to_string(), ValueSpec::Exact(v)),
                    RawValue::Range(bounds) => {
                        let (lo, hi) = validate_range(axis, &bounds)?;
                        (format!("{lo} -> {hi}"), ValueSpec::Range { lo, hi })
                    }
                };
                map.insert(name, spec);
            }
        }
        AxisValues::Scalar(v) => {
            return Err(BucketError::IncorrectValueFormat {
                axis: axis.to_string(),
                found: format!("scalar {v}"),
            });
        }
    }

    if let Some(name) = other {
        if map.contains_key(name) {
            return Err(BucketError::OtherNameAlreadyInUse {
                axis: axis.to_string(),
                name: name.to_string(),
            });
        }
        map.insert(name.to_string(), ValueSpec::Other);
    }

    Ok(map)
}

/// A named, ordered set of value buckets
#[derive(Debug, Clone)]
pub struct Axis {
    name: String,
    description: String,
    values: BTreeMap<String, ValueSpec>,
    positions: HashMap<String, usize>,
    other: Option<String>,
    sha: Digest,
    cache: RefCell<HashMap<AxisValue, String>>,
    cache_hits: Cell<u64>,
}

impl Axis {
    /// Create an axis without a catch-all bucket
    pub fn new(
        name: impl Into<String>,
        values: impl Into<AxisValues>,
        description: impl Into<String>,
    ) -> BucketResult<Self> {
        Self::build(name.into(), values.into(), description.into(), None)
    }

    /// Create an axis whose unmatched values fall into a bucket named `other`
    pub fn with_other(
        name: impl Into<String>,
        values: impl Into<AxisValues>,
        description: impl Into<String>,
        other: impl Into<String>,
    ) -> BucketResult<Self> {
        Self::build(
            name.into(),
            values.into(),
            description.into(),
            Some(other.into()),
        )
    }

    fn build(
        name: String,
        values: AxisValues,
        description: String,
        other: Option<String>,
    ) -> BucketResult<Self> {
        let values = normalize(&name, values, other.as_deref())?;

        let mut hash = StructuralHash::new(&name, &description);
        for key in values.keys() {
            hash.update_str(key);
        }
        let positions = values
            .keys()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();

        tracing::debug!(axis = %name, size = values.len(), "added axis");

        Ok(Self {
            name,
            description,
            values,
            positions,
            other,
            sha: hash.finish(),
            cache: RefCell::new(HashMap::new()),
            cache_hits: Cell::new(0),
        })
    }

    /// Axis name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Axis description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Normalised buckets, sorted by name
    #[must_use]
    pub fn values(&self) -> &BTreeMap<String, ValueSpec> {
        &self.values
    }

    /// Bucket names in order
    pub fn value_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    /// Number of buckets
    #[must_use]
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Name of the catch-all bucket, if enabled
    #[must_use]
    pub fn other_name(&self) -> Option<&str> {
        self.other.as_deref()
    }

    /// Position of a bucket name within the sorted order
    #[must_use]
    pub fn position(&self, value_name: &str) -> Option<usize> {
        self.positions.get(value_name).copied()
    }

    /// Structural hash over name, description and bucket names
    #[must_use]
    pub const fn sha(&self) -> Digest {
        self.sha
    }

    /// Resolve a sampled value to its bucket name
    ///
    /// Resolution order: exact match on the value's string form, equality with
    /// a declared scalar, containment in a declared range (integers only), then
    /// the catch-all bucket. Results are memoised per value.
    pub fn get_named_value(&self, value: impl Into<AxisValue>) -> BucketResult<String> {
        let value = value.into();
        if let Some(hit) = self.cache.borrow().get(&value) {
            self.cache_hits.set(self.cache_hits.get() + 1);
            return Ok(hit.clone());
        }
        let name = self.resolve(&value)?;
        self.cache.borrow_mut().insert(value, name.clone());
        Ok(name)
    }

    fn resolve(&self, value: &AxisValue) -> BucketResult<String> {
        let as_str = value.to_string();
        if self.values.contains_key(&as_str) {
            return Ok(as_str);
        }

        for (name, spec) in &self.values {
            match spec {
                ValueSpec::Exact(v) if v == value => return Ok(name.clone()),
                ValueSpec::Range { lo, hi } => {
                    if let Some(v) = value.as_int() {
                        if (*lo..=*hi).contains(&v) {
                            return Ok(name.clone());
                        }
                    }
                }
                _ => {}
            }
        }

        self.other
            .clone()
            .ok_or_else(|| BucketError::UnrecognisedValue {
                axis: self.name.clone(),
                value: as_str,
            })
    }

    /// Number of lookups answered from the memo
    #[must_use]
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.get()
    }

    /// Number of memoised values
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn keys(map: &BTreeMap<String, ValueSpec>) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    mod normalize_tests {
        use super::*;

        #[test]
        fn test_named_values_are_sorted() {
            let values = AxisValues::named([("Cherry", 3), ("Banana", 2), ("Apple", 1)]);
            let map = normalize("test", values, None).unwrap();
            assert_eq!(keys(&map), ["Apple", "Banana", "Cherry"]);
            assert_eq!(map["Apple"], ValueSpec::Exact(AxisValue::Int(1)));
        }

        #[test]
        fn test_list_values_are_sorted_and_deduplicated() {
            let values = AxisValues::list(["Cherry", "Banana", "Apple", "Banana"]);
            let map = normalize("test", values, None).unwrap();
            assert_eq!(keys(&map), ["Apple", "Banana", "Cherry"]);
            assert_eq!(map["Cherry"], ValueSpec::Exact("Cherry".into()));
        }

        #[test]
        fn test_default_other() {
            let values = AxisValues::named([("Cherry", 3), ("Banana", 2), ("Apple", 1)]);
            let map = normalize("test", values, Some(DEFAULT_OTHER_NAME)).unwrap();
            assert_eq!(keys(&map), ["Apple", "Banana", "Cherry", "Other"]);
            assert_eq!(map["Other"], ValueSpec::Other);
        }

        #[test]
        fn test_named_other_sorts_with_values() {
            let values = AxisValues::named([("Cherry", 3), ("Banana", 2), ("Apple", 1)]);
            let map = normalize("test", values, Some("Alternate Fruit")).unwrap();
            assert_eq!(keys(&map), ["Alternate Fruit", "Apple", "Banana", "Cherry"]);
        }

        #[test]
        fn test_named_other_clash() {
            let values = AxisValues::named([("Cherry", 3), ("Banana", 2), ("Apple", 1)]);
            let err = normalize("test", values, Some("Apple")).unwrap_err();
            assert!(matches!(err, BucketError::OtherNameAlreadyInUse { .. }));
        }

        #[test]
        fn test_undersized_range() {
            let values = AxisValues::List(vec![
                1.into(),
                2.into(),
                RawValue::Range(vec![AxisValue::Int(5)]),
            ]);
            let err = normalize("test", values, None).unwrap_err();
            assert!(matches!(err, BucketError::RangeIncorrectLength { len: 1, .. }));
        }

        #[test]
        fn test_oversized_range_in_named_map() {
            let values = AxisValues::Named(vec![
                ("Apple".into(), 1.into()),
                ("Cherry".into(), RawValue::Range(vec![50.into(), 63.into(), 75.into()])),
            ]);
            let err = normalize("test", values, None).unwrap_err();
            assert!(matches!(err, BucketError::RangeIncorrectLength { len: 3, .. }));
        }

        #[test]
        fn test_non_int_range() {
            let values = AxisValues::List(vec![
                1.into(),
                RawValue::Range(vec!["Steve".into(), "Bob".into()]),
            ]);
            let err = normalize("test", values, None).unwrap_err();
            assert!(matches!(err, BucketError::RangeNotInt { .. }));
        }

        #[test]
        fn test_ranges_are_sorted_and_named() {
            let values = AxisValues::List(vec![
                "Cherry".into(),
                "Apple".into(),
                RawValue::range(9, 3),
            ]);
            let map = normalize("test", values, None).unwrap();
            assert_eq!(keys(&map), ["3 -> 9", "Apple", "Cherry"]);
            assert_eq!(map["3 -> 9"], ValueSpec::Range { lo: 3, hi: 9 });
        }

        #[test]
        fn test_named_map_range_is_sorted() {
            let values = AxisValues::named([("backwards", RawValue::range(10, 0))]);
            let map = normalize("test", values, None).unwrap();
            assert_eq!(map["backwards"], ValueSpec::Range { lo: 0, hi: 10 });
        }

        #[test]
        fn test_non_string_keys_rejected() {
            let values = AxisValues::named([(3, 3), (2, 2), (1, 1)]);
            let err = normalize("test", values, None).unwrap_err();
            assert!(matches!(err, BucketError::IncorrectNameFormat { .. }));
        }

        #[test]
        fn test_scalar_values_rejected() {
            let err = normalize("test", AxisValues::Scalar(1.into()), None).unwrap_err();
            assert!(matches!(err, BucketError::IncorrectValueFormat { .. }));
        }
    }

    mod named_value_tests {
        use super::*;

        #[test]
        fn test_bools_are_integers() {
            let axis = Axis::new("flag", vec![true, false], "").unwrap();
            assert_eq!(axis.value_names().collect::<Vec<_>>(), ["0", "1"]);
            assert_eq!(axis.get_named_value(true).unwrap(), "1");
            assert_eq!(axis.get_named_value(0).unwrap(), "0");

            let enabled = Axis::new("en", crate::axis_utils::enabled(), "").unwrap();
            assert_eq!(enabled.get_named_value(true).unwrap(), "Enabled");
            assert_eq!(enabled.get_named_value(false).unwrap(), "Disabled");
        }

        #[test]
        fn test_unrecognised_values() {
            let axis = Axis::new("test", vec![1, 2, 4, 5], "test").unwrap();
            for v in [AxisValue::Int(0), 3.into(), "3".into(), 99.into(), "Steve".into()] {
                let err = axis.get_named_value(v).unwrap_err();
                assert!(matches!(err, BucketError::UnrecognisedValue { .. }));
            }
        }

        #[test]
        fn test_unrecognised_values_with_ranges() {
            let axis = Axis::new("test", vec![[1_i64, 3], [5, 7]], "test").unwrap();
            for v in [AxisValue::Int(0), "2".into(), 4.into(), "4".into(), 99.into()] {
                assert!(axis.get_named_value(v).is_err());
            }
        }

        #[test]
        fn test_value_names() {
            let axis = Axis::new(
                "test",
                AxisValues::List(vec![1.into(), 2.into(), 3.into(), RawValue::range(4, 7)]),
                "test",
            )
            .unwrap();
            assert_eq!(axis.get_named_value(1).unwrap(), "1");
            assert_eq!(axis.get_named_value("1").unwrap(), "1");
            assert_eq!(axis.get_named_value(4).unwrap(), "4 -> 7");
            assert_eq!(axis.get_named_value(5).unwrap(), "4 -> 7");
            assert_eq!(axis.get_named_value("4 -> 7").unwrap(), "4 -> 7");
        }

        #[test]
        fn test_value_names_with_other() {
            let axis = Axis::with_other(
                "test",
                AxisValues::List(vec![1.into(), 2.into(), 3.into(), RawValue::range(4, 7)]),
                "test",
                DEFAULT_OTHER_NAME,
            )
            .unwrap();
            assert_eq!(axis.get_named_value(1).unwrap(), "1");
            assert_eq!(axis.get_named_value(8).unwrap(), "Other");
            // strings are never range-checked
            assert_eq!(axis.get_named_value("7").unwrap(), "Other");
            assert_eq!(axis.get_named_value("7 -> 8").unwrap(), "Other");
            assert_eq!(axis.get_named_value("Steve").unwrap(), "Other");
        }

        #[test]
        fn test_named_map() {
            let axis = Axis::new(
                "test",
                AxisValues::named([
                    ("ten", RawValue::from(10)),
                    ("less_than_ten", RawValue::range(0, 9)),
                ]),
                "test",
            )
            .unwrap();
            assert_eq!(axis.get_named_value(10).unwrap(), "ten");
            assert_eq!(axis.get_named_value("ten").unwrap(), "ten");
            assert_eq!(axis.get_named_value(0).unwrap(), "less_than_ten");
            assert_eq!(axis.get_named_value(9).unwrap(), "less_than_ten");
            assert!(axis.get_named_value("10").is_err());
        }

        #[test]
        fn test_named_map_with_named_other() {
            let axis = Axis::with_other(
                "test",
                AxisValues::named([
                    ("ten", RawValue::from(10)),
                    ("less_than_ten", RawValue::range(0, 9)),
                ]),
                "test",
                "Weird",
            )
            .unwrap();
            assert_eq!(axis.get_named_value(4).unwrap(), "less_than_ten");
            assert_eq!(axis.get_named_value("10").unwrap(), "Weird");
            assert_eq!(axis.get_named_value(11).unwrap(), "Weird");
            assert_eq!(axis.other_name(), Some("Weird"));
        }

        #[test]
        fn test_cached_values() {
            let axis = Axis::with_other(
                "test",
                AxisValues::List(vec![1.into(), 2.into(), 3.into(), RawValue::range(4, 5)]),
                "test",
                DEFAULT_OTHER_NAME,
            )
            .unwrap();
            for (count, v) in [1, 4, 5, 6].into_iter().enumerate() {
                let first = axis.get_named_value(v).unwrap();
                let second = axis.get_named_value(v).unwrap();
                assert_eq!(first, second);
                assert_eq!(axis.cache_hits(), count as u64 + 1);
            }
            assert_eq!(axis.cache_len(), 4);
        }

        #[test]
        fn test_errors_are_not_cached() {
            let axis = Axis::new("test", vec![1], "test").unwrap();
            assert!(axis.get_named_value(2).is_err());
            assert!(axis.get_named_value(2).is_err());
            assert_eq!(axis.cache_len(), 0);
            assert_eq!(axis.cache_hits(), 0);
        }
    }

    mod hash_tests {
        use super::*;

        #[test]
        fn test_hash_ignores_declaration_order() {
            let a = Axis::new("x", vec!["b", "a"], "d").unwrap();
            let b = Axis::new("x", vec!["a", "b"], "d").unwrap();
            assert_eq!(a.sha(), b.sha());
        }

        #[test]
        fn test_hash_sees_names() {
            let a = Axis::new("x", vec!["a", "b"], "d").unwrap();
            let b = Axis::new("x", vec!["a", "c"], "d").unwrap();
            let c = Axis::new("y", vec!["a", "b"], "d").unwrap();
            assert_ne!(a.sha(), b.sha());
            assert_ne!(a.sha(), c.sha());
        }

        #[test]
        fn test_positions_follow_sorted_order() {
            let axis = Axis::new("x", vec!["c", "a", "b"], "d").unwrap();
            assert_eq!(axis.position("a"), Some(0));
            assert_eq!(axis.position("c"), Some(2));
            assert_eq!(axis.position("z"), None);
            assert_eq!(axis.size(), 3);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_keys_sorted_and_ranges_ordered(
                scalars in proptest::collection::vec(-50i64..50, 0..10),
                ranges in proptest::collection::vec((-100i64..100, -100i64..100), 0..5),
            ) {
                let mut raw: Vec<RawValue> = scalars.into_iter().map(RawValue::from).collect();
                raw.extend(ranges.into_iter().map(RawValue::from));
                let map = normalize("p", AxisValues::List(raw), None).unwrap();

                let names: Vec<&String> = map.keys().collect();
                let mut sorted = names.clone();
                sorted.sort();
                prop_assert_eq!(names, sorted);

                for spec in map.values() {
                    if let ValueSpec::Range { lo, hi } = spec {
                        prop_assert!(lo <= hi);
                    }
                }
            }

            #[test]
            fn prop_named_value_is_idempotent(v in -20i64..20) {
                let axis = Axis::with_other(
                    "p",
                    AxisValues::List(vec![RawValue::range(-5, 5), 10.into()]),
                    "",
                    DEFAULT_OTHER_NAME,
                )
                .unwrap();
                let first = axis.get_named_value(v).unwrap();
                prop_assert_eq!(axis.get_named_value(v).unwrap(), first);
                prop_assert_eq!(axis.cache_hits(), 1);
            }
        }
    }
}
