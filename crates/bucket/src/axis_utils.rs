//! Ready-made axis value sets.
//!
//! Each helper returns [`AxisValues`] that can be handed straight to
//! [`Axis::new`](crate::Axis::new) or [`PointSetup::add_axis`](crate::PointSetup::add_axis).

use crate::axis::{AxisValues, RawValue};
use crate::result::{BucketError, BucketResult};

/// Display options for [`one_hot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneHotOptions {
    /// Force binary bucket names
    pub display_bin: bool,
    /// Force hexadecimal bucket names
    pub display_hex: bool,
    /// Pad bucket names with leading zeroes
    pub pad_zero: bool,
    /// Add a bucket for zero
    pub include_zero: bool,
}

impl Default for OneHotOptions {
    fn default() -> Self {
        Self {
            display_bin: false,
            display_hex: false,
            pad_zero: true,
            include_zero: false,
        }
    }
}

/// Display options for [`msb`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsbOptions {
    /// Force binary bucket names
    pub display_bin: bool,
    /// Force hexadecimal bucket names
    pub display_hex: bool,
    /// Pad bucket names with leading zeroes
    pub pad_zero: bool,
    /// Give the all-ones value its own bucket
    pub include_max: bool,
}

impl Default for MsbOptions {
    fn default() -> Self {
        Self {
            display_bin: false,
            display_hex: false,
            pad_zero: true,
            include_max: false,
        }
    }
}

/// Options for [`ranges`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangesOptions {
    /// Lowest value covered
    pub min_val: i64,
    /// Give the lowest value its own bucket
    pub separate_min: bool,
    /// Give the highest value its own bucket
    pub separate_max: bool,
}

#[derive(Debug, Clone, Copy)]
enum Radix {
    Bin,
    Hex,
}

impl Radix {
    fn pick(width: u32, display_bin: bool, display_hex: bool) -> Self {
        match (display_bin, display_hex) {
            (true, _) => Self::Bin,
            (_, true) => Self::Hex,
            _ if width <= 8 => Self::Bin,
            _ => Self::Hex,
        }
    }

    fn name(self, value: i64, width: u32, pad_zero: bool) -> String {
        let (prefix, digits) = match self {
            Self::Bin => {
                let pad = if pad_zero { width as usize } else { 0 };
                ("0b", format!("{value:0pad$b}"))
            }
            Self::Hex => {
                let pad = if pad_zero { width.div_ceil(4) as usize } else { 0 };
                ("0x", format!("{value:0pad$x}"))
            }
        };
        format!("{prefix}{}", group_digits(&digits))
    }
}

/// Insert `_` between groups of four digits, counting from the right
fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 4);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 4 == 0 {
            out.push('_');
        }
        out.push(c);
    }
    out
}

/// One bucket per bit position, optionally with zero
pub fn one_hot(width: u32, options: OneHotOptions) -> BucketResult<AxisValues> {
    if !(1..=63).contains(&width) {
        return Err(BucketError::OneHotIncorrectWidth(width));
    }
    if options.display_bin && options.display_hex {
        return Err(BucketError::OneHotIncompatibleOptions);
    }
    let radix = Radix::pick(width, options.display_bin, options.display_hex);

    let zero = options.include_zero.then_some(0_i64);
    let values = zero.into_iter().chain((0..width).map(|i| 1_i64 << i));

    Ok(AxisValues::named(values.map(|v| {
        (radix.name(v, width, options.pad_zero), RawValue::from(v))
    })))
}

/// One bucket per most-significant-bit position, each covering the full range
/// of values with that MSB
pub fn msb(width: u32, options: MsbOptions) -> BucketResult<AxisValues> {
    if !(2..=62).contains(&width) {
        return Err(BucketError::MsbIncorrectWidth(width));
    }
    if options.display_bin && options.display_hex {
        return Err(BucketError::MsbIncompatibleOptions);
    }
    let radix = Radix::pick(width, options.display_bin, options.display_hex);
    let max = (1_i64 << width) - 1;
    let top = 1_i64 << (width - 1);

    let mut entries = vec![(radix.name(0, width, options.pad_zero), RawValue::range(0, 0))];
    for i in 0..width {
        let lo = 1_i64 << i;
        let hi = if options.include_max && lo == top {
            max - 1
        } else {
            (lo << 1) - 1
        };
        entries.push((radix.name(lo, width, options.pad_zero), RawValue::range(lo, hi)));
    }
    if options.include_max {
        entries.push((radix.name(max, width, options.pad_zero), RawValue::range(max, max)));
    }

    Ok(AxisValues::named(entries))
}

/// Split `min_val..=max_val` into `num_ranges` contiguous buckets
///
/// When the span does not divide evenly the first `span % num_ranges` buckets
/// are one value wider.
pub fn ranges(max_val: i64, num_ranges: u32, options: RangesOptions) -> BucketResult<AxisValues> {
    let min_val = options.min_val;
    if min_val > max_val {
        return Err(BucketError::RangesMinHigherThanMax {
            min: min_val,
            max: max_val,
        });
    }
    let too_many = || BucketError::RangesTooManyRanges {
        min: min_val,
        max: max_val,
        num_ranges,
    };
    let num = i64::from(num_ranges);
    // A span wider than i64 can hold any number of ranges
    if num == 0 || max_val.checked_sub(min_val).is_some_and(|span| num > span) {
        return Err(too_many());
    }

    let mut entries = Vec::new();
    let mut lo = min_val;
    let mut hi = max_val;
    if options.separate_min {
        entries.push((min_val.to_string(), RawValue::from(min_val)));
        lo += 1;
    }
    if options.separate_max {
        hi -= 1;
    }

    // Widths are computed in i128 so that spans near the i64 limits work
    let count = i128::from(hi) - i128::from(lo) + 1;
    let num = i128::from(num);
    if count < num {
        return Err(too_many());
    }
    let base = count / num;
    let extra = count % num;
    let mut start = i128::from(lo);
    for i in 0..num {
        let end = start + base + i128::from(i < extra) - 1;
        let (first, last) = (start as i64, end as i64);
        entries.push((format!("{first} -> {last}"), RawValue::range(first, last)));
        start = end + 1;
    }

    if options.separate_max {
        entries.push((max_val.to_string(), RawValue::from(max_val)));
    }

    Ok(AxisValues::named(entries))
}

/// `Enabled` / `Disabled` as `1` / `0`
#[must_use]
pub fn enabled() -> AxisValues {
    AxisValues::named([("Enabled", 1), ("Disabled", 0)])
}

/// `Disabled` / `Enabled` as `1` / `0`
#[must_use]
pub fn disabled() -> AxisValues {
    AxisValues::named([("Disabled", 1), ("Enabled", 0)])
}

/// `WRITE` / `READ` as `1` / `0`
#[must_use]
pub fn read_write() -> AxisValues {
    AxisValues::named([("WRITE", 1), ("READ", 0)])
}

/// `Negative` / `Positive` as `1` / `0`
#[must_use]
pub fn polarity() -> AxisValues {
    AxisValues::named([("Negative", 1), ("Positive", 0)])
}
