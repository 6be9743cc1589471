//! Result and error types for Bucket.

use thiserror::Error;

/// Result type for Bucket operations
pub type BucketResult<T> = Result<T, BucketError>;

/// Errors that can occur while building, sampling, reading or merging coverage
#[derive(Debug, Error)]
pub enum BucketError {
    // ------------------------------------------------------------------
    // Axis definition
    // ------------------------------------------------------------------
    /// A range bound was not an integer
    #[error("Range values for axis '{axis}' must be integers, got {value}")]
    RangeNotInt {
        /// Axis name
        axis: String,
        /// Offending bound
        value: String,
    },

    /// A range did not have exactly two bounds
    #[error("Range for axis '{axis}' must have 2 values (min, max), got {len}")]
    RangeIncorrectLength {
        /// Axis name
        axis: String,
        /// Number of values supplied
        len: usize,
    },

    /// A named axis value was keyed by something other than a string
    #[error("Values provided for axis '{axis}' are incorrectly formatted: key {key} is not a string")]
    IncorrectNameFormat {
        /// Axis name
        axis: String,
        /// Offending key
        key: String,
    },

    /// The "other" bucket name collides with a declared value name
    #[error("Other name '{name}' is already in use by a value of axis '{axis}'")]
    OtherNameAlreadyInUse {
        /// Axis name
        axis: String,
        /// Clashing name
        name: String,
    },

    /// Axis values were supplied in an unsupported shape
    #[error("Unexpected format for values of axis '{axis}': got {found}, expected a named map or a list")]
    IncorrectValueFormat {
        /// Axis name
        axis: String,
        /// Description of what was supplied
        found: String,
    },

    /// An axis name was declared twice on one coverpoint
    #[error("Axis '{axis}' already defined for coverpoint '{point}'")]
    DuplicateAxis {
        /// Coverpoint name
        point: String,
        /// Axis name
        axis: String,
    },

    // ------------------------------------------------------------------
    // Goals and hierarchy
    // ------------------------------------------------------------------
    /// A goal name was declared twice on one coverpoint
    #[error("Goal '{goal}' already defined for coverpoint '{point}'")]
    DuplicateGoal {
        /// Coverpoint name
        point: String,
        /// Goal name (upper case)
        goal: String,
    },

    /// Two siblings share a name
    #[error("Child names must be unique within a covergroup: '{name}' already exists in '{parent}'")]
    DuplicateChild {
        /// Parent covergroup name
        parent: String,
        /// Clashing child name
        name: String,
    },

    // ------------------------------------------------------------------
    // Sampling
    // ------------------------------------------------------------------
    /// A sampled value does not resolve to any bucket on the axis
    #[error("Unrecognised value for axis '{axis}': {value}")]
    UnrecognisedValue {
        /// Axis name
        axis: String,
        /// Sampled value
        value: String,
    },

    /// A bucket was hit before every axis had a value
    #[error("Axis '{axis}' of coverpoint '{point}' has not been set")]
    AxisNotSet {
        /// Coverpoint name
        point: String,
        /// Axis name
        axis: String,
    },

    /// A value was set for an axis the coverpoint does not declare
    #[error("Coverpoint '{point}' has no axis named '{axis}'")]
    UnknownAxis {
        /// Coverpoint name
        point: String,
        /// Axis name
        axis: String,
    },

    /// A bucket with an illegal goal was hit while `except_on_illegal` is set
    #[error("Illegal bucket '{point}.{goal}' hit! Bucket values: {bucket}")]
    IllegalBucket {
        /// Coverpoint name
        point: String,
        /// Goal name
        goal: String,
        /// Rendered bucket key
        bucket: String,
    },

    // ------------------------------------------------------------------
    // Readings and merge
    // ------------------------------------------------------------------
    /// Merge inputs describe different coverage models
    #[error("Tried to merge coverage with two different definition hashes! ({expected} != {found})")]
    DefinitionHashMismatch {
        /// Master hash
        expected: String,
        /// Other hash
        found: String,
    },

    /// Merge inputs were recorded in different contexts
    #[error("Tried to merge coverage with two different record hashes! ({expected} != {found})")]
    RecordHashMismatch {
        /// Master hash
        expected: String,
        /// Other hash
        found: String,
    },

    /// A reading has no hash of the requested kind
    #[error("{which} not set")]
    MissingHash {
        /// Which hash (`def_sha` or `rec_sha`)
        which: &'static str,
    },

    /// Two readings with equal definition hashes disagree on bucket count
    #[error("Bucket count mismatch while merging: expected {expected}, found {found}")]
    BucketCountMismatch {
        /// Master bucket count
        expected: usize,
        /// Other bucket count
        found: usize,
    },

    /// Summing hits for one bucket exceeded the counter range
    #[error("Hit count overflow while merging bucket {bucket}")]
    HitCountOverflow {
        /// Bucket offset
        bucket: usize,
    },

    /// No record exists for the given reference
    #[error("No coverage record with reference {0}")]
    UnknownRecord(usize),

    // ------------------------------------------------------------------
    // Axis helpers
    // ------------------------------------------------------------------
    /// One-hot width out of range
    #[error("Width must be between 1 and 63 for one_hot. Received: {0}")]
    OneHotIncorrectWidth(u32),

    /// One-hot display options conflict
    #[error("Either display_bin OR display_hex may be set for one_hot")]
    OneHotIncompatibleOptions,

    /// MSB width out of range
    #[error("Width must be between 2 and 62 for msb. Received: {0}")]
    MsbIncorrectWidth(u32),

    /// MSB display options conflict
    #[error("Either display_bin OR display_hex may be set for msb")]
    MsbIncompatibleOptions,

    /// Range helper bounds inverted
    #[error("Minimum value {min} is higher than maximum value {max}")]
    RangesMinHigherThanMax {
        /// Lower bound
        min: i64,
        /// Upper bound
        max: i64,
    },

    /// Range helper asked for more ranges than values
    #[error("Cannot split {min}..={max} into {num_ranges} ranges")]
    RangesTooManyRanges {
        /// Lower bound
        min: i64,
        /// Upper bound
        max: i64,
        /// Requested number of ranges
        num_ranges: u32,
    },

    // ------------------------------------------------------------------
    // Context
    // ------------------------------------------------------------------
    /// Overlay attempted to replace an existing key without `replace`
    #[error("Context already contains `{key}` and `replace` is false")]
    ContextKeyExists {
        /// Context key
        key: String,
    },

    // ------------------------------------------------------------------
    // Wrapped errors
    // ------------------------------------------------------------------
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}
