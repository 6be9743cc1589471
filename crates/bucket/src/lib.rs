//! Bucket: functional coverage for verification testbenches
//!
//! A coverage model is a tree of [`Covergroup`]s whose leaves are
//! [`Coverpoint`]s. Each coverpoint crosses a set of [`Axis`] values into a
//! flat bucket space and assigns every bucket a [`Goal`]. Sampling a trace
//! counts hits per bucket; reading the tree flattens it into a [`Reading`]
//! that can be stored, merged with other runs and summarised.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    BUCKET Architecture                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ CoverTop   │    │ Chain      │    │ Reading    │            │
//! │   │ groups +   │───►│ def / run  │───►│ tuples +   │            │
//! │   │ points     │    │ passes     │    │ def_sha    │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         ▲                                    │                   │
//! │      sample(trace)              Merge / Archive / Summary        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use bucket::{
//!     Bucket, BucketResult, CoverConfig, CoverageContext, Coverpoint, PointDefinition,
//!     PointReader, PointSetup, Reading,
//! };
//!
//! struct Parity;
//!
//! impl PointDefinition<u32> for Parity {
//!     fn setup(&mut self, setup: &mut PointSetup, _: &CoverageContext) -> BucketResult<()> {
//!         setup.add_axis("parity", bucket::AxisValues::named([("even", 0), ("odd", 1)]), "")
//!     }
//!
//!     fn sample(&mut self, bucket: &mut Bucket<'_>, trace: &u32) -> BucketResult<()> {
//!         bucket.hit_with([("parity", trace % 2)])
//!     }
//! }
//!
//! let mut point = Coverpoint::new("parity", "odd and even", Parity, &CoverageContext::new())?;
//! for n in 0..4 {
//!     point.sample(&n, &CoverConfig::default())?;
//! }
//! assert_eq!(point.hits(&["even"]), Some(2));
//!
//! let reading = PointReader::new("local").read(&point);
//! assert_eq!(reading.def_sha()?.len(), 64);
//! # Ok::<(), bucket::BucketError>(())
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod axis;
pub mod axis_utils;
mod bucket;
mod chain;
mod config;
mod context;
mod covergroup;
mod covertop;
mod coverpoint;
pub mod filter;
mod goal;
mod hash;
mod node;
pub mod reading;
mod result;

pub use axis::{Axis, AxisValue, AxisValues, RawValue, ValueSpec, DEFAULT_OTHER_NAME};
pub use bucket::Bucket;
pub use chain::{
    Chain, ChainIndex, Counters, DefCounters, ItemRef, Link, OpenLink, RunCounters,
};
pub use config::{CoverConfig, CoverConfigBuilder};
pub use context::{ContextStack, CoverageContext};
pub use covergroup::{Children, Covergroup, GroupDefinition};
pub use covertop::CoverTop;
pub use coverpoint::{
    BucketSpace, BucketView, Coverpoint, HitStats, PointDefinition, PointSetup, PointStats,
};
pub use goal::{Goal, GoalKind, GoalSet, DEFAULT_GOAL_NAME, DEFAULT_GOAL_TARGET};
pub use hash::{Digest, StructuralHash};
pub use node::{NodeMeta, NodeMut, NodeRef};
pub use reading::{
    summarize, AxisTuple, AxisValueTuple, BucketGoalTuple, BucketHitTuple, GoalTuple,
    JsonArchive, MemoryArchive, MergeReading, PointHitTuple, PointReader, PointSummary,
    PointTuple, PuppetReading, Reader, Reading, RecordRef, Span, Writer,
};
pub use result::{BucketError, BucketResult};
