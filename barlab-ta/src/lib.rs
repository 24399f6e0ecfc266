#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! Bar-indexed series runtime and technical analysis toolkit for Barlab.
//!
//! The [`series::Series`] container models the rolling, transactional history
//! every indicator is computed against: each bar stages a current value,
//! index `0` reads the staged value (or the most recent committed one), and
//! `commit`/`rollback` finalize or discard the bar. All arithmetic is
//! fixed-precision [`rust_decimal::Decimal`] so results are deterministic
//! across runs and platforms.
//!
//! The [`ta`] module provides the indicator library (moving averages,
//! oscillators, trend and range measures, crossings, statistics, pivots and
//! volume studies) with a uniform warmup policy: before enough bars exist an
//! indicator returns its documented neutral value instead of erroring.

pub mod math;
pub mod series;
pub mod ta;
