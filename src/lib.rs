#![warn(missing_docs)]
//! # flowrelax: relaxation times of simulated velocity profiles
//!
//! Simulations of a flow over depth are run for a grid of configurations
//! (flow speed x water depth x approach direction). Each run writes the two
//! horizontal velocity components as a time series of depth profiles.
//! This library determines for every configuration the *relaxation time*,
//! the first step at which both profiles have settled to their final state
//! within a tolerance, and collects them in a tensor indexed by
//! \[speed, depth, direction\].
//!
//! - [`ProfileSeries`]: reshape a raw profile dump into (steps x nodes)
//! - [`ConvergenceDetector`]: relaxation time of one (U, V) pair
//! - [`GridRunner`]: evaluate every configuration into a [`ResultTensor`]
//!
//! # Example
//! ```ignore
//! use flowrelax::RunConfig;
//!
//! let config = RunConfig::from_file("run.toml")?;
//! let tensor = config.runner()?.run(&config.source());
//! flowrelax::output::write_tensor_csv("relaxation.csv", &tensor)?;
//! ```
pub mod config;
pub mod convergence;
pub mod error;
pub mod grid;
pub mod output;
pub mod profile;
pub use config::RunConfig;
pub use convergence::{ConvergenceDetector, Relaxation};
pub use error::{Error, Result};
pub use grid::source::{Component, DirectorySource, FileNaming, MemorySource, ProfileSource, Source};
pub use grid::{Axes, CellOutcome, ConfigurationKey, GridRunner, NodeCount, ResultTensor};
pub use profile::ProfileSeries;

/// Real type
pub type Real = f64;
