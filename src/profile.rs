//! # Time series of depth profiles
//!
//! A raw profile dump holds one block of `nodes + 1` samples per recorded
//! time step. The first sample of every block is an auxiliary value (commonly
//! a coordinate), the remaining `nodes` samples are the velocity profile.
//!
//! ```
//! use flowrelax::ProfileSeries;
//! // two steps, two nodes
//! let samples = [0.0, 1.0, 2.0, 0.5, 3.0, 4.0];
//! let series = ProfileSeries::from_samples(&samples, 2).unwrap();
//! assert_eq!(series.step_count(), 2);
//! assert_eq!(series.values()[[1, 0]], 3.0);
//! assert_eq!(series.auxiliary()[1], 0.5);
//! ```
pub mod read;

use crate::error::{Error, Result};
use crate::Real;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

/// Velocity profiles of one component for one configuration
///
/// values: ndarray (steps x nodes)
///
///   Profile body, one row per time step
///
/// auxiliary: ndarray (steps)
///
///   First sample of each block, excluded from the profile
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSeries {
    values: Array2<Real>,
    auxiliary: Array1<Real>,
}

impl ProfileSeries {
    /// Series from an already shaped (steps x nodes) array,
    /// auxiliary values are zero.
    pub fn new(values: Array2<Real>) -> Self {
        let auxiliary = Array1::zeros(values.nrows());
        Self { values, auxiliary }
    }

    /// Reshape a flat sample stream into consecutive blocks of
    /// `node_count + 1` samples.
    ///
    /// # Errors
    /// `MalformedInput` if `node_count` is zero, the stream length is not
    /// a multiple of `node_count + 1`, or a sample is not finite.
    pub fn from_samples(samples: &[Real], node_count: usize) -> Result<Self> {
        if node_count == 0 {
            return Err(Error::MalformedInput(
                "node count must be at least 1".to_string(),
            ));
        }
        let block = node_count + 1;
        if samples.len() % block != 0 {
            return Err(Error::MalformedInput(format!(
                "{} samples can not be split into blocks of {} (node count {} + 1)",
                samples.len(),
                block,
                node_count
            )));
        }
        if let Some(i) = samples.iter().position(|v| !v.is_finite()) {
            return Err(Error::MalformedInput(format!(
                "sample {} ({}) is not finite",
                i, samples[i]
            )));
        }
        let step_count = samples.len() / block;
        let blocks = ArrayView2::from_shape((step_count, block), samples)
            .map_err(|e| Error::MalformedInput(e.to_string()))?;
        Ok(Self {
            values: blocks.slice(s![.., 1..]).to_owned(),
            auxiliary: blocks.column(0).to_owned(),
        })
    }

    /// Number of depth nodes per profile
    pub fn node_count(&self) -> usize {
        self.values.ncols()
    }

    /// Number of recorded time steps
    pub fn step_count(&self) -> usize {
        self.values.nrows()
    }

    /// Profile body (steps x nodes)
    pub fn values(&self) -> &Array2<Real> {
        &self.values
    }

    /// Auxiliary sample of each step
    pub fn auxiliary(&self) -> &Array1<Real> {
        &self.auxiliary
    }

    /// Profile at zero-based step index
    ///
    /// # Panics
    /// If `index >= step_count()`
    pub fn profile(&self, index: usize) -> ArrayView1<Real> {
        self.values.row(index)
    }

    /// Last recorded profile, the steady state reference
    pub fn final_profile(&self) -> Option<ArrayView1<Real>> {
        match self.step_count() {
            0 => None,
            n => Some(self.values.row(n - 1)),
        }
    }

    /// Distance between neighbouring nodes for a column of
    /// `physical_depth`, end points included.
    ///
    /// This is the plotting axis spacing. It is unrelated to the
    /// weight used in the convergence integral, see
    /// [`crate::convergence::normalized_node_weight`].
    pub fn physical_spacing(&self, physical_depth: Real) -> Real {
        match self.node_count() {
            0 | 1 => 0.,
            n => physical_depth / (n - 1) as Real,
        }
    }

    /// Node coordinates from 0 to `physical_depth`
    pub fn depth_coordinates(&self, physical_depth: Real) -> Array1<Real> {
        Array1::linspace(0., physical_depth, self.node_count())
    }
}
