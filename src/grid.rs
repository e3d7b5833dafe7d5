//! # Relaxation times over the experiment grid
//!
//! Every (speed, depth, direction) configuration is evaluated independently:
//! fetch U and V streams, reshape them, run the convergence test. Failures of
//! a single cell are recorded in the tensor and never abort the run.
//!
//! ```
//! use flowrelax::{Axes, CellOutcome, Component, ConvergenceDetector};
//! use flowrelax::{GridRunner, MemorySource, NodeCount};
//! let axes = Axes::new(vec![5.], vec![20.], vec![0., 90.]).unwrap();
//! let detector = ConvergenceDetector::new(0.01).unwrap();
//! let runner = GridRunner::new(axes.clone(), detector, NodeCount::Uniform(2)).unwrap();
//!
//! let mut source = MemorySource::new();
//! let key = axes.key(0, 0, 0);
//! source.insert(&key, Component::U, vec![0.; 6]);
//! source.insert(&key, Component::V, vec![0.; 6]);
//!
//! let tensor = runner.run(&source);
//! assert_eq!(tensor.get(0, 0, 0), CellOutcome::Value(1));
//! assert_eq!(tensor.get(0, 0, 1), CellOutcome::Missing);
//! ```
pub mod source;

use crate::convergence::{ConvergenceDetector, Relaxation};
use crate::error::{Error, Result};
use crate::profile::ProfileSeries;
use crate::Real;
use ndarray::{Array3, ArrayView2, Axis, Zip};
use serde::{Deserialize, Serialize};
use source::{Component, ProfileSource};
use tracing::{debug, info, warn};

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigurationKey {
    /// Index on speed axis
    pub speed_index: usize,
    /// Index on depth axis
    pub depth_index: usize,
    /// Index on direction axis
    pub direction_index: usize,
    /// Flow speed
    pub speed: Real,
    /// Water depth
    pub depth: Real,
    /// Approach direction
    pub direction: Real,
}

impl ConfigurationKey {
    /// Tensor index \[speed, depth, direction\]
    pub fn index(&self) -> [usize; 3] {
        [self.speed_index, self.depth_index, self.direction_index]
    }
}

/// Configuration axes
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    speeds: Vec<Real>,
    depths: Vec<Real>,
    directions: Vec<Real>,
}

impl Axes {
    /// Return axes
    ///
    /// # Errors
    /// `InvalidAxes` if an axis is empty or holds a non-finite value
    pub fn new(speeds: Vec<Real>, depths: Vec<Real>, directions: Vec<Real>) -> Result<Self> {
        for (name, axis) in [("speed", &speeds), ("depth", &depths), ("direction", &directions)]
            .iter()
        {
            if axis.is_empty() {
                return Err(Error::InvalidAxes(format!("{} axis is empty", name)));
            }
            if let Some(v) = axis.iter().find(|v| !v.is_finite()) {
                return Err(Error::InvalidAxes(format!(
                    "{} axis holds non-finite value {}",
                    name, v
                )));
            }
        }
        Ok(Self {
            speeds,
            depths,
            directions,
        })
    }

    /// Speed values
    pub fn speeds(&self) -> &[Real] {
        &self.speeds
    }

    /// Depth values
    pub fn depths(&self) -> &[Real] {
        &self.depths
    }

    /// Direction values
    pub fn directions(&self) -> &[Real] {
        &self.directions
    }

    /// (speeds, depths, directions)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.speeds.len(), self.depths.len(), self.directions.len())
    }

    /// Number of configurations
    pub fn len(&self) -> usize {
        self.speeds.len() * self.depths.len() * self.directions.len()
    }

    /// Always false, empty axes are rejected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Key of cell (speed, depth, direction)
    ///
    /// # Panics
    /// If an index is out of range
    pub fn key(&self, speed: usize, depth: usize, direction: usize) -> ConfigurationKey {
        ConfigurationKey {
            speed_index: speed,
            depth_index: depth,
            direction_index: direction,
            speed: self.speeds[speed],
            depth: self.depths[depth],
            direction: self.directions[direction],
        }
    }

    /// All keys; speed outer, direction middle, depth inner
    pub fn keys(&self) -> impl Iterator<Item = ConfigurationKey> + '_ {
        let (ns, nd, nr) = self.shape();
        (0..ns).flat_map(move |s| {
            (0..nr).flat_map(move |r| (0..nd).map(move |d| self.key(s, d, r)))
        })
    }
}

/// Depth nodes per configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeCount {
    /// Same resolution for every run
    Uniform(usize),
    /// One node count per entry of the depth axis
    ByDepth(Vec<usize>),
}

impl NodeCount {
    /// Check consistency with the depth axis
    pub fn validate(&self, axes: &Axes) -> Result<()> {
        match self {
            NodeCount::Uniform(0) => Err(Error::InvalidConfig(
                "node count must be at least 1".to_string(),
            )),
            NodeCount::Uniform(_) => Ok(()),
            NodeCount::ByDepth(v) if v.len() != axes.depths().len() => {
                Err(Error::InvalidConfig(format!(
                    "{} node counts given for {} depths",
                    v.len(),
                    axes.depths().len()
                )))
            }
            NodeCount::ByDepth(v) if v.contains(&0) => Err(Error::InvalidConfig(
                "node count must be at least 1".to_string(),
            )),
            NodeCount::ByDepth(_) => Ok(()),
        }
    }

    /// Node count of a configuration
    ///
    /// # Panics
    /// If `ByDepth` holds fewer entries than `key.depth_index + 1`,
    /// i.e. the key comes from axes this table was not validated against
    pub fn for_key(&self, key: &ConfigurationKey) -> usize {
        match self {
            NodeCount::Uniform(n) => *n,
            NodeCount::ByDepth(v) => v[key.depth_index],
        }
    }
}

/// Result of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOutcome {
    /// Relaxation time (1-based step)
    Value(usize),
    /// Profiles never settled
    NotConverged,
    /// At least one stream absent or unreadable
    Missing,
    /// Streams present but not usable
    Malformed,
}

impl CellOutcome {
    /// Relaxation time, if any
    pub fn value(self) -> Option<usize> {
        match self {
            CellOutcome::Value(t) => Some(t),
            _ => None,
        }
    }

    /// True for `Missing` and `Malformed`
    pub fn is_failure(self) -> bool {
        matches!(self, CellOutcome::Missing | CellOutcome::Malformed)
    }

    /// Short name
    pub fn label(self) -> &'static str {
        match self {
            CellOutcome::Value(_) => "converged",
            CellOutcome::NotConverged => "not_converged",
            CellOutcome::Missing => "missing",
            CellOutcome::Malformed => "malformed",
        }
    }
}

impl From<Relaxation> for CellOutcome {
    fn from(relaxation: Relaxation) -> Self {
        match relaxation {
            Relaxation::Converged(t) => CellOutcome::Value(t),
            Relaxation::NotConverged => CellOutcome::NotConverged,
        }
    }
}

/// Why a cell failed
#[derive(Debug, Clone)]
pub struct CellDiagnostic {
    /// Cell
    pub key: ConfigurationKey,
    /// `Missing` or `Malformed`
    pub outcome: CellOutcome,
    /// Error message
    pub message: String,
}

/// Number of cells per outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    /// Cells with a relaxation time
    pub converged: usize,
    /// Cells that never settled
    pub not_converged: usize,
    /// Cells with absent streams
    pub missing: usize,
    /// Cells with corrupt streams
    pub malformed: usize,
}

/// Relaxation time of every configuration, indexed \[speed, depth, direction\]
#[derive(Debug, Clone)]
pub struct ResultTensor {
    axes: Axes,
    outcomes: Array3<CellOutcome>,
    diagnostics: Vec<CellDiagnostic>,
}

impl ResultTensor {
    fn new(axes: Axes) -> Self {
        // every cell is overwritten by record()
        let outcomes = Array3::from_elem(axes.shape(), CellOutcome::Missing);
        Self {
            axes,
            outcomes,
            diagnostics: Vec::new(),
        }
    }

    fn record(&mut self, key: &ConfigurationKey, result: Result<Relaxation>) {
        let outcome = match result {
            Ok(relaxation) => {
                debug!(
                    "speed {} depth {} direction {}: {:?}",
                    key.speed, key.depth, key.direction, relaxation
                );
                CellOutcome::from(relaxation)
            }
            Err(e) => {
                let outcome = match e {
                    Error::MissingInput { .. } | Error::Io(_) => CellOutcome::Missing,
                    _ => CellOutcome::Malformed,
                };
                warn!(
                    "speed {} depth {} direction {}: {} ({})",
                    key.speed,
                    key.depth,
                    key.direction,
                    outcome.label(),
                    e
                );
                self.diagnostics.push(CellDiagnostic {
                    key: *key,
                    outcome,
                    message: e.to_string(),
                });
                outcome
            }
        };
        self.outcomes[key.index()] = outcome;
    }

    /// Axes the tensor is built on
    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    /// (speeds, depths, directions)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.outcomes.dim()
    }

    /// Outcome of cell (speed, depth, direction)
    ///
    /// # Panics
    /// If an index is out of range
    pub fn get(&self, speed: usize, depth: usize, direction: usize) -> CellOutcome {
        self.outcomes[[speed, depth, direction]]
    }

    /// All outcomes
    pub fn outcomes(&self) -> &Array3<CellOutcome> {
        &self.outcomes
    }

    /// Failed cells, in evaluation order
    pub fn diagnostics(&self) -> &[CellDiagnostic] {
        &self.diagnostics
    }

    /// Cells per outcome
    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for outcome in self.outcomes.iter() {
            match outcome {
                CellOutcome::Value(_) => counts.converged += 1,
                CellOutcome::NotConverged => counts.not_converged += 1,
                CellOutcome::Missing => counts.missing += 1,
                CellOutcome::Malformed => counts.malformed += 1,
            }
        }
        counts
    }

    /// Relaxation times as floats, for contour plots.
    ///
    /// `not_converged` fills cells without convergence,
    /// `unavailable` fills missing and malformed cells.
    pub fn relaxation_times(&self, not_converged: Real, unavailable: Real) -> Array3<Real> {
        self.outcomes.map(|outcome| match outcome {
            CellOutcome::Value(t) => *t as Real,
            CellOutcome::NotConverged => not_converged,
            CellOutcome::Missing | CellOutcome::Malformed => unavailable,
        })
    }

    /// (speed x depth) map of one direction
    ///
    /// # Panics
    /// If `direction` is out of range
    pub fn direction_slice(&self, direction: usize) -> ArrayView2<CellOutcome> {
        self.outcomes.index_axis(Axis(2), direction)
    }
}

/// Evaluate the experiment grid
#[derive(Debug, Clone)]
pub struct GridRunner {
    axes: Axes,
    detector: ConvergenceDetector,
    nodes: NodeCount,
}

impl GridRunner {
    /// Return runner
    ///
    /// # Errors
    /// `InvalidConfig` if the node counts do not fit the depth axis
    pub fn new(axes: Axes, detector: ConvergenceDetector, nodes: NodeCount) -> Result<Self> {
        nodes.validate(&axes)?;
        Ok(Self {
            axes,
            detector,
            nodes,
        })
    }

    /// Configuration axes
    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    /// Convergence test in use
    pub fn detector(&self) -> &ConvergenceDetector {
        &self.detector
    }

    /// Parsed (U, V) profiles of one configuration
    pub fn profiles<S>(
        &self,
        source: &S,
        key: &ConfigurationKey,
    ) -> Result<(ProfileSeries, ProfileSeries)>
    where
        S: ProfileSource + ?Sized,
    {
        let node_count = self.nodes.for_key(key);
        let u = source.fetch(key, Component::U)?;
        let v = source.fetch(key, Component::V)?;
        Ok((
            ProfileSeries::from_samples(&u, node_count)?,
            ProfileSeries::from_samples(&v, node_count)?,
        ))
    }

    /// Relaxation time of one configuration
    pub fn evaluate<S>(&self, source: &S, key: &ConfigurationKey) -> Result<Relaxation>
    where
        S: ProfileSource + ?Sized,
    {
        let (u, v) = self.profiles(source, key)?;
        self.detector.relaxation_time(&u, &v)
    }

    /// Evaluate all cells one after another
    pub fn run<S>(&self, source: &S) -> ResultTensor
    where
        S: ProfileSource + ?Sized,
    {
        info!("evaluating {} configurations", self.axes.len());
        let mut tensor = ResultTensor::new(self.axes.clone());
        for key in self.axes.keys() {
            let result = self.evaluate(source, &key);
            tensor.record(&key, result);
        }
        log_counts(&tensor);
        tensor
    }

    /// Evaluate all cells on the rayon thread pool.
    ///
    /// Gives the same tensor as [`GridRunner::run`], diagnostics
    /// are recorded in the same order.
    pub fn run_parallel<S>(&self, source: &S) -> ResultTensor
    where
        S: ProfileSource + Sync + ?Sized,
    {
        info!("evaluating {} configurations in parallel", self.axes.len());
        let axes = &self.axes;
        let keys = Array3::from_shape_fn(axes.shape(), |(s, d, r)| axes.key(s, d, r));
        let mut results =
            Zip::from(&keys).par_map_collect(|key| Some(self.evaluate(source, key)));
        let mut tensor = ResultTensor::new(self.axes.clone());
        for key in axes.keys() {
            if let Some(result) = results[key.index()].take() {
                tensor.record(&key, result);
            }
        }
        log_counts(&tensor);
        tensor
    }
}

fn log_counts(tensor: &ResultTensor) {
    let c = tensor.counts();
    info!(
        "converged: {}, not converged: {}, missing: {}, malformed: {}",
        c.converged, c.not_converged, c.missing, c.malformed
    );
}
