//! # Relaxation time of a velocity profile pair
//!
//! The last recorded profile of each component is taken as steady state.
//! For every step the squared deviation from it is integrated over depth,
//! using the normalized node weight `1/N`:
//! $$
//! e(t) = \sum_n (u_{final,n} - u_{t,n})^2 \cdot 1/N
//! $$
//! The relaxation time is the first step at which `e(t)` falls below the
//! tolerance for both components. Later re-crossings are ignored.
//!
//! ```
//! use flowrelax::{ConvergenceDetector, ProfileSeries, Relaxation};
//! use ndarray::Array2;
//! let u = ProfileSeries::new(Array2::from_elem((10, 41), 0.3));
//! let v = ProfileSeries::new(Array2::from_elem((10, 41), -0.1));
//! let detector = ConvergenceDetector::new(0.01).unwrap();
//! assert_eq!(detector.relaxation_time(&u, &v).unwrap(), Relaxation::Converged(1));
//! ```
use crate::error::{Error, Result};
use crate::profile::ProfileSeries;
use crate::Real;
use ndarray::{Array2, ArrayView1, Zip};
use num_traits::Float;

/// Outcome of the convergence test for one configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relaxation {
    /// First converged step (1-based)
    Converged(usize),
    /// Tolerance never reached within the recorded horizon
    NotConverged,
}

impl Relaxation {
    /// Step, if converged
    pub fn step(self) -> Option<usize> {
        match self {
            Relaxation::Converged(t) => Some(t),
            Relaxation::NotConverged => None,
        }
    }
}

/// Uniform weight of a depth node in the deviation integral.
///
/// Depends on the number of nodes only, not on the physical depth,
/// so the tolerance is dimensionless.
pub fn normalized_node_weight(node_count: usize) -> Real {
    1. / node_count as Real
}

/// Integrated squared deviation of `profile` from `reference`
pub fn deviation_energy<A: Float>(
    reference: &ArrayView1<A>,
    profile: &ArrayView1<A>,
    weight: A,
) -> A {
    Zip::from(reference)
        .and(profile)
        .fold(A::zero(), |acc, &r, &p| acc + (r - p) * (r - p))
        * weight
}

/// First-crossing convergence test
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceDetector {
    tolerance: Real,
}

impl ConvergenceDetector {
    /// Detector with a fixed tolerance
    ///
    /// # Errors
    /// `InvalidTolerance` if tolerance is not finite or not positive
    pub fn new(tolerance: Real) -> Result<Self> {
        if !tolerance.is_finite() || tolerance <= 0. {
            return Err(Error::InvalidTolerance(tolerance));
        }
        Ok(Self { tolerance })
    }

    /// Tolerance on the integrated squared deviation
    pub fn tolerance(&self) -> Real {
        self.tolerance
    }

    /// Relaxation time of the pair (u, v).
    ///
    /// Fewer than two recorded steps always give `NotConverged`.
    ///
    /// # Errors
    /// `MalformedInput` if u and v differ in shape
    pub fn relaxation_time(&self, u: &ProfileSeries, v: &ProfileSeries) -> Result<Relaxation> {
        check_shape(u, v)?;
        let step_count = u.step_count();
        if step_count < 2 {
            return Ok(Relaxation::NotConverged);
        }
        let weight = normalized_node_weight(u.node_count());
        let u_final = u.profile(step_count - 1);
        let v_final = v.profile(step_count - 1);
        for t in 1..=step_count {
            let err_u = deviation_energy(&u_final, &u.profile(t - 1), weight);
            let err_v = deviation_energy(&v_final, &v.profile(t - 1), weight);
            if err_u.abs() < self.tolerance && err_v.abs() < self.tolerance {
                return Ok(Relaxation::Converged(t));
            }
        }
        Ok(Relaxation::NotConverged)
    }

    /// Deviation energies of every step, columns (u, v).
    ///
    /// Row `t - 1` belongs to step `t`.
    pub fn deviation_history(&self, u: &ProfileSeries, v: &ProfileSeries) -> Result<Array2<Real>> {
        check_shape(u, v)?;
        let step_count = u.step_count();
        let mut history = Array2::<Real>::zeros((step_count, 2));
        if step_count == 0 {
            return Ok(history);
        }
        let weight = normalized_node_weight(u.node_count());
        let u_final = u.profile(step_count - 1);
        let v_final = v.profile(step_count - 1);
        for (i, mut row) in history.outer_iter_mut().enumerate() {
            row[0] = deviation_energy(&u_final, &u.profile(i), weight);
            row[1] = deviation_energy(&v_final, &v.profile(i), weight);
        }
        Ok(history)
    }
}

fn check_shape(u: &ProfileSeries, v: &ProfileSeries) -> Result<()> {
    if u.node_count() == 0 {
        return Err(Error::MalformedInput("profiles without nodes".to_string()));
    }
    if u.values().dim() != v.values().dim() {
        return Err(Error::MalformedInput(format!(
            "shape mismatch between components, u {:?} v {:?} (steps, nodes)",
            u.values().dim(),
            v.values().dim()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};

    /// Profiles decaying linearly towards `base`, step t has
    /// deviation `slope * (steps - t)` at every node.
    fn linear_decay(steps: usize, nodes: usize, base: f64, slope: f64) -> ProfileSeries {
        let mut values = Array2::<f64>::zeros((steps, nodes));
        for (i, mut row) in values.outer_iter_mut().enumerate() {
            let t = i + 1;
            row.fill(base + slope * (steps - t) as f64);
        }
        ProfileSeries::new(values)
    }

    #[test]
    fn test_constant_profiles_converge_at_first_step() {
        let u = ProfileSeries::new(Array2::from_elem((10, 41), 1.2));
        let v = ProfileSeries::new(Array2::from_elem((10, 41), -0.4));
        let detector = ConvergenceDetector::new(0.01).unwrap();
        assert_eq!(
            detector.relaxation_time(&u, &v).unwrap(),
            Relaxation::Converged(1)
        );
    }

    #[test]
    fn test_linear_decay_crosses_at_step_6() {
        // e(t) = 0.01 * (10 - t)^2: e(5) = 0.25, e(6) = 0.16
        let u = linear_decay(10, 4, 0.5, 0.1);
        let v = linear_decay(10, 4, -0.2, 0.1);
        let detector = ConvergenceDetector::new(0.2).unwrap();
        assert_eq!(
            detector.relaxation_time(&u, &v).unwrap(),
            Relaxation::Converged(6)
        );
    }

    #[test]
    fn test_both_components_required() {
        let u = ProfileSeries::new(Array2::from_elem((10, 4), 1.0));
        let v = linear_decay(10, 4, 0.0, 0.1);
        let detector = ConvergenceDetector::new(0.2).unwrap();
        assert_eq!(
            detector.relaxation_time(&u, &v).unwrap(),
            Relaxation::Converged(6)
        );
    }

    #[test]
    fn test_first_crossing_wins() {
        // dips below tolerance at step 2, leaves again at step 3
        let u = ProfileSeries::new(array![[1.0, 1.0], [0.01, 0.01], [1.0, 1.0], [0.0, 0.0]]);
        let v = ProfileSeries::new(Array2::zeros((4, 2)));
        let detector = ConvergenceDetector::new(0.01).unwrap();
        assert_eq!(
            detector.relaxation_time(&u, &v).unwrap(),
            Relaxation::Converged(2)
        );
    }

    #[test]
    fn test_short_series_not_converged() {
        let detector = ConvergenceDetector::new(1e3).unwrap();
        for steps in 0..2 {
            let u = ProfileSeries::new(Array2::zeros((steps, 3)));
            let v = ProfileSeries::new(Array2::zeros((steps, 3)));
            assert_eq!(
                detector.relaxation_time(&u, &v).unwrap(),
                Relaxation::NotConverged
            );
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let u = ProfileSeries::new(Array2::zeros((5, 3)));
        let v = ProfileSeries::new(Array2::zeros((5, 4)));
        let detector = ConvergenceDetector::new(0.1).unwrap();
        assert!(matches!(
            detector.relaxation_time(&u, &v),
            Err(Error::MalformedInput(_))
        ));
        let v = ProfileSeries::new(Array2::zeros((6, 3)));
        assert!(matches!(
            detector.relaxation_time(&u, &v),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn test_invalid_tolerance() {
        for tol in &[0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                ConvergenceDetector::new(*tol),
                Err(Error::InvalidTolerance(_))
            ));
        }
    }

    #[test]
    fn test_deviation_energy() {
        let reference = Array1::from_elem(4, 1.0);
        let profile = array![0.0, 1.0, 3.0, 1.0];
        let e = deviation_energy(&reference.view(), &profile.view(), normalized_node_weight(4));
        assert_abs_diff_eq!(e, 1.25, epsilon = 1e-12);
    }

    #[test]
    fn test_deviation_history() {
        let u = linear_decay(10, 4, 0.5, 0.1);
        let v = ProfileSeries::new(Array2::zeros((10, 4)));
        let detector = ConvergenceDetector::new(0.2).unwrap();
        let history = detector.deviation_history(&u, &v).unwrap();
        assert_eq!(history.dim(), (10, 2));
        assert_abs_diff_eq!(history[[0, 0]], 0.81, epsilon = 1e-9);
        assert_abs_diff_eq!(history[[5, 0]], 0.16, epsilon = 1e-9);
        assert_abs_diff_eq!(history[[9, 0]], 0.0);
        assert!(history.column(1).iter().all(|e| *e == 0.));
    }
}
