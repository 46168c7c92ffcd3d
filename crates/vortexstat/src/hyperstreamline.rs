//! Hyperstreamlines: integral lines of an eigenvector field of a 3D tensor
//! field.
//!
//! Eigenvectors have no orientation, so at every evaluation the sign of the
//! eigenvector is flipped to agree with the current direction of travel.
//!
//! Positions are handled in continuous grid (index) space during the
//! integration and converted to world space when stored.

use crate::{
    Error,
    settings::{EigenvectorField, HyperstreamlineSettings, IntegrationDirection},
    tensor_field::{TensorField, sorted_eigen},
};
use nalgebra::{Matrix3, Vector3};
use tracing::{debug, info};

/// Why the integration of a line stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminationReason {
    OutOfDomain,
    MaxSteps,
    /// the followed eigenvalue dropped below the threshold
    LowEigenvalue,
    /// the line entered an undefined (masked out) region
    Masked,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntegralLine {
    /// world space positions, from the backward end to the forward end
    pub positions: Vec<Vector3<f64>>,
    /// the followed eigenvalue at each position
    pub eigenvalues: Vec<f64>,
    /// `None` if the line wasn't integrated forward
    pub forward_termination: Option<TerminationReason>,
    /// `None` if the line wasn't integrated backward
    pub backward_termination: Option<TerminationReason>,
}

impl IntegralLine {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// the summed length of all segments
    pub fn arc_length(&self) -> f64 {
        self.positions
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntegralLineSet {
    lines: Vec<IntegralLine>,
}

impl IntegralLineSet {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&IntegralLine> {
        self.lines.get(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IntegralLine> {
        self.lines.iter()
    }
}

/// A point on the eigenvector field
struct Sample {
    direction: Vector3<f64>,
    eigenvalue: f64,
}

pub struct HyperstreamlineTracer<'a> {
    field: &'a TensorField<3>,
    settings: HyperstreamlineSettings,
}

impl<'a> HyperstreamlineTracer<'a> {
    pub fn new(
        field: &'a TensorField<3>,
        settings: HyperstreamlineSettings,
    ) -> Result<Self, Error> {
        settings.validate()?;
        Ok(HyperstreamlineTracer { field, settings })
    }

    pub fn settings(&self) -> &HyperstreamlineSettings {
        &self.settings
    }

    /// Trilinear interpolation of the tensors at a continuous grid position.
    ///
    /// Returns `None` outside of the grid.
    pub fn interpolate(&self, position: &Vector3<f64>) -> Option<Matrix3<f64>> {
        let dims = self.field.dimensions();
        let mut lower = [0usize; 3];
        let mut frac = [0.0; 3];
        for axis in 0..3 {
            let p = position[axis];
            let max = (dims[axis] - 1) as f64;
            if !(0.0..=max).contains(&p) {
                return None;
            }
            // the upper corner is clamped so that p == max stays inside
            let cell = (p.floor() as usize).min(dims[axis].saturating_sub(2));
            lower[axis] = cell;
            frac[axis] = if dims[axis] > 1 { p - cell as f64 } else { 0.0 };
        }

        let mut result = Matrix3::zeros();
        for corner in 0..8 {
            let mut weight = 1.0;
            let mut index = [0usize; 3];
            for axis in 0..3 {
                let upper = (corner >> axis) & 1 == 1;
                index[axis] = (lower[axis] + upper as usize).min(dims[axis] - 1);
                weight *= if upper { frac[axis] } else { 1.0 - frac[axis] };
            }
            if weight != 0.0 {
                result += self.field.at(index) * weight;
            }
        }
        Some(result)
    }

    /// whether the grid point nearest to `position` is defined
    fn is_defined(&self, position: &Vector3<f64>) -> bool {
        if !self.field.has_mask() {
            return true;
        }
        let dims = self.field.dimensions();
        let nearest: [usize; 3] =
            core::array::from_fn(|axis| (position[axis].round() as usize).min(dims[axis] - 1));
        self.field.at_masked(self.field.index_of(nearest)).0
    }

    /// the followed eigenvector at `position`, oriented along `reference`
    fn sample(
        &self,
        position: &Vector3<f64>,
        reference: Option<&Vector3<f64>>,
    ) -> Result<Sample, TerminationReason> {
        let tensor = self
            .interpolate(position)
            .ok_or(TerminationReason::OutOfDomain)?;
        if !self.is_defined(position) {
            return Err(TerminationReason::Masked);
        }
        let (values, vectors) = sorted_eigen(&tensor);
        let rank = match self.settings.eigenvector {
            EigenvectorField::Major => 0,
            EigenvectorField::Intermediate => 1,
            EigenvectorField::Minor => 2,
        };
        let eigenvalue = values[rank];
        if eigenvalue.abs() < self.settings.min_eigenvalue {
            return Err(TerminationReason::LowEigenvalue);
        }
        let mut direction = vectors[rank];
        if let Some(reference) = reference {
            if direction.dot(reference) < 0.0 {
                direction = -direction;
            }
        }
        Ok(Sample {
            direction,
            eigenvalue,
        })
    }

    /// a single classic Runge-Kutta step
    fn rk4_step(
        &self,
        position: &Vector3<f64>,
        heading: &Vector3<f64>,
    ) -> Result<(Vector3<f64>, Sample), TerminationReason> {
        let h = self.settings.step_size;
        let k1 = self.sample(position, Some(heading))?.direction;
        let k2 = self.sample(&(position + k1 * (h / 2.0)), Some(&k1))?.direction;
        let k3 = self.sample(&(position + k2 * (h / 2.0)), Some(&k1))?.direction;
        let k4 = self.sample(&(position + k3 * h), Some(&k1))?.direction;
        let next = position + (k1 + (k2 + k3) * 2.0 + k4) * h / 6.0;
        let sample = self.sample(&next, Some(&k1))?;
        Ok((next, sample))
    }

    /// integrate from `seed` along `heading` (excluding the seed itself)
    fn integrate(
        &self,
        seed: &Vector3<f64>,
        heading: Vector3<f64>,
    ) -> (Vec<Vector3<f64>>, Vec<f64>, TerminationReason) {
        let mut positions = Vec::new();
        let mut eigenvalues = Vec::new();
        let mut position = *seed;
        let mut heading = heading;
        for _ in 0..self.settings.max_steps {
            match self.rk4_step(&position, &heading) {
                Ok((next, sample)) => {
                    positions.push(self.field.index_to_world(&next));
                    eigenvalues.push(sample.eigenvalue);
                    position = next;
                    heading = sample.direction;
                }
                Err(reason) => return (positions, eigenvalues, reason),
            }
        }
        (positions, eigenvalues, TerminationReason::MaxSteps)
    }

    /// trace a single line through `seed` (given in grid space)
    pub fn trace_one(&self, seed: &Vector3<f64>) -> IntegralLine {
        let start = match self.sample(seed, None) {
            Ok(sample) => sample,
            Err(reason) => {
                debug!(?seed, ?reason, "seed point can't be integrated");
                return IntegralLine {
                    forward_termination: Some(reason),
                    backward_termination: Some(reason),
                    ..Default::default()
                };
            }
        };

        let (forward, backward) = match self.settings.direction {
            IntegrationDirection::Forward => (true, false),
            IntegrationDirection::Backward => (false, true),
            IntegrationDirection::Both => (true, true),
        };

        let mut line = IntegralLine::default();
        if backward {
            let (mut positions, mut eigenvalues, reason) =
                self.integrate(seed, -start.direction);
            positions.reverse();
            eigenvalues.reverse();
            line.positions = positions;
            line.eigenvalues = eigenvalues;
            line.backward_termination = Some(reason);
        }
        line.positions.push(self.field.index_to_world(seed));
        line.eigenvalues.push(start.eigenvalue);
        if forward {
            let (positions, eigenvalues, reason) = self.integrate(seed, start.direction);
            line.positions.extend(positions);
            line.eigenvalues.extend(eigenvalues);
            line.forward_termination = Some(reason);
        }
        line
    }

    /// trace one line per seed
    pub fn trace(&self, seeds: &[Vector3<f64>]) -> IntegralLineSet {
        let lines: Vec<_> = seeds.iter().map(|seed| self.trace_one(seed)).collect();
        info!(
            n_lines = lines.len(),
            n_points = lines.iter().map(IntegralLine::len).sum::<usize>(),
            "traced hyperstreamlines"
        );
        IntegralLineSet { lines }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_field(dims: [usize; 3], tensor: Matrix3<f64>) -> TensorField<3> {
        TensorField::new(dims, vec![tensor; dims.iter().product()]).unwrap()
    }

    #[test]
    fn interpolation() {
        // tensors vary linearly along x
        let dims = [3, 2, 2];
        let tensors = (0..12)
            .map(|i| Matrix3::identity() * (i % 3) as f64)
            .collect();
        let field = TensorField::new(dims, tensors).unwrap();
        let tracer = HyperstreamlineTracer::new(&field, Default::default()).unwrap();

        let m = tracer.interpolate(&Vector3::new(1.5, 0.3, 0.7)).unwrap();
        assert!((m[(0, 0)] - 1.5).abs() < 1e-12);
        assert!(tracer.interpolate(&Vector3::new(2.0, 1.0, 1.0)).is_some());
        assert!(tracer.interpolate(&Vector3::new(2.1, 0.0, 0.0)).is_none());
        assert!(tracer.interpolate(&Vector3::new(-0.1, 0.0, 0.0)).is_none());
    }

    #[test]
    fn low_eigenvalue_stops_at_seed() {
        let field = constant_field([3, 3, 3], Matrix3::identity() * 0.1);
        let settings = HyperstreamlineSettings {
            min_eigenvalue: 1.0,
            ..Default::default()
        };
        let tracer = HyperstreamlineTracer::new(&field, settings).unwrap();
        let line = tracer.trace_one(&Vector3::new(1.0, 1.0, 1.0));
        assert!(line.is_empty());
        assert_eq!(line.forward_termination, Some(TerminationReason::LowEigenvalue));
    }

    #[test]
    fn masked_region() {
        let tensor = Matrix3::from_diagonal(&Vector3::new(2.0, 1.0, 0.5));
        let mut field = constant_field([5, 1, 1], tensor);
        field.set_mask(vec![1, 1, 1, 0, 0]).unwrap();
        let settings = HyperstreamlineSettings {
            direction: IntegrationDirection::Forward,
            step_size: 0.5,
            ..Default::default()
        };
        let tracer = HyperstreamlineTracer::new(&field, settings).unwrap();
        let line = tracer.trace_one(&Vector3::new(1.0, 0.0, 0.0));
        assert!(!line.is_empty());
        assert!(line.backward_termination.is_none());
        let end = line.forward_termination.unwrap();
        // the major eigenvector is +-x; depending on its sign the line runs
        // into the masked region or out of the domain
        assert!(matches!(
            end,
            TerminationReason::Masked | TerminationReason::OutOfDomain
        ));
    }
}
