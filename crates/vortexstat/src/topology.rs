//! Morse-Smale complexes of scalar fields defined on triangulations.
//!
//! The topological analysis itself is owned by an external toolkit. We only
//! describe its inputs ([`Triangulation`]) and outputs
//! ([`MorseSmaleComplex`]), and talk to it through the
//! [`MorseSmaleBackend`] trait.

use crate::{Error, volume::ElementType};
use nalgebra::Matrix4;
use std::sync::Arc;
use tracing::debug;

/// The scalar field attached to the vertices of a triangulation
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarBuffer {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
}

impl ScalarBuffer {
    pub fn len(&self) -> usize {
        match self {
            ScalarBuffer::F32(v) => v.len(),
            ScalarBuffer::F64(v) => v.len(),
            ScalarBuffer::I32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            ScalarBuffer::F32(_) => ElementType::F32,
            ScalarBuffer::F64(_) => ElementType::F64,
            ScalarBuffer::I32(_) => ElementType::I32,
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
    impl Sealed for i32 {}
}

/// Scalar types that a topology backend has to handle
pub trait TopologyScalar: sealed::Sealed + Copy + PartialOrd + core::fmt::Debug + 'static {
    fn to_f64(self) -> f64;
}

impl TopologyScalar for f32 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl TopologyScalar for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

impl TopologyScalar for i32 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// A triangulated domain with a scalar value per vertex
#[derive(Clone, Debug)]
pub struct Triangulation {
    positions: Vec<[f32; 3]>,
    dimensionality: u8,
    world_matrix: Matrix4<f32>,
    // a global vertex order used to break ties between equal scalar values
    offsets: Vec<i32>,
    scalars: ScalarBuffer,
}

impl Triangulation {
    /// The offsets default to the vertex order.
    pub fn new(
        positions: Vec<[f32; 3]>,
        dimensionality: u8,
        scalars: ScalarBuffer,
    ) -> Result<Self, Error> {
        if !matches!(dimensionality, 2 | 3) {
            return Err(Error::invalid_shape(format!(
                "a triangulation must be 2D or 3D, not {dimensionality}D"
            )));
        }
        if scalars.len() != positions.len() {
            return Err(Error::dimension_mismatch(
                "triangulation scalar field",
                vec![positions.len()],
                vec![scalars.len()],
            ));
        }
        let offsets = (0..positions.len() as i32).collect();
        Ok(Triangulation {
            positions,
            dimensionality,
            world_matrix: Matrix4::identity(),
            offsets,
            scalars,
        })
    }

    pub fn with_offsets(mut self, offsets: Vec<i32>) -> Result<Self, Error> {
        if offsets.len() != self.positions.len() {
            return Err(Error::dimension_mismatch(
                "triangulation offsets",
                vec![self.positions.len()],
                vec![offsets.len()],
            ));
        }
        self.offsets = offsets;
        Ok(self)
    }

    pub fn with_world_matrix(mut self, world_matrix: Matrix4<f32>) -> Self {
        self.world_matrix = world_matrix;
        self
    }

    pub fn n_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn dimensionality(&self) -> u8 {
        self.dimensionality
    }

    pub fn world_matrix(&self) -> &Matrix4<f32> {
        &self.world_matrix
    }

    pub fn offsets(&self) -> &[i32] {
        &self.offsets
    }

    pub fn scalars(&self) -> &ScalarBuffer {
        &self.scalars
    }
}

/// The critical points of a complex
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CriticalPoints {
    /// flat `[x, y, z]` triples
    pub points: Vec<f32>,
    /// 0 for minima, up to the dimensionality for maxima
    pub cell_dimensions: Vec<u8>,
    /// the triangulation vertex of each critical point
    pub pl_vertex_ids: Vec<usize>,
}

impl CriticalPoints {
    pub fn len(&self) -> usize {
        self.cell_dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_dimensions.is_empty()
    }

    pub fn position(&self, i: usize) -> [f32; 3] {
        [
            self.points[3 * i],
            self.points[3 * i + 1],
            self.points[3 * i + 2],
        ]
    }
}

/// The geometry of the separatrices
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeparatrixPoints {
    /// flat `[x, y, z]` triples
    pub points: Vec<f32>,
}

impl SeparatrixPoints {
    pub fn len(&self) -> usize {
        self.points.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn position(&self, i: usize) -> [f32; 3] {
        [
            self.points[3 * i],
            self.points[3 * i + 1],
            self.points[3 * i + 2],
        ]
    }
}

/// The connectivity of the separatrices
///
/// Cells belonging to the same separatrix are stored consecutively.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeparatrixCells {
    /// `[dimension, from, to]`, where `from` and `to` index the separatrix
    /// points
    pub cells: Vec<[usize; 3]>,
    pub separatrix_ids: Vec<i64>,
}

impl SeparatrixCells {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// What a backend computes
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MorseSmaleOutput {
    pub critical_points: CriticalPoints,
    pub separatrix_points: SeparatrixPoints,
    pub separatrix_cells: SeparatrixCells,
}

impl MorseSmaleOutput {
    /// make sure that the parallel arrays agree and every index is in range
    fn validate(&self, n_vertices: usize) -> Result<(), Error> {
        let cp = &self.critical_points;
        if cp.points.len() != 3 * cp.len() || cp.pl_vertex_ids.len() != cp.len() {
            return Err(Error::topology("inconsistent critical point arrays"));
        }
        if let Some(id) = cp.pl_vertex_ids.iter().find(|&&id| id >= n_vertices) {
            return Err(Error::topology(format!(
                "critical point refers to vertex {id}, the triangulation has {n_vertices}"
            )));
        }
        if self.separatrix_points.points.len() % 3 != 0 {
            return Err(Error::topology("separatrix points aren't xyz triples"));
        }
        let cells = &self.separatrix_cells;
        if cells.separatrix_ids.len() != cells.cells.len() {
            return Err(Error::topology("inconsistent separatrix cell arrays"));
        }
        let n_points = self.separatrix_points.len();
        if let Some(cell) = cells
            .cells
            .iter()
            .find(|c| c[1] >= n_points || c[2] >= n_points)
        {
            return Err(Error::topology(format!(
                "separatrix cell {cell:?} refers to a missing point (only {n_points} exist)"
            )));
        }
        Ok(())
    }
}

/// A Morse-Smale complex together with the triangulation it was computed on
#[derive(Clone, Debug)]
pub struct MorseSmaleComplex {
    pub triangulation: Arc<Triangulation>,
    pub critical_points: CriticalPoints,
    pub separatrix_points: SeparatrixPoints,
    pub separatrix_cells: SeparatrixCells,
}

impl MorseSmaleComplex {
    pub fn new(triangulation: Arc<Triangulation>, output: MorseSmaleOutput) -> Result<Self, Error> {
        output.validate(triangulation.n_vertices())?;
        Ok(MorseSmaleComplex {
            triangulation,
            critical_points: output.critical_points,
            separatrix_points: output.separatrix_points,
            separatrix_cells: output.separatrix_cells,
        })
    }
}

/// The external topology toolkit
pub trait MorseSmaleBackend {
    /// compute the complex of `scalars` (one value per vertex of
    /// `triangulation`). `offsets` break ties between equal values.
    fn compute<T: TopologyScalar>(
        &self,
        triangulation: &Triangulation,
        scalars: &[T],
        offsets: &[i32],
    ) -> Result<MorseSmaleOutput, Error>;
}

/// Computes Morse-Smale complexes with a backend and keeps the latest one
pub struct MorseSmaleComplexProcessor<B: MorseSmaleBackend> {
    backend: B,
    output: Option<Arc<MorseSmaleComplex>>,
}

impl<B: MorseSmaleBackend> MorseSmaleComplexProcessor<B> {
    pub fn new(backend: B) -> Self {
        MorseSmaleComplexProcessor {
            backend,
            output: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn output(&self) -> Option<&Arc<MorseSmaleComplex>> {
        self.output.as_ref()
    }

    /// compute the complex of the scalar field attached to `triangulation`
    pub fn process(
        &mut self,
        triangulation: Arc<Triangulation>,
    ) -> Result<Arc<MorseSmaleComplex>, Error> {
        let tri = triangulation.as_ref();
        debug!(
            n_vertices = tri.n_vertices(),
            element_type = ?tri.scalars().element_type(),
            "computing Morse-Smale complex"
        );
        let output = match tri.scalars() {
            ScalarBuffer::F32(v) => self.backend.compute(tri, v, tri.offsets()),
            ScalarBuffer::F64(v) => self.backend.compute(tri, v, tri.offsets()),
            ScalarBuffer::I32(v) => self.backend.compute(tri, v, tri.offsets()),
        }?;
        let complex = Arc::new(MorseSmaleComplex::new(triangulation, output)?);
        self.output = Some(Arc::clone(&complex));
        Ok(complex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangulation_checks() {
        let positions = vec![[0.0; 3]; 3];
        assert!(Triangulation::new(positions.clone(), 4, ScalarBuffer::F32(vec![0.0; 3])).is_err());
        assert!(Triangulation::new(positions.clone(), 2, ScalarBuffer::I32(vec![0; 2])).is_err());
        let tri = Triangulation::new(positions, 2, ScalarBuffer::F64(vec![0.0; 3])).unwrap();
        assert_eq!(tri.offsets(), &[0, 1, 2]);
        assert!(tri.with_offsets(vec![0]).is_err());
    }

    #[test]
    fn output_validation() {
        let mut output = MorseSmaleOutput {
            critical_points: CriticalPoints {
                points: vec![0.0; 3],
                cell_dimensions: vec![0],
                pl_vertex_ids: vec![5],
            },
            ..Default::default()
        };
        assert_eq!(output.validate(3).unwrap_err().kind_name(), "topology");
        output.critical_points.pl_vertex_ids[0] = 2;
        assert!(output.validate(3).is_ok());

        output.separatrix_points.points = vec![0.0; 6];
        output.separatrix_cells = SeparatrixCells {
            cells: vec![[1, 0, 2]],
            separatrix_ids: vec![0],
        };
        assert!(output.validate(3).is_err());
    }
}
