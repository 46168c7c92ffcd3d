//! N-dimensional fields of symmetric N x N tensors.
//!
//! A [`TensorField`] stores one tensor per grid point on a regular grid. The
//! grid is placed in space by a basis (its columns span the whole domain)
//! and an offset.
//!
//! # Sharing
//!
//! Cloning a field is shallow: the tensors and the lazily computed eigen
//! data are shared. Use [`TensorField::deep_copy`] to get independent
//! storage.
//!
//! # Eigen data
//!
//! Eigenvalues and eigenvectors of every tensor are computed once, on first
//! request, and cached. Eigenvalues are sorted in descending order, so rank 0
//! is the major eigenvalue and rank `N - 1` is the minor one.

use crate::{
    Error,
    table::{Column, DataFrame},
};
use nalgebra::{DMatrix, SMatrix, SVector};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// The closed value range of a quantity
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DataRange {
    pub min: f64,
    pub max: f64,
}

impl Default for DataRange {
    fn default() -> Self {
        DataRange {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl DataRange {
    pub fn include(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

/// The cached eigen decomposition of every tensor of a field
#[derive(Debug)]
pub struct EigenData<const N: usize> {
    /// sorted in descending order
    pub values: Vec<[f64; N]>,
    /// `vectors[i][rank]` belongs to `values[i][rank]`
    pub vectors: Vec<[SVector<f64, N>; N]>,
    /// global range of each eigenvalue rank
    pub value_ranges: [DataRange; N],
    /// global range over all components of each eigenvector rank
    pub vector_ranges: [DataRange; N],
    meta_data: DataFrame,
}

/// the name of the metadata column holding the eigenvalues of `rank`
fn eigenvalue_column_name<const N: usize>(rank: usize) -> String {
    if rank == 0 {
        "Major Eigenvalue".to_owned()
    } else if rank == N - 1 {
        "Minor Eigenvalue".to_owned()
    } else if N == 3 {
        "Intermediate Eigenvalue".to_owned()
    } else {
        format!("Eigenvalue {rank}")
    }
}

/// Decompose a symmetric tensor. Eigenpairs are sorted by descending value.
pub fn sorted_eigen<const N: usize>(
    tensor: &SMatrix<f64, N, N>,
) -> ([f64; N], [SVector<f64, N>; N]) {
    let eigen = DMatrix::from_fn(N, N, |r, c| tensor[(r, c)]).symmetric_eigen();

    let mut order: [usize; N] = core::array::from_fn(|i| i);
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let values = core::array::from_fn(|rank| eigen.eigenvalues[order[rank]]);
    let vectors = core::array::from_fn(|rank| {
        SVector::<f64, N>::from_fn(|r, _| eigen.eigenvectors[(r, order[rank])])
    });
    (values, vectors)
}

impl<const N: usize> EigenData<N> {
    fn compute(tensors: &[SMatrix<f64, N, N>]) -> Self {
        let mut values = Vec::with_capacity(tensors.len());
        let mut vectors = Vec::with_capacity(tensors.len());
        let mut value_ranges = [DataRange::default(); N];
        let mut vector_ranges = [DataRange::default(); N];
        let mut trace = Vec::with_capacity(tensors.len());
        let mut anisotropy = Vec::with_capacity(tensors.len());

        for tensor in tensors {
            let (vals, vecs) = sorted_eigen(tensor);
            for rank in 0..N {
                value_ranges[rank].include(vals[rank]);
                vecs[rank]
                    .iter()
                    .for_each(|&v| vector_ranges[rank].include(v));
            }
            trace.push((0..N).map(|i| tensor[(i, i)]).sum::<f64>());
            let (major, minor) = (vals[0], vals[N - 1]);
            let denom = major.abs() + minor.abs();
            anisotropy.push(if denom > 0.0 {
                (major - minor) / denom
            } else {
                0.0
            });
            values.push(vals);
            vectors.push(vecs);
        }

        let mut meta_data = DataFrame::new(tensors.len());
        let mut add = |name: String, column: Vec<f64>| {
            // every column has one entry per tensor, and names are unique
            let _ = meta_data.add_column(name, Column::Float(column));
        };
        for rank in 0..N {
            add(
                eigenvalue_column_name::<N>(rank),
                values.iter().map(|v: &[f64; N]| v[rank]).collect(),
            );
        }
        add("Trace".to_owned(), trace);
        add("Anisotropy".to_owned(), anisotropy);

        EigenData {
            values,
            vectors,
            value_ranges,
            vector_ranges,
            meta_data,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TensorField<const N: usize> {
    dimensions: [usize; N],
    tensors: Arc<Vec<SMatrix<f64, N, N>>>,
    // the columns span the whole domain
    basis: SMatrix<f64, N, N>,
    offset: SVector<f64, N>,
    mask: Vec<u8>,
    eigen: Arc<OnceLock<EigenData<N>>>,
}

impl<const N: usize> TensorField<N> {
    /// `tensors` are ordered with the first axis varying fastest
    pub fn new(dimensions: [usize; N], tensors: Vec<SMatrix<f64, N, N>>) -> Result<Self, Error> {
        if dimensions.contains(&0) {
            return Err(Error::invalid_shape(format!(
                "tensor field dimensions {dimensions:?} must not hold 0"
            )));
        }
        let size: usize = dimensions.iter().product();
        if tensors.len() != size {
            return Err(Error::dimension_mismatch(
                "tensor field",
                vec![size],
                vec![tensors.len()],
            ));
        }
        Ok(TensorField {
            dimensions,
            tensors: Arc::new(tensors),
            basis: SMatrix::identity(),
            offset: SVector::zeros(),
            mask: Vec::new(),
            eigen: Arc::new(OnceLock::new()),
        })
    }

    /// A copy that shares nothing with `self`
    pub fn deep_copy(&self) -> Self {
        TensorField {
            tensors: Arc::new(self.tensors.as_ref().clone()),
            eigen: Arc::new(OnceLock::new()),
            ..self.clone()
        }
    }

    pub fn with_basis(mut self, basis: SMatrix<f64, N, N>, offset: SVector<f64, N>) -> Self {
        self.basis = basis;
        self.offset = offset;
        self
    }

    /// one entry per tensor; 1 marks a defined tensor
    pub fn set_mask(&mut self, mask: Vec<u8>) -> Result<(), Error> {
        if mask.len() != self.size() {
            return Err(Error::dimension_mismatch(
                "tensor field mask",
                vec![self.size()],
                vec![mask.len()],
            ));
        }
        self.mask = mask;
        Ok(())
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    pub fn has_mask(&self) -> bool {
        self.mask.len() == self.size()
    }

    /// the number of defined tensors according to the mask
    pub fn num_defined_entries(&self) -> usize {
        self.mask.iter().filter(|&&m| m == 1).count()
    }

    pub fn dimensions(&self) -> [usize; N] {
        self.dimensions
    }

    pub fn size(&self) -> usize {
        self.tensors.len()
    }

    pub fn tensors(&self) -> &Arc<Vec<SMatrix<f64, N, N>>> {
        &self.tensors
    }

    pub fn basis(&self) -> &SMatrix<f64, N, N> {
        &self.basis
    }

    pub fn offset(&self) -> &SVector<f64, N> {
        &self.offset
    }

    /// the linear index of a grid position
    pub fn index_of(&self, position: [usize; N]) -> usize {
        let mut index = 0;
        for axis in (0..N).rev() {
            index = index * self.dimensions[axis] + position[axis];
        }
        index
    }

    /// # Panics
    /// when `position` lies outside of the grid
    pub fn at(&self, position: [usize; N]) -> &SMatrix<f64, N, N> {
        self.at_index(self.index_of(position))
    }

    pub fn at_index(&self, index: usize) -> &SMatrix<f64, N, N> {
        &self.tensors[index]
    }

    /// the tensor at `index` along with whether the mask marks it as
    /// defined (always true without a mask)
    pub fn at_masked(&self, index: usize) -> (bool, &SMatrix<f64, N, N>) {
        let defined = !self.has_mask() || self.mask[index] == 1;
        (defined, &self.tensors[index])
    }

    /// the lengths of the basis vectors
    pub fn extents(&self) -> [f64; N] {
        core::array::from_fn(|i| self.basis.column(i).norm())
    }

    /// rescale the basis vectors to the given lengths
    pub fn set_extents(&mut self, extents: [f64; N]) {
        for (i, extent) in extents.iter().enumerate() {
            let direction = self.basis.column(i).normalize();
            self.basis.set_column(i, &(direction * *extent));
        }
    }

    /// the number of cells along each axis (at least 1)
    pub fn bounds(&self) -> [usize; N] {
        self.dimensions.map(|d| d.saturating_sub(1).max(1))
    }

    pub fn spacing(&self) -> [f64; N] {
        let extents = self.extents();
        let bounds = self.bounds();
        core::array::from_fn(|i| extents[i] / bounds[i] as f64)
    }

    /// the homogeneous (N + 1) x (N + 1) model matrix
    pub fn basis_and_offset(&self) -> DMatrix<f64> {
        let mut m = DMatrix::identity(N + 1, N + 1);
        m.view_mut((0, 0), (N, N)).copy_from(&self.basis);
        m.view_mut((0, N), (N, 1)).copy_from(&self.offset);
        m
    }

    /// map a continuous grid position to world space
    pub fn index_to_world(&self, position: &SVector<f64, N>) -> SVector<f64, N> {
        let bounds = self.bounds();
        let normalized = SVector::<f64, N>::from_fn(|i, _| position[i] / bounds[i] as f64);
        self.offset + self.basis * normalized
    }

    /// the eigen decomposition of all tensors (computed on first use)
    pub fn eigen(&self) -> &EigenData<N> {
        self.eigen.get_or_init(|| {
            debug!(n_tensors = self.size(), "computing tensor eigen decomposition");
            EigenData::compute(&self.tensors)
        })
    }

    pub fn is_eigen_computed(&self) -> bool {
        self.eigen.get().is_some()
    }

    pub fn meta_data(&self) -> &DataFrame {
        &self.eigen().meta_data
    }

    pub fn has_meta_data(&self, name: &str) -> bool {
        self.meta_data_column(name).is_some()
    }

    pub fn meta_data_column(&self, name: &str) -> Option<&Column> {
        self.meta_data().column(name)
    }

    /// a short human readable summary
    pub fn data_info(&self) -> String {
        let eigen = self.eigen();
        let mut info = format!(
            "{N}D tensor field\nNumber of tensors: {}\nDimensions: {:?}\n",
            self.size(),
            self.dimensions
        );
        for (rank, range) in eigen.value_ranges.iter().enumerate() {
            let name = eigenvalue_column_name::<N>(rank);
            info.push_str(&format!("{name} range: [{}, {}]\n", range.min, range.max));
        }
        info.push_str(&format!("Extents: {:?}", self.extents()));
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix2, Matrix3, Vector3};

    fn diag3(a: f64, b: f64, c: f64) -> Matrix3<f64> {
        Matrix3::from_diagonal(&Vector3::new(a, b, c))
    }

    #[test]
    fn indexing() {
        let tensors = (0..24).map(|i| diag3(i as f64, 0.0, 0.0)).collect();
        let field = TensorField::new([2, 3, 4], tensors).unwrap();
        assert_eq!(field.index_of([1, 2, 3]), 1 + 2 * 2 + 3 * 6);
        assert_eq!(field.at([1, 2, 3])[(0, 0)], 23.0);
        assert_eq!(field.bounds(), [1, 2, 3]);
        assert!(TensorField::<3>::new([2, 2, 2], vec![diag3(1.0, 1.0, 1.0); 7]).is_err());
    }

    #[test]
    fn eigen_is_sorted_and_cached() {
        let tensors = vec![diag3(1.0, 5.0, 3.0), diag3(-2.0, 0.0, 4.0)];
        let field = TensorField::new([2, 1, 1], tensors).unwrap();
        assert!(!field.is_eigen_computed());

        let eigen = field.eigen();
        assert!(field.is_eigen_computed());
        assert!((eigen.values[0][0] - 5.0).abs() < 1e-12);
        assert!((eigen.values[0][2] - 1.0).abs() < 1e-12);
        assert!((eigen.vectors[0][0][1].abs() - 1.0).abs() < 1e-12);
        assert!((eigen.value_ranges[0].max - 5.0).abs() < 1e-12);
        assert!((eigen.value_ranges[2].min + 2.0).abs() < 1e-12);

        // shallow clones share the cache
        let copy = field.clone();
        assert!(copy.is_eigen_computed());
        assert!(!field.deep_copy().is_eigen_computed());
    }

    #[test]
    fn meta_data_columns() {
        let field = TensorField::new([1, 1], vec![Matrix2::new(3.0, 0.0, 0.0, 1.0)]).unwrap();
        assert!(field.has_meta_data("Major Eigenvalue"));
        assert!(field.has_meta_data("Minor Eigenvalue"));
        assert!(!field.has_meta_data("Intermediate Eigenvalue"));
        let trace = field.meta_data_column("Trace").unwrap().as_float().unwrap();
        assert_eq!(trace, &[4.0]);
        let anisotropy = field.meta_data().float_column("Anisotropy").unwrap();
        assert!((anisotropy[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn geometry() {
        let mut field = TensorField::new([5, 3], vec![Matrix2::identity(); 15]).unwrap();
        field.set_extents([8.0, 2.0]);
        assert_eq!(field.extents(), [8.0, 2.0]);
        assert_eq!(field.spacing(), [2.0, 1.0]);

        let m = field.basis_and_offset();
        assert_eq!(m.shape(), (3, 3));
        assert_eq!(m[(0, 0)], 8.0);
        assert_eq!(m[(2, 2)], 1.0);
    }

    #[test]
    fn masks() {
        let mut field = TensorField::new([3], vec![SMatrix::<f64, 1, 1>::identity(); 3]).unwrap();
        assert!(!field.has_mask());
        assert!(field.at_masked(1).0);
        assert!(field.set_mask(vec![1, 0]).is_err());
        field.set_mask(vec![1, 0, 1]).unwrap();
        assert_eq!(field.num_defined_entries(), 2);
        assert!(!field.at_masked(1).0);
    }
}
