//! Typed voxel volumes.
//!
//! A [`Volume`] owns a 4D array with axes `[z, y, x, component]`. The
//! element type is a compile-time parameter: code that processes volumes is
//! generic over [`VoxelValue`], so the element type is resolved once per
//! volume rather than once per voxel.

use crate::Error;
use ndarray::{Array4, Axis};
use vortexstat_nostd_internal::VolumeLayout;

/// Declares the primitive type stored in a volume
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementType {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    F32,
    F64,
}

mod sealed {
    pub trait Sealed {}
}

/// Primitive types that can be stored in a [`Volume`]
///
/// This trait is sealed; the set of supported element types is fixed.
pub trait VoxelValue: sealed::Sealed + Copy + Default + core::fmt::Debug + 'static {
    const ELEMENT_TYPE: ElementType;

    fn to_f64(self) -> f64;
}

macro_rules! impl_voxel_value {
    ($($t:ty => $tag:ident),*) => {
        $(
            impl sealed::Sealed for $t {}

            impl VoxelValue for $t {
                const ELEMENT_TYPE: ElementType = ElementType::$tag;

                #[inline(always)]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_voxel_value!(
    u8 => U8, u16 => U16, u32 => U32, i8 => I8, i16 => I16, i32 => I32, f32 => F32, f64 => F64
);

#[derive(Clone, Debug)]
pub struct Volume<T: VoxelValue> {
    data: Array4<T>,
    layout: VolumeLayout,
}

impl<T: VoxelValue> Volume<T> {
    /// Wrap an existing array with axes `[z, y, x, component]`
    pub fn from_array(data: Array4<T>) -> Result<Self, Error> {
        let shape = data.shape();
        if shape[3] == 0 {
            return Err(Error::invalid_shape("a volume needs at least 1 component"));
        }
        let layout =
            VolumeLayout::from_dims([shape[2], shape[1], shape[0]]).map_err(Error::internal)?;
        Ok(Self { data, layout })
    }

    /// Build a volume from a flat buffer ordered `[z][y][x][component]`
    pub fn from_vec(
        dims_xyz: [usize; 3],
        components: usize,
        values: Vec<T>,
    ) -> Result<Self, Error> {
        let [nx, ny, nz] = dims_xyz;
        let data = Array4::from_shape_vec((nz, ny, nx, components), values).map_err(|e| {
            Error::invalid_shape(format!(
                "can't build a {dims_xyz:?} volume with {components} components: {e}"
            ))
        })?;
        Self::from_array(data)
    }

    /// A volume where every component of every voxel holds `value`
    pub fn filled(dims_xyz: [usize; 3], components: usize, value: T) -> Result<Self, Error> {
        let [nx, ny, nz] = dims_xyz;
        Self::from_array(Array4::from_elem((nz, ny, nx, components), value))
    }

    /// The extents in `[x, y, z]` order
    pub fn dims(&self) -> [usize; 3] {
        *self.layout.dims()
    }

    pub fn layout(&self) -> &VolumeLayout {
        &self.layout
    }

    pub fn components(&self) -> usize {
        self.data.len_of(Axis(3))
    }

    pub fn element_type(&self) -> ElementType {
        T::ELEMENT_TYPE
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize, c: usize) -> T {
        self.data[[z, y, x, c]]
    }

    #[inline]
    pub fn value(&self, x: usize, y: usize, z: usize, c: usize) -> f64 {
        self.get(x, y, z, c).to_f64()
    }

    /// Copy every component of voxel `(x, y, z)` into `out` (as f64).
    ///
    /// `out` may be longer than the number of components; the remaining
    /// entries are left untouched.
    #[inline]
    pub fn sample_into(&self, x: usize, y: usize, z: usize, out: &mut [f64]) {
        for (c, slot) in out.iter_mut().take(self.components()).enumerate() {
            *slot = self.value(x, y, z, c);
        }
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, c: usize, value: T) {
        self.data[[z, y, x, c]] = value;
    }

    /// The largest value stored in component 0 (`None` for floating point
    /// volumes filled entirely with NaN)
    pub fn max_value(&self) -> Option<f64> {
        self.data
            .index_axis(Axis(3), 0)
            .iter()
            .map(|v| v.to_f64())
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_indexing() {
        // 2 x 3 x 1 volume with 2 components
        let values: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let vol = Volume::from_vec([2, 3, 1], 2, values).unwrap();
        assert_eq!(vol.dims(), [2, 3, 1]);
        assert_eq!(vol.components(), 2);
        assert_eq!(vol.element_type(), ElementType::F32);
        // voxel (1, 2, 0) starts at flat index (2*2 + 1) * 2
        assert_eq!(vol.value(1, 2, 0, 0), 10.0);
        assert_eq!(vol.value(1, 2, 0, 1), 11.0);

        let mut sample = [0.0; 4];
        vol.sample_into(1, 0, 0, &mut sample);
        assert_eq!(sample, [2.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn volume_errors() {
        assert!(Volume::<u8>::from_vec([2, 2, 2], 1, vec![0; 7]).is_err());
        assert!(Volume::<u8>::filled([2, 0, 2], 1, 0).is_err());
        assert!(Volume::<u8>::filled([2, 2, 2], 0, 0).is_err());
    }

    #[test]
    fn max_value() {
        let mut vol = Volume::<i32>::filled([3, 3, 3], 1, 0).unwrap();
        vol.set(1, 2, 0, 0, 7);
        vol.set(0, 0, 2, 0, 3);
        assert_eq!(vol.max_value(), Some(7.0));
    }
}
