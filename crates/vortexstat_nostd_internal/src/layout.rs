/// Check if a 3D volume shape (for a VolumeLayout) is valid
fn check_dims(dims_xyz: &[usize; 3]) -> Result<(), &'static str> {
    if dims_xyz.contains(&0) {
        Err("dims_xyz must not hold 0")
    } else {
        Ok(())
    }
}

/// VolumeLayout describes the extents of a 3D volume.
///
/// Dimensions are described in `[x, y, z]` order, which is the order that
/// users think about a volume, while the memory is ordered `[z, y, x]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeLayout {
    dims_xyz: [usize; 3],
}

impl VolumeLayout {
    pub fn from_dims(dims_xyz: [usize; 3]) -> Result<VolumeLayout, &'static str> {
        check_dims(&dims_xyz)?;
        Ok(Self { dims_xyz })
    }

    pub fn dims(&self) -> &[usize; 3] {
        &self.dims_xyz
    }

    /// returns whether the spatial `(x, y)` extents match `other`
    pub fn same_footprint(&self, other: &VolumeLayout) -> bool {
        self.dims_xyz[0] == other.dims_xyz[0] && self.dims_xyz[1] == other.dims_xyz[1]
    }
}

/// Rows of the per-group-per-time table are ordered time-major. This maps
/// a `(time, group)` pair to a row index.
#[inline(always)]
pub fn group_time_row(n_groups: usize, time: usize, group: usize) -> usize {
    n_groups * time + group
}
