//! The vortex group hierarchy.
//!
//! A group is one vortex feature followed over time. Each group owns a list
//! of [`Vortex`] records (one per time step and height slice that the
//! feature was detected in). A group may name a parent group, which turns
//! the set of groups into a forest: parents always have a smaller index
//! than their children.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Sense of rotation of a vortex
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Turning {
    Clockwise,
    CounterClockwise,
}

impl Turning {
    /// the code used by the categorical "Rotation" column
    pub fn category(self) -> u32 {
        match self {
            Turning::Clockwise => 0,
            Turning::CounterClockwise => 1,
        }
    }
}

/// A single detection of a vortex at a given time and height slice
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vortex {
    pub time_step: usize,
    /// the z-layer the record was detected in
    pub height_slice: usize,
    pub center: [f64; 2],
    pub min_radius: f64,
    pub max_radius: f64,
    pub avg_radius: f64,
    pub rotation: Turning,
    /// index of the group this vortex was merged into (if any)
    pub parent_group: Option<usize>,
}

impl Vortex {
    pub fn new(time_step: usize, height_slice: usize, center: [f64; 2]) -> Self {
        Vortex {
            time_step,
            height_slice,
            center,
            min_radius: 0.0,
            max_radius: 0.0,
            avg_radius: 0.0,
            rotation: Turning::Clockwise,
            parent_group: None,
        }
    }

    pub fn with_radii(mut self, min_radius: f64, max_radius: f64, avg_radius: f64) -> Self {
        self.min_radius = min_radius;
        self.max_radius = max_radius;
        self.avg_radius = avg_radius;
        self
    }

    pub fn with_rotation(mut self, rotation: Turning) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_parent(mut self, parent_group: usize) -> Self {
        self.parent_group = Some(parent_group);
        self
    }
}

/// A flat list of vortices, partitioned into groups
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VortexSet {
    vortices: Vec<Vortex>,
    // group g owns vortices[group_starts[g]..group_starts[g + 1]]
    group_starts: Vec<usize>,
}

impl VortexSet {
    pub fn new() -> Self {
        VortexSet {
            vortices: Vec::new(),
            group_starts: vec![0],
        }
    }

    /// append a new group and return its index
    pub fn push_group(&mut self, vortices: impl IntoIterator<Item = Vortex>) -> usize {
        if self.group_starts.is_empty() {
            self.group_starts.push(0);
        }
        self.vortices.extend(vortices);
        self.group_starts.push(self.vortices.len());
        self.group_starts.len() - 2
    }

    pub fn num_groups(&self) -> usize {
        self.group_starts.len().saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.vortices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vortices.is_empty()
    }

    /// the range of (global) vortex indices owned by `group`
    pub fn group_range(&self, group: usize) -> Result<Range<usize>, Error> {
        if group >= self.num_groups() {
            return Err(Error::group_index(group, self.num_groups()));
        }
        Ok(self.group_starts[group]..self.group_starts[group + 1])
    }

    /// the vortices owned by `group` (empty for unknown groups)
    pub fn group(&self, group: usize) -> &[Vortex] {
        match self.group_range(group) {
            Ok(range) => &self.vortices[range],
            Err(_) => &[],
        }
    }

    /// find the record of `group` at `time_step` lying in `height_slice`
    pub fn find(&self, group: usize, time_step: usize, height_slice: usize) -> Option<&Vortex> {
        self.group(group)
            .iter()
            .find(|v| v.time_step == time_step && v.height_slice == height_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vortex> {
        self.vortices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups() {
        let mut set = VortexSet::new();
        assert_eq!(set.num_groups(), 0);
        let g0 = set.push_group([Vortex::new(0, 0, [1.0, 1.0]), Vortex::new(1, 0, [2.0, 1.0])]);
        let g1 = set.push_group([Vortex::new(0, 3, [5.0, 5.0]).with_parent(0)]);
        let g2 = set.push_group(Vec::<Vortex>::new());
        assert_eq!((g0, g1, g2), (0, 1, 2));
        assert_eq!(set.num_groups(), 3);
        assert_eq!(set.len(), 3);
        assert_eq!(set.group(0).len(), 2);
        assert!(set.group(2).is_empty());
        assert_eq!(set.group_range(1).unwrap(), 2..3);
        assert!(set.group_range(3).is_err());
        assert_eq!(set.group(1)[0].parent_group, Some(0));

        assert_eq!(set.find(0, 1, 0).unwrap().center, [2.0, 1.0]);
        assert!(set.find(1, 0, 0).is_none());
    }

    #[test]
    fn default_is_usable() {
        let mut set = VortexSet::default();
        assert_eq!(set.num_groups(), 0);
        assert_eq!(set.push_group([Vortex::new(0, 0, [0.0, 0.0])]), 0);
        assert_eq!(set.num_groups(), 1);
    }
}
