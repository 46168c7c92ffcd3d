//! Conversion of Morse-Smale complexes into renderable point/line meshes.
//!
//! The mesh lives entirely on the CPU: uploading it and drawing it is up to
//! the caller. Critical points come first in the vertex buffers, followed by
//! the separatrix points. All separatrices share a single line-strip index
//! buffer, separated by [`RESTART_INDEX`].

use crate::{
    MorseSmaleComplex,
    settings::{Color, MeshSettings},
};
use nalgebra::Matrix4;
use tracing::{debug, info};

/// Marks the end of a line strip in [`Mesh::line_strip_indices`]
pub const RESTART_INDEX: u32 = u32::MAX;

#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<Color>,
    pub radii: Vec<f32>,
    /// one picking id per vertex (only when picking is enabled)
    pub picking_ids: Option<Vec<u32>>,
    /// indices of the critical points, drawn as points
    pub point_indices: Vec<u32>,
    /// separatrices, drawn as line strips
    pub line_strip_indices: Vec<u32>,
    /// the positions are already transformed
    pub model_matrix: Matrix4<f32>,
    pub world_matrix: Matrix4<f32>,
}

impl Mesh {
    pub fn n_vertices(&self) -> usize {
        self.positions.len()
    }

    /// iterate over the line strips (without the restart markers)
    pub fn line_strips(&self) -> impl Iterator<Item = &[u32]> {
        self.line_strip_indices
            .split(|&i| i == RESTART_INDEX)
            .filter(|strip| !strip.is_empty())
    }
}

fn mix(a: Color, b: Color, t: f32) -> Color {
    core::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)
}

/// Build the mesh of `complex`.
///
/// Critical points are colored by the dimension of their cell (with the 2D
/// or 3D palette, depending on the triangulation). Picked critical points
/// are mixed toward the picking color.
pub fn complex_to_mesh(
    complex: &MorseSmaleComplex,
    settings: &MeshSettings,
    picking: &PickingState,
) -> Mesh {
    let cp = &complex.critical_points;
    let n_critical = cp.len();
    let n_separatrix_points = complex.separatrix_points.len();
    let n_vertices = n_critical + n_separatrix_points;

    let mut positions = Vec::with_capacity(n_vertices);
    let mut colors = Vec::with_capacity(n_vertices);

    let is_2d = complex.triangulation.dimensionality() == 2;
    for (i, &dim) in cp.cell_dimensions.iter().enumerate() {
        positions.push(cp.position(i));
        let color = if is_2d {
            settings.colors.color_2d(dim)
        } else {
            settings.colors.color_3d(dim)
        };
        if picking.is_picked(i) {
            colors.push(mix(
                color,
                settings.picking_color,
                settings.picking_intensity,
            ));
        } else {
            colors.push(color);
        }
    }

    let first_separatrix_vertex = n_critical as u32;
    for i in 0..n_separatrix_points {
        positions.push(complex.separatrix_points.position(i));
        colors.push(settings.colors.arc);
    }
    let radii = vec![settings.sphere_radius; n_vertices];

    // consecutive cells with the same separatrix id form one strip
    let cells = &complex.separatrix_cells;
    let mut line_strip_indices = Vec::with_capacity(cells.len() * 2);
    let mut current_id = None;
    for (cell, &id) in cells.cells.iter().zip(cells.separatrix_ids.iter()) {
        let [_, from, to] = *cell;
        if current_id != Some(id) {
            if current_id.is_some() {
                line_strip_indices.push(RESTART_INDEX);
            }
            current_id = Some(id);
            line_strip_indices.push(from as u32 + first_separatrix_vertex);
        }
        line_strip_indices.push(to as u32 + first_separatrix_vertex);
    }

    let picking_ids = settings.enable_picking.then(|| {
        (0..n_vertices as u32)
            .map(|i| settings.picking_base_id + i)
            .collect()
    });

    debug!(
        n_critical,
        n_separatrix_points,
        n_separatrix_cells = cells.len(),
        "built Morse-Smale complex mesh"
    );

    Mesh {
        positions,
        colors,
        radii,
        picking_ids,
        point_indices: (0..n_critical as u32).collect(),
        line_strip_indices,
        model_matrix: Matrix4::identity(),
        world_matrix: *complex.triangulation.world_matrix(),
    }
}

/// A user interaction with the rendered mesh
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickEvent {
    /// left mouse button press on the vertex with the given picking id
    Press { global_id: u32 },
    Touch,
    Wheel,
}

/// What a press on a critical point did
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickReport {
    pub picking_id: u32,
    /// the index of the critical point
    pub index: usize,
    /// the triangulation vertex of the critical point
    pub cell_id: usize,
    /// whether the critical point is picked after the press
    pub picked: bool,
    pub picked_text: String,
}

/// The set of picked critical points, in picking order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PickingState {
    picked: Vec<usize>,
}

impl PickingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// pick `index` if it isn't picked yet, otherwise unpick it. Returns
    /// whether `index` is picked afterwards.
    pub fn toggle(&mut self, index: usize) -> bool {
        match self.picked.iter().position(|&i| i == index) {
            Some(pos) => {
                self.picked.remove(pos);
                false
            }
            None => {
                self.picked.push(index);
                true
            }
        }
    }

    pub fn is_picked(&self, index: usize) -> bool {
        self.picked.contains(&index)
    }

    pub fn picked(&self) -> &[usize] {
        &self.picked
    }

    /// the picked indices, each preceded by a space
    pub fn picked_text(&self) -> String {
        self.picked.iter().map(|i| format!(" {i}")).collect()
    }

    pub fn clear(&mut self) {
        self.picked.clear();
    }

    /// toggle the critical point under the cursor.
    ///
    /// Returns `None` when the picking id doesn't belong to a critical point
    /// (e.g. it belongs to a separatrix point).
    pub fn handle_press(
        &mut self,
        global_id: u32,
        base_id: u32,
        complex: &MorseSmaleComplex,
    ) -> Option<PickReport> {
        let index = global_id.checked_sub(base_id)? as usize;
        let Some(&cell_id) = complex.critical_points.pl_vertex_ids.get(index) else {
            debug!(global_id, index, "picked vertex isn't a critical point");
            return None;
        };
        let picked = self.toggle(index);
        let picked_text = self.picked_text();
        info!(
            picking_id = global_id,
            index, cell_id, picked, "selecting critical point"
        );
        info!(picked = %picked_text);
        Some(PickReport {
            picking_id: global_id,
            index,
            cell_id,
            picked,
            picked_text,
        })
    }

    /// dispatch an interaction event. Nothing happens while picking is
    /// disabled.
    pub fn handle_event(
        &mut self,
        event: PickEvent,
        settings: &MeshSettings,
        complex: &MorseSmaleComplex,
    ) -> Option<PickReport> {
        if !settings.enable_picking {
            return None;
        }
        match event {
            PickEvent::Press { global_id } => {
                self.handle_press(global_id, settings.picking_base_id, complex)
            }
            PickEvent::Touch | PickEvent::Wheel => {
                info!(?event, "not yet implemented");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling() {
        let mut state = PickingState::new();
        assert!(state.toggle(3));
        assert!(state.toggle(1));
        assert_eq!(state.picked_text(), " 3 1");
        assert!(!state.toggle(3));
        assert_eq!(state.picked(), &[1]);
        assert!(!state.is_picked(3));
    }

    #[test]
    fn color_mixing() {
        let c = mix([0.0, 0.0, 1.0, 1.0], [1.0, 1.0, 0.0, 1.0], 0.5);
        assert_eq!(c, [0.5, 0.5, 0.5, 1.0]);
    }
}
