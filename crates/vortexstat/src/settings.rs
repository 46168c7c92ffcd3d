//! Configuration objects for the processors of this crate.
//!
//! All settings are plain serde-serializable structs with sensible
//! defaults, so that they can be stored alongside a pipeline description and
//! partially specified (missing fields fall back to their defaults).

use crate::Error;
use serde::{Deserialize, Serialize};

/// The z-layer at which the surface (top) scalar field applies, unless a
/// different one is configured.
pub const SEED_DEPTH: usize = 0;

/// Settings of the [`VortexStatistics`](crate::VortexStatistics) engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsSettings {
    /// one name per component of the scalar volumes
    pub scalar_names: Vec<String>,
    /// one name per component of the surface scalar volume
    pub top_scalar_names: Vec<String>,
    /// tag written into the "Ensemble" column of both tables
    pub ensemble_member: i32,
    /// the provider of the vortex hierarchy may emit a trailing sentinel
    /// group that isn't a real feature
    pub skip_last_group: bool,
    pub seed_depth: usize,
}

impl Default for StatisticsSettings {
    fn default() -> Self {
        StatisticsSettings {
            scalar_names: Vec::new(),
            top_scalar_names: Vec::new(),
            ensemble_member: 0,
            skip_last_group: true,
            seed_depth: SEED_DEPTH,
        }
    }
}

/// grow or shrink `names` to `n` entries, keeping the existing names
fn sync_names(names: &mut Vec<String>, n: usize, prefix: &str) {
    names.truncate(n);
    for i in names.len()..n {
        names.push(format!("{prefix}{i}"));
    }
}

impl StatisticsSettings {
    /// resize the scalar names to match the number of scalar components
    pub fn sync_scalar_names(&mut self, n_components: usize) {
        sync_names(&mut self.scalar_names, n_components, "Scalar");
    }

    /// resize the top scalar names to match the number of surface components
    pub fn sync_top_scalar_names(&mut self, n_components: usize) {
        sync_names(&mut self.top_scalar_names, n_components, "TScalar");
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.ensemble_member < 0 {
            return Err(Error::invalid_settings(
                "ensemble_member",
                format!("must not be negative (got {})", self.ensemble_member),
            ));
        }
        Ok(())
    }
}

/// An RGBA color with components in `[0, 1]`
pub type Color = [f32; 4];

/// Colors used when converting a Morse-Smale complex to a mesh
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexColors {
    pub minimum: Color,
    pub saddle: Color,
    /// only used for 3D complexes (index-2 saddles)
    pub saddle2: Color,
    pub maximum: Color,
    /// color of separatrices
    pub arc: Color,
}

impl Default for ComplexColors {
    fn default() -> Self {
        ComplexColors {
            minimum: [0.0, 0.0, 1.0, 1.0],
            saddle: [0.0, 1.0, 0.0, 1.0],
            saddle2: [1.0, 1.0, 0.0, 1.0],
            maximum: [1.0, 0.0, 0.0, 1.0],
            arc: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

impl ComplexColors {
    /// color of a critical point of a 2D complex, by the dimension of its cell
    pub fn color_2d(&self, cell_dimension: u8) -> Color {
        match cell_dimension {
            0 => self.minimum,
            1 => self.saddle,
            _ => self.maximum,
        }
    }

    /// color of a critical point of a 3D complex, by the dimension of its cell
    pub fn color_3d(&self, cell_dimension: u8) -> Color {
        match cell_dimension {
            0 => self.minimum,
            1 => self.saddle,
            2 => self.saddle2,
            _ => self.maximum,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    pub colors: ComplexColors,
    pub sphere_radius: f32,
    pub enable_picking: bool,
    pub picking_color: Color,
    /// in `[0, 1]`; how far picked points are mixed toward `picking_color`
    pub picking_intensity: f32,
    /// picking id of the first mesh vertex
    pub picking_base_id: u32,
}

impl Default for MeshSettings {
    fn default() -> Self {
        MeshSettings {
            colors: ComplexColors::default(),
            sphere_radius: 0.05,
            enable_picking: false,
            picking_color: [1.0, 0.5, 0.0, 1.0],
            picking_intensity: 0.5,
            picking_base_id: 1,
        }
    }
}

impl MeshSettings {
    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=10.0).contains(&self.sphere_radius) {
            return Err(Error::invalid_settings(
                "sphere_radius",
                format!("must lie in [0, 10] (got {})", self.sphere_radius),
            ));
        }
        if !(0.0..=1.0).contains(&self.picking_intensity) {
            return Err(Error::invalid_settings(
                "picking_intensity",
                format!("must lie in [0, 1] (got {})", self.picking_intensity),
            ));
        }
        Ok(())
    }
}

/// Which eigenvector field a hyperstreamline follows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EigenvectorField {
    Major,
    Intermediate,
    Minor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrationDirection {
    Forward,
    Backward,
    Both,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperstreamlineSettings {
    /// step size in index space
    pub step_size: f64,
    pub max_steps: usize,
    pub direction: IntegrationDirection,
    pub eigenvector: EigenvectorField,
    /// integration stops where the magnitude of the followed eigenvalue
    /// drops below this value
    pub min_eigenvalue: f64,
}

impl Default for HyperstreamlineSettings {
    fn default() -> Self {
        HyperstreamlineSettings {
            step_size: 0.25,
            max_steps: 1000,
            direction: IntegrationDirection::Both,
            eigenvector: EigenvectorField::Major,
            min_eigenvalue: 0.0,
        }
    }
}

impl HyperstreamlineSettings {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.step_size > 0.0 && self.step_size.is_finite()) {
            return Err(Error::invalid_settings(
                "step_size",
                format!("must be positive (got {})", self.step_size),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_keeps_user_names() {
        let mut settings = StatisticsSettings {
            scalar_names: vec!["Velocity".to_owned()],
            ..Default::default()
        };
        settings.sync_scalar_names(3);
        assert_eq!(settings.scalar_names, vec!["Velocity", "Scalar1", "Scalar2"]);
        settings.sync_scalar_names(1);
        assert_eq!(settings.scalar_names, vec!["Velocity"]);

        settings.sync_top_scalar_names(2);
        assert_eq!(settings.top_scalar_names, vec!["TScalar0", "TScalar1"]);
    }

    #[test]
    fn partial_deserialize() {
        let settings: StatisticsSettings =
            serde_json::from_str(r#"{"ensemble_member": 7, "scalar_names": ["T"]}"#).unwrap();
        assert_eq!(settings.ensemble_member, 7);
        assert_eq!(settings.scalar_names, vec!["T"]);
        assert!(settings.skip_last_group);
        assert_eq!(settings.seed_depth, SEED_DEPTH);
    }

    #[test]
    fn validation() {
        let settings = StatisticsSettings {
            ensemble_member: -1,
            ..Default::default()
        };
        assert_eq!(settings.validate().unwrap_err().kind_name(), "invalid_settings");

        let mesh = MeshSettings {
            picking_intensity: 2.0,
            ..Default::default()
        };
        assert!(mesh.validate().is_err());
        assert!(MeshSettings::default().validate().is_ok());

        let lines = HyperstreamlineSettings {
            step_size: 0.0,
            ..Default::default()
        };
        assert!(lines.validate().is_err());
    }
}
