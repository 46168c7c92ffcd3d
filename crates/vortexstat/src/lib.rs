//! Processors for vortex and topology visualization pipelines.
//!
//! The centerpiece of this crate is [`VortexStatistics`], which aggregates
//! per-voxel measurements of tracked vortices into two tables: one row per
//! vortex group, and one row per group per time step.
//!
//! In addition, the crate provides:
//! - [`MorseSmaleComplexProcessor`], which computes Morse-Smale complexes with
//!   an external topology toolkit (see [`MorseSmaleBackend`]),
//! - [`complex_to_mesh`], which turns a complex into a CPU-side mesh (with
//!   picking bookkeeping, see [`PickingState`]),
//! - [`TensorField`], a generic field of symmetric tensors with lazily
//!   computed eigen data,
//! - [`HyperstreamlineTracer`], which integrates lines along the eigenvector
//!   fields of 3D tensor fields.
//!
//! None of the processors touch a GPU.
//!
//! # Logging
//! Everything is reported through [`tracing`]; installing a subscriber is up
//! to the application.

mod error;
mod hyperstreamline;
mod mesh;
mod settings;
mod statistics;
mod table;
mod tensor_field;
mod topology;
mod volume;
mod vortex;

pub use error::Error;
pub use hyperstreamline::{HyperstreamlineTracer, IntegralLine, IntegralLineSet, TerminationReason};
pub use mesh::{Mesh, PickEvent, PickReport, PickingState, RESTART_INDEX, complex_to_mesh};
pub use settings::{
    Color, ComplexColors, EigenvectorField, HyperstreamlineSettings, IntegrationDirection,
    MeshSettings, SEED_DEPTH, StatisticsSettings,
};
pub use statistics::{
    ProcessOutcome, StatisticsInputs, StatisticsTables, VortexStatistics, compute_statistics,
    derive_num_groups,
};
pub use table::{Column, ColumnPair, DataFrame};
pub use tensor_field::{DataRange, EigenData, TensorField, sorted_eigen};
pub use topology::{
    CriticalPoints, MorseSmaleBackend, MorseSmaleComplex, MorseSmaleComplexProcessor,
    MorseSmaleOutput, ScalarBuffer, SeparatrixCells, SeparatrixPoints, TopologyScalar,
    Triangulation,
};
pub use volume::{ElementType, Volume, VoxelValue};
pub use vortex::{Turning, Vortex, VortexSet};
