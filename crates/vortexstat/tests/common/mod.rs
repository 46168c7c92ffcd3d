// not every test file uses every helper
#![allow(dead_code)]

// this is named mod.rs so that cargo doesn't treat it as a test crate of
// its own (see the "Submodules in Integration Tests" section of the book)

use std::io::Write;
use std::sync::{Arc, Mutex};
use vortexstat::{StatisticsSettings, Turning, Volume, Vortex, VortexSet};

// based on numpy!
// https://numpy.org/doc/stable/reference/generated/numpy.isclose.html
pub fn isclose(actual: f64, ref_val: f64, rtol: f64, atol: f64) -> bool {
    let actual_nan = actual.is_nan();
    let ref_nan = ref_val.is_nan();
    if actual_nan || ref_nan {
        actual_nan && ref_nan
    } else {
        (actual - ref_val).abs() <= (atol + rtol * ref_val.abs())
    }
}

pub fn assert_isclose(actual: f64, expected: f64, what: &str) {
    assert!(
        isclose(actual, expected, 1e-12, 1e-12),
        "{what}: got {actual}, expected {expected}"
    );
}

/// A complete set of inputs for the statistics engine
pub struct Dataset {
    pub masks: Vec<Volume<u8>>,
    pub scalars: Vec<Volume<f32>>,
    pub surface: Volume<f64>,
    pub vortices: VortexSet,
}

/// the scalar value used by [`two_group_dataset`]
pub fn scalar_at(x: usize, y: usize, z: usize, t: usize) -> f32 {
    (1 + x + 2 * y + 4 * z + 10 * t) as f32
}

/// the surface value used by [`two_group_dataset`]
pub fn surface_at(x: usize, y: usize, t: usize) -> f64 {
    let v = (1 + x + 2 * y) as f64;
    if t == 1 { -v } else { v }
}

/// A 2x2x2 domain, 3 time steps and 3 groups (plus a trailing sentinel group
/// in the hierarchy). Group 2 has no records and its id only shows up as an
/// overlap, so it never collects voxels.
///
/// Mask ids (`id = group + 1`) per time step, as `(x, y, z) -> id`:
/// - t = 0: (0,0,0), (1,0,0), (0,0,1) -> 1; (0,1,0) -> 2
/// - t = 1: (1,1,0), (1,1,1) -> 2
/// - t = 2: (0,0,0) -> 1; (1,1,0) -> 2; (1,0,1) -> 3
///
/// Seed depth records:
/// - group 0: t = 0 at (0, 0) with radii (1, 2, 1.5); t = 2 at (3, 0) with
///   radii (0, 1, 0.5)
/// - group 1: t = 0 at (0, 0), t = 1 at (3, 4), t = 2 at (3, 0) with radii
///   (1, 3, 2), (2, 2, 2) and (1, 1, 1)
pub fn two_group_dataset() -> Dataset {
    let dims = [2, 2, 2];
    let labels: [&[([usize; 3], u8)]; 3] = [
        &[([0, 0, 0], 1), ([1, 0, 0], 1), ([0, 0, 1], 1), ([0, 1, 0], 2)],
        &[([1, 1, 0], 2), ([1, 1, 1], 2)],
        &[([0, 0, 0], 1), ([1, 1, 0], 2), ([1, 0, 1], 3)],
    ];

    let mut masks = Vec::new();
    let mut scalars = Vec::new();
    for (t, voxels) in labels.iter().enumerate() {
        let mut mask = Volume::filled(dims, 1, 0_u8).unwrap();
        for &([x, y, z], id) in voxels.iter() {
            mask.set(x, y, z, 0, id);
        }
        masks.push(mask);

        let mut scalar = Volume::filled(dims, 1, 0.0_f32).unwrap();
        for z in 0..2 {
            for y in 0..2 {
                for x in 0..2 {
                    scalar.set(x, y, z, 0, scalar_at(x, y, z, t));
                }
            }
        }
        scalars.push(scalar);
    }

    let mut surface = Volume::filled([2, 2, 3], 1, 0.0).unwrap();
    for t in 0..3 {
        for y in 0..2 {
            for x in 0..2 {
                surface.set(x, y, t, 0, surface_at(x, y, t));
            }
        }
    }

    let mut vortices = VortexSet::new();
    vortices.push_group([
        Vortex::new(0, 0, [0.0, 0.0])
            .with_radii(1.0, 2.0, 1.5)
            .with_rotation(Turning::CounterClockwise),
        // a record at another depth must be ignored
        Vortex::new(0, 1, [9.0, 9.0]).with_radii(1.0, 9.0, 9.0),
        Vortex::new(2, 0, [3.0, 0.0])
            .with_radii(0.0, 1.0, 0.5)
            .with_rotation(Turning::CounterClockwise),
    ]);
    vortices.push_group([
        Vortex::new(0, 0, [0.0, 0.0]).with_radii(1.0, 3.0, 2.0),
        Vortex::new(1, 0, [3.0, 4.0]).with_radii(2.0, 2.0, 2.0),
        Vortex::new(2, 0, [3.0, 0.0]).with_radii(1.0, 1.0, 1.0),
    ]);
    vortices.push_group(Vec::<Vortex>::new());
    // sentinel
    vortices.push_group([Vortex::new(0, 0, [0.0, 0.0])]);

    Dataset {
        masks,
        scalars,
        surface,
        vortices,
    }
}

pub fn named_settings() -> StatisticsSettings {
    StatisticsSettings {
        scalar_names: vec!["Temperature".to_owned()],
        top_scalar_names: vec!["Vorticity".to_owned()],
        ensemble_member: 3,
        ..Default::default()
    }
}

/// Collects formatted log output in memory
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber installed for the current thread and return
/// its result together with every warning it logged
pub fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (result, logs)
}
