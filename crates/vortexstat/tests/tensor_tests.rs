mod common;

use common::isclose;
use nalgebra::{Matrix3, Vector3};
use rand::distr::{Distribution, Uniform};
use rand_xoshiro::Xoshiro256PlusPlus;
use rand_xoshiro::rand_core::SeedableRng;
use vortexstat::{
    EigenvectorField, HyperstreamlineSettings, HyperstreamlineTracer, IntegrationDirection,
    TensorField, TerminationReason,
};

fn constant_field(dims: [usize; 3], tensor: Matrix3<f64>) -> TensorField<3> {
    TensorField::new(dims, vec![tensor; dims.iter().product()]).unwrap()
}

#[test]
fn straight_line_in_constant_field() {
    // the major eigenvector is the y axis
    let field = constant_field([5, 5, 5], Matrix3::from_diagonal(&Vector3::new(2.0, 3.0, 1.0)));
    let settings = HyperstreamlineSettings {
        step_size: 0.5,
        ..Default::default()
    };
    let tracer = HyperstreamlineTracer::new(&field, settings).unwrap();
    let lines = tracer.trace(&[Vector3::new(2.0, 2.0, 2.0)]);
    assert_eq!(lines.len(), 1);
    let line = lines.get(0).unwrap();

    // grid space [0, 4] maps onto world space [0, 1], each step covers 1/8
    assert!((7..=9).contains(&line.len()), "{}", line.len());
    assert_eq!(line.eigenvalues.len(), line.len());
    for w in line.positions.windows(2) {
        assert!(isclose((w[1] - w[0]).norm(), 0.125, 1e-9, 0.0));
    }
    for p in line.positions.iter() {
        assert!(isclose(p.x, 0.5, 0.0, 1e-9), "{p:?}");
        assert!(isclose(p.z, 0.5, 0.0, 1e-9), "{p:?}");
    }
    assert!(line.eigenvalues.iter().all(|&l| isclose(l, 3.0, 1e-12, 0.0)));
    let length = line.arc_length();
    assert!(length > 0.75 - 1e-9 && length < 1.0 + 1e-9, "{length}");
    assert_eq!(line.forward_termination, Some(TerminationReason::OutOfDomain));
    assert_eq!(line.backward_termination, Some(TerminationReason::OutOfDomain));

    let ys: Vec<f64> = line.positions.iter().map(|p| p.y).collect();
    let increasing = ys.windows(2).all(|w| w[1] > w[0]);
    let decreasing = ys.windows(2).all(|w| w[1] < w[0]);
    assert!(increasing || decreasing);
}

#[test]
fn max_steps_and_direction() {
    let field = constant_field([9, 2, 2], Matrix3::from_diagonal(&Vector3::new(1.0, 2.0, 3.0)));
    let settings = HyperstreamlineSettings {
        step_size: 1.0,
        max_steps: 3,
        direction: IntegrationDirection::Forward,
        eigenvector: EigenvectorField::Minor,
        ..Default::default()
    };
    let tracer = HyperstreamlineTracer::new(&field, settings).unwrap();
    let line = tracer.trace_one(&Vector3::new(4.0, 0.5, 0.5));
    assert_eq!(line.len(), 4);
    assert_eq!(line.forward_termination, Some(TerminationReason::MaxSteps));
    assert_eq!(line.backward_termination, None);
    assert!(line.eigenvalues.iter().all(|&l| isclose(l, 1.0, 1e-12, 0.0)));
}

#[test]
fn seeds_outside_the_domain() {
    let field = constant_field([3, 3, 3], Matrix3::identity());
    let tracer = HyperstreamlineTracer::new(&field, Default::default()).unwrap();
    let lines = tracer.trace(&[Vector3::new(5.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0)]);
    assert_eq!(lines.len(), 2);
    assert!(lines.get(0).unwrap().is_empty());
    assert_eq!(
        lines.get(0).unwrap().forward_termination,
        Some(TerminationReason::OutOfDomain)
    );
    assert!(!lines.get(1).unwrap().is_empty());
}

#[test]
fn invalid_step_size() {
    let field = constant_field([2, 2, 2], Matrix3::identity());
    let settings = HyperstreamlineSettings {
        step_size: -1.0,
        ..Default::default()
    };
    assert!(HyperstreamlineTracer::new(&field, settings).is_err());
}

#[test]
fn random_tensors_have_sorted_eigenvalues() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(97);
    let dist = Uniform::try_from(-3.0..3.0).unwrap();
    let tensors: Vec<Matrix3<f64>> = (0..27)
        .map(|_| {
            let m = Matrix3::from_fn(|_, _| dist.sample(&mut rng));
            m + m.transpose()
        })
        .collect();
    let field = TensorField::new([3, 3, 3], tensors.clone()).unwrap();

    let eigen = field.eigen();
    for (i, tensor) in tensors.iter().enumerate() {
        let values = eigen.values[i];
        assert!(values[0] >= values[1] && values[1] >= values[2]);
        let trace = tensor.trace();
        assert!(isclose(values.iter().sum::<f64>(), trace, 1e-9, 1e-9));
        for rank in 0..3 {
            let v = eigen.vectors[i][rank];
            let residual = (tensor * v - v * values[rank]).norm();
            assert!(residual < 1e-9, "tensor {i}, rank {rank}");
        }
    }

    let major = field.meta_data().float_column("Major Eigenvalue").unwrap();
    let intermediate = field
        .meta_data()
        .float_column("Intermediate Eigenvalue")
        .unwrap();
    assert_eq!(major.len(), 27);
    assert!(major.iter().zip(intermediate).all(|(a, b)| a >= b));
    assert!(field.data_info().contains("Number of tensors: 27"));
}
