//! Define the basic reduction machinery (that doesn't require the standard lib)
//!
//! # Reduction Machinery
//!
//! Every statistic we report for a vortex group is the result of folding a
//! stream of per-voxel samples into a single accumulator. The folding logic
//! is encapsulated by types implementing [`Reducer`], while the storage of
//! the accumulators is owned by external code (usually a column of a table,
//! or a [`ChannelPackViewMut`](crate::ChannelPackViewMut) when a statistic
//! is tracked for several named channels at once).
//!
//! ## Lazy initialization
//!
//! The accumulators are plain numbers that start out as zero. The
//! order-statistic reducers ([`Min`], [`Max`] and [`Extremum`]) treat an
//! accumulator holding exactly zero as "unset" and unconditionally adopt the
//! next value they consume. This means an observed zero is indistinguishable
//! from "nothing observed yet". Downstream consumers rely on this behavior
//! (an unobserved group reports zero rather than +/- infinity), so we keep
//! it.
//!
//! Because of the lazy initialization, merging two accumulators is the same
//! operation as consuming a single value, which is why [`Reducer::merge`]
//! has a default implementation.

// NOTE: f64::abs can't be used in no_std crates (with our MSRV)
#[inline(always)]
fn abs_f64(x: f64) -> f64 {
    if x < 0.0 { -x } else { x }
}

/// Numeric types that can be held by an accumulator
pub trait Scalar: Copy + PartialOrd + core::ops::Add<Output = Self> {
    /// the value that doubles as the "unset" sentinel
    const ZERO: Self;

    /// absolute magnitude, used to rank values by their distance from zero
    fn magnitude(self) -> f64;
}

macro_rules! impl_scalar_int {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                const ZERO: Self = 0;

                #[inline(always)]
                fn magnitude(self) -> f64 {
                    abs_f64(self as f64)
                }
            }
        )*
    };
}

impl_scalar_int!(i32, i64, u32, u64, usize);

impl Scalar for f32 {
    const ZERO: Self = 0.0;

    #[inline(always)]
    fn magnitude(self) -> f64 {
        abs_f64(self as f64)
    }
}

impl Scalar for f64 {
    const ZERO: Self = 0.0;

    #[inline(always)]
    fn magnitude(self) -> f64 {
        abs_f64(self)
    }
}

/// Reducers fold values into a single accumulator.
///
/// Implementors are stateless. They just provide the logic for updating
/// storage that lives elsewhere.
pub trait Reducer {
    /// consume `value` and update `accum` accordingly
    fn consume<T: Scalar>(&self, accum: &mut T, value: T);

    /// merge the state tracked by `other` into `accum`
    fn merge<T: Scalar>(&self, accum: &mut T, other: T) {
        self.consume(accum, other);
    }
}

/// Running sum
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum;

impl Reducer for Sum {
    #[inline(always)]
    fn consume<T: Scalar>(&self, accum: &mut T, value: T) {
        *accum = *accum + value;
    }
}

/// Running minimum with lazy (zero-sentinel) initialization
#[derive(Clone, Copy, Debug, Default)]
pub struct Min;

impl Reducer for Min {
    #[inline(always)]
    fn consume<T: Scalar>(&self, accum: &mut T, value: T) {
        if *accum == T::ZERO || value < *accum {
            *accum = value;
        }
    }
}

/// Running maximum with lazy (zero-sentinel) initialization
#[derive(Clone, Copy, Debug, Default)]
pub struct Max;

impl Reducer for Max {
    #[inline(always)]
    fn consume<T: Scalar>(&self, accum: &mut T, value: T) {
        if *accum == T::ZERO || value > *accum {
            *accum = value;
        }
    }
}

/// Tracks the value with the largest magnitude.
///
/// Ties are resolved in favor of the value that was consumed first.
#[derive(Clone, Copy, Debug, Default)]
pub struct Extremum;

impl Reducer for Extremum {
    #[inline(always)]
    fn consume<T: Scalar>(&self, accum: &mut T, value: T) {
        if *accum == T::ZERO || value.magnitude() > accum.magnitude() {
            *accum = value;
        }
    }
}
