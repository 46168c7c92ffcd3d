use crate::reducer::Reducer;
use ndarray::{ArrayView2, ArrayViewMut2, Axis};

/// Represents a collection of per-channel accumulators
///
/// The wrapped array has shape `[n_channels, n_rows]`. Each row corresponds
/// to a single row of an output table (a group, or a group at a given time)
/// and each channel corresponds to one named vector component of a scalar
/// volume.
///
/// # Note
/// There is some benefit to defining this even though it wraps
/// ArrayViewMut2 since it helps contain all references to the ndarray
/// package to a single file.
pub struct ChannelPackViewMut<'a> {
    data: ArrayViewMut2<'a, f64>,
}

impl<'a> ChannelPackViewMut<'a> {
    pub fn from_array_view(array_view: ArrayViewMut2<'a, f64>) -> Self {
        Self { data: array_view }
    }

    pub fn n_channels(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// fold one sample (one value per channel) into the accumulators of `row`
    ///
    /// Only the first `self.n_channels()` entries of `sample` are consumed.
    pub fn consume(&mut self, reducer: &impl Reducer, row: usize, sample: &[f64]) {
        let mut accum = self.data.index_axis_mut(Axis(1), row);
        for (slot, value) in accum.iter_mut().zip(sample.iter()) {
            reducer.consume(slot, *value);
        }
    }

    /// merge the accumulators stored in `other[:, other_row]` into
    /// `self[:, row]`
    pub fn merge_from(
        &mut self,
        reducer: &impl Reducer,
        row: usize,
        other: &ArrayView2<'_, f64>,
        other_row: usize,
    ) {
        let src = other.index_axis(Axis(1), other_row);
        let mut dst = self.data.index_axis_mut(Axis(1), row);
        for (slot, value) in dst.iter_mut().zip(src.iter()) {
            reducer.merge(slot, *value);
        }
    }

    /// merge the accumulators of `src_row` into `dst_row` (both rows belong
    /// to `self`)
    pub fn merge_rows(&mut self, reducer: &impl Reducer, dst_row: usize, src_row: usize) {
        if dst_row == src_row {
            return;
        }
        for c in 0..self.n_channels() {
            let value = self.data[[c, src_row]];
            reducer.merge(&mut self.data[[c, dst_row]], value);
        }
    }

    /// divide every accumulator of `row` by `count`. Nothing happens when
    /// `count` is zero.
    pub fn divide_row(&mut self, row: usize, count: u64) {
        if count == 0 {
            return;
        }
        let denom = count as f64;
        self.data
            .index_axis_mut(Axis(1), row)
            .iter_mut()
            .for_each(|v| *v /= denom);
    }
}
