//! Aggregates per-voxel vortex statistics into two tables.
//!
//! # Overview
//!
//! The inputs are time series of 3D volumes:
//! - a mask volume per time step, where each voxel holds a group id
//!   (`0` is background, otherwise `id = group index + 1`),
//! - a multi-component scalar volume per time step,
//! - a single surface scalar volume whose z axis indexes the time step,
//! - the vortex group hierarchy ([`VortexSet`]).
//!
//! The outputs are two [`DataFrame`]s: one row per group, and one row per
//! group per time step (rows are ordered time-major, see
//! [`group_time_row`]).
//!
//! # Algorithm
//!
//! For every time step we first sweep all voxels and fold their samples
//! into the accumulators of their group (both the per-group and the
//! per-group-per-time accumulators). Ids at or above the number of groups
//! mark overlapping vortices and are skipped, so the highest group never
//! collects voxels. Afterwards we finalize the time step
//! by visiting the groups from the highest index to the lowest:
//! - the contributions of a group are added to its parent group (parents
//!   always have a smaller index, so by the time a parent is visited, all of
//!   its children have already been folded into it),
//! - the per-time averages are computed,
//! - the geometric attributes of the vortex record lying on the seed depth
//!   are recorded.
//!
//! Once all time steps are done, the per-group averages are computed.
//!
//! # Numeric policy
//!
//! Min, max and extremum accumulators are lazily initialized (see
//! [`vortexstat_nostd_internal::Reducer`]): zero doubles as "unset". Averages
//! are only computed when the corresponding count is nonzero, and the aspect
//! ratio is `NaN` whenever it isn't finite.

use crate::{
    Error, Volume, VortexSet, VoxelValue,
    settings::StatisticsSettings,
    table::{Column, ColumnPair, DataFrame},
};
use ndarray::{Array2, Axis};
use tracing::{debug, info, warn};
use vortexstat_nostd_internal::{
    ChannelPackViewMut, Extremum, Max, Min, Reducer, Sum, aspect_ratio, divide_if_nonzero,
    group_time_row, squared_distance_2d,
};

/// The inputs of one aggregation run. Each input may be missing, in which
/// case the run is skipped.
pub struct StatisticsInputs<'a, M: VoxelValue, S: VoxelValue, T: VoxelValue> {
    pub masks: Option<&'a [Volume<M>]>,
    pub scalars: Option<&'a [Volume<S>]>,
    pub surface: Option<&'a Volume<T>>,
    pub vortices: Option<&'a VortexSet>,
}

impl<'a, M: VoxelValue, S: VoxelValue, T: VoxelValue> StatisticsInputs<'a, M, S, T> {
    pub fn new(
        masks: &'a [Volume<M>],
        scalars: &'a [Volume<S>],
        surface: &'a Volume<T>,
        vortices: &'a VortexSet,
    ) -> Self {
        StatisticsInputs {
            masks: Some(masks),
            scalars: Some(scalars),
            surface: Some(surface),
            vortices: Some(vortices),
        }
    }
}

/// The two linked output tables
#[derive(Clone, Debug, PartialEq)]
pub struct StatisticsTables {
    /// one row per group
    pub per_group: DataFrame,
    /// one row per group per time step
    pub per_group_per_time: DataFrame,
}

/// What happened during a call to [`VortexStatistics::process`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// nobody asked for a run (see [`VortexStatistics::assemble`])
    NotTriggered,
    /// some input is absent or empty. The run stays pending.
    MissingInput,
    /// the inputs are inconsistent. Nothing was written.
    Aborted,
    Completed,
}

/// The vortex statistics processor.
///
/// The aggregation is expensive, so it only runs when explicitly requested
/// with [`VortexStatistics::assemble`]; changing the inputs alone never
/// triggers a run.
#[derive(Debug, Default)]
pub struct VortexStatistics {
    settings: StatisticsSettings,
    assemble_requested: bool,
    outputs: Option<StatisticsTables>,
}

impl VortexStatistics {
    pub fn new(settings: StatisticsSettings) -> Self {
        VortexStatistics {
            settings,
            assemble_requested: false,
            outputs: None,
        }
    }

    pub fn settings(&self) -> &StatisticsSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut StatisticsSettings {
        &mut self.settings
    }

    /// request exactly one aggregation run on the next call to `process`
    pub fn assemble(&mut self) {
        self.assemble_requested = true;
    }

    pub fn is_pending(&self) -> bool {
        self.assemble_requested
    }

    /// the tables produced by the last successful run
    pub fn outputs(&self) -> Option<&StatisticsTables> {
        self.outputs.as_ref()
    }

    /// keep the scalar names in sync with the connected scalar volumes
    pub fn on_scalar_volumes_changed<S: VoxelValue>(&mut self, scalars: Option<&[Volume<S>]>) {
        let n_components = scalars
            .and_then(|s| s.first())
            .map_or(0, |v| v.components());
        self.settings.sync_scalar_names(n_components);
    }

    /// keep the top scalar names in sync with the connected surface volume
    pub fn on_surface_volume_changed<T: VoxelValue>(&mut self, surface: Option<&Volume<T>>) {
        let n_components = surface.map_or(0, |v| v.components());
        self.settings.sync_top_scalar_names(n_components);
    }

    /// Compute both tables with the current settings, bypassing the trigger.
    pub fn compute<M: VoxelValue, S: VoxelValue, T: VoxelValue>(
        &self,
        masks: &[Volume<M>],
        scalars: &[Volume<S>],
        surface: &Volume<T>,
        vortices: &VortexSet,
    ) -> Result<StatisticsTables, Error> {
        compute_statistics(&self.settings, masks, scalars, surface, vortices)
    }

    /// Run the aggregation if it was requested and the inputs are present.
    ///
    /// This never fails: inconsistencies are reported through `tracing` and
    /// the previous outputs are left untouched.
    pub fn process<M: VoxelValue, S: VoxelValue, T: VoxelValue>(
        &mut self,
        inputs: &StatisticsInputs<'_, M, S, T>,
    ) -> ProcessOutcome {
        if !self.assemble_requested {
            return ProcessOutcome::NotTriggered;
        }
        let (Some(masks), Some(scalars), Some(surface), Some(vortices)) =
            (inputs.masks, inputs.scalars, inputs.surface, inputs.vortices)
        else {
            debug!("vortex statistics: waiting for all inputs");
            return ProcessOutcome::MissingInput;
        };
        if masks.is_empty() || scalars.len() != masks.len() || vortices.num_groups() == 0 {
            debug!(
                n_masks = masks.len(),
                n_scalars = scalars.len(),
                n_groups = vortices.num_groups(),
                "vortex statistics: insufficient input"
            );
            return ProcessOutcome::MissingInput;
        }
        self.assemble_requested = false;

        match compute_statistics(&self.settings, masks, scalars, surface, vortices) {
            Ok(tables) => {
                info!(
                    n_groups = tables.per_group.n_rows(),
                    n_rows_per_time = tables.per_group_per_time.n_rows(),
                    "vortex statistics assembled"
                );
                self.outputs = Some(tables);
                ProcessOutcome::Completed
            }
            Err(err) => {
                warn!(error = %err, "vortex statistics aborted");
                ProcessOutcome::Aborted
            }
        }
    }
}

/// check that all volumes describe the same spatial domain
fn check_dimensions<M: VoxelValue, S: VoxelValue, T: VoxelValue>(
    masks: &[Volume<M>],
    scalars: &[Volume<S>],
    surface: &Volume<T>,
) -> Result<[usize; 3], Error> {
    let dims = masks[0].dims();
    if let Some(mask) = masks.iter().find(|m| m.dims() != dims) {
        return Err(Error::dimension_mismatch(
            "mask volumes",
            dims.to_vec(),
            mask.dims().to_vec(),
        ));
    }
    if let Some(scalar) = scalars.iter().find(|s| s.dims() != dims) {
        return Err(Error::dimension_mismatch(
            "scalar volumes",
            dims.to_vec(),
            scalar.dims().to_vec(),
        ));
    }
    // the surface volume stacks one layer per time step along z
    let expected_surface = [dims[0], dims[1], masks.len()];
    if !surface.layout().same_footprint(masks[0].layout()) || surface.dims()[2] != masks.len() {
        return Err(Error::dimension_mismatch(
            "surface scalar volume",
            expected_surface.to_vec(),
            surface.dims().to_vec(),
        ));
    }
    if let Some(scalar) = scalars
        .iter()
        .find(|s| s.components() != scalars[0].components())
    {
        return Err(Error::dimension_mismatch(
            "scalar volume components",
            vec![scalars[0].components()],
            vec![scalar.components()],
        ));
    }
    Ok(dims)
}

/// the number of channels we actually track. A mismatch between names and
/// components is reported but isn't fatal.
fn n_tracked_channels(what: &'static str, names: &[String], n_components: usize) -> usize {
    if names.len() != n_components {
        let err = Error::channel_count(what, names.len(), n_components);
        warn!(error = %err, "channel names are out of sync with the volume");
    }
    names.len().min(n_components)
}

/// Derive the number of groups from the mask value range and the hierarchy
pub fn derive_num_groups(max_mask_value: f64, n_hierarchy_groups: usize, skip_last: bool) -> usize {
    let from_mask = if max_mask_value >= 1.0 {
        max_mask_value as usize
    } else {
        0
    };
    let from_hierarchy = if skip_last {
        n_hierarchy_groups.saturating_sub(1)
    } else {
        n_hierarchy_groups
    };
    from_mask.min(from_hierarchy)
}

/// A statistic tracked for several channels at both granularities
///
/// Both arrays have shape `[n_channels, n_rows]`.
struct ChannelPair {
    per_group: Array2<f64>,
    per_group_per_time: Array2<f64>,
}

impl ChannelPair {
    fn new(n_channels: usize, n_groups: usize, n_group_time_steps: usize) -> Self {
        ChannelPair {
            per_group: Array2::zeros((n_channels, n_groups)),
            per_group_per_time: Array2::zeros((n_channels, n_group_time_steps)),
        }
    }

    fn consume(&mut self, reducer: &impl Reducer, group: usize, row: usize, sample: &[f64]) {
        ChannelPackViewMut::from_array_view(self.per_group.view_mut())
            .consume(reducer, group, sample);
        ChannelPackViewMut::from_array_view(self.per_group_per_time.view_mut())
            .consume(reducer, row, sample);
    }

    /// fold the per-time state of a child into its parent (both into the
    /// parent's per-group state and into the parent's state at the same
    /// time)
    fn merge_into_parent(
        &mut self,
        reducer: &impl Reducer,
        parent: usize,
        parent_row: usize,
        child_row: usize,
    ) {
        let child = self.per_group_per_time.view();
        ChannelPackViewMut::from_array_view(self.per_group.view_mut())
            .merge_from(reducer, parent, &child, child_row);
        ChannelPackViewMut::from_array_view(self.per_group_per_time.view_mut())
            .merge_rows(reducer, parent_row, child_row);
    }

    fn average_time_row(&mut self, row: usize, count: i32) {
        if count > 0 {
            ChannelPackViewMut::from_array_view(self.per_group_per_time.view_mut())
                .divide_row(row, count as u64);
        }
    }

    fn average_group(&mut self, group: usize, count: i32) {
        if count > 0 {
            ChannelPackViewMut::from_array_view(self.per_group.view_mut())
                .divide_row(group, count as u64);
        }
    }

    fn add_channel_columns(
        &self,
        channel: usize,
        name: String,
        per_group: &mut DataFrame,
        per_group_per_time: &mut DataFrame,
    ) -> Result<(), Error> {
        let to_column = |a: &Array2<f64>| Column::Float(a.index_axis(Axis(0), channel).to_vec());
        per_group.add_column(name.clone(), to_column(&self.per_group))?;
        per_group_per_time.add_column(name, to_column(&self.per_group_per_time))
    }
}

/// per scalar channel: surface average, volumetric average, min and max
struct ScalarColumns {
    surface: ChannelPair,
    average: ChannelPair,
    min: ChannelPair,
    max: ChannelPair,
}

/// per top (surface) scalar channel: extremum, min and max
struct TopScalarColumns {
    extreme: ChannelPair,
    min: ChannelPair,
    max: ChannelPair,
}

/// All accumulators of a single run
struct Accumulators {
    n_groups: usize,
    n_time_steps: usize,
    seed_depth: usize,

    group_id: ColumnPair<i32>,
    num_voxels: ColumnPair<i32>,
    num_top_voxels: ColumnPair<i32>,
    max_depth: ColumnPair<i32>,
    aspect_ratio: ColumnPair<f64>,
    avg_radius: ColumnPair<f64>,
    rotation: ColumnPair<u32>,

    time: Vec<i32>,
    center_x: Vec<f64>,
    center_y: Vec<f64>,

    life_time: Vec<i32>,
    start_time: Vec<i32>,
    start_x: Vec<f64>,
    start_y: Vec<f64>,
    end_x: Vec<f64>,
    end_y: Vec<f64>,
    travel: Vec<f64>,
    prev_center: Vec<Option<[f64; 2]>>,

    scalars: ScalarColumns,
    top: TopScalarColumns,
}

impl Accumulators {
    fn new(
        n_groups: usize,
        n_time_steps: usize,
        n_scalars: usize,
        n_top_scalars: usize,
        seed_depth: usize,
    ) -> Self {
        let n_gt = n_groups * n_time_steps;
        let pair = |n_channels| ChannelPair::new(n_channels, n_groups, n_gt);
        Accumulators {
            n_groups,
            n_time_steps,
            seed_depth,
            group_id: ColumnPair::new(n_groups, n_gt, 0),
            num_voxels: ColumnPair::new(n_groups, n_gt, 0),
            num_top_voxels: ColumnPair::new(n_groups, n_gt, 0),
            max_depth: ColumnPair::new(n_groups, n_gt, 0),
            aspect_ratio: ColumnPair::new(n_groups, n_gt, 0.0),
            avg_radius: ColumnPair::new(n_groups, n_gt, 0.0),
            rotation: ColumnPair::new(n_groups, n_gt, 0),
            time: vec![0; n_gt],
            center_x: vec![0.0; n_gt],
            center_y: vec![0.0; n_gt],
            life_time: vec![0; n_groups],
            start_time: vec![n_time_steps as i32; n_groups],
            start_x: vec![0.0; n_groups],
            start_y: vec![0.0; n_groups],
            end_x: vec![0.0; n_groups],
            end_y: vec![0.0; n_groups],
            travel: vec![0.0; n_groups],
            prev_center: vec![None; n_groups],
            scalars: ScalarColumns {
                surface: pair(n_scalars),
                average: pair(n_scalars),
                min: pair(n_scalars),
                max: pair(n_scalars),
            },
            top: TopScalarColumns {
                extreme: pair(n_top_scalars),
                min: pair(n_top_scalars),
                max: pair(n_top_scalars),
            },
        }
    }

    fn row(&self, time: usize, group: usize) -> usize {
        group_time_row(self.n_groups, time, group)
    }

    /// fold a single voxel into the accumulators of `group`
    ///
    /// `top_sample` is only read when the voxel lies on the seed depth.
    fn consume_voxel(
        &mut self,
        time: usize,
        group: usize,
        depth: usize,
        sample: &[f64],
        top_sample: impl FnOnce() -> Vec<f64>,
    ) {
        let row = self.row(time, group);
        let t = time as i32;

        self.start_time[group] = self.start_time[group].min(t);
        self.life_time[group] = t - self.start_time[group];

        self.num_voxels.per_group[group] += 1;
        self.num_voxels.per_group_per_time[row] += 1;
        Max.consume(&mut self.max_depth.per_group[group], depth as i32);
        Max.consume(&mut self.max_depth.per_group_per_time[row], depth as i32);

        let scalars = &mut self.scalars;
        scalars.average.consume(&Sum, group, row, sample);
        scalars.min.consume(&Min, group, row, sample);
        scalars.max.consume(&Max, group, row, sample);

        if depth != self.seed_depth {
            return;
        }
        self.num_top_voxels.per_group[group] += 1;
        self.num_top_voxels.per_group_per_time[row] += 1;
        scalars.surface.consume(&Sum, group, row, sample);

        let top_sample = top_sample();
        let top = &mut self.top;
        top.extreme.consume(&Extremum, group, row, &top_sample);
        top.min.consume(&Min, group, row, &top_sample);
        top.max.consume(&Max, group, row, &top_sample);
    }

    /// add the state of `group` at `time` to its parent group
    fn merge_into_parent(&mut self, time: usize, group: usize, parent: usize) {
        let row = self.row(time, group);
        let parent_row = self.row(time, parent);

        let n = self.num_voxels.per_group_per_time[row];
        self.num_voxels.per_group[parent] += n;
        self.num_voxels.per_group_per_time[parent_row] += n;
        let n = self.num_top_voxels.per_group_per_time[row];
        self.num_top_voxels.per_group[parent] += n;
        self.num_top_voxels.per_group_per_time[parent_row] += n;

        let scalars = &mut self.scalars;
        scalars.surface.merge_into_parent(&Sum, parent, parent_row, row);
        scalars.average.merge_into_parent(&Sum, parent, parent_row, row);
        scalars.min.merge_into_parent(&Min, parent, parent_row, row);
        scalars.max.merge_into_parent(&Max, parent, parent_row, row);

        let top = &mut self.top;
        top.extreme.merge_into_parent(&Extremum, parent, parent_row, row);
        top.min.merge_into_parent(&Min, parent, parent_row, row);
        top.max.merge_into_parent(&Max, parent, parent_row, row);
    }

    /// finalize all groups at the end of a time step
    fn finalize_time_step(&mut self, time: usize, vortices: &VortexSet) {
        for group in (0..self.n_groups).rev() {
            let row = self.row(time, group);
            self.time[row] = time as i32;
            self.group_id.per_group_per_time[row] = group as i32;

            let Some(vortex) = vortices.find(group, time, self.seed_depth) else {
                warn!(group, time, "found no vortex record on the seed depth");
                self.average_time_row(row);
                continue;
            };

            // sums, not averages, go to the parent
            if let Some(parent) = vortex.parent_group.filter(|&p| p < group) {
                self.merge_into_parent(time, group, parent);
            }
            self.average_time_row(row);

            let ratio = aspect_ratio(vortex.max_radius, vortex.min_radius);
            self.aspect_ratio.per_group_per_time[row] = ratio;
            if !ratio.is_nan() {
                self.aspect_ratio.per_group[group] += ratio;
            }
            self.avg_radius.per_group_per_time[row] = vortex.avg_radius;
            self.avg_radius.per_group[group] += vortex.avg_radius;

            let rotation = vortex.rotation.category();
            self.rotation.per_group[group] = rotation;
            self.rotation.per_group_per_time[row] = rotation;

            let center = vortex.center;
            self.center_x[row] = center[0];
            self.center_y[row] = center[1];
            match self.prev_center[group] {
                None => {
                    self.start_x[group] = center[0];
                    self.start_y[group] = center[1];
                }
                Some(prev) => {
                    self.travel[group] += squared_distance_2d(prev, center).sqrt();
                    self.end_x[group] = center[0];
                    self.end_y[group] = center[1];
                }
            }
            self.prev_center[group] = Some(center);
        }
    }

    fn average_time_row(&mut self, row: usize) {
        let n_top = self.num_top_voxels.per_group_per_time[row];
        let n = self.num_voxels.per_group_per_time[row];
        self.scalars.surface.average_time_row(row, n_top);
        self.scalars.average.average_time_row(row, n);
    }

    /// compute the per-group averages once all time steps are done
    fn finalize_groups(&mut self) {
        for group in 0..self.n_groups {
            self.group_id.per_group[group] = group as i32;

            let life_time = self.life_time[group];
            if life_time != 0 {
                divide_if_nonzero(&mut self.aspect_ratio.per_group[group], life_time);
                divide_if_nonzero(&mut self.avg_radius.per_group[group], life_time);
            }

            let n_top = self.num_top_voxels.per_group[group];
            let n = self.num_voxels.per_group[group];
            self.scalars.surface.average_group(group, n_top);
            self.scalars.average.average_group(group, n);
        }
    }

    /// move all columns into the output tables
    fn into_tables(
        self,
        ensemble_member: i32,
        scalar_names: &[String],
        top_scalar_names: &[String],
    ) -> Result<StatisticsTables, Error> {
        let n_gt = self.n_groups * self.n_time_steps;
        let mut per_group = DataFrame::new(self.n_groups);
        let mut per_time = DataFrame::new(n_gt);
        let (pg, pt) = (&mut per_group, &mut per_time);

        ColumnPair::new(self.n_groups, n_gt, ensemble_member).into_columns(
            "Ensemble",
            pg,
            pt,
            Column::Int,
        )?;
        self.group_id.into_columns("Vortex ID", pg, pt, Column::Int)?;
        pt.add_column("Time", Column::Int(self.time))?;
        self.num_voxels.into_columns("Num Voxels", pg, pt, Column::Int)?;
        self.num_top_voxels
            .into_columns("Num Surface Voxels", pg, pt, Column::Int)?;
        self.max_depth.into_columns("Max Depth", pg, pt, Column::Int)?;
        self.aspect_ratio
            .into_columns("Surface Aspect Ratio", pg, pt, Column::Float)?;
        self.avg_radius
            .into_columns("Surface Avg Radius", pg, pt, Column::Float)?;

        let end_time: Vec<i32> = self
            .start_time
            .iter()
            .zip(self.life_time.iter())
            .map(|(start, life)| start + life)
            .collect();
        pg.add_column("Life Time", Column::Int(self.life_time))?;
        pg.add_column("Start Time", Column::Int(self.start_time))?;
        pg.add_column("End Time", Column::Int(end_time))?;

        let categories = vec!["CW".to_owned(), "CCW".to_owned()];
        self.rotation.into_columns("Rotation", pg, pt, |codes| {
            Column::Categorical {
                codes,
                categories: categories.clone(),
            }
        })?;

        pt.add_column("Center X", Column::Float(self.center_x))?;
        pt.add_column("Center Y", Column::Float(self.center_y))?;
        pg.add_column("Start Center X", Column::Float(self.start_x))?;
        pg.add_column("Start Center Y", Column::Float(self.start_y))?;
        pg.add_column("End Center X", Column::Float(self.end_x))?;
        pg.add_column("End Center Y", Column::Float(self.end_y))?;
        pg.add_column("Travelled Distance", Column::Float(self.travel))?;

        let scalars = &self.scalars;
        for (c, name) in scalar_names.iter().enumerate() {
            scalars
                .surface
                .add_channel_columns(c, format!("Surface {name}"), pg, pt)?;
            scalars
                .average
                .add_channel_columns(c, format!("Avg {name}"), pg, pt)?;
            scalars
                .min
                .add_channel_columns(c, format!("Min {name}"), pg, pt)?;
            scalars
                .max
                .add_channel_columns(c, format!("Max {name}"), pg, pt)?;
        }
        let top = &self.top;
        for (c, name) in top_scalar_names.iter().enumerate() {
            top.extreme
                .add_channel_columns(c, format!("Extreme {name}"), pg, pt)?;
            top.min
                .add_channel_columns(c, format!("Surface Min {name}"), pg, pt)?;
            top.max
                .add_channel_columns(c, format!("Surface Max {name}"), pg, pt)?;
        }

        Ok(StatisticsTables {
            per_group,
            per_group_per_time: per_time,
        })
    }
}

/// Compute both statistics tables.
///
/// This is the aggregation performed by [`VortexStatistics::process`],
/// without the trigger/no-op handling.
pub fn compute_statistics<M: VoxelValue, S: VoxelValue, T: VoxelValue>(
    settings: &StatisticsSettings,
    masks: &[Volume<M>],
    scalars: &[Volume<S>],
    surface: &Volume<T>,
    vortices: &VortexSet,
) -> Result<StatisticsTables, Error> {
    settings.validate()?;
    if masks.is_empty() || masks.len() != scalars.len() {
        return Err(Error::dimension_mismatch(
            "volume time series",
            vec![masks.len()],
            vec![scalars.len()],
        ));
    }
    let [nx, ny, nz] = check_dimensions(masks, scalars, surface)?;
    let n_time_steps = masks.len();

    let n_scalars = n_tracked_channels("scalar", &settings.scalar_names, scalars[0].components());
    let n_top_scalars =
        n_tracked_channels("top scalar", &settings.top_scalar_names, surface.components());

    let max_mask_value = masks
        .iter()
        .filter_map(Volume::max_value)
        .fold(0.0_f64, f64::max);
    let n_groups = derive_num_groups(
        max_mask_value,
        vortices.num_groups(),
        settings.skip_last_group,
    );
    debug!(
        n_groups,
        max_mask_value,
        n_hierarchy_groups = vortices.num_groups(),
        n_time_steps,
        mask_type = ?masks[0].element_type(),
        "starting vortex statistics"
    );

    let mut acc = Accumulators::new(
        n_groups,
        n_time_steps,
        n_scalars,
        n_top_scalars,
        settings.seed_depth,
    );
    let mut sample = vec![0.0; n_scalars];

    for (time, (mask, scalar)) in masks.iter().zip(scalars.iter()).enumerate() {
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    let id = mask.value(x, y, z, 0);
                    // background (and anything that isn't a valid id)
                    if !(id >= 1.0) {
                        continue;
                    }
                    // overlapping vortices produce ids at or above n_groups
                    if id as usize >= n_groups {
                        continue;
                    }
                    let group = id as usize - 1;
                    scalar.sample_into(x, y, z, &mut sample);
                    acc.consume_voxel(time, group, z, &sample, || {
                        let mut top_sample = vec![0.0; n_top_scalars];
                        surface.sample_into(x, y, time, &mut top_sample);
                        top_sample
                    });
                }
            }
        }
        acc.finalize_time_step(time, vortices);
    }
    acc.finalize_groups();

    acc.into_tables(
        settings.ensemble_member,
        &settings.scalar_names[..n_scalars],
        &settings.top_scalar_names[..n_top_scalars],
    )
}
