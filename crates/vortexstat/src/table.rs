//! Column-oriented tables.
//!
//! A [`DataFrame`] owns a list of named, fixed-length columns. The
//! statistics engine fills its columns independently (see [`ColumnPair`])
//! and moves them into the frames once it is done.

use crate::Error;
use serde::{Deserialize, Serialize};

/// A single typed column
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Int(Vec<i32>),
    Float(Vec<f64>),
    /// codes index into `categories`
    Categorical {
        codes: Vec<u32>,
        categories: Vec<String>,
    },
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Categorical { codes, .. } => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_int(&self) -> Option<&[i32]> {
        match self {
            Column::Int(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&[f64]> {
        match self {
            Column::Float(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// the category label of each row (only for categorical columns)
    pub fn labels(&self) -> Option<Vec<&str>> {
        match self {
            Column::Categorical { codes, categories } => Some(
                codes
                    .iter()
                    .map(|c| categories.get(*c as usize).map_or("", |s| s.as_str()))
                    .collect(),
            ),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    n_rows: usize,
    columns: Vec<(String, Column)>,
}

impl DataFrame {
    pub fn new(n_rows: usize) -> Self {
        DataFrame {
            n_rows,
            columns: Vec::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// append a column. Its length must match the number of rows and its name
    /// must not already be taken.
    pub fn add_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), Error> {
        let name = name.into();
        if column.len() != self.n_rows {
            return Err(Error::invalid_shape(format!(
                "column \"{name}\" has {} rows, the frame has {}",
                column.len(),
                self.n_rows
            )));
        }
        if self.column(&name).is_some() {
            return Err(Error::invalid_shape(format!(
                "a column named \"{name}\" already exists"
            )));
        }
        self.columns.push((name, column));
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find_map(|(n, c)| (n == name).then_some(c))
    }

    pub fn int_column(&self, name: &str) -> Option<&[i32]> {
        self.column(name).and_then(Column::as_int)
    }

    pub fn float_column(&self, name: &str) -> Option<&[f64]> {
        self.column(name).and_then(Column::as_float)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }
}

/// A statistic that is tracked per group and per group-and-time
///
/// Both vectors are owned until they are handed to the frames with
/// [`ColumnPair::into_columns`].
#[derive(Clone, Debug)]
pub struct ColumnPair<T> {
    pub per_group: Vec<T>,
    pub per_group_per_time: Vec<T>,
}

impl<T: Clone> ColumnPair<T> {
    pub fn new(n_groups: usize, n_group_time_steps: usize, init: T) -> Self {
        ColumnPair {
            per_group: vec![init.clone(); n_groups],
            per_group_per_time: vec![init; n_group_time_steps],
        }
    }
}

impl<T> ColumnPair<T> {
    /// move both halves into their frames under the same name
    pub fn into_columns(
        self,
        name: &str,
        per_group: &mut DataFrame,
        per_group_per_time: &mut DataFrame,
        wrap: impl Fn(Vec<T>) -> Column,
    ) -> Result<(), Error> {
        per_group.add_column(name, wrap(self.per_group))?;
        per_group_per_time.add_column(name, wrap(self.per_group_per_time))
    }
}
