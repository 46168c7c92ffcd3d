// We follow the same approach to errors as our sibling projects:
//
// the public crate defines a single opaque `Error` type that wraps a private
// `ErrorKind`. The `vortexstat_nostd_internal` crate keeps returning
// `&'static str` (it can't allocate), and we wrap those strings here.
//
// Most callers never see these errors: the statistics engine reports
// problems through `tracing` and returns a `ProcessOutcome` instead. They
// mostly matter for the lower-level constructors (volumes, data frames,
// tensor fields).

use thiserror::Error as ThisError;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The underlying internal error type
#[non_exhaustive]
#[derive(Clone, Debug, ThisError)]
enum ErrorKind {
    /// The inputs of a computation have inconsistent dimensions
    #[error(transparent)]
    DimensionMismatch(DimensionMismatchError),
    /// The number of declared channel names differs from the number of
    /// components of a volume
    #[error(transparent)]
    ChannelCount(ChannelCountError),
    /// A buffer can't be interpreted with the requested shape
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    /// A settings object holds a value that we can't work with
    #[error("invalid setting \"{name}\": {what}")]
    InvalidSettings { name: &'static str, what: String },
    /// A group index lies outside of the vortex hierarchy
    #[error("group {group} is out of range (only {n_groups} groups are known)")]
    GroupIndex { group: usize, n_groups: usize },
    /// The external topology toolkit reported a problem
    #[error("topology toolkit failure: {0}")]
    Topology(String),
    /// wraps the stringly errors of `vortexstat_nostd_internal`
    #[error("{0}")]
    Internal(&'static str),
}

// define constructor methods for Error
impl Error {
    /// produce an error indicating that two inputs have different dimensions
    pub(crate) fn dimension_mismatch(
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    ) -> Self {
        Error {
            kind: ErrorKind::DimensionMismatch(DimensionMismatchError {
                what,
                expected,
                actual,
            }),
        }
    }

    /// produce an error indicating a mismatch between the number of declared
    /// channel names and the number of volume components
    pub(crate) fn channel_count(what: &'static str, n_names: usize, n_components: usize) -> Self {
        Error {
            kind: ErrorKind::ChannelCount(ChannelCountError {
                what,
                n_names,
                n_components,
            }),
        }
    }

    pub(crate) fn invalid_shape(what: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::InvalidShape(what.into()),
        }
    }

    pub(crate) fn invalid_settings(name: &'static str, what: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::InvalidSettings {
                name,
                what: what.into(),
            },
        }
    }

    pub(crate) fn group_index(group: usize, n_groups: usize) -> Self {
        Error {
            kind: ErrorKind::GroupIndex { group, n_groups },
        }
    }

    /// wraps a failure reported by an external topology backend
    pub fn topology(what: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::Topology(what.into()),
        }
    }

    /// wraps an error string from `vortexstat_nostd_internal`
    pub(crate) fn internal(message: &'static str) -> Self {
        Error {
            kind: ErrorKind::Internal(message),
        }
    }

    /// A short, stable name for the kind of error.
    ///
    /// This is mostly useful for tests and for callers that want to react to
    /// a particular kind of failure without matching on the message.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ErrorKind::DimensionMismatch(_) => "dimension_mismatch",
            ErrorKind::ChannelCount(_) => "channel_count",
            ErrorKind::InvalidShape(_) => "invalid_shape",
            ErrorKind::InvalidSettings { .. } => "invalid_settings",
            ErrorKind::GroupIndex { .. } => "group_index",
            ErrorKind::Topology(_) => "topology",
            ErrorKind::Internal(_) => "internal",
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.kind.fmt(f)
    }
}

/// An error that occurs when the inputs have inconsistent dimensions
#[derive(Clone, Debug, ThisError)]
#[error("dimensions of the {what} don't match: expected {expected:?}, got {actual:?}")]
struct DimensionMismatchError {
    what: &'static str,
    expected: Vec<usize>,
    actual: Vec<usize>,
}

/// An error that occurs when the number of channel names differs from the
/// number of volume components
#[derive(Clone, Debug, ThisError)]
#[error("{n_names} {what} names were declared, but the volume holds {n_components} components")]
struct ChannelCountError {
    what: &'static str,
    n_names: usize,
    n_components: usize,
}
