//! Configuration error type.
//!
//! Everything that can go wrong while building a vehicle surfaces here, at
//! startup. Per-tick problems never become errors: a missed ground probe is a
//! `None`, and a stage that cannot produce a value skips the tick.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    /// A field that must be strictly positive (e.g. `max_speed`).
    NonPositive { field: &'static str, value: f32 },
    /// A field that must be zero or greater.
    Negative { field: &'static str, value: f32 },
    /// NaN or infinity anywhere in the tuning.
    NotFinite { field: &'static str },
    /// A field restricted to `[0, 1]`.
    OutOfUnitRange { field: &'static str, value: f32 },
    NoWheels,
    DuplicateWheel { id: String },
    ZeroLengthAxis { wheel: String },
    EmptyCurve,
    CurveKeyOutOfRange { index: usize, time: f32, value: f32 },
    CurveNotMonotonic { index: usize },
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositive { field, value } => {
                write!(f, "`{field}` must be > 0 (got {value})")
            }
            Self::Negative { field, value } => {
                write!(f, "`{field}` must be >= 0 (got {value})")
            }
            Self::NotFinite { field } => write!(f, "`{field}` is not finite"),
            Self::OutOfUnitRange { field, value } => {
                write!(f, "`{field}` must be within [0, 1] (got {value})")
            }
            Self::NoWheels => write!(f, "vehicle has no wheel mounts"),
            Self::DuplicateWheel { id } => write!(f, "duplicate wheel id `{id}`"),
            Self::ZeroLengthAxis { wheel } => {
                write!(f, "wheel `{wheel}` has a zero-length suspension axis")
            }
            Self::EmptyCurve => write!(f, "turning curve has no keys"),
            Self::CurveKeyOutOfRange { index, time, value } => {
                write!(f, "turning curve key {index} ({time}, {value}) is outside [0, 1]")
            }
            Self::CurveNotMonotonic { index } => {
                write!(f, "turning curve is not monotonic at key {index}")
            }
            Self::Io(path, e) => write!(f, "failed to read {}: {e}", path.display()),
            Self::Parse(path, e) => write!(f, "failed to parse {}: {e}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            Self::Parse(_, e) => Some(e),
            _ => None,
        }
    }
}
