#![doc = include_str!("../README.md")]

use std::num::ParseIntError;
use thiserror::Error;

pub mod annotations;
pub mod field;
pub mod ica;
pub mod model;
pub mod persist;
pub mod table;

pub use field::{FieldDescriptor, FieldKind, FieldRef, FieldValue, Scalar, ScalarSet};
pub use ica::IcaData;
pub use model::{Fields, Model};
pub use persist::{load_json_model, load_json_reader, save_to_json};
pub use table::Table;

/// File suffix of every persisted model document
pub const JSON_SUFFIX: &str = ".json";
/// Additional suffix of gzip-compressed model documents
pub const GZ_SUFFIX: &str = ".gz";

/// Errors of the `modulon` crate
#[derive(Error, Debug)]
pub enum ModulonError {
    /// A required field (the `M` or `A` matrix of a model) is absent at save time
    #[error("the model must include the `{0}` matrix")]
    MissingRequiredData(String),
    /// The document disagrees with the field table of the model
    #[error("document does not match the model: {0}")]
    SchemaMismatch(String),
    /// A float is NaN or infinite and has no JSON representation
    #[error("cannot encode non-finite float {0}")]
    NonFiniteFloat(f64),
    /// The document is not valid JSON
    #[error("invalid JSON document")]
    DocumentFormat(#[from] serde_json::Error),
    /// Reading or writing failed
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    /// A source file does not exist or cannot be opened
    #[error("cannot open file {0}")]
    CannotOpenFile(String),
    /// Input data is malformed
    #[error("invalid input data: {0}")]
    InvalidInput(String),
    /// Failed to parse an integer
    #[error("unable to parse Integer")]
    ParseIntError,
}

impl From<ParseIntError> for ModulonError {
    fn from(_: ParseIntError) -> Self {
        ModulonError::ParseIntError
    }
}

/// Shortcut for `Result<T, ModulonError>`
pub type ModulonResult<T> = Result<T, ModulonError>;
