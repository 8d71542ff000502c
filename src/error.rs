use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `EpinetError` and maps other errors to
/// convert to an `EpinetError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum EpinetError {
    /// A parameter is malformed or out of range.
    InvalidConfiguration(String),
    /// A network model name outside the supported set. This is a kind of
    /// configuration error; see [`EpinetError::is_configuration_error`].
    UnknownModel(String),
    /// An operation was invoked out of its allowed order.
    InvalidState(String),
    /// A report could not be opened for writing.
    ReportError(String),
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    EncodeError(bincode::error::EncodeError),
    DecodeError(bincode::error::DecodeError),
}

impl EpinetError {
    /// Returns true for errors raised while validating parameters, including
    /// unknown network models.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            EpinetError::InvalidConfiguration(_) | EpinetError::UnknownModel(_)
        )
    }

    #[must_use]
    pub fn is_state_error(&self) -> bool {
        matches!(self, EpinetError::InvalidState(_))
    }
}

impl From<io::Error> for EpinetError {
    fn from(error: io::Error) -> Self {
        EpinetError::IoError(error)
    }
}

impl From<serde_json::Error> for EpinetError {
    fn from(error: serde_json::Error) -> Self {
        EpinetError::JsonError(error)
    }
}

impl From<csv::Error> for EpinetError {
    fn from(error: csv::Error) -> Self {
        EpinetError::CSVError(error)
    }
}

impl From<bincode::error::EncodeError> for EpinetError {
    fn from(error: bincode::error::EncodeError) -> Self {
        EpinetError::EncodeError(error)
    }
}

impl From<bincode::error::DecodeError> for EpinetError {
    fn from(error: bincode::error::DecodeError) -> Self {
        EpinetError::DecodeError(error)
    }
}

// Every builder field has a default, so this only fires if a new field is
// added without one.
impl From<derive_builder::UninitializedFieldError> for EpinetError {
    fn from(error: derive_builder::UninitializedFieldError) -> Self {
        EpinetError::InvalidConfiguration(format!(
            "missing parameter: {}",
            error.field_name()
        ))
    }
}

impl std::error::Error for EpinetError {}

impl Display for EpinetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EpinetError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            EpinetError::UnknownModel(name) => write!(f, "unknown network model: {name}"),
            EpinetError::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            EpinetError::ReportError(msg) => write!(f, "report error: {msg}"),
            other => write!(f, "Error: {other:?}"),
        }
    }
}
