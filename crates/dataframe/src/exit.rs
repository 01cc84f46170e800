use std::fmt;
use std::io;

use dataframe_core::{DataFrameError, ErrorKind};
use dataframe_json::JsonError;

pub const SUCCESS: i32 = 0;
/// Also returned by `select` when nothing matched.
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: DataFrameError) -> CliError {
    match err {
        DataFrameError::Io(source) => io_error(context, source),
        DataFrameError::InvalidPattern { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        DataFrameError::StreamClosed => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        other => match other.kind() {
            ErrorKind::InvalidArgument | ErrorKind::DataUnderflow | ErrorKind::TypeMismatch => {
                CliError::new(DATA_INVALID, format!("{context}: {other}"))
            }
            ErrorKind::Io => CliError::new(INTERNAL, format!("{context}: {other}")),
        },
    }
}

pub fn json_error(context: &str, err: JsonError) -> CliError {
    match err {
        JsonError::Parse(parse) => CliError::new(DATA_INVALID, format!("{context}: {parse}")),
        JsonError::Frame(err) => frame_error(context, err),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_errors_map_to_data_invalid() {
        let err = frame_error("decode", DataFrameError::DataUnderflow { ordinal: 3 });
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("decode: "));
    }

    #[test]
    fn bad_pattern_is_usage() {
        let err = frame_error(
            "select",
            DataFrameError::InvalidPattern {
                pattern: "a..b".into(),
                reason: "empty segment".into(),
            },
        );
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn missing_file_is_failure() {
        let err = io_error("open", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.code, FAILURE);
    }
}
