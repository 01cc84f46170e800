use dataframe_core::DataFrameError;

/// Errors from parsing or rendering JSON text.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    /// The input is not well-formed JSON.
    #[error("invalid JSON: {0}")]
    Parse(ParseError),

    /// The parsed data cannot be held in a frame, e.g. a member name over
    /// 255 bytes.
    #[error(transparent)]
    Frame(#[from] DataFrameError),

    /// A frame could not be rendered.
    #[error("failed to render JSON: {0}")]
    Render(#[source] serde_json::Error),
}

/// Position and cause of a syntax error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at line {line} column {column}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the input.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column; 0 when the error sits right after a newline.
    pub column: usize,
    /// Last character consumed before the error, if any.
    pub last_char: Option<char>,
}

impl ParseError {
    pub(crate) fn new(err: &serde_json::Error, text: &str) -> Self {
        let line = err.line();
        let column = err.column();
        let position = format!(" at line {line} column {column}");
        let full = err.to_string();
        let message = full
            .strip_suffix(position.as_str())
            .unwrap_or(full.as_str())
            .to_string();

        let line_start: usize = text
            .split_inclusive('\n')
            .take(line.saturating_sub(1))
            .map(str::len)
            .sum();
        let offset = (line_start + column).min(text.len());
        let last_char = text
            .char_indices()
            .take_while(|(index, _)| *index < offset)
            .last()
            .map(|(_, ch)| ch);

        Self {
            message,
            offset,
            line,
            column,
            last_char,
        }
    }
}

pub type Result<T> = std::result::Result<T, JsonError>;
