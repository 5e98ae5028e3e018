use std::fmt;
use std::io;
use std::path::Path;

use crate::error::CodecError;

#[derive(Debug)]
pub struct CliError {
    pub msg: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.msg.fmt(f)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Format a user friendly I/O error message with suggestions.
pub fn format_io_error(operation: &str, path: &Path, err: &io::Error) -> String {
    use io::ErrorKind::*;
    let suggestion = match err.kind() {
        NotFound => "Check that the file exists and the path is correct.",
        PermissionDenied => "Check permissions or run as a different user.",
        UnexpectedEof => "File appears truncated or corrupted.",
        WriteZero => "Disk may be full. Free up space and try again.",
        _ => "Check permissions or free up disk space.",
    };
    format!(
        "Error {} '{}': {}. {}",
        operation,
        path.display(),
        err,
        suggestion
    )
}

/// Convert an I/O error into a CLI error with context.
pub fn io_cli_error(operation: &str, path: &Path, err: io::Error) -> CliError {
    CliError {
        msg: format_io_error(operation, path, &err),
        source: Some(Box::new(err)),
    }
}

pub fn simple_cli_error(msg: &str) -> CliError {
    CliError {
        msg: msg.to_string(),
        source: None,
    }
}

/// Wrap a codec error with the operation that produced it and a hint.
pub fn codec_cli_error(context: &str, err: CodecError) -> CliError {
    CliError {
        msg: format!("{}: {}", context, cli_hint(&err)),
        source: Some(Box::new(err)),
    }
}

/// Return an actionable hint for a codec error variant.
pub fn cli_hint(err: &CodecError) -> String {
    use CodecError::*;
    match err {
        UndefinedWidth { .. } => format!("{err}. The segment count must be at least 1."),
        UnsupportedWidth { .. } => format!("{err}. Use fewer segments."),
        IncompleteStream { .. } => format!("{err}. Verify the file is intact."),
        SegmentOutOfRange { .. } => format!("{err}. Raise --segments or fix the input."),
        DuplicateVertex { .. } => format!("{err}. Each vertex may be mapped once."),
        CountOverflow { .. } => format!("{err}. Split the input."),
        LimitExceeded { .. } => {
            format!("{err}. Raise max_vertices in the config if the file is trusted.")
        }
        UnsupportedShape { .. } => format!("{err}. Only 2-D and 3-D grids are supported."),
        Backend { .. } => format!("{err}."),
        Io(io) => format!("{io}"),
        Config(msg) => format!("{msg}. Invalid configuration."),
    }
}
