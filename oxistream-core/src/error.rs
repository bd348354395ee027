//! Error types for OxiStream operations.
//!
//! Every adapter and engine reports failures through [`StreamError`]. The
//! adapters implement [`std::io::Read`] and [`std::io::Write`], so the error
//! is also convertible into [`io::Error`]; the original value can be
//! recovered from the `io::Error` with
//! `err.get_ref().and_then(|e| e.downcast_ref::<StreamError>())`.

use std::fmt;
use std::io;
use thiserror::Error;

/// Direction an adapter moves data in. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Plain bytes are written in, compressed bytes go to the sink.
    Encode,
    /// Compressed bytes are pulled from the source, plain bytes are read out.
    Decode,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => f.write_str("encode"),
            Self::Decode => f.write_str("decode"),
        }
    }
}

/// The main error type for OxiStream operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// I/O error from the wrapped source or sink.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The codec engine or one of the transfer buffers could not be created.
    #[error("Unable to create {what}: {message}")]
    InstanceCreation {
        /// What failed to come up (engine, input buffer, ...).
        what: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// A configuration value is outside its accepted range.
    #[error("Invalid {name}: {value} is outside the supported range {min}-{max}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: u64,
        /// Smallest accepted value.
        min: u64,
        /// Largest accepted value.
        max: u64,
    },

    /// A parameter was changed after the engine started consuming input.
    #[error("Cannot change {name} after data has been written")]
    ParameterLocked {
        /// Parameter name.
        name: &'static str,
    },

    /// Read attempted on an encode adapter or write on a decode adapter.
    #[error("Cannot {attempted}: stream is in {mode} mode")]
    ModeViolation {
        /// Mode of the adapter.
        mode: Mode,
        /// Operation that was attempted.
        attempted: &'static str,
    },

    /// The encoder reported an operation failure.
    #[error("Unable to compress stream: {message}")]
    CodecFailure {
        /// Description of the failure.
        message: String,
    },

    /// The decoder rejected the compressed input.
    #[error("Unable to decode stream, possibly corrupt data: {message}")]
    CorruptStream {
        /// Description of the failure.
        message: String,
    },

    /// Upstream ended before the decoder reached the end of the stream.
    #[error("Unexpected end of compressed stream after {consumed} bytes")]
    TruncatedStream {
        /// Compressed bytes pulled from upstream before it ended.
        consumed: u64,
    },

    /// Write or flush after the final block was emitted.
    #[error("Stream already finished")]
    StreamFinished,

    /// Operation the adapter never supports (seeking, length queries).
    #[error("Unsupported operation: {operation}")]
    Unsupported {
        /// Name of the operation.
        operation: &'static str,
    },
}

/// Result type alias for OxiStream operations.
pub type Result<T> = std::result::Result<T, StreamError>;

impl StreamError {
    /// Create an instance creation error.
    pub fn instance_creation(what: &'static str, message: impl Into<String>) -> Self {
        Self::InstanceCreation {
            what,
            message: message.into(),
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(name: &'static str, value: u64, min: u64, max: u64) -> Self {
        Self::InvalidParameter {
            name,
            value,
            min,
            max,
        }
    }

    /// Create a parameter locked error.
    pub fn parameter_locked(name: &'static str) -> Self {
        Self::ParameterLocked { name }
    }

    /// Create a mode violation error.
    pub fn mode_violation(mode: Mode, attempted: &'static str) -> Self {
        Self::ModeViolation { mode, attempted }
    }

    /// Create a codec failure error.
    pub fn codec_failure(message: impl Into<String>) -> Self {
        Self::CodecFailure {
            message: message.into(),
        }
    }

    /// Create a corrupt stream error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptStream {
            message: message.into(),
        }
    }

    /// Create a truncated stream error.
    pub fn truncated(consumed: u64) -> Self {
        Self::TruncatedStream { consumed }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// The [`io::ErrorKind`] this error surfaces as through `Read`/`Write`.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Io(err) => err.kind(),
            Self::InvalidParameter { .. }
            | Self::ParameterLocked { .. }
            | Self::ModeViolation { .. } => io::ErrorKind::InvalidInput,
            Self::CorruptStream { .. } => io::ErrorKind::InvalidData,
            Self::TruncatedStream { .. } => io::ErrorKind::UnexpectedEof,
            Self::Unsupported { .. } => io::ErrorKind::Unsupported,
            Self::StreamFinished => io::ErrorKind::BrokenPipe,
            Self::InstanceCreation { .. } => io::ErrorKind::OutOfMemory,
            Self::CodecFailure { .. } => io::ErrorKind::Other,
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(inner) => inner,
            other => io::Error::new(other.kind(), other),
        }
    }
}

/// Recover the [`StreamError`] carried by an [`io::Error`] produced by an adapter.
pub fn stream_error(err: &io::Error) -> Option<&StreamError> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<StreamError>())
}
