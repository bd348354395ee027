//! # OxiStream Core
//!
//! Core components for turning a stateful block codec into `std::io` streams.
//!
//! This crate provides the pieces every codec backend shares:
//!
//! - [`traits`]: The engine contract ([`EncoderEngine`], [`DecoderEngine`])
//! - [`buffer`]: Fixed transfer buffers and the decode-side carry-over buffer
//! - [`config`]: Validated quality, window and buffer settings
//! - [`encoder`]: [`EncodingStream`], a `Write` adapter
//! - [`decoder`]: [`DecodingStream`], a `Read` adapter
//! - [`stream`]: [`CodecStream`], one type for either direction
//! - [`observer`]: Per-adapter byte-count hooks
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Caller                                                  │
//! │     std::io::Read / std::io::Write                      │
//! ├─────────────────────────────────────────────────────────┤
//! │ Adapter (this crate)                                    │
//! │     EncodingStream / DecodingStream / CodecStream       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Transfer buffers                                        │
//! │     fixed input/output buffers, carry-over              │
//! ├─────────────────────────────────────────────────────────┤
//! │ Engine (backend crate)                                  │
//! │     EncoderEngine / DecoderEngine                       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxistream_core::testing::{ScriptedDecoder, ScriptedEncoder};
//! use oxistream_core::{DecodingStream, EncodingStream};
//! use std::io::{Read, Write};
//!
//! let mut encoder = EncodingStream::new(Vec::new(), ScriptedEncoder::new()).unwrap();
//! encoder.write_all(b"Hello, World!").unwrap();
//! let compressed = encoder.finish().unwrap();
//!
//! let mut decoder = DecodingStream::new(&compressed[..], ScriptedDecoder::new()).unwrap();
//! let mut plain = Vec::new();
//! decoder.read_to_end(&mut plain).unwrap();
//! assert_eq!(plain, b"Hello, World!");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod observer;
pub mod stream;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod traits;

// Re-exports for convenience
pub use buffer::{CarryOver, TransferBuffer};
pub use config::{DEFAULT_BUFFER_CAPACITY, Quality, StreamConfig, WindowBits};
pub use decoder::DecodingStream;
pub use encoder::EncodingStream;
pub use error::{Mode, Result, StreamError, stream_error};
pub use observer::{NoopObserver, StreamCounters, StreamObserver, StreamTotals};
pub use stream::CodecStream;
pub use traits::{DecodeStatus, DecoderEngine, EncodeOperation, EncoderEngine};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{Quality, StreamConfig, WindowBits};
    pub use crate::decoder::DecodingStream;
    pub use crate::encoder::EncodingStream;
    pub use crate::error::{Mode, Result, StreamError};
    pub use crate::observer::{StreamCounters, StreamObserver};
    pub use crate::stream::CodecStream;
    pub use crate::traits::{DecoderEngine, EncoderEngine};
}
