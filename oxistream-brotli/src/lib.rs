//! Brotli streams for OxiStream.
//!
//! Plugs the `brotli` crate's streaming encoder and decoder into the
//! adapters from `oxistream-core`, giving `std::io::Write` compression and
//! `std::io::Read` decompression with fixed 64 KiB transfer buffers.
//!
//! # Features
//!
//! - [`BrotliEncoderStream`]: compress into any `Write`
//! - [`BrotliDecoderStream`]: decompress from any `Read`
//! - [`BrotliStream`]: one type for either direction over a duplex stream
//! - Quality `0..=11` (default 5) and window `10..=24` (default 22)
//!
//! # Example
//!
//! ```
//! use oxistream_brotli::{compress_to_vec, decompress_to_vec};
//! use oxistream_core::StreamConfig;
//!
//! let data = b"Hello, World! Hello, World!";
//! let compressed = compress_to_vec(data, StreamConfig::default()).unwrap();
//! let decompressed = decompress_to_vec(&compressed).unwrap();
//! assert_eq!(decompressed, data);
//! ```
//!
//! Streams borrow or own their inner stream. Pass `&mut writer` to keep
//! using the writer after the stream is finished.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod engine;

pub use engine::{BrotliDecoderEngine, BrotliEncoderEngine};

use std::io::{Read, Write};

use oxistream_core::config::{DEFAULT_BUFFER_CAPACITY, StreamConfig};
use oxistream_core::error::Result;
use oxistream_core::{CodecStream, DecodingStream, EncodingStream};

/// Brotli compressor writing into `W`.
pub type BrotliEncoderStream<W> = EncodingStream<W, BrotliEncoderEngine>;

/// Brotli decompressor reading from `R`.
pub type BrotliDecoderStream<R> = DecodingStream<R, BrotliDecoderEngine>;

/// Brotli stream over a duplex `S`, fixed to one direction.
pub type BrotliStream<S> = CodecStream<S, BrotliEncoderEngine, BrotliDecoderEngine>;

/// Open a compressing stream over `sink`.
pub fn encoder<W: Write>(sink: W, config: StreamConfig) -> Result<BrotliEncoderStream<W>> {
    EncodingStream::with_config(sink, BrotliEncoderEngine::new(), config)
}

/// Open a decompressing stream over `source`.
pub fn decoder<R: Read>(source: R) -> Result<BrotliDecoderStream<R>> {
    DecodingStream::new(source, BrotliDecoderEngine::new())
}

/// Compress `data` in one call.
pub fn compress_to_vec(data: &[u8], config: StreamConfig) -> Result<Vec<u8>> {
    let mut stream = encoder(Vec::new(), config)?;
    stream.write_bytes(data)?;
    stream.finish()
}

/// Decompress a complete Brotli stream in one call.
pub fn decompress_to_vec(data: &[u8]) -> Result<Vec<u8>> {
    let mut stream = decoder(data)?;
    let mut decoded = Vec::new();
    let mut chunk = vec![0u8; DEFAULT_BUFFER_CAPACITY];
    loop {
        let read = stream.read_bytes(&mut chunk)?;
        if read == 0 {
            return Ok(decoded);
        }
        decoded.extend_from_slice(&chunk[..read]);
    }
}
