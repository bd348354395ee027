//! A single stream type covering both directions.
//!
//! [`CodecStream`] is fixed to one [`Mode`] at construction. It implements
//! `Read`, `Write` and `Seek` over the same inner stream, rejecting any call
//! that does not fit the mode.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::config::StreamConfig;
use crate::decoder::DecodingStream;
use crate::encoder::EncodingStream;
use crate::error::{Mode, Result, StreamError};
use crate::observer::StreamTotals;
use crate::traits::{DecoderEngine, EncoderEngine};

/// A compressing or decompressing wrapper around a bidirectional stream.
#[derive(Debug)]
pub enum CodecStream<S: Read + Write, E: EncoderEngine, D: DecoderEngine> {
    /// Bytes written are compressed into the inner stream.
    Encode(EncodingStream<S, E>),
    /// Bytes read are decompressed from the inner stream.
    Decode(DecodingStream<S, D>),
}

impl<S, E, D> CodecStream<S, E, D>
where
    S: Read + Write,
    E: EncoderEngine,
    D: DecoderEngine,
{
    /// Open `inner` for compression.
    pub fn encoder(inner: S, engine: E, config: StreamConfig) -> Result<Self> {
        Ok(Self::Encode(EncodingStream::with_config(
            inner, engine, config,
        )?))
    }

    /// Open `inner` for decompression.
    pub fn decoder(inner: S, engine: D, config: StreamConfig) -> Result<Self> {
        Ok(Self::Decode(DecodingStream::with_config(
            inner, engine, config,
        )?))
    }

    /// Direction chosen at construction.
    pub fn mode(&self) -> Mode {
        match self {
            Self::Encode(_) => Mode::Encode,
            Self::Decode(_) => Mode::Decode,
        }
    }

    /// Whether `read` is allowed.
    pub fn can_read(&self) -> bool {
        match self {
            Self::Encode(s) => s.can_read(),
            Self::Decode(s) => s.can_read(),
        }
    }

    /// Whether `write` is allowed.
    pub fn can_write(&self) -> bool {
        match self {
            Self::Encode(s) => s.can_write(),
            Self::Decode(s) => s.can_write(),
        }
    }

    /// Always `false`.
    pub fn can_seek(&self) -> bool {
        false
    }

    /// Byte counts for whichever direction is active.
    pub fn totals(&self) -> StreamTotals {
        match self {
            Self::Encode(s) => s.totals(),
            Self::Decode(s) => s.totals(),
        }
    }

    /// Reference to the inner stream.
    pub fn get_ref(&self) -> &S {
        match self {
            Self::Encode(s) => s.get_ref(),
            Self::Decode(s) => s.get_ref(),
        }
    }

    /// Total length is unknown for a compressed stream.
    pub fn length(&self) -> Result<u64> {
        Err(StreamError::unsupported("length"))
    }

    /// Position cannot be changed.
    pub fn set_position(&mut self, _position: u64) -> Result<()> {
        Err(StreamError::unsupported("set position"))
    }

    /// Length cannot be changed.
    pub fn set_length(&mut self, _len: u64) -> Result<()> {
        Err(StreamError::unsupported("set length"))
    }

    /// Finish an encoding stream. A no-op in decode mode.
    pub fn close(&mut self) -> Result<()> {
        match self {
            Self::Encode(s) => s.close(),
            Self::Decode(_) => Ok(()),
        }
    }

    /// Finish if encoding, then hand back the inner stream.
    pub fn into_inner(self) -> Result<S> {
        match self {
            Self::Encode(s) => s.finish(),
            Self::Decode(s) => Ok(s.into_inner()),
        }
    }
}

impl<S, E, D> Read for CodecStream<S, E, D>
where
    S: Read + Write,
    E: EncoderEngine,
    D: DecoderEngine,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Encode(_) => Err(StreamError::mode_violation(Mode::Encode, "read").into()),
            Self::Decode(s) => s.read(buf),
        }
    }
}

impl<S, E, D> Write for CodecStream<S, E, D>
where
    S: Read + Write,
    E: EncoderEngine,
    D: DecoderEngine,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Encode(s) => s.write(buf),
            Self::Decode(_) => Err(StreamError::mode_violation(Mode::Decode, "write").into()),
        }
    }

    /// Decode-mode flush does nothing.
    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Encode(s) => s.flush(),
            Self::Decode(_) => Ok(()),
        }
    }
}

impl<S, E, D> Seek for CodecStream<S, E, D>
where
    S: Read + Write,
    E: EncoderEngine,
    D: DecoderEngine,
{
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(StreamError::unsupported("seek").into())
    }
}
