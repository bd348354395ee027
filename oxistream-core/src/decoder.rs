//! Decoding adapter: compressed bytes in from a source, plain bytes out via `Read`.
//!
//! Decoded bytes land in a carry-over buffer first and are served from
//! there. A read only pulls from the source when the carry-over cannot
//! satisfy it, and stops pulling as soon as it can.
//!
//! Failures are sticky. Once the engine reports invalid data, or the source
//! ends before the compressed stream does, every later read fails the same
//! way.

use std::fmt;
use std::io::{self, Read};

use tracing::{debug, trace};

use crate::buffer::{CarryOver, TransferBuffer};
use crate::config::StreamConfig;
use crate::error::{Mode, Result, StreamError};
use crate::observer::{NoopObserver, StreamObserver, StreamTotals};
use crate::traits::{DecodeStatus, DecoderEngine};

/// Decompresses everything read from the wrapped source.
pub struct DecodingStream<R, D> {
    source: R,
    engine: D,
    input: TransferBuffer,
    output: TransferBuffer,
    carry: CarryOver,
    status: DecodeStatus,
    source_exhausted: bool,
    /// Set when the adapter itself detected a broken engine.
    failure: Option<String>,
    end_reported: bool,
    totals: StreamTotals,
    observer: Box<dyn StreamObserver + Send>,
}

impl<R: Read, D: DecoderEngine> DecodingStream<R, D> {
    /// Wrap `source` with the default buffer capacity.
    pub fn new(source: R, engine: D) -> Result<Self> {
        Self::with_config(source, engine, StreamConfig::default())
    }

    /// Wrap `source`; only `config.buffer_capacity` is used.
    pub fn with_config(source: R, engine: D, config: StreamConfig) -> Result<Self> {
        config.validate()?;
        let input = TransferBuffer::new(config.buffer_capacity)?;
        let mut output = TransferBuffer::new(config.buffer_capacity)?;
        output.reset_output();

        debug!(capacity = config.buffer_capacity, "decoding stream created");

        Ok(Self {
            source,
            engine,
            input,
            output,
            carry: CarryOver::new(),
            status: DecodeStatus::NeedsMoreInput,
            source_exhausted: false,
            failure: None,
            end_reported: false,
            totals: StreamTotals::default(),
            observer: Box::new(NoopObserver),
        })
    }

    /// Attach a progress observer, replacing the current one.
    pub fn with_observer(mut self, observer: impl StreamObserver + Send + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Always [`Mode::Decode`].
    pub fn mode(&self) -> Mode {
        Mode::Decode
    }

    /// Decoding streams are always readable.
    pub fn can_read(&self) -> bool {
        true
    }

    /// Decoding streams are never writable.
    pub fn can_write(&self) -> bool {
        false
    }

    /// Seeking is never supported.
    pub fn can_seek(&self) -> bool {
        false
    }

    /// Whether the end of the compressed stream has been decoded.
    pub fn is_finished(&self) -> bool {
        self.status == DecodeStatus::Done
    }

    /// Decoded bytes waiting to be read.
    pub fn buffered(&self) -> usize {
        self.carry.unread() + self.output.produced().len()
    }

    /// Compressed bytes consumed and decoded bytes produced so far.
    pub fn totals(&self) -> StreamTotals {
        self.totals
    }

    /// Capacity of each transfer buffer.
    pub fn buffer_capacity(&self) -> usize {
        self.input.capacity()
    }

    /// Reference to the wrapped source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Mutable reference to the wrapped source.
    ///
    /// Reading from it directly will desynchronize the decoder.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.source
    }

    /// Unwrap the source. Compressed bytes already pulled into the adapter are lost.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Decode into `out`, returning the number of bytes written.
    ///
    /// Returns `0` only for an empty `out` or after the stream has ended and
    /// every decoded byte has been handed out.
    pub fn read_bytes(&mut self, out: &mut [u8]) -> Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        self.check_failure()?;
        if self.carry.unread() < out.len() {
            self.pull(out.len())?;
        }
        let served = self.carry.serve_into(out);
        trace!(requested = out.len(), served, "decoder read");
        Ok(served)
    }

    /// Drive the engine until `wanted` bytes are buffered or it cannot go on.
    fn pull(&mut self, wanted: usize) -> Result<()> {
        while self.carry.unread() < wanted && !self.source_exhausted {
            match self.status {
                DecodeStatus::NeedsMoreInput => {
                    self.drain_output();
                    if self.carry.unread() >= wanted {
                        break;
                    }
                    if !self.input.has_input_space() {
                        self.failure =
                            Some("decoder asked for input with a full input buffer".into());
                        self.status = DecodeStatus::Error;
                        break;
                    }
                    let read = self.input.refill_from(&mut self.source)?;
                    if read == 0 {
                        self.source_exhausted = true;
                        break;
                    }
                    self.totals.bytes_in += read as u64;
                    self.observer.on_consumed(read as u64);
                }
                DecodeStatus::NeedsMoreOutput => {
                    self.drain_output();
                    if self.carry.unread() >= wanted {
                        break;
                    }
                }
                DecodeStatus::Done | DecodeStatus::Error => break,
            }

            self.status = self.engine.advance(&mut self.input, &mut self.output);
            if !self.input.check_bounds() || !self.output.check_bounds() {
                self.failure = Some("decoder moved a buffer cursor out of bounds".into());
                self.status = DecodeStatus::Error;
            }
            trace!(
                status = ?self.status,
                pending_in = self.input.available(),
                produced = self.output.produced().len(),
                "decoder step"
            );
        }

        if self.status == DecodeStatus::Done || self.source_exhausted {
            self.drain_output();
        }
        if self.status == DecodeStatus::Done && !self.end_reported {
            self.end_reported = true;
            self.observer.on_finished(self.totals);
            debug!(
                bytes_in = self.totals.bytes_in,
                bytes_out = self.totals.bytes_out,
                "decoding stream finished"
            );
        }
        self.check_failure()
    }

    /// Re-raise a recorded failure.
    fn check_failure(&self) -> Result<()> {
        match self.status {
            DecodeStatus::Error => {
                let message = self
                    .failure
                    .clone()
                    .or_else(|| self.engine.last_error())
                    .unwrap_or_else(|| "invalid compressed data".into());
                Err(StreamError::corrupt(message))
            }
            DecodeStatus::Done => Ok(()),
            _ if self.source_exhausted => Err(StreamError::truncated(self.totals.bytes_in)),
            _ => Ok(()),
        }
    }

    fn drain_output(&mut self) {
        let produced = self.output.produced();
        if produced.is_empty() {
            return;
        }
        self.carry.extend(produced);
        let count = produced.len() as u64;
        self.output.reset_output();
        self.totals.bytes_out += count;
        self.observer.on_produced(count);
    }
}

impl<R: Read, D: DecoderEngine> Read for DecodingStream<R, D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_bytes(buf)?)
    }
}

impl<R: fmt::Debug, D> fmt::Debug for DecodingStream<R, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodingStream")
            .field("source", &self.source)
            .field("capacity", &self.input.capacity())
            .field("status", &self.status)
            .field("buffered", &self.carry.unread())
            .field("totals", &self.totals)
            .finish_non_exhaustive()
    }
}
