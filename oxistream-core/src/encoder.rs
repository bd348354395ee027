//! Encoding adapter: `Write` in plain bytes, compressed bytes out to a sink.
//!
//! Writes are cut into slices no larger than the input buffer. Each slice is
//! fed to the engine with [`EncodeOperation::Process`] until it is fully
//! consumed, and whatever the engine produced is written to the sink right
//! after every call, so at most one output buffer of compressed data is ever
//! held in memory.
//!
//! The stream must be finished to emit end-of-stream framing. That happens
//! in [`EncodingStream::finish`], [`EncodingStream::close`], or, as a last
//! resort, when the adapter is dropped. Errors during drop are logged and
//! discarded.

use std::fmt;
use std::io::{self, Write};

use tracing::{debug, trace, warn};

use crate::buffer::TransferBuffer;
use crate::config::{Quality, StreamConfig, WindowBits};
use crate::error::{Mode, Result, StreamError};
use crate::observer::{NoopObserver, StreamObserver, StreamTotals};
use crate::traits::{EncodeOperation, EncoderEngine};

/// Compresses everything written to it into the wrapped sink.
pub struct EncodingStream<W: Write, E: EncoderEngine> {
    sink: Option<W>,
    engine: E,
    input: TransferBuffer,
    output: TransferBuffer,
    totals: StreamTotals,
    observer: Box<dyn StreamObserver + Send>,
    /// Set once `Finish` has completed; further writes are rejected.
    finished: bool,
}

impl<W: Write, E: EncoderEngine> EncodingStream<W, E> {
    /// Wrap `sink` with the default configuration.
    pub fn new(sink: W, engine: E) -> Result<Self> {
        Self::with_config(sink, engine, StreamConfig::default())
    }

    /// Wrap `sink` using `config` for the engine parameters and buffer size.
    pub fn with_config(sink: W, mut engine: E, config: StreamConfig) -> Result<Self> {
        config.validate()?;
        engine.set_quality(config.quality)?;
        engine.set_window(config.window)?;

        let input = TransferBuffer::new(config.buffer_capacity)?;
        let mut output = TransferBuffer::new(config.buffer_capacity)?;
        output.reset_output();

        debug!(
            quality = config.quality.get(),
            window = config.window.get(),
            capacity = config.buffer_capacity,
            "encoding stream created"
        );

        Ok(Self {
            sink: Some(sink),
            engine,
            input,
            output,
            totals: StreamTotals::default(),
            observer: Box::new(NoopObserver),
            finished: false,
        })
    }

    /// Attach a progress observer, replacing the current one.
    pub fn with_observer(mut self, observer: impl StreamObserver + Send + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Change the quality. Only allowed before the first byte is written.
    pub fn set_quality(&mut self, quality: u32) -> Result<()> {
        let quality = Quality::new(quality)?;
        if self.totals.bytes_in > 0 {
            return Err(StreamError::parameter_locked("quality"));
        }
        self.engine.set_quality(quality)
    }

    /// Change the window. Only allowed before the first byte is written.
    pub fn set_window(&mut self, window: u32) -> Result<()> {
        let window = WindowBits::new(window)?;
        if self.totals.bytes_in > 0 {
            return Err(StreamError::parameter_locked("window"));
        }
        self.engine.set_window(window)
    }

    /// Always [`Mode::Encode`].
    pub fn mode(&self) -> Mode {
        Mode::Encode
    }

    /// Encoding streams are never readable.
    pub fn can_read(&self) -> bool {
        false
    }

    /// Whether more data may still be written.
    pub fn can_write(&self) -> bool {
        !self.finished
    }

    /// Seeking is never supported.
    pub fn can_seek(&self) -> bool {
        false
    }

    /// Whether the final block has been emitted.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Bytes written in and compressed bytes emitted so far.
    pub fn totals(&self) -> StreamTotals {
        self.totals
    }

    /// Capacity of each transfer buffer.
    pub fn buffer_capacity(&self) -> usize {
        self.input.capacity()
    }

    /// Reference to the wrapped sink.
    pub fn get_ref(&self) -> &W {
        self.sink
            .as_ref()
            .expect("sink is present until the stream is consumed")
    }

    /// Mutable reference to the wrapped sink.
    ///
    /// Writing to the sink directly will corrupt the compressed stream.
    pub fn get_mut(&mut self) -> &mut W {
        self.sink
            .as_mut()
            .expect("sink is present until the stream is consumed")
    }

    /// Compress all of `buf`, returning how many bytes the engine accepted.
    ///
    /// This is `buf.len()` unless the engine declared itself finished part
    /// way through.
    pub fn write_bytes(&mut self, buf: &[u8]) -> Result<usize> {
        if self.finished {
            return Err(StreamError::StreamFinished);
        }

        let mut accepted = 0;
        for slice in buf.chunks(self.input.capacity()) {
            self.input.fill_from_slice(slice);
            self.totals.bytes_in += slice.len() as u64;
            self.observer.on_consumed(slice.len() as u64);

            while self.input.available() > 0 {
                if !self.step(EncodeOperation::Process)? {
                    return Err(StreamError::codec_failure(
                        "encoder made no progress on pending input",
                    ));
                }
            }
            accepted += slice.len();

            if self.engine.is_finished() {
                break;
            }
        }
        Ok(accepted)
    }

    /// Force the engine to emit a decodable prefix of everything written so far.
    ///
    /// Does not flush the sink; [`Write::flush`] does both. A no-op once the
    /// stream is finished.
    pub fn flush_encoder(&mut self) -> Result<()> {
        self.drive(EncodeOperation::Flush)
    }

    /// Emit the final block and flush the sink. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.drive(EncodeOperation::Finish)?;
        self.finished = true;
        self.observer.on_finished(self.totals);
        debug!(
            bytes_in = self.totals.bytes_in,
            bytes_out = self.totals.bytes_out,
            "encoding stream finished"
        );

        let sink = self.sink.as_mut().ok_or(StreamError::StreamFinished)?;
        sink.flush()?;
        Ok(())
    }

    /// Finish the stream and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.close()?;
        self.sink.take().ok_or(StreamError::StreamFinished)
    }

    /// Run `op` until the engine is finished or a call makes no progress.
    ///
    /// A `Flush` right after another flush is legitimately a no-op, so the
    /// no-progress check is what ends the loop in that case.
    fn drive(&mut self, op: EncodeOperation) -> Result<()> {
        if self.engine.is_finished() {
            return Ok(());
        }
        loop {
            let progressed = self.step(op)?;
            if self.engine.is_finished() {
                return Ok(());
            }
            if !progressed {
                if self.engine.has_more_output() {
                    return Err(StreamError::codec_failure(
                        "encoder holds output but produced none",
                    ));
                }
                break;
            }
        }
        if op == EncodeOperation::Finish {
            return Err(StreamError::codec_failure(
                "encoder stalled before finishing the stream",
            ));
        }
        Ok(())
    }

    /// One engine call followed by a drain. Returns whether anything moved.
    fn step(&mut self, op: EncodeOperation) -> Result<bool> {
        let before = self.input.available();
        self.engine.advance(op, &mut self.input, &mut self.output)?;
        if !self.input.check_bounds() || !self.output.check_bounds() {
            return Err(StreamError::codec_failure(
                "encoder moved a buffer cursor out of bounds",
            ));
        }
        let consumed = before.saturating_sub(self.input.available());
        let produced = self.drain_output()?;
        trace!(?op, consumed, produced, "encoder step");
        Ok(consumed > 0 || produced > 0)
    }

    fn drain_output(&mut self) -> Result<usize> {
        if !self.output.has_produced() {
            return Ok(0);
        }
        let sink = self.sink.as_mut().ok_or(StreamError::StreamFinished)?;
        let bytes = self.output.produced();
        sink.write_all(bytes)?;
        let produced = bytes.len();
        self.output.reset_output();

        self.totals.bytes_out += produced as u64;
        self.observer.on_produced(produced as u64);
        Ok(produced)
    }
}

impl<W: Write, E: EncoderEngine> Write for EncodingStream<W, E> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_bytes(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_encoder()?;
        match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write, E: EncoderEngine> Drop for EncodingStream<W, E> {
    fn drop(&mut self) {
        if self.sink.is_some() && !self.finished {
            if let Err(err) = self.close() {
                warn!(error = %err, "failed to finish encoding stream on drop");
            }
        }
    }
}

impl<W: Write + fmt::Debug, E: EncoderEngine> fmt::Debug for EncodingStream<W, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodingStream")
            .field("sink", &self.sink)
            .field("capacity", &self.input.capacity())
            .field("totals", &self.totals)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedEncoder, decode_scripted};

    fn small_config(capacity: usize) -> StreamConfig {
        StreamConfig::new().with_buffer_capacity(capacity)
    }

    #[test]
    fn test_write_and_finish_round_trip() {
        let mut stream = EncodingStream::new(Vec::new(), ScriptedEncoder::new()).unwrap();
        stream.write_all(b"hello scripted engine").unwrap();
        let compressed = stream.finish().unwrap();
        assert_eq!(decode_scripted(&compressed).unwrap(), b"hello scripted engine");
    }

    #[test]
    fn test_large_write_is_sliced_to_capacity() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();

        let mut whole = EncodingStream::with_config(
            Vec::new(),
            ScriptedEncoder::with_step_limit(7),
            small_config(16),
        )
        .unwrap();
        whole.write_all(&data).unwrap();
        let whole = whole.finish().unwrap();

        let mut pieces = EncodingStream::with_config(
            Vec::new(),
            ScriptedEncoder::with_step_limit(7),
            small_config(16),
        )
        .unwrap();
        for chunk in data.chunks(16) {
            pieces.write_all(chunk).unwrap();
        }
        let pieces = pieces.finish().unwrap();

        assert_eq!(whole, pieces);
        assert_eq!(decode_scripted(&whole).unwrap(), data);
    }

    #[test]
    fn test_flush_twice_adds_nothing() {
        let mut stream = EncodingStream::with_config(
            Vec::new(),
            ScriptedEncoder::new(),
            small_config(32),
        )
        .unwrap();
        stream.write_all(b"some data to flush").unwrap();
        stream.flush().unwrap();
        let after_first = stream.get_ref().len();
        assert!(after_first > 0);
        stream.flush().unwrap();
        assert_eq!(stream.get_ref().len(), after_first);
    }

    #[test]
    fn test_write_after_finish_rejected() {
        let mut stream = EncodingStream::new(Vec::new(), ScriptedEncoder::new()).unwrap();
        stream.close().unwrap();
        assert!(stream.is_finished());
        assert!(!stream.can_write());
        assert!(matches!(
            stream.write_bytes(b"late"),
            Err(StreamError::StreamFinished)
        ));
        // Flushing and closing again are harmless.
        let len = stream.get_ref().len();
        stream.flush().unwrap();
        stream.close().unwrap();
        assert_eq!(stream.get_ref().len(), len);
    }

    #[test]
    fn test_drop_finishes_stream() {
        let mut sink = Vec::new();
        {
            let mut stream = EncodingStream::new(&mut sink, ScriptedEncoder::new()).unwrap();
            stream.write_all(b"dropped without finish").unwrap();
        }
        assert_eq!(decode_scripted(&sink).unwrap(), b"dropped without finish");
    }

    #[test]
    fn test_parameters_locked_after_first_write() {
        let mut stream = EncodingStream::new(Vec::new(), ScriptedEncoder::new()).unwrap();
        stream.set_quality(11).unwrap();
        stream.set_window(10).unwrap();
        assert!(matches!(
            stream.set_quality(12),
            Err(StreamError::InvalidParameter { .. })
        ));
        assert!(matches!(
            stream.set_window(9),
            Err(StreamError::InvalidParameter { .. })
        ));

        stream.write_all(b"x").unwrap();
        assert!(matches!(
            stream.set_quality(3),
            Err(StreamError::ParameterLocked { name: "quality" })
        ));
        assert!(matches!(
            stream.set_window(20),
            Err(StreamError::ParameterLocked { name: "window" })
        ));
    }

    #[test]
    fn test_engine_failure_is_codec_failure() {
        let mut stream = EncodingStream::with_config(
            Vec::new(),
            ScriptedEncoder::failing_after(4),
            small_config(8),
        )
        .unwrap();
        let err = stream.write_bytes(b"0123456789").unwrap_err();
        assert!(matches!(err, StreamError::CodecFailure { .. }));

        let io_err = stream.write(b"more").unwrap_err();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn test_capability_flags() {
        let stream = EncodingStream::new(Vec::new(), ScriptedEncoder::new()).unwrap();
        assert_eq!(stream.mode(), Mode::Encode);
        assert!(!stream.can_read());
        assert!(stream.can_write());
        assert!(!stream.can_seek());
    }

    #[test]
    fn test_observer_sees_both_directions() {
        let counters = crate::observer::StreamCounters::new();
        let mut stream = EncodingStream::new(Vec::new(), ScriptedEncoder::new())
            .unwrap()
            .with_observer(counters.clone());
        stream.write_all(&[7u8; 100]).unwrap();
        stream.close().unwrap();
        let totals = stream.totals();
        assert_eq!(counters.consumed(), 100);
        assert_eq!(counters.produced(), totals.bytes_out);
        assert_eq!(counters.finished(), 1);
    }

    #[test]
    fn test_empty_write_is_accepted() {
        let mut stream = EncodingStream::new(Vec::new(), ScriptedEncoder::new()).unwrap();
        assert_eq!(stream.write_bytes(&[]).unwrap(), 0);
        let compressed = stream.finish().unwrap();
        assert!(decode_scripted(&compressed).unwrap().is_empty());
    }
}
