//! Codec engine contract.
//!
//! An engine is a stateful unit that moves bytes from an input
//! [`TransferBuffer`] to an output [`TransferBuffer`] by advancing their
//! `(next, available)` cursors. It never blocks, never touches a stream, and
//! may consume or produce any amount per call. Adapters in
//! [`crate::encoder`] and [`crate::decoder`] turn that into `Write`/`Read`.

use crate::buffer::TransferBuffer;
use crate::config::{Quality, WindowBits};
use crate::error::Result;

/// What an encoder call should do with the data it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeOperation {
    /// Compress input, emitting output whenever the engine decides to.
    #[default]
    Process,
    /// Emit everything consumed so far as a decodable prefix.
    Flush,
    /// Emit all pending output and end-of-stream framing. Irreversible.
    Finish,
}

/// Outcome of a decoder call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// The input buffer was drained; feed more compressed bytes.
    NeedsMoreInput,
    /// The output buffer is full; drain it and call again.
    NeedsMoreOutput,
    /// The compressed stream ended.
    Done,
    /// The compressed input is invalid.
    Error,
}

impl DecodeStatus {
    /// Whether no further progress is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// A streaming compressor.
pub trait EncoderEngine {
    /// Set the compression quality.
    ///
    /// Fails with [`StreamError::ParameterLocked`](crate::StreamError::ParameterLocked)
    /// once the engine has consumed input.
    fn set_quality(&mut self, quality: Quality) -> Result<()>;

    /// Set the window size.
    ///
    /// Same locking rule as [`set_quality`](Self::set_quality).
    fn set_window(&mut self, window: WindowBits) -> Result<()>;

    /// Run one step of `op` over the given buffers.
    ///
    /// An `Err` means the engine failed and the stream is unusable.
    fn advance(
        &mut self,
        op: EncodeOperation,
        input: &mut TransferBuffer,
        output: &mut TransferBuffer,
    ) -> Result<()>;

    /// Whether the end-of-stream framing has been emitted and handed out.
    fn is_finished(&self) -> bool;

    /// Whether the engine still holds output it could not hand out.
    fn has_more_output(&self) -> bool;
}

/// A streaming decompressor.
pub trait DecoderEngine {
    /// Run one step over the given buffers.
    fn advance(&mut self, input: &mut TransferBuffer, output: &mut TransferBuffer)
    -> DecodeStatus;

    /// Whether the end of the compressed stream has been reached.
    fn is_finished(&self) -> bool;

    /// Description of the last failure, if the engine keeps one.
    fn last_error(&self) -> Option<String> {
        None
    }
}

impl<E: EncoderEngine + ?Sized> EncoderEngine for Box<E> {
    fn set_quality(&mut self, quality: Quality) -> Result<()> {
        (**self).set_quality(quality)
    }

    fn set_window(&mut self, window: WindowBits) -> Result<()> {
        (**self).set_window(window)
    }

    fn advance(
        &mut self,
        op: EncodeOperation,
        input: &mut TransferBuffer,
        output: &mut TransferBuffer,
    ) -> Result<()> {
        (**self).advance(op, input, output)
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn has_more_output(&self) -> bool {
        (**self).has_more_output()
    }
}

impl<D: DecoderEngine + ?Sized> DecoderEngine for Box<D> {
    fn advance(
        &mut self,
        input: &mut TransferBuffer,
        output: &mut TransferBuffer,
    ) -> DecodeStatus {
        (**self).advance(input, output)
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn last_error(&self) -> Option<String> {
        (**self).last_error()
    }
}
