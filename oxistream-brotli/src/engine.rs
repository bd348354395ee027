//! Brotli engines over the `brotli` crate's streaming state machines.

use std::fmt;

use brotli::enc::encode::{
    BrotliEncoderDestroyInstance, BrotliEncoderOperation, BrotliEncoderParameter,
    BrotliEncoderStateStruct,
};
use brotli::enc::{StandardAlloc, interface};
use brotli::{BrotliDecompressStream, BrotliResult, BrotliState};
use oxistream_core::buffer::TransferBuffer;
use oxistream_core::config::{Quality, WindowBits};
use oxistream_core::error::{Result, StreamError};
use oxistream_core::traits::{DecodeStatus, DecoderEngine, EncodeOperation, EncoderEngine};
use tracing::trace;

/// Brotli compressor state.
///
/// Parameters can only be changed before the first call to
/// [`advance`](EncoderEngine::advance).
pub struct BrotliEncoderEngine {
    state: BrotliEncoderStateStruct<StandardAlloc>,
    started: bool,
}

impl BrotliEncoderEngine {
    /// Create an encoder with the default quality and window.
    pub fn new() -> Self {
        Self {
            state: BrotliEncoderStateStruct::new(StandardAlloc::default()),
            started: false,
        }
    }

    /// Create an encoder with explicit parameters.
    pub fn with_params(quality: Quality, window: WindowBits) -> Result<Self> {
        let mut engine = Self::new();
        engine.set_quality(quality)?;
        engine.set_window(window)?;
        Ok(engine)
    }

    fn set(&mut self, name: &'static str, param: BrotliEncoderParameter, value: u32) -> Result<()> {
        if self.started {
            return Err(StreamError::parameter_locked(name));
        }
        if !self.state.set_parameter(param, value) {
            return Err(StreamError::codec_failure(format!(
                "brotli encoder rejected {name} = {value}"
            )));
        }
        Ok(())
    }
}

impl Default for BrotliEncoderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderEngine for BrotliEncoderEngine {
    fn set_quality(&mut self, quality: Quality) -> Result<()> {
        self.set(
            "quality",
            BrotliEncoderParameter::BROTLI_PARAM_QUALITY,
            quality.get(),
        )
    }

    fn set_window(&mut self, window: WindowBits) -> Result<()> {
        self.set(
            "window",
            BrotliEncoderParameter::BROTLI_PARAM_LGWIN,
            window.get(),
        )
    }

    fn advance(
        &mut self,
        op: EncodeOperation,
        input: &mut TransferBuffer,
        output: &mut TransferBuffer,
    ) -> Result<()> {
        let operation = match op {
            EncodeOperation::Process => BrotliEncoderOperation::BROTLI_OPERATION_PROCESS,
            EncodeOperation::Flush => BrotliEncoderOperation::BROTLI_OPERATION_FLUSH,
            EncodeOperation::Finish => BrotliEncoderOperation::BROTLI_OPERATION_FINISH,
        };
        self.started = true;

        let (in_data, in_next, in_available) = input.input_cursor();
        let (out_data, out_next, out_available) = output.output_cursor();
        let mut total_out = None;
        let mut nop_callback =
            |_data: &mut interface::PredictionModeContextMap<interface::InputReferenceMut>,
             _cmds: &mut [interface::StaticCommand],
             _mb: interface::InputPair,
             _alloc: &mut StandardAlloc| ();

        let ok = self.state.compress_stream(
            operation,
            in_available,
            in_data,
            in_next,
            out_available,
            out_data,
            out_next,
            &mut total_out,
            &mut nop_callback,
        );
        if !ok {
            return Err(StreamError::codec_failure(format!(
                "brotli encoder rejected {op:?}"
            )));
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    fn has_more_output(&self) -> bool {
        self.state.has_more_output()
    }
}

impl Drop for BrotliEncoderEngine {
    fn drop(&mut self) {
        BrotliEncoderDestroyInstance(&mut self.state);
    }
}

impl fmt::Debug for BrotliEncoderEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrotliEncoderEngine")
            .field("started", &self.started)
            .field("finished", &self.state.is_finished())
            .finish_non_exhaustive()
    }
}

/// Brotli decompressor state.
pub struct BrotliDecoderEngine {
    state: BrotliState<StandardAlloc, StandardAlloc, StandardAlloc>,
    total_out: usize,
    status: Option<DecodeStatus>,
}

impl BrotliDecoderEngine {
    /// Create a decoder.
    pub fn new() -> Self {
        Self {
            state: BrotliState::new(
                StandardAlloc::default(),
                StandardAlloc::default(),
                StandardAlloc::default(),
            ),
            total_out: 0,
            status: None,
        }
    }

    /// Decoded bytes produced over the engine's lifetime.
    pub fn total_out(&self) -> usize {
        self.total_out
    }
}

impl Default for BrotliDecoderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderEngine for BrotliDecoderEngine {
    fn advance(
        &mut self,
        input: &mut TransferBuffer,
        output: &mut TransferBuffer,
    ) -> DecodeStatus {
        let (in_data, in_next, in_available) = input.input_cursor();
        let (out_data, out_next, out_available) = output.output_cursor();

        let result = BrotliDecompressStream(
            in_available,
            in_next,
            in_data,
            out_available,
            out_next,
            out_data,
            &mut self.total_out,
            &mut self.state,
        );
        let status = match result {
            BrotliResult::ResultSuccess => DecodeStatus::Done,
            BrotliResult::NeedsMoreInput => DecodeStatus::NeedsMoreInput,
            BrotliResult::NeedsMoreOutput => DecodeStatus::NeedsMoreOutput,
            BrotliResult::ResultFailure => {
                trace!(code = ?self.state.error_code, "brotli decoder failure");
                DecodeStatus::Error
            }
        };
        self.status = Some(status);
        status
    }

    fn is_finished(&self) -> bool {
        self.status == Some(DecodeStatus::Done)
    }

    fn last_error(&self) -> Option<String> {
        match self.status {
            Some(DecodeStatus::Error) => Some(format!(
                "brotli decoder error {:?}",
                self.state.error_code
            )),
            _ => None,
        }
    }
}

impl fmt::Debug for BrotliDecoderEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrotliDecoderEngine")
            .field("total_out", &self.total_out)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_all(engine: &mut BrotliEncoderEngine, data: &[u8]) -> Vec<u8> {
        let mut input = TransferBuffer::new(data.len().max(1)).unwrap();
        let mut output = TransferBuffer::new(1024).unwrap();
        input.fill_from_slice(data);
        let mut compressed = Vec::new();

        while !engine.is_finished() {
            output.reset_output();
            engine
                .advance(EncodeOperation::Finish, &mut input, &mut output)
                .unwrap();
            compressed.extend_from_slice(output.produced());
        }
        compressed
    }

    fn decode_all(data: &[u8]) -> (Vec<u8>, DecodeStatus) {
        let mut engine = BrotliDecoderEngine::new();
        let mut input = TransferBuffer::new(data.len().max(1)).unwrap();
        let mut output = TransferBuffer::new(1024).unwrap();
        input.fill_from_slice(data);
        let mut decoded = Vec::new();

        loop {
            output.reset_output();
            let status = engine.advance(&mut input, &mut output);
            decoded.extend_from_slice(output.produced());
            if status != DecodeStatus::NeedsMoreOutput {
                return (decoded, status);
            }
        }
    }

    #[test]
    fn test_engine_round_trip() {
        let data = b"Hello, Brotli! Hello, Brotli! Hello, Brotli!".repeat(50);
        let mut encoder = BrotliEncoderEngine::new();
        let compressed = encode_all(&mut encoder, &data);
        assert!(compressed.len() < data.len());

        let (decoded, status) = decode_all(&compressed);
        assert_eq!(status, DecodeStatus::Done);
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_parameters_locked_after_first_call() {
        let mut encoder =
            BrotliEncoderEngine::with_params(Quality::BEST, WindowBits::new(16).unwrap()).unwrap();
        let _ = encode_all(&mut encoder, b"abc");
        assert!(matches!(
            encoder.set_quality(Quality::FASTEST),
            Err(StreamError::ParameterLocked { name: "quality" })
        ));
        assert!(matches!(
            encoder.set_window(WindowBits::DEFAULT),
            Err(StreamError::ParameterLocked { name: "window" })
        ));
    }

    #[test]
    fn test_backend_rejection_is_codec_failure() {
        let mut encoder = BrotliEncoderEngine::new();
        let _ = encode_all(&mut encoder, b"abc");
        // The backend still refuses once its state is initialized.
        encoder.started = false;
        match encoder.set_quality(Quality::FASTEST) {
            Err(StreamError::CodecFailure { message }) => {
                assert!(message.contains("quality"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_truncated_input_needs_more() {
        let mut encoder = BrotliEncoderEngine::new();
        let compressed = encode_all(&mut encoder, &b"truncate me please ".repeat(100));
        let (_, status) = decode_all(&compressed[..compressed.len() / 2]);
        assert_eq!(status, DecodeStatus::NeedsMoreInput);
    }

    #[test]
    fn test_garbage_is_error() {
        let mut engine = BrotliDecoderEngine::new();
        let mut input = TransferBuffer::new(16).unwrap();
        let mut output = TransferBuffer::new(16).unwrap();
        // Window 16, not last, metadata block with the reserved bit set.
        input.fill_from_slice(&[0x1c; 16]);
        output.reset_output();
        let status = engine.advance(&mut input, &mut output);
        assert_eq!(status, DecodeStatus::Error);
        assert!(engine.last_error().unwrap().starts_with("brotli decoder error"));
        assert!(!engine.is_finished());
    }
}
