//! Deterministic in-memory engines for exercising adapters without a real codec.
//!
//! [`ScriptedEncoder`] stores input verbatim in length-prefixed blocks and
//! [`ScriptedDecoder`] reads them back. The framing is:
//!
//! ```text
//! data block:  0x00 len_lo len_hi <len bytes>
//! final block: 0x01 0x00 0x00
//! ```
//!
//! The encoder only emits a data block once [`BLOCK_SIZE`] bytes have
//! accumulated or on `Flush`/`Finish`, so its output does not depend on how
//! the input was split across calls. Both engines can be told to move at
//! most `n` bytes per call, which is how tests provoke partial progress.
//!
//! Compiled for this crate's own tests and with the `testing` feature.

use std::collections::VecDeque;

use crate::buffer::TransferBuffer;
use crate::config::{Quality, WindowBits};
use crate::error::{Result, StreamError};
use crate::traits::{DecodeStatus, DecoderEngine, EncodeOperation, EncoderEngine};

/// Payload bytes per data block.
pub const BLOCK_SIZE: usize = 64;

const TAG_DATA: u8 = 0x00;
const TAG_FINAL: u8 = 0x01;

/// Encoder half of the scripted codec.
#[derive(Debug)]
pub struct ScriptedEncoder {
    block: Vec<u8>,
    queued: VecDeque<u8>,
    step_limit: usize,
    fail_after: Option<u64>,
    consumed: u64,
    final_queued: bool,
}

impl ScriptedEncoder {
    /// Encoder with no per-call limit.
    pub fn new() -> Self {
        Self {
            block: Vec::with_capacity(BLOCK_SIZE),
            queued: VecDeque::new(),
            step_limit: usize::MAX,
            fail_after: None,
            consumed: 0,
            final_queued: false,
        }
    }

    /// Encoder that consumes and produces at most `limit` bytes per call.
    pub fn with_step_limit(limit: usize) -> Self {
        Self {
            step_limit: limit.max(1),
            ..Self::new()
        }
    }

    /// Encoder whose calls fail once `count` bytes have been consumed.
    pub fn failing_after(count: u64) -> Self {
        Self {
            fail_after: Some(count),
            ..Self::new()
        }
    }

    fn seal_block(&mut self) {
        if self.block.is_empty() {
            return;
        }
        let len = self.block.len() as u16;
        self.queued.push_back(TAG_DATA);
        self.queued.extend(len.to_le_bytes());
        self.queued.extend(self.block.drain(..));
    }

    fn consume(&mut self, input: &mut TransferBuffer) {
        let (data, next, available) = input.input_cursor();
        let mut budget = (*available).min(self.step_limit);
        while budget > 0 {
            let take = budget.min(BLOCK_SIZE - self.block.len());
            self.block.extend_from_slice(&data[*next..*next + take]);
            *next += take;
            *available -= take;
            budget -= take;
            self.consumed += take as u64;
            if self.block.len() == BLOCK_SIZE {
                self.seal_block();
            }
        }
    }

    fn emit(&mut self, output: &mut TransferBuffer) {
        let (data, next, available) = output.output_cursor();
        let count = (*available).min(self.queued.len()).min(self.step_limit);
        for (slot, byte) in data[*next..*next + count]
            .iter_mut()
            .zip(self.queued.drain(..count))
        {
            *slot = byte;
        }
        *next += count;
        *available -= count;
    }
}

impl Default for ScriptedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderEngine for ScriptedEncoder {
    fn set_quality(&mut self, _quality: Quality) -> Result<()> {
        if self.consumed > 0 {
            return Err(StreamError::parameter_locked("quality"));
        }
        Ok(())
    }

    fn set_window(&mut self, _window: WindowBits) -> Result<()> {
        if self.consumed > 0 {
            return Err(StreamError::parameter_locked("window"));
        }
        Ok(())
    }

    fn advance(
        &mut self,
        op: EncodeOperation,
        input: &mut TransferBuffer,
        output: &mut TransferBuffer,
    ) -> Result<()> {
        if self.fail_after.is_some_and(|limit| self.consumed >= limit) {
            return Err(StreamError::codec_failure("scripted encoder failure"));
        }
        if self.final_queued {
            self.emit(output);
            return Ok(());
        }

        self.consume(input);
        if input.available() == 0 {
            match op {
                EncodeOperation::Process => {}
                EncodeOperation::Flush => self.seal_block(),
                EncodeOperation::Finish => {
                    self.seal_block();
                    self.queued.extend([TAG_FINAL, 0, 0]);
                    self.final_queued = true;
                }
            }
        }
        self.emit(output);
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.final_queued && self.queued.is_empty()
    }

    fn has_more_output(&self) -> bool {
        !self.queued.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DecodeState {
    Header { bytes: [u8; 3], have: usize },
    Body { remaining: usize },
    Done,
    Failed(String),
}

/// Decoder half of the scripted codec.
#[derive(Debug)]
pub struct ScriptedDecoder {
    state: DecodeState,
    step_limit: usize,
}

impl ScriptedDecoder {
    /// Decoder with no per-call limit.
    pub fn new() -> Self {
        Self {
            state: DecodeState::Header {
                bytes: [0; 3],
                have: 0,
            },
            step_limit: usize::MAX,
        }
    }

    /// Decoder that emits at most `limit` payload bytes per call.
    pub fn with_step_limit(limit: usize) -> Self {
        Self {
            step_limit: limit.max(1),
            ..Self::new()
        }
    }

    fn header_complete(&mut self, bytes: [u8; 3]) {
        let len = usize::from(u16::from_le_bytes([bytes[1], bytes[2]]));
        self.state = match bytes[0] {
            TAG_DATA if len == 0 => DecodeState::Header {
                bytes: [0; 3],
                have: 0,
            },
            TAG_DATA => DecodeState::Body { remaining: len },
            TAG_FINAL if len == 0 => DecodeState::Done,
            TAG_FINAL => DecodeState::Failed(format!("final block carries {len} bytes")),
            tag => DecodeState::Failed(format!("unknown block tag {tag:#04x}")),
        };
    }
}

impl Default for ScriptedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderEngine for ScriptedDecoder {
    fn advance(
        &mut self,
        input: &mut TransferBuffer,
        output: &mut TransferBuffer,
    ) -> DecodeStatus {
        let mut budget = self.step_limit;
        loop {
            match &mut self.state {
                DecodeState::Done => return DecodeStatus::Done,
                DecodeState::Failed(_) => return DecodeStatus::Error,
                DecodeState::Header { bytes, have } => {
                    let (data, next, available) = input.input_cursor();
                    if *available == 0 {
                        return DecodeStatus::NeedsMoreInput;
                    }
                    bytes[*have] = data[*next];
                    *have += 1;
                    *next += 1;
                    *available -= 1;
                    if *have == 3 {
                        let bytes = *bytes;
                        self.header_complete(bytes);
                    }
                }
                DecodeState::Body { remaining } => {
                    if *remaining == 0 {
                        self.state = DecodeState::Header {
                            bytes: [0; 3],
                            have: 0,
                        };
                        continue;
                    }
                    if output.available() == 0 || budget == 0 {
                        return DecodeStatus::NeedsMoreOutput;
                    }
                    if input.available() == 0 {
                        return DecodeStatus::NeedsMoreInput;
                    }
                    let count = (*remaining)
                        .min(input.available())
                        .min(output.available())
                        .min(budget);
                    let (src, in_next, in_available) = input.input_cursor();
                    let (dst, out_next, out_available) = output.output_cursor();
                    dst[*out_next..*out_next + count]
                        .copy_from_slice(&src[*in_next..*in_next + count]);
                    *in_next += count;
                    *in_available -= count;
                    *out_next += count;
                    *out_available -= count;
                    *remaining -= count;
                    budget -= count;
                }
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.state == DecodeState::Done
    }

    fn last_error(&self) -> Option<String> {
        match &self.state {
            DecodeState::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }
}

/// Frame `data` the way [`ScriptedEncoder`] does after a single write and finish.
pub fn encode_scripted(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / BLOCK_SIZE * 3 + 6);
    for block in data.chunks(BLOCK_SIZE) {
        out.push(TAG_DATA);
        out.extend((block.len() as u16).to_le_bytes());
        out.extend_from_slice(block);
    }
    out.extend([TAG_FINAL, 0, 0]);
    out
}

/// Decode a complete scripted stream in one pass.
pub fn decode_scripted(encoded: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ScriptedDecoder::new();
    let mut input = TransferBuffer::new(encoded.len().max(1))?;
    input.fill_from_slice(encoded);
    let mut output = TransferBuffer::new(BLOCK_SIZE)?;
    let mut decoded = Vec::new();

    loop {
        output.reset_output();
        let status = decoder.advance(&mut input, &mut output);
        decoded.extend_from_slice(output.produced());
        match status {
            DecodeStatus::Done => return Ok(decoded),
            DecodeStatus::NeedsMoreOutput => {}
            DecodeStatus::NeedsMoreInput => {
                return Err(StreamError::truncated(encoded.len() as u64));
            }
            DecodeStatus::Error => {
                return Err(StreamError::corrupt(
                    decoder.last_error().unwrap_or_default(),
                ));
            }
        }
    }
}
