//! Stream configuration: compression quality, window size and buffer sizing.
//!
//! Values are validated when they are built, so an engine never sees an
//! out-of-range parameter.

use crate::error::{Result, StreamError};

/// Default capacity of each transfer buffer (64 KiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Compression quality, `0..=11`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    /// Smallest accepted quality.
    pub const MIN: u32 = 0;
    /// Largest accepted quality.
    pub const MAX: u32 = 11;
    /// Fastest setting.
    pub const FASTEST: Self = Self(0);
    /// Default setting.
    pub const DEFAULT: Self = Self(5);
    /// Densest setting.
    pub const BEST: Self = Self(11);

    /// Validate a raw quality value.
    pub fn new(value: u32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(StreamError::invalid_parameter(
                "quality",
                u64::from(value),
                u64::from(Self::MIN),
                u64::from(Self::MAX),
            ))
        }
    }

    /// Get the quality value.
    pub fn get(self) -> u32 {
        u32::from(self.0)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Quality {
    type Error = StreamError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

/// Base-2 logarithm of the sliding window size, `10..=24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowBits(u8);

impl WindowBits {
    /// Smallest accepted window.
    pub const MIN: u32 = 10;
    /// Largest accepted window.
    pub const MAX: u32 = 24;
    /// Default window (4 MiB).
    pub const DEFAULT: Self = Self(22);

    /// Validate a raw window value.
    pub fn new(value: u32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(StreamError::invalid_parameter(
                "window",
                u64::from(value),
                u64::from(Self::MIN),
                u64::from(Self::MAX),
            ))
        }
    }

    /// Get the window value.
    pub fn get(self) -> u32 {
        u32::from(self.0)
    }

    /// Window size in bytes.
    pub fn window_size(self) -> usize {
        1usize << self.0
    }
}

impl Default for WindowBits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for WindowBits {
    type Error = StreamError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

/// Settings an adapter is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Encoder quality. Ignored in decode mode.
    pub quality: Quality,
    /// Encoder window. Ignored in decode mode.
    pub window: WindowBits,
    /// Capacity of each of the two transfer buffers.
    pub buffer_capacity: usize,
}

impl StreamConfig {
    /// Create a configuration with the default settings.
    pub fn new() -> Self {
        Self {
            quality: Quality::DEFAULT,
            window: WindowBits::DEFAULT,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Set the quality.
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Set the window.
    pub fn with_window(mut self, window: WindowBits) -> Self {
        self.window = window;
        self
    }

    /// Set the transfer buffer capacity.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Check the fields that are not validated by their own types.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(StreamError::invalid_parameter(
                "buffer capacity",
                0,
                1,
                usize::MAX as u64,
            ));
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new()
    }
}
