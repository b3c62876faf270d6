//! Device variant selection and the decoding contract.
//!
//! Each supported watch decodes the same two buffers (`.OMH` header and
//! `.OMD` body) into the same types. [`Codec`] is that two-operation
//! contract; [`Variant`] picks the implementation for a device.

use crate::header::{decode_base_header, decode_heart_rate_header};
use crate::track::{decode_fixed_stride_track, decode_sentinel_track};
use crate::types::{Session, SessionId, SessionSummary, Track};
use chrono::NaiveDateTime;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while decoding session buffers.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Header too short: {len} bytes, expected {required}")]
    HeaderTooShort { len: usize, required: usize },

    #[error("Invalid start time in header: year {year} month {month} day {day} {hour}:{minute}")]
    InvalidStartTime {
        year: u8,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
    },

    #[error("Unknown device variant: {0}. Use onmove500 or onmove500hr")]
    UnknownVariant(String),
}

/// Decoding of one device variant's header and body layouts.
pub trait Codec {
    /// Decodes a fixed-length `.OMH` header.
    fn decode_header(&self, bytes: &[u8]) -> Result<SessionSummary, DecodeError>;

    /// Decodes an `.OMD` body. Point timestamps are offsets from `start`.
    fn decode_track(&self, bytes: &[u8], start: NaiveDateTime) -> Track;
}

/// OnMove 500: 60-byte strides of up to two points.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedStrideCodec;

impl Codec for FixedStrideCodec {
    fn decode_header(&self, bytes: &[u8]) -> Result<SessionSummary, DecodeError> {
        decode_base_header(bytes)
    }

    fn decode_track(&self, bytes: &[u8], start: NaiveDateTime) -> Track {
        decode_fixed_stride_track(bytes, start)
    }
}

/// OnMove 500 HR: sentinel-delimited groups of 20-byte lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentinelCodec;

impl Codec for SentinelCodec {
    fn decode_header(&self, bytes: &[u8]) -> Result<SessionSummary, DecodeError> {
        decode_heart_rate_header(bytes)
    }

    fn decode_track(&self, bytes: &[u8], start: NaiveDateTime) -> Track {
        decode_sentinel_track(bytes, start)
    }
}

/// Supported device variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// OnMove 500
    #[default]
    Base,
    /// OnMove 500 HR
    HeartRate,
}

impl Variant {
    /// Returns the codec for this variant.
    pub fn codec(self) -> &'static dyn Codec {
        match self {
            Self::Base => &FixedStrideCodec,
            Self::HeartRate => &SentinelCodec,
        }
    }

    /// Decodes a header with this variant's layout.
    pub fn decode_header(self, bytes: &[u8]) -> Result<SessionSummary, DecodeError> {
        self.codec().decode_header(bytes)
    }

    /// Decodes a body with this variant's layout.
    pub fn decode_track(self, bytes: &[u8], start: NaiveDateTime) -> Track {
        self.codec().decode_track(bytes, start)
    }

    /// Decodes both buffers of a session in one go.
    pub fn decode_session(
        self,
        id: SessionId,
        number: u32,
        header: &[u8],
        body: &[u8],
    ) -> Result<Session, DecodeError> {
        let summary = self.decode_header(header)?;
        let track = self.decode_track(body, summary.start_time);
        let mut session = Session::new(id, number, summary);
        session.track = Some(track);
        Ok(session)
    }
}

impl std::str::FromStr for Variant {
    type Err = DecodeError;

    /// Parses a device name such as "onmove500" or "500hr".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase().replace(['-', '_', ' '], "");
        match name.as_str() {
            "onmove500" | "500" | "base" => Ok(Self::Base),
            "onmove500hr" | "500hr" | "hr" | "heartrate" => Ok(Self::HeartRate),
            _ => Err(DecodeError::UnknownVariant(s.to_string())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => f.write_str("OnMove500"),
            Self::HeartRate => f.write_str("OnMove500HR"),
        }
    }
}
