//! Core types for decoded OnMove session data.
//!
//! This module defines the summary, track point and session structures shared
//! by both device variants. Decoders of either variant produce exactly these
//! types, so session assembly and output never depend on the variant.

use chrono::NaiveDateTime;
use std::fmt;
use std::ops::AddAssign;

/// Opaque session key derived from the shared filename prefix.
///
/// Ordering is lexicographic over the key bytes, which is the order sessions
/// are visited and numbered in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(Vec<u8>);

impl SessionId {
    /// Creates a key from raw prefix bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(prefix: &str) -> Self {
        Self(prefix.as_bytes().to_vec())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Activity type recorded in the base variant header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Sport {
    Run = 0,
    Bike = 1,
    Walk = 2,
    Trek = 3,
    Other = 4,
}

impl Sport {
    /// Parses the raw sport byte.
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Run),
            1 => Some(Self::Bike),
            2 => Some(Self::Walk),
            3 => Some(Self::Trek),
            4 => Some(Self::Other),
            _ => None,
        }
    }
}

/// Session summary metadata decoded from an `.OMH` header.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    /// Local start time of the session (minute resolution)
    pub start_time: NaiveDateTime,
    /// Total duration in seconds
    pub duration_seconds: u32,
    /// Total distance in meters
    pub distance_meters: u32,
    /// Average speed in decimeters per hour
    pub avg_speed_dm_per_hour: u32,
    /// Maximum speed in decimeters per hour
    pub max_speed_dm_per_hour: u32,
    /// Energy in kilocalories
    pub energy_kcal: u32,
    /// Average heart rate in bpm
    pub avg_heart_rate: u8,
    /// Maximum heart rate in bpm
    pub max_heart_rate: u8,
    /// Total ascent in meters
    pub ascent_meters: u32,
    /// Total descent in meters
    pub descent_meters: u32,
    /// Point count announced by the header. Advisory only.
    pub point_count: u32,
    /// Per-file sequence number written by the watch (one more than the filename index)
    pub file_number: u8,
    /// Activity type, only recorded by the base variant
    pub sport: Option<Sport>,
    /// User heart-rate zone bounds (min, max) in bpm
    pub heart_rate_zone: (u8, u8),
}

/// A single GPS fix.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters
    pub altitude_meters: i16,
    /// Speed in km/h
    pub speed_kmh: f64,
    /// Session start time plus the point's relative offset
    pub timestamp: NaiveDateTime,
    /// Heart rate in bpm, zero when no sensor was paired
    pub heart_rate: u16,
    /// Raw fix quality code, passed through as read
    pub fiability: u8,
    /// Cumulative distance in meters
    pub distance_meters: Option<u32>,
}

/// Counters describing what a track decode skipped or dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Points emitted
    pub points: usize,
    /// Metadata lines visited by the walk that carry no point of their own
    pub metadata_lines: usize,
    /// Lines whose sentinel bytes matched no known framing
    pub unrecognized_lines: usize,
    /// Points dropped because their data ran past the end of the buffer
    pub truncated_points: usize,
    /// Trailing bytes too short to hold a point
    pub trailing_bytes: usize,
}

impl DecodeStats {
    /// Returns true if nothing was skipped or dropped.
    pub fn is_clean(&self) -> bool {
        self.unrecognized_lines == 0 && self.truncated_points == 0 && self.trailing_bytes == 0
    }
}

impl AddAssign for DecodeStats {
    fn add_assign(&mut self, other: Self) {
        self.points += other.points;
        self.metadata_lines += other.metadata_lines;
        self.unrecognized_lines += other.unrecognized_lines;
        self.truncated_points += other.truncated_points;
        self.trailing_bytes += other.trailing_bytes;
    }
}

/// Result of decoding an `.OMD` body.
#[derive(Debug, Clone, Default)]
pub struct Track {
    /// Decoded points in file order
    pub points: Vec<TrackPoint>,
    /// Skip and drop counters
    pub stats: DecodeStats,
}

impl Track {
    /// Creates an empty track with room for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            stats: DecodeStats::default(),
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, point: TrackPoint) {
        self.points.push(point);
        self.stats.points += 1;
    }
}

/// One recorded activity: a summary plus, once loaded, its track.
#[derive(Debug, Clone)]
pub struct Session {
    /// Key shared by the header and body files
    pub id: SessionId,
    /// Zero-based rank of the key among all listed sessions
    pub number: u32,
    /// Summary decoded from the header
    pub summary: SessionSummary,
    /// Track decoded from the body, attached in a second pass
    pub track: Option<Track>,
}

impl Session {
    /// Creates a session with only its summary attached.
    pub fn new(id: SessionId, number: u32, summary: SessionSummary) -> Self {
        Self {
            id,
            number,
            summary,
            track: None,
        }
    }

    /// Returns true once the track pass has succeeded.
    pub fn is_complete(&self) -> bool {
        self.track.is_some()
    }

    /// Returns the decoded points, empty until the track is attached.
    pub fn points(&self) -> &[TrackPoint] {
        self.track.as_ref().map_or(&[], |t| t.points.as_slice())
    }
}
