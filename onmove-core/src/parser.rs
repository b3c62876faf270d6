//! Low-level decoding of OnMove byte layouts.
//!
//! All multi-byte integers in both `.OMH` and `.OMD` files are little-endian.
//! Callers are responsible for bounds: every reader here indexes directly
//! into the slice it is given.

use byteorder::{ByteOrder, LittleEndian};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Divisor turning raw coordinates into degrees (6 implied decimals).
pub const COORDINATE_SCALE: f64 = 1_000_000.0;

/// Divisor turning raw speeds into km/h (2 implied decimals).
pub const SPEED_SCALE: f64 = 100.0;

/// Year the header's year byte counts from.
pub const EPOCH_YEAR: i32 = 2000;

/// Length of a point-data block inside a body line.
pub const POINT_FIELDS_LEN: usize = 17;

#[inline]
pub fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    LittleEndian::read_u16(&bytes[offset..offset + 2])
}

#[inline]
pub fn read_i16(bytes: &[u8], offset: usize) -> i16 {
    LittleEndian::read_i16(&bytes[offset..offset + 2])
}

#[inline]
pub fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    LittleEndian::read_u32(&bytes[offset..offset + 4])
}

#[inline]
pub fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    LittleEndian::read_i32(&bytes[offset..offset + 4])
}

/// Converts a raw fixed-point coordinate to degrees.
#[inline]
pub fn scale_coordinate(raw: i32) -> f64 {
    raw as f64 / COORDINATE_SCALE
}

/// Converts a raw fixed-point speed to km/h.
#[inline]
pub fn scale_speed(raw: u16) -> f64 {
    raw as f64 / SPEED_SCALE
}

/// Builds a calendar start time from the raw header bytes.
///
/// The year byte counts from 2000 and the month byte is 1-based, which is
/// also chrono's convention. Returns `None` for impossible dates.
pub fn start_time(year: u8, month: u8, day: u8, hour: u8, minute: u8) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(EPOCH_YEAR + year as i32, month as u32, day as u32)?.and_hms_opt(
        hour as u32,
        minute as u32,
        0,
    )
}

/// Offsets a reference time by a point's relative time in seconds.
#[inline]
pub fn offset_time(reference: NaiveDateTime, seconds: u16) -> NaiveDateTime {
    reference + Duration::seconds(seconds as i64)
}

/// The point-data block shared by both body layouts.
///
/// ```text
/// | 00..04   | 04..08    | 08..12   | 12..14 | 14   | 15..17   |
/// | Latitude | Longitude | Distance | Time   | Fiab | Altitude |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointFields {
    pub latitude: f64,
    pub longitude: f64,
    pub distance: u32,
    pub relative_time: u16,
    pub fiability: u8,
    pub altitude: i16,
}

/// Reads the point-data block starting at `offset`.
#[inline]
pub fn read_point_fields(bytes: &[u8], offset: usize) -> PointFields {
    PointFields {
        latitude: scale_coordinate(read_i32(bytes, offset)),
        longitude: scale_coordinate(read_i32(bytes, offset + 4)),
        distance: read_u32(bytes, offset + 8),
        relative_time: read_u16(bytes, offset + 12),
        fiability: bytes[offset + 14],
        altitude: read_i16(bytes, offset + 15),
    }
}

// Metadata block, 10 bytes per point:
// | 0..2 Time | 2..4 Speed | 4..6 Energy | 6 HR | 7 New lap | 8 End of track |

/// Offset of the speed field within a metadata block.
pub const META_SPEED: usize = 2;

/// Offset of the heart-rate field within a metadata block.
pub const META_HEART_RATE: usize = 6;
