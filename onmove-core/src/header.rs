//! `.OMH` header decoding.
//!
//! The header is 3 lines of 20 bytes. Both device variants share the first
//! line and the point count; they disagree on the width and position of the
//! ascent/descent fields, so each variant keeps its own layout.
//!
//! ```text
//! line | 00..04   | 04..06 | 06..08 | 08..10 | 10..12 | 12   | 13   | 14 | 15 | 16 | 17 | 18  | 19   |
//!  1   | Distance | Durat. | AvgSpd | MaxSpd | Energy | AvHR | MxHR | Y  | M  | D  | H  | Min | FNum |
//!  2   | NbPoints (20..22) | variant-specific ascent/descent (24..)                         | FNum |
//!  3   | ...                         | MinHR (50) | MaxHR (51) | ...                         | FNum |
//! ```

use crate::decoder::DecodeError;
use crate::parser::{read_u16, read_u32, start_time};
use crate::types::{SessionSummary, Sport};

/// Fixed length of an `.OMH` file.
pub const HEADER_LEN: usize = 60;

const SPORT: usize = 32;
const ZONE_MIN_HR: usize = 50;
const ZONE_MAX_HR: usize = 51;

/// Decodes a base variant (OnMove 500) header.
///
/// Ascent and descent are 4-byte fields at 24..28 and 28..32, followed by the
/// sport byte.
pub fn decode_base_header(bytes: &[u8]) -> Result<SessionSummary, DecodeError> {
    let mut summary = decode_common(bytes)?;
    summary.ascent_meters = read_u32(bytes, 24);
    summary.descent_meters = read_u32(bytes, 28);
    summary.sport = Sport::from_u8(bytes[SPORT]);
    Ok(summary)
}

/// Decodes a heart-rate variant (OnMove 500 HR) header.
///
/// Ascent and descent are 2-byte fields at 24..26 and 26..28.
pub fn decode_heart_rate_header(bytes: &[u8]) -> Result<SessionSummary, DecodeError> {
    let mut summary = decode_common(bytes)?;
    summary.ascent_meters = read_u16(bytes, 24) as u32;
    summary.descent_meters = read_u16(bytes, 26) as u32;
    Ok(summary)
}

fn decode_common(bytes: &[u8]) -> Result<SessionSummary, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::HeaderTooShort {
            len: bytes.len(),
            required: HEADER_LEN,
        });
    }

    let (year, month, day, hour, minute) = (bytes[14], bytes[15], bytes[16], bytes[17], bytes[18]);
    let start_time = start_time(year, month, day, hour, minute).ok_or(
        DecodeError::InvalidStartTime {
            year,
            month,
            day,
            hour,
            minute,
        },
    )?;

    Ok(SessionSummary {
        start_time,
        distance_meters: read_u32(bytes, 0),
        duration_seconds: read_u16(bytes, 4) as u32,
        avg_speed_dm_per_hour: read_u16(bytes, 6) as u32,
        max_speed_dm_per_hour: read_u16(bytes, 8) as u32,
        energy_kcal: read_u16(bytes, 10) as u32,
        avg_heart_rate: bytes[12],
        max_heart_rate: bytes[13],
        file_number: bytes[19],
        point_count: read_u16(bytes, 20) as u32,
        ascent_meters: 0,
        descent_meters: 0,
        sport: None,
        heart_rate_zone: (bytes[ZONE_MIN_HR], bytes[ZONE_MAX_HR]),
    })
}
