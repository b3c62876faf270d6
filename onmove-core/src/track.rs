//! `.OMD` body decoding for both device variants.
//!
//! Both decoders walk the buffer by its length alone; the header's point
//! count is only used as a capacity hint by callers. Neither decoder ever
//! reads past the end of the buffer: data that cannot hold a complete point
//! is dropped and counted in [`DecodeStats`](crate::types::DecodeStats).

use crate::framing::{transition, LineAction, LinePhase, Marker, SkipReason, LINE_LEN, SENTINEL};
use crate::parser::{
    offset_time, read_point_fields, read_u16, scale_speed, META_HEART_RATE, META_SPEED,
};
use crate::types::{Track, TrackPoint};
use chrono::NaiveDateTime;
use log::{debug, warn};

/// Length of one fixed-stride chunk in base variant bodies.
pub const STRIDE: usize = 60;

/// Fewer remaining bytes than this cannot hold a point plus its metadata.
pub const MIN_CHUNK: usize = 40;

/// Decodes a base variant (OnMove 500) body.
///
/// The body is walked in 60-byte strides:
///
/// ```text
/// | 00..20 point 1 | 20..40 point 2 | 40..50 meta 1 | 50..60 meta 2 |
/// | 00..20 point 1 | 20..30 meta 1  |                                  (single)
/// ```
///
/// A stride carries a pair only when more than one full stride of data
/// follows it; otherwise it carries a single point whose metadata sits right
/// after it. The walk stops once fewer than 40 bytes remain.
pub fn decode_fixed_stride_track(bytes: &[u8], start: NaiveDateTime) -> Track {
    let mut track = Track::with_capacity(bytes.len() / STRIDE * 2 + 1);
    let mut offset = 0;

    while offset + MIN_CHUNK <= bytes.len() {
        let pair = offset + 2 * STRIDE < bytes.len();
        let meta = offset + 20 + 20 * pair as usize;

        track.push(fixed_stride_point(bytes, offset, meta, start));
        if pair {
            track.push(fixed_stride_point(bytes, offset + 20, meta + 10, start));
        }

        offset += STRIDE;
    }

    track.stats.trailing_bytes = bytes.len().saturating_sub(offset);
    if track.stats.trailing_bytes > 0 {
        warn!(
            "Dropped {} trailing bytes after {} points",
            track.stats.trailing_bytes, track.stats.points
        );
    }
    track
}

#[inline]
fn fixed_stride_point(bytes: &[u8], at: usize, meta: usize, start: NaiveDateTime) -> TrackPoint {
    let fields = read_point_fields(bytes, at);
    TrackPoint {
        latitude: fields.latitude,
        longitude: fields.longitude,
        altitude_meters: fields.altitude,
        speed_kmh: scale_speed(read_u16(bytes, meta + META_SPEED)),
        timestamp: offset_time(start, fields.relative_time),
        heart_rate: read_u16(bytes, meta + META_HEART_RATE),
        fiability: fields.fiability,
        distance_meters: Some(fields.distance),
    }
}

/// Decodes a heart-rate variant (OnMove 500 HR) body.
///
/// Lines are classified by [`transition`]; only point lines emit points, with
/// speed and heart rate read from the metadata line of their group. A point
/// whose metadata line does not carry the metadata marker is skipped.
pub fn decode_sentinel_track(bytes: &[u8], start: NaiveDateTime) -> Track {
    let mut track = Track::with_capacity(bytes.len() / LINE_LEN);
    let mut phase = LinePhase::default();
    let mut offset = 0;

    while offset + LINE_LEN <= bytes.len() {
        let this = Marker::from_byte(bytes.get(offset + SENTINEL).copied());
        let next = Marker::from_byte(bytes.get(offset + LINE_LEN + SENTINEL).copied());
        let (action, mut next_phase) = transition(phase, this, next);

        match action {
            LineAction::EmitPoint { metadata_offset } => {
                let meta_line = offset + metadata_offset / LINE_LEN * LINE_LEN;
                match Marker::from_byte(bytes.get(meta_line + SENTINEL).copied()) {
                    Marker::Metadata => {
                        track.push(sentinel_point(bytes, offset, offset + metadata_offset, start));
                    }
                    Marker::Missing => {
                        warn!("Point line at byte {} has no metadata, dropped", offset);
                        track.stats.truncated_points += 1;
                    }
                    found => {
                        debug!(
                            "Skipping point line at byte {}: expected metadata at byte {}, found {:?}",
                            offset, meta_line, found
                        );
                        track.stats.unrecognized_lines += 1;
                        next_phase = LinePhase::Lost;
                    }
                }
            }
            LineAction::SkipLine(SkipReason::Metadata) => {
                track.stats.metadata_lines += 1;
            }
            LineAction::SkipLine(SkipReason::Unrecognized) => {
                debug!(
                    "Skipping line at byte {} ({:?}, this {:?}, next {:?})",
                    offset, phase, this, next
                );
                track.stats.unrecognized_lines += 1;
            }
        }

        phase = next_phase;
        offset += LINE_LEN;
    }

    track.stats.trailing_bytes = bytes.len() - offset;
    if track.stats.unrecognized_lines > 0 || track.stats.trailing_bytes > 0 {
        warn!(
            "Skipped {} unrecognized lines and {} trailing bytes after {} points",
            track.stats.unrecognized_lines, track.stats.trailing_bytes, track.stats.points
        );
    }
    track
}

#[inline]
fn sentinel_point(bytes: &[u8], at: usize, meta: usize, start: NaiveDateTime) -> TrackPoint {
    let fields = read_point_fields(bytes, at);
    TrackPoint {
        latitude: fields.latitude,
        longitude: fields.longitude,
        altitude_meters: fields.altitude,
        speed_kmh: scale_speed(read_u16(bytes, meta + META_SPEED)),
        timestamp: offset_time(start, fields.relative_time),
        heart_rate: bytes[meta + META_HEART_RATE] as u16,
        fiability: fields.fiability,
        distance_meters: Some(fields.distance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{METADATA_MARKER, POINT_MARKER};
    use crate::parser::start_time;

    fn start() -> NaiveDateTime {
        start_time(24, 3, 9, 7, 30).unwrap()
    }

    fn point_line(buf: &mut [u8], lat: i32, lon: i32, time: u16) {
        buf[0..4].copy_from_slice(&lat.to_le_bytes());
        buf[4..8].copy_from_slice(&lon.to_le_bytes());
        buf[8..12].copy_from_slice(&(time as u32 * 3).to_le_bytes());
        buf[12..14].copy_from_slice(&time.to_le_bytes());
        buf[14] = 3;
        buf[15..17].copy_from_slice(&(-5i16).to_le_bytes());
    }

    fn meta(buf: &mut [u8], speed: u16, hr: u8) {
        buf[2..4].copy_from_slice(&speed.to_le_bytes());
        buf[6] = hr;
    }

    #[test]
    fn test_fixed_stride_point_counts() {
        let count = |len| decode_fixed_stride_track(&vec![0u8; len], start()).points.len();
        assert_eq!(count(60), 1);
        assert_eq!(count(120), 2);
        assert_eq!(count(150), 3);
        assert_eq!(count(39), 0);
        assert_eq!(count(0), 0);
    }

    #[test]
    fn test_fixed_stride_metadata_offsets() {
        let mut body = vec![0u8; 150];
        // Pair stride at 0
        point_line(&mut body[0..], 48_858_222, 2_294_481, 0);
        point_line(&mut body[20..], 48_858_300, 2_294_500, 1);
        meta(&mut body[40..], 1_250, 0);
        body[46..48].copy_from_slice(&150u16.to_le_bytes());
        meta(&mut body[50..], 1_300, 0);
        body[56..58].copy_from_slice(&151u16.to_le_bytes());
        // Single stride at 60, only 30 bytes follow it
        point_line(&mut body[60..], 48_858_400, 2_294_600, 2);
        meta(&mut body[80..], 1_400, 0);
        body[86..88].copy_from_slice(&152u16.to_le_bytes());

        let track = decode_fixed_stride_track(&body, start());
        let p = &track.points;
        assert!((p[0].latitude - 48.858222).abs() < 1e-6);
        assert!((p[0].longitude - 2.294481).abs() < 1e-6);
        assert!((p[0].speed_kmh - 12.5).abs() < 1e-9);
        assert_eq!(p[0].heart_rate, 150);
        assert_eq!(p[0].fiability, 3);
        assert_eq!(p[0].altitude_meters, -5);
        assert_eq!(p[1].heart_rate, 151);
        assert!((p[1].speed_kmh - 13.0).abs() < 1e-9);
        assert_eq!(p[1].timestamp.to_string(), "2024-03-09 07:30:01");
        assert_eq!(p[1].distance_meters, Some(3));
        assert_eq!(p[2].heart_rate, 152);
        assert!((p[2].speed_kmh - 14.0).abs() < 1e-9);
        assert_eq!(p[2].timestamp.to_string(), "2024-03-09 07:30:02");
    }

    #[test]
    fn test_fixed_stride_trailing_bytes() {
        let track = decode_fixed_stride_track(&[0u8; 150], start());
        assert_eq!(track.stats.points, 3);
        assert_eq!(track.stats.trailing_bytes, 30);
        assert!(decode_fixed_stride_track(&[0u8; 120], start()).stats.is_clean());
    }

    fn sentinel_group(body: &mut Vec<u8>, points: &[(i32, u16, u8)]) {
        let base = body.len();
        body.resize(base + (points.len() + 1) * LINE_LEN, 0);
        for (i, &(lat, speed, hr)) in points.iter().enumerate() {
            let line = base + i * LINE_LEN;
            point_line(&mut body[line..], lat, 0, i as u16);
            body[line + SENTINEL] = POINT_MARKER;
            let m = base + points.len() * LINE_LEN + i * 10;
            meta(&mut body[m..], speed, hr);
        }
        body[base + points.len() * LINE_LEN + SENTINEL] = METADATA_MARKER;
    }

    #[test]
    fn test_sentinel_two_point_group() {
        let mut body = Vec::new();
        sentinel_group(&mut body, &[(1_000_000, 500, 120), (2_000_000, 600, 121)]);
        assert_eq!(body.len(), 60);

        let track = decode_sentinel_track(&body, start());
        assert_eq!(track.points.len(), 2);
        assert!((track.points[0].latitude - 1.0).abs() < 1e-9);
        assert!((track.points[0].speed_kmh - 5.0).abs() < 1e-9);
        assert_eq!(track.points[0].heart_rate, 120);
        assert!((track.points[1].latitude - 2.0).abs() < 1e-9);
        assert!((track.points[1].speed_kmh - 6.0).abs() < 1e-9);
        assert_eq!(track.points[1].heart_rate, 121);
        assert_eq!(track.stats.metadata_lines, 1);
        assert!(track.stats.is_clean());
    }

    #[test]
    fn test_sentinel_one_point_group() {
        let mut body = Vec::new();
        sentinel_group(&mut body, &[(3_000_000, 700, 99)]);
        body.resize(60, 0);

        let track = decode_sentinel_track(&body, start());
        assert_eq!(track.points.len(), 1);
        assert_eq!(track.points[0].heart_rate, 99);
        assert!((track.points[0].speed_kmh - 7.0).abs() < 1e-9);
        // The zeroed third line starts a new group and matches nothing
        assert_eq!(track.stats.metadata_lines, 1);
        assert_eq!(track.stats.unrecognized_lines, 1);
    }

    #[test]
    fn test_sentinel_mixed_groups() {
        let mut body = Vec::new();
        sentinel_group(&mut body, &[(1_000_000, 100, 1), (2_000_000, 200, 2)]);
        sentinel_group(&mut body, &[(3_000_000, 300, 3)]);
        sentinel_group(&mut body, &[(4_000_000, 400, 4), (5_000_000, 500, 5)]);

        let track = decode_sentinel_track(&body, start());
        let hrs: Vec<u16> = track.points.iter().map(|p| p.heart_rate).collect();
        assert_eq!(hrs, vec![1, 2, 3, 4, 5]);
        assert_eq!(track.stats.metadata_lines, 3);
        assert!(track.stats.is_clean());
    }

    #[test]
    fn test_sentinel_point_without_metadata() {
        let mut body = Vec::new();
        sentinel_group(&mut body, &[(1_000_000, 100, 1), (2_000_000, 200, 2)]);
        // Two point lines with the metadata line cut off
        body.truncate(40);

        let track = decode_sentinel_track(&body, start());
        assert!(track.points.is_empty());
        assert_eq!(track.stats.truncated_points, 1);
        assert_eq!(track.stats.unrecognized_lines, 1);
    }

    #[test]
    fn test_sentinel_pair_without_metadata_marker() {
        let mut body = Vec::new();
        sentinel_group(&mut body, &[(1_000_000, 100, 1), (2_000_000, 200, 2)]);
        sentinel_group(&mut body, &[(3_000_000, 300, 3), (4_000_000, 400, 4)]);
        // First group's metadata line loses its marker
        body[2 * LINE_LEN + SENTINEL] = 0x00;

        let track = decode_sentinel_track(&body, start());
        let hrs: Vec<u16> = track.points.iter().map(|p| p.heart_rate).collect();
        assert_eq!(hrs, vec![3, 4]);
        assert_eq!(track.stats.unrecognized_lines, 3);
        assert_eq!(track.stats.metadata_lines, 1);
    }

    #[test]
    fn test_sentinel_partial_line() {
        let mut body = Vec::new();
        sentinel_group(&mut body, &[(1_000_000, 100, 1)]);
        body.extend_from_slice(&[0xF1; 7]);

        let track = decode_sentinel_track(&body, start());
        assert_eq!(track.points.len(), 1);
        assert_eq!(track.stats.trailing_bytes, 7);
    }
}
