//! Sentinel-driven line framing for heart-rate variant bodies.
//!
//! The body is a walk over 20-byte lines. Points come in groups of one or
//! two point lines followed by one metadata line that carries the speed and
//! heart rate of every point in the group:
//!
//! ```text
//! line | 00..17                                  | 17 | 18 | 19 |
//!  P   | point fields (see parser::PointFields)  | ?? | 00 | F1 |
//!  P   | point fields                            | ?? | 00 | F1 |   (two-point groups only)
//!  M   | meta point 1 (00..10) | meta point 2 (10..19)     | F2 |
//! ```
//!
//! A line's role is decided from its phase in the group and from the trailing
//! byte of this line and of the next one. [`transition`] is total: every
//! combination maps to an action and a next phase.

/// Length of one body line.
pub const LINE_LEN: usize = 20;

/// Position of the sentinel byte within a line.
pub const SENTINEL: usize = LINE_LEN - 1;

/// Sentinel of a point-data line.
pub const POINT_MARKER: u8 = 0xF1;

/// Sentinel of a metadata line.
pub const METADATA_MARKER: u8 = 0xF2;

/// Classified trailing byte of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Point,
    Metadata,
    Other(u8),
    /// The line lies past the end of the buffer
    Missing,
}

impl Marker {
    #[inline]
    pub fn from_byte(byte: Option<u8>) -> Self {
        match byte {
            Some(POINT_MARKER) => Self::Point,
            Some(METADATA_MARKER) => Self::Metadata,
            Some(other) => Self::Other(other),
            None => Self::Missing,
        }
    }
}

/// Where the walk stands within a group.
///
/// The phase records the shape of the group being read, so a metadata line
/// is only expected where the group's point lines put it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinePhase {
    /// Expecting the lead point line of a group
    #[default]
    Lead,
    /// Expecting the second point line of a two-point group
    PairSecond,
    /// Expecting the metadata line of a two-point group
    PairMetadata,
    /// Expecting the metadata line of a one-point group
    SingleMetadata,
    /// Expecting a lead line right after an unrecognized line
    Lost,
}

/// Why a line produced no point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Metadata line, already consumed by the point lines of its group
    Metadata,
    /// Sentinel bytes match no known framing
    Unrecognized,
}

/// What to do with the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    /// Emit a point; speed and heart rate live `metadata_offset` bytes ahead,
    /// inside the line that starts at the enclosing multiple of [`LINE_LEN`]
    EmitPoint { metadata_offset: usize },
    SkipLine(SkipReason),
}

/// Classifies one line and returns the phase of the line after it.
///
/// | phase                        | this     | next     | action                             |
/// |------------------------------|----------|----------|------------------------------------|
/// | Lead, Lost                   | Point    | Point    | point 1 of 2, metadata 40 bytes on |
/// | Lead                         | Point    | Metadata | point 1 of 1, metadata 20 bytes on |
/// | Lost                         | Point    | Metadata | unrecognized, group shape unknown  |
/// | PairSecond                   | Point    | Metadata | point 2 of 2, metadata 30 bytes on |
/// | PairMetadata, SingleMetadata | Metadata | any      | metadata of the group              |
/// | Lead, Lost, PairSecond       | Metadata | any      | stray metadata, unrecognized       |
/// | other                        | Point    | any      | evaluated again as Lead            |
/// | any                          | other    | any      | unrecognized, skipped              |
///
/// Only a pair's second line reads metadata 30 bytes on. After an
/// unrecognized line a point line followed by metadata may be a lone point or
/// the orphaned second point of a pair; it is skipped rather than given the
/// wrong metadata slot.
pub fn transition(phase: LinePhase, this: Marker, next: Marker) -> (LineAction, LinePhase) {
    use LineAction::*;
    use LinePhase::*;
    use Marker::{Metadata, Point};

    match (phase, this, next) {
        (Lead | Lost, Point, Point) => (EmitPoint { metadata_offset: 40 }, PairSecond),
        (Lead, Point, Metadata) => (EmitPoint { metadata_offset: 20 }, SingleMetadata),
        (Lost, Point, Metadata) => (SkipLine(SkipReason::Unrecognized), SingleMetadata),
        (PairSecond, Point, Metadata) => (EmitPoint { metadata_offset: 30 }, PairMetadata),
        (PairMetadata | SingleMetadata, Metadata, _) => (SkipLine(SkipReason::Metadata), Lead),
        (Lead | Lost | PairSecond, Metadata, _) => (SkipLine(SkipReason::Unrecognized), Lead),
        (PairSecond | PairMetadata | SingleMetadata, Point, _) => transition(Lead, this, next),
        _ => (SkipLine(SkipReason::Unrecognized), Lost),
    }
}
