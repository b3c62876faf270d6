//! Decoder library for OnMove 500 and OnMove 500 HR GPS watch exports.
//!
//! Each recorded session is a pair of files sharing a prefix: a fixed-size
//! `.OMH` header holding the summary and a variable-length `.OMD` body
//! holding the track points. The two watch models share the data model but
//! not the byte layouts.
//!
//! # Example
//!
//! ```no_run
//! use onmove_core::{SessionCatalog, Variant};
//!
//! let mut catalog = SessionCatalog::open("/media/watch/DATA", Variant::HeartRate).unwrap();
//! catalog.load_tracks().unwrap();
//!
//! for session in catalog.sessions() {
//!     println!("{} {}: {} points", session.number, session.id, session.points().len());
//! }
//! ```
//!
//! Decoding alone works on in-memory buffers:
//!
//! ```no_run
//! use onmove_core::Variant;
//!
//! let header = std::fs::read("ACT_0001.OMH").unwrap();
//! let body = std::fs::read("ACT_0001.OMD").unwrap();
//! let summary = Variant::Base.decode_header(&header).unwrap();
//! let track = Variant::Base.decode_track(&body, summary.start_time);
//! println!("{} points, {} lines skipped", track.points.len(), track.stats.unrecognized_lines);
//! ```

pub mod decoder;
pub mod discovery;
pub mod framing;
pub mod header;
pub mod output;
pub mod parser;
pub mod track;
pub mod types;

// Re-export commonly used types
pub use decoder::{Codec, DecodeError, FixedStrideCodec, SentinelCodec, Variant};
pub use discovery::{list_sessions, DiscoveryError, SessionCatalog, SessionFiles};
pub use output::OutputError;
pub use types::{DecodeStats, Session, SessionId, SessionSummary, Sport, Track, TrackPoint};
