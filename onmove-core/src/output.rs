//! CSV writers for decoded sessions.
//!
//! Writing back to the watch formats is not supported; these writers are for
//! inspecting decoded data.

use crate::types::{Session, SessionSummary, TrackPoint};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output writing.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session {0} has no track loaded")]
    TrackNotLoaded(String),
}

/// Timestamp format used in every CSV column.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// CSV writer for track points.
pub struct TrackCsvWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> TrackCsvWriter<W> {
    /// Creates a new track writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Writes the column header.
    pub fn write_header(&mut self) -> Result<(), OutputError> {
        writeln!(
            self.writer,
            "timestamp,latitude,longitude,altitude,speed,heart_rate,fiability,distance"
        )?;
        Ok(())
    }

    /// Writes a batch of points.
    pub fn write_points(&mut self, points: &[TrackPoint]) -> Result<(), OutputError> {
        for point in points {
            self.write_point(point)?;
        }
        Ok(())
    }

    #[inline]
    fn write_point(&mut self, p: &TrackPoint) -> Result<(), OutputError> {
        write!(
            self.writer,
            "{},{:.6},{:.6},{},{:.2},{},{},",
            p.timestamp.format(TIME_FORMAT),
            p.latitude,
            p.longitude,
            p.altitude_meters,
            p.speed_kmh,
            p.heart_rate,
            p.fiability
        )?;
        match p.distance_meters {
            Some(d) => writeln!(self.writer, "{}", d)?,
            None => writeln!(self.writer)?,
        }
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// CSV writer for session summaries, one row per session.
pub struct SummaryCsvWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> SummaryCsvWriter<W> {
    /// Creates a new summary writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Writes the column header.
    pub fn write_header(&mut self) -> Result<(), OutputError> {
        writeln!(
            self.writer,
            "number,id,start,duration,distance,avg_speed,max_speed,energy,avg_hr,max_hr,ascent,descent,points"
        )?;
        Ok(())
    }

    /// Writes one session row.
    pub fn write_session(&mut self, session: &Session) -> Result<(), OutputError> {
        let s: &SessionSummary = &session.summary;
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            session.number,
            session.id,
            s.start_time.format(TIME_FORMAT),
            s.duration_seconds,
            s.distance_meters,
            s.avg_speed_dm_per_hour,
            s.max_speed_dm_per_hour,
            s.energy_kcal,
            s.avg_heart_rate,
            s.max_heart_rate,
            s.ascent_meters,
            s.descent_meters,
            s.point_count
        )?;
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes the track of a loaded session to a CSV file.
pub fn write_track_csv<P: AsRef<Path>>(path: P, session: &Session) -> Result<(), OutputError> {
    let track = session
        .track
        .as_ref()
        .ok_or_else(|| OutputError::TrackNotLoaded(session.id.to_string()))?;
    let file = File::create(path)?;
    let mut writer = TrackCsvWriter::new(file);
    writer.write_header()?;
    writer.write_points(&track.points)?;
    writer.flush()?;
    Ok(())
}

/// Writes the summaries of several sessions to a CSV file.
pub fn write_summary_csv<P: AsRef<Path>>(path: P, sessions: &[Session]) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = SummaryCsvWriter::new(file);
    writer.write_header()?;
    for session in sessions {
        writer.write_session(session)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::start_time;
    use crate::types::{SessionId, Track};

    fn session() -> Session {
        let start = start_time(24, 3, 9, 7, 30).unwrap();
        let summary = SessionSummary {
            start_time: start,
            duration_seconds: 60,
            distance_meters: 250,
            avg_speed_dm_per_hour: 150_000,
            max_speed_dm_per_hour: 160_000,
            energy_kcal: 12,
            avg_heart_rate: 130,
            max_heart_rate: 140,
            ascent_meters: 3,
            descent_meters: 1,
            point_count: 1,
            file_number: 2,
            sport: None,
            heart_rate_zone: (0, 0),
        };
        let mut session = Session::new(SessionId::from("ACT_0001"), 0, summary);
        let mut track = Track::default();
        track.push(TrackPoint {
            latitude: 48.858222,
            longitude: 2.294481,
            altitude_meters: 35,
            speed_kmh: 15.5,
            timestamp: start,
            heart_rate: 131,
            fiability: 3,
            distance_meters: Some(0),
        });
        session.track = Some(track);
        session
    }

    #[test]
    fn test_track_writer() {
        let mut output = Vec::new();
        {
            let mut writer = TrackCsvWriter::new(&mut output);
            writer.write_header().unwrap();
            writer.write_points(session().points()).unwrap();
            writer.flush().unwrap();
        }

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.starts_with("timestamp,latitude"));
        assert!(output_str.contains("2024-03-09T07:30:00,48.858222,2.294481,35,15.50,131,3,0"));
    }

    #[test]
    fn test_summary_writer() {
        let mut output = Vec::new();
        {
            let mut writer = SummaryCsvWriter::new(&mut output);
            writer.write_session(&session()).unwrap();
            writer.flush().unwrap();
        }

        let output_str = String::from_utf8(output).unwrap();
        assert_eq!(
            output_str.trim_end(),
            "0,ACT_0001,2024-03-09T07:30:00,60,250,150000,160000,12,130,140,3,1,1"
        );
    }

    #[test]
    fn test_track_not_loaded() {
        let mut s = session();
        s.track = None;
        let path = std::env::temp_dir().join("onmove_not_loaded.csv");
        assert!(matches!(
            write_track_csv(&path, &s),
            Err(OutputError::TrackNotLoaded(_))
        ));
    }
}
