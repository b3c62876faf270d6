//! Session discovery and assembly from a watch export directory.
//!
//! A session is a pair of files sharing a prefix: `<prefix>.OMH` (header)
//! and `<prefix>.OMD` (body). Assembly runs in two passes, like the watch
//! software does: headers first to list sessions, bodies on demand.

use crate::decoder::{DecodeError, Variant};
use crate::types::{Session, SessionId};
use log::{debug, info, warn};
use std::ffi::OsStr;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header file extension.
pub const HEADER_EXT: &str = "OMH";

/// Body file extension.
pub const BODY_EXT: &str = "OMD";

/// Errors that abort a listing or a track load.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Path '{}' does not exist or is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No session numbered {0}")]
    UnknownSession(u32),
}

/// The two files of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFiles {
    pub id: SessionId,
    pub header: PathBuf,
    pub body: PathBuf,
}

#[derive(Default)]
struct Pair {
    header: Option<PathBuf>,
    body: Option<PathBuf>,
}

/// Lists the complete sessions in `base`, sorted by key.
///
/// Keys are the raw bytes of the file name before its last dot, so names
/// that are not valid UTF-8 still pair up. Prefixes missing either file are
/// discarded with a warning.
pub fn list_sessions<P: AsRef<Path>>(base: P) -> Result<Vec<SessionFiles>, DiscoveryError> {
    let base = base.as_ref();
    if !base.is_dir() {
        return Err(DiscoveryError::NotADirectory(base.to_path_buf()));
    }
    info!("Retrieve sessions list from '{}'", base.display());

    let io_err = |source| DiscoveryError::Io {
        path: base.to_path_buf(),
        source,
    };

    let mut pairs: BTreeMap<Vec<u8>, Pair> = BTreeMap::new();
    for entry in fs::read_dir(base).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let Some(name) = path.file_name().and_then(name_bytes) else {
            warn!("Ignoring file name {:?}: not representable as bytes here", path);
            continue;
        };
        let Some(dot) = name.iter().rposition(|&b| b == b'.') else {
            continue;
        };
        let (prefix, ext) = (&name[..dot], &name[dot + 1..]);

        if ext.eq_ignore_ascii_case(HEADER_EXT.as_bytes()) {
            pairs.entry(prefix.to_vec()).or_default().header = Some(path.clone());
        } else if ext.eq_ignore_ascii_case(BODY_EXT.as_bytes()) {
            pairs.entry(prefix.to_vec()).or_default().body = Some(path.clone());
        }
    }

    let mut sessions = Vec::with_capacity(pairs.len());
    for (prefix, pair) in pairs {
        let id = SessionId::new(prefix);
        match pair {
            Pair {
                header: Some(header),
                body: Some(body),
            } => sessions.push(SessionFiles { id, header, body }),
            _ => warn!("Discarding {}", id),
        }
    }
    Ok(sessions)
}

/// Raw bytes of a file name, used as the session key.
#[cfg(unix)]
fn name_bytes(name: &OsStr) -> Option<&[u8]> {
    use std::os::unix::ffi::OsStrExt;
    Some(name.as_bytes())
}

#[cfg(not(unix))]
fn name_bytes(name: &OsStr) -> Option<&[u8]> {
    name.to_str().map(str::as_bytes)
}

fn read_file(path: &Path) -> Result<Vec<u8>, DiscoveryError> {
    fs::read(path).map_err(|source| DiscoveryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Sessions of one export directory, summaries decoded, tracks on demand.
#[derive(Debug)]
pub struct SessionCatalog {
    variant: Variant,
    sessions: Vec<Session>,
    bodies: Vec<PathBuf>,
    rejected: Vec<(SessionId, DecodeError)>,
}

impl SessionCatalog {
    /// Lists `base` and decodes every session header.
    ///
    /// Session numbers are the zero-based rank of each key in sorted order.
    /// Headers that fail to decode are set aside in [`rejected`](Self::rejected)
    /// without shifting the numbers of the others.
    pub fn open<P: AsRef<Path>>(base: P, variant: Variant) -> Result<Self, DiscoveryError> {
        let files = list_sessions(base)?;
        let mut catalog = Self {
            variant,
            sessions: Vec::with_capacity(files.len()),
            bodies: Vec::with_capacity(files.len()),
            rejected: Vec::new(),
        };

        for (number, files) in files.into_iter().enumerate() {
            debug!("Decode summary of session {}", files.id);
            let bytes = read_file(&files.header)?;
            match variant.decode_header(&bytes) {
                Ok(summary) => {
                    catalog
                        .sessions
                        .push(Session::new(files.id, number as u32, summary));
                    catalog.bodies.push(files.body);
                }
                Err(e) => {
                    warn!("Discarding {}: {}", files.id, e);
                    catalog.rejected.push((files.id, e));
                }
            }
        }
        Ok(catalog)
    }

    /// Returns the device variant used to decode this catalog.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Returns the sessions in key order.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Consumes the catalog, returning its sessions.
    pub fn into_sessions(self) -> Vec<Session> {
        self.sessions
    }

    /// Returns the sessions whose header could not be decoded.
    pub fn rejected(&self) -> &[(SessionId, DecodeError)] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Finds a session by its number.
    pub fn get(&self, number: u32) -> Option<&Session> {
        self.sessions.iter().find(|s| s.number == number)
    }

    /// Reads and decodes the body of the session numbered `number`.
    pub fn load_track(&mut self, number: u32) -> Result<&Session, DiscoveryError> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.number == number)
            .ok_or(DiscoveryError::UnknownSession(number))?;
        self.load_at(index)
    }

    /// Reads and decodes every body.
    pub fn load_tracks(&mut self) -> Result<(), DiscoveryError> {
        for index in 0..self.sessions.len() {
            self.load_at(index)?;
        }
        Ok(())
    }

    fn load_at(&mut self, index: usize) -> Result<&Session, DiscoveryError> {
        let session = &mut self.sessions[index];
        info!("Retrieve session {}", session.id);

        let bytes = read_file(&self.bodies[index])?;
        let track = self.variant.decode_track(&bytes, session.summary.start_time);
        if track.stats.points as u32 != session.summary.point_count {
            debug!(
                "Session {}: header announces {} points, body holds {}",
                session.id, session.summary.point_count, track.stats.points
            );
        }
        session.track = Some(track);
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_list_pairs_and_discards() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "B.OMH");
        touch(dir.path(), "B.OMD");
        touch(dir.path(), "A.OMH");
        touch(dir.path(), "A.OMD");
        touch(dir.path(), "C.omh");
        touch(dir.path(), "C.omd");
        touch(dir.path(), "ORPHAN.OMH");
        touch(dir.path(), "notes.txt");

        let sessions = list_sessions(dir.path()).unwrap();
        let ids: Vec<String> = sessions.iter().map(|s| s.id.to_string()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(sessions[0].header, dir.path().join("A.OMH"));
        assert_eq!(sessions[0].body, dir.path().join("A.OMD"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_prefix_is_listed() {
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let prefix: &[u8] = b"RUN_\xE9t\xE9";
        for ext in [&b".OMH"[..], &b".OMD"[..]] {
            let name = OsStr::from_bytes(&[prefix, ext].concat()).to_os_string();
            fs::write(dir.path().join(name), b"").unwrap();
        }
        touch(dir.path(), "A.OMH");
        touch(dir.path(), "A.OMD");

        let sessions = list_sessions(dir.path()).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id.as_bytes(), b"A");
        assert_eq!(sessions[1].id.as_bytes(), prefix);
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = list_sessions(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotADirectory(_)));
    }

    #[test]
    fn test_unknown_session_number() {
        let dir = TempDir::new().unwrap();
        let mut catalog = SessionCatalog::open(dir.path(), Variant::Base).unwrap();
        assert!(catalog.is_empty());
        assert!(matches!(
            catalog.load_track(3),
            Err(DiscoveryError::UnknownSession(3))
        ));
    }
}
