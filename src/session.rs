//! Session snapshot handed from one workflow step to the next.
//!
//! Stored as versioned JSON; the header is checked before the body is read.

use crate::error::SessionError;
use crate::export::write_atomically;
use crate::model::{component_count, BuildingElement, MatchSummary};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SESSION_FORMAT: &str = "elca-bridge-session";
pub const SESSION_VERSION: u32 = 1;

/// Everything the load steps leave behind for library creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub html_path: Option<PathBuf>,
    #[serde(default)]
    pub xml_path: Option<PathBuf>,
    /// At least one XML layer carried a thickness.
    #[serde(default)]
    pub matched: bool,
    #[serde(default)]
    pub layer_summary: Option<MatchSummary>,
    #[serde(default)]
    pub elements: Vec<BuildingElement>,
}

#[derive(Deserialize)]
struct SnapshotHeader {
    format: String,
    version: u32,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    format: String,
    version: u32,
    #[serde(flatten)]
    session: Session,
}

impl Session {
    /// Reads a snapshot, rejecting other formats and versions up front.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let header: SnapshotHeader = serde_json::from_str(&text)?;
        if header.format != SESSION_FORMAT || header.version != SESSION_VERSION {
            return Err(SessionError::Incompatible {
                format: header.format,
                version: header.version,
            });
        }

        let snapshot: Snapshot = serde_json::from_str(&text)?;
        debug!(
            path = %path.display(),
            elements = snapshot.session.elements.len(),
            "loaded session"
        );
        Ok(snapshot.session)
    }

    /// A missing file is a fresh session; an unreadable one is logged and
    /// replaced by a fresh session.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "discarding unreadable session");
            Self::default()
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        let snapshot = Snapshot {
            format: SESSION_FORMAT.to_string(),
            version: SESSION_VERSION,
            session: self.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        write_atomically(path, json.as_bytes()).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "saved session");
        Ok(())
    }

    /// Deletes the snapshot and returns how many stored properties it held.
    pub fn reset(path: impl AsRef<Path>) -> Result<usize, SessionError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(0);
        }
        let cleared = Self::load_or_default(path).stored_properties();
        std::fs::remove_file(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(cleared)
    }

    #[must_use]
    pub fn stored_properties(&self) -> usize {
        [
            self.html_path.is_some(),
            self.xml_path.is_some(),
            self.matched,
            self.layer_summary.is_some(),
            !self.elements.is_empty(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    #[must_use]
    pub fn html_loaded(&self) -> bool {
        self.html_path.is_some()
    }

    #[must_use]
    pub fn xml_loaded(&self) -> bool {
        self.xml_path.is_some()
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        component_count(&self.elements)
    }

    /// Drops everything the XML step produced.
    pub fn clear_xml(&mut self) {
        self.xml_path = None;
        self.matched = false;
        self.layer_summary = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Component;
    use pretty_assertions::assert_eq;

    fn sample() -> Session {
        let mut element = BuildingElement::new("330", "Wall A");
        let mut beton = Component::new("Beton", "200,00 mm");
        beton.layer_thickness = Some(0.2);
        element.components.push(beton);
        Session {
            html_path: Some(PathBuf::from("report.html")),
            xml_path: Some(PathBuf::from("project.xml")),
            matched: true,
            layer_summary: Some(MatchSummary {
                total_elements: 1,
                total_layers: 1,
                matched_layers: 1,
                unmatched_layers: 0,
            }),
            elements: vec![element],
        }
    }

    #[test]
    fn save_and_load_preserve_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        sample().save(&path).unwrap();
        assert_eq!(Session::load(&path).unwrap(), sample());

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["format"], SESSION_FORMAT);
        assert_eq!(raw["version"], SESSION_VERSION);
    }

    #[test]
    fn other_version_is_incompatible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{"format":"elca-bridge-session","version":7,"elements":"not a list"}"#,
        )
        .unwrap();

        match Session::load(&path) {
            Err(SessionError::Incompatible { format, version }) => {
                assert_eq!(format, SESSION_FORMAT);
                assert_eq!(version, 7);
            }
            other => panic!("expected incompatible snapshot, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_snapshot_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "gANjYnVpbHRpbnMK").unwrap();

        assert!(matches!(Session::load(&path), Err(SessionError::Json { .. })));
        assert_eq!(Session::load_or_default(&path), Session::default());
    }

    #[test]
    fn reset_counts_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        sample().save(&path).unwrap();

        assert_eq!(Session::reset(&path).unwrap(), 5);
        assert!(!path.exists());
        assert_eq!(Session::reset(&path).unwrap(), 0);
    }
}
