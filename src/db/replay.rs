//! Database stand-in that answers queries from recorded responses.
//!
//! Useful for offline runs of the CLI and for tests: a fixture maps the exact
//! query text to the rows the real database returned for it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{GraphDatabase, ReadSession, Record};
use crate::error::{GraphError, Result};

/// Failures raised by [`ReplayDatabase`].
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The fixture has no response for this query.
    #[error("no recorded response for query:\n{query}")]
    UnknownQuery {
        /// Query text that was not found.
        query: String,
    },
    /// The fixture file could not be read.
    #[error("failed to read replay fixture {path}: {source}")]
    Read {
        /// Fixture path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The fixture file is not valid JSON.
    #[error("failed to parse replay fixture: {source}")]
    Parse {
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// The fixture could not be written out as JSON.
    #[error("failed to serialize replay fixture: {source}")]
    Encode {
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// The fixture is marked unreachable.
    #[error("database unreachable")]
    Unreachable,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Fixture {
    #[serde(default)]
    unreachable: bool,
    #[serde(default)]
    responses: BTreeMap<String, Vec<Record>>,
}

/// Replays recorded rows keyed by query text.
#[derive(Debug, Default)]
pub struct ReplayDatabase {
    fixture: Fixture,
    open_sessions: AtomicUsize,
    sessions_opened: AtomicUsize,
}

impl ReplayDatabase {
    /// Creates a database without responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a fixture from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(json)
            .map_err(|source| GraphError::database(ReplayError::Parse { source }))?;
        Ok(Self {
            fixture,
            ..Self::default()
        })
    }

    /// Loads a fixture file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| {
            GraphError::database(ReplayError::Read {
                path: path.to_path_buf(),
                source,
            })
        })?;
        Self::from_json_str(&json)
    }

    /// Records the rows returned for `query`.
    pub fn with_response(mut self, query: impl Into<String>, rows: Vec<Record>) -> Self {
        self.fixture.responses.insert(query.into(), rows);
        self
    }

    /// Makes every connectivity check and session acquisition fail.
    pub fn unreachable(mut self) -> Self {
        self.fixture.unreachable = true;
        self
    }

    /// Serializes the fixture back to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.fixture)
            .map_err(|source| GraphError::database(ReplayError::Encode { source }))
    }

    /// Sessions currently acquired and not yet released.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Sessions acquired over the lifetime of the database.
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }
}

impl GraphDatabase for ReplayDatabase {
    fn verify_connectivity(&self) -> Result<()> {
        if self.fixture.unreachable {
            return Err(GraphError::database(ReplayError::Unreachable));
        }
        Ok(())
    }

    fn session(&self) -> Result<Box<dyn ReadSession + '_>> {
        self.verify_connectivity()?;
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ReplaySession { db: self }))
    }
}

/// Session handed out by [`ReplayDatabase`].
pub struct ReplaySession<'a> {
    db: &'a ReplayDatabase,
}

impl ReadSession for ReplaySession<'_> {
    fn read(&mut self, query: &str) -> Result<Vec<Record>> {
        match self.db.fixture.responses.get(query) {
            Some(rows) => {
                debug!(rows = rows.len(), "replay.read.hit");
                Ok(rows.clone())
            }
            None => Err(GraphError::database(ReplayError::UnknownQuery {
                query: query.to_owned(),
            })),
        }
    }
}

impl Drop for ReplaySession<'_> {
    fn drop(&mut self) {
        self.db.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}
