//! Host-owned ingestion state.
//!
//! The session is an explicit value the host application owns, never an
//! ambient per-session global: `Empty` until a batch
//! processes, `Ready` while a table is available for editing and export,
//! `Failed` after a surfaced error. Processing is the transient span of
//! [`IngestSession::process`]; a failure discards any previous table and
//! leaves the session retryable.

use crate::error::Result;
use crate::models::{CandidateSource, CoverageSource, CoverageTable, IngestOutcome};
use crate::pipeline::IngestionPipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Ready,
    Failed,
}

pub struct IngestSession {
    pipeline: IngestionPipeline,
    state: SessionState,
    outcome: Option<IngestOutcome>,
    last_error: Option<String>,
}

impl IngestSession {
    pub fn new(pipeline: IngestionPipeline) -> Self {
        Self {
            pipeline,
            state: SessionState::Empty,
            outcome: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run one ingestion batch, replacing whatever the session held before.
    ///
    /// On failure the previous table is already discarded; the error is
    /// returned verbatim and kept for display until the next attempt.
    pub fn process(
        &mut self,
        candidates: &[CandidateSource],
        coverage: Option<&CoverageSource>,
    ) -> Result<&IngestOutcome> {
        self.outcome = None;
        match self.pipeline.run(candidates, coverage) {
            Ok(outcome) => {
                self.state = SessionState::Ready;
                self.last_error = None;
                Ok(&*self.outcome.insert(outcome))
            }
            Err(err) => {
                self.state = SessionState::Failed;
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Discard all derived state and return to `Empty`.
    pub fn reset(&mut self) {
        self.state = SessionState::Empty;
        self.outcome = None;
        self.last_error = None;
    }

    pub fn outcome(&self) -> Option<&IngestOutcome> {
        self.outcome.as_ref()
    }

    pub fn table(&self) -> Option<&CoverageTable> {
        self.outcome.as_ref().map(|o| &o.table)
    }

    /// Mutable access for the editing layer (bulk edits, window autofill).
    pub fn table_mut(&mut self) -> Option<&mut CoverageTable> {
        self.outcome.as_mut().map(|o| &mut o.table)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl Default for IngestSession {
    fn default() -> Self {
        Self::new(IngestionPipeline::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_source() -> CandidateSource {
        CandidateSource::new(
            "ChildA_ParentX.csv",
            b"Latitud,Longitud\n14.70,-17.45\n".to_vec(),
        )
    }

    fn bad_source() -> CandidateSource {
        CandidateSource::new("nounderscore.csv", b"Latitud,Longitud\n1,1\n".to_vec())
    }

    #[test]
    fn test_lifecycle_empty_ready_reset() {
        let mut session = IngestSession::default();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.table().is_none());

        session.process(&[good_source()], None).unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.table().map(|t| t.len()), Some(1));

        session.reset();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.table().is_none());
    }

    #[test]
    fn test_failure_discards_table_and_allows_retry() {
        let mut session = IngestSession::default();
        session.process(&[good_source()], None).unwrap();

        assert!(session.process(&[bad_source()], None).is_err());
        assert_eq!(session.state(), SessionState::Failed);
        assert!(session.table().is_none());
        assert!(session.last_error().is_some());

        session.process(&[good_source()], None).unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.last_error().is_none());
    }
}
