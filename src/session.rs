//! Session controller: the state machine composing capture, upload, draft
//! generation and per-line regeneration.
//!
//! Single-writer model: the controller is the only mutator of the transcript,
//! pin set, draft set and edit cursor; the driving layer (CLI, UI) reads
//! accessors and feeds completion events back in. Every network dispatch
//! carries an identity token; a completion is applied only if its token still
//! matches the in-flight one and, for line regeneration, the edit cursor and
//! draft-set generation are unchanged since dispatch. Anything else is a
//! stale result and is silently discarded — superseded requests are never
//! cancelled, their responses just stop mattering.

use crate::audio::{CaptureController, CaptureDevice};
use crate::backend::{DraftRequest, LineRequest, LyricsBackend};
use crate::drafts::{AltCandidateSet, DraftSet, EditCursor};
use crate::error::{HumlyricError, Result};
use crate::pins::PinSet;
use crate::transcript::Transcript;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Stable and transitional states of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Uploading,
    Transcribed,
    GeneratingDrafts,
    DraftsReady,
}

/// Identity of one line-regeneration dispatch: the request token, the
/// draft-set generation and the cursor valid at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegenTag {
    pub token: u64,
    pub generation: u64,
    pub cursor: EditCursor,
}

/// Completion of one asynchronous exchange, delivered back to the controller.
#[derive(Debug)]
pub enum SessionEvent {
    UploadFinished {
        token: u64,
        result: Result<Transcript>,
    },
    DraftsFinished {
        token: u64,
        result: Result<Vec<String>>,
    },
    LineAlternatives {
        tag: RegenTag,
        result: Result<Vec<String>>,
    },
}

/// Receiving side of the session's completion channel.
///
/// The driver multiplexes this with user input and hands each event to
/// [`SessionController::apply_event`].
pub struct SessionEvents {
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionEvents {
    pub async fn next(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    pub fn try_next(&mut self) -> Option<SessionEvent> {
        self.rx.try_recv().ok()
    }
}

/// Top-level state machine owning the canonical draft set and edit cursor.
pub struct SessionController {
    backend: Arc<dyn LyricsBackend>,
    capture: CaptureController,
    genre: String,

    state: SessionState,
    transcript: Option<Transcript>,
    pins: PinSet,
    drafts: Option<DraftSet>,
    cursor: Option<EditCursor>,
    alts: Option<AltCandidateSet>,
    last_failure: Option<String>,

    token_counter: u64,
    generation_counter: u64,
    upload_token: Option<u64>,
    drafts_token: Option<u64>,
    regen_tag: Option<RegenTag>,

    events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionController {
    /// Create a controller and the event stream its dispatches complete on.
    pub fn new(
        backend: Arc<dyn LyricsBackend>,
        device: Box<dyn CaptureDevice>,
        genre: impl Into<String>,
    ) -> (Self, SessionEvents) {
        let (events_tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            backend,
            capture: CaptureController::new(device),
            genre: genre.into(),
            state: SessionState::Idle,
            transcript: None,
            pins: PinSet::new(),
            drafts: None,
            cursor: None,
            alts: None,
            last_failure: None,
            token_counter: 0,
            generation_counter: 0,
            upload_token: None,
            drafts_token: None,
            regen_tag: None,
            events_tx,
        };
        (controller, SessionEvents { rx })
    }

    // ---- read accessors (driver renders from these) ----

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    pub fn pins(&self) -> &PinSet {
        &self.pins
    }

    pub fn drafts(&self) -> Option<&DraftSet> {
        self.drafts.as_ref()
    }

    pub fn cursor(&self) -> Option<EditCursor> {
        self.cursor
    }

    pub fn alt_candidates(&self) -> Option<&AltCandidateSet> {
        self.alts.as_ref()
    }

    /// Human-readable reason of the most recent failure, if any.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn set_genre(&mut self, genre: impl Into<String>) {
        self.genre = genre.into();
    }

    // ---- commands ----

    /// Begin recording. Legal from any stable state; re-recording with
    /// drafts on screen is allowed (the downstream tree is discarded when
    /// the new clip is uploaded, not here).
    ///
    /// A `DeviceUnavailable` failure leaves the session state untouched and
    /// is surfaced via [`last_failure`](Self::last_failure).
    ///
    /// # Errors
    /// `PreconditionFailed` while an upload or generation is outstanding.
    pub fn start_recording(&mut self) -> Result<()> {
        match self.state {
            SessionState::Idle | SessionState::Transcribed | SessionState::DraftsReady => {}
            other => {
                return Err(HumlyricError::precondition(format!(
                    "cannot start recording in state {:?}",
                    other
                )));
            }
        }

        match self.capture.start() {
            Ok(()) => {
                self.last_failure = None;
                self.state = SessionState::Recording;
                Ok(())
            }
            Err(err @ HumlyricError::CaptureActive) => Err(err),
            Err(err) => {
                // Device could not be acquired; the session never left its
                // stable state and all committed data survives.
                self.last_failure = Some(err.to_string());
                Ok(())
            }
        }
    }

    /// Drain buffered audio while recording. Call periodically; a device
    /// error here aborts the recording (full downstream reset, back to Idle).
    pub fn poll_capture(&mut self) {
        if self.state != SessionState::Recording {
            return;
        }
        if let Err(err) = self.capture.poll() {
            let _ = self.capture.stop();
            self.reset_downstream();
            self.state = SessionState::Idle;
            self.last_failure = Some(err.to_string());
        }
    }

    /// Finalize the clip and dispatch the upload. No-op outside Recording.
    ///
    /// Stopping is the commitment point: the old transcript and everything
    /// downstream of it are discarded unconditionally, whether or not the
    /// upload then succeeds.
    pub fn stop_recording(&mut self) -> Result<()> {
        if self.state != SessionState::Recording {
            return Ok(());
        }

        let clip = match self.capture.stop() {
            Ok(Some(clip)) => clip,
            Ok(None) => {
                return Err(HumlyricError::precondition(
                    "recording state with no active capture",
                ));
            }
            Err(err) => {
                self.reset_downstream();
                self.state = SessionState::Idle;
                self.last_failure = Some(err.to_string());
                return Ok(());
            }
        };

        self.reset_downstream();
        let token = self.next_token();
        self.upload_token = Some(token);
        self.state = SessionState::Uploading;
        tracing::debug!(token, format = ?clip.format, "dispatching clip upload");

        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.upload(&clip).await;
            let _ = tx.send(SessionEvent::UploadFinished { token, result });
        });
        Ok(())
    }

    /// Dispatch a draft-batch generation with the current pins and genre.
    ///
    /// # Errors
    /// `PreconditionFailed` without a transcript (only `Transcribed` and
    /// `DraftsReady` can generate).
    pub fn generate(&mut self) -> Result<()> {
        if !matches!(
            self.state,
            SessionState::Transcribed | SessionState::DraftsReady
        ) {
            return Err(HumlyricError::precondition(
                "generate requires a successful transcript",
            ));
        }
        let transcript = self
            .transcript
            .as_ref()
            .ok_or_else(|| HumlyricError::precondition("generate requires a transcript"))?;

        // Pins are snapshotted now, at call time, never earlier.
        let request = DraftRequest {
            notes: transcript.notes.clone(),
            keywords: transcript.keywords.clone(),
            genre: self.genre.clone(),
            pinned: self.pins.snapshot(),
        };

        let token = self.next_token();
        self.drafts_token = Some(token);
        self.state = SessionState::GeneratingDrafts;
        tracing::debug!(token, genre = %request.genre, "dispatching draft generation");

        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.generate_drafts(&request).await;
            let _ = tx.send(SessionEvent::DraftsFinished { token, result });
        });
        Ok(())
    }

    /// Open one line for alternative selection, replacing any prior open
    /// line and discarding its candidates.
    ///
    /// # Errors
    /// `PreconditionFailed` outside `DraftsReady` or if `(draft, line)`
    /// addresses no existing line.
    pub fn open_line(&mut self, draft: usize, line: usize) -> Result<()> {
        if self.state != SessionState::DraftsReady {
            return Err(HumlyricError::precondition(
                "line editing requires generated drafts",
            ));
        }
        let cursor = EditCursor::new(draft, line);
        let drafts = self
            .drafts
            .as_ref()
            .ok_or_else(|| HumlyricError::precondition("no drafts present"))?;
        if !drafts.contains(cursor) {
            return Err(HumlyricError::precondition(format!(
                "no line at draft {} line {}",
                draft, line
            )));
        }

        self.cursor = Some(cursor);
        self.alts = None;
        self.regen_tag = None;
        Ok(())
    }

    /// Close the open line, dropping its candidates.
    pub fn close_line(&mut self) {
        self.cursor = None;
        self.alts = None;
        self.regen_tag = None;
    }

    /// Dispatch regeneration for the open line. The request is tagged with
    /// the cursor and draft-set generation valid right now; the response is
    /// applied only if both still hold when it arrives.
    ///
    /// # Errors
    /// `PreconditionFailed` if no line is open.
    pub fn regenerate_line(&mut self) -> Result<()> {
        let cursor = self
            .cursor
            .ok_or_else(|| HumlyricError::precondition("no line open for regeneration"))?;
        let drafts = self
            .drafts
            .as_ref()
            .ok_or_else(|| HumlyricError::precondition("no drafts present"))?;
        let line = drafts
            .line(cursor)
            .ok_or_else(|| HumlyricError::precondition("cursor points at no line"))?
            .to_string();
        let generation = drafts.generation();

        let request = LineRequest {
            line,
            genre: self.genre.clone(),
            pinned: self.pins.snapshot(),
        };
        let tag = RegenTag {
            token: self.next_token(),
            generation,
            cursor,
        };
        self.regen_tag = Some(tag);
        tracing::debug!(token = tag.token, ?cursor, "dispatching line regeneration");

        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.regenerate_line(&request).await;
            let _ = tx.send(SessionEvent::LineAlternatives { tag, result });
        });
        Ok(())
    }

    /// Apply one candidate: replaces exactly one line of exactly one draft
    /// in place, then closes the line.
    ///
    /// # Errors
    /// `PreconditionFailed` if no candidates are present or `index` is out
    /// of range.
    pub fn apply_pick(&mut self, index: usize) -> Result<()> {
        let cursor = self
            .cursor
            .ok_or_else(|| HumlyricError::precondition("no line open"))?;
        let alts = self
            .alts
            .as_ref()
            .ok_or_else(|| HumlyricError::precondition("no alternatives to pick from"))?;
        // Candidates and cursor are cleared together, so a mismatch here is
        // a bug upstream.
        if alts.cursor != cursor {
            return Err(HumlyricError::precondition(
                "alternatives belong to a different line",
            ));
        }
        let replacement = alts
            .alts
            .get(index)
            .ok_or_else(|| {
                HumlyricError::precondition(format!("no alternative at index {}", index))
            })?
            .clone();

        let drafts = self
            .drafts
            .as_mut()
            .ok_or_else(|| HumlyricError::precondition("no drafts present"))?;
        drafts.replace_line(cursor, &replacement)?;

        self.close_line();
        Ok(())
    }

    /// Toggle a pinned word. Legal in any state once a transcript exists;
    /// never triggers a regeneration by itself.
    ///
    /// # Errors
    /// `PreconditionFailed` without a transcript.
    pub fn toggle_pin(&mut self, word: &str) -> Result<()> {
        if self.transcript.is_none() {
            return Err(HumlyricError::precondition("pins require a transcript"));
        }
        self.pins.toggle(word);
        Ok(())
    }

    // ---- completions ----

    /// Reconcile one completion event against current state. Stale results
    /// are discarded without any visible change.
    pub fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::UploadFinished { token, result } => {
                if self.upload_token != Some(token) || self.state != SessionState::Uploading {
                    tracing::debug!(token, "discarding stale upload completion");
                    return;
                }
                self.upload_token = None;
                match result {
                    Ok(transcript) => {
                        self.transcript = Some(transcript);
                        self.last_failure = None;
                        self.state = SessionState::Transcribed;
                    }
                    Err(err) => {
                        // No valid transcript exists; downstream was already
                        // cleared at dispatch.
                        self.last_failure = Some(err.to_string());
                        self.state = SessionState::Idle;
                    }
                }
            }
            SessionEvent::DraftsFinished { token, result } => {
                if self.drafts_token != Some(token) || self.state != SessionState::GeneratingDrafts
                {
                    tracing::debug!(token, "discarding stale draft batch");
                    return;
                }
                self.drafts_token = None;
                match result {
                    Ok(texts) => {
                        self.generation_counter += 1;
                        self.drafts = Some(DraftSet::new(texts, self.generation_counter));
                        // A fresh batch invalidates the cursor and anything
                        // tied to it.
                        self.cursor = None;
                        self.alts = None;
                        self.regen_tag = None;
                        self.last_failure = None;
                        self.state = SessionState::DraftsReady;
                    }
                    Err(err) => {
                        // Prior drafts and cursor survive untouched.
                        self.last_failure = Some(err.to_string());
                        self.state = if self.drafts.is_some() {
                            SessionState::DraftsReady
                        } else {
                            SessionState::Transcribed
                        };
                    }
                }
            }
            SessionEvent::LineAlternatives { tag, result } => {
                let live = self.regen_tag == Some(tag)
                    && self.cursor == Some(tag.cursor)
                    && self.drafts.as_ref().map(DraftSet::generation) == Some(tag.generation);
                if !live {
                    tracing::debug!(token = tag.token, "discarding stale line alternatives");
                    return;
                }
                self.regen_tag = None;
                match result {
                    Ok(alts) => {
                        self.alts = Some(AltCandidateSet {
                            cursor: tag.cursor,
                            alts,
                        });
                        self.last_failure = None;
                    }
                    Err(err) => {
                        // Only suppresses new candidates; draft set and
                        // cursor stay as they are, the user may retry.
                        self.last_failure = Some(err.to_string());
                    }
                }
            }
        }
    }

    // ---- internals ----

    fn next_token(&mut self) -> u64 {
        self.token_counter += 1;
        self.token_counter
    }

    /// Discard the transcript and the entire tree hanging off it.
    fn reset_downstream(&mut self) {
        self.transcript = None;
        self.pins.clear();
        self.drafts = None;
        self.cursor = None;
        self.alts = None;
        self.regen_tag = None;
        self.drafts_token = None;
    }
}
