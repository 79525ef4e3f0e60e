//! Transcript data model: the structured result of a hum upload.

use crate::error::{HumlyricError, Result};
use serde::{Deserialize, Serialize};

/// One detected note from the hummed melody.
///
/// Immutable once received; the transcript keeps notes in the temporal order
/// the server reported them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// MIDI note number.
    pub midi: i32,
    /// Human-readable pitch name, e.g. "C4".
    pub name: String,
    /// Onset in seconds from clip start.
    pub start: f64,
    /// Duration in seconds.
    pub dur: f64,
}

impl Note {
    /// Check the value constraints the wire contract promises: a non-negative
    /// onset and a positive duration.
    pub fn is_well_formed(&self) -> bool {
        self.start >= 0.0 && self.dur > 0.0
    }

    /// End of the note in seconds from clip start.
    pub fn end(&self) -> f64 {
        self.start + self.dur
    }
}

/// Notes plus seed keywords extracted from one uploaded clip.
///
/// Created atomically on a successful upload. A new transcript wholesale
/// replaces any prior one and invalidates all downstream drafts, pins and
/// cursors; that invalidation is the session controller's job.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// Clip duration as reported by the server.
    pub duration_sec: f64,
    /// Detected notes in temporal order.
    pub notes: Vec<Note>,
    /// Seed keywords, deduplicated, first-seen order preserved for display.
    pub keywords: Vec<String>,
}

impl Transcript {
    /// Build a transcript from server-supplied parts, validating every note
    /// and deduplicating keywords while preserving their first-seen order.
    ///
    /// # Errors
    /// Returns `TranscriptionFailed` if any note violates the wire contract.
    pub fn from_parts(duration_sec: f64, notes: Vec<Note>, keywords: Vec<String>) -> Result<Self> {
        for note in &notes {
            if !note.is_well_formed() {
                return Err(HumlyricError::TranscriptionFailed {
                    message: format!(
                        "malformed note {} (start {}, dur {})",
                        note.name, note.start, note.dur
                    ),
                });
            }
        }

        let mut deduped: Vec<String> = Vec::with_capacity(keywords.len());
        for word in keywords {
            if !deduped.contains(&word) {
                deduped.push(word);
            }
        }

        Ok(Self {
            duration_sec,
            notes,
            keywords: deduped,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
