//! Draft text model: addressable multi-draft lyric structure.
//!
//! A draft's text is opaque backend output whose only structure the client
//! relies on is the `\n` line delimiter. Everything here preserves the text
//! verbatim except for the single explicit line replacement.

use crate::error::{HumlyricError, Result};

/// One full candidate lyric text, addressable by line index.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    text: String,
}

impl Draft {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Full text, byte-for-byte as the backend produced it (modulo applied
    /// line replacements).
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines().nth(index)
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }

    /// Replace exactly one line in place, leaving every other line untouched.
    ///
    /// # Errors
    /// Returns `PreconditionFailed` if `index` addresses no existing line.
    pub fn replace_line(&mut self, index: usize, replacement: &str) -> Result<()> {
        let mut segments: Vec<&str> = self.text.split('\n').collect();
        if index >= segments.len() {
            return Err(HumlyricError::precondition(format!(
                "line {} out of range ({} lines)",
                index,
                segments.len()
            )));
        }
        segments[index] = replacement;
        self.text = segments.join("\n");
        Ok(())
    }
}

/// The batch of drafts produced by one generation call.
///
/// Wholesale-replaced, never merged. The `generation` value is the identity
/// checked by stale-result suppression: a line-regeneration response is only
/// applied while the draft set it was issued against is still the live one.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftSet {
    drafts: Vec<Draft>,
    generation: u64,
}

impl DraftSet {
    pub fn new(texts: Vec<String>, generation: u64) -> Self {
        Self {
            drafts: texts.into_iter().map(Draft::new).collect(),
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn drafts(&self) -> &[Draft] {
        &self.drafts
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn draft(&self, index: usize) -> Option<&Draft> {
        self.drafts.get(index)
    }

    /// The text of the line a cursor points at, if it exists.
    pub fn line(&self, cursor: EditCursor) -> Option<&str> {
        self.draft(cursor.draft)?.line(cursor.line)
    }

    /// Whether a cursor addresses an existing line.
    pub fn contains(&self, cursor: EditCursor) -> bool {
        self.line(cursor).is_some()
    }

    /// Replace the single line the cursor addresses.
    pub fn replace_line(&mut self, cursor: EditCursor, replacement: &str) -> Result<()> {
        let draft = self.drafts.get_mut(cursor.draft).ok_or_else(|| {
            HumlyricError::precondition(format!("draft {} out of range", cursor.draft))
        })?;
        draft.replace_line(cursor.line, replacement)
    }
}

/// Pointer to the single line currently open for alternative selection.
///
/// Purely a reference into the live [`DraftSet`], not an ownership relation;
/// any draft set replacement invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditCursor {
    pub draft: usize,
    pub line: usize,
}

impl EditCursor {
    pub fn new(draft: usize, line: usize) -> Self {
        Self { draft, line }
    }
}

/// Candidate replacement lines for the line an [`EditCursor`] points at.
///
/// Ephemeral: valid only while the originating cursor value is unchanged;
/// discarded when the cursor moves or a pick is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct AltCandidateSet {
    pub cursor: EditCursor,
    pub alts: Vec<String>,
}
