//! Pinned words: user-curated words every generation request must respect.

/// A duplicate-free set of pinned words.
///
/// Display order is toggle order. Mutated only by explicit toggles; the
/// session controller resets it when a new transcript replaces the old one,
/// never on draft regeneration or line editing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PinSet {
    words: Vec<String>,
}

impl PinSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `word` if absent, remove it if present. Pure and synchronous;
    /// toggling the same word twice restores the prior set.
    pub fn toggle(&mut self, word: &str) {
        if let Some(pos) = self.words.iter().position(|w| w == word) {
            self.words.remove(pos);
        } else {
            self.words.push(word.to_string());
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// Clone of the current pins for embedding in the next request.
    pub fn snapshot(&self) -> Vec<String> {
        self.words.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }
}
