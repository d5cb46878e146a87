use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One labeled piece of transcript text, e.g. speaker "AI".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub speaker: String,
    pub text: String,
}

/// Rolling buffer of the most recent transcript fragments.
///
/// Append-only with FIFO eviction once the bound is exceeded. Fragments
/// are stored verbatim; no merging or normalization.
#[derive(Debug)]
pub struct TranscriptBuffer {
    entries: VecDeque<TranscriptFragment>,
    depth: usize,
}

impl TranscriptBuffer {
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            entries: VecDeque::with_capacity(depth),
            depth,
        }
    }

    pub fn append(&mut self, speaker: &str, text: &str) {
        if self.entries.len() >= self.depth {
            self.entries.pop_front();
        }
        self.entries.push_back(TranscriptFragment {
            speaker: speaker.to_string(),
            text: text.to_string(),
        });
    }

    /// Fragments in arrival order, oldest first.
    pub fn fragments(&self) -> impl Iterator<Item = &TranscriptFragment> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&TranscriptFragment> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
