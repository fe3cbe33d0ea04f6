//! Splits text into overlapping word windows.

use crate::error::{MemoryError, Result};

/// Fixed-size word windows with overlap. `overlap < size` is checked once, in
/// [`Chunker::new`], so [`Chunker::chunk`] always makes progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(MemoryError::InvalidConfig(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if overlap >= size {
            return Err(MemoryError::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Words the start index advances per window.
    pub fn step(&self) -> usize {
        self.size - self.overlap
    }

    /// Returns the windows of `text` in source order, words joined by single spaces.
    ///
    /// Text of at most `size` words (including empty text) yields exactly one chunk.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() <= self.size {
            return vec![words.join(" ")];
        }

        (0..words.len())
            .step_by(self.step())
            .map(|start| {
                let end = (start + self.size).min(words.len());
                words[start..end].join(" ")
            })
            .collect()
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            size: 250,
            overlap: 50,
        }
    }
}
