//! Token-aware Markdown chunking.
//!
//! Documents are split at header boundaries so each stored chunk covers one
//! coherent section. The token count of the whole document decides the
//! splitting depth: short documents split at `#` headers only, long ones
//! also at `##`. Header lines stay attached to their section text.

use anyhow::{Context, Result};
use tiktoken_rs::CoreBPE;

/// Token-counting Markdown chunker.
pub struct Chunker {
    tokenizer: CoreBPE,
    token_limit: usize,
}

impl Chunker {
    /// Creates a chunker with the given token limit.
    ///
    /// Loads the `cl100k_base` tokenizer, the encoding used by the
    /// embedding models in play.
    pub fn new(token_limit: usize) -> Result<Self> {
        let tokenizer = tiktoken_rs::cl100k_base().context("Failed to load cl100k_base tokenizer")?;
        Ok(Self {
            tokenizer,
            token_limit,
        })
    }

    /// Counts tokens in a text.
    pub fn count_tokens(&self, text: &str) -> usize {
        self.tokenizer.encode_with_special_tokens(text).len()
    }

    /// Splits Markdown content into chunks.
    ///
    /// Documents within the token limit split at top-level headers only;
    /// larger documents also split at second-level headers. Content before
    /// the first header forms its own chunk.
    pub fn chunk(&self, content: &str) -> Vec<String> {
        let num_tokens = self.count_tokens(content);
        let levels = if num_tokens <= self.token_limit { 1 } else { 2 };
        tracing::debug!(num_tokens, levels, "splitting content by headers");
        split_by_headers(content, levels)
    }
}

/// Splits Markdown at header lines up to `levels` deep.
///
/// Header lines are kept with the section they open. Empty sections are
/// dropped; content with no headers comes back as a single chunk.
pub fn split_by_headers(content: &str, levels: usize) -> Vec<String> {
    let mut sections: Vec<String> = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();

    for line in content.lines() {
        if is_header(line, levels) {
            flush_section(&mut sections, &mut buffer);
            buffer.push(line);
        } else {
            buffer.push(line);
        }
    }
    flush_section(&mut sections, &mut buffer);

    sections
}

fn flush_section(sections: &mut Vec<String>, buffer: &mut Vec<&str>) {
    if buffer.is_empty() {
        return;
    }
    let section = buffer.join("\n").trim().to_string();
    buffer.clear();
    if !section.is_empty() {
        sections.push(section);
    }
}

/// Returns true for a Markdown header line of at most `levels` hashes.
fn is_header(line: &str, levels: usize) -> bool {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    hashes >= 1 && hashes <= levels && trimmed[hashes..].starts_with(' ')
}
