// src/chunking/flat.rs
use once_cell::sync::Lazy;
use regex::Regex;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("paragraph pattern must compile"));

/// Splits text without numbered headings into paragraph-aligned chunks.
///
/// Paragraphs accumulate until the next one would exceed `max_chars`; the
/// closed chunk's last `overlap` characters open the following chunk. A
/// paragraph that is too long on its own becomes a chunk by itself.
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for paragraph in PARAGRAPH_BREAK.split(text) {
        let para_len = paragraph.chars().count();

        if current_len + para_len > max_chars {
            if current.trim().is_empty() {
                push_trimmed(&mut chunks, paragraph);
            } else {
                push_trimmed(&mut chunks, &current);
                let carried = tail_chars(&current, overlap);
                current = format!("{}\n\n{}", carried, paragraph);
                current_len = current.chars().count();
            }
        } else {
            current.push_str("\n\n");
            current.push_str(paragraph);
            current_len += para_len + 2;
        }
    }

    push_trimmed(&mut chunks, &current);
    chunks
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Last `count` characters of `text`, or all of it when shorter.
fn tail_chars(text: &str, count: usize) -> &str {
    let total = text.chars().count();
    if total <= count {
        return text;
    }
    match text.char_indices().nth(total - count) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}
