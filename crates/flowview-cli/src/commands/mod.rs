pub mod read;
pub mod sections;

use std::path::Path;

use anyhow::{bail, Context, Result};
use flowview_core::headless::parse_book;
use flowview_core::Book;

/// Read and split a book file, refusing empty ones
pub async fn load_book(file: &Path) -> Result<Book> {
    let source = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let book = parse_book(&source);
    if book.is_empty() {
        bail!("{} contains no sections", file.display());
    }
    Ok(book)
}

/// First `max` characters of `text`, with an ellipsis when cut
pub fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push('…');
    out
}
