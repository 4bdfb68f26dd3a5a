use std::path::Path;

use anyhow::Result;
use flowview_core::headless::{BlockKind, Document};
use flowview_core::SectionSource;

use super::excerpt;

pub async fn run(file: &Path) -> Result<()> {
    let book = super::load_book(file).await?;

    println!("{} sections ({:?})", book.len(), book.dir);
    for (index, section) in book.sections.iter().enumerate() {
        let marker = if section.linear() { ' ' } else { '*' };
        let summary = match section.load().await {
            Ok(SectionSource::Inline(text)) => {
                let doc = Document::parse(&text);
                let title = doc
                    .blocks
                    .iter()
                    .find(|b| b.kind == BlockKind::Heading)
                    .or(doc.blocks.first())
                    .map(|b| excerpt(&b.text, 48))
                    .unwrap_or_default();
                format!("{:>3} blocks  {}", doc.blocks.len(), title)
            }
            Ok(SectionSource::Url(url)) => format!("-> {}", url),
            Err(e) => format!("unavailable: {}", e),
        };
        println!("{:>4}{} {}", index, marker, summary);
    }
    println!("(* = non-linear)");

    Ok(())
}
