//! Plain-text section markup
//!
//! ```text
//! @dir rtl
//! @writing-mode vertical-rl
//! @background #fdf6e3
//! @css p { text-indent: 1em }
//! # A heading
//!
//! First paragraph, which may span
//! several source lines.
//!
//! Second paragraph.
//! ```
//!
//! Directive lines start with `@`, headings with `#`, and paragraphs are
//! separated by blank lines.

use crate::book::Direction;
use crate::surface::WritingMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub writing_mode: WritingMode,
    pub direction: Option<Direction>,
    pub background: Option<String>,
    /// Embedded style sheets, in document order
    pub styles: Vec<String>,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn parse(source: &str) -> Self {
        let mut doc = Document::default();
        let mut paragraph: Vec<&str> = Vec::new();

        for line in source.lines() {
            let line = line.trim();
            if line.is_empty() {
                doc.flush(&mut paragraph);
            } else if let Some(directive) = line.strip_prefix('@') {
                doc.flush(&mut paragraph);
                doc.directive(directive);
            } else if let Some(heading) = line.strip_prefix('#') {
                doc.flush(&mut paragraph);
                doc.blocks.push(Block {
                    kind: BlockKind::Heading,
                    text: heading.trim_start_matches('#').trim().to_string(),
                });
            } else {
                paragraph.push(line);
            }
        }
        doc.flush(&mut paragraph);
        doc
    }

    fn flush(&mut self, paragraph: &mut Vec<&str>) {
        if paragraph.is_empty() {
            return;
        }
        self.blocks.push(Block {
            kind: BlockKind::Paragraph,
            text: paragraph.join(" "),
        });
        paragraph.clear();
    }

    fn directive(&mut self, directive: &str) {
        let (name, value) = directive
            .split_once(char::is_whitespace)
            .map(|(n, v)| (n, v.trim()))
            .unwrap_or((directive, ""));
        match name {
            "dir" => {
                self.direction = match value {
                    "rtl" => Some(Direction::Rtl),
                    "ltr" => Some(Direction::Ltr),
                    _ => None,
                }
            }
            "writing-mode" => {
                self.writing_mode = match value {
                    "vertical-rl" => WritingMode::VerticalRl,
                    _ => WritingMode::HorizontalTb,
                }
            }
            "background" if !value.is_empty() => self.background = Some(value.to_string()),
            "css" => self.styles.push(value.to_string()),
            _ => tracing::debug!(directive = name, "Ignoring unknown directive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blocks() {
        let doc = Document::parse("# Title\n\nfirst line\nsecond line\n\n\nnext\n");
        assert_eq!(
            doc.blocks,
            vec![
                Block {
                    kind: BlockKind::Heading,
                    text: "Title".into()
                },
                Block {
                    kind: BlockKind::Paragraph,
                    text: "first line second line".into()
                },
                Block {
                    kind: BlockKind::Paragraph,
                    text: "next".into()
                },
            ]
        );
        assert_eq!(doc.writing_mode, WritingMode::HorizontalTb);
        assert_eq!(doc.direction, None);
    }

    #[test]
    fn test_parse_directives() {
        let doc = Document::parse(
            "@dir rtl\n@writing-mode vertical-rl\n@background #000\n@css p { margin: 0 }\n@bogus\ntext",
        );
        assert_eq!(doc.direction, Some(Direction::Rtl));
        assert_eq!(doc.writing_mode, WritingMode::VerticalRl);
        assert_eq!(doc.background.as_deref(), Some("#000"));
        assert_eq!(doc.styles, vec!["p { margin: 0 }".to_string()]);
        assert_eq!(doc.blocks.len(), 1);
    }

    #[test]
    fn test_directive_breaks_paragraph() {
        let doc = Document::parse("one\n@css a{}\ntwo");
        assert_eq!(doc.blocks.len(), 2);
    }
}
