use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::book::{Book, Direction, Section, SectionSource};
use crate::{Error, Result};

/// Section held in memory
#[derive(Debug, Default)]
pub struct TextSection {
    text: String,
    linear: bool,
    failure: Option<String>,
    latency: Duration,
    loads: AtomicUsize,
    unloads: AtomicUsize,
}

impl TextSection {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            linear: true,
            ..Default::default()
        }
    }

    pub fn nonlinear(mut self) -> Self {
        self.linear = false;
        self
    }

    /// Every load fails with `message`
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Delay every load, as if fetching over the network
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn unload_count(&self) -> usize {
        self.unloads.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl Section for TextSection {
    fn linear(&self) -> bool {
        self.linear
    }

    async fn load(&self) -> Result<SectionSource> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.loads.fetch_add(1, Ordering::Relaxed);
        match &self.failure {
            Some(message) => Err(Error::Other(message.clone())),
            None => Ok(SectionSource::Inline(self.text.clone())),
        }
    }

    fn unload(&self) {
        self.unloads.fetch_add(1, Ordering::Relaxed);
    }
}

/// Split a multi-section text file into a [`Book`].
///
/// Each `===` line starts a section; a trailing `nonlinear` word marks it
/// as skipped by page turns. Text before the first marker forms a section
/// of its own, and a leading `@book-dir rtl` sets the book direction.
pub fn parse_book(source: &str) -> Book {
    let mut dir = Direction::Ltr;
    let mut sections: Vec<TextSection> = Vec::new();
    let mut current: Option<(bool, Vec<&str>)> = None;

    for line in source.lines() {
        if let Some(marker) = line.trim_start().strip_prefix("===") {
            if let Some((linear, body)) = current.take() {
                sections.push(section(linear, &body));
            }
            let nonlinear = marker.split_whitespace().any(|w| w == "nonlinear");
            current = Some((!nonlinear, Vec::new()));
            continue;
        }
        match current.as_mut() {
            Some((_, body)) => body.push(line),
            None => {
                if let Some(value) = line.trim().strip_prefix("@book-dir") {
                    if value.trim() == "rtl" {
                        dir = Direction::Rtl;
                    }
                } else if !line.trim().is_empty() {
                    current = Some((true, vec![line]));
                }
            }
        }
    }
    if let Some((linear, body)) = current {
        sections.push(section(linear, &body));
    }

    Book::new(
        sections
            .into_iter()
            .map(|s| Arc::new(s) as Arc<dyn Section>)
            .collect(),
    )
    .with_dir(dir)
}

fn section(linear: bool, body: &[&str]) -> TextSection {
    let section = TextSection::new(body.join("\n"));
    if linear {
        section
    } else {
        section.nonlinear()
    }
}
