use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tokio::sync::{mpsc, watch};

use flowview_core::headless::HeadlessHost;
use flowview_core::surface::Size;
use flowview_core::{
    Anchor, NavigationOutcome, NavigationRequest, Scroller, ScrollerConfig, ScrollerEvent,
};

use super::excerpt;

#[derive(Args)]
pub struct ReadArgs {
    /// Book file; sections are separated by `===` lines
    pub file: PathBuf,

    /// Section to open
    #[arg(short, long, default_value_t = 0)]
    pub index: usize,

    /// Start at this proportion of the section, 0 to 1
    #[arg(short, long)]
    pub fraction: Option<f64>,

    /// Page forward this many times after opening
    #[arg(long, default_value_t = 0)]
    pub next: usize,

    /// Then page backward this many times
    #[arg(long, default_value_t = 0)]
    pub prev: usize,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 800.0)]
    pub width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 600.0)]
    pub height: f64,

    /// Configuration file (default: ~/.config/flowview/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print one JSON object per event
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct OutcomeLine<'a> {
    event: &'static str,
    action: &'a str,
    outcome: NavigationOutcome,
}

pub async fn run(args: ReadArgs) -> Result<()> {
    let book = super::load_book(&args.file).await?;
    let config = match &args.config {
        Some(path) => ScrollerConfig::load_from(path)?,
        None => ScrollerConfig::load()?,
    };

    let host = HeadlessHost::new(Size::new(args.width, args.height));
    let scroller = Scroller::new(book, Arc::new(host), config);
    let mut events = scroller.subscribe();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_loop = tokio::spawn(scroller.clone().run(shutdown_rx));

    let mut request = NavigationRequest::new(args.index);
    if let Some(fraction) = args.fraction {
        request = request.with_anchor(Anchor::Fraction(fraction));
    }
    let outcome = scroller.go_to(request).await;
    report(&scroller, &mut events, "open", outcome, args.json).await?;

    for _ in 0..args.next {
        let outcome = scroller.next(None).await;
        report(&scroller, &mut events, "next", outcome, args.json).await?;
    }
    for _ in 0..args.prev {
        let outcome = scroller.prev(None).await;
        report(&scroller, &mut events, "prev", outcome, args.json).await?;
    }

    shutdown_tx.send_replace(true);
    signal_loop.await?;
    scroller.destroy().await;

    Ok(())
}

/// Print the outcome of one action and every event it produced
async fn report(
    scroller: &Scroller,
    events: &mut mpsc::UnboundedReceiver<ScrollerEvent>,
    action: &str,
    outcome: NavigationOutcome,
    json: bool,
) -> Result<()> {
    if outcome != NavigationOutcome::Settled {
        if json {
            let line = OutcomeLine {
                event: "outcome",
                action,
                outcome,
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!("[{}] {:?}", action, outcome);
        }
    }

    while let Ok(event) = events.try_recv() {
        if json {
            println!("{}", serde_json::to_string(&event)?);
            continue;
        }
        match event {
            ScrollerEvent::Relocate(relocate) => {
                let text = scroller
                    .text(relocate.range.into())
                    .await
                    .unwrap_or_default();
                let words: Vec<&str> = text.split_whitespace().collect();
                println!(
                    "[{}] section {} at {:.1}%  {}",
                    format!("{:?}", relocate.reason).to_lowercase(),
                    relocate.index,
                    relocate.fraction * 100.0,
                    excerpt(&words.join(" "), 60)
                );
            }
            ScrollerEvent::Load(load) => {
                let mut flags = String::new();
                if load.vertical {
                    flags.push_str(" vertical-rl");
                }
                if load.rtl {
                    flags.push_str(" rtl");
                }
                println!("[load] section {}{}", load.index, flags);
            }
            ScrollerEvent::CreateOverlayer { .. } | ScrollerEvent::Scroll { .. } => {}
        }
    }

    Ok(())
}
