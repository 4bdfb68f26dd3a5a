//! End-to-end navigation against the in-process engine.
//!
//! Unless a test says otherwise the viewport is 200x100 with no margins and
//! no gap. With the default 8x20 metrics every `pNN` paragraph is one line
//! tall, so block `i` starts at `30 * i`, its element is node `2i + 1` and
//! its text node `2i + 2`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Instant};

use flowview_core::headless::{FontMetrics, HeadlessHost, TextSection, WebFont};
use flowview_core::surface::{Overlayer, Size};
use flowview_core::{
    Anchor, Book, ContentPosition, ContentRange, Direction, LayoutConfig, NavigationOutcome,
    NavigationRequest, Phase, RelocateEvent, RelocateReason, Scroller, ScrollerConfig,
    ScrollerEvent, Section,
};

fn flat_config() -> ScrollerConfig {
    ScrollerConfig {
        layout: LayoutConfig {
            gap_percent: 0.0,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            max_inline_size: 10_000.0,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn small_host() -> HeadlessHost {
    HeadlessHost::new(Size::new(200.0, 100.0))
}

/// `count` one-line paragraphs, 1190px tall for 40 of them
fn paragraphs(count: usize) -> String {
    (0..count)
        .map(|i| format!("p{:02}", i))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn book_of(sections: &[Arc<TextSection>]) -> Book {
    Book::new(
        sections
            .iter()
            .map(|s| s.clone() as Arc<dyn Section>)
            .collect(),
    )
}

fn long_book() -> Book {
    book_of(&[Arc::new(TextSection::new(paragraphs(40)))])
}

fn open(book: Book, host: &HeadlessHost, config: ScrollerConfig) -> Arc<Scroller> {
    Scroller::new(book, Arc::new(host.clone()), config)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ScrollerEvent>) -> Vec<ScrollerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn relocations(events: &[ScrollerEvent]) -> Vec<RelocateEvent> {
    events
        .iter()
        .filter_map(|e| match e {
            ScrollerEvent::Relocate(r) => Some(*r),
            _ => None,
        })
        .collect()
}

fn position(host: &HeadlessHost) -> f64 {
    host.scroll_position().expect("a section is displayed")
}

#[tokio::test(start_paused = true)]
async fn test_open_emits_load_overlayer_then_relocate() {
    let host = small_host();
    let scroller = open(long_book(), &host, flat_config());
    let mut rx = scroller.subscribe();

    let outcome = scroller
        .go_to(NavigationRequest::new(0).with_anchor(Anchor::Fraction(0.37)))
        .await;
    assert_eq!(outcome, NavigationOutcome::Settled);

    let events = drain(&mut rx);
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], ScrollerEvent::Load(load) if load.index == 0 && !load.rtl && !load.vertical));
    assert!(matches!(&events[1], ScrollerEvent::CreateOverlayer { index: 0, .. }));
    let ScrollerEvent::Relocate(relocate) = &events[2] else {
        panic!("expected a relocation, got {:?}", events[2]);
    };
    assert_eq!(relocate.reason, RelocateReason::Navigation);
    assert_eq!(relocate.index, 0);
    assert!((relocate.fraction - 0.37).abs() < 1e-9);

    // 0.37 * 1190 = 440.3 cuts block 14 off; block 15 is the first whole one
    assert!((position(&host) - 440.3).abs() < 1e-9);
    assert_eq!(relocate.range.from, ContentPosition::new(31, 0));
    assert_eq!(relocate.range.to.node, 38);

    // navigation keeps the requested anchor
    assert_eq!(scroller.anchor().await, Anchor::Fraction(0.37));
    assert_eq!(scroller.index().await, Some(0));
}

#[tokio::test(start_paused = true)]
async fn test_settling_twice_reports_the_same_range() {
    let host = small_host();
    let scroller = open(long_book(), &host, flat_config());
    scroller
        .go_to(NavigationRequest::new(0).with_anchor(Anchor::Fraction(0.37)))
        .await;

    let first = scroller.relocate_now().await.unwrap();
    let second = scroller.relocate_now().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.reason, RelocateReason::Scroll);
    assert_eq!(scroller.anchor().await, Anchor::Range(first.range.into()));

    // re-anchoring to the reported range aligns its first block
    let anchor = scroller.anchor().await;
    assert_eq!(
        scroller.scroll_to_anchor(anchor, false).await,
        NavigationOutcome::Settled
    );
    assert_eq!(position(&host), 450.0);

    let third = scroller.relocate_now().await.unwrap();
    assert_eq!(third.range, first.range);
}

#[tokio::test(start_paused = true)]
async fn test_second_navigation_is_dropped_while_locked() {
    let sections: Vec<Arc<TextSection>> = (0..6)
        .map(|i| {
            Arc::new(
                TextSection::new(format!("chapter {}", i))
                    .with_latency(Duration::from_millis(10)),
            )
        })
        .collect();
    let host = small_host();
    let scroller = open(book_of(&sections), &host, flat_config());
    let mut rx = scroller.subscribe();

    let (first, second) = tokio::join!(
        scroller.go_to(NavigationRequest::new(5)),
        scroller.go_to(NavigationRequest::new(2)),
    );
    assert_eq!(first, NavigationOutcome::Settled);
    assert_eq!(second, NavigationOutcome::Locked);
    assert_eq!(scroller.index().await, Some(5));
    assert_eq!(sections[2].load_count(), 0);

    let relocated = relocations(&drain(&mut rx));
    assert_eq!(relocated.len(), 1);
    assert_eq!(relocated[0].index, 5);

    // the lock is released once the first navigation completes
    assert!(!scroller.is_locked());
    assert_eq!(
        scroller.go_to(NavigationRequest::new(2)).await,
        NavigationOutcome::Settled
    );
    assert_eq!(sections[5].unload_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_page_turns_walk_the_section_and_stop_at_both_ends() {
    let host = small_host();
    let scroller = open(long_book(), &host, flat_config());
    let mut rx = scroller.subscribe();
    scroller.go_to(NavigationRequest::new(0)).await;
    assert!(scroller.at_start().await);
    drain(&mut rx);

    let mut forward = Vec::new();
    while scroller.next(None).await == NavigationOutcome::Settled {
        forward.push(position(&host));
    }
    let mut expected: Vec<f64> = (1..=10).map(|i| i as f64 * 100.0).collect();
    expected.push(1090.0);
    assert_eq!(forward, expected);
    assert!(scroller.at_end().await);
    assert_eq!(scroller.next(None).await, NavigationOutcome::OutOfRange);

    let mut backward = Vec::new();
    while scroller.prev(None).await == NavigationOutcome::Settled {
        backward.push(position(&host));
    }
    let mut expected: Vec<f64> = (0..10).rev().map(|i| i as f64 * 100.0 + 90.0).collect();
    expected.push(0.0);
    assert_eq!(backward, expected);
    assert!(scroller.at_start().await);

    // in-section turns settle as scroll relocations and replace the anchor
    let relocated = relocations(&drain(&mut rx));
    assert_eq!(relocated.len(), 22);
    assert!(relocated.iter().all(|r| r.reason == RelocateReason::Scroll));
    assert!(matches!(scroller.anchor().await, Anchor::Range(_)));
}

#[tokio::test(start_paused = true)]
async fn test_turn_by_explicit_distance() {
    let host = small_host();
    let scroller = open(long_book(), &host, flat_config());
    scroller.go_to(NavigationRequest::new(0)).await;

    scroller.next(Some(35.0)).await;
    assert_eq!(position(&host), 35.0);
    scroller.prev(Some(20.0)).await;
    assert_eq!(position(&host), 15.0);
    scroller.prev(Some(50.0)).await;
    assert_eq!(position(&host), 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_turns_skip_non_linear_sections() {
    let sections = [
        Arc::new(TextSection::new("a1\n\na2")),
        Arc::new(TextSection::new("note").nonlinear()),
        Arc::new(TextSection::new("c1\n\nc2")),
    ];
    let host = small_host();
    let scroller = open(book_of(&sections), &host, flat_config());
    scroller.go_to(NavigationRequest::new(0)).await;

    assert_eq!(scroller.next(None).await, NavigationOutcome::Settled);
    assert_eq!(scroller.index().await, Some(2));
    assert_eq!(sections[1].load_count(), 0);

    assert_eq!(scroller.next(None).await, NavigationOutcome::OutOfRange);
    assert!(scroller.at_end().await);

    assert_eq!(scroller.prev(None).await, NavigationOutcome::Settled);
    assert_eq!(scroller.index().await, Some(0));
    assert!(scroller.at_start().await);

    // non-linear sections stay reachable by index
    assert_eq!(
        scroller.go_to(NavigationRequest::new(1)).await,
        NavigationOutcome::Settled
    );
    assert_eq!(scroller.index().await, Some(1));
    assert_eq!(scroller.next(None).await, NavigationOutcome::Settled);
    assert_eq!(scroller.index().await, Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_requests_without_a_target() {
    let host = small_host();
    let scroller = open(long_book(), &host, flat_config());
    let mut rx = scroller.subscribe();

    assert_eq!(scroller.next(None).await, NavigationOutcome::Unavailable);
    assert!(scroller.relocate_now().await.is_none());
    assert!(scroller.visible_range().await.is_none());
    assert!(!scroller.at_start().await);
    assert!(!scroller.at_end().await);

    assert_eq!(
        scroller.go_to(NavigationRequest::new(99)).await,
        NavigationOutcome::OutOfRange
    );
    assert!(drain(&mut rx).is_empty());
    assert!(!scroller.is_locked());
    assert_eq!(scroller.index().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_failed_load_keeps_current_section() {
    let sections = [
        Arc::new(TextSection::new(paragraphs(40))),
        Arc::new(TextSection::new("never shown").failing("missing resource")),
        Arc::new(TextSection::new("last")),
    ];
    let host = small_host();
    let scroller = open(book_of(&sections), &host, flat_config());
    let mut rx = scroller.subscribe();

    scroller
        .go_to(NavigationRequest::new(0).with_anchor(Anchor::Fraction(0.5)))
        .await;
    let before = position(&host);
    drain(&mut rx);

    assert_eq!(
        scroller.go_to(NavigationRequest::new(1)).await,
        NavigationOutcome::LoadFailed
    );
    assert_eq!(scroller.index().await, Some(0));
    assert_eq!(position(&host), before);
    assert_eq!(sections[0].unload_count(), 0);
    assert!(drain(&mut rx).is_empty());
    assert!(!scroller.is_locked());

    assert_eq!(
        scroller.go_to(NavigationRequest::new(2)).await,
        NavigationOutcome::Settled
    );
    assert_eq!(sections[0].unload_count(), 1);
    assert_eq!(host.surfaces_created(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_hidden_host_jumps_and_visible_host_animates() {
    let mut config = flat_config();
    config.scroll.animated = true;
    let host = small_host();
    host.set_visible(false);
    let scroller = open(long_book(), &host, config);
    scroller.go_to(NavigationRequest::new(0)).await;

    let start = Instant::now();
    assert_eq!(scroller.next(None).await, NavigationOutcome::Settled);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(position(&host), 100.0);

    host.set_visible(true);
    let turning = tokio::spawn({
        let scroller = scroller.clone();
        async move { scroller.next(None).await }
    });
    sleep(Duration::from_millis(50)).await;

    assert_eq!(scroller.phase(), Phase::Animating);
    assert!(scroller.is_locked());
    assert_eq!(
        scroller.go_to(NavigationRequest::new(0)).await,
        NavigationOutcome::Locked
    );
    let midway = position(&host);
    assert!(midway > 100.0 && midway < 200.0, "midway at {}", midway);

    assert_eq!(turning.await.unwrap(), NavigationOutcome::Settled);
    assert_eq!(position(&host), 200.0);
    assert_eq!(scroller.phase(), Phase::Idle);
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_user_scrolling_settles_once_after_debounce() {
    let host = small_host();
    let scroller = open(long_book(), &host, flat_config());
    let mut rx = scroller.subscribe();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(scroller.clone().run(shutdown_rx));

    scroller.go_to(NavigationRequest::new(0)).await;
    drain(&mut rx);
    assert!(host.user_scroll_to(300.0));
    sleep(Duration::from_millis(100)).await;
    assert_eq!(relocations(&drain(&mut rx)).len(), 0);
    sleep(Duration::from_millis(200)).await;

    let relocated = relocations(&drain(&mut rx));
    assert_eq!(relocated.len(), 1);
    assert_eq!(relocated[0].reason, RelocateReason::Scroll);
    assert!((relocated[0].fraction - 300.0 / 1190.0).abs() < 1e-9);
    assert_eq!(relocated[0].range.from, ContentPosition::new(21, 0));

    // a page turn reports itself; its own debounced settle is swallowed
    scroller.next(None).await;
    sleep(Duration::from_millis(400)).await;
    let relocated = relocations(&drain(&mut rx));
    assert_eq!(relocated.len(), 1);
    assert_eq!(position(&host), 400.0);

    // a burst of user scrolling settles once, after the last movement
    for _ in 0..3 {
        host.user_scroll_by(10.0);
        sleep(Duration::from_millis(100)).await;
    }
    assert!(relocations(&drain(&mut rx)).is_empty());
    sleep(Duration::from_millis(200)).await;
    let relocated = relocations(&drain(&mut rx));
    assert_eq!(relocated.len(), 1);
    assert!((relocated[0].fraction - 430.0 / 1190.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_small_controller_scroll_is_not_reported_twice() {
    let host = small_host();
    let scroller = open(long_book(), &host, flat_config());
    let mut rx = scroller.subscribe();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(scroller.clone().run(shutdown_rx));

    scroller
        .go_to(NavigationRequest::new(0).with_anchor(Anchor::Fraction(0.37)))
        .await;
    sleep(Duration::from_millis(400)).await;
    drain(&mut rx);

    // a fraction of a pixel still moves the surface and still signals
    scroller
        .scroll_to_anchor(Anchor::Fraction(440.6 / 1190.0), false)
        .await;
    assert!((position(&host) - 440.6).abs() < 1e-9);
    sleep(Duration::from_millis(400)).await;

    let reasons: Vec<RelocateReason> = relocations(&drain(&mut rx))
        .iter()
        .map(|r| r.reason)
        .collect();
    assert_eq!(reasons, vec![RelocateReason::Navigation]);
}

#[tokio::test(start_paused = true)]
async fn test_non_finite_fraction_lands_at_start() {
    let host = small_host();
    let scroller = open(long_book(), &host, flat_config());
    scroller
        .go_to(NavigationRequest::new(0).with_anchor(Anchor::Fraction(0.5)))
        .await;
    assert_eq!(position(&host), 595.0);

    for fraction in [f64::NAN, f64::INFINITY] {
        scroller
            .go_to(NavigationRequest::new(0).with_anchor(Anchor::Fraction(0.5)))
            .await;
        assert_eq!(
            scroller.scroll_to_anchor(Anchor::Fraction(fraction), false).await,
            NavigationOutcome::Settled
        );
        assert_eq!(position(&host), 0.0);
    }
    let settled = scroller.relocate_now().await.unwrap();
    assert_eq!(settled.fraction, 0.0);
    assert_eq!(settled.range.from, ContentPosition::new(1, 0));
}

#[tokio::test(start_paused = true)]
async fn test_web_font_load_restores_anchor() {
    let host = small_host().with_web_font(WebFont {
        metrics: FontMetrics::new(8.0, 40.0),
        load_delay: Duration::from_millis(500),
    });
    let scroller = open(long_book(), &host, flat_config());
    let mut rx = scroller.subscribe();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(scroller.clone().run(shutdown_rx));

    scroller
        .go_to(NavigationRequest::new(0).with_anchor(Anchor::Element(21)))
        .await;
    assert_eq!(position(&host), 300.0);

    sleep(Duration::from_millis(1000)).await;

    // 40px lines and 20px spacing put block 10 at 600
    assert_eq!(position(&host), 600.0);
    let relocated = relocations(&drain(&mut rx));
    let reasons: Vec<RelocateReason> = relocated.iter().map(|r| r.reason).collect();
    assert_eq!(
        reasons,
        vec![RelocateReason::Navigation, RelocateReason::Anchor]
    );
    assert_eq!(relocated[1].range.from, ContentPosition::new(21, 0));
    assert_eq!(scroller.anchor().await, Anchor::Element(21));
}

#[tokio::test(start_paused = true)]
async fn test_render_after_resize_keeps_anchor() {
    let paragraph = "lorem ".repeat(20);
    let text = (0..10)
        .map(|_| paragraph.trim())
        .collect::<Vec<_>>()
        .join("\n\n");
    let host = small_host();
    let scroller = open(
        book_of(&[Arc::new(TextSection::new(text))]),
        &host,
        flat_config(),
    );
    let mut rx = scroller.subscribe();

    // five lines a paragraph at 200px
    scroller
        .go_to(NavigationRequest::new(0).with_anchor(Anchor::Element(11)))
        .await;
    assert_eq!(position(&host), 550.0);

    // three lines at 400px
    host.set_viewport(Size::new(400.0, 100.0));
    assert_eq!(scroller.render().await, NavigationOutcome::Settled);
    assert_eq!(position(&host), 350.0);

    let relocated = relocations(&drain(&mut rx));
    assert_eq!(relocated.len(), 2);
    assert_eq!(relocated[1].reason, RelocateReason::Anchor);
    assert_eq!(relocated[1].range.from, ContentPosition::new(11, 0));
}

#[tokio::test(start_paused = true)]
async fn test_set_layout_applies_margins() {
    let host = small_host();
    let scroller = open(long_book(), &host, flat_config());
    scroller
        .go_to(NavigationRequest::new(0).with_anchor(Anchor::Element(21)))
        .await;
    assert_eq!(position(&host), 300.0);

    let mut layout = flat_config().layout;
    layout.margin_top = 40.0;
    layout.margin_bottom = 40.0;
    assert_eq!(scroller.set_layout(layout).await, NavigationOutcome::Settled);

    // the block still lands right after the leading margin
    assert_eq!(position(&host), 300.0);
    let range = scroller.visible_range().await.unwrap();
    assert_eq!(range.from, ContentPosition::new(21, 0));
}

#[tokio::test(start_paused = true)]
async fn test_writing_directions_see_the_same_text() {
    let body = (0..12)
        .map(|i| format!("Paragraph {} carries enough words to wrap over lines", i))
        .collect::<Vec<_>>()
        .join("\n\n");
    let config = ScrollerConfig {
        layout: LayoutConfig {
            margin_top: 16.0,
            margin_right: 16.0,
            margin_bottom: 16.0,
            margin_left: 16.0,
            ..Default::default()
        },
        ..Default::default()
    };

    let mut walks = Vec::new();
    for header in ["", "@dir rtl\n", "@writing-mode vertical-rl\n"] {
        let host = HeadlessHost::new(Size::new(200.0, 200.0));
        let book = book_of(&[Arc::new(TextSection::new(format!("{}{}", header, body)))]);
        let scroller = open(book, &host, config.clone());
        let mut rx = scroller.subscribe();

        scroller.go_to(NavigationRequest::new(0)).await;
        while scroller.next(None).await == NavigationOutcome::Settled {}

        let mut walk = Vec::new();
        for relocate in relocations(&drain(&mut rx)) {
            let text = scroller.text(relocate.range.into()).await.unwrap();
            walk.push((relocate.range, relocate.fraction, text));
        }
        walks.push(walk);
    }

    assert!(walks[0].len() > 2);
    assert!(walks[0].iter().all(|(_, _, text)| !text.is_empty()));
    assert_eq!(walks[0], walks[1]);
    assert_eq!(walks[0], walks[2]);
}

#[tokio::test(start_paused = true)]
async fn test_book_direction_applies_without_document_direction() {
    let host = small_host();
    let book = book_of(&[
        Arc::new(TextSection::new("plain")),
        Arc::new(TextSection::new("@dir ltr\nexplicit")),
    ])
    .with_dir(Direction::Rtl);
    let scroller = open(book, &host, flat_config());
    let mut rx = scroller.subscribe();

    scroller.go_to(NavigationRequest::new(0)).await;
    scroller.go_to(NavigationRequest::new(1)).await;

    let rtl: Vec<bool> = drain(&mut rx)
        .iter()
        .filter_map(|e| match e {
            ScrollerEvent::Load(load) => Some(load.rtl),
            _ => None,
        })
        .collect();
    assert_eq!(rtl, vec![true, false]);
}

struct Redraws(Arc<Mutex<usize>>);

impl Overlayer for Redraws {
    fn redraw(&mut self) {
        *self.0.lock().unwrap() += 1;
    }
}

#[tokio::test(start_paused = true)]
async fn test_overlayer_follows_the_view() {
    let host = small_host();
    let book = book_of(&[
        Arc::new(TextSection::new(paragraphs(40))),
        Arc::new(TextSection::new("second")),
    ]);
    let scroller = open(book, &host, flat_config());
    let mut rx = scroller.subscribe();
    scroller.go_to(NavigationRequest::new(0)).await;

    let slot = drain(&mut rx)
        .into_iter()
        .find_map(|e| match e {
            ScrollerEvent::CreateOverlayer { slot, .. } => Some(slot),
            _ => None,
        })
        .unwrap();
    let count = Arc::new(Mutex::new(0));
    slot.attach(Box::new(Redraws(count.clone())));

    scroller.render().await;
    assert_eq!(*count.lock().unwrap(), 1);

    scroller.go_to(NavigationRequest::new(1)).await;
    assert!(!slot.is_attached());
}

#[tokio::test(start_paused = true)]
async fn test_selection_reports_selection_reason() {
    let host = small_host();
    let scroller = open(long_book(), &host, flat_config());
    let mut rx = scroller.subscribe();

    let range = ContentRange::new(ContentPosition::new(32, 0), ContentPosition::new(32, 3));
    let outcome = scroller
        .go_to(
            NavigationRequest::new(0)
                .with_anchor(Anchor::Range(range))
                .selecting(),
        )
        .await;
    assert_eq!(outcome, NavigationOutcome::Settled);
    assert_eq!(position(&host), 450.0);
    assert_eq!(host.selection(), Some(range));

    let relocated = relocations(&drain(&mut rx));
    assert_eq!(relocated[0].reason, RelocateReason::Selection);
    assert_eq!(scroller.text(range).await.as_deref(), Some("p15"));

    assert_eq!(
        scroller.scroll_to_anchor(Anchor::Fraction(0.0), false).await,
        NavigationOutcome::Settled
    );
    assert_eq!(
        relocations(&drain(&mut rx))[0].reason,
        RelocateReason::Navigation
    );
}

#[tokio::test(start_paused = true)]
async fn test_destroy_stops_everything() {
    let section = Arc::new(TextSection::new(paragraphs(40)));
    let host = small_host();
    let scroller = open(book_of(&[section.clone()]), &host, flat_config());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_loop = tokio::spawn(scroller.clone().run(shutdown_rx));

    scroller.go_to(NavigationRequest::new(0)).await;
    scroller.destroy().await;
    scroller.destroy().await;
    signal_loop.await.unwrap();

    assert_eq!(section.unload_count(), 1);
    assert!(host.scroll_position().is_none());
    assert_eq!(
        scroller.go_to(NavigationRequest::new(0)).await,
        NavigationOutcome::Unavailable
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_signal_loop() {
    let scroller = open(long_book(), &small_host(), flat_config());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_loop = tokio::spawn(scroller.clone().run(shutdown_rx));
    sleep(Duration::from_millis(10)).await;

    shutdown_tx.send(true).unwrap();
    signal_loop.await.unwrap();

    // the receiver was consumed by the first loop
    let (_tx, rx) = watch::channel(false);
    scroller.clone().run(rx).await;
}
