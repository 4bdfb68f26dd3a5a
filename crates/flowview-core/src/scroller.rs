//! Scroller controller
//!
//! Owns the active section view and drives every navigation: loading and
//! swapping sections, scrolling to anchors, page turns and settle
//! bookkeeping. At most one navigation is in flight at a time; a request
//! that arrives while another one runs is dropped and reported as
//! [`NavigationOutcome::Locked`].
//!
//! Surface notifications are processed by [`Scroller::run`], which debounces
//! raw scroll activity into `scroll` relocations and restores the anchor
//! whenever the section's extent changes.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use serde::Serialize;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::{self, Instant};
use tracing::{debug, info, trace, warn};

use crate::book::Book;
use crate::config::{LayoutConfig, ScrollConfig, ScrollerConfig};
use crate::content::{
    landing_rect, target_rects, uncollapse, Anchor, AnchorTarget, ContentRange,
};
use crate::debounce::Debouncer;
use crate::event::{EventBus, LoadEvent, RelocateEvent, RelocateReason, ScrollerEvent};
use crate::scroll::{animate, AnimationSpec};
use crate::surface::{Host, OpenRequest, SignalKind, SurfaceSignal, SurfaceSignals};
use crate::view::{LayoutParams, View};
use crate::visible::{reading_window, visible_range, VisibleRange};
use crate::{Error, Result};

/// Remaining extent below which the view counts as scrolled to the end
const EDGE_TOLERANCE: f64 = 2.0;

/// Where to go and what to show there
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationRequest {
    pub index: usize,
    /// Defaults to the start of the section
    pub anchor: Option<Anchor>,
    /// Highlight the anchor range once it is in view
    pub select: bool,
}

impl NavigationRequest {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            anchor: None,
            select: false,
        }
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn selecting(mut self) -> Self {
        self.select = true;
        self
    }
}

/// How a navigation request ended. None of these are errors: every failure
/// leaves the scroller where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationOutcome {
    /// The viewport settled and a relocation was emitted
    Settled,
    /// Another navigation was in flight; the request was dropped
    Locked,
    /// No such section, or no linear section in that direction
    OutOfRange,
    /// The target section could not be loaded
    LoadFailed,
    /// Nothing is displayed yet, or the scroller was destroyed
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Phase {
    Idle = 0,
    /// Holding the navigation lock
    Navigating = 1,
    /// Navigating with a scroll animation running
    Animating = 2,
}

impl From<u8> for Phase {
    fn from(value: u8) -> Self {
        match value {
            1 => Phase::Navigating,
            2 => Phase::Animating,
            _ => Phase::Idle,
        }
    }
}

/// Held for the duration of a navigation; releases the lock on every exit
/// path, including failed loads
struct NavigationGuard<'a> {
    locked: &'a AtomicBool,
    phase: &'a AtomicU8,
}

impl Drop for NavigationGuard<'_> {
    fn drop(&mut self) {
        self.phase.store(Phase::Idle as u8, Ordering::Release);
        self.locked.store(false, Ordering::Release);
    }
}

struct State {
    view: Option<View>,
    index: Option<usize>,
    anchor: Anchor,
    layout: LayoutConfig,
    /// Set when the controller moved the surface itself; swallows the
    /// debounced settle that movement triggers
    just_anchored: bool,
    generation: u64,
    destroyed: bool,
}

pub struct Scroller {
    book: Book,
    host: Arc<dyn Host>,
    scroll: ScrollConfig,
    state: Mutex<State>,
    events: StdMutex<EventBus>,
    locked: AtomicBool,
    phase: AtomicU8,
    signal_tx: mpsc::UnboundedSender<SurfaceSignal>,
    signal_rx: StdMutex<Option<mpsc::UnboundedReceiver<SurfaceSignal>>>,
    closed: watch::Sender<bool>,
}

impl std::fmt::Debug for Scroller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scroller")
            .field("book", &self.book)
            .field("phase", &self.phase())
            .finish()
    }
}

impl Scroller {
    pub fn new(book: Book, host: Arc<dyn Host>, config: ScrollerConfig) -> Arc<Self> {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);
        Arc::new(Self {
            book,
            host,
            scroll: config.scroll,
            state: Mutex::new(State {
                view: None,
                index: None,
                anchor: Anchor::default(),
                layout: config.layout,
                just_anchored: false,
                generation: 0,
                destroyed: false,
            }),
            events: StdMutex::new(EventBus::default()),
            locked: AtomicBool::new(false),
            phase: AtomicU8::new(Phase::Idle as u8),
            signal_tx,
            signal_rx: StdMutex::new(Some(signal_rx)),
            closed,
        })
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ScrollerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut bus) = self.events.lock() {
            bus.add(tx);
        }
        rx
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn phase(&self) -> Phase {
        Phase::from(self.phase.load(Ordering::Acquire))
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Display a section, or move within the current one
    pub async fn go_to(&self, request: NavigationRequest) -> NavigationOutcome {
        let Some(_guard) = self.try_lock() else {
            debug!(index = request.index, "Navigation dropped: scroller is locked");
            return NavigationOutcome::Locked;
        };
        self.navigate(request).await
    }

    pub async fn prev(&self, distance: Option<f64>) -> NavigationOutcome {
        self.turn(false, distance).await
    }

    pub async fn next(&self, distance: Option<f64>) -> NavigationOutcome {
        self.turn(true, distance).await
    }

    /// Scroll the current section to `anchor`
    pub async fn scroll_to_anchor(&self, anchor: Anchor, select: bool) -> NavigationOutcome {
        let Some(_guard) = self.try_lock() else {
            return NavigationOutcome::Locked;
        };
        let mut state = self.state.lock().await;
        let reason = if select {
            RelocateReason::Selection
        } else {
            RelocateReason::Navigation
        };
        self.scroll_to_anchor_in(&mut state, anchor, select, reason, false)
            .await
    }

    /// Lay the current section out again for the host's current viewport
    /// and restore the anchor
    pub async fn render(&self) -> NavigationOutcome {
        let viewport = self.host.viewport();
        let mut state = self.state.lock().await;
        let config = state.layout.clone();
        let Some(view) = state.view.as_mut() else {
            return NavigationOutcome::Unavailable;
        };
        let layout = LayoutParams::compute(&config, viewport, view.is_vertical(), view.is_rtl());
        view.render(layout);
        let anchor = state.anchor;
        self.scroll_to_anchor_in(&mut state, anchor, false, RelocateReason::Anchor, false)
            .await
    }

    pub async fn set_layout(&self, layout: LayoutConfig) -> NavigationOutcome {
        self.state.lock().await.layout = layout;
        self.render().await
    }

    /// Settle on the current position right away. Calling it again without
    /// scrolling in between reports the same geometry.
    pub async fn relocate_now(&self) -> Option<RelocateEvent> {
        let mut state = self.state.lock().await;
        self.settle(&mut state, RelocateReason::Scroll)
    }

    pub async fn index(&self) -> Option<usize> {
        self.state.lock().await.index
    }

    pub async fn anchor(&self) -> Anchor {
        self.state.lock().await.anchor
    }

    pub async fn visible_range(&self) -> Option<VisibleRange> {
        let state = self.state.lock().await;
        state.view.as_ref().map(current_range)
    }

    /// Text covered by `range` in the displayed section
    pub async fn text(&self, range: ContentRange) -> Option<String> {
        let state = self.state.lock().await;
        state.view.as_ref().map(|view| range.text(view.content()))
    }

    /// First linear section, scrolled to its start
    pub async fn at_start(&self) -> bool {
        let state = self.state.lock().await;
        let Some(view) = state.view.as_ref() else {
            return false;
        };
        self.book.adjacent_linear(view.index(), -1).is_none() && view.scroll_position() <= 0.0
    }

    /// Last linear section, scrolled to its end
    pub async fn at_end(&self) -> bool {
        let state = self.state.lock().await;
        let Some(view) = state.view.as_ref() else {
            return false;
        };
        let end = view.scroll_position() + view.viewport_size();
        self.book.adjacent_linear(view.index(), 1).is_none()
            && view.view_size() - end <= EDGE_TOLERANCE
    }

    /// Process surface notifications until shutdown or [`Scroller::destroy`]
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let receiver = self.signal_rx.lock().ok().and_then(|mut slot| slot.take());
        let Some(mut signals) = receiver else {
            warn!("Scroller signal loop is already running");
            return;
        };
        let mut closed = self.closed.subscribe();
        if *closed.borrow() {
            return;
        }

        let mut settle = Debouncer::new(self.scroll.settle_debounce());
        let mut settle_generation = 0;
        info!(
            settle_ms = settle.delay().as_millis() as u64,
            "Scroller signal loop started"
        );

        loop {
            let deadline = settle.deadline();
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Scroller received shutdown signal");
                        break;
                    }
                }
                _ = closed.changed() => {
                    break;
                }
                Some(signal) = signals.recv() => {
                    self.on_signal(signal, &mut settle, &mut settle_generation).await;
                }
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if settle.fire_if_due(Instant::now()) {
                        self.on_settle(settle_generation).await;
                    }
                }
            }
        }

        info!("Scroller signal loop stopped");
    }

    /// Detach the current view and stop the signal loop
    pub async fn destroy(&self) {
        let mut state = self.state.lock().await;
        if state.destroyed {
            return;
        }
        state.destroyed = true;
        if let Some(mut view) = state.view.take() {
            view.destroy();
        }
        if let Some(section) = state.index.and_then(|i| self.book.section(i)) {
            section.unload();
        }
        self.closed.send_replace(true);
        info!("Scroller destroyed");
    }

    fn try_lock(&self) -> Option<NavigationGuard<'_>> {
        self.locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.set_phase(Phase::Navigating);
        Some(NavigationGuard {
            locked: &self.locked,
            phase: &self.phase,
        })
    }

    fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    fn emit(&self, event: ScrollerEvent) {
        if let Ok(mut bus) = self.events.lock() {
            bus.send(event);
        }
    }

    async fn navigate(&self, request: NavigationRequest) -> NavigationOutcome {
        if !self.book.contains(request.index) {
            debug!(
                index = request.index,
                sections = self.book.len(),
                "Ignoring navigation to missing section"
            );
            return NavigationOutcome::OutOfRange;
        }

        let mut state = self.state.lock().await;
        if state.destroyed {
            return NavigationOutcome::Unavailable;
        }

        if state.index != Some(request.index) || state.view.is_none() {
            if let Err(e) = self.display(&mut state, request.index).await {
                warn!(
                    index = request.index,
                    current = ?state.index,
                    "Section failed to load, staying put: {}",
                    e
                );
                return NavigationOutcome::LoadFailed;
            }
        }

        let reason = if request.select {
            RelocateReason::Selection
        } else {
            RelocateReason::Navigation
        };
        let anchor = request.anchor.unwrap_or_default();
        self.scroll_to_anchor_in(&mut state, anchor, request.select, reason, false)
            .await
    }

    /// Load section `index` into a fresh view and swap it in. On failure
    /// the current view is untouched.
    async fn display(&self, state: &mut State, index: usize) -> Result<()> {
        let section = self
            .book
            .section(index)
            .cloned()
            .ok_or_else(|| Error::SectionLoad {
                index,
                message: "no such section".to_string(),
            })?;
        let failed = |e: Error| Error::SectionLoad {
            index,
            message: e.to_string(),
        };
        let source = section.load().await.map_err(failed)?;
        let aux = section.load_content().await.map_err(failed)?;

        state.generation += 1;
        let generation = state.generation;
        let mut view = View::new(self.host.create_surface(index), index, generation);
        let config = state.layout.clone();
        let viewport = self.host.viewport();
        view.load(
            OpenRequest { index, source, aux },
            &self.book,
            move |vertical, rtl| LayoutParams::compute(&config, viewport, vertical, rtl),
        )
        .await?;

        if let Some(mut old) = state.view.take() {
            old.destroy();
        }
        if let Some(old) = state.index.filter(|&i| i != index) {
            if let Some(section) = self.book.section(old) {
                section.unload();
            }
        }

        view.attach(SurfaceSignals::new(generation, self.signal_tx.clone()));
        self.emit(ScrollerEvent::Load(LoadEvent::new(
            index,
            view.info(),
            view.is_rtl(),
        )));
        self.emit(ScrollerEvent::CreateOverlayer {
            index,
            slot: view.overlay().clone(),
        });
        info!(index, generation, view_size = view.view_size(), "Section displayed");

        state.view = Some(view);
        state.index = Some(index);
        state.just_anchored = false;
        Ok(())
    }

    async fn turn(&self, forward: bool, distance: Option<f64>) -> NavigationOutcome {
        let Some(_guard) = self.try_lock() else {
            return NavigationOutcome::Locked;
        };
        let smooth = self.scroll.is_smooth();

        let mut state = self.state.lock().await;
        let (index, in_section) = {
            let Some(view) = state.view.as_ref() else {
                return NavigationOutcome::Unavailable;
            };
            let start = view.scroll_position();
            let size = view.viewport_size();
            let end = start + size;
            let target = if forward {
                (view.view_size() - end > EDGE_TOLERANCE).then(|| {
                    distance
                        .filter(|d| *d != 0.0)
                        .map_or(end, |d| start + d)
                })
            } else {
                (start > 0.0).then(|| (start - distance.unwrap_or(size)).max(0.0))
            };
            (view.index(), target)
        };

        if let Some(target) = in_section {
            let outcome = self
                .scroll_to(&mut state, target, RelocateReason::Scroll, true)
                .await;
            drop(state);
            if !smooth {
                self.cool_down().await;
            }
            return outcome;
        }

        let Some(adjacent) = self.book.adjacent_linear(index, if forward { 1 } else { -1 }) else {
            debug!(index, forward, "No linear section in that direction");
            return NavigationOutcome::OutOfRange;
        };
        drop(state);

        let anchor = Anchor::Fraction(if forward { 0.0 } else { 1.0 });
        let outcome = self
            .navigate(NavigationRequest::new(adjacent).with_anchor(anchor))
            .await;
        self.cool_down().await;
        outcome
    }

    /// Throttles key repeat across section boundaries
    async fn cool_down(&self) {
        let cooldown = self.scroll.turn_cooldown();
        if !cooldown.is_zero() {
            time::sleep(cooldown).await;
        }
    }

    async fn scroll_to_anchor_in(
        &self,
        state: &mut State,
        anchor: Anchor,
        select: bool,
        reason: RelocateReason,
        smooth: bool,
    ) -> NavigationOutcome {
        let Some(view) = state.view.as_mut() else {
            return NavigationOutcome::Unavailable;
        };
        let offset = anchor_offset(view, &anchor).unwrap_or_else(|| {
            debug!(?anchor, "Anchor has no geometry, keeping position");
            view.scroll_position()
        });
        if select {
            if let Anchor::Range(range) = anchor {
                view.select(range);
            }
        }
        state.anchor = anchor;
        self.scroll_to(state, offset, reason, smooth).await
    }

    async fn scroll_to(
        &self,
        state: &mut State,
        offset: f64,
        reason: RelocateReason,
        smooth: bool,
    ) -> NavigationOutcome {
        let Some(view) = state.view.as_mut() else {
            return NavigationOutcome::Unavailable;
        };
        let from = view.scroll_position();
        let to = offset.clamp(0.0, view.max_scroll());
        let spec = if smooth && self.scroll.is_smooth() {
            AnimationSpec::from_config(&self.scroll)
        } else {
            AnimationSpec::instant()
        };

        let animated = !spec.duration.is_zero() && from != to;
        if animated {
            self.set_phase(Phase::Animating);
        }
        let host = &self.host;
        let frames = animate(from, to, &spec, || host.is_visible(), |x| {
            view.set_scroll_position(x)
        })
        .await;
        if animated {
            self.set_phase(Phase::Navigating);
        }
        trace!(from, to, frames, "Scrolled");

        // the surface signals every change, however small
        if view.scroll_position() != from {
            state.just_anchored = true;
        }
        self.settle(state, reason);
        NavigationOutcome::Settled
    }

    /// Measure the viewport and report it. Only `scroll` settles replace the
    /// anchor; the others keep the more precise one that was requested.
    fn settle(&self, state: &mut State, reason: RelocateReason) -> Option<RelocateEvent> {
        let view = state.view.as_ref()?;
        let range = current_range(view);
        let fraction = if view.view_size() > 0.0 {
            (view.scroll_position() / view.view_size()).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let event = RelocateEvent {
            reason,
            range,
            index: view.index(),
            fraction,
        };
        if reason == RelocateReason::Scroll {
            state.anchor = Anchor::Range(range.into());
        }
        debug!(
            index = event.index,
            reason = ?reason,
            fraction = event.fraction,
            "Relocated"
        );
        self.emit(ScrollerEvent::Relocate(event));
        Some(event)
    }

    async fn on_signal(
        &self,
        signal: SurfaceSignal,
        settle: &mut Debouncer,
        settle_generation: &mut u64,
    ) {
        let mut state = self.state.lock().await;
        let Some(view) = state.view.as_mut() else {
            return;
        };
        if view.generation() != signal.generation {
            trace!(generation = signal.generation, "Ignoring signal from a detached view");
            return;
        }

        match signal.kind {
            SignalKind::Scrolled => {
                let position = view.scroll_position();
                self.emit(ScrollerEvent::Scroll { position });
                settle.poke(Instant::now());
                *settle_generation = signal.generation;
            }
            SignalKind::Resized => {
                if view.expand() {
                    debug!(view_size = view.view_size(), "Section extent changed, restoring anchor");
                    let anchor = state.anchor;
                    self.scroll_to_anchor_in(&mut state, anchor, false, RelocateReason::Anchor, false)
                        .await;
                }
            }
        }
    }

    async fn on_settle(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if state.view.as_ref().map(View::generation) != Some(generation) {
            return;
        }
        if std::mem::take(&mut state.just_anchored) {
            trace!("Skipping settle of a controller-initiated scroll");
            return;
        }
        self.settle(&mut state, RelocateReason::Scroll);
    }
}

fn current_range(view: &View) -> VisibleRange {
    let window = reading_window(
        view.scroll_position(),
        view.viewport_size(),
        view.leading_margin(),
    );
    visible_range(view.content(), window, &view.mapper())
}

/// Scroll offset that brings `anchor` to the start of the reading window
fn anchor_offset(view: &View, anchor: &Anchor) -> Option<f64> {
    let target = match *anchor {
        Anchor::Fraction(fraction) if !fraction.is_finite() => return Some(0.0),
        Anchor::Fraction(fraction) => return Some(fraction.clamp(0.0, 1.0) * view.view_size()),
        Anchor::Range(range) => uncollapse(view.content(), range),
        Anchor::Element(node) => AnchorTarget::Element(node),
    };
    let rect = landing_rect(&target_rects(view.content(), target))?;
    let mapper = view.mapper();
    Some(mapper.map(&rect).start - mapper.leading_margin())
}
