//! Frame-driven scroll animation
//!
//! Interpolates a scroll offset between two values on a fixed frame tick.
//! A backgrounded host skips straight to the final value: invisible content
//! is never animated and an animation is never left pending in the background.
//!
//! There is no cancellation token. Two overlapping calls simply race and the
//! last render wins; the scroller's navigation lock keeps that from happening.

use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};

use super::timing::{lerp, progress};
use crate::config::{EasingType, ScrollConfig};

/// Timing parameters of one animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSpec {
    pub duration: Duration,
    pub easing: EasingType,
    /// Frame interval
    pub tick: Duration,
}

impl AnimationSpec {
    pub fn from_config(config: &ScrollConfig) -> Self {
        Self {
            duration: config.animation_duration(),
            easing: config.easing,
            tick: config.animation_tick_duration(),
        }
    }

    /// A spec that jumps to the target on the first frame
    pub fn instant() -> Self {
        Self {
            duration: Duration::ZERO,
            easing: EasingType::None,
            tick: Duration::from_millis(16),
        }
    }
}

/// In-flight animation state
#[derive(Debug, Clone)]
pub struct Animation {
    start: Instant,
    from: f64,
    to: f64,
    duration: Duration,
    easing: EasingType,
}

impl Animation {
    pub fn new(start: Instant, from: f64, to: f64, spec: &AnimationSpec) -> Self {
        Self {
            start,
            from,
            to,
            duration: spec.duration,
            easing: spec.easing,
        }
    }

    /// Interpolated offset at `now`
    pub fn sample(&self, now: Instant) -> f64 {
        let t = progress(self.start, now, self.duration);
        lerp(self.from, self.to, self.easing.apply(t))
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= self.duration
    }
}

/// Animate from `from` to `to`, calling `render` once per frame.
///
/// Returns the number of frames rendered. The final frame always renders
/// exactly `to`.
pub async fn animate<V, R>(from: f64, to: f64, spec: &AnimationSpec, is_visible: V, mut render: R) -> usize
where
    V: Fn() -> bool,
    R: FnMut(f64),
{
    if !is_visible() || spec.duration.is_zero() || from == to {
        render(to);
        return 1;
    }

    let mut frames = time::interval(spec.tick);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // the first tick completes immediately and marks the start
    frames.tick().await;
    let animation = Animation::new(Instant::now(), from, to, spec);
    let mut rendered = 0;

    loop {
        frames.tick().await;
        rendered += 1;
        if !is_visible() {
            render(to);
            tracing::debug!(frames = rendered, "Host hidden, finishing scroll animation");
            return rendered;
        }
        let now = Instant::now();
        if animation.is_complete(now) {
            render(to);
            return rendered;
        }
        render(animation.sample(now));
    }
}
