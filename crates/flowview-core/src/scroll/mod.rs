//! Animated scrolling
//!
//! ## Atoms
//! - `easing` - Progress curves for page-turn animation
//! - `timing` - Time calculation utilities (progress, interpolation)
//!
//! ## Scheduler
//! - `animation` - Frame loop interpolating a scroll offset between two values
//!
//! # Usage
//!
//! ```ignore
//! use flowview_core::scroll::{animate, AnimationSpec};
//!
//! let spec = AnimationSpec::from_config(&config.scroll);
//! animate(view.scroll_position(), target, &spec, || host.is_visible(), |x| {
//!     view.set_scroll_position(x)
//! })
//! .await;
//! ```

pub mod animation;
pub mod easing;
pub mod timing;

pub use animation::{animate, Animation, AnimationSpec};
