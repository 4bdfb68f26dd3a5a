//! Progress curves for page-turn animation

use crate::config::EasingType;

impl EasingType {
    /// Eased position for progress `t`, both in [0, 1]
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingType::None => t.floor(),
            EasingType::Linear => t,
            EasingType::EaseOutQuad => t * (2.0 - t),
        }
    }
}
