pub mod bisect;
pub mod book;
pub mod config;
pub mod content;
pub mod debounce;
pub mod error;
pub mod event;
pub mod geometry;
pub mod headless;
pub mod scroll;
pub mod scroller;
pub mod surface;
pub mod view;
pub mod visible;

pub use book::{Book, Direction, Section, SectionSource};
pub use config::{EasingType, Flow, LayoutConfig, ScrollConfig, ScrollerConfig};
pub use content::{Anchor, ContentPosition, ContentRange, ContentTree, NodeId, NodeKind};
pub use error::{Error, Result};
pub use event::{RelocateEvent, RelocateReason, ScrollerEvent, VisibleRange};
pub use scroller::{NavigationOutcome, NavigationRequest, Phase, Scroller};
pub use surface::{Host, RenderingSurface};
