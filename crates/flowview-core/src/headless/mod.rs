//! In-process rendering engine
//!
//! A complete [`RenderingSurface`](crate::surface::RenderingSurface) and
//! [`Host`](crate::surface::Host) pair that lays out plain-text markup with
//! monospace metrics. It backs the command line reader and exercises the
//! scroller without a browser engine.

mod document;
mod host;
mod layout;
mod section;
mod surface;

pub use document::{Block, BlockKind, Document};
pub use host::{HeadlessHost, WebFont};
pub use layout::{FontMetrics, LaidOutTree, LayoutInput};
pub use section::{parse_book, TextSection};
pub use surface::HeadlessSurface;
