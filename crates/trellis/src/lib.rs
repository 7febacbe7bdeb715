//! Trellis: a retained-mode widget composition core.
//!
//! The crate centers on two contracts. [`Tree`] is the container core: an
//! arena-owned widget hierarchy with group semantics (ordered children,
//! event routing with focus navigation, damage-driven incremental redraw,
//! and delta-based resize distribution around a designated resizable child).
//! [`Device`] is the drawing boundary: a uniform primitive capability set
//! that concrete targets (the software raster display, the PostScript file
//! device, embedder-supplied backends) implement, so the same widget
//! drawing code renders to screen, paper, or file. [`Ui`] holds the
//! process-wide state both sides share: the current device and the pointer,
//! focus, belowmouse, and pushed trackers.

// Core modules
mod context;
/// Drawing-device abstraction and concrete output targets.
pub mod device;
mod dispatch;
mod draw;
mod error;
/// The event vocabulary delivered to the tree.
pub mod event;
mod focus;
mod layout;
mod node;
mod tree;
/// Test utilities shared by the crate's tests and embedders' harnesses.
pub mod tutils;
mod widget;

// Public exports
pub use context::Ui;
pub use device::{
    Color, Device, Font, LineStyle, NullDevice, PathKind,
    paged::{PageFormat, PageLayout, PagedDevice, print_widget},
    psfile::PostScriptFile,
    raster::Raster,
};
pub use draw::Graphics;
pub use error::{Error, Result};
pub use event::{Event, Key, KeyPress, Mods, navigation_key};
pub use node::Node;
pub use tree::{Tree, WidgetId};
pub use widget::{Align, Damage, Label, Widget};

// Export commonly used geometry types at the root
pub use geom;
pub use geom::{Direction, Point, Quad, Rect, Region};
