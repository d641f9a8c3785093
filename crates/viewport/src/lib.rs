//! Retained-mode viewport engine.
//!
//! A [`Window`] owns a [`scene::SceneTree`], one pixel surface per viewport
//! node and a [`DisplaySurface`]. Tree edits close update brackets whose
//! signals are classified into the cheapest correct [`RenderAction`];
//! rendered viewports are composited into their hosts and uploaded to the
//! display as main viewport, popups and overlay layer, bottom to top.

pub mod classify;
mod compositor;
pub mod config;
pub mod display;
pub mod frame;
mod overlay;
mod popup;
mod render;
pub mod viewport;
pub mod window;

pub use classify::{IgnoreReason, RenderAction, classify};
pub use config::{DEFAULT_MIN_SIZE, ViewportConfig};
pub use display::{DisplaySurface, MemoryDisplay, UploadKind, UploadRecord, UploadRequest};
pub use frame::CoordinateFrame;
pub use viewport::{Viewport, ViewportFlags, WindowId};
pub use window::Window;
