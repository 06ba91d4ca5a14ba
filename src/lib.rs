// src/lib.rs
//! pawnview
//!
//! An interactive 3D viewer built on wgpu and winit: a chess pawn loaded in the
//! background, a spot light with shadows, and a board that answers clicks by
//! highlighting the square under the pointer.

pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod gfx;
pub mod ui;
pub mod viewer;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ViewerApp;
pub use config::{ViewerSettings, ViewportConfig};
pub use viewer::Viewer;
