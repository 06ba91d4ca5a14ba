//! # User Interface Module
//!
//! Dear ImGui debug panel for the viewer.
//!
//! ## Key Components
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu, input capture and
//!   overlay rendering
//! - [`viewport_panel`] - The "Viewport" window editing the live
//!   [`ViewportConfig`](crate::config::ViewportConfig)
//!
//! ## Input Handling
//!
//! While ImGui wants the mouse, clicks are not turned into picks and drags do
//! not orbit the camera.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::{viewport_panel, PanelStatus};
