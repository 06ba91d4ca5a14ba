// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Handles render pipelines, GPU resource management, and frame rendering.

pub mod pipeline_manager;
pub mod render_engine;

use crate::{error::RenderError, gfx::scene::Scene};

// Re-export main types
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;

/// Draws one frame of a scene
///
/// [`Viewer::on_frame`](crate::viewer::Viewer::on_frame) calls this once all
/// per-frame scene updates are applied. Tests substitute a recording
/// implementation so no GPU is needed.
pub trait FrameRenderer {
    fn render(&mut self, scene: &mut Scene) -> Result<(), RenderError>;
}
