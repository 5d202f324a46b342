//! Renderer Module
//!
//! GPU rendering of the 3D overlay:
//! - [`WgpuContext`]: device, queue, surface and depth buffer management
//! - [`ForwardRenderer`]: single-pass forward renderer
//! - [`RendererSettings`]: initialization configuration
//!
//! The [`SceneRenderer`] trait is the seam between the view's tick loop and
//! the GPU; tests drive the loop with a recording implementation instead of
//! a real device.

pub mod context;
pub mod forward;
pub mod settings;

pub use context::WgpuContext;
pub use forward::ForwardRenderer;
pub use settings::RendererSettings;

use crate::assets::AssetServer;
use crate::errors::Result;
use crate::scene::Scene;

/// Draws one frame of a scene through its active camera.
pub trait SceneRenderer {
    fn render(&mut self, scene: &Scene, assets: &AssetServer) -> Result<()>;

    /// Resizes the render target.
    fn resize(&mut self, width: u32, height: u32);

    /// Current render target size in pixels.
    fn size(&self) -> (u32, u32);
}
