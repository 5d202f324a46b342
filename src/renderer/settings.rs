//! Renderer Settings
//!
//! Consumed once during GPU initialization to set up the surface and
//! device. The 3D layer composites over the video background, so the
//! default clear color is fully transparent black.

#[derive(Debug, Clone)]
pub struct RendererSettings {
    /// Enable vertical synchronization.
    pub vsync: bool,

    /// Force a specific wgpu backend. `None` lets wgpu choose.
    pub backends: Option<wgpu::Backends>,

    /// GPU adapter selection preference.
    pub power_preference: wgpu::PowerPreference,

    /// Clear color for the main render target. Transparent by default so
    /// the camera feed stays visible below the overlay.
    pub clear_color: wgpu::Color,

    /// Required wgpu features that must be supported by the adapter.
    pub required_features: wgpu::Features,

    /// Required wgpu limits.
    pub required_limits: wgpu::Limits,

    /// Depth buffer texture format.
    pub depth_format: wgpu::TextureFormat,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            vsync: true,
            backends: None,
            power_preference: wgpu::PowerPreference::HighPerformance,
            clear_color: wgpu::Color::TRANSPARENT,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            depth_format: wgpu::TextureFormat::Depth32Float,
        }
    }
}
