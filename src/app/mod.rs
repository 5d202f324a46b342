//! Winit-based Application Framework
//!
//! A thin shell around [winit](https://crates.io/crates/winit) that owns the
//! window, the GPU renderer and an [`ArView`], and drives the view's tick on
//! every redraw.
//!
//! # Usage
//!
//! 1. Implement [`AppHandler`] for your application struct
//! 2. Use the [`App`] builder to configure window settings
//! 3. Call [`App::run`] to start the event loop
//!
//! ```rust,ignore
//! use ardent::app::{App, AppHandler};
//!
//! struct Demo;
//!
//! impl AppHandler for Demo {
//!     fn init(window: &Arc<Window>) -> ardent::errors::Result<(Self, ArView)> {
//!         let view = build_view()?;
//!         Ok((Demo, view))
//!     }
//! }
//!
//! fn main() -> ardent::errors::Result<()> {
//!     App::new().with_title("Demo").run::<Demo>()
//! }
//! ```

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
pub use winit::window::{Window, WindowId};

use crate::errors::{ArdentError, Result};
use crate::renderer::{ForwardRenderer, RendererSettings, WgpuContext};
use crate::view::ArView;

/// Trait for defining application behavior.
///
/// [`init`](Self::init) builds the view (scene content, tracked anchors,
/// model loads); [`update`](Self::update) runs each frame before the view
/// ticks.
pub trait AppHandler: Sized + 'static {
    /// Called once after the window and renderer exist. Builds the user
    /// state and the view the runner will drive.
    fn init(window: &Arc<Window>) -> Result<(Self, ArView)>;

    /// Handles a window event before default processing. Return `true` to
    /// consume it.
    #[allow(unused_variables)]
    fn on_event(&mut self, view: &mut ArView, event: &WindowEvent) -> bool {
        false
    }

    /// Per-frame hook, called before the view ticks.
    #[allow(unused_variables)]
    fn update(&mut self, view: &mut ArView) {}
}

/// Application builder for configuring and launching a window.
pub struct App {
    title: String,
    settings: RendererSettings,
    size: (u32, u32),
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: "Ardent".into(),
            settings: RendererSettings::default(),
            size: (1280, 720),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: RendererSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Runs the application. Blocks until the window closes.
    ///
    /// # Errors
    ///
    /// Returns an error if event loop creation or execution fails.
    pub fn run<H: AppHandler>(self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut runner = AppRunner::<H>::new(self.title, self.settings, self.size);
        event_loop.run_app(&mut runner).map_err(ArdentError::from)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

struct AppRunner<H: AppHandler> {
    title: String,
    settings: RendererSettings,
    size: (u32, u32),

    window: Option<Arc<Window>>,
    renderer: Option<ForwardRenderer>,
    view: Option<ArView>,
    user_state: Option<H>,
}

impl<H: AppHandler> AppRunner<H> {
    fn new(title: String, settings: RendererSettings, size: (u32, u32)) -> Self {
        Self {
            title,
            settings,
            size,
            window: None,
            renderer: None,
            view: None,
            user_state: None,
        }
    }

    fn redraw(&mut self) {
        let (Some(renderer), Some(view), Some(user_state)) =
            (&mut self.renderer, &mut self.view, &mut self.user_state)
        else {
            return;
        };

        user_state.update(view);
        if let Err(e) = view.tick(renderer) {
            log::error!("Frame error: {e}");
        }
    }
}

impl<H: AppHandler> ApplicationHandler for AppRunner<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.size.0 as f64,
                self.size.1 as f64,
            ))
            .with_transparent(true);

        let window = match event_loop.create_window(window_attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        log::info!("Initializing renderer backend...");

        let size = window.inner_size();
        let context = match pollster::block_on(WgpuContext::new(
            window.clone(),
            &self.settings,
            size.width.max(1),
            size.height.max(1),
        )) {
            Ok(c) => c,
            Err(e) => {
                log::error!("Fatal renderer error: {e}");
                event_loop.exit();
                return;
            }
        };
        let mut renderer = ForwardRenderer::new(context);

        match H::init(&window) {
            Ok((state, mut view)) => {
                view.resize(&mut renderer);
                self.renderer = Some(renderer);
                self.view = Some(view);
                self.user_state = Some(state);
            }
            Err(e) => {
                log::error!("Application init failed: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match (&mut self.view, &mut self.user_state) {
            (Some(view), Some(user_state)) => user_state.on_event(view, &event),
            _ => false,
        };
        if consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) => {
                // The render target follows the video source's element
                // size, so window geometry only triggers the sync.
                if let (Some(renderer), Some(view)) = (&mut self.renderer, &mut self.view) {
                    view.resize(renderer);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.view.is_some()
            && let Some(window) = &self.window
        {
            window.request_redraw();
        }
    }
}
