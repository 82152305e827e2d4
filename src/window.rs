use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    config::ViewerConfig,
    importer::GltfImporter,
    rendering::renderer::Renderer,
    viewer::{LoadOutcome, RenderBackend, Viewer},
};

struct App {
    config: ViewerConfig,
    viewer: Option<Viewer<Renderer>>,
    failed: bool,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            viewer: None,
            failed: false,
        }
    }

    /// The native stand-in for looking the canvas up by id.
    fn create_surface(&self, event_loop: &ActiveEventLoop) -> Option<Arc<Window>> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.window_title())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        match event_loop.create_window(window_attributes) {
            Ok(window) => Some(Arc::new(window)),
            Err(e) => {
                log::error!("Could not create surface `{}`: {e}", self.config.surface_id);
                None
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() || self.failed {
            return;
        }

        let surface = self.create_surface(event_loop);
        let ambient = self.config.ambient;

        let viewer = pollster::block_on(Viewer::initialize(
            surface,
            &self.config,
            |window| pollster::block_on(Renderer::new(window, ambient)),
            &GltfImporter,
        ));

        match viewer {
            Ok(viewer) => {
                if let LoadOutcome::Failed { .. } = viewer.load_outcome() {
                    log::warn!("Rendering without a model");
                }
                log::debug!("Viewer phase: {:?}", viewer.phase());
                viewer.renderer().window.request_redraw();
                self.viewer = Some(viewer);
            }
            Err(e) => {
                log::error!("Failed to initialize: {:#}", e);
                self.failed = true;
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        // Until setup finishes, events get the platform's default handling.
        let Some(viewer) = self.viewer.as_mut() else {
            if matches!(event, WindowEvent::CloseRequested) {
                event_loop.exit();
            }
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                viewer.resize(new_size);
            }
            WindowEvent::RedrawRequested => {
                match viewer.render_frame() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = viewer.renderer().size();
                        viewer.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("Timeout");
                    }
                    Err(other) => {
                        log::error!("Unexpected error: {:?}", other);
                    }
                }

                viewer.renderer().window.request_redraw();
            }
            other => {
                viewer.handle_input(&other);
            }
        }
    }
}

/// Runs the viewer until the window closes. A failed initialization has
/// already been logged and only shows up in the exit code.
pub async fn run(config: ViewerConfig) -> anyhow::Result<ExitCode> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    if app.failed {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
