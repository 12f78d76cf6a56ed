use std::path::PathBuf;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::assets;
use crate::error::{Result, VitrineError};
use crate::gpu::GpuContext;
use crate::input::{Command, Input};
use crate::museum::{ClickOutcome, Museum, SpinConfig};
use crate::renderer::GpuRenderer;
use crate::ui::Color;

/// Window and presentation settings for [`run`].
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub background: Color,
    /// Font for popup text. Falls back to `$VITRINE_FONT`, then system fonts.
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    pub spin: SpinConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Vitrine".to_string(),
            width: 1280,
            height: 720,
            background: Color::hex(0x1b1714),
            font_path: None,
            font_size: 18.0,
            spin: SpinConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn font(mut self, path: impl Into<PathBuf>, size: f32) -> Self {
        self.font_path = Some(path.into());
        self.font_size = size;
        self
    }

    pub fn spin(mut self, spin: SpinConfig) -> Self {
        self.spin = spin;
        self
    }
}

/// Open the museum window and run until it is closed.
///
/// Returns an error if the window or GPU cannot be set up, or if the GPU runs
/// out of memory while presenting.
pub fn run(config: AppConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = VitrineApp::Pending { config };
    event_loop.run_app(&mut app)?;

    match app {
        VitrineApp::Failed(err) => Err(err),
        _ => Ok(()),
    }
}

enum VitrineApp {
    Pending {
        config: AppConfig,
    },
    Running {
        window: Arc<Window>,
        renderer: GpuRenderer,
        museum: Museum,
        input: Input,
    },
    Failed(VitrineError),
}

impl VitrineApp {
    fn start(config: &AppConfig, event_loop: &ActiveEventLoop) -> Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let gpu = GpuContext::new(window.clone())?;
        let font = assets::load_font(&gpu, config.font_path.as_deref(), config.font_size);
        let museum = Museum::new(gpu.width(), gpu.height(), config.spin);
        let renderer = GpuRenderer::new(gpu, museum.artwork(), font, config.background);

        window.request_redraw();
        Ok(VitrineApp::Running {
            window,
            renderer,
            museum,
            input: Input::new(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: VitrineError) {
        log::error!("{err}");
        *self = VitrineApp::Failed(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for VitrineApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let VitrineApp::Pending { config } = self else {
            return;
        };
        match Self::start(config, event_loop) {
            Ok(running) => *self = running,
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let VitrineApp::Running {
            window,
            renderer,
            museum,
            input,
        } = self
        else {
            return;
        };

        match input.handle_event(&event) {
            Some(Command::Click(at)) => match museum.click(at.x, at.y) {
                ClickOutcome::Opened(entity) => log::debug!("click opened {entity:?}"),
                ClickOutcome::Closed => log::debug!("close button clicked"),
                ClickOutcome::Swallowed | ClickOutcome::Ignored => {}
            },
            Some(Command::Dismiss) => {
                if !museum.close_popup() {
                    event_loop.exit();
                }
            }
            None => {}
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                renderer.resize(size.width, size.height);
                museum.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                museum.frame(renderer);
                if let Some(err) = renderer.take_fatal() {
                    self.fail(event_loop, err);
                    return;
                }
                window.request_redraw();
            }
            _ => {}
        }
    }
}
