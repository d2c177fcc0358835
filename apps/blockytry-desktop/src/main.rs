mod toggles;

use anyhow::{Context as _, Result};
use blockytry_common::Scancode;
use blockytry_kernel::{SimulationConfig, SimulationContext};
use blockytry_persist::RunStore;
use blockytry_render::{DebugTextRenderer, RenderFrame, Renderer};
use blockytry_render_wgpu::SceneRenderer;
use blockytry_tools::{SimulationInspector, SimulationSummary};
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use toggles::ShellToggles;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::scancode::PhysicalKeyExtScancode;
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "blockytry-desktop", about = "Blockytry desktop sandbox")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Simulation config (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the run record
    #[arg(long, default_value = "./blockytry_data")]
    data_dir: PathBuf,

    /// Start with vsync off
    #[arg(long)]
    no_vsync: bool,
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

/// Window, surface and everything drawn into it.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    scene: SceneRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, vsync: bool) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Blockytry")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let grab = window
            .set_cursor_grab(CursorGrabMode::Confined)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
        if let Err(e) = grab {
            tracing::warn!("cursor grab unavailable: {e}");
        }
        window.set_cursor_visible(false);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("blockytry_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no texture formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let scene = SceneRenderer::new(&device, surface_format, config.width, config.height);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            scene,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.scene
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn set_vsync(&mut self, vsync: bool) {
        self.config.present_mode = present_mode(vsync);
        self.surface.configure(&self.device, &self.config);
    }

    /// Draw the scene and the HUD overlay, then present.
    fn draw(
        &mut self,
        egui_ctx: &EguiContext,
        frame: &RenderFrame,
        summary: Option<&SimulationSummary>,
        debug_text: Option<&str>,
    ) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.scene.render(&self.device, &self.queue, &view, frame);

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| draw_hud(ctx, summary, debug_text));
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
    }
}

fn draw_hud(ctx: &EguiContext, summary: Option<&SimulationSummary>, debug_text: Option<&str>) {
    if let Some(summary) = summary {
        egui::Window::new("Blockytry")
            .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                for line in summary.lines() {
                    ui.label(line);
                }
                ui.separator();
                ui.small("F1: HUD | F3: Debug | T: Lock-on | Ctrl+V: Vsync | Esc: Quit");
            });
    }
    if let Some(text) = debug_text {
        egui::Window::new("Frame")
            .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.monospace(text);
            });
    }
}

struct App {
    context: SimulationContext,
    toggles: ShellToggles,
    debug_text: DebugTextRenderer,
    egui_ctx: EguiContext,
    gpu: Option<Gpu>,
    /// First unrecoverable error; returned from `main` after the loop exits.
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(context: SimulationContext, vsync: bool) -> Self {
        Self {
            context,
            toggles: ShellToggles::new(vsync),
            debug_text: DebugTextRenderer::with_markers(),
            egui_ctx: EguiContext::default(),
            gpu: None,
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        if self.fatal.is_none() {
            self.fatal = Some(error);
        }
        event_loop.exit();
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.repeat {
            return;
        }
        if event.physical_key == PhysicalKey::Code(KeyCode::Escape)
            && event.state == ElementState::Pressed
        {
            event_loop.exit();
            return;
        }
        let Some(scancode) = event.physical_key.to_scancode().and_then(Scancode::from_raw) else {
            tracing::trace!(key = ?event.physical_key, "key without a usable scancode");
            return;
        };

        let result = match event.state {
            ElementState::Pressed => self.context.record_press(scancode),
            ElementState::Released => {
                if !self.context.ledger().is_pressed(scancode) {
                    // Press happened before the window had focus.
                    tracing::debug!(%scancode, "dropping release without press");
                    return;
                }
                self.context.record_release(scancode)
            }
        };
        if let Err(e) = result {
            self.fail(event_loop, e.into());
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let report = match self.context.run_frame_with(&mut self.toggles) {
            Ok(report) => report,
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let frame = RenderFrame::capture(&self.context, &report);
        let summary = self
            .toggles
            .hud
            .then(|| SimulationInspector::summary(&self.context));
        let debug_text = self
            .toggles
            .debug_hud
            .then(|| self.debug_text.render(&frame));

        let Some(gpu) = &mut self.gpu else {
            return;
        };
        if let Some(vsync) = self.toggles.take_vsync_change() {
            gpu.set_vsync(vsync);
        }
        gpu.draw(&self.egui_ctx, &frame, summary.as_ref(), debug_text.as_deref());
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx, self.toggles.vsync) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => self.fail(event_loop, e.context("failed to initialize the window")),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            // Key and focus events always reach the ledger so presses stay paired.
            let ours = matches!(
                event,
                WindowEvent::KeyboardInput { .. } | WindowEvent::Focused(_)
            );
            if response.consumed && !ours {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::Focused(false) => {
                let released = self.context.release_all();
                tracing::debug!(released, "focus lost");
            }
            WindowEvent::Focused(true) => {
                self.context.mouse_mut().reseed();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.on_key(event_loop, &event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.context.update_mouse(position.x, position.y);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SimulationConfig::default(),
    };

    let mut store = RunStore::open(&cli.data_dir)
        .with_context(|| format!("failed to open run record in {}", cli.data_dir.display()))?;
    let context = SimulationContext::system(&config, store.previous_start());
    store.record_start(context.clock().beginning())?;

    tracing::info!(
        first_run = context.clock().is_first_run(),
        "blockytry-desktop starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(context, !cli.no_vsync);
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
