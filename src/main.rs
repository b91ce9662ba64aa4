use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use glam::Vec2;

mod config;
mod math;
mod renderer;
mod ui;

use config::{AppConfig, ConfigError};
use math::{SurfaceParameters, Tessellation};
use renderer::background::SolidColor;
use renderer::{
    BackgroundFeed, Eye, FrameSource, FrameUniforms, GpuState, RenderError, StereoCamera,
    Trackball, source_from_config,
};
use ui::{FrameStats, RenderState, UiActions, apply_theme, draw_help_overlay, draw_side_panel};

#[derive(thiserror::Error, Debug)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

#[derive(Default)]
struct InputState {
    dragging: bool,
    mouse_delta: Vec2,
}

struct App {
    config: AppConfig,
    mesh: Tessellation,

    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    base_camera: StereoCamera,
    trackball: Trackball,
    render_state: RenderState,
    feed: BackgroundFeed,
    input: InputState,

    frame_count: u32,
    fps_timer: Instant,
    fps: f32,

    last_vsync_state: bool,
    fatal: Option<AppError>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let mesh = math::surface::generate(&SurfaceParameters::default());

        let camera = &config.camera;
        let base_camera = StereoCamera::new(
            camera.convergence,
            camera.eye_separation,
            camera.aspect_ratio,
            camera.fov_deg,
            camera.near,
            camera.far,
        );

        let trackball = Trackball {
            sensitivity: config.controls.mouse_sensitivity,
            ..Trackball::default()
        };

        let source = source_from_config(&config.background.source).unwrap_or_else(|e| {
            log::warn!("background source unavailable, using solid color: {e}");
            Box::new(SolidColor::new([0, 0, 0, 255])) as Box<dyn FrameSource>
        });
        let feed = BackgroundFeed::spawn(source, config.background.fps);

        let render_state = RenderState::from_config(&config);
        let last_vsync_state = render_state.vsync_enabled;

        Self {
            config,
            mesh,

            window: None,
            gpu: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),

            base_camera,
            trackball,
            render_state,
            feed,
            input: InputState::default(),

            frame_count: 0,
            fps_timer: Instant::now(),
            fps: 0.0,

            last_vsync_state,
            fatal: None,
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> Result<(), AppError> {
        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            &self.mesh,
            self.config.surface.texture.as_deref(),
            self.render_state.vsync_enabled,
        ))?;

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn update(&mut self) {
        self.frame_count += 1;
        let elapsed = self.fps_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            self.fps = self.frame_count as f32 / elapsed;
            self.frame_count = 0;
            self.fps_timer = Instant::now();
        }

        if self.input.dragging {
            self.trackball.process_mouse_movement(self.input.mouse_delta);
        }
        self.input.mouse_delta = Vec2::ZERO;

        // only the newest frame matters
        let mut latest = None;
        while let Some(frame) = self.feed.try_recv_frame() {
            latest = Some(frame);
        }
        if let (Some(frame), Some(gpu)) = (latest, &mut self.gpu) {
            gpu.upload_background(&frame);
        }
    }

    fn render(&mut self) {
        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return;
        };

        let raw_input = egui_state.take_egui_input(window);

        let feed_error = self.feed.last_error();
        let stats = FrameStats {
            fps: self.fps,
            vertex_count: self.mesh.vertex_count(),
            feed_error: feed_error.as_deref(),
        };

        let mut ui_actions = UiActions::default();

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_actions = draw_side_panel(ctx, &mut self.render_state, &stats);
            draw_help_overlay(ctx);
        });

        self.handle_ui_actions(ui_actions);

        let Some(gpu) = &mut self.gpu else { return };
        let Some(window) = &self.window else { return };
        let Some(egui_state) = &mut self.egui_state else {
            return;
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return;
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        if self.render_state.vsync_enabled != self.last_vsync_state {
            gpu.set_vsync(self.render_state.vsync_enabled);
            self.last_vsync_state = self.render_state.vsync_enabled;
        }

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("surface {e}, reconfiguring");
                gpu.resize(gpu.size);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fatal = Some(RenderError::OutOfMemory.into());
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::trace!("surface timeout");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let frame = FrameUniforms::compute(self.base_camera, &self.trackball, &self.render_state);
        gpu.update_eyes(&frame);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, id, &delta);
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        gpu.render_background(&view, &mut encoder);
        for eye in Eye::BOTH {
            gpu.render_surface(eye, &view, &mut encoder);
        }

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in full_output.textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        window.request_redraw();
    }

    fn handle_ui_actions(&mut self, actions: UiActions) {
        if actions.reset_controls {
            self.render_state.reset_controls(&self.config);
        }

        if actions.reset_view {
            self.trackball.reset();
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let state = &mut self.render_state;

        match key {
            KeyCode::ArrowLeft => state.light.step_back(),
            KeyCode::ArrowRight => state.light.step_forward(),
            KeyCode::KeyW => state.step_scale_point_v(-1.0),
            KeyCode::KeyS => state.step_scale_point_v(1.0),
            KeyCode::KeyA => state.step_scale_point_u(-1.0),
            KeyCode::KeyD => state.step_scale_point_u(1.0),
            KeyCode::Equal | KeyCode::NumpadAdd => state.step_controller_scale(1.0),
            KeyCode::Minus | KeyCode::NumpadSubtract => state.step_controller_scale(-1.0),
            KeyCode::KeyR => self.trackball.reset(),
            _ => {}
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        self.fatal = Some(error);
        self.feed.stop();
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_config = &self.config.window;
        let window_attrs = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));

        let result = event_loop
            .create_window(window_attrs)
            .map_err(AppError::from)
            .and_then(|window| self.init_gpu(Arc::new(window)));

        if let Err(e) = result {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(egui_state) = &mut self.egui_state {
            if let Some(window) = &self.window {
                let response = egui_state.on_window_event(window, &event);
                if response.consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.feed.stop();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    if let PhysicalKey::Code(key) = event.physical_key {
                        self.handle_key(key);
                    }
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.input.dragging = state == ElementState::Pressed;
            }

            WindowEvent::RedrawRequested => {
                self.update();
                self.render();
                if let Some(error) = self.fatal.take() {
                    self.fail(event_loop, error);
                }
            }

            _ => {}
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: winit::event::DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.input.dragging {
                self.input.mouse_delta.x += delta.0 as f32;
                self.input.mouse_delta.y += delta.1 as f32;
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn run() -> Result<(), AppError> {
    let (config, source) = AppConfig::load()?;
    match source {
        Some(path) => log::info!("config loaded from {}", path.display()),
        None => log::info!("no config file, using defaults"),
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    log::info!("surface tessellated: {} vertices", app.mesh.vertex_count());

    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}
