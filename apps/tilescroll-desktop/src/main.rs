use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use glam::{Mat4, Vec3};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tilescroll_render_wgpu::{DayCycle, FollowCamera, FrameTimer, TerrainBuffers, WgpuRenderer};
use tilescroll_terrain::{HeightRaster, HeightmapTerrain, TerrainError};
use tilescroll_tools::WorldInspector;
use tilescroll_world::{Direction, WorldConfig, WorldGrid};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "tilescroll-desktop", about = "Walkable tile world viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// World configuration file (YAML)
    #[arg(long)]
    config: Option<String>,

    /// Heightmap image for the backdrop terrain
    #[arg(long)]
    heightmap: Option<String>,

    /// Skip interval for the reduced terrain mesh
    #[arg(long, default_value_t = DEFAULT_SKIP)]
    skip: usize,
}

const DEFAULT_SKIP: usize = 4;

/// Application state.
struct AppState {
    world: WorldGrid,
    camera: FollowCamera,
    daylight: DayCycle,
    terrain: HeightmapTerrain,
    terrain_dirty: bool,
    frame_timer: FrameTimer,
    show_hud: bool,
    keys_held: HashSet<KeyCode>,
    mouse_captured: bool,
    last_frame: Instant,
    // Fixed timestep for world stepping
    step_accumulator: f64,
    step_rate: f64,
}

impl AppState {
    fn new(config: WorldConfig, terrain: HeightmapTerrain) -> Self {
        let mut camera = FollowCamera::default();
        camera.follow_scale = config.player_scale;
        let world = WorldGrid::new(config);
        camera.set_target(world.player_position());

        Self {
            world,
            camera,
            daylight: DayCycle::default(),
            terrain,
            terrain_dirty: true,
            frame_timer: FrameTimer::new(120),
            show_hud: true,
            keys_held: HashSet::new(),
            mouse_captured: false,
            last_frame: Instant::now(),
            step_accumulator: 0.0,
            step_rate: 1.0 / 60.0,
        }
    }

    fn update(&mut self, dt: f32) {
        self.daylight.advance(dt);

        self.step_accumulator += f64::from(dt);
        while self.step_accumulator >= self.step_rate {
            self.step_accumulator -= self.step_rate;
            self.step_world();
        }

        self.camera.set_target(self.world.player_position());
        self.world.set_player_hidden(self.camera.is_first_person());
    }

    /// One fixed step: the knockback pump runs first and eats the step when
    /// active; otherwise held keys move the player.
    fn step_world(&mut self) {
        let view = self.camera.view_direction();
        let units = self.world.config().move_speed;

        if !self.world.poll_recoil(view, Vec3::Y, units) {
            if let Some(direction) = self.held_direction() {
                self.world.move_player(direction, view, Vec3::Y, units);
            }
        }
        self.world.check_position();
    }

    fn held_direction(&self) -> Option<Direction> {
        let held = |a: KeyCode, b: KeyCode| {
            self.keys_held.contains(&a) || self.keys_held.contains(&b)
        };
        let fb = i8::from(held(KeyCode::KeyW, KeyCode::ArrowUp))
            - i8::from(held(KeyCode::KeyS, KeyCode::ArrowDown));
        let lr = i8::from(held(KeyCode::KeyA, KeyCode::ArrowLeft))
            - i8::from(held(KeyCode::KeyD, KeyCode::ArrowRight));
        match (fb, lr) {
            (1, 0) => Some(Direction::Forward),
            (-1, 0) => Some(Direction::Back),
            (0, 1) => Some(Direction::Left),
            (0, -1) => Some(Direction::Right),
            (1, 1) => Some(Direction::ForwardLeft),
            (1, -1) => Some(Direction::ForwardRight),
            (-1, 1) => Some(Direction::BackLeft),
            (-1, -1) => Some(Direction::BackRight),
            _ => None,
        }
    }

    fn select_terrain_step(&mut self, step: u8) {
        match self.terrain.select_step(step) {
            Ok(()) => {
                self.terrain_dirty = true;
                tracing::info!(step, "terrain step selected");
            }
            Err(e) => tracing::warn!("terrain step {step} refused: {e}"),
        }
    }

    fn adjust_skip(&mut self, delta: i64) {
        let current = self.terrain.skip_interval().unwrap_or(DEFAULT_SKIP) as i64;
        let next = (current + delta).max(1) as usize;
        match self.terrain.set_skip_interval(next) {
            Ok(()) => {
                self.terrain_dirty = true;
                tracing::info!(skip = next, "terrain skip interval set");
            }
            Err(e) => tracing::warn!("skip interval {next} refused: {e}"),
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
        }

        if !pressed {
            return;
        }

        match key {
            KeyCode::Digit1 => self.select_terrain_step(1),
            KeyCode::Digit2 => self.select_terrain_step(2),
            KeyCode::Digit3 => self.select_terrain_step(3),
            KeyCode::Digit4 => self.select_terrain_step(4),
            KeyCode::BracketLeft => self.adjust_skip(-1),
            KeyCode::BracketRight => self.adjust_skip(1),
            KeyCode::Backquote => self.world.toggle_axes(),
            KeyCode::Backspace => self.camera.reset(),
            KeyCode::F1 => self.show_hud = !self.show_hud,
            _ => {}
        }
    }

    /// Placement for the backdrop terrain: centered behind the spawn area,
    /// scaled by the raster-derived base transform.
    fn terrain_model(&self) -> Mat4 {
        let depth = self.terrain.raster().height() as f32;
        Mat4::from_translation(Vec3::new(0.0, -0.25, -(depth / 2.0 + 12.0)))
            * self.terrain.base_scale()
    }

    fn draw_hud(&mut self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }

        let summary = WorldInspector::summary(&self.world);

        egui::SidePanel::left("hud")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Tile Scroll");
                ui.separator();
                ui.label(format!("{summary}"));
                ui.label(format!(
                    "FPS: {:.0} (worst {:.1} ms)",
                    self.frame_timer.fps(),
                    self.frame_timer.worst().as_secs_f32() * 1000.0
                ));
                ui.separator();

                ui.heading("Day cycle");
                ui.label(format!(
                    "{} ({:.0}%)",
                    if self.daylight.is_day() { "day" } else { "night" },
                    self.daylight.progress() * 100.0
                ));
                ui.separator();

                ui.heading("Terrain");
                ui.label(format!(
                    "step {} | skip {} | {} vertices",
                    self.terrain.selected_step(),
                    self.terrain
                        .skip_interval()
                        .map_or_else(|| "-".to_string(), |s| s.to_string()),
                    self.terrain.selected_mesh().vertices.len()
                ));
                ui.horizontal(|ui| {
                    for step in 1..=4u8 {
                        if ui
                            .selectable_label(self.terrain.selected_step() == step, step.to_string())
                            .clicked()
                        {
                            self.select_terrain_step(step);
                        }
                    }
                });
                ui.horizontal(|ui| {
                    if ui.button("skip -").clicked() {
                        self.adjust_skip(-1);
                    }
                    if ui.button("skip +").clicked() {
                        self.adjust_skip(1);
                    }
                });
                ui.separator();

                ui.label(format!(
                    "Camera: {}",
                    if self.camera.is_first_person() {
                        "first person".to_string()
                    } else {
                        format!("follow at {:.2}", self.camera.follow_distance())
                    }
                ));
                ui.separator();
                ui.small("WASD/arrows: walk | LMB: look | Esc: release");
                ui.small("1-4: terrain step | [ ]: skip | `: axes");
                ui.small("Backspace: reset camera | F1: HUD");
            });
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuRenderer>,
    terrain_buffers: Option<TerrainBuffers>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(config: WorldConfig, terrain: HeightmapTerrain) -> Self {
        Self {
            state: AppState::new(config, terrain),
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            terrain_buffers: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    fn set_mouse_captured(&mut self, captured: bool) {
        self.state.mouse_captured = captured;
        if let Some(window) = &self.window {
            window.set_cursor_visible(!captured);
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Tile Scroll")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tilescroll_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("create device");

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.state.camera.aspect = size.width as f32 / size.height.max(1) as f32;

        let renderer = WgpuRenderer::new(&device, surface_format, size.width, size.height);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(egui_winit) = &mut self.egui_winit {
            let response = egui_winit.on_window_event(self.window.as_ref().unwrap(), &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    self.state.camera.aspect = config.width as f32 / config.height.max(1) as f32;
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(device, config.width, config.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if key == KeyCode::Escape && key_state == ElementState::Pressed {
                    self.set_mouse_captured(false);
                    return;
                }
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => {
                self.set_mouse_captured(true);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
                self.state.last_frame = now;
                self.state.update(dt);
                self.state.frame_timer.record(Duration::from_secs_f32(dt));

                let (Some(surface), Some(device), Some(queue)) =
                    (&self.surface, &self.device, &self.queue)
                else {
                    return;
                };

                if self.state.terrain_dirty {
                    self.terrain_buffers = Some(TerrainBuffers::upload(
                        device,
                        self.state.terrain.selected_mesh(),
                        self.state.terrain_model(),
                    ));
                    self.state.terrain_dirty = false;
                }

                let output = match surface.get_current_texture() {
                    Ok(t) => t,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(config) = &self.config {
                            surface.configure(device, config);
                        }
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

                if let Some(renderer) = &self.renderer {
                    renderer.render(
                        device,
                        queue,
                        &view,
                        &self.state.camera,
                        &self.state.daylight,
                        &self.state.world,
                        self.terrain_buffers.as_ref(),
                    );
                }

                let raw_input = self
                    .egui_winit
                    .as_mut()
                    .unwrap()
                    .take_egui_input(self.window.as_ref().unwrap());
                let full_output = self.egui_ctx.run(raw_input, |ctx| {
                    self.state.draw_hud(ctx);
                });

                self.egui_winit.as_mut().unwrap().handle_platform_output(
                    self.window.as_ref().unwrap(),
                    full_output.platform_output,
                );

                let paint_jobs = self
                    .egui_ctx
                    .tessellate(full_output.shapes, full_output.pixels_per_point);

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [
                        self.config.as_ref().unwrap().width,
                        self.config.as_ref().unwrap().height,
                    ],
                    pixels_per_point: full_output.pixels_per_point,
                };

                {
                    let egui_renderer = self.egui_renderer.as_mut().unwrap();
                    for (id, image_delta) in &full_output.textures_delta.set {
                        egui_renderer.update_texture(device, queue, *id, image_delta);
                    }
                    let mut encoder =
                        device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("egui_encoder"),
                        });
                    egui_renderer.update_buffers(
                        device,
                        queue,
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
                        egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
                    }
                    queue.submit(std::iter::once(encoder.finish()));
                    for id in &full_output.textures_delta.free {
                        egui_renderer.free_texture(id);
                    }
                }

                output.present();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.mouse_captured {
                self.state.camera.rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Synthesized backdrop heightmap for runs without a raster on disk.
fn rolling_hills(width: usize, height: usize) -> Result<HeightRaster, TerrainError> {
    let mut samples = Vec::with_capacity(width * height);
    for i in 0..width * height {
        let x = (i % width) as f32;
        let z = (i / width) as f32;
        let value = 0.5
            + 0.25 * (x * 0.35).sin() * (z * 0.23).cos()
            + 0.15 * (x * 0.07 + z * 0.11).sin();
        samples.push(value.clamp(0.0, 1.0));
    }
    HeightRaster::from_samples(width, height, samples)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let fallback = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => WorldConfig::from_yaml_file(path)?,
        None => WorldConfig::default(),
    };
    let raster = match &cli.heightmap {
        Some(path) => HeightRaster::load(path)?,
        None => rolling_hills(64, 64)?,
    };
    let mut terrain = HeightmapTerrain::new(raster);
    terrain.set_skip_interval(cli.skip)?;

    tracing::info!("tilescroll-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config, terrain);
    event_loop.run_app(&mut app)?;

    Ok(())
}
