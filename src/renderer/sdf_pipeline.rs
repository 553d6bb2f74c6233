//! SDF-based WebGPU render pipeline
//!
//! Renders the entire scene in the fragment shader using signed
//! distance fields; the CPU side only uploads the skyline, craters,
//! gorillas and a handful of globals each frame.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::settings::Settings;
use crate::sim::state::EXPLOSION_FX_SECS;
use crate::sim::{Crater, GameState, RoundPhase};

/// Maximum number of buildings supported
const MAX_BUILDINGS: usize = 32;
/// Maximum number of craters supported
const MAX_CRATERS: usize = 64;
/// Both gorillas
const GORILLA_SLOTS: usize = 2;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2],    // offset 0
    world: [f32; 2],         // offset 8 - logical playfield size
    time: f32,               // offset 16
    screen_shake: f32,       // offset 20
    building_count: u32,     // offset 24
    crater_count: u32,       // offset 28
    bullet_pos: [f32; 2],    // offset 32
    bullet_age: f32,         // offset 40
    bullet_radius: f32,      // offset 44
    aim_origin: [f32; 2],    // offset 48
    aim_angle: f32,          // offset 56 - radians
    aim_power: f32,          // offset 60 - normalized 0-1
    explosion_pos: [f32; 2], // offset 64
    explosion_radius: f32,   // offset 72
    explosion_t: f32,        // offset 76 - flash progress 0-1
    bullet_active: u32,      // offset 80
    aim_active: u32,         // offset 84
    active_player: u32,      // offset 88
    phase: u32,              // offset 92 - 0 aiming, 1 firing, 2 round over
    sun_face: u32,           // offset 96 - 0 off, 1 calm, 2 shocked
    _pad: [u32; 3],          // pad to 112 bytes
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct BuildingData {
    x: f32,
    top: f32,
    width: f32,
    color: u32,
    window_cols: u32,
    window_rows: u32,
    windows_lo: u32,
    windows_hi: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CraterData {
    pos: [f32; 2],
    radius: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GorillaData {
    pos: [f32; 2],
    radius: f32,
    health: f32,
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    buildings_buffer: wgpu::Buffer,
    craters_buffer: wgpu::Buffer,
    gorillas_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
    start_time: f64,
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Self {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);
        log::info!("Using surface format: {surface_format:?}");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sdf_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let buildings_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("buildings"),
            size: (std::mem::size_of::<BuildingData>() * MAX_BUILDINGS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let craters_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("craters"),
            size: (std::mem::size_of::<CraterData>() * MAX_CRATERS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let gorillas_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gorillas"),
            size: (std::mem::size_of::<GorillaData>() * GORILLA_SLOTS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buildings_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: craters_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: gorillas_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            buildings_buffer,
            craters_buffer,
            gorillas_buffer,
            bind_group,
            size: (width, height),
            start_time: 0.0,
        }
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn set_start_time(&mut self, time: f64) {
        self.start_time = time;
    }

    /// Update GPU buffers from game state and render
    pub fn render(
        &mut self,
        state: &GameState,
        settings: &Settings,
        time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        // time is ms since page load from requestAnimationFrame
        let elapsed = ((time - self.start_time) / 1000.0) as f32;

        let tuning = &state.tuning;
        let building_count = state.terrain.buildings.len().min(MAX_BUILDINGS) as u32;
        let visible_craters = renderable_craters(&state.terrain.craters);
        let crater_count = visible_craters.len() as u32;

        let effective_shake = if settings.effective_screen_shake() {
            state.screen_shake
        } else {
            0.0
        };

        let (explosion_pos, explosion_radius, explosion_t) = match state.explosion {
            Some(fx) if settings.effective_explosion_flash() => (
                [fx.pos.x, fx.pos.y],
                fx.radius,
                (fx.age / EXPLOSION_FX_SECS).min(1.0),
            ),
            _ => ([0.0, 0.0], 0.0, 0.0),
        };

        let bullet = state.bullet;
        let (bullet_pos, bullet_age, bullet_radius) = match bullet {
            Some(b) => ([b.pos.x, b.pos.y], b.age, b.radius),
            None => ([0.0, 0.0], 0.0, 0.0),
        };

        // Sun goes wide-eyed while the bullet flies close
        let sun_face = if !settings.sun_face {
            0
        } else {
            let sun = glam::Vec2::new(tuning.screen_w * 0.5, SUN_Y);
            match bullet {
                Some(b) if b.pos.distance(sun) < SUN_SHOCK_RANGE => 2,
                _ => 1,
            }
        };

        let aiming = state.phase == RoundPhase::Aiming;
        let shooter = &state.players[state.active_player];
        let origin = state.active_gorilla().pos;
        let power_span = (tuning.power_max - tuning.power_min).max(1e-3);

        let globals = Globals {
            resolution: [self.size.0 as f32, self.size.1 as f32],
            world: [tuning.screen_w, tuning.screen_h],
            time: elapsed,
            screen_shake: effective_shake,
            building_count,
            crater_count,
            bullet_pos,
            bullet_age,
            bullet_radius,
            aim_origin: [origin.x, origin.y],
            aim_angle: shooter.aim_angle.to_radians(),
            aim_power: ((shooter.power - tuning.power_min) / power_span).clamp(0.0, 1.0),
            explosion_pos,
            explosion_radius,
            explosion_t,
            bullet_active: bullet.is_some() as u32,
            aim_active: aiming as u32,
            active_player: state.active_player as u32,
            phase: match state.phase {
                RoundPhase::Aiming => 0,
                RoundPhase::Firing => 1,
                RoundPhase::RoundOver { .. } => 2,
            },
            sun_face,
            _pad: [0; 3],
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let mut buildings_data = [BuildingData::zeroed(); MAX_BUILDINGS];
        for (slot, building) in buildings_data
            .iter_mut()
            .zip(state.terrain.buildings.iter().take(MAX_BUILDINGS))
        {
            *slot = BuildingData {
                x: building.x,
                top: building.top,
                width: building.width,
                color: building.color,
                window_cols: building.window_cols,
                window_rows: building.window_rows,
                windows_lo: building.windows_lit as u32,
                windows_hi: (building.windows_lit >> 32) as u32,
            };
        }
        self.queue.write_buffer(
            &self.buildings_buffer,
            0,
            bytemuck::cast_slice(&buildings_data),
        );

        let mut craters_data = [CraterData::zeroed(); MAX_CRATERS];
        for (slot, crater) in craters_data.iter_mut().zip(visible_craters) {
            *slot = CraterData {
                pos: [crater.pos.x, crater.pos.y],
                radius: crater.radius,
                _pad: 0.0,
            };
        }
        self.queue
            .write_buffer(&self.craters_buffer, 0, bytemuck::cast_slice(&craters_data));

        let mut gorillas_data = [GorillaData::zeroed(); GORILLA_SLOTS];
        for (slot, gorilla) in gorillas_data.iter_mut().zip(state.gorillas.iter()) {
            *slot = GorillaData {
                pos: [gorilla.pos.x, gorilla.pos.y],
                radius: gorilla.radius,
                health: gorilla.health,
            };
        }
        self.queue.write_buffer(
            &self.gorillas_buffer,
            0,
            bytemuck::cast_slice(&gorillas_data),
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Craters the shader draws; past capacity the newest keep their slots
fn renderable_craters(craters: &[Crater]) -> &[Crater] {
    let skip = craters.len().saturating_sub(MAX_CRATERS);
    &craters[skip..]
}

/// Sun center height in world pixels; the shader places it the same way
const SUN_Y: f32 = 70.0;
/// Bullet distance at which the sun face goes shocked
const SUN_SHOCK_RANGE: f32 = 90.0;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn crater_row(n: usize) -> Vec<Crater> {
        (0..n)
            .map(|i| Crater {
                pos: Vec2::new(i as f32, 500.0),
                radius: 10.0,
            })
            .collect()
    }

    #[test]
    fn test_renderable_craters_keeps_all_under_capacity() {
        let craters = crater_row(3);
        let visible = renderable_craters(&craters);
        assert_eq!(visible.len(), 3);
        assert_eq!(visible[0].pos.x, 0.0);
    }

    #[test]
    fn test_renderable_craters_drops_oldest_past_capacity() {
        let craters = crater_row(MAX_CRATERS + 10);
        let visible = renderable_craters(&craters);
        assert_eq!(visible.len(), MAX_CRATERS);
        assert_eq!(visible[0].pos.x, 10.0, "the ten oldest fall off");
        assert_eq!(visible[MAX_CRATERS - 1].pos.x, (MAX_CRATERS + 9) as f32);
    }
}
