use image::{Rgb, RgbImage};

use crate::driver::FrameState;
use crate::env::EnvironmentMap;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuParams {
    size: [u32; 4],
    march: [f32; 4],
    spheres: [f32; 4],
    noise_freq: [f32; 4],
    noise_misc: [f32; 4],
    material_a: [f32; 4],
    material_b: [f32; 4],
    cam_pos: [f32; 4],
    cam_world: [[f32; 4]; 4],
    cam_inv_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
    clear_color: [f32; 4],
}

fn frame_params(state: &FrameState, env_ready: bool) -> GpuParams {
    let p = &state.params;
    GpuParams {
        size: [state.width, state.height, p.max_steps, p.sphere_count],
        march: [p.eps, p.max_distance, state.time, p.smoothing],
        spheres: [
            p.sphere_speed,
            p.sphere_radius,
            p.orbit_distance,
            if env_ready { 1.0 } else { 0.0 },
        ],
        noise_freq: [p.noise_freq_a, p.noise_freq_b, p.noise_amp_a, p.noise_amp_b],
        noise_misc: [
            p.noise_time_mult,
            p.diff_intensity,
            p.spec_intensity,
            p.ambient_intensity,
        ],
        material_a: [p.shininess, p.roughness, p.metalness, p.clearcoat],
        material_b: [
            p.clearcoat_roughness,
            p.transmission,
            p.env_map_intensity,
            0.0,
        ],
        cam_pos: state.camera.position.extend(0.0).to_array(),
        cam_world: state.camera.world.to_cols_array_2d(),
        cam_inv_proj: state.camera.inv_proj.to_cols_array_2d(),
        light_dir: p.light_dir.extend(0.0).to_array(),
        light_color: p.light_color.extend(0.0).to_array(),
        clear_color: p.clear_color.extend(0.0).to_array(),
    }
}

struct GpuFrameResources {
    width: u32,
    height: u32,
    env_ready: bool,
    padded_bytes_per_row: u32,
    output_texture: wgpu::Texture,
    output_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct GpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
    env_texture: wgpu::Texture,
    frame_resources: Option<GpuFrameResources>,
}

impl GpuRenderer {
    pub async fn new() -> Result<Self, String> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| "No compatible GPU adapter available".to_string())?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("metamarch-gpu-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                },
                None,
            )
            .await
            .map_err(|error| format!("request_device failed: {error}"))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("metamarch-march-shader"),
            source: wgpu::ShaderSource::Wgsl(MARCH_SHADER_WGSL.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("metamarch-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("metamarch-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("metamarch-march-pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("metamarch-params-buffer"),
            size: std::mem::size_of::<GpuParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Placeholder until the panorama finishes loading; the shader gates
        // every sample on the env-ready flag anyway.
        let env_texture = create_env_texture(&device, 1, 1);

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            params_buffer,
            env_texture,
            frame_resources: None,
        })
    }

    pub fn render_frame(&mut self, state: &FrameState) -> Result<RgbImage, String> {
        let env_ready = state.env.is_some();
        if let Some(env) = state.env {
            self.ensure_env_uploaded(env);
        }
        self.ensure_frame_resources(state.width, state.height, env_ready);
        let frame = self
            .frame_resources
            .as_ref()
            .ok_or_else(|| "GPU frame resources are not initialized".to_string())?;

        let gpu_params = frame_params(state, env_ready);
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&gpu_params));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("metamarch-command-encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("metamarch-march-pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &frame.bind_group, &[]);
            let groups_x = (state.width + 7) / 8;
            let groups_y = (state.height + 7) / 8;
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &frame.output_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &frame.output_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(frame.padded_bytes_per_row),
                    rows_per_image: Some(state.height),
                },
            },
            wgpu::Extent3d {
                width: state.width,
                height: state.height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(Some(encoder.finish()));

        let slice = frame.output_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| "Failed to receive GPU readback status".to_string())?
            .map_err(|error| format!("GPU readback map failed: {error}"))?;

        let bytes_per_pixel = 4usize;
        let data = slice.get_mapped_range();
        let mut image = RgbImage::new(state.width, state.height);
        for y in 0..state.height as usize {
            let row_start = y * frame.padded_bytes_per_row as usize;
            for x in 0..state.width as usize {
                let pixel_start = row_start + (x * bytes_per_pixel);
                let r = data[pixel_start];
                let g = data[pixel_start + 1];
                let b = data[pixel_start + 2];
                image.put_pixel(x as u32, y as u32, Rgb([r, g, b]));
            }
        }
        drop(data);
        frame.output_buffer.unmap();

        Ok(image)
    }

    fn ensure_env_uploaded(&mut self, env: &EnvironmentMap) {
        let (width, height) = env.dimensions();
        if self.env_texture.width() == width && self.env_texture.height() == height {
            return;
        }

        self.env_texture = create_env_texture(&self.device, width, height);
        let data = env.to_rgba_f32();
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.env_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&data),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width * 16),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        // Bind groups referencing the placeholder are stale now.
        self.frame_resources = None;
    }

    fn ensure_frame_resources(&mut self, width: u32, height: u32, env_ready: bool) {
        let needs_rebuild = match &self.frame_resources {
            Some(resources) => {
                resources.width != width
                    || resources.height != height
                    || resources.env_ready != env_ready
            }
            None => true,
        };
        if !needs_rebuild {
            return;
        }

        let output_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("metamarch-output-texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let output_view = output_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let env_view = self
            .env_texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let unpadded_bytes_per_row = width * 4u32;
        let padded_bytes_per_row = ((unpadded_bytes_per_row + 255) / 256) * 256;
        let output_buffer_size = (padded_bytes_per_row * height) as u64;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("metamarch-readback-buffer"),
            size: output_buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("metamarch-bind-group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&output_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&env_view),
                },
            ],
        });

        self.frame_resources = Some(GpuFrameResources {
            width,
            height,
            env_ready,
            padded_bytes_per_row,
            output_texture,
            output_buffer,
            bind_group,
        });
    }
}

fn create_env_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("metamarch-env-texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba32Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

const MARCH_SHADER_WGSL: &str = include_str!("shaders/march.wgsl");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_params_match_uniform_alignment_rules() {
        // Uniform blocks require 16-byte multiples; the struct is all vec4s
        // and mat4s so the size must already be padded.
        assert_eq!(std::mem::size_of::<GpuParams>() % 16, 0);
    }

    #[test]
    fn env_ready_flag_rides_in_the_sphere_lane() {
        use crate::camera::OrbitRig;
        use crate::driver::FrameDriver;
        use crate::env::EnvironmentSlot;
        use crate::panel::ParamPanel;

        let driver = FrameDriver::new(
            32,
            32,
            OrbitRig::default(),
            ParamPanel::new(),
            EnvironmentSlot::new(),
        );
        let state = driver.frame_state().unwrap();
        let params = frame_params(&state, false);
        assert_eq!(params.spheres[3], 0.0);
        let params = frame_params(&state, true);
        assert_eq!(params.spheres[3], 1.0);
        assert_eq!(params.size[0], 32);
    }
}
