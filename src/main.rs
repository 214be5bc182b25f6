use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use metamarch::camera::OrbitRig;
use metamarch::config::{validate_config, vec3_from, FrameJobConfig, IncomingConfig, RenderMode};
use metamarch::driver::{render_cpu, FrameDriver};
use metamarch::env::{self, EnvironmentSlot};
use metamarch::gpu::GpuRenderer;
use metamarch::panel::ParamPanel;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut raw = String::new();
    io::stdin().read_to_string(&mut raw)?;

    let incoming: IncomingConfig = serde_json::from_str(&raw)?;
    let jobs = match incoming {
        IncomingConfig::Single(job) => vec![*job],
        IncomingConfig::Batch(batch) => batch.jobs,
    };
    if jobs.is_empty() {
        return Err("jobs array must not be empty".into());
    }
    for job in &jobs {
        validate_config(job)?;
    }

    let total: u32 = jobs.iter().map(|job| job.frame_count).sum();
    let mut rendered = 0u32;
    let mut gpu_renderer: Option<GpuRenderer> = None;

    for job in &jobs {
        let mode = RenderMode::parse(&job.renderer_mode);
        if mode == RenderMode::Gpu && gpu_renderer.is_none() {
            let renderer = pollster::block_on(GpuRenderer::new())
                .map_err(|error| format!("GPU initialization failed: {error}"))?;
            gpu_renderer = Some(renderer);
        }

        let env_slot = EnvironmentSlot::new();
        if let Some(path) = &job.env_map_path {
            env::spawn_loader(env_slot.clone(), PathBuf::from(path));
        }

        let mut driver = FrameDriver::new(
            job.width,
            job.height,
            rig_from_job(job),
            panel_from_job(job)?,
            env_slot,
        );

        let frame_dt = 1.0 / job.fps;
        for index in 0..job.frame_count {
            if index > 0 {
                driver.advance(frame_dt);
            }

            let started = Instant::now();
            let Some(state) = driver.frame_state() else {
                // Zero-area surface: skip the evaluation, keep the loop alive.
                continue;
            };
            let image = match mode {
                RenderMode::Cpu => render_cpu(&state),
                RenderMode::Gpu => {
                    let renderer = gpu_renderer
                        .as_mut()
                        .ok_or("internal error: GPU renderer missing for gpu job")?;
                    renderer
                        .render_frame(&state)
                        .map_err(|error| format!("GPU render failed: {error}"))?
                }
            };
            let elapsed_ms = started.elapsed().as_millis();

            let output_path = frame_output_path(&job.output_path, index, job.frame_count);
            image.save(&output_path)?;

            rendered += 1;
            println!(
                "[{}/{}] Rendered frame at t={:.3}s [{}] in {} ms: {}",
                rendered,
                total,
                driver.time(),
                mode.as_str(),
                elapsed_ms,
                output_path.display()
            );
        }
    }

    // The renderer lifetime matches the process here, and some driver stacks
    // crash while tearing down WGPU objects on drop.
    if let Some(renderer) = gpu_renderer {
        std::mem::forget(renderer);
    }

    Ok(())
}

fn panel_from_job(job: &FrameJobConfig) -> Result<ParamPanel, Box<dyn std::error::Error>> {
    let mut panel = ParamPanel::new();
    for (name, value) in &job.params {
        panel.set(name, *value)?;
    }
    if let Some(dir) = job.light_dir {
        panel.light_dir = vec3_from(dir);
    }
    if let Some(color) = job.light_color {
        panel.light_color = vec3_from(color);
    }
    if let Some(color) = job.clear_color {
        panel.clear_color = vec3_from(color);
    }
    Ok(panel)
}

fn rig_from_job(job: &FrameJobConfig) -> OrbitRig {
    match &job.orbit {
        Some(orbit) => OrbitRig::new(
            orbit.azimuth_deg.to_radians(),
            orbit.elevation_deg.to_radians(),
            orbit.distance,
            orbit.speed_deg_per_sec.to_radians(),
        ),
        None => OrbitRig::default(),
    }
}

fn frame_output_path(path: &str, index: u32, frame_count: u32) -> PathBuf {
    if frame_count <= 1 {
        return PathBuf::from(path);
    }
    let path = Path::new(path);
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("frame");
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or("png");
    path.with_file_name(format!("{stem}_{index:03}.{extension}"))
}
