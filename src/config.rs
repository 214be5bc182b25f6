use std::collections::HashMap;
use std::path::Path;

use glam::Vec3;
use serde::Deserialize;

use crate::panel::PARAM_SPECS;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameJobConfig {
    pub width: u32,
    pub height: u32,
    pub output_path: String,
    #[serde(default = "default_renderer_mode")]
    pub renderer_mode: String,
    #[serde(default = "default_frame_count")]
    pub frame_count: u32,
    #[serde(default = "default_fps")]
    pub fps: f32,
    pub env_map_path: Option<String>,
    #[serde(default)]
    pub orbit: Option<OrbitConfig>,
    #[serde(default)]
    pub params: HashMap<String, f32>,
    pub light_dir: Option<[f32; 3]>,
    pub light_color: Option<[f32; 3]>,
    pub clear_color: Option<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitConfig {
    #[serde(default)]
    pub azimuth_deg: f32,
    #[serde(default)]
    pub elevation_deg: f32,
    #[serde(default = "default_orbit_distance")]
    pub distance: f32,
    #[serde(default)]
    pub speed_deg_per_sec: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameJobBatch {
    pub jobs: Vec<FrameJobConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IncomingConfig {
    Single(Box<FrameJobConfig>),
    Batch(FrameJobBatch),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    Cpu,
    Gpu,
}

impl RenderMode {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("gpu") {
            Self::Gpu
        } else {
            Self::Cpu
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
        }
    }
}

const fn default_frame_count() -> u32 {
    1
}

const fn default_fps() -> f32 {
    60.0
}

const fn default_orbit_distance() -> f32 {
    5.0
}

fn default_renderer_mode() -> String {
    "cpu".to_string()
}

pub fn validate_config(config: &FrameJobConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.width == 0 || config.height == 0 {
        return Err("width and height must be positive".into());
    }

    if config.output_path.trim().is_empty() {
        return Err("outputPath must be a non-empty path".into());
    }
    let output_parent = Path::new(&config.output_path)
        .parent()
        .ok_or("outputPath must include a parent directory")?;
    if !output_parent.as_os_str().is_empty() && !output_parent.exists() {
        return Err(format!(
            "output directory does not exist: {}",
            output_parent.display()
        )
        .into());
    }

    if config.renderer_mode.trim().is_empty() {
        return Err("rendererMode must be a non-empty string".into());
    }

    if config.frame_count == 0 {
        return Err("frameCount must be at least 1".into());
    }

    if !config.fps.is_finite() || config.fps <= 0.0 {
        return Err(format!("fps must be finite and positive, got {}", config.fps).into());
    }

    for (name, value) in &config.params {
        if PARAM_SPECS.iter().all(|spec| spec.name != name) {
            return Err(format!("unknown parameter name: {name}").into());
        }
        if !value.is_finite() {
            return Err(format!("parameter '{name}' must be finite, got {value}").into());
        }
    }

    for (field, value) in [
        ("lightDir", config.light_dir),
        ("lightColor", config.light_color),
        ("clearColor", config.clear_color),
    ] {
        if let Some(value) = value {
            if !is_finite_vec3(value) {
                return Err(format!("{field} components must be finite").into());
            }
        }
    }
    if let Some(dir) = config.light_dir {
        if vec3_from(dir).length() < 1e-4 {
            return Err("lightDir must have non-zero length".into());
        }
    }

    if let Some(orbit) = &config.orbit {
        for (field, value) in [
            ("azimuthDeg", orbit.azimuth_deg),
            ("elevationDeg", orbit.elevation_deg),
            ("distance", orbit.distance),
            ("speedDegPerSec", orbit.speed_deg_per_sec),
        ] {
            if !value.is_finite() {
                return Err(format!("orbit.{field} must be finite, got {value}").into());
            }
        }
    }

    Ok(())
}

pub fn vec3_from(value: [f32; 3]) -> Vec3 {
    Vec3::new(value[0], value[1], value[2])
}

fn is_finite_vec3(value: [f32; 3]) -> bool {
    value.iter().all(|component| component.is_finite())
}
