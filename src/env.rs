use std::f32::consts::PI;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;

use glam::Vec3;
use image::Rgb32FImage;

/// Equirectangular HDR panorama kept as linear RGB texels.
pub struct EnvironmentMap {
    width: u32,
    height: u32,
    texels: Vec<Vec3>,
}

impl EnvironmentMap {
    pub fn from_image(image: Rgb32FImage) -> Self {
        let (width, height) = image.dimensions();
        let texels = image
            .pixels()
            .map(|pixel| Vec3::new(pixel.0[0], pixel.0[1], pixel.0[2]))
            .collect();
        Self {
            width: width.max(1),
            height: height.max(1),
            texels,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Texels flattened to RGBA32F for GPU upload.
    pub fn to_rgba_f32(&self) -> Vec<f32> {
        let mut data = Vec::with_capacity(self.texels.len() * 4);
        for texel in &self.texels {
            data.extend_from_slice(&[texel.x, texel.y, texel.z, 1.0]);
        }
        data
    }

    fn texel(&self, x: i64, y: i64) -> Vec3 {
        let x = x.rem_euclid(self.width as i64) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.texels[((y * self.width) + x) as usize]
    }

    /// Bilinear lookup of a world direction: longitude wraps, latitude clamps
    /// at the poles.
    pub fn sample(&self, direction: Vec3) -> Vec3 {
        let d = direction.normalize_or_zero();
        if d == Vec3::ZERO {
            return Vec3::ZERO;
        }

        let u = (d.z.atan2(d.x) / (2.0 * PI)) + 0.5;
        let v = d.y.clamp(-1.0, 1.0).acos() / PI;

        let x = (u * self.width as f32) - 0.5;
        let y = (v * self.height as f32) - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self
            .texel(x0, y0)
            .lerp(self.texel(x0 + 1, y0), fx);
        let bottom = self
            .texel(x0, y0 + 1)
            .lerp(self.texel(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }
}

/// Write-once holder shared between the loader thread and the frame loop.
/// Readers see either "not ready" or the fully decoded panorama.
pub struct EnvironmentSlot {
    ready: AtomicBool,
    map: OnceLock<EnvironmentMap>,
}

impl EnvironmentSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(false),
            map: OnceLock::new(),
        })
    }

    pub fn install(&self, map: EnvironmentMap) {
        if self.map.set(map).is_ok() {
            self.ready.store(true, Ordering::Release);
        }
    }

    pub fn get(&self) -> Option<&EnvironmentMap> {
        if !self.ready.load(Ordering::Acquire) {
            return None;
        }
        self.map.get()
    }
}

pub fn load_environment(path: &std::path::Path) -> Result<EnvironmentMap, String> {
    let decoded = image::open(path)
        .map_err(|error| format!("failed to decode environment map {}: {error}", path.display()))?;
    Ok(EnvironmentMap::from_image(decoded.into_rgb32f()))
}

/// Decode the panorama off the render thread. The frame loop keeps running
/// with a zero environment contribution until the slot flips ready; a decode
/// failure is reported once and the slot stays empty.
pub fn spawn_loader(slot: Arc<EnvironmentSlot>, path: PathBuf) -> thread::JoinHandle<()> {
    thread::spawn(move || match load_environment(&path) {
        Ok(map) => slot.install(map),
        Err(error) => eprintln!("warning: {error}"),
    })
}
