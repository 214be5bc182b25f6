use glam::{Vec2, Vec3};
use image::{Rgb, RgbImage};
use rayon::prelude::*;
use std::sync::Arc;

use crate::camera::{Camera, OrbitRig};
use crate::env::{EnvironmentMap, EnvironmentSlot};
use crate::field::SceneField;
use crate::march::march;
use crate::panel::{ParamPanel, ParamSnapshot};
use crate::raygen::{primary_ray, ScreenQuad};
use crate::shade::{shade, shade_miss};

/// Everything one frame evaluation reads: an immutable copy of the camera
/// and parameter snapshot plus the environment map if it has finished
/// loading. Per-pixel evaluation over this state is pure.
pub struct FrameState<'a> {
    pub camera: Camera,
    pub params: ParamSnapshot,
    pub time: f32,
    pub env: Option<&'a EnvironmentMap>,
    pub width: u32,
    pub height: u32,
}

/// Per-frame orchestration: advances simulation time, moves the orbit rig,
/// refits the camera-aligned quad and snapshots the live parameters before
/// handing a frame state to a backend.
pub struct FrameDriver {
    pub panel: ParamPanel,
    pub rig: OrbitRig,
    camera: Camera,
    quad: ScreenQuad,
    env: Arc<EnvironmentSlot>,
    width: u32,
    height: u32,
    time: f32,
}

impl FrameDriver {
    pub fn new(
        width: u32,
        height: u32,
        rig: OrbitRig,
        panel: ParamPanel,
        env: Arc<EnvironmentSlot>,
    ) -> Self {
        let aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        let mut camera = Camera::new(aspect);
        rig.apply(&mut camera);
        let quad = ScreenQuad::fit(&camera);
        Self {
            panel,
            rig,
            camera,
            quad,
            env,
            width,
            height,
            time: 0.0,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn quad(&self) -> &ScreenQuad {
        &self.quad
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Viewport size change: recompute the projection and the quad. A zero
    /// area is remembered so frame evaluation is skipped, not an error.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        if width > 0 && height > 0 {
            self.camera.set_aspect(width as f32 / height as f32);
            self.quad = ScreenQuad::fit(&self.camera);
        }
    }

    /// Advance simulation time and reposition the camera-aligned quad at the
    /// camera's current near-plane transform.
    pub fn advance(&mut self, dt: f32) {
        self.time += dt.max(0.0);
        self.rig.advance(dt.max(0.0));
        self.rig.apply(&mut self.camera);
        self.quad = ScreenQuad::fit(&self.camera);
    }

    /// Snapshot the frame inputs, or None while the surface has zero area.
    pub fn frame_state(&self) -> Option<FrameState<'_>> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(FrameState {
            camera: self.camera,
            params: self.panel.snapshot(),
            time: self.time,
            env: self.env.get(),
            width: self.width,
            height: self.height,
        })
    }
}

/// One full-screen CPU evaluation, split across scanlines.
pub fn render_cpu(state: &FrameState) -> RgbImage {
    let width = state.width as usize;
    let height = state.height as usize;
    let mut color_buffer = vec![Vec3::ZERO; width * height];

    color_buffer
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, slot) in row.iter_mut().enumerate() {
                let ndc = pixel_to_ndc(x as u32, y as u32, state.width, state.height);
                *slot = shade_pixel(ndc, state);
            }
        });

    let mut image = RgbImage::new(state.width, state.height);
    for y in 0..height {
        for x in 0..width {
            let color = color_buffer[(y * width) + x];
            image.put_pixel(x as u32, y as u32, to_srgb(color));
        }
    }
    image
}

pub fn pixel_to_ndc(x: u32, y: u32, width: u32, height: u32) -> Vec2 {
    Vec2::new(
        (((x as f32 + 0.5) / width as f32) * 2.0) - 1.0,
        1.0 - (((y as f32 + 0.5) / height as f32) * 2.0),
    )
}

/// The per-pixel pipeline as a pure function of (screen coordinate, frame
/// state): generate the ray, march it, then shade the hit or the miss.
pub fn shade_pixel(ndc: Vec2, state: &FrameState) -> Vec3 {
    let ray = primary_ray(&state.camera, ndc);
    let field = SceneField::new(&state.params, state.time);
    match march(ray, field) {
        Some(hit) => shade(&hit, ray.direction, &state.params, state.env),
        None => shade_miss(&state.params),
    }
}

pub fn to_srgb(color: Vec3) -> Rgb<u8> {
    let corrected = color.clamp(Vec3::ZERO, Vec3::ONE).powf(1.0 / 2.2);
    Rgb([
        (corrected.x * 255.999) as u8,
        (corrected.y * 255.999) as u8,
        (corrected.z * 255.999) as u8,
    ])
}
