use glam::{Mat4, Vec3};

pub const DEFAULT_FOV_DEG: f32 = 75.0;
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 1000.0;

/// Perspective camera state as the core reads it each frame: position, the
/// camera-to-world matrix and the inverse projection. Mutated only between
/// frames by the orbit rig.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub world: Mat4,
    pub inv_proj: Mat4,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            world: Mat4::IDENTITY,
            inv_proj: Mat4::IDENTITY,
            fov_y: DEFAULT_FOV_DEG.to_radians(),
            aspect: aspect.max(1e-6),
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        };
        camera.rebuild_projection();
        camera.look_at(Vec3::ZERO, Vec3::Y);
        camera
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect.max(1e-6);
        self.rebuild_projection();
    }

    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.world = Mat4::look_at_rh(self.position, target, up).inverse();
    }

    /// World-space forward direction (camera space looks down -Z).
    pub fn forward(&self) -> Vec3 {
        self.world.transform_vector3(Vec3::NEG_Z).normalize()
    }

    fn rebuild_projection(&mut self) {
        // GL-style clip volume so the inverse projection un-projects
        // normalized screen coordinates with a -1 near plane.
        let proj = Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far);
        self.inv_proj = proj.inverse();
    }
}

/// Orbit-control collaborator: keeps the camera on a sphere around the
/// target and advances the azimuth over time. Distance is clamped to the
/// same [2, 10] range the interactive controls enforce.
#[derive(Clone, Copy, Debug)]
pub struct OrbitRig {
    pub azimuth: f32,
    pub elevation: f32,
    pub distance: f32,
    pub speed: f32,
    pub target: Vec3,
}

pub const ORBIT_MIN_DISTANCE: f32 = 2.0;
pub const ORBIT_MAX_DISTANCE: f32 = 10.0;

impl OrbitRig {
    pub fn new(azimuth: f32, elevation: f32, distance: f32, speed: f32) -> Self {
        Self {
            azimuth,
            elevation: elevation.clamp(-1.5, 1.5),
            distance: distance.clamp(ORBIT_MIN_DISTANCE, ORBIT_MAX_DISTANCE),
            speed,
            target: Vec3::ZERO,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.azimuth += self.speed * dt;
    }

    pub fn apply(&self, camera: &mut Camera) {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        camera.position = self.target
            + (Vec3::new(sin_az * cos_el, sin_el, cos_az * cos_el) * self.distance);
        camera.look_at(self.target, Vec3::Y);
    }
}

impl Default for OrbitRig {
    fn default() -> Self {
        // Matches the host's initial pose: camera at (0, 0, 5) facing origin.
        Self::new(0.0, 0.0, 5.0, 0.0)
    }
}
