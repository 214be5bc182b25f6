use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::camera::Camera;
use crate::math::Ray;

/// The camera-aligned quad: a flat surface repositioned each frame at the
/// near-plane distance along the camera's forward vector, sized so one
/// fragment covers exactly one screen pixel's ray.
#[derive(Clone, Copy, Debug)]
pub struct ScreenQuad {
    pub width: f32,
    pub height: f32,
    pub center: Vec3,
}

impl ScreenQuad {
    /// Sized to cover the view frustum at the near plane. Must be refit
    /// whenever the aspect ratio changes.
    pub fn fit(camera: &Camera) -> Self {
        let width = 2.0 * camera.near * (camera.fov_y * 0.5).tan() * camera.aspect;
        Self {
            width,
            height: width / camera.aspect,
            center: camera.position + (camera.forward() * camera.near),
        }
    }
}

/// Un-project a normalized screen coordinate in [-1, 1]^2 into a world ray.
pub fn primary_ray(camera: &Camera, ndc: Vec2) -> Ray {
    let clip = Vec4::new(ndc.x, ndc.y, -1.0, 1.0);
    let view = camera.inv_proj * clip;
    let view_point = view.xyz() / view.w;
    let direction = camera.world.transform_vector3(view_point).normalize();
    Ray {
        origin: camera.position,
        direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitRig;

    #[test]
    fn center_ray_equals_camera_forward() {
        for (azimuth, elevation, distance) in [(0.0, 0.0, 5.0), (1.1, 0.6, 3.0), (-2.4, -0.9, 8.0)]
        {
            let mut camera = Camera::new(1.78);
            let rig = OrbitRig::new(azimuth, elevation, distance, 0.0);
            rig.apply(&mut camera);
            let ray = primary_ray(&camera, Vec2::ZERO);
            assert!(
                ray.direction.dot(camera.forward()) > 0.99999,
                "center ray diverges from forward at azimuth {azimuth}"
            );
            assert_eq!(ray.origin, camera.position);
        }
    }

    #[test]
    fn corner_rays_spread_with_the_field_of_view() {
        let camera = Camera::new(1.0);
        let left = primary_ray(&camera, Vec2::new(-1.0, 0.0));
        let right = primary_ray(&camera, Vec2::new(1.0, 0.0));
        // Square aspect, so the horizontal spread equals the vertical fov.
        let angle = left.direction.dot(right.direction).acos();
        assert!((angle - camera.fov_y).abs() < 1e-4);
    }

    #[test]
    fn quad_height_is_width_over_aspect() {
        let camera = Camera::new(800.0 / 600.0);
        let quad = ScreenQuad::fit(&camera);
        assert_eq!(quad.height, quad.width / camera.aspect);
    }

    #[test]
    fn quad_is_refit_when_the_viewport_resizes() {
        let mut camera = Camera::new(800.0 / 600.0);
        let before = ScreenQuad::fit(&camera);
        camera.set_aspect(1600.0 / 900.0);
        let after = ScreenQuad::fit(&camera);
        assert!(after.width > before.width);
        assert_eq!(after.height, after.width / (1600.0 / 900.0));
        let expected_width = 2.0 * camera.near * (camera.fov_y * 0.5).tan() * camera.aspect;
        assert!((after.width - expected_width).abs() < 1e-6);
    }

    #[test]
    fn quad_sits_on_the_near_plane_along_forward() {
        let mut camera = Camera::new(1.5);
        OrbitRig::new(0.7, 0.3, 4.0, 0.0).apply(&mut camera);
        let quad = ScreenQuad::fit(&camera);
        let offset = quad.center - camera.position;
        assert!((offset.length() - camera.near).abs() < 1e-6);
        assert!(offset.normalize().dot(camera.forward()) > 0.99999);
    }
}
