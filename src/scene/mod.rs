pub mod cube;
pub mod renderer;

pub use renderer::SceneRenderer;

use std::time::Instant;

use glam::{Mat4, Vec3};

/// Background color shared by the eye passes.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.2,
    b: 0.2,
    a: 1.0,
};

/// Grid indices run -10..10 exclusive on both axes: a 20x20 field of cubes.
pub const GRID_MIN: i32 = -10;
pub const GRID_MAX: i32 = 10;
pub const GRID_SPACING: f32 = 4.0;

pub const RING_COUNT: u32 = 12;
pub const RING_RADIUS: f32 = 10.0;
/// Orbit rate in degrees per second of wall-clock time.
pub const RING_RATE_DEG: f32 = 10.0;
/// Fixed phase offset between adjacent ring cubes, in degrees.
pub const RING_PHASE_DEG: f32 = 30.0;
/// Ring cubes are half the size of the grid cubes.
pub const RING_SCALE: f32 = 0.5;

/// The single scene light: directional, with diffuse and ambient terms.
#[derive(Debug, Clone, Copy)]
pub struct Light {
    /// Direction toward the light.
    pub direction: Vec3,
    pub diffuse: Vec3,
    pub ambient: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.1, 0.4, 1.0),
            diffuse: Vec3::new(1.0, 1.0, 0.8),
            ambient: Vec3::new(0.15, 0.15, 0.25),
        }
    }
}

/// The demo scene: a static saddle-shaped field of cubes plus a ring of
/// smaller cubes orbiting the origin, animated on wall-clock time so the
/// orbit rate is independent of frame rate.
pub struct CubeScene {
    started: Instant,
    pub light: Light,
}

impl CubeScene {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            light: Light::default(),
        }
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }

    /// World position of grid cube (i, j). The height is the product i*j,
    /// which folds the flat grid into a saddle.
    pub fn grid_position(i: i32, j: i32) -> Vec3 {
        Vec3::new(
            i as f32 * GRID_SPACING,
            (i * j) as f32,
            j as f32 * GRID_SPACING,
        )
    }

    /// Model transforms of the static grid, row-major over (i, j).
    pub fn grid_transforms() -> Vec<Mat4> {
        let side = (GRID_MAX - GRID_MIN) as usize;
        let mut transforms = Vec::with_capacity(side * side);
        for i in GRID_MIN..GRID_MAX {
            for j in GRID_MIN..GRID_MAX {
                transforms.push(Mat4::from_translation(Self::grid_position(i, j)));
            }
        }
        transforms
    }

    /// Orbit angle of ring cube `k` at elapsed time `t` seconds, in degrees.
    pub fn ring_angle_deg(k: u32, t: f32) -> f32 {
        (RING_RATE_DEG * t + RING_PHASE_DEG * k as f32).rem_euclid(360.0)
    }

    /// Model transform of ring cube `k` at elapsed time `t`: rotate about
    /// the vertical axis, push out to the ring radius, shrink to half size.
    pub fn ring_transform(k: u32, t: f32) -> Mat4 {
        let angle = Self::ring_angle_deg(k, t).to_radians();
        Mat4::from_rotation_y(angle)
            * Mat4::from_translation(Vec3::new(0.0, 0.0, -RING_RADIUS))
            * Mat4::from_scale(Vec3::splat(RING_SCALE))
    }

    /// All twelve ring transforms at the scene's current clock.
    pub fn ring_transforms(&self) -> Vec<Mat4> {
        let t = self.elapsed_secs();
        (0..RING_COUNT).map(|k| Self::ring_transform(k, t)).collect()
    }
}

impl Default for CubeScene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn grid_mapping_includes_saddle_height() {
        assert_eq!(CubeScene::grid_position(3, 5), Vec3::new(12.0, 15.0, 20.0));
        assert_eq!(
            CubeScene::grid_position(-10, -10),
            Vec3::new(-40.0, 100.0, -40.0)
        );
        assert_eq!(
            CubeScene::grid_position(-10, 9),
            Vec3::new(-40.0, -90.0, 36.0)
        );
        assert_eq!(CubeScene::grid_position(0, 7), Vec3::new(0.0, 0.0, 28.0));
    }

    #[test]
    fn grid_covers_the_full_index_range() {
        let transforms = CubeScene::grid_transforms();
        assert_eq!(transforms.len(), 400);

        // First entry is (-10, -10), last is (9, 9).
        let first = transforms.first().unwrap().col(3).truncate();
        let last = transforms.last().unwrap().col(3).truncate();
        assert_eq!(first, CubeScene::grid_position(-10, -10));
        assert_eq!(last, CubeScene::grid_position(9, 9));
    }

    #[test]
    fn ring_angle_formula() {
        assert_relative_eq!(CubeScene::ring_angle_deg(0, 0.0), 0.0);
        assert_relative_eq!(CubeScene::ring_angle_deg(3, 0.0), 90.0);
        assert_relative_eq!(CubeScene::ring_angle_deg(0, 9.0), 90.0);
        // (10 * 36 + 11 * 30) mod 360 = 690 mod 360.
        assert_relative_eq!(CubeScene::ring_angle_deg(11, 36.0), 330.0, epsilon = 1e-3);
    }

    #[test]
    fn ring_angle_increases_monotonically_with_time() {
        for step in 0..30 {
            let t = step as f32 * 0.5;
            let unwrapped = RING_RATE_DEG * t;
            assert_relative_eq!(
                CubeScene::ring_angle_deg(0, t),
                unwrapped.rem_euclid(360.0),
                epsilon = 1e-3
            );
        }
    }

    #[test]
    fn adjacent_ring_cubes_are_thirty_degrees_apart() {
        let t = 4.2;
        for k in 0..RING_COUNT - 1 {
            let delta = (CubeScene::ring_angle_deg(k + 1, t) - CubeScene::ring_angle_deg(k, t))
                .rem_euclid(360.0);
            assert_relative_eq!(delta, 30.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn ring_cubes_orbit_at_the_ring_radius() {
        for k in 0..RING_COUNT {
            let transform = CubeScene::ring_transform(k, 2.5);
            let center = transform.transform_point3(Vec3::ZERO);
            assert_relative_eq!(center.y, 0.0, epsilon = 1e-5);
            assert_relative_eq!(
                (center.x * center.x + center.z * center.z).sqrt(),
                RING_RADIUS,
                epsilon = 1e-4
            );
        }
    }

    #[test]
    fn ring_transform_halves_the_cube() {
        let transform = CubeScene::ring_transform(0, 0.0);
        let a = transform.transform_point3(Vec3::ZERO);
        let b = transform.transform_point3(Vec3::X);
        assert_relative_eq!(a.distance(b), RING_SCALE, epsilon = 1e-5);
    }
}
