use glam::{Mat4, Quat, Vec3};

use crate::hmd::FovPort;

/// View and projection matrices for one eye, built fresh each frame and
/// consumed immediately by the scene renderer.
#[derive(Debug, Clone, Copy)]
pub struct ViewProjection {
    pub view: Mat4,
    pub projection: Mat4,
}

/// Creates a right-handed perspective projection from per-eye FOV tangents
/// with a finite far plane and zero-to-one depth.
///
/// For a symmetric port this reduces exactly to `Mat4::perspective_rh`; the
/// off-center terms handle the asymmetric frusta HMD optics produce.
pub fn perspective_fov_rh(fov: FovPort, near: f32, far: f32) -> Mat4 {
    let horiz = fov.left_tan + fov.right_tan;
    let vert = fov.up_tan + fov.down_tan;

    let x = 2.0 / horiz;
    let y = 2.0 / vert;
    let cx = (fov.right_tan - fov.left_tan) / horiz;
    let cy = (fov.up_tan - fov.down_tan) / vert;

    let r = far / (near - far);

    Mat4::from_cols(
        glam::Vec4::new(x, 0.0, 0.0, 0.0),
        glam::Vec4::new(0.0, y, 0.0, 0.0),
        glam::Vec4::new(cx, cy, r, -1.0),
        glam::Vec4::new(0.0, 0.0, r * near, 0.0),
    )
}

/// Builds the view matrix for an eye at `position` with the given composed
/// orientation: world up/forward are rotated by the orientation and fed into
/// a right-handed look-at.
pub fn eye_view_matrix(orientation: Quat, position: Vec3) -> Mat4 {
    let up = orientation * Vec3::Y;
    let forward = orientation * Vec3::NEG_Z;
    Mat4::look_at_rh(position, position + forward, up)
}

/// Adapts a `glam` matrix to the shape the shaders consume.
///
/// Convention, decided once here: `glam` stores column-major and WGSL
/// `mat4x4<f32>` is built from column vectors, so matrices cross the
/// boundary untransposed. Every uniform upload goes through this function;
/// no call site applies its own layout fix.
pub fn matrix_to_uniform(m: Mat4) -> [[f32; 4]; 4] {
    m.to_cols_array_2d()
}
