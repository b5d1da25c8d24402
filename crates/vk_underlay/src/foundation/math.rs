//! Math types and camera/transform helpers
//!
//! Thin aliases over nalgebra plus the handful of matrix constructors the
//! render layers need.

pub use nalgebra::{Matrix4, Point3 as NPoint3, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = NPoint3<f32>;

/// Right-handed look-at view matrix.
pub fn look_at(eye: Point3, target: Point3, up: Vec3) -> Mat4 {
    nalgebra::Isometry3::look_at_rh(&eye, &target, &up).to_homogeneous()
}

/// Perspective projection with a vertical field of view in degrees.
pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    nalgebra::Perspective3::new(aspect, fov_y_degrees.to_radians(), near, far).to_homogeneous()
}

/// Model matrix for the spinning mesh: translation, then rotation about X,
/// then a slower rotation about Z. `t` is the normalized animation phase;
/// one full X revolution per unit of `t`.
pub fn spinning_model(position: Vec3, t: f32) -> Mat4 {
    let angle = t * std::f32::consts::TAU;
    let rot_x = nalgebra::Rotation3::from_axis_angle(&Vector3::x_axis(), angle).to_homogeneous();
    let rot_z =
        nalgebra::Rotation3::from_axis_angle(&Vector3::z_axis(), angle * 0.7).to_homogeneous();
    Mat4::new_translation(&position) * rot_x * rot_z
}

/// Copy a matrix into a column-major float array, the layout uniform buffers
/// and std140 `mat4` expect.
pub fn to_cols_array(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    out.copy_from_slice(m.as_slice());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn look_at_maps_eye_to_origin() {
        let view = look_at(
            Point3::new(0.0, 0.0, 10.0),
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let eye = view.transform_point(&Point3::new(0.0, 0.0, 10.0));
        assert_relative_eq!(eye.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(eye.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(eye.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn spinning_model_at_zero_is_pure_translation() {
        let m = spinning_model(Vec3::new(1.0, 2.0, -5.0), 0.0);
        let p = m.transform_point(&Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, -5.0, epsilon = 1e-6);
    }

    #[test]
    fn cols_array_is_column_major() {
        let m = Mat4::new_translation(&Vec3::new(3.0, 4.0, 5.0));
        let a = to_cols_array(&m);
        // Translation lives in the last column.
        assert_eq!(a[12], 3.0);
        assert_eq!(a[13], 4.0);
        assert_eq!(a[14], 5.0);
        assert_eq!(a[15], 1.0);
    }
}
