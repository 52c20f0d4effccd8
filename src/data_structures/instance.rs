//! Per-entity transformation data.
//!
//! An [`Instance`] is the local or world transform of anything placed in the
//! village: a scene node, an instanced house, the movable car. World transforms
//! are obtained by composing a parent with a child (`parent * child`), and the
//! packed [`InstanceRaw`] form is what ends up in the GPU instance buffer.

use std::ops::Mul;

use cgmath::{EuclideanSpace, One, Rotation3, SquareMatrix, Transform};

use crate::data_structures::mesh::Vertex;

/// Position, rotation (as quaternion) and scale of one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn at(x: f32, y: f32, z: f32) -> Self {
        cgmath::Vector3::new(x, y, z).into()
    }

    pub fn with_rotation_x(mut self, radians: f32) -> Self {
        self.rotation = cgmath::Quaternion::from_angle_x(cgmath::Rad(radians));
        self
    }

    /// Replace the rotation by a turn about the vertical axis.
    pub fn with_rotation_y(mut self, radians: f32) -> Self {
        self.rotation = cgmath::Quaternion::from_angle_y(cgmath::Rad(radians));
        self
    }

    pub fn with_rotation_z(mut self, radians: f32) -> Self {
        self.rotation = cgmath::Quaternion::from_angle_z(cgmath::Rad(radians));
        self
    }

    pub fn with_scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = cgmath::Vector3::new(x, y, z);
        self
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::new()
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn transform_point(&self, point: [f32; 3]) -> [f32; 3] {
        self.to_matrix()
            .transform_point(cgmath::Point3::from(point))
            .into()
    }

    /// Normals need the inverse transpose so that non-uniform scale keeps them perpendicular.
    pub fn transform_normal(&self, normal: [f32; 3]) -> [f32; 3] {
        use cgmath::InnerSpace;
        let inverse_scale = cgmath::Vector3::new(
            1.0 / self.scale.x,
            1.0 / self.scale.y,
            1.0 / self.scale.z,
        );
        let n = cgmath::Vector3::from(normal);
        let scaled = cgmath::Vector3::new(
            n.x * inverse_scale.x,
            n.y * inverse_scale.y,
            n.z * inverse_scale.z,
        );
        let rotated = self.rotation * scaled;
        if rotated.magnitude2() > f32::EPSILON {
            rotated.normalize().into()
        } else {
            normal
        }
    }

    /// A mirroring transform flips triangle winding.
    pub fn is_mirroring(&self) -> bool {
        self.to_matrix().determinant() < 0.0
    }

    pub fn origin(&self) -> cgmath::Point3<f32> {
        cgmath::Point3::from_vec(self.position)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        let world_matrix = self.to_matrix();
        let handedness = world_matrix.determinant().signum();
        InstanceRaw {
            model: world_matrix.into(),
            normal: cgmath::Matrix3::from(self.rotation).into(),
            handedness,
        }
    }
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    /// Composes `self` (parent) with `rhs` (child).
    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let rotation = self.rotation * rhs.rotation;
        let scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        Instance {
            position: self.position + (self.rotation * scaled_rhs_pos),
            rotation,
            scale,
        }
    }
}

impl Mul<Instance> for Instance {
    type Output = Instance;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the data stored in the GPU instance buffer.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
    handedness: f32,
}

impl InstanceRaw {
    pub fn model(&self) -> [[f32; 4]; 4] {
        self.model
    }

    pub fn handedness(&self) -> f32 {
        self.handedness
    }
}

/**
 * Stride layout: the model matrix as four vec4 columns, the normal matrix as
 * three vec3 columns and the handedness sign. Locations continue after the
 * five `MeshVertex` attributes.
 */
impl Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        const ATTRIBUTES: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
            8 => Float32x4,
            9 => Float32x3,
            10 => Float32x3,
            11 => Float32x3,
            12 => Float32,
        ];
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Shaders advance to the next instance only when a new instance starts.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn child_position_is_rotated_and_scaled_by_parent() {
        let parent = Instance::at(1.0, 0.0, 0.0)
            .with_rotation_y(FRAC_PI_2)
            .with_scale(2.0, 2.0, 2.0);
        let child = Instance::at(1.0, 0.0, 0.0);
        let world = &parent * &child;
        // +x rotated a quarter turn about y points to -z
        assert!(close(world.position.into(), [1.0, 0.0, -2.0]));
        assert!(close(world.scale.into(), [2.0, 2.0, 2.0]));
    }

    #[test]
    fn composition_matches_matrix_product_for_uniform_scale() {
        let parent = Instance::at(0.5, 1.0, -3.0).with_rotation_z(0.3);
        let child = Instance::at(0.2, 0.4, 0.1).with_rotation_x(1.1);
        let composed = (&parent * &child).transform_point([0.3, -0.2, 0.9]);
        let by_matrix = parent.transform_point(child.transform_point([0.3, -0.2, 0.9]));
        assert!(close(composed, by_matrix));
    }

    #[test]
    fn negative_scale_is_mirroring() {
        assert!(Instance::new().with_scale(-1.0, 1.0, 1.0).is_mirroring());
        assert!(!Instance::new().is_mirroring());
        assert_eq!(
            Instance::new().with_scale(1.0, -1.0, 1.0).to_raw().handedness(),
            -1.0
        );
    }

    #[test]
    fn normals_stay_unit_length_under_non_uniform_scale() {
        let t = Instance::new().with_scale(0.75, 1.0, 1.0);
        let n = t.transform_normal([1.0, 1.0, 0.0]);
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-5);
        // squashing x tilts the normal towards x
        assert!(n[0] > n[1]);
    }
}
