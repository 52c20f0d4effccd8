use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::Instance,
    mesh::{Material, MeshTemplate, MeshVertex},
};

/// One sub-mesh on the GPU, drawn with its own material.
#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

#[derive(Debug)]
pub struct GpuTemplate {
    pub name: String,
    pub meshes: Vec<GpuMesh>,
    pub materials: Vec<Material>,
}

/**
 * Built geometry only carries normals, so tangents and bitangents are derived
 * from the texture coordinates for normal mapping. Triangles whose texture
 * coordinates collapse to a line or a point contribute nothing.
 */
pub fn compute_tangents(vertices: &mut [MeshVertex], indices: &[u32]) {
    let mut triangles_included = vec![0u32; vertices.len()];
    for v in vertices.iter_mut() {
        v.tangent = [0.0; 3];
        v.bitangent = [0.0; 3];
    }

    for c in indices.chunks(3) {
        let [v0, v1, v2] = [c[0], c[1], c[2]].map(|i| vertices[i as usize]);

        let pos0: cgmath::Vector3<_> = v0.position.into();
        let pos1: cgmath::Vector3<_> = v1.position.into();
        let pos2: cgmath::Vector3<_> = v2.position.into();

        let uv0: cgmath::Vector2<_> = v0.tex_coords.into();
        let uv1: cgmath::Vector2<_> = v1.tex_coords.into();
        let uv2: cgmath::Vector2<_> = v2.tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        //     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // flipped for right-handed normal maps in wgpu's texture space
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for &i in c {
            let v = &mut vertices[i as usize];
            v.tangent = (tangent + cgmath::Vector3::from(v.tangent)).into();
            v.bitangent = (bitangent + cgmath::Vector3::from(v.bitangent)).into();
            triangles_included[i as usize] += 1;
        }
    }

    for (v, n) in vertices.iter_mut().zip(triangles_included) {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        v.tangent = (cgmath::Vector3::from(v.tangent) * denom).into();
        v.bitangent = (cgmath::Vector3::from(v.bitangent) * denom).into();
    }
}

/// Uploads every sub-mesh of `template` as its own vertex/index buffer pair.
pub fn upload_template(device: &wgpu::Device, template: &MeshTemplate) -> GpuTemplate {
    let meshes = template
        .submeshes
        .iter()
        .filter(|submesh| !submesh.indices.is_empty())
        .map(|submesh| {
            let mut vertices = submesh.vertices.clone();
            compute_tangents(&mut vertices, &submesh.indices);

            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", submesh.name)),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", submesh.name)),
                contents: bytemuck::cast_slice(&submesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            GpuMesh {
                name: submesh.name.clone(),
                vertex_buffer,
                index_buffer,
                num_elements: submesh.indices.len() as u32,
                material: submesh.material,
            }
        })
        .collect();

    GpuTemplate {
        name: template.name.clone(),
        meshes,
        materials: template.materials.clone(),
    }
}

pub fn instance_buffer(device: &wgpu::Device, label: &str, transforms: &[Instance]) -> wgpu::Buffer {
    let raw: Vec<_> = transforms.iter().map(Instance::to_raw).collect();
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} Instance Buffer", label)),
        contents: bytemuck::cast_slice(&raw),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tangent_follows_u_direction() {
        let n = [0.0, 1.0, 0.0];
        let mut vertices = vec![
            MeshVertex::new([0.0, 0.0, 0.0], n, [0.0, 0.0]),
            MeshVertex::new([2.0, 0.0, 0.0], n, [1.0, 0.0]),
            MeshVertex::new([0.0, 0.0, -2.0], n, [0.0, 1.0]),
        ];
        compute_tangents(&mut vertices, &[0, 1, 2]);
        assert_eq!(vertices[0].tangent, [2.0, 0.0, 0.0]);
        assert_eq!(vertices[2].tangent, [2.0, 0.0, 0.0]);
    }

    #[test]
    fn collapsed_uvs_leave_tangents_zero() {
        let n = [0.0, 1.0, 0.0];
        let mut vertices = vec![
            MeshVertex::new([0.0, 0.0, 0.0], n, [0.0, 0.5]),
            MeshVertex::new([1.0, 0.0, 0.0], n, [0.0, 0.5]),
            MeshVertex::new([0.0, 0.0, 1.0], n, [0.0, 0.5]),
        ];
        compute_tangents(&mut vertices, &[0, 1, 2]);
        assert!(vertices.iter().all(|v| v.tangent == [0.0; 3] && !v.tangent[0].is_nan()));
    }
}
