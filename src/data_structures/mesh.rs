//! CPU-side mesh data.
//!
//! A [`MeshTemplate`] is the output of the geometry builder: one or more
//! [`SubMesh`]es, each bound to its own [`Material`], plus the transform the
//! template was positioned with. Merging bakes those transforms into vertex
//! data; uploading turns each sub-mesh into one vertex/index buffer pair.

use std::ops::Range;

use crate::data_structures::{bounds::Aabb, instance::Instance};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            tex_coords,
            normal,
            ..Default::default()
        }
    }
}

impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x2,
            2 => Float32x3,
            3 => Float32x3,
            4 => Float32x3,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sidedness {
    Front,
    /// Both windings are emitted, so the surface is visible from inside.
    Double,
}

/// Material binding of a sub-mesh. Textures are referenced by location and
/// resolved by whoever uploads the template.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub diffuse_texture: Option<String>,
    pub sidedness: Sidedness,
}

impl Material {
    pub fn textured(name: &str, texture: &str) -> Self {
        Self {
            name: name.to_string(),
            diffuse_texture: Some(texture.to_string()),
            sidedness: Sidedness::Front,
        }
    }

    pub fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            diffuse_texture: None,
            sidedness: Sidedness::Front,
        }
    }

    pub fn double_sided(mut self) -> Self {
        self.sidedness = Sidedness::Double;
        self
    }
}

/// A named span of a sub-mesh's index list that was textured from one [`crate::data_structures::profile::UvRect`].
#[derive(Clone, Debug, PartialEq)]
pub struct FaceRegion {
    pub name: &'static str,
    pub indices: Range<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubMesh {
    pub name: String,
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub regions: Vec<FaceRegion>,
    /// Index into the owning template's materials.
    pub material: usize,
}

impl SubMesh {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            vertices: Vec::new(),
            indices: Vec::new(),
            regions: Vec::new(),
            material: 0,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Appends `vertices` and `indices` (relative to the new vertices) as one face region.
    pub fn push_region(&mut self, name: &'static str, vertices: &[MeshVertex], indices: &[u32]) {
        let base = self.vertices.len() as u32;
        let start = self.indices.len();
        self.vertices.extend_from_slice(vertices);
        self.indices.extend(indices.iter().map(|i| base + i));
        self.regions.push(FaceRegion {
            name,
            indices: start..self.indices.len(),
        });
    }

    /// Appends geometry to the last region instead of opening a new one.
    pub fn extend_region(&mut self, vertices: &[MeshVertex], indices: &[u32]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        self.indices.extend(indices.iter().map(|i| base + i));
        let end = self.indices.len();
        if let Some(region) = self.regions.last_mut() {
            region.indices.end = end;
        }
    }

    /// Appends geometry that belongs to no texture region.
    pub fn push_unmapped(&mut self, vertices: &[MeshVertex], indices: &[u32]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        self.indices.extend(indices.iter().map(|i| base + i));
    }

    /// Duplicates every triangle with reversed winding and flipped normals.
    pub fn make_double_sided(&mut self) {
        let base = self.vertices.len() as u32;
        let back: Vec<MeshVertex> = self
            .vertices
            .iter()
            .map(|v| MeshVertex {
                normal: v.normal.map(|n| -n),
                ..*v
            })
            .collect();
        let reversed: Vec<u32> = self
            .indices
            .chunks(3)
            .flat_map(|tri| [tri[0] + base, tri[2] + base, tri[1] + base])
            .collect();
        self.vertices.extend(back);
        self.indices.extend(reversed);
        let end = self.indices.len();
        if let Some(region) = self.regions.last_mut() {
            region.indices.end = end;
        }
    }

    /// Bakes `transform` into positions and normals, keeping faces front-facing
    /// when the transform mirrors.
    pub fn bake(&mut self, transform: &Instance) {
        for v in self.vertices.iter_mut() {
            v.position = transform.transform_point(v.position);
            v.normal = transform.transform_normal(v.normal);
        }
        if transform.is_mirroring() {
            for tri in self.indices.chunks_mut(3) {
                tri.swap(1, 2);
            }
        }
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|v| v.position))
    }
}

/// A constructed, mergeable and instanceable piece of geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshTemplate {
    pub name: String,
    pub submeshes: Vec<SubMesh>,
    pub materials: Vec<Material>,
    /// Placement of the template itself; baked away when templates are merged.
    pub transform: Instance,
}

impl MeshTemplate {
    pub fn single(name: &str, submesh: SubMesh, material: Material) -> Self {
        Self {
            name: name.to_string(),
            submeshes: vec![SubMesh {
                material: 0,
                ..submesh
            }],
            materials: vec![material],
            transform: Instance::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(SubMesh::triangle_count).sum()
    }

    /// Number of textured face regions across all sub-meshes.
    pub fn region_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.regions.len()).sum()
    }

    pub fn region_names(&self) -> Vec<&'static str> {
        self.submeshes
            .iter()
            .flat_map(|s| s.regions.iter().map(|r| r.name))
            .collect()
    }

    /// Bounds in template space, i.e. before `transform` is applied.
    pub fn local_bounds(&self) -> Option<Aabb> {
        self.submeshes
            .iter()
            .filter_map(SubMesh::bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Bounds after the template's own transform.
    pub fn placed_bounds(&self) -> Option<Aabb> {
        self.local_bounds().map(|b| b.transformed(&self.transform))
    }

    pub fn material_of(&self, submesh: &SubMesh) -> Option<&Material> {
        self.materials.get(submesh.material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> SubMesh {
        let mut mesh = SubMesh::new("quad");
        let n = [0.0, 1.0, 0.0];
        mesh.push_region(
            "top",
            &[
                MeshVertex::new([0.0, 0.0, 0.0], n, [0.0, 0.0]),
                MeshVertex::new([1.0, 0.0, 0.0], n, [1.0, 0.0]),
                MeshVertex::new([1.0, 0.0, 1.0], n, [1.0, 1.0]),
                MeshVertex::new([0.0, 0.0, 1.0], n, [0.0, 1.0]),
            ],
            &[0, 2, 1, 0, 3, 2],
        );
        mesh
    }

    #[test]
    fn double_sided_doubles_triangles_and_keeps_one_region() {
        let mut mesh = quad();
        mesh.make_double_sided();
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(mesh.regions.len(), 1);
        assert_eq!(mesh.regions[0].indices, 0..12);
        assert_eq!(mesh.vertices[4].normal, [-0.0, -1.0, -0.0]);
        assert_eq!(&mesh.indices[6..9], &[4, 5, 6]);
    }

    #[test]
    fn mirrored_bake_reverses_winding() {
        let mut mesh = quad();
        mesh.bake(&Instance::new().with_scale(-1.0, 1.0, 1.0));
        assert_eq!(&mesh.indices[0..3], &[0, 1, 2]);
        assert_eq!(mesh.vertices[1].position, [-1.0, 0.0, 0.0]);
    }

    #[test]
    fn placed_bounds_follow_template_transform() {
        let mut template = MeshTemplate::single("quad", quad(), Material::plain("m"));
        template.transform = Instance::at(0.0, 2.0, 0.0);
        let placed = template.placed_bounds().unwrap();
        assert_eq!(placed.min.y, 2.0);
        assert_eq!(template.region_count(), 1);
        assert_eq!(template.region_names(), vec!["top"]);
    }
}
