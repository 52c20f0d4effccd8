//! Primitive builders: box, cylinder, lathe, extruded polygon and ground.
//!
//! Every builder returns a single-material [`MeshTemplate`] centred the way the
//! engine's own primitives are: boxes and cylinders around the origin, lathes
//! around the y axis, extrusions hanging from y = 0 down to `-depth`, and the
//! ground on y = 0. Face regions are pushed in the order the matching
//! [`FaceMapping`] is read.

use cgmath::{EuclideanSpace, InnerSpace, Vector3, Zero};
use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, FillVertexConstructor, VertexBuffers,
};

use crate::{
    data_structures::{
        mesh::{Material, MeshTemplate, MeshVertex, SubMesh},
        profile::{FaceMapping, Profile, UvRect},
    },
    error::{Error, Result},
};

/// Wall order of a box mapping: +z, -z, +x, -x.
pub const BOX_SIDE_FACES: [&str; 4] = ["rear", "front", "right", "left"];
pub const CYLINDER_FACES: [&str; 3] = ["bottom", "tube", "top"];
pub const EXTRUSION_FACES: [&str; 3] = ["top", "side", "bottom"];

#[derive(Clone, Debug)]
pub struct BoxOptions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    /// Four wall regions; top and bottom are never textured.
    pub face_uv: Option<FaceMapping>,
}

impl Default for BoxOptions {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
            face_uv: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CylinderOptions {
    pub diameter: f32,
    pub height: f32,
    pub tessellation: u32,
    pub face_uv: Option<FaceMapping>,
}

impl Default for CylinderOptions {
    fn default() -> Self {
        Self {
            diameter: 1.0,
            height: 2.0,
            tessellation: 24,
            face_uv: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LatheOptions {
    /// Cross-section in the x/y plane; x is the radius.
    pub shape: Profile,
    pub tessellation: u32,
    pub double_sided: bool,
}

#[derive(Clone, Debug)]
pub struct ExtrudeOptions {
    /// Closed outline in the x/z plane.
    pub shape: Profile,
    pub depth: f32,
    pub face_uv: Option<FaceMapping>,
    /// Run the side texture once around the whole perimeter instead of once per edge.
    pub wrap: bool,
}

/// Collects the vertices and triangles of one face region.
#[derive(Default)]
struct RegionBuilder {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
}

impl RegionBuilder {
    fn vertex(&mut self, position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> u32 {
        self.vertices.push(MeshVertex::new(position, normal, uv));
        (self.vertices.len() - 1) as u32
    }

    fn position(&self, i: u32) -> [f32; 3] {
        self.vertices[i as usize].position
    }

    /// Emits the triangle wound so that it faces `outward`.
    fn triangle(&mut self, [a, b, c]: [u32; 3], outward: Vector3<f32>) {
        let n = triangle_normal(self.position(a), self.position(b), self.position(c));
        if n.dot(outward) < 0.0 {
            self.indices.extend([a, c, b]);
        } else {
            self.indices.extend([a, b, c]);
        }
    }

    /// Corners are bottom-left, bottom-right, top-right, top-left; `s` runs from
    /// `s0` to `s1` along the bottom edge and `t` from bottom to top.
    fn quad_span(
        &mut self,
        corners: [[f32; 3]; 4],
        rect: UvRect,
        (s0, s1): (f32, f32),
        outward: Vector3<f32>,
    ) {
        let [bl, br, tr, tl] = corners;
        let mut normal = triangle_normal(bl, br, tr);
        if normal.is_zero() {
            normal = triangle_normal(bl, tr, tl);
        }
        if normal.dot(outward) < 0.0 {
            normal = -normal;
        }
        let n: [f32; 3] = normal.into();
        let i0 = self.vertex(bl, n, rect.lerp(s0, 0.0));
        let i1 = self.vertex(br, n, rect.lerp(s1, 0.0));
        let i2 = self.vertex(tr, n, rect.lerp(s1, 1.0));
        let i3 = self.vertex(tl, n, rect.lerp(s0, 1.0));
        self.triangle([i0, i1, i2], outward);
        self.triangle([i0, i2, i3], outward);
    }

    fn quad(&mut self, corners: [[f32; 3]; 4], rect: UvRect, outward: Vector3<f32>) {
        self.quad_span(corners, rect, (0.0, 1.0), outward);
    }

    fn push_to(self, mesh: &mut SubMesh, name: &'static str) {
        mesh.push_region(name, &self.vertices, &self.indices);
    }
}

fn triangle_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Vector3<f32> {
    let (a, b, c) = (Vector3::from(a), Vector3::from(b), Vector3::from(c));
    let n = (b - a).cross(c - a);
    if n.magnitude2() > f32::EPSILON * f32::EPSILON {
        n.normalize()
    } else {
        Vector3::zero()
    }
}

/// Area-weighted vertex normals from the triangles that use each vertex.
fn smooth_normals(vertices: &mut [MeshVertex], indices: &[u32]) {
    let mut accumulated = vec![Vector3::<f32>::zero(); vertices.len()];
    for tri in indices.chunks(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vector3::from(vertices[i as usize].position));
        let n = (b - a).cross(c - a);
        for &i in tri {
            accumulated[i as usize] += n;
        }
    }
    for (vertex, n) in vertices.iter_mut().zip(accumulated) {
        vertex.normal = if n.magnitude2() > f32::EPSILON * f32::EPSILON {
            n.normalize().into()
        } else {
            [0.0, 1.0, 0.0]
        };
    }
}

fn mapping_or_uniform(
    mapping: &Option<FaceMapping>,
    primitive: &'static str,
    faces: usize,
) -> Result<FaceMapping> {
    match mapping {
        Some(mapping) => {
            mapping.expect_faces(primitive, faces)?;
            Ok(mapping.clone())
        }
        None => Ok(FaceMapping::uniform(faces)),
    }
}

pub fn create_box(name: &str, options: &BoxOptions, material: Material) -> Result<MeshTemplate> {
    let mapping = mapping_or_uniform(&options.face_uv, "box", BOX_SIDE_FACES.len())?;
    let (hw, hh, hd) = (options.width / 2.0, options.height / 2.0, options.depth / 2.0);

    let walls = [
        (
            [[-hw, -hh, hd], [hw, -hh, hd], [hw, hh, hd], [-hw, hh, hd]],
            Vector3::unit_z(),
        ),
        (
            [[hw, -hh, -hd], [-hw, -hh, -hd], [-hw, hh, -hd], [hw, hh, -hd]],
            -Vector3::unit_z(),
        ),
        (
            [[hw, -hh, hd], [hw, -hh, -hd], [hw, hh, -hd], [hw, hh, hd]],
            Vector3::unit_x(),
        ),
        (
            [[-hw, -hh, -hd], [-hw, -hh, hd], [-hw, hh, hd], [-hw, hh, -hd]],
            -Vector3::unit_x(),
        ),
    ];

    let mut mesh = SubMesh::new(name);
    for (face, (corners, outward)) in walls.into_iter().enumerate() {
        let mut region = RegionBuilder::default();
        region.quad(corners, mapping.region(face), outward);
        region.push_to(&mut mesh, BOX_SIDE_FACES[face]);
    }

    let mut caps = RegionBuilder::default();
    caps.quad(
        [[-hw, hh, hd], [hw, hh, hd], [hw, hh, -hd], [-hw, hh, -hd]],
        UvRect::ORIGIN,
        Vector3::unit_y(),
    );
    caps.quad(
        [[-hw, -hh, -hd], [hw, -hh, -hd], [hw, -hh, hd], [-hw, -hh, hd]],
        UvRect::ORIGIN,
        -Vector3::unit_y(),
    );
    mesh.push_unmapped(&caps.vertices, &caps.indices);

    Ok(MeshTemplate::single(name, mesh, material))
}

pub fn create_cylinder(
    name: &str,
    options: &CylinderOptions,
    material: Material,
) -> Result<MeshTemplate> {
    let radius = options.diameter / 2.0;
    let ring = Profile::regular_polygon(options.tessellation, radius);
    ring.ensure_surface(name)?;
    let mapping = mapping_or_uniform(&options.face_uv, "cylinder", CYLINDER_FACES.len())?;

    let hh = options.height / 2.0;
    let points = ring.points();
    let n = points.len();
    let r = radius.abs().max(f32::EPSILON);

    let mut mesh = SubMesh::new(name);
    for (face, y) in [(0usize, -hh), (2usize, hh)] {
        if face == 2 {
            let mut tube = RegionBuilder::default();
            let rect = mapping.region(1);
            for i in 0..n {
                let (a, b) = (points[i], points[(i + 1) % n]);
                let mid = (a.to_vec() + b.to_vec()) * 0.5;
                tube.quad_span(
                    [[a.x, -hh, a.z], [b.x, -hh, b.z], [b.x, hh, b.z], [a.x, hh, a.z]],
                    rect,
                    (i as f32 / n as f32, (i + 1) as f32 / n as f32),
                    Vector3::new(mid.x, 0.0, mid.z),
                );
            }
            tube.push_to(&mut mesh, CYLINDER_FACES[1]);
        }

        let rect = mapping.region(face);
        let outward = Vector3::new(0.0, y.signum(), 0.0);
        let normal: [f32; 3] = outward.into();
        let mut cap = RegionBuilder::default();
        let centre = cap.vertex([0.0, y, 0.0], normal, rect.lerp(0.5, 0.5));
        let rim: Vec<u32> = points
            .iter()
            .map(|p| {
                let uv = rect.lerp((p.x / r + 1.0) * 0.5, (p.z / r + 1.0) * 0.5);
                cap.vertex([p.x, y, p.z], normal, uv)
            })
            .collect();
        for i in 0..n {
            cap.triangle([centre, rim[i], rim[(i + 1) % n]], outward);
        }
        cap.push_to(&mut mesh, CYLINDER_FACES[face]);
    }

    Ok(MeshTemplate::single(name, mesh, material))
}

/// Revolves `shape` around the y axis.
pub fn create_lathe(name: &str, options: &LatheOptions, material: Material) -> Result<MeshTemplate> {
    options.shape.ensure_surface(name)?;
    let segments = options.tessellation.max(3);
    let shape = options.shape.points();
    let rows = shape.len();

    let mut stops = Vec::with_capacity(rows);
    let mut length = 0.0;
    stops.push(0.0);
    for pair in shape.windows(2) {
        length += (pair[1] - pair[0]).magnitude();
        stops.push(length);
    }
    let length = if length > 0.0 { length } else { 1.0 };

    let mut vertices = Vec::with_capacity((segments as usize + 1) * rows);
    for column in 0..=segments {
        let s = column as f32 / segments as f32;
        let (sin, cos) = (s * std::f32::consts::TAU).sin_cos();
        for (p, stop) in shape.iter().zip(&stops) {
            vertices.push(MeshVertex::new(
                [p.x * cos, p.y, p.x * sin],
                [0.0, 1.0, 0.0],
                [s, stop / length],
            ));
        }
    }

    let rows = rows as u32;
    let mut indices = Vec::with_capacity(segments as usize * (rows as usize - 1) * 6);
    for column in 0..segments {
        for row in 0..rows - 1 {
            let a = column * rows + row;
            let b = (column + 1) * rows + row;
            indices.extend([a, b, b + 1, a, b + 1, a + 1]);
        }
    }
    smooth_normals(&mut vertices, &indices);

    let mut mesh = SubMesh::new(name);
    mesh.push_region("surface", &vertices, &indices);
    let material = if options.double_sided {
        mesh.make_double_sided();
        material.double_sided()
    } else {
        material
    };
    Ok(MeshTemplate::single(name, mesh, material))
}

struct CapVertex;

impl FillVertexConstructor<[f32; 2]> for CapVertex {
    fn new_vertex(&mut self, vertex: FillVertex) -> [f32; 2] {
        let p = vertex.position();
        [p.x, p.y]
    }
}

/// Fills a closed outline; returns the cap's vertices and triangle indices.
fn triangulate(name: &str, outline: &[[f32; 2]]) -> Result<(Vec<[f32; 2]>, Vec<u32>)> {
    let mut builder = Path::builder();
    builder.begin(point(outline[0][0], outline[0][1]));
    for p in &outline[1..] {
        builder.line_to(point(p[0], p[1]));
    }
    builder.close();
    let path = builder.build();

    let mut geometry: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
    FillTessellator::new()
        .tessellate_path(
            &path,
            &FillOptions::default(),
            &mut BuffersBuilder::new(&mut geometry, CapVertex),
        )
        .map_err(|e| Error::Tessellation {
            shape: name.to_string(),
            reason: format!("{:?}", e),
        })?;
    if geometry.indices.is_empty() {
        return Err(Error::DegenerateProfile {
            shape: name.to_string(),
            points: outline.len(),
        });
    }
    Ok((geometry.vertices, geometry.indices))
}

/// Extrudes a closed x/z outline downwards by `depth`.
pub fn extrude_polygon(
    name: &str,
    options: &ExtrudeOptions,
    material: Material,
) -> Result<MeshTemplate> {
    let shape = &options.shape;
    shape.ensure_surface(name)?;
    if shape.self_intersects_xz() {
        return Err(Error::SelfIntersectingProfile {
            shape: name.to_string(),
        });
    }
    shape.ensure_area_xz(name)?;
    let mapping = mapping_or_uniform(&options.face_uv, "extruded polygon", EXTRUSION_FACES.len())?;

    let outline = shape.outline_xz();
    let (cap_points, cap_indices) = triangulate(name, &outline)?;

    let (mut min, mut max) = (outline[0], outline[0]);
    for p in &outline {
        min = [min[0].min(p[0]), min[1].min(p[1])];
        max = [max[0].max(p[0]), max[1].max(p[1])];
    }
    let extent = [
        (max[0] - min[0]).max(f32::EPSILON),
        (max[1] - min[1]).max(f32::EPSILON),
    ];

    let mut mesh = SubMesh::new(name);
    let depth = options.depth;
    for (face, y) in [(0usize, 0.0f32), (1, 0.0), (2, -depth)] {
        let rect = mapping.region(face);
        let mut region = RegionBuilder::default();
        if face == 1 {
            let stops = shape.perimeter_stops_xz();
            let perimeter = stops.last().copied().unwrap_or(0.0).max(f32::EPSILON);
            let winding = shape.signed_area_xz().signum();
            let n = outline.len();
            for i in 0..n {
                let (a, b) = (outline[i], outline[(i + 1) % n]);
                let (dx, dz) = (b[0] - a[0], b[1] - a[1]);
                if dx * dx + dz * dz <= f32::EPSILON * f32::EPSILON {
                    continue;
                }
                let span = if options.wrap {
                    (stops[i] / perimeter, stops[i + 1] / perimeter)
                } else {
                    (0.0, 1.0)
                };
                region.quad_span(
                    [
                        [a[0], -depth, a[1]],
                        [b[0], -depth, b[1]],
                        [b[0], 0.0, b[1]],
                        [a[0], 0.0, a[1]],
                    ],
                    rect,
                    span,
                    Vector3::new(dz, 0.0, -dx) * winding,
                );
            }
        } else {
            let outward = if face == 0 {
                Vector3::unit_y()
            } else {
                -Vector3::unit_y()
            };
            let normal: [f32; 3] = outward.into();
            let ids: Vec<u32> = cap_points
                .iter()
                .map(|p| {
                    let uv = rect.lerp((p[0] - min[0]) / extent[0], (p[1] - min[1]) / extent[1]);
                    region.vertex([p[0], y, p[1]], normal, uv)
                })
                .collect();
            for tri in cap_indices.chunks(3) {
                region.triangle(
                    [ids[tri[0] as usize], ids[tri[1] as usize], ids[tri[2] as usize]],
                    outward,
                );
            }
        }
        region.push_to(&mut mesh, EXTRUSION_FACES[face]);
    }

    Ok(MeshTemplate::single(name, mesh, material))
}

/// Flat `width` × `height` plane on y = 0 facing up.
pub fn create_ground(name: &str, width: f32, height: f32, material: Material) -> MeshTemplate {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let mut region = RegionBuilder::default();
    region.quad(
        [[-hw, 0.0, hh], [hw, 0.0, hh], [hw, 0.0, -hh], [-hw, 0.0, -hh]],
        UvRect::FULL,
        Vector3::unit_y(),
    );
    let mut mesh = SubMesh::new(name);
    region.push_to(&mut mesh, "ground");
    MeshTemplate::single(name, mesh, material)
}
