//! Merging several templates into one compound template.

use crate::data_structures::{
    instance::Instance,
    mesh::{FaceRegion, MeshTemplate, SubMesh},
};

/// Bakes every part's transform into its vertices and combines the results.
///
/// With `multi_material` each source sub-mesh stays its own sub-mesh with its
/// own material, so the result is drawn with one call per material. Without it
/// everything is collapsed into a single sub-mesh bound to the first material.
/// Face regions survive either way.
pub fn merge_meshes(name: &str, parts: &[MeshTemplate], multi_material: bool) -> MeshTemplate {
    let mut submeshes = Vec::new();
    let mut materials = Vec::new();
    for part in parts {
        let material_base = materials.len();
        materials.extend(part.materials.iter().cloned());
        for submesh in &part.submeshes {
            let mut baked = submesh.clone();
            baked.bake(&part.transform);
            baked.material += material_base;
            submeshes.push(baked);
        }
    }

    if !multi_material && !submeshes.is_empty() {
        let mut collapsed = SubMesh::new(name);
        for submesh in &submeshes {
            append(&mut collapsed, submesh);
        }
        submeshes = vec![collapsed];
        materials.truncate(1);
    }

    log::debug!(
        "merged {} parts into '{}' ({} sub-meshes, {} materials)",
        parts.len(),
        name,
        submeshes.len(),
        materials.len()
    );
    MeshTemplate {
        name: name.to_string(),
        submeshes,
        materials,
        transform: Instance::new(),
    }
}

fn append(target: &mut SubMesh, source: &SubMesh) {
    let vertex_base = target.vertices.len() as u32;
    let index_base = target.indices.len();
    target.vertices.extend_from_slice(&source.vertices);
    target
        .indices
        .extend(source.indices.iter().map(|i| vertex_base + i));
    target.regions.extend(source.regions.iter().map(|r| FaceRegion {
        name: r.name,
        indices: r.indices.start + index_base..r.indices.end + index_base,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data_structures::mesh::Material,
        geometry::primitives::{create_box, create_cylinder, BoxOptions, CylinderOptions},
    };

    fn parts() -> Vec<MeshTemplate> {
        let mut block = create_box("block", &BoxOptions::default(), Material::plain("wall")).unwrap();
        block.transform = Instance::at(0.0, 0.5, 0.0);
        let cap = create_cylinder("cap", &CylinderOptions::default(), Material::plain("cap")).unwrap();
        vec![block, cap]
    }

    #[test]
    fn multi_material_keeps_one_submesh_per_material() {
        let merged = merge_meshes("pair", &parts(), true);
        assert_eq!(merged.submeshes.len(), 2);
        assert_eq!(merged.materials.len(), 2);
        assert_eq!(merged.material_of(&merged.submeshes[1]).unwrap().name, "cap");
        assert_eq!(merged.region_count(), 4 + 3);
        // the block's offset is baked
        assert_eq!(merged.submeshes[0].bounds().unwrap().min.y, 0.0);
        assert!(merged.transform.is_identity());
    }

    #[test]
    fn collapsing_shares_the_first_material() {
        let source = parts();
        let merged = merge_meshes("pair", &source, false);
        assert_eq!(merged.submeshes.len(), 1);
        assert_eq!(merged.materials, vec![Material::plain("wall")]);
        assert_eq!(merged.vertex_count(), source.iter().map(|p| p.vertex_count()).sum::<usize>());
        let last = merged.submeshes[0].regions.last().unwrap();
        assert_eq!(last.indices.end, merged.submeshes[0].indices.len());
    }
}
