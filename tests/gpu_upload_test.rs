#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn house_uploads_one_buffer_pair_per_material() {
    use flow_village::{
        data_structures::instance::Instance,
        geometry::builder::build_house,
        resources::mesh::{instance_buffer, upload_template},
    };

    use crate::common::test_utils::gpu_device;

    let Some((device, _queue)) = gpu_device() else {
        return;
    };
    let house = build_house().unwrap();
    let uploaded = upload_template(&device, &house);
    assert_eq!(uploaded.meshes.len(), 2);
    assert_eq!(uploaded.materials.len(), 2);
    assert_eq!(uploaded.meshes[1].material, 1);
    assert_eq!(
        uploaded.meshes.iter().map(|m| m.num_elements as usize).sum::<usize>(),
        house.triangle_count() * 3
    );

    let transforms = [Instance::at(0.0, 0.0, 0.0), Instance::at(2.0, 0.0, 1.0)];
    let buffer = instance_buffer(&device, "houses", &transforms);
    assert_eq!(
        buffer.size() as usize,
        transforms.len() * std::mem::size_of::<flow_village::data_structures::instance::InstanceRaw>()
    );
}

#[test]
#[cfg(feature = "integration-tests")]
fn assembled_village_uploads_every_batch() {
    use flow_village::resources::mesh::{instance_buffer, upload_template};

    use crate::common::test_utils::{default_village, gpu_device};

    let Some((device, _queue)) = gpu_device() else {
        return;
    };
    let context = default_village();
    for batch in context.draw_list() {
        let template = context.village.store.get(batch.template).unwrap();
        let uploaded = upload_template(&device, template);
        assert_eq!(uploaded.meshes.len(), template.submeshes.len());
        let buffer = instance_buffer(&device, &template.name, &batch.transforms);
        assert!(buffer.size() > 0);
    }
}
