use flow_village::{
    config::VillageConfig,
    context::VillageContext,
    data_structures::{bounds::Aabb, instance::Instance, store::TemplateId},
    instancing::EntityInstance,
};

pub(crate) const EPSILON: f32 = 1e-5;

pub(crate) fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// The default village with logging routed to the test output.
pub(crate) fn default_village() -> VillageContext {
    flow_village::init_logger();
    flow_village::assemble(&VillageConfig::default())
}

/// A unit footprint standing on the ground at `(x, z)`.
pub(crate) fn block(id: &str, x: f32, z: f32) -> EntityInstance {
    EntityInstance::new(
        id,
        TemplateId(0),
        Instance::at(x, 0.0, z),
        Some(Aabb::new([-0.5, 0.0, -0.5], [0.5, 1.0, 0.5])),
    )
}

/// Counts what handlers observed during dispatch.
#[derive(Debug, Default)]
pub(crate) struct PickLog {
    pub presses: u32,
    pub hits: u32,
}

impl PickLog {
    pub fn record(&mut self, hit: bool) {
        self.presses += 1;
        if hit {
            self.hits += 1;
        }
    }
}

#[cfg(feature = "integration-tests")]
pub(crate) fn gpu_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    futures::executor::block_on(async {
        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                log::warn!("no adapter available, skipping GPU test: {}", e);
                return None;
            }
        };
        adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .ok()
    })
}
