//! Overlap queries between a mover and the registered static instances.
//!
//! A query is an any-match over axis-aligned world bounds. The broad phase
//! only narrows down which registry entries are tested; it never changes the
//! answer.

use std::collections::HashMap;

use crate::{data_structures::bounds::Aabb, instancing::EntityInstance};

/// Anything that occupies space in the world.
pub trait Collider {
    fn world_bounds(&self) -> Option<Aabb>;

    /// Registry entries with the same id are the collider itself and are skipped.
    fn collider_id(&self) -> Option<&str> {
        None
    }
}

impl Collider for EntityInstance {
    fn world_bounds(&self) -> Option<Aabb> {
        EntityInstance::world_bounds(self)
    }

    fn collider_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl Collider for Aabb {
    fn world_bounds(&self) -> Option<Aabb> {
        Some(*self)
    }
}

/// True when `mover` overlaps at least one member of `registry`.
pub fn check_collision<C: Collider + ?Sized>(mover: &C, registry: &[EntityInstance]) -> bool {
    let Some(bounds) = mover.world_bounds() else {
        return false;
    };
    let own_id = mover.collider_id();
    registry
        .iter()
        .filter(|other| own_id != Some(other.id.as_str()))
        .filter_map(EntityInstance::world_bounds)
        .any(|other| other.intersects(&bounds))
}

/// Candidate selection ahead of the exact box test.
pub trait BroadPhase {
    fn rebuild(&mut self, bounds: &[Aabb]);

    /// Indices into the slice last passed to [`BroadPhase::rebuild`] that may overlap `query`.
    fn candidates(&self, query: &Aabb) -> Vec<usize>;
}

/// Tests everything.
#[derive(Debug, Default)]
pub struct LinearScan {
    len: usize,
}

impl BroadPhase for LinearScan {
    fn rebuild(&mut self, bounds: &[Aabb]) {
        self.len = bounds.len();
    }

    fn candidates(&self, _query: &Aabb) -> Vec<usize> {
        (0..self.len).collect()
    }
}

/// Buckets boxes into square cells on the ground plane.
///
/// Boxes spanning more than [`UniformGrid::MAX_SPAN`] cells along an axis, or
/// with non-finite corners, go into one oversized bucket that every query scans.
#[derive(Debug)]
pub struct UniformGrid {
    cell: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
    oversized: Vec<usize>,
    len: usize,
}

impl UniformGrid {
    pub const MAX_SPAN: i64 = 64;

    pub fn new(cell: f32) -> Self {
        let cell = if cell.is_finite() && cell > 0.0 { cell } else { 1.0 };
        Self {
            cell,
            cells: HashMap::new(),
            oversized: Vec::new(),
            len: 0,
        }
    }

    /// Inclusive cell ranges along x and z, `None` when the box is too large to bucket.
    fn cell_range(&self, bounds: &Aabb) -> Option<((i32, i32), (i32, i32))> {
        let to_cell = |v: f32| {
            let cell = (v / self.cell).floor();
            (cell.is_finite() && cell.abs() < i32::MAX as f32).then_some(cell as i32)
        };
        let x = (to_cell(bounds.min.x)?, to_cell(bounds.max.x)?);
        let z = (to_cell(bounds.min.z)?, to_cell(bounds.max.z)?);
        let span = |(lo, hi): (i32, i32)| i64::from(hi) - i64::from(lo);
        (span(x) <= Self::MAX_SPAN && span(z) <= Self::MAX_SPAN).then_some((x, z))
    }
}

impl Default for UniformGrid {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl BroadPhase for UniformGrid {
    fn rebuild(&mut self, bounds: &[Aabb]) {
        self.cells.clear();
        self.oversized.clear();
        self.len = bounds.len();
        for (index, b) in bounds.iter().enumerate() {
            let Some(((x0, x1), (z0, z1))) = self.cell_range(b) else {
                log::debug!("box {} is too large for the grid; scanning it linearly", index);
                self.oversized.push(index);
                continue;
            };
            for x in x0..=x1 {
                for z in z0..=z1 {
                    self.cells.entry((x, z)).or_default().push(index);
                }
            }
        }
    }

    fn candidates(&self, query: &Aabb) -> Vec<usize> {
        let Some(((x0, x1), (z0, z1))) = self.cell_range(query) else {
            return (0..self.len).collect();
        };
        let mut found: Vec<usize> = (x0..=x1)
            .flat_map(|x| (z0..=z1).map(move |z| (x, z)))
            .filter_map(|key| self.cells.get(&key))
            .flatten()
            .chain(&self.oversized)
            .copied()
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}

/// A registry snapshot prepared for repeated queries.
#[derive(Debug, Default)]
pub struct CollisionDetector<B = LinearScan> {
    broad: B,
    ids: Vec<String>,
    bounds: Vec<Aabb>,
}

impl CollisionDetector<LinearScan> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: BroadPhase> CollisionDetector<B> {
    pub fn with_broad_phase(broad: B) -> Self {
        Self {
            broad,
            ids: Vec::new(),
            bounds: Vec::new(),
        }
    }

    /// Re-reads the registry. Call after instances are added or moved.
    pub fn rebuild(&mut self, registry: &[EntityInstance]) {
        self.ids.clear();
        self.bounds.clear();
        for instance in registry {
            if let Some(bounds) = instance.world_bounds() {
                self.ids.push(instance.id.clone());
                self.bounds.push(bounds);
            }
        }
        self.broad.rebuild(&self.bounds);
    }

    /// Ids of every registry entry overlapping `mover`.
    pub fn overlapping<C: Collider + ?Sized>(&self, mover: &C) -> Vec<&str> {
        let Some(query) = mover.world_bounds() else {
            return Vec::new();
        };
        let own_id = mover.collider_id();
        self.broad
            .candidates(&query)
            .into_iter()
            .filter(|&i| own_id != Some(self.ids[i].as_str()))
            .filter(|&i| self.bounds[i].intersects(&query))
            .map(|i| self.ids[i].as_str())
            .collect()
    }

    pub fn collides<C: Collider + ?Sized>(&self, mover: &C) -> bool {
        let Some(query) = mover.world_bounds() else {
            return false;
        };
        let own_id = mover.collider_id();
        self.broad
            .candidates(&query)
            .into_iter()
            .filter(|&i| own_id != Some(self.ids[i].as_str()))
            .any(|i| self.bounds[i].intersects(&query))
    }

    /// Ground-plane area `mover` shares with the registry, summed over every overlapping entry.
    pub fn overlap_area<C: Collider + ?Sized>(&self, mover: &C) -> f32 {
        let Some(query) = mover.world_bounds() else {
            return 0.0;
        };
        let own_id = mover.collider_id();
        self.broad
            .candidates(&query)
            .into_iter()
            .filter(|&i| own_id != Some(self.ids[i].as_str()))
            .filter(|&i| self.bounds[i].intersects(&query))
            .map(|i| self.bounds[i].overlap_area_xz(&query))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.bounds.clear();
        self.broad.rebuild(&[]);
    }
}
