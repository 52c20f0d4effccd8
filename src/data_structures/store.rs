//! Ownership of built mesh templates.
//!
//! Geometry lives here for as long as the scene does. Scene nodes and entity
//! instances only hold a [`TemplateId`], so consuming a template for
//! instancing never frees geometry that instances still draw.

use std::{fmt, sync::Arc};

use crate::{
    data_structures::mesh::MeshTemplate,
    error::{Error, Result},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub u32);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateState {
    /// The template may still be drawn through scene nodes or instanced.
    Renderable,
    /// Instancing took over; the template itself is no longer drawn.
    Consumed,
}

#[derive(Debug)]
struct Entry {
    template: Arc<MeshTemplate>,
    state: TemplateState,
}

#[derive(Debug, Default)]
pub struct TemplateStore {
    entries: Vec<Entry>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template: MeshTemplate) -> TemplateId {
        let id = TemplateId(self.entries.len() as u32);
        log::debug!(
            "stored template '{}' as {} ({} vertices, {} regions)",
            template.name,
            id,
            template.vertex_count(),
            template.region_count()
        );
        self.entries.push(Entry {
            template: Arc::new(template),
            state: TemplateState::Renderable,
        });
        id
    }

    pub fn get(&self, id: TemplateId) -> Option<&Arc<MeshTemplate>> {
        self.entries.get(id.0 as usize).map(|e| &e.template)
    }

    pub fn state(&self, id: TemplateId) -> Option<TemplateState> {
        self.entries.get(id.0 as usize).map(|e| e.state)
    }

    pub fn is_renderable(&self, id: TemplateId) -> bool {
        self.state(id) == Some(TemplateState::Renderable)
    }

    /// Marks the template as consumed. Consuming twice is a [`Error::StaleTemplate`].
    pub fn consume(&mut self, id: TemplateId) -> Result<()> {
        let entry = self
            .entries
            .get_mut(id.0 as usize)
            .ok_or(Error::UnknownTemplate { template: id })?;
        match entry.state {
            TemplateState::Consumed => Err(Error::StaleTemplate { template: id }),
            TemplateState::Renderable => {
                entry.state = TemplateState::Consumed;
                Ok(())
            }
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = TemplateId> + '_ {
        (0..self.entries.len() as u32).map(TemplateId)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every template; ids handed out earlier become unknown.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
