//! Scene graph and hierarchical scene organization.
//!
//! Nodes are stored flat and refer to their parent by id only; a parent does
//! not own its children. World transforms are recomputed on read by walking
//! the parent chain, so moving a car body moves its wheels without any
//! propagation step.

use std::collections::BTreeMap;

use log::warn;

use crate::data_structures::{instance::Instance, store::TemplateId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub local: Instance,
    pub parent: Option<NodeId>,
    /// Geometry drawn at this node, if any. Container nodes have none.
    pub template: Option<TemplateId>,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, SceneNode>,
    next_id: u32,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, local: Instance, template: Option<TemplateId>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            SceneNode {
                name: name.to_string(),
                local,
                parent: None,
                template,
            },
        );
        id
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: &str,
        local: Instance,
        template: Option<TemplateId>,
    ) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            warn!("You tried to attach '{}' to missing parent {:?}.", name, parent);
            return None;
        }
        let id = self.add(name, local, template);
        self.set_parent(id, Some(parent));
        Some(id)
    }

    /// Copies a node (template, parent and local transform) under a new name.
    pub fn clone_node(&mut self, id: NodeId, name: &str) -> Option<NodeId> {
        let source = self.nodes.get(&id)?.clone();
        let clone = self.add(name, source.local, source.template);
        if let Some(node) = self.nodes.get_mut(&clone) {
            node.parent = source.parent;
        }
        Some(clone)
    }

    /// Re-parents `child`. Refuses links that would form a cycle.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> bool {
        if !self.nodes.contains_key(&child) {
            warn!("You tried to re-parent missing node {:?}.", child);
            return false;
        }
        if let Some(parent) = parent {
            if !self.nodes.contains_key(&parent) {
                warn!("You tried to parent {:?} to missing node {:?}.", child, parent);
                return false;
            }
            if self.ancestors(parent).any(|a| a == child) || parent == child {
                warn!("Parenting {:?} to {:?} would create a cycle.", child, parent);
                return false;
            }
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = parent;
        }
        true
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn set_local_transform(&mut self, id: NodeId, local: Instance) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.local = local;
                true
            }
            None => false,
        }
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| *id)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent == Some(id))
            .map(|(child, _)| *child)
            .collect()
    }

    /// `id` followed by everything below it, parents before children.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        if !self.nodes.contains_key(&id) {
            return Vec::new();
        }
        let mut out = vec![id];
        let mut next = 0;
        while next < out.len() {
            for child in self.children(out[next]) {
                if !out.contains(&child) {
                    out.push(child);
                }
            }
            next += 1;
        }
        out
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.nodes.get(&id).and_then(|n| n.parent);
        let mut remaining = self.nodes.len();
        std::iter::from_fn(move || {
            let id = current?;
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            current = self.nodes.get(&id).and_then(|n| n.parent);
            Some(id)
        })
    }

    /// `root * ... * parent * local`, recomputed from the current locals.
    pub fn world_transform(&self, id: NodeId) -> Option<Instance> {
        let node = self.nodes.get(&id)?;
        let world = self
            .ancestors(id)
            .filter_map(|a| self.nodes.get(&a))
            .fold(node.local.clone(), |acc, parent| &parent.local * &acc);
        Some(world)
    }

    /// Removes one node. Its children become roots and keep their world placement.
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let children = self.children(id);
        for child in children {
            if let Some(world) = self.world_transform(child) {
                if let Some(node) = self.nodes.get_mut(&child) {
                    node.local = world;
                    node.parent = None;
                }
            }
        }
        self.nodes.remove(&id)
    }

    pub fn nodes_with_template(&self, template: TemplateId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.template == Some(template))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Removes every node drawing `template`; returns how many were removed.
    pub fn remove_template_nodes(&mut self, template: TemplateId) -> usize {
        let ids = self.nodes_with_template(template);
        ids.iter().filter(|id| self.remove(**id).is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: cgmath::Vector3<f32>, b: [f32; 3]) -> bool {
        (a.x - b[0]).abs() < 1e-5 && (a.y - b[1]).abs() < 1e-5 && (a.z - b[2]).abs() < 1e-5
    }

    #[test]
    fn child_world_transform_follows_parent_moves() {
        let mut graph = SceneGraph::new();
        let car = graph.add("car", Instance::at(1.0, 0.0, 0.0), None);
        let wheel = graph
            .add_child(car, "wheel", Instance::at(-0.2, 0.035, -0.1), None)
            .unwrap();
        assert!(close(graph.world_transform(wheel).unwrap().position, [0.8, 0.035, -0.1]));

        graph.set_local_transform(car, Instance::at(5.0, 0.0, 2.0));
        assert!(close(graph.world_transform(wheel).unwrap().position, [4.8, 0.035, 1.9]));
    }

    #[test]
    fn subtree_lists_parents_first() {
        let mut graph = SceneGraph::new();
        let car = graph.add("car", Instance::new(), None);
        let body = graph.add_child(car, "body", Instance::new(), None).unwrap();
        let wheel = graph.add_child(body, "wheel", Instance::new(), None).unwrap();
        graph.add("house", Instance::new(), None);
        assert_eq!(graph.subtree(car), vec![car, body, wheel]);
        assert_eq!(graph.subtree(NodeId(99)), Vec::<NodeId>::new());
    }

    #[test]
    fn cycles_are_rejected() {
        let mut graph = SceneGraph::new();
        let a = graph.add("a", Instance::new(), None);
        let b = graph.add_child(a, "b", Instance::new(), None).unwrap();
        assert!(!graph.set_parent(a, Some(b)));
        assert!(!graph.set_parent(a, Some(a)));
        assert_eq!(graph.get(a).unwrap().parent, None);
    }

    #[test]
    fn removing_a_parent_keeps_children_in_place() {
        let mut graph = SceneGraph::new();
        let lamp = graph.add("lamp", Instance::at(0.0, 0.0, 3.0), None);
        let bulb = graph
            .add_child(lamp, "bulb", Instance::at(0.0, 2.0, 0.0), None)
            .unwrap();
        graph.remove(lamp);
        let node = graph.get(bulb).unwrap();
        assert_eq!(node.parent, None);
        assert!(close(node.local.position, [0.0, 2.0, 3.0]));
    }

    #[test]
    fn clones_share_template_and_parent() {
        let mut graph = SceneGraph::new();
        let body = graph.add("body", Instance::new(), None);
        let rb = graph
            .add_child(body, "wheelRB", Instance::new(), Some(TemplateId(3)))
            .unwrap();
        let rf = graph.clone_node(rb, "wheelRF").unwrap();
        assert_eq!(graph.get(rf).unwrap().parent, Some(body));
        assert_eq!(graph.nodes_with_template(TemplateId(3)), vec![rb, rf]);
        assert_eq!(graph.remove_template_nodes(TemplateId(3)), 2);
        assert_eq!(graph.children(body), Vec::<NodeId>::new());
        assert_eq!(graph.find("body"), Some(body));
    }
}
