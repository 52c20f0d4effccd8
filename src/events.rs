//! Pointer events and a single-threaded subscription list.

use std::fmt;

use winit::event::{ElementState, MouseButton};

use crate::data_structures::scene_graph::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Up,
}

/// A pointer press or release together with whatever the pick pass hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub button: MouseButton,
    pub picked: Option<NodeId>,
}

impl PointerEvent {
    pub fn from_mouse(state: ElementState, button: MouseButton, picked: Option<NodeId>) -> Self {
        let kind = match state {
            ElementState::Pressed => PointerKind::Down,
            ElementState::Released => PointerKind::Up,
        };
        Self {
            kind,
            button,
            picked,
        }
    }

    /// Left button press.
    pub fn down(picked: Option<NodeId>) -> Self {
        Self::from_mouse(ElementState::Pressed, MouseButton::Left, picked)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<S, E> = Box<dyn FnMut(&mut S, &E)>;

/// Handlers run in subscription order and get mutable access to `S`.
pub struct EventDispatcher<E, S> {
    handlers: Vec<(SubscriptionId, Handler<S, E>)>,
    next: u64,
}

impl<E, S> Default for EventDispatcher<E, S> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            next: 0,
        }
    }
}

impl<E, S> fmt::Debug for EventDispatcher<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscriptions", &self.handlers.len())
            .finish()
    }
}

impl<E, S> EventDispatcher<E, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut S, &E) + 'static,
    {
        let id = SubscriptionId(self.next);
        self.next += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _)| *sub != id);
        let removed = self.handlers.len() != before;
        if !removed {
            log::warn!("You tried to remove unknown subscription {:?}.", id);
        }
        removed
    }

    /// Runs every handler; returns how many ran.
    pub fn dispatch(&mut self, state: &mut S, event: &E) -> usize {
        for (_, handler) in self.handlers.iter_mut() {
            handler(state, event);
        }
        self.handlers.len()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_input_becomes_pointer_event() {
        let event = PointerEvent::from_mouse(ElementState::Released, MouseButton::Right, None);
        assert_eq!(event.kind, PointerKind::Up);
        assert_eq!(PointerEvent::down(Some(NodeId(1))).picked, Some(NodeId(1)));
    }

    #[test]
    fn handlers_run_until_unsubscribed() {
        let mut dispatcher: EventDispatcher<u32, Vec<u32>> = EventDispatcher::new();
        let doubled = dispatcher.subscribe(|seen: &mut Vec<u32>, e: &u32| seen.push(e * 2));
        dispatcher.subscribe(|seen: &mut Vec<u32>, e: &u32| seen.push(*e));

        let mut seen = Vec::new();
        assert_eq!(dispatcher.dispatch(&mut seen, &5), 2);
        assert_eq!(seen, vec![10, 5]);

        assert!(dispatcher.unsubscribe(doubled));
        assert!(!dispatcher.unsubscribe(doubled));
        dispatcher.dispatch(&mut seen, &1);
        assert_eq!(seen, vec![10, 5, 1]);

        dispatcher.clear();
        assert!(dispatcher.is_empty());
    }
}
