//! World-index to graph-instance registry.
//!
//! The engine passes `&NavGraph` explicitly everywhere; there are no
//! file-scope globals.  Servers hosting several worlds at once park each
//! world's graph here and hand out [`WorldId`] handles.

use nav_core::WorldId;

use crate::graph::NavGraph;

/// Owns the loaded graphs of all active worlds.
#[derive(Default)]
pub struct GraphRegistry {
    slots: Vec<Option<NavGraph>>,
}

impl GraphRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a graph, reusing the lowest free slot.
    pub fn register(&mut self, graph: NavGraph) -> WorldId {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(graph);
                return WorldId(i as u32);
            }
        }
        self.slots.push(Some(graph));
        WorldId((self.slots.len() - 1) as u32)
    }

    pub fn get(&self, world: WorldId) -> Option<&NavGraph> {
        self.slots.get(world.index())?.as_ref()
    }

    /// Drop a world's graph (level unload).  Returns it if it was present.
    pub fn remove(&mut self, world: WorldId) -> Option<NavGraph> {
        self.slots.get_mut(world.index())?.take()
    }

    /// Number of currently registered graphs.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
