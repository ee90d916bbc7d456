use log::debug;

use crate::io::storage::Storage;
use crate::store::{ChangeSet, Collection, DataStore, EntityRef};

use super::pages::View;

/// What a mounted view is subscribed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// One specific entity
    Entity(EntityRef),
    /// Any entity of a collection
    Collection(Collection),
}

impl Topic {
    pub fn is_hit_by(self, changes: &ChangeSet) -> bool {
        match self {
            Topic::Entity(entity) => changes.touches(entity),
            Topic::Collection(collection) => changes.touches_collection(collection),
        }
    }
}

/// Handle to a mounted view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(u64);

struct Mounted {
    id: ViewId,
    topics: Vec<Topic>,
    view: View,
    refreshes: u32,
}

/// Every currently mounted view and what it listens to.
#[derive(Default)]
pub struct ViewRegistry {
    mounted: Vec<Mounted>,
    next_id: u64,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a view on its own topics; it is rendered once immediately.
    pub fn mount<S: Storage>(&mut self, view: View, store: &DataStore<S>) -> ViewId {
        let topics = view.topics();
        self.mount_with(view, topics, store)
    }

    pub fn mount_with<S: Storage>(
        &mut self,
        mut view: View,
        topics: Vec<Topic>,
        store: &DataStore<S>,
    ) -> ViewId {
        let id = ViewId(self.next_id);
        self.next_id += 1;
        view.refresh(store);
        self.mounted.push(Mounted {
            id,
            topics,
            view,
            refreshes: 1,
        });
        id
    }

    pub fn unmount(&mut self, id: ViewId) -> Option<View> {
        let pos = self.mounted.iter().position(|m| m.id == id)?;
        Some(self.mounted.remove(pos).view)
    }

    pub fn get(&self, id: ViewId) -> Option<&View> {
        self.mounted.iter().find(|m| m.id == id).map(|m| &m.view)
    }

    /// Change a view's own state (such as a filter) and re-render it
    pub fn update<S: Storage>(
        &mut self,
        id: ViewId,
        store: &DataStore<S>,
        f: impl FnOnce(&mut View),
    ) -> bool {
        match self.mounted.iter_mut().find(|m| m.id == id) {
            Some(m) => {
                f(&mut m.view);
                m.view.refresh(store);
                m.refreshes += 1;
                true
            }
            None => false,
        }
    }

    /// How many times a view has been rendered, mount included
    pub fn refresh_count(&self, id: ViewId) -> Option<u32> {
        self.mounted.iter().find(|m| m.id == id).map(|m| m.refreshes)
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    /// Refresh every view subscribed to something in `changes`. Returns
    /// the number of views refreshed.
    pub fn notify<S: Storage>(&mut self, changes: &ChangeSet, store: &DataStore<S>) -> usize {
        let mut refreshed = 0;
        for m in &mut self.mounted {
            if m.topics.iter().any(|t| t.is_hit_by(changes)) {
                m.view.refresh(store);
                m.refreshes += 1;
                refreshed += 1;
            }
        }
        debug!("notified {} of {} mounted views", refreshed, self.mounted.len());
        refreshed
    }
}
