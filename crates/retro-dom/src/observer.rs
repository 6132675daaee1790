//! Mutation Observers
//!
//! Observers register on a target node with a [`MutationObserverInit`];
//! the tree queues matching [`MutationRecord`]s until `take_records`.

use std::collections::HashMap;

use crate::NodeId;

/// Observer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u32);

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub subtree: bool,
    pub attribute_old_value: bool,
    /// When set, only these attribute names are reported
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    fn wants(&self, record: &MutationRecord) -> bool {
        match record.mutation_type {
            MutationType::ChildList => self.child_list,
            MutationType::Attributes => {
                if !self.attributes {
                    return false;
                }
                match (&self.attribute_filter, &record.attribute_name) {
                    (Some(filter), Some(name)) => filter.iter().any(|f| f.eq_ignore_ascii_case(name)),
                    _ => true,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub(crate) fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            attribute_name: None,
            old_value: None,
        }
    }

    pub(crate) fn attribute(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name.to_ascii_lowercase()),
            old_value,
        }
    }
}

#[derive(Debug, Default)]
struct MutationObserver {
    observed: Vec<(NodeId, MutationObserverInit)>,
    records: Vec<MutationRecord>,
}

/// All observers registered on one tree
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    next_id: u32,
    observers: HashMap<ObserverId, MutationObserver>,
}

impl ObserverRegistry {
    pub fn is_empty(&self) -> bool {
        self.observers.values().all(|o| o.observed.is_empty())
    }

    pub fn create(&mut self) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.insert(id, MutationObserver::default());
        id
    }

    /// Returns false if the observer is unknown
    pub fn observe(&mut self, id: ObserverId, target: NodeId, init: MutationObserverInit) -> bool {
        let Some(observer) = self.observers.get_mut(&id) else {
            return false;
        };
        match observer.observed.iter_mut().find(|(t, _)| *t == target) {
            Some(entry) => entry.1 = init,
            None => observer.observed.push((target, init)),
        }
        true
    }

    pub fn disconnect(&mut self, id: ObserverId) {
        if let Some(observer) = self.observers.get_mut(&id) {
            observer.observed.clear();
            observer.records.clear();
        }
    }

    pub fn remove(&mut self, id: ObserverId) {
        self.observers.remove(&id);
    }

    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .get_mut(&id)
            .map(|o| std::mem::take(&mut o.records))
            .unwrap_or_default()
    }

    /// Observers that want `record`. `is_ancestor(a, b)` answers whether `a`
    /// is an inclusive ancestor of `b`.
    pub fn interested(
        &self,
        record: &MutationRecord,
        is_ancestor: impl Fn(NodeId, NodeId) -> bool,
    ) -> Vec<(ObserverId, bool)> {
        let mut out = Vec::new();
        for (id, observer) in &self.observers {
            let matched = observer.observed.iter().find(|(target, init)| {
                init.wants(record)
                    && (*target == record.target || (init.subtree && is_ancestor(*target, record.target)))
            });
            if let Some((_, init)) = matched {
                out.push((*id, init.attribute_old_value));
            }
        }
        out
    }

    pub fn deliver(&mut self, targets: &[(ObserverId, bool)], record: &MutationRecord) {
        for (id, keep_old_value) in targets {
            if let Some(observer) = self.observers.get_mut(id) {
                let mut record = record.clone();
                if record.mutation_type == MutationType::Attributes && !keep_old_value {
                    record.old_value = None;
                }
                observer.records.push(record);
            }
        }
    }
}
