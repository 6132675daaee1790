//! Mutation Batcher
//!
//! Collects added and attribute-changed elements from DOM mutation records
//! into a pending set, and asks for exactly one animation frame at a time to
//! drain a bounded slice of it. Removals are only noted, so the frame can
//! let go of state held for detached elements.
//!
//! States: `Idle -> Scheduled -> Idle` per frame, or `Disposed` once torn
//! down.

use std::collections::{HashSet, VecDeque};

use retro_dom::{DomTree, MutationObserverInit, MutationRecord, MutationType, NodeId, ObserverId};

use crate::scheduler::{Scheduler, TaskHandle};

/// Attributes whose changes can alter an element's colors
pub const OBSERVED_ATTRIBUTES: [&str; 2] = ["class", "style"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatcherState {
    Idle,
    Scheduled,
    Disposed,
}

#[derive(Debug)]
pub struct MutationBatcher<T> {
    state: BatcherState,
    observer: Option<ObserverId>,
    pending: VecDeque<NodeId>,
    pending_set: HashSet<NodeId>,
    removals: bool,
    batch_size: usize,
    frame: Option<TaskHandle>,
    frame_task: T,
}

impl<T: Clone> MutationBatcher<T> {
    /// `frame_task` is what gets queued on the animation-frame queue
    pub fn new(batch_size: usize, frame_task: T) -> Self {
        Self {
            state: BatcherState::Idle,
            observer: None,
            pending: VecDeque::new(),
            pending_set: HashSet::new(),
            removals: false,
            batch_size: batch_size.max(1),
            frame: None,
            frame_task,
        }
    }

    pub fn state(&self) -> BatcherState {
        self.state
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Whether nodes were removed since the last call; resets the flag
    pub fn take_removals(&mut self) -> bool {
        std::mem::take(&mut self.removals)
    }

    /// Start observing the whole document. No-op once disposed.
    pub fn observe(&mut self, tree: &mut DomTree) {
        if self.state == BatcherState::Disposed || self.observer.is_some() {
            return;
        }
        let observer = tree.create_observer();
        tree.observe(
            observer,
            NodeId::ROOT,
            MutationObserverInit {
                child_list: true,
                attributes: true,
                subtree: true,
                attribute_old_value: false,
                attribute_filter: Some(OBSERVED_ATTRIBUTES.iter().map(|a| a.to_string()).collect()),
            },
        );
        self.observer = Some(observer);
    }

    /// Pull queued mutation records into the pending set
    pub fn collect(&mut self, tree: &mut DomTree, scheduler: &mut Scheduler<T>) {
        let Some(observer) = self.observer else {
            return;
        };
        let records = tree.take_records(observer);
        if !records.is_empty() {
            self.on_mutations(tree, &records, scheduler);
        }
    }

    /// Drop queued records without looking at them; used after the engine's
    /// own writes
    pub fn discard(&mut self, tree: &mut DomTree) {
        if let Some(observer) = self.observer {
            tree.take_records(observer);
        }
    }

    /// Observer callback: queue affected elements and schedule one frame
    pub fn on_mutations(&mut self, tree: &DomTree, records: &[MutationRecord], scheduler: &mut Scheduler<T>) {
        if self.state == BatcherState::Disposed {
            return;
        }
        for record in records {
            match record.mutation_type {
                MutationType::ChildList => {
                    for &node in &record.added_nodes {
                        if tree.is_element(node) {
                            self.enqueue(node);
                        }
                    }
                    self.removals |= !record.removed_nodes.is_empty();
                }
                MutationType::Attributes => self.enqueue(record.target),
            }
        }
        if !self.pending.is_empty() || self.removals {
            self.schedule(scheduler);
        }
    }

    fn enqueue(&mut self, node: NodeId) {
        if self.pending_set.insert(node) {
            self.pending.push_back(node);
        }
    }

    fn schedule(&mut self, scheduler: &mut Scheduler<T>) {
        if self.state != BatcherState::Idle {
            return;
        }
        self.frame = Some(scheduler.request_animation_frame(self.frame_task.clone()));
        self.state = BatcherState::Scheduled;
        tracing::trace!(pending = self.pending.len(), "mutation frame scheduled");
    }

    /// Animation-frame callback: take up to `batch_size` still-connected
    /// elements. Leftovers are carried to a newly scheduled frame.
    pub fn run_frame(&mut self, tree: &DomTree, scheduler: &mut Scheduler<T>) -> Vec<NodeId> {
        if self.state != BatcherState::Scheduled {
            return Vec::new();
        }
        self.state = BatcherState::Idle;
        self.frame = None;

        let mut batch = Vec::with_capacity(self.batch_size.min(self.pending.len()));
        while batch.len() < self.batch_size {
            let Some(node) = self.pending.pop_front() else {
                break;
            };
            self.pending_set.remove(&node);
            if tree.is_connected(node) {
                batch.push(node);
            }
        }

        if !self.pending.is_empty() {
            self.schedule(scheduler);
        }
        tracing::debug!(batch = batch.len(), carried = self.pending.len(), "mutation frame");
        batch
    }

    /// Disconnect, drop pending work, and refuse any further scheduling
    pub fn dispose(&mut self, tree: &mut DomTree, scheduler: &mut Scheduler<T>) {
        if let Some(observer) = self.observer.take() {
            tree.disconnect(observer);
            tree.remove_observer(observer);
        }
        if let Some(frame) = self.frame.take() {
            scheduler.cancel(frame);
        }
        self.pending.clear();
        self.pending_set.clear();
        self.removals = false;
        self.state = BatcherState::Disposed;
        tracing::debug!("mutation batcher disposed");
    }
}
