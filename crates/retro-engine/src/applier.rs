//! Patch Applier / Reverter
//!
//! Applies patch plans as `!important` inline declarations and keeps the
//! pre-patch inline values of every touched property so revert is exact.
//!
//! Snapshots live in an arena keyed by a per-element integer id written to
//! the snapshot id attribute on first patch. The arena holds only `NodeId`s,
//! so it never keeps a removed element reachable. Entries are reclaimed on
//! revert, and for elements the page has detached, by
//! [`PatchApplier::prune_detached`].

use std::collections::{BTreeMap, VecDeque};

use retro_dom::{DomTree, NodeId};

use crate::clock::{Budget, Clock};
use crate::config::EngineConfig;
use crate::scanner::PatchPlan;
use crate::session::ThemeSession;

/// Original inline declaration of one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalValue {
    /// `None` when the property had no inline declaration
    pub value: Option<String>,
    pub important: bool,
}

/// Pre-patch inline values of one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub element: NodeId,
    /// Property order is capture order
    pub properties: Vec<(String, OriginalValue)>,
}

impl Snapshot {
    fn has(&self, property: &str) -> bool {
        self.properties.iter().any(|(p, _)| p == property)
    }
}

/// Arena of snapshots keyed by snapshot id
#[derive(Debug, Default)]
pub struct SnapshotStore {
    entries: BTreeMap<u32, Snapshot>,
    next_id: u32,
}

impl SnapshotStore {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Snapshot> {
        self.entries.get(&id)
    }

    /// Snapshot id recorded on `element`, if it really belongs to it. A copied
    /// attribute (say, from a cloned node) does not count.
    pub fn id_of(&self, tree: &DomTree, element: NodeId, attribute: &str) -> Option<u32> {
        let id = tree.get_attribute(element, attribute)?.parse::<u32>().ok()?;
        self.entries
            .get(&id)
            .filter(|snapshot| snapshot.element == element)
            .map(|_| id)
    }

    fn insert(&mut self, element: NodeId) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.insert(id, Snapshot { element, properties: Vec::new() });
        id
    }

    fn take(&mut self, id: u32) -> Option<Snapshot> {
        self.entries.remove(&id)
    }

    fn detached(&self, tree: &DomTree) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|(_, snapshot)| !tree.is_connected(snapshot.element))
            .map(|(&id, _)| id)
            .collect()
    }

    fn drain(&mut self) -> Vec<Snapshot> {
        std::mem::take(&mut self.entries).into_values().collect()
    }
}

/// Outcome of an apply call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Elements patched during this call
    pub applied: usize,
    /// Plans left for a deferred continuation
    pub remaining: usize,
}

impl ApplyOutcome {
    pub fn needs_continuation(&self) -> bool {
        self.remaining > 0
    }
}

/// Applier statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplierStats {
    pub elements_patched: u64,
    pub properties_written: u64,
    pub detached_skipped: u64,
    pub reschedules: u64,
    pub elements_reverted: u64,
}

/// Sole writer of theme inline styles and of the snapshot store
#[derive(Debug, Default)]
pub struct PatchApplier {
    store: SnapshotStore,
    pending: VecDeque<PatchPlan>,
    stats: ApplierStats,
}

impl PatchApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn stats(&self) -> &ApplierStats {
        &self.stats
    }

    /// Plans waiting for a continuation
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queue `plans` and apply as many as the budget allows.
    ///
    /// The budget is re-checked every `apply_yield_interval` elements; on
    /// overrun the rest stays queued for [`PatchApplier::resume`]. Nothing is
    /// written while the session is disabled.
    pub fn apply(
        &mut self,
        tree: &mut DomTree,
        session: &ThemeSession,
        plans: Vec<PatchPlan>,
        config: &EngineConfig,
        clock: &dyn Clock,
    ) -> ApplyOutcome {
        self.pending.extend(plans.into_iter().filter(|p| !p.is_empty()));
        self.resume(tree, session, config, clock)
    }

    /// Continue a deferred apply
    pub fn resume(
        &mut self,
        tree: &mut DomTree,
        session: &ThemeSession,
        config: &EngineConfig,
        clock: &dyn Clock,
    ) -> ApplyOutcome {
        if !session.is_enabled() {
            if !self.pending.is_empty() {
                tracing::debug!(dropped = self.pending.len(), "theme disabled; dropping queued plans");
                self.pending.clear();
            }
            return ApplyOutcome::default();
        }

        let budget = Budget::start(clock, config.apply_budget_ms);
        let mut outcome = ApplyOutcome::default();
        let mut since_check = 0;

        while let Some(plan) = self.pending.pop_front() {
            if self.apply_plan(tree, &plan, config) {
                outcome.applied += 1;
            }
            since_check += 1;
            if since_check >= config.apply_yield_interval {
                since_check = 0;
                if !self.pending.is_empty() && budget.exhausted() {
                    self.stats.reschedules += 1;
                    tracing::debug!(
                        applied = outcome.applied,
                        remaining = self.pending.len(),
                        "apply budget exhausted; deferring remainder"
                    );
                    break;
                }
            }
        }

        outcome.remaining = self.pending.len();
        outcome
    }

    fn apply_plan(&mut self, tree: &mut DomTree, plan: &PatchPlan, config: &EngineConfig) -> bool {
        let element = plan.element;
        if !tree.is_element(element) || !tree.is_connected(element) {
            self.stats.detached_skipped += 1;
            return false;
        }

        let id = match self.store.id_of(tree, element, &config.snapshot_id_attribute) {
            Some(id) => id,
            None => {
                let id = self.store.insert(element);
                tree.set_attribute(element, &config.snapshot_id_attribute, &id.to_string());
                id
            }
        };

        // Capture originals only for properties not yet in the snapshot, so a
        // second pass never records already-patched values.
        if let Some(snapshot) = self.store.entries.get_mut(&id) {
            let style = tree.inline_style(element);
            for (property, _) in &plan.styles {
                if snapshot.has(property) {
                    continue;
                }
                let declaration = style.and_then(|s| s.get(property));
                snapshot.properties.push((
                    property.clone(),
                    OriginalValue {
                        value: declaration.map(|d| d.value.clone()),
                        important: declaration.is_some_and(|d| d.important),
                    },
                ));
            }
        }

        for (property, value) in &plan.styles {
            tree.set_style_property(element, property, value, true);
            self.stats.properties_written += 1;
        }
        tree.set_attribute(element, &config.applied_attribute, "");
        tree.set_attribute(element, &config.processed_attribute, "");
        self.stats.elements_patched += 1;
        true
    }

    /// Flag elements a scan handled without producing a plan, so later passes
    /// that skip processed elements leave them alone
    pub fn mark_processed(&mut self, tree: &mut DomTree, elements: &[NodeId], config: &EngineConfig) {
        for &element in elements {
            if tree.is_connected(element) && !tree.has_attribute(element, &config.processed_attribute) {
                tree.set_attribute(element, &config.processed_attribute, "");
            }
        }
    }

    /// Restore one element and clear its markers; false if there was nothing
    /// to undo
    pub fn revert_element(&mut self, tree: &mut DomTree, element: NodeId, config: &EngineConfig) -> bool {
        let snapshot = self
            .store
            .id_of(tree, element, &config.snapshot_id_attribute)
            .and_then(|id| self.store.take(id));
        let had_markers = clear_markers(tree, element, config);
        match snapshot {
            Some(snapshot) => {
                restore(tree, &snapshot);
                self.stats.elements_reverted += 1;
                true
            }
            None => had_markers,
        }
    }

    /// Restore and forget elements no longer in the document. A detached
    /// element that comes back is an added node and gets scanned afresh.
    pub fn prune_detached(&mut self, tree: &mut DomTree, config: &EngineConfig) -> usize {
        let detached = self.store.detached(tree);
        for id in &detached {
            if let Some(snapshot) = self.store.take(*id) {
                restore(tree, &snapshot);
                clear_markers(tree, snapshot.element, config);
            }
        }
        self.pending.retain(|plan| tree.is_connected(plan.element));
        if !detached.is_empty() {
            tracing::debug!(pruned = detached.len(), "dropped snapshots of detached elements");
        }
        detached.len()
    }

    /// Restore every snapshotted element, clear all markers, and strip the
    /// theme from the document root. Idempotent; detached elements are
    /// restored in place without error.
    pub fn revert_all(
        &mut self,
        tree: &mut DomTree,
        session: &mut ThemeSession,
        root: Option<NodeId>,
        config: &EngineConfig,
    ) -> usize {
        self.pending.clear();

        let snapshots = self.store.drain();
        let reverted = snapshots.len();
        for snapshot in &snapshots {
            restore(tree, snapshot);
            clear_markers(tree, snapshot.element, config);
        }

        // Markers without a snapshot: processed-only elements and copies
        let mut stray = tree.elements_with_attribute(&config.processed_attribute);
        stray.extend(tree.elements_with_attribute(&config.applied_attribute));
        stray.extend(tree.elements_with_attribute(&config.snapshot_id_attribute));
        for element in stray {
            clear_markers(tree, element, config);
        }

        if let Some(root) = root {
            session.strip_root(tree, root);
        }

        self.stats.elements_reverted += reverted as u64;
        if reverted > 0 {
            tracing::info!(reverted, "reverted theme styles");
        }
        reverted
    }
}

/// Write the originals back. A property that no longer holds an important
/// declaration was rewritten by the page after patching and is left alone.
fn restore(tree: &mut DomTree, snapshot: &Snapshot) {
    for (property, original) in &snapshot.properties {
        let ours = tree
            .inline_style(snapshot.element)
            .and_then(|style| style.get(property))
            .is_some_and(|declaration| declaration.important);
        if !ours {
            continue;
        }
        match &original.value {
            Some(value) => {
                tree.set_style_property(snapshot.element, property, value, original.important);
            }
            None => {
                tree.remove_style_property(snapshot.element, property);
            }
        }
    }
}

fn clear_markers(tree: &mut DomTree, element: NodeId, config: &EngineConfig) -> bool {
    let mut cleared = false;
    for attribute in [
        &config.applied_attribute,
        &config.processed_attribute,
        &config.snapshot_id_attribute,
    ] {
        cleared |= tree.remove_attribute(element, attribute).is_some();
    }
    cleared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, SteppingClock};
    use crate::config::ThemeMode;

    fn setup(count: usize) -> (DomTree, NodeId, Vec<NodeId>) {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        tree.append_child(NodeId::ROOT, html).unwrap();
        let elements = (0..count)
            .map(|_| {
                let div = tree.create_element("div");
                tree.append_child(html, div).unwrap();
                div
            })
            .collect();
        (tree, html, elements)
    }

    fn session() -> ThemeSession {
        ThemeSession::new(ThemeMode::Light, 0.8, true).unwrap()
    }

    fn plan(element: NodeId) -> PatchPlan {
        PatchPlan::new(element)
            .with_style("color", "rgb(1, 2, 3)")
            .with_style("background-color", "rgb(4, 5, 6)")
    }

    #[test]
    fn test_apply_writes_important_and_marks() {
        let (mut tree, _, els) = setup(1);
        let config = EngineConfig::default();
        let mut applier = PatchApplier::new();
        let outcome = applier.apply(&mut tree, &session(), vec![plan(els[0])], &config, &ManualClock::new());

        assert_eq!(outcome, ApplyOutcome { applied: 1, remaining: 0 });
        let style = tree.inline_style(els[0]).unwrap();
        assert_eq!(style.get_property_value("color"), Some("rgb(1, 2, 3)"));
        assert!(style.get_property_priority("color"));
        assert!(tree.has_attribute(els[0], &config.applied_attribute));
        assert!(tree.has_attribute(els[0], &config.processed_attribute));
        assert_eq!(applier.store().len(), 1);
    }

    #[test]
    fn test_round_trip_restores_original_inline() {
        let (mut tree, html, els) = setup(1);
        let el = els[0];
        tree.set_attribute(el, "style", "color: red !important; margin: 0");
        let before = tree.get_attribute(el, "style").map(|s| s.into_owned());

        let config = EngineConfig::default();
        let mut session = session();
        let mut applier = PatchApplier::new();
        applier.apply(&mut tree, &session, vec![plan(el)], &config, &ManualClock::new());
        assert_ne!(tree.get_attribute(el, "style").map(|s| s.into_owned()), before);

        applier.revert_all(&mut tree, &mut session, Some(html), &config);
        assert_eq!(tree.get_attribute(el, "style").map(|s| s.into_owned()), before);
        assert!(!tree.has_attribute(el, &config.applied_attribute));
        assert!(!tree.has_attribute(el, &config.snapshot_id_attribute));
        assert!(applier.store().is_empty());
    }

    #[test]
    fn test_second_pass_keeps_first_snapshot() {
        let (mut tree, html, els) = setup(1);
        let el = els[0];
        let config = EngineConfig::default();
        let mut session = session();
        let mut applier = PatchApplier::new();
        let clock = ManualClock::new();

        applier.apply(&mut tree, &session, vec![PatchPlan::new(el).with_style("color", "blue")], &config, &clock);
        applier.apply(
            &mut tree,
            &session,
            vec![PatchPlan::new(el).with_style("color", "green").with_style("outline-color", "teal")],
            &config,
            &clock,
        );
        assert_eq!(applier.store().len(), 1);

        applier.revert_all(&mut tree, &mut session, Some(html), &config);
        assert!(tree.inline_style(el).unwrap().is_empty());
        assert!(!tree.has_attribute(el, "style"));
    }

    #[test]
    fn test_revert_is_idempotent_and_safe_when_empty() {
        let (mut tree, html, els) = setup(3);
        let config = EngineConfig::default();
        let mut session = session();
        let mut applier = PatchApplier::new();

        assert_eq!(applier.revert_all(&mut tree, &mut session, Some(html), &config), 0);

        let plans = els.iter().map(|&e| plan(e)).collect();
        applier.apply(&mut tree, &session, plans, &config, &ManualClock::new());
        assert_eq!(applier.revert_all(&mut tree, &mut session, Some(html), &config), 3);
        assert_eq!(applier.revert_all(&mut tree, &mut session, Some(html), &config), 0);
        for el in els {
            assert!(!tree.has_attribute(el, "style"));
        }
    }

    #[test]
    fn test_detached_elements() {
        let (mut tree, html, els) = setup(2);
        let config = EngineConfig::default();
        let mut session = session();
        let mut applier = PatchApplier::new();
        let clock = ManualClock::new();

        tree.detach(els[0]);
        let outcome = applier.apply(&mut tree, &session, vec![plan(els[0]), plan(els[1])], &config, &clock);
        assert_eq!(outcome.applied, 1);
        assert_eq!(applier.stats().detached_skipped, 1);

        // detached between apply and revert
        tree.detach(els[1]);
        assert_eq!(applier.revert_all(&mut tree, &mut session, Some(html), &config), 1);
        assert!(!tree.has_attribute(els[1], "style"));
    }

    #[test]
    fn test_prune_detached_releases_snapshots() {
        let (mut tree, _, els) = setup(3);
        let config = EngineConfig::default();
        let mut applier = PatchApplier::new();
        let plans = els.iter().map(|&e| plan(e)).collect();
        applier.apply(&mut tree, &session(), plans, &config, &ManualClock::new());

        tree.detach(els[0]);
        tree.detach(els[2]);
        assert_eq!(applier.prune_detached(&mut tree, &config), 2);
        assert_eq!(applier.store().len(), 1);
        assert!(!tree.has_attribute(els[0], "style"));
        assert!(!tree.has_attribute(els[2], &config.applied_attribute));
        assert!(tree.has_attribute(els[1], &config.applied_attribute));
        assert_eq!(applier.prune_detached(&mut tree, &config), 0);
    }

    #[test]
    fn test_disabled_session_applies_nothing() {
        let (mut tree, _, els) = setup(1);
        let mut session = session();
        session.set_enabled(false);
        let mut applier = PatchApplier::new();
        let outcome = applier.apply(&mut tree, &session, vec![plan(els[0])], &EngineConfig::default(), &ManualClock::new());
        assert_eq!(outcome, ApplyOutcome::default());
        assert!(!tree.has_attribute(els[0], "style"));
        assert_eq!(applier.pending(), 0);
    }

    #[test]
    fn test_overrun_defers_remainder() {
        let (mut tree, _, els) = setup(120);
        let config = EngineConfig { apply_budget_ms: 5.0, apply_yield_interval: 50, ..Default::default() };
        let session = session();
        let mut applier = PatchApplier::new();
        let clock = SteppingClock::new(10.0);

        let plans = els.iter().map(|&e| plan(e)).collect();
        let first = applier.apply(&mut tree, &session, plans, &config, &clock);
        assert_eq!(first, ApplyOutcome { applied: 50, remaining: 70 });
        assert!(first.needs_continuation());

        let second = applier.resume(&mut tree, &session, &config, &clock);
        assert_eq!(second, ApplyOutcome { applied: 50, remaining: 20 });
        let third = applier.resume(&mut tree, &session, &config, &clock);
        assert_eq!(third, ApplyOutcome { applied: 20, remaining: 0 });
        assert_eq!(applier.stats().reschedules, 2);
    }

    #[test]
    fn test_copied_snapshot_id_is_not_trusted() {
        let (mut tree, html, els) = setup(2);
        let config = EngineConfig::default();
        let mut session = session();
        let mut applier = PatchApplier::new();
        let clock = ManualClock::new();

        applier.apply(&mut tree, &session, vec![plan(els[0])], &config, &clock);
        let copied = tree.get_attribute(els[0], &config.snapshot_id_attribute).unwrap().into_owned();
        tree.set_attribute(els[1], &config.snapshot_id_attribute, &copied);
        tree.set_attribute(els[1], "style", "color: purple");

        applier.apply(&mut tree, &session, vec![plan(els[1])], &config, &clock);
        assert_eq!(applier.store().len(), 2);

        applier.revert_all(&mut tree, &mut session, Some(html), &config);
        assert_eq!(
            tree.inline_style(els[1]).unwrap().get_property_value("color"),
            Some("purple")
        );
    }

    #[test]
    fn test_revert_keeps_page_rewrites() {
        let (mut tree, html, els) = setup(1);
        let el = els[0];
        let config = EngineConfig::default();
        let mut session = session();
        let mut applier = PatchApplier::new();
        applier.apply(&mut tree, &session, vec![plan(el)], &config, &ManualClock::new());

        tree.set_style_property(el, "color", "blue", false);
        applier.revert_all(&mut tree, &mut session, Some(html), &config);
        let style = tree.inline_style(el).unwrap();
        assert_eq!(style.get_property_value("color"), Some("blue"));
        assert_eq!(style.get_property_value("background-color"), None);
    }

    #[test]
    fn test_revert_element() {
        let (mut tree, _, els) = setup(1);
        let config = EngineConfig::default();
        let mut applier = PatchApplier::new();
        applier.apply(&mut tree, &session(), vec![plan(els[0])], &config, &ManualClock::new());

        assert!(applier.revert_element(&mut tree, els[0], &config));
        assert!(!tree.has_attribute(els[0], "style"));
        assert!(!applier.revert_element(&mut tree, els[0], &config));
    }
}
