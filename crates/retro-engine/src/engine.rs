//! Retroshade Engine
//!
//! Wires the session, scanner, applier, batcher and navigation signal into a
//! single-threaded pipeline driven by the host's event loop. The host calls
//! [`RetroEngine::tick`] once per loop turn; every suspension point is an
//! explicit task on the [`Scheduler`].

use std::collections::VecDeque;

use retro_dom::{Document, DomTree, NodeId};

use crate::applier::PatchApplier;
use crate::batcher::MutationBatcher;
use crate::clock::{Clock, MonotonicClock};
use crate::config::{EngineConfig, Preferences};
use crate::error::EngineResult;
use crate::full_scan::{FullScan, FullScanStatus};
use crate::navigation::{resolve_url, RouteSignal};
use crate::scanner::{self, PatchPlan, ScanCursor, ScanOptions, ScanResult};
use crate::scheduler::{Scheduler, TaskHandle, TaskQueue};
use crate::session::ThemeSession;
use crate::site_policy::{hostname_of, ListSitePolicy, SitePolicy};

/// Work items the engine places on the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineTask {
    /// Next chunk of the running full-page scan (idle queue)
    FullScanChunk,
    /// Drain a batch of mutated elements (animation frame)
    MutationFrame,
    /// Continue an incremental scan that ran out of budget (animation frame)
    MutationScan,
    /// Apply plans deferred by an apply overrun (timeout)
    ApplyContinuation,
}

/// Engine statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    pub full_scans_started: u64,
    pub full_scans_completed: u64,
    pub full_scans_aborted: u64,
    pub elements_scanned: u64,
    pub plans_applied: u64,
    pub mutation_frames: u64,
    pub reverts: u64,
    pub apply_reschedules: u64,
    pub route_changes: u64,
    pub snapshots_pruned: u64,
}

/// The theming pipeline for one page
pub struct RetroEngine {
    config: EngineConfig,
    preferences: Preferences,
    session: ThemeSession,
    applier: PatchApplier,
    batcher: MutationBatcher<EngineTask>,
    scheduler: Scheduler<EngineTask>,
    clock: Box<dyn Clock>,
    site_policy: Box<dyn SitePolicy>,
    /// Site policy is rebuilt from preference lists on update
    policy_from_preferences: bool,
    site_allowed: bool,
    started: bool,
    full_scan: Option<FullScan>,
    full_scan_task: Option<TaskHandle>,
    mutation_scans: VecDeque<ScanCursor>,
    mutation_scan_task: Option<TaskHandle>,
    apply_task: Option<TaskHandle>,
    route_signal: RouteSignal,
    stats: EngineStats,
}

impl RetroEngine {
    /// Validate `config` and `preferences` and build an idle engine
    pub fn new(config: EngineConfig, preferences: Preferences) -> EngineResult<Self> {
        config.validate()?;
        preferences.validate()?;
        let session = ThemeSession::from_preferences(&preferences)?;
        let site_policy = ListSitePolicy::new(&preferences.site_allowlist, &preferences.site_blocklist);

        Ok(Self {
            batcher: MutationBatcher::new(config.batch_size, EngineTask::MutationFrame),
            config,
            preferences,
            session,
            applier: PatchApplier::new(),
            scheduler: Scheduler::new(),
            clock: Box::new(MonotonicClock::new()),
            site_policy: Box::new(site_policy),
            policy_from_preferences: true,
            site_allowed: true,
            started: false,
            full_scan: None,
            full_scan_task: None,
            mutation_scans: VecDeque::new(),
            mutation_scan_task: None,
            apply_task: None,
            route_signal: RouteSignal::new(),
            stats: EngineStats::default(),
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Use an external site decision instead of the preference lists
    pub fn with_site_policy(mut self, policy: impl SitePolicy + 'static) -> Self {
        self.site_policy = Box::new(policy);
        self.policy_from_preferences = false;
        self
    }

    /// Initial host color-scheme preference for `auto` mode
    pub fn with_prefers_dark(mut self, prefers_dark: bool) -> Self {
        self.session.set_prefers_dark(prefers_dark);
        self
    }

    /// Host without idle callbacks; full-scan chunks run as timeouts
    pub fn without_idle_callbacks(mut self) -> Self {
        self.scheduler = Scheduler::without_idle();
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn session(&self) -> &ThemeSession {
        &self.session
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn applier(&self) -> &PatchApplier {
        &self.applier
    }

    pub fn scheduler(&self) -> &Scheduler<EngineTask> {
        &self.scheduler
    }

    /// Signal to connect to a [`crate::NavigationObserver`]
    pub fn route_signal(&self) -> &RouteSignal {
        &self.route_signal
    }

    pub fn is_site_allowed(&self) -> bool {
        self.site_allowed
    }

    /// Enabled and allowed on the current site
    pub fn is_active(&self) -> bool {
        self.session.is_enabled() && self.site_allowed
    }

    pub fn is_scanning(&self) -> bool {
        self.full_scan.is_some()
    }

    /// Begin observing `doc` and, when active, start the first full scan
    pub fn start(&mut self, doc: &mut Document) {
        if self.started {
            return;
        }
        self.started = true;
        self.batcher.observe(&mut doc.tree);
        self.site_allowed = self.check_site(doc.url());
        tracing::info!(
            url = doc.url(),
            mode = ?self.session.mode(),
            intensity = self.session.intensity(),
            active = self.is_active(),
            "retro engine started"
        );
        if self.is_active() {
            self.begin_full_scan(doc);
        }
    }

    /// Stop observing and drop all scheduled work. Applied styles stay;
    /// call [`RetroEngine::revert_all`] first to remove them.
    pub fn dispose(&mut self, doc: &mut Document) {
        self.batcher.dispose(&mut doc.tree, &mut self.scheduler);
        self.scheduler.clear();
        self.full_scan = None;
        self.full_scan_task = None;
        self.mutation_scans.clear();
        self.mutation_scan_task = None;
        self.apply_task = None;
        self.started = false;
        tracing::debug!("retro engine disposed");
    }

    /// One event-loop turn: route changes, observer delivery, timeouts,
    /// animation frame, then at most one idle task. Returns whether work is
    /// still scheduled.
    pub fn tick(&mut self, doc: &mut Document) -> bool {
        if let Some(change) = self.route_signal.take() {
            self.on_route_change(doc, &change.url);
        }
        self.batcher.collect(&mut doc.tree, &mut self.scheduler);

        for task in self.scheduler.take_timeouts() {
            self.run_task(doc, task);
        }
        for task in self.scheduler.take_frame() {
            self.run_task(doc, task);
        }
        if let Some(task) = self.scheduler.next_idle() {
            self.run_task(doc, task);
        }
        self.scheduler.has_pending()
    }

    /// Tick until nothing is scheduled or `max_turns` is reached; returns the
    /// number of turns taken
    pub fn run_until_idle(&mut self, doc: &mut Document, max_turns: usize) -> usize {
        let mut turns = 0;
        while turns < max_turns {
            turns += 1;
            if !self.tick(doc) {
                break;
            }
        }
        turns
    }

    /// One budgeted scan pass over `root` with the session's tone and
    /// intensity. Nothing is written.
    pub fn scan(&self, doc: &Document, root: NodeId, options: &ScanOptions) -> ScanResult {
        let result = scanner::scan(
            &doc.tree,
            root,
            self.session.tone(),
            self.session.intensity(),
            options,
            self.clock.as_ref(),
        );
        tracing::debug!(
            processed = result.elements_processed,
            plans = result.plans.len(),
            has_more = result.has_more,
            "scan pass"
        );
        result
    }

    /// Apply `plans`; elements past the apply budget are applied by a later
    /// timeout task. Returns the count applied now.
    pub fn apply(&mut self, doc: &mut Document, plans: Vec<PatchPlan>) -> usize {
        self.apply_plans(&mut doc.tree, plans, &[])
    }

    /// Undo every applied style and strip the root theme. Idempotent.
    pub fn revert_all(&mut self, doc: &mut Document) {
        self.full_scan = None;
        self.mutation_scans.clear();
        if let Some(task) = self.full_scan_task.take() {
            self.scheduler.cancel(task);
        }
        if let Some(task) = self.mutation_scan_task.take() {
            self.scheduler.cancel(task);
        }
        if let Some(task) = self.apply_task.take() {
            self.scheduler.cancel(task);
        }

        let root = doc.document_element();
        let tree = &mut doc.tree;
        self.batcher.collect(tree, &mut self.scheduler);
        self.applier.revert_all(tree, &mut self.session, root, &self.config);
        self.batcher.discard(tree);
        self.stats.reverts += 1;
    }

    /// Take over new preferences. Disabling reverts, enabling scans, and a
    /// change of tone or intensity reverts and then rescans so snapshots keep
    /// holding the page's own values.
    pub fn update_preferences(&mut self, doc: &mut Document, preferences: Preferences) -> EngineResult<()> {
        preferences.validate()?;
        let was_active = self.is_active();
        let before = (self.session.tone(), self.session.intensity());

        self.session.set_intensity(preferences.intensity)?;
        self.session.set_mode(preferences.mode);
        self.session.set_enabled(preferences.enabled);
        if self.policy_from_preferences {
            self.site_policy = Box::new(ListSitePolicy::new(
                &preferences.site_allowlist,
                &preferences.site_blocklist,
            ));
        }
        self.preferences = preferences;
        self.site_allowed = self.check_site(doc.url());

        let changed = before != (self.session.tone(), self.session.intensity());
        self.reconcile(doc, was_active, changed);
        Ok(())
    }

    /// Host color-scheme preference, consulted in `auto` mode
    pub fn set_prefers_dark(&mut self, doc: &mut Document, prefers_dark: bool) {
        let was_active = self.is_active();
        let before = self.session.tone();
        self.session.set_prefers_dark(prefers_dark);
        let changed = before != self.session.tone();
        self.reconcile(doc, was_active, changed);
    }

    /// Route changed: recheck the site and run a fresh full scan. A relative
    /// `url` is taken relative to the current document URL.
    pub fn on_route_change(&mut self, doc: &mut Document, url: &str) {
        self.stats.route_changes += 1;
        let was_active = self.is_active();
        let url = resolve_url(doc.url(), url);
        doc.set_url(&url);
        self.site_allowed = self.check_site(&url);
        tracing::info!(url = %url, allowed = self.site_allowed, "route changed");

        if !self.started {
            return;
        }
        if was_active && !self.is_active() {
            self.revert_all(doc);
        } else if self.is_active() {
            self.begin_full_scan(doc);
        }
    }

    fn reconcile(&mut self, doc: &mut Document, was_active: bool, changed: bool) {
        if !self.started {
            return;
        }
        match (was_active, self.is_active()) {
            (true, false) => self.revert_all(doc),
            (false, true) => self.begin_full_scan(doc),
            (true, true) if changed => {
                self.revert_all(doc);
                self.begin_full_scan(doc);
            }
            _ => {}
        }
    }

    fn check_site(&self, url: &str) -> bool {
        let host = hostname_of(url);
        let allowed = self.site_policy.is_site_allowed(&host);
        if !allowed {
            tracing::info!(host = %host, "site blocked; theme inactive");
        }
        allowed
    }

    fn begin_full_scan(&mut self, doc: &mut Document) {
        if let Some(root) = doc.document_element() {
            let tree = &mut doc.tree;
            self.batcher.collect(tree, &mut self.scheduler);
            self.session.apply_root(tree, root);
            self.batcher.discard(tree);
        }

        let restarted = self.full_scan.is_some();
        self.full_scan = Some(FullScan::new(
            NodeId::ROOT,
            self.clock.now_ms(),
            self.config.full_scan_ceiling_ms(),
        ));
        self.stats.full_scans_started += 1;
        tracing::debug!(restarted, "full scan started");
        self.schedule_chunk();
    }

    /// At most one chunk task is queued at a time
    fn schedule_chunk(&mut self) {
        if self.full_scan_task.is_some() {
            return;
        }
        let (handle, queue) = self.scheduler.request_idle_callback(EngineTask::FullScanChunk);
        self.full_scan_task = Some(handle);
        if queue == TaskQueue::Timeout {
            tracing::trace!("idle callbacks unavailable; chunk queued as timeout");
        }
    }

    fn run_task(&mut self, doc: &mut Document, task: EngineTask) {
        match task {
            EngineTask::FullScanChunk => {
                self.full_scan_task = None;
                self.run_full_scan_chunk(doc);
            }
            EngineTask::MutationFrame => self.run_mutation_frame(doc),
            EngineTask::MutationScan => {
                self.mutation_scan_task = None;
                self.run_mutation_scan(doc);
            }
            EngineTask::ApplyContinuation => {
                self.apply_task = None;
                self.resume_apply(&mut doc.tree);
            }
        }
    }

    fn run_full_scan_chunk(&mut self, doc: &mut Document) {
        let Some(mut full_scan) = self.full_scan.take() else {
            return;
        };
        let options = ScanOptions::from_config(&self.config);
        let chunk = full_scan.run_chunk(
            &doc.tree,
            self.session.tone(),
            self.session.intensity(),
            &options,
            self.config.scan_budget_ms,
            self.clock.as_ref(),
        );
        self.stats.elements_scanned += chunk.elements_processed as u64;
        self.apply_plans(&mut doc.tree, chunk.plans, &chunk.unchanged);

        match chunk.status {
            FullScanStatus::Running => {
                self.full_scan = Some(full_scan);
                self.schedule_chunk();
            }
            FullScanStatus::Completed => {
                self.stats.full_scans_completed += 1;
                tracing::info!(
                    elements = full_scan.elements_processed(),
                    chunks = full_scan.chunks(),
                    "full scan complete"
                );
            }
            FullScanStatus::Aborted => self.stats.full_scans_aborted += 1,
        }
    }

    fn run_mutation_frame(&mut self, doc: &mut Document) {
        let batch = self.batcher.run_frame(&doc.tree, &mut self.scheduler);
        if self.batcher.take_removals() {
            self.prune_detached(&mut doc.tree);
        }
        if batch.is_empty() || !self.is_active() {
            return;
        }
        self.stats.mutation_frames += 1;

        // Elements themed earlier are restored first so the rescan reads the
        // page's current values and snapshots stay true originals.
        let tree = &mut doc.tree;
        self.batcher.collect(tree, &mut self.scheduler);
        for &element in &batch {
            self.applier.revert_element(tree, element, &self.config);
        }
        self.batcher.discard(tree);

        self.mutation_scans.push_back(ScanCursor::over(batch));
        self.run_mutation_scan(doc);
    }

    fn run_mutation_scan(&mut self, doc: &mut Document) {
        if !self.is_active() {
            self.mutation_scans.clear();
            return;
        }
        let options = ScanOptions::from_config(&self.config);
        let clock = self.clock.as_ref();
        let Some(cursor) = self.mutation_scans.front_mut() else {
            return;
        };
        let step = cursor.step(&doc.tree, self.session.tone(), self.session.intensity(), &options, clock);
        if step.done {
            self.mutation_scans.pop_front();
        }
        self.stats.elements_scanned += step.elements_processed as u64;
        self.apply_plans(&mut doc.tree, step.plans, &step.unchanged);

        if !self.mutation_scans.is_empty() && self.mutation_scan_task.is_none() {
            self.mutation_scan_task = Some(self.scheduler.request_animation_frame(EngineTask::MutationScan));
        }
    }

    fn prune_detached(&mut self, tree: &mut DomTree) {
        self.batcher.collect(tree, &mut self.scheduler);
        let pruned = self.applier.prune_detached(tree, &self.config);
        self.batcher.discard(tree);
        self.stats.snapshots_pruned += pruned as u64;
    }

    /// The only path through which the engine writes theme styles
    fn apply_plans(&mut self, tree: &mut DomTree, plans: Vec<PatchPlan>, unchanged: &[NodeId]) -> usize {
        if plans.is_empty() && unchanged.is_empty() {
            return 0;
        }
        self.batcher.collect(tree, &mut self.scheduler);
        let outcome = self
            .applier
            .apply(tree, &self.session, plans, &self.config, self.clock.as_ref());
        if self.session.is_enabled() {
            self.applier.mark_processed(tree, unchanged, &self.config);
        }
        self.batcher.discard(tree);

        self.stats.plans_applied += outcome.applied as u64;
        if outcome.needs_continuation() {
            self.schedule_apply_continuation();
        }
        outcome.applied
    }

    fn resume_apply(&mut self, tree: &mut DomTree) {
        self.batcher.collect(tree, &mut self.scheduler);
        let outcome = self
            .applier
            .resume(tree, &self.session, &self.config, self.clock.as_ref());
        self.batcher.discard(tree);

        self.stats.plans_applied += outcome.applied as u64;
        if outcome.needs_continuation() {
            self.schedule_apply_continuation();
        }
    }

    fn schedule_apply_continuation(&mut self) {
        if self.apply_task.is_none() {
            self.stats.apply_reschedules += 1;
            self.apply_task = Some(self.scheduler.set_timeout(EngineTask::ApplyContinuation));
        }
    }
}

impl std::fmt::Debug for RetroEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetroEngine")
            .field("session", &self.session)
            .field("site_allowed", &self.site_allowed)
            .field("started", &self.started)
            .field("scanning", &self.full_scan.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}
