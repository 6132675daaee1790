//! Tree Scanner
//!
//! Filtered pre-order walk that turns elements into [`PatchPlan`]s. A pass
//! stops as soon as its time budget or element cap is reached and reports
//! `has_more`, so the caller can resume in a later frame through
//! [`ScanCursor`].

use std::collections::{HashSet, VecDeque};

use retro_color::{ensure_contrast, map_color, parse_color, Tone};
use retro_dom::{DomTree, FilterResult, NodeFilter, NodeId, TreeWalker};

use crate::clock::{Budget, Clock};
use crate::config::EngineConfig;

/// Color-bearing properties read for every element, in plan order
pub const COLOR_PROPERTIES: [&str; 8] = [
    "color",
    "background-color",
    "border-top-color",
    "border-right-color",
    "border-bottom-color",
    "border-left-color",
    "outline-color",
    "text-decoration-color",
];

/// Tags that are never themed; their subtrees are pruned
pub const NON_VISUAL_TAGS: &[&str] = &[
    "script", "style", "link", "meta", "head", "title", "base", "noscript", "template",
    "svg", "math", "canvas", "video", "audio", "img", "picture", "source", "track",
    "iframe", "object", "embed", "br", "wbr",
];

/// Per-element set of property changes
#[derive(Debug, Clone, PartialEq)]
pub struct PatchPlan {
    pub element: NodeId,
    /// `(property, new value)` in [`COLOR_PROPERTIES`] order
    pub styles: Vec<(String, String)>,
}

impl PatchPlan {
    pub fn new(element: NodeId) -> Self {
        Self { element, styles: Vec::new() }
    }

    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.styles.push((property.to_string(), value.to_string()));
        self
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// Scan pass options
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    /// Stop after this many processed elements
    pub max_elements: Option<usize>,
    /// Prune elements already carrying the processed marker
    pub skip_processed: bool,
    /// Skip invisible elements but keep walking into their children
    pub visible_only: bool,
    pub budget_ms: f64,
    pub processed_attribute: String,
    /// Marker of patched elements; values inherited from them are already
    /// themed
    pub applied_attribute: String,
    /// Contrast target for text color repair; `None` disables repair
    pub contrast_target: Option<f64>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ScanOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_elements: None,
            skip_processed: true,
            visible_only: config.visible_only,
            budget_ms: config.scan_budget_ms,
            processed_attribute: config.processed_attribute.clone(),
            applied_attribute: config.applied_attribute.clone(),
            contrast_target: config.repair_contrast.then_some(config.contrast_target),
        }
    }
}

/// Result of a single bounded pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    pub plans: Vec<PatchPlan>,
    pub elements_processed: usize,
    pub has_more: bool,
}

/// Result of one [`ScanCursor::step`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResult {
    /// Plans produced by this step
    pub plans: Vec<PatchPlan>,
    pub elements_processed: usize,
    /// Processed elements that needed no change
    pub unchanged: Vec<NodeId>,
    /// The cursor has nothing left to visit
    pub done: bool,
}

/// Scan one subtree under a budget
pub fn scan(
    tree: &DomTree,
    root: NodeId,
    tone: Tone,
    intensity: f64,
    options: &ScanOptions,
    clock: &dyn Clock,
) -> ScanResult {
    let mut cursor = ScanCursor::new(root);
    let step = cursor.step(tree, tone, intensity, options, clock);
    ScanResult {
        plans: step.plans,
        elements_processed: step.elements_processed,
        has_more: !step.done,
    }
}

/// Rejects non-visual tags, already visited elements and, when asked,
/// processed elements
struct ScanFilter<'a> {
    options: &'a ScanOptions,
    visited: &'a HashSet<NodeId>,
}

impl NodeFilter for ScanFilter<'_> {
    fn accept_node(&self, tree: &DomTree, node: NodeId) -> FilterResult {
        let Some(el) = tree.element(node) else {
            return FilterResult::Reject;
        };
        if NON_VISUAL_TAGS.iter().any(|t| *t == el.tag) {
            return FilterResult::Reject;
        }
        if self.visited.contains(&node) {
            return FilterResult::Reject;
        }
        if self.options.skip_processed && el.attr(&self.options.processed_attribute).is_some() {
            return FilterResult::Reject;
        }
        FilterResult::Accept
    }
}

/// Resumable scan over one or more subtree roots.
///
/// Each root is considered itself (when it is an element) and then walked.
/// A per-pass visited set keeps every element to a single visit even if the
/// tree is rearranged between steps.
#[derive(Debug, Clone)]
pub struct ScanCursor {
    roots: VecDeque<NodeId>,
    walker: Option<TreeWalker>,
    visited: HashSet<NodeId>,
    total_processed: usize,
}

impl ScanCursor {
    pub fn new(root: NodeId) -> Self {
        Self::over([root])
    }

    pub fn over(roots: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
            walker: None,
            visited: HashSet::new(),
            total_processed: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.walker.is_none() && self.roots.is_empty()
    }

    /// Elements processed across every step so far
    pub fn total_processed(&self) -> usize {
        self.total_processed
    }

    /// Advance until the subtree is exhausted, the budget is spent, or
    /// `max_elements` have been processed. Time is checked after every element.
    pub fn step(
        &mut self,
        tree: &DomTree,
        tone: Tone,
        intensity: f64,
        options: &ScanOptions,
        clock: &dyn Clock,
    ) -> StepResult {
        let budget = Budget::start(clock, options.budget_ms);
        let mut result = StepResult::default();

        loop {
            if options.max_elements.is_some_and(|max| result.elements_processed >= max) {
                break;
            }
            let Some(element) = self.next_element(tree, options) else {
                break;
            };
            self.visited.insert(element);

            if !options.visible_only || tree.is_visible(element) {
                result.elements_processed += 1;
                let plan = build_plan(tree, element, tone, intensity, options);
                if plan.is_empty() {
                    result.unchanged.push(element);
                } else {
                    result.plans.push(plan);
                }
            }

            if budget.exhausted() {
                break;
            }
        }

        self.total_processed += result.elements_processed;
        result.done = self.is_done();
        tracing::trace!(
            processed = result.elements_processed,
            plans = result.plans.len(),
            done = result.done,
            "scan step"
        );
        result
    }

    fn next_element(&mut self, tree: &DomTree, options: &ScanOptions) -> Option<NodeId> {
        loop {
            if let Some(walker) = self.walker.as_mut() {
                let filter = ScanFilter { options, visited: &self.visited };
                if let Some(next) = walker.next_node(tree, &filter) {
                    return Some(next);
                }
                self.walker = None;
            }

            let root = self.roots.pop_front()?;
            if tree.get(root).is_none() {
                continue;
            }
            let root_result = if tree.is_element(root) {
                ScanFilter { options, visited: &self.visited }.accept_node(tree, root)
            } else {
                FilterResult::Skip
            };
            match root_result {
                FilterResult::Reject => continue,
                FilterResult::Skip => self.walker = Some(TreeWalker::new(root)),
                FilterResult::Accept => {
                    self.walker = Some(TreeWalker::new(root));
                    return Some(root);
                }
            }
        }
    }
}

/// Map every color property; keep only values that change
fn build_plan(tree: &DomTree, element: NodeId, tone: Tone, intensity: f64, options: &ScanOptions) -> PatchPlan {
    let mut plan = PatchPlan::new(element);
    for property in COLOR_PROPERTIES {
        if inherits_theme(tree, element, property, options) {
            continue;
        }
        let Some(original) = tree.computed_value(element, property) else {
            continue;
        };
        if let Some(mapped) = map_color(&original, tone, intensity) {
            if mapped != original {
                plan.styles.push((property.to_string(), mapped));
            }
        }
    }

    if let Some(target) = options.contrast_target {
        repair_text_contrast(tree, &mut plan, tone, intensity, target);
    }
    plan
}

/// The computed value comes from an ancestor that already carries the theme
fn inherits_theme(tree: &DomTree, element: NodeId, property: &str, options: &ScanOptions) -> bool {
    tree.computed_origin(element, property)
        .is_some_and(|origin| origin != element && tree.has_attribute(origin, &options.applied_attribute))
}

/// Push the planned (or original) text color to `target` against the
/// element's effective mapped background
fn repair_text_contrast(tree: &DomTree, plan: &mut PatchPlan, tone: Tone, intensity: f64, target: f64) {
    let Some(original) = tree.computed_value(plan.element, "color") else {
        return;
    };
    let fg = plan.get("color").map(str::to_string).unwrap_or_else(|| original.clone());
    let Some(bg) = plan
        .get("background-color")
        .map(str::to_string)
        .or_else(|| effective_background(tree, plan.element, tone, intensity))
    else {
        return;
    };

    let repaired = ensure_contrast(&fg, &bg, target);
    if repaired == fg {
        return;
    }
    match plan.styles.iter_mut().find(|(p, _)| p == "color") {
        Some(entry) => entry.1 = repaired,
        None => plan.styles.insert(0, ("color".to_string(), repaired)),
    }
}

/// Mapped color of the nearest opaque background, starting at `element`
fn effective_background(tree: &DomTree, element: NodeId, tone: Tone, intensity: f64) -> Option<String> {
    let mut current = Some(element);
    while let Some(id) = current.filter(|id| tree.is_element(*id)) {
        if let Some(value) = tree.computed_value(id, "background-color") {
            if parse_color(&value).is_some_and(|c| !c.is_transparent()) {
                return Some(map_color(&value, tone, intensity).unwrap_or(value));
            }
        }
        current = tree.parent(id);
    }
    None
}
