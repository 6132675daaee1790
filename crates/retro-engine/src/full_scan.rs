//! Full-Page Scan
//!
//! Spreads a whole-document scan over idle callbacks. Each chunk is one
//! budgeted scan step; the pass as a whole stops at a ceiling of
//! `scan_budget_ms * full_scan_ceiling_multiplier`, measured from the start
//! of the pass, and reports what it covered (abort-and-report, no retry).

use retro_color::Tone;
use retro_dom::{DomTree, NodeId};

use crate::clock::Clock;
use crate::scanner::{PatchPlan, ScanCursor, ScanOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullScanStatus {
    /// More chunks are needed
    Running,
    Completed,
    /// Ceiling reached before the document was covered
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    pub plans: Vec<PatchPlan>,
    pub elements_processed: usize,
    /// Processed elements that needed no change
    pub unchanged: Vec<NodeId>,
    pub status: FullScanStatus,
}

/// One full-document pass in progress
#[derive(Debug, Clone)]
pub struct FullScan {
    cursor: ScanCursor,
    started_ms: f64,
    ceiling_ms: f64,
    chunks: usize,
}

impl FullScan {
    pub fn new(root: NodeId, started_ms: f64, ceiling_ms: f64) -> Self {
        Self {
            cursor: ScanCursor::new(root),
            started_ms,
            ceiling_ms,
            chunks: 0,
        }
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn elements_processed(&self) -> usize {
        self.cursor.total_processed()
    }

    /// Run one chunk of at most `chunk_budget_ms`
    pub fn run_chunk(
        &mut self,
        tree: &DomTree,
        tone: Tone,
        intensity: f64,
        options: &ScanOptions,
        chunk_budget_ms: f64,
        clock: &dyn Clock,
    ) -> ChunkResult {
        let elapsed = clock.now_ms() - self.started_ms;
        if elapsed >= self.ceiling_ms {
            tracing::warn!(
                elapsed_ms = elapsed,
                ceiling_ms = self.ceiling_ms,
                chunks = self.chunks,
                processed = self.cursor.total_processed(),
                "full scan ceiling reached; aborting"
            );
            return ChunkResult {
                plans: Vec::new(),
                elements_processed: 0,
                unchanged: Vec::new(),
                status: FullScanStatus::Aborted,
            };
        }

        let options = ScanOptions {
            budget_ms: chunk_budget_ms.min(self.ceiling_ms - elapsed),
            ..options.clone()
        };
        let step = self.cursor.step(tree, tone, intensity, &options, clock);
        self.chunks += 1;

        let status = if step.done {
            tracing::debug!(
                chunks = self.chunks,
                processed = self.cursor.total_processed(),
                "full scan complete"
            );
            FullScanStatus::Completed
        } else {
            FullScanStatus::Running
        };
        ChunkResult {
            plans: step.plans,
            elements_processed: step.elements_processed,
            unchanged: step.unchanged,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, SteppingClock};

    fn wide_tree(children: usize) -> DomTree {
        let mut tree = DomTree::new();
        let body = tree.create_element("body");
        tree.append_child(NodeId::ROOT, body).unwrap();
        for _ in 0..children {
            let div = tree.create_element("div");
            tree.append_child(body, div).unwrap();
        }
        tree
    }

    #[test]
    fn test_completes_in_one_chunk_with_frozen_clock() {
        let tree = wide_tree(20);
        let clock = ManualClock::new();
        let mut scan = FullScan::new(NodeId::ROOT, 0.0, 500.0);
        let chunk = scan.run_chunk(&tree, Tone::Light, 1.0, &ScanOptions::default(), 50.0, &clock);
        assert_eq!(chunk.status, FullScanStatus::Completed);
        assert_eq!(chunk.elements_processed, 21);
        assert_eq!(scan.chunks(), 1);
    }

    #[test]
    fn test_chunks_then_aborts_at_ceiling() {
        let tree = wide_tree(1_000);
        // one millisecond per clock read
        let clock = SteppingClock::new(1.0);
        let mut scan = FullScan::new(NodeId::ROOT, clock.peek(), 30.0);
        let options = ScanOptions::default();

        let mut statuses = Vec::new();
        loop {
            let chunk = scan.run_chunk(&tree, Tone::Light, 1.0, &options, 10.0, &clock);
            statuses.push(chunk.status);
            if chunk.status != FullScanStatus::Running {
                break;
            }
        }
        assert!(statuses.len() > 1);
        assert_eq!(statuses.last(), Some(&FullScanStatus::Aborted));
        assert!(scan.elements_processed() < 1_001);
    }
}
