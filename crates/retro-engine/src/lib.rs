//! Retroshade Engine
//!
//! The theming pipeline: scan the document for color-bearing properties, map
//! them onto the retro palette, apply the result as `!important` inline
//! styles with exact snapshots, and revert on demand.
//!
//! Everything runs on one thread. Work that could block (full-page scans,
//! mutation batches, apply overruns) is split into tasks on an explicit
//! [`Scheduler`] that the host drains through [`RetroEngine::tick`].
//!
//! # Example
//! ```
//! use retro_dom::Document;
//! use retro_engine::{EngineConfig, Preferences, RetroEngine};
//!
//! let mut doc = Document::new("https://example.com/");
//! let mut engine = RetroEngine::new(EngineConfig::default(), Preferences::default()).unwrap();
//! engine.start(&mut doc);
//! engine.run_until_idle(&mut doc, 100);
//! engine.revert_all(&mut doc);
//! ```

mod applier;
mod batcher;
mod clock;
mod config;
mod engine;
mod error;
mod full_scan;
mod navigation;
mod scanner;
mod scheduler;
mod session;
mod site_policy;

pub use applier::{ApplierStats, ApplyOutcome, OriginalValue, PatchApplier, Snapshot, SnapshotStore};
pub use batcher::{BatcherState, MutationBatcher, OBSERVED_ATTRIBUTES};
pub use clock::{Budget, Clock, ManualClock, MonotonicClock, SteppingClock};
pub use config::{EngineConfig, Preferences, ThemeMode};
pub use engine::{EngineStats, EngineTask, RetroEngine};
pub use error::{EngineError, EngineResult};
pub use full_scan::{ChunkResult, FullScan, FullScanStatus};
pub use navigation::{
    HistoryEntry, HistoryHook, HistoryManager, NavigationKind, NavigationObserver, RouteCallback,
    RouteChange, RouteSignal, resolve_url,
};
pub use scanner::{
    scan, PatchPlan, ScanCursor, ScanOptions, ScanResult, StepResult, COLOR_PROPERTIES,
    NON_VISUAL_TAGS,
};
pub use scheduler::{Scheduler, SchedulerStats, TaskHandle, TaskQueue};
pub use session::{ThemeSession, ROOT_CLASS_PREFIX, ROOT_INTENSITY_ATTRIBUTE, ROOT_MODE_ATTRIBUTE};
pub use site_policy::{hostname_of, AllowAll, ListSitePolicy, SitePolicy};
