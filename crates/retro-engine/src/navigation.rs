//! Navigation Hook
//!
//! SPA navigation surfaces as one "route changed" signal. [`HistoryHook`] is
//! the adapter that wraps the session history: `push_state` and
//! `replace_state` delegate first and then emit, and traversal (back,
//! forward, go) emits the popstate equivalent. Everything else only sees the
//! [`NavigationObserver`] registration.
//!
//! URLs handed to `push_state`/`replace_state` may be relative, as SPA
//! routers usually pass them; history records them resolved.

use std::cell::RefCell;
use std::rc::Rc;

use url::Url;

/// What caused the route change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    Push,
    Replace,
    Pop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChange {
    pub kind: NavigationKind,
    pub url: String,
}

pub type RouteCallback = Box<dyn FnMut(&RouteChange)>;

/// Single registration point for route changes
pub trait NavigationObserver {
    fn on_route_change(&mut self, callback: RouteCallback);
}

/// History entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    pub state: Option<String>,
}

/// Session history
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: Vec<HistoryEntry>,
    current: usize,
}

impl HistoryManager {
    pub fn new(initial_url: &str) -> Self {
        Self {
            entries: vec![HistoryEntry {
                url: initial_url.to_string(),
                title: String::new(),
                state: None,
            }],
            current: 0,
        }
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.current]
    }

    /// Push a new entry, dropping forward history
    pub fn push_state(&mut self, state: Option<String>, title: &str, url: &str) {
        let url = resolve_url(&self.current().url, url);
        self.entries.truncate(self.current + 1);
        self.entries.push(HistoryEntry {
            url,
            title: title.to_string(),
            state,
        });
        self.current = self.entries.len() - 1;
    }

    pub fn replace_state(&mut self, state: Option<String>, title: &str, url: &str) {
        let url = resolve_url(&self.current().url, url);
        self.entries[self.current] = HistoryEntry {
            url,
            title: title.to_string(),
            state,
        };
    }

    /// Move by `delta`; false when the target is out of range
    pub fn go(&mut self, delta: i32) -> bool {
        let target = self.current as i64 + delta as i64;
        if delta == 0 || target < 0 || target >= self.entries.len() as i64 {
            return false;
        }
        self.current = target as usize;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `url` resolved against `base`. Absolute URLs come back normalized; when
/// neither can be resolved (no absolute base), `url` is returned as given.
pub fn resolve_url(base: &str, url: &str) -> String {
    Url::parse(url)
        .or_else(|_| Url::parse(base).and_then(|base| base.join(url)))
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}

/// History wrapper that reports every navigation to its observers
pub struct HistoryHook {
    history: HistoryManager,
    callbacks: Vec<RouteCallback>,
}

impl HistoryHook {
    pub fn new(initial_url: &str) -> Self {
        Self {
            history: HistoryManager::new(initial_url),
            callbacks: Vec::new(),
        }
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn current_url(&self) -> &str {
        &self.history.current().url
    }

    pub fn push_state(&mut self, state: Option<String>, title: &str, url: &str) {
        self.history.push_state(state, title, url);
        self.emit(NavigationKind::Push);
    }

    pub fn replace_state(&mut self, state: Option<String>, title: &str, url: &str) {
        self.history.replace_state(state, title, url);
        self.emit(NavigationKind::Replace);
    }

    pub fn back(&mut self) {
        self.go(-1);
    }

    pub fn forward(&mut self) {
        self.go(1);
    }

    /// Traverse history; emits only when the position actually moves
    pub fn go(&mut self, delta: i32) {
        if self.history.go(delta) {
            self.emit(NavigationKind::Pop);
        }
    }

    fn emit(&mut self, kind: NavigationKind) {
        let change = RouteChange { kind, url: self.current_url().to_string() };
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }
}

impl NavigationObserver for HistoryHook {
    fn on_route_change(&mut self, callback: RouteCallback) {
        self.callbacks.push(callback);
    }
}

/// Shared latch the engine polls for route changes. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RouteSignal {
    latest: Rc<RefCell<Option<RouteChange>>>,
}

impl RouteSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change; several changes before the next poll collapse into
    /// the latest one
    pub fn notify(&self, change: &RouteChange) {
        *self.latest.borrow_mut() = Some(change.clone());
    }

    pub fn take(&self) -> Option<RouteChange> {
        self.latest.borrow_mut().take()
    }

    /// Callback suitable for [`NavigationObserver::on_route_change`]
    pub fn callback(&self) -> RouteCallback {
        let signal = self.clone();
        Box::new(move |change| signal.notify(change))
    }

    /// Register this signal with `observer`
    pub fn connect(&self, observer: &mut dyn NavigationObserver) {
        observer.on_route_change(self.callback());
    }
}
