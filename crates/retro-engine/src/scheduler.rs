//! Cooperative Scheduling
//!
//! Explicit event-loop queues standing in for `requestAnimationFrame`,
//! `requestIdleCallback` and `setTimeout(0)`. Nothing runs on its own: the
//! host drains each queue at the matching point of its loop turn.

use std::collections::VecDeque;

/// Handle returned by every request, usable for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// Queue a task was placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskQueue {
    AnimationFrame,
    Idle,
    Timeout,
}

/// Scheduler statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerStats {
    pub frames_requested: u64,
    pub idle_requested: u64,
    pub timeouts_requested: u64,
    /// Idle requests redirected to the timeout queue
    pub idle_fallbacks: u64,
}

/// Single-threaded task queues
#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    frame: VecDeque<(TaskHandle, T)>,
    idle: VecDeque<(TaskHandle, T)>,
    timeouts: VecDeque<(TaskHandle, T)>,
    idle_supported: bool,
    stats: SchedulerStats,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            frame: VecDeque::new(),
            idle: VecDeque::new(),
            timeouts: VecDeque::new(),
            idle_supported: true,
            stats: SchedulerStats::default(),
        }
    }

    /// A host without idle callbacks; idle work goes to the timeout queue
    pub fn without_idle() -> Self {
        Self { idle_supported: false, ..Self::new() }
    }

    pub fn idle_supported(&self) -> bool {
        self.idle_supported
    }

    fn handle(&mut self) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        handle
    }

    pub fn request_animation_frame(&mut self, task: T) -> TaskHandle {
        let handle = self.handle();
        self.frame.push_back((handle, task));
        self.stats.frames_requested += 1;
        handle
    }

    /// Queue idle work, falling back to a timeout when idle callbacks are
    /// unavailable
    pub fn request_idle_callback(&mut self, task: T) -> (TaskHandle, TaskQueue) {
        if !self.idle_supported {
            tracing::trace!("idle callbacks unavailable; using timeout queue");
            self.stats.idle_fallbacks += 1;
            return (self.set_timeout(task), TaskQueue::Timeout);
        }
        let handle = self.handle();
        self.idle.push_back((handle, task));
        self.stats.idle_requested += 1;
        (handle, TaskQueue::Idle)
    }

    pub fn set_timeout(&mut self, task: T) -> TaskHandle {
        let handle = self.handle();
        self.timeouts.push_back((handle, task));
        self.stats.timeouts_requested += 1;
        handle
    }

    /// Cancel a queued task; false if it already ran or never existed
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        for queue in [&mut self.frame, &mut self.idle, &mut self.timeouts] {
            if let Some(pos) = queue.iter().position(|(h, _)| *h == handle) {
                queue.remove(pos);
                return true;
            }
        }
        false
    }

    /// Take every animation-frame callback queued so far. Callbacks
    /// requested while these run wait for the next frame.
    pub fn take_frame(&mut self) -> Vec<T> {
        self.frame.drain(..).map(|(_, t)| t).collect()
    }

    /// Take the timeouts queued so far
    pub fn take_timeouts(&mut self) -> Vec<T> {
        self.timeouts.drain(..).map(|(_, t)| t).collect()
    }

    /// Take the oldest idle callback
    pub fn next_idle(&mut self) -> Option<T> {
        self.idle.pop_front().map(|(_, t)| t)
    }

    pub fn has_pending(&self) -> bool {
        !self.frame.is_empty() || !self.idle.is_empty() || !self.timeouts.is_empty()
    }

    pub fn pending(&self, queue: TaskQueue) -> usize {
        match queue {
            TaskQueue::AnimationFrame => self.frame.len(),
            TaskQueue::Idle => self.idle.len(),
            TaskQueue::Timeout => self.timeouts.len(),
        }
    }

    /// Drop every queued task
    pub fn clear(&mut self) {
        self.frame.clear();
        self.idle.clear();
        self.timeouts.clear();
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }
}
