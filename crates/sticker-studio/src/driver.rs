//! Frame-loop driver.
//!
//! The host owns the actual timer (a display refresh, an interval, a test
//! harness). The loop only tracks which tick request is outstanding: a tick
//! whose handle does not match is stale and must not run, so once
//! [`FrameLoop::stop`] returns no further tick is honoured.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

/// Host capability for scheduling ticks.
pub trait TickScheduler {
    fn request_tick(&mut self) -> TickHandle;
    fn cancel_tick(&mut self, handle: TickHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running { pending: TickHandle },
}

#[derive(Debug, Clone)]
pub struct FrameLoop {
    state: LoopState,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Stopped,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running { .. })
    }

    /// Transition to running and schedule the first tick. Returns false if
    /// already running.
    pub fn start(&mut self, host: &mut dyn TickScheduler) -> bool {
        if self.is_running() {
            return false;
        }
        let pending = host.request_tick();
        self.state = LoopState::Running { pending };
        true
    }

    /// Transition to stopped and cancel the outstanding tick. Returns false
    /// if already stopped.
    pub fn stop(&mut self, host: &mut dyn TickScheduler) -> bool {
        match self.state {
            LoopState::Running { pending } => {
                host.cancel_tick(pending);
                self.state = LoopState::Stopped;
                true
            }
            LoopState::Stopped => false,
        }
    }

    /// Called when a tick fires. Returns true (and schedules the next tick)
    /// only for the outstanding handle.
    pub fn accept_tick(&mut self, handle: TickHandle, host: &mut dyn TickScheduler) -> bool {
        match self.state {
            LoopState::Running { pending } if pending == handle => {
                let pending = host.request_tick();
                self.state = LoopState::Running { pending };
                true
            }
            _ => {
                tracing::trace!("ignoring stale tick {:?}", handle);
                false
            }
        }
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// A tick host that queues requests for the caller to fire explicitly.
/// Useful for headless drivers and tests.
#[derive(Debug, Clone, Default)]
pub struct TickQueue {
    next: u64,
    pending: VecDeque<TickHandle>,
}

impl TickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next due tick, if any.
    pub fn pop(&mut self) -> Option<TickHandle> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl TickScheduler for TickQueue {
    fn request_tick(&mut self) -> TickHandle {
        self.next += 1;
        let handle = TickHandle(self.next);
        self.pending.push_back(handle);
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        self.pending.retain(|h| *h != handle);
    }
}
