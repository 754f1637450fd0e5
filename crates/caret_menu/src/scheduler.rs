//! Deferred task queue
//!
//! Work the controller must not do inline (re-checking visibility after a
//! focus change, handing focus to the overlay after it shows) is queued here
//! and run when the host ticks the matching [`TaskPhase`].
//!
//! Every task is stamped with the queue's epoch when scheduled. Advancing
//! the epoch invalidates everything already queued: stale tasks are dropped
//! when their phase runs instead of acting on a torn-down controller.

use std::collections::VecDeque;

use caret_core::TaskPhase;

/// Generation stamp tied to a controller lifetime
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Epoch(u64);

struct Scheduled<T> {
    epoch: Epoch,
    task: T,
}

/// Two-phase queue of deferred tasks
pub struct DeferredQueue<T> {
    macrotasks: VecDeque<Scheduled<T>>,
    frames: VecDeque<Scheduled<T>>,
    epoch: Epoch,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self {
            macrotasks: VecDeque::new(),
            frames: VecDeque::new(),
            epoch: Epoch::default(),
        }
    }

    /// Invalidate every task scheduled so far
    pub fn advance_epoch(&mut self) {
        self.epoch = Epoch(self.epoch.0 + 1);
    }

    /// Queue a task for `phase`
    pub fn schedule(&mut self, phase: TaskPhase, task: T) {
        let epoch = self.epoch;
        self.order_mut(phase).push_back(Scheduled { epoch, task });
    }

    /// Take every live task queued for `phase`, in scheduling order
    ///
    /// Tasks scheduled while the returned batch runs land in the next batch.
    /// Tasks from an earlier epoch are discarded.
    pub fn take_due(&mut self, phase: TaskPhase) -> Vec<T> {
        let epoch = self.epoch;
        let order = std::mem::take(self.order_mut(phase));
        let mut due = Vec::with_capacity(order.len());
        for scheduled in order {
            if scheduled.epoch != epoch {
                tracing::trace!(?phase, "dropping stale deferred task");
                continue;
            }
            due.push(scheduled.task);
        }
        due
    }

    /// Number of queued tasks, stale ones included
    pub fn len(&self) -> usize {
        self.macrotasks.len() + self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn order_mut(&mut self, phase: TaskPhase) -> &mut VecDeque<Scheduled<T>> {
        match phase {
            TaskPhase::Macrotask => &mut self.macrotasks,
            TaskPhase::AnimationFrame => &mut self.frames,
        }
    }
}
