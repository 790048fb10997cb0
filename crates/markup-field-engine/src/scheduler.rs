//! Timed follow-up work.
//!
//! Everything that has to happen "a little later" is a [`Task`] in an
//! explicit [`TaskQueue`] with a virtual clock. The host advances the clock;
//! nothing runs on its own. Every task kind has a fixed delay and an effect
//! that is harmless to repeat.

use crate::bookmark::Bookmark;

/// Interval between readiness polls of an isolated document.
pub const BOOTSTRAP_POLL_MS: u64 = 50;
/// Delay before a legacy surface re-selects the range a markup command touched.
pub const RESELECT_MS: u64 = 1;
/// Delay before the caret is moved off a trailing line break after `down`.
pub const TAME_TRAILING_BREAK_MS: u64 = 10;
/// Delay before select-all state is dropped after typing replaced the content.
pub const RELEASE_SELECT_ALL_MS: u64 = 1;

pub type TaskId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    BootstrapPoll,
    Reselect(Bookmark),
    TameTrailingBreak,
    ReleaseSelectAll,
}

impl TaskKind {
    pub fn delay_ms(&self) -> u64 {
        match self {
            TaskKind::BootstrapPoll => BOOTSTRAP_POLL_MS,
            TaskKind::Reselect(_) => RESELECT_MS,
            TaskKind::TameTrailingBreak => TAME_TRAILING_BREAK_MS,
            TaskKind::ReleaseSelectAll => RELEASE_SELECT_ALL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Id of the field the task belongs to.
    pub field: String,
    pub kind: TaskKind,
}

#[derive(Debug, Clone)]
struct Scheduled {
    id: TaskId,
    due: u64,
    task: Task,
}

#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    now: u64,
    next_id: TaskId,
    pending: Vec<Scheduled>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedules `kind` for `field` after its standard delay.
    pub fn schedule(&mut self, field: &str, kind: TaskKind) -> TaskId {
        let delay = kind.delay_ms();
        self.schedule_in(
            delay,
            Task {
                field: field.to_string(),
                kind,
            },
        )
    }

    pub fn schedule_in(&mut self, delay_ms: u64, task: Task) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(Scheduled {
            id,
            due: self.now + delay_ms,
            task,
        });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.id != id);
        self.pending.len() != before
    }

    /// Drops every pending task of a field.
    pub fn cancel_field(&mut self, field: &str) {
        self.pending.retain(|s| s.task.field != field);
    }

    pub fn has_pending(&self, field: &str, kind: &TaskKind) -> bool {
        self.pending
            .iter()
            .any(|s| s.task.field == field && s.task.kind == *kind)
    }

    /// Removes and returns the earliest task due at or before `until`,
    /// moving the clock to its due time. Ties run in scheduling order.
    pub fn pop_due(&mut self, until: u64) -> Option<Task> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= until)
            .min_by_key(|(_, s)| (s.due, s.id))
            .map(|(i, _)| i)?;
        let scheduled = self.pending.remove(index);
        self.now = self.now.max(scheduled.due);
        Some(scheduled.task)
    }

    /// Moves the clock forward to `until` once nothing is due before it.
    pub fn advance_to(&mut self, until: u64) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(queue: &mut TaskQueue, until: u64) -> Vec<(String, TaskKind, u64)> {
        let mut out = Vec::new();
        while let Some(task) = queue.pop_due(until) {
            out.push((task.field, task.kind, queue.now()));
        }
        queue.advance_to(until);
        out
    }

    #[test]
    fn tasks_run_in_due_order() {
        let mut queue = TaskQueue::new();
        queue.schedule("a", TaskKind::BootstrapPoll);
        queue.schedule("b", TaskKind::TameTrailingBreak);
        queue.schedule("c", TaskKind::ReleaseSelectAll);

        assert_eq!(
            kinds(&mut queue, 100),
            vec![
                ("c".to_string(), TaskKind::ReleaseSelectAll, 1),
                ("b".to_string(), TaskKind::TameTrailingBreak, 10),
                ("a".to_string(), TaskKind::BootstrapPoll, 50),
            ]
        );
        assert_eq!(queue.now(), 100);
    }

    #[test]
    fn nothing_runs_before_its_delay() {
        let mut queue = TaskQueue::new();
        queue.schedule("a", TaskKind::BootstrapPoll);

        assert_eq!(kinds(&mut queue, 49), vec![]);
        assert_eq!(queue.len(), 1);
        assert_eq!(kinds(&mut queue, 50).len(), 1);
    }

    #[test]
    fn delays_are_relative_to_the_clock() {
        let mut queue = TaskQueue::new();
        queue.advance_to(200);
        queue.schedule("a", TaskKind::TameTrailingBreak);

        assert_eq!(queue.pop_due(209), None);
        assert!(queue.pop_due(210).is_some());
    }

    #[test]
    fn cancellation() {
        let mut queue = TaskQueue::new();
        let id = queue.schedule("a", TaskKind::BootstrapPoll);
        queue.schedule("a", TaskKind::TameTrailingBreak);
        queue.schedule("b", TaskKind::TameTrailingBreak);

        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        queue.cancel_field("a");

        assert!(!queue.has_pending("a", &TaskKind::TameTrailingBreak));
        assert!(queue.has_pending("b", &TaskKind::TameTrailingBreak));
        assert_eq!(queue.len(), 1);
    }
}
