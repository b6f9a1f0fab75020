//! Cancellable timed tasks, advanced once per tick.

use bevy::reflect::Reflect;

#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Clone, Debug)]
struct ScheduledTask<T> {
    id: TaskId,
    deadline: f64,
    payload: T,
}

/// Per-character scheduler of deadline tasks.
///
/// Cancelling a task removes it, so a superseded task can never deliver its payload. The clock
/// runs in `f64` so frame deltas still register after weeks of uptime.
#[derive(Clone, Debug)]
pub struct TaskScheduler<T> {
    now: f64,
    next_id: u64,
    tasks: Vec<ScheduledTask<T>>,
}

impl<T> Default for TaskScheduler<T> {
    fn default() -> Self {
        Self {
            now: 0.,
            next_id: 0,
            tasks: Vec::new(),
        }
    }
}

impl<T> TaskScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `payload` to be delivered `delay` seconds from now.
    pub fn schedule(&mut self, delay: f32, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            deadline: self.now + f64::from(delay.max(0.)),
            payload,
        });
        id
    }

    /// Returns `true` if the task was still pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    pub fn remaining(&self, id: TaskId) -> Option<f32> {
        self.tasks
            .iter()
            .find(|task| task.id == id)
            .map(|task| (task.deadline - self.now).max(0.) as f32)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Moves time forward and returns every task whose deadline has passed, earliest first. Tasks
    /// sharing a deadline keep their scheduling order.
    pub fn advance(&mut self, delta: f32) -> Vec<(TaskId, T)> {
        self.now += f64::from(delta.max(0.));

        let now = self.now;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|task| task.deadline <= now);
        self.tasks = pending;

        due.sort_by(|a, b| a.deadline.total_cmp(&b.deadline).then(a.id.cmp(&b.id)));
        due.into_iter().map(|task| (task.id, task.payload)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_deadline_order() {
        let mut scheduler = TaskScheduler::new();
        scheduler.schedule(2., "late");
        scheduler.schedule(1., "early");
        scheduler.schedule(1., "early too");

        assert!(scheduler.advance(0.5).is_empty());
        let fired: Vec<_> = scheduler.advance(2.).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec!["early", "early too", "late"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut scheduler = TaskScheduler::new();
        let id = scheduler.schedule(1., ());

        assert_eq!(scheduler.remaining(id), Some(1.));
        scheduler.advance(0.5);
        assert_eq!(scheduler.remaining(id), Some(0.5));

        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.advance(5.).is_empty());
    }

    #[test]
    fn zero_delay_fires_on_next_advance() {
        let mut scheduler = TaskScheduler::new();
        let id = scheduler.schedule(0., 7);
        assert!(scheduler.is_pending(id));
        assert_eq!(scheduler.advance(0.), vec![(id, 7)]);
    }

    #[test]
    fn frame_deltas_still_count_after_long_uptime() {
        let mut scheduler = TaskScheduler::new();
        scheduler.advance(600_000.);
        let id = scheduler.schedule(2., ());

        let fired: usize = (0..150)
            .map(|_| scheduler.advance(1. / 60.).len())
            .sum();
        assert_eq!(fired, 1);
        assert!(!scheduler.is_pending(id));
        assert!(scheduler.now() > 600_002.);
    }
}
