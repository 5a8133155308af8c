//! Display-frame requests and one-shot timers for the single-threaded event loop.
//!
//! Time is passed in explicitly as milliseconds since start so the loop can be driven from
//! tests without a clock.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Rebuild the wave surface after a control change.
    RebuildWave,
    /// Begin microphone acquisition.
    StartAudio,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    id: TimerId,
    due_ms: f64,
    task: Task,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    frame: Option<FrameHandle>,
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Ask for a callback on the next display frame. At most one request is outstanding;
    /// a new request replaces the old one.
    pub fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next());
        self.frame = Some(handle);
        handle
    }

    pub fn cancel_frame(&mut self, handle: FrameHandle) -> bool {
        if self.frame == Some(handle) {
            self.frame = None;
            return true;
        }
        false
    }

    pub fn frame_pending(&self) -> bool {
        self.frame.is_some()
    }

    /// Consume the outstanding frame request, if any. Called once per display refresh.
    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        self.frame.take()
    }

    pub fn set_timeout(&mut self, now_ms: f64, delay_ms: f64, task: Task) -> TimerId {
        let id = TimerId(self.next());
        self.timers.push(Timer {
            id,
            due_ms: now_ms + delay_ms.max(0.0),
            task,
        });
        id
    }

    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Remove and return every task due at `now_ms`, earliest first.
    pub fn due(&mut self, now_ms: f64) -> Vec<Task> {
        let mut ready = Vec::new();
        self.timers.retain(|t| {
            if t.due_ms <= now_ms {
                ready.push(*t);
                false
            } else {
                true
            }
        });
        ready.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.id.0.cmp(&b.id.0)));
        ready.into_iter().map(|t| t.task).collect()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn cancel_all(&mut self) {
        self.frame = None;
        self.timers.clear();
    }
}
