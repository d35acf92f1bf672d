//! Simulated clock, timers, and frame coalescing for the page loop.

/// Monotonic page clock in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    now_ms: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(self) -> u64 {
        self.now_ms
    }

    pub fn advance(&mut self, ms: u64) {
        self.now_ms = self.now_ms.saturating_add(ms);
    }
}

/// One-shot deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    deadline: u64,
}

impl Countdown {
    pub fn after(now: u64, delay_ms: u64) -> Self {
        Self {
            deadline: now.saturating_add(delay_ms),
        }
    }

    pub fn deadline(self) -> u64 {
        self.deadline
    }

    pub fn ready(self, now: u64) -> bool {
        now >= self.deadline
    }
}

/// Repeating timer with catch-up: `fire` reports how many periods elapsed
/// since the last call, so a large clock jump yields every missed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period_ms: u64,
    next_due: u64,
}

impl Interval {
    pub fn start(now: u64, period_ms: u64) -> Self {
        let period_ms = period_ms.max(1);
        Self {
            period_ms,
            next_due: now.saturating_add(period_ms),
        }
    }

    pub fn period(self) -> u64 {
        self.period_ms
    }

    pub fn fire(&mut self, now: u64) -> u32 {
        let mut ticks = 0_u32;
        while now >= self.next_due {
            self.next_due = self.next_due.saturating_add(self.period_ms);
            ticks = ticks.saturating_add(1);
        }
        ticks
    }

    /// Restarts the period from `now`, dropping any accumulated due ticks.
    pub fn reset(&mut self, now: u64) {
        self.next_due = now.saturating_add(self.period_ms);
    }
}

/// At-most-one pending update between animation frames.
///
/// `request` returns whether a frame was newly scheduled; further requests
/// before `take` collapse into the already-pending frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCoalescer {
    pending: bool,
}

impl FrameCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn is_pending(self) -> bool {
        self.pending
    }

    pub fn take(&mut self) -> bool {
        let was_pending = self.pending;
        self.pending = false;
        was_pending
    }
}
