/// Outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// `announced` is the value to show players this tick; `remaining` is
    /// what is left after the decrement.
    Running { announced: u32, remaining: u32 },
    /// The counter reached zero on this tick. Reported exactly once.
    Expired { announced: u32 },
}

/// Strictly decreasing per-tick counter that fires once at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    fired: bool,
}

impl Countdown {
    /// A window of zero would never reach zero after a decrement, so it is
    /// treated as a single tick.
    pub fn new(ticks: u32) -> Self {
        Countdown { remaining: ticks.max(1), fired: false }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_fired(&self) -> bool {
        self.fired
    }

    /// Announce, decrement, and report expiry. Returns `None` once fired.
    pub fn tick(&mut self) -> Option<CountdownTick> {
        if self.fired {
            return None;
        }
        let announced = self.remaining;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.fired = true;
            Some(CountdownTick::Expired { announced })
        } else {
            Some(CountdownTick::Running { announced, remaining: self.remaining })
        }
    }
}
