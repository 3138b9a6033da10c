//! The betting countdown.
//!
//! A countdown is a small task that sends a [`TimerTick`] into the
//! engine every period until it is cancelled. It never touches room
//! state. Each tick carries the generation it was started with so the
//! engine can tell a tick from the current phase apart from one that
//! was already queued when the phase ended.

use std::time::Duration;

use dicehall_protocol::RoomCode;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// One countdown tick, addressed to a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerTick {
    pub code: RoomCode,
    pub generation: u64,
}

/// Ownership token for a running countdown.
///
/// Dropping it cancels the countdown, so a room can never leak one.
#[derive(Debug)]
pub struct Countdown {
    generation: u64,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Starts ticking every `period`, first tick one period from now.
    pub fn spawn(
        code: RoomCode,
        generation: u64,
        period: Duration,
        ticks: mpsc::UnboundedSender<TimerTick>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let tick = TimerTick {
                    code: code.clone(),
                    generation,
                };
                if ticks.send(tick).is_err() {
                    // Engine is gone.
                    break;
                }
            }
        });
        Self { generation, task }
    }

    /// Stamp carried by every tick this countdown sends.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stops the countdown. Ticks already sent are not recalled.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}
