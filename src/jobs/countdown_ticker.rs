use std::sync::Arc;
use tokio::sync::watch;

use crate::app::countdown::{countdowns, Clock, Countdowns};
use crate::domain::enrollment::Enrollment;
use crate::jobs::Job;

/// Recomputes the My Courses countdowns on every tick. A new enrollment list
/// means a new ticker.
pub struct CountdownTicker {
    enrollments: Vec<Enrollment>,
    clock: Arc<dyn Clock>,
    output: watch::Sender<Countdowns>,
}

impl CountdownTicker {
    pub fn new(
        enrollments: Vec<Enrollment>,
        clock: Arc<dyn Clock>,
    ) -> (Self, watch::Receiver<Countdowns>) {
        let initial = countdowns(&enrollments, clock.now());
        let (output, receiver) = watch::channel(initial);
        (
            Self {
                enrollments,
                clock,
                output,
            },
            receiver,
        )
    }
}

impl Job for CountdownTicker {
    fn name(&self) -> &'static str {
        "countdown_ticker"
    }

    async fn tick(&mut self) {
        let next = countdowns(&self.enrollments, self.clock.now());
        self.output.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}
