//! Fixed-timestep accumulator
//!
//! Frames arrive at whatever rate the platform manages; the simulation only
//! ever advances in whole `step` increments.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SUBSTEPS, SIM_DT};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    step: f64,
    unprocessed: f64,
    /// Catch-up cap per frame
    max_substeps: u32,
    /// Ticks run since creation
    ticks: u64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_SUBSTEPS)
    }
}

impl SimulationClock {
    pub fn new(step: f64, max_substeps: u32) -> Self {
        Self {
            step,
            unprocessed: 0.0,
            max_substeps: max_substeps.max(1),
            ticks: 0,
        }
    }

    /// Add a frame's elapsed time and return how many fixed ticks to run now.
    ///
    /// At most `max_substeps` ticks are granted per call. Time beyond that
    /// (a stall, a debugger pause) is dropped rather than carried, so a
    /// stall never turns into a burst of catch-up ticks.
    pub fn accumulate(&mut self, frame_dt: f64) -> u32 {
        self.unprocessed += frame_dt.max(0.0);

        let mut ticks = 0;
        while self.unprocessed >= self.step && ticks < self.max_substeps {
            self.unprocessed -= self.step;
            ticks += 1;
        }

        if self.unprocessed >= self.step {
            log::debug!(
                "Clock dropping {:.3}s of backlog after {} ticks",
                self.unprocessed,
                ticks
            );
            self.unprocessed %= self.step;
        }

        self.ticks += u64::from(ticks);
        ticks
    }

    /// Leftover time carried into the next frame, in seconds
    #[inline]
    pub fn unprocessed(&self) -> f64 {
        self.unprocessed
    }

    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
