//! # Transition Controller
//!
//! Time-driven state machine that shows one function for
//! `function_duration` seconds, then crossfades to the next over
//! `transition_duration` seconds:
//!
//! ```text
//!            elapsed >= function_duration
//!   Steady ───────────────────────────────► Transitioning
//!     ▲       pick next, elapsed -= fd            │
//!     │                                           │
//!     └───────────────────────────────────────────┘
//!            elapsed >= transition_duration
//!            next becomes current, elapsed -= td
//! ```
//!
//! At most one state change happens per tick. Elapsed time is the sum of
//! frame deltas with no correction for long frames.

use fractalis_core::ConfigError;
use fractalis_shared::smoothstep;
use rand::rngs::StdRng;

use crate::config::{TransitionConfig, TransitionMode};
use crate::functions::{FunctionBlend, FunctionName};
use crate::sequence::seeded_rng;

/// Controller state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionState {
    /// Showing one function.
    Steady,
    /// Crossfading to the next function.
    Transitioning,
}

/// State change reported by [`TransitionController::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionEvent {
    /// A crossfade began.
    Started {
        /// Function being left.
        from: FunctionName,
        /// Function being approached.
        to: FunctionName,
    },
    /// A crossfade completed.
    Finished {
        /// The new current function.
        current: FunctionName,
    },
}

/// Selects and blends catalog functions over time.
#[derive(Clone, Debug)]
pub struct TransitionController {
    mode: TransitionMode,
    function_duration: f32,
    transition_duration: f32,
    /// Time since the last state change.
    elapsed: f32,
    /// Total time since creation; drives function animation.
    time: f32,
    current: FunctionName,
    /// Target while transitioning.
    next: Option<FunctionName>,
    rng: StdRng,
}

impl TransitionController {
    /// Creates a steady controller showing `config.function`.
    ///
    /// # Errors
    ///
    /// Returns an error if either duration is invalid.
    pub fn new(config: &TransitionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            mode: config.mode,
            function_duration: config.function_duration,
            transition_duration: config.transition_duration,
            elapsed: 0.0,
            time: 0.0,
            current: config.function,
            next: None,
            rng: seeded_rng(config.seed),
        })
    }

    /// Advances by `delta` seconds and applies at most one state change.
    ///
    /// A delta spanning several durations is not caught up in one call:
    /// the surplus stays in `elapsed` and drains one change per tick.
    /// Progress saturates at 1 meanwhile.
    pub fn tick(&mut self, delta: f32) -> Option<TransitionEvent> {
        self.elapsed += delta;
        self.time += delta;

        let event = match self.next {
            Some(next) if self.elapsed >= self.transition_duration => {
                self.elapsed -= self.transition_duration;
                self.current = next;
                self.next = None;
                Some(TransitionEvent::Finished { current: next })
            }
            None if self.elapsed >= self.function_duration => {
                self.elapsed -= self.function_duration;
                let to = self.pick_next();
                self.next = Some(to);
                Some(TransitionEvent::Started { from: self.current, to })
            }
            _ => None,
        };

        if let Some(event) = event {
            tracing::debug!(?event, time = self.time, "function transition");
        }
        event
    }

    fn pick_next(&mut self) -> FunctionName {
        match self.mode {
            TransitionMode::Cycle => self.current.next(),
            TransitionMode::Random => self.current.random_other_than(&mut self.rng),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TransitionState {
        if self.next.is_some() {
            TransitionState::Transitioning
        } else {
            TransitionState::Steady
        }
    }

    /// Function shown (or being left, while transitioning).
    #[must_use]
    pub const fn current(&self) -> FunctionName {
        self.current
    }

    /// Transition target, while transitioning.
    #[must_use]
    pub const fn next(&self) -> Option<FunctionName> {
        self.next
    }

    /// Seconds since the last state change.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds since creation.
    #[must_use]
    pub const fn time(&self) -> f32 {
        self.time
    }

    /// Smoothed crossfade factor, only while transitioning.
    ///
    /// A zero-length transition reports full progress.
    #[must_use]
    pub fn progress(&self) -> Option<f32> {
        self.linear_progress().map(|t| smoothstep(0.0, 1.0, t))
    }

    fn linear_progress(&self) -> Option<f32> {
        self.next.map(|_| {
            if self.transition_duration > 0.0 {
                (self.elapsed / self.transition_duration).clamp(0.0, 1.0)
            } else {
                1.0
            }
        })
    }

    /// What to evaluate this frame. Progress is linear.
    #[must_use]
    pub fn blend(&self) -> FunctionBlend {
        match (self.next, self.linear_progress()) {
            (Some(to), Some(progress)) => FunctionBlend { from: self.current, to, progress },
            _ => FunctionBlend::steady(self.current),
        }
    }

    /// Compute kernel for this frame.
    ///
    /// Kernels are laid out `target + source * COUNT`; a steady function
    /// uses its own diagonal entry.
    #[must_use]
    pub fn kernel_index(&self) -> u32 {
        let count = FunctionName::COUNT as u32;
        let from = self.current.index();
        let to = self.next.unwrap_or(self.current).index();
        to + from * count
    }
}
