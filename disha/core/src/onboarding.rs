//! Onboarding
//!
//! Collects the [`UserProfile`] one question at a time before the advisor
//! is available.
//!
//! # States
//!
//! ```text
//! Collecting(0) <-> Collecting(1) <-> ... <-> Collecting(N-1)
//!                                                  | next (answer present)
//!                                                  v
//!                                             Finishing --finish--> Complete
//! ```
//!
//! `next` only advances when the current answer is non-blank. Answers are
//! kept when moving back, so nothing typed is ever lost.

use std::time::Duration;

use crate::error::OnboardingError;
use crate::profile::{PartialProfile, ProfileField, UserProfile};

/// How an answer should be entered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Single line
    Text,
    /// Free-form, possibly multi-line
    TextArea,
}

/// One onboarding question
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OnboardingStep {
    /// Profile field the answer fills
    pub field: ProfileField,
    /// Question shown to the student
    pub question: &'static str,
    /// Example answer
    pub placeholder: &'static str,
    /// Input style
    pub input: InputKind,
}

/// The fixed question sequence
pub const ONBOARDING_STEPS: [OnboardingStep; 4] = [
    OnboardingStep {
        field: ProfileField::Name,
        question: "First, what's your name?",
        placeholder: "e.g., Priya",
        input: InputKind::Text,
    },
    OnboardingStep {
        field: ProfileField::Interests,
        question: "What are some topics or activities you are passionate about?",
        placeholder: "e.g., painting, video games, biology, helping people",
        input: InputKind::TextArea,
    },
    OnboardingStep {
        field: ProfileField::Skills,
        question: "What are you good at? Think about school subjects or hobbies.",
        placeholder: "e.g., good in math, creative writing, leading teams",
        input: InputKind::TextArea,
    },
    OnboardingStep {
        field: ProfileField::Personality,
        question: "How would you describe your personality in a few words?",
        placeholder: "e.g., curious, organized, enjoy working in teams",
        input: InputKind::TextArea,
    },
];

/// Onboarding phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Answering questions
    Collecting,
    /// Every answer accepted; waiting out the finishing delay
    Finishing,
    /// Profile emitted
    Complete,
}

/// Outcome of [`Onboarding::next`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the step at this index
    Step(usize),
    /// Current answer is blank, or onboarding is no longer collecting
    Blocked,
    /// Last step accepted; call [`Onboarding::finish`]
    Finishing,
}

/// Onboarding state machine
#[derive(Clone, Debug)]
pub struct Onboarding {
    index: usize,
    phase: Phase,
    answers: PartialProfile,
}

impl Default for Onboarding {
    fn default() -> Self {
        Self::new()
    }
}

impl Onboarding {
    /// Start at the first question
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: 0,
            phase: Phase::Collecting,
            answers: PartialProfile::new(),
        }
    }

    /// Current step index, in `0..ONBOARDING_STEPS.len()`
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current question
    #[must_use]
    pub fn step(&self) -> &'static OnboardingStep {
        &ONBOARDING_STEPS[self.index]
    }

    /// Answer for the current question, if any
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.answers.get(self.step().field)
    }

    /// Answers gathered so far
    #[must_use]
    pub fn answers(&self) -> &PartialProfile {
        &self.answers
    }

    /// Record the answer to the current question
    ///
    /// Ignored outside [`Phase::Collecting`].
    pub fn set_answer(&mut self, value: impl Into<String>) {
        if self.phase == Phase::Collecting {
            self.answers.set(self.step().field, value);
        }
    }

    /// Whether the current answer is non-blank
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.phase == Phase::Collecting && self.answers.is_present(self.step().field)
    }

    /// Move forward, or enter [`Phase::Finishing`] from the last step
    pub fn next(&mut self) -> Advance {
        if !self.can_advance() {
            return Advance::Blocked;
        }
        if self.index + 1 < ONBOARDING_STEPS.len() {
            self.index += 1;
            Advance::Step(self.index)
        } else {
            self.phase = Phase::Finishing;
            tracing::debug!("Onboarding answers complete");
            Advance::Finishing
        }
    }

    /// Move back one question, stopping at the first
    ///
    /// Returns the new index. Has no effect once finishing has begun.
    pub fn back(&mut self) -> usize {
        if self.phase == Phase::Collecting {
            self.index = self.index.saturating_sub(1);
        }
        self.index
    }

    /// Progress through the questions, 25 to 100 for four steps
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        let total = ONBOARDING_STEPS.len();
        u8::try_from((self.index + 1) * 100 / total).unwrap_or(100)
    }

    /// Emit the completed profile
    ///
    /// # Errors
    ///
    /// Returns [`OnboardingError::NotFinishing`] unless the last step has
    /// been accepted, and [`OnboardingError::Incomplete`] if any answer is
    /// blank.
    pub fn finish(&mut self) -> Result<UserProfile, OnboardingError> {
        if self.phase != Phase::Finishing {
            return Err(OnboardingError::NotFinishing);
        }
        let profile = self
            .answers
            .clone()
            .into_profile()
            .map_err(OnboardingError::Incomplete)?;
        self.phase = Phase::Complete;
        tracing::info!(name = %profile.name, "Onboarding complete");
        Ok(profile)
    }

    /// Wait out the finishing delay, then [`Self::finish`]
    ///
    /// # Errors
    ///
    /// Same as [`Self::finish`].
    pub async fn finish_after(&mut self, delay: Duration) -> Result<UserProfile, OnboardingError> {
        if self.phase != Phase::Finishing {
            return Err(OnboardingError::NotFinishing);
        }
        tokio::time::sleep(delay).await;
        self.finish()
    }
}
