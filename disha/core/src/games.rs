//! Skill Swipe
//!
//! A yes/no game over a fixed deck of everyday activities. Every liked
//! card votes for the skills it exercises; the three most-voted skills are
//! offered to the chat as a conversation starter.

use crate::relay::PromptRelay;

/// Number of skills reported at the end of a round
pub const TOP_SKILL_COUNT: usize = 3;

/// One activity card
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwipeCard {
    /// Card number, starting at 1
    pub id: u8,
    /// Activity description
    pub text: &'static str,
    /// Decorative emoji
    pub emoji: &'static str,
    /// Skills the activity exercises
    pub skills: &'static [&'static str],
}

/// The full deck, in play order
pub const SKILL_SWIPE_CARDS: [SwipeCard; 12] = [
    SwipeCard {
        id: 1,
        text: "Organizing a fun event for your friends",
        emoji: "🎉",
        skills: &["organization", "planning", "social skills"],
    },
    SwipeCard {
        id: 2,
        text: "Writing a short story or poem",
        emoji: "✍️",
        skills: &["creativity", "writing", "communication"],
    },
    SwipeCard {
        id: 3,
        text: "Solving a complex math puzzle",
        emoji: "🧩",
        skills: &["problem-solving", "analytical skills", "mathematics"],
    },
    SwipeCard {
        id: 4,
        text: "Building something with LEGOs or a model kit",
        emoji: "🧱",
        skills: &["creativity", "engineering", "patience"],
    },
    SwipeCard {
        id: 5,
        text: "Helping a friend understand a difficult topic",
        emoji: "🤝",
        skills: &["communication", "empathy", "teaching"],
    },
    SwipeCard {
        id: 6,
        text: "Designing a poster for a school club",
        emoji: "🎨",
        skills: &["creativity", "design", "visual communication"],
    },
    SwipeCard {
        id: 7,
        text: "Learning a new programming language online",
        emoji: "💻",
        skills: &["problem-solving", "technical skills", "self-learning"],
    },
    SwipeCard {
        id: 8,
        text: "Leading a team in a group project",
        emoji: "🏆",
        skills: &["leadership", "teamwork", "organization"],
    },
    SwipeCard {
        id: 9,
        text: "Analyzing data to find a pattern",
        emoji: "📊",
        skills: &["analytical skills", "data analysis", "attention to detail"],
    },
    SwipeCard {
        id: 10,
        text: "Comforting someone who is upset",
        emoji: "🤗",
        skills: &["empathy", "social skills", "communication"],
    },
    SwipeCard {
        id: 11,
        text: "Debating a topic you are passionate about",
        emoji: "🗣️",
        skills: &["communication", "critical thinking", "persuasion"],
    },
    SwipeCard {
        id: 12,
        text: "Creating a budget to save for something you want",
        emoji: "💰",
        skills: &["planning", "financial literacy", "organization"],
    },
];

/// Rank skills by how many liked cards exercise them
///
/// Highest count first; ties keep the order in which skills were first
/// seen. At most [`TOP_SKILL_COUNT`] skills are returned.
#[must_use]
pub fn top_skills<'a>(liked: impl IntoIterator<Item = &'a SwipeCard>) -> Vec<&'static str> {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for card in liked {
        for &skill in card.skills {
            match counts.iter_mut().find(|(s, _)| *s == skill) {
                Some((_, count)) => *count += 1,
                None => counts.push((skill, 1)),
            }
        }
    }
    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(TOP_SKILL_COUNT)
        .map(|(skill, _)| skill)
        .collect()
}

/// Prompt asking the advisor about careers for `skills`
#[must_use]
pub fn discussion_prompt(skills: &[&str]) -> String {
    format!(
        "I played the Skill Swipe game and it suggested my top skills are: {}. \
         Can you tell me about some careers that use these skills?",
        skills.join(", ")
    )
}

/// Game phase
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SwipePhase {
    /// Not started
    #[default]
    Start,
    /// Showing the card at this deck index
    Playing(usize),
    /// Deck finished
    Results(Vec<&'static str>),
}

/// One round of Skill Swipe
#[derive(Clone, Debug, Default)]
pub struct SkillSwipe {
    phase: SwipePhase,
    liked: Vec<&'static SwipeCard>,
}

impl SkillSwipe {
    /// Game waiting to start
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> &SwipePhase {
        &self.phase
    }

    /// Card currently shown
    #[must_use]
    pub fn current_card(&self) -> Option<&'static SwipeCard> {
        match self.phase {
            SwipePhase::Playing(index) => SKILL_SWIPE_CARDS.get(index),
            _ => None,
        }
    }

    /// Begin at the first card, discarding any previous round
    pub fn start(&mut self) {
        self.liked.clear();
        self.phase = SwipePhase::Playing(0);
    }

    /// Alias of [`Self::start`] used from the results screen
    pub fn play_again(&mut self) {
        self.start();
    }

    /// Answer the current card and move on
    ///
    /// Ignored unless a card is showing.
    pub fn answer(&mut self, liked: bool) -> &SwipePhase {
        let SwipePhase::Playing(index) = self.phase else {
            return &self.phase;
        };
        if liked {
            self.liked.push(&SKILL_SWIPE_CARDS[index]);
        }

        self.phase = if index + 1 < SKILL_SWIPE_CARDS.len() {
            SwipePhase::Playing(index + 1)
        } else {
            let skills = top_skills(self.liked.iter().copied());
            tracing::debug!(liked = self.liked.len(), skills = ?skills, "Skill Swipe finished");
            SwipePhase::Results(skills)
        };
        &self.phase
    }

    /// Top skills, once the deck is finished
    #[must_use]
    pub fn top_skills(&self) -> Option<&[&'static str]> {
        match &self.phase {
            SwipePhase::Results(skills) => Some(skills),
            _ => None,
        }
    }

    /// Offer the results to the chat
    ///
    /// Returns the prompt, or `None` before the results or when nothing
    /// was liked.
    pub fn discuss(&self, relay: &PromptRelay) -> Option<String> {
        let skills = self.top_skills().filter(|s| !s.is_empty())?;
        let prompt = discussion_prompt(skills);
        relay.offer(prompt.clone());
        Some(prompt)
    }
}
