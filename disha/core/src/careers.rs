//! Career Explorer
//!
//! Static catalog of career categories and a small navigation state over
//! it. Choosing "plan a learning path" for a career hands a prompt to the
//! chat through the [`PromptRelay`].

use crate::relay::PromptRelay;

/// A single career
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Career {
    /// Stable identifier
    pub id: &'static str,
    /// Display title
    pub title: &'static str,
    /// One-line description
    pub description: &'static str,
}

/// A group of related careers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CareerCategory {
    /// Stable identifier
    pub id: &'static str,
    /// Display title
    pub title: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Careers in this category
    pub careers: &'static [Career],
}

impl CareerCategory {
    /// Find a career by ID
    #[must_use]
    pub fn career(&self, id: &str) -> Option<&'static Career> {
        self.careers.iter().find(|c| c.id == id)
    }
}

/// Every category, in display order
pub const CAREER_CATEGORIES: &[CareerCategory] = &[
    CareerCategory {
        id: "tech",
        title: "Technology & IT",
        description: "Build the future with code, data, and design.",
        careers: &[
            Career {
                id: "swe",
                title: "Software Engineering",
                description: "Create applications, websites, and systems.",
            },
            Career {
                id: "data",
                title: "Data Science & Analytics",
                description: "Find insights and stories in data.",
            },
            Career {
                id: "uiux",
                title: "UI/UX Design",
                description: "Design user-friendly and beautiful digital products.",
            },
            Career {
                id: "cyber",
                title: "Cybersecurity",
                description: "Protect digital systems from threats.",
            },
        ],
    },
    CareerCategory {
        id: "creative",
        title: "Creative Arts & Design",
        description: "Express ideas through visuals, words, and sounds.",
        careers: &[
            Career {
                id: "gfx",
                title: "Graphic Design",
                description: "Create visual concepts for brands and media.",
            },
            Career {
                id: "content",
                title: "Content Creation & Writing",
                description: "Craft compelling stories for various platforms.",
            },
            Career {
                id: "anim",
                title: "Animation & VFX",
                description: "Bring characters and worlds to life.",
            },
        ],
    },
    CareerCategory {
        id: "healthcare",
        title: "Healthcare & Medicine",
        description: "Help people live healthier lives.",
        careers: &[
            Career {
                id: "doctor",
                title: "Medical Doctor",
                description: "Diagnose and treat illnesses.",
            },
            Career {
                id: "nursing",
                title: "Nursing",
                description: "Provide patient care and support.",
            },
            Career {
                id: "research",
                title: "Medical Research",
                description: "Discover new treatments and cures.",
            },
        ],
    },
    CareerCategory {
        id: "business",
        title: "Business & Finance",
        description: "Lead, manage, and grow organizations.",
        careers: &[
            Career {
                id: "marketing",
                title: "Marketing & Sales",
                description: "Promote and sell products or services.",
            },
            Career {
                id: "finance",
                title: "Finance & Accounting",
                description: "Manage money and financial records.",
            },
            Career {
                id: "hr",
                title: "Human Resources",
                description: "Support and develop a company's people.",
            },
        ],
    },
];

/// Find a category by ID
#[must_use]
pub fn category(id: &str) -> Option<&'static CareerCategory> {
    CAREER_CATEGORIES.iter().find(|c| c.id == id)
}

/// Prompt asking the advisor for a learning path toward `title`
#[must_use]
pub fn learning_path_prompt(title: &str) -> String {
    format!(
        "Please create a personalized, step-by-step learning path for a career in '{title}'. \
         Include recommended skills, potential projects, and resources relevant for a student in India."
    )
}

/// Where the explorer currently is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExplorerView {
    /// List of categories
    #[default]
    Categories,
    /// Careers in one category
    Category(&'static CareerCategory),
    /// Detail of one career
    Career {
        /// Category the career belongs to
        category: &'static CareerCategory,
        /// The selected career
        career: &'static Career,
    },
}

/// Navigation state of the career explorer
#[derive(Clone, Debug, Default)]
pub struct CareerExplorer {
    view: ExplorerView,
}

impl CareerExplorer {
    /// Start at the category list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current view
    #[must_use]
    pub fn view(&self) -> ExplorerView {
        self.view
    }

    /// Open a category; returns `false` if the ID is unknown
    pub fn select_category(&mut self, id: &str) -> bool {
        match category(id) {
            Some(category) => {
                self.view = ExplorerView::Category(category);
                true
            }
            None => false,
        }
    }

    /// Open a career within the current category
    ///
    /// Returns `false` if no category is open or the ID is unknown.
    pub fn select_career(&mut self, id: &str) -> bool {
        let category = match self.view {
            ExplorerView::Category(category) | ExplorerView::Career { category, .. } => category,
            ExplorerView::Categories => return false,
        };
        match category.career(id) {
            Some(career) => {
                self.view = ExplorerView::Career { category, career };
                true
            }
            None => false,
        }
    }

    /// Go up one level
    pub fn back(&mut self) {
        self.view = match self.view {
            ExplorerView::Career { category, .. } => ExplorerView::Category(category),
            ExplorerView::Category(_) | ExplorerView::Categories => ExplorerView::Categories,
        };
    }

    /// Offer a learning-path prompt for the open career to the chat
    ///
    /// Returns the prompt, or `None` if no career is open.
    pub fn plan_learning_path(&self, relay: &PromptRelay) -> Option<String> {
        let ExplorerView::Career { career, .. } = self.view else {
            return None;
        };
        let prompt = learning_path_prompt(career.title);
        tracing::debug!(career = career.id, "Planning learning path");
        relay.offer(prompt.clone());
        Some(prompt)
    }
}
