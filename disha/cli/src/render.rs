//! Terminal rendering of chat updates
//!
//! Streamed fragments are written as they arrive. When a message is
//! finalized with text that was not streamed (the greeting, or an apology
//! replacing a failed stream) the final text is written instead.

use std::io::Write;

use disha_core::{ChatUpdate, Sender, Theme};

/// Writes [`ChatUpdate`]s to a terminal-like sink
pub struct Renderer<W: Write> {
    out: W,
    theme: Theme,
    streamed: String,
}

impl<W: Write> Renderer<W> {
    /// Renderer writing to `out`
    pub fn new(out: W, theme: Theme) -> Self {
        Self {
            out,
            theme,
            streamed: String::new(),
        }
    }

    /// Change the colour scheme for subsequent output
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    fn label(&self) -> &'static str {
        match self.theme {
            Theme::Light => "\x1b[34mDisha:\x1b[0m ",
            Theme::Dark => "\x1b[96mDisha:\x1b[0m ",
        }
    }

    /// Render one update
    pub fn render(&mut self, update: &ChatUpdate) -> std::io::Result<()> {
        match update {
            // The user's own line is already on screen
            ChatUpdate::Appended {
                sender: Sender::User,
                ..
            }
            | ChatUpdate::Busy { .. } => {}
            ChatUpdate::Appended {
                sender: Sender::Assistant,
                text,
                ..
            } => {
                self.streamed.clear();
                write!(self.out, "{}{text}", self.label())?;
                self.streamed.push_str(text);
            }
            ChatUpdate::Delta { fragment, .. } => {
                write!(self.out, "{fragment}")?;
                self.streamed.push_str(fragment);
            }
            ChatUpdate::Finalized { text, .. } => {
                if self.streamed.is_empty() {
                    write!(self.out, "{text}")?;
                } else if self.streamed != *text {
                    write!(self.out, "\n{}{text}", self.label())?;
                }
                writeln!(self.out, "\n")?;
                self.streamed.clear();
            }
        }
        self.out.flush()
    }
}
