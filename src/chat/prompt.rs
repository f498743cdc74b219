//! Prompt composition for inference requests.
//!
//! Composition is a pure function of its inputs: the clock enters only
//! through the `now` argument, so identical inputs always produce identical
//! prompts. Sections are tagged so the engine can tell retrieved search
//! context apart from conversation content.

use chrono::{DateTime, Utc};

use crate::chat::types::{Message, Role};

/// Prompt parts before formatting.
#[derive(Clone, Debug)]
pub struct PromptParts {
    /// Prior turns, oldest first.
    pub history: Vec<Message>,
    /// Reduced web-search block, when augmentation produced one.
    pub search_context: Option<String>,
    /// Current user message.
    pub user_message: String,
    /// Timestamp rendered into the context header.
    pub now: DateTime<Utc>,
}

impl PromptParts {
    /// Approximate the character count of the rendered prompt.
    #[must_use]
    pub fn estimate_len(&self) -> usize {
        let mut total = 96;
        if let Some(block) = &self.search_context {
            total += block.len() + 1;
        }
        for message in &self.history {
            total += message.content.len() + 14;
        }
        total + self.user_message.len() + 1
    }
}

/// Render a deterministic prompt from prepared parts.
#[must_use]
pub fn build_prompt(parts: &PromptParts) -> String {
    let mut out = String::with_capacity(parts.estimate_len());

    out.push_str("[CONTEXT]\n");
    out.push_str("Current date and time: ");
    out.push_str(
        &parts
            .now
            .format("%Y-%m-%d %H:%M:%S UTC (%A, %B %d %Y)")
            .to_string(),
    );
    out.push('\n');

    if let Some(block) = &parts.search_context {
        out.push_str("[SEARCH_RESULTS]\n");
        out.push_str(block);
        if !block.ends_with('\n') {
            out.push('\n');
        }
    }

    out.push_str("[CONVERSATION]\n");
    for message in &parts.history {
        render_turn(&mut out, message);
    }

    out.push_str("[USER_MESSAGE]\n");
    out.push_str(&parts.user_message);
    out.push('\n');

    out
}

/// Enforce the prompt budget by dropping the oldest history first.
///
/// The new user message and the search block are never trimmed; when the
/// fixed parts alone exceed the budget the prompt is sent over budget rather
/// than losing the current turn's input.
#[must_use]
pub fn enforce_budget(mut parts: PromptParts, max_chars: usize) -> PromptParts {
    while build_prompt(&parts).len() > max_chars && !parts.history.is_empty() {
        parts.history.remove(0);
    }
    parts
}

/// Compose the final prompt for one turn.
#[must_use]
pub fn compose(
    history: &[Message],
    new_message: &str,
    search_context: Option<&str>,
    now: DateTime<Utc>,
    max_chars: usize,
) -> String {
    let parts = PromptParts {
        history: history.to_vec(),
        search_context: search_context.map(str::to_string),
        user_message: new_message.to_string(),
        now,
    };
    build_prompt(&enforce_budget(parts, max_chars))
}

fn render_turn(out: &mut String, message: &Message) {
    let role = match message.role {
        Role::User => "User",
        Role::Assistant => "Assistant",
    };
    out.push_str("- ");
    out.push_str(role);
    out.push_str(": ");
    out.push_str(&message.content);
    out.push('\n');
}
