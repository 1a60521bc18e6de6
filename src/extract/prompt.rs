//! Prompt construction for LLM extraction.

use chrono::NaiveDate;

use crate::llm::{ChatMessage, Role};

const SYSTEM_PROMPT: &str = r#"You extract action items from meeting notes and other free-form text.

Respond with ONLY a JSON object containing an "action_items" array. Each action item has:
- title: a clear, concise title
- description: a brief description of what needs to be done
- priority: one of "critical", "high", "medium", "low", based on urgency indicators (ASAP, urgent, deadline, ...)
- category: a short category such as "strategic", "technical", "meeting", "review" or "administrative"
- due_date: the due date as YYYY-MM-DD, or null when no date is mentioned or implied
- assignee: the person the item is assigned or should be delegated to, or null

Only extract clear, actionable items, not general discussion. Resolve relative dates
("tomorrow", "next Friday") against the current date you are given.

Example:
{"action_items": [{"title": "Send release notes", "description": "Email the 2.1 release notes to support", "priority": "high", "category": "administrative", "due_date": "2025-01-24", "assignee": "Dana"}]}"#;

/// Messages for one extraction request.
pub fn extraction_messages(text: &str, today: NaiveDate) -> Vec<ChatMessage> {
    vec![
        ChatMessage::new(Role::System, SYSTEM_PROMPT),
        ChatMessage::new(Role::User, user_prompt(text, today)),
    ]
}

fn user_prompt(text: &str, today: NaiveDate) -> String {
    format!(
        "Current date: {}\n\nExtract all action items from the following text:\n\n{}",
        today.format("%A, %B %-d, %Y"),
        text
    )
}
