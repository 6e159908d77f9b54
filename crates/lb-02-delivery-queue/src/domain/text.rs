//! Outbound text normalization.

use shared_types::Action;
use std::borrow::Cow;

/// Zero-width characters that some senders use as invisible padding.
const ZERO_WIDTH: [char; 5] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

const ZERO_WIDTH_NO_BREAK_SPACE: char = '\u{FEFF}';

/// Keep invisible padding intact across the dispatcher surface.
///
/// The notification surface collapses bare `U+200B` runs, so each one gets
/// a `U+FEFF` appended. Messages without zero-width characters pass through
/// unchanged.
#[must_use]
pub fn preserve_invisible_padding(message: &str) -> Cow<'_, str> {
    if !message.chars().any(|ch| ZERO_WIDTH.contains(&ch)) {
        return Cow::Borrowed(message);
    }

    let mut padded = String::with_capacity(message.len() + 8);
    for ch in message.chars() {
        padded.push(ch);
        if ch == '\u{200B}' {
            padded.push(ZERO_WIDTH_NO_BREAK_SPACE);
        }
    }
    Cow::Owned(padded)
}

/// Apply outbound normalization to an action before dispatch.
#[must_use]
pub fn normalize(action: Action) -> Action {
    match action {
        Action::SendText {
            chat_id,
            message,
            thread_id,
        } => {
            let message = preserve_invisible_padding(&message).into_owned();
            Action::SendText {
                chat_id,
                message,
                thread_id,
            }
        }
        other => other,
    }
}
