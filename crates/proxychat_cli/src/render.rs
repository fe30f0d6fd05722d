//! Terminal rendering of chat state.
//!
//! Agent replies are printed as received; markdown is left untouched.

use std::io::{self, Write};

use proxychat_core::{ChatView, Role};

/// Prints what changed between successive `ChatView` snapshots.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    rendered_turns: usize,
    was_loading: bool,
    last_error: Option<String>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the difference from the previous snapshot. Returns true when the
    /// controller went back to idle, i.e. the input prompt should be shown again.
    pub fn render(&mut self, view: &ChatView, out: &mut impl Write) -> io::Result<bool> {
        if view.is_loading && !self.was_loading {
            writeln!(out, "⏳ Thinking...")?;
        }

        // Snapshots can be coalesced, so a settled exchange may show up without
        // the loading state ever having been observed.
        let has_new_turns = view.conversation.len() > self.rendered_turns;
        let error_changed = view.error != self.last_error;

        for turn in view.conversation.turns().iter().skip(self.rendered_turns) {
            // User turns are already on screen as typed input.
            if turn.role() == Role::Agent {
                writeln!(out, "\n{}:\n{}\n", turn.role().display_name(), turn.content())?;
            }
        }
        self.rendered_turns = view.conversation.len();

        if error_changed {
            if let Some(error) = &view.error {
                writeln!(out, "⚠️  {}", error)?;
            }
            self.last_error = view.error.clone();
        }

        let settled = !view.is_loading && (self.was_loading || has_new_turns || error_changed);
        self.was_loading = view.is_loading;
        out.flush()?;
        Ok(settled)
    }
}

/// Print the numbered quick replies.
pub fn print_prompts(prompts: &[String], out: &mut impl Write) -> io::Result<()> {
    if prompts.is_empty() {
        return Ok(());
    }
    writeln!(out, "Suggestions (type /N to send one):")?;
    for (i, prompt) in prompts.iter().enumerate() {
        writeln!(out, "  /{}  {}", i + 1, prompt)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxychat_core::{Conversation, Turn};

    fn output(buf: &[u8]) -> String {
        String::from_utf8(buf.to_vec()).unwrap()
    }

    #[test]
    fn test_renders_only_new_agent_turns() {
        let mut renderer = TerminalRenderer::new();
        let mut buf = Vec::new();

        let pending = ChatView {
            conversation: Conversation::new().append(Turn::user("hi")),
            is_loading: true,
            ..ChatView::default()
        };
        assert!(!renderer.render(&pending, &mut buf).unwrap());

        let answered = ChatView {
            conversation: pending.conversation.clone().append(Turn::agent("hello there")),
            ..ChatView::default()
        };
        assert!(renderer.render(&answered, &mut buf).unwrap());

        let text = output(&buf);
        assert!(text.contains("Thinking"));
        assert!(text.contains("hello there"));
        assert!(!text.contains("hi\n"));

        let mut again = Vec::new();
        renderer.render(&answered, &mut again).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_renders_error_once() {
        let mut renderer = TerminalRenderer::new();
        let mut buf = Vec::new();

        let failed = ChatView {
            conversation: Conversation::new().append(Turn::user("hi")),
            error: Some("The agent service responded with status 500.".to_string()),
            ..ChatView::default()
        };
        renderer.render(&failed, &mut buf).unwrap();
        renderer.render(&failed, &mut buf).unwrap();

        assert_eq!(output(&buf).matches("status 500").count(), 1);
    }

    #[test]
    fn test_print_prompts() {
        let mut buf = Vec::new();
        print_prompts(&["First".to_string(), "Second".to_string()], &mut buf).unwrap();

        let text = output(&buf);
        assert!(text.contains("/1  First"));
        assert!(text.contains("/2  Second"));
    }
}
