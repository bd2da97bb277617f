#![forbid(unsafe_code)]

//! Commands waiting for the engine.
//!
//! Two FIFO queues: primary commands drain before regular ones. The queue
//! itself never dispatches; the session pops one entry per ready signal.

use std::collections::VecDeque;

use crate::turn::TurnState;

/// Per-command flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandOptions {
    pub hide_command: bool,
    pub hide_output: bool,
    pub skip_filters: bool,
    /// Run before any regular command.
    pub primary: bool,
    /// Came from the player, e.g. a command link.
    pub user_action: bool,
}

impl CommandOptions {
    /// Hidden command, hidden output, no filters.
    #[must_use]
    pub const fn silent() -> Self {
        Self {
            hide_command: true,
            hide_output: true,
            skip_filters: true,
            primary: false,
            user_action: false,
        }
    }

    #[must_use]
    pub const fn hide_command(mut self, on: bool) -> Self {
        self.hide_command = on;
        self
    }

    #[must_use]
    pub const fn hide_output(mut self, on: bool) -> Self {
        self.hide_output = on;
        self
    }

    #[must_use]
    pub const fn skip_filters(mut self, on: bool) -> Self {
        self.skip_filters = on;
        self
    }

    #[must_use]
    pub const fn primary(mut self, on: bool) -> Self {
        self.primary = on;
        self
    }

    #[must_use]
    pub const fn user_action(mut self, on: bool) -> Self {
        self.user_action = on;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    pub text: String,
    pub options: CommandOptions,
}

impl QueuedCommand {
    pub fn new(text: impl Into<String>, options: CommandOptions) -> Self {
        Self {
            text: text.into(),
            options,
        }
    }
}

#[derive(Debug, Default)]
pub struct CommandQueue {
    primary: VecDeque<QueuedCommand>,
    regular: VecDeque<QueuedCommand>,
    /// Turn state of the main flow while primary commands run.
    main_turn: Option<TurnState>,
}

impl CommandQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: QueuedCommand) {
        tracing::trace!(target: "vorple.queue", text = %command.text, primary = command.options.primary, "command queued");
        if command.options.primary {
            self.primary.push_back(command);
        } else {
            self.regular.push_back(command);
        }
    }

    /// Pop the next command to dispatch.
    ///
    /// The first primary command after regular flow snapshots `turn`; the
    /// first regular command after primaries restores it.
    pub fn next(&mut self, turn: &mut TurnState) -> Option<QueuedCommand> {
        if let Some(command) = self.primary.pop_front() {
            if self.main_turn.is_none() {
                self.main_turn = Some(turn.clone());
            }
            return Some(command);
        }

        let command = self.regular.pop_front()?;
        if let Some(saved) = self.main_turn.take() {
            *turn = saved;
        }
        Some(command)
    }

    /// Drop every queued command.
    pub fn clear(&mut self) {
        self.primary.clear();
        self.regular.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.primary.len() + self.regular.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::TurnType;

    fn texts(queue: &mut CommandQueue) -> Vec<String> {
        let mut turn = TurnState::default();
        std::iter::from_fn(|| queue.next(&mut turn).map(|c| c.text)).collect()
    }

    #[test]
    fn fifo_within_a_queue() {
        let mut queue = CommandQueue::new();
        for text in ["north", "take lamp", "south"] {
            queue.push(QueuedCommand::new(text, CommandOptions::default()));
        }
        assert_eq!(texts(&mut queue), vec!["north", "take lamp", "south"]);
    }

    #[test]
    fn primary_commands_jump_the_queue() {
        let mut queue = CommandQueue::new();
        queue.push(QueuedCommand::new("regular", CommandOptions::default()));
        queue.push(QueuedCommand::new("urgent", CommandOptions::silent().primary(true)));
        assert_eq!(texts(&mut queue), vec!["urgent", "regular"]);
    }

    #[test]
    fn turn_state_is_restored_after_primaries() {
        let mut queue = CommandQueue::new();
        queue.push(QueuedCommand::new("a", CommandOptions::default().primary(true)));
        queue.push(QueuedCommand::new("b", CommandOptions::default()));

        let mut turn = TurnState {
            turn_type: TurnType::Undo,
            ..TurnState::default()
        };
        let _ = queue.next(&mut turn);
        turn.turn_type = TurnType::Meta;
        turn.command_visible = false;

        let _ = queue.next(&mut turn);
        assert_eq!(turn.turn_type, TurnType::Undo);
        assert!(turn.command_visible);
    }

    #[test]
    fn clear_empties_both_queues() {
        let mut queue = CommandQueue::new();
        queue.push(QueuedCommand::new("a", CommandOptions::default().primary(true)));
        queue.push(QueuedCommand::new("b", CommandOptions::default()));
        assert_eq!(queue.len(), 2);
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn silent_options() {
        let options = CommandOptions::silent();
        assert!(options.hide_command && options.hide_output && options.skip_filters);
        assert!(!options.primary);
    }
}
