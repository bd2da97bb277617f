#![forbid(unsafe_code)]

//! Named, prioritised filters over player input and turn output.
//!
//! # Role in Vorple
//! Input filters see a command line before it reaches the engine; output
//! filters see each [`TurnContent`] before it is rendered. Stories use them
//! to rewrite commands, restyle output, or swallow a turn entirely.
//!
//! # Design
//! Filters live in one list in registration order. A run selects the
//! filters of one direction and stable-sorts them by descending priority, so
//! ties keep registration order. Re-registering a name replaces that entry in
//! place. Names are unique across both directions.
//!
//! A filter answers with a [`FilterAction`]: `Continue` hands a new value to
//! the next filter, `Unchanged` passes the current one along, and `Suppress`
//! stops the run.
//!
//! Filters can't reach the session. They queue commands through
//! [`FilterContext::send_command`] and the session picks them up once the
//! run is over.

use std::cmp::Reverse;
use std::fmt;

use vorple_core::IdGenerator;

use crate::queue::{CommandOptions, QueuedCommand};
use crate::turn::{TurnContent, TurnState};

/// What a filter did with its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction<T> {
    /// Pass this value to the next filter.
    Continue(T),
    /// Pass the current value along untouched.
    Unchanged,
    /// Discard the input or turn.
    Suppress,
}

impl<T> From<T> for FilterAction<T> {
    fn from(value: T) -> Self {
        Self::Continue(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterDirection {
    Input,
    Output,
}

impl FilterDirection {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// Registration options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Generated when absent.
    pub name: Option<String>,
    /// Higher runs first.
    pub priority: i32,
}

impl FilterOptions {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            priority: 0,
        }
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

type InputFilter = Box<dyn FnMut(&str, &mut FilterContext<'_>) -> FilterAction<String>>;
type OutputFilter = Box<dyn FnMut(&TurnContent, &mut FilterContext<'_>) -> FilterAction<TurnContent>>;

/// A filter function. The variant decides the direction.
pub enum FilterFn {
    Input(InputFilter),
    Output(OutputFilter),
}

impl FilterFn {
    pub fn input<F>(filter: F) -> Self
    where
        F: FnMut(&str, &mut FilterContext<'_>) -> FilterAction<String> + 'static,
    {
        Self::Input(Box::new(filter))
    }

    pub fn output<F>(filter: F) -> Self
    where
        F: FnMut(&TurnContent, &mut FilterContext<'_>) -> FilterAction<TurnContent> + 'static,
    {
        Self::Output(Box::new(filter))
    }

    #[must_use]
    pub const fn direction(&self) -> FilterDirection {
        match self {
            Self::Input(_) => FilterDirection::Input,
            Self::Output(_) => FilterDirection::Output,
        }
    }
}

impl fmt::Debug for FilterFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterFn::{:?}", self.direction())
    }
}

/// Metadata handed to every filter of a run.
pub struct FilterContext<'a> {
    /// State of the turn being filtered.
    pub turn: &'a TurnState,
    /// The input before any filter touched it.
    pub original: Option<&'a str>,
    /// The player caused this.
    pub user_action: bool,
    outbox: &'a mut Vec<QueuedCommand>,
}

impl<'a> FilterContext<'a> {
    pub fn new(
        turn: &'a TurnState,
        original: Option<&'a str>,
        user_action: bool,
        outbox: &'a mut Vec<QueuedCommand>,
    ) -> Self {
        Self {
            turn,
            original,
            user_action,
            outbox,
        }
    }

    /// Queue a command to be sent after this run.
    pub fn send_command(&mut self, text: impl Into<String>, options: CommandOptions) {
        self.outbox.push(QueuedCommand::new(text, options));
    }
}

/// Identifies a registered filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterHandle {
    pub name: String,
    pub priority: i32,
    pub direction: FilterDirection,
}

/// Result of running a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome<T> {
    Passed(T),
    /// A filter vetoed; carries its name.
    Suppressed(String),
}

impl<T> FilterOutcome<T> {
    #[must_use]
    pub fn passed(self) -> Option<T> {
        match self {
            Self::Passed(value) => Some(value),
            Self::Suppressed(_) => None,
        }
    }
}

#[derive(Debug)]
struct Entry {
    name: String,
    priority: i32,
    filter: FilterFn,
}

/// All registered filters.
#[derive(Debug)]
pub struct FilterRegistry {
    entries: Vec<Entry>,
    ids: IdGenerator,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ids(IdGenerator::new())
    }

    /// A registry that draws generated names from `ids`.
    #[must_use]
    pub fn with_ids(ids: IdGenerator) -> Self {
        Self {
            entries: Vec::new(),
            ids,
        }
    }

    pub fn register(&mut self, filter: FilterFn, options: FilterOptions) -> FilterHandle {
        let name = options
            .name
            .unwrap_or_else(|| format!("filter_{}", self.ids.generate()));
        let direction = filter.direction();
        let handle = FilterHandle {
            name: name.clone(),
            priority: options.priority,
            direction,
        };

        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            tracing::debug!(target: "vorple.filter", name = %name, direction = direction.name(), "filter replaced");
            entry.priority = options.priority;
            entry.filter = filter;
        } else {
            tracing::debug!(target: "vorple.filter", name = %name, direction = direction.name(), priority = options.priority, "filter registered");
            self.entries.push(Entry {
                name,
                priority: options.priority,
                filter,
            });
        }
        handle
    }

    /// Returns false if no filter had that name.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        before != self.entries.len()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of one direction's filters, in the order they run.
    #[must_use]
    pub fn names(&self, direction: FilterDirection) -> Vec<&str> {
        self.run_order(direction)
            .into_iter()
            .map(|i| self.entries[i].name.as_str())
            .collect()
    }

    fn run_order(&self, direction: FilterDirection) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.entries.len())
            .filter(|&i| self.entries[i].filter.direction() == direction)
            .collect();
        order.sort_by_key(|&i| Reverse(self.entries[i].priority));
        order
    }

    pub fn run_input(&mut self, text: &str, ctx: &mut FilterContext<'_>) -> FilterOutcome<String> {
        let mut current = text.to_owned();
        for i in self.run_order(FilterDirection::Input) {
            let entry = &mut self.entries[i];
            let FilterFn::Input(filter) = &mut entry.filter else {
                continue;
            };
            match filter(&current, ctx) {
                FilterAction::Continue(next) => current = next,
                FilterAction::Unchanged => {}
                FilterAction::Suppress => {
                    tracing::debug!(target: "vorple.filter", name = %entry.name, "input suppressed");
                    return FilterOutcome::Suppressed(entry.name.clone());
                }
            }
        }
        FilterOutcome::Passed(current)
    }

    pub fn run_output(
        &mut self,
        content: TurnContent,
        ctx: &mut FilterContext<'_>,
    ) -> FilterOutcome<TurnContent> {
        let mut current = content;
        for i in self.run_order(FilterDirection::Output) {
            let entry = &mut self.entries[i];
            let FilterFn::Output(filter) = &mut entry.filter else {
                continue;
            };
            match filter(&current, ctx) {
                FilterAction::Continue(next) => current = next,
                FilterAction::Unchanged => {}
                FilterAction::Suppress => {
                    tracing::debug!(target: "vorple.filter", name = %entry.name, "turn suppressed");
                    return FilterOutcome::Suppressed(entry.name.clone());
                }
            }
        }
        FilterOutcome::Passed(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::{TurnMode, TurnStructure};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn run_input(registry: &mut FilterRegistry, text: &str) -> (FilterOutcome<String>, Vec<QueuedCommand>) {
        let turn = TurnState::default();
        let mut outbox = Vec::new();
        let mut ctx = FilterContext::new(&turn, Some(text), true, &mut outbox);
        let outcome = registry.run_input(text, &mut ctx);
        (outcome, outbox)
    }

    fn run_output(registry: &mut FilterRegistry, html: &str) -> FilterOutcome<TurnContent> {
        let turn = TurnState::default();
        let mut outbox = Vec::new();
        let mut ctx = FilterContext::new(&turn, None, false, &mut outbox);
        let content = TurnContent::from_structure(
            TurnStructure {
                content: html.into(),
                ..TurnStructure::default()
            },
            TurnMode::Line,
        );
        registry.run_output(content, &mut ctx)
    }

    fn edit_content(f: impl Fn(&str) -> String + 'static) -> FilterFn {
        FilterFn::output(move |turn, _| {
            let mut next = turn.clone();
            next.content.text = f(&turn.content.text);
            FilterAction::Continue(next)
        })
    }

    #[test]
    fn higher_priority_runs_first() {
        let mut registry = FilterRegistry::new();
        registry.register(
            edit_content(|s| format!("{s}!")),
            FilterOptions::named("B").with_priority(5),
        );
        registry.register(
            edit_content(str::to_uppercase),
            FilterOptions::named("A").with_priority(10),
        );

        let out = run_output(&mut registry, "hello").passed().unwrap();
        assert_eq!(out.content.text, "HELLO!");
    }

    #[test]
    fn same_name_replaces_in_place() {
        let mut registry = FilterRegistry::new();
        registry.register(FilterFn::input(|s, _| format!("{s}1").into()), FilterOptions::named("x"));
        registry.register(FilterFn::input(|s, _| format!("{s}y").into()), FilterOptions::named("y"));
        registry.register(FilterFn::input(|s, _| format!("{s}2").into()), FilterOptions::named("x"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(FilterDirection::Input), vec!["x", "y"]);
        assert_eq!(run_input(&mut registry, "").0, FilterOutcome::Passed("2y".into()));
    }

    #[test]
    fn ties_keep_registration_order() {
        let mut registry = FilterRegistry::new();
        for name in ["first", "second", "third"] {
            registry.register(FilterFn::input(|_, _| FilterAction::Unchanged), FilterOptions::named(name));
        }
        assert_eq!(
            registry.names(FilterDirection::Input),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn suppress_short_circuits() {
        let mut registry = FilterRegistry::new();
        registry.register(
            FilterFn::input(|_, _| FilterAction::Suppress),
            FilterOptions::named("veto").with_priority(1),
        );
        registry.register(
            FilterFn::input(|_, _| panic!("must not run after a veto")),
            FilterOptions::named("late"),
        );
        assert_eq!(
            run_input(&mut registry, "xyzzy").0,
            FilterOutcome::Suppressed("veto".into())
        );
    }

    #[test]
    fn directions_do_not_mix() {
        let mut registry = FilterRegistry::new();
        registry.register(FilterFn::input(|_, _| FilterAction::Suppress), FilterOptions::named("in"));
        assert!(run_output(&mut registry, "text").passed().is_some());
        assert_eq!(registry.names(FilterDirection::Output), Vec::<&str>::new());
    }

    #[test]
    fn generated_names_are_unique() {
        let mut registry = FilterRegistry::with_ids(IdGenerator::with_seed(7));
        let a = registry.register(FilterFn::input(|_, _| FilterAction::Unchanged), FilterOptions::default());
        let b = registry.register(FilterFn::input(|_, _| FilterAction::Unchanged), FilterOptions::default());
        assert!(a.name.starts_with("filter_"));
        assert_ne!(a.name, b.name);
        assert!(registry.unregister(&a.name));
        assert!(!registry.unregister(&a.name));
        assert!(registry.contains(&b.name));
    }

    #[test]
    fn filters_see_the_original_and_can_queue_commands() {
        let mut registry = FilterRegistry::new();
        registry.register(
            FilterFn::input(|_, _| FilterAction::Continue("x".into())),
            FilterOptions::named("rewrite").with_priority(1),
        );
        registry.register(
            FilterFn::input(|text, ctx| {
                assert_eq!(text, "x");
                assert_eq!(ctx.original, Some("examine lamp"));
                ctx.send_command("inventory", CommandOptions::silent());
                FilterAction::Unchanged
            }),
            FilterOptions::named("observer"),
        );

        let (outcome, outbox) = run_input(&mut registry, "examine lamp");
        assert_eq!(outcome, FilterOutcome::Passed("x".into()));
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].text, "inventory");
    }

    proptest! {
        /// Distinct priorities run strictly descending, whatever the
        /// registration order.
        #[test]
        fn runs_in_descending_priority(priorities in proptest::collection::hash_set(-50i32..50, 1..8)) {
            let mut registry = FilterRegistry::new();
            for &priority in &priorities {
                registry.register(
                    FilterFn::input(move |s, _| format!("{s}{priority},").into()),
                    FilterOptions::named(format!("p{priority}")).with_priority(priority),
                );
            }

            let mut expected: Vec<i32> = priorities.iter().copied().collect();
            expected.sort_unstable_by(|a, b| b.cmp(a));
            let expected: String = expected.iter().map(|p| format!("{p},")).collect();

            let (outcome, _) = run_input(&mut registry, "");
            prop_assert_eq!(outcome, FilterOutcome::Passed(expected));
        }
    }
}
