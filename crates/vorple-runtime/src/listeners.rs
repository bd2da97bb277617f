#![forbid(unsafe_code)]

//! Listener registry for the session's lifecycle hooks.
//!
//! Six event categories exist. `init` fires when the session starts,
//! `expectCommand`/`expectKeypress` when the engine waits for input,
//! `submitCommand`/`submitKeypress` just before input reaches the engine, and
//! `quit` when the story ends.
//!
//! A listener may return [`HookResult::Deferred`] to hold back the engine
//! signal that follows the hook. Listeners run in registration order; every
//! listener of a category runs even when an earlier one deferred.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use vorple_core::{KeyCode, VorpleError};

use crate::deferred::Deferred;

/// The hook categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Init,
    ExpectCommand,
    SubmitCommand,
    ExpectKeypress,
    SubmitKeypress,
    Quit,
}

impl EventCategory {
    pub const ALL: [Self; 6] = [
        Self::Init,
        Self::ExpectCommand,
        Self::SubmitCommand,
        Self::ExpectKeypress,
        Self::SubmitKeypress,
        Self::Quit,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ExpectCommand => "expectCommand",
            Self::SubmitCommand => "submitCommand",
            Self::ExpectKeypress => "expectKeypress",
            Self::SubmitKeypress => "submitKeypress",
            Self::Quit => "quit",
        }
    }

    /// Look up a category by name. `action` names the operation for the error
    /// message ("add" or "remove").
    pub fn parse(name: &str, action: &'static str) -> Result<Self, VorpleError> {
        if name.is_empty() {
            return Err(VorpleError::MissingEventName { action });
        }
        Self::ALL
            .into_iter()
            .find(|category| category.name() == name)
            .ok_or_else(|| VorpleError::UnknownEvent {
                action,
                name: name.to_owned(),
            })
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Input carried by a submit hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookInput {
    Text(String),
    Key(KeyCode),
}

/// What a listener is told about the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookMeta {
    pub category: EventCategory,
    /// Input after filtering.
    pub input: Option<HookInput>,
    /// Input as first received.
    pub original: Option<HookInput>,
    /// The player caused this, as opposed to story code or a queue.
    pub user_action: bool,
    /// A keypress that was really a mouse click.
    pub mouse_click: bool,
    /// Neither the command nor its output will be shown.
    pub silent: bool,
}

impl HookMeta {
    #[must_use]
    pub const fn new(category: EventCategory) -> Self {
        Self {
            category,
            input: None,
            original: None,
            user_action: false,
            mouse_click: false,
            silent: false,
        }
    }
}

/// What a listener returns.
#[derive(Debug, Clone, Default)]
pub enum HookResult {
    /// Finished; the engine may continue.
    #[default]
    Done,
    /// The engine must wait until this settles.
    Deferred(Deferred),
}

impl From<()> for HookResult {
    fn from((): ()) -> Self {
        Self::Done
    }
}

impl From<Deferred> for HookResult {
    fn from(deferred: Deferred) -> Self {
        Self::Deferred(deferred)
    }
}

type SharedListener = Rc<RefCell<dyn FnMut(&HookMeta) -> HookResult>>;

/// Identifies one registered listener across all of its categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Returned by registration; removes the listener from everything it was
/// registered for.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "dropping the handle makes the listener impossible to remove individually"]
pub struct ListenerHandle {
    pub id: ListenerId,
    pub categories: Vec<EventCategory>,
}

/// Registered listeners, per category, in registration order.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: AHashMap<EventCategory, Vec<(ListenerId, SharedListener)>>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<_> = self
            .listeners
            .iter()
            .map(|(category, list)| (category.name(), list.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &counts)
            .finish()
    }
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one listener for several categories.
    pub fn add<F, R>(&mut self, categories: &[EventCategory], mut listener: F) -> ListenerHandle
    where
        F: FnMut(&HookMeta) -> R + 'static,
        R: Into<HookResult>,
    {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        let shared: SharedListener =
            Rc::new(RefCell::new(move |meta: &HookMeta| -> HookResult { listener(meta).into() }));

        let mut registered = Vec::with_capacity(categories.len());
        for &category in categories {
            if registered.contains(&category) {
                continue;
            }
            self.listeners
                .entry(category)
                .or_default()
                .push((id, Rc::clone(&shared)));
            registered.push(category);
        }

        ListenerHandle {
            id,
            categories: registered,
        }
    }

    /// Remove a listener from the given categories.
    ///
    /// Returns true if it was removed from at least one. An empty category
    /// list trivially succeeds.
    pub fn remove(&mut self, categories: &[EventCategory], id: ListenerId) -> bool {
        if categories.is_empty() {
            return true;
        }

        let mut removed = false;
        for category in categories {
            if let Some(list) = self.listeners.get_mut(category) {
                let before = list.len();
                list.retain(|(lid, _)| *lid != id);
                removed |= list.len() != before;
            }
        }
        removed
    }

    /// Remove a listener from every category.
    pub fn remove_everywhere(&mut self, id: ListenerId) -> bool {
        self.remove(&EventCategory::ALL, id)
    }

    #[must_use]
    pub fn count(&self, category: EventCategory) -> usize {
        self.listeners.get(&category).map_or(0, Vec::len)
    }

    /// Run every listener of a category and collect the deferred results.
    pub fn trigger(&mut self, category: EventCategory, meta: &HookMeta) -> Vec<Deferred> {
        let Some(list) = self.listeners.get(&category) else {
            return Vec::new();
        };
        let snapshot: Vec<SharedListener> = list.iter().map(|(_, l)| Rc::clone(l)).collect();

        let _span = tracing::debug_span!(
            "vorple.hook",
            category = category.name(),
            listeners = snapshot.len()
        )
        .entered();

        let mut pending = Vec::new();
        for listener in snapshot {
            let Ok(mut listener) = listener.try_borrow_mut() else {
                tracing::warn!(target: "vorple.session", category = category.name(), "listener re-entered; skipped");
                continue;
            };
            let mut meta = meta.clone();
            meta.category = category;
            if let HookResult::Deferred(deferred) = (&mut *listener)(&meta)
                && !deferred.is_settled()
            {
                pending.push(deferred);
            }
        }
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::deferred;

    #[test]
    fn category_names_round_trip() {
        for category in EventCategory::ALL {
            assert_eq!(EventCategory::parse(category.name(), "add"), Ok(category));
        }
    }

    #[test]
    fn unknown_and_missing_names_are_configuration_errors() {
        let err = EventCategory::parse("keyup", "add").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Tried to add a listener to an unknown event keyup"
        );
        assert!(err.is_configuration());

        let err = EventCategory::parse("", "remove").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Event name missing when trying to remove an event listener"
        );
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        for n in 0..3 {
            let log = Rc::clone(&log);
            let _ = registry.add(&[EventCategory::ExpectCommand], move |_| log.borrow_mut().push(n));
        }

        registry.trigger(EventCategory::ExpectCommand, &HookMeta::new(EventCategory::ExpectCommand));
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn one_listener_many_categories() {
        let hits = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        let seen = Rc::clone(&hits);
        let handle = registry.add(
            &[EventCategory::Init, EventCategory::Quit, EventCategory::Init],
            move |meta| seen.borrow_mut().push(meta.category),
        );
        assert_eq!(handle.categories, vec![EventCategory::Init, EventCategory::Quit]);

        registry.trigger(EventCategory::Quit, &HookMeta::new(EventCategory::Init));
        assert_eq!(*hits.borrow(), vec![EventCategory::Quit]);

        assert!(registry.remove(&[EventCategory::Init], handle.id));
        assert!(!registry.remove(&[EventCategory::Init], handle.id));
        assert!(registry.remove_everywhere(handle.id));
        assert_eq!(registry.count(EventCategory::Quit), 0);
    }

    #[test]
    fn removing_from_nothing_succeeds() {
        let mut registry = ListenerRegistry::new();
        assert!(registry.remove(&[], ListenerId(99)));
    }

    #[test]
    fn trigger_collects_only_unsettled_deferreds() {
        let mut registry = ListenerRegistry::new();
        let (source, pending) = deferred();
        let _ = registry.add(&[EventCategory::SubmitKeypress], move |_| pending.clone());
        let _ = registry.add(&[EventCategory::SubmitKeypress], |_| Deferred::settled());
        let _ = registry.add(&[EventCategory::SubmitKeypress], |_| ());

        let waiting = registry.trigger(
            EventCategory::SubmitKeypress,
            &HookMeta::new(EventCategory::SubmitKeypress),
        );
        assert_eq!(waiting.len(), 1);
        source.resolve();
        assert!(waiting[0].is_settled());
    }
}
