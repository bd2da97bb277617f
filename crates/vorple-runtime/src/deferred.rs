#![forbid(unsafe_code)]

//! One-shot completion signals for asynchronous hook results.
//!
//! A listener that needs time before the engine may continue (an animation,
//! a confirmation dialog) returns a [`Deferred`] and keeps the matching
//! [`DeferredSource`]. The session parks the engine signal that depends on it
//! and delivers it from [`Session::pump`](crate::Session::pump) once the
//! source is resolved.
//!
//! # Design
//!
//! The pair follows the source/token split: the source is the only handle
//! that can settle, tokens only observe. Both sides share `Rc<RefCell<..>>`
//! storage, since the whole runtime is single-threaded.
//!
//! A [`Deferred`] is also a [`Future`], so hosts running an executor can await
//! it directly instead of polling [`Deferred::is_settled`].
//!
//! # Failure Modes
//!
//! - **Never resolved**: dropping the source without resolving leaves every
//!   token pending forever. Only the signal that waits on it stalls.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Debug, Default)]
struct Slot {
    settled: bool,
    wakers: Vec<Waker>,
}

/// Observer side of a one-shot signal.
///
/// Cloning creates another observer of the same signals. A deferred can
/// combine several signals, in which case it settles once all of them have.
#[derive(Debug, Clone, Default)]
pub struct Deferred {
    slots: Vec<Rc<RefCell<Slot>>>,
}

/// Control side of a one-shot signal.
#[derive(Debug)]
pub struct DeferredSource {
    slot: Rc<RefCell<Slot>>,
}

impl DeferredSource {
    /// Create an unresolved source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot::default())),
        }
    }

    /// Obtain an observer of this source.
    #[must_use]
    pub fn deferred(&self) -> Deferred {
        Deferred {
            slots: vec![Rc::clone(&self.slot)],
        }
    }

    /// Settle the signal. Resolving twice is harmless.
    pub fn resolve(&self) {
        let wakers = {
            let mut slot = self.slot.borrow_mut();
            slot.settled = true;
            std::mem::take(&mut slot.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.slot.borrow().settled
    }
}

impl Default for DeferredSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a source and its first observer.
#[must_use]
pub fn deferred() -> (DeferredSource, Deferred) {
    let source = DeferredSource::new();
    let deferred = source.deferred();
    (source, deferred)
}

impl Deferred {
    /// A deferred that is already settled.
    #[must_use]
    pub fn settled() -> Self {
        Self::default()
    }

    /// A deferred that settles once every one of `parts` has.
    #[must_use]
    pub fn all(parts: impl IntoIterator<Item = Self>) -> Self {
        Self {
            slots: parts.into_iter().flat_map(|d| d.slots).collect(),
        }
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slots.iter().all(|slot| slot.borrow().settled)
    }
}

impl Future for Deferred {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut pending = false;
        for slot in &self.slots {
            let mut slot = slot.borrow_mut();
            if !slot.settled {
                pending = true;
                if !slot.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    slot.wakers.push(cx.waker().clone());
                }
            }
        }

        if pending { Poll::Pending } else { Poll::Ready(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll_once(deferred: &mut Deferred) -> Poll<()> {
        let mut cx = Context::from_waker(Waker::noop());
        Pin::new(deferred).poll(&mut cx)
    }

    #[test]
    fn unresolved_until_source_resolves() {
        let (source, deferred) = deferred();
        assert!(!deferred.is_settled());
        source.resolve();
        assert!(deferred.is_settled());
        assert!(source.is_resolved());
    }

    #[test]
    fn clones_observe_the_same_signal() {
        let (source, a) = deferred();
        let b = a.clone();
        source.resolve();
        assert!(a.is_settled() && b.is_settled());
    }

    #[test]
    fn all_waits_for_every_part() {
        let (first, a) = deferred();
        let (second, b) = deferred();
        let both = Deferred::all([a, b]);

        first.resolve();
        assert!(!both.is_settled());
        second.resolve();
        assert!(both.is_settled());
    }

    #[test]
    fn empty_combination_is_settled() {
        assert!(Deferred::all(Vec::new()).is_settled());
        assert!(Deferred::settled().is_settled());
    }

    #[test]
    fn dropped_source_never_settles() {
        let (source, deferred) = deferred();
        drop(source);
        assert!(!deferred.is_settled());
    }

    #[test]
    fn polls_as_a_future() {
        let (source, mut deferred) = deferred();
        assert_eq!(poll_once(&mut deferred), Poll::Pending);
        source.resolve();
        assert_eq!(poll_once(&mut deferred), Poll::Ready(()));
    }
}
