#![forbid(unsafe_code)]

//! Story-supplied code that runs once the current turn has rendered.
//!
//! Each entry keeps the source snippet it came from so a failure can be
//! reported with it. A failing entry doesn't stop the ones after it.

use std::collections::VecDeque;
use std::fmt;

use vorple_core::VorpleError;

type Job = Box<dyn FnOnce() -> Result<(), String>>;

#[derive(Default)]
pub struct EvalQueue {
    jobs: VecDeque<(String, Job)>,
}

impl fmt::Debug for EvalQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.jobs.iter().map(|(snippet, _)| snippet))
            .finish()
    }
}

impl EvalQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<F>(&mut self, snippet: impl Into<String>, job: F)
    where
        F: FnOnce() -> Result<(), String> + 'static,
    {
        self.jobs.push_back((snippet.into(), Box::new(job)));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Run and drop every queued entry, oldest first.
    ///
    /// Returns one [`VorpleError::UserCode`] per failed entry.
    pub fn run_all(&mut self) -> Vec<VorpleError> {
        let mut errors = Vec::new();
        while let Some((snippet, job)) = self.jobs.pop_front() {
            if let Err(message) = job() {
                errors.push(VorpleError::user_code(snippet, message));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn failures_do_not_stop_later_entries() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let mut queue = EvalQueue::new();

        let log = Rc::clone(&ran);
        queue.push("first()", move || {
            log.borrow_mut().push(1);
            Ok(())
        });
        queue.push("broken(", || Err("unexpected end of input".into()));
        let log = Rc::clone(&ran);
        queue.push("third()", move || {
            log.borrow_mut().push(3);
            Ok(())
        });

        let errors = queue.run_all();
        assert_eq!(*ran.borrow(), vec![1, 3]);
        assert_eq!(
            errors,
            vec![VorpleError::user_code("broken(", "unexpected end of input")]
        );
        assert!(queue.is_empty());
    }
}
