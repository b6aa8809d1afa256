//! Background activities that can be cancelled before they fire.
//!
//! Each activity runs on its own thread and waits on a cancel channel between
//! runs, so dropping the sender wakes it up immediately. Cancelling joins the
//! thread: once [`Activity::cancel`] returns the task will never run again.

use std::{
    ops::ControlFlow,
    sync::mpsc::{self, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

#[derive(Debug)]
pub struct Activity {
    name: &'static str,
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Activity {
    /// runs `task` every `period` until it breaks or the activity is cancelled
    pub fn every<F>(name: &'static str, period: Duration, mut task: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            // deadlines are computed from the start so slow runs don't drift
            let mut deadline = Instant::now();
            loop {
                deadline += period;
                match cancelled.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Err(RecvTimeoutError::Timeout) => {
                        if task().is_break() {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            log::debug!("{name} activity stopped");
        });
        Self {
            name,
            cancel: Some(cancel),
            handle: Some(handle),
        }
    }

    /// runs `task` once after `delay` unless cancelled first
    pub fn once<F>(name: &'static str, delay: Duration, task: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = cancelled.recv_timeout(delay) {
                task();
            } else {
                log::debug!("{name} activity cancelled");
            }
        });
        Self {
            name,
            cancel: Some(cancel),
            handle: Some(handle),
        }
    }

    /// stops the activity and waits for a run that is already in progress
    ///
    /// cancelling twice, or after the task has fired, does nothing
    pub fn cancel(&mut self) {
        drop(self.cancel.take());
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                log::error!("{} activity panicked", self.name);
            }
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for Activity {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    const PERIOD: Duration = Duration::from_millis(10);

    #[test]
    fn periodic_task_stops_itself() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let mut activity = Activity::every("test", PERIOD, move || {
            if counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        let deadline = Instant::now() + Duration::from_secs(5);
        while !activity.is_finished() && Instant::now() < deadline {
            thread::sleep(PERIOD);
        }
        activity.cancel();
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn cancelled_one_shot_never_runs() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let mut activity = Activity::once("test", Duration::from_secs(60), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        activity.cancel();
        assert!(activity.is_finished());
        activity.cancel();
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn one_shot_runs_once_and_cancel_after_is_a_no_op() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let mut activity = Activity::once("test", PERIOD, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let deadline = Instant::now() + Duration::from_secs(5);
        while !activity.is_finished() && Instant::now() < deadline {
            thread::sleep(PERIOD);
        }
        activity.cancel();
        activity.cancel();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_cancels_periodic_task() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let activity = Activity::every("test", Duration::from_secs(60), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });
        drop(activity);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
