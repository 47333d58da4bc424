//! Periodic drivers.
//!
//! [`Ticker`] is the foreground fixed-step accumulator polled from the
//! render loop. [`Driver`] owns a background thread that calls a step
//! closure on an interval until stopped, dropped, or the step breaks.

use log::{debug, warn};
use std::ops::ControlFlow;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug)]
pub struct Ticker {
    step: Duration,
    accum: Duration,
    running: bool,
}

impl Ticker {
    pub fn new(step: Duration) -> Self {
        Self {
            step: step.max(Duration::from_millis(1)),
            accum: Duration::ZERO,
            running: false,
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// No-op when already running.
    pub fn start(&mut self) {
        if !self.running {
            self.accum = Duration::ZERO;
            self.running = true;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.accum = Duration::ZERO;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Feed real elapsed time; returns how many whole steps are due.
    pub fn due(&mut self, real_dt: Duration) -> u32 {
        if !self.running {
            return 0;
        }
        self.accum = self.accum.saturating_add(real_dt);
        let mut n = 0;
        while self.accum >= self.step {
            self.accum -= self.step;
            n += 1;
        }
        n
    }
}

pub struct Driver {
    name: String,
    interval: Duration,
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Driver {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            cancel: None,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Arms the driver. Returns `false` (and drops `step`) if it is already
    /// running, so a driver never has two threads.
    pub fn start<F>(&mut self, mut step: F) -> std::io::Result<bool>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        if self.is_running() {
            return Ok(false);
        }
        self.reap();

        let (tx, rx) = mpsc::channel::<()>();
        let interval = self.interval;
        let name = self.name.clone();
        let handle = thread::Builder::new().name(self.name.clone()).spawn(move || loop {
            match rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    if step().is_break() {
                        debug!("{name}: step asked to stop");
                        break;
                    }
                }
                // Explicit stop or the owner went away.
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        })?;

        self.cancel = Some(tx);
        self.handle = Some(handle);
        Ok(true)
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
        self.reap();
    }

    /// Block until the worker exits on its own. Returns `false` if the step
    /// panicked.
    pub fn join(&mut self) -> bool {
        // The sender must outlive the wait: dropping it stops the worker.
        let clean = self.wait();
        self.cancel = None;
        clean
    }

    fn reap(&mut self) {
        self.cancel = None;
        self.wait();
    }

    fn wait(&mut self) -> bool {
        match self.handle.take().map(JoinHandle::join) {
            Some(Err(_)) => {
                warn!("{}: worker panicked", self.name);
                false
            }
            _ => true,
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn ticker_counts_whole_steps() {
        let mut t = Ticker::new(Duration::from_millis(100));
        assert_eq!(t.due(Duration::from_millis(500)), 0, "not started");
        t.start();
        assert_eq!(t.due(Duration::from_millis(250)), 2);
        assert_eq!(t.due(Duration::from_millis(50)), 1);
        t.start();
        assert_eq!(t.due(Duration::from_millis(0)), 0);
        t.stop();
        assert!(!t.is_running());
        assert_eq!(t.due(Duration::from_secs(5)), 0);
    }

    #[test]
    fn driver_runs_until_stopped() {
        let hits = Arc::new(AtomicU32::new(0));
        let mut d = Driver::new("test-driver", Duration::from_millis(5));
        let h = hits.clone();
        assert!(d
            .start(move || {
                h.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            })
            .unwrap());
        assert!(d.is_running());
        assert!(!d.start(|| ControlFlow::Continue(())).unwrap(), "already armed");

        while hits.load(Ordering::SeqCst) < 3 {
            thread::sleep(Duration::from_millis(5));
        }
        d.stop();
        assert!(!d.is_running());
        let after = hits.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(hits.load(Ordering::SeqCst), after);
    }

    #[test]
    fn driver_stops_itself_on_break() {
        let hits = Arc::new(AtomicU32::new(0));
        let mut d = Driver::new("self-stop", Duration::from_millis(1));
        let h = hits.clone();
        d.start(move || {
            if h.fetch_add(1, Ordering::SeqCst) + 1 >= 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
        d.join();
        assert!(!d.is_running());
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        // Can be re-armed after it finished.
        assert!(d.start(|| ControlFlow::Break(())).unwrap());
        d.join();
    }

    #[test]
    fn join_reports_a_panicking_step() {
        let mut d = Driver::new("boom", Duration::from_millis(1));
        d.start(|| panic!("step blew up")).unwrap();
        assert!(!d.join());
        assert!(!d.is_running());
        assert!(d.join(), "nothing left to join");
    }

    #[test]
    fn stop_is_prompt_with_long_interval() {
        let mut d = Driver::new("slow", Duration::from_secs(3600));
        d.start(|| ControlFlow::Continue(())).unwrap();
        let started = std::time::Instant::now();
        d.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
