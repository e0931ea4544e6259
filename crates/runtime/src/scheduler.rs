use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

/// Host-issued identifier of one pending frame callback.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i64);

/// Whatever actually delivers frames: `requestAnimationFrame` in the browser,
/// a manual pump in headless tools and tests.
pub trait FrameHost {
    /// Ask for one frame callback. `None` means the host refused.
    fn request_frame(&mut self) -> Option<FrameHandle>;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Owns at most one pending frame on a [`FrameHost`].
///
/// States: idle (`pending == None`) and running (`pending == Some`).
/// `request` while running is a no-op; `cancel` returns to idle.
pub struct FrameScheduler {
    host: Box<dyn FrameHost>,
    pending: Option<FrameHandle>,
    fired: u64,
}

impl FrameScheduler {
    pub fn new(host: Box<dyn FrameHost>) -> Self {
        Self {
            host,
            pending: None,
            fired: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Returns `true` if a new frame was scheduled by this call.
    pub fn request(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = self.host.request_frame();
        trace!(handle = ?self.pending, "frame requested");
        self.pending.is_some()
    }

    /// Cancel the pending frame, if any. Returns `true` if one was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                self.host.cancel_frame(handle);
                trace!(?handle, "frame cancelled");
                true
            }
            None => false,
        }
    }

    /// Mark the pending frame as delivered.
    ///
    /// Returns `false` for a callback that no longer matches the pending
    /// handle (it was cancelled, or superseded).
    pub fn fire(&mut self, handle: FrameHandle) -> bool {
        if self.pending != Some(handle) {
            trace!(?handle, "stale frame ignored");
            return false;
        }
        self.pending = None;
        self.fired += 1;
        true
    }

    /// Frames delivered so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("pending", &self.pending)
            .field("fired", &self.fired)
            .finish()
    }
}

#[derive(Debug, Default)]
struct ManualFrameLog {
    next: i64,
    pending: Vec<FrameHandle>,
    requested: usize,
    cancelled: usize,
}

/// Frame host pumped by hand; clones share one log.
#[derive(Debug, Clone, Default)]
pub struct ManualFrameHost {
    log: Rc<RefCell<ManualFrameLog>>,
}

impl ManualFrameHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest outstanding frame, removed from the queue.
    pub fn take_next(&self) -> Option<FrameHandle> {
        let mut log = self.log.borrow_mut();
        if log.pending.is_empty() {
            None
        } else {
            Some(log.pending.remove(0))
        }
    }

    pub fn outstanding(&self) -> usize {
        self.log.borrow().pending.len()
    }

    pub fn requested(&self) -> usize {
        self.log.borrow().requested
    }

    pub fn cancelled(&self) -> usize {
        self.log.borrow().cancelled
    }
}

impl FrameHost for ManualFrameHost {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        let mut log = self.log.borrow_mut();
        log.next += 1;
        let handle = FrameHandle(log.next);
        log.pending.push(handle);
        log.requested += 1;
        Some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut log = self.log.borrow_mut();
        log.pending.retain(|h| *h != handle);
        log.cancelled += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameScheduler, ManualFrameHost};

    #[test]
    fn at_most_one_frame_pending() {
        let host = ManualFrameHost::new();
        let mut sched = FrameScheduler::new(Box::new(host.clone()));
        assert!(sched.request());
        assert!(!sched.request());
        assert_eq!(host.requested(), 1);
        assert_eq!(host.outstanding(), 1);
    }

    #[test]
    fn fire_returns_to_idle_and_counts_frames() {
        let host = ManualFrameHost::new();
        let mut sched = FrameScheduler::new(Box::new(host.clone()));
        sched.request();
        let h = host.take_next().expect("handle");
        assert!(sched.fire(h));
        assert!(!sched.is_pending());
        assert_eq!(sched.fired(), 1);

        sched.request();
        let h = host.take_next().expect("handle");
        assert!(sched.fire(h));
        assert!(!sched.fire(h));
        assert_eq!(sched.fired(), 2);
    }

    #[test]
    fn cancelled_frame_is_ignored_when_it_fires_late() {
        let host = ManualFrameHost::new();
        let mut sched = FrameScheduler::new(Box::new(host.clone()));
        sched.request();
        let stale = sched.pending().expect("pending");
        assert!(sched.cancel());
        assert!(!sched.cancel());
        assert_eq!(host.cancelled(), 1);
        assert_eq!(host.outstanding(), 0);
        assert!(!sched.fire(stale));
        assert_eq!(sched.fired(), 0);
    }
}
