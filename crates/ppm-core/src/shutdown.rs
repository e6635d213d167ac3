//! Cooperative shutdown signal
//!
//! Loops check [`Shutdown::is_requested`] before each poll or frame and
//! sleep through [`Shutdown::sleep`], which returns early once shutdown is
//! requested.

use core::cell::RefCell;
use core::future::poll_fn;
use core::sync::atomic::{AtomicBool, Ordering};
use core::task::Poll;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::waitqueue::MultiWakerRegistration;
use embassy_time::{Duration, Timer};
use log::info;

/// Maximum number of tasks waiting on the signal at once (poller, renderer,
/// listener, plus one spare).
const MAX_SHUTDOWN_WAITERS: usize = 4;

pub struct Shutdown {
    requested: AtomicBool,
    waiters: Mutex<CriticalSectionRawMutex, RefCell<MultiWakerRegistration<MAX_SHUTDOWN_WAITERS>>>,
}

impl Shutdown {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            waiters: Mutex::new(RefCell::new(MultiWakerRegistration::new())),
        }
    }

    /// Ask every loop to stop at its next suspension point.
    pub fn request(&self) {
        info!("Shutdown requested");
        self.requested.store(true, Ordering::Release);
        self.waiters.lock(|waiters| waiters.borrow_mut().wake());
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        poll_fn(|cx| {
            if self.is_requested() {
                return Poll::Ready(());
            }
            self.waiters
                .lock(|waiters| waiters.borrow_mut().register(cx.waker()));
            // Re-check in case `request` ran between the load and the registration.
            if self.is_requested() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    /// Sleep for `duration`.
    ///
    /// Returns `true` if the full duration elapsed, `false` if shutdown was
    /// requested before or during the sleep.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_requested() {
            return false;
        }
        match select(Timer::after(duration), self.wait()).await {
            Either::First(()) => !self.is_requested(),
            Either::Second(()) => false,
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
