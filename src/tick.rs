//! Recurring tick timer.
//!
//! Stands in for the hardware-progress timer of a real device: a worker
//! thread fires a step closure at a fixed interval, optionally stretched
//! by an injected extra delay sampled before every wait. Cancellation is
//! synchronous: `stop` returns only after any in-flight step has
//! finished and the thread has exited, so the owner may safely tear down
//! or reinitialize the state the step closure touches.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::debug;

/// Handle to a running tick thread.
pub struct TickDriver {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl TickDriver {
    /// Spawn the tick thread.
    ///
    /// `extra_delay` is sampled before every wait and added to
    /// `interval`, so delay injection takes effect from the next tick
    /// onward. `step` runs to completion on every fire; it is never
    /// interrupted by cancellation.
    pub fn start<D, F>(interval: Duration, extra_delay: D, mut step: F) -> io::Result<Self>
    where
        D: Fn() -> Duration + Send + 'static,
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("pcmsim-tick".into())
            .spawn(move || loop {
                let wait = interval + extra_delay();
                match stop_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => step(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Self { stop_tx, handle })
    }

    /// Stop the timer and wait for the thread to exit. Any step already
    /// running completes first; no further steps fire afterwards.
    pub fn stop(self) {
        let _ = self.stop_tx.try_send(());
        drop(self.stop_tx);
        if self.handle.join().is_err() {
            debug!("tick thread panicked during shutdown");
        }
    }
}
