//! Rebuild gate
//!
//! Blocks navigator readers while a generated playlist is being rebuilt on a
//! worker thread. Each rebuild holds a [`RebuildTicket`]; the gate reopens
//! when the last ticket is dropped, waking every waiter.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct RebuildGate {
    in_flight: Mutex<usize>,
    reopened: Condvar,
}

impl RebuildGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the gate until the returned ticket is dropped
    pub fn close(self: &Arc<Self>) -> RebuildTicket {
        *self.in_flight.lock() += 1;
        RebuildTicket {
            gate: Arc::clone(self),
        }
    }

    /// Whether no rebuild is in flight
    pub fn is_open(&self) -> bool {
        *self.in_flight.lock() == 0
    }

    /// Block until no rebuild is in flight
    pub fn wait_open(&self) {
        let mut in_flight = self.in_flight.lock();
        if *in_flight > 0 {
            tracing::debug!(in_flight = *in_flight, "Waiting for playlist rebuild");
        }
        while *in_flight > 0 {
            self.reopened.wait(&mut in_flight);
        }
    }

    /// Block until the gate opens or `timeout` passes. Returns whether it opened.
    pub fn wait_open_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut in_flight = self.in_flight.lock();
        while *in_flight > 0 {
            if self.reopened.wait_until(&mut in_flight, deadline).timed_out() {
                return *in_flight == 0;
            }
        }
        true
    }

    fn open(&self) {
        let mut in_flight = self.in_flight.lock();
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.reopened.notify_all();
        }
    }
}

/// Keeps the gate closed while alive
#[derive(Debug)]
pub struct RebuildTicket {
    gate: Arc<RebuildGate>,
}

impl Drop for RebuildTicket {
    fn drop(&mut self) {
        self.gate.open();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn starts_open() {
        let gate = RebuildGate::new();
        assert!(gate.is_open());
        gate.wait_open();
    }

    #[test]
    fn ticket_keeps_gate_closed() {
        let gate = Arc::new(RebuildGate::new());
        let ticket = gate.close();
        assert!(!gate.is_open());
        assert!(!gate.wait_open_for(Duration::from_millis(20)));

        drop(ticket);
        assert!(gate.is_open());
    }

    #[test]
    fn opens_only_after_last_ticket() {
        let gate = Arc::new(RebuildGate::new());
        let first = gate.close();
        let second = gate.close();

        drop(first);
        assert!(!gate.is_open());
        drop(second);
        assert!(gate.is_open());
    }

    #[test]
    fn waiter_wakes_when_ticket_dropped() {
        let gate = Arc::new(RebuildGate::new());
        let ticket = gate.close();

        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.wait_open_for(Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(20));
        drop(ticket);
        assert!(waiter.join().unwrap());
    }
}
