// src/watch/signal.rs

//! Minimal synchronous publish/subscribe channel.

use std::fmt;

use crate::errors::{MakeStaticError, Result};

/// A connected callback. Listeners may fail; the failure aborts delivery.
pub type Listener<T> = Box<dyn FnMut(&T) -> anyhow::Result<()> + Send>;

/// Fan-out of one event type to every connected listener, in the order they
/// were connected.
///
/// Delivery is synchronous on the caller's thread. The first listener error
/// stops delivery and is returned to the sender as
/// [`MakeStaticError::Listener`].
pub struct Signal<T> {
    listeners: Vec<Listener<T>>,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn connect<F>(&mut self, listener: F)
    where
        F: FnMut(&T) -> anyhow::Result<()> + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn send(&mut self, payload: &T) -> Result<()> {
        for listener in &mut self.listeners {
            listener(payload).map_err(MakeStaticError::Listener)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn listeners_run_in_connection_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut signal = Signal::new();
        for id in 0..3 {
            let seen = Arc::clone(&seen);
            signal.connect(move |value: &u32| {
                seen.lock().unwrap().push((id, *value));
                Ok(())
            });
        }

        signal.send(&7).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![(0, 7), (1, 7), (2, 7)]);
    }

    #[test]
    fn failing_listener_stops_delivery() {
        let later = Arc::new(Mutex::new(0));
        let mut signal = Signal::new();
        signal.connect(|_: &()| anyhow::bail!("boom"));
        {
            let later = Arc::clone(&later);
            signal.connect(move |_: &()| {
                *later.lock().unwrap() += 1;
                Ok(())
            });
        }

        let err = signal.send(&()).unwrap_err();
        assert!(matches!(err, MakeStaticError::Listener(_)));
        assert_eq!(*later.lock().unwrap(), 0);
    }

    #[test]
    fn send_without_listeners_is_a_no_op() {
        let mut signal: Signal<String> = Signal::default();
        assert!(signal.is_empty());
        signal.send(&"x".to_string()).unwrap();
    }
}
