use std::sync::{Arc, Mutex};

use makestatic::watch::{WatchEvent, WatchEventKind, Watcher};

/// Collects every event a watcher emits, across all six signals, in the
/// order they were sent.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<WatchEvent>>>,
}

impl EventRecorder {
    pub fn attach(watcher: &mut Watcher) -> Self {
        let recorder = Self::default();
        for kind in WatchEventKind::ALL {
            let events = Arc::clone(&recorder.events);
            watcher.connect(kind, move |path| {
                events.lock().unwrap().push(WatchEvent::new(kind, path.clone()));
                Ok(())
            });
        }
        recorder
    }

    /// Drain recorded events.
    pub fn take(&self) -> Vec<WatchEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    /// Drain recorded events as `(kind, path)` pairs with string paths.
    pub fn take_pairs(&self) -> Vec<(WatchEventKind, String)> {
        self.take()
            .into_iter()
            .map(|e| (e.kind, e.path.to_string_lossy().into_owned()))
            .collect()
    }
}
