use std::sync::{Arc, Mutex};

use makestatic::exec::{CommandRunner, RunFuture};

/// A fake command runner that:
/// - records every command it was asked to run, in order
/// - exits 0 unless the command contains a configured failing needle; the
///   first needle registered wins
#[derive(Debug, Clone, Default)]
pub struct FakeRunner {
    executed: Arc<Mutex<Vec<String>>>,
    failures: Arc<Mutex<Vec<(String, i32)>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any command containing `needle` exits with `code`.
    pub fn fail_when(self, needle: &str, code: i32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .push((needle.to_string(), code));
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.executed.lock().unwrap())
    }
}

impl CommandRunner for FakeRunner {
    fn run<'a>(&'a self, command: &'a str) -> RunFuture<'a> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(command.to_string());
            let code = self
                .failures
                .lock()
                .unwrap()
                .iter()
                .find(|(needle, _)| command.contains(needle.as_str()))
                .map(|(_, code)| *code)
                .unwrap_or(0);
            Ok(code)
        })
    }
}
