//! Search-input debouncer.
//!
//! Raw keystrokes go in through [`Debouncer::push`]; the latest text comes
//! out of the returned receiver once no new input arrived for the quiet
//! period. Dropping the [`Debouncer`] aborts its task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

pub struct Debouncer {
    input: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl Debouncer {
    /// Spawn the debounce task. Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (input, input_rx) = mpsc::unbounded_channel();
        let (output, output_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(debounce_loop(quiet, input_rx, output));
        (Self { input, task }, output_rx)
    }

    /// Feed the current input text. Returns `false` once the task is gone.
    pub fn push(&self, text: impl Into<String>) -> bool {
        self.input.send(text.into()).is_ok()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn debounce_loop(
    quiet: Duration,
    mut input: mpsc::UnboundedReceiver<String>,
    output: mpsc::UnboundedSender<String>,
) {
    let mut pending: Option<String> = None;
    loop {
        let Some(text) = pending.take() else {
            match input.recv().await {
                Some(text) => pending = Some(text),
                None => return,
            }
            continue;
        };

        match tokio::time::timeout(quiet, input.recv()).await {
            Ok(Some(newer)) => pending = Some(newer),
            // Input closed: flush what we have and stop.
            Ok(None) => {
                if output.send(text).is_err() {
                    debug!("final search text dropped");
                }
                return;
            }
            Err(_) => {
                if output.send(text).is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "debounce_test.rs"]
mod tests;
