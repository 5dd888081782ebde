use std::rc::Rc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::kernel::services::ports::{ProcessHandle, ProcessResizer, TerminalSize, TerminalView};
use crate::kernel::services::{ProcessId, SessionEvent, SessionEventSender};

/// Live pairing of one spawned process with the terminal view.
///
/// Output is pumped into the terminal by a local task as it arrives; when
/// the stream ends the pump posts `SessionEvent::ProcessExited`. Input is
/// only bound when the terminal should drive the process (the shell).
pub struct ProcessBinding {
    id: ProcessId,
    label: String,
    input: Option<mpsc::UnboundedSender<Vec<u8>>>,
    resizer: Option<Box<dyn ProcessResizer>>,
    pump: Option<JoinHandle<()>>,
}

impl ProcessBinding {
    /// Must run inside a `tokio::task::LocalSet`.
    pub fn attach(
        id: ProcessId,
        label: impl Into<String>,
        handle: ProcessHandle,
        terminal: Rc<dyn TerminalView>,
        events: SessionEventSender,
        bind_input: bool,
    ) -> Self {
        let ProcessHandle {
            mut output,
            input,
            resizer,
        } = handle;

        let pump = tokio::task::spawn_local(async move {
            while let Some(chunk) = output.recv().await {
                terminal.write(&chunk);
            }
            events.send(SessionEvent::ProcessExited(id));
        });

        Self {
            id,
            label: label.into(),
            input: bind_input.then_some(input),
            resizer,
            pump: Some(pump),
        }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn accepts_input(&self) -> bool {
        self.input.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.pump.is_none()
    }

    pub fn send_input(&self, data: Vec<u8>) -> bool {
        self.input.as_ref().is_some_and(|tx| tx.send(data).is_ok())
    }

    pub fn resize(&self, size: TerminalSize) -> bool {
        match self.resizer.as_ref() {
            Some(resizer) if !self.is_released() => {
                resizer.resize(size);
                true
            }
            _ => false,
        }
    }

    /// Relinquish the input sink and stop forwarding output. The process
    /// itself keeps running.
    pub fn release(&mut self) {
        self.input = None;
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

impl Drop for ProcessBinding {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ProcessBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessBinding")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("accepts_input", &self.accepts_input())
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/binding.rs"]
mod tests;
