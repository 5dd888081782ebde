use tokio::sync::mpsc;

use super::ports::{FileEntry, ServerReady, TerminalSize};

pub type ProcessId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    EditorChanged,
    EntryClicked(FileEntry),
    RefreshRequested,
    ServerReady(ServerReady),
    TerminalInput(Vec<u8>),
    TerminalResized(TerminalSize),
    RunRequested,
    InstallRequested,
    ProcessExited(ProcessId),
    Unload,
}

#[derive(Clone)]
pub struct SessionEventSender {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

pub struct SessionEventReceiver {
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

pub fn session_bus() -> (SessionEventSender, SessionEventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SessionEventSender { tx }, SessionEventReceiver { rx })
}

impl SessionEventSender {
    /// Returns `false` once the session has stopped listening.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn server_ready(&self, port: u16, url: impl Into<String>) -> bool {
        self.send(SessionEvent::ServerReady(ServerReady {
            port,
            url: url.into(),
        }))
    }
}

impl SessionEventReceiver {
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.rx.try_recv().ok()
    }
}
