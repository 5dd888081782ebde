//! Directory-backed sandbox.
//!
//! Sandbox paths are relative to a work directory on disk and processes run
//! as ordinary child processes with that directory as cwd. There is no
//! isolation here; it exists so the session can be driven from a console.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::rc::Rc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

use super::server_url::ServerUrlScanner;
use crate::kernel::services::ports::{
    BootOptions, FileEntry, FileSet, LocalBoxFuture, ProcessHandle, Sandbox, SandboxBooter,
    SandboxError, SandboxResult, SpawnRequest,
};
use crate::kernel::services::{SessionEvent, SessionEventSender};

const READ_CHUNK: usize = 8 * 1024;

pub struct LocalSandboxBooter {
    base: PathBuf,
}

impl LocalSandboxBooter {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl SandboxBooter for LocalSandboxBooter {
    fn boot<'a>(
        &'a self,
        options: &'a BootOptions,
        events: SessionEventSender,
    ) -> LocalBoxFuture<'a, SandboxResult<Rc<dyn Sandbox>>> {
        Box::pin(async move {
            let root = self.base.join(&options.workdir_name);
            tokio::fs::create_dir_all(&root)
                .await
                .map_err(|e| SandboxError::Boot(format!("{}: {}", root.display(), e)))?;
            tracing::info!(root = %root.display(), "local sandbox booted");
            let sandbox: Rc<dyn Sandbox> = Rc::new(LocalSandbox::new(root, events));
            Ok(sandbox)
        })
    }
}

pub struct LocalSandbox {
    root: PathBuf,
    events: SessionEventSender,
}

impl LocalSandbox {
    pub fn new(root: PathBuf, events: SessionEventSender) -> Self {
        Self { root, events }
    }

    /// Map a sandbox path onto the work directory. A leading `/` means the
    /// sandbox root; parent components are rejected.
    pub fn resolve(&self, path: &str) -> SandboxResult<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(SandboxError::InvalidPath(path.to_string())),
            }
        }
        Ok(resolved)
    }
}

fn io_error(path: &str, e: std::io::Error) -> SandboxError {
    match e.kind() {
        std::io::ErrorKind::NotFound => SandboxError::NotFound(path.to_string()),
        _ => SandboxError::Io {
            path: path.to_string(),
            message: e.to_string(),
        },
    }
}

impl Sandbox for LocalSandbox {
    fn mount<'a>(&'a self, files: &'a FileSet) -> LocalBoxFuture<'a, SandboxResult<()>> {
        Box::pin(async move {
            for (path, contents) in files.iter() {
                let target = self.resolve(path)?;
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| io_error(path, e))?;
                }
                tokio::fs::write(&target, contents)
                    .await
                    .map_err(|e| io_error(path, e))?;
            }
            tracing::debug!(files = files.len(), root = %self.root.display(), "mounted");
            Ok(())
        })
    }

    fn read_file<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, SandboxResult<String>> {
        Box::pin(async move {
            let target = self.resolve(path)?;
            let bytes = tokio::fs::read(&target)
                .await
                .map_err(|e| io_error(path, e))?;
            String::from_utf8(bytes).map_err(|_| SandboxError::Decode(path.to_string()))
        })
    }

    fn write_file<'a>(
        &'a self,
        path: &'a str,
        contents: &'a str,
    ) -> LocalBoxFuture<'a, SandboxResult<()>> {
        Box::pin(async move {
            let target = self.resolve(path)?;
            tokio::fs::write(&target, contents)
                .await
                .map_err(|e| io_error(path, e))
        })
    }

    fn read_dir<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, SandboxResult<Vec<FileEntry>>> {
        Box::pin(async move {
            let target = self.resolve(path)?;
            let mut entries = tokio::fs::read_dir(&target)
                .await
                .map_err(|e| io_error(path, e))?;

            let mut result = Vec::new();
            while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(path, e))? {
                let name = entry.file_name().to_string_lossy().to_string();
                let is_dir = match entry.file_type().await {
                    Ok(file_type) => file_type.is_dir(),
                    Err(e) => {
                        tracing::debug!(name = %name, error = %e, "skip unreadable entry");
                        continue;
                    }
                };
                result.push(FileEntry { name, is_dir });
            }

            result.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(result)
        })
    }

    fn spawn(&self, request: SpawnRequest) -> LocalBoxFuture<'_, SandboxResult<ProcessHandle>> {
        Box::pin(async move {
            let label = request.display();
            let mut cmd = tokio::process::Command::new(&request.command);
            cmd.args(&request.args)
                .current_dir(&self.root)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
            if let Some(size) = request.terminal {
                cmd.env("COLUMNS", size.cols.to_string())
                    .env("LINES", size.rows.to_string());
            }

            let mut child = cmd.spawn().map_err(|e| SandboxError::Spawn {
                command: label.clone(),
                message: e.to_string(),
            })?;

            let (out_tx, out_rx) = mpsc::unbounded_channel();
            let (in_tx, mut in_rx) = mpsc::unbounded_channel::<Vec<u8>>();

            if let Some(stdout) = child.stdout.take() {
                tokio::spawn(pump_output(stdout, out_tx.clone(), self.events.clone()));
            }
            if let Some(stderr) = child.stderr.take() {
                tokio::spawn(pump_output(stderr, out_tx, self.events.clone()));
            }

            if let Some(mut stdin) = child.stdin.take() {
                tokio::spawn(async move {
                    while let Some(data) = in_rx.recv().await {
                        if stdin.write_all(&data).await.is_err() || stdin.flush().await.is_err() {
                            break;
                        }
                    }
                });
            }

            tokio::spawn({
                let label = label.clone();
                async move {
                    match child.wait().await {
                        Ok(status) => tracing::info!(command = %label, %status, "process exited"),
                        Err(e) => tracing::warn!(command = %label, error = %e, "wait failed"),
                    }
                }
            });

            tracing::info!(command = %label, "process spawned");
            Ok(ProcessHandle {
                output: out_rx,
                input: in_tx,
                resizer: None,
            })
        })
    }
}

async fn pump_output<R>(
    mut reader: R,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    events: SessionEventSender,
) where
    R: AsyncRead + Unpin,
{
    let mut scanner = ServerUrlScanner::default();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(error = %e, "process output closed");
                break;
            }
        };

        let chunk = buf[..n].to_vec();
        for ready in scanner.feed(&chunk) {
            tracing::debug!(port = ready.port, url = %ready.url, "server ready");
            events.send(SessionEvent::ServerReady(ready));
        }
        // Output is drained even after the binding is gone.
        let _ = tx.send(chunk);
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/sandbox/local.rs"]
mod tests;
