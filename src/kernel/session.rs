//! Session coordinator: keeps the editor, file explorer, terminal and
//! preview consistent with the sandbox.
//!
//! All handlers run on one task. Events are drained from the session bus in
//! order, so an editor write-back always reads the editor value and the open
//! path in the same step and targets the file that is actually shown.

use std::ops::ControlFlow;
use std::rc::Rc;

use crate::kernel::binding::ProcessBinding;
use crate::kernel::error::{ConfigurationError, SessionError};
use crate::kernel::explorer::explorer_rows;
use crate::kernel::fixture::starter_files;
use crate::kernel::language::LanguageTag;
use crate::kernel::services::ports::{
    Anchor, BootOptions, EditorHost, EditorOptions, ExplorerView, FileEntry, FileSet, Page,
    PreviewFrame, Sandbox, SandboxBooter, SessionConfig, SpawnRequest, TerminalMode,
    TerminalSize, TerminalView, TextEditor,
};
use crate::kernel::services::{ProcessId, SessionEvent, SessionEventReceiver, SessionEventSender};

/// The file currently bound to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFile {
    pub path: String,
    pub language: LanguageTag,
}

impl OpenFile {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let language = LanguageTag::from_path(&path);
        Self { path, language }
    }
}

struct Surfaces {
    editor_host: Rc<dyn EditorHost>,
    explorer: Rc<dyn ExplorerView>,
    preview: Rc<dyn PreviewFrame>,
}

pub struct SessionCoordinator {
    config: SessionConfig,
    editor: Rc<dyn TextEditor>,
    terminal: Rc<dyn TerminalView>,
    explorer: Rc<dyn ExplorerView>,
    preview: Rc<dyn PreviewFrame>,
    events: SessionEventSender,
    sandbox: Option<Rc<dyn Sandbox>>,
    pending_mount: Option<FileSet>,
    open_file: Option<OpenFile>,
    shell: Option<ProcessBinding>,
    commands: Vec<ProcessBinding>,
    next_process_id: ProcessId,
}

impl SessionCoordinator {
    /// Resolve the page, boot the sandbox and mount the initial files.
    ///
    /// Only a configuration problem is returned; boot and mount failures are
    /// reported and leave a session whose handlers are no-ops.
    pub async fn initialize(
        page: &dyn Page,
        booter: &dyn SandboxBooter,
        config: SessionConfig,
        events: SessionEventSender,
    ) -> Result<Self, ConfigurationError> {
        let mut session = Self::attach(page, config, events)?;
        if let Err(e) = session.start(booter).await {
            session.report(&e);
        }
        Ok(session)
    }

    /// Resolve every anchor, open the terminal and create the editor on the
    /// default file. No sandbox work happens here.
    pub fn attach(
        page: &dyn Page,
        config: SessionConfig,
        events: SessionEventSender,
    ) -> Result<Self, ConfigurationError> {
        let terminal = resolve_anchor(page, &config.anchors.terminal, "terminal", |anchor| {
            match anchor {
                Anchor::Terminal(terminal) => Ok(terminal),
                other => Err(other),
            }
        })
        .inspect_err(|e| tracing::error!(error = %e, "session configuration failed"))?;

        let surfaces = match resolve_surfaces(page, &config) {
            Ok(surfaces) => surfaces,
            Err(e) => {
                tracing::error!(error = %e, "session configuration failed");
                terminal.write_line(&SessionError::from(e.clone()).to_string());
                return Err(e);
            }
        };

        let files = config.files.clone().unwrap_or_else(starter_files);
        let open_file = OpenFile::new(config.default_file.clone());
        let editor = surfaces.editor_host.create(EditorOptions {
            value: files.get(&open_file.path).unwrap_or_default().to_string(),
            language: open_file.language,
            theme: config.editor_theme.clone(),
        });

        tracing::info!(
            mode = ?config.terminal_mode,
            open = %open_file.path,
            "session attached"
        );

        Ok(Self {
            config,
            editor,
            terminal,
            explorer: surfaces.explorer,
            preview: surfaces.preview,
            events,
            sandbox: None,
            pending_mount: Some(files),
            open_file: Some(open_file),
            shell: None,
            commands: Vec::new(),
            next_process_id: 1,
        })
    }

    /// Boot and mount, then attach the terminal and render the explorer.
    /// Runs at most once; later calls are no-ops.
    pub async fn start(&mut self, booter: &dyn SandboxBooter) -> Result<(), SessionError> {
        let Some(files) = self.pending_mount.take() else {
            return Ok(());
        };

        let options = BootOptions {
            workdir_name: self.config.workdir_name.clone(),
        };
        let sandbox = booter
            .boot(&options, self.events.clone())
            .await
            .map_err(SessionError::SandboxBoot)?;
        sandbox
            .mount(&files)
            .await
            .map_err(SessionError::SandboxBoot)?;
        self.sandbox = Some(sandbox);
        tracing::info!(files = files.len(), "sandbox ready");

        if self.config.terminal_mode == TerminalMode::InteractiveShell {
            if let Err(e) = self.attach_shell().await {
                self.report(&e);
            }
        }

        self.refresh_file_tree().await
    }

    /// Drain the bus until `Unload`, then release every binding.
    pub async fn run(&mut self, events: &mut SessionEventReceiver) {
        while let Some(event) = events.recv().await {
            if self.handle(event).await.is_break() {
                break;
            }
        }
        self.release_bindings();
    }

    /// Dispatch one event. Failures are reported here and never escape.
    pub async fn handle(&mut self, event: SessionEvent) -> ControlFlow<()> {
        let result = match event {
            SessionEvent::EditorChanged => self.on_editor_changed().await,
            SessionEvent::EntryClicked(entry) => self.on_file_tree_entry_clicked(&entry).await,
            SessionEvent::RefreshRequested => self.refresh_file_tree().await,
            SessionEvent::ServerReady(ready) => {
                self.on_server_ready(ready.port, &ready.url);
                Ok(())
            }
            SessionEvent::TerminalInput(data) => {
                self.on_terminal_input(data);
                Ok(())
            }
            SessionEvent::TerminalResized(size) => {
                self.on_terminal_resized(size);
                Ok(())
            }
            SessionEvent::RunRequested => self.run_project().await,
            SessionEvent::InstallRequested => self.install_packages().await,
            SessionEvent::ProcessExited(id) => self.on_process_exited(id).await,
            SessionEvent::Unload => {
                self.release_bindings();
                return ControlFlow::Break(());
            }
        };

        if let Err(e) = result {
            self.report(&e);
        }
        ControlFlow::Continue(())
    }

    pub async fn on_editor_changed(&mut self) -> Result<(), SessionError> {
        let (Some(sandbox), Some(open)) = (self.sandbox.clone(), self.open_file.as_ref()) else {
            tracing::trace!("editor change before sandbox ready");
            return Ok(());
        };

        let path = open.path.clone();
        let content = self.editor.value();
        sandbox
            .write_file(&path, &content)
            .await
            .map_err(|e| SessionError::file_io("saving", &path, e))?;
        tracing::info!(path = %path, bytes = content.len(), "file saved");
        Ok(())
    }

    pub async fn on_file_tree_entry_clicked(
        &mut self,
        entry: &FileEntry,
    ) -> Result<(), SessionError> {
        let Some(sandbox) = self.sandbox.clone() else {
            return Ok(());
        };
        if entry.is_dir {
            tracing::debug!(name = %entry.name, "directory entries are not navigable");
            return Ok(());
        }

        let content = sandbox
            .read_file(&entry.name)
            .await
            .map_err(|e| SessionError::file_io("opening", &entry.name, e))?;

        let next = OpenFile::new(entry.name.clone());
        let model = self.editor.model().ok_or(SessionError::ModelBinding)?;
        self.editor.set_value(&content);
        self.editor.set_model_language(model, next.language);
        tracing::info!(path = %next.path, language = %next.language, "file opened");
        self.open_file = Some(next);

        self.refresh_file_tree().await
    }

    pub async fn refresh_file_tree(&mut self) -> Result<(), SessionError> {
        let Some(sandbox) = self.sandbox.clone() else {
            return Ok(());
        };

        let entries = sandbox
            .read_dir("/")
            .await
            .map_err(|e| SessionError::file_io("listing", "/", e))?;
        let rows = explorer_rows(&entries, self.open_path());
        self.explorer.render(&rows);
        tracing::debug!(entries = rows.len(), "file tree refreshed");
        Ok(())
    }

    pub fn on_server_ready(&mut self, port: u16, url: &str) {
        tracing::info!(port, url = %url, "Server running at {url}");
        self.preview.navigate(url);
    }

    pub async fn run_project(&mut self) -> Result<(), SessionError> {
        let args = self.config.run_args.clone();
        self.spawn_command(args).await
    }

    pub async fn install_packages(&mut self) -> Result<(), SessionError> {
        let args = self.config.install_args.clone();
        self.spawn_command(args).await
    }

    pub fn open_file(&self) -> Option<&OpenFile> {
        self.open_file.as_ref()
    }

    pub fn open_path(&self) -> Option<&str> {
        self.open_file.as_ref().map(|f| f.path.as_str())
    }

    pub fn is_ready(&self) -> bool {
        self.sandbox.is_some()
    }

    pub fn editor(&self) -> &Rc<dyn TextEditor> {
        &self.editor
    }

    pub fn shell(&self) -> Option<&ProcessBinding> {
        self.shell.as_ref()
    }

    pub fn running_commands(&self) -> &[ProcessBinding] {
        &self.commands
    }

    /// Surface an error on the terminal and in the log.
    pub fn report(&self, error: &SessionError) {
        tracing::error!(error = %error, "session error");
        self.terminal.write_line(&error.to_string());
    }

    async fn attach_shell(&mut self) -> Result<(), SessionError> {
        let Some(sandbox) = self.sandbox.clone() else {
            return Ok(());
        };

        let request =
            SpawnRequest::new(self.config.shell.clone(), Vec::new()).sized(self.terminal.size());
        let label = request.display();
        let handle = sandbox
            .spawn(request)
            .await
            .map_err(|e| SessionError::spawn(&label, e))?;
        self.terminal.fit();

        let id = self.allocate_process_id();
        tracing::info!(id, command = %label, "shell attached");
        self.shell = Some(ProcessBinding::attach(
            id,
            label,
            handle,
            Rc::clone(&self.terminal),
            self.events.clone(),
            true,
        ));
        Ok(())
    }

    async fn spawn_command(&mut self, args: Vec<String>) -> Result<(), SessionError> {
        let Some(sandbox) = self.sandbox.clone() else {
            tracing::warn!("command requested before sandbox ready");
            return Ok(());
        };

        let request = SpawnRequest::new(self.config.package_manager.clone(), args)
            .sized(self.terminal.size());
        let label = request.display();
        let handle = sandbox
            .spawn(request)
            .await
            .map_err(|e| SessionError::spawn(&label, e))?;

        let id = self.allocate_process_id();
        tracing::info!(id, command = %label, "command started");
        self.terminal.write_line(&format!("$ {label}"));
        self.commands.push(ProcessBinding::attach(
            id,
            label,
            handle,
            Rc::clone(&self.terminal),
            self.events.clone(),
            false,
        ));
        Ok(())
    }

    fn on_terminal_input(&mut self, data: Vec<u8>) {
        match self.shell.as_ref() {
            Some(shell) if shell.send_input(data) => {}
            _ => tracing::debug!("terminal input dropped: no bound process"),
        }
    }

    fn on_terminal_resized(&mut self, size: TerminalSize) {
        let resized = self.shell.as_ref().is_some_and(|shell| shell.resize(size));
        tracing::trace!(cols = size.cols, rows = size.rows, resized, "terminal resized");
    }

    async fn on_process_exited(&mut self, id: ProcessId) -> Result<(), SessionError> {
        if self.shell.as_ref().is_some_and(|shell| shell.id() == id) {
            if let Some(mut shell) = self.shell.take() {
                shell.release();
                tracing::info!(id, command = %shell.label(), "shell exited");
            }
            return Ok(());
        }

        let Some(pos) = self.commands.iter().position(|b| b.id() == id) else {
            return Ok(());
        };
        let mut binding = self.commands.remove(pos);
        binding.release();
        tracing::info!(id, command = %binding.label(), "command exited");

        self.refresh_file_tree().await
    }

    fn release_bindings(&mut self) {
        if let Some(mut shell) = self.shell.take() {
            shell.release();
        }
        for mut binding in self.commands.drain(..) {
            binding.release();
        }
    }

    fn allocate_process_id(&mut self) -> ProcessId {
        let id = self.next_process_id;
        self.next_process_id = self.next_process_id.saturating_add(1);
        id
    }
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("mode", &self.config.terminal_mode)
            .field("ready", &self.is_ready())
            .field("open_file", &self.open_file)
            .field("shell", &self.shell)
            .field("commands", &self.commands)
            .finish()
    }
}

fn resolve_anchor<T>(
    page: &dyn Page,
    id: &str,
    expected: &'static str,
    pick: impl FnOnce(Anchor) -> Result<T, Anchor>,
) -> Result<T, ConfigurationError> {
    let anchor = page
        .anchor(id)
        .ok_or_else(|| ConfigurationError::MissingAnchor(id.to_string()))?;
    pick(anchor).map_err(|other| ConfigurationError::WrongAnchorKind {
        id: id.to_string(),
        expected,
        found: other.kind(),
    })
}

fn resolve_surfaces(page: &dyn Page, config: &SessionConfig) -> Result<Surfaces, ConfigurationError> {
    let ids = &config.anchors;
    let editor_host = resolve_anchor(page, &ids.editor, "editor container", |anchor| {
        match anchor {
            Anchor::EditorContainer(host) => Ok(host),
            other => Err(other),
        }
    })?;
    let explorer = resolve_anchor(page, &ids.explorer, "file explorer", |anchor| match anchor {
        Anchor::Explorer(explorer) => Ok(explorer),
        other => Err(other),
    })?;
    let preview = resolve_anchor(page, &ids.preview, "frame", |anchor| match anchor {
        Anchor::Frame(frame) => Ok(frame),
        other => Err(other),
    })?;

    if config.terminal_mode == TerminalMode::ManualCommands {
        for id in [&ids.run, &ids.install] {
            resolve_anchor(page, id, "trigger", |anchor| match anchor {
                Anchor::Trigger => Ok(()),
                other => Err(other),
            })?;
        }
    }

    Ok(Surfaces {
        editor_host,
        explorer,
        preview,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/session.rs"]
mod tests;
