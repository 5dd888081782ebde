//! Console host: every page surface rendered onto one output stream, with
//! stdin lines turned into session events.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use tokio::sync::mpsc;

use crate::kernel::explorer::ExplorerRow;
use crate::kernel::language::LanguageTag;
use crate::kernel::services::ports::{
    Anchor, AnchorIds, EditorHost, EditorOptions, ExplorerView, FileEntry, ModelId, Page,
    PreviewFrame, TerminalSize, TerminalView, TextEditor,
};
use crate::kernel::services::{SessionEvent, SessionEventSender};

pub const CONSOLE_HELP: &str =
    "commands: :open NAME  :append TEXT  :show  :ls  :run  :install  :quit  (other lines go to the shell)";

pub struct ConsoleTerminal {
    out: RefCell<Box<dyn Write>>,
    size: Cell<TerminalSize>,
}

impl ConsoleTerminal {
    pub fn new(out: Box<dyn Write>, size: TerminalSize) -> Self {
        Self {
            out: RefCell::new(out),
            size: Cell::new(size),
        }
    }

    /// Stdout, sized from `COLUMNS`/`LINES` when present.
    pub fn stdout() -> Self {
        let dim = |key: &str, default: u16| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(default)
        };
        Self::new(
            Box::new(std::io::stdout()),
            TerminalSize::new(dim("COLUMNS", 80), dim("LINES", 24)),
        )
    }
}

impl TerminalView for ConsoleTerminal {
    fn write(&self, data: &[u8]) {
        let mut out = self.out.borrow_mut();
        if let Err(e) = out.write_all(data).and_then(|_| out.flush()) {
            tracing::warn!(error = %e, "console write failed");
        }
    }

    fn size(&self) -> TerminalSize {
        self.size.get()
    }
}

/// Headless single-buffer editor.
pub struct ConsoleEditor {
    buffer: RefCell<String>,
    language: Cell<LanguageTag>,
    theme: RefCell<String>,
}

impl Default for ConsoleEditor {
    fn default() -> Self {
        Self {
            buffer: RefCell::new(String::new()),
            language: Cell::new(LanguageTag::Text),
            theme: RefCell::new(String::new()),
        }
    }
}

impl ConsoleEditor {
    pub fn append_line(&self, line: &str) {
        let mut buffer = self.buffer.borrow_mut();
        if !buffer.is_empty() && !buffer.ends_with('\n') {
            buffer.push('\n');
        }
        buffer.push_str(line);
        buffer.push('\n');
    }

    pub fn theme(&self) -> String {
        self.theme.borrow().clone()
    }
}

impl TextEditor for ConsoleEditor {
    fn value(&self) -> String {
        self.buffer.borrow().clone()
    }

    fn set_value(&self, text: &str) {
        *self.buffer.borrow_mut() = text.to_string();
    }

    fn model(&self) -> Option<ModelId> {
        Some(ModelId(0))
    }

    fn set_model_language(&self, _model: ModelId, language: LanguageTag) {
        self.language.set(language);
    }

    fn language(&self) -> LanguageTag {
        self.language.get()
    }
}

pub struct ConsoleEditorHost {
    editor: Rc<ConsoleEditor>,
}

impl ConsoleEditorHost {
    pub fn new(editor: Rc<ConsoleEditor>) -> Self {
        Self { editor }
    }
}

impl EditorHost for ConsoleEditorHost {
    fn create(&self, options: EditorOptions) -> Rc<dyn TextEditor> {
        self.editor.set_value(&options.value);
        self.editor.language.set(options.language);
        *self.editor.theme.borrow_mut() = options.theme;
        let editor: Rc<dyn TextEditor> = self.editor.clone();
        editor
    }
}

pub struct ConsoleExplorer {
    terminal: Rc<ConsoleTerminal>,
}

impl ConsoleExplorer {
    pub fn new(terminal: Rc<ConsoleTerminal>) -> Self {
        Self { terminal }
    }
}

impl ExplorerView for ConsoleExplorer {
    fn render(&self, rows: &[ExplorerRow]) {
        let mut text = String::from("\r\n[files]\r\n");
        for row in rows {
            text.push_str(&row.label());
            text.push_str("\r\n");
        }
        self.terminal.write(text.as_bytes());
    }
}

pub struct ConsolePreview {
    terminal: Rc<ConsoleTerminal>,
    url: RefCell<Option<String>>,
}

impl ConsolePreview {
    pub fn new(terminal: Rc<ConsoleTerminal>) -> Self {
        Self {
            terminal,
            url: RefCell::new(None),
        }
    }

    pub fn url(&self) -> Option<String> {
        self.url.borrow().clone()
    }
}

impl PreviewFrame for ConsolePreview {
    fn navigate(&self, url: &str) {
        *self.url.borrow_mut() = Some(url.to_string());
        self.terminal.write_line(&format!("[preview] {url}"));
    }
}

pub struct ConsolePage {
    anchors: HashMap<String, Anchor>,
}

impl ConsolePage {
    pub fn new(
        ids: &AnchorIds,
        terminal: Rc<ConsoleTerminal>,
        editor: Rc<ConsoleEditor>,
        preview: Rc<ConsolePreview>,
    ) -> Self {
        let mut anchors = HashMap::new();
        anchors.insert(ids.terminal.clone(), Anchor::Terminal(terminal.clone()));
        anchors.insert(
            ids.editor.clone(),
            Anchor::EditorContainer(Rc::new(ConsoleEditorHost::new(editor))),
        );
        anchors.insert(
            ids.explorer.clone(),
            Anchor::Explorer(Rc::new(ConsoleExplorer::new(terminal))),
        );
        anchors.insert(ids.preview.clone(), Anchor::Frame(preview));
        anchors.insert(ids.run.clone(), Anchor::Trigger);
        anchors.insert(ids.install.clone(), Anchor::Trigger);
        Self { anchors }
    }
}

impl Page for ConsolePage {
    fn anchor(&self, id: &str) -> Option<Anchor> {
        self.anchors.get(id).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Open(String),
    Append(String),
    Show,
    List,
    Run,
    Install,
    Quit,
    Help,
    Input(String),
}

pub fn parse_console_line(line: &str) -> ConsoleCommand {
    let Some(rest) = line.strip_prefix(':') else {
        return ConsoleCommand::Input(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest.trim(), ""),
    };
    match (name, arg) {
        ("open" | "o", arg) if !arg.is_empty() => ConsoleCommand::Open(arg.to_string()),
        ("append" | "a", arg) => ConsoleCommand::Append(arg.to_string()),
        ("show", _) => ConsoleCommand::Show,
        ("ls", _) => ConsoleCommand::List,
        ("run", _) => ConsoleCommand::Run,
        ("install", _) => ConsoleCommand::Install,
        ("quit" | "q", _) => ConsoleCommand::Quit,
        _ => ConsoleCommand::Help,
    }
}

/// Apply one console command. Returns `false` once the session should stop.
pub fn apply_console_command(
    command: ConsoleCommand,
    editor: &ConsoleEditor,
    terminal: &ConsoleTerminal,
    events: &SessionEventSender,
) -> bool {
    let event = match command {
        ConsoleCommand::Open(name) => SessionEvent::EntryClicked(FileEntry::file(name)),
        ConsoleCommand::Append(text) => {
            editor.append_line(&text);
            SessionEvent::EditorChanged
        }
        ConsoleCommand::Show => {
            terminal.write_line(&format!("[{}]\r\n{}", editor.language(), editor.value()));
            return true;
        }
        ConsoleCommand::List => SessionEvent::RefreshRequested,
        ConsoleCommand::Run => SessionEvent::RunRequested,
        ConsoleCommand::Install => SessionEvent::InstallRequested,
        ConsoleCommand::Help => {
            terminal.write_line(CONSOLE_HELP);
            return true;
        }
        ConsoleCommand::Input(mut line) => {
            line.push('\n');
            SessionEvent::TerminalInput(line.into_bytes())
        }
        ConsoleCommand::Quit => {
            events.send(SessionEvent::Unload);
            return false;
        }
    };
    events.send(event)
}

/// Read stdin on a dedicated thread and feed the lines through
/// `apply_console_command`. End of input unloads the session.
pub async fn drive_console_input(
    editor: Rc<ConsoleEditor>,
    terminal: Rc<ConsoleTerminal>,
    events: SessionEventSender,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let spawned = std::thread::Builder::new()
        .name("browser-ide-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in std::io::BufRead::lines(stdin.lock()) {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::error!(error = %e, "spawn stdin reader failed");
        events.send(SessionEvent::Unload);
        return;
    }

    while let Some(line) = rx.recv().await {
        let command = parse_console_line(line.trim_end_matches('\r'));
        if !apply_console_command(command, &editor, &terminal, &events) {
            return;
        }
    }
    events.send(SessionEvent::Unload);
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/console.rs"]
mod tests;
