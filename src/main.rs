use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use browser_ide::kernel::services::adapters::{
    drive_console_input, load_config, ConsoleEditor, ConsolePage, ConsolePreview,
    ConsoleTerminal, LocalSandboxBooter,
};
use browser_ide::kernel::services::ports::{SessionConfig, TerminalMode};
use browser_ide::kernel::services::session_bus;
use browser_ide::kernel::SessionCoordinator;

mod logging;

const USAGE: &str = "usage: browser_ide [--workdir DIR] [--config FILE] \
[--mode interactive-shell|manual-commands] [--shell CMD]";

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    workdir: Option<PathBuf>,
    config: Option<PathBuf>,
    mode: Option<TerminalMode>,
    shell: Option<String>,
}

fn parse_cli_args<I>(args: I) -> io::Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let invalid = |msg: String| io::Error::new(io::ErrorKind::InvalidInput, msg);
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg.clone(), None),
        };
        if flag == "-h" || flag == "--help" {
            return Err(invalid(USAGE.to_string()));
        }

        let value = match inline.or_else(|| args.next()) {
            Some(value) => value,
            None => return Err(invalid(format!("missing value for {flag}\n{USAGE}"))),
        };
        match flag.as_str() {
            "--workdir" => parsed.workdir = Some(PathBuf::from(value)),
            "--config" => parsed.config = Some(PathBuf::from(value)),
            "--shell" => parsed.shell = Some(value),
            "--mode" => {
                let mode = TerminalMode::from_name(&value)
                    .ok_or_else(|| invalid(format!("unknown mode `{value}`\n{USAGE}")))?;
                parsed.mode = Some(mode);
            }
            _ => return Err(invalid(format!("unknown argument `{arg}`\n{USAGE}"))),
        }
    }

    Ok(parsed)
}

/// Config file (or defaults) with command-line overrides applied. Without a
/// config file the shell comes from `$SHELL`, falling back to `sh`.
fn resolve_session_config(args: &CliArgs) -> io::Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?,
        None => SessionConfig {
            shell: std::env::var("SHELL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "sh".to_string()),
            ..SessionConfig::default()
        },
    };

    if let Some(mode) = args.mode {
        config.terminal_mode = mode;
    }
    if let Some(shell) = &args.shell {
        config.shell = shell.clone();
    }
    Ok(config)
}

fn resolve_base_dir(cwd: &Path, workdir: Option<&Path>) -> PathBuf {
    match workdir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => cwd.join(dir),
        None => cwd.to_path_buf(),
    }
}

async fn run_console(config: SessionConfig, base: PathBuf) -> io::Result<()> {
    let (events, mut rx) = session_bus();
    let terminal = Rc::new(ConsoleTerminal::stdout());
    let editor = Rc::new(ConsoleEditor::default());
    let preview = Rc::new(ConsolePreview::new(terminal.clone()));
    let page = ConsolePage::new(&config.anchors, terminal.clone(), editor.clone(), preview);
    let booter = LocalSandboxBooter::new(base);

    let mut session = SessionCoordinator::initialize(&page, &booter, config, events.clone())
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    tokio::task::spawn_local(drive_console_input(editor, terminal, events));
    session.run(&mut rx).await;
    Ok(())
}

fn main() -> io::Result<()> {
    let log_guard = logging::init();
    if let Some(guard) = &log_guard {
        eprintln!("browser_ide: logs in {}", guard.log_dir().display());
    }

    let args = parse_cli_args(std::env::args().skip(1))?;
    let config = resolve_session_config(&args)?;
    let cwd = std::env::current_dir()?;
    let base = resolve_base_dir(&cwd, args.workdir.as_deref());
    tracing::info!(base = %base.display(), mode = ?config.terminal_mode, "starting console session");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    let result = local.block_on(&runtime, run_console(config, base));
    tracing::info!("session unloaded");
    result
}

#[cfg(test)]
#[path = "../tests/unit/cli_args.rs"]
mod cli_args_tests;
