use super::*;
use crate::kernel::fixture::{STARTER_INDEX_JS, STARTER_PACKAGE_JSON};
use crate::kernel::services::session_bus;
use crate::kernel::test_support::{block_on_local, settle, FakePage, Harness};

fn manual_config() -> SessionConfig {
    SessionConfig {
        terminal_mode: TerminalMode::ManualCommands,
        ..SessionConfig::default()
    }
}

fn small_project() -> FileSet {
    FileSet::new()
        .with_file("index.js", "console.log(1)")
        .with_file("package.json", "{}")
}

async fn start_session(harness: &Harness, config: SessionConfig) -> SessionCoordinator {
    let (events, _rx) = session_bus();
    let page = harness.page(&config);
    SessionCoordinator::initialize(&page, &harness.booter, config, events)
        .await
        .unwrap()
}

#[test]
fn initialize_mounts_then_marks_default_file() {
    block_on_local(async {
        let harness = Harness::new();
        let config = SessionConfig {
            files: Some(small_project()),
            ..manual_config()
        };
        let session = start_session(&harness, config).await;

        assert!(session.is_ready());
        assert_eq!(harness.booter.boots.borrow()[0].workdir_name, "my-workdir");

        let rows = harness.explorer.last();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["index.js", "package.json"]);
        assert_eq!(harness.explorer.selected(), ["index.js"]);

        assert_eq!(harness.editor.value(), "console.log(1)");
        assert_eq!(harness.editor.language(), LanguageTag::JavaScript);
        assert_eq!(session.open_path(), Some("index.js"));
    });
}

#[test]
fn initialize_uses_starter_project_and_editor_options() {
    block_on_local(async {
        let harness = Harness::new();
        let _session = start_session(&harness, manual_config()).await;

        assert_eq!(
            harness.sandbox.content("package.json").as_deref(),
            Some(STARTER_PACKAGE_JSON)
        );
        let options = harness.editor.created_with.borrow().clone().unwrap();
        assert_eq!(options.value, STARTER_INDEX_JS);
        assert_eq!(options.language, LanguageTag::JavaScript);
        assert_eq!(options.theme, "vs-dark");
    });
}

#[test]
fn clicking_package_json_loads_it_as_json() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;

        session
            .on_file_tree_entry_clicked(&FileEntry::file("package.json"))
            .await
            .unwrap();

        assert_eq!(harness.editor.value(), STARTER_PACKAGE_JSON);
        assert_eq!(harness.editor.language(), LanguageTag::Json);
        assert_eq!(
            session.open_file(),
            Some(&OpenFile {
                path: "package.json".to_string(),
                language: LanguageTag::Json,
            })
        );
        assert_eq!(harness.explorer.selected(), ["package.json"]);
    });
}

#[test]
fn every_click_applies_the_extension_mapping() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;
        let names = [
            "app.css",
            "index.html",
            "README",
            "notes.md",
            "index.js",
            "data.json",
            "index.html",
        ];
        for name in names {
            harness.sandbox.put(name, &format!("contents of {name}"));
        }

        for name in names {
            session
                .on_file_tree_entry_clicked(&FileEntry::file(name))
                .await
                .unwrap();

            assert_eq!(harness.editor.language(), LanguageTag::from_path(name));
            assert_eq!(harness.editor.value(), format!("contents of {name}"));
            assert_eq!(session.open_path(), Some(name));
            assert_eq!(harness.explorer.selected(), [name]);
        }
    });
}

#[test]
fn failed_read_keeps_previous_selection() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;
        harness.sandbox.put("logo.png", "\u{0}");
        harness
            .sandbox
            .undecodable
            .borrow_mut()
            .insert("logo.png".to_string());
        let renders_before = harness.explorer.renders.borrow().len();

        for name in ["logo.png", "gone.js"] {
            let err = session
                .on_file_tree_entry_clicked(&FileEntry::file(name))
                .await
                .unwrap_err();
            assert!(matches!(err, SessionError::FileIo { op: "opening", .. }));
        }

        assert_eq!(session.open_path(), Some("index.js"));
        assert_eq!(harness.editor.value(), STARTER_INDEX_JS);
        assert_eq!(harness.editor.language(), LanguageTag::JavaScript);
        assert_eq!(harness.explorer.renders.borrow().len(), renders_before);
    });
}

#[test]
fn failed_read_is_reported_through_handle() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;

        let flow = session
            .handle(SessionEvent::EntryClicked(FileEntry::file("missing.css")))
            .await;

        assert!(flow.is_continue());
        assert!(harness
            .terminal
            .text()
            .contains("Error opening missing.css: Not found: missing.css"));
    });
}

#[test]
fn unbound_editor_model_does_not_commit_selection() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;
        harness.editor.unbound.set(true);

        let err = session
            .on_file_tree_entry_clicked(&FileEntry::file("package.json"))
            .await
            .unwrap_err();

        assert_eq!(err, SessionError::ModelBinding);
        assert_eq!(session.open_path(), Some("index.js"));
        assert_eq!(harness.editor.value(), STARTER_INDEX_JS);
    });
}

#[test]
fn directory_click_is_ignored() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;

        session
            .on_file_tree_entry_clicked(&FileEntry::dir("node_modules"))
            .await
            .unwrap();

        assert_eq!(session.open_path(), Some("index.js"));
        assert_eq!(harness.editor.value(), STARTER_INDEX_JS);
    });
}

#[test]
fn editor_change_before_boot_writes_nothing() {
    block_on_local(async {
        let harness = Harness::new();
        let config = manual_config();
        let page = harness.page(&config);
        let (events, _rx) = session_bus();
        let mut session = SessionCoordinator::attach(&page, config, events).unwrap();

        harness.editor.set_value("edited early");
        session.on_editor_changed().await.unwrap();
        assert!(session.handle(SessionEvent::EditorChanged).await.is_continue());

        assert!(!session.is_ready());
        assert!(harness.sandbox.writes.borrow().is_empty());
        assert!(harness.booter.boots.borrow().is_empty());
    });
}

#[test]
fn editor_change_writes_to_the_open_path() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;

        harness.editor.set_value("console.log(2)");
        session.on_editor_changed().await.unwrap();

        session
            .on_file_tree_entry_clicked(&FileEntry::file("package.json"))
            .await
            .unwrap();
        harness.editor.set_value("{\"name\":\"x\"}");
        session.on_editor_changed().await.unwrap();

        let writes = harness.sandbox.writes.borrow().clone();
        assert_eq!(
            writes,
            [
                ("index.js".to_string(), "console.log(2)".to_string()),
                ("package.json".to_string(), "{\"name\":\"x\"}".to_string()),
            ]
        );
        assert_eq!(
            harness.sandbox.content("index.js").as_deref(),
            Some("console.log(2)")
        );
    });
}

#[test]
fn queued_edits_apply_in_order_with_last_one_winning() {
    block_on_local(async {
        let harness = Harness::new();
        let (events, mut rx) = session_bus();
        let config = manual_config();
        let page = harness.page(&config);
        let mut session = SessionCoordinator::initialize(&page, &harness.booter, config, events.clone())
            .await
            .unwrap();

        harness.editor.set_value("a");
        events.send(SessionEvent::EditorChanged);
        events.send(SessionEvent::EditorChanged);
        harness.editor.set_value("ab");
        events.send(SessionEvent::EditorChanged);
        events.send(SessionEvent::Unload);
        session.run(&mut rx).await;

        assert_eq!(harness.sandbox.writes.borrow().len(), 3);
        assert_eq!(harness.sandbox.content("index.js").as_deref(), Some("ab"));
    });
}

#[test]
fn change_echoed_by_a_file_switch_saves_the_new_file() {
    block_on_local(async {
        let harness = Harness::new();
        let (events, mut rx) = session_bus();
        let config = SessionConfig {
            files: Some(small_project()),
            ..manual_config()
        };
        let page = harness.page(&config);
        let mut session = SessionCoordinator::initialize(&page, &harness.booter, config, events.clone())
            .await
            .unwrap();

        harness.editor.set_value("typed in index");
        events.send(SessionEvent::EditorChanged);
        events.send(SessionEvent::EntryClicked(FileEntry::file("package.json")));
        // Replacing the buffer on open fires one more change.
        events.send(SessionEvent::EditorChanged);
        events.send(SessionEvent::Unload);
        session.run(&mut rx).await;

        assert_eq!(
            harness.sandbox.writes.borrow().as_slice(),
            [
                ("index.js".to_string(), "typed in index".to_string()),
                ("package.json".to_string(), "{}".to_string()),
            ]
        );
        assert_eq!(
            harness.sandbox.content("index.js").as_deref(),
            Some("typed in index")
        );
        assert_eq!(harness.sandbox.content("package.json").as_deref(), Some("{}"));
        assert_eq!(harness.editor.value(), "{}");
        assert_eq!(session.open_path(), Some("package.json"));
    });
}

#[test]
fn write_failure_is_reported_not_fatal() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;
        harness.sandbox.fail_writes.set(true);

        let flow = session.handle(SessionEvent::EditorChanged).await;

        assert!(flow.is_continue());
        assert!(harness
            .terminal
            .text()
            .contains("Error saving index.js: Not found: index.js"));
        assert!(session.is_ready());
    });
}

#[test]
fn refresh_twice_renders_identically() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;

        session.refresh_file_tree().await.unwrap();
        session.refresh_file_tree().await.unwrap();

        let renders = harness.explorer.renders.borrow();
        let n = renders.len();
        assert!(n >= 2);
        assert_eq!(renders[n - 1], renders[n - 2]);
    });
}

#[test]
fn refresh_picks_up_new_top_level_entries() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;
        harness.sandbox.put("node_modules/express/index.js", "");
        harness.sandbox.remove("package.json");

        assert!(session.handle(SessionEvent::RefreshRequested).await.is_continue());

        let rows = harness.explorer.last();
        let names: Vec<_> = rows.iter().map(|r| (r.name.as_str(), r.is_dir)).collect();
        assert_eq!(names, [("index.js", false), ("node_modules", true)]);
    });
}

#[test]
fn listing_failure_is_reported() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;
        harness.sandbox.fail_listing.set(true);

        assert!(session.handle(SessionEvent::RefreshRequested).await.is_continue());

        assert!(harness.terminal.text().contains("Error listing /"));
    });
}

#[test]
fn server_ready_navigates_preview_to_exact_url() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;

        session.on_server_ready(3000, "http://localhost:3000");

        assert_eq!(
            harness.preview.urls.borrow().as_slice(),
            ["http://localhost:3000"]
        );
    });
}

#[test]
fn server_ready_posted_by_sandbox_reaches_preview() {
    block_on_local(async {
        let harness = Harness::new();
        let (events, mut rx) = session_bus();
        let config = manual_config();
        let page = harness.page(&config);
        let mut session = SessionCoordinator::initialize(&page, &harness.booter, config, events.clone())
            .await
            .unwrap();

        let sandbox_events = harness.booter.events.borrow().clone().unwrap();
        sandbox_events.server_ready(5173, "http://localhost:5173/");
        events.send(SessionEvent::Unload);
        session.run(&mut rx).await;

        assert_eq!(
            harness.preview.urls.borrow().as_slice(),
            ["http://localhost:5173/"]
        );
    });
}

#[test]
fn install_spawn_failure_is_reported_on_terminal() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;
        harness.sandbox.fail_spawn.set(true);

        let flow = session.handle(SessionEvent::InstallRequested).await;

        assert!(flow.is_continue());
        let text = harness.terminal.text();
        assert!(
            text.contains("Failed to run `npm install`: Failed to spawn `npm`: command not found"),
            "{text}"
        );
        assert!(session.running_commands().is_empty());
    });
}

#[test]
fn run_project_streams_output_and_refreshes_on_exit() {
    block_on_local(async {
        let harness = Harness::new();
        let (events, mut rx) = session_bus();
        let config = manual_config();
        let page = harness.page(&config);
        let mut session = SessionCoordinator::initialize(&page, &harness.booter, config, events)
            .await
            .unwrap();

        session.run_project().await.unwrap();
        assert_eq!(harness.sandbox.spawned(), ["npm start"]);
        assert_eq!(
            harness.sandbox.processes.borrow()[0].request.terminal,
            Some(TerminalSize::new(100, 30))
        );
        assert_eq!(session.running_commands().len(), 1);
        assert!(!session.running_commands()[0].accepts_input());

        harness.sandbox.processes.borrow()[0].emit("listening\r\n");
        settle().await;
        assert!(harness.terminal.text().contains("$ npm start"));
        assert!(harness.terminal.text().contains("listening\r\n"));

        let listings_before = harness.sandbox.listings.get();
        harness.sandbox.processes.borrow_mut()[0].exit();
        settle().await;
        let event = rx.try_recv().unwrap();
        assert!(matches!(event, SessionEvent::ProcessExited(_)));
        assert!(session.handle(event).await.is_continue());

        assert!(session.running_commands().is_empty());
        assert_eq!(harness.sandbox.listings.get(), listings_before + 1);
    });
}

#[test]
fn overlapping_commands_each_get_a_binding() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;

        session.install_packages().await.unwrap();
        session.install_packages().await.unwrap();
        session.run_project().await.unwrap();

        assert_eq!(
            harness.sandbox.spawned(),
            ["npm install", "npm install", "npm start"]
        );
        let ids: Vec<_> = session.running_commands().iter().map(|b| b.id()).collect();
        assert_eq!(ids, [1, 2, 3]);
    });
}

#[test]
fn interactive_shell_binds_terminal_io() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, SessionConfig::default()).await;

        assert_eq!(harness.sandbox.spawned(), ["jsh"]);
        assert_eq!(harness.terminal.fits.get(), 1);
        let shell = session.shell().unwrap();
        assert!(shell.accepts_input());

        assert!(session
            .handle(SessionEvent::TerminalInput(b"ls\r".to_vec()))
            .await
            .is_continue());
        assert!(session
            .handle(SessionEvent::TerminalResized(TerminalSize::new(120, 40)))
            .await
            .is_continue());

        let mut processes = harness.sandbox.processes.borrow_mut();
        assert_eq!(processes[0].drain_input(), ["ls\r"]);
        assert_eq!(
            harness.sandbox.resizes.borrow().as_slice(),
            [TerminalSize::new(120, 40)]
        );

        processes[0].emit("~/my-workdir$ ");
        drop(processes);
        settle().await;
        assert!(harness.terminal.text().ends_with("~/my-workdir$ "));
    });
}

#[test]
fn shell_exit_releases_input_binding() {
    block_on_local(async {
        let harness = Harness::new();
        let (events, mut rx) = session_bus();
        let config = SessionConfig::default();
        let page = harness.page(&config);
        let mut session = SessionCoordinator::initialize(&page, &harness.booter, config, events)
            .await
            .unwrap();

        harness.sandbox.processes.borrow_mut()[0].exit();
        settle().await;
        let event = rx.try_recv().unwrap();
        assert!(session.handle(event).await.is_continue());

        assert!(session.shell().is_none());
        assert!(session
            .handle(SessionEvent::TerminalInput(b"echo hi\r".to_vec()))
            .await
            .is_continue());
        assert!(harness.sandbox.processes.borrow_mut()[0]
            .drain_input()
            .is_empty());
    });
}

#[test]
fn unload_stops_the_loop_and_releases_bindings() {
    block_on_local(async {
        let harness = Harness::new();
        let (events, mut rx) = session_bus();
        let config = SessionConfig::default();
        let page = harness.page(&config);
        let mut session = SessionCoordinator::initialize(&page, &harness.booter, config, events.clone())
            .await
            .unwrap();

        events.send(SessionEvent::Unload);
        events.send(SessionEvent::EditorChanged);
        session.run(&mut rx).await;

        assert!(session.shell().is_none());
        assert!(harness.sandbox.writes.borrow().is_empty());
        assert_eq!(rx.try_recv(), Some(SessionEvent::EditorChanged));
    });
}

#[test]
fn shell_spawn_failure_still_renders_tree() {
    block_on_local(async {
        let harness = Harness::new();
        harness.sandbox.fail_spawn.set(true);
        let session = start_session(&harness, SessionConfig::default()).await;

        assert!(session.is_ready());
        assert!(session.shell().is_none());
        assert!(harness.terminal.text().contains("Failed to run `jsh`"));
        assert_eq!(harness.explorer.selected(), ["index.js"]);
    });
}

#[test]
fn boot_failure_leaves_inert_session() {
    block_on_local(async {
        let harness = Harness::new();
        harness.booter.fail.set(true);
        let mut session = start_session(&harness, manual_config()).await;

        assert!(!session.is_ready());
        assert!(harness
            .terminal
            .text()
            .contains("Error initializing sandbox: Sandbox failed to boot"));
        assert!(harness.explorer.renders.borrow().is_empty());

        assert!(session.handle(SessionEvent::EditorChanged).await.is_continue());
        assert!(session.handle(SessionEvent::RunRequested).await.is_continue());
        assert!(harness.sandbox.writes.borrow().is_empty());
        assert!(harness.sandbox.spawned().is_empty());
    });
}

#[test]
fn mount_failure_is_a_boot_error() {
    block_on_local(async {
        let harness = Harness::new();
        harness.sandbox.fail_mount.set(true);
        let session = start_session(&harness, SessionConfig::default()).await;

        assert!(!session.is_ready());
        assert!(harness.sandbox.spawned().is_empty());
        assert!(harness.terminal.text().contains("mount rejected"));
    });
}

#[test]
fn start_runs_only_once() {
    block_on_local(async {
        let harness = Harness::new();
        let mut session = start_session(&harness, manual_config()).await;

        session.start(&harness.booter).await.unwrap();

        assert_eq!(harness.booter.boots.borrow().len(), 1);
    });
}

#[test]
fn missing_terminal_anchor_is_a_configuration_error() {
    let harness = Harness::new();
    let config = SessionConfig::default();
    let page = harness.page(&config).without("terminal");
    let (events, _rx) = session_bus();

    let err = SessionCoordinator::attach(&page, config, events).unwrap_err();

    assert_eq!(err, ConfigurationError::MissingAnchor("terminal".to_string()));
    assert!(harness.editor.created_with.borrow().is_none());
}

#[test]
fn non_frame_preview_is_reported_on_terminal() {
    let harness = Harness::new();
    let config = SessionConfig::default();
    let page = harness.page(&config).with("preview", Anchor::Element);
    let (events, _rx) = session_bus();

    let err = SessionCoordinator::attach(&page, config, events).unwrap_err();

    assert_eq!(
        err,
        ConfigurationError::WrongAnchorKind {
            id: "preview".to_string(),
            expected: "frame",
            found: "element",
        }
    );
    assert!(harness
        .terminal
        .text()
        .contains("Configuration error: Element #preview is not a frame (found element)"));
}

#[test]
fn triggers_are_required_only_for_manual_commands() {
    let harness = Harness::new();

    let shell_config = SessionConfig::default();
    let page = harness.page(&shell_config).without("run-button");
    let (events, _rx) = session_bus();
    assert!(SessionCoordinator::attach(&page, shell_config, events).is_ok());

    let config = manual_config();
    let page = harness.page(&config).without("install-button");
    let (events, _rx) = session_bus();
    let err = SessionCoordinator::attach(&page, config, events).unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::MissingAnchor("install-button".to_string())
    );
}

#[test]
fn custom_anchor_ids_are_honoured() {
    let harness = Harness::new();
    let mut config = SessionConfig::default();
    config.anchors.preview = "output-frame".to_string();
    let page = harness.page(&config);
    assert!(page.anchors.contains_key("output-frame"));
    let (events, _rx) = session_bus();

    assert!(SessionCoordinator::attach(&page, config, events).is_ok());

    let empty = FakePage::default();
    let (events, _rx) = session_bus();
    assert!(SessionCoordinator::attach(&empty, SessionConfig::default(), events).is_err());
}
