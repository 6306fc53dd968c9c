use std::future::Future;
use std::io::Write;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use crate::commands::index_commands::{self, Activation};
use crate::commands::preview_commands;
use crate::error::AppError;
use crate::models::display::DisplayEntry;
use crate::scope_path;
use crate::state::AppState;
use crate::ui::console::{self, ConsoleCommand, Target};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

fn print_view(state: &AppState, out: &mut dyn Write) -> std::io::Result<()> {
    if state.view.entries.is_empty() {
        if state.is_searching() {
            writeln!(out, "no files match {:?}", state.search)?;
        } else {
            writeln!(out, "no folders registered (try `add <folder>`)")?;
        }
        return Ok(());
    }
    for line in console::render(&state.view) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn print_preview(state: &AppState, path: &str, out: &mut dyn Write) -> std::io::Result<()> {
    match preview_commands::preview_file(state, path) {
        Ok(info) => writeln!(
            out,
            "preview of {}: {} ({}x{})",
            scope_path::base_name(&info.source),
            info.image_path.display(),
            info.width,
            info.height
        ),
        Err(e) => writeln!(out, "preview unavailable: {e}"),
    }
}

/// Previews the search hit the view picked, if any.
fn preview_auto_selected(state: &AppState, out: &mut dyn Write) -> std::io::Result<()> {
    let target = state
        .view
        .auto_selected()
        .and_then(DisplayEntry::file_path)
        .map(str::to_string);
    match target {
        Some(path) => print_preview(state, &path, out),
        None => Ok(()),
    }
}

fn folder_key(folder: &str) -> String {
    scope_path::absolute(folder).unwrap_or_else(|_| scope_path::normalize(folder))
}

fn file_at(state: &AppState, row: usize) -> Option<String> {
    state
        .view
        .entries
        .get(row)
        .and_then(DisplayEntry::file_path)
        .map(str::to_string)
}

/// Applies one console command to the state and writes the result to `out`.
pub fn handle_command(
    state: &mut AppState,
    command: ConsoleCommand,
    out: &mut dyn Write,
) -> std::io::Result<LoopControl> {
    match command {
        ConsoleCommand::Add(folder) => match index_commands::register_folder(state, &folder) {
            Ok(count) => {
                writeln!(out, "found {count} file(s) in {}", folder_key(&folder))?;
                print_view(state, out)?;
            }
            Err(e) => writeln!(out, "error: {e}")?,
        },
        ConsoleCommand::Remove(folder) => match index_commands::unregister_folder(state, &folder) {
            Ok(true) => print_view(state, out)?,
            Ok(false) => writeln!(out, "not registered: {folder}")?,
            Err(e) => writeln!(out, "error: {e}")?,
        },
        ConsoleCommand::Refresh => match index_commands::refresh(state) {
            Ok(report) if report.changed() => print_view(state, out)?,
            Ok(_) => writeln!(out, "index is up to date")?,
            Err(e) => writeln!(out, "error: {e}")?,
        },
        ConsoleCommand::Search(term) => {
            index_commands::set_search(state, &term);
            print_view(state, out)?;
            preview_auto_selected(state, out)?;
        }
        ConsoleCommand::Toggle(target) => {
            let activation = match target {
                Target::Row(row) => {
                    let entry = state.view.entries.get(row);
                    if entry.and_then(DisplayEntry::folder_path).is_none() {
                        writeln!(out, "row {row} is not a folder")?;
                        return Ok(LoopControl::Continue);
                    }
                    index_commands::activate_row(state, row)
                }
                Target::Folder(folder) => {
                    index_commands::toggle_folder(state, &folder_key(&folder))
                }
            };
            match activation {
                Activation::Toggled { .. } => print_view(state, out)?,
                _ if state.is_searching() => writeln!(out, "clear the search to fold folders")?,
                _ => writeln!(out, "nothing to toggle")?,
            }
        }
        ConsoleCommand::Select(row) => match index_commands::activate_row(state, row) {
            Activation::Toggled { .. } => print_view(state, out)?,
            Activation::File(path) => print_preview(state, &path, out)?,
            Activation::Ignored => writeln!(out, "nothing to select at row {row}")?,
        },
        ConsoleCommand::Open(row) => match file_at(state, row) {
            Some(path) => {
                if let Err(e) = preview_commands::open_file(state, &path) {
                    writeln!(out, "error: {e}")?;
                }
            }
            None => writeln!(out, "row {row} is not a file")?,
        },
        ConsoleCommand::List => print_view(state, out)?,
        ConsoleCommand::Help => writeln!(out, "{}", console::HELP)?,
        ConsoleCommand::Quit => return Ok(LoopControl::Quit),
        ConsoleCommand::Empty => {}
        ConsoleCommand::Invalid(message) => writeln!(out, "{message}")?,
    }
    Ok(LoopControl::Continue)
}

/// Timer callback: reconcile and redraw if anything changed. A failed save is
/// reported but does not stop later ticks.
pub fn on_tick(state: &mut AppState, out: &mut dyn Write) -> std::io::Result<()> {
    match index_commands::refresh(state) {
        Ok(report) if report.changed() => {
            let at = report.finished_at.with_timezone(&chrono::Local);
            writeln!(
                out,
                "index updated at {}: {} folder(s) changed, {} removed",
                at.format("%H:%M:%S"),
                report.updated.len(),
                report.removed.len()
            )?;
            print_view(state, out)?;
        }
        Ok(_) => {}
        Err(e) => writeln!(out, "error: could not save the index: {e}")?,
    }
    Ok(())
}

/// Single-threaded coordinator for the lifetime of the process.
///
/// Timer ticks and console lines are handled one at a time on this task, so
/// two reconcile runs can never overlap and the next tick is only observed
/// once the current handler has returned. Scans run inline: a very large
/// folder tree stalls the whole loop, console included, until it finishes,
/// and work already started cannot be cancelled.
pub async fn run_event_loop(state: &mut AppState) -> Result<(), AppError> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    drive(state, stdin, &mut stdout, tokio::signal::ctrl_c()).await
}

/// Runs the loop over `input` until `quit` or until `shutdown` resolves.
/// `shutdown` is a single future for the whole run, so a completion that
/// lands while a handler is busy is picked up on the next turn.
pub async fn drive<R, F>(
    state: &mut AppState,
    input: R,
    out: &mut dyn Write,
    shutdown: F,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    F: Future,
{
    let interval = Duration::from_millis(state.config.refresh_interval_ms.max(1));
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut lines = input.lines();
    let mut input_open = true;
    tokio::pin!(shutdown);

    tracing::info!(interval = ?interval, "event loop started");
    print_view(state, out)?;

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!("interrupt received");
                break;
            }
            _ = ticker.tick() => {
                on_tick(state, out)?;
            }
            line = lines.next_line(), if input_open => {
                match line? {
                    Some(line) => {
                        let command = console::parse(&line);
                        if handle_command(state, command, out)? == LoopControl::Quit {
                            break;
                        }
                    }
                    None => {
                        tracing::info!("stdin closed, continuing with periodic refresh only");
                        input_open = false;
                    }
                }
            }
        }
        out.flush()?;
    }

    tracing::info!("event loop stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{
        fresh_dir, path_string as s, test_state, test_state_with_renderer, StubRenderer,
    };
    use std::fs;

    fn run(state: &mut AppState, line: &str) -> String {
        let mut out = Vec::new();
        handle_command(state, console::parse(line), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn add_then_search_previews_first_hit() {
        let base = fresh_dir("runtime_search");
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("alpha.pdf"), "a").unwrap();
        fs::write(docs.join("beta.pdf"), "b").unwrap();
        let mut state = test_state_with_renderer(
            &base,
            StubRenderer {
                size: Some((100, 100)),
            },
        );

        let added = run(&mut state, &format!("add {}", s(&docs)));
        assert!(added.contains("found 2 file(s)"));

        let searched = run(&mut state, "search BETA");
        assert!(searched.contains("📄 beta.pdf"));
        assert!(!searched.contains("alpha.pdf"));
        assert!(searched.contains("preview of beta.pdf"));
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn preview_failure_is_shown_inline() {
        let base = fresh_dir("runtime_preview_fail");
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("broken.pdf"), "x").unwrap();
        let mut state = test_state(&base);
        run(&mut state, &format!("add {}", s(&docs)));

        let output = run(&mut state, "select 1");

        assert!(output.contains("preview unavailable"));
        assert_eq!(state.sync.index().len(), 1);
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn toggle_by_row_and_by_path() {
        let base = fresh_dir("runtime_toggle");
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("a.pdf"), "a").unwrap();
        let mut state = test_state(&base);
        run(&mut state, &format!("add {}", s(&docs)));

        let collapsed = run(&mut state, "toggle 0");
        assert!(collapsed.contains("➕"));
        assert_eq!(state.view.file_count(), 0);

        let expanded = run(&mut state, &format!("toggle {}/", s(&docs)));
        assert!(expanded.contains("➖"));
        assert_eq!(state.view.file_count(), 1);

        assert!(run(&mut state, "toggle 1").contains("not a folder"));
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn tick_reports_only_changes() {
        let base = fresh_dir("runtime_tick");
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();
        let mut state = test_state(&base);
        run(&mut state, &format!("add {}", s(&docs)));

        let mut quiet = Vec::new();
        on_tick(&mut state, &mut quiet).unwrap();
        assert!(quiet.is_empty());

        fs::write(docs.join("new.pdf"), "n").unwrap();
        let mut noisy = Vec::new();
        on_tick(&mut state, &mut noisy).unwrap();
        let noisy = String::from_utf8(noisy).unwrap();
        assert!(noisy.starts_with("index updated at "));
        assert!(noisy.contains(": 1 folder(s) changed, 0 removed"));
        assert!(noisy.contains("📄 new.pdf"));
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn quit_stops_the_loop() {
        let base = fresh_dir("runtime_quit");
        let mut state = test_state(&base);
        let mut out = Vec::new();
        let control = handle_command(&mut state, ConsoleCommand::Quit, &mut out).unwrap();
        assert_eq!(control, LoopControl::Quit);
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn unknown_row_commands_are_reported() {
        let base = fresh_dir("runtime_rows");
        let mut state = test_state(&base);
        assert!(run(&mut state, "open 4").contains("row 4 is not a file"));
        assert!(run(&mut state, "select 4").contains("nothing to select"));
        assert!(run(&mut state, "list").contains("no folders registered"));
        let _ = fs::remove_dir_all(&base);
    }

    #[tokio::test]
    async fn quit_line_ends_the_loop() {
        let base = fresh_dir("runtime_drive_quit");
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("a.pdf"), "a").unwrap();
        let mut state = test_state(&base);
        let script = format!("add {}\nquit\nadd /never/reached\n", s(&docs));
        let mut out = Vec::new();

        drive(
            &mut state,
            BufReader::new(script.as_bytes()),
            &mut out,
            std::future::pending::<()>(),
        )
        .await
        .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("found 1 file(s)"));
        assert!(!printed.contains("/never/reached"));
        assert_eq!(state.sync.index().len(), 1);
        let _ = fs::remove_dir_all(&base);
    }

    #[tokio::test]
    async fn shutdown_survives_busy_ticks() {
        let base = fresh_dir("runtime_drive_shutdown");
        let mut state = test_state(&base);
        state.config.refresh_interval_ms = 5;
        let mut out = Vec::new();

        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            drive(
                &mut state,
                BufReader::new(&b""[..]),
                &mut out,
                tokio::time::sleep(Duration::from_millis(40)),
            ),
        )
        .await;

        assert!(matches!(finished, Ok(Ok(()))));
        let _ = fs::remove_dir_all(&base);
    }
}
