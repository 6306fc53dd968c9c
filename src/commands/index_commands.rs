use crate::error::AppError;
use crate::models::display::DisplayEntry;
use crate::models::index::ReconcileReport;
use crate::state::AppState;

/// What activating a row resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Toggled { folder: String, expanded: bool },
    File(String),
    Ignored,
}

pub fn register_folder(state: &mut AppState, folder: &str) -> Result<usize, AppError> {
    let count = state.sync.register(folder).map_err(AppError::logged)?;
    state.rebuild();
    Ok(count)
}

pub fn unregister_folder(state: &mut AppState, folder: &str) -> Result<bool, AppError> {
    let removed = state.sync.unregister(folder).map_err(AppError::logged)?;
    if removed {
        state.rebuild();
    }
    Ok(removed)
}

/// Runs a reconcile pass and rebuilds the view only if the index changed.
pub fn refresh(state: &mut AppState) -> Result<ReconcileReport, AppError> {
    let report = state.sync.reconcile().map_err(AppError::logged)?;
    if report.changed() {
        state.rebuild();
    }
    Ok(report)
}

pub fn set_search(state: &mut AppState, term: &str) {
    state.search = term.to_string();
    state.rebuild();
}

/// Header activation. Ignored while a search is active, matching the
/// filtered view where every folder is shown expanded.
pub fn toggle_folder(state: &mut AppState, folder: &str) -> Activation {
    if state.is_searching() || !state.sync.toggle(folder) {
        return Activation::Ignored;
    }
    let expanded = state
        .sync
        .expansion()
        .get(folder)
        .copied()
        .unwrap_or(true);
    state.rebuild();
    Activation::Toggled {
        folder: folder.to_string(),
        expanded,
    }
}

/// Resolves a row of the current view into a toggle or a file selection.
pub fn activate_row(state: &mut AppState, row: usize) -> Activation {
    match state.view.entries.get(row).cloned() {
        Some(DisplayEntry::FolderHeader { path, .. }) => toggle_folder(state, &path),
        Some(DisplayEntry::FileEntry { path }) => Activation::File(path),
        Some(DisplayEntry::Separator) | None => Activation::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{fresh_dir, path_string as s, test_state};
    use std::fs;
    use std::path::PathBuf;

    fn setup(name: &str) -> (PathBuf, AppState) {
        let base = fresh_dir(&format!("index_cmd_{name}"));
        fs::create_dir_all(base.join("docs")).unwrap();
        fs::write(base.join("docs/invoice.pdf"), "i").unwrap();
        fs::write(base.join("docs/receipt.pdf"), "r").unwrap();
        let state = test_state(&base);
        (base, state)
    }

    #[test]
    fn register_rebuilds_view() {
        let (base, mut state) = setup("register");
        let count = register_folder(&mut state, &s(&base.join("docs"))).unwrap();
        assert_eq!(count, 2);
        assert_eq!(state.view.file_count(), 2);
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn activating_header_toggles_and_hides_files() {
        let (base, mut state) = setup("toggle");
        register_folder(&mut state, &s(&base.join("docs"))).unwrap();

        let activation = activate_row(&mut state, 0);
        assert_eq!(
            activation,
            Activation::Toggled {
                folder: s(&base.join("docs")),
                expanded: false
            }
        );
        assert_eq!(state.view.file_count(), 0);

        activate_row(&mut state, 0);
        assert_eq!(state.view.file_count(), 2);
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn activating_file_row_selects_it() {
        let (base, mut state) = setup("select");
        register_folder(&mut state, &s(&base.join("docs"))).unwrap();
        assert_eq!(
            activate_row(&mut state, 1),
            Activation::File(s(&base.join("docs").join("invoice.pdf")))
        );
        assert_eq!(activate_row(&mut state, 3), Activation::Ignored);
        assert_eq!(activate_row(&mut state, 99), Activation::Ignored);
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn header_activation_is_ignored_while_searching() {
        let (base, mut state) = setup("search_toggle");
        register_folder(&mut state, &s(&base.join("docs"))).unwrap();
        set_search(&mut state, "receipt");

        assert_eq!(state.view.file_count(), 1);
        assert_eq!(state.view.auto_select, Some(1));
        assert_eq!(activate_row(&mut state, 0), Activation::Ignored);
        assert_eq!(
            state.sync.expansion().get(&s(&base.join("docs"))),
            Some(&true)
        );
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn refresh_reports_changes_once() {
        let (base, mut state) = setup("refresh");
        register_folder(&mut state, &s(&base.join("docs"))).unwrap();
        fs::write(base.join("docs/new.pdf"), "n").unwrap();

        assert!(refresh(&mut state).unwrap().changed());
        assert_eq!(state.view.file_count(), 3);
        assert!(!refresh(&mut state).unwrap().changed());
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn unregister_removes_folder_from_view() {
        let (base, mut state) = setup("unregister");
        register_folder(&mut state, &s(&base.join("docs"))).unwrap();
        assert!(unregister_folder(&mut state, &s(&base.join("docs"))).unwrap());
        assert!(state.view.entries.is_empty());
        let _ = fs::remove_dir_all(&base);
    }
}
