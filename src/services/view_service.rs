use crate::models::display::{DisplayEntry, ViewModel};
use crate::models::index::{self, ExpansionState, Index};
use crate::scope_path::base_name;

/// Builds the rows for the current index.
///
/// A non-empty `search` switches to filtered mode: only folders with at least
/// one file whose base name contains the term (ignoring case) are listed, all
/// of them expanded, and the first matching file becomes the auto-select
/// target. Otherwise every folder is listed and collapsed folders hide their
/// files. Stored expansion flags are never modified here.
pub fn build(index: &Index, expansion: &ExpansionState, search: &str) -> ViewModel {
    let term = search.to_lowercase();
    if term.is_empty() {
        build_normal(index, expansion)
    } else {
        build_filtered(index, &term)
    }
}

fn build_filtered(index: &Index, term: &str) -> ViewModel {
    let mut view = ViewModel::default();

    for (folder, files) in index {
        let matched: Vec<&String> = files
            .iter()
            .filter(|path| base_name(path).to_lowercase().contains(term))
            .collect();
        if matched.is_empty() {
            continue;
        }

        view.entries.push(DisplayEntry::FolderHeader {
            path: folder.clone(),
            expanded: true,
            matched_in_search: true,
        });
        for path in matched {
            if view.auto_select.is_none() {
                view.auto_select = Some(view.entries.len());
            }
            view.entries.push(DisplayEntry::FileEntry { path: path.clone() });
        }
        view.entries.push(DisplayEntry::Separator);
    }

    view
}

fn build_normal(index: &Index, expansion: &ExpansionState) -> ViewModel {
    let mut entries = Vec::new();

    for (folder, files) in index {
        let expanded = index::is_expanded(expansion, folder);
        entries.push(DisplayEntry::FolderHeader {
            path: folder.clone(),
            expanded,
            matched_in_search: false,
        });
        if !expanded {
            continue;
        }
        entries.extend(
            files
                .iter()
                .map(|path| DisplayEntry::FileEntry { path: path.clone() }),
        );
        entries.push(DisplayEntry::Separator);
    }

    ViewModel {
        entries,
        auto_select: None,
    }
}
