#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEntry {
    FolderHeader {
        path: String,
        expanded: bool,
        matched_in_search: bool,
    },
    FileEntry {
        path: String,
    },
    Separator,
}

impl DisplayEntry {
    pub fn file_path(&self) -> Option<&str> {
        match self {
            Self::FileEntry { path } => Some(path),
            _ => None,
        }
    }

    pub fn folder_path(&self) -> Option<&str> {
        match self {
            Self::FolderHeader { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// One rendered frame: rows plus the row to highlight after a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewModel {
    pub entries: Vec<DisplayEntry>,
    pub auto_select: Option<usize>,
}

impl ViewModel {
    pub fn auto_selected(&self) -> Option<&DisplayEntry> {
        self.auto_select.and_then(|row| self.entries.get(row))
    }

    pub fn file_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, DisplayEntry::FileEntry { .. }))
            .count()
    }
}
