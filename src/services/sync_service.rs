use std::path::Path;

use crate::data::index_store::IndexStore;
use crate::error::AppError;
use crate::models::index::{self, ExpansionState, Index, ReconcileReport};
use crate::scope_path;
use crate::services::scan_service;

/// Owns the folder index and the per-folder expansion flags for the lifetime
/// of the process. Every mutation that touches the index is persisted before
/// the call returns.
pub struct IndexSynchronizer {
    store: IndexStore,
    extension: String,
    index: Index,
    expansion: ExpansionState,
}

impl IndexSynchronizer {
    pub fn open(store: IndexStore, extension: &str) -> Result<Self, AppError> {
        let index = store.load()?;
        let expansion = index.keys().map(|folder| (folder.clone(), true)).collect();
        tracing::info!(
            path = %store.path().display(),
            folders = index.len(),
            "index synchronizer opened"
        );
        Ok(Self {
            store,
            extension: extension.to_string(),
            index,
            expansion,
        })
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Scans `folder` and stores the result, replacing any previous record in
    /// place. Returns the number of files found. Relative paths are resolved
    /// against the working directory before anything is stored.
    pub fn register(&mut self, folder: &str) -> Result<usize, AppError> {
        let folder = scope_path::absolute(folder)?;
        if !Path::new(&folder).is_dir() {
            return Err(AppError::General(format!("not a directory: {folder}")));
        }

        let files = scan_service::scan(Path::new(&folder), &self.extension);
        let count = files.len();
        let mut next = self.index.clone();
        next.insert(folder.clone(), files);
        self.store.save(&next)?;
        self.index = next;
        self.expansion.insert(folder.clone(), true);

        tracing::info!(folder = %folder, files = count, "folder registered");
        Ok(count)
    }

    pub fn unregister(&mut self, folder: &str) -> Result<bool, AppError> {
        let folder =
            scope_path::absolute(folder).unwrap_or_else(|_| scope_path::normalize(folder));
        if !self.index.contains_key(&folder) {
            return Ok(false);
        }
        let mut next = self.index.clone();
        next.shift_remove(&folder);
        self.store.save(&next)?;
        self.index = next;
        self.expansion.remove(&folder);
        tracing::info!(folder = %folder, "folder unregistered");
        Ok(true)
    }

    /// Brings every record in line with the filesystem.
    ///
    /// Vanished folders are removed, folders whose file set changed get the
    /// fresh sorted scan. The index is saved only when something changed, so a
    /// second run against an unchanged filesystem writes nothing. The new
    /// state is adopted only once it is on disk; a failed save leaves memory
    /// as it was and the next run finds the same changes again.
    pub fn reconcile(&mut self) -> Result<ReconcileReport, AppError> {
        let mut next = self.index.clone();
        let mut removed = Vec::new();
        let mut updated = Vec::new();

        for (folder, stored) in &self.index {
            if !Path::new(folder).exists() {
                next.shift_remove(folder);
                tracing::info!(folder = %folder, "registered folder vanished, dropping it");
                removed.push(folder.clone());
                continue;
            }

            let scanned = scan_service::scan(Path::new(folder), &self.extension);
            if !index::same_file_set(stored, &scanned) {
                tracing::debug!(
                    folder = %folder,
                    before = stored.len(),
                    after = scanned.len(),
                    "folder contents changed"
                );
                next.insert(folder.clone(), scanned);
                updated.push(folder.clone());
            }
        }

        let report = ReconcileReport {
            removed,
            updated,
            finished_at: chrono::Utc::now(),
        };
        if report.changed() {
            self.store.save(&next)?;
            self.index = next;
            for folder in &report.removed {
                self.expansion.remove(folder);
            }
            tracing::info!(
                removed = report.removed.len(),
                updated = report.updated.len(),
                finished_at = %report.finished_at,
                "index reconciled"
            );
        }
        Ok(report)
    }

    pub fn toggle(&mut self, folder: &str) -> bool {
        if !self.index.contains_key(folder) {
            return false;
        }
        let flag = self.expansion.entry(folder.to_string()).or_insert(true);
        *flag = !*flag;
        tracing::debug!(folder = %folder, expanded = *flag, "folder toggled");
        true
    }

    pub fn folder_of(&self, file: &str) -> Option<&str> {
        self.index
            .iter()
            .find(|(folder, files)| {
                scope_path::is_within_scope(file, folder) && files.iter().any(|f| f == file)
            })
            .map(|(folder, _)| folder.as_str())
    }

    pub fn shutdown(self) -> Result<(), AppError> {
        self.store.save(&self.index)?;
        tracing::info!(folders = self.index.len(), "index synchronizer closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pdfhub_test_sync_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn s(p: &Path) -> String {
        p.to_string_lossy().to_string()
    }

    fn open(base: &Path) -> IndexSynchronizer {
        IndexSynchronizer::open(IndexStore::new(base.join("state/pdf_index.json")), "pdf").unwrap()
    }

    #[test]
    fn test_register_scans_and_persists() {
        let base = temp_dir("register");
        let docs = base.join("docs");
        fs::create_dir_all(docs.join("sub")).unwrap();
        fs::write(docs.join("b.pdf"), "b").unwrap();
        fs::write(docs.join("sub/a.pdf"), "a").unwrap();

        let mut sync = open(&base);
        let count = sync.register(&s(&docs)).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            sync.index()[&s(&docs)],
            vec![s(&docs.join("b.pdf")), s(&docs.join("sub").join("a.pdf"))]
        );
        assert_eq!(sync.expansion().get(&s(&docs)), Some(&true));

        let reopened = open(&base);
        assert_eq!(reopened.index(), sync.index());
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_register_empty_folder_keeps_record() {
        let base = temp_dir("register_empty");
        let empty = base.join("empty");
        fs::create_dir_all(&empty).unwrap();

        let mut sync = open(&base);
        assert_eq!(sync.register(&s(&empty)).unwrap(), 0);
        assert!(sync.index().contains_key(&s(&empty)));
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_register_rejects_non_directory() {
        let base = temp_dir("register_file");
        let file = base.join("lonely.pdf");
        fs::write(&file, "x").unwrap();

        let mut sync = open(&base);
        assert!(sync.register(&s(&file)).is_err());
        assert!(sync.index().is_empty());
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_reregister_keeps_position_and_reexpands() {
        let base = temp_dir("reregister");
        let first = base.join("first");
        let second = base.join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();

        let mut sync = open(&base);
        sync.register(&s(&first)).unwrap();
        sync.register(&s(&second)).unwrap();
        sync.toggle(&s(&first));
        fs::write(first.join("new.pdf"), "n").unwrap();
        sync.register(&format!("{}/", s(&first))).unwrap();

        let keys: Vec<&String> = sync.index().keys().collect();
        assert_eq!(keys, [&s(&first), &s(&second)]);
        assert_eq!(sync.index()[&s(&first)].len(), 1);
        assert_eq!(sync.expansion().get(&s(&first)), Some(&true));
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_reconcile_picks_up_added_and_removed_files() {
        let base = temp_dir("reconcile_changes");
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("keep.pdf"), "k").unwrap();
        fs::write(docs.join("gone.pdf"), "g").unwrap();

        let mut sync = open(&base);
        sync.register(&s(&docs)).unwrap();

        fs::remove_file(docs.join("gone.pdf")).unwrap();
        fs::write(docs.join("added.PDF"), "a").unwrap();
        fs::write(docs.join("notes.txt"), "t").unwrap();

        let report = sync.reconcile().unwrap();

        assert!(report.changed());
        assert_eq!(report.updated, vec![s(&docs)]);
        assert_eq!(
            sync.index()[&s(&docs)],
            vec![s(&docs.join("added.PDF")), s(&docs.join("keep.pdf"))]
        );
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_reconcile_drops_vanished_folder() {
        let base = temp_dir("reconcile_vanished");
        let stays = base.join("stays");
        let goes = base.join("goes");
        fs::create_dir_all(&stays).unwrap();
        fs::create_dir_all(&goes).unwrap();
        fs::write(goes.join("x.pdf"), "x").unwrap();

        let mut sync = open(&base);
        sync.register(&s(&goes)).unwrap();
        sync.register(&s(&stays)).unwrap();
        fs::remove_dir_all(&goes).unwrap();

        let report = sync.reconcile().unwrap();

        assert_eq!(report.removed, vec![s(&goes)]);
        assert!(!sync.index().contains_key(&s(&goes)));
        assert!(!sync.expansion().contains_key(&s(&goes)));
        assert!(sync.index().contains_key(&s(&stays)));

        let reopened = open(&base);
        assert!(!reopened.index().contains_key(&s(&goes)));
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_reconcile_is_idempotent_and_writes_once() {
        let base = temp_dir("reconcile_idempotent");
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();

        let mut sync = open(&base);
        sync.register(&s(&docs)).unwrap();
        fs::write(docs.join("late.pdf"), "l").unwrap();

        assert!(sync.reconcile().unwrap().changed());
        let after_first = sync.index().clone();

        let index_file = base.join("state/pdf_index.json");
        fs::remove_file(&index_file).unwrap();

        let second = sync.reconcile().unwrap();
        assert!(!second.changed());
        assert_eq!(sync.index(), &after_first);
        assert!(
            !index_file.exists(),
            "an unchanged reconcile must not write the index"
        );
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_reconcile_ignores_stored_order() {
        let base = temp_dir("reconcile_order");
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("a.pdf"), "a").unwrap();
        fs::write(docs.join("b.pdf"), "b").unwrap();

        let mut index = Index::new();
        index.insert(
            s(&docs),
            vec![s(&docs.join("b.pdf")), s(&docs.join("a.pdf"))],
        );
        let store = IndexStore::new(base.join("state/pdf_index.json"));
        store.save(&index).unwrap();

        let mut sync = IndexSynchronizer::open(store, "pdf").unwrap();
        assert!(!sync.reconcile().unwrap().changed());
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_failed_save_leaves_memory_untouched() {
        let base = temp_dir("reconcile_failed_save");
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();

        let mut sync = open(&base);
        sync.register(&s(&docs)).unwrap();
        fs::write(docs.join("new.pdf"), "n").unwrap();

        let index_file = base.join("state/pdf_index.json");
        fs::remove_file(&index_file).unwrap();
        fs::create_dir_all(index_file.join("blocker")).unwrap();

        assert!(sync.reconcile().is_err());
        assert!(sync.index()[&s(&docs)].is_empty());

        fs::remove_dir_all(&index_file).unwrap();
        let retry = sync.reconcile().unwrap();
        assert_eq!(retry.updated, vec![s(&docs)]);

        let on_disk = IndexStore::new(&index_file).load().unwrap();
        assert_eq!(on_disk[&s(&docs)], vec![s(&docs.join("new.pdf"))]);
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_failed_register_is_not_kept() {
        let base = temp_dir("register_failed_save");
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();

        let mut sync = open(&base);
        let index_file = base.join("state/pdf_index.json");
        fs::create_dir_all(index_file.join("blocker")).unwrap();

        assert!(sync.register(&s(&docs)).is_err());
        assert!(sync.index().is_empty());
        assert!(sync.expansion().is_empty());
        let _ = fs::remove_dir_all(&base);
    }

    #[cfg(unix)]
    #[test]
    fn test_register_resolves_relative_path() {
        let base = temp_dir("register_relative");
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("a.pdf"), "a").unwrap();

        let cwd = std::env::current_dir().unwrap();
        let up = "../".repeat(cwd.components().count() - 1);
        let relative = format!("{up}{}", s(&docs).trim_start_matches('/'));

        let mut sync = open(&base);
        assert_eq!(sync.register(&relative).unwrap(), 1);

        let keys: Vec<&String> = sync.index().keys().collect();
        assert_eq!(keys, [&s(&docs)]);
        assert_eq!(sync.index()[&s(&docs)], vec![s(&docs.join("a.pdf"))]);
        assert!(sync.unregister(&relative).unwrap());
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_toggle_flips_known_folders_only() {
        let base = temp_dir("toggle");
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();

        let mut sync = open(&base);
        sync.register(&s(&docs)).unwrap();

        assert!(sync.toggle(&s(&docs)));
        assert_eq!(sync.expansion().get(&s(&docs)), Some(&false));
        assert!(sync.toggle(&s(&docs)));
        assert_eq!(sync.expansion().get(&s(&docs)), Some(&true));
        assert!(!sync.toggle("/not/registered"));
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_unregister_and_folder_of() {
        let base = temp_dir("unregister");
        let docs = base.join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("a.pdf"), "a").unwrap();

        let mut sync = open(&base);
        sync.register(&s(&docs)).unwrap();
        let file = s(&docs.join("a.pdf"));

        assert_eq!(sync.folder_of(&file), Some(s(&docs).as_str()));
        assert_eq!(sync.folder_of("/elsewhere/a.pdf"), None);

        assert!(sync.unregister(&s(&docs)).unwrap());
        assert!(!sync.unregister(&s(&docs)).unwrap());
        assert_eq!(sync.folder_of(&file), None);
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_loaded_folders_start_expanded() {
        let base = temp_dir("loaded_expanded");
        let mut index = Index::new();
        index.insert("/a".to_string(), Vec::new());
        let store = IndexStore::new(base.join("state/pdf_index.json"));
        store.save(&index).unwrap();

        let sync = IndexSynchronizer::open(store, "pdf").unwrap();
        assert_eq!(sync.expansion().get("/a"), Some(&true));
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_shutdown_saves() {
        let base = temp_dir("shutdown");
        let sync = open(&base);
        sync.shutdown().unwrap();
        assert!(base.join("state/pdf_index.json").exists());
        let _ = fs::remove_dir_all(&base);
    }
}
