use crate::config::{AppConfig, AppPaths};
use crate::data::index_store::IndexStore;
use crate::error::AppError;
use crate::models::display::ViewModel;
use crate::services::preview_service::PageRenderer;
use crate::services::sync_service::IndexSynchronizer;
use crate::services::view_service;

/// Everything the event loop owns. Lives on a single thread.
pub struct AppState {
    pub config: AppConfig,
    pub paths: AppPaths,
    pub sync: IndexSynchronizer,
    pub search: String,
    pub view: ViewModel,
    pub renderer: Box<dyn PageRenderer>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        paths: AppPaths,
        renderer: Box<dyn PageRenderer>,
    ) -> Result<Self, AppError> {
        let store = IndexStore::new(paths.index_file());
        let sync = IndexSynchronizer::open(store, &config.extension)?;
        let mut state = Self {
            config,
            paths,
            sync,
            search: String::new(),
            view: ViewModel::default(),
            renderer,
        };
        state.rebuild();
        Ok(state)
    }

    /// Rebuilds the view from the current index, flags and search term.
    pub fn rebuild(&mut self) -> &ViewModel {
        self.view = view_service::build(self.sync.index(), self.sync.expansion(), &self.search);
        &self.view
    }

    pub fn is_searching(&self) -> bool {
        !self.search.is_empty()
    }

    pub fn shutdown(self) -> Result<(), AppError> {
        self.sync.shutdown()
    }
}
