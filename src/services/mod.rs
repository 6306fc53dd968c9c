pub mod file_service;
pub mod preview_service;
pub mod scan_service;
pub mod sync_service;
pub mod update_service;
pub mod view_service;
