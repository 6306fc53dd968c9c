pub mod index_commands;
pub mod preview_commands;
pub mod update_commands;
