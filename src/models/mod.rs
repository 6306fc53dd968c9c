pub mod display;
pub mod index;
pub mod version;
