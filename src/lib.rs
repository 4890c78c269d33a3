pub mod arguments;
pub mod config;
pub mod parsers;
pub mod updater;
pub mod version;
