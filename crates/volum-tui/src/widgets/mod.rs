pub mod details;
pub mod footer;
pub mod header;
pub mod progress_bar;
