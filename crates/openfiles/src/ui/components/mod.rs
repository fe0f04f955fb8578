//! Collection of reusable TUI components.

pub mod file_list;
