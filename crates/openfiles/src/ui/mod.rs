//! Panel surface: the panel itself, its project service and action, and the terminal renderer.

pub mod action;
pub mod app;
pub mod components;
pub mod panel;
pub mod service;
pub mod tool_window;
