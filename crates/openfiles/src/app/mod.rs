//! Application layer: snapshot tracking, Markdown export, and the preview pipeline.

pub mod export;
pub mod preview;
pub mod tracker;
