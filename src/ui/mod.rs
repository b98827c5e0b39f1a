//! UI components for Inkpad

pub mod block_renderer;
pub mod editor;
pub mod library;
pub mod login;
pub mod preview;
pub mod settings;
pub mod whiteboard;
