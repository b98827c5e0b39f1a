//! Core functionality: notebooks, persistence, password gate and configuration

pub mod auth;
pub mod config;
pub mod library;
pub mod notebook;
pub mod storage;
