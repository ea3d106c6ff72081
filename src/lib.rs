pub mod app;
pub mod calendar;
pub mod components;
pub mod config;
pub mod engine;
pub mod event;
pub mod layout;
pub mod logging;
pub mod theme;
pub mod tui;
