pub mod document;
pub mod error;
pub mod event_source;
pub mod main_app;
pub mod markdown_renderer;
pub mod note_store;
pub mod pager;
pub mod panic_handler;
pub mod settings;
pub mod tasks;
pub mod theme;
pub mod widget;

pub mod test_utils;

pub use main_app::{App, AppAction, run_app_with_event_source};
