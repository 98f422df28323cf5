//! Shared types, error model, configuration and settings store for the podfic importer.
//!
//! This crate is the foundation depended on by all other podfic crates.
//! It provides:
//! - [`PodficError`], the unified error type
//! - Domain types ([`WorkRecord`], [`ImportOptions`], [`ImportResult`])
//! - Templates and settings ([`TemplateSet`], [`ImportSettings`])
//! - Configuration ([`AppConfig`], config loading)
//! - The key-value settings store ([`ConfigStore`])

pub mod config;
pub mod error;
pub mod settings;
pub mod store;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, HttpConfig, SessionConfig, StoreConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, session_cookie, store_path,
};
pub use error::{
    ACCESS_ERROR_MESSAGE, PARTIAL_COMPLETION_MESSAGE, PodficError, Result,
    UNHANDLED_ERROR_PREFIX,
};
pub use settings::{
    DEFAULT_SUMMARY_TEMPLATE, DEFAULT_TITLE_TEMPLATE, DEFAULT_WORKBODY, ImportSettings,
    NotesTemplate, TemplateSet, TemplateSlot,
};
pub use store::{
    ConfigStore, JsonFileStore, MemoryStore, get_typed, load_import_settings, set_typed,
    setup_storage,
};
pub use types::{
    AudioFormat, Author, Authors, ImportId, ImportOptions, ImportResult, PodficLength,
    TemplateFormat, WorkRecord,
};
