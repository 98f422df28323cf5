//! Template rendering, previews and markup sanitizing.
//!
//! - [`render`]: `${...}` placeholder substitution and template selection
//! - [`sanitize`]: the archive's HTML allow-list
//! - [`preview`]: sample-value previews and template warnings

pub mod preview;
pub mod render;
pub mod sanitize;

pub use preview::{
    RICH_MARKUP_WARNING, TITLE_MARKUP_WARNING, check_rich_template, check_title_template,
    preview_rich, preview_title,
};
pub use render::{
    Placeholder, render_plain, render_rich, substitute, summary_template, title_template,
};
pub use sanitize::{is_valid, looks_like_markup, sanitize};
