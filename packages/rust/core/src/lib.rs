//! Import orchestration for the podfic importer.
//!
//! This crate ties together fetching, classification, extraction and template
//! rendering, and writes the result into a destination form
//! ([`import_and_fill`]).

pub mod form;
pub mod mapper;
pub mod pipeline;

pub use form::{
    CheckboxGroup, DestinationForm, FormEdit, HtmlForm, SelectField, SelectOption, TextField,
    Toggle,
};
pub use mapper::{MappingReport, NotesPlacement, RenderedFields, map_into_form};
pub use pipeline::{ProgressReporter, SilentProgress, import_and_fill, render_fields};
