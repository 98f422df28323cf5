//! Writing an imported work into the destination form.

use tracing::{debug, instrument, warn};

use podfic_shared::{ImportOptions, NotesTemplate, PodficError, Result, WorkRecord};

use crate::form::{CheckboxGroup, DestinationForm, SelectField, TextField, Toggle};

/// The form's name for the opt-out warning differs from the one works display.
const WORK_OPT_OUT_WARNING: &str = "Creator Chose Not To Use Archive Warnings";
const FORM_OPT_OUT_WARNING: &str = "Choose Not To Use Archive Warnings";

/// Template output ready to be written verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedFields {
    pub title: String,
    pub summary: String,
    pub notes: String,
    pub body: String,
}

/// Which notes areas receive the rendered notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotesPlacement {
    pub begin: bool,
    pub end: bool,
}

impl From<&NotesTemplate> for NotesPlacement {
    fn from(notes: &NotesTemplate) -> Self {
        Self {
            begin: notes.begin,
            end: notes.end,
        }
    }
}

/// What the mapper could not place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingReport {
    /// Warning and category values with no matching checkbox.
    pub skipped: Vec<String>,
}

impl MappingReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// `Ok` when everything was placed, otherwise a partial-completion error.
    pub fn into_result(self) -> Result<()> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(PodficError::PartialCompletion {
                skipped: self.skipped,
            })
        }
    }
}

/// Fill the form from an imported work.
///
/// Unmatched checkbox values are skipped and reported; an unmatched rating or
/// language aborts with [`PodficError::UnmappedField`].
#[instrument(skip_all, fields(title = %work.title))]
pub fn map_into_form<D: DestinationForm + ?Sized>(
    form: &mut D,
    work: &WorkRecord,
    rendered: &RenderedFields,
    options: &ImportOptions,
    notes: NotesPlacement,
) -> Result<MappingReport> {
    let mut report = MappingReport::default();

    select_by_label(form, SelectField::Rating, "rating", &work.rating)?;

    check_all(form, CheckboxGroup::Warnings, &work.warnings, &mut report)?;
    write_tags(form, TextField::Fandoms, &work.fandoms)?;
    check_all(form, CheckboxGroup::Categories, &work.categories, &mut report)?;
    write_tags(form, TextField::Relationships, &work.relationships)?;
    write_tags(form, TextField::Characters, &work.characters)?;

    let mut freeform = work.freeform_tags.clone();
    freeform.extend(options.standard_tags());
    write_tags(form, TextField::FreeformTags, &freeform)?;

    form.write_text(TextField::Title, &rendered.title, false)?;
    form.write_text(TextField::Summary, &rendered.summary, false)?;

    if notes.begin {
        enable(form, Toggle::BeginNotes)?;
        form.write_text(TextField::BeginNotes, &rendered.notes, false)?;
    }
    if notes.end {
        enable(form, Toggle::EndNotes)?;
        form.write_text(TextField::EndNotes, &rendered.notes, false)?;
    }

    enable(form, Toggle::Parent)?;
    form.write_text(TextField::ParentUrl, &work.source_url, false)?;

    select_by_label(form, SelectField::Language, "language", &work.language)?;

    if form.text(TextField::Body)?.is_empty() {
        form.write_text(TextField::Body, &rendered.body, false)?;
    } else {
        debug!("work body already has text, leaving it");
    }

    Ok(report)
}

fn select_by_label<D: DestinationForm + ?Sized>(
    form: &mut D,
    field: SelectField,
    name: &str,
    label: &str,
) -> Result<()> {
    let value = form
        .select_options(field)?
        .into_iter()
        .find(|o| o.label == label)
        .map(|o| o.value)
        .ok_or_else(|| PodficError::UnmappedField {
            field: name.to_string(),
            value: label.to_string(),
        })?;
    form.set_select(field, &value)
}

fn check_all<D: DestinationForm + ?Sized>(
    form: &mut D,
    group: CheckboxGroup,
    values: &[String],
    report: &mut MappingReport,
) -> Result<()> {
    let available = form.checkbox_values(group)?;
    for value in values {
        let target = match value.as_str() {
            WORK_OPT_OUT_WARNING if group == CheckboxGroup::Warnings => FORM_OPT_OUT_WARNING,
            other => other,
        };
        if available.iter().any(|v| v == target) {
            form.set_checked(group, target)?;
        } else {
            warn!(%group, value = %value, "no matching checkbox, skipping");
            report.skipped.push(value.clone());
        }
    }
    Ok(())
}

fn write_tags<D: DestinationForm + ?Sized>(
    form: &mut D,
    field: TextField,
    tags: &[String],
) -> Result<()> {
    form.write_text(field, &tags.join(", "), true)
}

fn enable<D: DestinationForm + ?Sized>(form: &mut D, toggle: Toggle) -> Result<()> {
    if !form.toggle_enabled(toggle)? {
        form.enable_toggle(toggle)?;
    }
    Ok(())
}
