//! The destination "new work" form.
//!
//! [`DestinationForm`] is the seam the mapper writes through. [`HtmlForm`]
//! implements it over a saved copy of the archive's new-work page: it reads
//! the current field state, applies writes to an in-memory model, and keeps an
//! ordered [`FormEdit`] log that a browser-side injector can replay.

use std::collections::HashMap;
use std::fmt;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use podfic_shared::{PodficError, Result};

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

/// Drop-down fields, matched by option label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectField {
    Rating,
    Language,
}

impl SelectField {
    pub const ALL: [Self; 2] = [Self::Rating, Self::Language];

    pub fn selector(self) -> &'static str {
        match self {
            Self::Rating => "#work_rating_string",
            Self::Language => "#work_language_id",
        }
    }
}

/// Checkbox groups, matched by each box's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckboxGroup {
    Warnings,
    Categories,
}

impl CheckboxGroup {
    pub const ALL: [Self; 2] = [Self::Warnings, Self::Categories];

    pub fn selector(self) -> &'static str {
        match self {
            Self::Warnings => "fieldset.warnings input",
            Self::Categories => "dd.category input",
        }
    }
}

/// Free-text inputs and text areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Fandoms,
    Relationships,
    Characters,
    FreeformTags,
    Title,
    Summary,
    BeginNotes,
    EndNotes,
    ParentUrl,
    Body,
}

impl TextField {
    pub const ALL: [Self; 10] = [
        Self::Fandoms,
        Self::Relationships,
        Self::Characters,
        Self::FreeformTags,
        Self::Title,
        Self::Summary,
        Self::BeginNotes,
        Self::EndNotes,
        Self::ParentUrl,
        Self::Body,
    ];

    pub fn selector(self) -> &'static str {
        match self {
            Self::Fandoms => "dd.fandom input",
            Self::Relationships => "dd.relationship input",
            Self::Characters => "dd.character input",
            Self::FreeformTags => "dd.freeform input",
            Self::Title => "dd.title input",
            Self::Summary => "dd.summary textarea",
            Self::BeginNotes => "#work_notes",
            Self::EndNotes => "#work_endnotes",
            Self::ParentUrl => "#work_parent_work_relationships_attributes_0_url",
            Self::Body => ".mce-editor",
        }
    }
}

/// Checkboxes that reveal an optional section of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle {
    BeginNotes,
    EndNotes,
    Parent,
}

impl Toggle {
    pub const ALL: [Self; 3] = [Self::BeginNotes, Self::EndNotes, Self::Parent];

    pub fn selector(self) -> &'static str {
        match self {
            Self::BeginNotes => "#front-notes-options-show",
            Self::EndNotes => "#end-notes-options-show",
            Self::Parent => "dt.parent input",
        }
    }
}

macro_rules! display_via_debug {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    )*};
}

display_via_debug!(SelectField, CheckboxGroup, TextField, Toggle);

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// One entry of a drop-down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Visible text.
    pub label: String,
    /// Submitted value.
    pub value: String,
}

/// Read and write access to the destination form.
///
/// Every method fails with [`PodficError::Form`] when the form lacks the field.
pub trait DestinationForm {
    fn select_options(&self, field: SelectField) -> Result<Vec<SelectOption>>;
    fn set_select(&mut self, field: SelectField, value: &str) -> Result<()>;

    /// Values of the boxes in a group, in form order.
    fn checkbox_values(&self, group: CheckboxGroup) -> Result<Vec<String>>;
    fn set_checked(&mut self, group: CheckboxGroup, value: &str) -> Result<()>;

    fn text(&self, field: TextField) -> Result<String>;
    /// Replace a field's text. `signal` asks for the change to be announced
    /// the way typing would, which tag inputs need to pick the value up.
    fn write_text(&mut self, field: TextField, value: &str, signal: bool) -> Result<()>;

    fn toggle_enabled(&self, toggle: Toggle) -> Result<bool>;
    fn enable_toggle(&mut self, toggle: Toggle) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Edit log
// ---------------------------------------------------------------------------

/// One write applied to the form, addressed by CSS selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormEdit {
    Select { selector: String, value: String },
    Check { selector: String, value: String },
    Text { selector: String, value: String, signal: bool },
    Click { selector: String },
}

// ---------------------------------------------------------------------------
// HtmlForm
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct SelectState {
    options: Vec<SelectOption>,
    value: Option<String>,
}

#[derive(Debug, Clone)]
struct Checkbox {
    value: String,
    checked: bool,
}

/// [`DestinationForm`] over a parsed new-work page.
#[derive(Debug, Clone, Default)]
pub struct HtmlForm {
    selects: HashMap<SelectField, SelectState>,
    checkboxes: HashMap<CheckboxGroup, Vec<Checkbox>>,
    texts: HashMap<TextField, String>,
    toggles: HashMap<Toggle, bool>,
    edits: Vec<FormEdit>,
}

impl HtmlForm {
    /// Read the field state out of a new-work page.
    ///
    /// Fields the page lacks are simply absent; writing to them fails later.
    pub fn parse(html: &str) -> Result<Self> {
        let doc = Html::parse_document(html);
        let mut form = Self::default();

        for field in SelectField::ALL {
            if let Some(el) = doc.select(&selector(field.selector())?).next() {
                form.selects.insert(field, read_select(el)?);
            }
        }

        for group in CheckboxGroup::ALL {
            let boxes: Vec<_> = doc
                .select(&selector(group.selector())?)
                .map(|el| Checkbox {
                    value: el.value().attr("value").unwrap_or_default().trim().to_string(),
                    checked: el.value().attr("checked").is_some(),
                })
                // hidden placeholder inputs carry no value
                .filter(|b| !b.value.is_empty())
                .collect();
            if !boxes.is_empty() {
                form.checkboxes.insert(group, boxes);
            }
        }

        for field in TextField::ALL {
            if let Some(el) = doc.select(&selector(field.selector())?).next() {
                form.texts.insert(field, read_text(el));
            }
        }

        for toggle in Toggle::ALL {
            if let Some(el) = doc.select(&selector(toggle.selector())?).next() {
                form.toggles
                    .insert(toggle, el.value().attr("checked").is_some());
            }
        }

        tracing::debug!(
            selects = form.selects.len(),
            checkbox_groups = form.checkboxes.len(),
            texts = form.texts.len(),
            toggles = form.toggles.len(),
            "new work form parsed"
        );
        Ok(form)
    }

    /// Writes applied so far, in order.
    pub fn edits(&self) -> &[FormEdit] {
        &self.edits
    }

    pub fn into_edits(self) -> Vec<FormEdit> {
        self.edits
    }

    /// The submitted value currently selected, if any.
    pub fn selected(&self, field: SelectField) -> Option<&str> {
        self.selects.get(&field)?.value.as_deref()
    }

    /// Values currently checked in a group.
    pub fn checked(&self, group: CheckboxGroup) -> Vec<&str> {
        self.checkboxes
            .get(&group)
            .map(|boxes| {
                boxes
                    .iter()
                    .filter(|b| b.checked)
                    .map(|b| b.value.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PodficError::form(format!("bad selector '{css}': {e}")))
}

fn missing(field: impl fmt::Display) -> PodficError {
    PodficError::form(format!("the new work form has no {field} field"))
}

fn read_select(el: ElementRef<'_>) -> Result<SelectState> {
    let option_sel = selector("option")?;
    let mut value = None;
    let options = el
        .select(&option_sel)
        .map(|opt| {
            let label = opt.text().collect::<String>().trim().to_string();
            let option_value = opt
                .value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| label.clone());
            if opt.value().attr("selected").is_some() {
                value = Some(option_value.clone());
            }
            SelectOption {
                label,
                value: option_value,
            }
        })
        .collect();
    Ok(SelectState { options, value })
}

fn read_text(el: ElementRef<'_>) -> String {
    match el.value().name() {
        "input" => el.value().attr("value").unwrap_or_default().to_string(),
        _ => el.text().collect(),
    }
}

impl DestinationForm for HtmlForm {
    fn select_options(&self, field: SelectField) -> Result<Vec<SelectOption>> {
        self.selects
            .get(&field)
            .map(|s| s.options.clone())
            .ok_or_else(|| missing(field))
    }

    fn set_select(&mut self, field: SelectField, value: &str) -> Result<()> {
        let state = self.selects.get_mut(&field).ok_or_else(|| missing(field))?;
        if !state.options.iter().any(|o| o.value == value) {
            return Err(PodficError::form(format!(
                "{field} has no option with value '{value}'"
            )));
        }
        state.value = Some(value.to_string());
        self.edits.push(FormEdit::Select {
            selector: field.selector().to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn checkbox_values(&self, group: CheckboxGroup) -> Result<Vec<String>> {
        self.checkboxes
            .get(&group)
            .map(|boxes| boxes.iter().map(|b| b.value.clone()).collect())
            .ok_or_else(|| missing(group))
    }

    fn set_checked(&mut self, group: CheckboxGroup, value: &str) -> Result<()> {
        let boxes = self.checkboxes.get_mut(&group).ok_or_else(|| missing(group))?;
        let checkbox = boxes
            .iter_mut()
            .find(|b| b.value == value)
            .ok_or_else(|| PodficError::form(format!("{group} has no '{value}' box")))?;
        checkbox.checked = true;
        self.edits.push(FormEdit::Check {
            selector: group.selector().to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn text(&self, field: TextField) -> Result<String> {
        self.texts.get(&field).cloned().ok_or_else(|| missing(field))
    }

    fn write_text(&mut self, field: TextField, value: &str, signal: bool) -> Result<()> {
        let text = self.texts.get_mut(&field).ok_or_else(|| missing(field))?;
        *text = value.to_string();
        self.edits.push(FormEdit::Text {
            selector: field.selector().to_string(),
            value: value.to_string(),
            signal,
        });
        Ok(())
    }

    fn toggle_enabled(&self, toggle: Toggle) -> Result<bool> {
        self.toggles.get(&toggle).copied().ok_or_else(|| missing(toggle))
    }

    fn enable_toggle(&mut self, toggle: Toggle) -> Result<()> {
        let enabled = self.toggles.get_mut(&toggle).ok_or_else(|| missing(toggle))?;
        if !*enabled {
            *enabled = true;
            self.edits.push(FormEdit::Click {
                selector: toggle.selector().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM_PAGE: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../../fixtures/html/new_work_form.html"
    ));

    #[test]
    fn parses_fixture_fields() {
        let form = HtmlForm::parse(FORM_PAGE).unwrap();

        let ratings = form.select_options(SelectField::Rating).unwrap();
        assert!(ratings.iter().any(|o| o.label == "Teen And Up Audiences"));
        assert_eq!(form.selected(SelectField::Rating), None);

        let languages = form.select_options(SelectField::Language).unwrap();
        assert!(languages.contains(&SelectOption {
            label: "English".into(),
            value: "1".into(),
        }));

        let warnings = form.checkbox_values(CheckboxGroup::Warnings).unwrap();
        assert!(warnings.contains(&"Choose Not To Use Archive Warnings".to_string()));
        assert!(!warnings.contains(&"Madeup Warning".to_string()));

        assert_eq!(form.text(TextField::Title).unwrap(), "");
        assert_eq!(form.text(TextField::Body).unwrap(), "");
        assert!(!form.toggle_enabled(Toggle::Parent).unwrap());
        assert!(form.edits().is_empty());
    }

    #[test]
    fn writes_are_logged_in_order() {
        let mut form = HtmlForm::parse(FORM_PAGE).unwrap();
        form.set_select(SelectField::Rating, "Mature").unwrap();
        form.set_checked(CheckboxGroup::Categories, "Gen").unwrap();
        form.write_text(TextField::Fandoms, "Original Work", true).unwrap();
        form.enable_toggle(Toggle::BeginNotes).unwrap();
        form.enable_toggle(Toggle::BeginNotes).unwrap();

        assert_eq!(form.selected(SelectField::Rating), Some("Mature"));
        assert_eq!(form.checked(CheckboxGroup::Categories), vec!["Gen"]);
        assert_eq!(
            form.edits(),
            &[
                FormEdit::Select {
                    selector: "#work_rating_string".into(),
                    value: "Mature".into(),
                },
                FormEdit::Check {
                    selector: "dd.category input".into(),
                    value: "Gen".into(),
                },
                FormEdit::Text {
                    selector: "dd.fandom input".into(),
                    value: "Original Work".into(),
                    signal: true,
                },
                FormEdit::Click {
                    selector: "#front-notes-options-show".into(),
                },
            ]
        );
    }

    #[test]
    fn edit_log_serializes_with_kind_tag() {
        let edit = FormEdit::Click {
            selector: "dt.parent input".into(),
        };
        let json = serde_json::to_value(&edit).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "click", "selector": "dt.parent input"})
        );
    }

    #[test]
    fn missing_fields_are_form_errors() {
        let mut form = HtmlForm::parse("<html><body><p>not a form</p></body></html>").unwrap();
        let err = form.write_text(TextField::Title, "x", false).unwrap_err();
        assert!(matches!(err, PodficError::Form { .. }));
        assert!(err.to_string().contains("Title"));
        assert!(form.select_options(SelectField::Rating).is_err());
        assert!(form.enable_toggle(Toggle::Parent).is_err());
    }

    #[test]
    fn unknown_values_rejected() {
        let mut form = HtmlForm::parse(FORM_PAGE).unwrap();
        assert!(form.set_select(SelectField::Rating, "Nope").is_err());
        assert!(form.set_checked(CheckboxGroup::Warnings, "Madeup Warning").is_err());
        assert!(form.edits().is_empty());
    }
}
