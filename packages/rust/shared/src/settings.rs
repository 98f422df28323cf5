//! User templates and the settings bundle one import reads.

use serde::{Deserialize, Serialize};

use crate::types::ImportOptions;

/// Built-in title template.
pub const DEFAULT_TITLE_TEMPLATE: &str = "[Podfic] ${title}";

/// Built-in summary template.
pub const DEFAULT_SUMMARY_TEMPLATE: &str = "${blocksummary}Podfic of ${title} by ${authors}.";

/// Built-in work body: building blocks for cover art, a player and a download link.
pub const DEFAULT_WORKBODY: &str = "Here are a few building blocks that that show how you can \
include an image, audio, or a link to your podfic in your post. They're all optional, and you \
can change these defaults to match your own default posting template by going to the option \
page for this extension. Happy posting!\n\n\
<img src=\"IMAGE_URL\" width=\"500px\" alt=\"Cover art. COVER_DESCRIPTION.\" />\n\n\
<audio src=\"PODFIC_URL_ENDING_IN_MP3\" controls=\"controls\" crossorigin=\"anonymous\" \
preload=\"metadata\"> </audio>\n\n\
<a href=\"PODFIC_URL\" rel=\"nofollow\">Download the podfic here (FILE_SIZE MB/FILE_MINUTES \
minutes)</a>.";

// ---------------------------------------------------------------------------
// Stored template shapes
// ---------------------------------------------------------------------------

/// A single stored template (`{"default": "..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSlot {
    #[serde(default)]
    pub default: String,
}

impl TemplateSlot {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            default: template.into(),
        }
    }
}

/// The notes template and where the rendered notes go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesTemplate {
    #[serde(default)]
    pub default: String,
    /// Write into the beginning notes.
    #[serde(default)]
    pub begin: bool,
    /// Write into the end notes.
    #[serde(default)]
    pub end: bool,
}

/// Every user template the pipeline renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    pub workbody: TemplateSlot,
    pub title: TemplateSlot,
    pub summary: TemplateSlot,
    pub notes: NotesTemplate,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            workbody: TemplateSlot::new(DEFAULT_WORKBODY),
            title: TemplateSlot::new(DEFAULT_TITLE_TEMPLATE),
            summary: TemplateSlot::new(DEFAULT_SUMMARY_TEMPLATE),
            notes: NotesTemplate::default(),
        }
    }
}

impl TemplateSet {
    /// Restore the title template to the built-in one (not persisted).
    pub fn reset_title(&mut self) {
        self.title = TemplateSlot::new(DEFAULT_TITLE_TEMPLATE);
    }

    /// Restore the summary template to the built-in one (not persisted).
    pub fn reset_summary(&mut self) {
        self.summary = TemplateSlot::new(DEFAULT_SUMMARY_TEMPLATE);
    }

    /// Clear the notes template and both placement flags (not persisted).
    pub fn reset_notes(&mut self) {
        self.notes = NotesTemplate::default();
    }
}

/// Everything one import reads from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSettings {
    pub options: ImportOptions,
    pub templates: TemplateSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resets_restore_defaults() {
        let mut templates = TemplateSet {
            title: TemplateSlot::new("${author} reads ${title}"),
            summary: TemplateSlot::new("${summary}"),
            notes: NotesTemplate {
                default: "Thanks!".into(),
                begin: true,
                end: true,
            },
            ..TemplateSet::default()
        };

        templates.reset_title();
        templates.reset_summary();
        templates.reset_notes();

        assert_eq!(templates, TemplateSet::default());
    }

    #[test]
    fn notes_template_tolerates_missing_flags() {
        let notes: NotesTemplate = serde_json::from_str(r#"{"default": "hi"}"#).unwrap();
        assert_eq!(notes.default, "hi");
        assert!(!notes.begin && !notes.end);
    }
}
