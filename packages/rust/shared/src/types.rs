//! Core domain types for a single import.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PodficError;

// ---------------------------------------------------------------------------
// ImportId
// ---------------------------------------------------------------------------

/// A UUID v7 identifying one pipeline run in logs (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportId(pub Uuid);

impl ImportId {
    /// Generate a new import identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ImportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ImportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Authors
// ---------------------------------------------------------------------------

/// A work's creator as shown in the byline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Display name (link text).
    pub name: String,
    /// Absolute URL of the creator's profile.
    pub profile_url: String,
}

/// Ordered author list keyed by display name.
///
/// Inserting a name that is already present replaces its profile URL but keeps
/// the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authors(Vec<Author>);

impl Authors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert or overwrite an author.
    pub fn insert(&mut self, name: impl Into<String>, profile_url: impl Into<String>) {
        let name = name.into();
        let profile_url = profile_url.into();
        match self.0.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.profile_url = profile_url,
            None => self.0.push(Author { name, profile_url }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Author> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Display names joined with `", "`.
    pub fn names(&self) -> String {
        self.0
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<N: Into<String>, U: Into<String>> FromIterator<(N, U)> for Authors {
    fn from_iter<I: IntoIterator<Item = (N, U)>>(iter: I) -> Self {
        let mut authors = Authors::new();
        for (name, url) in iter {
            authors.insert(name, url);
        }
        authors
    }
}

// ---------------------------------------------------------------------------
// WorkRecord
// ---------------------------------------------------------------------------

/// Metadata extracted from a source work page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRecord {
    pub title: String,
    pub authors: Authors,
    pub rating: String,
    pub warnings: Vec<String>,
    pub relationships: Vec<String>,
    pub characters: Vec<String>,
    pub categories: Vec<String>,
    pub fandoms: Vec<String>,
    pub freeform_tags: Vec<String>,
    pub language: String,
    /// Summary markup with paragraphs flattened to blank lines.
    pub summary: String,
    /// The URL the user asked for, never an intermediate fetch URL.
    pub source_url: String,
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How a title or summary template is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TemplateFormat {
    /// The built-in podfic template.
    #[default]
    Default,
    /// Leave the field empty.
    Blank,
    /// Copy the original value unchanged.
    Orig,
    /// The user's saved template.
    Custom,
}

impl From<String> for TemplateFormat {
    /// Unknown values fall back to [`TemplateFormat::Default`].
    fn from(value: String) -> Self {
        match value.as_str() {
            "blank" => Self::Blank,
            "orig" => Self::Orig,
            "custom" => Self::Custom,
            _ => Self::Default,
        }
    }
}

/// The fixed podfic length scale offered for the "Podfic Length" tag.
///
/// Stored as its label. A stored label outside the scale is kept as
/// [`PodficLength::Other`] and used verbatim in the tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PodficLength {
    #[default]
    UpTo10Minutes,
    UpTo20Minutes,
    UpTo30Minutes,
    UpTo45Minutes,
    UpTo60Minutes,
    UpTo90Minutes,
    UpTo2Hours,
    UpTo2HoursHalf,
    UpTo3Hours,
    UpTo3HoursHalf,
    UpTo4Hours,
    UpTo4HoursHalf,
    UpTo5Hours,
    UpTo6Hours,
    UpTo7Hours,
    UpTo10Hours,
    UpTo15Hours,
    UpTo20Hours,
    Over20Hours,
    Other(String),
}

impl PodficLength {
    /// Every step of the scale, shortest first.
    pub const ALL: [PodficLength; 19] = [
        Self::UpTo10Minutes,
        Self::UpTo20Minutes,
        Self::UpTo30Minutes,
        Self::UpTo45Minutes,
        Self::UpTo60Minutes,
        Self::UpTo90Minutes,
        Self::UpTo2Hours,
        Self::UpTo2HoursHalf,
        Self::UpTo3Hours,
        Self::UpTo3HoursHalf,
        Self::UpTo4Hours,
        Self::UpTo4HoursHalf,
        Self::UpTo5Hours,
        Self::UpTo6Hours,
        Self::UpTo7Hours,
        Self::UpTo10Hours,
        Self::UpTo15Hours,
        Self::UpTo20Hours,
        Self::Over20Hours,
    ];

    /// The label used in the tag, e.g. `1-1.5 Hours`.
    pub fn label(&self) -> &str {
        match self {
            Self::UpTo10Minutes => "0-10 Minutes",
            Self::UpTo20Minutes => "10-20 Minutes",
            Self::UpTo30Minutes => "20-30 Minutes",
            Self::UpTo45Minutes => "30-45 Minutes",
            Self::UpTo60Minutes => "45-60 Minutes",
            Self::UpTo90Minutes => "1-1.5 Hours",
            Self::UpTo2Hours => "1.5-2 Hours",
            Self::UpTo2HoursHalf => "2-2.5 Hours",
            Self::UpTo3Hours => "2.5-3 Hours",
            Self::UpTo3HoursHalf => "3-3.5 Hours",
            Self::UpTo4Hours => "3.5-4 Hours",
            Self::UpTo4HoursHalf => "4-4.5 Hours",
            Self::UpTo5Hours => "4.5-5 Hours",
            Self::UpTo6Hours => "5-6 Hours",
            Self::UpTo7Hours => "6-7 Hours",
            Self::UpTo10Hours => "7-10 Hours",
            Self::UpTo15Hours => "10-15 Hours",
            Self::UpTo20Hours => "15-20 Hours",
            Self::Over20Hours => "Over 20 Hours",
            Self::Other(label) => label,
        }
    }
}

impl std::str::FromStr for PodficLength {
    type Err = PodficError;

    /// Only labels on the scale parse.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.label() == s)
            .ok_or_else(|| PodficError::config(format!("unknown podfic length '{s}'")))
    }
}

impl From<String> for PodficLength {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(length) => length,
            Err(_) => Self::Other(value),
        }
    }
}

impl From<PodficLength> for String {
    fn from(length: PodficLength) -> Self {
        match length {
            PodficLength::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

const AUDIO_FORMAT_ID_PREFIX: &str = "audio-format-tag-";

/// Audio formats that can be advertised with an "Audio Format" tag.
///
/// Stored as option ids (`audio-format-tag-MP3`). Unrecognised ids are kept as
/// [`AudioFormat::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AudioFormat {
    Mp3,
    M4a,
    M4b,
    Streaming,
    Download,
    /// The stored option id, as given.
    Other(String),
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 5] = [
        Self::Mp3,
        Self::M4a,
        Self::M4b,
        Self::Streaming,
        Self::Download,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::Mp3 => "MP3",
            Self::M4a => "M4A",
            Self::M4b => "M4B",
            Self::Streaming => "Streaming",
            Self::Download => "Download",
            Self::Other(id) => id.strip_prefix(AUDIO_FORMAT_ID_PREFIX).unwrap_or(id),
        }
    }

    /// The stored option id.
    pub fn id(&self) -> String {
        match self {
            Self::Other(id) => id.clone(),
            known => format!("{AUDIO_FORMAT_ID_PREFIX}{}", known.label()),
        }
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = PodficError;

    /// Accepts either the label (`MP3`) or the stored id (`audio-format-tag-MP3`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let label = s.strip_prefix(AUDIO_FORMAT_ID_PREFIX).unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|f| f.label().eq_ignore_ascii_case(label))
            .ok_or_else(|| PodficError::config(format!("unknown audio format '{s}'")))
    }
}

impl From<String> for AudioFormat {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(format) => format,
            Err(_) => Self::Other(value),
        }
    }
}

impl From<AudioFormat> for String {
    fn from(format: AudioFormat) -> Self {
        format.id()
    }
}

/// User choices for one import, stored under the `options` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Source work URL as typed by the user.
    #[serde(default)]
    pub url: String,
    /// Append the "Podfic" tag.
    #[serde(default = "default_true")]
    pub podfic_label: bool,
    /// Append a "Podfic Length" tag.
    #[serde(default = "default_true")]
    pub podfic_length_label: bool,
    #[serde(default)]
    pub podfic_length_value: PodficLength,
    #[serde(default)]
    pub title_format: TemplateFormat,
    #[serde(default)]
    pub summary_format: TemplateFormat,
    #[serde(default, rename = "audioFormatTagOptionIds")]
    pub audio_formats: Vec<AudioFormat>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            podfic_label: true,
            podfic_length_label: true,
            podfic_length_value: PodficLength::default(),
            title_format: TemplateFormat::Default,
            summary_format: TemplateFormat::Default,
            audio_formats: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl ImportOptions {
    /// Standard tags appended to the freeform tags, in order.
    pub fn standard_tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        if self.podfic_label {
            tags.push("Podfic".to_string());
        }
        if self.podfic_length_label {
            tags.push(format!("Podfic Length: {}", self.podfic_length_value.label()));
        }
        for format in &self.audio_formats {
            tags.push(format!("Audio Format: {}", format.label()));
        }
        tags
    }
}

// ---------------------------------------------------------------------------
// ImportResult
// ---------------------------------------------------------------------------

/// Terminal outcome of one import, in the shape the caller expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum ImportResult {
    Success,
    Error { message: String },
}

impl ImportResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<&PodficError> for ImportResult {
    /// Anticipated failures keep their message; everything else is reported
    /// as an unhandled error with its diagnostic.
    fn from(err: &PodficError) -> Self {
        match err {
            PodficError::Unhandled(_) => Self::error(err.to_string()),
            e if e.is_anticipated() => Self::error(e.to_string()),
            e => Self::error(PodficError::Unhandled(e.to_string()).to_string()),
        }
    }
}
