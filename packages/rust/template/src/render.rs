//! Placeholder substitution for user templates.
//!
//! Placeholders are literal, case-sensitive `${name}` tokens. Plain rendering
//! (titles) inserts bare text; rich rendering (summary, notes, body) links the
//! title and authors. Substitution is one left-to-right pass, so substituted
//! text is never scanned for placeholders again.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use podfic_shared::{
    DEFAULT_SUMMARY_TEMPLATE, DEFAULT_TITLE_TEMPLATE, TemplateFormat, WorkRecord,
};

/// A recognised placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Title,
    TitleUnlinked,
    Authors,
    AuthorsUnlinked,
    Summary,
    BlockSummary,
}

impl Placeholder {
    /// Map a token name (the text between `${` and `}`) to a placeholder.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "title-unlinked" => Some(Self::TitleUnlinked),
            "authors" | "author" => Some(Self::Authors),
            "authors-unlinked" | "author-unlinked" => Some(Self::AuthorsUnlinked),
            "summary" => Some(Self::Summary),
            "blocksummary" => Some(Self::BlockSummary),
            _ => None,
        }
    }
}

/// Replace every `${name}` for which `value_of` returns a value.
///
/// Tokens `value_of` declines are left exactly as written.
pub fn substitute(template: &str, mut value_of: impl FnMut(Placeholder) -> Option<String>) -> String {
    static TOKEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\$\{([A-Za-z0-9_-]+)\}").expect("valid regex"));

    TOKEN_RE
        .replace_all(template, |caps: &Captures<'_>| {
            Placeholder::from_name(&caps[1])
                .and_then(&mut value_of)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Template selection
// ---------------------------------------------------------------------------

/// The title template for a format; `custom` is the user's saved template.
pub fn title_template(format: TemplateFormat, custom: &str) -> String {
    match format {
        TemplateFormat::Blank => String::new(),
        TemplateFormat::Orig => "${title}".into(),
        TemplateFormat::Custom => custom.into(),
        TemplateFormat::Default => DEFAULT_TITLE_TEMPLATE.into(),
    }
}

/// The summary template for a format; `custom` is the user's saved template.
pub fn summary_template(format: TemplateFormat, custom: &str) -> String {
    match format {
        TemplateFormat::Blank => String::new(),
        TemplateFormat::Orig => "${summary}".into(),
        TemplateFormat::Custom => custom.into(),
        TemplateFormat::Default => DEFAULT_SUMMARY_TEMPLATE.into(),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a plain-text template. Summary placeholders are left untouched.
pub fn render_plain(template: &str, work: &WorkRecord) -> String {
    substitute(template, |p| match p {
        Placeholder::Title | Placeholder::TitleUnlinked => Some(work.title.clone()),
        Placeholder::Authors | Placeholder::AuthorsUnlinked => Some(work.authors.names()),
        Placeholder::Summary | Placeholder::BlockSummary => None,
    })
}

/// Render a markup template with linked title and authors.
pub fn render_rich(template: &str, work: &WorkRecord) -> String {
    substitute(template, |p| {
        Some(match p {
            Placeholder::Title => link(&work.source_url, &work.title),
            Placeholder::TitleUnlinked => work.title.clone(),
            Placeholder::Authors => linked_authors(work),
            Placeholder::AuthorsUnlinked => work.authors.names(),
            Placeholder::Summary => work.summary.clone(),
            Placeholder::BlockSummary => format!("<blockquote>{}</blockquote>", work.summary),
        })
    })
}

fn link(href: &str, text: &str) -> String {
    format!("<a href=\"{href}\">{text}</a>")
}

fn linked_authors(work: &WorkRecord) -> String {
    work.authors
        .iter()
        .map(|a| link(&a.profile_url, &a.name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use podfic_shared::{Authors, TemplateSet};

    fn sample() -> WorkRecord {
        WorkRecord {
            title: "T".into(),
            source_url: "U".into(),
            authors: [("A1", "U1"), ("A2", "U2")].into_iter().collect::<Authors>(),
            summary: "S".into(),
            ..Default::default()
        }
    }

    #[test]
    fn rich_vocabulary() {
        let template = "${title} ${title-unlinked} ${authors} ${author} ${authors-unlinked} ${author-unlinked}";
        assert_eq!(
            render_rich(template, &sample()),
            "<a href=\"U\">T</a> T <a href=\"U1\">A1</a>, <a href=\"U2\">A2</a> \
             <a href=\"U1\">A1</a>, <a href=\"U2\">A2</a> A1, A2 A1, A2"
        );
    }

    #[test]
    fn rich_summary_tokens() {
        assert_eq!(
            render_rich("${blocksummary}Podfic of ${title}.", &sample()),
            "<blockquote>S</blockquote>Podfic of <a href=\"U\">T</a>."
        );
        assert_eq!(render_rich("[${summary}]", &sample()), "[S]");
    }

    #[test]
    fn plain_vocabulary_leaves_summary_tokens() {
        assert_eq!(
            render_plain("${title} by ${author} ${summary} ${blocksummary}", &sample()),
            "T by A1, A2 ${summary} ${blocksummary}"
        );
    }

    #[test]
    fn unknown_and_miscased_tokens_untouched() {
        let template = "${x} ${Title} ${ title} $title {title}";
        assert_eq!(render_rich(template, &sample()), template);
        assert_eq!(render_plain(template, &sample()), template);
    }

    #[test]
    fn substituted_text_not_rescanned() {
        let mut work = sample();
        work.title = "${summary}".into();
        assert_eq!(render_rich("${title-unlinked}", &work), "${summary}");
    }

    #[test]
    fn template_selection() {
        assert_eq!(title_template(TemplateFormat::Blank, "c"), "");
        assert_eq!(title_template(TemplateFormat::Orig, "c"), "${title}");
        assert_eq!(title_template(TemplateFormat::Custom, "c"), "c");
        assert_eq!(title_template(TemplateFormat::Default, "c"), "[Podfic] ${title}");

        assert_eq!(summary_template(TemplateFormat::Blank, "c"), "");
        assert_eq!(summary_template(TemplateFormat::Orig, "c"), "${summary}");
        assert_eq!(summary_template(TemplateFormat::Custom, "c"), "c");
        assert_eq!(
            summary_template(TemplateFormat::Default, "c"),
            "${blocksummary}Podfic of ${title} by ${authors}."
        );
    }

    #[test]
    fn reset_title_renders_like_default() {
        let mut templates = TemplateSet::default();
        templates.title.default = "My ${title} (${authors-unlinked})".into();
        templates.reset_title();

        let rendered = render_plain(
            &title_template(TemplateFormat::Custom, &templates.title.default),
            &sample(),
        );
        let expected = render_plain(
            &title_template(TemplateFormat::Default, ""),
            &sample(),
        );
        assert_eq!(rendered, expected);
        assert_eq!(rendered, "[Podfic] T");
    }
}
