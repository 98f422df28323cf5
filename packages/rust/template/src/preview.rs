//! Template previews with sample values, and template warnings.

use crate::render::{Placeholder, substitute};
use crate::sanitize::{is_valid, looks_like_markup, sanitize};

/// Warning for a plain template that contains markup.
pub const TITLE_MARKUP_WARNING: &str =
    "This template should not contain HTML but it appears to contain HTML";

/// Warning for a rich template that uses markup the archive strips.
pub const RICH_MARKUP_WARNING: &str = "This template appears to contain HTML tags that cannot \
     be used on AO3, they have been removed from the preview";

const SAMPLE_TITLE: &str = "TITLE_TEXT";
const SAMPLE_AUTHORS: &str = "AUTHOR_1, AUTHOR_2";

/// Render a title template with sample values.
pub fn preview_title(template: &str) -> String {
    substitute(template, |p| match p {
        Placeholder::Title | Placeholder::TitleUnlinked => Some(SAMPLE_TITLE.into()),
        Placeholder::Authors | Placeholder::AuthorsUnlinked => Some(SAMPLE_AUTHORS.into()),
        Placeholder::Summary | Placeholder::BlockSummary => None,
    })
}

/// Render a summary, notes or body template with sample markup, sanitized.
pub fn preview_rich(template: &str) -> String {
    let rendered = substitute(template, |p| {
        Some(
            match p {
                Placeholder::BlockSummary => "<blockquote>BLOCK_SUMMARY_TEXT</blockquote>",
                Placeholder::Summary => "SUMMARY_TEXT",
                Placeholder::Title => "<a>TITLE_TEXT</a>",
                Placeholder::TitleUnlinked => SAMPLE_TITLE,
                Placeholder::Authors => "<a>AUTHOR_1</a>, <a>AUTHOR_2</a>",
                Placeholder::AuthorsUnlinked => SAMPLE_AUTHORS,
            }
            .to_string(),
        )
    });
    sanitize(&rendered)
}

/// Warning for a title template, if any.
pub fn check_title_template(template: &str) -> Option<&'static str> {
    looks_like_markup(template).then_some(TITLE_MARKUP_WARNING)
}

/// Warning for a summary, notes or body template, if any.
pub fn check_rich_template(template: &str) -> Option<&'static str> {
    (!is_valid(template)).then_some(RICH_MARKUP_WARNING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use podfic_shared::{DEFAULT_SUMMARY_TEMPLATE, DEFAULT_TITLE_TEMPLATE, DEFAULT_WORKBODY};

    #[test]
    fn title_preview() {
        assert_eq!(preview_title(DEFAULT_TITLE_TEMPLATE), "[Podfic] TITLE_TEXT");
        assert_eq!(
            preview_title("${title-unlinked} by ${author-unlinked} ${summary}"),
            "TITLE_TEXT by AUTHOR_1, AUTHOR_2 ${summary}"
        );
    }

    #[test]
    fn rich_preview_of_default_summary() {
        assert_eq!(
            preview_rich(DEFAULT_SUMMARY_TEMPLATE),
            "<blockquote>BLOCK_SUMMARY_TEXT</blockquote>Podfic of <a>TITLE_TEXT</a> by \
             <a>AUTHOR_1</a>, <a>AUTHOR_2</a>."
        );
    }

    #[test]
    fn rich_preview_strips_disallowed_markup() {
        assert_eq!(
            preview_rich("<marquee>${title-unlinked}</marquee><script>x</script>"),
            "TITLE_TEXT"
        );
    }

    #[test]
    fn warnings() {
        assert_eq!(check_title_template(DEFAULT_TITLE_TEMPLATE), None);
        assert_eq!(
            check_title_template("<b>${title}</b>"),
            Some(TITLE_MARKUP_WARNING)
        );
        assert_eq!(check_rich_template(DEFAULT_SUMMARY_TEMPLATE), None);
        assert_eq!(check_rich_template(DEFAULT_WORKBODY), None);
        assert_eq!(
            check_rich_template("<marquee>x</marquee>"),
            Some(RICH_MARKUP_WARNING)
        );
    }
}
