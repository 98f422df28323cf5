//! Metadata extraction from an accepted work page.
//!
//! The page is read through CSS selectors grouped by region: the `.meta`
//! block holds the tag lists, `#workskin` holds the title, byline and summary.

mod summary;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use podfic_shared::{Authors, PodficError, Result, WorkRecord};

pub use summary::flatten_summary;

/// Archive-internal tag some works carry; never imported.
pub const META_TAG: &str = "Podfic Welcome";

macro_rules! selector {
    ($name:ident, $css:expr) => {
        static $name: LazyLock<Selector> =
            LazyLock::new(|| Selector::parse($css).expect("valid selector"));
    };
}

selector!(META, ".meta");
selector!(RATING, "dd.rating.tags");
selector!(WARNINGS, "dd.warning.tags a");
selector!(RELATIONSHIPS, "dd.relationship.tags a");
selector!(CHARACTERS, "dd.character.tags a");
selector!(CATEGORIES, "dd.category.tags a");
selector!(FANDOMS, "dd.fandom.tags a");
selector!(FREEFORM, "dd.freeform.tags a");
selector!(LANGUAGE, "dd.language");
selector!(WORKSKIN, "#workskin");
selector!(TITLE, "h2.title");
selector!(BYLINE_AUTHORS, r#".byline a[rel="author"]"#);
selector!(SUMMARY, "div.summary.module .userstuff");

/// Build a [`WorkRecord`] from a work page fetched from `page_url`.
///
/// `source_url` is left empty; the caller sets it to the URL the user gave.
#[instrument(skip_all, fields(url = %page_url))]
pub fn extract_work(doc: &Html, page_url: &Url) -> Result<WorkRecord> {
    let meta = required(doc.root_element(), &META, "metadata (.meta)")?;
    let rating = text_of(required(meta, &RATING, "rating (dd.rating.tags)")?);
    let language = text_of(required(meta, &LANGUAGE, "language (dd.language)")?);

    let freeform_tags = texts(meta, &FREEFORM)
        .into_iter()
        .filter(|tag| !tag.eq_ignore_ascii_case(META_TAG))
        .collect();

    let work = required(doc.root_element(), &WORKSKIN, "work (#workskin)")?;
    let title = text_of(required(work, &TITLE, "title (h2.title)")?);
    let authors = authors(work, page_url);

    let summary = work
        .select(&SUMMARY)
        .next()
        .map(|el| flatten_summary(&el.inner_html()))
        .unwrap_or_default();

    let record = WorkRecord {
        title,
        authors,
        rating,
        warnings: texts(meta, &WARNINGS),
        relationships: texts(meta, &RELATIONSHIPS),
        characters: texts(meta, &CHARACTERS),
        categories: texts(meta, &CATEGORIES),
        fandoms: texts(meta, &FANDOMS),
        freeform_tags,
        language,
        summary,
        source_url: String::new(),
    };

    debug!(
        title = %record.title,
        authors = record.authors.len(),
        warnings = record.warnings.len(),
        freeform = record.freeform_tags.len(),
        "work metadata extracted"
    );
    Ok(record)
}

fn required<'a>(scope: ElementRef<'a>, sel: &Selector, region: &str) -> Result<ElementRef<'a>> {
    scope
        .select(sel)
        .next()
        .ok_or_else(|| PodficError::extraction(format!("work page has no {region} region")))
}

/// Trimmed text with internal whitespace collapsed.
fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn texts(scope: ElementRef<'_>, sel: &Selector) -> Vec<String> {
    scope
        .select(sel)
        .map(text_of)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Byline authors in page order; gift recipients lack `rel="author"`.
fn authors(work: ElementRef<'_>, page_url: &Url) -> Authors {
    let mut authors = Authors::default();
    for link in work.select(&BYLINE_AUTHORS) {
        let name = text_of(link);
        if name.is_empty() {
            continue;
        }
        let href = link.value().attr("href").unwrap_or_default();
        let profile_url = page_url
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string());
        authors.insert(name, profile_url);
    }
    authors
}
