//! End-to-end import: settings → fetch and classify → extract → render → fill.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use scraper::Html;
use tracing::{Instrument, error, info, info_span, instrument, warn};

use podfic_extract::extract_work;
use podfic_fetch::{FetchedPage, Fetcher, parse_work_url, resolve};
use podfic_shared::{
    ConfigStore, ImportId, ImportResult, ImportSettings, PodficError, Result, WorkRecord,
    load_import_settings,
};
use podfic_template::{
    check_rich_template, check_title_template, render_plain, render_rich, summary_template,
    title_template,
};

use crate::form::DestinationForm;
use crate::mapper::{MappingReport, NotesPlacement, RenderedFields, map_into_form};

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once with the terminal result.
    fn done(&self, result: &ImportResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &ImportResult) {}
}

/// Import the work named by the stored `options.url` and fill in `form`.
///
/// Never fails: every error, and any panic at any stage of the run, is folded
/// into the returned [`ImportResult`].
pub async fn import_and_fill<S, F, D>(
    store: &S,
    fetcher: &F,
    form: &mut D,
    progress: &dyn ProgressReporter,
) -> ImportResult
where
    S: ConfigStore,
    F: Fetcher,
    D: DestinationForm,
{
    let import_id = ImportId::new();
    let span = info_span!("import", %import_id);

    let run = AssertUnwindSafe(run_import(store, fetcher, form, progress).instrument(span))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(PodficError::Unhandled(panic_message(payload.as_ref()))));

    let result = match run {
        Ok(()) => {
            info!(%import_id, "import complete");
            ImportResult::Success
        }
        Err(e) if e.is_anticipated() => {
            warn!(%import_id, error = %e, "import finished with an error");
            ImportResult::from(&e)
        }
        Err(e) => {
            error!(%import_id, error = %e, "import failed unexpectedly");
            ImportResult::from(&e)
        }
    };

    progress.done(&result);
    result
}

async fn run_import<S, F, D>(
    store: &S,
    fetcher: &F,
    form: &mut D,
    progress: &dyn ProgressReporter,
) -> Result<()>
where
    S: ConfigStore,
    F: Fetcher,
    D: DestinationForm,
{
    progress.phase("Loading settings");
    let settings = load_import_settings(store).await?;
    let work_url = parse_work_url(&settings.options.url)?;
    info!(url = %work_url, "starting import");

    progress.phase("Fetching work");
    let page = resolve(fetcher, &work_url).await?;

    progress.phase("Filling in the form");
    fill_form(&page, &settings, form)?.into_result()
}

/// Extract, render and map one accepted page.
fn fill_form<D: DestinationForm + ?Sized>(
    page: &FetchedPage,
    settings: &ImportSettings,
    form: &mut D,
) -> Result<MappingReport> {
    let doc = Html::parse_document(&page.body);
    let mut work = extract_work(&doc, &page.url)?;
    work.source_url = settings.options.url.clone();

    let rendered = render_fields(&work, settings);
    map_into_form(
        form,
        &work,
        &rendered,
        &settings.options,
        NotesPlacement::from(&settings.templates.notes),
    )
}

/// Render every templated field for a work.
///
/// Templates the archive would reject are logged, not refused.
#[instrument(skip_all)]
pub fn render_fields(work: &WorkRecord, settings: &ImportSettings) -> RenderedFields {
    let options = &settings.options;
    let templates = &settings.templates;

    let title = title_template(options.title_format, &templates.title.default);
    let summary = summary_template(options.summary_format, &templates.summary.default);

    if let Some(warning) = check_title_template(&title) {
        warn!(template = "title", "{warning}");
    }
    for (name, template) in [
        ("summary", summary.as_str()),
        ("notes", templates.notes.default.as_str()),
        ("workbody", templates.workbody.default.as_str()),
    ] {
        if let Some(warning) = check_rich_template(template) {
            warn!(template = name, "{warning}");
        }
    }

    RenderedFields {
        title: render_plain(&title, work),
        summary: render_rich(&summary, work),
        notes: render_rich(&templates.notes.default, work),
        body: render_rich(&templates.workbody.default, work),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during import".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{
        CheckboxGroup, HtmlForm, SelectField, SelectOption, TextField, Toggle,
    };
    use podfic_fetch::HttpFetcher;
    use podfic_shared::store::keys;
    use podfic_shared::{
        ACCESS_ERROR_MESSAGE, AppConfig, ImportOptions, MemoryStore, PARTIAL_COMPLETION_MESSAGE,
        TemplateFormat, UNHANDLED_ERROR_PREFIX, set_typed,
    };
    use std::sync::Mutex;
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WORK_PAGE: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../../fixtures/html/work.html"
    ));
    const UNREVEALED_PAGE: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../../fixtures/html/work_unrevealed.html"
    ));
    const FORM_PAGE: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../../fixtures/html/new_work_form.html"
    ));

    async fn serve(body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(path("/works/42"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    async fn store_for(url: &str) -> MemoryStore {
        let store = MemoryStore::new();
        let options = ImportOptions {
            url: url.to_string(),
            ..Default::default()
        };
        set_typed(&store, keys::OPTIONS, &options).await.unwrap();
        store
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&AppConfig::default(), None).unwrap()
    }

    /// Records phases and the final result.
    #[derive(Default)]
    struct RecordingProgress {
        phases: Mutex<Vec<String>>,
        done: Mutex<Option<ImportResult>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.phases.lock().unwrap().push(name.to_string());
        }
        fn done(&self, result: &ImportResult) {
            *self.done.lock().unwrap() = Some(result.clone());
        }
    }

    #[tokio::test]
    async fn imports_work_into_form() {
        let server = serve(WORK_PAGE).await;
        let url = format!("{}/works/42", server.uri());
        let store = store_for(&url).await;
        let mut form = HtmlForm::parse(FORM_PAGE).unwrap();
        let progress = RecordingProgress::default();

        let result = import_and_fill(&store, &fetcher(), &mut form, &progress).await;

        assert_eq!(result, ImportResult::Success);
        assert_eq!(
            form.selected(SelectField::Rating),
            Some("Teen And Up Audiences")
        );
        assert_eq!(form.selected(SelectField::Language), Some("1"));
        assert_eq!(
            form.checked(CheckboxGroup::Warnings),
            vec!["Graphic Depictions Of Violence", "Major Character Death"]
        );
        assert_eq!(
            form.text(TextField::Title).unwrap(),
            "[Podfic] The Long Way Home"
        );
        assert_eq!(
            form.text(TextField::FreeformTags).unwrap(),
            "Angst, Happy Ending, Podfic, Podfic Length: 0-10 Minutes"
        );
        // the parent link is the URL the user gave, not the fetched one
        assert_eq!(form.text(TextField::ParentUrl).unwrap(), url);

        let summary = form.text(TextField::Summary).unwrap();
        assert!(summary.starts_with(
            "<blockquote>Alice walks home.\n\nIt takes <em>a while</em>.</blockquote>Podfic of "
        ));
        assert!(summary.contains(&format!("<a href=\"{url}\">The Long Way Home</a>")));
        assert!(summary.contains(&format!(
            "<a href=\"{}/users/writer_one/pseuds/writer_one\">writer_one</a>",
            server.uri()
        )));

        assert_eq!(
            *progress.phases.lock().unwrap(),
            vec!["Loading settings", "Fetching work", "Filling in the form"]
        );
        assert_eq!(*progress.done.lock().unwrap(), Some(ImportResult::Success));
    }

    #[tokio::test]
    async fn unknown_warning_gives_partial_completion() {
        let page = WORK_PAGE.replace("Major Character Death</a>", "Madeup Warning</a>");
        let server = serve(&page).await;
        let store = store_for(&format!("{}/works/42", server.uri())).await;
        let mut form = HtmlForm::parse(FORM_PAGE).unwrap();

        let result = import_and_fill(&store, &fetcher(), &mut form, &SilentProgress).await;

        assert_eq!(result, ImportResult::error(PARTIAL_COMPLETION_MESSAGE));
        assert_eq!(
            form.checked(CheckboxGroup::Warnings),
            vec!["Graphic Depictions Of Violence"]
        );
        assert_eq!(form.text(TextField::Fandoms).unwrap(), "Original Work");
        assert!(!form.text(TextField::Body).unwrap().is_empty());
    }

    #[tokio::test]
    async fn unrevealed_work_is_denied() {
        let server = serve(UNREVEALED_PAGE).await;
        let store = store_for(&format!("{}/works/42", server.uri())).await;
        let mut form = HtmlForm::parse(FORM_PAGE).unwrap();

        let result = import_and_fill(&store, &fetcher(), &mut form, &SilentProgress).await;

        assert_eq!(result, ImportResult::error(ACCESS_ERROR_MESSAGE));
        assert!(form.edits().is_empty());
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(path("/works/42"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let store = store_for(&format!("{}/works/42", server.uri())).await;
        let mut form = HtmlForm::parse(FORM_PAGE).unwrap();

        let result = import_and_fill(&store, &fetcher(), &mut form, &SilentProgress).await;

        match result {
            ImportResult::Error { message } => {
                assert!(message.starts_with("Failed to fetch the work! Error: 500"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_url_is_invalid() {
        let store = MemoryStore::new();
        let mut form = HtmlForm::parse(FORM_PAGE).unwrap();

        let result = import_and_fill(&store, &fetcher(), &mut form, &SilentProgress).await;

        match result {
            ImportResult::Error { message } => assert!(message.starts_with("invalid URL")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_form_fields_are_unhandled() {
        let server = serve(WORK_PAGE).await;
        let store = store_for(&format!("{}/works/42", server.uri())).await;
        let mut form = HtmlForm::parse("<html><body></body></html>").unwrap();

        let result = import_and_fill(&store, &fetcher(), &mut form, &SilentProgress).await;

        match result {
            ImportResult::Error { message } => {
                assert!(message.starts_with(UNHANDLED_ERROR_PREFIX));
                assert!(message.contains("Rating"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    /// A form that blows up on first use.
    struct PanickingForm;

    impl DestinationForm for PanickingForm {
        fn select_options(&self, _: SelectField) -> Result<Vec<SelectOption>> {
            panic!("form went away")
        }
        fn set_select(&mut self, _: SelectField, _: &str) -> Result<()> {
            unreachable!()
        }
        fn checkbox_values(&self, _: CheckboxGroup) -> Result<Vec<String>> {
            unreachable!()
        }
        fn set_checked(&mut self, _: CheckboxGroup, _: &str) -> Result<()> {
            unreachable!()
        }
        fn text(&self, _: TextField) -> Result<String> {
            unreachable!()
        }
        fn write_text(&mut self, _: TextField, _: &str, _: bool) -> Result<()> {
            unreachable!()
        }
        fn toggle_enabled(&self, _: Toggle) -> Result<bool> {
            unreachable!()
        }
        fn enable_toggle(&mut self, _: Toggle) -> Result<()> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn panics_become_unhandled_errors() {
        let server = serve(WORK_PAGE).await;
        let store = store_for(&format!("{}/works/42", server.uri())).await;

        let result =
            import_and_fill(&store, &fetcher(), &mut PanickingForm, &SilentProgress).await;

        assert_eq!(
            result,
            ImportResult::error(format!("{UNHANDLED_ERROR_PREFIX}: form went away"))
        );
    }

    /// A store that panics on first read.
    struct PanickingStore;

    impl ConfigStore for PanickingStore {
        async fn get(&self, _: &str) -> Result<Option<serde_json::Value>> {
            panic!("store went away")
        }
        async fn set(&self, _: &str, _: serde_json::Value) -> Result<()> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn panics_before_filling_become_unhandled_errors() {
        let mut form = HtmlForm::parse(FORM_PAGE).unwrap();
        let progress = RecordingProgress::default();

        let result = import_and_fill(&PanickingStore, &fetcher(), &mut form, &progress).await;

        let expected = ImportResult::error(format!("{UNHANDLED_ERROR_PREFIX}: store went away"));
        assert_eq!(result, expected);
        assert_eq!(*progress.done.lock().unwrap(), Some(expected));
        assert!(form.edits().is_empty());
    }

    #[test]
    fn render_fields_follow_formats() {
        let work = WorkRecord {
            title: "T".into(),
            source_url: "U".into(),
            summary: "S".into(),
            ..Default::default()
        };
        let mut settings = ImportSettings::default();
        settings.options.title_format = TemplateFormat::Orig;
        settings.options.summary_format = TemplateFormat::Blank;
        settings.templates.notes.default = "Read ${title}".into();
        settings.templates.workbody.default = "${summary}".into();

        let rendered = render_fields(&work, &settings);
        assert_eq!(rendered.title, "T");
        assert_eq!(rendered.summary, "");
        assert_eq!(rendered.notes, "Read <a href=\"U\">T</a>");
        assert_eq!(rendered.body, "S");
    }
}
