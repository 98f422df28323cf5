//! Access classification for a work page.
//!
//! The archive answers a work request in one of several ways: the work itself,
//! a redirect to the login page (restricted works), a redirect to a chapter
//! adult-content notice, or an "unrevealed" placeholder for challenge works.
//! [`Classifier`] walks those outcomes as a small state machine, escalating to
//! a credentialed fetch where that could help, and never issues more than
//! [`MAX_FOLLOW_UPS`] fetches after the first.

use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use podfic_shared::{PodficError, Result};

use crate::fetcher::{CredentialPolicy, FetchedPage, Fetcher};

/// Follow-up fetches allowed after the initial anonymous one.
pub const MAX_FOLLOW_UPS: u8 = 2;

const UNREVEALED_NOTICE: &str =
    "This work is part of an ongoing challenge and will be revealed soon";
const ADULT_NOTICE: &str = "This work could have adult content";

const LOGIN_BOUNDARY: &str = "users/login";
const PROFILE_BOUNDARY: &str = "users/";

// ---------------------------------------------------------------------------
// States and decisions
// ---------------------------------------------------------------------------

/// Where the classification currently stands.
///
/// Non-terminal states name the fetch whose result is awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationState {
    /// Initial anonymous fetch of the work URL.
    Start,
    /// Anonymous re-fetch of a chapter-level redirect target.
    ChapterWarningRedirect,
    /// Credentialed fetch after a login redirect or an unrevealed page.
    NeedsLogin,
    /// Credentialed re-fetch past an adult-content notice.
    CredentialedAdultGate,
    /// The last fetched page is the readable work.
    Accepted,
    /// The work cannot be read with the available credentials.
    AccessDenied,
}

impl ClassificationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::AccessDenied)
    }
}

/// A fetch the classifier wants performed next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: Url,
    pub policy: CredentialPolicy,
}

/// Outcome of feeding one fetched page to the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Fetch(FetchRequest),
    Accept,
    Deny,
}

/// The facts about a fetched page that drive classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageSignals {
    pub redirected: bool,
    pub login_boundary: bool,
    pub profile_boundary: bool,
    pub unrevealed: bool,
    pub adult_notice: bool,
}

impl PageSignals {
    /// Read the signals off a fetched page.
    pub fn read(page: &FetchedPage) -> Self {
        let doc = Html::parse_document(&page.body);
        let final_url = page.url.as_str();
        Self {
            redirected: page.redirected(),
            login_boundary: final_url.contains(LOGIN_BOUNDARY),
            profile_boundary: final_url.contains(PROFILE_BOUNDARY),
            unrevealed: looks_like_unrevealed(&doc),
            adult_notice: looks_like_adult_notice(&doc),
        }
    }
}

// ---------------------------------------------------------------------------
// Document checks
// ---------------------------------------------------------------------------

/// A challenge placeholder: the unrevealed notice and no work body.
pub fn looks_like_unrevealed(doc: &Html) -> bool {
    let notice = has_text(doc, "p.notice", UNREVEALED_NOTICE);
    let workskin = Selector::parse("#workskin")
        .map(|sel| doc.select(&sel).next().is_some())
        .unwrap_or(false);
    notice && !workskin
}

/// The archive's adult-content interstitial.
pub fn looks_like_adult_notice(doc: &Html) -> bool {
    has_text(doc, "p.caution", ADULT_NOTICE)
}

fn has_text(doc: &Html, selector: &str, needle: &str) -> bool {
    let Ok(sel) = Selector::parse(selector) else {
        return false;
    };
    doc.select(&sel)
        .any(|el| el.text().collect::<String>().contains(needle))
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// State machine over the fetches for one work URL.
#[derive(Debug, Clone)]
pub struct Classifier {
    work_url: Url,
    state: ClassificationState,
    follow_ups: u8,
}

impl Classifier {
    pub fn new(work_url: Url) -> Self {
        Self {
            work_url,
            state: ClassificationState::Start,
            follow_ups: 0,
        }
    }

    pub fn state(&self) -> ClassificationState {
        self.state
    }

    /// Fetches issued after the first one.
    pub fn follow_ups(&self) -> u8 {
        self.follow_ups
    }

    /// The anonymous fetch that starts classification.
    pub fn first_request(&self) -> FetchRequest {
        FetchRequest {
            url: self.work_url.clone(),
            policy: CredentialPolicy::Omit,
        }
    }

    /// Feed the page answering the last request.
    pub fn advance(&mut self, page: &FetchedPage) -> Decision {
        let signals = PageSignals::read(page);
        self.transition(page, signals)
    }

    /// Apply one transition given pre-read signals.
    pub fn transition(&mut self, page: &FetchedPage, signals: PageSignals) -> Decision {
        use ClassificationState::*;

        let from = self.state;
        let decision = match from {
            Start if signals.redirected && signals.login_boundary => {
                self.escalate(NeedsLogin, page.requested_url.clone(), CredentialPolicy::Include)
            }
            Start if signals.redirected => self.escalate(
                ChapterWarningRedirect,
                page.url.clone(),
                CredentialPolicy::Omit,
            ),
            Start | ChapterWarningRedirect if signals.unrevealed => {
                self.escalate(NeedsLogin, page.requested_url.clone(), CredentialPolicy::Include)
            }
            Start | ChapterWarningRedirect => self.accept(),

            NeedsLogin if signals.redirected && signals.profile_boundary => self.deny(),
            NeedsLogin if signals.redirected && signals.adult_notice => self.escalate(
                CredentialedAdultGate,
                page.url.clone(),
                CredentialPolicy::Include,
            ),
            NeedsLogin | CredentialedAdultGate if signals.unrevealed => self.deny(),
            NeedsLogin | CredentialedAdultGate => self.accept(),

            Accepted => Decision::Accept,
            AccessDenied => Decision::Deny,
        };

        debug!(
            ?from,
            to = ?self.state,
            follow_ups = self.follow_ups,
            final_url = %page.url,
            "classifier transition"
        );
        decision
    }

    fn escalate(&mut self, next: ClassificationState, url: Url, policy: CredentialPolicy) -> Decision {
        if self.follow_ups >= MAX_FOLLOW_UPS {
            debug!(?next, "follow-up limit reached");
            return self.deny();
        }
        self.follow_ups += 1;
        self.state = next;
        Decision::Fetch(FetchRequest { url, policy })
    }

    fn accept(&mut self) -> Decision {
        self.state = ClassificationState::Accepted;
        Decision::Accept
    }

    fn deny(&mut self) -> Decision {
        self.state = ClassificationState::AccessDenied;
        Decision::Deny
    }
}

/// Fetch `work_url` until the classifier accepts or denies it.
///
/// Returns the accepted page. Fetch errors end classification immediately.
#[instrument(skip_all, fields(url = %work_url))]
pub async fn resolve<F: Fetcher>(fetcher: &F, work_url: &Url) -> Result<FetchedPage> {
    let mut classifier = Classifier::new(work_url.clone());
    let mut request = classifier.first_request();

    loop {
        let page = fetcher.fetch(&request.url, request.policy).await?;
        match classifier.advance(&page) {
            Decision::Fetch(next) => request = next,
            Decision::Accept => {
                debug!(fetches = classifier.follow_ups() + 1, "work page accepted");
                return Ok(page);
            }
            Decision::Deny => return Err(PodficError::AccessDenied),
        }
    }
}
