//! Work page retrieval and access classification.
//!
//! [`HttpFetcher`] performs single requests; [`resolve`] drives the
//! [`Classifier`] over as many fetches as the archive's access rules need.

pub mod classifier;
pub mod fetcher;

pub use classifier::{
    ClassificationState, Classifier, Decision, FetchRequest, MAX_FOLLOW_UPS, PageSignals,
    looks_like_adult_notice, looks_like_unrevealed, resolve,
};
pub use fetcher::{
    CredentialPolicy, FetchedPage, Fetcher, HttpFetcher, parse_work_url, with_adult_consent,
};
