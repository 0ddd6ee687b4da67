//! Typed client for the Veracode REST APIs used by mitigation sync.
//!
//! This crate models the applications, sandboxes and findings resources,
//! signs every request with the platform's HMAC scheme, and exposes the
//! [`ScanRemote`] trait as the seam the sync engine is written against.

mod applications;
mod auth;
mod client;
mod error;
mod findings;
mod remote;
mod sandboxes;

pub use applications::{AppProfile, Application};
pub use auth::{
    ApiCredentials, Credentials, CredentialsError, KEY_ID_VAR, KEY_SECRET_VAR, PROFILE_VAR,
};
pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use findings::{
    Annotation, AnnotationAction, Cwe, Finding, FindingDetails, FindingStatus, ParseScanTypeError,
    ResolutionStatus, ScanType,
};
pub use remote::ScanRemote;
pub use sandboxes::Sandbox;

/// HTTP `User-Agent` header sent with every API request.
pub(crate) const USER_AGENT: &str = concat!("mitsync/", env!("CARGO_PKG_VERSION"));
