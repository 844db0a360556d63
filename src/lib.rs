//! `dataverse-http` is an async HTTP client for the Dataverse Web API.
//!
//! [`DataverseClient::execute`] sends an authenticated request to
//! `{base_url}/api/data/{version}/{endpoint}` with retry, exponential backoff
//! and `Retry-After` handling. Account search and detail lookups build on it:
//! - [`DataverseClient::search_accounts`]
//! - [`DataverseClient::get_account_details`]
//! - [`DataverseClient::get_contact_details`]
//!
//! Tokens come from a [`TokenProvider`]; the client never signs in on its own.

mod auth;
mod client;
mod error;
mod options;
pub mod query;
mod request;
mod sleep;
mod types;

pub use auth::{SharedToken, StaticToken, TokenProvider};
pub use client::{normalize_base_url, DataverseClient, MAX_RETRY_AFTER};
pub use error::DataverseError;
pub use options::{ClientOptions, DEFAULT_API_VERSION};
pub use query::{record_id, DEFAULT_ACCOUNT_FIELDS};
pub use request::RequestOptions;
pub use types::{Account, ContactDetails, ContactName, EntityCollection};

/// Re-exported so callers can build [`RequestOptions`] without naming `reqwest`.
pub use reqwest::{header, Method};

pub type Result<T> = std::result::Result<T, DataverseError>;
