use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use crate::{
    auth::bearer_authorization,
    query::{account_details_endpoint, account_search_endpoint, contact_details_endpoint},
    sleep::sleep,
    Account, ClientOptions, ContactDetails, DataverseError, EntityCollection, RequestOptions,
    Result, StaticToken, TokenProvider,
};

/// Checks that `url` is an absolute `http(s)` URL and strips trailing slashes.
pub fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| {
            DataverseError::Config(format!(
                "base url must start with http:// or https://, got '{trimmed}'"
            ))
        })?;
    if rest.trim_end_matches('/').is_empty() {
        return Err(DataverseError::Config(format!("base url has no host: '{trimmed}'")));
    }
    Ok(trimmed.trim_end_matches('/').to_owned())
}

/// Result of one HTTP attempt that did not fail outright.
enum Attempt {
    Done(JsonValue),
    RateLimited {
        retry_after: Option<Duration>,
        error: DataverseError,
    },
}

#[derive(Clone)]
/// HTTP client for the Dataverse Web API.
///
/// Every call reads a bearer token from the injected [`TokenProvider`],
/// retries transient failures with exponential backoff and waits out
/// `429 Too Many Requests` responses using the server's `Retry-After`.
pub struct DataverseClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    options: ClientOptions,
}

impl fmt::Debug for DataverseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataverseClient")
            .field("base_url", &self.base_url)
            .field("tokens", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

impl DataverseClient {
    /// Creates a client for the environment at `base_url`
    /// (e.g. `https://org.crm11.dynamics.com`).
    ///
    /// Trailing slashes are removed. A URL without an `http(s)://` scheme is
    /// not rejected here; every call then fails with [`DataverseError::Config`]
    /// before anything is sent. [`DataverseClient::update_base_url`] validates
    /// up front.
    pub fn new(base_url: impl Into<String>, tokens: impl TokenProvider + 'static) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim().trim_end_matches('/').to_owned(),
            tokens: Arc::new(tokens),
            options: ClientOptions::default(),
        }
    }

    /// Creates a client that always sends the same token.
    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(base_url, StaticToken::new(token))
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `DATAVERSE_URL` — environment URL, e.g. `https://org.crm11.dynamics.com`
    /// - `DATAVERSE_TOKEN` — access token (Bearer prefix optional)
    /// - `DATAVERSE_API_VERSION` — optional, defaults to `v9.2`
    ///
    /// **Not available on `wasm32` targets.**
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("DATAVERSE_URL").map_err(|_| {
            DataverseError::Config("missing DATAVERSE_URL environment variable".to_owned())
        })?;
        let token = std::env::var("DATAVERSE_TOKEN").map_err(|_| {
            DataverseError::Config("missing DATAVERSE_TOKEN environment variable".to_owned())
        })?;
        if token.trim().is_empty() {
            return Err(DataverseError::Config("DATAVERSE_TOKEN is set but empty".to_owned()));
        }
        let base_url = normalize_base_url(&url)?;

        let mut options = ClientOptions::default();
        if let Ok(version) = std::env::var("DATAVERSE_API_VERSION") {
            if !version.trim().is_empty() {
                options.api_version = version.trim().to_owned();
            }
        }
        Ok(Self::with_token(base_url, token).with_options(options))
    }

    /// Applies client options such as API version and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Replaces the underlying `reqwest` client (proxies, custom TLS).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Points the client at another environment.
    ///
    /// Calls already in flight keep the URL they started with. An invalid URL
    /// is rejected and the current one kept.
    pub fn update_base_url(&mut self, url: &str) -> Result<()> {
        self.base_url = normalize_base_url(url)?;
        #[cfg(feature = "tracing")]
        tracing::info!(base_url = %self.base_url, "dataverse base url updated");
        Ok(())
    }

    /// OAuth scope a token must be issued for to call this environment.
    pub fn token_scope(&self) -> String {
        format!("{}/.default", self.base_url)
    }

    /// Link that opens a record in the model-driven app.
    pub fn record_url(&self, entity: &str, id: &str) -> String {
        format!(
            "{}/main.aspx?pagetype=entityrecord&etn={entity}&id={id}",
            self.base_url
        )
    }

    /// Full request URL for an endpoint path such as `accounts?$top=5`.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/api/data/{}/{}",
            self.base_url,
            self.options.api_version,
            endpoint.trim_start_matches('/')
        )
    }

    /// Lists accounts whose name contains `query`, projected to `fields`.
    ///
    /// A blank query lists accounts without a name filter.
    pub async fn search_accounts<S: AsRef<str>>(
        &self,
        query: &str,
        fields: &[S],
    ) -> Result<Vec<Account>> {
        let endpoint = account_search_endpoint(query, fields);
        let page: EntityCollection<Account> =
            self.execute_as(&endpoint, RequestOptions::get()).await?;
        Ok(page.value)
    }

    /// Reads one account with address fields and both contact lookups expanded.
    ///
    /// `account_id` must be a GUID; anything else fails with
    /// [`DataverseError::Config`] before a request is sent.
    pub async fn get_account_details(&self, account_id: &str) -> Result<Account> {
        let endpoint = account_details_endpoint(account_id)?;
        self.execute_as(&endpoint, RequestOptions::get()).await
    }

    /// Reads the parent customer reference of one contact.
    pub async fn get_contact_details(&self, contact_id: &str) -> Result<ContactDetails> {
        let endpoint = contact_details_endpoint(contact_id)?;
        self.execute_as(&endpoint, RequestOptions::get()).await
    }

    /// Like [`DataverseClient::execute`], decoding the body into `T`.
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let body = self.execute(endpoint, options).await?;
        serde_json::from_value(body).map_err(|err| {
            DataverseError::Decode(format!("unexpected response shape for '{endpoint}': {err}"))
        })
    }

    /// Sends a request to `endpoint`, retrying transient failures.
    ///
    /// Up to `max_retries` attempts are made. A missing token fails with
    /// [`DataverseError::Authentication`] before anything is sent. A 429
    /// waits for `Retry-After` (seconds) or the exponential backoff and counts
    /// against the same attempt budget as other failures. A successful
    /// response with an empty body yields `Value::Null`.
    pub async fn execute(&self, endpoint: &str, options: RequestOptions) -> Result<JsonValue> {
        normalize_base_url(&self.base_url)?;
        let url = self.endpoint_url(endpoint);
        let method = options.method();
        let max_attempts = self.options.max_attempts();
        let mut attempt = 0usize;

        loop {
            let token = self
                .tokens
                .bearer_token()
                .ok_or(DataverseError::Authentication)?;
            let last_attempt = attempt + 1 >= max_attempts;

            #[cfg(feature = "tracing")]
            tracing::debug!(
                %method,
                %url,
                attempt = attempt + 1,
                max_attempts,
                "dataverse request"
            );

            let delay = match self.send_once(&url, &method, &token, &options).await {
                Ok(Attempt::Done(body)) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(%url, attempt = attempt + 1, "dataverse request succeeded");
                    return Ok(body);
                }
                Ok(Attempt::RateLimited { retry_after, error }) => {
                    if last_attempt {
                        return Err(error);
                    }
                    let delay = retry_after.unwrap_or_else(|| {
                        Duration::from_millis(self.options.backoff_ms(attempt))
                    });

                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        %url,
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, retrying"
                    );
                    delay
                }
                Err(err) => {
                    if last_attempt || !err.is_retryable() {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            %url,
                            attempt = attempt + 1,
                            error = %err,
                            "dataverse request failed"
                        );
                        return Err(err);
                    }
                    let delay = Duration::from_millis(self.options.backoff_ms(attempt));

                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        %url,
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "request failed, retrying"
                    );
                    delay
                }
            };

            sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send_once(
        &self,
        url: &str,
        method: &Method,
        token: &str,
        options: &RequestOptions,
    ) -> Result<Attempt> {
        let mut headers = default_headers(token)?;
        // Caller headers replace defaults of the same name only.
        headers.extend(options.headers.clone());

        let mut request = self.http.request(method.clone(), url).headers(headers);
        if let Some(body) = &options.body {
            request = request.json(body);
        }
        if let Some(timeout_ms) = self.options.timeout_ms {
            request = request.timeout(Duration::from_millis(timeout_ms));
        }

        let response = request.send().await.map_err(send_error)?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(response.headers());
            let error = api_error(status, response).await?;
            return Ok(Attempt::RateLimited { retry_after, error });
        }

        if !status.is_success() {
            let error = api_error(status, response).await?;
            #[cfg(feature = "tracing")]
            tracing::warn!(%url, status = status.as_u16(), "dataverse api error");
            return Err(error);
        }

        let body = response.text().await.map_err(DataverseError::Transport)?;
        if body.trim().is_empty() {
            return Ok(Attempt::Done(JsonValue::Null));
        }
        serde_json::from_str(&body)
            .map(Attempt::Done)
            .map_err(|err| DataverseError::Decode(format!("invalid response JSON: {err}")))
    }
}

/// Classifies a `send` failure. Builder errors (malformed URL, bad request
/// parts) are caller mistakes and must not be retried.
fn send_error(err: reqwest::Error) -> DataverseError {
    if err.is_builder() {
        DataverseError::Config(format!("request could not be built: {err}"))
    } else {
        DataverseError::Transport(err)
    }
}

fn default_headers(token: &str) -> Result<HeaderMap> {
    let authorization = HeaderValue::from_str(&bearer_authorization(token)).map_err(|_| {
        DataverseError::Config("bearer token is not a valid header value".to_owned())
    })?;

    let mut headers = HeaderMap::with_capacity(5);
    headers.insert(header::AUTHORIZATION, authorization);
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    Ok(headers)
}

/// Builds an [`DataverseError::Api`] from a non-success response.
///
/// The body is parsed as JSON when possible, otherwise replaced by `{}`.
async fn api_error(status: StatusCode, response: reqwest::Response) -> Result<DataverseError> {
    let text = response.text().await.map_err(DataverseError::Transport)?;
    let body = serde_json::from_str::<JsonValue>(&text).unwrap_or_else(|_| {
        #[cfg(feature = "tracing")]
        tracing::debug!(body = %text, "could not parse error response");
        JsonValue::Object(Map::new())
    });
    Ok(DataverseError::Api {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_owned(),
        body,
    })
}

/// Longest server-requested wait honored before retrying a 429.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

/// Reads `Retry-After` as a delay in seconds (fractions allowed), capped at
/// [`MAX_RETRY_AFTER`].
///
/// HTTP-date values and garbage yield `None`, which falls back to backoff.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(header::RETRY_AFTER)?.to_str().ok()?;
    let seconds = raw.trim().parse::<f64>().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let delay = Duration::try_from_secs_f64(seconds).unwrap_or(MAX_RETRY_AFTER);
    Some(delay.min(MAX_RETRY_AFTER))
}
