use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method,
};
use serde_json::Value as JsonValue;

use crate::{DataverseError, Result};

/// Per-call request options for [`DataverseClient::execute`](crate::DataverseClient::execute).
///
/// Headers set here replace the client's default header of the same name;
/// every other default header is still sent.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// HTTP method. `None` means `GET`.
    pub method: Option<Method>,
    pub headers: HeaderMap,
    /// JSON request body.
    pub body: Option<JsonValue>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn with_method(method: Method) -> Self {
        Self {
            method: Some(method),
            ..Self::default()
        }
    }

    /// Adds a header, validating name and value.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| DataverseError::Config(format!("invalid header name '{name}': {err}")))?;
        let value = HeaderValue::from_str(value).map_err(|err| {
            DataverseError::Config(format!("invalid value for header '{name}': {err}"))
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn method(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }
}
