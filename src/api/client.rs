use std::time::Duration;

use url::Url;
use xmltree::Element;

/// Default request timeout. The remote service offers no guidance here,
/// so we pick something generous enough for its slower list methods.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Possible error types while calling the AllClients API.
///
/// A well-formed response that carries an `<error>` element is *not* one of
/// these: the client hands the parsed document back untouched, and callers
/// check for the business-level error themselves (see [`crate::api::response`]).
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The configured endpoint is not a usable base URL.
    #[error("invalid API endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    /// The request never produced a usable response: connection failure,
    /// timeout, or a failing HTTP status from the AllClients server.
    #[error("API request returned an error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The response body could not be parsed as XML.
    #[error("cannot parse API response from {url} as XML: {source}")]
    Parse {
        url: String,
        source: xmltree::ParseError,
    },
}

/// Client for the AllClients CRM HTTP API.
///
/// Each remote method is a POST of form-encoded fields to
/// `{endpoint}{Method}.aspx`, answered with a small XML document. The client
/// is method-agnostic: it injects the account credentials, performs the
/// transport, and parses the body, leaving interpretation of the result to
/// the caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Endpoint base URL, always ending in a slash.
    endpoint: String,
    /// The AllClients account ID.
    account_id: String,
    /// The AllClients API key.
    api_key: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates a new API client with the default request timeout.
    pub fn new(
        endpoint: impl Into<String>,
        account_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Self::with_timeout(endpoint, account_id, api_key, DEFAULT_TIMEOUT)
    }

    /// Creates a new API client with an explicit request timeout.
    pub fn with_timeout(
        endpoint: impl Into<String>,
        account_id: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        // Normalize the endpoint so method names can simply be appended.
        let mut endpoint = endpoint.into();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        Url::parse(&endpoint)?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint,
            account_id: account_id.into(),
            api_key: api_key.into(),
            http,
        })
    }

    /// Invokes a named API method (e.g. `AddContact`) with the given form
    /// fields and returns the parsed XML response document.
    ///
    /// The configured `accountid` and `apikey` are always sent; caller
    /// parameters under those names are discarded rather than allowed to
    /// override the credentials.
    ///
    /// A returned document may still describe a failure: the AllClients
    /// server reports business-level errors as `<results><error>…</error>`
    /// with a 200 status, and this client intentionally does not inspect
    /// the document for them.
    pub async fn invoke(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<Element, ApiError> {
        let url = self.method_url(method);
        let form = self.merge_credentials(params);

        tracing::debug!(%url, method, "posting AllClients API request");
        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        tracing::trace!(%url, %body, "AllClients API response");

        Element::parse(body.as_bytes()).map_err(|source| ApiError::Parse { url, source })
    }

    /// Forms the full URL for an API method. The `.aspx` suffix is a fixed
    /// part of the remote service's contract.
    fn method_url(&self, method: &str) -> String {
        format!("{}{}.aspx", self.endpoint, method)
    }

    /// Prepends the account credentials to the caller's form fields,
    /// dropping any caller-supplied `accountid`/`apikey`.
    fn merge_credentials<'a>(&'a self, params: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut form: Vec<(&str, &str)> = vec![
            ("accountid", self.account_id.as_str()),
            ("apikey", self.api_key.as_str()),
        ];
        form.extend(
            params
                .iter()
                .filter(|(key, _)| *key != "accountid" && *key != "apikey")
                .copied(),
        );
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://www.allclients.com/api/2", "12345", "secret").unwrap()
    }

    #[test]
    fn endpoint_gains_trailing_slash() {
        let client = client();
        assert_eq!(
            client.method_url("AddContact"),
            "http://www.allclients.com/api/2/AddContact.aspx"
        );
    }

    #[test]
    fn endpoint_keeps_existing_slash() {
        let client =
            ApiClient::new("http://www.allclients.com/api/2/", "12345", "secret").unwrap();
        assert_eq!(
            client.method_url("GetContacts"),
            "http://www.allclients.com/api/2/GetContacts.aspx"
        );
    }

    #[test]
    fn rejects_unparseable_endpoint() {
        let result = ApiClient::new("not a url", "12345", "secret");
        assert!(matches!(result, Err(ApiError::InvalidEndpoint(_))));
    }

    #[test]
    fn configured_credentials_always_win() {
        let client = client();
        let form = client.merge_credentials(&[
            ("accountid", "attacker"),
            ("apikey", "x"),
            ("firstname", "A"),
            ("lastname", "B"),
        ]);
        assert_eq!(
            form,
            vec![
                ("accountid", "12345"),
                ("apikey", "secret"),
                ("firstname", "A"),
                ("lastname", "B"),
            ]
        );
    }

    #[test]
    fn credentials_sent_before_caller_fields() {
        let client = client();
        let form = client.merge_credentials(&[("firstname", "Rasmus")]);
        assert_eq!(form[0], ("accountid", "12345"));
        assert_eq!(form[1], ("apikey", "secret"));
        assert_eq!(form[2], ("firstname", "Rasmus"));
    }
}
