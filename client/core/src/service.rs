//! Schema service client
//!
//! Registers an identity and fetches the form it is assigned. Registration
//! and fetch always run in that order, and a failed registration stops the
//! sequence before any fetch is sent.

use crate::config::ServiceConfig;
use crate::schema::FormSpec;
use crate::ClientError;
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Who is filling the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Roll number; also selects the assigned form
    pub roll_number: String,
    /// Display name
    pub name: String,
}

impl Identity {
    /// Identity from its two parts
    pub fn new(roll_number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            roll_number: roll_number.into(),
            name: name.into(),
        }
    }
}

/// Registration and schema lookup
#[async_trait]
pub trait SchemaService: Send + Sync {
    /// Register the identity. Any success response is enough.
    async fn register(&self, identity: &Identity) -> Result<(), ClientError>;

    /// Fetch and check the form assigned to a roll number.
    async fn fetch_form(&self, roll_number: &str) -> Result<FormSpec, ClientError>;
}

/// Register, then fetch. The fetch is skipped when registration fails.
pub async fn register_and_fetch<S>(service: &S, identity: &Identity) -> Result<FormSpec, ClientError>
where
    S: SchemaService + ?Sized,
{
    tracing::info!(roll_number = %identity.roll_number, "registering");
    service.register(identity).await?;
    let form = service.fetch_form(&identity.roll_number).await?;
    tracing::info!(
        form_id = form.form_id(),
        sections = form.section_count(),
        "form fetched"
    );
    Ok(form)
}

/// HTTP implementation of [`SchemaService`]
#[derive(Clone)]
pub struct HttpSchemaService {
    config: ServiceConfig,
    base: Url,
    http: reqwest::Client,
}

impl HttpSchemaService {
    /// Build the HTTP client. Fails on a bad base URL.
    pub fn new(config: ServiceConfig) -> Result<Self, ClientError> {
        let base = config.endpoint()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("dynform/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("http client: {}", e)))?;

        Ok(Self { config, base, http })
    }

    /// Settings this client was built with
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Config(format!("invalid path {}: {}", path, e)))
    }

    /// Send with retries on transport errors and 5xx. Returns the body of a
    /// success response.
    async fn send<F>(&self, build: F) -> Result<Vec<u8>, ClientError>
    where
        F: Fn() -> reqwest::RequestBuilder + Send + Sync,
    {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            let error = match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    match response.bytes().await {
                        Ok(body) if status.is_success() => return Ok(body.to_vec()),
                        Ok(body) => ClientError::Registration {
                            status: status.as_u16(),
                            body: String::from_utf8_lossy(&body).into_owned(),
                        },
                        // body cut off mid-read
                        Err(e) => ClientError::Network(e.to_string()),
                    }
                }
                Err(e) => ClientError::Network(e.to_string()),
            };

            if !should_retry(&error) || attempt >= max_retries {
                return Err(error);
            }

            let delay = self.config.retry_delay(attempt);
            tracing::warn!(attempt, ?delay, %error, "request failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn should_retry(error: &ClientError) -> bool {
    match error {
        ClientError::Network(_) => true,
        ClientError::Registration { status, .. } => StatusCode::from_u16(*status)
            .map(|s| s.is_server_error())
            .unwrap_or(false),
        _ => false,
    }
}

#[async_trait]
impl SchemaService for HttpSchemaService {
    async fn register(&self, identity: &Identity) -> Result<(), ClientError> {
        let url = self.url("create-user")?;
        tracing::debug!(%url, "POST create-user");
        self.send(|| self.http.post(url.clone()).json(identity))
            .await
            .map(|_| ())
    }

    async fn fetch_form(&self, roll_number: &str) -> Result<FormSpec, ClientError> {
        let mut url = self.url("get-form")?;
        url.query_pairs_mut().append_pair("rollNumber", roll_number);
        tracing::debug!(%url, "GET get-form");

        let body = self.send(|| self.http.get(url.clone())).await?;
        Ok(FormSpec::from_json(&body)?)
    }
}
