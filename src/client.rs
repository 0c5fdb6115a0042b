use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime},
};

use reqwest::{header, Method, StatusCode};
use tokio::time::sleep;

use crate::{
    logger::{Logger, TracingLogger},
    retry::{
        service_unavailable_wait, RetryBudgets, RATE_LIMIT_RESET_HEADER,
        SERVICE_UNAVAILABLE_RETRIES,
    },
    stats::{Operation, Stats, StatsSnapshot},
    ClientOptions, Payload, PayloadKind, QuipError, Result,
};

/// Base URL of the public Quip platform API.
pub const DEFAULT_API_URL: &str = "https://platform.quip.com:443/1";

#[derive(Clone)]
/// HTTP client for the Quip platform API.
///
/// Clones share retry budgets, statistics and the base wait interval.
pub struct QuipClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    options: ClientOptions,
    wait_ms: Arc<AtomicU64>,
    budgets: Arc<RetryBudgets>,
    stats: Arc<Stats>,
    logger: Arc<dyn Logger>,
}

impl fmt::Debug for QuipClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuipClient")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("options", &self.options)
            .field("wait_ms", &self.wait_ms())
            .finish()
    }
}

impl QuipClient {
    /// Creates a client for `api_url` authenticating with a bearer token.
    ///
    /// If the token is missing the `Bearer ` prefix, it is added automatically.
    pub fn new(api_url: impl Into<String>, token: impl AsRef<str>) -> Self {
        let options = ClientOptions::default();
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            token: normalize_bearer_authorization(token.as_ref()),
            wait_ms: Arc::new(AtomicU64::new(options.wait_ms)),
            options,
            budgets: Arc::new(RetryBudgets::new()),
            stats: Arc::new(Stats::default()),
            logger: Arc::new(TracingLogger),
        }
    }

    /// Creates a client for the public platform at [`DEFAULT_API_URL`].
    pub fn from_token(token: impl AsRef<str>) -> Self {
        Self::new(DEFAULT_API_URL, token)
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `QUIP_TOKEN`: access token (Bearer prefix optional)
    /// - `QUIP_API_URL`: optional, defaults to [`DEFAULT_API_URL`]
    /// - `QUIP_MAX_429_RETRIES`: optional per-path 429 retry ceiling
    ///
    /// # Example
    ///
    /// ```no_run
    /// use quip_http::QuipClient;
    ///
    /// let quip = QuipClient::from_env().expect("missing QUIP_TOKEN");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        let token = std::env::var("QUIP_TOKEN")
            .map_err(|_| "missing QUIP_TOKEN environment variable".to_owned())?;
        if token.trim().is_empty() {
            return Err("QUIP_TOKEN is set but empty".to_owned());
        }

        let api_url = match std::env::var("QUIP_API_URL") {
            Ok(url) if !url.trim().is_empty() => url.trim().to_owned(),
            _ => DEFAULT_API_URL.to_owned(),
        };

        let mut options = ClientOptions::default();
        if let Ok(raw) = std::env::var("QUIP_MAX_429_RETRIES") {
            options.max_429_retries = raw.trim().parse().map_err(|err| {
                format!("QUIP_MAX_429_RETRIES must be a non-negative integer: {err}")
            })?;
        }

        Ok(Self::new(api_url, token).with_options(options))
    }

    /// Applies client options such as the 429 retry ceiling and wait interval.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.wait_ms.store(opts.wait_ms, Ordering::Relaxed);
        self.options = opts;
        self
    }

    /// Replaces the diagnostics sink.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.set_logger(logger);
        self
    }

    pub fn set_logger(&mut self, logger: Arc<dyn Logger>) {
        self.logger = logger;
    }

    /// Changes the base wait between retries; in-flight calls pick it up on
    /// their next retry.
    pub fn set_wait_ms(&self, wait_ms: u64) {
        self.wait_ms.store(wait_ms, Ordering::Relaxed);
    }

    pub fn wait_ms(&self) -> u64 {
        self.wait_ms.load(Ordering::Relaxed)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns a copy of the call counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Probes whether the token is accepted.
    ///
    /// Sends a single request to `/users/current` without any retry and
    /// reports whether the status was a success. Only transport failures are
    /// returned as errors.
    pub async fn check_user(&self) -> Result<bool> {
        self.stats.record(Operation::GetCurrentUser);
        let response = self
            .request(Method::GET, "/users/current")
            .send()
            .await
            .map_err(QuipError::Transport)?;
        Ok(response.status().is_success())
    }

    /// Fetches one or more users; several ids may be comma-separated.
    pub async fn get_user(&self, user_ids: &str) -> Option<serde_json::Value> {
        self.stats.record(Operation::GetUser);
        self.fetch_json(&format!("/users/{user_ids}")).await
    }

    pub async fn get_current_user(&self) -> Option<serde_json::Value> {
        self.stats.record(Operation::GetCurrentUser);
        self.fetch_json("/users/current").await
    }

    pub async fn get_folder(&self, folder_id: &str) -> Option<serde_json::Value> {
        self.stats.record(Operation::GetFolder);
        self.fetch_json(&format!("/folders/{folder_id}")).await
    }

    pub async fn get_folders<I, S>(&self, folder_ids: I) -> Option<serde_json::Value>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stats.record(Operation::GetFolders);
        self.fetch_json(&format!("/folders/?ids={}", join_ids(folder_ids)))
            .await
    }

    pub async fn get_thread(&self, thread_id: &str) -> Option<serde_json::Value> {
        self.stats.record(Operation::GetThread);
        self.fetch_json(&format!("/threads/{thread_id}")).await
    }

    pub async fn get_threads<I, S>(&self, thread_ids: I) -> Option<serde_json::Value>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stats.record(Operation::GetThreads);
        self.fetch_json(&format!("/threads/?ids={}", join_ids(thread_ids)))
            .await
    }

    pub async fn get_thread_messages(&self, thread_id: &str) -> Option<serde_json::Value> {
        self.stats.record(Operation::GetThreadMessages);
        self.fetch_json(&format!("/messages/{thread_id}")).await
    }

    /// Downloads a blob (image, attachment) embedded in a thread.
    pub async fn get_blob(&self, thread_id: &str, blob_id: &str) -> Option<Vec<u8>> {
        self.stats.record(Operation::GetBlob);
        self.fetch_blob(&format!("/blob/{thread_id}/{blob_id}"))
            .await
    }

    pub async fn get_pdf(&self, thread_id: &str) -> Option<Vec<u8>> {
        self.stats.record(Operation::GetPdf);
        self.fetch_blob(&format!("/threads/{thread_id}/export/pdf"))
            .await
    }

    pub async fn get_docx(&self, thread_id: &str) -> Option<Vec<u8>> {
        self.stats.record(Operation::GetDocx);
        self.fetch_blob(&format!("/threads/{thread_id}/export/docx"))
            .await
    }

    pub async fn get_xlsx(&self, thread_id: &str) -> Option<Vec<u8>> {
        self.stats.record(Operation::GetXlsx);
        self.fetch_blob(&format!("/threads/{thread_id}/export/xlsx"))
            .await
    }

    /// `GET`s `path` and parses the body as JSON.
    pub async fn fetch_json(&self, path: &str) -> Option<serde_json::Value> {
        self.dispatch(path, Method::GET, PayloadKind::Json)
            .await
            .and_then(Payload::into_json)
    }

    /// `GET`s `path` and returns the raw body.
    pub async fn fetch_blob(&self, path: &str) -> Option<Vec<u8>> {
        self.dispatch(path, Method::GET, PayloadKind::Blob)
            .await
            .and_then(Payload::into_blob)
    }

    /// Same as [`QuipClient::try_dispatch`], with every failure collapsed to
    /// `None`. The failure has already been logged.
    pub async fn dispatch(&self, path: &str, method: Method, kind: PayloadKind) -> Option<Payload> {
        self.try_dispatch(path, method, kind).await.ok()
    }

    /// Sends `method` to `api_url + path`, retrying 429 and 503 responses
    /// while the path still has budget left.
    ///
    /// 429 retries wait the flat base interval and are capped by
    /// [`ClientOptions::max_429_retries`]. 503 retries honour the
    /// `x-ratelimit-reset` hint and are capped at
    /// [`SERVICE_UNAVAILABLE_RETRIES`]. Any other failure is returned
    /// immediately.
    pub async fn try_dispatch(
        &self,
        path: &str,
        method: Method,
        kind: PayloadKind,
    ) -> Result<Payload> {
        loop {
            self.stats.record_query();

            let response = match self.request(method.clone(), path).send().await {
                Ok(response) => response,
                Err(err) => return Err(self.transport_failure(path, err)),
            };

            let status = response.status();
            if status.is_success() {
                return self.decode(path, response, kind).await;
            }

            match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    let Some(wait) = self.rate_limit_wait(path) else {
                        let retries = self.options.max_429_retries;
                        self.logger.error(
                            &format!("Couldn't fetch {path}, tried to get it {retries} times"),
                            None,
                        );
                        return Err(QuipError::RateLimited {
                            path: path.to_owned(),
                            retries,
                        });
                    };
                    self.logger.debug(&format!(
                        "HTTP 429: for {path}, waiting in ms: {}",
                        wait.as_millis()
                    ));
                    sleep(wait).await;
                }
                StatusCode::SERVICE_UNAVAILABLE => {
                    let reset = response
                        .headers()
                        .get(RATE_LIMIT_RESET_HEADER)
                        .and_then(|value| value.to_str().ok());
                    let wait = service_unavailable_wait(reset, self.base_wait(), SystemTime::now());
                    self.logger.debug(&format!(
                        "HTTP 503: for {path}, waiting in ms: {}",
                        wait.as_millis()
                    ));
                    if !self.budgets.take_unavailable(path) {
                        self.logger.error(
                            &format!(
                                "Couldn't fetch {path}, tried to get it {SERVICE_UNAVAILABLE_RETRIES} times"
                            ),
                            None,
                        );
                        return Err(QuipError::ServiceUnavailable {
                            path: path.to_owned(),
                            retries: SERVICE_UNAVAILABLE_RETRIES,
                        });
                    }
                    sleep(wait).await;
                }
                _ => {
                    self.logger.debug(&format!(
                        "Couldn't fetch {path}, received {}",
                        status.as_u16()
                    ));
                    let body = response.text().await.unwrap_or_default();
                    return Err(QuipError::Http {
                        status: status.as_u16(),
                        body,
                    });
                }
            }
        }
    }

    /// Spends one unit of the path's 429 budget and returns the flat wait, or
    /// `None` once the budget is used up.
    pub(crate) fn rate_limit_wait(&self, path: &str) -> Option<Duration> {
        self.budgets
            .take_rate_limited(path, self.options.max_429_retries)
            .then(|| self.base_wait())
    }

    fn base_wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms())
    }

    // Content-Type is sent on blob downloads too.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let request = self
            .http
            .request(method, format!("{}{}", self.api_url, path))
            .header(header::AUTHORIZATION, &self.token)
            .header(header::CONTENT_TYPE, "application/json");

        match self.options.timeout_ms {
            Some(timeout_ms) => request.timeout(Duration::from_millis(timeout_ms)),
            None => request,
        }
    }

    async fn decode(
        &self,
        path: &str,
        response: reqwest::Response,
        kind: PayloadKind,
    ) -> Result<Payload> {
        match kind {
            PayloadKind::Blob => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|err| self.transport_failure(path, err))?;
                Ok(Payload::Blob(bytes.to_vec()))
            }
            PayloadKind::Json => {
                let body = response
                    .text()
                    .await
                    .map_err(|err| self.transport_failure(path, err))?;
                serde_json::from_str(&body).map(Payload::Json).map_err(|err| {
                    self.logger
                        .error(&format!("Couldn't decode {path}, "), Some(&err));
                    QuipError::Decode(format!("invalid JSON from {path}: {err}; body: {body}"))
                })
            }
        }
    }

    fn transport_failure(&self, path: &str, err: reqwest::Error) -> QuipError {
        self.logger
            .error(&format!("Couldn't fetch {path}, "), Some(&err));
        QuipError::Transport(err)
    }
}

fn join_ids<I, S>(ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter()
        .map(|id| id.as_ref().trim().to_owned())
        .collect::<Vec<_>>()
        .join(",")
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}
