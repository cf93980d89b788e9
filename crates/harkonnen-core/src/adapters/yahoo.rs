use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::retry::RetryPolicy;
use crate::throttling::RequestThrottle;
use crate::{
    HistoryFuture, HistoryRequest, MarketDataClient, PriceSample, PriceSeries, ProviderId,
    SourceError, UtcDateTime,
};

const REFERER: &str = "https://finance.yahoo.com/";

// ============================================================================
// Configuration
// ============================================================================

/// Connection and resilience settings for [`YahooAdapter`].
#[derive(Debug, Clone)]
pub struct YahooConfig {
    /// Chart host, e.g. `https://query1.finance.yahoo.com`.
    pub base_url: String,
    /// Endpoint visited first to obtain session cookies.
    pub cookie_url: String,
    /// Crumb endpoints tried in order.
    pub crumb_urls: Vec<String>,
    pub timeout_ms: u64,
    pub retry: RetryPolicy,
    /// Request budget: `quota_limit` calls per `quota_window`.
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub circuit_breaker: CircuitBreakerConfig,
    /// When false no cookie/crumb handshake is performed.
    pub use_crumb: bool,
    pub crumb_ttl: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://query1.finance.yahoo.com"),
            cookie_url: String::from("https://fc.yahoo.com"),
            crumb_urls: vec![
                String::from("https://query1.finance.yahoo.com/v1/test/getcrumb"),
                String::from("https://query2.finance.yahoo.com/v1/test/getcrumb"),
            ],
            timeout_ms: 10_000,
            retry: RetryPolicy::default(),
            quota_window: Duration::from_secs(60),
            quota_limit: 120,
            circuit_breaker: CircuitBreakerConfig::default(),
            use_crumb: true,
            crumb_ttl: Duration::from_secs(3600),
        }
    }
}

impl YahooConfig {
    /// Settings for a local or recorded endpoint: no handshake, no waiting.
    pub fn offline(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            use_crumb: false,
            retry: RetryPolicy::fixed(Duration::from_millis(1), 2),
            ..Self::default()
        }
    }
}

// ============================================================================
// Yahoo Auth Manager - Handles cookie/crumb authentication
// ============================================================================

/// Manages Yahoo Finance cookie/crumb authentication.
///
/// Yahoo's unofficial API requires a session cookie (kept by the transport's
/// cookie jar) and a crumb token passed as a query parameter.
#[derive(Debug)]
pub struct YahooAuthManager {
    crumb: Mutex<Option<(String, Instant)>>,
    refreshing: AtomicBool,
    ttl: Duration,
    cookie_url: String,
    crumb_urls: Vec<String>,
    timeout_ms: u64,
}

impl YahooAuthManager {
    pub fn new(config: &YahooConfig) -> Self {
        Self {
            crumb: Mutex::new(None),
            refreshing: AtomicBool::new(false),
            ttl: config.crumb_ttl,
            cookie_url: config.cookie_url.clone(),
            crumb_urls: config.crumb_urls.clone(),
            timeout_ms: config.timeout_ms,
        }
    }

    fn cached(&self) -> Option<String> {
        let crumb = self.crumb.lock().expect("crumb lock is not poisoned");
        crumb
            .as_ref()
            .filter(|(_, fetched_at)| fetched_at.elapsed() < self.ttl)
            .map(|(value, _)| value.clone())
    }

    /// Current crumb, refreshed when missing or expired.
    ///
    /// One caller refreshes at a time; the others wait for its result.
    pub async fn crumb(&self, http: &dyn HttpClient) -> Result<String, SourceError> {
        let _refreshing = loop {
            if let Some(crumb) = self.cached() {
                return Ok(crumb);
            }
            if let Some(guard) = RefreshGuard::acquire(&self.refreshing) {
                break guard;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        };

        self.refresh(http).await
    }

    async fn refresh(&self, http: &dyn HttpClient) -> Result<String, SourceError> {
        let cookie_request = HttpRequest::get(&self.cookie_url)
            .with_header("referer", REFERER)
            .with_auth(&env_cookie())
            .with_timeout_ms(self.timeout_ms);
        http.execute(cookie_request).await.map_err(|e| {
            SourceError::unavailable(format!("failed to fetch Yahoo cookie: {}", e.message()))
        })?;

        for endpoint in &self.crumb_urls {
            let crumb_request = HttpRequest::get(endpoint)
                .with_header("referer", REFERER)
                .with_auth(&env_cookie())
                .with_timeout_ms(self.timeout_ms);

            let Ok(response) = http.execute(crumb_request).await else {
                continue;
            };
            if response.status == 429 {
                return Err(SourceError::rate_limited(
                    "Yahoo rate limited while fetching crumb",
                ));
            }
            if !response.is_success() {
                continue;
            }

            let body = response.body.trim();
            if body.contains("<html") || body.contains("<!DOCTYPE") {
                continue;
            }
            if body.to_ascii_lowercase().contains("too many requests") {
                return Err(SourceError::rate_limited(
                    "Yahoo rate limited while fetching crumb",
                ));
            }
            if !body.is_empty() && body.len() < 100 && !body.contains(char::is_whitespace) {
                *self.crumb.lock().expect("crumb lock is not poisoned") =
                    Some((body.to_owned(), Instant::now()));
                tracing::debug!("refreshed Yahoo crumb");
                return Ok(body.to_owned());
            }
        }

        Err(SourceError::unavailable(
            "failed to fetch Yahoo crumb from all endpoints",
        ))
    }

    /// Drops the cached crumb so the next call refreshes it.
    pub fn invalidate(&self) {
        *self.crumb.lock().expect("crumb lock is not poisoned") = None;
    }
}

/// Exclusive right to refresh the crumb, given up when dropped.
struct RefreshGuard<'a>(&'a AtomicBool);

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// `YAHOO_COOKIE` overrides the jar, for environments where fc.yahoo.com is blocked.
fn env_cookie() -> HttpAuth {
    std::env::var("YAHOO_COOKIE")
        .ok()
        .filter(|cookie| !cookie.trim().is_empty())
        .map_or(HttpAuth::None, HttpAuth::Cookie)
}

// ============================================================================
// Yahoo Adapter
// ============================================================================

/// Close-price history from the Yahoo Finance chart endpoint.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    config: Arc<YahooConfig>,
    circuit_breaker: Arc<CircuitBreaker>,
    throttle: RequestThrottle,
    auth_manager: Arc<YahooAuthManager>,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()), YahooConfig::default())
    }
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, config: YahooConfig) -> Self {
        Self {
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::new(config.circuit_breaker)),
            throttle: RequestThrottle::new(config.quota_window, config.quota_limit),
            auth_manager: Arc::new(YahooAuthManager::new(&config)),
            config: Arc::new(config),
        }
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self::new(http_client, YahooConfig::default())
    }

    pub fn config(&self) -> &YahooConfig {
        &self.config
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    fn chart_url(&self, req: &HistoryRequest, crumb: Option<&str>) -> String {
        let mut url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval={}&includePrePost=false",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(req.symbol.as_str()),
            req.start.unix_timestamp(),
            req.end.unix_timestamp(),
            req.interval.provider_code(),
        );
        if let Some(crumb) = crumb {
            url.push_str("&crumb=");
            url.push_str(&urlencoding::encode(crumb));
        }
        url
    }

    async fn fetch_chart(&self, req: &HistoryRequest) -> Result<PriceSeries, SourceError> {
        let mut attempt = 0_u32;
        let mut refreshed_auth = false;

        loop {
            self.throttle.acquire().await;
            let permit = self.circuit_breaker.admit("yahoo")?;

            let crumb = if self.config.use_crumb {
                match self.auth_manager.crumb(self.http_client.as_ref()).await {
                    Ok(crumb) => Some(crumb),
                    Err(error) => {
                        permit.record_failure();
                        return Err(error);
                    }
                }
            } else {
                None
            };

            let request = HttpRequest::get(self.chart_url(req, crumb.as_deref()))
                .with_header("referer", REFERER)
                .with_auth(&env_cookie())
                .with_timeout_ms(self.config.timeout_ms);

            let response = match self.http_client.execute(request).await {
                Ok(response) => response,
                Err(error) => {
                    permit.record_failure();
                    if self.config.retry.should_retry_error(&error)
                        && self.config.retry.has_budget(attempt)
                    {
                        let delay = self.config.retry.delay_for_attempt(attempt);
                        tracing::debug!(
                            symbol = %req.symbol,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "retrying yahoo chart request after transport error"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(SourceError::unavailable(format!(
                        "yahoo transport error: {}",
                        error.message()
                    )));
                }
            };

            if response.status == 401 && self.config.use_crumb && !refreshed_auth {
                // Released without an outcome; the retry is admitted afresh.
                drop(permit);
                self.auth_manager.invalidate();
                refreshed_auth = true;
                continue;
            }

            if response.status == 404 {
                permit.record_success();
                return empty_or_error(req, &response.body);
            }

            if self.config.retry.should_retry_status(response.status) {
                permit.record_failure();
                if self.config.retry.has_budget(attempt) {
                    let delay = self.config.retry.delay_for_attempt(attempt);
                    tracing::debug!(
                        symbol = %req.symbol,
                        status = response.status,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retrying yahoo chart request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return Err(if response.status == 429 {
                    SourceError::rate_limited("yahoo rate limit exceeded")
                } else {
                    SourceError::unavailable(format!(
                        "yahoo returned status {}",
                        response.status
                    ))
                });
            }

            if !response.is_success() {
                permit.record_failure();
                return Err(SourceError::unavailable(format!(
                    "yahoo returned status {}",
                    response.status
                )));
            }

            permit.record_success();
            return parse_chart(req, &response.body);
        }
    }
}

impl MarketDataClient for YahooAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
        Box::pin(async move {
            let series = self.fetch_chart(&req).await?;
            tracing::debug!(
                symbol = %req.symbol,
                interval = %req.interval,
                samples = series.len(),
                "fetched yahoo chart history"
            );
            Ok(series)
        })
    }
}

// ============================================================================
// Yahoo Chart API Response Structures
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

impl YahooChartError {
    fn is_no_data(&self) -> bool {
        self.code.eq_ignore_ascii_case("Not Found")
            || self.description.to_ascii_lowercase().contains("no data found")
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// 404 bodies either carry a "no data" chart error or nothing useful at all.
fn empty_or_error(req: &HistoryRequest, body: &str) -> Result<PriceSeries, SourceError> {
    match serde_json::from_str::<YahooChartResponse>(body) {
        Ok(YahooChartResponse {
            chart:
                YahooChartData {
                    error: Some(error), ..
                },
        }) if !error.is_no_data() => Err(SourceError::invalid_request(format!(
            "yahoo chart API error: {} ({})",
            error.description, error.code
        ))),
        _ => Ok(PriceSeries::empty(req.symbol.clone(), req.interval)),
    }
}

fn parse_chart(req: &HistoryRequest, body: &str) -> Result<PriceSeries, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        if error.is_no_data() {
            return Ok(PriceSeries::empty(req.symbol.clone(), req.interval));
        }
        return Err(SourceError::invalid_request(format!(
            "yahoo chart API error: {} ({})",
            error.description, error.code
        )));
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::empty(req.symbol.clone(), req.interval));
    };
    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    let mut samples = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.into_iter().zip(closes) {
        let Some(close) = close.filter(|value| value.is_finite()) else {
            continue;
        };
        let timestamp = UtcDateTime::from_unix_timestamp(ts)
            .map_err(|e| SourceError::internal(format!("invalid chart timestamp: {e}")))?;
        samples.push(PriceSample::new(timestamp, close)?);
    }

    Ok(PriceSeries::new(req.symbol.clone(), req.interval, samples))
}
