//! Per-client rate limiting as a tower layer.
//!
//! Token buckets keyed by client IP. The layer knows nothing about the routes
//! it wraps; the router decides where it applies.
//!
//! The client IP is the socket peer from `ConnectInfo`. Forwarding headers are
//! client-controlled and only read when `trust_forwarded` is set, i.e. when a
//! reverse proxy in front of the server overwrites them.
//!
//! ```ignore
//! Router::new()
//!   .route("/admin/create-admin", post(create_admin))
//!   .route_layer(RateLimitLayer::new(RateLimitConfig::default()));
//! ```

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use axum::{
  body::Body,
  extract::ConnectInfo,
  http::{Request, Response, StatusCode, header},
};
use futures_util::future::BoxFuture;
use serde::Deserialize;
use tokio::sync::RwLock;
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Rate limit configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
  /// Maximum requests per window.
  pub requests_per_window: u32,
  /// Window duration in seconds.
  pub window_seconds:      u64,
  /// Key on `X-Forwarded-For` / `X-Real-IP` instead of the socket peer.
  pub trust_forwarded:     bool,
}

impl Default for RateLimitConfig {
  fn default() -> Self { Self::new(10, 60) }
}

impl RateLimitConfig {
  pub fn new(requests_per_window: u32, window_seconds: u64) -> Self {
    Self { requests_per_window, window_seconds, trust_forwarded: false }
  }

  fn window(&self) -> Duration { Duration::from_secs(self.window_seconds.max(1)) }
}

/// Token bucket for a single client.
#[derive(Debug, Clone)]
struct TokenBucket {
  tokens:      u32,
  last_refill: Instant,
}

impl TokenBucket {
  fn new(max_tokens: u32) -> Self {
    Self { tokens: max_tokens, last_refill: Instant::now() }
  }

  /// Refill for the elapsed time, then try to take one token.
  fn try_consume(&mut self, max_tokens: u32, window: Duration) -> bool {
    let now = Instant::now();
    let elapsed = now.duration_since(self.last_refill);

    if elapsed >= window {
      self.tokens = max_tokens;
      self.last_refill = now;
    } else {
      let refill_rate = f64::from(max_tokens) / window.as_secs_f64();
      let refill_amount = (elapsed.as_secs_f64() * refill_rate) as u32;

      if refill_amount > 0 {
        self.tokens = (self.tokens + refill_amount).min(max_tokens);
        self.last_refill = now;
      }
    }

    if self.tokens > 0 {
      self.tokens -= 1;
      true
    } else {
      false
    }
  }
}

/// Shared limiter state; clones share buckets.
#[derive(Clone)]
pub struct RateLimiter {
  buckets: Arc<RwLock<HashMap<IpAddr, TokenBucket>>>,
  config:  RateLimitConfig,
}

impl RateLimiter {
  pub fn new(config: RateLimitConfig) -> Self {
    Self { buckets: Arc::new(RwLock::new(HashMap::new())), config }
  }

  /// Whether a request from `ip` may proceed now.
  pub async fn check(&self, ip: IpAddr) -> bool {
    let mut buckets = self.buckets.write().await;
    let max_tokens = self.config.requests_per_window;
    let window = self.config.window();

    buckets
      .entry(ip)
      .or_insert_with(|| TokenBucket::new(max_tokens))
      .try_consume(max_tokens, window)
  }

  /// Drop buckets not refilled within `max_age`. With `max_age` at least one
  /// window, a dropped bucket would have been refilled to full anyway.
  pub async fn cleanup(&self, max_age: Duration) { sweep(&self.buckets, max_age).await }

  #[cfg(test)]
  async fn len(&self) -> usize { self.buckets.read().await.len() }

  /// Sweep stale buckets once per window until the limiter is dropped.
  fn spawn_cleanup(&self) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
      debug!("no tokio runtime; rate limit buckets are not swept");
      return;
    };

    let buckets: Weak<_> = Arc::downgrade(&self.buckets);
    let window = self.config.window();
    handle.spawn(async move {
      let mut ticks = tokio::time::interval(window);
      loop {
        ticks.tick().await;
        let Some(buckets) = buckets.upgrade() else { break };
        sweep(&buckets, window).await;
      }
    });
  }
}

async fn sweep(buckets: &RwLock<HashMap<IpAddr, TokenBucket>>, max_age: Duration) {
  let now = Instant::now();
  buckets
    .write()
    .await
    .retain(|_, bucket| now.duration_since(bucket.last_refill) < max_age);
}

#[derive(Clone)]
pub struct RateLimitLayer {
  limiter: RateLimiter,
}

impl RateLimitLayer {
  pub fn new(config: RateLimitConfig) -> Self {
    let limiter = RateLimiter::new(config);
    limiter.spawn_cleanup();
    Self { limiter }
  }
}

impl<S> Layer<S> for RateLimitLayer {
  type Service = RateLimitService<S>;

  fn layer(&self, inner: S) -> Self::Service {
    RateLimitService { inner, limiter: self.limiter.clone() }
  }
}

#[derive(Clone)]
pub struct RateLimitService<S> {
  inner:   S,
  limiter: RateLimiter,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
  S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
  S::Future: Send,
{
  type Response = Response<Body>;
  type Error = S::Error;
  type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

  fn poll_ready(
    &mut self,
    cx: &mut std::task::Context<'_>,
  ) -> std::task::Poll<Result<(), Self::Error>> {
    self.inner.poll_ready(cx)
  }

  fn call(&mut self, req: Request<Body>) -> Self::Future {
    let limiter = self.limiter.clone();
    // Take the service that was driven to readiness; leave a fresh clone.
    let clone = self.inner.clone();
    let mut inner = std::mem::replace(&mut self.inner, clone);

    Box::pin(async move {
      let ip = client_ip(&req, limiter.config.trust_forwarded);
      if !limiter.check(ip).await {
        warn!(%ip, path = %req.uri().path(), "rate limit exceeded");
        return Ok(rate_limit_response(limiter.config.window_seconds));
      }
      inner.call(req).await
    })
  }
}

/// The socket peer. With `trust_forwarded`, `X-Forwarded-For` (first hop)
/// then `X-Real-IP` take precedence.
fn client_ip<B>(req: &Request<B>, trust_forwarded: bool) -> IpAddr {
  if trust_forwarded && let Some(ip) = forwarded_ip(req) {
    return ip;
  }

  if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
    return addr.ip();
  }

  IpAddr::from([127, 0, 0, 1])
}

fn forwarded_ip<B>(req: &Request<B>) -> Option<IpAddr> {
  if let Some(forwarded) = req.headers().get("x-forwarded-for")
    && let Ok(value) = forwarded.to_str()
    && let Some(first_ip) = value.split(',').next()
    && let Ok(ip) = first_ip.trim().parse()
  {
    return Some(ip);
  }

  req
    .headers()
    .get("x-real-ip")
    .and_then(|value| value.to_str().ok())
    .and_then(|value| value.trim().parse().ok())
}

fn rate_limit_response(retry_after: u64) -> Response<Body> {
  let body = serde_json::json!({
    "message": "Too many requests. Please try again later.",
    "status":  "error",
  });

  let mut res = Response::new(Body::from(body.to_string()));
  *res.status_mut() = StatusCode::TOO_MANY_REQUESTS;
  res.headers_mut().insert(
    header::CONTENT_TYPE,
    header::HeaderValue::from_static("application/json"),
  );
  res.headers_mut().insert(header::RETRY_AFTER, header::HeaderValue::from(retry_after));
  res
}
