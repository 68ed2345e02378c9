use crate::rate_limit::key::{KeyExtractor, PeerIp, UNKNOWN_CLIENT};
use crate::rate_limit::{Decision, RateLimiter};
use crate::telemetry::{emit_best_effort, AdmissionEvent, NullSink, PolicyEvent, TelemetrySink};
use futures::future::BoxFuture;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use http::{HeaderMap, Request, Response, StatusCode};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower_layer::Layer;
use tower_service::Service;

/// `x-ratelimit-limit`: policy limit, sent on every checked response.
pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
/// `x-ratelimit-remaining`: budget left after an admitted request.
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
/// `x-ratelimit-window`: window length in seconds, sent on rejections.
pub const X_RATELIMIT_WINDOW: HeaderName = HeaderName::from_static("x-ratelimit-window");

/// A layer that enforces rate limits using a [`RateLimiter`].
///
/// # Example
/// ```
/// use axum::{routing::post, Router};
/// use tollgate::{PolicyLimiter, RateLimitLayer};
///
/// let app: Router = Router::new()
///     .route("/auth/login", post(|| async { "ok" }))
///     .layer(RateLimitLayer::new(PolicyLimiter::auth()));
/// ```
#[derive(Clone, Debug)]
pub struct RateLimitLayer<L, K = PeerIp, T = NullSink> {
    limiter: Arc<L>,
    extractor: K,
    sink: T,
}

impl<L> RateLimitLayer<L> {
    /// Create a new rate limit layer keyed by peer IP, without telemetry.
    pub fn new(limiter: L) -> Self {
        Self { limiter: Arc::new(limiter), extractor: PeerIp::default(), sink: NullSink }
    }
}

impl<L, K, T> RateLimitLayer<L, K, T> {
    /// Swap the client key extractor.
    pub fn key_extractor<K2: KeyExtractor>(self, extractor: K2) -> RateLimitLayer<L, K2, T> {
        RateLimitLayer { limiter: self.limiter, extractor, sink: self.sink }
    }

    /// Emit an [`AdmissionEvent`] per request into `sink`.
    pub fn telemetry<T2: TelemetrySink>(self, sink: T2) -> RateLimitLayer<L, K, T2> {
        RateLimitLayer { limiter: self.limiter, extractor: self.extractor, sink }
    }
}

impl<S, L, K, T> Layer<S> for RateLimitLayer<L, K, T>
where
    L: RateLimiter + 'static,
    K: Clone,
    T: Clone,
{
    type Service = RateLimitService<S, L, K, T>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService {
            inner: service,
            limiter: self.limiter.clone(),
            extractor: self.extractor.clone(),
            sink: self.sink.clone(),
        }
    }
}

/// Middleware service that enforces rate limits.
///
/// Admitted requests are forwarded and their responses gain `x-ratelimit-limit`
/// and `x-ratelimit-remaining`. Denied requests never reach the inner service:
/// they are answered with `429 Too Many Requests`, a `Retry-After` equal to the
/// policy window, and a JSON error body.
#[derive(Clone, Debug)]
pub struct RateLimitService<S, L, K = PeerIp, T = NullSink> {
    inner: S,
    limiter: Arc<L>,
    extractor: K,
    sink: T,
}

impl<S, L, K, T, ReqBody, ResBody> Service<Request<ReqBody>> for RateLimitService<S, L, K, T>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    L: RateLimiter + 'static,
    K: KeyExtractor,
    T: TelemetrySink,
    T::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: From<String> + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let key = self.extractor.extract(&req).unwrap_or_else(|| {
            tracing::warn!(
                policy = self.limiter.name(),
                "no client key derivable from request; counting against shared bucket"
            );
            UNKNOWN_CLIENT.to_owned()
        });
        let decision = self.limiter.check(&key);
        let policy: Arc<str> = Arc::from(self.limiter.name());
        let sink = self.sink.clone();

        // The clone is not necessarily ready; keep the driven service in `self`.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match decision {
                Decision::Allowed { limit, remaining } => {
                    emit_best_effort(
                        sink,
                        PolicyEvent::Admission(AdmissionEvent::Admitted { policy, limit, remaining }),
                    )
                    .await;
                    let mut response = inner.call(req).await?;
                    insert_allowed_headers(response.headers_mut(), limit, remaining);
                    Ok(response)
                }
                Decision::Denied { limit, window, retry_after } => {
                    emit_best_effort(
                        sink,
                        PolicyEvent::Admission(AdmissionEvent::Rejected {
                            policy,
                            limit,
                            retry_after,
                        }),
                    )
                    .await;
                    Ok(too_many_requests(limit, window, retry_after))
                }
            }
        })
    }
}

fn insert_allowed_headers(headers: &mut HeaderMap, limit: u32, remaining: u32) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
}

/// Build the `429` response sent when a limiter denies a request.
pub fn too_many_requests<B: From<String>>(
    limit: u32,
    window: Duration,
    retry_after: Duration,
) -> Response<B> {
    let window_secs = whole_secs(window);
    let body = serde_json::json!({
        "error": "rate limit exceeded",
        "message": format!("maximum {} requests per {}s", limit, window_secs),
        "limit": limit,
        "window_secs": window_secs,
    });

    let mut response = Response::new(B::from(body.to_string()));
    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
    let headers = response.headers_mut();
    headers.insert(RETRY_AFTER, HeaderValue::from(whole_secs(retry_after)));
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_WINDOW, HeaderValue::from(window_secs));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Round up to whole seconds, never below one; `Retry-After` has no sub-second form.
fn whole_secs(d: Duration) -> u64 {
    let secs = if d.subsec_nanos() > 0 { d.as_secs().saturating_add(1) } else { d.as_secs() };
    secs.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_response_shape() {
        let res: Response<String> =
            too_many_requests(10, Duration::from_secs(60), Duration::from_secs(60));
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers()[RETRY_AFTER], "60");
        assert_eq!(res.headers()[X_RATELIMIT_LIMIT], "10");
        assert_eq!(res.headers()[X_RATELIMIT_WINDOW], "60");
        assert_eq!(res.headers()[CONTENT_TYPE], "application/json");

        let body: serde_json::Value = serde_json::from_str(res.body()).unwrap();
        assert_eq!(body["error"], "rate limit exceeded");
        assert_eq!(body["message"], "maximum 10 requests per 60s");
        assert_eq!(body["limit"], 10);
        assert_eq!(body["window_secs"], 60);
    }

    #[test]
    fn sub_second_windows_round_up() {
        assert_eq!(whole_secs(Duration::from_millis(250)), 1);
        assert_eq!(whole_secs(Duration::from_millis(1001)), 2);
        assert_eq!(whole_secs(Duration::from_secs(3)), 3);
    }
}
