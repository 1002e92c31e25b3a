//! Request-scoped identity
//!
//! Each inbound request gets its own [`RequestContext`], created by [`IdentityLayer`] and
//! stored in the request extensions. Handlers extract it like any other axum extractor and
//! pass it down explicitly to services, repositories and mutation hooks. Nothing is kept in
//! a process-wide slot, so concurrent requests never see each other's identity. Clones are
//! cheap and can be moved into spawned tasks.
//!
//! ```rust,ignore
//! async fn handler(ctx: RequestContext) {
//!     if let Some(user) = ctx.current() {
//!         tracing::info!(user_id = %user.id, "acting user");
//!     }
//! }
//! ```

use std::{
    convert::Infallible,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use tower::{Layer, Service};
use uuid::Uuid;

/// Identity of the caller behind one logical request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIdentity {
    pub id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl RequestIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            roles: Vec::new(),
            email: None,
        }
    }

    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// The fixed identity injected on every request until real authentication exists.
pub fn mock_identity() -> RequestIdentity {
    RequestIdentity::new("user-123")
        .with_roles(["admin", "user"])
        .with_email("test@example.com")
}

#[derive(Debug)]
struct ContextInner {
    request_id: Uuid,
    identity: Option<RequestIdentity>,
}

/// Per-request context carried explicitly through the call chain
#[derive(Debug, Clone)]
pub struct RequestContext {
    inner: Arc<ContextInner>,
}

impl RequestContext {
    /// Start a context in which `identity` is the acting user.
    pub fn bind(identity: RequestIdentity) -> Self {
        Self::with_identity(Some(identity))
    }

    /// Start a context with no acting user (system work, background jobs).
    pub fn anonymous() -> Self {
        Self::with_identity(None)
    }

    fn with_identity(identity: Option<RequestIdentity>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                request_id: Uuid::new_v4(),
                identity,
            }),
        }
    }

    /// Identity bound to this context, if any. Absence means system/anonymous actor.
    pub fn current(&self) -> Option<&RequestIdentity> {
        self.inner.identity.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.current().map(|identity| identity.id.as_str())
    }

    pub fn request_id(&self) -> Uuid {
        self.inner.request_id
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(RequestContext::anonymous))
    }
}

/// Binds a fresh [`RequestContext`] to every request passing through it.
#[derive(Debug, Clone)]
pub struct IdentityLayer {
    identity: Option<RequestIdentity>,
}

impl IdentityLayer {
    /// Every request acts as [`mock_identity`].
    pub fn mock() -> Self {
        Self::fixed(mock_identity())
    }

    pub fn fixed(identity: RequestIdentity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn anonymous() -> Self {
        Self { identity: None }
    }
}

impl<S> Layer<S> for IdentityLayer {
    type Service = IdentityMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IdentityMiddleware {
            inner,
            identity: self.identity.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentityMiddleware<S> {
    inner: S,
    identity: Option<RequestIdentity>,
}

impl<S, B> Service<axum::http::Request<B>> for IdentityMiddleware<S>
where
    S: Service<axum::http::Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: axum::http::Request<B>) -> Self::Future {
        let ctx = match self.identity {
            Some(ref identity) => RequestContext::bind(identity.clone()),
            None => RequestContext::anonymous(),
        };

        tracing::trace!(
            request_id = %ctx.request_id(),
            user_id = ?ctx.user_id(),
            "Bound request identity"
        );

        request.extensions_mut().insert(ctx);
        self.inner.call(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_anonymous_context_has_no_identity() {
        let ctx = RequestContext::anonymous();
        assert!(ctx.current().is_none());
        assert!(ctx.user_id().is_none());
    }

    #[test]
    fn test_bound_context_exposes_identity() {
        let ctx = RequestContext::bind(mock_identity());
        let identity = ctx.current().unwrap();
        assert_eq!(identity.id, "user-123");
        assert_eq!(identity.roles, vec!["admin".to_string(), "user".to_string()]);
        assert!(identity.has_role("admin"));
        assert_eq!(identity.email.as_deref(), Some("test@example.com"));
    }

    #[test]
    fn test_clones_share_request_id() {
        let ctx = RequestContext::bind(RequestIdentity::new("u1"));
        let cloned = ctx.clone();
        assert_eq!(ctx.request_id(), cloned.request_id());
        assert_ne!(ctx.request_id(), RequestContext::anonymous().request_id());
    }

    #[tokio::test]
    async fn test_context_travels_into_spawned_task() {
        let ctx = RequestContext::bind(RequestIdentity::new("spawned-user"));
        let moved = ctx.clone();
        let seen = tokio::spawn(async move { moved.user_id().map(str::to_string) })
            .await
            .unwrap();
        assert_eq!(seen.as_deref(), Some("spawned-user"));
    }

    #[tokio::test]
    async fn test_concurrent_contexts_are_isolated() {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let ctx = RequestContext::bind(RequestIdentity::new(format!("user-{i}")));
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    (i, ctx.user_id().map(str::to_string))
                })
            })
            .collect();

        for handle in handles {
            let (i, seen) = handle.await.unwrap();
            assert_eq!(seen, Some(format!("user-{i}")));
        }
    }

    async fn whoami(ctx: RequestContext) -> String {
        ctx.user_id().unwrap_or("anonymous").to_string()
    }

    async fn call(app: Router) -> String {
        let response = app
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_layer_binds_mock_identity() {
        let app = Router::new().route("/", get(whoami)).layer(IdentityLayer::mock());
        assert_eq!(call(app).await, "user-123");
    }

    #[tokio::test]
    async fn test_missing_layer_yields_anonymous() {
        let app = Router::new().route("/", get(whoami));
        assert_eq!(call(app).await, "anonymous");

        let app = Router::new().route("/", get(whoami)).layer(IdentityLayer::anonymous());
        assert_eq!(call(app).await, "anonymous");
    }
}
