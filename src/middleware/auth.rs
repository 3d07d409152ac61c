use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sqlx::PgPool;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Why a request was refused. Only logged; clients always see the same 401 body.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("remote address {0:?} is not in the allow-list")]
    AddressNotAllowed(Option<IpAddr>),
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("malformed Authorization header")]
    MalformedHeader,
    #[error("unsupported authorization scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("invalid credential encoding")]
    InvalidEncoding,
    #[error("credentials did not match exactly one user ({0} rows)")]
    CredentialMismatch(usize),
    #[error("user lookup failed: {0}")]
    Lookup(#[from] sqlx::Error),
}

/// Login and password decoded from an `Authorization: Basic` header
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl BasicCredentials {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthError::MalformedHeader)?;

        Self::parse(value)
    }

    /// Parse `Basic <base64(login:password)>`. The password is everything after the
    /// first colon.
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        let mut parts = value.split_whitespace();
        let (scheme, payload) = match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(payload), None) => (scheme, payload),
            _ => return Err(AuthError::MalformedHeader),
        };

        if scheme != "Basic" {
            return Err(AuthError::UnsupportedScheme(scheme.to_string()));
        }

        let decoded = STANDARD
            .decode(payload)
            .map_err(|_| AuthError::InvalidEncoding)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::InvalidEncoding)?;
        let (login, password) = decoded
            .split_once(':')
            .ok_or(AuthError::MalformedHeader)?;

        Ok(Self {
            login: login.to_string(),
            password: password.to_string(),
        })
    }
}

/// Resolve credentials to exactly one user
pub async fn authenticate(pool: &PgPool, credentials: &BasicCredentials) -> Result<User, AuthError> {
    let stmt = User::login_query(&credentials.login, &credentials.password);
    let mut users: Vec<User> = stmt.query_as().fetch_all(pool).await?;

    if users.len() != 1 {
        return Err(AuthError::CredentialMismatch(users.len()));
    }
    Ok(users.remove(0))
}

/// Allow-list and HTTP Basic check in front of every protected route.
///
/// On success the resolved [`User`] is inserted into the request extensions. Every
/// failure, including database errors during the lookup, becomes the same 401.
pub async fn auth_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let user = match check_request(&state, remote, request.headers()).await {
        Ok(user) => user,
        Err(reason) => {
            match &reason {
                AuthError::Lookup(e) => tracing::error!("Authentication error: {}", e),
                other => tracing::warn!("Rejected request to {}: {}", request.uri().path(), other),
            }
            return Err(ApiError::unauthorized());
        }
    };

    tracing::debug!("Authenticated user {} ({})", user.login, user.id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

async fn check_request(
    state: &AppState,
    remote: Option<IpAddr>,
    headers: &HeaderMap,
) -> Result<User, AuthError> {
    if !state.allowed_hosts.permits(remote) {
        return Err(AuthError::AddressNotAllowed(remote));
    }

    let credentials = BasicCredentials::from_headers(headers)?;
    authenticate(&state.pool, &credentials).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AllowedHosts, AppConfig};
    use crate::database::DatabaseManager;
    use axum::{
        body::{to_bytes, Body},
        extract::connect_info::MockConnectInfo,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt; // for `oneshot`

    fn basic(payload: &str) -> String {
        format!("Basic {}", STANDARD.encode(payload))
    }

    #[test]
    fn test_parse_basic_credentials() {
        let creds = BasicCredentials::parse(&basic("alice:s3cret")).unwrap();
        assert_eq!(creds.login, "alice");
        assert_eq!(creds.password, "s3cret");
    }

    #[test]
    fn test_password_may_contain_colons() {
        let creds = BasicCredentials::parse(&basic("alice:a:b:c")).unwrap();
        assert_eq!(creds.password, "a:b:c");
    }

    #[test]
    fn test_rejects_malformed_headers() {
        assert!(matches!(
            BasicCredentials::parse("Bearer abc"),
            Err(AuthError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            BasicCredentials::parse("basic YWxpY2U6eA=="),
            Err(AuthError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            BasicCredentials::parse("Basic"),
            Err(AuthError::MalformedHeader)
        ));
        assert!(matches!(
            BasicCredentials::parse("Basic a b"),
            Err(AuthError::MalformedHeader)
        ));
        assert!(matches!(
            BasicCredentials::parse("Basic !!!notbase64"),
            Err(AuthError::InvalidEncoding)
        ));
        assert!(matches!(
            BasicCredentials::parse(&basic("no-colon")),
            Err(AuthError::MalformedHeader)
        ));
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            BasicCredentials::from_headers(&HeaderMap::new()),
            Err(AuthError::MissingHeader)
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = BasicCredentials::parse(&basic("alice:s3cret")).unwrap();
        assert!(!format!("{:?}", creds).contains("s3cret"));
    }

    // The pool never connects: every request below is refused before the lookup.
    fn test_app(allowed_hosts: AllowedHosts, peer: SocketAddr) -> Router {
        let pool = DatabaseManager::lazy_pool(&AppConfig::default().database);
        let state = AppState::new(pool, allowed_hosts);

        Router::new()
            .route("/protected", get(|| async { "Protected resource" }))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_gate))
            .with_state(state)
            .layer(MockConnectInfo(peer))
    }

    async fn send(app: Router, authorization: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_gate_without_authorization_header() {
        let app = test_app(AllowedHosts::Any, "127.0.0.1:5000".parse().unwrap());
        let (status, body) = send(app, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }

    #[tokio::test]
    async fn test_gate_with_non_basic_scheme() {
        let app = test_app(AllowedHosts::Any, "127.0.0.1:5000".parse().unwrap());
        let (status, body) = send(app, Some("Bearer token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }

    #[tokio::test]
    async fn test_gate_rejects_address_outside_allow_list() {
        let app = test_app(
            AllowedHosts::parse("10.0.0.1"),
            "192.168.1.20:5000".parse().unwrap(),
        );
        let (status, body) = send(app, Some(&basic("alice:s3cret"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }
}
