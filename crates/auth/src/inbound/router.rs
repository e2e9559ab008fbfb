use std::sync::Arc;

use app_core::jwt::TokenManager;
use app_core::middleware::auth;
use axum::routing::get;
use axum::{Router, middleware};

use crate::inbound::http::authn::*;
use crate::inbound::state::AuthState;

/// Routes relative to the `/auth` prefix the application nests them under.
pub fn create_router(state: AuthState, tm: Arc<dyn TokenManager>) -> Router {
    let protected_routes =
        Router::new().route("/me", get(current_session)).route_layer(middleware::from_fn_with_state(tm, auth));

    let public_routes = Router::new().route("/login", get(oauth_login)).route("/callback", get(oauth_callback));

    Router::new().merge(public_routes).merge(protected_routes).with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use app_core::jwt::{DEFAULT_SESSION_EXP_SECS, JwtConfig, JwtService, SessionSubject};
    use app_core::oauth::{GOOGLE_AUTH_URL, GoogleOAuthProvider, OAuthCredentials, ProviderEndpoints};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use oauth2::url::{Url, form_urlencoded};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, header as header_matcher, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::Dependency;

    const FRONTEND_URL: &str = "http://localhost:3000";

    struct TestApp {
        router: Router,
        jwt: Arc<JwtService>,
    }

    fn test_app(server: &MockServer) -> TestApp {
        let jwt = Arc::new(
            JwtService::new(JwtConfig {
                secret: "router_test_secret".to_string(),
                session_exp_secs: DEFAULT_SESSION_EXP_SECS,
            })
            .unwrap(),
        );

        let oauth = GoogleOAuthProvider::new(
            OAuthCredentials {
                client_id: "test-client".to_string(),
                client_secret: "test-secret".to_string(),
                redirect_uri: "http://localhost:8000/auth/callback".to_string(),
            },
            ProviderEndpoints {
                auth_url: GOOGLE_AUTH_URL.to_string(),
                token_url: format!("{}/token", server.uri()),
                userinfo_url: format!("{}/userinfo", server.uri()),
            },
            Some(Duration::from_secs(5)),
        )
        .unwrap();

        let tm: Arc<dyn TokenManager> = jwt.clone();
        let state = crate::new(Dependency {
            token: tm.clone(),
            oauth: Arc::new(oauth),
            frontend_url: format!("{FRONTEND_URL}/"),
        });

        TestApp { router: create_router(state, tm), jwt }
    }

    async fn send_get(router: Router, uri: &str) -> Response {
        router.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn location(response: &Response) -> String {
        response.headers()[header::LOCATION].to_str().unwrap().to_string()
    }

    async fn mount_token(server: &MockServer, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_userinfo(server: &MockServer, body: Value, calls: u64) {
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header_matcher("authorization", "Bearer T1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_login_redirects_to_provider() {
        let server = MockServer::start().await;
        let app = test_app(&server);

        let response = send_get(app.router, "/login").await;

        assert_eq!(response.status(), StatusCode::FOUND);
        let url = Url::parse(&location(&response)).unwrap();
        assert_eq!(format!("{}://{}{}", url.scheme(), url.host_str().unwrap(), url.path()), GOOGLE_AUTH_URL);

        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let param = |key: &str| params.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());
        assert_eq!(param("response_type").as_deref(), Some("code"));
        assert_eq!(param("client_id").as_deref(), Some("test-client"));
        assert_eq!(param("redirect_uri").as_deref(), Some("http://localhost:8000/auth/callback"));
        assert_eq!(param("scope").as_deref(), Some("openid email profile"));
        assert_eq!(param("access_type").as_deref(), Some("offline"));
        assert_eq!(param("prompt").as_deref(), Some("consent"));
        assert_ne!(param("state"), param("nonce"));
    }

    #[tokio::test]
    async fn test_callback_success_redirects_to_frontend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code=VALIDCODE123"))
            .and(body_string_contains("client_secret=test-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "T1"})))
            .expect(1)
            .mount(&server)
            .await;
        mount_userinfo(&server, json!({"email": "a@b.com", "name": "A", "picture": "http://x/p.png"}), 1).await;
        let app = test_app(&server);

        let response = send_get(app.router, "/callback?code=VALIDCODE123&state=abc").await;

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = location(&response);
        let (base, query) = location.split_once('?').unwrap();
        assert_eq!(base, "http://localhost:3000/oauth-success");
        assert!(query.ends_with("&name=A&email=a%40b.com&picture=http%3A%2F%2Fx%2Fp.png"));

        let token = form_urlencoded::parse(query.as_bytes()).find(|(k, _)| k == "token").unwrap().1.into_owned();
        let claims = app.jwt.validate_session_token(&token).unwrap();
        assert_eq!(claims.sub, "a@b.com");
        assert_eq!(claims.name.as_deref(), Some("A"));
        assert_eq!(claims.picture.as_deref(), Some("http://x/p.png"));
        assert_eq!(claims.exp - claims.iat, DEFAULT_SESSION_EXP_SECS);
    }

    #[tokio::test]
    async fn test_callback_with_minimal_profile() {
        let server = MockServer::start().await;
        mount_token(&server, 200, json!({"access_token": "T1"})).await;
        mount_userinfo(&server, json!({"email": "solo@example.com"}), 1).await;
        let app = test_app(&server);

        let response = send_get(app.router, "/callback?code=VALIDCODE123").await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(location(&response).ends_with("&name=&email=solo%40example.com&picture="));
    }

    #[tokio::test]
    async fn test_callback_invalid_grant_passes_provider_body() {
        let server = MockServer::start().await;
        mount_token(&server, 400, json!({"error": "invalid_grant", "error_description": "Bad Request"})).await;
        mount_userinfo(&server, json!({}), 0).await;
        let app = test_app(&server);

        let response = send_get(app.router, "/callback?code=EXPIRED").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({"error": "invalid_grant", "error_description": "Bad Request"}));
    }

    #[tokio::test]
    async fn test_callback_profile_without_email() {
        let server = MockServer::start().await;
        mount_token(&server, 200, json!({"access_token": "T1"})).await;
        mount_userinfo(&server, json!({"sub": "1234", "name": "A"}), 1).await;
        let app = test_app(&server);

        let response = send_get(app.router, "/callback?code=VALIDCODE123").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({"sub": "1234", "name": "A"}));
    }

    #[tokio::test]
    async fn test_callback_provider_non_json_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("<html>unavailable</html>"))
            .mount(&server)
            .await;
        let app = test_app(&server);

        let response = send_get(app.router, "/callback?code=VALIDCODE123").await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_callback_missing_code() {
        let server = MockServer::start().await;
        let app = test_app(&server);

        let response = send_get(app.router, "/callback").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "Missing authorization code");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_callback_empty_code() {
        let server = MockServer::start().await;
        let app = test_app(&server);

        let response = send_get(app.router, "/callback?code=").await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_callback_provider_error_parameter() {
        let server = MockServer::start().await;
        let app = test_app(&server);

        let response = send_get(app.router, "/callback?error=access_denied&state=abc").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({"error": "access_denied"}));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_me_returns_session_claims() {
        let server = MockServer::start().await;
        let app = test_app(&server);
        let token = app
            .jwt
            .create_session_token(&SessionSubject {
                email: "a@b.com".to_string(),
                name: Some("A".to_string()),
                picture: None,
            })
            .unwrap();

        let request = Request::builder()
            .uri("/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["email"], "a@b.com");
        assert_eq!(body["name"], "A");
        assert_eq!(body["picture"], Value::Null);
        assert!(body["expires_at"].is_string());
    }

    #[tokio::test]
    async fn test_me_rejects_missing_or_foreign_tokens() {
        let server = MockServer::start().await;
        let foreign = JwtService::new(JwtConfig { secret: "other_secret".to_string(), session_exp_secs: 60 })
            .unwrap()
            .create_session_token(&SessionSubject { email: "a@b.com".to_string(), name: None, picture: None })
            .unwrap();

        let response = send_get(test_app(&server).router, "/me").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .uri("/me")
            .header(header::AUTHORIZATION, format!("Bearer {foreign}"))
            .body(Body::empty())
            .unwrap();
        let response = test_app(&server).router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
