use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{catalog, comments, likes};

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(catalog::index))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/units", get(catalog::units))
        .route("/courses", get(catalog::courses))
        .route("/practice", get(catalog::practice))
        .route("/blog", get(catalog::blog))
        .route("/about", get(catalog::about))
        .route("/about/{name}", get(catalog::about_member))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route(
            "/comment",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/replies/{comment_id}", get(comments::list_replies))
        .route("/like/{comment_id}", post(likes::toggle_like))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde::de::DeserializeOwned;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use envision_types::api::{CommentView, ErrorResponse, MessageResponse, RegisterResponse};

    use super::*;
    use crate::auth::{AppStateInner, create_token};
    use crate::catalog::Catalog;
    use crate::test_support::{ScratchDb, add_user};

    const SECRET: &str = "test-secret";

    fn app(scratch: &ScratchDb) -> Router {
        let catalog = Catalog::with_team(vec![]).unwrap();
        router(AppStateInner::new(
            Arc::clone(&scratch.db),
            catalog,
            SECRET.to_string(),
        ))
    }

    fn bearer(user_id: i64, name: &str) -> String {
        format!("Bearer {}", create_token(SECRET, user_id, name).unwrap())
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            req = req.header(header::AUTHORIZATION, auth);
        }
        let req = match body {
            Some(json) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn comment_endpoints_require_a_token() {
        let scratch = ScratchDb::new();
        let app = app(&scratch);

        let (status, body) = send(&app, Method::GET, "/comment", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!parse::<ErrorResponse>(&body).error.is_empty());

        let (status, _) = send(&app, Method::POST, "/like/1", Some("Bearer garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn thread_walkthrough() {
        let scratch = ScratchDb::new();
        let app = app(&scratch);
        let alice = add_user(&scratch.db, "alice");
        let bob = add_user(&scratch.db, "bob");
        let alice_auth = bearer(alice, "alice");
        let bob_auth = bearer(bob, "bob");

        let (status, body) = send(
            &app,
            Method::POST,
            "/comment",
            Some(&alice_auth),
            Some(json!({"text": "hi", "postDate": "2024-03-01T12:00:00Z"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let a: CommentView = parse(&body);
        assert_eq!((a.count_likes, a.count_replies), (0, 0));

        let (status, body) = send(
            &app,
            Method::POST,
            "/comment",
            Some(&bob_auth),
            Some(json!({"text": "yo", "postDate": "2024-03-01T12:05:00Z", "parentId": a.id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let b: CommentView = parse(&body);
        assert_eq!(b.parent_id, Some(a.id));

        let (status, body) =
            send(&app, Method::POST, &format!("/like/{}", a.id), Some(&alice_auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse::<MessageResponse>(&body), MessageResponse::ok());

        let (_, body) = send(&app, Method::GET, "/comment", Some(&alice_auth), None).await;
        let top: Vec<CommentView> = parse(&body);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, a.id);
        assert_eq!(top[0].count_replies, 1);
        assert_eq!(top[0].count_likes, 1);
        assert!(top[0].user_liked);

        let (_, body) = send(&app, Method::GET, "/comment?offset=0", Some(&bob_auth), None).await;
        let top: Vec<CommentView> = parse(&body);
        assert_eq!(top[0].count_likes, 1);
        assert!(!top[0].user_liked);

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/replies/{}", a.id),
            Some(&bob_auth),
            None,
        )
        .await;
        let replies: Vec<CommentView> = parse(&body);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].id, b.id);
        assert_eq!(replies[0].user.username, "bob");
    }

    #[tokio::test]
    async fn snapshot_query_pins_the_listing() {
        let scratch = ScratchDb::new();
        let app = app(&scratch);
        let alice = add_user(&scratch.db, "alice");
        let auth = bearer(alice, "alice");

        let (_, body) = send(
            &app,
            Method::POST,
            "/comment",
            Some(&auth),
            Some(json!({"text": "first", "postDate": "2024-03-01T12:00:00Z"})),
        )
        .await;
        let first: CommentView = parse(&body);
        send(
            &app,
            Method::POST,
            "/comment",
            Some(&auth),
            Some(json!({"text": "second", "postDate": "2024-03-01T13:00:00Z"})),
        )
        .await;

        let uri = format!("/comment?offset=0&snapshot={}", first.id);
        let (_, body) = send(&app, Method::GET, &uri, Some(&auth), None).await;
        let pinned: Vec<CommentView> = parse(&body);
        assert_eq!(pinned.len(), 1);
        assert_eq!(pinned[0].id, first.id);

        // A malformed snapshot falls back to "no cap".
        let (status, body) =
            send(&app, Method::GET, "/comment?snapshot=soon", Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse::<Vec<CommentView>>(&body).len(), 2);
        // An offset past every comment is an empty page, not page one.
        let (status, body) =
            send(&app, Method::GET, "/comment?offset=5000000000", Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(parse::<Vec<CommentView>>(&body).is_empty());
    }

    #[tokio::test]
    async fn bad_comment_bodies_are_rejected() {
        let scratch = ScratchDb::new();
        let app = app(&scratch);
        let alice = add_user(&scratch.db, "alice");
        let auth = bearer(alice, "alice");

        let (status, body) = send(
            &app,
            Method::POST,
            "/comment",
            Some(&auth),
            Some(json!({"text": "x".repeat(200), "postDate": "2024-03-01T12:00:00Z"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(parse::<ErrorResponse>(&body).error, "Text too long");

        let (status, _) = send(
            &app,
            Method::POST,
            "/comment",
            Some(&auth),
            Some(json!({"text": "no date"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, Method::GET, "/comment", Some(&auth), None).await;
        assert!(parse::<Vec<CommentView>>(&body).is_empty());
    }

    #[tokio::test]
    async fn liking_an_unknown_comment_is_404() {
        let scratch = ScratchDb::new();
        let app = app(&scratch);
        let alice = add_user(&scratch.db, "alice");

        let (status, _) =
            send(&app, Method::POST, "/like/77", Some(&bearer(alice, "alice")), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn register_then_login() {
        let scratch = ScratchDb::new();
        let app = app(&scratch);
        let signup = json!({
            "username": "grace",
            "password": "correct horse",
            "email": "grace@example.com",
            "firstName": "Grace",
            "lastName": "Hopper",
            "grade": 12
        });

        let (status, body) = send(&app, Method::POST, "/register", None, Some(signup.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let registered: RegisterResponse = parse(&body);

        // The issued token works against a protected route.
        let auth = format!("Bearer {}", registered.access_token);
        let (status, _) = send(&app, Method::GET, "/comment", Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::POST, "/register", None, Some(signup)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(parse::<ErrorResponse>(&body).error, "This username already exists.");

        let (status, _) = send(
            &app,
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "grace", "password": "wrong password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &app,
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "grace", "password": "correct horse"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let login: Value = parse(&body);
        assert_eq!(login["id"], registered.id);
    }

    #[tokio::test]
    async fn catalog_is_public() {
        let scratch = ScratchDb::new();
        let app = app(&scratch);

        let (status, body) = send(&app, Method::GET, "/units", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse::<Vec<Value>>(&body).len(), 5);

        let (status, body) = send(&app, Method::GET, "/about/nobody-here", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(parse::<ErrorResponse>(&body).error, "Could not find user.");
    }
}
