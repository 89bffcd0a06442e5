use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::error::TranslateError;
use crate::state::AppState;
use crate::translate::{TranslationRequest, TranslationResponse};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/translate", post(translate))
}

/// Full application: routes, CORS and request tracing
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Json<Value> {
    Json(json!({
        "code": 200,
        "message": "DeepL Free API, Made by sjlleo and missuo. Go to /translate with POST. http://github.com/OwO-Network/DeepLX"
    }))
}

/// The body is read as JSON whatever the Content-Type says.
async fn translate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TranslationResponse>, TranslateError> {
    let request: TranslationRequest =
        serde_json::from_slice(&body).map_err(|e| TranslateError::InvalidBody(e.to_string()))?;

    if request.text.is_empty() {
        return Err(TranslateError::NoText);
    }

    let request_id = Uuid::new_v4();
    let span = info_span!("translate", %request_id);
    let translation = state
        .translator
        .translate(&request)
        .instrument(span)
        .await?;

    info!(%request_id, id = translation.id, "Translated {} chars", request.text.chars().count());
    Ok(Json(translation.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::mock::{spawn_upstream, test_config};
    use crate::translate::interface::Translation;
    use crate::translate::TranslateInterface;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    #[derive(Default)]
    struct CountingTranslator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TranslateInterface for CountingTranslator {
        async fn translate(
            &self,
            request: &TranslationRequest,
        ) -> Result<Translation, TranslateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Translation {
                id: 42,
                text: request.text.to_uppercase(),
                alternatives: vec![],
            })
        }
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_translate(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/translate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn app_with_upstream(url: &str) -> Router {
        let state = AppState::new(&test_config(url), CancellationToken::new()).unwrap();
        build_app(state)
    }

    #[tokio::test]
    async fn index_points_to_translate() {
        let app = build_app(AppState::with_translator(Arc::new(CountingTranslator::default())));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, body) = call(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 200);
        assert!(body["message"].as_str().unwrap().contains("/translate"));
    }

    #[tokio::test]
    async fn empty_text_is_404_without_upstream_call() {
        let translator = Arc::new(CountingTranslator::default());
        let app = build_app(AppState::with_translator(translator.clone()));

        let (status, body) = call(app, post_translate(r#"{"text":"","target_lang":"DE"}"#)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"code": 404, "message": "No Translate Text Found"}));
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_text_never_reaches_real_upstream() {
        let upstream = spawn_upstream(StatusCode::OK, "{}").await;
        let app = app_with_upstream(&upstream.url);

        let (status, _) = call(app, post_translate(r#"{"source_lang":"EN"}"#)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let translator = Arc::new(CountingTranslator::default());
        let app = build_app(AppState::with_translator(translator.clone()));

        let (status, body) = call(app, post_translate("not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn body_without_content_type_is_accepted() {
        let translator = Arc::new(CountingTranslator::default());
        let app = build_app(AppState::with_translator(translator));
        let request = Request::builder()
            .method("POST")
            .uri("/translate")
            .body(Body::from(r#"{"text":"hi"}"#))
            .unwrap();

        let (status, body) = call(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"code": 200, "id": 42, "data": "HI", "alternatives": []}));
    }

    #[tokio::test]
    async fn translation_is_relayed() {
        let upstream = spawn_upstream(
            StatusCode::OK,
            r#"{"result":{"texts":[{"text":"Bonjour","alternatives":[{"text":"Salut"}]}]}}"#,
        )
        .await;
        let app = app_with_upstream(&upstream.url);

        let (status, body) = call(
            app,
            post_translate(r#"{"text":"Hello","source_lang":"EN","target_lang":"FR"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 200);
        assert_eq!(body["data"], "Bonjour");
        assert_eq!(body["alternatives"], json!(["Salut"]));
        assert!(body["id"].as_i64().unwrap() > 8_300_000_000);
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_request_code_is_406() {
        let upstream = spawn_upstream(
            StatusCode::OK,
            r#"{"jsonrpc":"2.0","error":{"code":-32600,"message":"Invalid Request"}}"#,
        )
        .await;
        let app = app_with_upstream(&upstream.url);

        let (status, body) = call(
            app,
            post_translate(r#"{"text":"Hello","source_lang":"EN","target_lang":"XX"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
        assert_eq!(body, json!({"code": 406, "message": "Invalid targetLang"}));
    }

    #[tokio::test]
    async fn upstream_throttling_is_429() {
        let upstream = spawn_upstream(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"jsonrpc":"2.0","error":{"code":1042912,"message":"Too many requests"}}"#,
        )
        .await;
        let app = app_with_upstream(&upstream.url);

        let (status, body) = call(app, post_translate(r#"{"text":"Hello","source_lang":"EN"}"#)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body, json!({"code": 429, "message": "Too Many Requests"}));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_502() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/jsonrpc", listener.local_addr().unwrap());
        drop(listener);
        let app = app_with_upstream(&url);

        let (status, body) = call(app, post_translate(r#"{"text":"Hello","source_lang":"EN"}"#)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"code": 502, "message": "Upstream Unavailable"}));
    }
}
