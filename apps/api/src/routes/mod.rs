pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::corpus::handlers as corpus;
use crate::matching::handlers as matching;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route("/api/v1/jobs", get(corpus::handle_list_jobs))
        .route("/api/v1/jobs/search", post(corpus::handle_search_jobs))
        .route("/api/v1/jobs/match", post(matching::handle_match_jobs))
        .route("/api/v1/jobs/:id", get(corpus::handle_get_job))
        // Chat API
        .route("/api/v1/chat", post(chat::handle_chat))
        .route("/api/v1/chat/turn", post(chat::handle_turn))
        .route(
            "/api/v1/conversations/:id/profile",
            get(chat::handle_get_profile),
        )
        .route(
            "/api/v1/conversations/:id",
            delete(chat::handle_end_conversation),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::llm_client::testing::ScriptedProvider;
    use crate::state::testing::test_state;

    fn app(provider: ScriptedProvider) -> Router {
        build_router(test_state(Arc::new(provider)))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 256)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn delete_req(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let resp = app(ScriptedProvider::new()).oneshot(get_req("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["service"], "jobchat-api");
    }

    #[tokio::test]
    async fn test_list_jobs() {
        let resp = app(ScriptedProvider::new()).oneshot(get_req("/api/v1/jobs")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["count"], 3);
        assert_eq!(json["jobs"][0]["id"], "job-1");
        assert_eq!(json["jobs"][0]["type"], "Alternance");
    }

    #[tokio::test]
    async fn test_get_job_and_unknown_job() {
        let app = app(ScriptedProvider::new());
        let resp = app.clone().oneshot(get_req("/api/v1/jobs/job-2")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["job"]["location"], "Lyon");

        let resp = app.oneshot(get_req("/api/v1/jobs/job-99")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_search_with_no_result_is_ok_and_empty() {
        let resp = app(ScriptedProvider::new())
            .oneshot(post_json(
                "/api/v1/jobs/search",
                json!({"skills": ["docker"], "location": "lyon"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["count"], 0);
        assert_eq!(json["jobs"], json!([]));
    }

    #[tokio::test]
    async fn test_search_by_type() {
        let resp = app(ScriptedProvider::new())
            .oneshot(post_json("/api/v1/jobs/search", json!({"type": "alternance"})))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["count"], 2);
    }

    #[tokio::test]
    async fn test_match_requires_skills() {
        let resp = app(ScriptedProvider::new())
            .oneshot(post_json(
                "/api/v1/jobs/match",
                json!({"user_profile": {"location": "Paris"}}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_match_ranks_with_keyword_scorer() {
        let resp = app(ScriptedProvider::new())
            .oneshot(post_json(
                "/api/v1/jobs/match",
                json!({"user_profile": {"skills": ["Python", "SQL"]}, "top_n": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["scorer"], "keyword");
        assert_eq!(json["matches"].as_array().unwrap().len(), 1);
        assert_eq!(json["matches"][0]["job_id"], "job-2");
    }

    #[tokio::test]
    async fn test_match_accepts_camel_case_body() {
        let resp = app(ScriptedProvider::new())
            .oneshot(post_json(
                "/api/v1/jobs/match",
                json!({"userProfile": {"skills": ["angular"]}, "topN": 2}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["matches"][0]["job_id"], "job-3");
    }

    #[tokio::test]
    async fn test_plain_chat_falls_back_instead_of_failing() {
        let resp = app(ScriptedProvider::new().fail())
            .oneshot(post_json("/api/v1/chat", json!({"prompt": "Bonjour"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["answer"], chat::MODEL_ERROR_ANSWER);
    }

    #[tokio::test]
    async fn test_turn_then_profile_then_delete() {
        let provider = ScriptedProvider::new()
            .reply(r#"{"intent":"general_chat","filters":{}}"#)
            .reply("Top ! Tu veux que je te recommande des offres ?");
        let app = app(provider);

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/v1/chat/turn",
                json!({
                    "conversation_id": "conv-1",
                    "conversation": [{"role": "assistant", "content": "Bonjour !"}],
                    "message": "Je connais Python et je suis à Lyon"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["conversation_id"], "conv-1");
        assert_eq!(json["intent"], "general_chat");
        assert_eq!(json["payload"]["kind"], "text");
        assert_eq!(json["degraded"], false);
        assert_eq!(json["profile"]["skills"], json!(["python"]));

        let resp = app
            .clone()
            .oneshot(get_req("/api/v1/conversations/conv-1/profile"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["location"], "lyon");

        let resp = app.clone().oneshot(delete_req("/api/v1/conversations/conv-1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = app.oneshot(delete_req("/api/v1/conversations/conv-1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_turn_generates_conversation_id() {
        let provider = ScriptedProvider::new().reply(r#"{"intent":"show_all_jobs","filters":{}}"#);
        let resp = app(provider)
            .oneshot(post_json(
                "/api/v1/chat/turn",
                json!({"message": "Montre-moi toutes les offres"}),
            ))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert!(!json["conversation_id"].as_str().unwrap().is_empty());
        assert_eq!(json["payload"]["kind"], "jobs");
        assert_eq!(json["payload"]["count"], 3);
    }

    #[tokio::test]
    async fn test_turn_rejects_blank_message() {
        let resp = app(ScriptedProvider::new())
            .oneshot(post_json("/api/v1/chat/turn", json!({"message": "   "})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_conversation_profile_is_404() {
        let resp = app(ScriptedProvider::new())
            .oneshot(get_req("/api/v1/conversations/nobody/profile"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
