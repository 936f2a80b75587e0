pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::pipeline::handlers;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Matching engine
        .route("/api/v1/features/extract", post(handlers::handle_extract))
        .route("/api/v1/criteria/parse", post(handlers::handle_parse_criteria))
        // Assessments
        .route(
            "/api/v1/assessments/normalize",
            post(handlers::handle_normalize),
        )
        .route("/api/v1/assessments/score", post(handlers::handle_score))
        .route("/api/v1/assessments/batch", post(handlers::handle_batch))
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::pipeline::model_assessor::{DisabledModelAssessor, ModelAssessor};

    const JOB: &str = "Nous recherchons un data engineer Python / AWS / Spark, \
                       3 ans d'expérience minimum, télétravail possible.";
    const CV: &str = "Ada Lovelace, ada@example.org. Data engineer Python, AWS et Spark \
                      de 2018 - 2024. Télétravail. Très bonne communication.";

    struct FixedAssessor(Value);

    #[async_trait]
    impl ModelAssessor for FixedAssessor {
        async fn assess(&self, _job: &str, _cv: &str, _crit: &str) -> Result<Value, AppError> {
            Ok(self.0.clone())
        }

        fn backend(&self) -> &'static str {
            "fixed"
        }
    }

    fn app_with(model: Arc<dyn ModelAssessor>) -> Router {
        build_router(AppState {
            config: Arc::new(Config::default()),
            model,
        })
    }

    fn app() -> Router {
        app_with(Arc::new(DisabledModelAssessor))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["service"], "recruiter-api");
        assert_eq!(body["model_backend"], "disabled");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, body) = post_json(app(), "/api/v1/nope", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_extract_features() {
        let (status, body) =
            post_json(app(), "/api/v1/features/extract", json!({"text": CV})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skills"], json!(["aws", "python", "spark"]));
        assert_eq!(body["years_experience"], json!(6.0));
        assert_eq!(body["mentions_remote"], json!(true));
    }

    #[tokio::test]
    async fn test_parse_criteria() {
        let (status, body) = post_json(
            app(),
            "/api/v1/criteria/parse",
            json!({"criteria_text": "5 ans, anglais C1, python"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["min_years"], 5);
        assert_eq!(body["min_language"], "C1");
        assert_eq!(body["required_skills"], json!(["python"]));
    }

    #[tokio::test]
    async fn test_normalize_any_json() {
        let (status, body) =
            post_json(app(), "/api/v1/assessments/normalize", json!([1, 2, 3])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tier"], "tolerant");
        assert_eq!(body["assessment"]["infos"]["nom"], "Candidat");
    }

    #[tokio::test]
    async fn test_score_rule_only_reports_gate() {
        let (status, body) = post_json(
            app(),
            "/api/v1/assessments/score",
            json!({"job_text": JOB, "cv_text": CV, "criteria_text": "python, kubernetes",
                   "use_model": true}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["missing"], json!(["kubernetes"]));
        assert_eq!(body["gate"]["gated"], true);
        assert!(body["assessment"]["scores"]["global"].as_u64().unwrap() <= 49);
        assert_eq!(body["model_used"], false);
    }

    #[tokio::test]
    async fn test_score_blends_model_record() {
        let record = json!({
            "infos": {"nom": "Ada Lovelace"},
            "scores": {"global": 90, "tech": 90, "experience": 90, "soft": 90, "fit": 90},
            "salaire": {"min": 55, "max": 65, "confiance": "Moyenne", "analyse": "Marché tendu"}
        });
        let (status, body) = post_json(
            app_with(Arc::new(FixedAssessor(record))),
            "/api/v1/assessments/score",
            json!({"job_text": JOB, "cv_text": CV, "criteria_text": "python", "use_model": true}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model_used"], true);
        assert_eq!(body["assessment"]["infos"]["nom"], "Ada Lovelace");
        assert_eq!(body["assessment"]["infos"]["email"], "ada@example.org");
        assert_eq!(body["assessment"]["salaire"]["max"], 65);
    }

    #[tokio::test]
    async fn test_batch_validation_error() {
        let (status, body) = post_json(
            app(),
            "/api/v1/assessments/batch",
            json!({"job_text": "trop court", "candidates": [{"name": "a", "cv_text": CV}]}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_batch_ranks_and_summarizes() {
        let (status, body) = post_json(
            app(),
            "/api/v1/assessments/batch",
            json!({
                "job_text": JOB,
                "criteria_text": "python",
                "anonymize": true,
                "candidates": [
                    {"name": "bob.pdf", "cv_text": "Bob, bob@example.org. Développeur Java et PHP depuis 2020 - 2023."},
                    {"name": "ada.pdf", "cv_text": CV},
                    {"name": "vide.pdf", "cv_text": ""}
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let candidates = body["candidates"].as_array().unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0]["name"], "ada.pdf");
        assert_eq!(candidates[0]["assessment"]["infos"]["email"], "a***@example.org");
        assert_eq!(body["skipped"][0]["name"], "vide.pdf");
        assert_eq!(body["summary"]["count"], 2);
    }
}
