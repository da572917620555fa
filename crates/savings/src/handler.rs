use crate::models::{ContributionRequest, RawSavingsGoalRequest, SavingsGoal};
use crate::progress::savings_goal_progress;
use crate::service::{SavingsError, SavingsService};
use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use chrono::NaiveDate;
use common::{auth::UserContext, AppState};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

impl IntoResponse for SavingsError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            SavingsError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            SavingsError::NotFound => (StatusCode::NOT_FOUND, "Savings goal not found".to_string()),
            SavingsError::Infrastructure(e) => {
                tracing::error!("Savings infrastructure error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Template)]
#[template(path = "savings.html")]
pub struct SavingsTemplate {
    pub goals: Vec<SavingsGoalView>,
    pub total_saved: String,
}

pub struct SavingsGoalView {
    pub id: i64,
    pub description: String,
    pub category: String,
    pub target_dollars: String,
    pub current_dollars: String,
    pub remaining_dollars: String,
    pub percent: String,
    pub bar_width: String,
    pub target_date_display: String,
    pub deadline_note: String,
    pub is_complete: bool,
}

impl SavingsGoalView {
    fn new(goal: &SavingsGoal, today: NaiveDate) -> Self {
        let progress = savings_goal_progress(goal, today);
        let deadline_note = match progress.days_remaining {
            d if d > 1 => format!("{} days left", d),
            1 => "1 day left".to_string(),
            0 => "Due today".to_string(),
            d => format!("{} days overdue", -d),
        };

        SavingsGoalView {
            id: goal.id,
            description: goal.description.clone(),
            category: goal.category.clone().unwrap_or_default(),
            target_dollars: dollars(goal.target_amount),
            current_dollars: dollars(goal.current_amount),
            remaining_dollars: dollars(progress.remaining),
            percent: format!("{:.0}", progress.progress_ratio),
            bar_width: format!("{:.0}", progress.display_progress),
            target_date_display: goal.target_date.format("%e %b %Y").to_string(),
            deadline_note,
            is_complete: progress.is_complete,
        }
    }
}

fn dollars(cents: i64) -> String {
    format!("{:.2}", cents as f64 / 100.0)
}

pub fn savings_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(savings_page).post(create_goal))
        .route("/api", get(list_goals_api))
        .route("/{id}", put(update_goal).delete(delete_goal))
        .route("/{id}/contribute", post(contribute))
        .with_state(state)
}

async fn savings_page(
    State(state): State<Arc<AppState>>,
    user: UserContext,
) -> Result<impl IntoResponse, SavingsError> {
    let goals = SavingsService::list_goals(&state.db, user.user_id).await?;
    let today = chrono::Local::now().date_naive();

    let template = SavingsTemplate {
        total_saved: dollars(goals.iter().map(|g| g.current_amount).sum()),
        goals: goals.iter().map(|g| SavingsGoalView::new(g, today)).collect(),
    };

    Ok(Html(template.render().map_err(|e| SavingsError::Infrastructure(e.to_string()))?))
}

async fn list_goals_api(
    State(state): State<Arc<AppState>>,
    user: UserContext,
) -> Result<Json<Vec<SavingsGoal>>, SavingsError> {
    let goals = SavingsService::list_goals(&state.db, user.user_id).await?;
    Ok(Json(goals))
}

async fn create_goal(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Form(payload): Form<RawSavingsGoalRequest>,
) -> Result<impl IntoResponse, SavingsError> {
    let id = SavingsService::create_goal(&state.db, user.user_id, payload).await?;
    tracing::info!("Created savings goal {}", id);
    Ok(Redirect::to("/savings"))
}

async fn update_goal(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<i64>,
    Json(payload): Json<RawSavingsGoalRequest>,
) -> Result<Json<SavingsGoal>, SavingsError> {
    let goal = SavingsService::update_goal(&state.db, user.user_id, id, payload).await?;
    Ok(Json(goal))
}

async fn contribute(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<i64>,
    Form(payload): Form<ContributionRequest>,
) -> Result<impl IntoResponse, SavingsError> {
    payload
        .validate()
        .map_err(|e| SavingsError::InvalidInput(e.to_string()))?;

    SavingsService::contribute(&state.db, user.user_id, id, payload.amount_dollars).await?;
    Ok(Redirect::to("/savings"))
}

async fn delete_goal(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, SavingsError> {
    SavingsService::delete_goal(&state.db, user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        Extension,
    };
    use common::{auth::DEFAULT_USER_ID, Config};
    use database::get_test_db;
    use tower::ServiceExt;

    async fn test_app() -> (Router, Arc<AppState>) {
        let db = get_test_db().await;
        let state = Arc::new(AppState { db, config: Config::for_tests() });
        let app = savings_router(state.clone())
            .layer(Extension(UserContext { user_id: DEFAULT_USER_ID }))
            .with_state(state.clone());
        (app, state)
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn seed_goal(state: &AppState) -> i64 {
        SavingsService::create_goal(
            &state.db,
            DEFAULT_USER_ID,
            RawSavingsGoalRequest {
                description: "Emergency fund".into(),
                target_dollars: 1000.0,
                target_date: "2027-06-30".into(),
                category: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_goal_via_form() {
        let (app, _) = test_app().await;

        let response = app
            .clone()
            .oneshot(form_post("/", "description=New+car&target_dollars=5000&target_date=2027-01-01&category=Transport"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let request = Request::builder().uri("/api").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let goals: Vec<SavingsGoal> = serde_json::from_slice(&body).unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].target_amount, 500000);
        assert_eq!(goals[0].category.as_deref(), Some("Transport"));
    }

    #[tokio::test]
    async fn test_contribute_updates_page() {
        let (app, state) = test_app().await;
        let id = seed_goal(&state).await;

        let response = app
            .clone()
            .oneshot(form_post(&format!("/{}/contribute", id), "amount_dollars=250"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
        assert!(html.contains("Emergency fund"));
        assert!(html.contains("250.00"));
        assert!(html.contains("25%"));
    }

    #[tokio::test]
    async fn test_negative_contribution_is_bad_request() {
        let (app, state) = test_app().await;
        let id = seed_goal(&state).await;

        let response = app
            .oneshot(form_post(&format!("/{}/contribute", id), "amount_dollars=-10"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_goal_json() {
        let (app, state) = test_app().await;
        let id = seed_goal(&state).await;

        let body = json!({
            "description": "Rainy day fund",
            "target_dollars": 2000.0,
            "target_date": "2027-12-31",
            "category": null
        });
        let request = Request::builder()
            .method("PUT")
            .uri(format!("/{}", id))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let goal: SavingsGoal = serde_json::from_slice(&body).unwrap();
        assert_eq!(goal.description, "Rainy day fund");
        assert_eq!(goal.target_amount, 200000);
    }

    #[tokio::test]
    async fn test_delete_goal() {
        let (app, state) = test_app().await;
        let id = seed_goal(&state).await;

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/{}", id))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/{}", id))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
