use crate::models::{first_day_of_month, Category, CategoryBudgetView, UpdateCategoryRequest};
use crate::service::{CategoryError, CategoryService, PASTEL_COLORS};
use crate::CategoryCache;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post, put},
    Extension, Form, Json, Router,
};
use common::{auth::UserContext, AppState};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            CategoryError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            CategoryError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            CategoryError::NotFound => (StatusCode::NOT_FOUND, "Category not found".to_string()),
            CategoryError::Infrastructure(e) => {
                tracing::error!("Category infrastructure error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Template)]
#[template(path = "categories.html")]
pub struct ManageCategoriesTemplate {
    pub month: String,
    pub categories: Vec<Category>,
    pub budget_rows: Vec<BudgetLimitRow>,
    pub pastel_colors: Vec<String>,
}

pub struct BudgetLimitRow {
    pub budget_id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub category_color: String,
    pub amount_dollars: String,
    pub has_budget: bool,
    pub is_income: bool,
}

impl From<&CategoryBudgetView> for BudgetLimitRow {
    fn from(view: &CategoryBudgetView) -> Self {
        BudgetLimitRow {
            budget_id: view.budget.as_ref().map(|b| b.id).unwrap_or(0),
            category_id: view.category.id,
            category_name: view.category.name.clone(),
            category_color: view.category.color.clone(),
            amount_dollars: format!("{:.2}", view.limit() as f64 / 100.0),
            has_budget: view.budget.is_some(),
            is_income: view.category.is_income,
        }
    }
}

pub fn categories_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_categories_view).post(create_category))
        .route("/api", get(list_categories_api))
        .route("/{id}", put(update_category).delete(delete_category))
        .route("/budget", get(get_budget_view).post(set_budget_form))
        .route("/budget/{id}", delete(delete_budget))
        .route("/limit", post(set_limit))
        .with_state(state)
}

fn current_month() -> String {
    chrono::Local::now().format("%Y-%m").to_string()
}

#[derive(Deserialize)]
struct MonthQuery {
    month: Option<String>,
}

async fn list_categories_view(
    State(state): State<Arc<AppState>>,
    Extension(cache): Extension<Arc<CategoryCache>>,
    user: UserContext,
    Query(params): Query<MonthQuery>,
) -> Result<impl IntoResponse, CategoryError> {
    let month = params.month.unwrap_or_else(current_month);
    first_day_of_month(&month).map_err(CategoryError::InvalidInput)?;

    let categories = CategoryService::list_categories_cached(&state.db, &cache, user.user_id).await?;
    let budget_rows = CategoryService::get_budget_view(&state.db, user.user_id, &month)
        .await?
        .iter()
        .map(BudgetLimitRow::from)
        .collect();

    let template = ManageCategoriesTemplate {
        month,
        categories,
        budget_rows,
        pastel_colors: PASTEL_COLORS.iter().map(|s| s.to_string()).collect(),
    };
    Ok(Html(template.render().map_err(|e| CategoryError::Infrastructure(e.to_string()))?))
}

async fn list_categories_api(
    State(state): State<Arc<AppState>>,
    Extension(cache): Extension<Arc<CategoryCache>>,
    user: UserContext,
) -> Result<impl IntoResponse, CategoryError> {
    let categories = CategoryService::list_categories_cached(&state.db, &cache, user.user_id).await?;
    Ok(Json(categories))
}

#[derive(Deserialize, Validate)]
pub struct CreateCategoryForm {
    #[validate(length(min = 1, max = 50, message = "Category name must be 1-50 characters"))]
    pub name: String,
    pub monthly_limit: Option<String>,
    pub is_income: Option<String>,
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(cache): Extension<Arc<CategoryCache>>,
    user: UserContext,
    Form(payload): Form<CreateCategoryForm>,
) -> Result<impl IntoResponse, CategoryError> {
    payload.validate().map_err(|e| CategoryError::InvalidInput(e.to_string()))?;
    let is_income = payload.is_income.as_deref() == Some("on");

    let monthly_limit = match payload.monthly_limit.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<f64>()
                .map_err(|_| CategoryError::InvalidInput("Monthly limit must be a number".into()))?,
        ),
    };

    let id = CategoryService::create_category_with_budget(
        &state.db,
        user.user_id,
        payload.name,
        is_income,
        current_month(),
        monthly_limit,
    )
    .await?;
    cache.invalidate(&user.user_id);
    tracing::info!("Created category {}", id);

    Ok(Redirect::to("/categories"))
}

async fn update_category(
    State(state): State<Arc<AppState>>,
    Extension(cache): Extension<Arc<CategoryCache>>,
    user: UserContext,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, CategoryError> {
    payload.validate().map_err(|e| CategoryError::InvalidInput(e.to_string()))?;
    CategoryService::update_category(
        &state.db,
        user.user_id,
        id,
        payload.name,
        payload.color,
        payload.is_income,
        payload.is_active,
    )
    .await?;
    cache.invalidate(&user.user_id);
    Ok(StatusCode::OK)
}

async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(cache): Extension<Arc<CategoryCache>>,
    user: UserContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CategoryError> {
    CategoryService::delete_category(&state.db, user.user_id, id).await?;
    cache.invalidate(&user.user_id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct BudgetQuery {
    month: String,
}

async fn get_budget_view(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Query(params): Query<BudgetQuery>,
) -> Result<Json<Vec<CategoryBudgetView>>, CategoryError> {
    let view = CategoryService::get_budget_view(&state.db, user.user_id, &params.month).await?;
    Ok(Json(view))
}

#[derive(Deserialize)]
struct SetLimitRequest {
    category_id: i64,
    month: String,
    limit: f64,
}

async fn set_limit(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Json(payload): Json<SetLimitRequest>,
) -> Result<impl IntoResponse, CategoryError> {
    let id = CategoryService::set_budget(
        &state.db,
        user.user_id,
        payload.category_id,
        payload.month,
        payload.limit,
    )
    .await?;
    Ok(Json(json!({ "id": id })))
}

async fn set_budget_form(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Form(payload): Form<SetLimitRequest>,
) -> Result<impl IntoResponse, CategoryError> {
    let redirect = format!("/categories?month={}", payload.month);
    CategoryService::set_budget(
        &state.db,
        user.user_id,
        payload.category_id,
        payload.month,
        payload.limit,
    )
    .await?;
    Ok(Redirect::to(&redirect))
}

async fn delete_budget(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CategoryError> {
    CategoryService::delete_budget(&state.db, user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use common::{auth::DEFAULT_USER_ID, Config};
    use database::get_test_db;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn test_app() -> (Router, Arc<AppState>) {
        let db = get_test_db().await;
        let state = Arc::new(AppState { db, config: Config::for_tests() });
        let cache = Arc::new(crate::category_cache(Duration::from_secs(60)));
        let app = categories_router(state.clone())
            .layer(Extension(cache))
            .layer(Extension(UserContext { user_id: DEFAULT_USER_ID }))
            .with_state(state.clone());
        (app, state)
    }

    #[tokio::test]
    async fn test_create_category_via_form_then_list_api() {
        let (app, _) = test_app().await;

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("name=Groceries&monthly_limit=250"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let request = Request::builder().uri("/api").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let categories: Vec<Category> = serde_json::from_slice(&body).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Groceries");
    }

    #[tokio::test]
    async fn test_create_category_rejects_empty_name() {
        let (app, _) = test_app().await;

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("name="))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_category_with_bad_limit_is_not_saved() {
        let (app, state) = test_app().await;

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("name=Rent&monthly_limit=-5"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(CategoryService::list_categories(&state.db, DEFAULT_USER_ID).await.unwrap().is_empty());

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("name=Rent&monthly_limit=500"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_set_limit_for_unknown_category_is_not_found() {
        let (app, _) = test_app().await;

        let request = Request::builder()
            .method("POST")
            .uri("/limit")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"category_id": 42, "month": "2026-01", "limit": 10.0}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_manage_page_renders() {
        let (app, state) = test_app().await;
        CategoryService::create_category(&state.db, DEFAULT_USER_ID, "Rent".into(), false).await.unwrap();

        let request = Request::builder().uri("/?month=2026-01").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("Rent"));
    }
}
