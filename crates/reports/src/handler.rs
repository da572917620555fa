use crate::aggregator::{CategoryBreakdown, PeriodComparison};
use crate::period::ReportPeriod;
use crate::service::{GoalReport, ReportError, ReportOverview, ReportService};
use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use common::{auth::UserContext, AppState};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ReportError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ReportError::Infrastructure(e) => {
                tracing::error!("Report infrastructure error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Deserialize, Default)]
pub struct ReportQuery {
    #[serde(default)]
    pub period: ReportPeriod,
}

#[derive(Template)]
#[template(path = "reports.html")]
pub struct ReportsTemplate {
    pub periods: Vec<PeriodOption>,
    pub range_display: String,
    pub total_income: String,
    pub total_expense: String,
    pub balance: String,
    pub balance_is_positive: bool,
    pub savings_rate: String,
    pub income_change: Option<ChangeView>,
    pub expense_change: Option<ChangeView>,
    pub expense_rows: Vec<BreakdownRow>,
    pub income_rows: Vec<BreakdownRow>,
    pub months: Vec<MonthRow>,
    pub goals: Vec<GoalRow>,
}

pub struct PeriodOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

pub struct ChangeView {
    pub percent: String,
    pub is_positive: bool,
}

impl From<&PeriodComparison> for ChangeView {
    fn from(c: &PeriodComparison) -> Self {
        ChangeView {
            percent: format!("{:.1}", c.percentage_change),
            is_positive: c.is_positive,
        }
    }
}

pub struct BreakdownRow {
    pub category: String,
    pub total: String,
    pub percent: String,
}

impl From<&CategoryBreakdown> for BreakdownRow {
    fn from(b: &CategoryBreakdown) -> Self {
        BreakdownRow {
            category: b.category.clone(),
            total: dollars(b.total),
            percent: format!("{:.1}", b.percentage),
        }
    }
}

pub struct MonthRow {
    pub label: String,
    pub income: String,
    pub expense: String,
    pub balance: String,
    pub balance_is_positive: bool,
}

pub struct GoalRow {
    pub description: String,
    pub current: String,
    pub target: String,
    pub percent: String,
    pub bar_width: String,
    pub is_complete: bool,
    pub days_remaining: i64,
}

impl From<&GoalReport> for GoalRow {
    fn from(g: &GoalReport) -> Self {
        GoalRow {
            description: g.goal.description.clone(),
            current: dollars(g.goal.current_amount),
            target: dollars(g.goal.target_amount),
            percent: format!("{:.0}", g.progress.progress_ratio),
            bar_width: format!("{:.0}", g.progress.display_progress),
            is_complete: g.progress.is_complete,
            days_remaining: g.progress.days_remaining,
        }
    }
}

fn dollars(cents: i64) -> String {
    format!("{:.2}", cents as f64 / 100.0)
}

impl From<&ReportOverview> for ReportsTemplate {
    fn from(overview: &ReportOverview) -> Self {
        let range_display = match overview.range {
            Some(range) => format!("{} to {}", range.start.format("%e %b %Y"), range.end.format("%e %b %Y")),
            None => "All recorded transactions".to_string(),
        };

        ReportsTemplate {
            periods: ReportPeriod::ALL
                .iter()
                .map(|p| PeriodOption { value: p.as_str(), label: p.label(), selected: *p == overview.period })
                .collect(),
            range_display,
            total_income: dollars(overview.summary.total_income),
            total_expense: dollars(overview.summary.total_expense),
            balance: dollars(overview.summary.balance),
            balance_is_positive: overview.summary.balance >= 0,
            savings_rate: format!("{:.1}", overview.summary.savings_rate),
            income_change: overview.income_comparison.as_ref().map(ChangeView::from),
            expense_change: overview.expense_comparison.as_ref().map(ChangeView::from),
            expense_rows: overview.expense_breakdown.iter().map(BreakdownRow::from).collect(),
            income_rows: overview.income_breakdown.iter().map(BreakdownRow::from).collect(),
            months: overview
                .evolution
                .iter()
                .map(|m| MonthRow {
                    label: m.month_label.clone(),
                    income: dollars(m.income),
                    expense: dollars(m.expense),
                    balance: dollars(m.balance),
                    balance_is_positive: m.balance >= 0,
                })
                .collect(),
            goals: overview.goals.iter().map(GoalRow::from).collect(),
        }
    }
}

pub fn reports_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(reports_page))
        .route("/api", get(reports_api))
        .with_state(state)
}

async fn reports_page(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ReportError> {
    let today = chrono::Local::now().date_naive();
    let overview = ReportService::build_overview(&state.db, user.user_id, query.period, today).await?;

    let template = ReportsTemplate::from(&overview);
    Ok(Html(template.render().map_err(|e| ReportError::Infrastructure(e.to_string()))?))
}

async fn reports_api(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportOverview>, ReportError> {
    tracing::info!("Building report for period: {}", query.period.as_str());
    let today = chrono::Local::now().date_naive();
    let overview = ReportService::build_overview(&state.db, user.user_id, query.period, today).await?;
    Ok(Json(overview))
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
    use transactions::models::{RawCreateTransactionRequest, TransactionKind};
    use transactions::service::TransactionService;

    async fn test_app() -> (Router, Arc<AppState>) {
        let db = get_test_db().await;
        let state = Arc::new(AppState { db, config: Config::for_tests() });
        let app = reports_router(state.clone())
            .layer(Extension(UserContext { user_id: DEFAULT_USER_ID }))
            .with_state(state.clone());
        (app, state)
    }

    async fn seed(state: &AppState) {
        let today = chrono::Local::now().date_naive();
        TransactionService::create_transaction(
            &state.db,
            DEFAULT_USER_ID,
            RawCreateTransactionRequest {
                description: "Coffee".into(),
                amount_dollars: 4.5,
                kind: TransactionKind::Expense,
                category_id: None,
                occurred_on: today.format("%Y-%m-%d").to_string(),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_api_defaults_to_current_month() {
        let (app, state) = test_app().await;
        seed(&state).await;

        let request = Request::builder().uri("/api").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let overview: ReportOverview = serde_json::from_slice(&body).unwrap();
        assert_eq!(overview.period, ReportPeriod::CurrentMonth);
        assert_eq!(overview.summary.total_expense, 450);
        assert_eq!(overview.expense_breakdown[0].percentage, 100.0);
    }

    #[tokio::test]
    async fn test_api_all_time() {
        let (app, state) = test_app().await;
        seed(&state).await;

        let request = Request::builder().uri("/api?period=all_time").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let overview: ReportOverview = serde_json::from_slice(&body).unwrap();
        assert_eq!(overview.period, ReportPeriod::AllTime);
        assert!(overview.expense_comparison.is_none());
    }

    #[tokio::test]
    async fn test_unknown_period_is_rejected() {
        let (app, _) = test_app().await;
        let request = Request::builder().uri("/api?period=fortnight").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_page_renders() {
        let (app, state) = test_app().await;
        seed(&state).await;

        let request = Request::builder().uri("/?period=current_year").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
        assert!(html.contains("Uncategorized"));
        assert!(html.contains("4.50"));
    }
}
