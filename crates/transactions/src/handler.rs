use crate::editor::{EditorAction, EditorState};
use crate::models::{RawCreateTransactionRequest, Transaction, TransactionKind};
use crate::service::{TransactionError, TransactionService};
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use categories::models::{first_day_of_month, Category, CategoryBudgetView};
use categories::service::CategoryService;
use categories::CategoryCache;
use chrono::{Months, NaiveDate};
use common::{auth::UserContext, AppState};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for TransactionError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            TransactionError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            TransactionError::NotFound => (StatusCode::NOT_FOUND, "Transaction not found".to_string()),
            TransactionError::Infrastructure(e) => {
                tracing::error!("Transaction infrastructure error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Template)]
#[template(path = "transactions.html")]
pub struct MonthViewTemplate {
    pub month: String,
    pub month_display: String,
    pub previous_month: String,
    pub next_month: String,
    pub overview: FinancialOverview,
    pub budget_rows: Vec<BudgetRowView>,
    pub transactions: Vec<TransactionView>,
    pub categories: Vec<Category>,
    pub editor: EditorForm,
}

pub struct FinancialOverview {
    pub total_income: String,
    pub total_expenses: String,
    pub net_balance: String,
    pub net_is_positive: bool,
}

pub struct BudgetRowView {
    pub category_name: String,
    pub category_color: String,
    pub limit_dollars: String,
    pub spent_dollars: String,
    pub remaining_dollars: String,
    pub percent_spent: String,
    pub bar_width: String,
    pub is_over_budget: bool,
    pub is_income: bool,
}

impl From<&CategoryBudgetView> for BudgetRowView {
    fn from(view: &CategoryBudgetView) -> Self {
        BudgetRowView {
            category_name: view.category.name.clone(),
            category_color: view.category.color.clone(),
            limit_dollars: dollars(view.limit()),
            spent_dollars: dollars(view.spent),
            remaining_dollars: dollars(view.remaining),
            percent_spent: format!("{:.0}", view.percent_spent),
            bar_width: format!("{:.0}", view.percent_spent.clamp(0.0, 100.0)),
            is_over_budget: view.is_over_budget(),
            is_income: view.category.is_income,
        }
    }
}

/// Create/edit form state rendered by the month view.
pub struct EditorForm {
    pub is_open: bool,
    pub title: String,
    pub action: String,
    pub delete_action: String, // empty unless editing
    pub close_url: String,
    pub description: String,
    pub amount_dollars: String,
    pub is_income: bool,
    pub category_id: i64, // 0 when uncategorized
    pub occurred_on: String,
}

impl EditorForm {
    fn closed(month: &str) -> Self {
        Self {
            is_open: false,
            title: String::new(),
            action: String::new(),
            delete_action: String::new(),
            close_url: EditorState::Closed.location(month),
            description: String::new(),
            amount_dollars: String::new(),
            is_income: false,
            category_id: 0,
            occurred_on: String::new(),
        }
    }

    fn creating(month: &str, default_date: NaiveDate) -> Self {
        Self {
            is_open: true,
            title: "New transaction".into(),
            action: "/transactions/add".into(),
            occurred_on: default_date.format("%Y-%m-%d").to_string(),
            ..Self::closed(month)
        }
    }

    fn editing(month: &str, t: &Transaction) -> Self {
        Self {
            is_open: true,
            title: "Edit transaction".into(),
            action: format!("/transactions/transaction/{}", t.id),
            delete_action: format!("/transactions/transaction/{}/delete", t.id),
            description: t.description.clone(),
            amount_dollars: format!("{:.2}", t.amount as f64 / 100.0),
            is_income: t.kind == TransactionKind::Income,
            category_id: t.category_id.unwrap_or(0),
            occurred_on: t.occurred_on.format("%Y-%m-%d").to_string(),
            ..Self::closed(month)
        }
    }
}

#[derive(Template)]
#[template(path = "transaction_row.html")]
pub struct TransactionRowTemplate {
    pub t: TransactionView,
}

pub struct TransactionView {
    pub id: i64,
    pub edit_url: String,
    pub description: String,
    pub category_name: String,
    pub category_color: String,
    pub occurred_on_display: String,
    pub amount_dollars: String,
    pub is_income: bool,
}

impl TransactionView {
    fn new(t: &Transaction, categories: &[Category], month: &str) -> Self {
        let color = t
            .category_id
            .and_then(|id| categories.iter().find(|c| c.id == id))
            .map(|c| c.color.clone())
            .unwrap_or_else(|| "#ffffff".to_string());

        TransactionView {
            id: t.id,
            edit_url: EditorState::Closed.apply(EditorAction::OpenEdit(t.id)).location(month),
            description: t.description.clone(),
            category_name: t.category.clone().unwrap_or_else(|| "Uncategorized".to_string()),
            category_color: color,
            occurred_on_display: t.occurred_on.format("%e %b %Y").to_string(),
            amount_dollars: dollars(t.amount),
            is_income: t.kind == TransactionKind::Income,
        }
    }
}

fn dollars(cents: i64) -> String {
    format!("{:.2}", cents as f64 / 100.0)
}

fn month_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

#[derive(Deserialize)]
pub struct MonthParam {
    pub month: String, // YYYY-MM
}

#[derive(Deserialize, Default)]
pub struct EditorQuery {
    #[serde(default)]
    pub new: bool,
    pub edit: Option<i64>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
}

pub fn transactions_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        // Specific routes first
        .route("/", get(current_month_redirect))
        .route("/add", post(create_transaction))
        .route("/api", get(list_transactions_api))
        // Then parameterized routes
        .route("/{month}", get(get_month_view))
        .route(
            "/transaction/{id}",
            post(update_transaction_form)
                .put(update_transaction)
                .delete(delete_transaction),
        )
        .route("/transaction/{id}/delete", post(delete_transaction_form))
        .with_state(state)
}

async fn current_month_redirect() -> Redirect {
    let month = chrono::Local::now().format("%Y-%m").to_string();
    Redirect::to(&EditorState::Closed.location(&month))
}

async fn get_month_view(
    State(state): State<Arc<AppState>>,
    Extension(cache): Extension<Arc<CategoryCache>>,
    user: UserContext,
    Path(params): Path<MonthParam>,
    Query(query): Query<EditorQuery>,
) -> Result<impl IntoResponse, TransactionError> {
    tracing::info!("Fetching month view for: {}", params.month);
    let first_day = first_day_of_month(&params.month).map_err(TransactionError::InvalidInput)?;
    let previous_month = month_of(first_day - Months::new(1));
    let next_month = month_of(first_day + Months::new(1));

    // Ensure budgets exist for this month (Auto-Copy logic)
    if let Err(e) = CategoryService::ensure_budgets_exist(&state.db, user.user_id, &params.month, &previous_month).await {
        tracing::warn!("Auto-copy budgets failed: {}. Continuing anyway.", e);
    }

    let (transactions, summary) = TransactionService::get_month_view(&state.db, user.user_id, &params.month)
        .await
        .map_err(|e| {
            tracing::error!("get_month_view error: {:?}", e);
            e
        })?;

    let budget_views = CategoryService::get_budget_view(&state.db, user.user_id, &params.month)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get budget view: {}", e);
            TransactionError::Infrastructure(e.to_string())
        })?;

    let categories = CategoryService::list_categories_cached(&state.db, &cache, user.user_id)
        .await
        .map_err(|e| TransactionError::Infrastructure(e.to_string()))?;

    // Enrich budget views with the month's actual totals
    let budget_rows = budget_views
        .into_iter()
        .map(|view| {
            let kind = if view.category.is_income { TransactionKind::Income } else { TransactionKind::Expense };
            let actual: i64 = transactions
                .iter()
                .filter(|t| t.category_id == Some(view.category.id) && t.kind == kind)
                .map(|t| t.amount)
                .sum();
            BudgetRowView::from(&view.with_spent(actual))
        })
        .collect();

    let editor = match EditorState::from_query(query.new, query.edit) {
        EditorState::Closed => EditorForm::closed(&params.month),
        EditorState::Creating => {
            let today = chrono::Local::now().date_naive();
            let default_date = if month_of(today) == params.month { today } else { first_day };
            EditorForm::creating(&params.month, default_date)
        }
        EditorState::Editing(id) => {
            let t = TransactionService::get_transaction(&state.db, user.user_id, id).await?;
            EditorForm::editing(&params.month, &t)
        }
    };

    let transaction_views = transactions
        .iter()
        .map(|t| TransactionView::new(t, &categories, &params.month))
        .collect();

    let overview = FinancialOverview {
        total_income: dollars(summary.total_income),
        total_expenses: dollars(summary.total_expenses),
        net_balance: dollars(summary.net),
        net_is_positive: summary.net >= 0,
    };

    let template = MonthViewTemplate {
        month_display: first_day.format("%B %Y").to_string(),
        month: params.month,
        previous_month,
        next_month,
        overview,
        budget_rows,
        transactions: transaction_views,
        categories,
        editor,
    };

    Ok(Html(template.render().map_err(|e| TransactionError::Infrastructure(e.to_string()))?))
}

async fn list_transactions_api(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Transaction>>, TransactionError> {
    let transactions =
        TransactionService::list_between(&state.db, user.user_id, query.start, query.end, query.kind).await?;
    Ok(Json(transactions))
}

async fn create_transaction(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Form(payload): Form<RawCreateTransactionRequest>,
) -> Result<impl IntoResponse, TransactionError> {
    let month = payload
        .occurred_on
        .get(0..7)
        .filter(|m| first_day_of_month(m).is_ok())
        .map(str::to_string)
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m").to_string());

    TransactionService::create_transaction(&state.db, user.user_id, payload)
        .await
        .map_err(|e| {
            tracing::error!("create_transaction error: {:?}", e);
            e
        })?;

    Ok(Redirect::to(&EditorState::Creating.apply(EditorAction::Saved).location(&month)))
}

async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Extension(cache): Extension<Arc<CategoryCache>>,
    user: UserContext,
    Path(id): Path<i64>,
    Json(payload): Json<RawCreateTransactionRequest>,
) -> Result<impl IntoResponse, TransactionError> {
    let transaction = TransactionService::update_transaction(&state.db, user.user_id, id, payload).await?;

    let categories = CategoryService::list_categories_cached(&state.db, &cache, user.user_id)
        .await
        .map_err(|e| TransactionError::Infrastructure(e.to_string()))?;

    let month = month_of(transaction.occurred_on);
    let template = TransactionRowTemplate {
        t: TransactionView::new(&transaction, &categories, &month),
    };
    Ok(Html(template.render().map_err(|e| TransactionError::Infrastructure(e.to_string()))?))
}

async fn update_transaction_form(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<i64>,
    Form(payload): Form<RawCreateTransactionRequest>,
) -> Result<impl IntoResponse, TransactionError> {
    let transaction = TransactionService::update_transaction(&state.db, user.user_id, id, payload).await?;
    let month = month_of(transaction.occurred_on);
    Ok(Redirect::to(&EditorState::Editing(id).apply(EditorAction::Saved).location(&month)))
}

async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, TransactionError> {
    TransactionService::delete_transaction(&state.db, user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_transaction_form(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, TransactionError> {
    let transaction = TransactionService::get_transaction(&state.db, user.user_id, id).await?;
    TransactionService::delete_transaction(&state.db, user.user_id, id).await?;

    let month = month_of(transaction.occurred_on);
    Ok(Redirect::to(&EditorState::Editing(id).apply(EditorAction::Deleted(id)).location(&month)))
}
