use crate::budget_repository::MonthlyBudgetRepository;
use crate::models::{Category, CategoryBudgetView, CreateCategoryRequest, CreateMonthlyBudgetRequest};
use crate::repository::CategoryRepository;
use crate::CategoryCache;
use database::{Database, RepositoryError};
use rand::seq::SliceRandom;
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Category already exists: {0}")]
    Conflict(String),
    #[error("Category not found")]
    NotFound,
}

impl From<RepositoryError> for CategoryError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => CategoryError::NotFound,
            RepositoryError::UniqueViolation(msg) => CategoryError::Conflict(msg),
            RepositoryError::CheckViolation(msg) => CategoryError::InvalidInput(msg),
            RepositoryError::Infrastructure(e) => CategoryError::Infrastructure(e.to_string()),
            _ => CategoryError::Infrastructure(err.to_string()),
        }
    }
}

pub const PASTEL_COLORS: [&str; 20] = [
    "#FFB3BA", "#FFDFBA", "#FFFFBA", "#BAFFC9", "#BAE1FF",
    "#E2F0CB", "#FDFD96", "#FFC3A0", "#FFD1DC", "#D4F0F0",
    "#CCE2CB", "#B6CFB6", "#97C1A9", "#FCB7AF", "#FFDAC1",
    "#E7FFAC", "#FFABAB", "#D5AAFF", "#85E3FF", "#B9F6CA",
];

pub struct CategoryService;

impl CategoryService {
    fn get_random_pastel_color() -> String {
        let mut rng = rand::thread_rng();
        PASTEL_COLORS.choose(&mut rng).unwrap_or(&"#FFFFFF").to_string()
    }

    pub async fn create_category(
        db: &Database,
        user_id: i64,
        name: String,
        is_income: bool,
    ) -> Result<i64, CategoryError> {
        Self::create_category_with_budget(db, user_id, name, is_income, String::new(), None).await
    }

    /// Creates a category and, when `monthly_limit` is given, its budget for
    /// `month`. Both rows are written in one unit of work.
    #[instrument(skip(db))]
    pub async fn create_category_with_budget(
        db: &Database,
        user_id: i64,
        name: String,
        is_income: bool,
        month: String,
        monthly_limit: Option<f64>,
    ) -> Result<i64, CategoryError> {
        let color = Self::get_random_pastel_color();
        let req = CreateCategoryRequest::new(name, color, is_income)
            .map_err(CategoryError::InvalidInput)?;

        let mut uow = db.begin().await?;

        let mut repo = CategoryRepository::new(uow.connection());
        let id = repo.create(user_id, &req).await?;

        if let Some(limit) = monthly_limit {
            let budget = CreateMonthlyBudgetRequest::new(id, month, limit)
                .map_err(CategoryError::InvalidInput)?;
            let mut budget_repo = MonthlyBudgetRepository::new(uow.connection());
            budget_repo.upsert(user_id, &budget).await?;
        }

        uow.commit().await?;

        Ok(id)
    }

    #[instrument(skip(db))]
    pub async fn update_category(
        db: &Database,
        user_id: i64,
        id: i64,
        name: String,
        color: Option<String>,
        is_income: bool,
        is_active: bool,
    ) -> Result<(), CategoryError> {
        if name.trim().is_empty() {
            return Err(CategoryError::InvalidInput("Category name cannot be empty".into()));
        }

        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        repo.update(user_id, id, name.trim(), color.as_deref(), is_income, is_active).await?;

        uow.commit().await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn delete_category(db: &Database, user_id: i64, id: i64) -> Result<(), CategoryError> {
        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        repo.delete(user_id, id).await?;

        uow.commit().await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn set_budget(
        db: &Database,
        user_id: i64,
        category_id: i64,
        month: String,
        amount_dollars: f64,
    ) -> Result<i64, CategoryError> {
        let req = CreateMonthlyBudgetRequest::new(category_id, month, amount_dollars)
            .map_err(CategoryError::InvalidInput)?;

        let mut uow = db.begin().await?;

        // Budgets may only reference the user's own categories
        let mut cat_repo = CategoryRepository::new(uow.connection());
        cat_repo.find_by_id(user_id, category_id).await?
            .ok_or(CategoryError::NotFound)?;

        let mut repo = MonthlyBudgetRepository::new(uow.connection());
        let id = repo.upsert(user_id, &req).await?;

        uow.commit().await?;
        Ok(id)
    }

    #[instrument(skip(db))]
    pub async fn delete_budget(db: &Database, user_id: i64, id: i64) -> Result<(), CategoryError> {
        let mut uow = db.begin().await?;
        let mut repo = MonthlyBudgetRepository::new(uow.connection());

        repo.delete(user_id, id).await?;

        uow.commit().await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn list_categories(db: &Database, user_id: i64) -> Result<Vec<Category>, CategoryError> {
        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        let categories = repo.list(user_id).await?;

        Ok(categories)
    }

    /// Like [`CategoryService::list_categories`], served from `cache` while fresh.
    #[instrument(skip(db, cache))]
    pub async fn list_categories_cached(
        db: &Database,
        cache: &CategoryCache,
        user_id: i64,
    ) -> Result<Vec<Category>, CategoryError> {
        if let Some(categories) = cache.get(&user_id) {
            return Ok(categories);
        }

        let categories = Self::list_categories(db, user_id).await?;
        cache.insert(user_id, categories.clone());
        Ok(categories)
    }

    #[instrument(skip(db))]
    pub async fn get_category(db: &Database, user_id: i64, id: i64) -> Result<Category, CategoryError> {
        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        let category = repo.find_by_id(user_id, id).await?
            .ok_or(CategoryError::NotFound)?;

        Ok(category)
    }

    #[instrument(skip(db))]
    pub async fn get_budget_view(db: &Database, user_id: i64, month: &str) -> Result<Vec<CategoryBudgetView>, CategoryError> {
        tracing::debug!("get_budget_view called for month: {}", month);
        let mut uow = db.begin().await?;

        let mut cat_repo = CategoryRepository::new(uow.connection());
        let categories = cat_repo.list(user_id).await.map_err(|e| {
            tracing::error!("Failed to list categories: {}", e);
            CategoryError::from(e)
        })?;

        let mut budget_repo = MonthlyBudgetRepository::new(uow.connection());
        let budgets = budget_repo.get_for_month(user_id, month).await.map_err(|e| {
            tracing::error!("Failed to get budgets for month: {}", e);
            CategoryError::from(e)
        })?;

        let views = categories
            .into_iter()
            .filter_map(|cat| {
                let budget = budgets.iter().find(|b| b.category_id == cat.id).cloned();
                // Only include if active OR has a budget for this month
                (cat.is_active || budget.is_some()).then(|| CategoryBudgetView::new(cat, budget))
            })
            .collect();

        Ok(views)
    }

    #[instrument(skip(db))]
    pub async fn ensure_budgets_exist(
        db: &Database,
        user_id: i64,
        current_month: &str,
        previous_month: &str,
    ) -> Result<u64, CategoryError> {
        let mut uow = db.begin().await?;
        let mut repo = MonthlyBudgetRepository::new(uow.connection());

        let copied = repo.copy_budgets(user_id, previous_month, current_month).await?;
        if copied > 0 {
            tracing::info!("Copied {} budgets from {} into {}", copied, previous_month, current_month);
        }

        uow.commit().await?;
        Ok(copied)
    }
}
