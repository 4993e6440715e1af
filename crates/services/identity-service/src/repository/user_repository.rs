//! User directory backed by PostgreSQL.

use async_trait::async_trait;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, Statement,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::{NewUser, PageQuery, Paginated, SortDirection, User, UserChanges};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User directory contract.
///
/// Lookups return `None` for a missing record; writes keyed by id fail with
/// `NotFound`. A duplicate email on create or update is a `Conflict`.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Save a new user; the directory assigns its id
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    /// Apply a partial update
    async fn update(&self, id: i64, changes: UserChanges) -> AppResult<User>;

    /// Permanently delete user
    async fn delete(&self, id: i64) -> AppResult<()>;

    /// List every user
    async fn list(&self) -> AppResult<Vec<User>>;

    /// Users whose name or email contains `term`, ignoring case
    async fn search(&self, term: &str) -> AppResult<Vec<User>>;

    /// One page of users ordered by creation date
    async fn paginate(&self, query: &PageQuery) -> AppResult<Paginated<User>>;

    /// Check the directory is reachable
    async fn ping(&self) -> AppResult<()>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Map a unique violation on the email column to `Conflict`.
fn map_write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict("Email"),
        _ => AppError::from(err),
    }
}

const LIKE_ESCAPE: char = '\\';

/// Escape LIKE metacharacters so the term matches literally.
fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '%' | '_' | '\\' => {
                out.push(LIKE_ESCAPE);
                out.push(ch);
            }
            c => out.push(c),
        }
    }
    out
}

fn like_contains(s: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", like_escape(s))).escape(LIKE_ESCAPE)
}

/// Case-insensitive substring match on name or email.
fn name_or_email_contains(term: &str) -> Condition {
    let term = term.to_lowercase();

    Condition::any()
        .add(Expr::expr(Func::lower(Expr::col(user::Column::Name))).like(like_contains(&term)))
        .add(Expr::expr(Func::lower(Expr::col(user::Column::Email))).like(like_contains(&term)))
}

#[async_trait]
impl UserRepository for UserStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let active_model = ActiveModel {
            name: Set(user.name),
            last_name: Set(user.last_name),
            phone_number: Set(user.phone_number),
            email: Set(user.email),
            password: Set(user.password_hash),
            is_active: Set(user.is_active),
            created_at: Set(user.created_at),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(map_write_error)?;
        Ok(User::from(model))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn update(&self, id: i64, changes: UserChanges) -> AppResult<User> {
        let user = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if changes.is_empty() {
            return Ok(User::from(user));
        }

        let mut active: ActiveModel = user.into();

        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(phone_number) = changes.phone_number {
            active.phone_number = Set(phone_number);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(password_hash) = changes.password_hash {
            active.password = Set(password_hash);
        }

        let model = active.update(&self.db).await.map_err(map_write_error)?;
        Ok(User::from(model))
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = UserEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(User::from).collect())
    }

    async fn search(&self, term: &str) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .filter(name_or_email_contains(term.trim()))
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(User::from).collect())
    }

    async fn paginate(&self, query: &PageQuery) -> AppResult<Paginated<User>> {
        let order = match query.sort {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };

        let mut select = UserEntity::find();
        if !query.is_unfiltered() {
            select = select.filter(name_or_email_contains(&query.name));
        }

        let paginator = select
            .order_by(user::Column::CreatedAt, order.clone())
            .order_by(user::Column::Id, order)
            .paginate(&self.db, query.limit);

        let total = paginator.num_items().await.map_err(AppError::from)?;

        // Pages past the end are empty without querying
        let models = match query.offset() {
            Some(offset) if offset < total => paginator
                .fetch_page(query.page - 1)
                .await
                .map_err(AppError::from)?,
            _ => Vec::new(),
        };

        Ok(Paginated::new(
            models.into_iter().map(User::from).collect(),
            query.page,
            query.limit,
            total,
        ))
    }

    async fn ping(&self) -> AppResult<()> {
        self.db
            .execute(Statement::from_string(
                self.db.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }
}
