//! PostgreSQL store over a bounded `sqlx` pool.
//!
//! ## Error Mapping
//!
//! | sqlx error | PostgreSQL code | StoreError |
//! |---|---|---|
//! | Database (unique violation) | `23505` | `Conflict` (message picked by constraint name) |
//! | Database (foreign key violation) | `23503` | `Validation` (parent not in the firm) |
//! | Database (check violation) | `23514` | `Validation` |
//! | Database (connection class) | `08*`, `53300`, `57P01` | `Unavailable` |
//! | PoolTimedOut / PoolClosed / Io | n/a | `Unavailable` |
//! | RowNotFound | n/a | `NotFound` |
//! | other | any | `Backend` |
//!
//! Multi-step writes run in one transaction. Parent rows are read with
//! `FOR SHARE`, and rows about to be updated or deleted with `FOR UPDATE`.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Executor, PgPool, Postgres, Row};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use juris_auth::{DirectoryError, Principal, PrincipalDirectory, PrincipalRecord, Role, TenantScope};
use juris_core::{
    CaseId, CasePartyId, ClientId, DocumentId, FinancialRecordId, HearingId, NoteId, Page,
    TaskId, UserId,
};
use juris_records::{
    Case, CaseDetail, CaseFilter, CaseMovement, CaseParty, CaseUpdate, Client, ClientFilter,
    ClientKind, ClientUpdate, ClientWithCases, Document, FinancialKind, FinancialRecord,
    FinancialRecordUpdate, Firm, FirmUpdate, Hearing, Money, Note, Task, TaskFilter, TaskStatus,
    TaskUpdate, User, UserUpdate,
};

use super::messages::*;
use super::stamped;
use super::{CaseRecordStore, CaseStore, ClientStore, FirmStore, TaskStore, UserStore};
use crate::config::DatabaseConfig;
use crate::{StoreError, StoreResult};

const SCHEMA: &str = include_str!("../../migrations/0001_schema.sql");

const FIRM_COLUMNS: &str = "id, name, cnpj, email, phone, created_at, updated_at";
const USER_COLUMNS: &str = "id, firm_id, name, email, role, is_active, created_at, updated_at";
const CLIENT_COLUMNS: &str =
    "id, firm_id, type, name, document, email, phone, address, state, created_at, updated_at";
const CASE_COLUMNS: &str = "id, firm_id, client_id, case_number, court, area, status, \
     distribution_date, value_cents, description, responsible_lawyer_id, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, firm_id, case_id, assigned_to, title, description, due_date, status, created_at";

/// SQL form of `juris_records::is_closed_status`.
const ACTIVE_CASE: &str =
    "(status IS NULL OR lower(btrim(status)) NOT IN ('arquivado', 'encerrado', 'finalizado'))";

const LOCK_CLIENT: &str = "SELECT 1 FROM clients WHERE id = $1 AND firm_id = $2 FOR SHARE";
const LOCK_CASE: &str = "SELECT 1 FROM cases WHERE id = $1 AND firm_id = $2 FOR SHARE";
const LOCK_USER: &str = "SELECT 1 FROM users WHERE id = $1 AND firm_id = $2 FOR SHARE";

/// Postgres-backed implementation of every store trait.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a bounded pool. Acquiring a connection waits at most
    /// `acquire_timeout`, after which operations fail with `Unavailable`.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        info!(
            max_connections = config.max_connections,
            acquire_timeout_secs = config.acquire_timeout.as_secs(),
            "postgres pool ready"
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create missing tables and indexes. Idempotent.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn begin(&self) -> StoreResult<sqlx::Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }

    async fn ensure_case_listable(&self, scope: &TenantScope, case_id: CaseId) -> StoreResult<()> {
        if locked(&self.pool, LOCK_CASE, case_id.into(), scope).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }
}

async fn commit(tx: sqlx::Transaction<'static, Postgres>) -> StoreResult<()> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit_transaction", e))
}

/// Whether the row `id` exists in the scope's firm, locking it with the
/// statement's lock clause.
async fn locked<'e, E>(executor: E, sql: &'static str, id: Uuid, scope: &TenantScope) -> StoreResult<bool>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(sql)
        .bind(id)
        .bind(scope.firm_id().as_uuid())
        .fetch_optional(executor)
        .await
        .map(|row| row.is_some())
        .map_err(|e| map_sqlx_error("check_parent", e))
}

async fn require_parent<'e, E>(
    executor: E,
    sql: &'static str,
    id: Option<Uuid>,
    scope: &TenantScope,
    missing: &str,
) -> StoreResult<()>
where
    E: Executor<'e, Database = Postgres>,
{
    let Some(id) = id else {
        return Ok(());
    };
    if locked(executor, sql, id, scope).await? {
        Ok(())
    } else {
        Err(StoreError::validation(missing))
    }
}

fn firm_uuid(scope: &TenantScope) -> Uuid {
    *scope.firm_id().as_uuid()
}

/// `ILIKE` pattern matching `term` as a literal substring.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    let mapped = match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(
                    match constraint.as_str() {
                        "law_firms_cnpj_key" => DUPLICATE_CNPJ,
                        "users_email_key" => DUPLICATE_EMAIL,
                        "clients_firm_document_key" => DUPLICATE_DOCUMENT,
                        _ => return StoreError::Conflict(msg),
                    }
                    .to_string(),
                ),
                Some("23503") => StoreError::Validation(
                    match constraint.as_str() {
                        "cases_client_fkey" => CLIENT_NOT_FOUND,
                        "cases_lawyer_fkey" => LAWYER_NOT_FOUND,
                        "tasks_assignee_fkey" => ASSIGNEE_NOT_FOUND,
                        c if c.ends_with("_case_fkey") => CASE_NOT_FOUND,
                        _ => return StoreError::Validation(msg),
                    }
                    .to_string(),
                ),
                Some("23514") => StoreError::Validation(msg),
                Some(code) if code.starts_with("08") || code == "53300" || code == "57P01" => {
                    StoreError::Unavailable(msg)
                }
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    };
    if matches!(mapped, StoreError::Unavailable(_) | StoreError::Backend(_)) {
        warn!(operation, error = %mapped, "store operation failed");
    }
    mapped
}

/// Row decoding. Records live in another crate, so these are plain functions
/// rather than `FromRow` impls.
mod read {
    use super::*;

    fn decode_err(msg: String) -> sqlx::Error {
        sqlx::Error::Decode(msg.into())
    }

    fn id<T: From<Uuid>>(row: &PgRow, column: &str) -> Result<T, sqlx::Error> {
        Ok(T::from(row.try_get::<Uuid, _>(column)?))
    }

    fn opt_id<T: From<Uuid>>(row: &PgRow, column: &str) -> Result<Option<T>, sqlx::Error> {
        Ok(row.try_get::<Option<Uuid>, _>(column)?.map(T::from))
    }

    pub fn firm(row: &PgRow) -> Result<Firm, sqlx::Error> {
        Ok(Firm {
            id: id(row, "id")?,
            name: row.try_get("name")?,
            cnpj: row.try_get("cnpj")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    pub fn user(row: &PgRow) -> Result<User, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(User {
            id: id(row, "id")?,
            firm_id: id(row, "firm_id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role: Role::from_str(&role).map_err(|e| decode_err(e.to_string()))?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    pub fn client(row: &PgRow) -> Result<Client, sqlx::Error> {
        let kind: String = row.try_get("type")?;
        Ok(Client {
            id: id(row, "id")?,
            firm_id: id(row, "firm_id")?,
            kind: ClientKind::parse(&kind)
                .ok_or_else(|| decode_err(format!("unknown client type {kind}")))?,
            name: row.try_get("name")?,
            document: row.try_get("document")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            state: row.try_get("state")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    pub fn case(row: &PgRow) -> Result<Case, sqlx::Error> {
        Ok(Case {
            id: id(row, "id")?,
            firm_id: id(row, "firm_id")?,
            client_id: id(row, "client_id")?,
            case_number: row.try_get("case_number")?,
            court: row.try_get("court")?,
            area: row.try_get("area")?,
            status: row.try_get("status")?,
            distribution_date: row.try_get("distribution_date")?,
            value: row
                .try_get::<Option<i64>, _>("value_cents")?
                .map(Money::from_cents),
            description: row.try_get("description")?,
            responsible_lawyer_id: opt_id(row, "responsible_lawyer_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    pub fn task(row: &PgRow) -> Result<Task, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(Task {
            id: id(row, "id")?,
            firm_id: id(row, "firm_id")?,
            case_id: opt_id(row, "case_id")?,
            assigned_to: opt_id(row, "assigned_to")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            due_date: row.try_get("due_date")?,
            status: TaskStatus::parse(&status)
                .ok_or_else(|| decode_err(format!("unknown task status {status}")))?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub fn party(row: &PgRow) -> Result<CaseParty, sqlx::Error> {
        Ok(CaseParty {
            id: id(row, "id")?,
            firm_id: id(row, "firm_id")?,
            case_id: id(row, "case_id")?,
            name: row.try_get("name")?,
            role: row.try_get("role")?,
            document: row.try_get("document")?,
        })
    }

    pub fn movement(row: &PgRow) -> Result<CaseMovement, sqlx::Error> {
        Ok(CaseMovement {
            id: id(row, "id")?,
            firm_id: id(row, "firm_id")?,
            case_id: id(row, "case_id")?,
            movement_date: row.try_get("movement_date")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub fn hearing(row: &PgRow) -> Result<Hearing, sqlx::Error> {
        Ok(Hearing {
            id: id(row, "id")?,
            firm_id: id(row, "firm_id")?,
            case_id: id(row, "case_id")?,
            hearing_date: row.try_get("hearing_date")?,
            kind: row.try_get("type")?,
            location: row.try_get("location")?,
            notes: row.try_get("notes")?,
        })
    }

    pub fn document(row: &PgRow) -> Result<Document, sqlx::Error> {
        Ok(Document {
            id: id(row, "id")?,
            firm_id: id(row, "firm_id")?,
            case_id: id(row, "case_id")?,
            uploaded_by: opt_id(row, "uploaded_by")?,
            file_name: row.try_get("file_name")?,
            file_url: row.try_get("file_url")?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub fn financial_record(row: &PgRow) -> Result<FinancialRecord, sqlx::Error> {
        let kind: String = row.try_get("type")?;
        Ok(FinancialRecord {
            id: id(row, "id")?,
            firm_id: id(row, "firm_id")?,
            case_id: id(row, "case_id")?,
            kind: FinancialKind::parse(&kind)
                .ok_or_else(|| decode_err(format!("unknown financial record type {kind}")))?,
            description: row.try_get("description")?,
            amount: Money::from_cents(row.try_get("amount_cents")?),
            due_date: row.try_get("due_date")?,
            paid_at: row.try_get("paid_at")?,
        })
    }

    pub fn note(row: &PgRow) -> Result<Note, sqlx::Error> {
        Ok(Note {
            id: id(row, "id")?,
            firm_id: id(row, "firm_id")?,
            case_id: id(row, "case_id")?,
            user_id: id(row, "user_id")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

fn decode_all<T>(
    operation: &str,
    rows: Vec<PgRow>,
    decode: fn(&PgRow) -> Result<T, sqlx::Error>,
) -> StoreResult<Vec<T>> {
    rows.iter()
        .map(|r| decode(r).map_err(|e| map_sqlx_error(operation, e)))
        .collect()
}

fn decode_one<T>(
    operation: &str,
    row: Option<PgRow>,
    decode: fn(&PgRow) -> Result<T, sqlx::Error>,
) -> StoreResult<T> {
    let row = row.ok_or(StoreError::NotFound)?;
    decode(&row).map_err(|e| map_sqlx_error(operation, e))
}

#[async_trait]
impl PrincipalDirectory for PgStore {
    #[instrument(skip(self), fields(user_id = %id))]
    async fn find_principal_by_id(&self, id: UserId) -> Result<Option<Principal>, DirectoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_principal_by_id", e))?;
        match row {
            Some(row) => Ok(Some(
                read::user(&row)
                    .map_err(|e| map_sqlx_error("find_principal_by_id", e))?
                    .principal(),
            )),
            None => Ok(None),
        }
    }

    #[instrument(skip_all)]
    async fn find_principal_by_email(
        &self,
        email: &str,
    ) -> Result<Option<PrincipalRecord>, DirectoryError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_principal_by_email", e))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let user = read::user(&row).map_err(|e| map_sqlx_error("find_principal_by_email", e))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| map_sqlx_error("find_principal_by_email", e))?;
        Ok(Some(PrincipalRecord {
            principal: user.principal(),
            password_hash,
        }))
    }
}

async fn insert_user<'e, E>(executor: E, user: &User, password_hash: &str) -> StoreResult<()>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO users (id, firm_id, name, email, password_hash, role, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(user.id.as_uuid())
    .bind(user.firm_id.as_uuid())
    .bind(&user.name)
    .bind(&user.email)
    .bind(password_hash)
    .bind(user.role.as_str())
    .bind(user.is_active)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(executor)
    .await
    .map_err(|e| map_sqlx_error("insert_user", e))?;
    Ok(())
}

#[async_trait]
impl FirmStore for PgStore {
    #[instrument(skip_all, fields(firm_id = %firm.id))]
    async fn create_firm_with_admin(
        &self,
        firm: Firm,
        admin: User,
        admin_password_hash: String,
    ) -> StoreResult<(Firm, User)> {
        stamped(&TenantScope::for_new_firm(firm.id), &admin)?;
        let mut tx = self.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO law_firms (id, name, cnpj, email, phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(firm.id.as_uuid())
        .bind(&firm.name)
        .bind(&firm.cnpj)
        .bind(&firm.email)
        .bind(&firm.phone)
        .bind(firm.created_at)
        .bind(firm.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_firm", e))?;

        insert_user(&mut *tx, &admin, &admin_password_hash).await?;
        commit(tx).await?;
        Ok((firm, admin))
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id()))]
    async fn get_firm(&self, scope: &TenantScope) -> StoreResult<Firm> {
        let row = sqlx::query(&format!("SELECT {FIRM_COLUMNS} FROM law_firms WHERE id = $1"))
            .bind(firm_uuid(scope))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_firm", e))?;
        decode_one("get_firm", row, read::firm)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id()))]
    async fn update_firm(
        &self,
        scope: &TenantScope,
        update: FirmUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Firm> {
        let mut tx = self.begin().await?;
        let row = sqlx::query(&format!(
            "SELECT {FIRM_COLUMNS} FROM law_firms WHERE id = $1 FOR UPDATE"
        ))
        .bind(firm_uuid(scope))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_firm", e))?;
        let mut firm = decode_one("update_firm", row, read::firm)?;
        firm.apply(update, now);

        sqlx::query(
            "UPDATE law_firms SET name = $2, email = $3, phone = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(firm.id.as_uuid())
        .bind(&firm.name)
        .bind(&firm.email)
        .bind(&firm.phone)
        .bind(firm.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_firm", e))?;
        commit(tx).await?;
        Ok(firm)
    }
}

#[async_trait]
impl UserStore for PgStore {
    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), user_id = %user.id))]
    async fn create_user(
        &self,
        scope: &TenantScope,
        user: User,
        password_hash: String,
    ) -> StoreResult<User> {
        stamped(scope, &user)?;
        insert_user(&self.pool, &user, &password_hash).await?;
        Ok(user)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), user_id = %id))]
    async fn get_user(&self, scope: &TenantScope, id: UserId) -> StoreResult<User> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND firm_id = $2"
        ))
        .bind(id.as_uuid())
        .bind(firm_uuid(scope))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_user", e))?;
        decode_one("get_user", row, read::user)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id()))]
    async fn list_users(&self, scope: &TenantScope, page: Page) -> StoreResult<Vec<User>> {
        let page = page.normalized();
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE firm_id = $1 ORDER BY name, id OFFSET $2 LIMIT $3"
        ))
        .bind(firm_uuid(scope))
        .bind(i64::from(page.skip))
        .bind(i64::from(page.limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;
        decode_all("list_users", rows, read::user)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), user_id = %id))]
    async fn update_user(
        &self,
        scope: &TenantScope,
        id: UserId,
        update: UserUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<User> {
        let mut tx = self.begin().await?;
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND firm_id = $2 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .bind(firm_uuid(scope))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        let mut user = decode_one("update_user", row, read::user)?;
        user.apply(update, now);

        sqlx::query(
            r#"
            UPDATE users
            SET name = $3, email = $4, role = $5, is_active = $6, updated_at = $7
            WHERE id = $1 AND firm_id = $2
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(firm_uuid(scope))
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        commit(tx).await?;
        Ok(user)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), user_id = %id))]
    async fn password_hash(&self, scope: &TenantScope, id: UserId) -> StoreResult<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM users WHERE id = $1 AND firm_id = $2",
        )
        .bind(id.as_uuid())
        .bind(firm_uuid(scope))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("password_hash", e))?
        .ok_or(StoreError::NotFound)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), user_id = %id))]
    async fn set_password_hash(
        &self,
        scope: &TenantScope,
        id: UserId,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $3, updated_at = $4 WHERE id = $1 AND firm_id = $2",
        )
        .bind(id.as_uuid())
        .bind(firm_uuid(scope))
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_password_hash", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

async fn select_client<'e, E>(
    executor: E,
    scope: &TenantScope,
    id: ClientId,
    lock: &str,
) -> StoreResult<Client>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&format!(
        "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1 AND firm_id = $2 {lock}"
    ))
    .bind(id.as_uuid())
    .bind(firm_uuid(scope))
    .fetch_optional(executor)
    .await
    .map_err(|e| map_sqlx_error("select_client", e))?;
    decode_one("select_client", row, read::client)
}

#[async_trait]
impl ClientStore for PgStore {
    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), client_id = %client.id))]
    async fn create_client(&self, scope: &TenantScope, client: Client) -> StoreResult<Client> {
        stamped(scope, &client)?;
        sqlx::query(
            r#"
            INSERT INTO clients (id, firm_id, type, name, document, email, phone, address, state, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(client.id.as_uuid())
        .bind(client.firm_id.as_uuid())
        .bind(client.kind.as_str())
        .bind(&client.name)
        .bind(&client.document)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(&client.state)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_client", e))?;
        Ok(client)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), client_id = %id))]
    async fn get_client(&self, scope: &TenantScope, id: ClientId) -> StoreResult<Client> {
        select_client(&self.pool, scope, id, "").await
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id()))]
    async fn list_clients(
        &self,
        scope: &TenantScope,
        filter: &ClientFilter,
        page: Page,
    ) -> StoreResult<Vec<Client>> {
        let page = page.normalized();
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CLIENT_COLUMNS} FROM clients
            WHERE firm_id = $1
              AND ($2::text IS NULL OR name ILIKE $2 OR document ILIKE $2 OR email ILIKE $2)
            ORDER BY name, id
            OFFSET $3 LIMIT $4
            "#
        ))
        .bind(firm_uuid(scope))
        .bind(filter.term().map(|t| like_pattern(&t)))
        .bind(i64::from(page.skip))
        .bind(i64::from(page.limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_clients", e))?;
        decode_all("list_clients", rows, read::client)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id()))]
    async fn list_clients_with_active_cases(
        &self,
        scope: &TenantScope,
        page: Page,
    ) -> StoreResult<Vec<ClientWithCases>> {
        let page = page.normalized();
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CLIENT_COLUMNS} FROM clients c
            WHERE c.firm_id = $1
              AND EXISTS (
                SELECT 1 FROM cases
                WHERE cases.client_id = c.id AND cases.firm_id = c.firm_id AND {ACTIVE_CASE}
              )
            ORDER BY c.name, c.id
            OFFSET $2 LIMIT $3
            "#
        ))
        .bind(firm_uuid(scope))
        .bind(i64::from(page.skip))
        .bind(i64::from(page.limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_clients_with_active_cases", e))?;
        let clients = decode_all("list_clients_with_active_cases", rows, read::client)?;

        let ids: Vec<Uuid> = clients.iter().map(|c| *c.id.as_uuid()).collect();
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CASE_COLUMNS} FROM cases
            WHERE firm_id = $1 AND client_id = ANY($2) AND {ACTIVE_CASE}
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(firm_uuid(scope))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_clients_with_active_cases", e))?;
        let cases = decode_all("list_clients_with_active_cases", rows, read::case)?;

        Ok(clients
            .into_iter()
            .map(|client| ClientWithCases {
                cases: cases
                    .iter()
                    .filter(|c| c.client_id == client.id)
                    .cloned()
                    .collect(),
                client,
            })
            .collect())
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), client_id = %id))]
    async fn update_client(
        &self,
        scope: &TenantScope,
        id: ClientId,
        update: ClientUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Client> {
        let mut tx = self.begin().await?;
        let mut client = select_client(&mut *tx, scope, id, "FOR UPDATE").await?;
        client.apply(update, now);

        sqlx::query(
            r#"
            UPDATE clients
            SET name = $3, email = $4, phone = $5, address = $6, state = $7, updated_at = $8
            WHERE id = $1 AND firm_id = $2
            "#,
        )
        .bind(client.id.as_uuid())
        .bind(firm_uuid(scope))
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(&client.state)
        .bind(client.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_client", e))?;
        commit(tx).await?;
        Ok(client)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), client_id = %id))]
    async fn delete_client(&self, scope: &TenantScope, id: ClientId) -> StoreResult<()> {
        let mut tx = self.begin().await?;
        select_client(&mut *tx, scope, id, "FOR UPDATE").await?;

        let has_active: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM cases WHERE client_id = $1 AND firm_id = $2 AND {ACTIVE_CASE})"
        ))
        .bind(id.as_uuid())
        .bind(firm_uuid(scope))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_client", e))?;
        if has_active {
            return Err(StoreError::conflict(CLIENT_HAS_ACTIVE_CASES));
        }

        for sql in [
            "UPDATE tasks SET case_id = NULL WHERE firm_id = $2 \
             AND case_id IN (SELECT id FROM cases WHERE client_id = $1 AND firm_id = $2)",
            "DELETE FROM cases WHERE client_id = $1 AND firm_id = $2",
            "DELETE FROM clients WHERE id = $1 AND firm_id = $2",
        ] {
            sqlx::query(sql)
                .bind(id.as_uuid())
                .bind(firm_uuid(scope))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("delete_client", e))?;
        }
        commit(tx).await
    }
}

async fn select_case<'e, E>(
    executor: E,
    scope: &TenantScope,
    id: CaseId,
    lock: &str,
) -> StoreResult<Case>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&format!(
        "SELECT {CASE_COLUMNS} FROM cases WHERE id = $1 AND firm_id = $2 {lock}"
    ))
    .bind(id.as_uuid())
    .bind(firm_uuid(scope))
    .fetch_optional(executor)
    .await
    .map_err(|e| map_sqlx_error("select_case", e))?;
    decode_one("select_case", row, read::case)
}

#[async_trait]
impl CaseStore for PgStore {
    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %case.id))]
    async fn create_case(&self, scope: &TenantScope, case: Case) -> StoreResult<Case> {
        stamped(scope, &case)?;
        let mut tx = self.begin().await?;
        require_parent(&mut *tx, LOCK_CLIENT, Some(case.client_id.into()), scope, CLIENT_NOT_FOUND)
            .await?;
        require_parent(
            &mut *tx,
            LOCK_USER,
            case.responsible_lawyer_id.map(Uuid::from),
            scope,
            LAWYER_NOT_FOUND,
        )
        .await?;

        sqlx::query(
            r#"
            INSERT INTO cases (
                id, firm_id, client_id, case_number, court, area, status, distribution_date,
                value_cents, description, responsible_lawyer_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(case.id.as_uuid())
        .bind(case.firm_id.as_uuid())
        .bind(case.client_id.as_uuid())
        .bind(&case.case_number)
        .bind(&case.court)
        .bind(&case.area)
        .bind(&case.status)
        .bind(case.distribution_date)
        .bind(case.value.map(|v| v.cents()))
        .bind(&case.description)
        .bind(case.responsible_lawyer_id.map(Uuid::from))
        .bind(case.created_at)
        .bind(case.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_case", e))?;
        commit(tx).await?;
        Ok(case)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %id))]
    async fn get_case(&self, scope: &TenantScope, id: CaseId) -> StoreResult<Case> {
        select_case(&self.pool, scope, id, "").await
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %id))]
    async fn case_detail(&self, scope: &TenantScope, id: CaseId) -> StoreResult<CaseDetail> {
        let case = select_case(&self.pool, scope, id, "").await?;
        let client = match select_client(&self.pool, scope, case.client_id, "").await {
            Ok(client) => Some(client),
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(e),
        };
        let responsible_lawyer = match case.responsible_lawyer_id {
            Some(uid) => match self.get_user(scope, uid).await {
                Ok(user) => Some(user),
                Err(StoreError::NotFound) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };
        let tasks = self
            .list_tasks(
                scope,
                &TaskFilter {
                    case_id: Some(id),
                    ..Default::default()
                },
                Page::new(0, Page::MAX_LIMIT),
            )
            .await?;

        let mut detail = CaseDetail::bare(case);
        detail.client = client;
        detail.responsible_lawyer = responsible_lawyer;
        detail.tasks = tasks;
        detail.case_parties = self.list_parties(scope, id).await?;
        detail.case_movements = self.list_movements(scope, id).await?;
        detail.hearings = self.list_hearings(scope, id).await?;
        detail.documents = self.list_documents(scope, id).await?;
        detail.financial_records = self.list_financial_records(scope, id).await?;
        detail.notes = self.list_notes(scope, id).await?;
        Ok(detail)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id()))]
    async fn list_cases(
        &self,
        scope: &TenantScope,
        filter: &CaseFilter,
        page: Page,
    ) -> StoreResult<Vec<Case>> {
        let page = page.normalized();
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CASE_COLUMNS} FROM cases
            WHERE firm_id = $1
              AND ($2::uuid IS NULL OR client_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC, id DESC
            OFFSET $4 LIMIT $5
            "#
        ))
        .bind(firm_uuid(scope))
        .bind(filter.client_id.map(Uuid::from))
        .bind(&filter.status)
        .bind(i64::from(page.skip))
        .bind(i64::from(page.limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_cases", e))?;
        decode_all("list_cases", rows, read::case)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %id))]
    async fn update_case(
        &self,
        scope: &TenantScope,
        id: CaseId,
        update: CaseUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Case> {
        let mut tx = self.begin().await?;
        let mut case = select_case(&mut *tx, scope, id, "FOR UPDATE").await?;
        require_parent(
            &mut *tx,
            LOCK_USER,
            update.responsible_lawyer_id.map(Uuid::from),
            scope,
            LAWYER_NOT_FOUND,
        )
        .await?;
        case.apply(update, now);

        sqlx::query(
            r#"
            UPDATE cases
            SET case_number = $3, court = $4, area = $5, status = $6, distribution_date = $7,
                value_cents = $8, description = $9, responsible_lawyer_id = $10, updated_at = $11
            WHERE id = $1 AND firm_id = $2
            "#,
        )
        .bind(case.id.as_uuid())
        .bind(firm_uuid(scope))
        .bind(&case.case_number)
        .bind(&case.court)
        .bind(&case.area)
        .bind(&case.status)
        .bind(case.distribution_date)
        .bind(case.value.map(|v| v.cents()))
        .bind(&case.description)
        .bind(case.responsible_lawyer_id.map(Uuid::from))
        .bind(case.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_case", e))?;
        commit(tx).await?;
        Ok(case)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %id))]
    async fn delete_case(&self, scope: &TenantScope, id: CaseId) -> StoreResult<()> {
        let mut tx = self.begin().await?;
        select_case(&mut *tx, scope, id, "FOR UPDATE").await?;
        for sql in [
            "UPDATE tasks SET case_id = NULL WHERE case_id = $1 AND firm_id = $2",
            "DELETE FROM cases WHERE id = $1 AND firm_id = $2",
        ] {
            sqlx::query(sql)
                .bind(id.as_uuid())
                .bind(firm_uuid(scope))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("delete_case", e))?;
        }
        commit(tx).await
    }
}

impl PgStore {
    /// Insert a case sub-record after locking its case.
    async fn insert_child(
        &self,
        operation: &str,
        scope: &TenantScope,
        case_id: CaseId,
        query: sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments>,
    ) -> StoreResult<()> {
        let mut tx = self.begin().await?;
        require_parent(&mut *tx, LOCK_CASE, Some(case_id.into()), scope, CASE_NOT_FOUND).await?;
        query
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        commit(tx).await
    }

    async fn list_children<T>(
        &self,
        operation: &str,
        table: &str,
        columns: &str,
        order: &str,
        scope: &TenantScope,
        case_id: CaseId,
        decode: fn(&PgRow) -> Result<T, sqlx::Error>,
    ) -> StoreResult<Vec<T>> {
        self.ensure_case_listable(scope, case_id).await?;
        let rows = sqlx::query(&format!(
            "SELECT {columns} FROM {table} WHERE case_id = $1 AND firm_id = $2 ORDER BY {order}"
        ))
        .bind(case_id.as_uuid())
        .bind(firm_uuid(scope))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;
        decode_all(operation, rows, decode)
    }

    async fn delete_child(
        &self,
        operation: &str,
        table: &str,
        scope: &TenantScope,
        case_id: CaseId,
        id: Uuid,
    ) -> StoreResult<()> {
        let result = sqlx::query(&format!(
            "DELETE FROM {table} WHERE id = $1 AND case_id = $2 AND firm_id = $3"
        ))
        .bind(id)
        .bind(case_id.as_uuid())
        .bind(firm_uuid(scope))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CaseRecordStore for PgStore {
    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %party.case_id))]
    async fn add_party(&self, scope: &TenantScope, party: CaseParty) -> StoreResult<CaseParty> {
        stamped(scope, &party)?;
        let query = sqlx::query(
            "INSERT INTO case_parties (id, firm_id, case_id, name, role, document) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*party.id.as_uuid())
        .bind(*party.firm_id.as_uuid())
        .bind(*party.case_id.as_uuid())
        .bind(party.name.clone())
        .bind(party.role.clone())
        .bind(party.document.clone());
        self.insert_child("add_party", scope, party.case_id, query).await?;
        Ok(party)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %case_id))]
    async fn list_parties(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
    ) -> StoreResult<Vec<CaseParty>> {
        self.list_children(
            "list_parties",
            "case_parties",
            "id, firm_id, case_id, name, role, document",
            "name, id",
            scope,
            case_id,
            read::party,
        )
        .await
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %case_id))]
    async fn delete_party(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: CasePartyId,
    ) -> StoreResult<()> {
        self.delete_child("delete_party", "case_parties", scope, case_id, id.into())
            .await
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %movement.case_id))]
    async fn add_movement(
        &self,
        scope: &TenantScope,
        movement: CaseMovement,
    ) -> StoreResult<CaseMovement> {
        stamped(scope, &movement)?;
        let query = sqlx::query(
            "INSERT INTO case_movements (id, firm_id, case_id, movement_date, description, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*movement.id.as_uuid())
        .bind(*movement.firm_id.as_uuid())
        .bind(*movement.case_id.as_uuid())
        .bind(movement.movement_date)
        .bind(movement.description.clone())
        .bind(movement.created_at);
        self.insert_child("add_movement", scope, movement.case_id, query).await?;
        Ok(movement)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %case_id))]
    async fn list_movements(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
    ) -> StoreResult<Vec<CaseMovement>> {
        self.list_children(
            "list_movements",
            "case_movements",
            "id, firm_id, case_id, movement_date, description, created_at",
            "movement_date DESC, created_at DESC, id DESC",
            scope,
            case_id,
            read::movement,
        )
        .await
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %hearing.case_id))]
    async fn add_hearing(&self, scope: &TenantScope, hearing: Hearing) -> StoreResult<Hearing> {
        stamped(scope, &hearing)?;
        let query = sqlx::query(
            "INSERT INTO hearings (id, firm_id, case_id, hearing_date, type, location, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(*hearing.id.as_uuid())
        .bind(*hearing.firm_id.as_uuid())
        .bind(*hearing.case_id.as_uuid())
        .bind(hearing.hearing_date)
        .bind(hearing.kind.clone())
        .bind(hearing.location.clone())
        .bind(hearing.notes.clone());
        self.insert_child("add_hearing", scope, hearing.case_id, query).await?;
        Ok(hearing)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %case_id))]
    async fn list_hearings(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
    ) -> StoreResult<Vec<Hearing>> {
        self.list_children(
            "list_hearings",
            "hearings",
            "id, firm_id, case_id, hearing_date, type, location, notes",
            "hearing_date, id",
            scope,
            case_id,
            read::hearing,
        )
        .await
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %case_id))]
    async fn delete_hearing(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: HearingId,
    ) -> StoreResult<()> {
        self.delete_child("delete_hearing", "hearings", scope, case_id, id.into())
            .await
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %document.case_id))]
    async fn add_document(
        &self,
        scope: &TenantScope,
        document: Document,
    ) -> StoreResult<Document> {
        stamped(scope, &document)?;
        let query = sqlx::query(
            "INSERT INTO documents (id, firm_id, case_id, uploaded_by, file_name, file_url, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(*document.id.as_uuid())
        .bind(*document.firm_id.as_uuid())
        .bind(*document.case_id.as_uuid())
        .bind(document.uploaded_by.map(Uuid::from))
        .bind(document.file_name.clone())
        .bind(document.file_url.clone())
        .bind(document.created_at);
        self.insert_child("add_document", scope, document.case_id, query).await?;
        Ok(document)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %case_id))]
    async fn list_documents(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
    ) -> StoreResult<Vec<Document>> {
        self.list_children(
            "list_documents",
            "documents",
            "id, firm_id, case_id, uploaded_by, file_name, file_url, created_at",
            "created_at DESC, id DESC",
            scope,
            case_id,
            read::document,
        )
        .await
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %case_id))]
    async fn delete_document(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: DocumentId,
    ) -> StoreResult<()> {
        self.delete_child("delete_document", "documents", scope, case_id, id.into())
            .await
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %record.case_id))]
    async fn add_financial_record(
        &self,
        scope: &TenantScope,
        record: FinancialRecord,
    ) -> StoreResult<FinancialRecord> {
        stamped(scope, &record)?;
        let query = sqlx::query(
            "INSERT INTO financial_records (id, firm_id, case_id, type, description, amount_cents, due_date, paid_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(*record.id.as_uuid())
        .bind(*record.firm_id.as_uuid())
        .bind(*record.case_id.as_uuid())
        .bind(record.kind.as_str())
        .bind(record.description.clone())
        .bind(record.amount.cents())
        .bind(record.due_date)
        .bind(record.paid_at);
        self.insert_child("add_financial_record", scope, record.case_id, query)
            .await?;
        Ok(record)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %case_id))]
    async fn list_financial_records(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
    ) -> StoreResult<Vec<FinancialRecord>> {
        self.list_children(
            "list_financial_records",
            "financial_records",
            "id, firm_id, case_id, type, description, amount_cents, due_date, paid_at",
            "due_date ASC NULLS LAST, id",
            scope,
            case_id,
            read::financial_record,
        )
        .await
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %case_id))]
    async fn update_financial_record(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: FinancialRecordId,
        update: FinancialRecordUpdate,
    ) -> StoreResult<FinancialRecord> {
        let mut tx = self.begin().await?;
        let row = sqlx::query(
            r#"
            SELECT id, firm_id, case_id, type, description, amount_cents, due_date, paid_at
            FROM financial_records
            WHERE id = $1 AND case_id = $2 AND firm_id = $3
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .bind(case_id.as_uuid())
        .bind(firm_uuid(scope))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_financial_record", e))?;
        let mut record = decode_one("update_financial_record", row, read::financial_record)?;
        record.apply(update);

        sqlx::query(
            r#"
            UPDATE financial_records
            SET description = $4, amount_cents = $5, due_date = $6, paid_at = $7
            WHERE id = $1 AND case_id = $2 AND firm_id = $3
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(case_id.as_uuid())
        .bind(firm_uuid(scope))
        .bind(&record.description)
        .bind(record.amount.cents())
        .bind(record.due_date)
        .bind(record.paid_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_financial_record", e))?;
        commit(tx).await?;
        Ok(record)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %case_id))]
    async fn delete_financial_record(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: FinancialRecordId,
    ) -> StoreResult<()> {
        self.delete_child(
            "delete_financial_record",
            "financial_records",
            scope,
            case_id,
            id.into(),
        )
        .await
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %note.case_id))]
    async fn add_note(&self, scope: &TenantScope, note: Note) -> StoreResult<Note> {
        stamped(scope, &note)?;
        let query = sqlx::query(
            "INSERT INTO notes (id, firm_id, case_id, user_id, content, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*note.id.as_uuid())
        .bind(*note.firm_id.as_uuid())
        .bind(*note.case_id.as_uuid())
        .bind(*note.user_id.as_uuid())
        .bind(note.content.clone())
        .bind(note.created_at);
        self.insert_child("add_note", scope, note.case_id, query).await?;
        Ok(note)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %case_id))]
    async fn list_notes(&self, scope: &TenantScope, case_id: CaseId) -> StoreResult<Vec<Note>> {
        self.list_children(
            "list_notes",
            "notes",
            "id, firm_id, case_id, user_id, content, created_at",
            "created_at DESC, id DESC",
            scope,
            case_id,
            read::note,
        )
        .await
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), case_id = %case_id))]
    async fn delete_note(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: NoteId,
    ) -> StoreResult<()> {
        self.delete_child("delete_note", "notes", scope, case_id, id.into())
            .await
    }
}

async fn select_task<'e, E>(
    executor: E,
    scope: &TenantScope,
    id: TaskId,
    lock: &str,
) -> StoreResult<Task>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND firm_id = $2 {lock}"
    ))
    .bind(id.as_uuid())
    .bind(firm_uuid(scope))
    .fetch_optional(executor)
    .await
    .map_err(|e| map_sqlx_error("select_task", e))?;
    decode_one("select_task", row, read::task)
}

#[async_trait]
impl TaskStore for PgStore {
    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), task_id = %task.id))]
    async fn create_task(&self, scope: &TenantScope, task: Task) -> StoreResult<Task> {
        stamped(scope, &task)?;
        let mut tx = self.begin().await?;
        require_parent(&mut *tx, LOCK_CASE, task.case_id.map(Uuid::from), scope, CASE_NOT_FOUND)
            .await?;
        require_parent(
            &mut *tx,
            LOCK_USER,
            task.assigned_to.map(Uuid::from),
            scope,
            ASSIGNEE_NOT_FOUND,
        )
        .await?;

        sqlx::query(
            r#"
            INSERT INTO tasks (id, firm_id, case_id, assigned_to, title, description, due_date, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(task.id.as_uuid())
        .bind(task.firm_id.as_uuid())
        .bind(task.case_id.map(Uuid::from))
        .bind(task.assigned_to.map(Uuid::from))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.status.as_str())
        .bind(task.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_task", e))?;
        commit(tx).await?;
        Ok(task)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), task_id = %id))]
    async fn get_task(&self, scope: &TenantScope, id: TaskId) -> StoreResult<Task> {
        select_task(&self.pool, scope, id, "").await
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id()))]
    async fn list_tasks(
        &self,
        scope: &TenantScope,
        filter: &TaskFilter,
        page: Page,
    ) -> StoreResult<Vec<Task>> {
        let page = page.normalized();
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE firm_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR case_id = $3)
              AND ($4::uuid IS NULL OR assigned_to = $4)
            ORDER BY due_date ASC NULLS LAST, created_at ASC, id ASC
            OFFSET $5 LIMIT $6
            "#
        ))
        .bind(firm_uuid(scope))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.case_id.map(Uuid::from))
        .bind(filter.assigned_to.map(Uuid::from))
        .bind(i64::from(page.skip))
        .bind(i64::from(page.limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tasks", e))?;
        decode_all("list_tasks", rows, read::task)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), task_id = %id))]
    async fn update_task(
        &self,
        scope: &TenantScope,
        id: TaskId,
        update: TaskUpdate,
    ) -> StoreResult<Task> {
        let mut tx = self.begin().await?;
        let mut task = select_task(&mut *tx, scope, id, "FOR UPDATE").await?;
        require_parent(
            &mut *tx,
            LOCK_USER,
            update.assigned_to.map(Uuid::from),
            scope,
            ASSIGNEE_NOT_FOUND,
        )
        .await?;
        task.apply(update);

        sqlx::query(
            r#"
            UPDATE tasks
            SET title = $3, description = $4, due_date = $5, status = $6, assigned_to = $7
            WHERE id = $1 AND firm_id = $2
            "#,
        )
        .bind(task.id.as_uuid())
        .bind(firm_uuid(scope))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.status.as_str())
        .bind(task.assigned_to.map(Uuid::from))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_task", e))?;
        commit(tx).await?;
        Ok(task)
    }

    #[instrument(skip_all, fields(firm_id = %scope.firm_id(), task_id = %id))]
    async fn delete_task(&self, scope: &TenantScope, id: TaskId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND firm_id = $2")
            .bind(id.as_uuid())
            .bind(firm_uuid(scope))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_task", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
