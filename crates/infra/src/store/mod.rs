//! Storage boundary.
//!
//! Every operation on tenant-owned rows takes a [`TenantScope`]; lookups
//! filter on it and writes stamp it. There is no way to name a firm's rows
//! without one. Two implementations exist: [`MemoryStore`] for tests and
//! local development, and [`PgStore`] for PostgreSQL.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use juris_auth::{PrincipalDirectory, TenantScope};
use juris_core::{
    CaseId, CaseMovementId, CasePartyId, ClientId, DocumentId, FinancialRecordId, FirmOwned,
    HearingId, NoteId, Page, TaskId, UserId,
};
use juris_records::{
    Case, CaseDetail, CaseFilter, CaseMovement, CaseParty, CaseUpdate, Client, ClientFilter,
    ClientUpdate, ClientWithCases, Document, FinancialRecord, FinancialRecordUpdate, Firm,
    FirmUpdate, Hearing, Note, Task, TaskFilter, TaskUpdate, User, UserUpdate,
};

use crate::{StoreError, StoreResult};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Conflict messages shared by both backends.
pub(crate) mod messages {
    pub const DUPLICATE_CNPJ: &str = "CNPJ já cadastrado";
    pub const DUPLICATE_EMAIL: &str = "Email já registrado";
    pub const DUPLICATE_DOCUMENT: &str = "Documento já cadastrado neste escritório";
    pub const CLIENT_HAS_ACTIVE_CASES: &str =
        "Cliente não pode ser removido pois possui processos ativos";
    pub const CLIENT_NOT_FOUND: &str = "client not found";
    pub const CASE_NOT_FOUND: &str = "case not found";
    pub const LAWYER_NOT_FOUND: &str = "responsible lawyer not found";
    pub const ASSIGNEE_NOT_FOUND: &str = "assigned user not found";
}

#[async_trait]
pub trait FirmStore: Send + Sync {
    /// Persist a new firm together with its first admin, atomically.
    ///
    /// `admin.firm_id` must be `firm.id`.
    async fn create_firm_with_admin(
        &self,
        firm: Firm,
        admin: User,
        admin_password_hash: String,
    ) -> StoreResult<(Firm, User)>;

    /// The scope's own firm.
    async fn get_firm(&self, scope: &TenantScope) -> StoreResult<Firm>;

    async fn update_firm(
        &self,
        scope: &TenantScope,
        update: FirmUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Firm>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `user.firm_id` must equal the scope's firm.
    async fn create_user(
        &self,
        scope: &TenantScope,
        user: User,
        password_hash: String,
    ) -> StoreResult<User>;

    async fn get_user(&self, scope: &TenantScope, id: UserId) -> StoreResult<User>;

    async fn list_users(&self, scope: &TenantScope, page: Page) -> StoreResult<Vec<User>>;

    async fn update_user(
        &self,
        scope: &TenantScope,
        id: UserId,
        update: UserUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<User>;

    async fn password_hash(&self, scope: &TenantScope, id: UserId) -> StoreResult<String>;

    async fn set_password_hash(
        &self,
        scope: &TenantScope,
        id: UserId,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;
}

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn create_client(&self, scope: &TenantScope, client: Client) -> StoreResult<Client>;

    async fn get_client(&self, scope: &TenantScope, id: ClientId) -> StoreResult<Client>;

    /// Ordered by name.
    async fn list_clients(
        &self,
        scope: &TenantScope,
        filter: &ClientFilter,
        page: Page,
    ) -> StoreResult<Vec<Client>>;

    /// Clients with at least one active case, each carrying only its active
    /// cases. Ordered by name.
    async fn list_clients_with_active_cases(
        &self,
        scope: &TenantScope,
        page: Page,
    ) -> StoreResult<Vec<ClientWithCases>>;

    async fn update_client(
        &self,
        scope: &TenantScope,
        id: ClientId,
        update: ClientUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Client>;

    /// Refused with `Conflict` while the client has active cases. Closed
    /// cases are removed with the client.
    async fn delete_client(&self, scope: &TenantScope, id: ClientId) -> StoreResult<()>;
}

#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Fails with `Validation` when the client or responsible lawyer is not
    /// in the scope.
    async fn create_case(&self, scope: &TenantScope, case: Case) -> StoreResult<Case>;

    async fn get_case(&self, scope: &TenantScope, id: CaseId) -> StoreResult<Case>;

    async fn case_detail(&self, scope: &TenantScope, id: CaseId) -> StoreResult<CaseDetail>;

    /// Newest first.
    async fn list_cases(
        &self,
        scope: &TenantScope,
        filter: &CaseFilter,
        page: Page,
    ) -> StoreResult<Vec<Case>>;

    async fn update_case(
        &self,
        scope: &TenantScope,
        id: CaseId,
        update: CaseUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Case>;

    /// Removes the case with its sub-records; tasks are detached.
    async fn delete_case(&self, scope: &TenantScope, id: CaseId) -> StoreResult<()>;
}

/// Records hanging off a case. Creation fails with `Validation` when the
/// case is not in the scope; listing fails with `NotFound`.
#[async_trait]
pub trait CaseRecordStore: Send + Sync {
    async fn add_party(&self, scope: &TenantScope, party: CaseParty) -> StoreResult<CaseParty>;
    async fn list_parties(&self, scope: &TenantScope, case_id: CaseId)
    -> StoreResult<Vec<CaseParty>>;
    async fn delete_party(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: CasePartyId,
    ) -> StoreResult<()>;

    async fn add_movement(
        &self,
        scope: &TenantScope,
        movement: CaseMovement,
    ) -> StoreResult<CaseMovement>;
    async fn list_movements(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
    ) -> StoreResult<Vec<CaseMovement>>;

    async fn add_hearing(&self, scope: &TenantScope, hearing: Hearing) -> StoreResult<Hearing>;
    async fn list_hearings(&self, scope: &TenantScope, case_id: CaseId)
    -> StoreResult<Vec<Hearing>>;
    async fn delete_hearing(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: HearingId,
    ) -> StoreResult<()>;

    async fn add_document(&self, scope: &TenantScope, document: Document)
    -> StoreResult<Document>;
    async fn list_documents(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
    ) -> StoreResult<Vec<Document>>;
    async fn delete_document(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: DocumentId,
    ) -> StoreResult<()>;

    async fn add_financial_record(
        &self,
        scope: &TenantScope,
        record: FinancialRecord,
    ) -> StoreResult<FinancialRecord>;
    async fn list_financial_records(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
    ) -> StoreResult<Vec<FinancialRecord>>;
    async fn update_financial_record(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: FinancialRecordId,
        update: FinancialRecordUpdate,
    ) -> StoreResult<FinancialRecord>;
    async fn delete_financial_record(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: FinancialRecordId,
    ) -> StoreResult<()>;

    async fn add_note(&self, scope: &TenantScope, note: Note) -> StoreResult<Note>;
    async fn list_notes(&self, scope: &TenantScope, case_id: CaseId) -> StoreResult<Vec<Note>>;
    async fn delete_note(&self, scope: &TenantScope, case_id: CaseId, id: NoteId)
    -> StoreResult<()>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fails with `Validation` when the case or assignee is not in the scope.
    async fn create_task(&self, scope: &TenantScope, task: Task) -> StoreResult<Task>;

    async fn get_task(&self, scope: &TenantScope, id: TaskId) -> StoreResult<Task>;

    /// By due date (undated last), then creation.
    async fn list_tasks(
        &self,
        scope: &TenantScope,
        filter: &TaskFilter,
        page: Page,
    ) -> StoreResult<Vec<Task>>;

    async fn update_task(
        &self,
        scope: &TenantScope,
        id: TaskId,
        update: TaskUpdate,
    ) -> StoreResult<Task>;

    async fn delete_task(&self, scope: &TenantScope, id: TaskId) -> StoreResult<()>;
}

/// Refuse a record whose `firm_id` is not the scope's.
pub(crate) fn stamped<T: FirmOwned>(scope: &TenantScope, record: &T) -> StoreResult<()> {
    if scope.contains(record) {
        Ok(())
    } else {
        Err(StoreError::validation("record is stamped with another firm"))
    }
}

/// Everything the HTTP layer needs from storage.
pub trait Store:
    FirmStore + UserStore + ClientStore + CaseStore + CaseRecordStore + TaskStore + PrincipalDirectory
{
}

impl<T> Store for T where
    T: FirmStore
        + UserStore
        + ClientStore
        + CaseStore
        + CaseRecordStore
        + TaskStore
        + PrincipalDirectory
{
}

pub type SharedStore = Arc<dyn Store>;
