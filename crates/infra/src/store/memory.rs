//! In-memory store for tests and local development.
//!
//! All tables live behind one `RwLock`, so multi-step checks (parent in
//! scope, uniqueness, active cases) and the write that depends on them happen
//! under the same write guard.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use juris_auth::{DirectoryError, Principal, PrincipalDirectory, PrincipalRecord, TenantScope};
use juris_core::{
    CaseId, CaseMovementId, CasePartyId, ClientId, DocumentId, FinancialRecordId, FirmId,
    FirmOwned, HearingId, NoteId, Page, TaskId, UserId,
};
use juris_records::{
    Case, CaseDetail, CaseFilter, CaseMovement, CaseParty, CaseUpdate, Client, ClientFilter,
    ClientUpdate, ClientWithCases, Document, FinancialRecord, FinancialRecordUpdate, Firm,
    FirmUpdate, Hearing, Note, Task, TaskFilter, TaskUpdate, User, UserUpdate,
};

use super::messages::*;
use super::stamped;
use super::{CaseRecordStore, CaseStore, ClientStore, FirmStore, TaskStore, UserStore};
use crate::{StoreError, StoreResult};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Debug, Default)]
struct Tables {
    firms: HashMap<FirmId, Firm>,
    users: HashMap<UserId, StoredUser>,
    clients: HashMap<ClientId, Client>,
    cases: HashMap<CaseId, Case>,
    parties: HashMap<CasePartyId, CaseParty>,
    movements: HashMap<CaseMovementId, CaseMovement>,
    hearings: HashMap<HearingId, Hearing>,
    documents: HashMap<DocumentId, Document>,
    financial_records: HashMap<FinancialRecordId, FinancialRecord>,
    notes: HashMap<NoteId, Note>,
    tasks: HashMap<TaskId, Task>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.user.email == email && Some(u.user.id) != except)
    }

    fn user_in_scope(&self, scope: &TenantScope, id: UserId) -> bool {
        self.users.get(&id).is_some_and(|u| scope.contains(&u.user))
    }

    fn case_in_scope(&self, scope: &TenantScope, id: CaseId) -> bool {
        self.cases.get(&id).is_some_and(|c| scope.contains(c))
    }

    fn client_in_scope(&self, scope: &TenantScope, id: ClientId) -> bool {
        self.clients.get(&id).is_some_and(|c| scope.contains(c))
    }

    fn check_lawyer(&self, scope: &TenantScope, lawyer: Option<UserId>) -> StoreResult<()> {
        match lawyer {
            Some(id) if !self.user_in_scope(scope, id) => {
                Err(StoreError::validation(LAWYER_NOT_FOUND))
            }
            _ => Ok(()),
        }
    }

    fn check_assignee(&self, scope: &TenantScope, assignee: Option<UserId>) -> StoreResult<()> {
        match assignee {
            Some(id) if !self.user_in_scope(scope, id) => {
                Err(StoreError::validation(ASSIGNEE_NOT_FOUND))
            }
            _ => Ok(()),
        }
    }

    fn children<C: CaseChild>(&self, case_id: CaseId) -> Vec<C> {
        let mut out: Vec<C> = C::table(self)
            .values()
            .filter(|c| c.case_id() == case_id)
            .cloned()
            .collect();
        out.sort_by(C::order);
        out
    }

    fn tasks_sorted(&self, scope: &TenantScope, filter: impl Fn(&Task) -> bool) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|task| scope.contains(*task) && filter(*task))
            .cloned()
            .collect();
        tasks.sort_by(task_order);
        tasks
    }

    /// Remove a case with its sub-records and detach its tasks.
    fn remove_case(&mut self, id: CaseId) {
        self.cases.remove(&id);
        self.parties.retain(|_, r| r.case_id != id);
        self.movements.retain(|_, r| r.case_id != id);
        self.hearings.retain(|_, r| r.case_id != id);
        self.documents.retain(|_, r| r.case_id != id);
        self.financial_records.retain(|_, r| r.case_id != id);
        self.notes.retain(|_, r| r.case_id != id);
        for task in self.tasks.values_mut() {
            if task.case_id == Some(id) {
                task.case_id = None;
            }
        }
    }
}

/// A record stored under a case, addressed by `(case_id, id)`.
trait CaseChild: FirmOwned + Clone {
    type Id: Copy + Eq + Hash;

    fn id(&self) -> Self::Id;
    fn case_id(&self) -> CaseId;
    fn table(t: &Tables) -> &HashMap<Self::Id, Self>;
    fn table_mut(t: &mut Tables) -> &mut HashMap<Self::Id, Self>;
    fn order(a: &Self, b: &Self) -> Ordering;
}

macro_rules! case_child {
    ($t:ty, $id:ty, $field:ident, |$a:ident, $b:ident| $order:expr) => {
        impl CaseChild for $t {
            type Id = $id;

            fn id(&self) -> $id {
                self.id
            }

            fn case_id(&self) -> CaseId {
                self.case_id
            }

            fn table(t: &Tables) -> &HashMap<$id, Self> {
                &t.$field
            }

            fn table_mut(t: &mut Tables) -> &mut HashMap<$id, Self> {
                &mut t.$field
            }

            fn order($a: &Self, $b: &Self) -> Ordering {
                $order
            }
        }
    };
}

case_child!(CaseParty, CasePartyId, parties, |a, b| {
    a.name.cmp(&b.name).then(a.id.cmp(&b.id))
});
case_child!(CaseMovement, CaseMovementId, movements, |a, b| {
    b.movement_date
        .cmp(&a.movement_date)
        .then(b.created_at.cmp(&a.created_at))
        .then(b.id.cmp(&a.id))
});
case_child!(Hearing, HearingId, hearings, |a, b| {
    a.hearing_date.cmp(&b.hearing_date).then(a.id.cmp(&b.id))
});
case_child!(Document, DocumentId, documents, |a, b| {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
});
case_child!(FinancialRecord, FinancialRecordId, financial_records, |a, b| {
    nulls_last(&a.due_date, &b.due_date).then(a.id.cmp(&b.id))
});
case_child!(Note, NoteId, notes, |a, b| {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
});

fn nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn task_order(a: &Task, b: &Task) -> Ordering {
    nulls_last(&a.due_date, &b.due_date)
        .then(a.created_at.cmp(&b.created_at))
        .then(a.id.cmp(&b.id))
}

fn case_order(a: &Case, b: &Case) -> Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

/// In-memory implementation of every store trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }

    fn add_child<C: CaseChild>(&self, scope: &TenantScope, record: C) -> StoreResult<C> {
        stamped(scope, &record)?;
        let mut t = self.write()?;
        if !t.case_in_scope(scope, record.case_id()) {
            return Err(StoreError::validation(CASE_NOT_FOUND));
        }
        C::table_mut(&mut t).insert(record.id(), record.clone());
        Ok(record)
    }

    fn list_children<C: CaseChild>(&self, scope: &TenantScope, case_id: CaseId) -> StoreResult<Vec<C>> {
        let t = self.read()?;
        if !t.case_in_scope(scope, case_id) {
            return Err(StoreError::NotFound);
        }
        Ok(t.children(case_id))
    }

    fn child_mut<'t, C: CaseChild>(
        t: &'t mut Tables,
        scope: &TenantScope,
        case_id: CaseId,
        id: C::Id,
    ) -> StoreResult<&'t mut C> {
        C::table_mut(t)
            .get_mut(&id)
            .filter(|r| scope.contains(&**r) && r.case_id() == case_id)
            .ok_or(StoreError::NotFound)
    }

    fn delete_child<C: CaseChild>(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: C::Id,
    ) -> StoreResult<()> {
        let mut t = self.write()?;
        Self::child_mut::<C>(&mut t, scope, case_id, id)?;
        C::table_mut(&mut t).remove(&id);
        Ok(())
    }
}

#[async_trait]
impl PrincipalDirectory for MemoryStore {
    async fn find_principal_by_id(&self, id: UserId) -> Result<Option<Principal>, DirectoryError> {
        let t = self.read()?;
        Ok(t.users.get(&id).map(|u| u.user.principal()))
    }

    async fn find_principal_by_email(
        &self,
        email: &str,
    ) -> Result<Option<PrincipalRecord>, DirectoryError> {
        let t = self.read()?;
        Ok(t.users
            .values()
            .find(|u| u.user.email == email)
            .map(|u| PrincipalRecord {
                principal: u.user.principal(),
                password_hash: u.password_hash.clone(),
            }))
    }
}

#[async_trait]
impl FirmStore for MemoryStore {
    async fn create_firm_with_admin(
        &self,
        firm: Firm,
        admin: User,
        admin_password_hash: String,
    ) -> StoreResult<(Firm, User)> {
        stamped(&TenantScope::for_new_firm(firm.id), &admin)?;
        let mut t = self.write()?;
        if let Some(cnpj) = &firm.cnpj {
            if t.firms.values().any(|f| f.cnpj.as_ref() == Some(cnpj)) {
                return Err(StoreError::conflict(DUPLICATE_CNPJ));
            }
        }
        if t.email_taken(&admin.email, None) {
            return Err(StoreError::conflict(DUPLICATE_EMAIL));
        }
        t.firms.insert(firm.id, firm.clone());
        t.users.insert(
            admin.id,
            StoredUser {
                user: admin.clone(),
                password_hash: admin_password_hash,
            },
        );
        Ok((firm, admin))
    }

    async fn get_firm(&self, scope: &TenantScope) -> StoreResult<Firm> {
        let t = self.read()?;
        t.firms
            .get(&scope.firm_id())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_firm(
        &self,
        scope: &TenantScope,
        update: FirmUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Firm> {
        let mut t = self.write()?;
        let firm = t
            .firms
            .get_mut(&scope.firm_id())
            .ok_or(StoreError::NotFound)?;
        firm.apply(update, now);
        Ok(firm.clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        scope: &TenantScope,
        user: User,
        password_hash: String,
    ) -> StoreResult<User> {
        stamped(scope, &user)?;
        let mut t = self.write()?;
        if t.email_taken(&user.email, None) {
            return Err(StoreError::conflict(DUPLICATE_EMAIL));
        }
        t.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash,
            },
        );
        Ok(user)
    }

    async fn get_user(&self, scope: &TenantScope, id: UserId) -> StoreResult<User> {
        let t = self.read()?;
        t.users
            .get(&id)
            .map(|u| &u.user)
            .filter(|u| scope.contains(*u))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_users(&self, scope: &TenantScope, page: Page) -> StoreResult<Vec<User>> {
        let t = self.read()?;
        let mut users: Vec<User> = scope.retain(t.users.values().map(|u| u.user.clone()));
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page.apply(users))
    }

    async fn update_user(
        &self,
        scope: &TenantScope,
        id: UserId,
        update: UserUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<User> {
        let mut t = self.write()?;
        if !t.user_in_scope(scope, id) {
            return Err(StoreError::NotFound);
        }
        if let Some(email) = &update.email {
            if t.email_taken(email, Some(id)) {
                return Err(StoreError::conflict(DUPLICATE_EMAIL));
            }
        }
        let stored = t.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        stored.user.apply(update, now);
        Ok(stored.user.clone())
    }

    async fn password_hash(&self, scope: &TenantScope, id: UserId) -> StoreResult<String> {
        let t = self.read()?;
        t.users
            .get(&id)
            .filter(|u| scope.contains(&u.user))
            .map(|u| u.password_hash.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn set_password_hash(
        &self,
        scope: &TenantScope,
        id: UserId,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut t = self.write()?;
        let stored = t
            .users
            .get_mut(&id)
            .filter(|u| scope.contains(&u.user))
            .ok_or(StoreError::NotFound)?;
        stored.password_hash = password_hash;
        stored.user.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn create_client(&self, scope: &TenantScope, client: Client) -> StoreResult<Client> {
        stamped(scope, &client)?;
        let mut t = self.write()?;
        if let Some(document) = &client.document {
            let taken = t
                .clients
                .values()
                .any(|c| scope.contains(c) && c.document.as_ref() == Some(document));
            if taken {
                return Err(StoreError::conflict(DUPLICATE_DOCUMENT));
            }
        }
        t.clients.insert(client.id, client.clone());
        Ok(client)
    }

    async fn get_client(&self, scope: &TenantScope, id: ClientId) -> StoreResult<Client> {
        let t = self.read()?;
        t.clients
            .get(&id)
            .filter(|c| scope.contains(*c))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_clients(
        &self,
        scope: &TenantScope,
        filter: &ClientFilter,
        page: Page,
    ) -> StoreResult<Vec<Client>> {
        let t = self.read()?;
        let mut clients: Vec<Client> = t
            .clients
            .values()
            .filter(|c| scope.contains(*c) && filter.matches(c))
            .cloned()
            .collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page.apply(clients))
    }

    async fn list_clients_with_active_cases(
        &self,
        scope: &TenantScope,
        page: Page,
    ) -> StoreResult<Vec<ClientWithCases>> {
        let t = self.read()?;
        let mut active: HashMap<ClientId, Vec<Case>> = HashMap::new();
        for case in t.cases.values().filter(|c| scope.contains(*c) && c.is_active()) {
            active.entry(case.client_id).or_default().push(case.clone());
        }

        let mut out: Vec<ClientWithCases> = active
            .into_iter()
            .filter_map(|(client_id, mut cases)| {
                let client = t.clients.get(&client_id).filter(|c| scope.contains(*c))?;
                cases.sort_by(case_order);
                Some(ClientWithCases {
                    client: client.clone(),
                    cases,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            a.client
                .name
                .cmp(&b.client.name)
                .then(a.client.id.cmp(&b.client.id))
        });
        Ok(page.apply(out))
    }

    async fn update_client(
        &self,
        scope: &TenantScope,
        id: ClientId,
        update: ClientUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Client> {
        let mut t = self.write()?;
        let client = t
            .clients
            .get_mut(&id)
            .filter(|c| scope.contains(&**c))
            .ok_or(StoreError::NotFound)?;
        client.apply(update, now);
        Ok(client.clone())
    }

    async fn delete_client(&self, scope: &TenantScope, id: ClientId) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.client_in_scope(scope, id) {
            return Err(StoreError::NotFound);
        }
        let cases: Vec<&Case> = t.cases.values().filter(|c| c.client_id == id).collect();
        if cases.iter().any(|c| c.is_active()) {
            return Err(StoreError::conflict(CLIENT_HAS_ACTIVE_CASES));
        }
        let closed: Vec<CaseId> = cases.iter().map(|c| c.id).collect();
        for case_id in closed {
            t.remove_case(case_id);
        }
        t.clients.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CaseStore for MemoryStore {
    async fn create_case(&self, scope: &TenantScope, case: Case) -> StoreResult<Case> {
        stamped(scope, &case)?;
        let mut t = self.write()?;
        if !t.client_in_scope(scope, case.client_id) {
            return Err(StoreError::validation(CLIENT_NOT_FOUND));
        }
        t.check_lawyer(scope, case.responsible_lawyer_id)?;
        t.cases.insert(case.id, case.clone());
        Ok(case)
    }

    async fn get_case(&self, scope: &TenantScope, id: CaseId) -> StoreResult<Case> {
        let t = self.read()?;
        t.cases
            .get(&id)
            .filter(|c| scope.contains(*c))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn case_detail(&self, scope: &TenantScope, id: CaseId) -> StoreResult<CaseDetail> {
        let t = self.read()?;
        let case = t
            .cases
            .get(&id)
            .filter(|c| scope.contains(*c))
            .cloned()
            .ok_or(StoreError::NotFound)?;

        let client = t
            .clients
            .get(&case.client_id)
            .filter(|c| scope.contains(*c))
            .cloned();
        let responsible_lawyer = case
            .responsible_lawyer_id
            .and_then(|uid| t.users.get(&uid))
            .map(|u| u.user.clone())
            .filter(|u| scope.contains(u));

        Ok(CaseDetail {
            client,
            responsible_lawyer,
            case_parties: t.children(id),
            case_movements: t.children(id),
            tasks: t.tasks_sorted(scope, |task| task.case_id == Some(id)),
            hearings: t.children(id),
            documents: t.children(id),
            financial_records: t.children(id),
            notes: t.children(id),
            case,
        })
    }

    async fn list_cases(
        &self,
        scope: &TenantScope,
        filter: &CaseFilter,
        page: Page,
    ) -> StoreResult<Vec<Case>> {
        let t = self.read()?;
        let mut cases: Vec<Case> = t
            .cases
            .values()
            .filter(|c| scope.contains(*c) && filter.matches(c))
            .cloned()
            .collect();
        cases.sort_by(case_order);
        Ok(page.apply(cases))
    }

    async fn update_case(
        &self,
        scope: &TenantScope,
        id: CaseId,
        update: CaseUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Case> {
        let mut t = self.write()?;
        if !t.case_in_scope(scope, id) {
            return Err(StoreError::NotFound);
        }
        t.check_lawyer(scope, update.responsible_lawyer_id)?;
        let case = t.cases.get_mut(&id).ok_or(StoreError::NotFound)?;
        case.apply(update, now);
        Ok(case.clone())
    }

    async fn delete_case(&self, scope: &TenantScope, id: CaseId) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.case_in_scope(scope, id) {
            return Err(StoreError::NotFound);
        }
        t.remove_case(id);
        Ok(())
    }
}

#[async_trait]
impl CaseRecordStore for MemoryStore {
    async fn add_party(&self, scope: &TenantScope, party: CaseParty) -> StoreResult<CaseParty> {
        self.add_child(scope, party)
    }

    async fn list_parties(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
    ) -> StoreResult<Vec<CaseParty>> {
        self.list_children(scope, case_id)
    }

    async fn delete_party(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: CasePartyId,
    ) -> StoreResult<()> {
        self.delete_child::<CaseParty>(scope, case_id, id)
    }

    async fn add_movement(
        &self,
        scope: &TenantScope,
        movement: CaseMovement,
    ) -> StoreResult<CaseMovement> {
        self.add_child(scope, movement)
    }

    async fn list_movements(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
    ) -> StoreResult<Vec<CaseMovement>> {
        self.list_children(scope, case_id)
    }

    async fn add_hearing(&self, scope: &TenantScope, hearing: Hearing) -> StoreResult<Hearing> {
        self.add_child(scope, hearing)
    }

    async fn list_hearings(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
    ) -> StoreResult<Vec<Hearing>> {
        self.list_children(scope, case_id)
    }

    async fn delete_hearing(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: HearingId,
    ) -> StoreResult<()> {
        self.delete_child::<Hearing>(scope, case_id, id)
    }

    async fn add_document(
        &self,
        scope: &TenantScope,
        document: Document,
    ) -> StoreResult<Document> {
        if let Some(uploader) = document.uploaded_by {
            if !self.read()?.user_in_scope(scope, uploader) {
                return Err(StoreError::validation("uploader not found"));
            }
        }
        self.add_child(scope, document)
    }

    async fn list_documents(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
    ) -> StoreResult<Vec<Document>> {
        self.list_children(scope, case_id)
    }

    async fn delete_document(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: DocumentId,
    ) -> StoreResult<()> {
        self.delete_child::<Document>(scope, case_id, id)
    }

    async fn add_financial_record(
        &self,
        scope: &TenantScope,
        record: FinancialRecord,
    ) -> StoreResult<FinancialRecord> {
        self.add_child(scope, record)
    }

    async fn list_financial_records(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
    ) -> StoreResult<Vec<FinancialRecord>> {
        self.list_children(scope, case_id)
    }

    async fn update_financial_record(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: FinancialRecordId,
        update: FinancialRecordUpdate,
    ) -> StoreResult<FinancialRecord> {
        let mut t = self.write()?;
        let record = Self::child_mut::<FinancialRecord>(&mut t, scope, case_id, id)?;
        record.apply(update);
        Ok(record.clone())
    }

    async fn delete_financial_record(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: FinancialRecordId,
    ) -> StoreResult<()> {
        self.delete_child::<FinancialRecord>(scope, case_id, id)
    }

    async fn add_note(&self, scope: &TenantScope, note: Note) -> StoreResult<Note> {
        self.add_child(scope, note)
    }

    async fn list_notes(&self, scope: &TenantScope, case_id: CaseId) -> StoreResult<Vec<Note>> {
        self.list_children(scope, case_id)
    }

    async fn delete_note(
        &self,
        scope: &TenantScope,
        case_id: CaseId,
        id: NoteId,
    ) -> StoreResult<()> {
        self.delete_child::<Note>(scope, case_id, id)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, scope: &TenantScope, task: Task) -> StoreResult<Task> {
        stamped(scope, &task)?;
        let mut t = self.write()?;
        if let Some(case_id) = task.case_id {
            if !t.case_in_scope(scope, case_id) {
                return Err(StoreError::validation(CASE_NOT_FOUND));
            }
        }
        t.check_assignee(scope, task.assigned_to)?;
        t.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get_task(&self, scope: &TenantScope, id: TaskId) -> StoreResult<Task> {
        let t = self.read()?;
        t.tasks
            .get(&id)
            .filter(|task| scope.contains(*task))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_tasks(
        &self,
        scope: &TenantScope,
        filter: &TaskFilter,
        page: Page,
    ) -> StoreResult<Vec<Task>> {
        let t = self.read()?;
        Ok(page.apply(t.tasks_sorted(scope, |task| filter.matches(task))))
    }

    async fn update_task(
        &self,
        scope: &TenantScope,
        id: TaskId,
        update: TaskUpdate,
    ) -> StoreResult<Task> {
        let mut t = self.write()?;
        if !t.tasks.get(&id).is_some_and(|task| scope.contains(task)) {
            return Err(StoreError::NotFound);
        }
        t.check_assignee(scope, update.assigned_to)?;
        let task = t.tasks.get_mut(&id).ok_or(StoreError::NotFound)?;
        task.apply(update);
        Ok(task.clone())
    }

    async fn delete_task(&self, scope: &TenantScope, id: TaskId) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.tasks.get(&id).is_some_and(|task| scope.contains(task)) {
            return Err(StoreError::NotFound);
        }
        t.tasks.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use juris_auth::Role;
    use juris_records::{
        ClientKind, Money, NewCase, NewCaseParty, NewClient, NewFinancialRecord, NewFirm,
        NewNote, NewTask, NewUser, TaskStatus,
    };

    use super::*;

    struct Tenant {
        scope: TenantScope,
        admin: User,
    }

    async fn tenant(store: &MemoryStore, name: &str, cnpj: &str, email: &str) -> Tenant {
        let now = Utc::now();
        let firm = Firm::create(
            NewFirm {
                name: name.into(),
                cnpj: Some(cnpj.into()),
                email: None,
                phone: None,
            },
            now,
        );
        let scope = TenantScope::for_new_firm(firm.id);
        let admin = User::create(&scope, new_user(email, Role::Admin), now);
        let (_, admin) = store
            .create_firm_with_admin(firm, admin, "hash".into())
            .await
            .unwrap();
        Tenant { scope, admin }
    }

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: "Usuário".into(),
            email: email.into(),
            password: "secret123".into(),
            role,
            is_active: true,
        }
    }

    fn new_client(name: &str, document: Option<&str>) -> NewClient {
        NewClient {
            kind: ClientKind::Pf,
            name: name.into(),
            document: document.map(Into::into),
            email: None,
            phone: None,
            address: None,
            state: None,
        }
    }

    fn new_case(client_id: ClientId, status: Option<&str>) -> NewCase {
        NewCase {
            client_id,
            case_number: None,
            court: None,
            area: None,
            status: status.map(Into::into),
            distribution_date: None,
            value: Some(Money::from_cents(100)),
            description: None,
            responsible_lawyer_id: None,
        }
    }

    async fn client_with_case(store: &MemoryStore, t: &Tenant, status: Option<&str>) -> (Client, Case) {
        let now = Utc::now();
        let client = store
            .create_client(&t.scope, Client::create(&t.scope, new_client("Maria Silva", None), now))
            .await
            .unwrap();
        let case = store
            .create_case(&t.scope, Case::create(&t.scope, new_case(client.id, status), now))
            .await
            .unwrap();
        (client, case)
    }

    #[tokio::test]
    async fn other_firms_rows_are_not_found() {
        let store = MemoryStore::new();
        let f1 = tenant(&store, "Firma 1", "11.111.111/0001-11", "a@f1.com").await;
        let f2 = tenant(&store, "Firma 2", "22.222.222/0001-22", "a@f2.com").await;
        let (client, case) = client_with_case(&store, &f1, None).await;

        assert_eq!(store.get_client(&f2.scope, client.id).await, Err(StoreError::NotFound));
        assert_eq!(store.get_case(&f2.scope, case.id).await, Err(StoreError::NotFound));
        assert_eq!(
            store
                .update_client(&f2.scope, client.id, ClientUpdate::default(), Utc::now())
                .await,
            Err(StoreError::NotFound)
        );
        assert_eq!(store.delete_case(&f2.scope, case.id).await, Err(StoreError::NotFound));
        assert_eq!(store.get_user(&f2.scope, f1.admin.id).await, Err(StoreError::NotFound));
        assert!(
            store
                .list_clients(&f2.scope, &ClientFilter::default(), Page::default())
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(store.get_firm(&f2.scope).await.unwrap().name, "Firma 2");

        assert!(store.get_case(&f1.scope, case.id).await.is_ok());
    }

    #[tokio::test]
    async fn records_stamped_with_another_firm_are_refused() {
        let store = MemoryStore::new();
        let f1 = tenant(&store, "Firma 1", "11.111.111/0001-11", "a@f1.com").await;
        let f2 = tenant(&store, "Firma 2", "22.222.222/0001-22", "a@f2.com").await;

        let foreign = Client::create(&f2.scope, new_client("Intruso", None), Utc::now());
        assert!(matches!(
            store.create_client(&f1.scope, foreign).await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn case_cannot_reference_another_firms_client_or_lawyer() {
        let store = MemoryStore::new();
        let f1 = tenant(&store, "Firma 1", "11.111.111/0001-11", "a@f1.com").await;
        let f2 = tenant(&store, "Firma 2", "22.222.222/0001-22", "a@f2.com").await;
        let (foreign_client, _) = client_with_case(&store, &f2, None).await;
        let (own_client, _) = client_with_case(&store, &f1, None).await;
        let now = Utc::now();

        let case = Case::create(&f1.scope, new_case(foreign_client.id, None), now);
        assert_eq!(
            store.create_case(&f1.scope, case).await,
            Err(StoreError::validation(CLIENT_NOT_FOUND))
        );

        let mut input = new_case(own_client.id, None);
        input.responsible_lawyer_id = Some(f2.admin.id);
        let case = Case::create(&f1.scope, input, now);
        assert_eq!(
            store.create_case(&f1.scope, case).await,
            Err(StoreError::validation(LAWYER_NOT_FOUND))
        );
    }

    #[tokio::test]
    async fn task_parents_must_share_the_firm() {
        let store = MemoryStore::new();
        let f1 = tenant(&store, "Firma 1", "11.111.111/0001-11", "a@f1.com").await;
        let f2 = tenant(&store, "Firma 2", "22.222.222/0001-22", "a@f2.com").await;
        let (_, foreign_case) = client_with_case(&store, &f2, None).await;

        let task = |case_id, assigned_to| NewTask {
            case_id,
            assigned_to,
            title: "Prazo".into(),
            description: None,
            due_date: None,
            status: TaskStatus::Pending,
        };
        let now = Utc::now();

        let t = Task::create(&f1.scope, task(Some(foreign_case.id), None), now);
        assert_eq!(
            store.create_task(&f1.scope, t).await,
            Err(StoreError::validation(CASE_NOT_FOUND))
        );
        let t = Task::create(&f1.scope, task(None, Some(f2.admin.id)), now);
        assert_eq!(
            store.create_task(&f1.scope, t).await,
            Err(StoreError::validation(ASSIGNEE_NOT_FOUND))
        );
        let t = Task::create(&f1.scope, task(None, Some(f1.admin.id)), now);
        assert!(store.create_task(&f1.scope, t).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_cnpj_and_email_conflict() {
        let store = MemoryStore::new();
        let f1 = tenant(&store, "Firma 1", "11.111.111/0001-11", "a@f1.com").await;
        let now = Utc::now();

        let firm = Firm::create(
            NewFirm {
                name: "Outra".into(),
                cnpj: Some("11.111.111/0001-11".into()),
                email: None,
                phone: None,
            },
            now,
        );
        let admin = User::create(&TenantScope::for_new_firm(firm.id), new_user("b@f.com", Role::Admin), now);
        assert_eq!(
            store.create_firm_with_admin(firm, admin, "h".into()).await,
            Err(StoreError::conflict(DUPLICATE_CNPJ))
        );

        let user = User::create(&f1.scope, new_user("a@f1.com", Role::Lawyer), now);
        assert_eq!(
            store.create_user(&f1.scope, user, "h".into()).await,
            Err(StoreError::conflict(DUPLICATE_EMAIL))
        );
    }

    #[tokio::test]
    async fn client_documents_are_unique_per_firm_only() {
        let store = MemoryStore::new();
        let f1 = tenant(&store, "Firma 1", "11.111.111/0001-11", "a@f1.com").await;
        let f2 = tenant(&store, "Firma 2", "22.222.222/0001-22", "a@f2.com").await;
        let now = Utc::now();
        let doc = Some("123.456.789-00");

        let c = Client::create(&f1.scope, new_client("Maria", doc), now);
        store.create_client(&f1.scope, c).await.unwrap();
        let c = Client::create(&f1.scope, new_client("Maria 2", doc), now);
        assert_eq!(
            store.create_client(&f1.scope, c).await,
            Err(StoreError::conflict(DUPLICATE_DOCUMENT))
        );
        let c = Client::create(&f2.scope, new_client("Maria", doc), now);
        assert!(store.create_client(&f2.scope, c).await.is_ok());
    }

    #[tokio::test]
    async fn client_with_active_cases_cannot_be_deleted() {
        let store = MemoryStore::new();
        let f1 = tenant(&store, "Firma 1", "11.111.111/0001-11", "a@f1.com").await;
        let (client, case) = client_with_case(&store, &f1, Some("em andamento")).await;

        assert_eq!(
            store.delete_client(&f1.scope, client.id).await,
            Err(StoreError::conflict(CLIENT_HAS_ACTIVE_CASES))
        );

        let archive = CaseUpdate {
            status: Some("arquivado".into()),
            ..Default::default()
        };
        store.update_case(&f1.scope, case.id, archive, Utc::now()).await.unwrap();
        store.delete_client(&f1.scope, client.id).await.unwrap();

        assert_eq!(store.get_client(&f1.scope, client.id).await, Err(StoreError::NotFound));
        assert_eq!(store.get_case(&f1.scope, case.id).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn active_case_listing_keeps_only_active_cases() {
        let store = MemoryStore::new();
        let f1 = tenant(&store, "Firma 1", "11.111.111/0001-11", "a@f1.com").await;
        let (client, active) = client_with_case(&store, &f1, None).await;
        let closed = Case::create(&f1.scope, new_case(client.id, Some("encerrado")), Utc::now());
        store.create_case(&f1.scope, closed).await.unwrap();
        let idle = Client::create(&f1.scope, new_client("Sem Processos", None), Utc::now());
        store.create_client(&f1.scope, idle).await.unwrap();

        let listed = store
            .list_clients_with_active_cases(&f1.scope, Page::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].client.id, client.id);
        assert_eq!(listed[0].cases.iter().map(|c| c.id).collect::<Vec<_>>(), vec![active.id]);
    }

    #[tokio::test]
    async fn deleting_a_case_removes_children_and_detaches_tasks() {
        let store = MemoryStore::new();
        let f1 = tenant(&store, "Firma 1", "11.111.111/0001-11", "a@f1.com").await;
        let (_, case) = client_with_case(&store, &f1, None).await;
        let now = Utc::now();

        let party = CaseParty::create(
            &f1.scope,
            case.id,
            NewCaseParty {
                name: "Réu".into(),
                role: Some("réu".into()),
                document: None,
            },
        );
        store.add_party(&f1.scope, party).await.unwrap();
        let note = Note::create(
            &f1.scope,
            case.id,
            f1.admin.id,
            NewNote {
                content: "Ligar para o cliente".into(),
            },
            now,
        );
        store.add_note(&f1.scope, note).await.unwrap();
        let task = Task::create(
            &f1.scope,
            NewTask {
                case_id: Some(case.id),
                assigned_to: None,
                title: "Contestação".into(),
                description: None,
                due_date: NaiveDate::from_ymd_opt(2024, 5, 1),
                status: TaskStatus::Pending,
            },
            now,
        );
        let task = store.create_task(&f1.scope, task).await.unwrap();

        let detail = store.case_detail(&f1.scope, case.id).await.unwrap();
        assert_eq!(detail.case_parties.len(), 1);
        assert_eq!(detail.notes.len(), 1);
        assert_eq!(detail.tasks.len(), 1);
        assert_eq!(detail.client.map(|c| c.name).as_deref(), Some("Maria Silva"));

        store.delete_case(&f1.scope, case.id).await.unwrap();
        assert_eq!(store.list_parties(&f1.scope, case.id).await, Err(StoreError::NotFound));
        assert_eq!(store.get_task(&f1.scope, task.id).await.unwrap().case_id, None);
    }

    #[tokio::test]
    async fn financial_records_are_addressed_through_their_case() {
        let store = MemoryStore::new();
        let f1 = tenant(&store, "Firma 1", "11.111.111/0001-11", "a@f1.com").await;
        let (_, case) = client_with_case(&store, &f1, None).await;
        let (_, other_case) = client_with_case(&store, &f1, None).await;

        let record = FinancialRecord::create(
            &f1.scope,
            case.id,
            NewFinancialRecord {
                kind: juris_records::FinancialKind::Fee,
                description: None,
                amount: Money::from_cents(150_000),
                due_date: None,
                paid_at: None,
            },
        );
        let record = store.add_financial_record(&f1.scope, record).await.unwrap();

        let paid = FinancialRecordUpdate {
            paid_at: NaiveDate::from_ymd_opt(2024, 2, 3),
            ..Default::default()
        };
        assert_eq!(
            store
                .update_financial_record(&f1.scope, other_case.id, record.id, paid.clone())
                .await,
            Err(StoreError::NotFound)
        );
        let updated = store
            .update_financial_record(&f1.scope, case.id, record.id, paid)
            .await
            .unwrap();
        assert!(updated.paid_at.is_some());
    }

    #[tokio::test]
    async fn sub_record_on_foreign_case_is_a_validation_error() {
        let store = MemoryStore::new();
        let f1 = tenant(&store, "Firma 1", "11.111.111/0001-11", "a@f1.com").await;
        let f2 = tenant(&store, "Firma 2", "22.222.222/0001-22", "a@f2.com").await;
        let (_, foreign_case) = client_with_case(&store, &f2, None).await;

        let note = Note::create(
            &f1.scope,
            foreign_case.id,
            f1.admin.id,
            NewNote {
                content: "x".into(),
            },
            Utc::now(),
        );
        assert_eq!(
            store.add_note(&f1.scope, note).await,
            Err(StoreError::validation(CASE_NOT_FOUND))
        );
        assert_eq!(
            store.list_notes(&f1.scope, foreign_case.id).await,
            Err(StoreError::NotFound)
        );
    }

    #[tokio::test]
    async fn directory_sees_role_and_activity_changes() {
        let store = MemoryStore::new();
        let f1 = tenant(&store, "Firma 1", "11.111.111/0001-11", "a@f1.com").await;

        let update = UserUpdate {
            role: Some(Role::Assistant),
            is_active: Some(false),
            ..Default::default()
        };
        store.update_user(&f1.scope, f1.admin.id, update, Utc::now()).await.unwrap();

        let principal = store.find_principal_by_id(f1.admin.id).await.unwrap().unwrap();
        assert_eq!(principal.role, Role::Assistant);
        assert!(!principal.is_active);

        let record = store.find_principal_by_email("a@f1.com").await.unwrap().unwrap();
        assert_eq!(record.password_hash, "hash");
    }

    #[tokio::test]
    async fn lists_are_paged() {
        let store = MemoryStore::new();
        let f1 = tenant(&store, "Firma 1", "11.111.111/0001-11", "a@f1.com").await;
        for name in ["Carla", "Ana", "Bruno"] {
            let c = Client::create(&f1.scope, new_client(name, None), Utc::now());
            store.create_client(&f1.scope, c).await.unwrap();
        }
        let page = store
            .list_clients(&f1.scope, &ClientFilter::default(), Page::new(1, 1))
            .await
            .unwrap();
        assert_eq!(page.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["Bruno"]);
    }
}
