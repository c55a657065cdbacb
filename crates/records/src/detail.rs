//! Read models that join a record with its related rows.

use serde::Serialize;

use crate::{
    Case, CaseMovement, CaseParty, Client, Document, FinancialRecord, Hearing, Note, Task, User,
};

/// A case with everything attached to it (`GET /cases/:id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseDetail {
    #[serde(flatten)]
    pub case: Case,
    pub client: Option<Client>,
    pub responsible_lawyer: Option<User>,
    pub case_parties: Vec<CaseParty>,
    pub case_movements: Vec<CaseMovement>,
    pub tasks: Vec<Task>,
    pub hearings: Vec<Hearing>,
    pub documents: Vec<Document>,
    pub financial_records: Vec<FinancialRecord>,
    pub notes: Vec<Note>,
}

impl CaseDetail {
    pub fn bare(case: Case) -> Self {
        Self {
            case,
            client: None,
            responsible_lawyer: None,
            case_parties: Vec::new(),
            case_movements: Vec::new(),
            tasks: Vec::new(),
            hearings: Vec::new(),
            documents: Vec::new(),
            financial_records: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// A client with (some of) its cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientWithCases {
    #[serde(flatten)]
    pub client: Client,
    pub cases: Vec<Case>,
}
