//! Free-text notes on a case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use juris_auth::TenantScope;
use juris_core::{CaseId, DomainResult, FirmId, FirmOwned, NoteId, UserId};

use crate::text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: NoteId,
    pub firm_id: FirmId,
    pub case_id: CaseId,
    /// Author; always the acting user.
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl FirmOwned for Note {
    fn firm_id(&self) -> FirmId {
        self.firm_id
    }
}

impl Note {
    pub fn create(
        scope: &TenantScope,
        case_id: CaseId,
        author: UserId,
        input: NewNote,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NoteId::new(),
            firm_id: scope.firm_id(),
            case_id,
            user_id: author,
            content: input.content,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewNote {
    pub content: String,
}

impl NewNote {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            content: text::required("content", self.content, None)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_cannot_be_set_from_the_body() {
        let someone_else = UserId::new();
        let body = serde_json::json!({ "content": "Cliente ligou", "user_id": someone_else.to_string() });
        let input: NewNote = serde_json::from_value(body).unwrap();

        let me = UserId::new();
        let scope = TenantScope::for_new_firm(FirmId::new());
        let note = Note::create(&scope, CaseId::new(), me, input.validate().unwrap(), Utc::now());
        assert_eq!(note.user_id, me);
    }
}
