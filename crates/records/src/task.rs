//! Firm tasks, optionally tied to a case and assigned to a user.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use juris_auth::TenantScope;
use juris_core::{CaseId, DomainResult, FirmId, FirmOwned, TaskId, UserId};

use crate::text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
    Late,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Done => "done",
            TaskStatus::Late => "late",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "done" => Some(TaskStatus::Done),
            "late" => Some(TaskStatus::Late),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub firm_id: FirmId,
    pub case_id: Option<CaseId>,
    pub assigned_to: Option<UserId>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl FirmOwned for Task {
    fn firm_id(&self) -> FirmId {
        self.firm_id
    }
}

impl Task {
    /// The caller must have verified `case_id` and `assigned_to` under the
    /// same scope.
    pub fn create(scope: &TenantScope, input: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::new(),
            firm_id: scope.firm_id(),
            case_id: input.case_id,
            assigned_to: input.assigned_to,
            title: input.title,
            description: input.description,
            due_date: input.due_date,
            status: input.status,
            created_at: now,
        }
    }

    pub fn apply(&mut self, update: TaskUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if update.description.is_some() {
            self.description = update.description;
        }
        if update.due_date.is_some() {
            self.due_date = update.due_date;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if update.assigned_to.is_some() {
            self.assigned_to = update.assigned_to;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub case_id: Option<CaseId>,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: TaskStatus,
}

impl NewTask {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            title: text::required("title", self.title, Some(255))?,
            description: text::optional("description", self.description, None)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<UserId>,
}

impl TaskUpdate {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            title: self
                .title
                .map(|t| text::required("title", t, Some(255)))
                .transpose()?,
            description: text::optional("description", self.description, None)?,
            ..self
        })
    }
}

/// `GET /tasks` filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub case_id: Option<CaseId>,
    pub assigned_to: Option<UserId>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| task.status == s)
            && self.case_id.is_none_or(|c| task.case_id == Some(c))
            && self.assigned_to.is_none_or(|u| task.assigned_to == Some(u))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_pending() {
        let input: NewTask = serde_json::from_str(r#"{"title":"Protocolar petição"}"#).unwrap();
        assert_eq!(input.status, TaskStatus::Pending);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let body = r#"{"title":"X","status":"archived"}"#;
        assert!(serde_json::from_str::<NewTask>(body).is_err());
    }

    #[test]
    fn blank_title_is_rejected() {
        let input: NewTask = serde_json::from_str(r#"{"title":"   "}"#).unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn filters_combine() {
        let scope = TenantScope::for_new_firm(FirmId::new());
        let case_id = CaseId::new();
        let user = UserId::new();
        let task = Task::create(
            &scope,
            NewTask {
                case_id: Some(case_id),
                assigned_to: Some(user),
                title: "Audiência".into(),
                description: None,
                due_date: None,
                status: TaskStatus::Late,
            },
            Utc::now(),
        );

        let filter = TaskFilter {
            status: Some(TaskStatus::Late),
            case_id: Some(case_id),
            assigned_to: Some(user),
        };
        assert!(filter.matches(&task));
        assert!(
            !TaskFilter {
                status: Some(TaskStatus::Done),
                ..filter.clone()
            }
            .matches(&task)
        );
        assert!(
            !TaskFilter {
                assigned_to: Some(UserId::new()),
                ..filter
            }
            .matches(&task)
        );
    }

    #[test]
    fn update_changes_status_only() {
        let scope = TenantScope::for_new_firm(FirmId::new());
        let input: NewTask = serde_json::from_str(r#"{"title":"Revisar contrato"}"#).unwrap();
        let mut task = Task::create(&scope, input, Utc::now());
        task.apply(TaskUpdate {
            status: Some(TaskStatus::Done),
            ..Default::default()
        });
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.title, "Revisar contrato");
    }
}
