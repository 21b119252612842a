use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::identity::ActorId;

/// Grade levels a reviewer can assign.
pub const GRADE_LEVELS: [&str; 12] = [
    "Grade 1", "Grade 2", "Grade 3", "Grade 4", "Grade 5", "Grade 6", "Grade 7", "Grade 8",
    "Grade 9", "Grade 10", "Grade 11", "Grade 12",
];

/// Subjects a reviewer can assign.
pub const SUBJECTS: [&str; 11] = [
    "Mathematics",
    "English",
    "Science",
    "Physics",
    "Chemistry",
    "Biology",
    "History",
    "Geography",
    "Computer Science",
    "Art",
    "Physical Education",
];

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role requested by the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantRole {
    Student,
    Teacher,
    Parent,
}

impl ApplicantRole {
    pub const ALL: [ApplicantRole; 3] = [Self::Student, Self::Teacher, Self::Parent];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicantRole::Student => "student",
            ApplicantRole::Teacher => "teacher",
            ApplicantRole::Parent => "parent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Self::Student),
            "teacher" => Some(Self::Teacher),
            "parent" => Some(Self::Parent),
            _ => None,
        }
    }
}

/// Teaching credentials and preferences captured on a teacher application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherDetails {
    pub qualifications: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub preferred_classes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_student_id: Option<String>,
}

/// Role plus the payload that only makes sense for that role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleDetails {
    Student,
    Teacher(TeacherDetails),
    Parent(ParentDetails),
}

impl RoleDetails {
    /// Empty payload for a role, used when the applicant switches roles.
    pub fn empty(role: ApplicantRole) -> Self {
        match role {
            ApplicantRole::Student => RoleDetails::Student,
            ApplicantRole::Teacher => RoleDetails::Teacher(TeacherDetails::default()),
            ApplicantRole::Parent => RoleDetails::Parent(ParentDetails::default()),
        }
    }

    pub fn role(&self) -> ApplicantRole {
        match self {
            RoleDetails::Student => ApplicantRole::Student,
            RoleDetails::Teacher(_) => ApplicantRole::Teacher,
            RoleDetails::Parent(_) => ApplicantRole::Parent,
        }
    }
}

/// Inbound application as entered by an anonymous visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub details: RoleDetails,
    #[serde(default)]
    pub additional_info: Option<String>,
}

/// A submitted application awaiting a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub details: RoleDetails,
    pub additional_info: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl Application {
    pub fn role(&self) -> ApplicantRole {
        self.details.role()
    }
}

/// Classes, subjects and student links attached to a user at approval time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignments {
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub linked_students: Vec<String>,
}

impl Assignments {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.subjects.is_empty() && self.linked_students.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedUser {
    pub application_id: ApplicationId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: ApplicantRole,
    pub details: RoleDetails,
    pub assigned_classes: Vec<String>,
    pub assigned_subjects: Vec<String>,
    pub linked_students: Vec<String>,
    pub approved_by: ActorId,
    pub approved_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub application_id: ApplicationId,
    pub full_name: String,
    pub email: String,
    pub role: ApplicantRole,
    pub reason: String,
    pub rejected_by: ActorId,
    pub rejected_at: DateTime<Utc>,
}

/// Terminal outcome stored once an application leaves the pending set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ApplicationDecision {
    Approved(ApprovedUser),
    Rejected(RejectedRecord),
}

impl ApplicationDecision {
    pub fn status(&self) -> DecisionStatus {
        match self {
            ApplicationDecision::Approved(_) => DecisionStatus::Approved,
            ApplicationDecision::Rejected(_) => DecisionStatus::Rejected,
        }
    }
}

/// Lifecycle of an application: `Pending` until exactly one terminal decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Pending,
    Approved,
    Rejected,
}

impl DecisionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DecisionStatus::Pending => "pending",
            DecisionStatus::Approved => "approved",
            DecisionStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
