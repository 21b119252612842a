use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use super::domain::{
    ApplicantRole, ApplicationId, ApplicationSubmission, ParentDetails, RoleDetails,
    TeacherDetails,
};
use super::repository::{AdmissionsRepository, DecisionNotifier};
use super::service::AdmissionsService;

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    UnknownRole { line: u64, value: String },
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read application roster: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid application roster CSV: {}", err),
            RosterImportError::UnknownRole { line, value } => {
                write!(f, "line {line}: '{value}' is not student, teacher or parent")
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::UnknownRole { .. } => None,
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// One parsed roster row, tagged with its CSV line for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub line: u64,
    pub submission: ApplicationSubmission,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    pub line: u64,
    pub email: String,
    pub reason: String,
}

/// Outcome of pushing a roster through intake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub accepted: Vec<ApplicationId>,
    pub rejected: Vec<RowRejection>,
}

pub fn parse_roster<R: Read>(reader: R) -> Result<Vec<RosterEntry>, RosterImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut entries = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|position| position.line()).unwrap_or_default();
        let row: RosterRow = record.deserialize(Some(&headers))?;
        entries.push(RosterEntry {
            line,
            submission: row.into_submission(line)?,
        });
    }

    Ok(entries)
}

impl<R, N> AdmissionsService<R, N>
where
    R: AdmissionsRepository + 'static,
    N: DecisionNotifier + 'static,
{
    /// Submit every roster row through the regular intake path.
    pub fn import_roster<Rd: Read>(&self, reader: Rd) -> Result<ImportSummary, RosterImportError> {
        let mut summary = ImportSummary::default();

        for entry in parse_roster(reader)? {
            let email = entry.submission.email.clone();
            match self.submit(entry.submission) {
                Ok(application) => summary.accepted.push(application.id),
                Err(err) => summary.rejected.push(RowRejection {
                    line: entry.line,
                    email,
                    reason: err.to_string(),
                }),
            }
        }

        info!(
            accepted = summary.accepted.len(),
            rejected = summary.rejected.len(),
            "application roster imported"
        );
        Ok(summary)
    }

    pub fn import_roster_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<ImportSummary, RosterImportError> {
        let file = std::fs::File::open(path)?;
        self.import_roster(file)
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    full_name: String,
    email: String,
    role: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    phone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    qualifications: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    experience: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    subjects: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    preferred_classes: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    linked_student_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    additional_info: Option<String>,
}

impl RosterRow {
    fn into_submission(self, line: u64) -> Result<ApplicationSubmission, RosterImportError> {
        let role = ApplicantRole::parse(&self.role).ok_or_else(|| RosterImportError::UnknownRole {
            line,
            value: self.role.clone(),
        })?;

        let details = match role {
            ApplicantRole::Student => RoleDetails::Student,
            ApplicantRole::Teacher => RoleDetails::Teacher(TeacherDetails {
                qualifications: self.qualifications.unwrap_or_default(),
                experience: self.experience.unwrap_or_default(),
                subjects: split_list(self.subjects.as_deref()),
                preferred_classes: split_list(self.preferred_classes.as_deref()),
            }),
            ApplicantRole::Parent => RoleDetails::Parent(ParentDetails {
                linked_student_id: self.linked_student_id,
            }),
        };

        Ok(ApplicationSubmission {
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            details,
            additional_info: self.additional_info,
        })
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|value| {
            value
                .split(';')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
