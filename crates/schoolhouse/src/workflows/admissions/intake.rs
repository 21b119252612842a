use super::domain::{
    ApplicantRole, ApplicationSubmission, ParentDetails, RoleDetails, TeacherDetails,
};

/// Message shown to the applicant once a submission is stored.
pub const SUBMISSION_CONFIRMATION: &str =
    "Your application has been submitted and is awaiting review.";

/// Validation errors raised before an application reaches the pending set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("full name is required")]
    MissingFullName,
    #[error("email is required")]
    MissingEmail,
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("teacher applications must list qualifications")]
    MissingQualifications,
    #[error("teacher applications must list at least one subject")]
    MissingSubjects,
}

/// Applies the per-role field requirements and normalises the submission.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    pub fn validate(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationSubmission, IntakeViolation> {
        let full_name = submission.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(IntakeViolation::MissingFullName);
        }

        let email = normalize_email(&submission.email);
        if email.is_empty() {
            return Err(IntakeViolation::MissingEmail);
        }
        if !looks_like_email(&email) {
            return Err(IntakeViolation::InvalidEmail(email));
        }

        let details = match submission.details {
            RoleDetails::Student => RoleDetails::Student,
            RoleDetails::Teacher(teacher) => {
                let teacher = TeacherDetails {
                    qualifications: teacher.qualifications.trim().to_string(),
                    experience: teacher.experience.trim().to_string(),
                    subjects: clean_list(teacher.subjects),
                    preferred_classes: clean_list(teacher.preferred_classes),
                };
                if teacher.qualifications.is_empty() {
                    return Err(IntakeViolation::MissingQualifications);
                }
                if teacher.subjects.is_empty() {
                    return Err(IntakeViolation::MissingSubjects);
                }
                RoleDetails::Teacher(teacher)
            }
            RoleDetails::Parent(parent) => RoleDetails::Parent(ParentDetails {
                linked_student_id: clean_optional(parent.linked_student_id),
            }),
        };

        Ok(ApplicationSubmission {
            full_name,
            email,
            phone: clean_optional(submission.phone),
            details,
            additional_info: clean_optional(submission.additional_info),
        })
    }
}

/// Canonical form used for the uniqueness check.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Trim entries, drop blanks and repeated values while keeping the first occurrence order.
pub(crate) fn clean_list(values: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !cleaned.iter().any(|existing| existing == value) {
            cleaned.push(value.to_string());
        }
    }
    cleaned
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Pre-submit form state. Switching role throws away the previous role's fields so a teacher's
/// subject list can never leak into a student application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub additional_info: Option<String>,
    details: RoleDetails,
}

impl ApplicationDraft {
    pub fn new(role: ApplicantRole) -> Self {
        Self {
            full_name: String::new(),
            email: String::new(),
            phone: None,
            additional_info: None,
            details: RoleDetails::empty(role),
        }
    }

    pub fn role(&self) -> ApplicantRole {
        self.details.role()
    }

    pub fn details(&self) -> &RoleDetails {
        &self.details
    }

    pub fn switch_role(&mut self, role: ApplicantRole) {
        if self.role() != role {
            self.details = RoleDetails::empty(role);
        }
    }

    /// Teacher fields, available only while the draft is a teacher application.
    pub fn teacher_mut(&mut self) -> Option<&mut TeacherDetails> {
        match &mut self.details {
            RoleDetails::Teacher(teacher) => Some(teacher),
            _ => None,
        }
    }

    pub fn parent_mut(&mut self) -> Option<&mut ParentDetails> {
        match &mut self.details {
            RoleDetails::Parent(parent) => Some(parent),
            _ => None,
        }
    }

    pub fn to_submission(&self) -> ApplicationSubmission {
        ApplicationSubmission {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            details: self.details.clone(),
            additional_info: self.additional_info.clone(),
        }
    }

    /// Client-side gate: the submit action stays disabled until this holds.
    pub fn can_submit(&self) -> bool {
        IntakeGuard.validate(self.to_submission()).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teacher_submission() -> ApplicationSubmission {
        ApplicationSubmission {
            full_name: "  Ada Lovelace ".to_string(),
            email: " Ada@Example.COM ".to_string(),
            phone: Some("   ".to_string()),
            details: RoleDetails::Teacher(TeacherDetails {
                qualifications: "MSc Mathematics".to_string(),
                experience: "4 years".to_string(),
                subjects: vec![
                    "Mathematics".to_string(),
                    " Physics".to_string(),
                    "Mathematics".to_string(),
                    "".to_string(),
                ],
                preferred_classes: vec!["Grade 9".to_string()],
            }),
            additional_info: None,
        }
    }

    #[test]
    fn normalises_identity_and_lists() {
        let cleaned = IntakeGuard
            .validate(teacher_submission())
            .expect("teacher submission is valid");
        assert_eq!(cleaned.full_name, "Ada Lovelace");
        assert_eq!(cleaned.email, "ada@example.com");
        assert_eq!(cleaned.phone, None);
        match cleaned.details {
            RoleDetails::Teacher(teacher) => {
                assert_eq!(teacher.subjects, vec!["Mathematics", "Physics"]);
            }
            other => panic!("expected teacher details, got {other:?}"),
        }
    }

    #[test]
    fn teacher_requires_qualifications_and_subjects() {
        let mut submission = teacher_submission();
        if let RoleDetails::Teacher(teacher) = &mut submission.details {
            teacher.qualifications = "  ".to_string();
        }
        assert_eq!(
            IntakeGuard.validate(submission),
            Err(IntakeViolation::MissingQualifications)
        );

        let mut submission = teacher_submission();
        if let RoleDetails::Teacher(teacher) = &mut submission.details {
            teacher.subjects = vec![" ".to_string()];
        }
        assert_eq!(
            IntakeGuard.validate(submission),
            Err(IntakeViolation::MissingSubjects)
        );
    }

    #[test]
    fn every_role_requires_name_and_email() {
        let mut submission = teacher_submission();
        submission.details = RoleDetails::Student;
        submission.full_name = " ".to_string();
        assert_eq!(
            IntakeGuard.validate(submission.clone()),
            Err(IntakeViolation::MissingFullName)
        );

        submission.full_name = "Sam".to_string();
        submission.email = String::new();
        assert_eq!(
            IntakeGuard.validate(submission.clone()),
            Err(IntakeViolation::MissingEmail)
        );

        for bad in ["sam", "sam@", "@school.org", "sam@school", "s am@school.org"] {
            submission.email = bad.to_string();
            assert!(
                matches!(
                    IntakeGuard.validate(submission.clone()),
                    Err(IntakeViolation::InvalidEmail(_))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn student_needs_only_identity() {
        let submission = ApplicationSubmission {
            full_name: "Sam Student".to_string(),
            email: "sam@school.org".to_string(),
            phone: None,
            details: RoleDetails::Student,
            additional_info: Some("Transferring mid-year".to_string()),
        };
        assert!(IntakeGuard.validate(submission).is_ok());
    }

    #[test]
    fn switching_role_discards_role_fields() {
        let mut draft = ApplicationDraft::new(ApplicantRole::Teacher);
        draft.full_name = "Ada".to_string();
        draft.email = "ada@example.com".to_string();
        {
            let teacher = draft.teacher_mut().expect("teacher draft");
            teacher.qualifications = "MSc".to_string();
            teacher.subjects.push("Physics".to_string());
        }
        assert!(draft.can_submit());

        draft.switch_role(ApplicantRole::Student);
        assert_eq!(draft.details(), &RoleDetails::Student);
        assert!(draft.teacher_mut().is_none());

        draft.switch_role(ApplicantRole::Teacher);
        assert_eq!(
            draft.details(),
            &RoleDetails::Teacher(TeacherDetails::default())
        );
        assert!(!draft.can_submit());
        assert_eq!(draft.full_name, "Ada");
    }

    #[test]
    fn switching_to_same_role_keeps_fields() {
        let mut draft = ApplicationDraft::new(ApplicantRole::Parent);
        draft
            .parent_mut()
            .expect("parent draft")
            .linked_student_id = Some("stu-42".to_string());
        draft.switch_role(ApplicantRole::Parent);
        assert_eq!(
            draft.details(),
            &RoleDetails::Parent(ParentDetails {
                linked_student_id: Some("stu-42".to_string())
            })
        );
    }
}
