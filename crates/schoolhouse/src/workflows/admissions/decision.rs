use chrono::{DateTime, Utc};

use super::domain::{
    ApplicantRole, Application, ApprovedUser, Assignments, RejectedRecord, RoleDetails,
    GRADE_LEVELS, SUBJECTS,
};
use super::intake::clean_list;
use crate::workflows::identity::ActorId;

/// Reason recorded when a reviewer rejects without explaining why.
pub const DEFAULT_REJECTION_REASON: &str = "Application does not meet requirements";

/// Prerequisites that must hold before an approval is recorded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionViolation {
    #[error("teachers must be assigned at least one class before approval")]
    TeacherWithoutClasses,
    #[error("'{0}' is not an offered class")]
    UnknownClass(String),
    #[error("'{0}' is not an offered subject")]
    UnknownSubject(String),
}

/// Reviewer-side toggles over the fixed class and subject options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentSelection {
    classes: Vec<&'static str>,
    subjects: Vec<&'static str>,
    linked_students: Vec<String>,
}

impl AssignmentSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a class on or off. Returns whether it is selected afterwards.
    pub fn toggle_class(&mut self, class: &str) -> Result<bool, DecisionViolation> {
        let option = lookup(&GRADE_LEVELS, class)
            .ok_or_else(|| DecisionViolation::UnknownClass(class.to_string()))?;
        Ok(toggle(&mut self.classes, option))
    }

    pub fn toggle_subject(&mut self, subject: &str) -> Result<bool, DecisionViolation> {
        let option = lookup(&SUBJECTS, subject)
            .ok_or_else(|| DecisionViolation::UnknownSubject(subject.to_string()))?;
        Ok(toggle(&mut self.subjects, option))
    }

    pub fn link_student(&mut self, student_id: impl Into<String>) {
        let student_id = student_id.into();
        let student_id = student_id.trim();
        if !student_id.is_empty() && !self.linked_students.iter().any(|id| id == student_id) {
            self.linked_students.push(student_id.to_string());
        }
    }

    pub fn is_class_selected(&self, class: &str) -> bool {
        self.classes.iter().any(|selected| *selected == class)
    }

    /// Selected values in option order.
    pub fn to_assignments(&self) -> Assignments {
        Assignments {
            classes: in_option_order(&GRADE_LEVELS, &self.classes),
            subjects: in_option_order(&SUBJECTS, &self.subjects),
            linked_students: self.linked_students.clone(),
        }
    }
}

fn lookup(options: &[&'static str], value: &str) -> Option<&'static str> {
    let value = value.trim();
    options
        .iter()
        .copied()
        .find(|option| option.eq_ignore_ascii_case(value))
}

fn toggle(selected: &mut Vec<&'static str>, option: &'static str) -> bool {
    if let Some(position) = selected.iter().position(|value| *value == option) {
        selected.remove(position);
        false
    } else {
        selected.push(option);
        true
    }
}

fn in_option_order(options: &[&'static str], selected: &[&'static str]) -> Vec<String> {
    options
        .iter()
        .filter(|option| selected.contains(*option))
        .map(|option| option.to_string())
        .collect()
}

/// Stateless rules turning a pending application into a terminal record.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine;

impl DecisionEngine {
    /// Canonicalise the reviewer's assignments and keep only the parts relevant to the role.
    pub fn scoped_assignments(
        &self,
        application: &Application,
        assignments: Assignments,
    ) -> Result<Assignments, DecisionViolation> {
        let classes = canonical(
            &GRADE_LEVELS,
            assignments.classes,
            DecisionViolation::UnknownClass,
        )?;
        let subjects = canonical(
            &SUBJECTS,
            assignments.subjects,
            DecisionViolation::UnknownSubject,
        )?;
        let linked_students = clean_list(assignments.linked_students);

        let scoped = match &application.details {
            RoleDetails::Student | RoleDetails::Teacher(_) => Assignments {
                classes,
                subjects,
                linked_students: Vec::new(),
            },
            RoleDetails::Parent(parent) => {
                let linked_students = if linked_students.is_empty() {
                    parent.linked_student_id.iter().cloned().collect()
                } else {
                    linked_students
                };
                Assignments {
                    classes: Vec::new(),
                    subjects: Vec::new(),
                    linked_students,
                }
            }
        };

        if application.role() == ApplicantRole::Teacher && scoped.classes.is_empty() {
            return Err(DecisionViolation::TeacherWithoutClasses);
        }

        Ok(scoped)
    }

    /// Gate used to enable or disable the approve action.
    pub fn can_approve(&self, application: &Application, assignments: &Assignments) -> bool {
        self.scoped_assignments(application, assignments.clone())
            .is_ok()
    }

    pub fn approve(
        &self,
        application: &Application,
        assignments: Assignments,
        approver: &ActorId,
        approved_at: DateTime<Utc>,
    ) -> Result<ApprovedUser, DecisionViolation> {
        let assignments = self.scoped_assignments(application, assignments)?;

        Ok(ApprovedUser {
            application_id: application.id.clone(),
            full_name: application.full_name.clone(),
            email: application.email.clone(),
            phone: application.phone.clone(),
            role: application.role(),
            details: application.details.clone(),
            assigned_classes: assignments.classes,
            assigned_subjects: assignments.subjects,
            linked_students: assignments.linked_students,
            approved_by: approver.clone(),
            approved_at,
            submitted_at: application.submitted_at,
        })
    }

    pub fn reject(
        &self,
        application: &Application,
        reason: Option<String>,
        reviewer: &ActorId,
        rejected_at: DateTime<Utc>,
    ) -> RejectedRecord {
        let reason = reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());

        RejectedRecord {
            application_id: application.id.clone(),
            full_name: application.full_name.clone(),
            email: application.email.clone(),
            role: application.role(),
            reason,
            rejected_by: reviewer.clone(),
            rejected_at,
        }
    }
}

/// Map free-form names onto the option spelling, de-duplicated and in option order.
fn canonical(
    options: &[&'static str],
    values: Vec<String>,
    unknown: impl Fn(String) -> DecisionViolation,
) -> Result<Vec<String>, DecisionViolation> {
    let mut selected: Vec<&'static str> = Vec::new();
    for value in clean_list(values) {
        let option = lookup(options, &value).ok_or_else(|| unknown(value))?;
        if !selected.contains(&option) {
            selected.push(option);
        }
    }
    Ok(in_option_order(options, &selected))
}
