use super::common::*;

use crate::workflows::admissions::domain::{ApplicantRole, RoleDetails};
use crate::workflows::admissions::import::{parse_roster, RosterImportError};

const ROSTER: &str = "\
full_name,email,role,phone,qualifications,experience,subjects,preferred_classes,linked_student_id,additional_info
Tara Teacher,t@example.com,teacher,,MSc Physics,6 years,Physics; Mathematics,Grade 10;Grade 11,,
Sam Student,SAM@example.com,Student,+1 555 0101,,,,,,Transferring mid-year
Pat Parent,p@example.com,parent,,,,,,stu-42,
";

#[test]
fn roster_rows_become_submissions() {
    let entries = parse_roster(ROSTER.as_bytes()).expect("roster parses");
    assert_eq!(entries.len(), 3);

    let teacher = &entries[0];
    assert_eq!(teacher.line, 2);
    match &teacher.submission.details {
        RoleDetails::Teacher(details) => {
            assert_eq!(details.qualifications, "MSc Physics");
            assert_eq!(details.subjects, vec!["Physics", "Mathematics"]);
            assert_eq!(details.preferred_classes, vec!["Grade 10", "Grade 11"]);
        }
        other => panic!("expected teacher details, got {other:?}"),
    }
    assert_eq!(teacher.submission.phone, None);

    let student = &entries[1];
    assert_eq!(student.submission.details.role(), ApplicantRole::Student);
    assert_eq!(student.submission.phone.as_deref(), Some("+1 555 0101"));
    assert_eq!(
        student.submission.additional_info.as_deref(),
        Some("Transferring mid-year")
    );

    match &entries[2].submission.details {
        RoleDetails::Parent(parent) => {
            assert_eq!(parent.linked_student_id.as_deref(), Some("stu-42"))
        }
        other => panic!("expected parent details, got {other:?}"),
    }
}

#[test]
fn unknown_role_reports_line() {
    let roster = "\
full_name,email,role
Ada,ada@example.com,student
Zed,zed@example.com,janitor
";
    match parse_roster(roster.as_bytes()) {
        Err(RosterImportError::UnknownRole { line, value }) => {
            assert_eq!(line, 3);
            assert_eq!(value, "janitor");
        }
        other => panic!("expected unknown role, got {other:?}"),
    }
}

#[test]
fn import_pushes_rows_through_intake() {
    let (service, _, notifier) = build_service();
    let roster = format!(
        "{ROSTER}Second Sam,sam@example.com,student,,,,,,,\nNo Subjects,ns@example.com,teacher,,BEd,,,,,\n"
    );

    let summary = service
        .import_roster(roster.as_bytes())
        .expect("roster imports");

    assert_eq!(summary.accepted.len(), 3);
    assert_eq!(summary.rejected.len(), 2);
    assert_eq!(summary.rejected[0].line, 5);
    assert_eq!(summary.rejected[0].email, "sam@example.com");
    assert!(summary.rejected[0].reason.contains("already exists"));
    assert_eq!(summary.rejected[1].line, 6);
    assert!(summary.rejected[1].reason.contains("subject"));

    assert_eq!(service.list_pending().expect("pending").len(), 3);
    assert_eq!(notifier.templates().len(), 3);
}

#[test]
fn missing_roster_file_is_an_io_error() {
    let (service, _, _) = build_service();
    assert!(matches!(
        service.import_roster_file("/nonexistent/roster.csv"),
        Err(RosterImportError::Io(_))
    ));
}
