use crate::infra::{Registry, Services};
use clap::Args;
use schoolhouse::error::AppError;
use schoolhouse::workflows::admissions::{
    ApplicationSubmission, AssignmentSelection, ParentDetails, RoleDetails, TeacherDetails,
};
use schoolhouse::workflows::identity::ActorId;
use schoolhouse::workflows::integrations::{Channel, CredentialShapeClient, Credentials};
use schoolhouse::workflows::onboarding::{FeatureKey, FieldEdit, ThemeChoice};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// School name used for the onboarding walk-through
    #[arg(long, default_value = "Green Valley High School")]
    pub(crate) school_name: String,
    /// Skip the onboarding portion of the demo
    #[arg(long)]
    pub(crate) skip_onboarding: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// CSV roster with full_name, email, role and optional role-specific columns
    #[arg(long)]
    pub(crate) csv: PathBuf,
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let services = Services::in_memory(Registry::new(Arc::new(CredentialShapeClient)));
    let summary = services.admissions.import_roster_file(&args.csv)?;

    println!("Roster import: {}", args.csv.display());
    println!("  Accepted: {}", summary.accepted.len());
    for id in &summary.accepted {
        println!("    {}", id);
    }
    println!("  Rejected: {}", summary.rejected.len());
    for row in &summary.rejected {
        println!("    line {} ({}): {}", row.line, row.email, row.reason);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let services = Services::in_memory(Registry::new(Arc::new(CredentialShapeClient)));
    let reviewer = ActorId::new("principal");

    println!("School platform demo");
    match services
        .registry
        .connect(Channel::Email, Credentials::api_key("demo-mail-key"))
    {
        Ok(status) => println!("  Email channel connected: {}", status.connected),
        Err(err) => println!("  Email channel unavailable: {}", err),
    }

    run_admissions(&services, &reviewer);
    if !args.skip_onboarding {
        run_onboarding(&services, &args.school_name);
    }

    let queued = services.outbox.drain();
    println!("\nQueued applicant e-mails: {}", queued.len());
    for entry in queued {
        println!(
            "  {} -> {} ({})",
            entry.notice.template,
            entry.notice.recipient,
            entry.queued_at.format("%H:%M:%S")
        );
    }
    Ok(())
}

fn run_admissions(services: &Services, reviewer: &ActorId) {
    println!("\nAdmissions");
    let submissions = [
        ApplicationSubmission {
            full_name: "Teodora Tesla".to_string(),
            email: "teodora@example.com".to_string(),
            phone: Some("+254 711 000 111".to_string()),
            details: RoleDetails::Teacher(TeacherDetails {
                qualifications: "MSc Physics".to_string(),
                experience: "Four years at a sixth-form college".to_string(),
                subjects: vec!["Physics".to_string()],
                preferred_classes: vec!["Grade 10".to_string()],
            }),
            additional_info: None,
        },
        ApplicationSubmission {
            full_name: "Sam Otieno".to_string(),
            email: "sam@example.com".to_string(),
            phone: None,
            details: RoleDetails::Student,
            additional_info: Some("Transferring mid-term".to_string()),
        },
        ApplicationSubmission {
            full_name: "Grace Otieno".to_string(),
            email: "grace@example.com".to_string(),
            phone: None,
            details: RoleDetails::Parent(ParentDetails {
                linked_student_id: None,
            }),
            additional_info: None,
        },
    ];

    let mut accepted = Vec::new();
    for submission in submissions {
        let name = submission.full_name.clone();
        match services.admissions.submit(submission) {
            Ok(application) => {
                println!(
                    "  Received {} ({}) as {}",
                    name,
                    application.id,
                    application.role().label()
                );
                accepted.push(application);
            }
            Err(err) => println!("  Submission for {} refused: {}", name, err),
        }
    }

    let duplicate = ApplicationSubmission {
        full_name: "Teodora T.".to_string(),
        email: "TEODORA@example.com".to_string(),
        phone: None,
        details: RoleDetails::Student,
        additional_info: None,
    };
    if let Err(err) = services.admissions.submit(duplicate) {
        println!("  Duplicate refused: {}", err);
    }

    match services.admissions.pending_by_role() {
        Ok(groups) => {
            for (role, applications) in groups {
                println!("  Pending {}: {}", role.label(), applications.len());
            }
        }
        Err(err) => println!("  Pending queue unavailable: {}", err),
    }

    let [teacher, student, ..] = accepted.as_slice() else {
        return;
    };

    let mut selection = AssignmentSelection::new();
    for toggle in [
        selection.toggle_class("Grade 10"),
        selection.toggle_subject("Physics"),
    ] {
        if let Err(err) = toggle {
            println!("  Selection refused: {}", err);
        }
    }
    match services
        .admissions
        .approve(&teacher.id, selection.to_assignments(), reviewer)
    {
        Ok(user) => println!(
            "  Approved {}: classes [{}], subjects [{}]",
            user.full_name,
            user.assigned_classes.join(", "),
            user.assigned_subjects.join(", ")
        ),
        Err(err) => println!("  Approval failed: {}", err),
    }

    match services.admissions.reject(&student.id, None, reviewer) {
        Ok(record) => println!("  Rejected {}: {}", record.full_name, record.reason),
        Err(err) => println!("  Rejection failed: {}", err),
    }

    match services.admissions.status(&student.id) {
        Ok(view) => match serde_json::to_string_pretty(&view) {
            Ok(json) => println!("  Public status payload:\n{}", json),
            Err(err) => println!("  Status serialization failed: {}", err),
        },
        Err(err) => println!("  Status lookup failed: {}", err),
    }
}

fn run_onboarding(services: &Services, school_name: &str) {
    println!("\nOnboarding");
    let owner = ActorId::new("founder");
    let session = services.onboarding.start(&owner).session_id;

    let steps: Vec<Vec<FieldEdit>> = vec![
        vec![
            FieldEdit::Name(school_name.to_string()),
            FieldEdit::ContactEmail("admin@school.example".to_string()),
        ],
        vec![
            FieldEdit::Timezone("Africa/Nairobi".to_string()),
            FieldEdit::Country("Kenya".to_string()),
        ],
        vec![FieldEdit::Theme(Some(ThemeChoice::Classic))],
        vec![FieldEdit::MetaDescription(Some(
            "Admissions and school life".to_string(),
        ))],
        vec![
            FieldEdit::Feature {
                key: FeatureKey::Students,
                enabled: true,
            },
            FieldEdit::Feature {
                key: FeatureKey::Attendance,
                enabled: true,
            },
            FieldEdit::Feature {
                key: FeatureKey::Communications,
                enabled: true,
            },
        ],
        vec![FieldEdit::ActivityTracking(true)],
    ];

    let last = steps.len() - 1;
    for (index, edits) in steps.into_iter().enumerate() {
        let view = match services.onboarding.edit(&session, &owner, edits) {
            Ok(view) => view,
            Err(err) => {
                println!("  Edit failed: {}", err);
                return;
            }
        };
        println!(
            "  Step {} {}: ready to continue = {}",
            view.step_number, view.step_label, view.can_advance
        );
        if index < last {
            if let Err(err) = services.onboarding.next(&session, &owner) {
                println!("  Cannot advance: {}", err);
                return;
            }
        }
    }

    match services.onboarding.complete(&session, &owner) {
        Ok(provisioned) => {
            let tenant = &provisioned.tenant;
            println!("  Provisioned {} at /{}", tenant.name, tenant.slug);
            println!(
                "  Theme: {} ({})",
                tenant.branding.theme.label(),
                tenant.branding.primary_color
            );
            let enabled: Vec<&str> = provisioned
                .enabled_features()
                .into_iter()
                .map(FeatureKey::label)
                .collect();
            println!("  Enabled modules: {}", enabled.join(", "));
        }
        Err(err) => println!("  Setup failed: {}", err),
    }
}
