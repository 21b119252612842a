use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::workflows::identity::ActorId;

/// Identifier wrapper for provisioned schools.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Functional modules a tenant can switch on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKey {
    Students,
    Teachers,
    Attendance,
    Classes,
    Timetable,
    Examinations,
    Fees,
    Communications,
    PageBuilder,
    Reports,
    Library,
    Transport,
}

impl FeatureKey {
    pub const fn ordered() -> [Self; 12] {
        [
            Self::Students,
            Self::Teachers,
            Self::Attendance,
            Self::Classes,
            Self::Timetable,
            Self::Examinations,
            Self::Fees,
            Self::Communications,
            Self::PageBuilder,
            Self::Reports,
            Self::Library,
            Self::Transport,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Teachers => "teachers",
            Self::Attendance => "attendance",
            Self::Classes => "classes",
            Self::Timetable => "timetable",
            Self::Examinations => "examinations",
            Self::Fees => "fees",
            Self::Communications => "communications",
            Self::PageBuilder => "page_builder",
            Self::Reports => "reports",
            Self::Library => "library",
            Self::Transport => "transport",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Students => "Student Management",
            Self::Teachers => "Teacher Management",
            Self::Attendance => "Attendance",
            Self::Classes => "Classes & Sections",
            Self::Timetable => "Timetable",
            Self::Examinations => "Examinations",
            Self::Fees => "Fee Management",
            Self::Communications => "Communications",
            Self::PageBuilder => "Page Builder",
            Self::Reports => "Reports & Analytics",
            Self::Library => "Library",
            Self::Transport => "Transport",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeChoice {
    Modern,
    Classic,
    Minimal,
    Vibrant,
}

impl ThemeChoice {
    pub const fn ordered() -> [Self; 4] {
        [Self::Modern, Self::Classic, Self::Minimal, Self::Vibrant]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Modern => "Modern",
            Self::Classic => "Classic",
            Self::Minimal => "Minimal",
            Self::Vibrant => "Vibrant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleSettings {
    pub timezone: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branding {
    pub theme: ThemeChoice,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub font_family: String,
    pub welcome_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoMetadata {
    pub meta_title: String,
    pub meta_description: Option<String>,
}

/// Everything the wizard collected, ready to be provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantDraft {
    pub name: String,
    pub slug: String,
    pub contact: ContactInfo,
    pub locale: LocaleSettings,
    pub branding: Branding,
    pub seo: SeoMetadata,
    /// One entry per feature key, enabled or not.
    pub features: BTreeMap<FeatureKey, bool>,
    pub activity_tracking: bool,
}

/// A provisioned school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub slug: String,
    pub contact: ContactInfo,
    pub locale: LocaleSettings,
    pub branding: Branding,
    pub seo: SeoMetadata,
    pub activity_tracking: bool,
    pub owner: ActorId,
    pub created_at: DateTime<Utc>,
}

/// Stored enabled/disabled record for one feature of one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlag {
    pub tenant_id: TenantId,
    pub feature: FeatureKey,
    pub enabled: bool,
}

/// Tenant together with its feature records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedTenant {
    pub tenant: Tenant,
    pub features: Vec<FeatureFlag>,
}

impl ProvisionedTenant {
    pub fn enabled_features(&self) -> Vec<FeatureKey> {
        self.features
            .iter()
            .filter(|flag| flag.enabled)
            .map(|flag| flag.feature)
            .collect()
    }
}
