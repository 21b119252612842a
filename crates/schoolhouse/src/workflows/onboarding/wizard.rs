use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::domain::{
    Branding, ContactInfo, FeatureKey, LocaleSettings, SeoMetadata, TenantDraft, ThemeChoice,
};
use super::slug::slugify;

pub const DEFAULT_PRIMARY_COLOR: &str = "#2563eb";
pub const DEFAULT_SECONDARY_COLOR: &str = "#64748b";
pub const DEFAULT_ACCENT_COLOR: &str = "#f59e0b";
pub const DEFAULT_FONT_FAMILY: &str = "Inter";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    SchoolInfo,
    Location,
    Branding,
    Seo,
    Modules,
    Activity,
}

impl OnboardingStep {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::SchoolInfo,
            Self::Location,
            Self::Branding,
            Self::Seo,
            Self::Modules,
            Self::Activity,
        ]
    }

    /// One-based position shown to the user.
    pub const fn number(self) -> u8 {
        match self {
            Self::SchoolInfo => 1,
            Self::Location => 2,
            Self::Branding => 3,
            Self::Seo => 4,
            Self::Modules => 5,
            Self::Activity => 6,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SchoolInfo => "School Information",
            Self::Location => "Location",
            Self::Branding => "Branding",
            Self::Seo => "SEO",
            Self::Modules => "Modules",
            Self::Activity => "Activity Tracking",
        }
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::SchoolInfo => Some(Self::Location),
            Self::Location => Some(Self::Branding),
            Self::Branding => Some(Self::Seo),
            Self::Seo => Some(Self::Modules),
            Self::Modules => Some(Self::Activity),
            Self::Activity => None,
        }
    }

    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::SchoolInfo => None,
            Self::Location => Some(Self::SchoolInfo),
            Self::Branding => Some(Self::Location),
            Self::Seo => Some(Self::Branding),
            Self::Modules => Some(Self::Seo),
            Self::Activity => Some(Self::Modules),
        }
    }
}

/// Raw wizard fields as the user currently sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingForm {
    pub name: String,
    pub slug: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub timezone: String,
    pub country: String,
    pub theme: Option<ThemeChoice>,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub font_family: String,
    pub welcome_message: Option<String>,
    pub meta_title: String,
    pub meta_description: Option<String>,
    pub features: BTreeSet<FeatureKey>,
    pub activity_tracking: bool,
}

impl Default for OnboardingForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            slug: String::new(),
            contact_email: String::new(),
            contact_phone: None,
            address: None,
            timezone: String::new(),
            country: String::new(),
            theme: Some(ThemeChoice::Modern),
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            secondary_color: DEFAULT_SECONDARY_COLOR.to_string(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            welcome_message: None,
            meta_title: String::new(),
            meta_description: None,
            features: BTreeSet::new(),
            activity_tracking: false,
        }
    }
}

/// A single user edit, as sent by the wizard front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldEdit {
    Name(String),
    Slug(String),
    ContactEmail(String),
    ContactPhone(Option<String>),
    Address(Option<String>),
    Timezone(String),
    Country(String),
    Theme(Option<ThemeChoice>),
    PrimaryColor(String),
    SecondaryColor(String),
    AccentColor(String),
    FontFamily(String),
    WelcomeMessage(Option<String>),
    MetaTitle(String),
    MetaDescription(Option<String>),
    Feature { key: FeatureKey, enabled: bool },
    ActivityTracking(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("{message}")]
    Incomplete {
        step: OnboardingStep,
        message: &'static str,
    },
    #[error("activity tracking is the last step, complete the setup instead")]
    NoFurtherStep,
    #[error("setup can only be completed from the last step")]
    NotOnFinalStep(OnboardingStep),
}

/// Six-step school setup with sticky derived slug and meta title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnboardingWizard {
    step: OnboardingStep,
    form: OnboardingForm,
    slug_touched: bool,
    meta_title_touched: bool,
}

impl Default for OnboardingWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingWizard {
    pub fn new() -> Self {
        Self {
            step: OnboardingStep::SchoolInfo,
            form: OnboardingForm::default(),
            slug_touched: false,
            meta_title_touched: false,
        }
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn form(&self) -> &OnboardingForm {
        &self.form
    }

    pub fn slug_touched(&self) -> bool {
        self.slug_touched
    }

    pub fn meta_title_touched(&self) -> bool {
        self.meta_title_touched
    }

    /// Update the school name and re-derive the slug and meta title unless they were overridden.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.form.name = name.into();
        if !self.slug_touched {
            self.form.slug = slugify(&self.form.name);
        }
        if !self.meta_title_touched {
            self.form.meta_title = self.form.name.trim().to_string();
        }
    }

    /// Manual slug entry. An empty result hands the field back to auto-derivation.
    pub fn set_slug(&mut self, slug: &str) {
        let slug = slugify(slug);
        if slug.is_empty() {
            self.slug_touched = false;
            self.form.slug = slugify(&self.form.name);
        } else {
            self.slug_touched = true;
            self.form.slug = slug;
        }
    }

    pub fn set_meta_title(&mut self, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            self.meta_title_touched = false;
            self.form.meta_title = self.form.name.trim().to_string();
        } else {
            self.meta_title_touched = true;
            self.form.meta_title = title.to_string();
        }
    }

    /// Flip a module on or off. Returns whether it is enabled afterwards.
    pub fn toggle_feature(&mut self, key: FeatureKey) -> bool {
        if self.form.features.remove(&key) {
            false
        } else {
            self.form.features.insert(key);
            true
        }
    }

    pub fn set_feature(&mut self, key: FeatureKey, enabled: bool) {
        if enabled {
            self.form.features.insert(key);
        } else {
            self.form.features.remove(&key);
        }
    }

    pub fn apply(&mut self, edit: FieldEdit) {
        match edit {
            FieldEdit::Name(name) => self.set_name(name),
            FieldEdit::Slug(slug) => self.set_slug(&slug),
            FieldEdit::MetaTitle(title) => self.set_meta_title(&title),
            FieldEdit::Feature { key, enabled } => self.set_feature(key, enabled),
            FieldEdit::ContactEmail(email) => self.form.contact_email = email.trim().to_string(),
            FieldEdit::ContactPhone(phone) => self.form.contact_phone = optional(phone),
            FieldEdit::Address(address) => self.form.address = optional(address),
            FieldEdit::Timezone(timezone) => self.form.timezone = timezone.trim().to_string(),
            FieldEdit::Country(country) => self.form.country = country.trim().to_string(),
            FieldEdit::Theme(theme) => self.form.theme = theme,
            FieldEdit::PrimaryColor(color) => self.form.primary_color = color.trim().to_string(),
            FieldEdit::SecondaryColor(color) => {
                self.form.secondary_color = color.trim().to_string()
            }
            FieldEdit::AccentColor(color) => self.form.accent_color = color.trim().to_string(),
            FieldEdit::FontFamily(font) => self.form.font_family = font.trim().to_string(),
            FieldEdit::WelcomeMessage(message) => self.form.welcome_message = optional(message),
            FieldEdit::MetaDescription(description) => {
                self.form.meta_description = optional(description)
            }
            FieldEdit::ActivityTracking(enabled) => self.form.activity_tracking = enabled,
        }
    }

    pub fn can_advance(&self, step: OnboardingStep) -> bool {
        self.check(step).is_ok()
    }

    /// Gate for leaving `step`.
    pub fn check(&self, step: OnboardingStep) -> Result<(), WizardError> {
        let form = &self.form;
        let complete = match step {
            OnboardingStep::SchoolInfo => {
                !blank(&form.name) && !blank(&form.slug) && !blank(&form.contact_email)
            }
            OnboardingStep::Location => !blank(&form.timezone) && !blank(&form.country),
            OnboardingStep::Branding => {
                form.theme.is_some() && !blank(&form.primary_color) && !blank(&form.font_family)
            }
            OnboardingStep::Seo | OnboardingStep::Activity => true,
            OnboardingStep::Modules => !form.features.is_empty(),
        };

        if complete {
            Ok(())
        } else {
            Err(WizardError::Incomplete {
                step,
                message: gate_message(step),
            })
        }
    }

    pub fn next(&mut self) -> Result<OnboardingStep, WizardError> {
        self.check(self.step)?;
        let next = self.step.next().ok_or(WizardError::NoFurtherStep)?;
        self.step = next;
        Ok(next)
    }

    /// Step back; a no-op on the first step.
    pub fn back(&mut self) -> OnboardingStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Snapshot the form for provisioning. Every gate is re-checked.
    pub fn finish(&self) -> Result<TenantDraft, WizardError> {
        if self.step != OnboardingStep::Activity {
            return Err(WizardError::NotOnFinalStep(self.step));
        }
        for step in OnboardingStep::ordered() {
            self.check(step)?;
        }

        let form = &self.form;
        let theme = form.theme.unwrap_or(ThemeChoice::Modern);
        let features: BTreeMap<FeatureKey, bool> = FeatureKey::ordered()
            .into_iter()
            .map(|key| (key, form.features.contains(&key)))
            .collect();
        let name = form.name.trim().to_string();
        let meta_title = if blank(&form.meta_title) {
            name.clone()
        } else {
            form.meta_title.clone()
        };

        Ok(TenantDraft {
            name,
            slug: form.slug.clone(),
            contact: ContactInfo {
                email: form.contact_email.clone(),
                phone: form.contact_phone.clone(),
                address: form.address.clone(),
            },
            locale: LocaleSettings {
                timezone: form.timezone.clone(),
                country: form.country.clone(),
            },
            branding: Branding {
                theme,
                primary_color: form.primary_color.clone(),
                secondary_color: non_blank_or(&form.secondary_color, DEFAULT_SECONDARY_COLOR),
                accent_color: non_blank_or(&form.accent_color, DEFAULT_ACCENT_COLOR),
                font_family: form.font_family.clone(),
                welcome_message: form.welcome_message.clone(),
            },
            seo: SeoMetadata {
                meta_title,
                meta_description: form.meta_description.clone(),
            },
            features,
            activity_tracking: form.activity_tracking,
        })
    }
}

fn gate_message(step: OnboardingStep) -> &'static str {
    match step {
        OnboardingStep::SchoolInfo => "school name, URL slug and contact email are required",
        OnboardingStep::Location => "select a timezone and a country",
        OnboardingStep::Branding => "choose a theme, a primary color and a font",
        OnboardingStep::Modules => "enable at least one module",
        OnboardingStep::Seo | OnboardingStep::Activity => "",
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    if blank(value) {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
