use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MilitaryServiceStatus {
    Completed,
    Exempted,
    Ongoing,
    NotApplicable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
    Native,
}

// Singleton sections. Unset fields are omitted from the stored JSON so an
// upsert only overwrites what the caller sent.

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PersonalInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_married: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub military_service_status: Option<MilitaryServiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

// List sections.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SocialMedia {
    pub name: String,
    pub profile_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Education {
    pub degree: String,
    pub major: String,
    pub university_type: Option<String>,
    pub university_name: String,
    pub grade: Option<String>,
    pub entrance_year: Option<i32>,
    pub graduation_year: Option<i32>,
    pub country: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WorkExperience {
    pub position: String,
    pub company_name: String,
    pub country: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Language {
    pub name: String,
    pub proficiency: ProficiencyLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Skill {
    pub name: String,
    pub proficiency: ProficiencyLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Certificate {
    pub title: String,
    pub institute: String,
    pub date: Option<NaiveDate>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub title: String,
    pub customer_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub link: Option<String>,
    pub description: Option<String>,
}

/// The nine resume sections. `as_str` is the value stored in
/// `resume_entries.section`; `slug` is the path segment in the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    PersonalInfo,
    ContactInfo,
    SocialMedia,
    Education,
    WorkExperience,
    Languages,
    Skills,
    Certificates,
    Projects,
}

impl Section {
    pub const ALL: [Section; 9] = [
        Section::PersonalInfo,
        Section::ContactInfo,
        Section::SocialMedia,
        Section::Education,
        Section::WorkExperience,
        Section::Languages,
        Section::Skills,
        Section::Certificates,
        Section::Projects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::PersonalInfo => "personal_info",
            Section::ContactInfo => "contact_info",
            Section::SocialMedia => "social_media",
            Section::Education => "education",
            Section::WorkExperience => "work_experience",
            Section::Languages => "languages",
            Section::Skills => "skills",
            Section::Certificates => "certificates",
            Section::Projects => "projects",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Section::PersonalInfo => "personal-info",
            Section::ContactInfo => "contact-info",
            Section::SocialMedia => "social-media",
            Section::WorkExperience => "work-experience",
            other => other.as_str(),
        }
    }

    /// Accepts either the API slug or the stored name.
    pub fn parse(value: &str) -> Option<Section> {
        Section::ALL
            .into_iter()
            .find(|s| s.slug() == value || s.as_str() == value)
    }

    /// Singleton sections hold at most one row per user and are upserted.
    pub fn is_singleton(&self) -> bool {
        matches!(self, Section::PersonalInfo | Section::ContactInfo)
    }
}

/// A section payload, parsed into its typed shape.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionData {
    PersonalInfo(PersonalInfo),
    ContactInfo(ContactInfo),
    SocialMedia(SocialMedia),
    Education(Education),
    WorkExperience(WorkExperience),
    Language(Language),
    Skill(Skill),
    Certificate(Certificate),
    Project(Project),
}

impl SectionData {
    pub fn from_json(section: Section, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match section {
            Section::PersonalInfo => SectionData::PersonalInfo(serde_json::from_value(value)?),
            Section::ContactInfo => SectionData::ContactInfo(serde_json::from_value(value)?),
            Section::SocialMedia => SectionData::SocialMedia(serde_json::from_value(value)?),
            Section::Education => SectionData::Education(serde_json::from_value(value)?),
            Section::WorkExperience => SectionData::WorkExperience(serde_json::from_value(value)?),
            Section::Languages => SectionData::Language(serde_json::from_value(value)?),
            Section::Skills => SectionData::Skill(serde_json::from_value(value)?),
            Section::Certificates => SectionData::Certificate(serde_json::from_value(value)?),
            Section::Projects => SectionData::Project(serde_json::from_value(value)?),
        })
    }

    pub fn section(&self) -> Section {
        match self {
            SectionData::PersonalInfo(_) => Section::PersonalInfo,
            SectionData::ContactInfo(_) => Section::ContactInfo,
            SectionData::SocialMedia(_) => Section::SocialMedia,
            SectionData::Education(_) => Section::Education,
            SectionData::WorkExperience(_) => Section::WorkExperience,
            SectionData::Language(_) => Section::Languages,
            SectionData::Skill(_) => Section::Skills,
            SectionData::Certificate(_) => Section::Certificates,
            SectionData::Project(_) => Section::Projects,
        }
    }

    pub fn to_json(&self) -> Value {
        let value = match self {
            SectionData::PersonalInfo(d) => serde_json::to_value(d),
            SectionData::ContactInfo(d) => serde_json::to_value(d),
            SectionData::SocialMedia(d) => serde_json::to_value(d),
            SectionData::Education(d) => serde_json::to_value(d),
            SectionData::WorkExperience(d) => serde_json::to_value(d),
            SectionData::Language(d) => serde_json::to_value(d),
            SectionData::Skill(d) => serde_json::to_value(d),
            SectionData::Certificate(d) => serde_json::to_value(d),
            SectionData::Project(d) => serde_json::to_value(d),
        };
        // Plain structs of strings, dates and enums always serialize.
        value.unwrap_or_default()
    }
}
