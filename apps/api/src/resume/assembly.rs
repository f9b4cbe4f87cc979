use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;

use crate::models::resume::ResumeEntryRow;
use crate::resume::models::{
    Certificate, ContactInfo, Education, Language, PersonalInfo, Project, Section, SectionData,
    Skill, SocialMedia, WorkExperience,
};
use crate::resume::sections::list_all_entries;

/// A stored section row with its typed payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Entry<T> {
    pub id: i64,
    #[serde(flatten)]
    pub data: T,
}

/// Everything a user has entered, grouped by section.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ResumeAggregate {
    pub personal_info: Option<Entry<PersonalInfo>>,
    pub contact_info: Option<Entry<ContactInfo>>,
    pub social_media: Vec<Entry<SocialMedia>>,
    pub education: Vec<Entry<Education>>,
    pub work_experiences: Vec<Entry<WorkExperience>>,
    pub languages: Vec<Entry<Language>>,
    pub skills: Vec<Entry<Skill>>,
    pub certificates: Vec<Entry<Certificate>>,
    pub projects: Vec<Entry<Project>>,
}

impl ResumeAggregate {
    pub fn is_empty(&self) -> bool {
        *self == ResumeAggregate::default()
    }
}

/// Groups rows into the aggregate, keeping row order within each section.
/// Rows with an unknown section or a payload that no longer parses are skipped.
pub fn assemble(rows: Vec<ResumeEntryRow>) -> ResumeAggregate {
    let mut resume = ResumeAggregate::default();

    for row in rows {
        let Some(section) = Section::parse(&row.section) else {
            warn!("Skipping resume entry {} with unknown section '{}'", row.id, row.section);
            continue;
        };
        let data = match SectionData::from_json(section, row.data) {
            Ok(data) => data,
            Err(e) => {
                warn!("Skipping unreadable resume entry {}: {e}", row.id);
                continue;
            }
        };

        let id = row.id;
        match data {
            SectionData::PersonalInfo(data) => resume.personal_info = Some(Entry { id, data }),
            SectionData::ContactInfo(data) => resume.contact_info = Some(Entry { id, data }),
            SectionData::SocialMedia(data) => resume.social_media.push(Entry { id, data }),
            SectionData::Education(data) => resume.education.push(Entry { id, data }),
            SectionData::WorkExperience(data) => resume.work_experiences.push(Entry { id, data }),
            SectionData::Language(data) => resume.languages.push(Entry { id, data }),
            SectionData::Skill(data) => resume.skills.push(Entry { id, data }),
            SectionData::Certificate(data) => resume.certificates.push(Entry { id, data }),
            SectionData::Project(data) => resume.projects.push(Entry { id, data }),
        }
    }

    resume
}

pub async fn load_resume(pool: &PgPool, user_id: i64) -> Result<ResumeAggregate, sqlx::Error> {
    Ok(assemble(list_all_entries(pool, user_id).await?))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::{json, Value};

    use super::*;
    use crate::resume::models::{Gender, ProficiencyLevel};

    fn row(id: i64, section: &str, data: Value) -> ResumeEntryRow {
        ResumeEntryRow {
            id,
            user_id: 1,
            section: section.to_string(),
            data,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_assemble_groups_by_section() {
        let resume = assemble(vec![
            row(1, "personal_info", json!({"gender": "male"})),
            row(2, "skills", json!({"name": "Rust", "proficiency": "expert"})),
            row(3, "skills", json!({"name": "SQL", "proficiency": "advanced"})),
            row(4, "languages", json!({"name": "Persian", "proficiency": "native"})),
        ]);

        assert_eq!(resume.personal_info.as_ref().map(|p| p.id), Some(1));
        assert_eq!(
            resume.personal_info.unwrap().data.gender,
            Some(Gender::Male)
        );
        assert_eq!(
            resume.skills.iter().map(|s| s.data.name.as_str()).collect::<Vec<_>>(),
            vec!["Rust", "SQL"]
        );
        assert_eq!(resume.languages[0].data.proficiency, ProficiencyLevel::Native);
        assert!(resume.projects.is_empty());
    }

    #[test]
    fn test_assemble_skips_bad_rows() {
        let resume = assemble(vec![
            row(1, "hobbies", json!({"name": "chess"})),
            row(2, "skills", json!({"name": "Rust"})),
        ]);
        assert!(resume.is_empty());
    }

    #[test]
    fn test_entry_serializes_flat() {
        let resume = assemble(vec![row(
            7,
            "social_media",
            json!({"name": "github", "profile_id": "octo"}),
        )]);
        let value = serde_json::to_value(&resume).unwrap();
        assert_eq!(
            value["social_media"][0],
            json!({"id": 7, "name": "github", "profile_id": "octo"})
        );
        assert_eq!(value["personal_info"], Value::Null);
    }
}
