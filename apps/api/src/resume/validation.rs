use crate::resume::models::{
    Certificate, ContactInfo, Education, Language, PersonalInfo, Project, SectionData, Skill,
    SocialMedia, WorkExperience,
};

const ABOUT_ME_MAX: usize = 5000;
const DESCRIPTION_MAX: usize = 5000;

/// Checks string-length bounds and cross-field consistency of a parsed
/// section payload. Returns the first violation as a caller-facing message.
pub fn validate_section(data: &SectionData) -> Result<(), String> {
    match data {
        SectionData::PersonalInfo(d) => validate_personal_info(d),
        SectionData::ContactInfo(d) => validate_contact_info(d),
        SectionData::SocialMedia(d) => validate_social_media(d),
        SectionData::Education(d) => validate_education(d),
        SectionData::WorkExperience(d) => validate_work_experience(d),
        SectionData::Language(d) => validate_language(d),
        SectionData::Skill(d) => validate_skill(d),
        SectionData::Certificate(d) => validate_certificate(d),
        SectionData::Project(d) => validate_project(d),
    }
}

fn required(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    optional(field, Some(value), max)
}

fn optional(field: &str, value: Option<&str>, max: usize) -> Result<(), String> {
    match value {
        Some(v) if v.chars().count() > max => {
            Err(format!("{field} must be at most {max} characters"))
        }
        _ => Ok(()),
    }
}

// Singleton sections are merged field by field on upsert, so their rules
// must never relate two fields to each other.
fn validate_personal_info(d: &PersonalInfo) -> Result<(), String> {
    optional("about_me", d.about_me.as_deref(), ABOUT_ME_MAX)
}

fn validate_contact_info(d: &ContactInfo) -> Result<(), String> {
    optional("phone_number", d.phone_number.as_deref(), 15)?;
    optional("email", d.email.as_deref(), 100)?;
    if let Some(email) = d.email.as_deref() {
        if !email.is_empty() && !email.contains('@') {
            return Err("email must be a valid address".to_string());
        }
    }
    optional("landline", d.landline.as_deref(), 20)?;
    optional("website", d.website.as_deref(), 255)?;
    optional("country", d.country.as_deref(), 100)?;
    optional("province", d.province.as_deref(), 100)?;
    optional("city", d.city.as_deref(), 100)?;
    optional("address", d.address.as_deref(), DESCRIPTION_MAX)
}

fn validate_social_media(d: &SocialMedia) -> Result<(), String> {
    required("name", &d.name, 50)?;
    required("profile_id", &d.profile_id, 100)
}

fn validate_education(d: &Education) -> Result<(), String> {
    required("degree", &d.degree, 100)?;
    required("major", &d.major, 100)?;
    optional("university_type", d.university_type.as_deref(), 100)?;
    required("university_name", &d.university_name, 255)?;
    optional("grade", d.grade.as_deref(), 20)?;
    optional("country", d.country.as_deref(), 100)?;
    optional("province", d.province.as_deref(), 100)?;
    optional("city", d.city.as_deref(), 100)?;
    if let (Some(start), Some(end)) = (d.entrance_year, d.graduation_year) {
        if end < start {
            return Err("graduation_year must not be before entrance_year".to_string());
        }
    }
    Ok(())
}

fn validate_work_experience(d: &WorkExperience) -> Result<(), String> {
    required("position", &d.position, 100)?;
    required("company_name", &d.company_name, 255)?;
    optional("country", d.country.as_deref(), 100)?;
    optional("province", d.province.as_deref(), 100)?;
    optional("city", d.city.as_deref(), 100)?;
    optional("description", d.description.as_deref(), DESCRIPTION_MAX)?;
    if let Some(end) = d.end_date {
        if end < d.start_date {
            return Err("end_date must not be before start_date".to_string());
        }
    }
    Ok(())
}

fn validate_language(d: &Language) -> Result<(), String> {
    required("name", &d.name, 50)
}

fn validate_skill(d: &Skill) -> Result<(), String> {
    required("name", &d.name, 100)
}

fn validate_certificate(d: &Certificate) -> Result<(), String> {
    required("title", &d.title, 255)?;
    required("institute", &d.institute, 255)?;
    optional("link", d.link.as_deref(), 255)
}

fn validate_project(d: &Project) -> Result<(), String> {
    required("title", &d.title, 255)?;
    optional("customer_name", d.customer_name.as_deref(), 255)?;
    optional("link", d.link.as_deref(), 255)?;
    optional("description", d.description.as_deref(), DESCRIPTION_MAX)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::resume::models::ProficiencyLevel;

    fn work(start: (i32, u32, u32), end: Option<(i32, u32, u32)>) -> SectionData {
        let date = |(y, m, d): (i32, u32, u32)| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        SectionData::WorkExperience(WorkExperience {
            position: "Backend Engineer".to_string(),
            company_name: "Acme".to_string(),
            country: None,
            province: None,
            city: None,
            start_date: date(start),
            end_date: end.map(date),
            is_current: end.is_none(),
            description: None,
        })
    }

    #[test]
    fn test_end_before_start_rejected() {
        assert!(validate_section(&work((2022, 1, 1), Some((2021, 12, 31)))).is_err());
        assert!(validate_section(&work((2022, 1, 1), Some((2022, 1, 1)))).is_ok());
        assert!(validate_section(&work((2022, 1, 1), None)).is_ok());
    }

    #[test]
    fn test_required_fields_must_not_be_blank() {
        let skill = SectionData::Skill(Skill {
            name: "   ".to_string(),
            proficiency: ProficiencyLevel::Expert,
        });
        assert_eq!(validate_section(&skill), Err("name is required".to_string()));
    }

    #[test]
    fn test_length_bounds_count_characters() {
        let ok = SectionData::SocialMedia(SocialMedia {
            name: "ل".repeat(50),
            profile_id: "me".to_string(),
        });
        assert!(validate_section(&ok).is_ok());

        let too_long = SectionData::SocialMedia(SocialMedia {
            name: "x".repeat(51),
            profile_id: "me".to_string(),
        });
        assert!(validate_section(&too_long).is_err());
    }

    #[test]
    fn test_contact_email_shape() {
        let bad = SectionData::ContactInfo(ContactInfo {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        });
        assert!(validate_section(&bad).is_err());

        let good = SectionData::ContactInfo(ContactInfo {
            email: Some("me@example.com".to_string()),
            phone_number: Some("09120000000".to_string()),
            ..Default::default()
        });
        assert!(validate_section(&good).is_ok());
    }

    #[test]
    fn test_graduation_before_entrance_rejected() {
        let edu = SectionData::Education(Education {
            degree: "BSc".to_string(),
            major: "CS".to_string(),
            university_type: None,
            university_name: "Tehran".to_string(),
            grade: None,
            entrance_year: Some(2018),
            graduation_year: Some(2016),
            country: None,
            province: None,
            city: None,
            is_current: false,
        });
        assert!(validate_section(&edu).is_err());
    }

    #[test]
    fn test_merged_singleton_payloads_stay_valid() {
        use serde_json::json;

        use crate::resume::models::Section;

        let stored = json!({"email": "me@example.com", "city": "Tehran"});
        let patch = json!({"phone_number": "09120000000", "city": "Shiraz"});
        for part in [&stored, &patch] {
            let data = SectionData::from_json(Section::ContactInfo, part.clone()).unwrap();
            assert!(validate_section(&data).is_ok());
        }

        // Same semantics as `data || EXCLUDED.data`: right-hand keys win.
        let mut merged = stored.as_object().unwrap().clone();
        merged.extend(patch.as_object().unwrap().clone());
        let data = SectionData::from_json(Section::ContactInfo, merged.into()).unwrap();
        assert!(validate_section(&data).is_ok());
        assert_eq!(
            data.to_json(),
            json!({"email": "me@example.com", "city": "Shiraz", "phone_number": "09120000000"})
        );
    }
}
