use chrono::NaiveDate;
use handlebars::Handlebars;
use serde::Serialize;

use crate::models::template::Template;
use crate::models::user::User;
use crate::render::RenderError;
use crate::resume::assembly::ResumeAggregate;

/// The view of the owner exposed to templates. No wallet data.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeOwner {
    pub full_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: String,
    pub birth_date: Option<NaiveDate>,
    pub profile_picture: Option<String>,
}

impl From<&User> for ResumeOwner {
    fn from(user: &User) -> Self {
        let full_name = [user.first_name.as_deref(), user.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            full_name,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: user.phone_number.clone(),
            birth_date: user.birth_date,
            profile_picture: user.profile_picture.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateMeta {
    pub name: String,
    pub direction: String,
    pub language: String,
}

impl From<&Template> for TemplateMeta {
    fn from(t: &Template) -> Self {
        Self {
            name: t.name.clone(),
            direction: t.direction.clone(),
            language: t.language.clone(),
        }
    }
}

/// Root object handed to every template: `user`, `resume`, `template`.
#[derive(Debug, Serialize)]
pub struct RenderContext<'a> {
    pub user: ResumeOwner,
    pub resume: &'a ResumeAggregate,
    pub template: TemplateMeta,
}

/// Renders template sources with HTML escaping and the resume helpers.
pub struct HtmlRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_helper("humanize", Box::new(humanize_helper));
        Self { handlebars }
    }

    pub fn render(&self, source: &str, context: &RenderContext<'_>) -> Result<String, RenderError> {
        self.handlebars
            .render_template(source, context)
            .map_err(|e| RenderError::Template(e.to_string()))
    }
}

/// `not_applicable` -> `Not applicable`
fn humanize(value: &str) -> String {
    let spaced = value.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn humanize_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&humanize(param))?;
    Ok(())
}
