//! Server-rendered HTML for the form and its result area.
//!
//! The markup lives in an askama template; every interpolated value goes
//! through askama's HTML escaper.

use crate::error::AtsError;
use crate::output::AnalysisResult;
use crate::prompts::{AnalysisAction, UPLOAD_CONFIRMATION};
use crate::service::Outcome;
use askama::Template;

/// What goes under the form.
#[derive(Debug, Clone, Copy)]
pub enum ResultArea<'a> {
    Empty,
    Outcome(&'a Outcome),
    Error(&'a AtsError),
}

/// Everything needed to render the page once.
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    /// Echoed back into the text area so the user can re-run.
    pub job_description: &'a str,
    /// Filename of the résumé received with this request, if any.
    pub uploaded: Option<&'a str>,
    pub result: ResultArea<'a>,
}

impl<'a> PageView<'a> {
    pub fn empty() -> Self {
        Self {
            job_description: "",
            uploaded: None,
            result: ResultArea::Empty,
        }
    }
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>AI ATS</title>
<style>
body { font-family: system-ui, sans-serif; margin: 0; background: #fafafa; }
main { max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }
label { display: block; margin-top: 1rem; font-weight: 600; }
textarea { width: 100%; box-sizing: border-box; }
.actions { margin-top: 1rem; display: flex; gap: .5rem; }
.uploaded { color: #1a7f37; }
.notice { color: #9a6700; }
.error pre { color: #cf222e; }
pre { white-space: pre-wrap; background: #fff; padding: 1rem; border: 1px solid #ddd; }
</style>
</head>
<body>
<main>
<h1>AI Resume ATS</h1>
<form method="post" action="/analyze" enctype="multipart/form-data">
<label for="job_description">Provide Job Description: </label>
<textarea id="job_description" name="job_description" rows="10">{{ job_description }}</textarea>
<label for="resume">Upload your resume</label>
<input id="resume" type="file" name="resume" accept="application/pdf,.pdf">
{% if let Some(name) = uploaded %}<p class="uploaded">{{ confirmation }} <span>{{ name }}</span></p>
{% endif %}<div class="actions">
{% for action in actions %}<button type="submit" name="action" value="{{ action.form_value() }}">{{ action.label() }}</button>
{% endfor %}</div>
</form>
{% if let Some(notice) = notice %}<p class="notice">{{ notice }}</p>
{% endif %}{% if let Some(result) = completed %}<section class="result">
<h2>{{ result.action.heading() }}</h2>
<pre>{{ result.text }}</pre>
</section>
{% endif %}{% if let Some(code) = error_code %}<section class="error" data-code="{{ code }}">
<pre>{{ error_message }}</pre>
</section>
{% endif %}</main>
</body>
</html>
"#,
    ext = "html"
)]
struct PageTemplate<'a> {
    job_description: &'a str,
    uploaded: Option<&'a str>,
    confirmation: &'static str,
    actions: [AnalysisAction; 2],
    notice: Option<&'a str>,
    completed: Option<&'a AnalysisResult>,
    error_code: Option<&'static str>,
    error_message: String,
}

impl<'a> From<&PageView<'a>> for PageTemplate<'a> {
    fn from(view: &PageView<'a>) -> Self {
        let mut page = PageTemplate {
            job_description: view.job_description,
            uploaded: view.uploaded,
            confirmation: UPLOAD_CONFIRMATION,
            actions: AnalysisAction::ALL,
            notice: None,
            completed: None,
            error_code: None,
            error_message: String::new(),
        };
        match view.result {
            ResultArea::Empty => {}
            ResultArea::Outcome(Outcome::UploadRequired { notice }) => {
                page.notice = Some(notice.as_str());
            }
            ResultArea::Outcome(Outcome::Completed(result)) => page.completed = Some(result),
            ResultArea::Error(err) => {
                page.error_code = Some(err.code());
                page.error_message = err.to_string();
            }
        }
        page
    }
}

pub fn render(view: &PageView<'_>) -> Result<String, AtsError> {
    PageTemplate::from(view)
        .render()
        .map_err(|e| AtsError::Internal(format!("page template: {e}")))
}
