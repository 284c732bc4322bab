//! Fixed prompts and the two analysis actions that select them.
//!
//! The prompts are product constants: defined once, never edited by the user,
//! and sent verbatim as the last part of every model request. Keeping them
//! here, next to the action that picks them, means the web form, the CLI and
//! the tests all agree on which text belongs to which button.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prompt for the "Review the Resume" action.
pub const RESUME_EVALUATION_PROMPT: &str = "\n\
You are an experienced Technical Human Resource Manager. Your task is to review the provided resume against the job description. \n\
Please provide a professional evaluation on whether the candidate's profile aligns with the role. \n\
Highlight the strengths and weaknesses of the applicant in relation to the specified job requirements.\n";

/// Prompt for the "Percentage Match" action.
pub const MATCH_PERCENTAGE_PROMPT: &str = "\n\
You are a skilled ATS (Applicant Tracking System) scanner with expertise in data science and ATS functionality. \n\
Your task is to evaluate the resume against the provided job description. Provide a percentage match if the resume aligns with the job description. \n\
Include the match percentage first, followed by missing keywords, and finally, your overall thoughts.\n";

/// Shown instead of a result when an action is triggered without a résumé.
pub const UPLOAD_NOTICE: &str = "Please upload your resume.";

/// Shown once a résumé has been received.
pub const UPLOAD_CONFIRMATION: &str = "Resume PDF uploaded successfully!";

/// The two mutually exclusive actions offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisAction {
    /// HR-manager style evaluation of strengths and weaknesses.
    Review,
    /// ATS-style match percentage, missing keywords, final thoughts.
    #[serde(rename = "match")]
    PercentageMatch,
}

impl AnalysisAction {
    /// All actions, in the order their buttons are laid out (and in order of
    /// precedence when more than one is submitted).
    pub const ALL: [AnalysisAction; 2] = [AnalysisAction::Review, AnalysisAction::PercentageMatch];

    /// The fixed prompt for this action.
    pub fn prompt(self) -> &'static str {
        match self {
            AnalysisAction::Review => RESUME_EVALUATION_PROMPT,
            AnalysisAction::PercentageMatch => MATCH_PERCENTAGE_PROMPT,
        }
    }

    /// Button caption.
    pub fn label(self) -> &'static str {
        match self {
            AnalysisAction::Review => "Review the Resume",
            AnalysisAction::PercentageMatch => "Percentage Match",
        }
    }

    /// Heading displayed above the model's reply.
    pub fn heading(self) -> &'static str {
        match self {
            AnalysisAction::Review => "Resume Evaluation Response",
            AnalysisAction::PercentageMatch => "Percentage Match Response",
        }
    }

    /// Value carried by the form's `action` field.
    pub fn form_value(self) -> &'static str {
        match self {
            AnalysisAction::Review => "review",
            AnalysisAction::PercentageMatch => "match",
        }
    }

    /// Pick the single action to run from every submitted `action` value.
    ///
    /// The earliest recognised value wins and the rest are ignored, so a
    /// submission that somehow carries both buttons still runs exactly one
    /// action. Unknown values are skipped.
    pub fn select<I, S>(values: I) -> Option<AnalysisAction>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values
            .into_iter()
            .find_map(|v| v.as_ref().parse::<AnalysisAction>().ok())
    }
}

impl fmt::Display for AnalysisAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AnalysisAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "review" | "review the resume" => Ok(AnalysisAction::Review),
            "match" | "percentage" | "percentage match" => Ok(AnalysisAction::PercentageMatch),
            other => Err(format!("unknown action '{other}' (expected 'review' or 'match')")),
        }
    }
}
