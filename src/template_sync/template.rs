use std::fmt;

use serde::{Deserialize, Serialize};

/// Desired state of a single SES template for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSpec {
    pub name: String,
    pub subject_part: String,
    pub text_part: String,
    pub html_part: String,
}

impl TemplateSpec {
    pub fn new(
        name: impl Into<String>,
        subject_part: impl Into<String>,
        text_part: impl Into<String>,
        html_part: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            subject_part: subject_part.into(),
            text_part: text_part.into(),
            html_part: html_part.into(),
        }
    }
}

/// Entry of the template listing. Carries no content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMetadata {
    pub name: String,
}

#[cfg(test)]
impl From<&str> for TemplateMetadata {
    fn from(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Template as stored remotely. Serializes with the SES field names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateContent {
    #[serde(rename = "TemplateName")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_part: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_part: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_part: Option<String>,
}

impl From<&TemplateSpec> for TemplateContent {
    fn from(spec: &TemplateSpec) -> Self {
        Self {
            name: spec.name.clone(),
            subject_part: Some(spec.subject_part.clone()),
            text_part: Some(spec.text_part.clone()),
            html_part: Some(spec.html_part.clone()),
        }
    }
}

impl fmt::Display for TemplateContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
