use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use rusoto_core::{credential::StaticProvider, HttpClient, Region, RusotoError};
use rusoto_ses::{
    CreateTemplateError, CreateTemplateRequest, GetTemplateError, GetTemplateRequest,
    ListTemplatesRequest, ListTemplatesResponse, Ses, SesClient, Template, UpdateTemplateError,
    UpdateTemplateRequest,
};
use thiserror::Error;

use super::template::{TemplateContent, TemplateMetadata, TemplateSpec};

// SES caps ListTemplates pages at 100 items and defaults to 10.
const LIST_PAGE_SIZE: i64 = 100;

type BoxedStdError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("template {0} does not exist")]
    NotFound(String),
    #[error("template {0} already exists")]
    AlreadyExists(String),
    #[error("unable to {operation}: empty response from SES")]
    EmptyResponse { operation: &'static str },
    #[error("unable to {operation}: {source}")]
    Remote {
        operation: &'static str,
        source: BoxedStdError,
    },
}

impl StoreError {
    pub fn remote<E>(operation: &'static str, err: E) -> Self
    where
        E: Into<BoxedStdError>,
    {
        Self::Remote {
            operation,
            source: err.into(),
        }
    }
}

/// Remote template store.
///
/// Existence is always answered from the listing. `get_template` fails for an
/// absent template, so it must not be used to test for one.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn list_templates(&self) -> Result<Vec<TemplateMetadata>, StoreError>;

    async fn get_template(&self, name: &str) -> Result<TemplateContent, StoreError>;

    async fn create_template(&self, spec: &TemplateSpec) -> Result<(), StoreError>;

    /// Replaces subject, text and html of an existing template in one call.
    async fn update_template(&self, spec: &TemplateSpec) -> Result<(), StoreError>;

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let templates = self.list_templates().await?;
        Ok(templates.iter().any(|template| template.name == name))
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key: String,
    pub secret_key: String,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"********")
            .finish()
    }
}

/// Connection parameters for SES. Without credentials the default AWS chain is used.
#[derive(Debug, Clone, PartialEq)]
pub struct SesSettings {
    pub region: Region,
    pub credentials: Option<AwsCredentials>,
}

pub struct SesTemplateStore {
    ses_client: SesClient,
}

impl SesTemplateStore {
    pub fn connect(settings: &SesSettings) -> Result<Self, StoreError> {
        let region = settings.region.clone();
        let ses_client = match &settings.credentials {
            Some(AwsCredentials {
                access_key,
                secret_key,
            }) => {
                let http_client =
                    HttpClient::new().map_err(|err| StoreError::remote("connect to SES", err))?;
                let provider = StaticProvider::new_minimal(access_key.clone(), secret_key.clone());
                SesClient::new_with(http_client, provider, region)
            }
            None => SesClient::new(region),
        };
        Ok(Self { ses_client })
    }
}

#[async_trait]
impl TemplateStore for SesTemplateStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_templates(&self) -> Result<Vec<TemplateMetadata>, StoreError> {
        let client = &self.ses_client;
        list_all_templates(move |next_token| async move {
            client
                .list_templates(ListTemplatesRequest {
                    max_items: Some(LIST_PAGE_SIZE),
                    next_token,
                })
                .await
                .map_err(|err| StoreError::remote("list templates", err))
        })
        .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_template(&self, name: &str) -> Result<TemplateContent, StoreError> {
        let resp = self
            .ses_client
            .get_template(GetTemplateRequest {
                template_name: name.to_string(),
            })
            .await
            .map_err(|err| map_get_error(name, err))?;

        resp.template
            .map(TemplateContent::from)
            .ok_or(StoreError::EmptyResponse {
                operation: "get template",
            })
    }

    #[tracing::instrument(level = "debug", skip(self, spec), fields(template = %spec.name))]
    async fn create_template(&self, spec: &TemplateSpec) -> Result<(), StoreError> {
        let _resp = self
            .ses_client
            .create_template(CreateTemplateRequest {
                template: spec.into(),
            })
            .await
            .map_err(|err| map_create_error(&spec.name, err))?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, spec), fields(template = %spec.name))]
    async fn update_template(&self, spec: &TemplateSpec) -> Result<(), StoreError> {
        let _resp = self
            .ses_client
            .update_template(UpdateTemplateRequest {
                template: spec.into(),
            })
            .await
            .map_err(|err| map_update_error(&spec.name, err))?;
        Ok(())
    }
}

/// Follows `NextToken` until SES stops returning one.
async fn list_all_templates<F, Fut>(mut fetch_page: F) -> Result<Vec<TemplateMetadata>, StoreError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ListTemplatesResponse, StoreError>>,
{
    let mut templates = Vec::new();
    let mut next_token = None;
    loop {
        let ListTemplatesResponse {
            templates_metadata,
            next_token: page_token,
            ..
        } = fetch_page(next_token).await?;

        templates.extend(
            templates_metadata
                .unwrap_or_default()
                .into_iter()
                .filter_map(|metadata| metadata.name)
                .map(|name| TemplateMetadata { name }),
        );

        match page_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }
    tracing::debug!(message = "listed templates", count = templates.len());
    Ok(templates)
}

fn map_get_error(name: &str, err: RusotoError<GetTemplateError>) -> StoreError {
    match err {
        RusotoError::Service(GetTemplateError::TemplateDoesNotExist(_)) => {
            StoreError::NotFound(name.to_string())
        }
        err => StoreError::remote("get template", err),
    }
}

fn map_create_error(name: &str, err: RusotoError<CreateTemplateError>) -> StoreError {
    match err {
        RusotoError::Service(CreateTemplateError::AlreadyExists(_)) => {
            StoreError::AlreadyExists(name.to_string())
        }
        err => StoreError::remote("create template", err),
    }
}

fn map_update_error(name: &str, err: RusotoError<UpdateTemplateError>) -> StoreError {
    match err {
        RusotoError::Service(UpdateTemplateError::TemplateDoesNotExist(_)) => {
            StoreError::NotFound(name.to_string())
        }
        err => StoreError::remote("update template", err),
    }
}

impl From<&TemplateSpec> for Template {
    fn from(spec: &TemplateSpec) -> Self {
        Template {
            template_name: spec.name.clone(),
            subject_part: Some(spec.subject_part.clone()),
            text_part: Some(spec.text_part.clone()),
            html_part: Some(spec.html_part.clone()),
        }
    }
}

impl From<Template> for TemplateContent {
    fn from(template: Template) -> Self {
        let Template {
            template_name,
            subject_part,
            text_part,
            html_part,
        } = template;
        Self {
            name: template_name,
            subject_part,
            text_part,
            html_part,
        }
    }
}
