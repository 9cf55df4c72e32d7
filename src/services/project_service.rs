use reqwest::multipart::{Form, Part};
use reqwest::Url;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::envelope::RecordBatch;
use crate::models::project::{MediaUpload, Project, ProjectInput};
use crate::models::query::ReportQuery;
use crate::services::api_client::ApiClient;
use crate::services::endpoints::Endpoint;

const MEDIA_FIELD: &str = "media_file";
const MAX_MEDIA_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct ProjectService {
    api: ApiClient,
}

impl ProjectService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list_projects(&self, query: &ReportQuery) -> AppResult<RecordBatch<Project>> {
        self.api.fetch_records(Endpoint::Projects, query).await
    }

    pub async fn create_project(&self, input: ProjectInput) -> AppResult<Project> {
        let form = build_project_form(validate_project_input(input)?)?;
        let project: Project = self.api.post_multipart(Endpoint::Projects, form).await?;
        info!(target: "app::api", project_id = project.id, "project created");
        Ok(project)
    }

    /// Fields are sent as given; leaving `media` empty keeps the stored file.
    pub async fn update_project(&self, project_id: i64, input: ProjectInput) -> AppResult<Project> {
        let form = build_project_form(validate_project_input(input)?)?;
        self.api
            .patch_multipart(Endpoint::Project(project_id), form)
            .await
    }

    pub async fn delete_project(&self, project_id: i64) -> AppResult<()> {
        self.api.delete(Endpoint::Project(project_id)).await?;
        info!(target: "app::api", project_id, "project deleted");
        Ok(())
    }
}

pub fn validate_project_input(mut input: ProjectInput) -> AppResult<ProjectInput> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
        return Err(AppError::validation("Project name is required"));
    }

    input.message = input
        .message
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty());

    input.youtube_link = match input.youtube_link.map(|link| link.trim().to_string()) {
        Some(link) if link.is_empty() => None,
        Some(link) => {
            let parsed = Url::parse(&link).map_err(|_| {
                AppError::validation(format!("{link} is not a valid link"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::validation("Video link must start with http:// or https://"));
            }
            Some(link)
        }
        None => None,
    };

    if let Some(media) = input.media.as_ref() {
        validate_media(media)?;
    }

    Ok(input)
}

fn validate_media(media: &MediaUpload) -> AppResult<()> {
    if media.file_name.trim().is_empty() {
        return Err(AppError::validation("Media file needs a name"));
    }
    if media.bytes.is_empty() {
        return Err(AppError::validation(format!("{} is empty", media.file_name)));
    }
    if media.bytes.len() > MAX_MEDIA_BYTES {
        return Err(AppError::validation(format!(
            "{} is larger than {} MB",
            media.file_name,
            MAX_MEDIA_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

pub fn build_project_form(input: ProjectInput) -> AppResult<Form> {
    let mut form = Form::new().text("name", input.name);

    if let Some(message) = input.message {
        form = form.text("message", message);
    }
    if let Some(link) = input.youtube_link {
        form = form.text("youtube_link", link);
    }
    if let Some(media) = input.media {
        let content_type = media
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let part = Part::bytes(media.bytes)
            .file_name(media.file_name)
            .mime_str(&content_type)
            .map_err(|err| AppError::validation(format!("Unsupported media type {content_type}: {err}")))?;
        form = form.part(MEDIA_FIELD, part);
    }

    Ok(form)
}
