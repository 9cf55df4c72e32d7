use serde::{Deserialize, Serialize};

use crate::models::table::Record;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub youtube_link: Option<String>,
    #[serde(default)]
    pub media_file: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
}

impl Record for Project {
    fn record_id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectInput {
    pub name: String,
    pub message: Option<String>,
    pub youtube_link: Option<String>,
    pub media: Option<MediaUpload>,
}
