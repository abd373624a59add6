use chrono::{DateTime, Utc};
use common::FileType;
use serde::{Deserialize, Serialize};

use crate::entity::attachment;

/// Response DTO for a single attachment.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AttachmentResponse {
    #[schema(example = 7)]
    pub id: i32,
    /// Storage name of the file.
    #[schema(example = "attachments/2026/03/figure1.png")]
    pub file: String,
    /// Display filename.
    #[schema(example = "figure1.png")]
    pub name: String,
    pub file_type: FileType,
    /// MIME type; empty when unknown.
    #[schema(example = "image/png")]
    pub mime_type: String,
    /// Size in bytes.
    #[schema(example = 142857)]
    pub size: i64,
    #[schema(example = "139.51 KB")]
    pub formatted_size: String,
    #[schema(example = "png")]
    pub extension: String,
    pub description: String,
    pub order: i32,
    #[schema(example = "post")]
    pub owner_type: String,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Response DTO for listing attachments.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AttachmentListResponse {
    pub attachments: Vec<AttachmentResponse>,
    pub total: u64,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttachmentListQuery {
    /// Only attachments of this type.
    pub file_type: Option<FileType>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateAttachmentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub order: Option<i32>,
}

impl From<attachment::Model> for AttachmentResponse {
    fn from(model: attachment::Model) -> Self {
        Self {
            formatted_size: model.formatted_size(),
            extension: model.extension(),
            id: model.id,
            file: model.file,
            name: model.name,
            file_type: model.file_type,
            mime_type: model.mime_type,
            size: model.size,
            description: model.description,
            order: model.order,
            owner_type: model.owner_type,
            owner_id: model.owner_id,
            created_at: model.created_at,
        }
    }
}
