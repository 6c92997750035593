use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use uuid::Uuid;

use crate::{
    api_response::ApiResponse,
    app_state::SharedState,
    authentication::auth::{require_role, AuthUser, EVERYONE, MANAGERS},
    error::{ApiError, ApiResult},
    services::{
        file_service::{FileService, Upload},
        file_storage::sanitize_filename,
    },
    task::Attachment,
};

const FILE_FIELD: &str = "file";

/// Drains the `file` field of a multipart body.
async fn read_upload(mut multipart: Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or("upload").to_string();
        let mimetype = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid file upload: {e}")))?;
        return Ok(Upload { original_name, mimetype, bytes: bytes.to_vec() });
    }
    Err(ApiError::bad_request("No file uploaded"))
}

pub struct FileController {}

impl FileController {
    pub async fn upload(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(task_id): Path<Uuid>,
        multipart: Multipart,
    ) -> ApiResult<ApiResponse<Attachment>> {
        require_role(&user, EVERYONE)?;
        let upload = read_upload(multipart).await?;
        let attachment = FileService::new(&state.data_context, &state.file_storage)
            .upload_file(task_id, upload, &user)
            .await?;
        Ok(ApiResponse::created("File uploaded successfully", attachment))
    }

    pub async fn download(
        State(state): State<SharedState>,
        Path(file_id): Path<Uuid>,
    ) -> ApiResult<Response> {
        let (attachment, bytes) = FileService::new(&state.data_context, &state.file_storage)
            .download_file(file_id)
            .await?;
        let disposition = format!(
            "attachment; filename=\"{}\"",
            sanitize_filename(&attachment.original_name)
        );
        Ok((
            [
                (header::CONTENT_TYPE, attachment.mimetype),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            bytes,
        )
            .into_response())
    }

    pub async fn delete(
        State(state): State<SharedState>,
        Extension(user): Extension<AuthUser>,
        Path(file_id): Path<Uuid>,
    ) -> ApiResult<ApiResponse<()>> {
        require_role(&user, MANAGERS)?;
        FileService::new(&state.data_context, &state.file_storage)
            .delete_file(file_id, &user)
            .await?;
        Ok(ApiResponse::message("File deleted successfully"))
    }
}
