use std::io;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    activity::{ActivityAction, ActivityDetails, EntityType, NewActivity},
    authentication::auth::AuthUser,
    data_access::data_context::DataContext,
    error::{ApiError, ApiResult},
    role::Role,
    services::{activity_service::ActivityService, file_storage::FileStorage},
    task::{Attachment, Task},
};

/// Incoming upload, already drained from the multipart body.
#[derive(Debug)]
pub struct Upload {
    pub original_name: String,
    pub mimetype: String,
    pub bytes: Vec<u8>,
}

fn storage_error(e: io::Error) -> ApiError {
    if e.kind() == io::ErrorKind::NotFound {
        ApiError::not_found("File not found")
    } else {
        ApiError::Internal(format!("file storage: {e}"))
    }
}

pub struct FileService<'a> {
    data: &'a DataContext,
    storage: &'a FileStorage,
}

impl<'a> FileService<'a> {
    pub fn new(data: &'a DataContext, storage: &'a FileStorage) -> Self {
        Self { data, storage }
    }

    fn find(&self, file_id: Uuid) -> ApiResult<(Task, Attachment)> {
        self.data
            .scan::<Task>()?
            .into_iter()
            .find_map(|task| {
                let attachment = task.attachments.iter().find(|a| a.id == file_id).cloned()?;
                Some((task, attachment))
            })
            .ok_or_else(|| ApiError::not_found("File not found"))
    }

    pub async fn upload_file(&self, task_id: Uuid, upload: Upload, actor: &AuthUser) -> ApiResult<Attachment> {
        if upload.bytes.is_empty() {
            return Err(ApiError::bad_request("No file uploaded"));
        }
        let task = self
            .data
            .get::<Task>(task_id)?
            .ok_or_else(|| ApiError::not_found("Task not found"))?;
        if actor.is(Role::Developer) && !task.is_assigned_to(actor.user_id) {
            return Err(ApiError::forbidden("You can only upload files to tasks assigned to you"));
        }

        let stored_name = self
            .storage
            .save(task_id, &upload.original_name, &upload.bytes)
            .await
            .map_err(storage_error)?;
        let attachment = Attachment {
            id: Uuid::new_v4(),
            filename: stored_name,
            original_name: upload.original_name,
            mimetype: upload.mimetype,
            size: upload.bytes.len() as u64,
            uploaded_by: actor.user_id,
            uploaded_at: Utc::now(),
        };

        let attached = self.data.modify(task_id, |task: &mut Task| -> ApiResult<()> {
            task.attachments.push(attachment.clone());
            task.updated_at = Utc::now();
            Ok(())
        })?;
        if attached.is_none() {
            if let Err(e) = self.storage.delete(task_id, &attachment.filename).await {
                warn!(%task_id, error = %e, "failed to remove orphaned upload");
            }
            return Err(ApiError::not_found("Task not found"));
        }

        info!(%task_id, file_id = %attachment.id, size = attachment.size, "file uploaded");
        ActivityService::new(self.data).record(
            task.project_id,
            NewActivity {
                user_id: actor.user_id,
                action: ActivityAction::FileUploaded,
                entity_type: EntityType::File,
                entity_id: attachment.id,
                details: ActivityDetails::describe(format!("Uploaded {}", attachment.original_name))
                    .with_metadata(json!({ "taskId": task_id, "size": attachment.size })),
            },
        );
        Ok(attachment)
    }

    pub async fn download_file(&self, file_id: Uuid) -> ApiResult<(Attachment, Vec<u8>)> {
        let (task, attachment) = self.find(file_id)?;
        let bytes = self
            .storage
            .read(task.id, &attachment.filename)
            .await
            .map_err(storage_error)?;
        Ok((attachment, bytes))
    }

    /// Callers restrict this to managers.
    pub async fn delete_file(&self, file_id: Uuid, actor: &AuthUser) -> ApiResult<()> {
        let (task, attachment) = self.find(file_id)?;
        self.data.modify(task.id, |task: &mut Task| -> ApiResult<()> {
            task.attachments.retain(|a| a.id != file_id);
            task.updated_at = Utc::now();
            Ok(())
        })?;
        if let Err(e) = self.storage.delete(task.id, &attachment.filename).await {
            warn!(task_id = %task.id, %file_id, error = %e, "failed to remove stored file");
        }

        info!(task_id = %task.id, %file_id, "file deleted");
        ActivityService::new(self.data).record(
            task.project_id,
            NewActivity {
                user_id: actor.user_id,
                action: ActivityAction::FileDeleted,
                entity_type: EntityType::File,
                entity_id: file_id,
                details: ActivityDetails::describe(format!("Deleted {}", attachment.original_name))
                    .with_metadata(json!({ "taskId": task.id })),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        activity_query::ActivityQuery,
        data_access::data_context::tests::{seed_project, seed_task, seed_user, temp_db},
        services::file_storage::tests::temp_storage,
        task_status::TaskStatus,
    };

    fn upload(bytes: &[u8]) -> Upload {
        Upload {
            original_name: "design brief.pdf".into(),
            mimetype: "application/pdf".into(),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn upload_download_delete_with_activity() {
        let db = temp_db("file_service");
        let temp = temp_storage();
        let service = FileService::new(&db.data, &temp.storage);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let actor = AuthUser { user_id: manager.id, role: manager.role };
        let project = seed_project(&db.data, manager.id);
        let task = seed_task(&db.data, project.id, "docs", TaskStatus::NotStarted, vec![]);

        let attachment = service.upload_file(task.id, upload(b"%PDF"), &actor).await.unwrap();
        assert_eq!(attachment.original_name, "design brief.pdf");
        assert_eq!(attachment.size, 4);
        let stored = db.data.get::<Task>(task.id).unwrap().unwrap();
        assert_eq!(stored.attachments.len(), 1);

        let (meta, bytes) = service.download_file(attachment.id).await.unwrap();
        assert_eq!(meta.id, attachment.id);
        assert_eq!(bytes, b"%PDF");

        service.delete_file(attachment.id, &actor).await.unwrap();
        assert!(db.data.get::<Task>(task.id).unwrap().unwrap().attachments.is_empty());
        assert!(matches!(service.download_file(attachment.id).await, Err(ApiError::NotFound(_))));

        let actions: Vec<ActivityAction> = ActivityService::new(&db.data)
            .get_project_activity(project.id, &ActivityQuery::default())
            .unwrap()
            .into_iter()
            .map(|view| view.entry.action)
            .collect();
        assert!(actions.contains(&ActivityAction::FileUploaded));
        assert!(actions.contains(&ActivityAction::FileDeleted));
    }

    #[tokio::test]
    async fn empty_and_unassigned_uploads_are_rejected() {
        let db = temp_db("file_reject");
        let temp = temp_storage();
        let service = FileService::new(&db.data, &temp.storage);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let developer = seed_user(&db.data, Role::Developer, None);
        let project = seed_project(&db.data, manager.id);
        let task = seed_task(&db.data, project.id, "docs", TaskStatus::NotStarted, vec![]);
        let dev = AuthUser { user_id: developer.id, role: developer.role };

        assert!(matches!(service.upload_file(task.id, upload(b""), &dev).await, Err(ApiError::BadRequest(_))));
        assert!(matches!(service.upload_file(task.id, upload(b"x"), &dev).await, Err(ApiError::Forbidden(_))));
        assert!(matches!(
            service.upload_file(Uuid::new_v4(), upload(b"x"), &dev).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
