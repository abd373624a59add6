//! Polymorphic file attachments.
//!
//! An attachment row points at its owner through an `(owner_type, owner_id)`
//! pair. [`OwnerKind`] is the closed set of entity types that may own
//! attachments and knows how to check that an owner row exists.

use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use common::FileType;
use common::file_type::extension_of;
use common::storage::{BoxReader, FileStorage, StorageError};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryOrder, Set,
};
use tracing::{error, info, warn};

use crate::entity::{attachment, category, comment, post, user};
use crate::soft_delete::{self, SoftDelete};
use crate::utils::filename::{last_segment, upload_path, validate_flat_filename};

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("owner has not been saved yet")]
    UnsavedOwner,
    #[error("{kind} {id} does not exist")]
    OwnerNotFound { kind: OwnerKind, id: i32 },
    #[error("{0}")]
    InvalidFilename(&'static str),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Entity types that can own attachments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    User,
    Post,
    Comment,
    Category,
}

impl OwnerKind {
    pub const ALL: &'static [OwnerKind] = &[Self::User, Self::Post, Self::Comment, Self::Category];

    /// Tag stored in `attachment.owner_type`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Post => "post",
            Self::Comment => "comment",
            Self::Category => "category",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.tag() == tag)
    }

    /// Whether a row with this id exists, active or not.
    pub async fn exists<C: ConnectionTrait>(&self, db: &C, id: i32) -> Result<bool, DbErr> {
        let found = match self {
            Self::User => user::Entity::find_by_id(id).count(db).await?,
            Self::Post => post::Entity::find_by_id(id).count(db).await?,
            Self::Comment => comment::Entity::find_by_id(id).count(db).await?,
            Self::Category => category::Entity::find_by_id(id).count(db).await?,
        };
        Ok(found > 0)
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A resolved `(type, id)` owner reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnerRef {
    pub kind: OwnerKind,
    pub id: i32,
}

impl attachment::Model {
    /// The owner this attachment points at, if its tag is known.
    pub fn owner(&self) -> Option<OwnerRef> {
        OwnerKind::from_tag(&self.owner_type).map(|kind| OwnerRef {
            kind,
            id: self.owner_id,
        })
    }
}

/// An upload waiting to be attached.
///
/// `name`, `file_type` and `mime_type` are derived from the stored filename
/// when left as `None`. `size` always comes from storage.
pub struct NewAttachment {
    pub filename: String,
    pub content: BoxReader,
    pub name: Option<String>,
    pub file_type: Option<FileType>,
    pub mime_type: Option<String>,
    pub description: String,
    pub order: i32,
}

impl NewAttachment {
    pub fn from_reader(filename: impl Into<String>, content: BoxReader) -> Self {
        Self {
            filename: filename.into(),
            content,
            name: None,
            file_type: None,
            mime_type: None,
            description: String::new(),
            order: 0,
        }
    }

    pub fn from_bytes(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self::from_reader(filename, Box::new(std::io::Cursor::new(data)))
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }
}

/// Metadata computed once, when the attachment is first saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedMetadata {
    pub name: String,
    pub file_type: FileType,
    pub mime_type: String,
}

/// Fill in whatever the caller did not supply from the stored file name.
pub fn derive_metadata(
    stored_name: &str,
    name: Option<String>,
    file_type: Option<FileType>,
    mime_type: Option<String>,
) -> DerivedMetadata {
    DerivedMetadata {
        name: name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| last_segment(stored_name).to_string()),
        file_type: file_type
            .unwrap_or_else(|| FileType::from_extension(&extension_of(stored_name))),
        mime_type: mime_type.filter(|m| !m.is_empty()).unwrap_or_else(|| {
            mime_guess::from_path(stored_name)
                .first()
                .map(|m| m.to_string())
                .unwrap_or_default()
        }),
    }
}

/// Store `upload` and create an attachment row pointing at `owner`.
///
/// Fails with [`AttachmentError::UnsavedOwner`] when the owner has no id yet,
/// and with [`AttachmentError::OwnerNotFound`] when the id does not resolve.
pub async fn add_attachment<C: ConnectionTrait>(
    db: &C,
    storage: &dyn FileStorage,
    owner: Option<OwnerRef>,
    upload: NewAttachment,
) -> Result<attachment::Model, AttachmentError> {
    let owner = owner.ok_or(AttachmentError::UnsavedOwner)?;
    if !owner.kind.exists(db, owner.id).await? {
        return Err(AttachmentError::OwnerNotFound {
            kind: owner.kind,
            id: owner.id,
        });
    }

    let filename = validate_flat_filename(&upload.filename)
        .map_err(|e| AttachmentError::InvalidFilename(e.message()))?;

    let now = Utc::now();
    let stored_name = storage
        .save_stream(&upload_path(filename, now), upload.content)
        .await?;

    let size = match storage.size(&stored_name).await {
        Ok(n) if n > 0 => i64::try_from(n).unwrap_or(i64::MAX),
        _ => 0,
    };
    let meta = derive_metadata(&stored_name, upload.name, upload.file_type, upload.mime_type);

    let new_attachment = attachment::ActiveModel {
        file: Set(stored_name.clone()),
        name: Set(meta.name),
        file_type: Set(meta.file_type),
        mime_type: Set(meta.mime_type),
        size: Set(size),
        description: Set(upload.description),
        order: Set(upload.order),
        owner_type: Set(owner.kind.tag().to_string()),
        owner_id: Set(owner.id),
        is_active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match new_attachment.insert(db).await {
        Ok(model) => {
            info!(
                attachment_id = model.id,
                owner_type = %owner.kind,
                owner_id = owner.id,
                file = %model.file,
                "Attachment added"
            );
            Ok(model)
        }
        Err(e) => {
            // Best effort.
            if let Err(cleanup) = storage.delete(&stored_name).await {
                warn!(file = %stored_name, error = %cleanup, "Failed to remove orphaned upload");
            }
            Err(e.into())
        }
    }
}

/// Active attachments of `owner`, optionally restricted to one file type.
///
/// Ordered by `order`, then owner reference, then id.
pub async fn get_attachments<C: ConnectionTrait>(
    db: &C,
    owner: OwnerRef,
    file_type: Option<FileType>,
) -> Result<Vec<attachment::Model>, DbErr> {
    let mut scope = attachment::Entity::objects()
        .filter(attachment::Column::OwnerType.eq(owner.kind.tag()))
        .filter(attachment::Column::OwnerId.eq(owner.id));
    if let Some(file_type) = file_type {
        scope = scope.filter(attachment::Column::FileType.eq(file_type));
    }

    scope
        .find()
        .order_by_asc(attachment::Column::Order)
        .order_by_asc(attachment::Column::OwnerType)
        .order_by_asc(attachment::Column::OwnerId)
        .order_by_asc(attachment::Column::Id)
        .all(db)
        .await
}

/// Remove the stored file, then the row.
///
/// If the file cannot be removed the row is left in place and the storage
/// error is returned. A file that is already gone does not count as a failure.
pub async fn hard_delete<C: ConnectionTrait>(
    db: &C,
    storage: &dyn FileStorage,
    attachment: attachment::Model,
) -> Result<(), AttachmentError> {
    if !attachment.file.is_empty()
        && let Err(e) = storage.delete(&attachment.file).await
    {
        error!(
            attachment_id = attachment.id,
            file = %attachment.file,
            error = %e,
            "Failed to remove attachment file; keeping the record"
        );
        return Err(AttachmentError::Storage(e));
    }

    let id = attachment.id;
    soft_delete::hard_delete(db, attachment).await?;
    info!(attachment_id = id, "Attachment purged");
    Ok(())
}

/// Hard-delete every attachment of `owner`, active or not.
///
/// Stops at the first storage failure; attachments purged before it stay purged.
pub async fn purge_attachments<C: ConnectionTrait>(
    db: &C,
    storage: &dyn FileStorage,
    owner: OwnerRef,
) -> Result<u64, AttachmentError> {
    let rows = attachment::Entity::all_objects()
        .filter(attachment::Column::OwnerType.eq(owner.kind.tag()))
        .filter(attachment::Column::OwnerId.eq(owner.id))
        .all(db)
        .await?;

    let mut purged = 0;
    for row in rows {
        hard_delete(db, storage, row).await?;
        purged += 1;
    }
    Ok(purged)
}

/// Replace the owner's image: attach `upload` as an image, then soft-delete
/// the images it replaces.
///
/// The current images are only retired once the new row exists, so a
/// rejected or failed upload leaves them untouched.
pub async fn set_image<C: ConnectionTrait>(
    db: &C,
    storage: &dyn FileStorage,
    owner: Option<OwnerRef>,
    upload: NewAttachment,
) -> Result<attachment::Model, AttachmentError> {
    let created = add_attachment(db, storage, owner, upload.with_file_type(FileType::Image)).await?;

    let replaced = attachment::Entity::objects()
        .filter(attachment::Column::OwnerType.eq(created.owner_type.as_str()))
        .filter(attachment::Column::OwnerId.eq(created.owner_id))
        .filter(attachment::Column::FileType.eq(FileType::Image))
        .filter(attachment::Column::Id.ne(created.id))
        .delete(db)
        .await?;
    info!(attachment_id = created.id, replaced, "Image replaced");

    Ok(created)
}

/// Attachment capabilities for any entity that can own files.
#[async_trait]
pub trait AttachmentOwner: Sync {
    const KIND: OwnerKind;

    /// Primary key, if the row has been persisted.
    fn persisted_id(&self) -> Option<i32>;

    fn owner_ref(&self) -> Option<OwnerRef> {
        self.persisted_id().map(|id| OwnerRef {
            kind: Self::KIND,
            id,
        })
    }

    async fn add_attachment<C: ConnectionTrait>(
        &self,
        db: &C,
        storage: &dyn FileStorage,
        upload: NewAttachment,
    ) -> Result<attachment::Model, AttachmentError> {
        add_attachment(db, storage, self.owner_ref(), upload).await
    }

    async fn get_attachments<C: ConnectionTrait>(
        &self,
        db: &C,
        file_type: Option<FileType>,
    ) -> Result<Vec<attachment::Model>, AttachmentError> {
        let owner = self.owner_ref().ok_or(AttachmentError::UnsavedOwner)?;
        Ok(get_attachments(db, owner, file_type).await?)
    }

    async fn images<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Vec<attachment::Model>, AttachmentError> {
        self.get_attachments(db, Some(FileType::Image)).await
    }

    async fn videos<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Vec<attachment::Model>, AttachmentError> {
        self.get_attachments(db, Some(FileType::Video)).await
    }

    async fn documents<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Vec<attachment::Model>, AttachmentError> {
        self.get_attachments(db, Some(FileType::Document)).await
    }

    async fn audios<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Vec<attachment::Model>, AttachmentError> {
        self.get_attachments(db, Some(FileType::Audio)).await
    }

    async fn set_image<C: ConnectionTrait>(
        &self,
        db: &C,
        storage: &dyn FileStorage,
        upload: NewAttachment,
    ) -> Result<attachment::Model, AttachmentError> {
        set_image(db, storage, self.owner_ref(), upload).await
    }
}

macro_rules! attachment_owner {
    ($module:ident, $kind:expr) => {
        impl AttachmentOwner for $module::Model {
            const KIND: OwnerKind = $kind;

            fn persisted_id(&self) -> Option<i32> {
                Some(self.id)
            }
        }

        impl AttachmentOwner for $module::ActiveModel {
            const KIND: OwnerKind = $kind;

            fn persisted_id(&self) -> Option<i32> {
                match &self.id {
                    ActiveValue::Set(id) | ActiveValue::Unchanged(id) => Some(*id),
                    ActiveValue::NotSet => None,
                }
            }
        }
    };
}

attachment_owner!(user, OwnerKind::User);
attachment_owner!(post, OwnerKind::Post);
attachment_owner!(comment, OwnerKind::Comment);
attachment_owner!(category, OwnerKind::Category);
