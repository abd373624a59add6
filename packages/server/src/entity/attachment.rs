use common::FileType;
use common::file_type::extension_of;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::soft_delete::SoftDelete;

/// A stored file attached to any other entity.
///
/// The owner is a `(owner_type, owner_id)` pair rather than a foreign key;
/// see [`crate::attachments::OwnerKind`] for the accepted tags.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attachment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Storage name of the backing file.
    pub file: String,
    /// Display filename.
    pub name: String,
    pub file_type: FileType,
    /// Empty when the type could not be guessed.
    pub mime_type: String,
    pub size: i64,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub order: i32,

    #[sea_orm(indexed)]
    pub owner_type: String,
    #[sea_orm(indexed)]
    pub owner_id: i32,

    #[sea_orm(default_value = true, indexed)]
    pub is_active: bool,
    pub deleted_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl SoftDelete for Entity {
    fn is_active_column() -> Column {
        Column::IsActive
    }

    fn deleted_at_column() -> Column {
        Column::DeletedAt
    }
}

impl Model {
    /// Lowercased extension of the stored file, empty if there is none.
    pub fn extension(&self) -> String {
        extension_of(&self.file)
    }

    /// Size rendered as `500 B`, `2.00 KB`, ...
    pub fn formatted_size(&self) -> String {
        common::format_size(u64::try_from(self.size).unwrap_or(0))
    }
}
