use common::PostType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::soft_delete::SoftDelete;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub post_type: PostType,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String, // in Markdown

    pub author_id: i32,
    #[sea_orm(belongs_to, from = "author_id", to = "id")]
    pub author: HasOne<super::user::Entity>,

    /// NULL for uncategorized posts.
    pub category_id: Option<i32>,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: BelongsTo<Option<super::category::Entity>>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

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
