use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::soft_delete::SoftDelete;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(has_many)]
    pub posts: HasMany<super::post::Entity>,

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
