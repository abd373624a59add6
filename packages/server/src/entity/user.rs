use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::soft_delete::SoftDelete;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Normalized: the domain part is lowercased on creation.
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password: String,

    #[sea_orm(default_value = false)]
    pub is_staff: bool,

    #[sea_orm(has_many)]
    pub posts: HasMany<super::post::Entity>,

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
