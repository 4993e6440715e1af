//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::User;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub phone_number: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string, never plain text
    pub password: String,
    pub is_active: bool,
    pub created_at: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            name: model.name,
            last_name: model.last_name,
            phone_number: model.phone_number,
            email: model.email,
            password_hash: model.password,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}
