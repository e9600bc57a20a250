use sea_orm::entity::prelude::*;

use crate::types::internal::auth::Role;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    /// None for accounts created through an OAuth provider without a password
    pub password_hash: Option<String>,
    pub role: Role,

    // Linked provider identities
    #[sea_orm(unique)]
    pub github_id: Option<String>,
    pub github_username: Option<String>,
    #[sea_orm(unique)]
    pub wechat_openid: Option<String>,

    pub must_change_password: bool,
    /// Bumped to invalidate every token issued before the change
    pub token_version: i32,

    pub created_at: i64,
    pub last_login_at: Option<i64>,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::refresh_token::Entity")]
    RefreshToken,
}

impl Related<super::refresh_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RefreshToken.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
