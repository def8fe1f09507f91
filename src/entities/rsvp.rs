use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::Answer;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rsvps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub link_identifier_id: i32,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub attending: Answer,
    pub has_guests: Option<Answer>,
    pub guest_count: i32,
    pub donation: Option<Answer>,
    pub is_hidden: bool,
    pub submitted_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::link_identifier::Entity",
        from = "Column::LinkIdentifierId",
        to = "super::link_identifier::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    LinkIdentifier,
}

impl Related<super::link_identifier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LinkIdentifier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
