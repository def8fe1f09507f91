use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invitation link. `uuid` is the public identifier carried in the invite URL.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "link_identifiers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tracking_number: i32,
    #[sea_orm(unique)]
    pub uuid: String,
    pub is_vip: bool,
    pub is_hidden: bool,
    pub is_test: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::rsvp::Entity")]
    Rsvp,
}

impl Related<super::rsvp::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rsvp.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
