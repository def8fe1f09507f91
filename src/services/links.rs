use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
    sea_query::JoinType,
};
use serde::Serialize;
use tracing::{debug, info};

use super::rsvps::RsvpView;
use crate::{
    entities::{link_identifier, rsvp},
    error::AppError,
};

/// Identifiers starting with this prefix are test links.
pub const TEST_PREFIX: &str = "test-";
/// Test links are numbered from here; production links stay below it.
pub const TEST_TRACKING_START: i32 = 1000;
pub const MAX_GENERATED_LINKS: u32 = 500;

const PRODUCTION_EXHAUSTED: &str = "Production tracking numbers exhausted";

pub fn is_test_identifier(identifier: &str) -> bool {
    identifier.starts_with(TEST_PREFIX)
}

/// What the public form learns about an invitation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStatus {
    pub id: i32,
    pub uuid: String,
    pub is_vip: bool,
    pub is_hidden: bool,
    pub is_test: bool,
    #[serde(rename = "existingRSVP")]
    pub existing_rsvp: Option<RsvpView>,
}

#[derive(Debug, Clone, Default)]
pub struct NewLink {
    pub identifier: String,
    pub is_vip: bool,
    pub is_hidden: bool,
}

pub async fn find_by_identifier<C: ConnectionTrait>(
    conn: &C,
    identifier: &str,
) -> Result<Option<link_identifier::Model>, DbErr> {
    link_identifier::Entity::find()
        .filter(link_identifier::Column::Uuid.eq(identifier))
        .one(conn)
        .await
}

/// Looks up a link and any RSVP already attached to it. Read only.
pub async fn validate(
    db: &DatabaseConnection,
    identifier: &str,
) -> Result<Option<LinkStatus>, DbErr> {
    let found = link_identifier::Entity::find()
        .filter(link_identifier::Column::Uuid.eq(identifier))
        .find_also_related(rsvp::Entity)
        .one(db)
        .await?;

    Ok(found.map(|(link, rsvp)| LinkStatus {
        existing_rsvp: rsvp.map(|r| RsvpView::new(r, &link)),
        id: link.id,
        uuid: link.uuid,
        is_vip: link.is_vip,
        is_hidden: link.is_hidden,
        is_test: link.is_test,
    }))
}

pub async fn next_tracking_number<C: ConnectionTrait>(conn: &C, is_test: bool) -> Result<i32, DbErr> {
    let range = if is_test {
        link_identifier::Column::TrackingNumber.gte(TEST_TRACKING_START)
    } else {
        link_identifier::Column::TrackingNumber.lt(TEST_TRACKING_START)
    };

    let max = link_identifier::Entity::find()
        .select_only()
        .column_as(link_identifier::Column::TrackingNumber.max(), "max_tracking")
        .filter(range)
        .into_tuple::<Option<i32>>()
        .one(conn)
        .await?
        .flatten();

    Ok(match max {
        Some(n) => n + 1,
        None if is_test => TEST_TRACKING_START,
        None => 1,
    })
}

async fn insert_link<C: ConnectionTrait>(
    conn: &C,
    identifier: String,
    tracking_number: i32,
    is_vip: bool,
    is_hidden: bool,
) -> Result<link_identifier::Model, DbErr> {
    link_identifier::ActiveModel {
        is_test: Set(is_test_identifier(&identifier)),
        uuid: Set(identifier),
        tracking_number: Set(tracking_number),
        is_vip: Set(is_vip),
        is_hidden: Set(is_hidden),
        ..Default::default()
    }
    .insert(conn)
    .await
}

pub async fn create(
    db: &DatabaseConnection,
    new: NewLink,
) -> Result<link_identifier::Model, AppError> {
    let identifier = new.identifier.trim().to_string();
    if identifier.is_empty() {
        return Err(AppError::validation("Link identifier is required"));
    }

    let txn = db.begin().await?;
    if find_by_identifier(&txn, &identifier).await?.is_some() {
        return Err(AppError::validation(
            "Link identifier already exists in database",
        ));
    }

    let is_test = is_test_identifier(&identifier);
    let tracking_number = next_tracking_number(&txn, is_test).await?;
    if !is_test && tracking_number >= TEST_TRACKING_START {
        return Err(AppError::validation(PRODUCTION_EXHAUSTED));
    }
    let link = insert_link(&txn, identifier, tracking_number, new.is_vip, new.is_hidden).await?;
    txn.commit().await?;

    info!(
        "Link identifier created with ID: {}, Tracking: {}",
        link.id, link.tracking_number
    );
    Ok(link)
}

/// Creates `count` links with random v4 UUID identifiers.
pub async fn generate(
    db: &DatabaseConnection,
    count: u32,
    is_vip: bool,
    is_hidden: bool,
    test: bool,
) -> Result<Vec<link_identifier::Model>, AppError> {
    if count == 0 || count > MAX_GENERATED_LINKS {
        return Err(AppError::validation(format!(
            "Count must be between 1 and {MAX_GENERATED_LINKS}"
        )));
    }

    let txn = db.begin().await?;
    let mut tracking_number = next_tracking_number(&txn, test).await?;
    // count is capped above, so the cast cannot wrap.
    if !test && tracking_number + count as i32 > TEST_TRACKING_START {
        return Err(AppError::validation(PRODUCTION_EXHAUSTED));
    }
    let mut links = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let uuid = uuid::Uuid::new_v4();
        let identifier = if test {
            format!("{TEST_PREFIX}{uuid}")
        } else {
            uuid.to_string()
        };
        links.push(insert_link(&txn, identifier, tracking_number, is_vip, is_hidden).await?);
        tracking_number += 1;
    }
    txn.commit().await?;

    info!("Generated {count} link identifiers (vip={is_vip}, test={test})");
    Ok(links)
}

/// Links nobody has responded to yet, by tracking number.
pub async fn unused(db: &DatabaseConnection) -> Result<Vec<link_identifier::Model>, DbErr> {
    link_identifier::Entity::find()
        .join(JoinType::LeftJoin, link_identifier::Relation::Rsvp.def())
        .filter(rsvp::Column::Id.is_null())
        .order_by_asc(link_identifier::Column::TrackingNumber)
        .all(db)
        .await
}

pub async fn update_flags(
    db: &DatabaseConnection,
    identifier: &str,
    is_vip: Option<bool>,
    is_hidden: Option<bool>,
) -> Result<link_identifier::Model, AppError> {
    if is_vip.is_none() && is_hidden.is_none() {
        return Err(AppError::validation("isVip or isHidden is required"));
    }

    let link = find_by_identifier(db, identifier)
        .await?
        .ok_or(AppError::NotFound("Link identifier not found"))?;

    let mut active = link.into_active_model();
    if let Some(is_vip) = is_vip {
        active.is_vip = Set(is_vip);
    }
    if let Some(is_hidden) = is_hidden {
        active.is_hidden = Set(is_hidden);
    }
    let link = active.update(db).await?;

    debug!(
        "Link {} flags now vip={} hidden={}",
        link.uuid, link.is_vip, link.is_hidden
    );
    Ok(link)
}
