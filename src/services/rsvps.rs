use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::DateTimeUtc,
};
use serde::Serialize;
use tracing::{debug, info};

use super::links;
use crate::{
    entities::{link_identifier, rsvp, sea_orm_active_enums::Answer},
    error::AppError,
    mail::RsvpSummary,
};

/// An RSVP joined with the link it belongs to, as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RsvpView {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub attending: Answer,
    pub has_guests: Option<Answer>,
    pub guest_count: i32,
    pub donation: Option<Answer>,
    pub created_at: DateTimeUtc,
    pub is_hidden: bool,
    pub link_identifier_id: i32,
    pub link_uuid: String,
    pub is_vip: bool,
    pub is_test: bool,
}

impl RsvpView {
    pub fn new(rsvp: rsvp::Model, link: &link_identifier::Model) -> Self {
        Self {
            id: rsvp.id,
            full_name: rsvp.full_name,
            email: rsvp.email,
            phone: rsvp.phone,
            company: rsvp.company,
            attending: rsvp.attending,
            has_guests: rsvp.has_guests,
            guest_count: rsvp.guest_count,
            donation: rsvp.donation,
            created_at: rsvp.submitted_at,
            is_hidden: rsvp.is_hidden,
            link_identifier_id: link.id,
            link_uuid: link.uuid.clone(),
            is_vip: link.is_vip,
            is_test: link.is_test,
        }
    }
}

impl From<&RsvpView> for RsvpSummary {
    fn from(view: &RsvpView) -> Self {
        Self {
            full_name: view.full_name.clone(),
            email: view.email.clone(),
            phone: Some(view.phone.clone()),
            company: view.company.clone(),
            attending: view.attending,
            has_guests: view.has_guests,
            guest_count: view.guest_count,
            donation: view.donation,
            is_vip: view.is_vip,
            link_identifier: Some(view.link_uuid.clone()),
        }
    }
}

/// Unvalidated form input, shared by the public form and the admin editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RsvpDraft {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub attending: Option<String>,
    pub has_guests: Option<String>,
    pub guest_count: Option<i64>,
    pub donation: Option<String>,
}

/// Form input that passed the required-field checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsvpFields {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub attending: Answer,
    pub has_guests: Option<Answer>,
    pub guest_count: i64,
    pub donation: Option<Answer>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn answer(field: &str, value: Option<String>) -> Result<Option<Answer>, AppError> {
    match present(value) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| AppError::validation(format!("{field} must be \"yes\" or \"no\""))),
    }
}

impl RsvpDraft {
    pub fn parse(self) -> Result<RsvpFields, AppError> {
        let (Some(full_name), Some(email), Some(phone), Some(attending)) = (
            present(self.full_name),
            present(self.email),
            present(self.phone),
            present(self.attending),
        ) else {
            return Err(AppError::validation("Missing required fields"));
        };

        let attending = answer("attending", Some(attending))?
            .ok_or_else(|| AppError::validation("Missing required fields"))?;
        let guest_count = self.guest_count.unwrap_or(0);
        if guest_count < 0 {
            return Err(AppError::validation("Guest count cannot be negative"));
        }

        Ok(RsvpFields {
            full_name,
            email,
            phone,
            company: present(self.company),
            attending,
            has_guests: answer("hasGuests", self.has_guests)?,
            guest_count,
            donation: answer("donation", self.donation)?,
        })
    }
}

impl RsvpFields {
    /// Guests are a VIP privilege, capped at one. Without `has_guests = yes`
    /// the count is stored as zero.
    pub fn apply_guest_rules(mut self, is_vip: bool) -> Result<Self, AppError> {
        if !self.has_guests.is_some_and(Answer::is_yes) {
            self.guest_count = 0;
            return Ok(self);
        }
        if !is_vip {
            return Err(AppError::validation(
                "Guest privileges are only available for VIP invitations",
            ));
        }
        if self.guest_count > 1 {
            return Err(AppError::validation(
                "Maximum of 1 guest allowed per VIP attendee",
            ));
        }
        Ok(self)
    }

    fn write_to(self, active: &mut rsvp::ActiveModel) {
        active.full_name = Set(self.full_name);
        active.email = Set(self.email);
        active.phone = Set(self.phone);
        active.company = Set(self.company);
        active.attending = Set(self.attending);
        active.has_guests = Set(self.has_guests);
        // apply_guest_rules leaves 0 or 1 here
        active.guest_count = Set(self.guest_count as i32);
        active.donation = Set(self.donation);
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub rsvp: rsvp::Model,
    pub link: link_identifier::Model,
    pub is_update: bool,
}

impl SubmissionOutcome {
    pub fn view(&self) -> RsvpView {
        RsvpView::new(self.rsvp.clone(), &self.link)
    }
}

/// Stores a form submission against its invitation link: the first submission
/// inserts, later ones overwrite the same row and refresh its timestamp.
pub async fn submit(
    db: &DatabaseConnection,
    identifier: Option<&str>,
    draft: RsvpDraft,
) -> Result<SubmissionOutcome, AppError> {
    let Some(identifier) = identifier.map(str::trim).filter(|i| !i.is_empty()) else {
        return Err(AppError::validation("Missing required fields"));
    };
    let fields = draft.parse()?;

    let txn = db.begin().await?;
    let link = links::find_by_identifier(&txn, identifier)
        .await?
        .ok_or_else(|| AppError::validation("Invalid link identifier"))?;
    let fields = fields.apply_guest_rules(link.is_vip)?;

    let existing = rsvp::Entity::find()
        .filter(rsvp::Column::LinkIdentifierId.eq(link.id))
        .one(&txn)
        .await?;

    let (rsvp, is_update) = match existing {
        Some(existing) => {
            let mut active = existing.into_active_model();
            fields.write_to(&mut active);
            active.submitted_at = Set(Utc::now());
            (active.update(&txn).await?, true)
        }
        None => {
            let mut active = rsvp::ActiveModel {
                link_identifier_id: Set(link.id),
                is_hidden: Set(link.is_hidden),
                submitted_at: Set(Utc::now()),
                ..Default::default()
            };
            fields.write_to(&mut active);
            (active.insert(&txn).await?, false)
        }
    };
    txn.commit().await?;

    if is_update {
        info!("RSVP updated successfully for link ID: {}", link.id);
    } else {
        info!("RSVP inserted successfully with ID: {}", rsvp.id);
    }

    Ok(SubmissionOutcome {
        rsvp,
        link,
        is_update,
    })
}

/// Latest RSVP submitted with this email address.
pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<RsvpView>, DbErr> {
    let found = rsvp::Entity::find()
        .filter(rsvp::Column::Email.eq(email.trim()))
        .find_also_related(link_identifier::Entity)
        .order_by_desc(rsvp::Column::SubmittedAt)
        .one(db)
        .await?;

    Ok(found.and_then(|(r, link)| link.map(|link| RsvpView::new(r, &link))))
}

pub async fn find_view(db: &DatabaseConnection, id: i32) -> Result<Option<RsvpView>, DbErr> {
    let found = rsvp::Entity::find_by_id(id)
        .find_also_related(link_identifier::Entity)
        .one(db)
        .await?;

    Ok(found.and_then(|(r, link)| link.map(|link| RsvpView::new(r, &link))))
}

/// Every RSVP with its link, newest first.
pub async fn all_views(db: &DatabaseConnection) -> Result<Vec<RsvpView>, DbErr> {
    let rows = rsvp::Entity::find()
        .find_also_related(link_identifier::Entity)
        .order_by_desc(rsvp::Column::SubmittedAt)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(r, link)| link.map(|link| RsvpView::new(r, &link)))
        .collect())
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RsvpListing {
    /// Real responses shown by default.
    pub production: Vec<RsvpView>,
    /// Responses against test links, hidden or not.
    pub test: Vec<RsvpView>,
    /// Real responses an admin has hidden.
    pub hidden: Vec<RsvpView>,
}

impl RsvpListing {
    pub fn partition(views: Vec<RsvpView>) -> Self {
        let mut listing = RsvpListing::default();
        for view in views {
            if view.is_test {
                listing.test.push(view);
            } else if view.is_hidden {
                listing.hidden.push(view);
            } else {
                listing.production.push(view);
            }
        }
        listing
    }
}

pub async fn listing(db: &DatabaseConnection) -> Result<RsvpListing, DbErr> {
    Ok(RsvpListing::partition(all_views(db).await?))
}

/// Admin edit. Same validation as a submission; the timestamp is kept.
pub async fn edit(
    db: &DatabaseConnection,
    id: i32,
    draft: RsvpDraft,
) -> Result<rsvp::Model, AppError> {
    let fields = draft.parse()?;

    let Some((existing, Some(link))) = rsvp::Entity::find_by_id(id)
        .find_also_related(link_identifier::Entity)
        .one(db)
        .await?
    else {
        return Err(AppError::NotFound("RSVP not found"));
    };
    let fields = fields.apply_guest_rules(link.is_vip)?;

    let mut active = existing.into_active_model();
    fields.write_to(&mut active);
    let updated = active.update(db).await?;

    info!("RSVP {id} updated by admin");
    Ok(updated)
}

/// Deleting an RSVP frees its link for a new response.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
    let result = rsvp::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("RSVP not found"));
    }

    info!("RSVP {id} deleted");
    Ok(())
}

pub async fn set_hidden(
    db: &DatabaseConnection,
    id: i32,
    is_hidden: bool,
) -> Result<rsvp::Model, AppError> {
    let existing = rsvp::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("RSVP not found"))?;

    let mut active = existing.into_active_model();
    active.is_hidden = Set(is_hidden);
    let updated = active.update(db).await?;

    debug!("RSVP {id} hidden={is_hidden}");
    Ok(updated)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub rsvps_deleted: u64,
    pub links_deleted: u64,
}

/// Removes every test link and the RSVPs attached to them.
pub async fn cleanup_test_data(db: &DatabaseConnection) -> Result<CleanupReport, DbErr> {
    let txn = db.begin().await?;

    let test_link_ids: Vec<i32> = link_identifier::Entity::find()
        .select_only()
        .column(link_identifier::Column::Id)
        .filter(link_identifier::Column::IsTest.eq(true))
        .into_tuple()
        .all(&txn)
        .await?;

    let rsvps_deleted = rsvp::Entity::delete_many()
        .filter(rsvp::Column::LinkIdentifierId.is_in(test_link_ids))
        .exec(&txn)
        .await?
        .rows_affected;

    let links_deleted = link_identifier::Entity::delete_many()
        .filter(link_identifier::Column::IsTest.eq(true))
        .exec(&txn)
        .await?
        .rows_affected;

    txn.commit().await?;

    info!("Deleted {rsvps_deleted} test RSVPs and {links_deleted} test link identifiers");
    Ok(CleanupReport {
        rsvps_deleted,
        links_deleted,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::{database::in_memory_database, services::links::NewLink};

    async fn db_with_links(links: &[(&str, bool)]) -> DatabaseConnection {
        let db = in_memory_database().await.expect("in-memory database");
        for (identifier, is_vip) in links {
            links::create(
                &db,
                NewLink {
                    identifier: identifier.to_string(),
                    is_vip: *is_vip,
                    is_hidden: false,
                },
            )
            .await
            .unwrap();
        }
        db
    }

    fn ada() -> RsvpDraft {
        RsvpDraft {
            full_name: Some("Ada Lovelace".into()),
            email: Some("ada@x.com".into()),
            phone: Some("123".into()),
            attending: Some("yes".into()),
            ..Default::default()
        }
    }

    fn with_guest(count: i64) -> RsvpDraft {
        RsvpDraft {
            has_guests: Some("yes".into()),
            guest_count: Some(count),
            ..ada()
        }
    }

    async fn row_count(db: &DatabaseConnection) -> usize {
        rsvp::Entity::find().all(db).await.unwrap().len()
    }

    #[test]
    fn parse_requires_core_fields() {
        let missing_phone = RsvpDraft {
            phone: Some("  ".into()),
            ..ada()
        };
        assert_eq!(
            missing_phone.parse().unwrap_err().to_string(),
            "Missing required fields"
        );

        let bad_answer = RsvpDraft {
            attending: Some("maybe".into()),
            ..ada()
        };
        assert!(bad_answer.parse().is_err());

        let fields = RsvpDraft {
            company: Some("".into()),
            donation: Some("Yes".into()),
            ..ada()
        }
        .parse()
        .unwrap();
        assert_eq!(fields.company, None);
        assert_eq!(fields.donation, Some(Answer::Yes));
    }

    #[test]
    fn guest_rules() {
        // Non-VIP with guests is rejected whatever the count.
        for count in [0, 1, 3] {
            let err = with_guest(count)
                .parse()
                .unwrap()
                .apply_guest_rules(false)
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Guest privileges are only available for VIP invitations"
            );
        }

        let vip = with_guest(1).parse().unwrap().apply_guest_rules(true).unwrap();
        assert_eq!(vip.guest_count, 1);

        let err = with_guest(2)
            .parse()
            .unwrap()
            .apply_guest_rules(true)
            .unwrap_err();
        assert_eq!(err.to_string(), "Maximum of 1 guest allowed per VIP attendee");

        // A stray count without has_guests is dropped.
        let no_guests = RsvpDraft {
            has_guests: Some("no".into()),
            guest_count: Some(1),
            ..ada()
        };
        let fields = no_guests.parse().unwrap().apply_guest_rules(false).unwrap();
        assert_eq!(fields.guest_count, 0);

        let negative = RsvpDraft {
            guest_count: Some(-1),
            ..ada()
        };
        assert!(negative.parse().is_err());
    }

    #[tokio::test]
    async fn first_submission_inserts() {
        let db = db_with_links(&[("abc-123", false)]).await;

        let outcome = submit(&db, Some("abc-123"), ada()).await.unwrap();

        assert!(!outcome.is_update);
        assert_eq!(outcome.rsvp.attending, Answer::Yes);
        assert_eq!(outcome.rsvp.link_identifier_id, outcome.link.id);
        assert_eq!(row_count(&db).await, 1);
    }

    #[tokio::test]
    async fn resubmission_overwrites_in_place() {
        let db = db_with_links(&[("abc-123", false)]).await;
        let first = submit(&db, Some("abc-123"), ada()).await.unwrap();

        // Backdate so the refresh is observable.
        let backdated = first.rsvp.submitted_at - TimeDelta::hours(1);
        let mut active = first.rsvp.clone().into_active_model();
        active.submitted_at = Set(backdated);
        active.update(&db).await.unwrap();

        let declined = RsvpDraft {
            attending: Some("no".into()),
            ..ada()
        };
        let second = submit(&db, Some("abc-123"), declined).await.unwrap();

        assert!(second.is_update);
        assert_eq!(second.rsvp.id, first.rsvp.id);
        assert_eq!(second.rsvp.attending, Answer::No);
        assert!(second.rsvp.submitted_at > backdated);
        assert_eq!(row_count(&db).await, 1);
    }

    #[tokio::test]
    async fn identical_resubmission_keeps_one_row() {
        let db = db_with_links(&[("abc-123", false)]).await;
        submit(&db, Some("abc-123"), ada()).await.unwrap();
        let again = submit(&db, Some("abc-123"), ada()).await.unwrap();

        assert!(again.is_update);
        assert_eq!(row_count(&db).await, 1);
    }

    #[tokio::test]
    async fn second_row_for_a_link_is_refused() {
        let db = db_with_links(&[("abc-123", false)]).await;
        let first = submit(&db, Some("abc-123"), ada()).await.unwrap();

        let mut duplicate = first.rsvp.into_active_model();
        duplicate.id = sea_orm::ActiveValue::NotSet;
        assert!(duplicate.insert(&db).await.is_err());
        assert_eq!(row_count(&db).await, 1);
    }

    #[tokio::test]
    async fn submission_checks_link_and_guests() {
        let db = db_with_links(&[("abc-123", false), ("vip-1", true)]).await;

        let unknown = submit(&db, Some("nope"), ada()).await.unwrap_err();
        assert_eq!(unknown.to_string(), "Invalid link identifier");

        let missing = submit(&db, None, ada()).await.unwrap_err();
        assert_eq!(missing.to_string(), "Missing required fields");

        assert!(submit(&db, Some("abc-123"), with_guest(1)).await.is_err());
        assert!(submit(&db, Some("vip-1"), with_guest(2)).await.is_err());
        assert_eq!(row_count(&db).await, 0);

        let vip = submit(&db, Some("vip-1"), with_guest(1)).await.unwrap();
        assert_eq!(vip.rsvp.guest_count, 1);
    }

    #[tokio::test]
    async fn hidden_link_starts_hidden() {
        let db = in_memory_database().await.unwrap();
        links::create(
            &db,
            NewLink {
                identifier: "quiet-1".into(),
                is_vip: false,
                is_hidden: true,
            },
        )
        .await
        .unwrap();

        let outcome = submit(&db, Some("quiet-1"), ada()).await.unwrap();
        assert!(outcome.rsvp.is_hidden);

        let listing = listing(&db).await.unwrap();
        assert!(listing.production.is_empty());
        assert_eq!(listing.hidden.len(), 1);
    }

    #[tokio::test]
    async fn hide_and_show_moves_between_lists() {
        let db = db_with_links(&[("abc-123", false)]).await;
        let id = submit(&db, Some("abc-123"), ada()).await.unwrap().rsvp.id;

        set_hidden(&db, id, true).await.unwrap();
        let hidden = listing(&db).await.unwrap();
        assert!(hidden.production.is_empty());
        assert_eq!(hidden.hidden[0].id, id);

        set_hidden(&db, id, false).await.unwrap();
        let shown = listing(&db).await.unwrap();
        assert_eq!(shown.production[0].id, id);
        assert!(shown.hidden.is_empty());

        assert!(matches!(
            set_hidden(&db, 999, true).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listing_separates_test_rsvps() {
        let db = db_with_links(&[("abc-123", false), ("test-reg-001", false)]).await;
        submit(&db, Some("abc-123"), ada()).await.unwrap();
        let test_id = submit(&db, Some("test-reg-001"), ada()).await.unwrap().rsvp.id;
        set_hidden(&db, test_id, true).await.unwrap();

        let listing = listing(&db).await.unwrap();
        assert_eq!(listing.production.len(), 1);
        assert_eq!(listing.test.len(), 1);
        assert!(listing.hidden.is_empty());
    }

    #[tokio::test]
    async fn delete_frees_the_link() {
        let db = db_with_links(&[("abc-123", false)]).await;
        let id = submit(&db, Some("abc-123"), ada()).await.unwrap().rsvp.id;
        assert!(links::unused(&db).await.unwrap().is_empty());

        delete(&db, id).await.unwrap();

        let unused = links::unused(&db).await.unwrap();
        assert_eq!(unused[0].uuid, "abc-123");
        assert!(matches!(delete(&db, id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn edit_applies_owning_link_rules() {
        let db = db_with_links(&[("abc-123", false), ("vip-1", true)]).await;
        let regular = submit(&db, Some("abc-123"), ada()).await.unwrap().rsvp;
        let vip = submit(&db, Some("vip-1"), ada()).await.unwrap().rsvp;

        assert!(edit(&db, regular.id, with_guest(1)).await.is_err());

        let edited = edit(
            &db,
            vip.id,
            RsvpDraft {
                full_name: Some("Ada King".into()),
                ..with_guest(1)
            },
        )
        .await
        .unwrap();
        assert_eq!(edited.full_name, "Ada King");
        assert_eq!(edited.guest_count, 1);
        assert_eq!(edited.submitted_at, vip.submitted_at);

        assert!(matches!(
            edit(&db, 999, ada()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn find_by_email_returns_latest() {
        let db = db_with_links(&[("abc-123", false)]).await;
        submit(&db, Some("abc-123"), ada()).await.unwrap();

        let found = find_by_email(&db, "ada@x.com").await.unwrap().unwrap();
        assert_eq!(found.link_uuid, "abc-123");
        assert!(find_by_email(&db, "bob@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cleanup_removes_only_test_data() {
        let db = db_with_links(&[
            ("abc-123", false),
            ("def-456", true),
            ("test-vip-001", true),
            ("test-reg-001", false),
        ])
        .await;
        submit(&db, Some("abc-123"), ada()).await.unwrap();
        submit(&db, Some("test-vip-001"), ada()).await.unwrap();
        submit(&db, Some("test-reg-001"), ada()).await.unwrap();

        let report = cleanup_test_data(&db).await.unwrap();
        assert_eq!(
            report,
            CleanupReport {
                rsvps_deleted: 2,
                links_deleted: 2,
            }
        );

        let remaining = all_views(&db).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].link_uuid, "abc-123");
        let links_left: Vec<String> = link_identifier::Entity::find()
            .all(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.uuid)
            .collect();
        assert_eq!(links_left, vec!["abc-123", "def-456"]);
    }
}
