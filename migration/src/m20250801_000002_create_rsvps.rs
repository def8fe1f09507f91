use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = table_auto(Rsvps::Table)
            .col(pk_auto(Rsvps::Id))
            .col(integer(Rsvps::LinkIdentifierId))
            .col(string(Rsvps::FullName))
            .col(string(Rsvps::Email))
            .col(string(Rsvps::Phone))
            .col(string_null(Rsvps::Company))
            .col(string(Rsvps::Attending))
            .col(string_null(Rsvps::HasGuests))
            .col(integer(Rsvps::GuestCount).default(0))
            .col(string_null(Rsvps::Donation))
            .col(boolean(Rsvps::IsHidden).default(false))
            .col(timestamp_with_time_zone(Rsvps::SubmittedAt))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_rsvps_link_identifier")
                    .from(Rsvps::Table, Rsvps::LinkIdentifierId)
                    .to(LinkIdentifiers::Table, LinkIdentifiers::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .check(
                Expr::col(Rsvps::GuestCount)
                    .gte(0)
                    .and(Expr::col(Rsvps::GuestCount).lte(1)),
            )
            .to_owned();
        manager.create_table(table).await?;

        // One response per invitation link.
        manager
            .create_index(
                Index::create()
                    .name("idx_rsvps_link_identifier")
                    .table(Rsvps::Table)
                    .col(Rsvps::LinkIdentifierId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rsvps_email")
                    .table(Rsvps::Table)
                    .col(Rsvps::Email)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rsvps_attending")
                    .table(Rsvps::Table)
                    .col(Rsvps::Attending)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rsvps::Table).to_owned())
            .await?;

        Ok(())
    }
}
