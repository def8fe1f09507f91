use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = table_auto(LinkIdentifiers::Table)
            .col(pk_auto(LinkIdentifiers::Id))
            .col(integer(LinkIdentifiers::TrackingNumber))
            .col(string_uniq(LinkIdentifiers::Uuid))
            .col(boolean(LinkIdentifiers::IsVip).default(false))
            .col(boolean(LinkIdentifiers::IsHidden).default(false))
            .col(boolean(LinkIdentifiers::IsTest).default(false))
            .to_owned();
        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_link_identifiers_uuid")
                    .table(LinkIdentifiers::Table)
                    .col(LinkIdentifiers::Uuid)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_link_identifiers_vip")
                    .table(LinkIdentifiers::Table)
                    .col(LinkIdentifiers::IsVip)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_link_identifiers_tracking")
                    .table(LinkIdentifiers::Table)
                    .col(LinkIdentifiers::TrackingNumber)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LinkIdentifiers::Table).to_owned())
            .await?;

        Ok(())
    }
}
