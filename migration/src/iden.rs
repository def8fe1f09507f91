use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub enum LinkIdentifiers {
    Table,
    Id,
    TrackingNumber,
    Uuid,
    IsVip,
    IsHidden,
    IsTest,
}

#[derive(DeriveIden)]
pub enum Rsvps {
    Table,
    Id,
    LinkIdentifierId,
    FullName,
    Email,
    Phone,
    Company,
    Attending,
    HasGuests,
    GuestCount,
    Donation,
    IsHidden,
    SubmittedAt,
}
