pub use sea_orm_migration::prelude::*;

mod iden;
mod m20250801_000001_create_link_identifiers;
mod m20250801_000002_create_rsvps;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250801_000001_create_link_identifiers::Migration),
            Box::new(m20250801_000002_create_rsvps::Migration),
        ]
    }
}
