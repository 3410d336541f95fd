pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_identity;
mod m20250101_000002_create_inventory;
mod m20250101_000003_create_favorites;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_identity::Migration),
            Box::new(m20250101_000002_create_inventory::Migration),
            Box::new(m20250101_000003_create_favorites::Migration),
        ]
    }
}
