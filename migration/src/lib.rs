pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_user_tables;
mod m20250301_000002_create_threshold_tables;
mod m20250301_000003_create_health_records;
mod m20250301_000004_create_oauth_states;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_user_tables::Migration),
            Box::new(m20250301_000002_create_threshold_tables::Migration),
            Box::new(m20250301_000003_create_health_records::Migration),
            Box::new(m20250301_000004_create_oauth_states::Migration),
        ]
    }
}
