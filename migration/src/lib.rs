pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_users_and_packs;
mod m20251001_000002_create_rewards_and_charges;
mod m20251001_000003_create_referrals_and_exchanges;
mod m20251001_000004_create_config_versions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_users_and_packs::Migration),
            Box::new(m20251001_000002_create_rewards_and_charges::Migration),
            Box::new(m20251001_000003_create_referrals_and_exchanges::Migration),
            Box::new(m20251001_000004_create_config_versions::Migration),
        ]
    }
}
