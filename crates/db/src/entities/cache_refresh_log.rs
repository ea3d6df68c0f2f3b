//! `SeaORM` Entity for the cache_refresh_log table.
//!
//! One row per completed refresh of the account_balances view. The
//! newest row is the freshness authority for the reporting cache.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cache_refresh_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub refreshed_at: DateTimeWithTimeZone,
    pub duration_ms: i64,
    pub row_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
