//! `SeaORM` Entity for the hash chain kept with each neighbor.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "hash_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub acc_id: String,
    pub uuid: Uuid,
    pub version: i32,
    pub hash: String,
    pub written: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
