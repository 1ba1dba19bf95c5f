//! `SeaORM` Entity for the entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tx_id: i64,
    /// Order within the version; 0 is the primary entry.
    pub position: i32,
    pub payee: String,
    pub payer: String,
    pub quant: i64,
    pub trunkward_quant: Option<i64>,
    pub author: String,
    pub description: String,
    pub metadata: Json,
    pub is_primary: bool,
    pub is_additional: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TxId",
        to = "super::transactions::Column::Id",
        on_delete = "Cascade"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
