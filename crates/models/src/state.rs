use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::city;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "states")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    City,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::City => Entity::has_many(city::Entity).into() }
    }
}

impl Related<city::Entity> for Entity {
    fn to() -> RelationDef { Relation::City.def() }
}

impl ActiveModelBehavior for ActiveModel {}
