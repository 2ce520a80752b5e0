use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{place, state};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub state_id: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    State,
    Place,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::State => Entity::belongs_to(state::Entity)
                .from(Column::StateId)
                .to(state::Column::Id)
                .into(),
            Relation::Place => Entity::has_many(place::Entity).into(),
        }
    }
}

impl Related<state::Entity> for Entity {
    fn to() -> RelationDef { Relation::State.def() }
}

impl Related<place::Entity> for Entity {
    fn to() -> RelationDef { Relation::Place.def() }
}

impl ActiveModelBehavior for ActiveModel {}
