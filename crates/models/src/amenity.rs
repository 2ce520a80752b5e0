use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{place, place_amenity};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "amenities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    PlaceAmenity,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::PlaceAmenity => Entity::has_many(place_amenity::Entity).into() }
    }
}

impl Related<place::Entity> for Entity {
    fn to() -> RelationDef { place_amenity::Relation::Place.def() }
    fn via() -> Option<RelationDef> { Some(place_amenity::Relation::Amenity.def().rev()) }
}

impl ActiveModelBehavior for ActiveModel {}
