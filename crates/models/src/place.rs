use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{amenity, city, place_amenity, review, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "places")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub city_id: String,
    pub user_id: String,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub number_rooms: i32,
    pub number_bathrooms: i32,
    pub max_guest: i32,
    pub price_by_night: i32,
    #[sea_orm(column_type = "Double", nullable)]
    pub latitude: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub longitude: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    City,
    User,
    Review,
    PlaceAmenity,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::City => Entity::belongs_to(city::Entity)
                .from(Column::CityId)
                .to(city::Column::Id)
                .into(),
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
            Relation::Review => Entity::has_many(review::Entity).into(),
            Relation::PlaceAmenity => Entity::has_many(place_amenity::Entity).into(),
        }
    }
}

impl Related<city::Entity> for Entity {
    fn to() -> RelationDef { Relation::City.def() }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl Related<review::Entity> for Entity {
    fn to() -> RelationDef { Relation::Review.def() }
}

// Many-to-many through the `place_amenity` junction table.
impl Related<amenity::Entity> for Entity {
    fn to() -> RelationDef { place_amenity::Relation::Amenity.def() }
    fn via() -> Option<RelationDef> { Some(place_amenity::Relation::Place.def().rev()) }
}

impl ActiveModelBehavior for ActiveModel {}
