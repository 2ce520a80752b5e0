use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use super::setup_test_db;
use crate::{amenity, city, place, place_amenity, review, state, user};

fn new_id() -> String { Uuid::new_v4().to_string() }

async fn insert_state(db: &sea_orm::DatabaseConnection, name: &str) -> Result<state::Model> {
    let now = Utc::now().into();
    let am = state::ActiveModel { id: Set(new_id()), created_at: Set(now), updated_at: Set(now), name: Set(name.into()) };
    Ok(am.insert(db).await?)
}

async fn insert_city(db: &sea_orm::DatabaseConnection, state_id: &str, name: &str) -> Result<city::Model> {
    let now = Utc::now().into();
    let am = city::ActiveModel {
        id: Set(new_id()),
        created_at: Set(now),
        updated_at: Set(now),
        state_id: Set(state_id.into()),
        name: Set(name.into()),
    };
    Ok(am.insert(db).await?)
}

async fn insert_user(db: &sea_orm::DatabaseConnection, email: &str) -> Result<user::Model> {
    let now = Utc::now().into();
    let am = user::ActiveModel {
        id: Set(new_id()),
        created_at: Set(now),
        updated_at: Set(now),
        email: Set(email.into()),
        password: Set("$argon2id$placeholder".into()),
        first_name: Set(None),
        last_name: Set(None),
    };
    Ok(am.insert(db).await?)
}

async fn insert_place(db: &sea_orm::DatabaseConnection, city_id: &str, user_id: &str) -> Result<place::Model> {
    let now = Utc::now().into();
    let am = place::ActiveModel {
        id: Set(new_id()),
        created_at: Set(now),
        updated_at: Set(now),
        city_id: Set(city_id.into()),
        user_id: Set(user_id.into()),
        name: Set("Beach house".into()),
        description: Set(None),
        number_rooms: Set(3),
        number_bathrooms: Set(2),
        max_guest: Set(6),
        price_by_night: Set(120),
        latitude: Set(Some(25.76)),
        longitude: Set(Some(-80.19)),
    };
    Ok(am.insert(db).await?)
}

async fn insert_review(db: &sea_orm::DatabaseConnection, place_id: &str, user_id: &str) -> Result<review::Model> {
    let now = Utc::now().into();
    let am = review::ActiveModel {
        id: Set(new_id()),
        created_at: Set(now),
        updated_at: Set(now),
        place_id: Set(place_id.into()),
        user_id: Set(user_id.into()),
        text: Set("Great stay".into()),
    };
    Ok(am.insert(db).await?)
}

#[tokio::test]
async fn deleting_state_removes_its_cities() -> Result<()> {
    let db = setup_test_db().await?;
    let florida = insert_state(&db, "Florida").await?;
    insert_city(&db, &florida.id, "Miami").await?;
    assert_eq!(city::Entity::find().count(&db).await?, 1);

    state::Entity::delete_by_id(florida.id.clone()).exec(&db).await?;

    assert_eq!(city::Entity::find().count(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn deleting_user_removes_places_and_reviews() -> Result<()> {
    let db = setup_test_db().await?;
    let st = insert_state(&db, "California").await?;
    let sf = insert_city(&db, &st.id, "San Francisco").await?;
    let owner = insert_user(&db, "owner@example.com").await?;
    let guest = insert_user(&db, "guest@example.com").await?;
    let p = insert_place(&db, &sf.id, &owner.id).await?;
    insert_review(&db, &p.id, &guest.id).await?;
    let own_review = insert_review(&db, &p.id, &owner.id).await?;
    assert_eq!(own_review.user_id, owner.id);

    owner.delete(&db).await?;

    assert_eq!(place::Entity::find().count(&db).await?, 0);
    // the guest's review belonged to the owner's place
    assert_eq!(review::Entity::find().count(&db).await?, 0);
    assert_eq!(user::Entity::find().count(&db).await?, 1);
    assert_eq!(city::Entity::find().count(&db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn amenities_link_through_junction_table() -> Result<()> {
    let db = setup_test_db().await?;
    let st = insert_state(&db, "Texas").await?;
    let austin = insert_city(&db, &st.id, "Austin").await?;
    let owner = insert_user(&db, "host@example.com").await?;
    let p = insert_place(&db, &austin.id, &owner.id).await?;

    let now = Utc::now().into();
    let wifi = amenity::ActiveModel { id: Set(new_id()), created_at: Set(now), updated_at: Set(now), name: Set("Wifi".into()) }
        .insert(&db)
        .await?;
    place_amenity::ActiveModel { place_id: Set(p.id.clone()), amenity_id: Set(wifi.id.clone()) }
        .insert(&db)
        .await?;

    let linked = p.find_related(amenity::Entity).all(&db).await?;
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].name, "Wifi");

    // removing the amenity drops the link but keeps the place
    amenity::Entity::delete_by_id(wifi.id.clone()).exec(&db).await?;
    let links = place_amenity::Entity::find()
        .filter(place_amenity::Column::PlaceId.eq(p.id.clone()))
        .count(&db)
        .await?;
    assert_eq!(links, 0);
    assert!(place::Entity::find_by_id(p.id.clone()).one(&db).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn orphan_city_is_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let res = insert_city(&db, "missing-state", "Nowhere").await;
    assert!(res.is_err());
    Ok(())
}
