//! SeaORM entities for the relational backend.
//!
//! One module per table. Foreign keys carry `ON DELETE CASCADE` (see the
//! `migration` crate), so deleting a parent row removes its dependents.

pub mod errors;
pub mod db;
pub mod state;
pub mod city;
pub mod user;
pub mod amenity;
pub mod place;
pub mod place_amenity;
pub mod review;

#[cfg(test)]
mod tests;
