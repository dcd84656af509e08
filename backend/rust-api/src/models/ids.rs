//! Identifier aliases. User ids come from the identity service as opaque strings
//! (the `sub` claim); receipt ids are assigned by the database.

pub type UserId = String;
pub type BoletaId = i64;
