pub mod sessions;
pub mod shifts;
pub mod users;

use bson::oid::ObjectId;

/// Generates a new 24-character lowercase hex object id.
pub fn new_object_id() -> String {
    ObjectId::new().to_hex()
}

/// True when `value` is a 24-character hex object id.
pub fn is_object_id(value: &str) -> bool {
    value.len() == 24 && ObjectId::parse_str(value).is_ok()
}
