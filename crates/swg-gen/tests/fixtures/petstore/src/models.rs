use serde::{Deserialize, Serialize};

/// A pet in the store.
#[derive(Serialize, Deserialize)]
pub struct Pet {
    pub id: u64,
    pub name: String,
    pub tag: Option<String>,
    pub status: PetStatus,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    Available,
    Sold,
}

#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub code: i32,
    pub message: String,
}

/// Never referenced by a handler.
#[derive(Serialize, Deserialize)]
pub struct Inventory {
    pub counts: Vec<u32>,
}
