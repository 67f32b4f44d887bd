use serde::{Deserialize, Serialize};

/// A customer order.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: u64,
    pub customer: Customer,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    /// @example "leave at door"
    pub note: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    /// Orders placed by this customer.
    pub orders: Vec<Order>,
    pub referred_by: Option<Box<Customer>>,
}

#[derive(Serialize, Deserialize)]
pub struct OrderLine {
    pub sku: String,
    pub quantity: u32,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Shipped,
}

#[derive(Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

pub mod legacy {
    pub struct Error {
        pub code: i32,
    }
}

pub struct Error {
    pub message: String,
}
