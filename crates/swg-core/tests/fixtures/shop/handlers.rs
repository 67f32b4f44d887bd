use crate::models::{Order, Paged};
use crate::models::Customer as Buyer;

/// List orders.
///
/// @Summary List orders
/// @Param page query u32 false "Page number" default(1)
/// @Success 200 {object} Paged<Order>
/// @Router /orders [get]
pub async fn list_orders() {}

/// @Summary Get a buyer
/// @Param id path u64 true "Buyer id"
/// @Success 200 {object} Buyer
/// @Failure 400 {object} Error
/// @Router /buyers/{id} [get]
pub async fn get_buyer() {}

/// @Summary Update an order
/// @Param body body Order true "Order"
/// @Success 200 {object} Order
/// @Failure 500 {object} shipping::Quote
/// @Router /orders/{order_id} [put]
pub async fn update_order() {}

/// Not an endpoint.
pub fn helper() {}
