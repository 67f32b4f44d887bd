use crate::models::{ApiError, Pet};

/// @Summary List pets
/// @Param limit query i32 false "How many items to return"
/// @Success 200 {array} Pet
/// @Failure 500 {object} ApiError
/// @Router /pets [get]
pub async fn list_pets() {}

/// @Summary Show a pet
/// @Param pet_id path u64 true "Pet id"
/// @Success 200 {object} Pet
/// @Failure 404 {object} ApiError "Not found"
/// @Security ApiKeyAuth
/// @Router /pets/{pet_id} [get]
pub async fn show_pet() {}

/// @Summary Create a pet
/// @Accept json
/// @Produce json
/// @Param pet body Pet true "Pet to add"
/// @Success 201 {object} Pet
/// @Router /pets [post]
pub async fn create_pet() {}
