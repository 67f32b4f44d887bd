//! @title Petstore API
//! @version 1.0
//! @description A sample pet store.
//! @host petstore.example.com
//! @BasePath /v1
//! @schemes https

mod handlers;
mod models;

/// @securityDefinitions.apikey ApiKeyAuth
/// @in header
/// @name Authorization
fn main() {}
