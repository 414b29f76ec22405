pub mod auth_service;
pub mod google_service;
pub mod group_service;
pub mod profile_service;
pub mod token_service;
