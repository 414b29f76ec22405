pub mod admin;
pub mod certifications;
pub mod change_password;
pub mod education;
pub mod experience;
pub mod google;
pub mod health;
pub mod internal;
pub mod login;
pub mod me;
pub mod portfolio;
pub mod profile;
pub mod refresh;
pub mod register;
pub mod social_links;
pub mod users;
pub mod verify_email;
