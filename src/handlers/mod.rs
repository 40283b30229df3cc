// handlers/mod.rs - HTTP controllers
//
// Public:    GET /, GET /health
// Protected: /contacts/*, /messages/* (token required, see middleware::auth)

pub mod contacts;
pub mod messages;
pub mod resource;
pub mod system;
