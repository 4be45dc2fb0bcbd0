// External service clients
pub mod auth;
pub mod firestore;
pub mod llm;
