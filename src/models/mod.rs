// Data models matching the Firestore document structures
pub mod access;
pub mod audit;
pub mod course;
pub mod engagement;
pub mod progress;
pub mod user;
