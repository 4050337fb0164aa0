pub mod chat;
pub mod embedding;
pub mod health;
pub mod memory;
