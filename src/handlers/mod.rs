pub mod health;
pub mod missions;
pub mod progress;
pub mod ws;
