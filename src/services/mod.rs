pub mod missions;
pub mod notifications;
