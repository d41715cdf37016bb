//! Telegram adapter (teloxide): update routing and command/media handlers
//! on top of the `orb-core` chat service.

pub mod handlers;
pub mod router;
