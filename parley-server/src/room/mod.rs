mod connection_registry;
mod membership_service;
mod room_command;
mod room_manager;
mod room_membership;
mod text_channels;

pub use connection_registry::*;
pub use membership_service::*;
pub use room_command::*;
pub use room_manager::*;
pub use room_membership::*;
pub use text_channels::*;
