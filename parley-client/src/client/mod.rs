mod voice_client;
mod voice_command;
mod voice_event;
mod voice_handle;

pub use voice_client::*;
pub use voice_command::*;
pub use voice_event::*;
pub use voice_handle::*;
