mod media_backend;
mod media_event;
mod webrtc_backend;

pub use media_backend::*;
pub use media_event::*;
pub use webrtc_backend::*;
