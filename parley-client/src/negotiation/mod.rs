mod engine;
mod session;
mod state;
mod tie_break;

pub use engine::*;
pub use session::*;
pub use state::*;
pub use tie_break::*;
