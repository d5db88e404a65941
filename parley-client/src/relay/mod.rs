mod relay_link;
mod signal_sink;

pub use relay_link::*;
pub use signal_sink::*;
