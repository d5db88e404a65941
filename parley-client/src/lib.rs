mod client;
mod error;
mod media;
mod negotiation;
mod reconciler;
mod relay;

pub use client::*;
pub use error::*;
pub use media::*;
pub use negotiation::*;
pub use reconciler::*;
pub use relay::*;
