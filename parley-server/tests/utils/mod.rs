#![allow(dead_code)]

pub mod ws_client;

pub use mock_signaling::*;
pub use ws_client::*;
