use clap::Parser;
use parley_core::IceServerConfig;
use parley_core::utils::DEFAULT_STUN_ADDR;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("ICE server url '{0}' must start with stun:, turn: or turns:")]
    InvalidIceUrl(String),

    #[error("TURN credentials given without TURN_URL")]
    CredentialsWithoutTurn,

    #[error("command buffer must be greater than zero")]
    ZeroCommandBuffer,
}

/// Relay settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Pushed to every client right after it attaches.
    pub ice_servers: Vec<IceServerConfig>,
    /// Capacity of the membership actor's command queue.
    pub command_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 4000)),
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned()],
                username: None,
                credential: None,
            }],
            command_buffer: 256,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "parley-server", about = "Voice room membership and signaling relay")]
pub struct Args {
    #[arg(long, env = "PARLEY_BIND", default_value = "0.0.0.0:4000")]
    pub bind: SocketAddr,

    #[arg(
        long = "stun",
        env = "PARLEY_STUN_URLS",
        value_delimiter = ',',
        default_value = DEFAULT_STUN_ADDR
    )]
    pub stun_urls: Vec<String>,

    #[arg(long, env = "TURN_URL")]
    pub turn_url: Option<String>,

    #[arg(long, env = "TURN_USERNAME")]
    pub turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL")]
    pub turn_credential: Option<String>,

    #[arg(long, default_value_t = 256)]
    pub command_buffer: usize,
}

impl TryFrom<Args> for ServerConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.command_buffer == 0 {
            return Err(ConfigError::ZeroCommandBuffer);
        }

        let mut ice_servers = Vec::new();

        let stun_urls: Vec<String> = args
            .stun_urls
            .into_iter()
            .filter(|u| !u.trim().is_empty())
            .collect();
        for url in &stun_urls {
            validate_ice_url(url)?;
        }
        if !stun_urls.is_empty() {
            ice_servers.push(IceServerConfig {
                urls: stun_urls,
                username: None,
                credential: None,
            });
        }

        match args.turn_url {
            Some(turn_url) => {
                validate_ice_url(&turn_url)?;
                ice_servers.push(IceServerConfig {
                    urls: vec![turn_url],
                    username: args.turn_username,
                    credential: args.turn_credential,
                });
            }
            None if args.turn_username.is_some() || args.turn_credential.is_some() => {
                return Err(ConfigError::CredentialsWithoutTurn);
            }
            None => {}
        }

        Ok(Self {
            bind: args.bind,
            ice_servers,
            command_buffer: args.command_buffer,
        })
    }
}

fn validate_ice_url(url: &str) -> Result<(), ConfigError> {
    let valid = ["stun:", "turn:", "turns:"]
        .iter()
        .any(|scheme| url.starts_with(scheme));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidIceUrl(url.to_owned()))
    }
}
