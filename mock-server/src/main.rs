//! Standalone mock server for manual runs against a real native engine.
//!
//! `PORT` picks the port (default 3000); `BIND` the address (default
//! loopback). Log level comes from `RUST_LOG`, defaulting to `info`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;

const DEFAULT_PORT: u16 = 3000;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("ignoring invalid {name}={raw:?}");
            default
        }),
        Err(_) => default,
    }
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let ip: IpAddr = env_or("BIND", IpAddr::V4(Ipv4Addr::LOCALHOST));
    let port: u16 = env_or("PORT", DEFAULT_PORT);
    let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;
    mock_server::run(listener).await
}
