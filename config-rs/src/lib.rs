//! config-rs/lib.rs
//! Shared configuration utilities for the plant advisor services
//! Provides port/address resolution and typed environment lookups

use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// Load a `.env` file from the working directory if one exists.
///
/// Missing files are not an error; values already present in the
/// process environment take precedence over the file.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => log::warn!("Failed to parse .env file: {}", err),
    }
}

/// Get service port from environment variables with proper fallback
///
/// # Arguments
/// * `service_name` - The name of the service (e.g., "ADVISOR")
/// * `default_port` - The default port to use if not specified in environment
///
/// # Returns
/// The port number to use for the service
pub fn get_service_port(service_name: &str, default_port: u16) -> u16 {
    let var_name = format!("{}_SERVICE_PORT", service_name.to_uppercase());
    match env::var(&var_name) {
        Ok(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
            log::warn!("Invalid port in {}, using default {}", var_name, default_port);
            default_port
        }),
        Err(_) => default_port,
    }
}

/// Create a SocketAddr for binding a service
///
/// `<SERVICE>_SERVICE_ADDR` wins when it holds a socket address, either bare
/// (`127.0.0.1:8080`) or URL-shaped (`http://127.0.0.1:8080`). Otherwise the
/// service binds every interface on the resolved port.
pub fn get_bind_address(service_name: &str, default_port: u16) -> SocketAddr {
    let var_name = format!("{}_SERVICE_ADDR", service_name.to_uppercase());

    if let Ok(addr_str) = env::var(&var_name) {
        let candidate = addr_str
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&addr_str)
            .trim_end_matches('/');
        match candidate.parse::<SocketAddr>() {
            Ok(addr) => return addr,
            Err(_) => log::warn!("Invalid address format in {}, using default", var_name),
        }
    }

    let port = get_service_port(service_name, default_port);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Read a typed environment variable, falling back to `default` when the
/// variable is unset or does not parse.
pub fn get_env_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            log::warn!("Could not parse {}={:?}, using default", name, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Read a string environment variable with a default.
pub fn get_env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Look up a secret by trying each variable name in order.
///
/// Empty or whitespace-only values count as absent, so an `.env` template
/// with `LLM_API_KEY=` leaves the secret unset.
pub fn get_secret(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
