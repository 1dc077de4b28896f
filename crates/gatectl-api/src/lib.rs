// gatectl-api: async client for the gateway management API

pub mod client;
pub mod error;
pub mod transport;

pub use client::{GatewayClient, TargetFamily};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
