//! specpad Gateway - HTTP backend for a browser-based editor
//!
//! Serves one document kept in sync with a file on disk.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                    specpad Gateway                     │
//! ├───────────────────────────────────────────────────────┤
//! │  GET/PUT /backend   /static/* (CORS)   / (editor)      │
//! │        │                                               │
//! │  ┌─────▼──────────────┐        ┌───────────────────┐  │
//! │  │      Document      │◄───────│     Persister     │  │
//! │  │ RwLock + dirty flag│        │ load, flush ticks │  │
//! │  └────────────────────┘        └─────────┬─────────┘  │
//! │                                          │            │
//! └──────────────────────────────────────────┼────────────┘
//!                                            ▼
//!                                     api-spec.yaml
//! ```
//!
//! # Features
//!
//! - **Live document**: fetch and replace the whole document over HTTP
//! - **Background persistence**: dirty contents flushed every tick
//! - **Editor hosting**: bundled editor or an installation on disk
//! - **Static files**: any directory served with permissive CORS

pub mod assets;
pub mod browser;
pub mod config;
pub mod cors;
pub mod error;
pub mod gateway;

pub use config::{EditorSource, GatewayConfig};
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, GatewayState};

/// Gateway version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8765;

/// Default host
pub const DEFAULT_HOST: &str = "127.0.0.1";
