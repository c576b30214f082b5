// plusctl-api: Async Rust client for the web admin console of NETGEAR
// Plus (GS30x/GS316) switches.
//
// The switches expose no documented API -- only an HTML admin console.
// This crate reproduces the console's authentication handshake and form
// protocol faithfully enough to read and mutate device state without a
// browser: model detection, the firmware's password obfuscation, the two
// per-family login protocols, token persistence, and authenticated
// request dispatch. Turning the returned page HTML into records is the
// consumer's concern.

pub mod auth;
pub mod cipher;
pub mod client;
pub mod error;
pub mod model;
pub mod poe;
pub mod port;
pub mod token;
pub mod transport;

pub use auth::ModelFamily;
pub use client::{PasswordResolver, SwitchClient, SwitchClientBuilder, SwitchConfig};
pub use error::{Error, ErrorKind};
pub use model::{Model, detect_model};
pub use poe::{PoeLimitType, PoeMode, PoePortUpdate, PoePriority};
pub use port::{PortSpeed, PortUpdate};
pub use token::{Credential, FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{Form, Transport, TransportConfig};
