//! Platform transport.
//!
//! [`ActivityTransport`] is the seam between the HTTP endpoint and the chat platform: it
//! authenticates and decodes inbound webhook payloads and delivers outbound replies.
//! [`BotFrameworkTransport`] implements it against the Bot Framework connector REST API.

mod bot_framework;
mod transport;

pub use bot_framework::BotFrameworkTransport;
pub use transport::{ActivityTransport, TransportError};
