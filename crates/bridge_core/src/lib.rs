//! Domain logic for the Forgejo ↔ Mattermost bridge.
//!
//! This crate contains the relay core: issue keys, slash-command parsing,
//! webhook payload classification and routing, signature verification, and
//! the notification dispatcher that decides between threaded replies, plain
//! channel messages, and incoming-webhook fallbacks.
//!
//! # Architecture
//!
//! This crate defines interface traits that infrastructure implements:
//! - The dispatcher depends on [`ChatGateway`], [`FallbackNotifier`], and
//!   [`CorrelationSource`] traits.
//! - The chat client and the store crates implement the traits.
//! - The HTTP layer wires everything together.
//!
//! No HTTP framework or storage engine types leak into this crate.

pub mod command;
pub mod dispatch;
pub mod errors;
pub mod events;
pub mod issue_key;
pub mod messages;
pub mod models;
pub mod signature;

// Re-export for convenient access
pub use command::{parse_command, ChatContext, IssueRequest, SlashCommand};
pub use dispatch::{
    ChatGateway, CorrelationSource, DispatchOutcome, FallbackNotifier, NotificationDispatcher,
    PostedMessage,
};
pub use errors::{CommandError, DispatchError, IssueKeyError};
pub use events::{classify, EventOutcome, EventRouter, WebhookEvent};
pub use issue_key::IssueKey;
pub use models::{NewThreadCorrelation, ThreadCorrelation, TokenGrant, UserCredential};
pub use signature::{verify_webhook_signature, SIGNATURE_HEADER};
