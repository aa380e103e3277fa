//! What a connection is told after a login command or override.
//!
//! Only the issuing connection is ever addressed. A change of rank sends
//! the refresh signal first, then the confirmation text; a redundant login
//! or a rejected command sends text alone.

use bailiff_protocol::Payload;

use crate::{AuthError, Transition};

/// OOC sender name used for server replies unless configured otherwise.
pub const DEFAULT_HOST_NAME: &str = "$H";

/// Turns command outcomes into outbound payloads.
#[derive(Debug, Clone)]
pub struct NotificationEmitter {
    host_name: String,
}

impl NotificationEmitter {
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
        }
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Payloads for the result of a login command.
    pub fn emit(&self, result: &Result<Transition, AuthError>) -> Vec<Payload> {
        match result {
            Ok(transition) => self.transition(*transition),
            Err(error) => self.error(error),
        }
    }

    /// Payloads for a successful transition.
    pub fn transition(&self, transition: Transition) -> Vec<Payload> {
        let mut out = Vec::with_capacity(2);
        if transition.refreshes() {
            out.push(Payload::FeatureRefresh);
        }
        if let Some(text) = transition.message() {
            out.push(self.ooc(text));
        }
        out
    }

    /// Payloads for a rejected command: the error text, nothing else.
    pub fn error(&self, error: &AuthError) -> Vec<Payload> {
        vec![self.ooc(error.to_string())]
    }

    /// A server OOC line.
    pub fn ooc(&self, text: impl Into<String>) -> Payload {
        Payload::Ooc {
            name: self.host_name.clone(),
            text: text.into(),
        }
    }
}

impl Default for NotificationEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_NAME)
    }
}
