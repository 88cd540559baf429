//! Chat transport boundary.

use crate::identity::Identity;

/// Outbound chat messages.
pub trait ChatSink: Send + Sync {
    /// Sends a plain message to the channel.
    fn send_message(&self, text: &str);

    /// Sends an error directed at `identity`.
    fn command_error(&self, identity: &Identity, text: &str);

    /// Tells `identity` that their command was not understood.
    fn command_invalid(&self, identity: &Identity);
}
