//! Confirmation gate for destructive tools.
//!
//! Strategy: try the interactive channel first (best effort; any failure
//! falls through), otherwise issue a short-lived single-use token the caller
//! must echo back on the next attempt. A destructive call therefore never
//! runs without either live approval or an explicit time-boxed round trip.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use rand::RngCore;

pub const TOKEN_TTL: Duration = Duration::from_secs(120);

const TOKEN_BYTES: usize = 16;

/// Outcome of the interactive confirmation channel, evaluated eagerly so the
/// token fallback is a visible branch rather than a side effect of error
/// handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOutcome {
    Approved,
    /// The client answered and said no (or answered without confirming).
    Declined,
    /// No channel, the client errored, or the wait was cut short.
    Unavailable,
}

/// A richer interactive confirmation surface, typically MCP elicitation.
/// Implementations must be bounded: hang-forever channels would stall the
/// whole call.
#[async_trait::async_trait]
pub trait ConfirmationChannel: Send + Sync {
    async fn request(&self, action: &str, details: &str) -> ChannelOutcome;
}

/// The always-absent channel, for hosts with no interactive surface.
pub struct NoChannel;

#[async_trait::async_trait]
impl ConfirmationChannel for NoChannel {
    async fn request(&self, _action: &str, _details: &str) -> ChannelOutcome {
        ChannelOutcome::Unavailable
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    NotConfirmed { token: String, message: String },
}

#[derive(Debug)]
struct PendingConfirmation {
    action: String,
    created_at: Instant,
}

/// Issues and redeems the tokens. Exclusively owns its pending map; the map
/// and the mode scalar are the only state shared across concurrent calls.
#[derive(Default)]
pub struct ConfirmationManager {
    pending: Mutex<HashMap<String, PendingConfirmation>>,
}

impl ConfirmationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request confirmation for a destructive action.
    ///
    /// A supplied token is validated (and consumed) without consulting the
    /// channel; otherwise the channel is tried first and any non-approval
    /// falls through to token issuance.
    pub async fn request_confirmation(
        &self,
        action: &str,
        details: &str,
        supplied_token: Option<&str>,
        channel: &dyn ConfirmationChannel,
    ) -> Confirmation {
        if let Some(token) = supplied_token {
            return self.validate_token(token, action, Instant::now());
        }

        match channel.request(action, details).await {
            ChannelOutcome::Approved => Confirmation::Confirmed,
            // An explicit decline still falls through to the token path,
            // matching the original behavior; see DESIGN.md.
            ChannelOutcome::Declined | ChannelOutcome::Unavailable => {
                self.issue_token(action, details, Instant::now())
            }
        }
    }

    fn issue_token(&self, action: &str, details: &str, now: Instant) -> Confirmation {
        let mut pending = self.lock_pending();
        Self::prune_expired(&mut pending, now);

        let token = new_token();
        pending.insert(
            token.clone(),
            PendingConfirmation {
                action: action.to_string(),
                created_at: now,
            },
        );

        let message = format!(
            "This action may cause data loss: {action}\n{details}\n\n\
             To confirm, call this tool again with confirmationToken: \"{token}\"\n\
             This token expires in {} seconds.",
            TOKEN_TTL.as_secs()
        );
        Confirmation::NotConfirmed { token, message }
    }

    fn validate_token(&self, token: &str, action: &str, now: Instant) -> Confirmation {
        let matched = {
            let mut pending = self.lock_pending();
            Self::prune_expired(&mut pending, now);

            match pending.get(token) {
                Some(entry) if entry.action == action => {
                    pending.remove(token);
                    true
                }
                Some(_) | None => false,
            }
        };

        if matched {
            return Confirmation::Confirmed;
        }

        // Expired, unknown, or bound to another action: supersede with a
        // fresh token for the action actually being attempted.
        self.issue_token(
            action,
            "Previous token expired or invalid. New token issued.",
            now,
        )
    }

    fn prune_expired(pending: &mut HashMap<String, PendingConfirmation>, now: Instant) {
        pending.retain(|_, entry| now.duration_since(entry.created_at) <= TOKEN_TTL);
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingConfirmation>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().fold(
        String::with_capacity(TOKEN_BYTES * 2),
        |mut out, byte| {
            use std::fmt::Write;
            let _ = write!(out, "{byte:02x}");
            out
        },
    )
}
