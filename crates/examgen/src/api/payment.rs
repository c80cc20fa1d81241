//! Payment-gated unlocking of the answer-key artifact.
//!
//! A purchase either unlocks immediately or hands off to an external
//! checkout page. The handoff leaves the application entirely, so the job
//! id is persisted to durable storage first and recovered when the checkout
//! redirects back with query parameters.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use log::{info, warn};

use crate::api::client::ApiClient;
use crate::api::poller::{poll_answer_status, PollOptions};
use crate::api::types::PurchaseResponse;
use crate::error::{ApiError, Result};
use crate::storage::{KeyValueStore, KEY_PENDING_UNLOCK};

/// Browser-navigation side effects, abstracted so the redirect fallback
/// chain is testable without a real browser.
pub trait Navigator: Send + Sync {
    /// Navigates the current context away to `url`.
    fn redirect(&self, url: &str) -> std::result::Result<(), String>;
    /// Opens `url` in a new browsing context.
    fn open_new_context(&self, url: &str) -> std::result::Result<(), String>;
    fn copy_to_clipboard(&self, text: &str) -> std::result::Result<(), String>;
}

/// How the checkout URL reached the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutHandoff {
    Redirected,
    OpenedNewContext,
    /// Navigation was blocked everywhere; the URL was copied for the user.
    CopiedToClipboard(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Backend confirmed immediately; answer-key generation should start.
    Unlocked,
    /// The user is on (or holds a link to) the external checkout page.
    CheckoutStarted(CheckoutHandoff),
}

/// Parsed from the query string of the return navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReturn {
    pub success: bool,
    pub job_id: String,
}

impl CheckoutReturn {
    /// Parses `payment=success|cancel&job_id=..` out of a query string
    /// (leading `?` optional). Returns `None` when the parameters are not a
    /// checkout return at all.
    pub fn from_query(query: &str) -> Option<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut payment = None;
        let mut job_id = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("payment", value)) => payment = Some(value.to_string()),
                Some(("job_id", value)) => job_id = Some(value.to_string()),
                _ => {}
            }
        }
        match (payment.as_deref(), job_id) {
            (Some("success"), Some(job_id)) => Some(Self { success: true, job_id }),
            (Some("cancel"), Some(job_id)) => Some(Self { success: false, job_id }),
            _ => None,
        }
    }
}

/// What the caller must do after a checkout return was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Payment confirmed: the job is unlocked and answer-key generation
    /// should begin for this remote id.
    StartAnswerGeneration(String),
    /// The user cancelled at the checkout page.
    Dismissed,
    /// No pending marker: this return was already handled (or never ours).
    AlreadyHandled,
}

pub struct PaymentGate {
    storage: Arc<dyn KeyValueStore>,
    /// Remote job ids confirmed as unlocked within this session.
    unlocked: RwLock<HashSet<String>>,
    /// Dev/testing only; injected explicitly, never read from the
    /// environment.
    unlock_bypass: bool,
}

impl PaymentGate {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            unlocked: RwLock::new(HashSet::new()),
            unlock_bypass: false,
        }
    }

    pub fn with_unlock_bypass(storage: Arc<dyn KeyValueStore>, bypass: bool) -> Self {
        if bypass {
            warn!("Payment unlock bypass enabled: every job will appear unlocked");
        }
        Self {
            storage,
            unlocked: RwLock::new(HashSet::new()),
            unlock_bypass: bypass,
        }
    }

    pub fn is_unlocked(&self, remote_id: &str) -> bool {
        if self.unlock_bypass {
            return true;
        }
        let set = self.unlocked.read().unwrap_or_else(|p| p.into_inner());
        set.contains(remote_id)
    }

    fn mark_unlocked(&self, remote_id: &str) {
        let mut set = self.unlocked.write().unwrap_or_else(|p| p.into_inner());
        set.insert(remote_id.to_string());
    }

    /// Requests a purchase for `remote_id` and drives the checkout handoff.
    ///
    /// When the backend returns a checkout URL, the pending marker is
    /// persisted *before* any navigation: the browser is about to leave the
    /// application and the marker is the only way to resume afterwards.
    pub async fn purchase(
        &self,
        client: &ApiClient,
        navigator: &dyn Navigator,
        remote_id: &str,
    ) -> Result<PurchaseOutcome> {
        let response: PurchaseResponse = client
            .send_json(
                client
                    .post("/payments/purchase-download")
                    .json(&serde_json::json!({ "job_id": remote_id })),
                "purchase",
            )
            .await?;

        if response.unlocked {
            info!("Purchase for job {} confirmed immediately", remote_id);
            self.mark_unlocked(remote_id);
            return Ok(PurchaseOutcome::Unlocked);
        }

        let checkout_url = response.checkout_url.ok_or_else(|| {
            ApiError::PaymentFailed("Backend returned neither unlock nor checkout URL".to_string())
        })?;

        self.storage
            .set(KEY_PENDING_UNLOCK, remote_id)
            .map_err(ApiError::Storage)?;

        let handoff = self.hand_off(navigator, &checkout_url)?;
        Ok(PurchaseOutcome::CheckoutStarted(handoff))
    }

    /// Redirect, then a new context, then the clipboard. Restrictive
    /// embedded browsers block the first two; only full exhaustion is an
    /// error, and even then the URL travels in the error text.
    fn hand_off(&self, navigator: &dyn Navigator, url: &str) -> Result<CheckoutHandoff> {
        if navigator.redirect(url).is_ok() {
            return Ok(CheckoutHandoff::Redirected);
        }
        warn!("Checkout redirect blocked, trying a new browsing context");
        if navigator.open_new_context(url).is_ok() {
            return Ok(CheckoutHandoff::OpenedNewContext);
        }
        warn!("New browsing context blocked, copying checkout URL");
        match navigator.copy_to_clipboard(url) {
            Ok(()) => Ok(CheckoutHandoff::CopiedToClipboard(url.to_string())),
            Err(e) => Err(ApiError::PaymentFailed(format!(
                "Could not open checkout page. Visit it manually: {url}\n{e}"
            ))),
        }
    }

    /// Handles the return navigation from the external checkout.
    ///
    /// The pending marker is cleared *before* acting, so a second invocation
    /// with the same parameters is a no-op: unlock and answer-key kickoff
    /// happen exactly once per round trip.
    pub fn handle_checkout_return(&self, ret: &CheckoutReturn) -> CallbackAction {
        let pending = self.storage.get(KEY_PENDING_UNLOCK);
        match pending {
            Some(ref id) if *id == ret.job_id => {}
            _ => return CallbackAction::AlreadyHandled,
        }

        if let Err(e) = self.storage.remove(KEY_PENDING_UNLOCK) {
            // The marker survives; a retry of the callback will clear it.
            log::error!("Failed to clear pending payment marker: {}", e);
        }

        if ret.success {
            info!("Payment for job {} confirmed via checkout return", ret.job_id);
            self.mark_unlocked(&ret.job_id);
            CallbackAction::StartAnswerGeneration(ret.job_id.clone())
        } else {
            info!("Checkout for job {} was cancelled", ret.job_id);
            CallbackAction::Dismissed
        }
    }

    /// Triggers answer-key generation and polls it to a terminal state.
    pub async fn generate_answer_key(
        &self,
        client: &ApiClient,
        options: &PollOptions,
        remote_id: &str,
    ) -> Result<()> {
        client
            .send_unit(
                client.post(&format!("/generate_answer/{remote_id}")),
                "generate_answer",
            )
            .await?;
        poll_answer_status(client, options, remote_id).await?;
        Ok(())
    }
}
