//! Single-flight access token refresh
//!
//! The first caller that finds the access token stale becomes the leader and
//! issues the refresh call. Everyone arriving while it is in flight is queued
//! and receives the leader's outcome, in arrival order.

use async_trait::async_trait;
use atelier_shared::{token, AtelierError, CredentialField, CredentialStore, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, error, info};

/// Tokens returned by the refresh endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Why a refresh cycle did not produce a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    NoRefreshToken,
    Rejected(String),
    /// The leading request was dropped before the refresh completed
    Cancelled,
}

/// Result of one refresh cycle, shared by every waiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Success(String),
    Failure(RefreshFailure),
}

impl RefreshOutcome {
    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Success(token) => Ok(token),
            Self::Failure(failure) => Err(failure.into()),
        }
    }
}

impl From<RefreshFailure> for AtelierError {
    fn from(failure: RefreshFailure) -> Self {
        match failure {
            RefreshFailure::NoRefreshToken => AtelierError::NoRefreshToken,
            RefreshFailure::Rejected(reason) => AtelierError::RefreshFailed(reason),
            RefreshFailure::Cancelled => {
                AtelierError::Auth("token refresh was cancelled".to_string())
            }
        }
    }
}

/// Network side of a refresh: exchanges a refresh token for new tokens
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens>;
}

/// `POST {base}/auth/refresh` with `{ "refreshToken": ... }`
pub struct HttpTokenRefresher {
    client: Client,
    refresh_url: String,
}

impl HttpTokenRefresher {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            refresh_url: format!("{}/auth/refresh", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens> {
        let response = self
            .client
            .post(&self.refresh_url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AtelierError::api(status.as_u16(), None));
        }

        Ok(response.json().await?)
    }
}

enum State {
    Idle,
    Refreshing(VecDeque<oneshot::Sender<RefreshOutcome>>),
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<RefreshOutcome>),
    /// A cycle finished between the caller's staleness check and taking the lock
    Fresh(String),
}

/// Serializes refresh attempts into one in-flight call
pub struct RefreshCoordinator {
    state: Mutex<State>,
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    /// Refresh calls issued so far
    started: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(store: Arc<dyn CredentialStore>, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            state: Mutex::new(State::Idle),
            store,
            refresher,
            started: AtomicU64::new(0),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock_state(), State::Refreshing(_))
    }

    /// Number of refresh network calls issued by this coordinator
    pub fn refreshes_started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    /// Obtain a fresh access token, joining an in-flight refresh if there is one.
    ///
    /// On failure the credential store has already been cleared.
    pub async fn refresh(&self) -> Result<String> {
        match self.join_or_lead() {
            Role::Waiter(receiver) => {
                debug!("Refresh already in flight, waiting for its outcome");
                receiver
                    .await
                    .unwrap_or(RefreshOutcome::Failure(RefreshFailure::Cancelled))
                    .into_result()
            }
            Role::Fresh(token) => {
                debug!("Access token was renewed by an earlier refresh");
                Ok(token)
            }
            Role::Leader => {
                let mut guard = LeaderGuard {
                    coordinator: self,
                    finished: false,
                };
                let outcome = self.perform().await;
                guard.finish(outcome.clone());
                outcome.into_result()
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs without suspending, so the state flip is atomic with respect to other callers
    fn join_or_lead(&self) -> Role {
        let mut state = self.lock_state();
        if let State::Refreshing(waiters) = &mut *state {
            let (sender, receiver) = oneshot::channel();
            waiters.push_back(sender);
            return Role::Waiter(receiver);
        }
        if let Some(current) = self
            .store
            .get(CredentialField::AccessToken)
            .filter(|current| !token::is_expired(Some(current)))
        {
            return Role::Fresh(current);
        }
        *state = State::Refreshing(VecDeque::new());
        Role::Leader
    }

    async fn perform(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.store.get(CredentialField::RefreshToken) else {
            return self.fail(RefreshFailure::NoRefreshToken);
        };

        self.started.fetch_add(1, Ordering::Relaxed);
        info!("Refreshing access token");

        match self.refresher.refresh(&refresh_token).await {
            Ok(RefreshedTokens {
                access_token: Some(access_token),
                refresh_token,
            }) if !access_token.is_empty() => {
                self.store.set(CredentialField::AccessToken, &access_token);
                if let Some(refresh_token) = refresh_token {
                    self.store.set(CredentialField::RefreshToken, &refresh_token);
                }
                info!("Access token refreshed");
                RefreshOutcome::Success(access_token)
            }
            Ok(_) => self.fail(RefreshFailure::Rejected(
                "response did not include an access token".to_string(),
            )),
            Err(e) => self.fail(RefreshFailure::Rejected(e.to_string())),
        }
    }

    fn fail(&self, failure: RefreshFailure) -> RefreshOutcome {
        error!("Token refresh failed: {:?}", failure);
        self.store.clear_all();
        RefreshOutcome::Failure(failure)
    }

    /// Back to idle, handing `outcome` to every queued waiter in FIFO order
    fn drain(&self, outcome: &RefreshOutcome) {
        let waiters = match std::mem::replace(&mut *self.lock_state(), State::Idle) {
            State::Refreshing(waiters) => waiters,
            State::Idle => VecDeque::new(),
        };
        debug!("Releasing {} queued request(s)", waiters.len());
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Makes sure waiters are released even if the leading future is dropped
struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    finished: bool,
}

impl LeaderGuard<'_> {
    fn finish(&mut self, outcome: RefreshOutcome) {
        self.finished = true;
        self.coordinator.drain(&outcome);
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.coordinator
                .drain(&RefreshOutcome::Failure(RefreshFailure::Cancelled));
        }
    }
}
