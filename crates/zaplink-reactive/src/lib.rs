/*
[INPUT]:  A Zaplink client and lifecycle events it emits
[OUTPUT]: Observable auth state and redirect-aware operation wrappers
[POS]:    Reactive layer - state binding over the core SDK
[UPDATE]: When state fields or the redirect contract change
*/

use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;
use url::Url;
use zaplink_sdk::{
    AuthResponse, EventData, PaymentResponse, PiUser, Result, Subscription, Zaplink, ZaplinkEvent,
};

/// Query parameter carrying the one-time callback token on redirect
const REDIRECT_TOKEN_PARAM: &str = "callback_token";

/// Query parameter carrying the provider's verdict on redirect
const REDIRECT_STATUS_PARAM: &str = "status";

/// Snapshot of the authentication state
///
/// `is_loading` is true while a wrapped operation is in flight.
/// `last_error` holds the most recent auth failure message and is cleared
/// on the next successful authentication.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZaplinkState {
    pub user: Option<PiUser>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

/// Reactive wrapper around a [`Zaplink`] client
///
/// Mirrors the client's lifecycle events into a watchable state channel.
/// Operation wrappers delegate to the client and maintain the loading
/// flag around the call; observers see the intermediate loading state
/// because event delivery is synchronous.
pub struct ZaplinkHandle {
    client: Arc<Zaplink>,
    state: Arc<watch::Sender<ZaplinkState>>,
    _subscriptions: Vec<Subscription>,
}

impl ZaplinkHandle {
    /// Wrap a client and begin mirroring its lifecycle events
    pub fn new(client: Zaplink) -> Self {
        let client = Arc::new(client);
        let initial = ZaplinkState {
            user: client.get_user(),
            is_authenticated: client.is_authenticated(),
            is_loading: false,
            last_error: None,
        };
        let state = Arc::new(watch::channel(initial).0);

        let subscriptions = vec![
            {
                let state = Arc::clone(&state);
                client.on(ZaplinkEvent::AuthSuccess, move |data| {
                    state.send_modify(|s| {
                        if let EventData::User(user) = data {
                            s.user = Some(user.clone());
                        }
                        s.is_authenticated = true;
                        s.last_error = None;
                    });
                })
            },
            {
                let state = Arc::clone(&state);
                client.on(ZaplinkEvent::AuthError, move |data| {
                    state.send_modify(|s| {
                        if let EventData::Error(message) = data {
                            s.last_error = Some(message.clone());
                        }
                    });
                })
            },
            {
                let state = Arc::clone(&state);
                client.on(ZaplinkEvent::AuthLogout, move |_| {
                    state.send_modify(|s| {
                        s.user = None;
                        s.is_authenticated = false;
                    });
                })
            },
            {
                let state = Arc::clone(&state);
                client.on(ZaplinkEvent::UserUpdated, move |data| {
                    if let EventData::User(user) = data {
                        let user = user.clone();
                        state.send_modify(|s| s.user = Some(user));
                    }
                })
            },
        ];

        Self {
            client,
            state,
            _subscriptions: subscriptions,
        }
    }

    /// Receiver that observes every state transition
    pub fn watch(&self) -> watch::Receiver<ZaplinkState> {
        self.state.subscribe()
    }

    /// Current state snapshot
    pub fn state(&self) -> ZaplinkState {
        self.state.borrow().clone()
    }

    /// The wrapped client, for operations this layer does not wrap
    pub fn client(&self) -> &Zaplink {
        &self.client
    }

    /// Initiate login; loading is flagged for the duration of the call
    pub async fn login(&self) -> Result<AuthResponse> {
        self.with_loading(self.client.login()).await
    }

    /// Clear the session; observers see the logged-out state immediately
    pub fn logout(&self) {
        self.client.logout();
    }

    /// Refresh the cached user and mirror the update into the state
    pub async fn refresh_user(&self) -> Result<PiUser> {
        self.with_loading(self.client.get_user_details()).await
    }

    /// Create a payment; loading is flagged for the duration of the call
    pub async fn make_payment(
        &self,
        amount: Decimal,
        memo: Option<&str>,
    ) -> Result<PaymentResponse> {
        self.with_loading(self.client.make_payment(amount, memo)).await
    }

    /// Complete authentication from a redirect-back URL
    ///
    /// Looks for `callback_token` and `status=success` in the query string.
    /// When both are present the token is validated; on acceptance the
    /// return value is the URL with those two parameters stripped, ready
    /// to be restored in an address bar. `Ok(None)` means the URL carried
    /// no accepted callback (absent markers or a rejected token).
    pub async fn handle_redirect(&self, url: &str) -> Result<Option<String>> {
        let parsed = Url::parse(url)?;

        let mut callback_token = None;
        let mut status = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                REDIRECT_TOKEN_PARAM => callback_token = Some(value.into_owned()),
                REDIRECT_STATUS_PARAM => status = Some(value.into_owned()),
                _ => {}
            }
        }

        let Some(token) = callback_token else {
            return Ok(None);
        };
        if status.as_deref() != Some("success") {
            return Ok(None);
        }

        let validated = self
            .with_loading(self.client.handle_auth_callback(&token))
            .await?;
        if validated {
            Ok(Some(strip_redirect_params(&parsed)))
        } else {
            Ok(None)
        }
    }

    async fn with_loading<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        self.state.send_modify(|s| s.is_loading = true);
        let result = operation.await;
        self.state.send_modify(|s| s.is_loading = false);
        result
    }
}

fn strip_redirect_params(url: &Url) -> String {
    let mut cleaned = url.clone();
    let remaining: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != REDIRECT_TOKEN_PARAM && key != REDIRECT_STATUS_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if remaining.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned
            .query_pairs_mut()
            .clear()
            .extend_pairs(remaining)
            .finish();
    }
    cleaned.to_string()
}
