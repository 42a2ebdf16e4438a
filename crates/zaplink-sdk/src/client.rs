/*
[INPUT]:  Validated configuration, storage and signing capabilities
[OUTPUT]: Authenticated API operations and lifecycle events
[POS]:    Client layer - orchestrates login, payments, and session state
[UPDATE]: When endpoints, auth flow, or lifecycle semantics change
*/

use std::fmt;
use std::sync::RwLock;

use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::crypto::{generate_nonce, SigningProvider};
use crate::events::{EventBus, EventData, Subscription, ZaplinkEvent};
use crate::http::{ClientConfig, HttpClient, RequestSigner, Result, ZaplinkError};
use crate::session::{NoopStorage, SessionStore, StorageAdapter};
use crate::types::{
    AuthResponse, LoginRequest, PaymentRequest, PaymentResponse, PiUser, TransactionFilters,
    TransactionHistoryResponse, UserDetailsRequest, UserDetailsResponse, ValidateCallbackRequest,
    ZaplinkConfig,
};

/// Scopes requested when initiating login
const LOGIN_SCOPES: &str = "username,payments,wallet_address";

/// Memo attached to payments when the caller provides none
const DEFAULT_PAYMENT_MEMO: &str = "Payment via Zaplink SDK";

/// Main Zaplink SDK client
///
/// Owns one configuration, one persisted session slot, and one event
/// registry. Methods take `&self`; the cached user and token live behind
/// locks so the client can be shared behind an `Arc`. Calls are not
/// reentrant-safe against each other: a `logout` racing an in-flight
/// `get_user_details` completion can resurrect stale cached state. Intended
/// usage is one call at a time per instance.
pub struct Zaplink {
    config: ZaplinkConfig,
    http: HttpClient,
    signer: RequestSigner,
    session: SessionStore,
    events: EventBus,
    current_user: RwLock<Option<PiUser>>,
    auth_token: RwLock<Option<String>>,
}

impl Zaplink {
    /// Create a client with the default (no-op) storage adapter
    ///
    /// Without an injected adapter, sessions survive only for the life of
    /// the process.
    pub fn new(config: ZaplinkConfig) -> Result<Self> {
        Self::with_storage(config, Box::new(NoopStorage))
    }

    /// Create a client with an injected storage adapter
    pub fn with_storage(config: ZaplinkConfig, storage: Box<dyn StorageAdapter>) -> Result<Self> {
        let signer = RequestSigner::new(config.api_key.clone(), config.secret_key.clone());
        Self::build(config, storage, signer)
    }

    /// Create a client with injected storage and signing capabilities
    pub fn with_capabilities(
        config: ZaplinkConfig,
        storage: Box<dyn StorageAdapter>,
        provider: Box<dyn SigningProvider>,
    ) -> Result<Self> {
        let signer = RequestSigner::with_provider(
            config.api_key.clone(),
            config.secret_key.clone(),
            provider,
        );
        Self::build(config, storage, signer)
    }

    fn build(
        config: ZaplinkConfig,
        storage: Box<dyn StorageAdapter>,
        signer: RequestSigner,
    ) -> Result<Self> {
        config.validate()?;

        let http = HttpClient::new(&config.base_url, ClientConfig::default())?;
        let session = SessionStore::new(
            &config.api_key,
            &config.secret_key,
            storage,
            config.session_timeout,
        );

        let client = Self {
            http,
            signer,
            session,
            events: EventBus::new(),
            current_user: RwLock::new(None),
            auth_token: RwLock::new(None),
            config,
        };

        // Resume a prior session when one is still valid.
        if let Some((user, token)) = client.session.load() {
            *client.current_user.write().unwrap() = Some(user);
            *client.auth_token.write().unwrap() = Some(token);
        }

        if client.config.debug {
            info!(
                base_url = %client.config.base_url,
                environment = ?client.config.environment,
                authenticated = client.is_authenticated(),
                "Zaplink SDK initialized"
            );
        }

        Ok(client)
    }

    /// Initiate the login handshake
    ///
    /// POST /api/auth/pi-login, authenticated by the API-key header. On
    /// success the response carries an `auth_url`; the caller transfers
    /// control there (this call does not itself complete authentication).
    pub async fn login(&self) -> Result<AuthResponse> {
        debug!("initiating pi network login");

        let body = LoginRequest {
            application_id: self.config.app_id.clone(),
            scopes: LOGIN_SCOPES.to_string(),
            callback_url: self.config.callback_url.clone(),
        };

        let result: Result<AuthResponse> = async {
            let builder = self
                .http
                .request(Method::POST, "/api/auth/pi-login")?
                .header("X-API-Key", &self.config.api_key)
                .header(ACCEPT, "application/json")
                .json(&body);
            self.http.send_json(builder).await
        }
        .await;

        match result {
            Ok(data) if data.success && data.auth_url.is_some() => {
                debug!(auth_url = data.auth_url.as_deref(), "auth URL received");
                Ok(data)
            }
            Ok(data) => {
                let message = data
                    .failure_reason()
                    .unwrap_or_else(|| "failed to get auth URL".to_string());
                self.emit(ZaplinkEvent::AuthError, &EventData::Error(message.clone()));
                Err(ZaplinkError::Remote { message })
            }
            Err(err) => {
                self.emit(ZaplinkEvent::AuthError, &EventData::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Validate the callback leg of the handshake
    ///
    /// Signs "{api_key}|{callback_token}|{timestamp}" and POSTs it to
    /// /api/secure/auth/validate-callback. A well-formed rejection returns
    /// `Ok(false)` after emitting `auth:error`; transport and parse failures
    /// emit the same event and propagate as errors.
    pub async fn handle_auth_callback(&self, callback_token: &str) -> Result<bool> {
        debug!("processing auth callback");

        let timestamp = Utc::now().timestamp();
        let signature = self.signer.callback_signature(callback_token, timestamp).await?;

        let body = ValidateCallbackRequest {
            api_key: self.config.api_key.clone(),
            callback_token: callback_token.to_string(),
            signature,
            timestamp,
        };

        let result: Result<AuthResponse> = async {
            let builder = self
                .http
                .request(Method::POST, "/api/secure/auth/validate-callback")?
                .header(ACCEPT, "application/json")
                .json(&body);
            self.http.send_json(builder).await
        }
        .await;

        match result {
            Ok(mut data) => {
                if data.success {
                    if let (Some(user), Some(token)) = (data.user.take(), data.app_token.take()) {
                        self.enter_authenticated(user.clone(), token);
                        self.emit(ZaplinkEvent::AuthSuccess, &EventData::User(user));
                        return Ok(true);
                    }
                }
                let message = data
                    .failure_reason()
                    .unwrap_or_else(|| "callback validation rejected".to_string());
                self.emit(ZaplinkEvent::AuthError, &EventData::Error(message));
                Ok(false)
            }
            Err(err @ ZaplinkError::Api { .. }) => {
                self.emit(ZaplinkEvent::AuthError, &EventData::Error(err.to_string()));
                Ok(false)
            }
            Err(err) => {
                self.emit(ZaplinkEvent::AuthError, &EventData::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Clear the cached and persisted session; idempotent
    pub fn logout(&self) {
        *self.current_user.write().unwrap() = None;
        *self.auth_token.write().unwrap() = None;
        self.session.clear();
        debug!("user logged out");
        self.emit(ZaplinkEvent::AuthLogout, &EventData::None);
    }

    /// Current cached user, if authenticated
    pub fn get_user(&self) -> Option<PiUser> {
        self.current_user.read().unwrap().clone()
    }

    /// Current application token, if authenticated
    pub fn get_token(&self) -> Option<String> {
        self.auth_token.read().unwrap().clone()
    }

    /// Whether a user and token are both cached
    pub fn is_authenticated(&self) -> bool {
        self.get_user().is_some() && self.get_token().is_some()
    }

    /// Refresh the cached user from the API
    ///
    /// Signed POST /api/app/user-details. The response is shallow-merged
    /// over the cached user and the session is re-persisted.
    pub async fn get_user_details(&self) -> Result<PiUser> {
        let token = self.require_token()?;
        debug!("fetching user details");

        let body = UserDetailsRequest {
            token: token.clone(),
            application_id: self.config.app_id.clone(),
        };

        let mut data: UserDetailsResponse =
            self.signed_post("/api/app/user-details", &body).await?;

        if data.success {
            if let Some(update) = data.user.take() {
                let merged = {
                    let mut guard = self.current_user.write().unwrap();
                    match guard.as_mut() {
                        Some(user) => {
                            user.merge(update);
                            user.clone()
                        }
                        None => {
                            *guard = Some(update.clone());
                            update
                        }
                    }
                };

                if let Err(err) = self.session.save(&merged, &token) {
                    warn!("failed to re-persist session: {err}");
                }
                self.emit(ZaplinkEvent::UserUpdated, &EventData::User(merged.clone()));
                return Ok(merged);
            }
        }

        let message = data
            .failure_reason()
            .unwrap_or_else(|| "user details unavailable".to_string());
        Err(ZaplinkError::Remote { message })
    }

    /// Create a payment
    ///
    /// Signed POST /api/app/make-payment. Rejects non-positive amounts
    /// before any network call.
    pub async fn make_payment(
        &self,
        amount: Decimal,
        memo: Option<&str>,
    ) -> Result<PaymentResponse> {
        let token = self.require_token()?;

        if amount <= Decimal::ZERO {
            return Err(ZaplinkError::Validation(
                "payment amount must be positive".to_string(),
            ));
        }

        debug!(%amount, memo, "creating payment");

        let body = PaymentRequest {
            token,
            application_id: self.config.app_id.clone(),
            amount,
            memo: memo.unwrap_or(DEFAULT_PAYMENT_MEMO).to_string(),
        };

        let result: Result<PaymentResponse> =
            self.signed_post("/api/app/make-payment", &body).await;

        match result {
            Ok(data) if data.success && data.payment_url.is_some() => {
                self.emit(ZaplinkEvent::PaymentCreated, &EventData::Payment(data.clone()));
                Ok(data)
            }
            Ok(data) => {
                let message = data
                    .failure_reason()
                    .unwrap_or_else(|| "payment creation failed".to_string());
                self.emit(ZaplinkEvent::PaymentFailed, &EventData::Error(message.clone()));
                Err(ZaplinkError::Remote { message })
            }
            Err(err) => {
                self.emit(ZaplinkEvent::PaymentFailed, &EventData::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// List the user's transactions
    ///
    /// Bearer-token GET /api/user/transactions with optional status/page
    /// filters. This endpoint uses the application token rather than the
    /// HMAC header scheme.
    pub async fn get_transactions(
        &self,
        filters: Option<TransactionFilters>,
    ) -> Result<TransactionHistoryResponse> {
        let token = self.require_token()?;
        debug!("fetching transactions");

        let params = filters.unwrap_or_default().to_query();
        let endpoint = if params.is_empty() {
            "/api/user/transactions".to_string()
        } else {
            format!("/api/user/transactions?{}", params.join("&"))
        };

        let builder = self
            .http
            .request(Method::GET, &endpoint)?
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json");
        self.http.send_json(builder).await
    }

    /// Register a callback for one event kind
    pub fn on(
        &self,
        event: ZaplinkEvent,
        callback: impl Fn(&EventData) + Send + Sync + 'static,
    ) -> Subscription {
        self.events.on(event, callback)
    }

    /// The session store backing this client
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &ZaplinkConfig {
        &self.config
    }

    fn require_token(&self) -> Result<String> {
        self.get_token().ok_or(ZaplinkError::NotAuthenticated)
    }

    fn enter_authenticated(&self, user: PiUser, token: String) {
        *self.current_user.write().unwrap() = Some(user.clone());
        *self.auth_token.write().unwrap() = Some(token.clone());
        if let Err(err) = self.session.save(&user, &token) {
            warn!("failed to persist session: {err}");
        }
    }

    fn emit(&self, event: ZaplinkEvent, data: &EventData) {
        debug!(%event, "emitting event");
        self.events.emit(event, data);
    }

    /// POST with the HMAC header scheme: a fresh timestamp and nonce are
    /// signed together with the exact serialized body.
    async fn signed_post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let body_string = serde_json::to_string(body)?;
        let timestamp = Utc::now().timestamp();
        let nonce = generate_nonce();

        let headers = self
            .signer
            .signed_headers(endpoint, &body_string, timestamp, &nonce)
            .await?;

        let builder = self
            .http
            .request(Method::POST, endpoint)?
            .headers(headers)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body_string);
        self.http.send_json(builder).await
    }
}

impl fmt::Debug for Zaplink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zaplink")
            .field("base_url", &self.config.base_url)
            .field("environment", &self.config.environment)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
