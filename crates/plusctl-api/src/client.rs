// The authenticated-session façade.
//
// One `SwitchClient` owns one device address, its detected model, and the
// current credential. All model-aware wire details are delegated to
// [`ModelFamily`]; all HTML interpretation beyond auth/token extraction is
// the consumer's concern -- authenticated requests return raw body text.

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::auth::{self, GAMBIT_PARAM, ModelFamily};
use crate::error::Error;
use crate::model::{Model, detect_model};
use crate::token::{Credential, MemoryTokenStore, TokenStore};
use crate::transport::{Form, Transport, TransportConfig};

/// Resolved login material for one switch: where it lives, how to log in.
///
/// Consumed once to seed a login attempt, never kept as client state. The
/// model hint is advisory only -- the client always detects the model from
/// the device itself.
#[derive(Debug, Clone)]
pub struct SwitchConfig {
    pub host: String,
    pub password: SecretString,
    pub model_hint: Option<Model>,
}

/// External password source, probed by address.
///
/// The core never reads environment variables or config files itself;
/// implementations live with the application (see the `plusctl-config`
/// crate).
pub trait PasswordResolver: Send + Sync + fmt::Debug {
    fn resolve(&self, address: &str) -> Option<SwitchConfig>;
}

/// Client for one switch admin console.
///
/// Safe to share across tasks: the credential sits behind a lock and is
/// only ever replaced as a whole. Concurrent logins from *separate*
/// clients against the same device race at the device itself -- the last
/// successful login wins there, outside this crate's control.
#[derive(Debug)]
pub struct SwitchClient {
    address: String,
    model: Model,
    transport: Transport,
    token: RwLock<Option<String>>,
    token_store: Arc<dyn TokenStore>,
    resolver: Option<Arc<dyn PasswordResolver>>,
}

/// Builder for [`SwitchClient`]. Construction is async because it probes
/// the device (and possibly logs in) before handing the client over.
pub struct SwitchClientBuilder {
    address: String,
    transport: TransportConfig,
    token_store: Option<Arc<dyn TokenStore>>,
    resolver: Option<Arc<dyn PasswordResolver>>,
}

impl SwitchClientBuilder {
    /// Per-request timeout (default 10s). Bounds each HTTP call, not the
    /// whole login sequence.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = timeout;
        self
    }

    /// Use a custom credential store. Defaults to an in-memory store
    /// scoped to this client.
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Attach a password source for automatic login at construction and
    /// for `login` calls with an empty password.
    pub fn password_resolver(mut self, resolver: Arc<dyn PasswordResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Connect to the device. In order:
    ///
    /// 1. A stored credential for this address is trusted as-is, without
    ///    a device round-trip. Expiry surfaces reactively on first use.
    /// 2. Otherwise, if the resolver knows a password, the model is
    ///    detected and a full login runs automatically.
    /// 3. Otherwise the model is detected and the client is returned
    ///    unauthenticated; call [`SwitchClient::login`] explicitly.
    ///
    /// Failure modes stay distinct: an unreachable device is a transport
    /// error, an unrecognized device a model error, and a failed
    /// auto-login an authentication error.
    pub async fn connect(self) -> Result<SwitchClient, Error> {
        let token_store = self
            .token_store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));
        let transport = Transport::new(&self.address, &self.transport)?;

        match token_store.get(&self.address) {
            Ok(credential) => {
                debug!(
                    "using stored credential for {} (model {})",
                    self.address, credential.model
                );
                return Ok(SwitchClient {
                    address: self.address,
                    model: credential.model,
                    transport,
                    token: RwLock::new(Some(credential.token)),
                    token_store,
                    resolver: self.resolver,
                });
            }
            Err(err) if err.is_token_not_found() => {}
            // Stale or unreadable entries are not fatal; a fresh login
            // will overwrite them.
            Err(err) => debug!("ignoring stored credential for {}: {err}", self.address),
        }

        let config = self
            .resolver
            .as_ref()
            .and_then(|resolver| resolver.resolve(&self.address));

        let model = detect(&transport).await?;
        debug!("detected model {model} for {}", self.address);

        let client = SwitchClient {
            address: self.address,
            model,
            transport,
            token: RwLock::new(None),
            token_store,
            resolver: self.resolver,
        };

        if let Some(config) = config {
            debug!("auto-authenticating {}", client.address);
            client.login(&config.password).await?;
        }

        Ok(client)
    }
}

impl SwitchClient {
    /// Start building a client for the switch at `address` (bare host/IP
    /// or full `http://` URL).
    pub fn builder(address: impl Into<String>) -> SwitchClientBuilder {
        SwitchClientBuilder {
            address: address.into(),
            transport: TransportConfig::default(),
            token_store: None,
            resolver: None,
        }
    }

    /// The device address this client was built for.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The detected device model.
    pub fn model(&self) -> Model {
        self.model
    }

    /// Whether a credential is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .expect("credential lock poisoned")
            .is_some()
    }

    /// Authenticate with the switch.
    ///
    /// An empty password falls back to the attached resolver before
    /// failing. On success the credential is held in memory and persisted
    /// best-effort -- a store failure is logged, not fatal, since the
    /// in-memory session remains usable.
    pub async fn login(&self, password: &SecretString) -> Result<(), Error> {
        let resolved;
        let password = if password.expose_secret().is_empty() {
            match &self.resolver {
                Some(resolver) => match resolver.resolve(&self.address) {
                    Some(config) => {
                        debug!("using resolved password for {}", self.address);
                        resolved = config.password;
                        &resolved
                    }
                    None => {
                        return Err(Error::auth(
                            "no password provided and none found by the resolver",
                        ));
                    }
                },
                None => return Err(Error::auth("password cannot be empty")),
            }
        } else {
            password
        };

        let token = auth::login(&self.transport, self.model.family(), password).await?;

        *self.token.write().expect("credential lock poisoned") = Some(token.clone());

        let credential = Credential::new(token, self.model);
        if let Err(err) = self.token_store.store(&self.address, &credential) {
            warn!("failed to persist credential for {}: {err}", self.address);
        }

        Ok(())
    }

    /// Authenticate using only the attached resolver.
    pub async fn login_auto(&self) -> Result<(), Error> {
        self.login(&SecretString::from(String::new())).await
    }

    /// Drop the session: clears the in-memory credential and deletes the
    /// persisted entry. The device offers no logout endpoint, so no
    /// network call is made; the device-side session ages out on its own.
    pub fn logout(&self) {
        *self.token.write().expect("credential lock poisoned") = None;
        if let Err(err) = self.token_store.delete(&self.address) {
            warn!("failed to delete stored credential for {}: {err}", self.address);
        }
    }

    /// Send an authenticated request and return the raw response body.
    ///
    /// Fails with [`Error::NotAuthenticated`] before any network I/O when
    /// no credential is held. The credential rides along per family: a
    /// `Cookie: SID=...` header on 30x devices, a `Gambit` parameter on
    /// 316 devices. For GET, form data is serialized into the query
    /// string.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        form: Option<Form>,
    ) -> Result<String, Error> {
        let token = self
            .token
            .read()
            .expect("credential lock poisoned")
            .clone()
            .ok_or(Error::NotAuthenticated)?;

        let mut form = form.unwrap_or_default();
        let mut cookie = None;
        match self.model.family() {
            ModelFamily::Session => cookie = Some(format!("SID={token}")),
            ModelFamily::Gambit => form.push((GAMBIT_PARAM.to_owned(), token)),
        }
        let headers: Vec<(&str, &str)> = cookie
            .as_deref()
            .map(|value| ("Cookie", value))
            .into_iter()
            .collect();

        if method == Method::GET {
            let path = if form.is_empty() {
                path.to_owned()
            } else {
                let query = serde_urlencoded::to_string(&form)
                    .map_err(|err| Error::operation(format!("bad query data: {err}")))?;
                format!("{path}?{query}")
            };
            let resp = self.transport.get(&path, &headers).await?;
            self.transport.read_body(resp).await
        } else if method == Method::POST {
            let resp = self.transport.post_form(path, &form, &headers).await?;
            self.transport.read_body(resp).await
        } else {
            Err(Error::operation(format!(
                "unsupported request method {method}"
            )))
        }
    }

    /// Authenticated GET returning the raw body.
    pub async fn get(&self, path: &str) -> Result<String, Error> {
        self.request(Method::GET, path, None).await
    }

    /// Authenticated POST with form data, returning the raw body.
    pub async fn post(&self, path: &str, form: Form) -> Result<String, Error> {
        self.request(Method::POST, path, Some(form)).await
    }

    /// Fetch a content page, translating the login-redirect stub the
    /// device serves after session expiry into [`Error::SessionExpired`].
    pub(crate) async fn get_page(&self, path: &str) -> Result<String, Error> {
        let body = self.get(path).await?;
        if auth::is_login_redirect(&body) {
            return Err(Error::SessionExpired);
        }
        Ok(body)
    }
}

/// Probe the device for its model.
///
/// The root page is tried first. When it only reveals the generic 30x
/// redirect stub, the login page is probed once for a more specific
/// answer; failures of that second probe keep the placeholder result.
async fn detect(transport: &Transport) -> Result<Model, Error> {
    let resp = transport.get("/", &[]).await?;
    let body = transport.read_body(resp).await?;
    let mut model = detect_model(&body).ok_or(Error::ModelNotDetected)?;

    if model.is_placeholder() {
        if let Ok(resp) = transport.get("/login.cgi", &[]).await {
            if let Ok(body) = transport.read_body(resp).await {
                if let Some(specific) = detect_model(&body) {
                    if !specific.is_placeholder() {
                        model = specific;
                    }
                }
            }
        }
    }

    Ok(model)
}
