//! Cookie-backed credential storage: the session token, the presence flag,
//! and the compact user record.
//!
//! The store keeps an in-memory mirror of the three cookies and always
//! commits them together, so the mirror never disagrees with itself. The
//! commit is atomic only with respect to the mirror, not the transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::api::types::AuthUser;

/// Byte budget for the serialized user cookie.
pub const USER_COOKIE_MAX_BYTES: usize = 3800;

/// Optional user fields, in the order they are dropped when the serialized
/// cookie runs over budget.
const DROP_ORDER: &[&str] = &["photo", "roles", "last_name", "first_name", "enabled"];

#[derive(Debug, Clone)]
pub struct CookieNames {
    pub token: String,
    pub presence: String,
    pub csrf: String,
    pub user: String,
}

impl Default for CookieNames {
    fn default() -> Self {
        Self {
            token: "folio_session".to_string(),
            presence: "folio_has_session".to_string(),
            csrf: "folio_csrf".to_string(),
            user: "folio_user".to_string(),
        }
    }
}

/// Minimal name→value cookie surface. Real deployments back this with the
/// document cookie string or a server request context; tests use the
/// in-memory implementation.
pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
    fn remove(&self, name: &str);
}

#[derive(Default)]
pub struct MemoryJar {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieJar for MemoryJar {
    fn get(&self, name: &str) -> Option<String> {
        self.inner.lock().expect("lock jar").get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        self.inner
            .lock()
            .expect("lock jar")
            .insert(name.to_string(), value.to_string());
    }

    fn remove(&self, name: &str) {
        self.inner.lock().expect("lock jar").remove(name);
    }
}

/// Reads a cookie value out of a raw `Cookie:` header.
pub fn extract_cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();
        if key == name {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Parses a `Set-Cookie` header into (name, value, cleared).
pub fn parse_set_cookie(header: &str) -> Option<(String, String, bool)> {
    let mut parts = header.split(';').map(str::trim);
    let pair = parts.next()?;
    let mut kv = pair.splitn(2, '=');
    let name = kv.next()?.trim().to_string();
    let value = kv.next().unwrap_or("").trim().to_string();

    let cleared = value.is_empty()
        || parts.any(|attr| {
            attr.to_ascii_lowercase()
                .strip_prefix("max-age=")
                .map(|age| age.trim() == "0")
                .unwrap_or(false)
        });
    Some((name, value, cleared))
}

/// Serializes the user record within the cookie byte budget, dropping
/// optional fields in fixed priority order. If it still does not fit, only
/// the mandatory id/username/email triple is kept.
pub fn trim_auth_user_cookie(user: &AuthUser) -> String {
    let mut candidate = user.clone();
    let serialize = |u: &AuthUser| serde_json::to_string(u).unwrap_or_default();

    let mut rendered = serialize(&candidate);
    for field in DROP_ORDER {
        if rendered.len() <= USER_COOKIE_MAX_BYTES {
            return rendered;
        }
        match *field {
            "photo" => candidate.photo = None,
            "roles" => candidate.roles = None,
            "last_name" => candidate.last_name = None,
            "first_name" => candidate.first_name = None,
            "enabled" => candidate.enabled = None,
            _ => unreachable!(),
        }
        rendered = serialize(&candidate);
    }
    if rendered.len() <= USER_COOKIE_MAX_BYTES {
        return rendered;
    }

    serialize(&AuthUser {
        id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: None,
        last_name: None,
        photo: None,
        roles: None,
        enabled: None,
    })
}

#[derive(Debug, Clone, Default)]
struct Mirror {
    token: Option<String>,
    has_presence: bool,
    user: Option<AuthUser>,
}

pub struct CredentialStore {
    jar: Arc<dyn CookieJar>,
    names: CookieNames,
    mirror: Mutex<Mirror>,
}

impl CredentialStore {
    pub fn new(jar: Arc<dyn CookieJar>, names: CookieNames) -> Self {
        Self {
            jar,
            names,
            mirror: Mutex::new(Mirror::default()),
        }
    }

    pub fn names(&self) -> &CookieNames {
        &self.names
    }

    pub fn jar(&self) -> &Arc<dyn CookieJar> {
        &self.jar
    }

    /// Reads all three cookies once and rebuilds the mirror. The presence
    /// flag is derived as `presence cookie == "1" OR token non-empty`, and a
    /// user cookie that fails to parse is logged and treated as absent.
    pub fn hydrate(&self) {
        let token = self
            .jar
            .get(&self.names.token)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let presence_cookie = self.jar.get(&self.names.presence);
        let has_presence = presence_cookie.as_deref() == Some("1") || token.is_some();

        let user = self.jar.get(&self.names.user).and_then(|raw| {
            match serde_json::from_str::<AuthUser>(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    tracing::warn!(error = %err, "Discarding unparseable user cookie");
                    None
                }
            }
        });

        let mut mirror = self.mirror.lock().expect("lock mirror");
        *mirror = Mirror {
            token,
            has_presence,
            user,
        };
    }

    pub fn token(&self) -> Option<String> {
        self.mirror.lock().expect("lock mirror").token.clone()
    }

    pub fn has_presence(&self) -> bool {
        self.mirror.lock().expect("lock mirror").has_presence
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.mirror.lock().expect("lock mirror").user.clone()
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.jar
            .get(&self.names.csrf)
            .filter(|t| !t.is_empty())
    }

    /// Stores a sanitized token. Unless `preserve_presence` is set, the
    /// presence flag is recomputed from the new token's truthiness.
    pub fn set_token(&self, value: Option<&str>, preserve_presence: bool) {
        let token = value
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        {
            let mut mirror = self.mirror.lock().expect("lock mirror");
            if !preserve_presence {
                mirror.has_presence = token.is_some();
            }
            mirror.token = token;
        }
        self.commit();
    }

    pub fn set_token_presence(&self, present: bool) {
        self.mirror.lock().expect("lock mirror").has_presence = present;
        self.commit();
    }

    pub fn set_user(&self, user: Option<AuthUser>) {
        self.mirror.lock().expect("lock mirror").user = user;
        self.commit();
    }

    pub fn clear(&self) {
        *self.mirror.lock().expect("lock mirror") = Mirror::default();
        self.commit();
        self.jar.remove(&self.names.csrf);
    }

    /// Re-reads credentials from a raw `Cookie:`-style header, bypassing the
    /// jar. Recovers the case where the server set cookies in the same round
    /// trip and any cached snapshot is stale.
    pub fn sync_from_raw(&self, header: &str) {
        for name in [
            &self.names.token,
            &self.names.presence,
            &self.names.csrf,
            &self.names.user,
        ] {
            match extract_cookie_value(header, name) {
                Some(value) => self.jar.set(name, &value),
                None => self.jar.remove(name),
            }
        }
        self.hydrate();
    }

    /// Applies a server `Set-Cookie` header to the jar.
    pub fn apply_set_cookie(&self, header: &str) {
        if let Some((name, value, cleared)) = parse_set_cookie(header) {
            if cleared {
                self.jar.remove(&name);
            } else {
                self.jar.set(&name, &value);
            }
        }
    }

    /// Writes the mirror back as the cookie trio, all together.
    fn commit(&self) {
        let mirror = self.mirror.lock().expect("lock mirror").clone();

        match &mirror.token {
            Some(token) => self.jar.set(&self.names.token, token),
            None => self.jar.remove(&self.names.token),
        }
        if mirror.has_presence {
            self.jar.set(&self.names.presence, "1");
        } else {
            self.jar.remove(&self.names.presence);
        }
        match &mirror.user {
            Some(user) => self
                .jar
                .set(&self.names.user, &trim_auth_user_cookie(user)),
            None => self.jar.remove(&self.names.user),
        }
    }
}
