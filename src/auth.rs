//! Credentials and sessions.
//!
//! Passwords are stored as bcrypt hashes. A successful login or registration
//! issues a session: a server-side record keyed by a random id, handed to the
//! client as an HS256-signed JWT. Both maps sit behind `RwLock`s so request
//! handlers can share one store.
//!
//! Every registration stamps the account with a fresh generation number and
//! sessions remember the generation they were issued under. A session only
//! counts while its generation is still the account's current one, so a
//! password change invalidates sessions however the requests interleave.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bcrypt::{hash, verify};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use parking_lot::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CredentialError;
use crate::models::SessionClaims;

/// bcrypt only looks at this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

pub fn hash_password(password: &str, cost: u32) -> Result<String, CredentialError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(CredentialError::PasswordTooLong {
            max: MAX_PASSWORD_BYTES,
        });
    }
    Ok(hash(password, cost)?)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    // Nothing longer was ever hashed; bcrypt would otherwise match on the prefix.
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    verify(password, hash)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

struct Credential {
    hash: String,
    generation: u64,
}

#[derive(Default)]
struct Accounts {
    by_name: HashMap<String, Credential>,
    last_generation: u64,
}

/// Username to password hash.
pub struct CredentialStore {
    accounts: RwLock<Accounts>,
    cost: u32,
}

impl CredentialStore {
    pub fn new(cost: u32) -> Self {
        Self {
            accounts: RwLock::new(Accounts::default()),
            cost,
        }
    }

    /// A store holding a single account.
    pub fn with_seed(username: &str, password: &str, cost: u32) -> Result<Self, CredentialError> {
        let store = Self::new(cost);
        store.register(username, password)?;
        Ok(store)
    }

    /// Insert or overwrite `username`. No uniqueness or strength checks.
    /// Returns the generation of the new credential.
    pub fn register(&self, username: &str, password: &str) -> Result<u64, CredentialError> {
        let hashed = hash_password(password, self.cost)?;

        let mut accounts = self.accounts.write();
        accounts.last_generation += 1;
        let generation = accounts.last_generation;
        accounts.by_name.insert(
            username.to_owned(),
            Credential {
                hash: hashed,
                generation,
            },
        );
        Ok(generation)
    }

    /// True iff `username` exists and `password` matches its hash.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        self.verify(username, password).is_some()
    }

    /// Like `authenticate`, but yields the generation of the credential
    /// that matched so a session can be tied to it.
    pub fn verify(&self, username: &str, password: &str) -> Option<u64> {
        // Copy the credential out so verification runs without holding the lock.
        let (hashed, generation) = {
            let accounts = self.accounts.read();
            let credential = accounts.by_name.get(username)?;
            (credential.hash.clone(), credential.generation)
        };
        let matched = verify_password(password, &hashed).unwrap_or_else(|e| {
            warn!(username, "stored hash rejected by bcrypt: {e}");
            false
        });
        matched.then_some(generation)
    }

    /// Whether `generation` is still the live credential for `username`.
    pub fn is_current(&self, username: &str, generation: u64) -> bool {
        self.accounts
            .read()
            .by_name
            .get(username)
            .is_some_and(|c| c.generation == generation)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.accounts.read().by_name.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.accounts.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().by_name.is_empty()
    }
}

struct Session {
    username: String,
    generation: u64,
    expires_at: u64,
}

/// Who a live session belongs to, and under which credential it was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOwner {
    pub username: String,
    pub generation: u64,
}

/// Server-side sessions plus the key used to sign their tokens.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for `username` under credential `generation` and
    /// return its signed token.
    pub fn issue(&self, username: &str, generation: u64) -> Result<String, jsonwebtoken::errors::Error> {
        let sid = Uuid::new_v4().to_string();
        let now = now_secs();
        let expires_at = now + self.ttl.as_secs();

        let claims = SessionClaims {
            sub: username.to_owned(),
            sid: sid.clone(),
            generation,
            exp: expires_at as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;

        let mut sessions = self.sessions.write();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            sid,
            Session {
                username: claims.sub,
                generation,
                expires_at,
            },
        );
        Ok(token)
    }

    /// The owner of `token`, if the signature checks out and the session is
    /// still live. Callers still have to confirm the generation is current.
    pub fn resolve(&self, token: &str) -> Option<SessionOwner> {
        let claims = match decode::<SessionClaims>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        ) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("session token rejected: {e}");
                return None;
            }
        };

        let sessions = self.sessions.read();
        let session = sessions.get(&claims.sid)?;
        if session.username != claims.sub
            || session.generation != claims.generation
            || session.expires_at <= now_secs()
        {
            return None;
        }
        Some(SessionOwner {
            username: session.username.clone(),
            generation: session.generation,
        })
    }

    /// Drop every session belonging to `username`; returns how many.
    pub fn revoke_user(&self, username: &str) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.username != username);
        before - sessions.len()
    }
}
