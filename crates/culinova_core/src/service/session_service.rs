//! Signed-in session state and identity reconciliation.
//!
//! # Responsibility
//! - Map an identity reported by the host auth provider onto a local user.
//! - Hold the current user and notify subscribers when it changes.
//! - Self-heal recipe ownership for the signed-in account.
//!
//! # Invariants
//! - Each auth notification resolves to at most one local user record.
//! - A legacy record (no external id) is backfilled rather than duplicated.
//! - Subscribers are notified only when the current user id changes.

use crate::auth::AuthIdentity;
use crate::model::user::{AuthCredential, User};
use crate::repo::recipe_repo::{OwnerFilter, RecipeListQuery, RecipeRepository, RecipeSummary};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug)]
pub enum SessionError {
    /// Provider reported an identity without a usable subject.
    InvalidIdentity(String),
    NotSignedIn,
    Repo(RepoError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentity(value) => write!(f, "invalid sign-in identity: `{value}`"),
            Self::NotSignedIn => write!(f, "no user is signed in"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Event delivered to session subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn(User),
    SignedOut,
}

pub type SubscriptionId = u64;

/// Subscriber callback. Runs synchronously on the notifying thread.
pub type SessionListener = Arc<dyn Fn(&SessionChange) + Send + Sync>;

/// Process-wide session holder.
#[derive(Default)]
pub struct SessionService {
    current: Option<User>,
    listeners: BTreeMap<SubscriptionId, SessionListener>,
    next_subscription: SubscriptionId,
}

impl SessionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn subscribe(
        &mut self,
        listener: impl Fn(&SessionChange) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.next_subscription += 1;
        let id = self.next_subscription;
        self.listeners.insert(id, Arc::new(listener));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Applies one auth state notification.
    ///
    /// `None` means the provider reports no signed-in user.
    pub fn handle_auth_state<U: UserRepository>(
        &mut self,
        users: &U,
        identity: Option<&AuthIdentity>,
    ) -> Result<Option<User>, SessionError> {
        let Some(identity) = identity else {
            self.set_current(None);
            return Ok(None);
        };

        let user = reconcile_identity(users, identity)?;
        self.set_current(Some(user.clone()));
        Ok(Some(user))
    }

    pub fn sign_out(&mut self) {
        self.set_current(None);
    }

    /// Attaches stray recipes to the current user and lists their collection.
    ///
    /// Unowned recipes and recipes owned by legacy records are adopted. The
    /// `owner` field of `query` is overridden with the current user.
    pub fn reload_collection<R: RecipeRepository>(
        &self,
        recipes: &R,
        query: RecipeListQuery,
    ) -> Result<Vec<RecipeSummary>, SessionError> {
        let owner = self.current.as_ref().ok_or(SessionError::NotSignedIn)?.id;

        let adopted = recipes.adopt_unowned(owner)?;
        let reassigned = recipes.reassign_legacy_owned(owner)?;
        if adopted > 0 || reassigned > 0 {
            log::info!(
                "event=ownership_heal module=session status=ok adopted={} reassigned={}",
                adopted,
                reassigned
            );
        }

        let query = RecipeListQuery {
            owner: OwnerFilter::Owner(owner),
            ..query
        };
        Ok(recipes.list_recipes(&query)?)
    }

    fn set_current(&mut self, next: Option<User>) {
        let previous_id = self.current.as_ref().map(|user| user.id);
        let next_id = next.as_ref().map(|user| user.id);
        self.current = next;
        if previous_id == next_id {
            return;
        }

        let change = match self.current.as_ref() {
            Some(user) => SessionChange::SignedIn(user.clone()),
            None => SessionChange::SignedOut,
        };
        log::info!(
            "event=session_change module=session status=ok signed_in={} subscribers={}",
            next_id.is_some(),
            self.listeners.len()
        );
        for listener in self.listeners.values() {
            listener(&change);
        }
    }
}

/// Finds or creates the local record for `identity` and records the
/// provider credential on it.
fn reconcile_identity<U: UserRepository>(
    users: &U,
    identity: &AuthIdentity,
) -> Result<User, SessionError> {
    let external_id = identity.external_id.trim();
    if external_id.is_empty() {
        return Err(SessionError::InvalidIdentity(identity.external_id.clone()));
    }
    let display_name = identity
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let user = match users.find_by_external_id(external_id)? {
        Some(existing) => existing,
        None => match users.find_by_username(external_id)? {
            Some(legacy) if legacy.is_legacy() => {
                users.set_external_id(legacy.id, external_id)?;
                log::info!("event=user_backfill module=session status=ok");
                User {
                    external_id: Some(external_id.to_string()),
                    ..legacy
                }
            }
            Some(_) => create_user(
                users,
                deduplicated_username(external_id),
                external_id,
                display_name,
            )?,
            None => create_user(
                users,
                external_id.to_lowercase(),
                external_id,
                display_name,
            )?,
        },
    };

    let missing_name = user.display_name.is_none();
    let user = match display_name {
        Some(name) if missing_name => {
            users.update_profile(user.id, Some(name), user.avatar_url.as_deref())?;
            User {
                display_name: Some(name.to_string()),
                ..user
            }
        }
        _ => user,
    };

    if !users.has_credential(user.id, identity.provider, Some(external_id))? {
        let mut credential = AuthCredential::new(user.id, identity.provider);
        credential.external_id = Some(external_id.to_string());
        users.add_credential(&credential)?;
    }

    Ok(user)
}

fn create_user<U: UserRepository>(
    users: &U,
    username: String,
    external_id: &str,
    display_name: Option<&str>,
) -> Result<User, SessionError> {
    let mut user = User::for_external_identity(external_id, display_name.map(str::to_string));
    user.username = username;
    users.create_user(&user)?;
    log::info!("event=user_create module=session status=ok");
    Ok(user)
}

/// Username for a subject whose lowercased form is already taken by
/// another signed-in account (subjects are case-sensitive).
fn deduplicated_username(external_id: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", external_id.to_lowercase(), &suffix[..8])
}
