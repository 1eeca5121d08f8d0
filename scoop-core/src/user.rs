//! Account profiles kept alongside reviews.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::GeoPoint;
use crate::store::{DocumentPath, DocumentStore, DocumentStoreError};

/// Top-level collection holding one profile document per account.
pub const USERS_COLLECTION: &str = "users";

/// Profile stored for an account.
///
/// Coordinates are kept as decimal strings, the form the sign-up flow
/// collects them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Sign-in address.
    pub email: String,
    /// Password, only present while an account is being created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Human-readable neighbourhood.
    #[serde(default)]
    pub location: Option<String>,
    /// Display name.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Longitude of the neighbourhood.
    #[serde(default)]
    pub longitude: Option<String>,
    /// Latitude of the neighbourhood.
    #[serde(default)]
    pub latitude: Option<String>,
}

impl UserInfo {
    /// Parse the stored neighbourhood coordinate, if both axes are present
    /// and valid.
    #[must_use]
    pub fn coordinate(&self) -> Option<GeoPoint> {
        let latitude = self.latitude.as_deref()?.trim().parse().ok()?;
        let longitude = self.longitude.as_deref()?.trim().parse().ok()?;
        GeoPoint::new(latitude, longitude).ok()
    }
}

/// Errors returned by [`UserInfoRepository`].
#[derive(Debug, Error)]
pub enum UserInfoError {
    /// The identifier cannot name a document.
    #[error("invalid user id '{0}'")]
    InvalidUserId(String),
    /// No profile exists for the identifier.
    #[error("no profile stored for user '{0}'")]
    NotFound(String),
    /// The stored profile could not be decoded.
    #[error("profile for user '{user_id}' is unreadable: {source}")]
    Decode {
        /// Account identifier.
        user_id: String,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The profile could not be serialised.
    #[error("failed to encode profile: {0}")]
    Encode(#[source] serde_json::Error),
    /// The document store failed.
    #[error(transparent)]
    Store(#[from] DocumentStoreError),
}

/// Reads and writes whole profiles at `users/<id>`.
#[derive(Debug)]
pub struct UserInfoRepository<D> {
    documents: D,
}

impl<D: DocumentStore> UserInfoRepository<D> {
    /// Wrap a document store.
    pub const fn new(documents: D) -> Self {
        Self { documents }
    }

    /// Fetch the profile of `user_id`.
    pub async fn user_info(&self, user_id: &str) -> Result<UserInfo, UserInfoError> {
        let path = profile_path(user_id)?;
        let document = self
            .documents
            .get_document(&path)
            .await?
            .ok_or_else(|| UserInfoError::NotFound(user_id.to_owned()))?;
        serde_json::from_value(document.data).map_err(|source| UserInfoError::Decode {
            user_id: user_id.to_owned(),
            source,
        })
    }

    /// Store `info` as the profile of `user_id`, replacing any existing one.
    pub async fn save_user_info(
        &self,
        user_id: &str,
        info: &UserInfo,
    ) -> Result<(), UserInfoError> {
        let path = profile_path(user_id)?;
        let data = serde_json::to_value(info).map_err(UserInfoError::Encode)?;
        self.documents.set_document(&path, data).await?;
        log::info!("event=profile_saved user={user_id}");
        Ok(())
    }
}

fn profile_path(user_id: &str) -> Result<DocumentPath, UserInfoError> {
    if user_id.trim().is_empty() || user_id.contains('/') {
        return Err(UserInfoError::InvalidUserId(user_id.to_owned()));
    }
    Ok(DocumentPath::from_segments([USERS_COLLECTION, user_id]))
}
