//! Device location tracking.
//!
//! [`LocationService`] drives a platform [`LocationProvider`] through the
//! authorization flow and reports outcomes as [`LocationEvent`]s on a Tokio
//! channel. Platform callbacks (authorization changes, location batches,
//! failures) are forwarded to the service by the embedding application.
//!
//! A service reports a single fix per `start`: once a batch of locations
//! arrives the most recent one is emitted and updates are stopped.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::GeoPoint;

/// Cache key under which the last-known user location is kept.
pub const USER_LOCATION_CACHE_KEY: &str = "userLocation";

/// Permission state reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet.
    NotDetermined,
    /// Access is blocked by policy and cannot be granted by the user.
    Restricted,
    /// The user refused access.
    Denied,
    /// Access granted in the background too.
    AuthorizedAlways,
    /// Access granted while the app is in use.
    AuthorizedWhenInUse,
}

impl AuthorizationStatus {
    /// Whether location updates may be started.
    #[must_use]
    pub const fn is_authorized(self) -> bool {
        matches!(self, Self::AuthorizedAlways | Self::AuthorizedWhenInUse)
    }
}

/// Platform location source.
///
/// Implementations wrap the operating system's location manager. Results
/// come back asynchronously through [`LocationService::locations_updated`]
/// and [`LocationService::authorization_changed`].
pub trait LocationProvider: Send + Sync {
    /// Whether device-wide location services are switched on.
    fn services_enabled(&self) -> bool;

    /// Current permission state for this application.
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Ask the user for while-in-use access.
    fn request_authorization(&self);

    /// Begin delivering location updates.
    fn start_updating(&self);

    /// Stop delivering location updates.
    fn stop_updating(&self);
}

/// Failures reported through [`LocationEvent::ServiceError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The user or a policy refused access.
    #[error("location access is {status:?}")]
    AccessDenied {
        /// Status that blocked access.
        status: AuthorizationStatus,
    },
    /// The platform could not determine a location.
    #[error("location update failed: {message}")]
    Provider {
        /// Platform error description.
        message: String,
    },
}

/// Outcome delivered to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// A fresh fix is available.
    Updated(GeoPoint),
    /// Location use is not allowed; the user should be sent to settings.
    Disallowed,
    /// Locating failed.
    ServiceError(LocationError),
}

/// Last-known user location persisted between launches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedUserLocation {
    /// Human-readable neighbourhood label.
    pub address: String,
    /// Position of the neighbourhood.
    pub location: GeoPoint,
}

/// Drives a [`LocationProvider`] and publishes [`LocationEvent`]s.
///
/// # Examples
/// ```
/// use scoop_core::test_support::ScriptedLocationProvider;
/// use scoop_core::{AuthorizationStatus, GeoPoint, LocationEvent, LocationService};
///
/// # fn main() -> Result<(), scoop_core::GeoPointError> {
/// let provider = ScriptedLocationProvider::with_status(AuthorizationStatus::AuthorizedWhenInUse);
/// let (service, mut events) = LocationService::new(provider);
/// service.start();
/// let here = GeoPoint::new(37.5665, 126.978)?;
/// service.locations_updated(&[here]);
/// assert_eq!(events.try_recv().ok(), Some(LocationEvent::Updated(here)));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LocationService<P> {
    provider: P,
    events: mpsc::UnboundedSender<LocationEvent>,
}

impl<P: LocationProvider> LocationService<P> {
    /// Create a service and the receiving end of its event channel.
    pub fn new(provider: P) -> (Self, mpsc::UnboundedReceiver<LocationEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (Self { provider, events }, receiver)
    }

    /// Borrow the wrapped provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Begin the authorization flow and, once allowed, location updates.
    pub fn start(&self) {
        self.check_authorization();
    }

    /// Stop location updates.
    pub fn stop(&self) {
        self.provider.stop_updating();
    }

    /// Handle a platform notification that permissions changed.
    pub fn authorization_changed(&self) {
        self.check_authorization();
    }

    /// Handle a batch of fixes, oldest first.
    ///
    /// The newest fix is published and updates stop. An empty batch only
    /// stops updates.
    pub fn locations_updated(&self, locations: &[GeoPoint]) {
        if let Some(latest) = locations.last() {
            self.emit(LocationEvent::Updated(*latest));
        }
        self.provider.stop_updating();
    }

    /// Handle a platform failure to determine the location.
    pub fn location_failed(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("event=location_failed error={message}");
        self.emit(LocationEvent::ServiceError(LocationError::Provider {
            message,
        }));
    }

    /// Render a coordinate as `"longitude,latitude"`.
    #[must_use]
    pub fn coordinate_to_string(coordinate: GeoPoint) -> String {
        coordinate.to_lon_lat_string()
    }

    fn check_authorization(&self) {
        if !self.provider.services_enabled() {
            self.emit(LocationEvent::Disallowed);
            return;
        }
        match self.provider.authorization_status() {
            AuthorizationStatus::NotDetermined => self.provider.request_authorization(),
            status @ (AuthorizationStatus::Restricted | AuthorizationStatus::Denied) => {
                self.emit(LocationEvent::Disallowed);
                self.emit(LocationEvent::ServiceError(LocationError::AccessDenied {
                    status,
                }));
            }
            AuthorizationStatus::AuthorizedAlways | AuthorizationStatus::AuthorizedWhenInUse => {
                self.provider.start_updating();
            }
        }
    }

    fn emit(&self, event: LocationEvent) {
        if self.events.send(event).is_err() {
            debug!("event=location_event_dropped reason=receiver_closed");
        }
    }
}
