// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provider-config decoding
//!
//! Provider configs travel as opaque JSON payloads that carry `apiVersion`
//! and `kind`. A [`ConfigScheme`] is built once at process start, knows which
//! kinds exist and which versions it can read, and is then shared read-only
//! by every reconciliation.
//!
//! # Decoding
//!
//! ```text
//! bytes → JSON object → (apiVersion, kind) check → upcast → typed config
//!                                                   ↓
//!                                     v1alpha0 → v1alpha1 (chain)
//! ```
//!
//! Payloads written without type metadata are read as the served version of
//! the requested kind.
//!
//! # Example
//!
//! ```rust
//! use metal_provider_core::apis::InfrastructureConfig;
//! use metal_provider_core::scheme::ConfigScheme;
//!
//! let scheme = ConfigScheme::standard();
//! let raw = br#"{"partitionID": "partition", "projectID": "project1"}"#;
//! let config: InfrastructureConfig = scheme.decode(Some(raw)).unwrap();
//! assert_eq!(config.project_id, "project1");
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::apis::{
    served_api_version, CloudProfileConfig, ControlPlaneConfig, InfrastructureConfig,
    MachineImages, GROUP_NAME, SERVED_VERSION,
};
use crate::cluster::{Cluster, ControlPlane};

/// Where a payload came from; used for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigScope {
    CloudProfile,
    Infrastructure,
    ControlPlane,
    MachineImages,
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigScope::CloudProfile => "cloud profile",
            ConfigScope::Infrastructure => "infrastructure",
            ConfigScope::ControlPlane => "control plane",
            ConfigScope::MachineImages => "machine image mapping",
        };
        write!(f, "{}", name)
    }
}

/// Decoding failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("provider config is not set on the {scope} resource")]
    Missing { scope: ConfigScope },

    #[error("could not decode provider config of {scope}: {reason}")]
    Malformed { scope: ConfigScope, reason: String },

    #[error("provider config of {scope} has kind {found:?}, expected {expected:?}")]
    KindMismatch {
        scope: ConfigScope,
        expected: String,
        found: String,
    },

    #[error("provider config of {scope} carries unsupported apiVersion {api_version:?}")]
    UnsupportedVersion { scope: ConfigScope, api_version: String },

    #[error("kind {kind:?} is not registered in the config scheme")]
    UnregisteredKind { kind: String },

    #[error("upcasting {kind} from {from} to {to} failed: {reason}")]
    Upcast {
        kind: String,
        from: String,
        to: String,
        reason: String,
    },

    #[error("could not encode {kind}: {reason}")]
    Encode { kind: String, reason: String },
}

/// A typed provider-config kind known to the scheme
pub trait ProviderKind: Serialize + DeserializeOwned {
    /// Value of the `kind` field
    const KIND: &'static str;

    /// Resource scope the kind is embedded in
    const SCOPE: ConfigScope;
}

impl ProviderKind for CloudProfileConfig {
    const KIND: &'static str = "CloudProfileConfig";
    const SCOPE: ConfigScope = ConfigScope::CloudProfile;
}

impl ProviderKind for InfrastructureConfig {
    const KIND: &'static str = "InfrastructureConfig";
    const SCOPE: ConfigScope = ConfigScope::Infrastructure;
}

impl ProviderKind for ControlPlaneConfig {
    const KIND: &'static str = "ControlPlaneConfig";
    const SCOPE: ConfigScope = ConfigScope::ControlPlane;
}

impl ProviderKind for MachineImages {
    const KIND: &'static str = "MachineImages";
    const SCOPE: ConfigScope = ConfigScope::MachineImages;
}

/// Migrates the JSON form of one kind from an older version to a newer one.
///
/// Upcasters see the payload with `apiVersion`/`kind` already removed.
pub trait ConfigUpcaster: Send + Sync {
    fn kind(&self) -> &'static str;

    /// Version this upcaster expects as input
    fn from_version(&self) -> &str;

    /// Version this upcaster produces
    fn to_version(&self) -> &str;

    fn upcast(&self, value: Value) -> Result<Value, String>;
}

/// Immutable registry of provider-config kinds and their version migrations
pub struct ConfigScheme {
    kinds: BTreeSet<&'static str>,
    upcasters: BTreeMap<&'static str, Vec<Box<dyn ConfigUpcaster>>>,
}

impl fmt::Debug for ConfigScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigScheme")
            .field("kinds", &self.kinds)
            .field(
                "upcasters",
                &self
                    .upcasters
                    .iter()
                    .map(|(kind, chain)| (*kind, chain.len()))
                    .collect::<BTreeMap<_, _>>(),
            )
            .finish()
    }
}

/// Builder for [`ConfigScheme`]
#[derive(Default)]
pub struct ConfigSchemeBuilder {
    kinds: BTreeSet<&'static str>,
    upcasters: BTreeMap<&'static str, Vec<Box<dyn ConfigUpcaster>>>,
}

impl ConfigSchemeBuilder {
    pub fn register<T: ProviderKind>(mut self) -> Self {
        self.kinds.insert(T::KIND);
        self
    }

    /// Add a migration step. Steps of one kind are applied in insertion order.
    pub fn with_upcaster<U: ConfigUpcaster + 'static>(mut self, upcaster: U) -> Self {
        self.upcasters
            .entry(upcaster.kind())
            .or_default()
            .push(Box::new(upcaster));
        self
    }

    pub fn build(self) -> ConfigScheme {
        ConfigScheme {
            kinds: self.kinds,
            upcasters: self.upcasters,
        }
    }
}

impl ConfigScheme {
    pub fn builder() -> ConfigSchemeBuilder {
        ConfigSchemeBuilder::default()
    }

    /// Scheme with all four provider-config kinds registered
    pub fn standard() -> Self {
        Self::builder()
            .register::<CloudProfileConfig>()
            .register::<InfrastructureConfig>()
            .register::<ControlPlaneConfig>()
            .register::<MachineImages>()
            .build()
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.kinds.contains(kind)
    }

    /// Decode a raw payload into `T`.
    ///
    /// Absent or empty bytes are a [`DecodeError::Missing`].
    pub fn decode<T: ProviderKind>(&self, raw: Option<&[u8]>) -> Result<T, DecodeError> {
        if !self.is_registered(T::KIND) {
            return Err(DecodeError::UnregisteredKind {
                kind: T::KIND.to_string(),
            });
        }

        let raw = match raw {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(DecodeError::Missing { scope: T::SCOPE }),
        };

        let value: Value = serde_json::from_slice(raw).map_err(|e| DecodeError::Malformed {
            scope: T::SCOPE,
            reason: e.to_string(),
        })?;

        let Value::Object(mut object) = value else {
            return Err(DecodeError::Malformed {
                scope: T::SCOPE,
                reason: "payload is not a JSON object".to_string(),
            });
        };

        let api_version = take_string(&mut object, "apiVersion", T::SCOPE)?;
        let kind = take_string(&mut object, "kind", T::SCOPE)?;

        if let Some(kind) = kind {
            if kind != T::KIND {
                return Err(DecodeError::KindMismatch {
                    scope: T::SCOPE,
                    expected: T::KIND.to_string(),
                    found: kind,
                });
            }
        }

        let version = match api_version {
            None => SERVED_VERSION.to_string(),
            Some(api_version) => {
                let version = api_version
                    .split_once('/')
                    .filter(|(group, _)| *group == GROUP_NAME)
                    .map(|(_, version)| version.to_string());
                match version {
                    Some(version) => version,
                    None => {
                        return Err(DecodeError::UnsupportedVersion {
                            scope: T::SCOPE,
                            api_version,
                        })
                    }
                }
            }
        };

        let value = self.upcast(T::KIND, T::SCOPE, Value::Object(object), &version)?;

        debug!("Decoded {} provider config ({})", T::SCOPE, T::KIND);

        serde_json::from_value(value).map_err(|e| DecodeError::Malformed {
            scope: T::SCOPE,
            reason: e.to_string(),
        })
    }

    /// Decode a payload that may legitimately be absent
    pub fn decode_optional<T: ProviderKind>(
        &self,
        raw: Option<&[u8]>,
    ) -> Result<Option<T>, DecodeError> {
        match raw {
            Some(bytes) if !bytes.is_empty() => self.decode(Some(bytes)).map(Some),
            _ => Ok(None),
        }
    }

    /// Encode `config` with the served `apiVersion` and its `kind` stamped on
    pub fn encode<T: ProviderKind>(&self, config: &T) -> Result<Vec<u8>, DecodeError> {
        if !self.is_registered(T::KIND) {
            return Err(DecodeError::UnregisteredKind {
                kind: T::KIND.to_string(),
            });
        }

        let encode_error = |reason: String| DecodeError::Encode {
            kind: T::KIND.to_string(),
            reason,
        };

        let value = serde_json::to_value(config).map_err(|e| encode_error(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(encode_error("config does not serialize to an object".to_string()));
        };
        object.insert("apiVersion".to_string(), Value::String(served_api_version()));
        object.insert("kind".to_string(), Value::String(T::KIND.to_string()));

        serde_json::to_vec(&Value::Object(object)).map_err(|e| encode_error(e.to_string()))
    }

    /// Walk the upcaster chain of `kind` from `version` to the served version
    fn upcast(
        &self,
        kind: &'static str,
        scope: ConfigScope,
        mut value: Value,
        version: &str,
    ) -> Result<Value, DecodeError> {
        let mut current = version.to_string();

        if let Some(chain) = self.upcasters.get(kind) {
            for upcaster in chain {
                if current == SERVED_VERSION {
                    break;
                }
                if upcaster.from_version() == current {
                    value = upcaster.upcast(value).map_err(|reason| DecodeError::Upcast {
                        kind: kind.to_string(),
                        from: current.clone(),
                        to: upcaster.to_version().to_string(),
                        reason,
                    })?;
                    current = upcaster.to_version().to_string();
                }
            }
        }

        if current != SERVED_VERSION {
            return Err(DecodeError::UnsupportedVersion {
                scope,
                api_version: format!("{}/{}", GROUP_NAME, version),
            });
        }

        Ok(value)
    }
}

/// Cloud-profile config of the cluster, `None` when the profile carries none
pub fn cloud_profile_config_from_cluster(
    scheme: &ConfigScheme,
    cluster: &Cluster,
) -> Result<Option<CloudProfileConfig>, DecodeError> {
    let raw = cluster
        .cloud_profile
        .as_ref()
        .and_then(|profile| profile.provider_config.as_deref());
    scheme.decode_optional(raw)
}

/// Infrastructure config of the cluster; it must be present
pub fn infrastructure_config_from_cluster(
    scheme: &ConfigScheme,
    cluster: &Cluster,
) -> Result<InfrastructureConfig, DecodeError> {
    scheme.decode(cluster.shoot.infrastructure_config.as_deref())
}

/// Control-plane config, defaulting to an empty config when absent
pub fn control_plane_config_from_control_plane(
    scheme: &ConfigScheme,
    control_plane: &ControlPlane,
) -> Result<ControlPlaneConfig, DecodeError> {
    Ok(scheme
        .decode_optional(control_plane.provider_config.as_deref())?
        .unwrap_or_default())
}

/// Machine image mapping shipped as a provider-config payload
pub fn machine_images_from_payload(
    scheme: &ConfigScheme,
    raw: Option<&[u8]>,
) -> Result<MachineImages, DecodeError> {
    scheme.decode(raw)
}

fn take_string(
    object: &mut serde_json::Map<String, Value>,
    field: &str,
    scope: ConfigScope,
) -> Result<Option<String>, DecodeError> {
    match object.remove(field) {
        None => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(DecodeError::Malformed {
            scope,
            reason: format!("{} must be a string, got {}", field, other),
        }),
    }
}
