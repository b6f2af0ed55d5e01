//! Materialized audit profiles and the per-client plan.

use std::sync::Arc;

use badcert_ca::CertNKey;
use badcert_core::{CipherClass, ProfileSpec, TlsProto};

use crate::error::Result;
use crate::tls;

/// Which server behavior a profile drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Plain certificate probing: default protocol versions and suites.
    Certificate,
    /// Protocol sweep: the server only offers one version and one
    /// bulk-cipher family.
    ProtocolProbe {
        proto: TlsProto,
        cipher: CipherClass,
    },
}

/// One fully-materialized server-side test configuration.
///
/// The rustls context is assembled at plan-build time so that no
/// certificate or key work happens while a client is mid-handshake.
pub struct Profile {
    /// What this profile means to a human.
    pub spec: ProfileSpec,
    /// The material served to the client.
    pub certnkey: Arc<CertNKey>,
    /// How the handler drives the handshake.
    pub handler: HandlerKind,

    tls_config: Arc<rustls::ServerConfig>,
}

impl Profile {
    pub fn new(spec: ProfileSpec, certnkey: Arc<CertNKey>, handler: HandlerKind) -> Result<Self> {
        let tls_config = tls::server_config(&certnkey, handler)?;
        Ok(Self {
            spec,
            certnkey,
            handler,
            tls_config,
        })
    }

    /// The precomputed server-side TLS context.
    pub(crate) fn tls_config(&self) -> Arc<rustls::ServerConfig> {
        self.tls_config.clone()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.spec.fmt(f)
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("spec", &self.spec)
            .field("certnkey", &self.certnkey)
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

/// The ordered list of profiles every client is tested against.
///
/// Read-only after build; shared freely between the dispatcher and its
/// workers.
#[derive(Debug)]
pub struct Plan {
    profiles: Vec<Arc<Profile>>,
}

impl Plan {
    pub fn new(profiles: Vec<Arc<Profile>>) -> Self {
        Self { profiles }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Profile>> {
        self.profiles.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Profile>> {
        self.profiles.iter()
    }

    /// The specs in plan order; what expectations compare against.
    pub fn specs(&self) -> Vec<ProfileSpec> {
        self.profiles.iter().map(|p| p.spec.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Arc<Profile>;
    type IntoIter = std::slice::Iter<'a, Arc<Profile>>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}
