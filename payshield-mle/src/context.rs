//! Integration contexts: the closed set of counterparty endpoint families.

use crate::error::ShieldError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Identifies one external endpoint family.
///
/// Each context carries its own key id and credential files. The set is
/// closed: adding a context means adding a variant here, and every table
/// keyed by context has to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextId {
    /// Push and pull funds-transfer APIs.
    FundsTransfer,
    /// Card authorization APIs.
    Authorization,
}

impl ContextId {
    pub const ALL: [ContextId; 2] = [ContextId::FundsTransfer, ContextId::Authorization];

    pub fn as_str(self) -> &'static str {
        match self {
            ContextId::FundsTransfer => "funds-transfer",
            ContextId::Authorization => "authorization",
        }
    }

    /// Upper-case token used in environment variable names.
    pub fn env_token(self) -> &'static str {
        match self {
            ContextId::FundsTransfer => "FUNDS_TRANSFER",
            ContextId::Authorization => "AUTHORIZATION",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ContextId::FundsTransfer => 0,
            ContextId::Authorization => 1,
        }
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextId {
    type Err = ShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContextId::ALL
            .into_iter()
            .find(|ctx| ctx.as_str() == s)
            .ok_or_else(|| ShieldError::UnknownContext(s.to_string()))
    }
}

/// Resolved configuration for one context.
///
/// Built once by the registry and never mutated. `configured` is true iff
/// the key id is not blank and all three credential files existed when the
/// registry was constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationContext {
    pub(crate) id: ContextId,
    pub(crate) key_id: String,
    pub(crate) private_key_path: Option<PathBuf>,
    pub(crate) client_cert_path: Option<PathBuf>,
    pub(crate) peer_cert_path: Option<PathBuf>,
    pub(crate) configured: bool,
}

impl IntegrationContext {
    pub(crate) fn resolve(
        id: ContextId,
        key_id: String,
        private_key_path: Option<PathBuf>,
        client_cert_path: Option<PathBuf>,
        peer_cert_path: Option<PathBuf>,
    ) -> Self {
        let configured = !key_id.trim().is_empty()
            && is_file(private_key_path.as_deref())
            && is_file(client_cert_path.as_deref())
            && is_file(peer_cert_path.as_deref());

        Self {
            id,
            key_id,
            private_key_path,
            client_cert_path,
            peer_cert_path,
            configured,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Key identifier assigned by the counterparty.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn private_key_path(&self) -> Option<&Path> {
        self.private_key_path.as_deref()
    }

    pub fn client_cert_path(&self) -> Option<&Path> {
        self.client_cert_path.as_deref()
    }

    pub fn peer_cert_path(&self) -> Option<&Path> {
        self.peer_cert_path.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }
}

pub(crate) fn is_file(path: Option<&Path>) -> bool {
    path.is_some_and(Path::is_file)
}
