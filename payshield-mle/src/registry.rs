//! Per-context credential configuration.
//!
//! The registry is the only component that reads credential paths. It is
//! built once from [`ShieldConfig`] and is immutable afterwards, so it can be
//! shared across threads behind an `Arc` without locking.

use crate::config::ShieldConfig;
use crate::context::{ContextId, IntegrationContext, is_file};
use crate::error::{ShieldError, ShieldResult};
use payshield_crypto::{LocalPrivateKey, PeerPublicKey};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Read-only table of integration contexts.
#[derive(Debug, Clone)]
pub struct ConfigurationRegistry {
    contexts: [IntegrationContext; 2],
}

impl ConfigurationRegistry {
    /// Resolves every context in `config`, checking which credential files
    /// exist right now.
    pub fn new(config: &ShieldConfig) -> Self {
        let contexts = ContextId::ALL.map(|id| {
            let cfg = config.context(id);
            let ctx = IntegrationContext::resolve(
                id,
                cfg.key_id.clone(),
                cfg.private_key_path.clone(),
                cfg.client_cert_path.clone(),
                cfg.peer_cert_path.clone(),
            );
            if ctx.is_configured() {
                info!(context = %id, key_id = %ctx.key_id(), "integration context configured");
            } else {
                warn!(context = %id, "integration context is not configured");
            }
            ctx
        });

        Self { contexts }
    }

    pub fn context(&self, id: ContextId) -> &IntegrationContext {
        &self.contexts[id.index()]
    }

    /// Looks up a context by its string id.
    pub fn configuration_for(&self, id: &str) -> ShieldResult<&IntegrationContext> {
        let id: ContextId = id.parse()?;
        Ok(self.context(id))
    }

    /// Whether `id` had a key id and all three credential files at
    /// construction time.
    pub fn is_configured(&self, id: ContextId) -> bool {
        self.context(id).is_configured()
    }

    pub fn contexts(&self) -> impl Iterator<Item = &IntegrationContext> {
        self.contexts.iter()
    }

    /// Re-checks the credentials of `id` on disk.
    ///
    /// Diagnostic only: problems are reported, never raised.
    pub fn verify(&self, id: ContextId) -> VerificationReport {
        let ctx = self.context(id);
        let mut problems = Vec::new();

        let key_id_present = !ctx.key_id().trim().is_empty();
        if !key_id_present {
            problems.push("key id is empty".to_string());
        }

        let private_key_present = check_present("private key", ctx.private_key_path(), &mut problems);
        let client_cert_present =
            check_present("client certificate", ctx.client_cert_path(), &mut problems);
        let peer_cert_present =
            check_present("peer certificate", ctx.peer_cert_path(), &mut problems);

        let private_key_permissions_ok = match ctx.private_key_path() {
            Some(path) if private_key_present => check_private_key_mode(path, &mut problems),
            _ => false,
        };

        if peer_cert_present {
            if let Err(e) = self.read_peer_public_key(id) {
                problems.push(format!("peer certificate unusable: {e}"));
            }
        }

        if private_key_present {
            match self.read_private_key(id) {
                Ok(local) if client_cert_present => match self.client_certificate_pem(id) {
                    Ok(pem) => match local.matches_certificate(&pem) {
                        Ok(true) => {}
                        Ok(false) => problems
                            .push("client certificate was not issued for the private key".into()),
                        Err(e) => problems.push(format!("client certificate unusable: {e}")),
                    },
                    Err(e) => problems.push(format!("client certificate unreadable: {e}")),
                },
                Ok(_) => {}
                Err(e) => problems.push(format!("private key unusable: {e}")),
            }
        }

        debug!(context = %id, problems = problems.len(), "verified integration context");

        VerificationReport {
            context: id,
            key_id_present,
            private_key_present,
            private_key_permissions_ok,
            client_cert_present,
            peer_cert_present,
            problems,
        }
    }

    /// Reads and parses the counterparty's public credential for `id`.
    pub(crate) fn read_peer_public_key(&self, id: ContextId) -> ShieldResult<PeerPublicKey> {
        let path = self.configured_path(id, IntegrationContext::peer_cert_path, "peer certificate")?;
        let pem = read_pem(path)?;
        Ok(PeerPublicKey::from_pem(&pem)?)
    }

    /// Reads and parses this process's private key for `id`.
    pub(crate) fn read_private_key(&self, id: ContextId) -> ShieldResult<LocalPrivateKey> {
        let path = self.configured_path(id, IntegrationContext::private_key_path, "private key")?;
        let pem = Zeroizing::new(read_pem(path)?);
        Ok(LocalPrivateKey::from_pem(&pem)?)
    }

    /// PEM text of the client certificate for `id`, for the transport layer
    /// to present during mutual TLS.
    pub fn client_certificate_pem(&self, id: ContextId) -> ShieldResult<String> {
        let path =
            self.configured_path(id, IntegrationContext::client_cert_path, "client certificate")?;
        read_pem(path)
    }

    fn configured_path<'a>(
        &'a self,
        id: ContextId,
        select: fn(&IntegrationContext) -> Option<&Path>,
        what: &str,
    ) -> ShieldResult<&'a Path> {
        let ctx = self.context(id);
        select(ctx).ok_or_else(|| {
            ShieldError::Configuration(format!("{what} path not set for context {id}"))
        })
    }
}

/// Outcome of [`ConfigurationRegistry::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub context: ContextId,
    pub key_id_present: bool,
    pub private_key_present: bool,
    pub private_key_permissions_ok: bool,
    pub client_cert_present: bool,
    pub peer_cert_present: bool,
    pub problems: Vec<String>,
}

impl VerificationReport {
    pub fn is_healthy(&self) -> bool {
        self.problems.is_empty()
    }
}

fn read_pem(path: &Path) -> ShieldResult<String> {
    std::fs::read_to_string(path).map_err(|source| ShieldError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn check_present(what: &str, path: Option<&Path>, problems: &mut Vec<String>) -> bool {
    match path {
        None => {
            problems.push(format!("{what} path is not set"));
            false
        }
        Some(p) if !is_file(Some(p)) => {
            problems.push(format!("{what} not found at {}", p.display()));
            false
        }
        Some(_) => true,
    }
}

/// Private keys must not be accessible to group or others.
#[cfg(unix)]
fn check_private_key_mode(path: &Path, problems: &mut Vec<String>) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(path) {
        Ok(meta) => {
            let mode = meta.permissions().mode() & 0o777;
            if mode & 0o077 != 0 {
                problems.push(format!(
                    "private key {} has mode {mode:o}, expected 600 or stricter",
                    path.display()
                ));
                false
            } else {
                true
            }
        }
        Err(e) => {
            problems.push(format!("cannot stat private key {}: {e}", path.display()));
            false
        }
    }
}

#[cfg(not(unix))]
fn check_private_key_mode(_path: &Path, _problems: &mut Vec<String>) -> bool {
    true
}
