//! Installation discovery.
//!
//! OpenVPN installers put easy-rsa in one of a few well-known places. A
//! [`Layout`] describes one such convention; the [`Locator`] probes them in
//! declared order and the first layout whose easy-rsa directory exists wins.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Name of the index file inside the PKI directory.
pub const INDEX_FILE: &str = "index.txt";

/// One known on-disk arrangement of easy-rsa and the OpenVPN server files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Short label used in logs.
    pub name: String,
    /// easy-rsa root; its existence selects this layout.
    pub easy_rsa: PathBuf,
    /// Base client configuration, used only if it exists.
    #[serde(default)]
    pub client_template: Option<PathBuf>,
    /// `tls-crypt` key, checked before `tls_auth`.
    #[serde(default)]
    pub tls_crypt: Option<PathBuf>,
    /// `tls-auth` key.
    #[serde(default)]
    pub tls_auth: Option<PathBuf>,
    /// Where the regenerated CRL is published for the server.
    pub crl_destination: PathBuf,
}

impl Layout {
    /// Layout with easy-rsa directly under `/etc/openvpn`.
    #[must_use]
    pub fn standalone() -> Self {
        Self {
            name: "standalone".to_string(),
            easy_rsa: PathBuf::from("/etc/openvpn/easy-rsa"),
            client_template: Some(PathBuf::from("/etc/openvpn/client-template.txt")),
            tls_crypt: Some(PathBuf::from("/etc/openvpn/tls-crypt.key")),
            tls_auth: Some(PathBuf::from("/etc/openvpn/tls-auth.key")),
            crl_destination: PathBuf::from("/etc/openvpn/crl.pem"),
        }
    }

    /// Layout with everything under `/etc/openvpn/server`.
    #[must_use]
    pub fn server_embedded() -> Self {
        Self {
            name: "server-embedded".to_string(),
            easy_rsa: PathBuf::from("/etc/openvpn/server/easy-rsa"),
            client_template: Some(PathBuf::from("/etc/openvpn/server/client-common.txt")),
            tls_crypt: Some(PathBuf::from("/etc/openvpn/server/tc.key")),
            tls_auth: Some(PathBuf::from("/etc/openvpn/server/tc.key")),
            crl_destination: PathBuf::from("/etc/openvpn/server/crl.pem"),
        }
    }

    /// A layout rooted at `dir`, using the standalone file names.
    ///
    /// Handy for installations in non-standard prefixes and for tests.
    #[must_use]
    pub fn rooted_at(name: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            name: name.into(),
            easy_rsa: dir.join("easy-rsa"),
            client_template: Some(dir.join("client-template.txt")),
            tls_crypt: Some(dir.join("tls-crypt.key")),
            tls_auth: Some(dir.join("tls-auth.key")),
            crl_destination: dir.join("crl.pem"),
        }
    }

    /// Build the installation record for this layout.
    ///
    /// Optional files are kept only if they exist right now.
    fn resolve(&self) -> Installation {
        let client_template = existing(self.client_template.as_deref());

        let tunnel_key = existing(self.tls_crypt.as_deref())
            .map(|path| TunnelKey {
                kind: TunnelKeyKind::Crypt,
                path,
            })
            .or_else(|| {
                existing(self.tls_auth.as_deref()).map(|path| TunnelKey {
                    kind: TunnelKeyKind::Auth,
                    path,
                })
            });

        Installation {
            layout: self.clone(),
            pki: self.easy_rsa.join("pki"),
            client_template,
            tunnel_key,
        }
    }
}

fn existing(path: Option<&Path>) -> Option<PathBuf> {
    path.filter(|p| p.exists()).map(Path::to_path_buf)
}

/// The built-in layouts, in precedence order.
#[must_use]
pub fn default_layouts() -> Vec<Layout> {
    vec![Layout::standalone(), Layout::server_embedded()]
}

/// Which control-channel protection the tunnel key provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TunnelKeyKind {
    /// `tls-crypt`: authenticates and encrypts the control channel.
    Crypt,
    /// `tls-auth`: legacy HMAC authentication only.
    Auth,
}

impl TunnelKeyKind {
    /// Tag name used for the inline block in a client config.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Crypt => "tls-crypt",
            Self::Auth => "tls-auth",
        }
    }
}

/// A tunnel key file found at discovery time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TunnelKey {
    /// Key mode.
    pub kind: TunnelKeyKind,
    /// Key file.
    pub path: PathBuf,
}

/// A resolved easy-rsa installation.
///
/// Immutable once built; layout changes on disk need a new manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Installation {
    layout: Layout,
    pki: PathBuf,
    client_template: Option<PathBuf>,
    tunnel_key: Option<TunnelKey>,
}

impl Installation {
    /// Name of the layout that matched.
    #[must_use]
    pub fn layout_name(&self) -> &str {
        &self.layout.name
    }

    /// The layout that matched.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// easy-rsa root; external commands run from here.
    #[must_use]
    pub fn easy_rsa(&self) -> &Path {
        &self.layout.easy_rsa
    }

    /// PKI directory (`<easy-rsa>/pki`).
    #[must_use]
    pub fn pki(&self) -> &Path {
        &self.pki
    }

    /// Client template, if it existed at discovery.
    #[must_use]
    pub fn client_template(&self) -> Option<&Path> {
        self.client_template.as_deref()
    }

    /// Tunnel key, if one existed at discovery.
    #[must_use]
    pub fn tunnel_key(&self) -> Option<&TunnelKey> {
        self.tunnel_key.as_ref()
    }

    /// Published CRL location.
    #[must_use]
    pub fn crl_destination(&self) -> &Path {
        &self.layout.crl_destination
    }

    /// `pki/index.txt`.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.pki.join(INDEX_FILE)
    }

    /// `pki/ca.crt`.
    #[must_use]
    pub fn ca_path(&self) -> PathBuf {
        self.pki.join("ca.crt")
    }

    /// `pki/crl.pem`, as written by `gen-crl`.
    #[must_use]
    pub fn crl_path(&self) -> PathBuf {
        self.pki.join("crl.pem")
    }

    /// `pki/issued/<name>.crt`.
    #[must_use]
    pub fn cert_path(&self, name: &str) -> PathBuf {
        self.pki.join("issued").join(format!("{name}.crt"))
    }

    /// `pki/private/<name>.key`.
    #[must_use]
    pub fn key_path(&self, name: &str) -> PathBuf {
        self.pki.join("private").join(format!("{name}.key"))
    }
}

/// Probes layouts in order and returns the first one present.
#[derive(Debug, Clone)]
pub struct Locator {
    layouts: Vec<Layout>,
}

impl Locator {
    /// Create a locator over `layouts`, tried in the given order.
    #[must_use]
    pub fn new(layouts: Vec<Layout>) -> Self {
        Self { layouts }
    }

    /// The candidate layouts in precedence order.
    #[must_use]
    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    /// Find the installation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InstallationNotFound`] when no candidate's easy-rsa
    /// directory exists.
    pub fn resolve(&self) -> Result<Installation> {
        for layout in &self.layouts {
            if layout.easy_rsa.is_dir() {
                let installation = layout.resolve();
                info!(
                    layout = %layout.name,
                    easy_rsa = %layout.easy_rsa.display(),
                    template = installation.client_template.is_some(),
                    tunnel_key = ?installation.tunnel_key.as_ref().map(|k| k.kind),
                    "located easy-rsa installation"
                );
                return Ok(installation);
            }
            debug!(layout = %layout.name, easy_rsa = %layout.easy_rsa.display(), "layout not present");
        }

        Err(Error::InstallationNotFound {
            searched: self.layouts.iter().map(|l| l.easy_rsa.clone()).collect(),
        })
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self::new(default_layouts())
    }
}
