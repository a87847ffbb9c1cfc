//! Inline client configuration (`.ovpn`) assembly.

use crate::layout::TunnelKeyKind;

/// Cipher directive rewritten in every rendered bundle.
pub const LEGACY_CIPHER_LINE: &str = "cipher AES-256-CBC";

/// Replacement for [`LEGACY_CIPHER_LINE`]: a 128-bit cipher plus MTU and I/O tuning.
pub const NORMALIZED_CIPHER_BLOCK: &str =
    "cipher AES-128-CBC\ntun-mtu 60000\ntun-mtu-extra 32\nmssfix 1450\nfast-io";

/// File extension for rendered bundles.
pub const CONFIG_EXTENSION: &str = "ovpn";

/// Everything needed to render one client bundle, already read from disk.
#[derive(Debug, Clone)]
pub struct BundleMaterial {
    /// Base client configuration.
    pub template: String,
    /// CA certificate PEM.
    pub ca: String,
    /// Client certificate PEM.
    pub cert: String,
    /// Client private key PEM.
    pub key: String,
    /// Optional tunnel key and its mode.
    pub tunnel_key: Option<(TunnelKeyKind, String)>,
}

impl BundleMaterial {
    /// Render the bundle: template, `<ca>`, `<cert>`, `<key>`, then the
    /// tunnel key block, followed by cipher normalization.
    #[must_use]
    pub fn render(&self) -> String {
        let mut config = String::with_capacity(
            self.template.len() + self.ca.len() + self.cert.len() + self.key.len() + 256,
        );

        config.push_str(&self.template);
        config.push_str(&inline_block("ca", &self.ca));
        config.push_str(&inline_block("cert", &self.cert));
        config.push_str(&inline_block("key", &self.key));

        if let Some((kind, body)) = &self.tunnel_key {
            config.push_str(&inline_block(kind.tag(), body));
        }

        normalize_cipher(&config)
    }
}

/// Wrap `body` in `<tag>`/`</tag>` lines, trimming surrounding whitespace.
#[must_use]
pub fn inline_block(tag: &str, body: &str) -> String {
    format!("<{tag}>\n{}\n</{tag}>\n", body.trim())
}

/// Replace every [`LEGACY_CIPHER_LINE`] with [`NORMALIZED_CIPHER_BLOCK`].
#[must_use]
pub fn normalize_cipher(config: &str) -> String {
    config.replace(LEGACY_CIPHER_LINE, NORMALIZED_CIPHER_BLOCK)
}

/// Download file name for a client's bundle.
#[must_use]
pub fn bundle_file_name(client: &str) -> String {
    format!("{client}.{CONFIG_EXTENSION}")
}
