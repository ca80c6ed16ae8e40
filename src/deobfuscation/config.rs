//! Configuration for encrypted resource recovery.

/// Tuning knobs for [`crate::deobfuscation::EncryptedResource`].
///
/// # Examples
///
/// ```rust
/// use dotscope_reactor::deobfuscation::ReactorConfig;
///
/// let config = ReactorConfig::default().with_simplify_method(false);
/// assert!(!config.simplify_method);
/// assert!(config.patch_public_key_token);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactorConfig {
    /// Run the method simplifier over the decrypter before reconstructing key material.
    ///
    /// Disable this when the bodies were already normalized by an earlier pass.
    pub simplify_method: bool,

    /// Splice the assembly's public key token into the IV when the decrypter does so.
    pub patch_public_key_token: bool,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            simplify_method: true,
            patch_public_key_token: true,
        }
    }
}

impl ReactorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the decrypter method is simplified during `init`.
    #[must_use]
    pub fn with_simplify_method(mut self, enable: bool) -> Self {
        self.simplify_method = enable;
        self
    }

    /// Sets whether the public key token IV patch is applied.
    #[must_use]
    pub fn with_patch_public_key_token(mut self, enable: bool) -> Self {
        self.patch_public_key_token = enable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_everything() {
        let config = ReactorConfig::new();
        assert_eq!(config, ReactorConfig::default());
        assert!(config.simplify_method);
        assert!(config.patch_public_key_token);
    }

    #[test]
    fn test_setters() {
        let config = ReactorConfig::new()
            .with_simplify_method(false)
            .with_patch_public_key_token(false);
        assert!(!config.simplify_method);
        assert!(!config.patch_public_key_token);
    }
}
