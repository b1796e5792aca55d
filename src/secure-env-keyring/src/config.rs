//! Configuration for the secure environment.

use serde::Deserialize;

/// Minimum keystore feature level accepted as a secure environment.
///
/// Matches the StrongBox/KeyMint feature version the Android probe reports
/// for dedicated secure hardware.
pub const DEFAULT_MIN_SECURITY_LEVEL: u32 = 100;

/// Configuration for the secure environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SecureEnvConfig {
    /// Minimum security level the hardware probe must report.
    pub min_security_level: u32,
    /// Text shown by the biometric prompt.
    pub prompt: BiometricPrompt,
    /// Re-check that a key is gone after deleting it.
    pub verify_deletion: bool,
}

impl Default for SecureEnvConfig {
    fn default() -> Self {
        Self {
            min_security_level: DEFAULT_MIN_SECURITY_LEVEL,
            prompt: BiometricPrompt::default(),
            verify_deletion: true,
        }
    }
}

impl SecureEnvConfig {
    /// Set the minimum security level.
    #[must_use]
    pub fn min_security_level(mut self, level: u32) -> Self {
        self.min_security_level = level;
        self
    }

    /// Set the biometric prompt text.
    #[must_use]
    pub fn prompt(mut self, prompt: BiometricPrompt) -> Self {
        self.prompt = prompt;
        self
    }

    /// Set whether deletion is re-verified.
    #[must_use]
    pub fn verify_deletion(mut self, verify: bool) -> Self {
        self.verify_deletion = verify;
        self
    }
}

/// Text of the biometric prompt shown before a biometrics-bound key is used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BiometricPrompt {
    /// Prompt title.
    pub title: String,
    /// Prompt subtitle.
    pub subtitle: String,
    /// Label of the button that cancels the prompt.
    pub negative_button: String,
}

impl Default for BiometricPrompt {
    fn default() -> Self {
        Self {
            title: "Biometrics".into(),
            subtitle: "Authenticate to sign data".into(),
            negative_button: "Cancel".into(),
        }
    }
}
