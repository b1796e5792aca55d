//! Fake platform keystore for integration tests.
//!
//! Holds real P-256 keys (via `p256`) and answers in the native encodings the
//! two platform families use: DER SPKI with explicit existence checks, or raw
//! EC points where existence is only discoverable through an export attempt.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::rand_core::OsRng;
use p256::pkcs8::EncodePublicKey;

use secure_env_keyring::{
    AuthToken, CanonicalPublicKey, CanonicalSignature, HardwareBackend, NativeError,
};

/// Native public key encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    /// DER SubjectPublicKeyInfo.
    Spki,
    /// 65-byte uncompressed point.
    RawPoint,
}

struct StoredKey {
    signing_key: SigningKey,
    biometrics_backed: bool,
}

#[derive(Default)]
struct State {
    keys: Mutex<HashMap<String, StoredKey>>,
    probes: AtomicUsize,
    generates: AtomicUsize,
    tokens_seen: Mutex<Vec<AuthToken>>,
}

/// In-memory stand-in for a platform keystore. Clones share state.
#[derive(Clone)]
pub struct FakeKeystore {
    state: Arc<State>,
    format: KeyFormat,
    explicit_existence: bool,
    level: u32,
    hardware: bool,
    generate_failure: Option<String>,
    corrupt_public_keys: bool,
    ignore_deletes: bool,
}

impl FakeKeystore {
    /// Android-like keystore: SPKI keys, explicit existence, StrongBox level.
    pub fn android() -> Self {
        Self {
            state: Arc::default(),
            format: KeyFormat::Spki,
            explicit_existence: true,
            level: 100,
            hardware: true,
            generate_failure: None,
            corrupt_public_keys: false,
            ignore_deletes: false,
        }
    }

    /// Secure-Enclave-like keystore: raw points, inferred existence.
    pub fn enclave() -> Self {
        Self {
            format: KeyFormat::RawPoint,
            explicit_existence: false,
            ..Self::android()
        }
    }

    pub fn level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn without_hardware(mut self) -> Self {
        self.hardware = false;
        self
    }

    pub fn failing_generate(mut self, diagnostic: &str) -> Self {
        self.generate_failure = Some(diagnostic.to_string());
        self
    }

    pub fn corrupt_public_keys(mut self) -> Self {
        self.corrupt_public_keys = true;
        self
    }

    pub fn ignore_deletes(mut self) -> Self {
        self.ignore_deletes = true;
        self
    }

    pub fn probes(&self) -> usize {
        self.state.probes.load(Ordering::SeqCst)
    }

    pub fn generates(&self) -> usize {
        self.state.generates.load(Ordering::SeqCst)
    }

    pub fn contains(&self, key_id: &str) -> bool {
        self.state.keys.lock().unwrap().contains_key(key_id)
    }

    pub fn tokens_seen(&self) -> Vec<AuthToken> {
        self.state.tokens_seen.lock().unwrap().clone()
    }

    fn not_found(&self, key_id: &str) -> NativeError {
        match self.format {
            KeyFormat::Spki => NativeError::new(format!("KeyNotFound: no entry for alias {key_id}")),
            KeyFormat::RawPoint => NativeError::new(format!("NoKeyWithIdFound(\"{key_id}\")")),
        }
    }
}

#[async_trait]
impl HardwareBackend for FakeKeystore {
    fn hardware_available(&self) -> bool {
        self.hardware
    }

    fn security_level(&self) -> u32 {
        self.state.probes.fetch_add(1, Ordering::SeqCst);
        self.level
    }

    async fn generate(&self, key_id: &str, biometrics_backed: bool) -> Result<(), NativeError> {
        self.state.generates.fetch_add(1, Ordering::SeqCst);
        if let Some(diagnostic) = &self.generate_failure {
            return Err(NativeError::new(diagnostic.clone()));
        }

        let mut keys = self.state.keys.lock().unwrap();
        if keys.contains_key(key_id) {
            return Err(NativeError::new("KeyAlreadyExists"));
        }
        keys.insert(
            key_id.to_string(),
            StoredKey {
                signing_key: SigningKey::random(&mut OsRng),
                biometrics_backed,
            },
        );
        Ok(())
    }

    async fn public_key_bytes(&self, key_id: &str) -> Result<Vec<u8>, NativeError> {
        let keys = self.state.keys.lock().unwrap();
        let stored = keys.get(key_id).ok_or_else(|| self.not_found(key_id))?;
        let verifying_key = stored.signing_key.verifying_key();

        if self.corrupt_public_keys {
            let mut bytes = verifying_key.to_encoded_point(false).as_bytes().to_vec();
            bytes[0] = 0x07;
            return Ok(bytes);
        }

        Ok(match self.format {
            KeyFormat::Spki => verifying_key.to_public_key_der().unwrap().as_bytes().to_vec(),
            KeyFormat::RawPoint => verifying_key.to_encoded_point(false).as_bytes().to_vec(),
        })
    }

    async fn sign(
        &self,
        key_id: &str,
        message: &[u8],
        auth: Option<&AuthToken>,
    ) -> Result<Vec<u8>, NativeError> {
        let keys = self.state.keys.lock().unwrap();
        let stored = keys.get(key_id).ok_or_else(|| self.not_found(key_id))?;

        if stored.biometrics_backed {
            let token = auth.ok_or_else(|| NativeError::new("NoSignatureOnCryptoObject"))?;
            self.state.tokens_seen.lock().unwrap().push(token.clone());
        }

        let signature: Signature = stored.signing_key.sign(message);
        Ok(signature.to_der().as_bytes().to_vec())
    }

    async fn delete(&self, key_id: &str) -> Result<(), NativeError> {
        if self.ignore_deletes {
            return Ok(());
        }
        self.state
            .keys
            .lock()
            .unwrap()
            .remove(key_id)
            .map(|_| ())
            .ok_or_else(|| self.not_found(key_id))
    }

    async fn has_key(&self, key_id: &str) -> Result<bool, NativeError> {
        if self.explicit_existence {
            Ok(self.contains(key_id))
        } else {
            secure_env_keyring::infer_has_key(self, key_id).await
        }
    }
}

/// Verify a canonical signature against a canonical public key with `p256`.
pub fn verifies(public_key: &CanonicalPublicKey, message: &[u8], signature: &CanonicalSignature) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(public_key.as_bytes()) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature.as_bytes()) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}
