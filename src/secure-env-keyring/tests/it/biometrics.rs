//! Biometric-gated signing through the channel authenticator.

use std::sync::Arc;

use secure_env_keyring::{
    AuthToken, BiometricPrompt, ChannelAuthenticator, ErrorKind, KeyLifecycleManager,
    PendingAuth, SecureEnvConfig, SecureEnvironment,
};
use tokio::sync::mpsc::Receiver;

use crate::support::{verifies, FakeKeystore};

fn manager_with_prompt(
    keystore: &FakeKeystore,
) -> (KeyLifecycleManager<FakeKeystore>, Receiver<PendingAuth>) {
    let (authenticator, requests) = ChannelAuthenticator::new(4);
    let manager =
        KeyLifecycleManager::new(keystore.clone()).with_authenticator(Arc::new(authenticator));
    (manager, requests)
}

#[tokio::test]
async fn approved_prompt_signs() {
    let keystore = FakeKeystore::android();
    let (manager, mut requests) = manager_with_prompt(&keystore);
    let public_key = manager.generate_and_export("bio", true).await.unwrap();

    let ui = tokio::spawn(async move {
        let pending = requests.recv().await.unwrap();
        assert_eq!(pending.request().key_id, "bio");
        assert_eq!(pending.request().prompt, BiometricPrompt::default());
        pending.approve(AuthToken::new(b"crypto-object".to_vec()));
    });

    let signature = manager.sign("bio", b"payload", true).await.unwrap();
    ui.await.unwrap();

    assert!(verifies(&public_key, b"payload", &signature));
    assert_eq!(keystore.tokens_seen(), vec![AuthToken::new(b"crypto-object".to_vec())]);
}

#[tokio::test]
async fn custom_prompt_text_is_forwarded() {
    let prompt = BiometricPrompt {
        title: "Confirm".into(),
        subtitle: "Sign the transfer".into(),
        negative_button: "Not now".into(),
    };
    let (authenticator, mut requests) = ChannelAuthenticator::new(1);
    let manager = KeyLifecycleManager::with_config(
        FakeKeystore::enclave(),
        SecureEnvConfig::default().prompt(prompt.clone()),
    )
    .with_authenticator(Arc::new(authenticator));
    manager.generate_keypair("bio", true).await.unwrap();

    let ui = tokio::spawn(async move {
        let pending = requests.recv().await.unwrap();
        let seen = pending.request().prompt.clone();
        pending.approve(AuthToken::new(vec![1]));
        seen
    });

    manager.sign("bio", b"payload", true).await.unwrap();
    assert_eq!(ui.await.unwrap(), prompt);
}

#[tokio::test]
async fn cancelled_prompt_fails() {
    let keystore = FakeKeystore::android();
    let (manager, mut requests) = manager_with_prompt(&keystore);
    manager.generate_keypair("bio", true).await.unwrap();

    let ui = tokio::spawn(async move {
        requests.recv().await.unwrap().cancel();
    });

    let err = manager.sign("bio", b"payload", true).await.unwrap_err();
    ui.await.unwrap();

    assert_eq!(err.kind(), ErrorKind::BiometricAuthenticationFailed);
    assert_eq!(err.key_id(), "bio");
    assert!(keystore.tokens_seen().is_empty());
}

#[tokio::test]
async fn rejected_prompt_keeps_reason() {
    let keystore = FakeKeystore::android();
    let (manager, mut requests) = manager_with_prompt(&keystore);
    manager.generate_keypair("bio", true).await.unwrap();

    let ui = tokio::spawn(async move {
        requests
            .recv()
            .await
            .unwrap()
            .reject("code: 7, msg: Too many attempts");
    });

    let err = manager.sign("bio", b"payload", true).await.unwrap_err();
    ui.await.unwrap();

    assert_eq!(err.kind(), ErrorKind::BiometricAuthenticationFailed);
    assert_eq!(err.native(), "code: 7, msg: Too many attempts");
}

#[tokio::test]
async fn prompt_owner_gone() {
    let keystore = FakeKeystore::android();
    let (manager, requests) = manager_with_prompt(&keystore);
    manager.generate_keypair("bio", true).await.unwrap();
    drop(requests);

    let err = manager.sign("bio", b"payload", true).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BiometricAuthenticationFailed);
}

#[tokio::test]
async fn no_authenticator_configured() {
    let manager = KeyLifecycleManager::new(FakeKeystore::android());
    manager.generate_keypair("bio", true).await.unwrap();

    let err = manager.sign("bio", b"payload", true).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BiometricAuthenticationFailed);
}

#[tokio::test]
async fn missing_key_fails_before_prompting() {
    let keystore = FakeKeystore::android();
    let (manager, mut requests) = manager_with_prompt(&keystore);

    let err = manager.sign("bio", b"payload", true).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyNotFound);
    assert!(requests.try_recv().is_err());
}

#[tokio::test]
async fn dropped_sign_abandons_request() {
    let keystore = FakeKeystore::android();
    let (manager, mut requests) = manager_with_prompt(&keystore);
    manager.generate_keypair("bio", true).await.unwrap();
    let manager = Arc::new(manager);

    let task = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.sign("bio", b"payload", true).await })
    };

    let pending = requests.recv().await.unwrap();
    assert!(!pending.is_abandoned());

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert!(pending.is_abandoned());

    pending.approve(AuthToken::new(vec![1]));
    assert!(keystore.tokens_seen().is_empty());
}
