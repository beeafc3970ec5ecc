//! Confidential threads: read-key distribution through grants.

use std::sync::Arc;

use threadgate::access::{AccessConfig, AccessError, ConfidentialityError, GrantDenial};
use threadgate::core::Ed25519IdentityVerifier;
use threadgate::{Capability, ReadKey, Thread, ThreadConfig, ThreadError};
use threadgate_testkit::multi_party;

#[tokio::test]
async fn grantees_unlock_sealed_posts() -> anyhow::Result<()> {
    let parties = multi_party(3);
    let (moderator, alice, bob) = (&parties[0], &parties[1], &parties[2]);

    let read_key = ReadKey::generate();
    let access = AccessConfig::new(moderator.id().clone())
        .with_members_only(true)
        .with_enc_key_id(read_key.key_id());
    let origin = Thread::create(
        ThreadConfig::new("private", access),
        moderator.keys.clone(),
        Arc::new(Ed25519IdentityVerifier::new()),
    )
    .await?;
    origin.set_read_key(read_key.clone())?;

    // Bootstrap self-grant records the moderator's own wrapped key.
    origin
        .grant_with_key(Capability::Moderator, moderator.id().clone(), &moderator.exchange_public())
        .await?;
    origin
        .grant_with_key(Capability::Member, alice.id().clone(), &alice.exchange_public())
        .await?;

    let err = origin
        .grant(Capability::Member, bob.id().clone())
        .await
        .unwrap_err();
    assert_eq!(err.grant_denial(), Some(GrantDenial::MissingReadKey));

    origin.post_sealed(b"meeting at noon").await?;

    let alice_view = Thread::open(
        &origin.manifest(),
        alice.keys.clone(),
        Arc::new(Ed25519IdentityVerifier::new()),
    )
    .await?;
    alice_view.sync_from(&origin).await?;

    let unlocked = alice_view.unlock(&alice.exchange).await?;
    assert_eq!(unlocked, read_key);

    let posts = alice_view.posts().await?;
    assert_eq!(posts.len(), 1);
    assert_eq!(alice_view.open_sealed(&posts[0])?, b"meeting at noon");

    // Bob's secret does not open Alice's grant, and Bob has none of his own.
    let bob_view = Thread::open(
        &origin.manifest(),
        bob.keys.clone(),
        Arc::new(Ed25519IdentityVerifier::new()),
    )
    .await?;
    bob_view.sync_from(&origin).await?;
    assert!(matches!(
        bob_view.unlock(&bob.exchange).await,
        Err(ThreadError::Access(AccessError::Confidentiality(
            ConfidentialityError::NoGrant(_)
        )))
    ));
    Ok(())
}

#[tokio::test]
async fn open_threads_have_no_read_keys() -> anyhow::Result<()> {
    let parties = multi_party(1);
    let origin = Thread::create(
        ThreadConfig::new("public", AccessConfig::new(parties[0].id().clone())),
        parties[0].keys.clone(),
        Arc::new(Ed25519IdentityVerifier::new()),
    )
    .await?;

    let err = origin.encrypted_key(parties[0].id()).await.unwrap_err();
    assert!(matches!(
        err,
        ThreadError::Access(AccessError::Confidentiality(
            ConfidentialityError::NotConfidential
        ))
    ));
    Ok(())
}
