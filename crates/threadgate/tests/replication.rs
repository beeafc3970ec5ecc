//! Eventual consistency between peers exchanging signed entries.

use std::sync::Arc;

use threadgate::access::AccessConfig;
use threadgate::core::{Ed25519IdentityVerifier, IdentityVerifier};
use threadgate::{Thread, ThreadConfig, ThreadManifest};
use threadgate_testkit::{multi_party, StaticVerifier, TestIdentity};

fn verifier() -> Arc<dyn IdentityVerifier> {
    Arc::new(Ed25519IdentityVerifier::new())
}

async fn open_as(manifest: &ThreadManifest, who: &TestIdentity) -> anyhow::Result<Thread> {
    Ok(Thread::open(manifest, who.keys.clone(), verifier()).await?)
}

#[tokio::test]
async fn entries_wait_for_their_grants() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let parties = multi_party(3);
    let (moderator, alice, bob) = (&parties[0], &parties[1], &parties[2]);

    let access = AccessConfig::new(moderator.id().clone()).with_members_only(true);
    let origin = Thread::create(
        ThreadConfig::new("general", access),
        moderator.keys.clone(),
        verifier(),
    )
    .await?;
    origin.add_member(alice.id().clone()).await?;

    let manifest = origin.manifest();
    let alice_view = open_as(&manifest, alice).await?;
    alice_view.replicate_grants_from(&origin).await?;
    alice_view.post(&b"first"[..]).await?;

    // Bob sees the post before the grant that authorizes it.
    let bob_view = open_as(&manifest, bob).await?;
    let early = bob_view.replicate_posts_from(&alice_view).await?;
    assert_eq!(early.accepted, 0);
    assert_eq!(early.rejected, 1);
    assert!(bob_view.posts().await?.is_empty());

    let mut updates = bob_view.subscribe();
    let grants = bob_view.replicate_grants_from(&origin).await?;
    assert_eq!(grants.accepted, 1);
    updates.changed().await?;
    assert!(bob_view.capabilities().is_member(alice.id().as_str()));

    let late = bob_view.replicate_posts_from(&alice_view).await?;
    assert_eq!(late.accepted, 1);
    assert_eq!(bob_view.posts().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn peers_converge_on_the_same_capabilities() -> anyhow::Result<()> {
    let parties = multi_party(4);
    let moderator = &parties[0];

    let access = AccessConfig::new(moderator.id().clone()).with_members_only(true);
    let origin = Thread::create(
        ThreadConfig::new("converge", access),
        moderator.keys.clone(),
        verifier(),
    )
    .await?;
    origin.add_moderator(parties[1].id().clone()).await?;
    origin.add_member(parties[2].id().clone()).await?;

    // A second moderator grants from its own peer.
    let second = open_as(&origin.manifest(), &parties[1]).await?;
    second.sync_from(&origin).await?;
    second.add_member(parties[3].id().clone()).await?;

    let observer = open_as(&origin.manifest(), &parties[3]).await?;
    observer.sync_from(&second).await?;
    origin.sync_from(&second).await?;

    assert_eq!(observer.moderators(), origin.moderators());
    assert_eq!(observer.members(), origin.members());
    assert_eq!(origin.members().len(), 2);
    Ok(())
}

#[tokio::test]
async fn duplicate_entries_are_counted() -> anyhow::Result<()> {
    let parties = multi_party(2);
    let access = AccessConfig::new(parties[0].id().clone());
    let origin = Thread::create(
        ThreadConfig::new("general", access),
        parties[0].keys.clone(),
        verifier(),
    )
    .await?;
    origin.post(&b"hello"[..]).await?;

    let view = open_as(&origin.manifest(), &parties[1]).await?;
    let first = view.sync_from(&origin).await?;
    assert_eq!(first.posts.accepted, 1);

    let again = view.sync_from(&origin).await?;
    assert_eq!(again.posts.duplicate, 1);
    assert_eq!(again.posts.accepted, 0);
    Ok(())
}

#[tokio::test]
async fn unverifiable_peers_accept_nothing() -> anyhow::Result<()> {
    let parties = multi_party(2);
    let access = AccessConfig::new(parties[0].id().clone());
    let origin = Thread::create(
        ThreadConfig::new("general", access),
        parties[0].keys.clone(),
        verifier(),
    )
    .await?;
    origin.add_moderator(parties[1].id().clone()).await?;
    origin.post(&b"hello"[..]).await?;

    let isolated = Thread::open(
        &origin.manifest(),
        parties[1].keys.clone(),
        StaticVerifier::Fail.shared(),
    )
    .await?;
    let report = isolated.sync_from(&origin).await?;

    assert_eq!(report.grants.rejected, 1);
    assert_eq!(report.posts.rejected, 1);
    assert_eq!(isolated.moderators().len(), 1);
    Ok(())
}

#[tokio::test]
async fn manifests_survive_json() -> anyhow::Result<()> {
    let parties = multi_party(1);
    let access = AccessConfig::new(parties[0].id().clone()).with_members_only(true);
    let origin = Thread::create(
        ThreadConfig::new("general", access),
        parties[0].keys.clone(),
        verifier(),
    )
    .await?;

    let json = origin.manifest().to_json()?;
    let manifest = ThreadManifest::from_json(&json)?;
    let reopened = open_as(&manifest, &parties[0]).await?;

    assert_eq!(reopened.address(), origin.address());
    assert_eq!(reopened.grant_log_address(), origin.grant_log_address());
    assert_eq!(reopened.config().access, origin.config().access);
    Ok(())
}
