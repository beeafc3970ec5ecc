//! Authorization scenarios for a single thread seen from several peers.

use threadgate::access::{AccessConfig, Capability, GrantDenial};
use threadgate::{Thread, ThreadConfig, ThreadError};
use threadgate_testkit::{StaticVerifier, TestIdentity};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn create(moderator: &TestIdentity, members_only: bool) -> anyhow::Result<Thread> {
    init_tracing();
    let access = AccessConfig::new(moderator.id().clone()).with_members_only(members_only);
    Ok(Thread::create(
        ThreadConfig::new("general", access),
        moderator.keys.clone(),
        StaticVerifier::Approve.shared(),
    )
    .await?)
}

/// Open `thread` as `who` and pull everything it has.
async fn join(thread: &Thread, who: &TestIdentity) -> anyhow::Result<Thread> {
    let peer = Thread::open(
        &thread.manifest(),
        who.keys.clone(),
        StaticVerifier::Approve.shared(),
    )
    .await?;
    peer.sync_from(thread).await?;
    Ok(peer)
}

#[tokio::test]
async fn moderator_grants_moderator() -> anyhow::Result<()> {
    let m1 = TestIdentity::named("m1");
    let thread = create(&m1, false).await?;

    thread.add_moderator("m2").await?;

    assert!(thread.capabilities().is_moderator("m2"));
    assert_eq!(thread.moderators().len(), 2);
    Ok(())
}

#[tokio::test]
async fn non_moderator_cannot_grant() -> anyhow::Result<()> {
    let m1 = TestIdentity::named("m1");
    let eve = TestIdentity::named("eve");
    let thread = create(&m1, false).await?;
    let eve_view = join(&thread, &eve).await?;

    let err = eve_view.add_moderator("eve").await.unwrap_err();
    assert_eq!(err.grant_denial(), Some(GrantDenial::Refused));
    assert!(!eve_view.capabilities().is_moderator("eve"));
    Ok(())
}

#[tokio::test]
async fn open_thread_accepts_anyone() -> anyhow::Result<()> {
    let m1 = TestIdentity::named("m1");
    let stranger = TestIdentity::named("stranger");
    let thread = create(&m1, false).await?;
    let view = join(&thread, &stranger).await?;

    view.post(&b"hello"[..]).await?;

    let report = thread.replicate_posts_from(&view).await?;
    assert_eq!(report.accepted, 1);
    assert_eq!(thread.posts().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn member_gated_thread_refuses_non_members() -> anyhow::Result<()> {
    let m1 = TestIdentity::named("m1");
    let alice = TestIdentity::named("alice");
    let bob = TestIdentity::named("bob");

    let thread = create(&m1, true).await?;
    thread.add_member("alice").await?;

    let alice_view = join(&thread, &alice).await?;
    let bob_view = join(&thread, &bob).await?;

    alice_view.post(&b"from alice"[..]).await?;

    let err = bob_view.post(&b"from bob"[..]).await.unwrap_err();
    assert!(err.is_access_denied());
    assert!(matches!(err, ThreadError::Store(_)));
    Ok(())
}

#[tokio::test]
async fn authors_delete_their_own_entries_only() -> anyhow::Result<()> {
    let m1 = TestIdentity::named("m1");
    let alice = TestIdentity::named("alice");
    let bob = TestIdentity::named("bob");

    let thread = create(&m1, false).await?;
    let alice_view = join(&thread, &alice).await?;
    let bob_view = join(&thread, &bob).await?;

    let alice_post = alice_view.post(&b"alice"[..]).await?;
    let bob_post = bob_view.post(&b"bob"[..]).await?;
    bob_view.replicate_posts_from(&alice_view).await?;

    bob_view.delete(&bob_post).await?;

    let err = bob_view.delete(&alice_post).await.unwrap_err();
    assert!(err.is_access_denied());

    let visible: Vec<_> = bob_view.posts().await?.into_iter().map(|p| p.hash).collect();
    assert_eq!(visible, vec![alice_post]);
    Ok(())
}

#[tokio::test]
async fn moderators_delete_any_entry() -> anyhow::Result<()> {
    let m1 = TestIdentity::named("m1");
    let alice = TestIdentity::named("alice");

    let thread = create(&m1, false).await?;
    let alice_view = join(&thread, &alice).await?;
    let spam = alice_view.post(&b"spam"[..]).await?;

    thread.replicate_posts_from(&alice_view).await?;
    thread.delete(&spam).await?;
    assert!(thread.posts().await?.is_empty());

    // The deletion replicates back to the author.
    alice_view.replicate_posts_from(&thread).await?;
    assert!(alice_view.posts().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_member_grant_is_denied() -> anyhow::Result<()> {
    let m1 = TestIdentity::named("m1");
    let thread = create(&m1, true).await?;

    thread.grant(Capability::Member, "alice").await?;
    let err = thread.grant(Capability::Member, "alice").await.unwrap_err();

    assert_eq!(err.grant_denial(), Some(GrantDenial::AlreadyGranted));
    assert_eq!(thread.members().len(), 1);
    Ok(())
}

#[tokio::test]
async fn member_capability_is_invalid_on_open_thread() -> anyhow::Result<()> {
    let m1 = TestIdentity::named("m1");
    let thread = create(&m1, false).await?;

    let err = thread.add_member("alice").await.unwrap_err();
    assert_eq!(err.grant_denial(), Some(GrantDenial::InvalidCapability));
    Ok(())
}

#[tokio::test]
async fn failing_verifier_fails_closed() -> anyhow::Result<()> {
    init_tracing();
    let m1 = TestIdentity::named("m1");
    let access = AccessConfig::new("m1");
    let thread = Thread::create(
        ThreadConfig::new("general", access),
        m1.keys.clone(),
        StaticVerifier::Fail.shared(),
    )
    .await?;

    let err = thread.post(&b"hi"[..]).await.unwrap_err();
    assert!(err.is_access_denied());

    let err = thread.add_moderator("m2").await.unwrap_err();
    assert_eq!(err.grant_denial(), Some(GrantDenial::Refused));
    Ok(())
}

#[tokio::test]
async fn missing_bootstrap_moderator_is_a_config_error() {
    let m1 = TestIdentity::named("m1");
    let result = Thread::create(
        ThreadConfig::new("general", AccessConfig::new("")),
        m1.keys.clone(),
        StaticVerifier::Approve.shared(),
    )
    .await;

    assert!(matches!(
        result,
        Err(ThreadError::Access(threadgate::access::AccessError::Config(_)))
    ));
}
