use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use slashwork_commands::*;

fn clocked(scope: CooldownScope, seconds: u64) -> (Cooldown, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let cooldown = Cooldown::with_clock(scope, Duration::from_secs(seconds), clock.clone());
    (cooldown, clock)
}

#[test]
fn test_user_scope_window() {
    let (cooldown, clock) = clocked(CooldownScope::User, 10);
    let alice = CommandContext::builder(1).build();
    let bob = CommandContext::builder(2).build();

    assert!(cooldown.should_execute(&alice));
    assert!(!cooldown.should_execute(&alice));
    assert!(cooldown.should_execute(&bob));

    clock.advance(Duration::from_secs(4));
    assert_eq!(cooldown.remaining(&alice), Some(Duration::from_secs(6)));

    clock.advance(Duration::from_secs(6));
    assert!(cooldown.should_execute(&alice));
}

#[test]
fn test_guild_scope_shares_window_inside_guild() {
    let (cooldown, _clock) = clocked(CooldownScope::Guild, 10);
    let first = CommandContext::builder(1).guild(100).build();
    let second = CommandContext::builder(2).guild(100).build();
    let elsewhere = CommandContext::builder(2).guild(200).build();

    assert!(cooldown.should_execute(&first));
    assert!(!cooldown.should_execute(&second));
    assert!(cooldown.should_execute(&elsewhere));
}

#[test]
fn test_global_scope_blocks_everyone() {
    let (cooldown, clock) = clocked(CooldownScope::Global, 5);

    assert!(cooldown.admit(1, None));
    assert!(!cooldown.admit(2, Some(100)));
    clock.advance(Duration::from_secs(5));
    assert!(cooldown.admit(3, None));
}

#[test]
fn test_none_scope_never_blocks() {
    let cooldown = Cooldown::none();
    let ctx = CommandContext::builder(1).build();

    assert!(cooldown.is_none());
    for _ in 0..10 {
        assert!(cooldown.should_execute(&ctx));
    }
    assert_eq!(cooldown.remaining(&ctx), None);
}

#[test]
fn test_evict_expired_and_clear() {
    let (cooldown, clock) = clocked(CooldownScope::User, 10);
    for user in 0..5 {
        assert!(cooldown.admit(user, None));
    }
    assert_eq!(cooldown.tracked(), 5);

    clock.advance(Duration::from_secs(10));
    assert!(cooldown.admit(99, None));
    assert_eq!(cooldown.evict_expired(), 5);
    assert_eq!(cooldown.tracked(), 1);

    cooldown.clear_all();
    assert_eq!(cooldown.tracked(), 0);
}

#[test]
fn test_concurrent_admission_is_single() {
    let (cooldown, _clock) = clocked(CooldownScope::User, 60);
    let cooldown = Arc::new(cooldown);
    let admitted = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cooldown = Arc::clone(&cooldown);
            let admitted = Arc::clone(&admitted);
            std::thread::spawn(move || {
                if cooldown.admit(7, None) {
                    admitted.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(admitted.load(Ordering::SeqCst), 1);
}

#[test]
fn test_registry_clear_cooldowns_resets_nodes() {
    let def = CommandBuilder::new("daily", "Daily reward")
        .root(NodeBuilder::new("daily", "Daily reward").cooldown(CooldownScope::User, Duration::from_secs(3600)))
        .executes(|_ctx| async { Ok(()) })
        .build()
        .unwrap();
    let dispatcher = Dispatcher::builder().command(def).build().unwrap();
    let run = || {
        tokio_test::block_on(dispatcher.dispatch("daily", None, None, CommandContext::builder(1).build()))
    };

    assert_eq!(run(), DispatchOutcome::Completed);
    assert_eq!(run(), DispatchOutcome::CooldownActive);

    dispatcher.registry().clear_cooldowns();
    assert_eq!(run(), DispatchOutcome::Completed);
}

#[test]
fn test_unrepresentable_cooldown_is_refused_at_build() {
    let result = CommandBuilder::new("forever", "Never again")
        .root(NodeBuilder::new("forever", "Never again").cooldown(CooldownScope::Global, Duration::MAX))
        .executes(|_ctx| async { Ok(()) })
        .build();
    assert!(matches!(result, Err(error) if error.is_configuration()));

    let direct = Cooldown::new(CooldownScope::Global, Duration::MAX);
    assert!(direct.admit(1, None));
    assert!(!direct.admit(2, None));
}
