//! Scoped rate limiting for command nodes
//!
//! Admission is a single check-and-set per key: per-key state lives in a
//! [`DashMap`] entry (shard lock held for the comparison and the write) and
//! the global slot sits behind a mutex. Two concurrent calls for the same key
//! can therefore never both be admitted inside one window.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::context::{CommandContext, GuildId, UserId};
use crate::limits::MAX_COOLDOWN;

/// Key space a cooldown is partitioned by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScope {
    #[default]
    None,
    Global,
    User,
    Guild,
}

/// Time source for cooldown windows
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }
}

enum CooldownState {
    None,
    Global(Mutex<Option<Instant>>),
    Keyed(DashMap<u64, Instant>),
}

/// Rate limiter attached to a command node
pub struct Cooldown {
    scope: CooldownScope,
    duration: Duration,
    clock: Arc<dyn Clock>,
    state: CooldownState,
}

impl Cooldown {
    /// The no-op cooldown; every check passes
    pub fn none() -> Self {
        Self {
            scope: CooldownScope::None,
            duration: Duration::ZERO,
            clock: Arc::new(SystemClock),
            state: CooldownState::None,
        }
    }

    pub fn new(scope: CooldownScope, duration: Duration) -> Self {
        Self::with_clock(scope, duration, Arc::new(SystemClock))
    }

    pub fn with_clock(scope: CooldownScope, duration: Duration, clock: Arc<dyn Clock>) -> Self {
        let state = match scope {
            CooldownScope::None => CooldownState::None,
            CooldownScope::Global => CooldownState::Global(Mutex::new(None)),
            CooldownScope::User | CooldownScope::Guild => CooldownState::Keyed(DashMap::new()),
        };
        Self {
            scope,
            duration,
            clock,
            state,
        }
    }

    pub fn scope(&self) -> CooldownScope {
        self.scope
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_none(&self) -> bool {
        self.scope == CooldownScope::None
    }

    /// Admit the invocation and open a new window, or refuse it
    pub fn should_execute(&self, ctx: &CommandContext) -> bool {
        self.admit(ctx.user_id(), ctx.guild_id())
    }

    /// [`Cooldown::should_execute`] for callers holding raw identifiers
    pub fn admit(&self, user_id: UserId, guild_id: Option<GuildId>) -> bool {
        let now = self.clock.now();
        match &self.state {
            CooldownState::None => true,
            CooldownState::Global(slot) => {
                let mut expiry = slot.lock();
                match *expiry {
                    Some(until) if now < until => false,
                    _ => {
                        *expiry = Some(self.expiry_from(now));
                        true
                    }
                }
            }
            CooldownState::Keyed(expiries) => {
                let Some(key) = self.key(user_id, guild_id) else {
                    return true;
                };
                match expiries.entry(key) {
                    Entry::Occupied(mut entry) => {
                        if now >= *entry.get() {
                            entry.insert(self.expiry_from(now));
                            true
                        } else {
                            false
                        }
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(self.expiry_from(now));
                        true
                    }
                }
            }
        }
    }

    /// Time left in the current window for this context, if any
    pub fn remaining(&self, ctx: &CommandContext) -> Option<Duration> {
        let now = self.clock.now();
        let until = match &self.state {
            CooldownState::None => None,
            CooldownState::Global(slot) => *slot.lock(),
            CooldownState::Keyed(expiries) => self
                .key(ctx.user_id(), ctx.guild_id())
                .and_then(|key| expiries.get(&key).map(|entry| *entry)),
        }?;
        until.checked_duration_since(now).filter(|left| !left.is_zero())
    }

    /// Forget every open window
    pub fn clear_all(&self) {
        match &self.state {
            CooldownState::None => {}
            CooldownState::Global(slot) => *slot.lock() = None,
            CooldownState::Keyed(expiries) => expiries.clear(),
        }
    }

    /// Drop keys whose window has already closed
    pub fn evict_expired(&self) -> usize {
        let CooldownState::Keyed(expiries) = &self.state else {
            return 0;
        };
        let now = self.clock.now();
        let before = expiries.len();
        expiries.retain(|_, until| *until > now);
        before - expiries.len()
    }

    /// Number of keys currently tracked
    pub fn tracked(&self) -> usize {
        match &self.state {
            CooldownState::None => 0,
            CooldownState::Global(slot) => usize::from(slot.lock().is_some()),
            CooldownState::Keyed(expiries) => expiries.len(),
        }
    }

    /// End of a window opened at `now`; saturates at the limit when the
    /// duration is not representable on this platform's clock
    fn expiry_from(&self, now: Instant) -> Instant {
        now.checked_add(self.duration)
            .or_else(|| now.checked_add(MAX_COOLDOWN))
            .unwrap_or(now)
    }

    fn key(&self, user_id: UserId, guild_id: Option<GuildId>) -> Option<u64> {
        match self.scope {
            CooldownScope::User => Some(user_id),
            CooldownScope::Guild => guild_id,
            CooldownScope::None | CooldownScope::Global => None,
        }
    }
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Cooldown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cooldown")
            .field("scope", &self.scope)
            .field("duration", &self.duration)
            .field("tracked", &self.tracked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(10);

    fn limiter(scope: CooldownScope) -> (Cooldown, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (Cooldown::with_clock(scope, WINDOW, clock.clone()), clock)
    }

    #[test]
    fn test_none_always_executes() {
        let cooldown = Cooldown::none();
        assert!(cooldown.is_none());
        for _ in 0..5 {
            assert!(cooldown.admit(1, Some(1)));
        }
        assert_eq!(cooldown.tracked(), 0);
    }

    #[test]
    fn test_per_user_window() {
        let (cooldown, clock) = limiter(CooldownScope::User);

        assert!(cooldown.admit(1, None));
        assert!(!cooldown.admit(1, None));
        assert!(cooldown.admit(2, None));

        clock.advance(WINDOW);
        assert!(cooldown.admit(1, None));
        assert!(!cooldown.admit(1, None));
    }

    #[test]
    fn test_global_window_is_shared() {
        let (cooldown, clock) = limiter(CooldownScope::Global);

        assert!(cooldown.admit(1, Some(1)));
        assert!(!cooldown.admit(2, Some(2)));

        clock.advance(WINDOW - Duration::from_millis(1));
        assert!(!cooldown.admit(3, None));

        clock.advance(Duration::from_millis(1));
        assert!(cooldown.admit(3, None));
    }

    #[test]
    fn test_per_guild_outside_guild_always_passes() {
        let (cooldown, _clock) = limiter(CooldownScope::Guild);

        assert!(cooldown.admit(1, None));
        assert!(cooldown.admit(1, None));
        assert_eq!(cooldown.tracked(), 0);

        assert!(cooldown.admit(1, Some(9)));
        assert!(!cooldown.admit(2, Some(9)));
        assert!(cooldown.admit(2, Some(10)));
    }

    #[test]
    fn test_zero_duration_never_blocks() {
        let cooldown = Cooldown::with_clock(
            CooldownScope::User,
            Duration::ZERO,
            Arc::new(ManualClock::new()),
        );
        assert!(cooldown.admit(1, None));
        assert!(cooldown.admit(1, None));
    }

    #[test]
    fn test_remaining_counts_down() {
        let (cooldown, clock) = limiter(CooldownScope::User);
        let ctx = CommandContext::builder(4).build();

        assert_eq!(cooldown.remaining(&ctx), None);
        assert!(cooldown.should_execute(&ctx));
        assert_eq!(cooldown.remaining(&ctx), Some(WINDOW));

        clock.advance(Duration::from_secs(4));
        assert_eq!(cooldown.remaining(&ctx), Some(Duration::from_secs(6)));

        clock.advance(Duration::from_secs(6));
        assert_eq!(cooldown.remaining(&ctx), None);
    }

    #[test]
    fn test_clear_all_reopens_every_key() {
        let (cooldown, _clock) = limiter(CooldownScope::User);
        assert!(cooldown.admit(1, None));
        assert!(cooldown.admit(2, None));
        assert_eq!(cooldown.tracked(), 2);

        cooldown.clear_all();
        assert_eq!(cooldown.tracked(), 0);
        assert!(cooldown.admit(1, None));

        let (global, _clock) = limiter(CooldownScope::Global);
        assert!(global.admit(1, None));
        global.clear_all();
        assert!(global.admit(1, None));
    }

    #[test]
    fn test_evict_expired_keeps_open_windows() {
        let (cooldown, clock) = limiter(CooldownScope::User);
        assert!(cooldown.admit(1, None));
        clock.advance(Duration::from_secs(5));
        assert!(cooldown.admit(2, None));
        clock.advance(Duration::from_secs(5));

        assert_eq!(cooldown.evict_expired(), 1);
        assert_eq!(cooldown.tracked(), 1);
        assert!(!cooldown.admit(2, None));
    }

    #[test]
    fn test_concurrent_same_key_admits_once() {
        let (cooldown, _clock) = limiter(CooldownScope::User);
        let cooldown = Arc::new(cooldown);

        let admitted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let cooldown = Arc::clone(&cooldown);
                    scope.spawn(move || usize::from(cooldown.admit(77, None)))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(admitted, 1);
    }

    #[test]
    fn test_unrepresentable_duration_saturates() {
        let clock = Arc::new(ManualClock::new());
        for scope in [CooldownScope::User, CooldownScope::Global] {
            let cooldown = Cooldown::with_clock(scope, Duration::MAX, clock.clone());
            assert!(cooldown.admit(1, None));
            assert!(!cooldown.admit(1, None));

            let ctx = CommandContext::builder(1).build();
            assert!(cooldown.remaining(&ctx).is_some_and(|left| left <= MAX_COOLDOWN));
        }
    }
}

