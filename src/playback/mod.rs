//! Keeps at most one media element playing at a time.
//!
//! Players register a handle while mounted. Before starting playback a
//! player calls [`PlaybackCoordinator::request_play`], which pauses every
//! other registered handle that is currently playing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::app::Result;

/// Anything that can report and stop its own playback.
pub trait MediaHandle {
    fn is_playing(&self) -> bool;

    fn pause(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

type Registry = HashMap<RegistrationId, Weak<dyn MediaHandle + Send + Sync>>;

#[derive(Default)]
pub struct PlaybackCoordinator {
    handles: Arc<Mutex<Registry>>,
    next_id: AtomicU64,
}

impl PlaybackCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle to the active set. The coordinator keeps only a weak
    /// reference; the owner removes it through the returned registration.
    pub fn register(&self, handle: &Arc<dyn MediaHandle + Send + Sync>) -> Registration {
        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.handles).insert(id, Arc::downgrade(handle));

        Registration {
            id,
            registry: Arc::downgrade(&self.handles),
        }
    }

    /// Pause every other registered handle that reports itself as playing.
    ///
    /// Does not start the requester. Returns how many handles were paused.
    pub fn request_play(&self, requester: RegistrationId) -> usize {
        // Snapshot first so a handle's pause can touch the registry
        let others: Vec<(RegistrationId, Arc<dyn MediaHandle + Send + Sync>)> =
            lock(&self.handles)
                .iter()
                .filter(|(id, _)| **id != requester)
                .filter_map(|(id, handle)| handle.upgrade().map(|h| (*id, h)))
                .collect();

        let mut paused = 0;
        for (id, handle) in others {
            if !handle.is_playing() {
                continue;
            }
            match handle.pause() {
                Ok(()) => paused += 1,
                Err(e) => tracing::warn!("Failed to pause player {:?}: {}", id, e),
            }
        }
        paused
    }

    pub fn active_count(&self) -> usize {
        lock(&self.handles).len()
    }
}

/// Membership of one handle in the active set.
///
/// Call [`unregister`](Self::unregister) on teardown; dropping the
/// registration has the same effect.
#[derive(Debug)]
pub struct Registration {
    id: RegistrationId,
    registry: Weak<Mutex<Registry>>,
}

impl Registration {
    pub fn id(&self) -> RegistrationId {
        self.id
    }

    pub fn unregister(self) {}
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).remove(&self.id);
        }
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::EddyError;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    #[derive(Default)]
    struct FakePlayer {
        playing: AtomicBool,
        pauses: AtomicUsize,
        broken: bool,
    }

    impl FakePlayer {
        fn playing() -> Arc<Self> {
            Arc::new(Self {
                playing: AtomicBool::new(true),
                ..Self::default()
            })
        }

        fn idle() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn broken() -> Arc<Self> {
            Arc::new(Self {
                playing: AtomicBool::new(true),
                broken: true,
                ..Self::default()
            })
        }

        fn pauses(&self) -> usize {
            self.pauses.load(Ordering::SeqCst)
        }
    }

    impl MediaHandle for FakePlayer {
        fn is_playing(&self) -> bool {
            self.playing.load(Ordering::SeqCst)
        }

        fn pause(&self) -> Result<()> {
            self.pauses.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(EddyError::Other("player detached".into()));
            }
            self.playing.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    fn as_handle(player: &Arc<FakePlayer>) -> Arc<dyn MediaHandle + Send + Sync> {
        player.clone()
    }

    #[test]
    fn test_request_play_pauses_others() {
        let coordinator = PlaybackCoordinator::new();
        let (a, b, c) = (FakePlayer::playing(), FakePlayer::playing(), FakePlayer::idle());
        let (ha, hb, hc) = (as_handle(&a), as_handle(&b), as_handle(&c));
        let _ra = coordinator.register(&ha);
        let _rb = coordinator.register(&hb);
        let rc = coordinator.register(&hc);

        assert_eq!(coordinator.request_play(rc.id()), 2);
        assert_eq!(a.pauses(), 1);
        assert_eq!(b.pauses(), 1);
        assert_eq!(c.pauses(), 0);
        assert!(!a.is_playing());
        assert!(!b.is_playing());
    }

    #[test]
    fn test_requester_is_never_paused() {
        let coordinator = PlaybackCoordinator::new();
        let a = FakePlayer::playing();
        let ha = as_handle(&a);
        let ra = coordinator.register(&ha);

        assert_eq!(coordinator.request_play(ra.id()), 0);
        assert_eq!(a.pauses(), 0);
        assert!(a.is_playing());
    }

    #[test]
    fn test_idle_handles_are_left_alone() {
        let coordinator = PlaybackCoordinator::new();
        let (a, b) = (FakePlayer::idle(), FakePlayer::idle());
        let (ha, hb) = (as_handle(&a), as_handle(&b));
        let _ra = coordinator.register(&ha);
        let rb = coordinator.register(&hb);

        assert_eq!(coordinator.request_play(rb.id()), 0);
        assert_eq!(a.pauses(), 0);
    }

    #[test]
    fn test_failing_pause_does_not_stop_the_rest() {
        let coordinator = PlaybackCoordinator::new();
        let broken = FakePlayer::broken();
        let others: Vec<_> = (0..3).map(|_| FakePlayer::playing()).collect();
        let requester = FakePlayer::idle();

        let hb = as_handle(&broken);
        let _rb = coordinator.register(&hb);
        let handles: Vec<_> = others.iter().map(as_handle).collect();
        let _regs: Vec<_> = handles.iter().map(|h| coordinator.register(h)).collect();
        let hr = as_handle(&requester);
        let rr = coordinator.register(&hr);

        assert_eq!(coordinator.request_play(rr.id()), 3);
        assert_eq!(broken.pauses(), 1);
        assert!(others.iter().all(|p| p.pauses() == 1));
    }

    #[test]
    fn test_unregister_removes_handle() {
        let coordinator = PlaybackCoordinator::new();
        let (a, b) = (FakePlayer::playing(), FakePlayer::idle());
        let (ha, hb) = (as_handle(&a), as_handle(&b));
        let ra = coordinator.register(&ha);
        let rb = coordinator.register(&hb);
        assert_eq!(coordinator.active_count(), 2);

        ra.unregister();
        assert_eq!(coordinator.active_count(), 1);
        assert_eq!(coordinator.request_play(rb.id()), 0);
        assert_eq!(a.pauses(), 0);
    }

    #[test]
    fn test_registration_does_not_keep_player_alive() {
        let coordinator = PlaybackCoordinator::new();
        let a = FakePlayer::playing();
        let ha = as_handle(&a);
        let _ra = coordinator.register(&ha);
        let b = FakePlayer::idle();
        let hb = as_handle(&b);
        let rb = coordinator.register(&hb);

        drop(ha);
        drop(a);
        assert_eq!(coordinator.request_play(rb.id()), 0);
    }

    #[test]
    fn test_registration_outliving_coordinator() {
        let coordinator = PlaybackCoordinator::new();
        let a = FakePlayer::idle();
        let ha = as_handle(&a);
        let ra = coordinator.register(&ha);
        drop(coordinator);
        ra.unregister();
    }
}
