//! ParticlePlayer: owns the decoded animation, the instance pool and the per-tick driver.
//!
//! Methods:
//! - new / with_seed, configure, load_animation (atomic rebuild)
//! - activate (immediate or delayed start)
//! - update (deliver events, fire due starts, sample and advance every active instance)

use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::config::{PlayerConfig, INIT_TRIGGER};
use crate::data::{FrameDataStore, Transform};
use crate::error::PlayerError;
use crate::ids::InstanceId;
use crate::outputs::{CoreEvent, Outputs};
use crate::pool::{PassEnd, PlaybackPool};
use crate::sampling::{frame_cursor, should_interpolate};
use crate::scratch::Scratch;
use crate::stored_animation::ParticleAnimation;
use crate::visual::{VisualFactory, VisualStyle};

/// What an activation request turned into.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    Started {
        instance: InstanceId,
        preempted: bool,
    },
    /// Queued; the instance is acquired by the first update after the delay elapses.
    Scheduled { delay_ms: u32 },
    /// No instance could be acquired (empty pool).
    Dropped,
}

#[derive(Clone, Debug)]
struct PendingStart {
    remaining_ms: f32,
    origin: Option<Transform>,
}

/// Everything derived from (config, animation) before it is committed.
struct Prepared {
    store: FrameDataStore,
    style: VisualStyle,
    count: usize,
    cache: usize,
}

impl Prepared {
    fn build(cfg: &PlayerConfig, animation: &ParticleAnimation) -> Result<Self, PlayerError> {
        cfg.validate()?;
        let store = FrameDataStore::decode(animation, cfg.scale)?;
        let style = VisualStyle::resolve(cfg, &store)?;
        let n = store.num_particles();
        let requested = cfg.count.requested(n);
        let count = cfg.count.resolve(n);
        if requested != count as i64 {
            warn!(
                "particle count {} ({requested}) clamped to {count} ({n} available)",
                cfg.count
            );
        }
        let cache = if cfg.cache == 0 {
            warn!("cache of 0 instances clamped to 1");
            1
        } else {
            cfg.cache
        };
        Ok(Self {
            store,
            style,
            count,
            cache,
        })
    }
}

/// Keyframe particle player bound to one visual factory.
///
/// Single-threaded: `activate` and `update` are expected to be called from the same
/// tick loop. Nothing here blocks; a tick costs O(pool size x particles).
pub struct ParticlePlayer<F: VisualFactory> {
    cfg: PlayerConfig,
    animation: ParticleAnimation,
    store: FrameDataStore,
    style: VisualStyle,
    count: usize,

    factory: F,
    pool: PlaybackPool<F::Group>,
    scratch: Scratch,
    rng: Pcg64Mcg,

    pending: Vec<PendingStart>,
    /// Events raised outside update(), delivered with the next update's outputs.
    queued: Vec<CoreEvent>,
    outputs: Outputs,
}

impl<F: VisualFactory> ParticlePlayer<F> {
    /// Build a player with an entropy-seeded RNG for subset selection.
    pub fn new(
        factory: F,
        cfg: PlayerConfig,
        animation: ParticleAnimation,
    ) -> Result<Self, PlayerError> {
        Self::with_rng(factory, cfg, animation, Pcg64Mcg::from_entropy())
    }

    /// Build a player whose subset selection is reproducible.
    pub fn with_seed(
        factory: F,
        cfg: PlayerConfig,
        animation: ParticleAnimation,
        seed: u64,
    ) -> Result<Self, PlayerError> {
        Self::with_rng(factory, cfg, animation, Pcg64Mcg::seed_from_u64(seed))
    }

    fn with_rng(
        factory: F,
        cfg: PlayerConfig,
        animation: ParticleAnimation,
        rng: Pcg64Mcg,
    ) -> Result<Self, PlayerError> {
        let prepared = Prepared::build(&cfg, &animation)?;
        let mut player = Self {
            cfg,
            animation,
            store: prepared.store,
            style: prepared.style,
            count: prepared.count,
            factory,
            pool: PlaybackPool::new(),
            scratch: Scratch::default(),
            rng,
            pending: Vec::new(),
            queued: Vec::new(),
            outputs: Outputs::default(),
        };
        player.rebuild_pool(prepared.cache);
        player.autostart();
        Ok(player)
    }

    /// Reseed the subset RNG.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Pcg64Mcg::seed_from_u64(seed);
    }

    /// Apply a new configuration against the current animation.
    /// On error nothing changes.
    pub fn configure(&mut self, cfg: PlayerConfig) -> Result<(), PlayerError> {
        self.apply(cfg, None)
    }

    /// Replace the animation, keeping the current configuration.
    /// On error nothing changes.
    pub fn load_animation(&mut self, animation: ParticleAnimation) -> Result<(), PlayerError> {
        self.apply(self.cfg.clone(), Some(animation))
    }

    fn apply(
        &mut self,
        cfg: PlayerConfig,
        animation: Option<ParticleAnimation>,
    ) -> Result<(), PlayerError> {
        let prepared = Prepared::build(&cfg, animation.as_ref().unwrap_or(&self.animation))?;

        let rebuild = prepared.cache != self.pool.len()
            || prepared.store.num_particles() != self.store.num_particles()
            || prepared.count != self.count
            || prepared.style != self.style;

        self.store = prepared.store;
        self.style = prepared.style;
        self.count = prepared.count;
        if let Some(animation) = animation {
            self.animation = animation;
        }
        self.cfg = cfg;

        if rebuild {
            self.rebuild_pool(prepared.cache);
        } else {
            debug!("reconfigured without rebuilding the pool");
            let loop_target = self.cfg.loop_setting;
            for inst in self.pool.instances_mut() {
                inst.set_loop_target(loop_target);
            }
        }
        self.autostart();
        Ok(())
    }

    fn rebuild_pool(&mut self, cache: usize) {
        let n = self.store.num_particles();
        debug!(
            "building pool: {cache} instances x {n} particles ({} per run, {} frames)",
            self.count,
            self.store.num_frames()
        );
        self.scratch.reserve(n);
        self.pool.build(
            cache,
            n,
            self.count,
            self.cfg.loop_setting,
            &self.style,
            &mut self.factory,
        );
    }

    fn autostart(&mut self) {
        if self.cfg.on == INIT_TRIGGER {
            self.activate(None);
        }
    }

    /// Request a run at `origin` (identity when `None`).
    ///
    /// With a configured delay the request is queued and serviced by a later
    /// `update`, against whatever pool exists at that time.
    pub fn activate(&mut self, origin: Option<Transform>) -> Activation {
        if self.cfg.delay_ms > 0 {
            self.pending.push(PendingStart {
                remaining_ms: self.cfg.delay_ms as f32,
                origin,
            });
            return Activation::Scheduled {
                delay_ms: self.cfg.delay_ms,
            };
        }
        self.start_now(origin)
    }

    fn start_now(&mut self, origin: Option<Transform>) -> Activation {
        let Some(idx) = self.pool.acquire_index() else {
            warn!("activation dropped: playback pool is empty");
            return Activation::Dropped;
        };
        let Some(inst) = self.pool.get_mut(InstanceId::from_index(idx)) else {
            return Activation::Dropped;
        };

        let preempted = inst.is_active();
        if preempted {
            debug!(
                "preempting instance {} at {:.1} ms (pass {})",
                idx,
                inst.elapsed_ms(),
                inst.loop_count()
            );
        }
        inst.arm(origin.unwrap_or_default());
        let rng = &mut self.rng;
        inst.reset_subset(&self.store, &mut self.scratch, self.count, |lo, hi| {
            rng.gen_range(lo..hi)
        });

        let instance = inst.id();
        self.queued.push(CoreEvent::Started {
            instance,
            preempted,
        });
        Activation::Started {
            instance,
            preempted,
        }
    }

    fn fire_due_starts(&mut self, delta_ms: f32) {
        if self.pending.is_empty() {
            return;
        }
        let mut due = Vec::new();
        self.pending.retain_mut(|p| {
            p.remaining_ms -= delta_ms;
            if p.remaining_ms <= 0.0 {
                due.push(p.origin);
                false
            } else {
                true
            }
        });
        for origin in due {
            debug!("delayed activation firing");
            self.start_now(origin);
        }
    }

    /// Step every active instance by `delta_ms`.
    ///
    /// Order per instance: sample at the current elapsed time, write transforms,
    /// then advance the clock and resolve loop/finish.
    pub fn update(&mut self, delta_ms: f32) -> &Outputs {
        let delta_ms = delta_ms.max(0.0);
        self.outputs.clear();

        self.fire_due_starts(delta_ms);
        self.outputs.events.append(&mut self.queued);

        let duration = self.cfg.duration_ms as f32;
        let num_frames = self.store.num_frames();
        let interpolate = should_interpolate(self.cfg.interpolate, duration, num_frames, delta_ms);

        let rng = &mut self.rng;
        for inst in self.pool.instances_mut() {
            if !inst.is_active() {
                continue;
            }
            let cursor = frame_cursor(inst.elapsed_ms(), duration, num_frames, interpolate);
            inst.write_frame(&self.store, &cursor);

            match inst.advance(delta_ms, duration) {
                PassEnd::Running => {}
                PassEnd::Looped(loop_count) => {
                    self.outputs.push_event(CoreEvent::Loop {
                        instance: inst.id(),
                        loop_count,
                    });
                    inst.reset_subset(&self.store, &mut self.scratch, self.count, |lo, hi| {
                        rng.gen_range(lo..hi)
                    });
                }
                PassEnd::Finished => {
                    self.outputs.push_event(CoreEvent::Finished {
                        instance: inst.id(),
                    });
                }
            }
        }

        &self.outputs
    }

    /// Stop every run and hide its group; pending delayed starts are dropped.
    pub fn stop_all(&mut self) {
        self.pending.clear();
        for inst in self.pool.instances_mut() {
            if inst.is_active() {
                inst.hide();
            }
        }
    }

    /// Release every pool group back to the factory and hand the factory back.
    pub fn into_factory(mut self) -> F {
        self.pool.release_into(&mut self.factory);
        self.factory
    }

    /// Outputs of the most recent update.
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.cfg
    }

    pub fn animation(&self) -> &ParticleAnimation {
        &self.animation
    }

    pub fn store(&self) -> &FrameDataStore {
        &self.store
    }

    pub fn style(&self) -> &VisualStyle {
        &self.style
    }

    pub fn pool(&self) -> &PlaybackPool<F::Group> {
        &self.pool
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Particles shown per run after clamping.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Host event name that should call [`Self::activate`].
    pub fn trigger(&self) -> &str {
        &self.cfg.on
    }

    /// Delayed activations not yet fired.
    pub fn pending_starts(&self) -> usize {
        self.pending.len()
    }
}
