//! Playback instances and the bounded pool that recycles them.

use serde::{Deserialize, Serialize};

use crate::config::LoopSetting;
use crate::data::{FrameDataStore, Transform};
use crate::ids::InstanceId;
use crate::sampling::{sample_particle, FrameCursor};
use crate::scratch::Scratch;
use crate::visual::{VisualFactory, VisualGroup, VisualStyle};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceState {
    Idle,
    Active,
}

/// Result of advancing an instance's clock past the end of a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PassEnd {
    Running,
    /// Another pass begins; carries the new loop count.
    Looped(u32),
    Finished,
}

/// Pick the slot that services a new activation.
///
/// The first idle slot wins. With none idle, the slot with the largest elapsed time
/// is preempted (first one on ties). `None` only for an empty pool.
pub fn select_slot<I>(slots: I) -> Option<usize>
where
    I: IntoIterator<Item = (InstanceState, f32)>,
{
    let mut oldest: Option<(usize, f32)> = None;
    for (i, (state, elapsed)) in slots.into_iter().enumerate() {
        if state == InstanceState::Idle {
            return Some(i);
        }
        match oldest {
            Some((_, best)) if elapsed <= best => {}
            _ => oldest = Some((i, elapsed)),
        }
    }
    oldest.map(|(i, _)| i)
}

/// One concurrently running replay of the animation.
#[derive(Debug)]
pub struct PlaybackInstance<G> {
    id: InstanceId,
    state: InstanceState,
    loop_target: LoopSetting,
    loop_count: u32,
    elapsed_ms: f32,
    /// Particle indices rendered by this run.
    active_subset: Vec<usize>,
    origin: Transform,
    visual: G,
}

impl<G: VisualGroup> PlaybackInstance<G> {
    /// New idle instance with every handle hidden and an identity subset.
    pub fn new(
        id: InstanceId,
        num_particles: usize,
        count: usize,
        loop_target: LoopSetting,
        mut visual: G,
    ) -> Self {
        visual.set_visible(false);
        for p in 0..num_particles {
            visual.set_particle_visible(p, false);
        }
        Self {
            id,
            state: InstanceState::Idle,
            loop_target,
            loop_count: 0,
            elapsed_ms: 0.0,
            active_subset: (0..count.min(num_particles)).collect(),
            origin: Transform::IDENTITY,
            visual,
        }
    }

    #[inline]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> InstanceState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == InstanceState::Active
    }

    #[inline]
    pub fn loop_target(&self) -> LoopSetting {
        self.loop_target
    }

    pub fn set_loop_target(&mut self, loop_target: LoopSetting) {
        self.loop_target = loop_target;
    }

    #[inline]
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    #[inline]
    pub fn active_subset(&self) -> &[usize] {
        &self.active_subset
    }

    #[inline]
    pub fn origin(&self) -> Transform {
        self.origin
    }

    #[inline]
    pub fn visual(&self) -> &G {
        &self.visual
    }

    pub fn into_visual(self) -> G {
        self.visual
    }

    /// (Re)arm for a new run. Whatever was playing is dropped.
    pub fn arm(&mut self, origin: Transform) {
        self.state = InstanceState::Active;
        self.loop_count = 1;
        self.elapsed_ms = 0.0;
        self.origin = origin;
        self.visual.set_visible(true);
        self.visual.set_transform(&origin);
    }

    /// Hide the previous subset, pick a new one and park its handles at their rest state.
    ///
    /// With `count >= num_particles` every handle is reset and no draw happens.
    pub fn reset_subset<D>(
        &mut self,
        store: &FrameDataStore,
        scratch: &mut Scratch,
        count: usize,
        draw: D,
    ) where
        D: FnMut(usize, usize) -> usize,
    {
        let n = store.num_particles();
        if count >= n {
            if self.active_subset.len() != n {
                self.active_subset.clear();
                self.active_subset.extend(0..n);
            }
            for p in 0..n {
                rest_particle(&mut self.visual, store, p);
            }
            return;
        }

        for &p in &self.active_subset {
            self.visual.set_particle_visible(p, false);
        }
        scratch.select_subset(n, count, &mut self.active_subset, draw);
        for &p in &self.active_subset {
            rest_particle(&mut self.visual, store, p);
        }
    }

    /// Write this tick's state of every subset particle to the visual group.
    pub fn write_frame(&mut self, store: &FrameDataStore, cursor: &FrameCursor) {
        for &p in &self.active_subset {
            match sample_particle(store, cursor, p) {
                None => self.visual.set_particle_visible(p, false),
                Some(state) => {
                    self.visual.set_particle_visible(p, true);
                    self.visual.set_particle_position(p, state.position);
                    if let Some(rotation) = state.rotation {
                        self.visual.set_particle_rotation(p, rotation);
                    }
                }
            }
        }
    }

    /// Advance the clock and resolve the end of a pass.
    ///
    /// On a loop the clock restarts at zero; the caller is expected to reset the subset.
    /// On finish the instance goes idle and its group is hidden.
    pub fn advance(&mut self, delta_ms: f32, duration_ms: f32) -> PassEnd {
        self.elapsed_ms += delta_ms;
        if self.elapsed_ms < duration_ms {
            return PassEnd::Running;
        }
        if self.loop_target.continues_after(self.loop_count) {
            self.loop_count = self.loop_count.saturating_add(1);
            self.elapsed_ms = 0.0;
            PassEnd::Looped(self.loop_count)
        } else {
            self.hide();
            PassEnd::Finished
        }
    }

    /// Stop the run and hide the group. Particle handles keep their last state.
    pub fn hide(&mut self) {
        self.state = InstanceState::Idle;
        self.visual.set_visible(false);
    }
}

/// Hide a handle and move it to where the particle first appears.
///
/// `p` is the particle index, not its slot in the subset: each handle rests at its
/// own first-alive state.
fn rest_particle<G: VisualGroup>(visual: &mut G, store: &FrameDataStore, p: usize) {
    visual.set_particle_visible(p, false);
    if let Some(rest) = store.rest_state(p) {
        visual.set_particle_position(p, rest.position);
        if let Some(rotation) = rest.rotation {
            visual.set_particle_rotation(p, rotation);
        }
    }
}

/// Fixed-size set of playback instances, rebuilt on configuration changes.
#[derive(Debug)]
pub struct PlaybackPool<G> {
    instances: Vec<PlaybackInstance<G>>,
    num_particles: usize,
    count: usize,
}

impl<G> Default for PlaybackPool<G> {
    fn default() -> Self {
        Self {
            instances: Vec::new(),
            num_particles: 0,
            count: 0,
        }
    }
}

impl<G: VisualGroup> PlaybackPool<G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every current instance (releasing its group) and allocate `size` idle ones.
    pub fn build<F>(
        &mut self,
        size: usize,
        num_particles: usize,
        count: usize,
        loop_target: LoopSetting,
        style: &VisualStyle,
        factory: &mut F,
    ) where
        F: VisualFactory<Group = G>,
    {
        self.release_into(factory);
        self.instances.reserve_exact(size);
        for i in 0..size {
            let group = factory.create_group(num_particles, style);
            self.instances.push(PlaybackInstance::new(
                InstanceId::from_index(i),
                num_particles,
                count,
                loop_target,
                group,
            ));
        }
        self.num_particles = num_particles;
        self.count = count;
    }

    /// Hand every group back to `factory`, leaving the pool empty.
    pub fn release_into<F>(&mut self, factory: &mut F)
    where
        F: VisualFactory<Group = G>,
    {
        for inst in self.instances.drain(..) {
            factory.release_group(inst.into_visual());
        }
    }

    /// Index of the instance that should service the next activation.
    pub fn acquire_index(&self) -> Option<usize> {
        select_slot(self.instances.iter().map(|i| (i.state, i.elapsed_ms)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    #[inline]
    pub fn num_particles(&self) -> usize {
        self.num_particles
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn active_count(&self) -> usize {
        self.instances.iter().filter(|i| i.is_active()).count()
    }

    pub fn instances(&self) -> &[PlaybackInstance<G>] {
        &self.instances
    }

    pub fn instances_mut(&mut self) -> &mut [PlaybackInstance<G>] {
        &mut self.instances
    }

    pub fn get(&self, id: InstanceId) -> Option<&PlaybackInstance<G>> {
        self.instances.get(id.index())
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut PlaybackInstance<G>> {
        self.instances.get_mut(id.index())
    }
}
