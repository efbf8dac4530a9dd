//! Scratch buffers reused across activations.
//!
//! Holds the index pool for subset selection. Owned by the player and borrowed
//! mutably only from the single-threaded reset path, so it is never used reentrantly.

#[derive(Debug, Default)]
pub struct Scratch {
    index_pool: Vec<usize>,
}

impl Scratch {
    pub fn new(num_particles: usize) -> Self {
        Self {
            index_pool: Vec::with_capacity(num_particles),
        }
    }

    /// Grow the index pool to hold `num_particles` without reallocating later.
    pub fn reserve(&mut self, num_particles: usize) {
        if self.index_pool.capacity() < num_particles {
            self.index_pool
                .reserve_exact(num_particles - self.index_pool.len());
        }
    }

    /// Choose `count` distinct indices out of `0..num_particles` into `subset`.
    ///
    /// Partial Fisher-Yates over the index pool: for slots `0..count-1` draw
    /// `r = draw(i, num_particles)` in `[i, num_particles)` and swap it into place;
    /// the last slot takes whatever sits at `count-1` without a draw.
    pub fn select_subset<D>(
        &mut self,
        num_particles: usize,
        count: usize,
        subset: &mut Vec<usize>,
        mut draw: D,
    ) where
        D: FnMut(usize, usize) -> usize,
    {
        let count = count.min(num_particles);
        self.index_pool.clear();
        self.index_pool.extend(0..num_particles);
        subset.clear();
        if count == 0 {
            return;
        }
        for i in 0..count - 1 {
            let r = draw(i, num_particles).clamp(i, num_particles - 1);
            self.index_pool.swap(i, r);
            subset.push(self.index_pool[i]);
        }
        subset.push(self.index_pool[count - 1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_slot_is_taken_without_a_draw() {
        let mut scratch = Scratch::new(5);
        let mut subset = Vec::new();
        let mut draws = Vec::new();
        scratch.select_subset(5, 3, &mut subset, |lo, hi| {
            draws.push((lo, hi));
            hi - 1
        });
        assert_eq!(draws, vec![(0, 5), (1, 5)]);
        // [0,1,2,3,4] -> swap(0,4) -> [4,1,2,3,0] -> swap(1,4) -> [4,0,2,3,1]
        assert_eq!(subset, vec![4, 0, 2]);
    }

    #[test]
    fn single_slot_never_draws() {
        let mut scratch = Scratch::new(4);
        let mut subset = vec![3];
        scratch.select_subset(4, 1, &mut subset, |_, _| panic!("no draw expected"));
        assert_eq!(subset, vec![0]);
    }

    #[test]
    fn zero_count_clears_subset() {
        let mut scratch = Scratch::new(4);
        let mut subset = vec![1, 2];
        scratch.select_subset(4, 0, &mut subset, |lo, _| lo);
        assert!(subset.is_empty());
    }

    #[test]
    fn identity_draws_keep_order() {
        let mut scratch = Scratch::new(6);
        let mut subset = Vec::new();
        scratch.select_subset(6, 4, &mut subset, |lo, _| lo);
        assert_eq!(subset, vec![0, 1, 2, 3]);
    }

    #[test]
    fn out_of_range_draws_are_clamped() {
        let mut scratch = Scratch::new(3);
        let mut subset = Vec::new();
        scratch.select_subset(3, 3, &mut subset, |_, _| 99);
        let mut sorted = subset.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
    }

    #[test]
    fn buffer_is_reused() {
        let mut scratch = Scratch::new(8);
        let cap = scratch.index_pool.capacity();
        let mut subset = Vec::with_capacity(4);
        for _ in 0..10 {
            scratch.select_subset(8, 4, &mut subset, |lo, hi| (lo + hi) / 2);
        }
        assert_eq!(scratch.index_pool.capacity(), cap);
    }
}
