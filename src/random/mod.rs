//! Seeded random streams owned by a single simulation.
//!
//! Every consumer of randomness names its own stream with [`define_rng!`]. A stream's
//! generator is created lazily from the simulation's base seed, the stream name and the
//! current day, so that:
//! * streams never share state, and adding draws to one does not perturb another;
//! * the draws of day `d` depend only on `(base_seed, d)`, which lets a simulation restored from
//!   a snapshot continue exactly as the uninterrupted run would have.
mod macros;

use std::any::{Any, TypeId};
use std::fmt::{self, Debug};

pub use macros::define_rng;

use crate::hashing::{hash_str_salted, HashMap};
use crate::rand::distr::uniform::{SampleRange, SampleUniform};
use crate::rand::distr::Distribution;
use crate::rand::{Rng, SeedableRng};
use crate::state::Day;
use crate::trace;

pub trait RngId: Copy + Clone {
    type RngType: SeedableRng + Rng + 'static;
    fn get_name() -> &'static str;
}

// A wrapper that allows for different types of random number generators per stream
// (anything that implements SeedableRng is valid).
struct RngHolder {
    rng: Box<dyn Any>,
}

/// The random source of one simulation. See the module documentation.
pub struct RandomSource {
    base_seed: u64,
    day: Day,
    rng_holders: HashMap<TypeId, RngHolder>,
}

impl RandomSource {
    #[must_use]
    pub fn new(base_seed: u64) -> Self {
        RandomSource {
            base_seed,
            day: 0,
            rng_holders: HashMap::default(),
        }
    }

    #[must_use]
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// The day the current generators were derived for.
    #[must_use]
    pub fn day(&self) -> Day {
        self.day
    }

    /// Drops every generator so the next draw of each stream is re-derived for `day`.
    pub fn reseed_for_day(&mut self, day: Day) {
        trace!("reseeding random streams for day {day}");
        self.day = day;
        self.rng_holders.clear();
    }

    /// Gets a mutable reference to the generator of the stream `R`, creating it on first use.
    pub fn get_rng<R: RngId + 'static>(&mut self, _rng_id: R) -> &mut R::RngType {
        let base_seed = self.base_seed;
        let day = self.day;
        self.rng_holders
            .entry(TypeId::of::<R>())
            .or_insert_with(|| {
                let seed = hash_str_salted(R::get_name(), base_seed, u64::from(day));
                trace!(
                    "creating new RNG {} for day {} (seed={})",
                    R::get_name(),
                    day,
                    seed
                );
                RngHolder {
                    rng: Box::new(R::RngType::seed_from_u64(seed)),
                }
            })
            .rng
            .downcast_mut::<R::RngType>()
            .expect("RNG holder keyed by the type id of its RngId")
    }

    /// Gets a random sample from the stream `R` by applying the specified sampler function.
    pub fn sample<R: RngId + 'static, T>(
        &mut self,
        rng_id: R,
        sampler: impl FnOnce(&mut R::RngType) -> T,
    ) -> T {
        sampler(self.get_rng(rng_id))
    }

    /// Gets a random sample from the specified distribution using the stream `R`.
    pub fn sample_distr<R: RngId + 'static, T>(
        &mut self,
        rng_id: R,
        distribution: impl Distribution<T>,
    ) -> T {
        distribution.sample(self.get_rng(rng_id))
    }

    /// Gets a random sample within the range provided by `range` using the stream `R`.
    pub fn sample_range<R: RngId + 'static, S, T>(&mut self, rng_id: R, range: S) -> T
    where
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample(rng_id, |rng| rng.random_range(range))
    }

    /// Draws a uniform value in `[0, 1)` from the stream `R`.
    pub fn sample_unit<R: RngId + 'static>(&mut self, rng_id: R) -> f64 {
        self.sample(rng_id, |rng| rng.random::<f64>())
    }
}

// A clone keeps the seed and day but starts every stream afresh. Clones are only taken
// between days, before any stream of the next day has been drawn from.
impl Clone for RandomSource {
    fn clone(&self) -> Self {
        RandomSource {
            base_seed: self.base_seed,
            day: self.day,
            rng_holders: HashMap::default(),
        }
    }
}

impl Debug for RandomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomSource")
            .field("base_seed", &self.base_seed)
            .field("day", &self.day)
            .field("streams", &self.rng_holders.len())
            .finish()
    }
}
