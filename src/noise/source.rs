use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of ambient level readings, one value per call
pub trait NoiseSource: Send {
    fn sample_db(&mut self) -> f32;
}

impl<S: NoiseSource + ?Sized> NoiseSource for Box<S> {
    fn sample_db(&mut self) -> f32 {
        (**self).sample_db()
    }
}

/// Uniformly random levels in `[0, max_db)`
pub struct SimulatedNoiseSource {
    rng: StdRng,
    max_db: f32,
}

impl SimulatedNoiseSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            max_db: 60.0,
        }
    }

    /// Reproducible sequence
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_db: 60.0,
        }
    }
}

impl Default for SimulatedNoiseSource {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseSource for SimulatedNoiseSource {
    fn sample_db(&mut self) -> f32 {
        self.rng.gen_range(0.0..self.max_db)
    }
}

/// Replays a fixed list of levels, cycling when exhausted
#[derive(Debug, Clone)]
pub struct ScriptedNoiseSource {
    levels: Vec<f32>,
    position: usize,
}

impl ScriptedNoiseSource {
    pub fn new(levels: Vec<f32>) -> Self {
        Self {
            levels,
            position: 0,
        }
    }

    /// Same level for every sample
    pub fn constant(db: f32) -> Self {
        Self::new(vec![db])
    }

    /// Number of samples handed out so far
    pub fn samples_taken(&self) -> usize {
        self.position
    }
}

impl NoiseSource for ScriptedNoiseSource {
    fn sample_db(&mut self) -> f32 {
        if self.levels.is_empty() {
            return 0.0;
        }
        let db = self.levels[self.position % self.levels.len()];
        self.position += 1;
        db
    }
}
