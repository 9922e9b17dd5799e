//! The shared deterministic generator.
//!
//! A 624-word twisted-feedback generator seeded from a single 32-bit value.
//! Both peers draw from identical state, so raw draws never cross the wire,
//! only seeds do.
//!
//! The recurrence deliberately differs from reference MT19937: the twist
//! offset is 697, the final tempering step is `y ^= y >> 1`, and seeding
//! leaves the cursor at word 0 so the first draw tempers the seed word
//! without an initial twist. Live peers generate exactly this sequence;
//! every constant here is wire compatibility, not a tuning knob.

const N: usize = 624;
const M: usize = 697;
const F: u32 = 1_812_433_253;
const A: u32 = 0x9908_B0DF;
const U: u32 = 11;
const S: u32 = 7;
const B: u32 = 0x9D2C_5680;
const T: u32 = 15;
const C: u32 = 0xEFC6_0000;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7FFF_FFFF;

pub struct BattleRng {
    state: Box<[u32; N]>,
    index: usize,
    seed: u32,
}

impl BattleRng {
    /// Create a generator. `None` draws the seed from host randomness;
    /// that is only ever done for the very first seed of a session, never
    /// for a value received from the peer.
    pub fn new(seed: Option<u32>) -> Self {
        let mut rng = Self {
            state: Box::new([0; N]),
            index: 0,
            seed: 0,
        };
        rng.reseed(seed);
        rng
    }

    /// Reinitialize the word array from a seed and return it.
    pub fn reseed(&mut self, seed: Option<u32>) -> u32 {
        let seed = seed.unwrap_or_else(rand::random);
        self.index = 0;
        self.seed = seed;
        self.state[0] = seed;
        for i in 1..N {
            let prev = self.state[i - 1];
            self.state[i] = F
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        seed
    }

    /// The seed last set. Draws do not change this: a peer reasserts
    /// `reseed(self.seed())` right before transmitting, so the value sent
    /// always matches the state the receiver will regenerate.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// A draw in `[0, modulus)`. `modulus` must be nonzero; the float
    /// form of a draw is [`BattleRng::rand_float`].
    pub fn rand(&mut self, modulus: u32) -> u32 {
        debug_assert!(modulus > 0, "use rand_float for modulus 0");
        self.extract() % modulus
    }

    /// A draw in `[0, 1)`.
    pub fn rand_float(&mut self) -> f64 {
        f64::from(self.extract()) / (1u64 << 32) as f64
    }

    fn extract(&mut self) -> u32 {
        if self.index >= N {
            self.twist();
        }
        let mut y = self.state[self.index];
        y ^= y >> U;
        y ^= (y << S) & B;
        y ^= (y << T) & C;
        y ^= y >> 1;
        self.index += 1;
        y
    }

    /// Lazy regeneration, exactly when all 624 words are consumed.
    fn twist(&mut self) {
        for i in 0..N {
            let x = (self.state[i] & UPPER_MASK) | (self.state[(i + 1) % N] & LOWER_MASK);
            let mut x_a = x >> 1;
            if x & 1 != 0 {
                x_a ^= A;
            }
            self.state[i] = self.state[(i + M) % N] ^ x_a;
        }
        self.index = 0;
    }
}

impl std::fmt::Debug for BattleRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleRng")
            .field("seed", &self.seed)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
