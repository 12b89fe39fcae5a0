//! Seeded synthetic corpus generator.
//!
//! A [`Generator`] is anchored to an explicit seed and an explicit "now".
//! Two generators built from the same pair produce identical records. Each
//! record draws from its own RNG stream keyed on (seed, stream, index), so
//! record `i` can be regenerated without generating `0..i` first.

pub mod catalog;
mod incidents;
mod runs;
mod scenarios;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::model::{IncidentDetail, Run, Scenario, ScenarioDetail};

pub use catalog::scenario_catalog;
pub use runs::find_run;
pub(crate) use runs::round2;
pub use scenarios::{default_steps, MAX_VERSION_HISTORY};

/// Default seed used when a caller does not pick one.
pub const DEFAULT_SEED: u64 = 42;

/// Independent RNG streams. Adding a stream must not renumber existing ones.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Stream {
    Run = 1,
    RunDetail = 2,
    Incident = 3,
    Confidence = 4,
}

/// Number of records of each kind in a generated corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSize {
    pub runs: usize,
    pub scenarios: usize,
    pub incidents: usize,
}

impl Default for CorpusSize {
    fn default() -> Self {
        Self {
            runs: 50,
            scenarios: 24,
            incidents: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Generator {
    seed: u64,
    now: OffsetDateTime,
}

impl Generator {
    pub fn new(seed: u64, now: OffsetDateTime) -> Self {
        Self { seed, now }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn now(&self) -> OffsetDateTime {
        self.now
    }

    pub(crate) fn rng(&self, stream: Stream, key: u64) -> StdRng {
        stream_rng(self.seed, stream, key)
    }
}

pub(crate) fn stream_rng(seed: u64, stream: Stream, key: u64) -> StdRng {
    let mixed = seed
        ^ (stream as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ key.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    StdRng::seed_from_u64(mixed)
}

/// FNV-1a over the bytes of an id, for keying streams on string ids.
pub(crate) fn key_of(id: &str) -> u64 {
    id.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

pub(crate) fn run_id(index: usize) -> String {
    format!("run-{:04}", index + 1)
}

/// The full set of generated collections, in generation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Corpus {
    pub catalog: Vec<Scenario>,
    pub runs: Vec<Run>,
    pub scenarios: Vec<ScenarioDetail>,
    pub incidents: Vec<IncidentDetail>,
}

impl Corpus {
    pub fn generate(generator: &Generator, size: &CorpusSize) -> Self {
        Self {
            catalog: scenario_catalog(),
            runs: (0..size.runs).map(|i| generator.generate_run(i)).collect(),
            scenarios: (0..size.scenarios)
                .map(|i| generator.generate_scenario(i))
                .collect(),
            incidents: (0..size.incidents)
                .map(|i| generator.generate_incident_detail(i, size.runs))
                .collect(),
        }
    }
}
