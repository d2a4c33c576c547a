//! Simulated register source for running without an RS-485 adapter

use crate::client::RegisterReader;
use crate::error::ModbusError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

/// Values drawn in random mode; mostly nominal, sometimes an error
const RANDOM_CODES: [u16; 4] = [0, 0, 101, 202];

/// Register reader backed by a script or by pseudo-random codes
pub struct MockRegisterReader {
    /// Per-station queue of scripted reads; `None` marks a failed read
    script: HashMap<u8, VecDeque<Option<u16>>>,
    /// Draw from [`RANDOM_CODES`] when a station has no script
    random: bool,
    /// Mixed into the hash so consecutive reads differ
    reads: u64,
}

impl MockRegisterReader {
    /// Create a reader that replays fixed values per station.
    ///
    /// Once a station's script is exhausted it reads as nominal.
    pub fn scripted() -> Self {
        Self {
            script: HashMap::new(),
            random: false,
            reads: 0,
        }
    }

    /// Create a reader that returns random codes, for demo runs
    pub fn random() -> Self {
        info!("Creating mock register reader with random codes");
        Self {
            random: true,
            ..Self::scripted()
        }
    }

    /// Queue register values for a station
    pub fn with_values(mut self, station: u8, values: impl IntoIterator<Item = u16>) -> Self {
        self.script
            .entry(station)
            .or_default()
            .extend(values.into_iter().map(Some));
        self
    }

    /// Queue a failed read for a station
    pub fn with_failure(mut self, station: u8) -> Self {
        self.script.entry(station).or_default().push_back(None);
        self
    }

    fn random_code(&mut self, station: u8) -> u16 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let timestamp_ns = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        let mut hasher = DefaultHasher::new();
        timestamp_ns.hash(&mut hasher);
        station.hash(&mut hasher);
        self.reads.hash(&mut hasher);
        RANDOM_CODES[(hasher.finish() % RANDOM_CODES.len() as u64) as usize]
    }
}

#[async_trait]
impl RegisterReader for MockRegisterReader {
    async fn read_input_register(&mut self, station: u8, _address: u16) -> Result<u16, ModbusError> {
        self.reads += 1;

        if let Some(next) = self.script.get_mut(&station).and_then(VecDeque::pop_front) {
            return next.ok_or(ModbusError::Timeout {
                station,
                timeout_ms: 0,
            });
        }

        let code = if self.random { self.random_code(station) } else { 0 };
        debug!("Mock station {} -> {}", station, code);
        Ok(code)
    }
}
