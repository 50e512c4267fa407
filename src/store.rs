//! Persistent protocol-counter storage.
//!
//! A small versioned JSON file holding the last issued protocol number.
//! Missing, corrupt or version-mismatched files fall back to the default
//! (the allocator then starts the year at 0001).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const STORE_FILE_NAME: &str = "counter.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterStore {
    version: u32,
    pub last_protocol_number: Option<String>,
}

impl CounterStore {
    const CURRENT_VERSION: u32 = 1;

    pub fn store_path(dir: &Path) -> PathBuf {
        dir.join(STORE_FILE_NAME)
    }

    pub fn load(dir: &Path) -> Self {
        let store_path = Self::store_path(dir);
        if !store_path.exists() {
            return Self::default();
        }

        let file = match File::open(&store_path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        let reader = BufReader::new(file);
        match serde_json::from_reader(reader) {
            Ok(store) => {
                let store: CounterStore = store;
                if store.version != Self::CURRENT_VERSION {
                    eprintln!("nekompatibilní verze čítače, začínám znovu");
                    return Self::default();
                }
                store
            }
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let file = File::create(Self::store_path(dir))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Remove the stored counter. Returns whether a file existed.
    pub fn clear(dir: &Path) -> Result<bool> {
        let store_path = Self::store_path(dir);
        if store_path.exists() {
            std::fs::remove_file(store_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

impl Default for CounterStore {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            last_protocol_number: None,
        }
    }
}
