//! Shared fixtures for the cross crate tests in `tests/`

use std::path::{Path, PathBuf};

/// Serial capture mixing valid lines, a malformed one and a note
pub const SERIAL_CAPTURE: [&str; 3] = [
    "40.0,6.5,SIM,NAO,0",
    "not,a,valid,line",
    "35.5,7.1,NAO,SIM,1,manual note",
];

pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// Scratch directory under the system temp dir, removed on drop
pub struct Scratch {
    dir: PathBuf,
}

impl Scratch {
    pub fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("farm-tests-{name}-{}", std::process::id()));
        if let Err(e) = std::fs::create_dir_all(&dir) {
            log::error!("Unable to create scratch dir {}: {e:}", dir.display());
        }
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.dir).ok();
    }
}
