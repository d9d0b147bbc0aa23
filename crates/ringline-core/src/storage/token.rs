//! Device push-token storage.
//!
//! The push transport hands the process a registration token on (re)issue;
//! it is persisted so a later delivery path can re-associate the device.
//! One token, one flat file under the data directory.

use std::io;
use std::path::{Path, PathBuf};

use super::data_dir;

const TOKEN_FILE: &str = "device_token";

/// Flat-file store for the device push token.
pub struct DeviceTokenStore {
    path: PathBuf,
}

impl DeviceTokenStore {
    /// Store under the default data directory.
    pub fn open() -> io::Result<Self> {
        Ok(Self::at(&data_dir()?))
    }

    /// Store under an explicit directory.
    pub fn at(dir: &Path) -> Self {
        Self {
            path: dir.join(TOKEN_FILE),
        }
    }

    /// The stored token, if any. A missing file is `None`, not an error.
    pub fn get(&self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(token) => {
                let token = token.trim().to_string();
                Ok((!token.is_empty()).then_some(token))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn set(&self, token: &str) -> io::Result<()> {
        std::fs::write(&self.path, token)
    }

    /// Remove the stored token. Absent is not an error.
    pub fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}
