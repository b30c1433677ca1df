//! Filesystem-backed override store.
//!
//! # Responsibilities
//! - Own the spool root and the record files under it
//! - Answer `status` / `is_up` by reading records on every call
//! - Create and remove records for operators
//!
//! # Design Decisions
//! - A missing record is `OverrideState::Up`; any other I/O failure is an error
//! - File handles are scoped to a single call and released on every path

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::spool::record::{is_valid_service, ServiceStatus, ALL_SERVICES};

/// Permission bits for a freshly created spool root.
const ROOT_MODE: u32 = 0o750;

/// Prefix of the scratch file used to test write access.
const WRITE_PROBE_PREFIX: &str = ".hacheck-write-probe-";

/// The spool root cannot be used.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("spool root {path:?} is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("no write access to spool root {path:?}: {source}")]
    NotWritable { path: PathBuf, source: io::Error },

    #[error("failed to create spool root {path:?}: {source}")]
    Create { path: PathBuf, source: io::Error },
}

/// Errors from reading or writing override records.
#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("invalid service name {0:?}")]
    InvalidService(String),

    #[error("override record {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("override lookup did not complete: {0}")]
    Lookup(#[from] tokio::task::JoinError),
}

/// Handle to a configured override store.
///
/// The only way to obtain one is [`Spool::configure`], so every store
/// operation runs against a validated root.
#[derive(Debug, Clone)]
pub struct Spool {
    root: PathBuf,
}

impl Spool {
    /// Designate `root` as the storage root.
    ///
    /// An existing root must be a writable directory. A missing root is
    /// created with mode `0750`.
    pub fn configure(root: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let root = root.as_ref().to_path_buf();

        match fs::metadata(&root) {
            Ok(meta) => {
                if !meta.is_dir() {
                    return Err(ConfigurationError::NotADirectory { path: root });
                }
                check_writable(&root)?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                create_root(&root)?;
                tracing::info!(root = ?root, "Created spool root");
            }
            Err(source) => {
                return Err(ConfigurationError::NotWritable { path: root, source });
            }
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the record for `service` only, ignoring the host-wide override.
    pub fn status(&self, service: &str) -> Result<ServiceStatus, SpoolError> {
        let path = self.record_path(service)?;

        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(ServiceStatus::up(service));
            }
            Err(source) => return Err(SpoolError::Io { path, source }),
        };

        let mut raw = Vec::new();
        file.read_to_end(&mut raw)
            .map_err(|source| SpoolError::Io { path, source })?;

        Ok(ServiceStatus::down(
            service,
            String::from_utf8_lossy(&raw).into_owned(),
        ))
    }

    /// Effective state of `service`.
    ///
    /// A down `all` record is returned as-is without looking at the
    /// service's own record.
    pub fn is_up(&self, service: &str) -> Result<ServiceStatus, SpoolError> {
        let all = self.status(ALL_SERVICES)?;
        if !all.is_up() {
            return Ok(all);
        }
        self.status(service)
    }

    /// [`Spool::is_up`] run on the blocking pool, for async callers.
    pub async fn lookup(&self, service: &str) -> Result<ServiceStatus, SpoolError> {
        let spool = self.clone();
        let service = service.to_string();
        tokio::task::spawn_blocking(move || spool.is_up(&service)).await?
    }

    /// Remove the override for `service`. Missing records are fine.
    pub fn mark_up(&self, service: &str) -> Result<(), SpoolError> {
        let path = self.record_path(service)?;

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(service = %service, "Override removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SpoolError::Io { path, source }),
        }
    }

    /// Create or overwrite the override for `service`.
    pub fn mark_down(&self, service: &str, reason: &str) -> Result<(), SpoolError> {
        let path = self.record_path(service)?;

        let mut file = File::create(&path).map_err(|source| SpoolError::Io {
            path: path.clone(),
            source,
        })?;
        file.write_all(reason.as_bytes())
            .map_err(|source| SpoolError::Io { path, source })?;

        tracing::info!(service = %service, reason = %reason, "Override set");
        Ok(())
    }

    /// Every service currently overridden down, sorted by name.
    pub fn list_down(&self) -> Result<Vec<ServiceStatus>, SpoolError> {
        let entries = fs::read_dir(&self.root).map_err(|source| SpoolError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| SpoolError::Io {
                path: self.root.clone(),
                source,
            })?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if is_file && is_valid_service(&name) && !name.starts_with(WRITE_PROBE_PREFIX) {
                names.push(name);
            }
        }
        names.sort();

        let mut down = Vec::with_capacity(names.len());
        for name in names {
            let status = self.status(&name)?;
            // Removed between listing and reading.
            if !status.is_up() {
                down.push(status);
            }
        }
        Ok(down)
    }

    fn record_path(&self, service: &str) -> Result<PathBuf, SpoolError> {
        if !is_valid_service(service) {
            return Err(SpoolError::InvalidService(service.to_string()));
        }
        Ok(self.root.join(service))
    }
}

fn check_writable(root: &Path) -> Result<(), ConfigurationError> {
    let probe = root.join(format!("{}{}", WRITE_PROBE_PREFIX, std::process::id()));

    let result = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&probe);

    match result {
        Ok(file) => {
            drop(file);
            let _ = fs::remove_file(&probe);
            Ok(())
        }
        Err(source) => Err(ConfigurationError::NotWritable {
            path: root.to_path_buf(),
            source,
        }),
    }
}

#[cfg(unix)]
fn create_root(root: &Path) -> Result<(), ConfigurationError> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    let create_err = |source| ConfigurationError::Create {
        path: root.to_path_buf(),
        source,
    };

    fs::DirBuilder::new()
        .mode(ROOT_MODE)
        .create(root)
        .map_err(create_err)?;
    // umask may have stripped bits.
    fs::set_permissions(root, fs::Permissions::from_mode(ROOT_MODE)).map_err(create_err)
}

#[cfg(not(unix))]
fn create_root(root: &Path) -> Result<(), ConfigurationError> {
    let _ = ROOT_MODE;
    fs::create_dir(root).map_err(|source| ConfigurationError::Create {
        path: root.to_path_buf(),
        source,
    })
}
