// Credential persistence.
//
// A credential is only ever replaced wholesale -- there is no partial
// update. The file layout is one file per device address so concurrent
// writers for different switches never contend; same-address writers are
// serialized by the atomic rename.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::RwLock;

use tracing::debug;

use crate::error::Error;
use crate::model::Model;

/// A session token together with the model it was issued for.
///
/// The model matters because the token's presentation differs by family:
/// a cookie header on 30x devices, a request parameter on 316 devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub model: Model,
}

impl Credential {
    pub fn new(token: impl Into<String>, model: Model) -> Self {
        Self {
            token: token.into(),
            model,
        }
    }
}

/// Storage for per-address credentials.
///
/// `delete` is idempotent: removing an entry that doesn't exist is not an
/// error. `get` distinguishes a plain miss ([`Error::TokenNotFound`]) from
/// stale and corrupt persisted state so callers know whether to log in
/// fresh or surface a diagnostic.
pub trait TokenStore: Send + Sync + fmt::Debug {
    fn get(&self, address: &str) -> Result<Credential, Error>;
    fn store(&self, address: &str, credential: &Credential) -> Result<(), Error>;
    fn delete(&self, address: &str) -> Result<(), Error>;
}

// ── In-memory store ─────────────────────────────────────────────────

/// Process-lifetime credential store backed by a locked map.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, Credential>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, address: &str) -> Result<Credential, Error> {
        self.entries
            .read()
            .expect("token map lock poisoned")
            .get(address)
            .cloned()
            .ok_or_else(|| Error::TokenNotFound {
                address: address.to_owned(),
            })
    }

    fn store(&self, address: &str, credential: &Credential) -> Result<(), Error> {
        self.entries
            .write()
            .expect("token map lock poisoned")
            .insert(address.to_owned(), credential.clone());
        Ok(())
    }

    fn delete(&self, address: &str) -> Result<(), Error> {
        self.entries
            .write()
            .expect("token map lock poisoned")
            .remove(address);
        Ok(())
    }
}

// ── File-backed store ───────────────────────────────────────────────

/// Durable store: one `token-<hash>` file per device address under
/// `<root>/.config/plusctl/`, containing a single `model:token` line.
///
/// The address hash is FNV-1a/32 -- fast and stable, not a security
/// boundary. A collision between two addresses would surface as one
/// overwriting the other's file, detectable on the next `get`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    root: PathBuf,
}

const TOKEN_SUBDIR: &str = ".config/plusctl";

impl FileTokenStore {
    /// Store rooted at `root`. The token files land in
    /// `<root>/.config/plusctl/`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the OS temp directory, the historical default.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    fn dir(&self) -> PathBuf {
        self.root.join(TOKEN_SUBDIR)
    }

    fn token_path(&self, address: &str) -> PathBuf {
        self.dir().join(format!("token-{}", fnv1a32(address.as_bytes())))
    }

    fn parse_entry(address: &str, contents: &str) -> Result<Credential, Error> {
        if contents.is_empty() {
            return Err(Error::StaleToken {
                address: address.to_owned(),
            });
        }
        if !contents.contains(':') {
            return Err(Error::CorruptToken {
                address: address.to_owned(),
            });
        }

        // model:token, with any further colon-delimited segments ignored.
        let mut fields = contents.split(':');
        let model_str = fields.next().unwrap_or_default().trim();
        let token = fields.next().unwrap_or_default().trim();

        let model = Model::from_str(model_str).map_err(|_| Error::UnsupportedModel {
            model: model_str.to_owned(),
        })?;
        if token.is_empty() {
            return Err(Error::StaleToken {
                address: address.to_owned(),
            });
        }

        Ok(Credential::new(token, model))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, address: &str) -> Result<Credential, Error> {
        let path = self.token_path(address);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::TokenNotFound {
                    address: address.to_owned(),
                });
            }
            Err(err) => {
                return Err(Error::Store {
                    message: format!("failed to read {}", path.display()),
                    source: err,
                });
            }
        };
        Self::parse_entry(address, &contents)
    }

    fn store(&self, address: &str, credential: &Credential) -> Result<(), Error> {
        let dir = self.dir();
        std::fs::create_dir_all(&dir).map_err(|err| Error::Store {
            message: format!("failed to create {}", dir.display()),
            source: err,
        })?;

        let path = self.token_path(address);
        let contents = format!("{}:{}", credential.model, credential.token);

        // Write to a sibling temp file, then rename into place. Readers
        // never observe a partially written entry.
        let tmp = path.with_extension(format!("{}.tmp", std::process::id()));
        write_private(&tmp, &contents).map_err(|err| Error::Store {
            message: format!("failed to write {}", tmp.display()),
            source: err,
        })?;
        std::fs::rename(&tmp, &path).map_err(|err| Error::Store {
            message: format!("failed to replace {}", path.display()),
            source: err,
        })?;

        debug!("stored credential for {} at {}", address, path.display());
        Ok(())
    }

    fn delete(&self, address: &str) -> Result<(), Error> {
        let path = self.token_path(address);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Store {
                message: format!("failed to delete {}", path.display()),
                source: err,
            }),
        }
    }
}

/// Write `contents` to `path` readable by the owning user only.
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    std::fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// FNV-1a, 32-bit. Stable across runs and platforms.
fn fnv1a32(data: &[u8]) -> u32 {
    let mut hash = 0x811c_9dc5_u32;
    for byte in data {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}
