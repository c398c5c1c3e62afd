//! Greeter configuration.
//!
//! The defaults reproduce the classic demo: rank 0 distributes with tag 11.
//! Both can be overridden from the environment:
//!
//! | Variable        | Field  | Default |
//! |-----------------|--------|---------|
//! | `HELLOMPI_ROOT` | `root` | `0`     |
//! | `HELLOMPI_TAG`  | `tag`  | `11`    |

use crate::error::{Error, Result};
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

/// Rank that builds and distributes the payload.
pub const DEFAULT_ROOT: i32 = 0;

/// Tag correlating the distribution sends with their receives.
pub const DEFAULT_TAG: i32 = 11;

/// Largest tag every MPI implementation must accept (`MPI_TAG_UB` >= 32767).
pub const MAX_TAG: i32 = 32767;

/// Environment variable overriding [`GreeterConfig::root`].
pub const ROOT_VAR: &str = "HELLOMPI_ROOT";

/// Environment variable overriding [`GreeterConfig::tag`].
pub const TAG_VAR: &str = "HELLOMPI_TAG";

/// Settings for [`Greeter`](crate::Greeter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreeterConfig {
    /// Rank that sends the payload.
    pub root: i32,
    /// Tag used for the payload messages.
    pub tag: i32,
}

impl Default for GreeterConfig {
    fn default() -> Self {
        GreeterConfig {
            root: DEFAULT_ROOT,
            tag: DEFAULT_TAG,
        }
    }
}

impl GreeterConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read overrides through `lookup`, which returns the value of a variable
    /// if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = GreeterConfig::default();
        if let Some(root) = parse_var(&lookup, ROOT_VAR)? {
            config.root = root;
        }
        if let Some(tag) = parse_var(&lookup, TAG_VAR)? {
            config.tag = tag;
        }
        config.check_ranges()?;
        Ok(config)
    }

    /// Check both fields against the group they will run in.
    ///
    /// A negative root matches no rank and would leave every member waiting
    /// on a receive.
    pub fn validate(&self, size: i32) -> Result<()> {
        self.check_ranges()?;
        if self.root >= size {
            return Err(Error::Config(format!(
                "root rank {} is outside a group of {} processes",
                self.root, size
            )));
        }
        Ok(())
    }

    fn check_ranges(&self) -> Result<()> {
        if self.root < 0 {
            return Err(Error::Config(format!(
                "root rank must be >= 0, got {}",
                self.root
            )));
        }
        // MPI guarantees tags up to 32767
        if !(0..=MAX_TAG).contains(&self.tag) {
            return Err(Error::Config(format!(
                "tag must be in 0..={MAX_TAG}, got {}",
                self.tag
            )));
        }
        Ok(())
    }
}

/// Parse an optional random seed given on the command line.
///
/// Without one, the seed comes from the wall clock, so separate runs draw
/// different numbers.
pub fn parse_seed(arg: Option<&str>) -> Result<u64> {
    match arg {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("seed is not a non-negative integer: {raw:?}"))),
        None => Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default()),
    }
}

fn parse_var<F>(lookup: &F, key: &str) -> Result<Option<i32>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} is not an integer: {raw:?}"))),
    }
}
