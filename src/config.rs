use std::{env, path::PathBuf};

use crate::{Error, Level, Result};

const DISABLE_ACCELERATED_VAR: &str = "ZLIB_STREAM_DISABLE_ACCELERATED";
const NATIVE_LIBRARY_VAR: &str = "ZLIB_STREAM_NATIVE_LIBRARY";
const LEVEL_VAR: &str = "ZLIB_STREAM_LEVEL";

/// Settings used by [`Zlib::new`](crate::Zlib::new) to select a backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Never try to load the native library, always use the fallback backend.
    pub disable_accelerated: bool,
    /// Load the native library from this path instead of the platform default name.
    pub native_library: Option<PathBuf>,
    /// Level new compressors use.
    pub level: Level,
}

impl Config {
    /// Read the configuration from the process environment.
    ///
    ///  Variable | Option
    /// ----------|-------
    ///  `ZLIB_STREAM_DISABLE_ACCELERATED` | `disable-accelerated`
    ///  `ZLIB_STREAM_NATIVE_LIBRARY` | `native-library`
    ///  `ZLIB_STREAM_LEVEL` | `level`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        for (var, option) in [
            (DISABLE_ACCELERATED_VAR, "disable-accelerated"),
            (NATIVE_LIBRARY_VAR, "native-library"),
            (LEVEL_VAR, "level"),
        ] {
            if let Some(value) = env::var_os(var) {
                let value = value
                    .into_string()
                    .map_err(|_| Error::Config(format!("{var} is not valid unicode")))?;
                config.set_option(option, &value)?;
            }
        }
        Ok(config)
    }

    /// Apply a named option.
    ///
    /// Recognized names are `disable-accelerated` (a boolean), `native-library` (a path) and
    /// `level` (`fastest`, `best`, `default` or `0` to `9`).
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "disable-accelerated" => self.disable_accelerated = parse_bool(value)?,
            "native-library" => self.native_library = Some(PathBuf::from(value)),
            "level" => self.level = value.parse()?,
            _ => return Err(Error::Config(format!("unknown option {name:?}"))),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::Config(format!("expected a boolean, got {value:?}"))),
    }
}
