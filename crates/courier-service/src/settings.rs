//! Configuration loading.
//!
//! Sources, later ones overriding earlier ones:
//!  1. `/etc/commit-courier/service.yaml`
//!  2. `./config/service.yaml`
//!  3. the file named by `COURIER_CONFIG_FILE`, when set
//!  4. `COURIER__`-prefixed environment variables, e.g.
//!     `COURIER__SERVER__PORT=9090` sets `server.port`
//!
//! Every field has a default, so missing files yield a usable config. A
//! malformed file or an uncoercible variable is an error.

use config::{Config, ConfigError, Environment, File, FileFormat};
use courier_api::ServiceConfig;

/// Variable naming an operator-supplied config file.
pub const CONFIG_FILE_ENV: &str = "COURIER_CONFIG_FILE";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "COURIER";

pub fn load(explicit_path: Option<&str>) -> Result<ServiceConfig, ConfigError> {
    let mut builder = Config::builder()
        .add_source(
            File::with_name("/etc/commit-courier/service")
                .required(false)
                .format(FileFormat::Yaml),
        )
        .add_source(
            File::with_name("config/service")
                .required(false)
                .format(FileFormat::Yaml),
        );

    if let Some(path) = explicit_path.filter(|path| !path.is_empty()) {
        builder = builder.add_source(File::with_name(path).required(true).format(FileFormat::Yaml));
    }

    builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
