mod logging;

pub use logging::init_logging;

use json_dns_domain::config::CliOverrides;
use json_dns_domain::Config;

pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    Config::load(path, overrides).map_err(|e| anyhow::anyhow!("Configuration error: {}", e))
}
