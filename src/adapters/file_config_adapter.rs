//! INI file configuration adapter.

use crate::domain::params::{PARAMS_SECTION, ParamMap};
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// Parameter overrides from the `[params]` section of an optional file.
    ///
    /// A missing or unreadable file yields no overrides, so the strategy runs
    /// on its built-in defaults.
    pub fn load_params(path: Option<&Path>) -> ParamMap {
        let Some(path) = path else {
            return ParamMap::new();
        };
        match Self::from_file(path) {
            Ok(adapter) => adapter.params(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "params file unreadable, using defaults");
                ParamMap::new()
            }
        }
    }

    pub fn params(&self) -> ParamMap {
        ParamMap::from_config(self, PARAMS_SECTION)
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }

    fn keys(&self, section: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::params::ParamValue;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[backtest]
initial_capital = 1000.0
fee_rate = 0.01

[strategy]
name = sma_cross
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("strategy", "name"),
            Some("sma_cross".to_string())
        );
        assert_eq!(adapter.get_double("backtest", "fee_rate", 0.0), 0.01);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[backtest]\ninitial_capital = 100\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn numeric_getters_fall_back_on_bad_values() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nwarmup = abc\ninitial_capital = lots\n").unwrap();
        assert_eq!(adapter.get_int("backtest", "warmup", 42), 42);
        assert_eq!(adapter.get_double("backtest", "initial_capital", 99.9), 99.9);
        assert_eq!(adapter.get_int("backtest", "missing", 7), 7);
    }

    #[test]
    fn get_bool_values() {
        let adapter =
            FileConfigAdapter::from_string("[params]\na = true\nb = no\nc = 1\nd = maybe\n").unwrap();
        assert!(adapter.get_bool("params", "a", false));
        assert!(!adapter.get_bool("params", "b", true));
        assert!(adapter.get_bool("params", "c", false));
        assert!(adapter.get_bool("params", "d", true));
        assert!(!adapter.get_bool("params", "missing", false));
    }

    #[test]
    fn keys_are_sorted_and_empty_for_missing_section() {
        let adapter =
            FileConfigAdapter::from_string("[params]\nslow_period = 20\nfast_period = 5\n").unwrap();
        assert_eq!(adapter.keys("params"), vec!["fast_period", "slow_period"]);
        assert!(adapter.keys("nothing").is_empty());
    }

    #[test]
    fn params_section_becomes_param_map() {
        let adapter = FileConfigAdapter::from_string(
            "[params]\nfast_period = 3\nbuy_on_dip = true\nlabel = fancy\n",
        )
        .unwrap();
        let params = adapter.params();
        assert_eq!(params.get("fast_period"), Some(ParamValue::Number(3.0)));
        assert_eq!(params.get("buy_on_dip"), Some(ParamValue::Bool(true)));
        // not a number or flag
        assert!(!params.contains("label"));
    }

    #[test]
    fn load_params_reads_file() {
        let file = create_temp_config("[params]\nstop_loss = 0.07\n");
        let params = FileConfigAdapter::load_params(Some(file.path()));
        assert_eq!(params.number("stop_loss", 0.0), 0.07);
    }

    #[test]
    fn load_params_falls_back_to_defaults() {
        assert!(FileConfigAdapter::load_params(None).is_empty());
        let missing = Path::new("/nonexistent/path/params.ini");
        assert!(FileConfigAdapter::load_params(Some(missing)).is_empty());
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        assert!(FileConfigAdapter::from_file("/nonexistent/path/config.ini").is_err());
    }
}
