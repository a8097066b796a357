use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Command line and environment options for the native binary.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub config_path: PathBuf,
    /// Overrides the config file's placement seed.
    pub seed: Option<u64>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            seed: None,
        }
    }
}

impl LaunchOptions {
    pub fn from_env_args() -> Result<Self> {
        Self::from_iter(
            std::env::args_os().skip(1),
            std::env::var_os("GRASS_FIELD_SEED"),
        )
    }

    fn from_iter<I>(args: I, env_seed: Option<OsString>) -> Result<Self>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut options = Self::default();

        if let Some(value) = env_seed {
            options.seed = Some(parse_seed(&value).context("GRASS_FIELD_SEED")?);
        }

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            let arg_str = arg.to_string_lossy();
            match arg_str.as_ref() {
                "--seed" => {
                    let Some(value) = iter.next() else {
                        return Err(anyhow!("--seed requires a value"));
                    };
                    options.seed = Some(parse_seed(&value).context("--seed")?);
                }
                "--config" => {
                    let Some(value) = iter.next() else {
                        return Err(anyhow!("--config requires a value"));
                    };
                    options.config_path = PathBuf::from(value);
                }
                other => log::warn!("ignoring unknown argument {other}"),
            }
        }

        Ok(options)
    }
}

fn parse_seed(value: &std::ffi::OsStr) -> Result<u64> {
    let text = value.to_string_lossy();
    text.trim()
        .parse()
        .map_err(|e| anyhow!("invalid seed {text:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::LaunchOptions;
    use std::ffi::OsString;
    use std::path::Path;

    fn args(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[test]
    fn defaults_to_unseeded_config_json() {
        let parsed = LaunchOptions::from_iter(Vec::<OsString>::new(), None).unwrap();
        assert_eq!(parsed.seed, None);
        assert_eq!(parsed.config_path, Path::new("config.json"));
    }

    #[test]
    fn cli_sets_seed_and_config() {
        let parsed =
            LaunchOptions::from_iter(args(&["--config", "field.json", "--seed", "42"]), None)
                .unwrap();
        assert_eq!(parsed.seed, Some(42));
        assert_eq!(parsed.config_path, Path::new("field.json"));
    }

    #[test]
    fn cli_seed_overrides_env() {
        let parsed =
            LaunchOptions::from_iter(args(&["--seed", "7"]), Some(OsString::from("3"))).unwrap();
        assert_eq!(parsed.seed, Some(7));

        let parsed = LaunchOptions::from_iter(Vec::<OsString>::new(), Some(OsString::from(" 3 ")))
            .unwrap();
        assert_eq!(parsed.seed, Some(3));
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(LaunchOptions::from_iter(args(&["--seed"]), None).is_err());
        assert!(LaunchOptions::from_iter(args(&["--seed", "grass"]), None).is_err());
        assert!(LaunchOptions::from_iter(args(&["--config"]), None).is_err());
        assert!(LaunchOptions::from_iter(Vec::<OsString>::new(), Some(OsString::from("-1"))).is_err());
    }
}
