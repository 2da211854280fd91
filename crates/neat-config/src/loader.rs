// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, NeatConfig, UnmatchedGenePolicy};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "neat_configuration.toml";

/// Find the NEAT configuration file
///
/// Search order:
/// 1. `NEAT_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neat_configuration.toml`
/// 3. Parent directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NEAT_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by NEAT_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "NEAT configuration file '{}' not found in any of these locations:\n{}\n\nSet NEAT_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides keyed by `section.field`
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, or a CLI
/// override can not be applied
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeatConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NeatConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: config_file.clone(),
            message: e.to_string(),
        })?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEAT_POP_SIZE` -> `population.pop_size`
/// - `NEAT_COMPAT_THRESHOLD` -> `population.compat_threshold`
/// - `NEAT_MAX_CORES` -> `system.max_cores`
/// - `NEAT_LOG_LEVEL` -> `logging.global_log_level`
/// - `NEAT_NUM_GENERATIONS` -> `experiment.num_generations`
///
/// Values that fail to parse are ignored.
pub fn apply_environment_overrides(config: &mut NeatConfig) {
    if let Ok(value) = env::var("NEAT_POP_SIZE") {
        if let Ok(size) = value.parse::<usize>() {
            config.population.pop_size = size;
        }
    }
    if let Ok(value) = env::var("NEAT_COMPAT_THRESHOLD") {
        if let Ok(threshold) = value.parse::<f64>() {
            config.population.compat_threshold = threshold;
        }
    }
    if let Ok(value) = env::var("NEAT_MAX_CORES") {
        if let Ok(cores) = value.parse::<usize>() {
            config.system.max_cores = cores;
        }
    }
    if let Ok(value) = env::var("NEAT_LOG_LEVEL") {
        config.logging.global_log_level = value;
    }
    if let Ok(value) = env::var("NEAT_NUM_GENERATIONS") {
        if let Ok(generations) = value.parse::<usize>() {
            config.experiment.num_generations = generations;
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = {:?}", key, value)))
}

/// Apply CLI argument overrides to configuration
///
/// Keys use the `section.field` form of the TOML file, e.g.
/// `{"population.pop_size": "150", "mutation.weight_mut_power": "1.8"}`.
///
/// # Errors
///
/// Returns `ConfigError::UnknownKey` for keys outside the schema and
/// `ConfigError::InvalidValue` for values that do not parse
pub fn apply_cli_overrides(
    config: &mut NeatConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    for (key, value) in cli_args {
        let k = key.as_str();
        match k {
            "system.max_cores" => config.system.max_cores = parse_value(k, value)?,
            "system.random_seed" => config.system.random_seed = Some(parse_value(k, value)?),

            "population.pop_size" => config.population.pop_size = parse_value(k, value)?,
            "population.dropoff_age" => config.population.dropoff_age = parse_value(k, value)?,
            "population.survival_thresh" => {
                config.population.survival_thresh = parse_value(k, value)?
            }
            "population.age_significance" => {
                config.population.age_significance = parse_value(k, value)?
            }
            "population.babies_stolen" => {
                config.population.babies_stolen = parse_value(k, value)?
            }
            "population.compat_threshold" => {
                config.population.compat_threshold = parse_value(k, value)?
            }
            "population.interspecies_mate_rate" => {
                config.population.interspecies_mate_rate = parse_value(k, value)?
            }

            "compatibility.disjoint_coeff" => {
                config.compatibility.disjoint_coeff = parse_value(k, value)?
            }
            "compatibility.excess_coeff" => {
                config.compatibility.excess_coeff = parse_value(k, value)?
            }
            "compatibility.mutdiff_coeff" => {
                config.compatibility.mutdiff_coeff = parse_value(k, value)?
            }

            "mutation.weight_mut_power" => {
                config.mutation.weight_mut_power = parse_value(k, value)?
            }
            "mutation.mutate_add_node_prob" => {
                config.mutation.mutate_add_node_prob = parse_value(k, value)?
            }
            "mutation.mutate_add_link_prob" => {
                config.mutation.mutate_add_link_prob = parse_value(k, value)?
            }
            "mutation.recur_only_prob" => config.mutation.recur_only_prob = parse_value(k, value)?,
            "mutation.new_link_tries" => config.mutation.new_link_tries = parse_value(k, value)?,

            "mating.mate_only_prob" => config.mating.mate_only_prob = parse_value(k, value)?,
            "mating.unmatched_genes" => {
                config.mating.unmatched_genes = match value.to_lowercase().as_str() {
                    "fitter" => UnmatchedGenePolicy::Fitter,
                    "either" => UnmatchedGenePolicy::Either,
                    _ => {
                        return Err(ConfigError::InvalidValue(format!(
                            "{} = {:?} (expected 'fitter' or 'either')",
                            k, value
                        )))
                    }
                }
            }

            "network.max_activation_attempts" => {
                config.network.max_activation_attempts = parse_value(k, value)?
            }
            "network.max_depth" => config.network.max_depth = parse_value(k, value)?,

            "logging.global_log_level" => config.logging.global_log_level = value.clone(),
            "logging.print_debug_logs" => {
                config.logging.print_debug_logs = parse_value(k, value)?
            }

            "experiment.num_runs" => config.experiment.num_runs = parse_value(k, value)?,
            "experiment.num_generations" => {
                config.experiment.num_generations = parse_value(k, value)?
            }
            "experiment.print_every" => config.experiment.print_every = parse_value(k, value)?,

            _ => return Err(ConfigError::UnknownKey(key.clone())),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("NEAT_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("NEAT_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("NEAT_CONFIG_PATH", "/definitely/not/here.toml");
        let result = find_config_file();
        env::remove_var("NEAT_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::remove_var("NEAT_POP_SIZE");
        env::remove_var("NEAT_MAX_CORES");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[system]").unwrap();
        writeln!(file, "max_cores = 4").unwrap();
        writeln!(file, "[population]").unwrap();
        writeln!(file, "pop_size = 150").unwrap();

        let config = load_config(Some(config_path.as_path()), None).unwrap();

        assert_eq!(config.system.max_cores, 4);
        assert_eq!(config.population.pop_size, 150);
        assert_eq!(config.population.dropoff_age, 15);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[population\npop_size = ").unwrap();

        let result = load_config(Some(config_path.as_path()), None);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = NeatConfig::default();

        env::set_var("NEAT_POP_SIZE", "75");
        env::set_var("NEAT_COMPAT_THRESHOLD", "not-a-number");
        env::set_var("NEAT_LOG_LEVEL", "debug");

        apply_environment_overrides(&mut config);

        env::remove_var("NEAT_POP_SIZE");
        env::remove_var("NEAT_COMPAT_THRESHOLD");
        env::remove_var("NEAT_LOG_LEVEL");

        assert_eq!(config.population.pop_size, 75);
        assert_eq!(config.population.compat_threshold, 3.0);
        assert_eq!(config.logging.global_log_level, "debug");
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = NeatConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("population.pop_size".to_string(), "42".to_string());
        cli_args.insert("mutation.weight_mut_power".to_string(), "1.8".to_string());
        cli_args.insert("mating.unmatched_genes".to_string(), "Either".to_string());
        cli_args.insert("system.random_seed".to_string(), "7".to_string());
        cli_args.insert("logging.global_log_level".to_string(), "warn".to_string());
        cli_args.insert("logging.print_debug_logs".to_string(), "true".to_string());

        apply_cli_overrides(&mut config, &cli_args).unwrap();

        assert_eq!(config.population.pop_size, 42);
        assert_eq!(config.mutation.weight_mut_power, 1.8);
        assert_eq!(config.mating.unmatched_genes, UnmatchedGenePolicy::Either);
        assert_eq!(config.system.random_seed, Some(7));
        assert_eq!(config.logging.global_log_level, "warn");
        assert!(config.logging.print_debug_logs);
    }

    #[test]
    fn test_cli_override_rejects_bad_input() {
        let mut config = NeatConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("population.pop_size".to_string(), "many".to_string());
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli_args),
            Err(ConfigError::InvalidValue(_))
        ));

        let mut cli_args = HashMap::new();
        cli_args.insert("population.colour".to_string(), "red".to_string());
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli_args),
            Err(ConfigError::UnknownKey(key)) if key == "population.colour"
        ));
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[population]").unwrap();
        writeln!(file, "pop_size = 100").unwrap();
        writeln!(file, "[experiment]").unwrap();
        writeln!(file, "num_generations = 10").unwrap();

        env::set_var("NEAT_POP_SIZE", "120");
        env::set_var("NEAT_NUM_GENERATIONS", "20");

        let mut cli_args = HashMap::new();
        cli_args.insert("population.pop_size".to_string(), "140".to_string());

        let config = load_config(Some(config_path.as_path()), Some(&cli_args)).unwrap();

        env::remove_var("NEAT_POP_SIZE");
        env::remove_var("NEAT_NUM_GENERATIONS");

        // CLI wins for pop size, env wins for generations (no CLI override)
        assert_eq!(config.population.pop_size, 140);
        assert_eq!(config.experiment.num_generations, 20);
    }
}
