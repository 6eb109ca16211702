use crate::error::AppError;

use sync_core::config::ProvidersConfig;

use std::path::Path;

pub fn providers(config_dir: &Path) -> Result<String, AppError> {
    let config = ProvidersConfig::load(config_dir)?;
    if config.entries.is_empty() {
        return Ok(format!(
            "No storage configured in {}",
            config_dir.join("providers.toml").display()
        ));
    }

    Ok(config
        .entries
        .iter()
        .map(|entry| {
            let secret = match &entry.secret_env {
                Some(variable) => format!("${variable}"),
                None => String::from("-"),
            };
            format!(
                "{}\t{}\t{}\t{}\t{}",
                entry.internal_id, entry.name, entry.provider, entry.id, secret
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}
