use strata_config::StrataConfig;

const SECTIONS: [&str; 5] = ["DATABASE", "MODEL", "EMBEDDING", "SYNTHESIS", "QUEUE"];

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &StrataConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &StrataConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    for section in SECTIONS {
        let single = format!("STRATA_{section}_");
        let double = format!("STRATA_{section}__");
        if let Some(key) = env_keys
            .iter()
            .find(|key| key.starts_with(&single) && !key.starts_with(&double))
        {
            warnings.push(format!(
                "{key} is ignored. Use double underscores between section and field (example: {double}{})",
                key.trim_start_matches(&single)
            ));
        }
    }

    if !config.model.is_configured() && env_keys.iter().any(|key| key == "GEMINI_API_KEY") {
        warnings.push(
            "GEMINI_API_KEY is set but model.api_key is empty. Set STRATA_MODEL__API_KEY instead."
                .to_string(),
        );
    }

    warnings
}
