mod discord;
mod layer;
mod notifier;

use anyhow::Result;
use discord::DiscordWebhookSink;
use layer::ErrorAlertLayer;
use notifier::AlertDispatcher;
use std::env;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

#[derive(Clone)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

/// Installs the tracing stack: RUST_LOG-driven filtering with an `info`
/// default, local-time RFC3339 console output, and an optional Discord
/// sink for error-level events.
pub fn init_observability(component: &str) -> Result<()> {
    let service_context = ServiceContext {
        service_name: env::var("SERVICE_NAME")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "toppers".to_string()),
        environment: env::var("STAGE")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "unknown".to_string()),
        component: component.to_string(),
    };

    let (discord, config_warnings) = discord_from_env();
    let alert_layer = discord.map(|(webhook_url, min_level)| {
        let dispatcher = AlertDispatcher::new(vec![Arc::new(DiscordWebhookSink::new(webhook_url))]);
        ErrorAlertLayer::new(dispatcher, service_context.clone(), min_level).with_filter(
            tracing_subscriber::filter::LevelFilter::from_level(min_level),
        )
    });
    let alerts_enabled = alert_layer.is_some();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Local time in logs so operators see their own timezone offset.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(alert_layer)
        .with(env_filter)
        .try_init()?;

    for warning in &config_warnings {
        warn!(
            service = %service_context.service_name,
            component = %service_context.component,
            warning = %warning,
            "observability config warning"
        );
    }

    info!(
        service = %service_context.service_name,
        environment = %service_context.environment,
        component = %service_context.component,
        discord_alerts = alerts_enabled,
        "observability initialized"
    );

    Ok(())
}

/// Parses the optional Discord sink configuration. Misconfiguration
/// disables the sink with a warning instead of failing startup.
fn discord_from_env() -> (Option<(Url, Level)>, Vec<String>) {
    let mut warnings = Vec::new();

    let enabled = env::var("DISCORD_NOTIFY_ENABLED")
        .ok()
        .and_then(|v| v.trim().parse::<bool>().ok())
        .unwrap_or(true);
    if !enabled {
        return (None, warnings);
    }

    let raw_url = env::var("DISCORD_WEBHOOK_URL")
        .ok()
        .filter(|v| !v.is_empty());
    let Some(raw_url) = raw_url else {
        return (None, warnings);
    };

    let webhook_url = match Url::parse(&raw_url) {
        Ok(url) => url,
        Err(err) => {
            // Never echo the raw URL: webhook URLs embed a secret.
            warnings.push(format!(
                "DISCORD_WEBHOOK_URL is set but invalid; Discord alerts disabled (parse error: {err})"
            ));
            return (None, warnings);
        }
    };

    let min_level = match env::var("DISCORD_NOTIFY_LEVEL") {
        Ok(raw) if !raw.trim().is_empty() => match parse_level(&raw) {
            Some(level) => level,
            None => {
                warnings.push(format!(
                    "DISCORD_NOTIFY_LEVEL is invalid (value: {raw}); defaulting to ERROR"
                ));
                Level::ERROR
            }
        },
        _ => Level::ERROR,
    };

    (Some((webhook_url, min_level)), warnings)
}

fn parse_level(input: &str) -> Option<Level> {
    match input.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing_accepts_aliases() {
        assert_eq!(parse_level("warn"), Some(Level::WARN));
        assert_eq!(parse_level("WARNING"), Some(Level::WARN));
        assert_eq!(parse_level(" error "), Some(Level::ERROR));
        assert_eq!(parse_level("verbose"), None);
    }
}
