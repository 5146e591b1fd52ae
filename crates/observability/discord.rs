use super::notifier::{AlertEvent, AlertSink};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde_json::json;
use url::Url;

// Discord rejects message content above 2000 characters.
const DISCORD_CONTENT_LIMIT: usize = 1900;

pub(crate) struct DiscordWebhookSink {
    webhook_url: Url,
    client: Client,
}

impl DiscordWebhookSink {
    pub(crate) fn new(webhook_url: Url) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(3))
            .build()
            .expect("reqwest client must build");

        Self {
            webhook_url,
            client,
        }
    }

    fn format_content(&self, event: &AlertEvent) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "**{}** `{}` `{}` `{}`",
            event.service_name,
            event.environment,
            event.component,
            event.level.as_str()
        ));

        lines.push(format!(
            "`{}` `{}`{}",
            event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            event.target,
            match (&event.file, event.line) {
                (Some(file), Some(line)) => format!(" `{}:{}`", file, line),
                _ => String::new(),
            }
        ));

        if let Some(message) = event.message.as_ref().filter(|m| !m.trim().is_empty()) {
            lines.push(format!("> {}", message.trim()));
        }

        if !event.span_chain.is_empty() {
            lines.push(format!("spans: `{}`", event.span_chain.join(" > ")));
        }

        for (key, value) in &event.fields {
            lines.push(format!("- `{}` = `{}`", key, value));
        }

        truncate_for_discord(lines.join("\n"))
    }
}

#[async_trait]
impl AlertSink for DiscordWebhookSink {
    async fn send(&self, event: &AlertEvent) -> Result<()> {
        let content = self.format_content(event);
        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&json!({ "content": content }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("discord webhook returned status {}", status));
        }
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "discord"
    }
}

fn truncate_for_discord(content: String) -> String {
    if content.chars().count() <= DISCORD_CONTENT_LIMIT {
        return content;
    }
    let truncated: String = content.chars().take(DISCORD_CONTENT_LIMIT - 1).collect();
    format!("{}…", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(truncate_for_discord("short".to_string()), "short");
    }

    #[test]
    fn long_content_is_truncated_below_the_limit() {
        let long = "x".repeat(5000);
        let truncated = truncate_for_discord(long);
        assert!(truncated.chars().count() <= DISCORD_CONTENT_LIMIT);
        assert!(truncated.ends_with('…'));
    }
}
