//! Notification sinks.

use std::process::Command;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use url::Url;

use crate::core::thermal::{AlertIntent, NotificationSink};

/// Writes alerts to the application log
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, intent: &AlertIntent) -> Result<()> {
        log::warn!("[alert #{}] {}", intent.id, intent.message);
        Ok(())
    }

    fn describe(&self) -> String {
        "log".to_string()
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
    severity: &'a str,
    temperature: f32,
    threshold: Option<f32>,
    timestamp: String,
}

/// POSTs a JSON payload to an HTTP endpoint (chat bots, home automation, ...)
pub struct WebhookSink {
    url: Url,
    client: reqwest::blocking::Client,
}

impl WebhookSink {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = parse_webhook_url(url)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("thermwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { url, client })
    }
}

/// Accept only absolute http(s) URLs
pub fn parse_webhook_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid webhook URL: {}", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("Unsupported webhook scheme '{}' (use http or https)", other),
    }
}

impl NotificationSink for WebhookSink {
    fn deliver(&self, intent: &AlertIntent) -> Result<()> {
        let payload = WebhookPayload {
            text: &intent.message,
            severity: intent.severity.label(),
            temperature: intent.temperature,
            threshold: intent.threshold,
            timestamp: intent.created_at.to_rfc3339(),
        };

        let response = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .with_context(|| format!("Failed to reach {}", self.url.host_str().unwrap_or("webhook")))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Webhook responded with HTTP {}", status);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("webhook ({})", self.url.host_str().unwrap_or("?"))
    }
}

/// Runs an external program with the alert message as its last argument.
///
/// Severity and temperature are passed through `THERMWATCH_*` environment
/// variables, which makes mail or chat scripts easy to plug in.
#[derive(Debug, Clone)]
pub struct CommandSink {
    program: String,
    args: Vec<String>,
}

impl CommandSink {
    pub fn new<S: Into<String>>(program: S, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl NotificationSink for CommandSink {
    fn deliver(&self, intent: &AlertIntent) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&intent.message)
            .env("THERMWATCH_SEVERITY", intent.severity.label())
            .env("THERMWATCH_TEMPERATURE", format!("{:.1}", intent.temperature))
            .env("THERMWATCH_CHANNEL", intent.channel.as_str())
            .output()
            .with_context(|| format!("Failed to run alert command '{}'", self.program))?;

        if !output.status.success() {
            bail!(
                "Alert command '{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("command ({})", self.program)
    }
}
