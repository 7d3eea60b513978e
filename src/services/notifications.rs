use async_trait::async_trait;
use chrono::NaiveTime;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Push gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Push gateway rejected request with status {0}")]
    Rejected(u16),
}

/// Outbound side of the reminder scheduler. The service only hands over
/// mission identity and a trigger time; delivery is someone else's job.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn schedule_daily_reminder(
        &self,
        mission_id: &str,
        mission_name: &str,
        time_of_day: NaiveTime,
    ) -> Result<(), NotifyError>;

    async fn send_streak_alert(&self, mission_name: &str, streak_count: i32) -> Result<(), NotifyError>;
}

/// Posts reminder and streak-alert requests to an HTTP push gateway.
pub struct WebhookNotifier {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl WebhookNotifier {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), NotifyError> {
        let mut req = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .timeout(std::time::Duration::from_secs(5))
            .json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(NotifyError::Rejected(resp.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn schedule_daily_reminder(
        &self,
        mission_id: &str,
        mission_name: &str,
        time_of_day: NaiveTime,
    ) -> Result<(), NotifyError> {
        self.post(
            "/reminders",
            json!({
                "identifier": format!("mission-{}-daily", mission_id),
                "title": "Mission Control",
                "body": format!("Time for your mission: {}", mission_name),
                "time": time_of_day.format("%H:%M").to_string(),
                "repeats": true,
            }),
        )
        .await
    }

    async fn send_streak_alert(&self, mission_name: &str, streak_count: i32) -> Result<(), NotifyError> {
        self.post(
            "/alerts",
            json!({
                "title": "Streak Alert!",
                "body": format!(
                    "Amazing! You've maintained a {} day streak for {}!",
                    streak_count, mission_name
                ),
            }),
        )
        .await
    }
}

/// Used when no push gateway is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn schedule_daily_reminder(
        &self,
        mission_id: &str,
        mission_name: &str,
        time_of_day: NaiveTime,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            mission_id = %mission_id,
            mission_name = %mission_name,
            time = %time_of_day,
            "Reminder scheduled (no push gateway configured)"
        );
        Ok(())
    }

    async fn send_streak_alert(&self, mission_name: &str, streak_count: i32) -> Result<(), NotifyError> {
        tracing::info!(
            mission_name = %mission_name,
            streak = streak_count,
            "Streak alert (no push gateway configured)"
        );
        Ok(())
    }
}
