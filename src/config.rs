use anyhow::{bail, Context};
use chrono::FixedOffset;
use std::env;

use crate::engine::calendar::{Calendar, Zone};

#[derive(Debug, Clone)]
pub struct Config {
    /// Without a database URL the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub jwt_secret: String,

    pub push_gateway_url: Option<String>,
    pub push_gateway_token: Option<String>,

    /// IANA zone for calendar days, e.g. `Europe/Berlin`.
    pub calendar_timezone: Option<String>,
    /// Fixed offset for calendar days; wins over `calendar_timezone`.
    /// With neither set, days follow the host's local zone.
    pub utc_offset_minutes: Option<i32>,
    pub week_starts_on: chrono::Weekday,

    pub toggle_max_attempts: u32,
    pub streak_alert_min: i32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: optional("DATABASE_URL"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("PORT must be a number")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_extra_origins: optional("CORS_EXTRA_ORIGINS")
                .map(|v| v.split(',').map(|o| o.trim().to_string()).collect())
                .unwrap_or_default(),

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,

            push_gateway_url: optional("PUSH_GATEWAY_URL"),
            push_gateway_token: optional("PUSH_GATEWAY_TOKEN"),

            calendar_timezone: optional("CALENDAR_TIMEZONE"),
            utc_offset_minutes: optional("CALENDAR_UTC_OFFSET_MINUTES")
                .map(|v| v.parse())
                .transpose()
                .context("CALENDAR_UTC_OFFSET_MINUTES must be a number")?,
            week_starts_on: optional("WEEK_STARTS_ON")
                .unwrap_or_else(|| "sunday".into())
                .parse::<chrono::Weekday>()
                .map_err(|_| anyhow::anyhow!("WEEK_STARTS_ON must be a weekday name"))?,

            toggle_max_attempts: env::var("TOGGLE_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".into())
                .parse()
                .unwrap_or(3),
            streak_alert_min: env::var("STREAK_ALERT_MIN")
                .unwrap_or_else(|_| "3".into())
                .parse()
                .unwrap_or(3),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn calendar(&self) -> anyhow::Result<Calendar> {
        if let Some(minutes) = self.utc_offset_minutes {
            let Some(offset) = FixedOffset::east_opt(minutes * 60) else {
                bail!("CALENDAR_UTC_OFFSET_MINUTES out of range: {}", minutes);
            };
            return Ok(Calendar::new(offset, self.week_starts_on));
        }

        match &self.calendar_timezone {
            Some(name) => {
                let tz = name
                    .parse::<chrono_tz::Tz>()
                    .map_err(|e| anyhow::anyhow!("CALENDAR_TIMEZONE is not a known zone: {}", e))?;
                Ok(Calendar::in_zone(Zone::Named(tz), self.week_starts_on))
            }
            None => Ok(Calendar::host(self.week_starts_on)),
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}
