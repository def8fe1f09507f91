use std::env;

use anyhow::Context;
use tracing::info;

#[derive(Clone, Debug, serde::Serialize)]
pub struct EventDetails {
    pub name: String,
    pub date: String,
    pub venue: String,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub admin_password: String,
    pub jwt_secret: String,
    pub resend_api_key: Option<String>,
    pub mail_from: String,
    pub internal_notification_email: Option<String>,
    pub site_url: String,
    pub template_dir: String,
    pub static_dir: String,
    pub event: EventDetails,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: var_or("DATABASE_URL", "sqlite://rsvp.db?mode=rwc"),
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            admin_password: required("ADMIN_PASSWORD")?,
            jwt_secret: required("JWT_SECRET")?,
            resend_api_key: optional("RESEND_API_KEY"),
            mail_from: var_or("MAIL_FROM", "RSVP <noreply@example.com>"),
            internal_notification_email: optional("INTERNAL_NOTIFICATION_EMAIL"),
            site_url: var_or("SITE_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            template_dir: var_or("TEMPLATE_DIR", "templates"),
            static_dir: var_or("STATIC_DIR", "static"),
            event: EventDetails {
                name: var_or("EVENT_NAME", "Corporate Cocktail & Fundraiser Evening"),
                date: var_or("EVENT_DATE", "Saturday, August 30th, 2025 at 4:00 PM"),
                venue: var_or("EVENT_VENUE", "Oladipo Diya St, Durumi, Abuja"),
            },
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(key: &str) -> anyhow::Result<String> {
    optional(key).with_context(|| format!("{key} must be set"))
}

fn var_or(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
