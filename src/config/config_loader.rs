use std::str::FromStr;

use anyhow::{Context, Result};

use super::{
    config_model::{
        App, Auth, Catalog, Database, DotEnvyConfig, Email, RevenueCat, Server, TextGeneration,
        Yoco,
    },
    stage::Stage,
};

const DEFAULT_REVENUE_CAT_BASE_URL: &str = "https://api.revenuecat.com/v2";
const DEFAULT_YOCO_BASE_URL: &str = "https://payments.yoco.com/api";
const DEFAULT_EMAIL_BASE_URL: &str = "https://api.resend.com";
const DEFAULT_TEXT_GENERATION_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TEXT_GENERATION_MODEL: &str = "gpt-4o-mini";

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let stage = get_stage();

    let server = Server {
        port: parse_var("SERVER_PORT")?,
        body_limit: parse_var("SERVER_BODY_LIMIT")?,
        timeout: parse_var("SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
    };

    let auth = Auth {
        session_secret: required("SESSION_SECRET")?,
        session_ttl_days: parse_or("SESSION_TTL_DAYS", 7)?,
        magic_link_secret: required("MAGIC_LINK_SECRET")?,
        magic_link_ttl_minutes: parse_or("MAGIC_LINK_TTL_MINUTES", 10)?,
        cookie_secure: flag("COOKIE_SECURE").unwrap_or_else(|| stage.secure_cookies()),
    };

    let app = App {
        base_url: required("APP_BASE_URL")?,
        landing_path: optional("APP_LANDING_PATH").unwrap_or_else(|| "/".to_string()),
    };

    let revenue_cat = RevenueCat {
        api_key: required("REVENUECAT_API_KEY")?,
        project_id: required("REVENUECAT_PROJECT_ID")?,
        base_url: optional("REVENUECAT_BASE_URL")
            .unwrap_or_else(|| DEFAULT_REVENUE_CAT_BASE_URL.to_string()),
    };

    let yoco = Yoco {
        secret_key: required("YOCO_SECRET_KEY")?,
        base_url: optional("YOCO_BASE_URL").unwrap_or_else(|| DEFAULT_YOCO_BASE_URL.to_string()),
    };

    let email = Email {
        api_key: required("EMAIL_API_KEY")?,
        from: required("EMAIL_FROM")?,
        base_url: optional("EMAIL_BASE_URL").unwrap_or_else(|| DEFAULT_EMAIL_BASE_URL.to_string()),
    };

    // Suggestions fall back to the default catalog when no model is configured.
    let text_generation = optional("TEXT_GENERATION_API_KEY").map(|api_key| TextGeneration {
        api_key,
        model: optional("TEXT_GENERATION_MODEL")
            .unwrap_or_else(|| DEFAULT_TEXT_GENERATION_MODEL.to_string()),
        base_url: optional("TEXT_GENERATION_BASE_URL")
            .unwrap_or_else(|| DEFAULT_TEXT_GENERATION_BASE_URL.to_string()),
    });

    let catalog = Catalog {
        external_packages_enabled_by_default: flag("EXTERNAL_PACKAGES_ENABLED_BY_DEFAULT")
            .unwrap_or(false),
    };

    Ok(DotEnvyConfig {
        stage,
        server,
        database,
        auth,
        app,
        revenue_cat,
        yoco,
        email,
        text_generation,
        catalog,
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or_default();
    Stage::try_from(&stage_str).unwrap_or_default()
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(key: &str) -> Result<String> {
    optional(key).with_context(|| format!("{key} is invalid"))
}

fn parse_var<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required(key)?
        .parse()
        .with_context(|| format!("{key} is invalid"))
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw.parse().with_context(|| format!("{key} is invalid")),
        None => Ok(default),
    }
}

fn flag(key: &str) -> Option<bool> {
    match optional(key)?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
