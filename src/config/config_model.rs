use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub server: Server,
    pub database: Database,
    pub auth: Auth,
    pub app: App,
    pub revenue_cat: RevenueCat,
    pub yoco: Yoco,
    pub email: Email,
    pub text_generation: Option<TextGeneration>,
    pub catalog: Catalog,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub session_secret: String,
    pub session_ttl_days: i64,
    pub magic_link_secret: String,
    pub magic_link_ttl_minutes: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone)]
pub struct App {
    pub base_url: String,
    pub landing_path: String,
}

#[derive(Debug, Clone)]
pub struct RevenueCat {
    pub api_key: String,
    pub project_id: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct Yoco {
    pub secret_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct Email {
    pub api_key: String,
    pub from: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct TextGeneration {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    pub external_packages_enabled_by_default: bool,
}
