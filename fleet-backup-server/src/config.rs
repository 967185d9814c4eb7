use fleet_backup::Config;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub backup: Config,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backup = Config::from_env()?;

        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            backup,
        })
    }
}
