use std::time::Duration;

use invocation_dashboard::DashboardConfig;

#[derive(Clone, Debug)]
pub struct CLIConfig {
    pub base_url: String,
    pub command_id: String,
    pub timeout_secs: Option<u64>,
    pub watch: bool,
    pub quiet: bool,
}

impl CLIConfig {
    pub fn dashboard_config(&self) -> DashboardConfig {
        let mut cfg = DashboardConfig::new(&self.base_url, &self.command_id);
        cfg.request_timeout = self.timeout_secs.map(Duration::from_secs);
        cfg
    }
}
