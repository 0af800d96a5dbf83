use invocation_dashboard::{Dashboard, DashboardEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::models::CLIConfig;
use crate::render;

pub struct REPL {
    pub config: CLIConfig,
    pub dashboard: Dashboard,
}

impl REPL {
    pub fn new(config: CLIConfig, dashboard: Dashboard) -> Self {
        Self { config, dashboard }
    }

    pub async fn run(&mut self) {
        render::banner(&self.config);
        self.load().await;
        if self.config.watch {
            self.watch().await;
            return;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            render::prompt();
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                _ => break,
            };
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if !line.starts_with('/') {
                render::info("unknown input, type /help");
                continue;
            }
            if self.handle_command(&line).await {
                break;
            }
        }
    }

    async fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("").trim_start_matches('/');
        let rest = parts.next().unwrap_or("").trim();
        match cmd {
            "exit" | "quit" => return true,
            "help" => render::help(),
            "load" => self.load().await,
            "cards" => render::pass(&self.dashboard.render(), self.config.quiet),
            "summary" => render::summary(&self.dashboard.store().summary()),
            "watch" => self.watch().await,
            "endpoint" => match self.dashboard.stream_endpoint() {
                Ok(endpoint) => render::info(&format!("live endpoint: {}", endpoint)),
                Err(err) => render::error(&err.to_string()),
            },
            "command" => {
                if rest.is_empty() {
                    render::info(&format!("command: {}", self.config.command_id));
                } else {
                    let mut next = self.config.clone();
                    next.command_id = rest.to_string();
                    if self.switch(next) {
                        render::info("command updated");
                        self.load().await;
                    }
                }
            }
            "base" => {
                if rest.is_empty() {
                    render::info(&format!("base: {}", self.config.base_url));
                } else {
                    let mut next = self.config.clone();
                    next.base_url = rest.to_string();
                    if self.switch(next) {
                        render::info("base url updated");
                        self.load().await;
                    }
                }
            }
            "config" => render::config(&self.config),
            _ => render::info("unknown command, type /help"),
        }
        false
    }

    /// Replaces the dashboard with one built from `next`. The old one is torn
    /// down, cancelling anything still in flight.
    fn switch(&mut self, next: CLIConfig) -> bool {
        match Dashboard::new(next.dashboard_config()) {
            Ok(dashboard) => {
                let old = std::mem::replace(&mut self.dashboard, dashboard);
                old.teardown();
                self.config = next;
                true
            }
            Err(err) => {
                render::error(&err.to_string());
                false
            }
        }
    }

    async fn load(&mut self) {
        match self.dashboard.reload().await {
            Ok(()) => render::pass(&self.dashboard.render(), self.config.quiet),
            Err(err) => {
                render::error(&err.to_string());
                // the prior state stays visible
                render::pass(&self.dashboard.render(), self.config.quiet);
            }
        }
    }

    async fn watch(&mut self) {
        if let Err(err) = self.dashboard.subscribe().await {
            render::error(&err.to_string());
            return;
        }
        render::info("watching live updates, ctrl-c to stop");

        loop {
            let event = tokio::select! {
                event = self.dashboard.next_event() => event,
                _ = tokio::signal::ctrl_c() => None,
            };
            let event = match event {
                Some(event) => event,
                None => break,
            };

            let lost = matches!(
                &event,
                DashboardEvent::StreamLost { generation, .. }
                    if *generation == self.dashboard.stream_generation()
            );
            let changed = match &event {
                DashboardEvent::Update { update, .. } => Some(update.instance_id.clone()),
                _ => None,
            };
            let before = self.dashboard.store().snapshot();
            if let Err(err) = self.dashboard.handle_event(event) {
                render::error(&err.to_string());
            }
            if lost {
                break;
            }

            if let Some(instance_id) = changed {
                debug!(%instance_id, "rendering changed card");
                if let Some(card) = self
                    .dashboard
                    .render()
                    .cards
                    .iter()
                    .find(|card| card.instance_id == instance_id)
                {
                    render::card(card, self.config.quiet);
                }
            }
            let finished = self.dashboard.store().completed_since(&before);
            render::completed(&finished);
            if !finished.is_empty() && self.dashboard.store().all_complete() {
                render::info("all invocations complete");
                render::summary(&self.dashboard.store().summary());
            }
        }

        self.dashboard.detach_stream();
        render::info("stopped watching");
    }
}
