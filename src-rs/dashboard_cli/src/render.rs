use std::io::{self, Write};

use invocation_dashboard::invocation::{Invocation, StatusSummary};
use invocation_dashboard::{CardDescriptor, Notice, RenderPass};

use crate::models::CLIConfig;

pub fn banner(cfg: &CLIConfig) {
    println!("Invocation Dashboard");
    println!("Feed: {}", cfg.base_url);
    println!("Command: {}", cfg.command_id);
    println!("Type /help for commands.");
}

pub fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

pub fn help() {
    println!("Commands:");
    println!("  /help                 Show commands");
    println!("  /exit | /quit         Exit");
    println!("  /load                 Reload invocations");
    println!("  /cards                Show invocation cards");
    println!("  /summary              Count invocations by severity");
    println!("  /watch                Follow live updates (ctrl-c to stop)");
    println!("  /endpoint             Show the live update endpoint");
    println!("  /command <id>         Switch command");
    println!("  /base <url>           Switch feed origin");
    println!("  /config               Show current config");
}

/// Header plus prefixed output lines for one card. Stderr lines carry a `!`.
pub fn card_lines(card: &CardDescriptor, quiet: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "[{}] {} ({})",
        card.instance_id, card.status, card.severity_class
    )];
    if quiet {
        return lines;
    }
    for line in card.stdout.lines() {
        lines.push(format!("[{}] {}", card.instance_id, line));
    }
    for line in card.stderr.lines() {
        lines.push(format!("[{}] ! {}", card.instance_id, line));
    }
    lines
}

pub fn summary_line(summary: &StatusSummary) -> String {
    format!(
        "{} invocations: {} running, {} succeeded, {} need attention",
        summary.total, summary.neutral, summary.success, summary.failure
    )
}

pub fn pass(pass: &RenderPass, quiet: bool) {
    if let Some(n) = &pass.notice {
        notice(n);
    }
    if pass.cards.is_empty() {
        println!("no invocations for {}", pass.command_id);
        return;
    }
    for card in &pass.cards {
        for line in card_lines(card, quiet) {
            println!("{}", line);
        }
    }
    summary(&pass.summary);
    if let Some(at) = pass.loaded_at {
        println!("loaded at {}", at.format("%H:%M:%S"));
    }
}

pub fn card(card: &CardDescriptor, quiet: bool) {
    for line in card_lines(card, quiet) {
        println!("{}", line);
    }
}

pub fn completed(items: &[Invocation]) {
    for inv in items {
        println!("[{}] finished: {}", inv.instance_id, inv.status);
    }
}

pub fn summary(summary: &StatusSummary) {
    println!("{}", summary_line(summary));
}

pub fn notice(notice: &Notice) {
    eprintln!("notice: {} ({})", notice.message, notice.raised_at.format("%H:%M:%S"));
}

pub fn config(cfg: &CLIConfig) {
    println!("config:");
    println!("  base: {}", cfg.base_url);
    println!("  command: {}", cfg.command_id);
    match cfg.timeout_secs {
        Some(secs) => println!("  timeout: {}s", secs),
        None => println!("  timeout: none"),
    }
    println!("  quiet: {}", cfg.quiet);
}

pub fn info(msg: &str) {
    println!("{}", msg);
}

pub fn error(msg: &str) {
    eprintln!("error: {}", msg);
}
