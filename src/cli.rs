use std::path::PathBuf;

use clap::Parser;
use colored::*;

use crate::advisor::Diagnosis;
use crate::config::AdvisorConfig;
use crate::error::Result;
use crate::symptoms::{Symptom, SymptomVector};

#[derive(Parser, Debug)]
#[command(name = "diagnostic-advisor")]
#[command(version = "1.0.0")]
#[command(about = "Rule-based troubleshooting advisor with failure-pattern escalation")]
pub struct Args {
    /// Active symptoms for a one-shot diagnosis (e.g. app_crashes install_or_update_failed)
    pub symptoms: Vec<String>,

    /// Run the HTTP server instead of a one-shot diagnosis
    #[arg(long)]
    pub serve: bool,

    /// TOML configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long)]
    pub host: Option<String>,

    /// Port for the HTTP server
    #[arg(long)]
    pub port: Option<u16>,

    /// Prior failures needed before escalating to a specialist
    #[arg(long)]
    pub threshold: Option<usize>,

    /// JSON file that stores free-text problem reports
    #[arg(long)]
    pub reports_file: Option<PathBuf>,
}

impl Args {
    /// Defaults, then the config file, then command-line flags.
    pub fn resolve_config(&self) -> Result<AdvisorConfig> {
        let mut config = match &self.config {
            Some(path) => AdvisorConfig::load(path)?,
            None => AdvisorConfig::default(),
        };
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(threshold) = self.threshold {
            config.failure_threshold = threshold;
        }
        if let Some(path) = &self.reports_file {
            config.reports_file = path.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Build a symptom vector from CLI words. Words may also be comma-separated.
pub fn parse_symptoms(words: &[String]) -> std::result::Result<SymptomVector, String> {
    let mut vector = SymptomVector::default();
    for word in words.iter().flat_map(|w| w.split(',')) {
        if word.trim().is_empty() {
            continue;
        }
        vector.set(Symptom::from_str_loose(word)?, true);
    }
    Ok(vector)
}

/// Terminal rendering of a one-shot diagnosis.
pub fn render_diagnosis(d: &Diagnosis) -> String {
    let mut out = String::new();
    let symptoms = if d.active_symptoms.is_empty() {
        "none".dimmed().to_string()
    } else {
        d.active_symptoms.join(", ")
    };
    out.push_str(&format!("{} {}\n", "Symptoms:".bold(), symptoms));

    let code = if d.pattern_alert.triggered {
        d.final_diagnosis.to_string().red().bold()
    } else {
        d.final_diagnosis.to_string().green().bold()
    };
    out.push_str(&format!("{} {}\n", "Diagnosis:".bold(), code));
    out.push_str(&format!("{} {}\n", "Why:".bold(), d.justification));
    out.push_str(&format!("{} {}\n", "Summary:".bold(), d.summary));
    out.push_str(&format!("{}\n", "Steps:".bold()));
    for (i, step) in d.recommendation_steps.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, step));
    }
    if d.pattern_alert.triggered {
        out.push_str(&format!("{}\n", d.alert_message.yellow()));
    }
    out.push_str(&format!("{} {}\n", "Session:".dimmed(), d.session_id.dimmed()));
    out
}
