//! Command-line arguments

use clap::Parser;

use crate::settings::Settings;
use crate::tuning::{Band, Filter};

/// Remote rig control: rigctld client and pass-through proxy
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Remote rigctld host
    #[arg(long)]
    pub host: Option<String>,

    /// Remote rigctld port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Local port for the pass-through proxy
    #[arg(long)]
    pub proxy_port: Option<u16>,

    /// Do not start the pass-through proxy
    #[arg(long)]
    pub no_proxy: bool,

    /// Reconnect attempts after a lost connection
    #[arg(long)]
    pub max_reconnect_attempts: Option<u32>,

    /// Delay between reconnect attempts in milliseconds
    #[arg(long)]
    pub reconnect_delay_ms: Option<u64>,

    /// Radio state polling interval in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Tune to a band preset after connecting (e.g. 20m)
    #[arg(long)]
    pub band: Option<Band>,

    /// Select a filter preset after connecting (narrow, medium, wide)
    #[arg(long)]
    pub filter: Option<Filter>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    pub save: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Override loaded settings with any values given on the command line
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.rigctld_port = port;
        }
        if let Some(port) = self.proxy_port {
            settings.proxy_port = port;
        }
        if self.no_proxy {
            settings.proxy_enabled = false;
        }
        if let Some(attempts) = self.max_reconnect_attempts {
            settings.max_reconnect_attempts = attempts;
        }
        if let Some(delay) = self.reconnect_delay_ms {
            settings.reconnect_delay_ms = delay;
        }
        if let Some(interval) = self.poll_interval_ms {
            settings.poll_interval_ms = interval;
        }
    }
}
