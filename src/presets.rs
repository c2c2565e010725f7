//! Built-in patch sets for the site's about, home, and pricing pages.
//!
//! Each preset is a regular patch file embedded at compile time, so the
//! preset binaries need nothing but a working directory at the site root.

use crate::config::{apply_patch_set, load_from_str, ConfigError, PatchConfig};
use crate::message::error_chain;
use crate::runner::{PatchReport, RunMode};
use anyhow::Context;
use std::path::Path;
use std::process::ExitCode;

#[derive(Debug)]
pub struct Preset {
    pub name: &'static str,
    /// Human-readable page name used in the success message.
    pub page: &'static str,
    source: &'static str,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "clean-about-page",
        page: "About",
        source: include_str!("../presets/clean-about-page.toml"),
    },
    Preset {
        name: "clean-home-page",
        page: "Home",
        source: include_str!("../presets/clean-home-page.toml"),
    },
    Preset {
        name: "clean-pricing-page",
        page: "Pricing",
        source: include_str!("../presets/clean-pricing-page.toml"),
    },
];

pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|preset| preset.name == name)
}

impl Preset {
    pub fn config(&self) -> Result<PatchConfig, ConfigError> {
        load_from_str(self.source)
    }

    pub fn success_message(&self) -> String {
        format!("{} page cleaned successfully!", self.page)
    }

    /// Run the preset against `workspace_root`.
    pub fn run(&self, workspace_root: &Path, mode: RunMode) -> anyhow::Result<PatchReport> {
        let config = self
            .config()
            .with_context(|| format!("built-in preset '{}' is malformed", self.name))?;
        Ok(apply_patch_set(&config, workspace_root, mode)?)
    }
}

/// Entry point shared by the argument-less preset binaries.
///
/// Patches relative to the current directory, prints the success line on
/// stdout, and maps any failure to a one-line message and exit code 1.
pub fn run_standalone(name: &str) -> ExitCode {
    crate::logging::init();

    let result = find_preset(name)
        .with_context(|| format!("unknown preset '{name}'"))
        .and_then(|preset| {
            let cwd = std::env::current_dir().context("cannot determine working directory")?;
            preset.run(&cwd, RunMode::Write).map(|_| preset)
        });

    match result {
        Ok(preset) => {
            println!("{}", preset.success_message());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{name}: {}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}
