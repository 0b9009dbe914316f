//! CLI definition and the annotate command

use crate::avatar::{normalize_mail, AvatarLoader, GravatarClient};
use crate::blame::{self, normalize_ages, BlameModel};
use crate::config::UserConfig;
use crate::git;
use crate::reporters;
use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Gitage - line-level git blame annotation
///
/// Shows who last touched every line of a file and how long ago.
#[derive(Parser, Debug)]
#[command(name = "gitage")]
#[command(
    version,
    about = "Annotate a file with per-line authorship and age from git history",
    after_help = "\
Examples:
  gitage src/main.rs                   Annotate with an age heatmap
  gitage src/main.rs --format json     JSON output for scripting
  gitage src/main.rs --avatars         Also cache author avatars locally
  gitage --init-config                 Write an example config file"
)]
pub struct Cli {
    /// File to annotate
    #[arg(required_unless_present = "init_config")]
    pub file: Option<PathBuf>,

    /// Output format: text, json
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Disable the age heatmap colors
    #[arg(long)]
    pub no_color: bool,

    /// Prefetch author avatars into the local cache
    #[arg(long)]
    pub avatars: bool,

    /// Avatar size in pixels (overrides config)
    #[arg(long)]
    pub avatar_size: Option<u32>,

    /// Write an example config file to ~/.config/gitage/ and exit
    #[arg(long)]
    pub init_config: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    if cli.init_config {
        let path = UserConfig::init_user_config()?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    let file = cli.file.context("FILE is required")?;
    let text = fs::read_to_string(&file)
        .with_context(|| format!("unable to open {}", file.display()))?;
    let records = git::blame_incremental(&file)?;

    let mut model = blame::parse_stream(&text, &records)?;
    normalize_ages(&mut model.commits);

    match cli.format.as_str() {
        "json" => print!("{}", reporters::render_json(&model)?),
        _ => print!("{}", reporters::render_text(&model, !cli.no_color)),
    }

    if cli.avatars {
        prefetch_avatars(&model, cli.avatar_size)?;
    }
    Ok(())
}

/// Resolve every author's avatar through the background loader, polling
/// drain + query until each settles or its patience runs out.
fn prefetch_avatars(model: &BlameModel, size_override: Option<u32>) -> Result<()> {
    let config = UserConfig::load()?;
    let mut client = GravatarClient::new(&config);
    if let Some(size) = size_override {
        client = client.with_size(size);
    }
    let mut loader = AvatarLoader::spawn(client);

    let mut mails: Vec<String> = Vec::new();
    for commit in model.commits.iter() {
        if let Some(mail) = commit.author_mail.as_deref().and_then(normalize_mail) {
            if !mails.iter().any(|m| m == mail) {
                mails.push(mail.to_string());
            }
        }
    }

    for mail in &mails {
        let mut resolved = None;
        for _ in 0..100 {
            loader.drain();
            if let Some(path) = loader.query(Some(mail)) {
                resolved = Some(path);
                break;
            }
            thread::sleep(Duration::from_millis(100));
        }
        match resolved {
            Some(path) => println!("{mail}: {}", path.display()),
            None => println!("{mail}: not available"),
        }
    }
    Ok(())
}
