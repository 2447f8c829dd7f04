use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use exim2sieve::config::Settings;
use exim2sieve::model::script::SieveScript;
use exim2sieve::store::{filter_io, script_io};
use exim2sieve::{check, combine_scripts, convert_filters};

#[derive(Parser, Debug)]
#[command(name = "exim2sieve", version, long_version = long_version())]
#[command(about = "Convert cPanel/Exim mailbox filters to SIEVE scripts", long_about = None)]
pub struct Cli {
    /// Settings file (default: ./exim2sieve.json, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert filter files and write the SIEVE scripts
    Convert {
        /// cPanel `filter` or `filter.yaml` files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Write one script per filter entry instead of one combined script
        #[arg(long)]
        per_filter: bool,

        /// Name of the combined script
        #[arg(long)]
        name: Option<String>,

        /// Run the offline checker over the generated scripts
        #[arg(long)]
        verify: bool,
    },

    /// Print the combined script for one filter file
    Print {
        input: PathBuf,

        /// Name of the combined script
        #[arg(long)]
        name: Option<String>,
    },

    /// Check existing SIEVE scripts offline
    Check {
        #[arg(required = true)]
        scripts: Vec<PathBuf>,
    },
}

fn long_version() -> &'static str {
    concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT"), ")")
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;

    match cli.command {
        Command::Convert {
            inputs,
            out,
            per_filter,
            name,
            verify,
        } => {
            if let Some(out) = out {
                settings.output_dir = out;
            }
            if per_filter {
                settings.combine = false;
            }
            if name.is_some() {
                settings.combined_name = name;
            }
            settings.verify |= verify;
            convert(&inputs, &settings)
        }
        Command::Print { input, name } => {
            if name.is_some() {
                settings.combined_name = name;
            }
            let scripts = load_and_convert(&input)?;
            let combined = combine_scripts(&combined_name(&input, &settings), &scripts);
            if settings.verify {
                verify_scripts(std::slice::from_ref(&combined));
            }
            print!("{}", combined.content);
            Ok(())
        }
        Command::Check { scripts } => check_files(&scripts),
    }
}

fn convert(inputs: &[PathBuf], settings: &Settings) -> anyhow::Result<()> {
    let mut subdirs = HashSet::new();

    for input in inputs {
        let scripts = load_and_convert(input)?;
        if scripts.is_empty() {
            tracing::warn!(input = %input.display(), "no filters found");
            continue;
        }

        let scripts = if settings.combine {
            vec![combine_scripts(&combined_name(input, settings), &scripts)]
        } else {
            scripts
        };
        if settings.verify {
            verify_scripts(&scripts);
        }

        let dir = if inputs.len() > 1 {
            let sub = unique_subdir(&mut subdirs, &mailbox_label(input));
            settings.output_dir.join(sub)
        } else {
            settings.output_dir.clone()
        };

        let written = script_io::write_scripts(&scripts, &dir, &settings.extension)
            .with_context(|| format!("writing scripts for {}", input.display()))?;
        for path in written {
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn load_and_convert(input: &Path) -> anyhow::Result<Vec<SieveScript>> {
    let set = filter_io::load_filter_set(input)
        .with_context(|| format!("loading {}", input.display()))?;
    tracing::info!(
        input = %input.display(),
        format = %set.format,
        entries = set.entries.len(),
        "loaded filters"
    );
    Ok(convert_filters(&set))
}

fn verify_scripts(scripts: &[SieveScript]) {
    for script in scripts {
        match check(&script.content) {
            Ok(report) if report.is_clean() => {
                tracing::debug!(script = %script.name, if_blocks = report.if_blocks, "script ok");
            }
            Ok(report) => {
                tracing::warn!(script = %script.name, missing = ?report.missing, "undeclared capabilities");
            }
            Err(e) => tracing::error!(script = %script.name, error = %e, "generated script does not parse"),
        }
    }
}

fn check_files(paths: &[PathBuf]) -> anyhow::Result<()> {
    let mut failed = 0;

    for path in paths {
        let text = script_io::load_script(path)?;
        match check(&text) {
            Ok(report) => {
                let requires: Vec<_> = report.requires.iter().map(String::as_str).collect();
                println!(
                    "{}: ok, {} if block(s), requires [{}]",
                    path.display(),
                    report.if_blocks,
                    requires.join(", ")
                );
                for cap in &report.missing {
                    println!("{}: uses \"{cap}\" without require", path.display());
                }
            }
            Err(e) => {
                println!("{}: {e}", path.display());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} script(s) failed to parse", paths.len());
    }
    Ok(())
}

/// `.../etc/example.com/chris/filter` -> `chris`; `vacation.yaml` -> `vacation`.
fn mailbox_label(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    if stem == "filter" {
        if let Some(parent) = input
            .parent()
            .and_then(Path::file_name)
            .map(|p| p.to_string_lossy().into_owned())
        {
            return parent;
        }
    }
    if stem.is_empty() {
        "filters".to_string()
    } else {
        stem
    }
}

fn combined_name(input: &Path, settings: &Settings) -> String {
    settings
        .combined_name
        .clone()
        .unwrap_or_else(|| mailbox_label(input))
}

/// First of `label`, `label-2`, `label-3`, ... not handed out yet.
fn unique_subdir(taken: &mut HashSet<String>, label: &str) -> String {
    let mut name = label.to_string();
    let mut n = 1;
    while !taken.insert(name.clone()) {
        n += 1;
        name = format!("{label}-{n}");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_label() {
        assert_eq!(mailbox_label(Path::new("/home/u/etc/example.com/chris/filter")), "chris");
        assert_eq!(mailbox_label(Path::new("/home/u/etc/example.com/chris/filter.yaml")), "chris");
        assert_eq!(mailbox_label(Path::new("exports/sales.yaml")), "sales");
        assert_eq!(mailbox_label(Path::new("filter")), "filter");
    }

    #[test]
    fn test_unique_subdir() {
        let mut taken = HashSet::new();
        assert_eq!(unique_subdir(&mut taken, "chris"), "chris");
        assert_eq!(unique_subdir(&mut taken, "chris"), "chris-2");
        assert_eq!(unique_subdir(&mut taken, "anna"), "anna");
    }

    #[test]
    fn test_unique_subdir_skips_generated_names() {
        let mut taken = HashSet::new();
        let subdirs: Vec<_> = ["chris", "chris", "chris-2"]
            .iter()
            .map(|label| unique_subdir(&mut taken, label))
            .collect();
        assert_eq!(subdirs, vec!["chris", "chris-2", "chris-2-2"]);
    }

    fn write_filter(root: &Path, mailbox: &str, subject: &str) -> PathBuf {
        let dir = root.join(mailbox);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("filter");
        let text = format!(
            "#Lists\nif $header_subject: contains \"{subject}\"\nthen\nsave \"$home/mail/example.com/{mailbox}/.Lists\"\nendif\n"
        );
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_convert_gives_each_input_its_own_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let inputs = vec![
            write_filter(&tmp.path().join("a"), "chris", "first"),
            write_filter(&tmp.path().join("b"), "chris", "second"),
            write_filter(&tmp.path().join("c"), "chris-2", "third"),
        ];
        let out = tmp.path().join("out");
        let settings = Settings {
            output_dir: out.clone(),
            combine: false,
            ..Settings::default()
        };

        convert(&inputs, &settings).unwrap();

        let first = std::fs::read_to_string(out.join("chris/Lists.sieve")).unwrap();
        let second = std::fs::read_to_string(out.join("chris-2/Lists.sieve")).unwrap();
        let third = std::fs::read_to_string(out.join("chris-2-2/Lists.sieve")).unwrap();
        assert!(first.contains("\"first\""));
        assert!(second.contains("\"second\""));
        assert!(third.contains("\"third\""));
    }

    #[test]
    fn test_convert_single_input_writes_combined_script() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_filter(tmp.path(), "chris", "hello");
        let out = tmp.path().join("out");
        let settings = Settings {
            output_dir: out.clone(),
            ..Settings::default()
        };

        convert(&[input], &settings).unwrap();

        let script = std::fs::read_to_string(out.join("chris.sieve")).unwrap();
        assert!(script.starts_with("require [\"fileinto\"];"));
        assert!(script.contains("# Filter: Lists"));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["exim2sieve", "convert", "a/filter", "b/filter", "--per-filter", "-o", "out"])
            .unwrap();
        match cli.command {
            Command::Convert { inputs, out, per_filter, .. } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(out, Some(PathBuf::from("out")));
                assert!(per_filter);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
