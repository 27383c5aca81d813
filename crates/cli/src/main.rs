use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing_subscriber::fmt::SubscriberBuilder;

use wirecell_wires::{validate, Level, Loader};

/// Load, correct, and validate a wire geometry file.
#[derive(Parser)]
#[command(name = "wirecell-validate")]
struct Cli {
    /// Wire geometry file to load; resolved against -P if not found as given
    input: String,

    /// Write the (possibly corrected) geometry here
    #[arg(short = 'o')]
    out: Option<String>,

    /// Correct up through level {1..4}: 1=load, 2=order, 3=direction, 4=pitch.
    /// Only takes effect when -o is also given.
    #[arg(short = 'c', value_parser = clap::value_parser!(u8).range(1..=4))]
    correct: Option<u8>,

    /// Validate the resulting geometry
    #[arg(short = 'v')]
    validate: bool,

    /// Stop at the first violation instead of collecting every one
    #[arg(short = 'f')]
    fail_fast: bool,

    /// Relative tolerance for validation's approximate-equality checks
    #[arg(short = 'e', default_value_t = 1e-6)]
    epsilon: f64,

    /// Colon-separated directories resolving an unqualified input name
    #[arg(short = 'P')]
    path: Option<String>,
}

fn resolve(name: &str, search_path: Option<&str>) -> anyhow::Result<PathBuf> {
    let p = Path::new(name);
    if p.is_absolute() || p.exists() {
        return Ok(p.to_path_buf());
    }
    for dir in search_path.unwrap_or_default().split(':') {
        if dir.is_empty() {
            continue;
        }
        let candidate = Path::new(dir).join(name);
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(anyhow!("could not find \"{name}\" directly or on the search path"))
}

fn main() -> ExitCode {
    SubscriberBuilder::default().with_target(false).init();
    match run(&Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let input_path = resolve(&cli.input, cli.path.as_deref())?;
    let loader = Loader::new();

    // Corrections are only meaningful when they'll be written back out;
    // a bare `-v` validates exactly what was on disk.
    let level = if cli.out.is_some() {
        cli.correct.and_then(Level::from_count).unwrap_or(Level::Load)
    } else {
        Level::Load
    };

    let store = loader.load(&input_path, level).with_context(|| format!("loading {}", input_path.display()))?;

    if let Some(out) = &cli.out {
        loader.dump(Path::new(out), &store).with_context(|| format!("writing {out}"))?;
    }

    if cli.validate {
        tracing::info!(path = %input_path.display(), level = ?level, "validating");
        validate(&store, cli.epsilon, cli.fail_fast).map_err(|e| anyhow!("{e}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prefers_the_literal_path_when_it_exists() {
        let mut path = std::env::temp_dir();
        path.push(format!("wc-cli-resolve-test-{}.txt", std::process::id()));
        std::fs::write(&path, b"x").unwrap();

        let found = resolve(path.to_str().unwrap(), Some("/nonexistent")).unwrap();
        assert_eq!(found, path);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn resolve_falls_back_to_search_path_entries_in_order() {
        let dir = std::env::temp_dir().join(format!("wc-cli-resolve-dir-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let name = "geometry.json";
        std::fs::write(dir.join(name), b"x").unwrap();

        let search = format!("/nonexistent:{}", dir.display());
        let found = resolve(name, Some(&search)).unwrap();
        assert_eq!(found, dir.join(name));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn resolve_errors_when_nothing_matches() {
        assert!(resolve("does-not-exist.json", Some("/nonexistent")).is_err());
    }
}
