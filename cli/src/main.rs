//! surfsrc - Surface source file utility
//!
//! Validates settings documents and inspects, converts and compares the
//! files written by the surface source recorder.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use surface_source_core_rs::config::fingerprint;
use surface_source_core_rs::io::DEFAULT_RTOL;
use surface_source_core_rs::{
    compare_banks, read_source_file, write_source_file, RecorderConfig, SourceFormat,
    SurfaceSourceRecorder,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: surfsrc <command> [args]

commands:
  check-config <settings.json>      validate a recorder settings document
  inspect <file>                    summarize a surface source file
  convert <in> <out>                rewrite a file in the format of <out>
  diff <a> <b> [--rtol X]           compare two files as unordered sets";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        bail!("missing command\n\n{}", USAGE);
    };
    debug!(command = %command, args = ?rest, "surfsrc");

    match command.as_str() {
        "check-config" => match rest {
            [path] => check_config(Path::new(path)),
            _ => bail!("check-config takes one settings file\n\n{}", USAGE),
        },
        "inspect" => match rest {
            [path] => inspect(Path::new(path)),
            _ => bail!("inspect takes one file\n\n{}", USAGE),
        },
        "convert" => match rest {
            [input, output] => convert(Path::new(input), Path::new(output)),
            _ => bail!("convert takes an input and an output file\n\n{}", USAGE),
        },
        "diff" => {
            let (files, rtol) = parse_diff_args(rest)?;
            diff(&files[0], &files[1], rtol)
        }
        "-h" | "--help" | "help" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }
}

fn parse_diff_args(args: &[String]) -> Result<([PathBuf; 2], f64)> {
    let mut files = Vec::new();
    let mut rtol = DEFAULT_RTOL;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--rtol" => {
                let value = iter.next().context("--rtol needs a value")?;
                rtol = value
                    .parse()
                    .with_context(|| format!("invalid --rtol value '{}'", value))?;
                if rtol.is_nan() || rtol < 0.0 {
                    bail!("--rtol must be non-negative, got {}", rtol);
                }
            }
            _ => files.push(PathBuf::from(arg)),
        }
    }
    match <[PathBuf; 2]>::try_from(files) {
        Ok(files) => Ok((files, rtol)),
        Err(_) => bail!("diff takes two files\n\n{}", USAGE),
    }
}

fn check_config(path: &Path) -> Result<()> {
    let config = RecorderConfig::from_path(path)?;
    match SurfaceSourceRecorder::from_config(&config)? {
        Some(recorder) => {
            let filter = recorder.filter();
            println!("surf_source_write: ok");
            println!("  max_particles: {}", filter.max_particles());
            match filter.surface_ids() {
                Some(ids) => println!("  surface_ids:   {:?}", ids),
                None => println!("  surface_ids:   all"),
            }
            match filter.cell_restriction() {
                Some(cell) => println!("  {}: {}", cell.key(), cell.cell()),
                None => println!("  cell filter:   none"),
            }
            println!("  seed:          {}", config.seed);
            println!(
                "  output:        {} ({:?})",
                config.output.path.display(),
                config.output.resolved_format()
            );
            println!("  fingerprint:   {}", recorder.fingerprint()?);
        }
        None => println!("surf_source_write not configured, no file will be written"),
    }
    info!(config = %fingerprint(&config)?, "settings valid");
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let bank = read_source_file(path)?;
    println!("{}", path.display());
    println!("  records:       {}", bank.len());
    println!("  max_particles: {}", bank.max_particles);
    println!("  seen:          {}", bank.seen_count);

    if bank.is_empty() {
        return Ok(());
    }

    let mut surfaces: Vec<(i32, usize)> = Vec::new();
    for site in &bank.sites {
        match surfaces.iter_mut().find(|(id, _)| *id == site.surf_id) {
            Some((_, count)) => *count += 1,
            None => surfaces.push((site.surf_id, 1)),
        }
    }
    surfaces.sort_unstable();
    println!("  per surface:");
    for (id, count) in surfaces {
        println!("    {:>8}: {}", id, count);
    }

    let total_weight: f64 = bank.sites.iter().map(|s| s.wgt).sum();
    let (e_min, e_max) = bank
        .sites
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.e), hi.max(s.e))
        });
    println!("  total weight:  {:.6e}", total_weight);
    println!("  energy range:  {:.6e} .. {:.6e} eV", e_min, e_max);
    Ok(())
}

fn convert(input: &Path, output: &Path) -> Result<()> {
    let format = SourceFormat::from_path(output).with_context(|| {
        format!(
            "cannot infer output format from {} (use .ssrc or .json)",
            output.display()
        )
    })?;
    let bank = read_source_file(input)?;
    write_source_file(output, &bank, format)?;
    println!(
        "{} -> {} ({} records)",
        input.display(),
        output.display(),
        bank.len()
    );
    Ok(())
}

fn diff(a: &Path, b: &Path, rtol: f64) -> Result<()> {
    let expected = read_source_file(a).with_context(|| format!("reading {}", a.display()))?;
    let actual = read_source_file(b).with_context(|| format!("reading {}", b.display()))?;

    if expected.seen_count != actual.seen_count {
        println!(
            "note: seen counts differ ({} vs {})",
            expected.seen_count, actual.seen_count
        );
    }
    compare_banks(&expected.sites, &actual.sites, rtol)
        .with_context(|| format!("{} and {} differ", a.display(), b.display()))?;
    println!("{} records match (rtol {:e})", expected.len(), rtol);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_diff_args_default_rtol() {
        let (files, rtol) = parse_diff_args(&args(&["a.ssrc", "b.ssrc"])).unwrap();
        assert_eq!(files[1], PathBuf::from("b.ssrc"));
        assert_eq!(rtol, DEFAULT_RTOL);
    }

    #[test]
    fn test_diff_args_rtol_anywhere() {
        let (files, rtol) =
            parse_diff_args(&args(&["--rtol", "1e-3", "a.json", "b.ssrc"])).unwrap();
        assert_eq!(files[0], PathBuf::from("a.json"));
        assert_eq!(rtol, 1e-3);
    }

    #[test]
    fn test_diff_args_rejected() {
        assert!(parse_diff_args(&args(&["a.ssrc"])).is_err());
        assert!(parse_diff_args(&args(&["a", "b", "--rtol"])).is_err());
        assert!(parse_diff_args(&args(&["a", "b", "--rtol", "-1"])).is_err());
        assert!(parse_diff_args(&args(&["a", "b", "--rtol", "x"])).is_err());
    }
}
