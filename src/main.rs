use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

use layerdiff::{compare_snapshots, DiffType, ErrorPolicy, LayerScanner, LayerSnapshot, Notifier};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Verbose mode (-v for info, -vv for debug, -vvv for trace). Also disables the spinner"
    )]
    verbose: u8,

    #[arg(
        long,
        global = true,
        help = "Skip paths that cannot be read instead of aborting"
    )]
    skip_unreadable: bool,
}

#[derive(Args)]
struct LayerInfo {
    #[arg(long, default_value_t = 0, help = "Position of the layer within the image")]
    index: usize,

    #[arg(long, default_value = "", help = "Layer content digest")]
    id: String,

    #[arg(long, default_value = "", help = "Alternate layer digest (defaults to --id)")]
    digest_id: String,

    #[arg(long, default_value = "", help = "Build instruction that created the layer")]
    command: String,

    #[arg(long, help = "Pretty-print the JSON output")]
    pretty: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Export the file records of a layer tarball as JSON
    Scan {
        #[arg(help = "Layer tarball (plain or gzip)")]
        tarball: PathBuf,

        #[command(flatten)]
        layer: LayerInfo,
    },
    /// Export the file records of an unpacked layer directory as JSON
    ScanDir {
        #[arg(help = "Directory holding the unpacked layer")]
        dir: PathBuf,

        #[command(flatten)]
        layer: LayerInfo,
    },
    /// Classify the paths two layers have in common
    Diff {
        #[arg(help = "Earlier layer (tarball or directory)")]
        old: PathBuf,

        #[arg(help = "Later layer (tarball or directory)")]
        new: PathBuf,

        #[arg(short, long, help = "Also list unmodified paths")]
        all: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let notifier = Notifier::new(cli.verbose);

    let policy = if cli.skip_unreadable {
        ErrorPolicy::Skip
    } else {
        ErrorPolicy::Abort
    };
    notifier.debug(&format!("Error policy: {:?}", policy));
    let scanner = LayerScanner::new(policy, &notifier);

    match cli.command {
        Command::Scan { tarball, layer } => {
            let snapshot = scanner.scan_tarball(&tarball)?;
            notifier.finish();
            write_export(snapshot, layer)?;
        }
        Command::ScanDir { dir, layer } => {
            let snapshot = scanner.scan_directory(&dir)?;
            notifier.finish();
            write_export(snapshot, layer)?;
        }
        Command::Diff { old, new, all } => {
            let previous = scanner.scan_path(&old)?;
            let current = scanner.scan_path(&new)?;

            let verdicts = compare_snapshots(&previous, &current);
            let modified = verdicts
                .iter()
                .filter(|v| v.verdict == DiffType::Modified)
                .count();
            notifier.info(&format!(
                "{} common paths, {} modified",
                verdicts.len(),
                modified
            ));
            notifier.finish();

            let stdout = io::stdout();
            let mut out = stdout.lock();
            for v in &verdicts {
                if all || v.verdict == DiffType::Modified {
                    writeln!(out, "{}\t{}", v.verdict, v.path)?;
                }
            }
        }
    }

    Ok(())
}

fn write_export(snapshot: LayerSnapshot, layer: LayerInfo) -> Result<()> {
    let digest_id = if layer.digest_id.is_empty() {
        layer.id.clone()
    } else {
        layer.digest_id
    };
    let export = snapshot.into_export(layer.index, layer.id, digest_id, layer.command);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    export.write_json(&mut out, layer.pretty)?;
    writeln!(out)?;
    Ok(())
}
