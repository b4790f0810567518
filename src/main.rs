use bbfs::{extract_to_dir, read_file_list, Archive, Catalog, FormatProfile};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bbfs", about = "Inspect and extract BBFS game containers")]
struct Cli {
    /// Format profile (JSON) with the cipher keys and checksum variants
    #[arg(short, long, global = true)]
    profile: Option<PathBuf>,
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show container header and bucket statistics
    Info {
        container: PathBuf,
    },
    /// Look names up and print their file records
    Resolve {
        /// Container to search; repeat for more, in priority order
        #[arg(short, long = "archive", required = true)]
        archives: Vec<PathBuf>,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Extract files to a directory
    Extract {
        #[arg(short, long = "archive", required = true)]
        archives: Vec<PathBuf>,
        /// Text file with one name per line
        #[arg(short, long)]
        list: Option<PathBuf>,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
        /// Print a BLAKE3 digest of every extracted file
        #[arg(long)]
        digest: bool,
        names: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let profile_path = cli.profile.ok_or("--profile is required")?;
    let profile = FormatProfile::load(&profile_path)?;

    match cli.command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { container } => {
            let ar = Archive::open(&container, &profile)?;
            let used = ar.directory().iter().filter(|b| b.count > 0).count();
            println!("── BBFS container ───────────────────────────────────────");
            println!("  Path           {}", container.display());
            println!("  Version        {}", ar.version());
            println!("  TOC length     {} B", ar.toc_length());
            println!("  Entries        {}", ar.entry_count());
            println!("  Hash size      {}", ar.hash_size());
            println!("  Used buckets   {used}");
        }

        // ── Resolve ──────────────────────────────────────────────────────────
        Commands::Resolve { archives, names } => {
            let catalog = Catalog::open_all(&archives, &profile)?;
            let mut missing = 0usize;
            for name in &names {
                match catalog.resolve(name) {
                    Ok((ar, entry)) => {
                        let rec = ar.record(&entry)?;
                        println!("{name}");
                        println!("  archive      {}", ar.path().display());
                        println!("  entry        0x{:08X} (bucket {})", entry.entry_offset, entry.bucket);
                        println!("  checksum     {:016X}", entry.checksum);
                        println!("  flags        0x{:04X}", rec.flags);
                        println!("  offset       0x{:08X}", rec.file_offset);
                        println!("  size         {} B ({} B stored)", rec.uncompressed_size, rec.compressed_size);
                    }
                    Err(e) if e.is_not_found() => {
                        println!("{name}\n  not found");
                        missing += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            if missing > 0 {
                return Err(format!("{missing} of {} name(s) not found", names.len()).into());
            }
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { archives, list, output_dir, digest, mut names } => {
            if let Some(list) = &list {
                names.extend(read_file_list(list)?);
            }
            if names.is_empty() {
                return Err("nothing to extract: give names or --list".into());
            }
            let catalog = Catalog::open_all(&archives, &profile)?;
            let report = extract_to_dir(&catalog, &names, &output_dir);

            for file in &report.extracted {
                if digest {
                    println!("{}  {}", hex::encode(file.digest.as_bytes()), file.name);
                } else {
                    println!("  extracted  {} ({} B)", file.path.display(), file.size);
                }
            }
            for name in &report.missing {
                eprintln!("  missing    {name}");
            }
            for (name, err) in &report.failed {
                eprintln!("  failed     {name}: {err}");
            }
            println!(
                "{} extracted, {} missing, {} failed",
                report.extracted.len(),
                report.missing.len(),
                report.failed.len()
            );
            if !report.failed.is_empty() {
                return Err(format!("{} extraction(s) failed", report.failed.len()).into());
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
