use clap::{Parser, Subcommand};
use file_filters::aggregate::RunReport;
use file_filters::config::{self, OtherFilePolicy, RunConfig};
use file_filters::{output, process};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "file-filters")]
#[command(about = "Apply colour filters to every image in a directory, in parallel")]
#[command(long_about = "\
Apply colour filters to every image in a directory, in parallel

Every file under INPUT is run through every selected filter. Work is split
across a fixed number of workers, largest images first, so the run finishes
as early as the slowest worker allows.

Output layout:

  default                          --sort-by-filter
  output/                          output/
  ├── cat.jpg/                     ├── white_black/
  │   ├── white_black.png          │   ├── cat.jpg.png
  │   └── only_red.png             │   └── notes.txt
  └── notes.txt/                   └── only_red/
      └── white_black.txt              └── cat.jpg.png

Non-image files are copied, templated ({{FILTER}}, {{filter}} and
{{filter name}} are replaced) or skipped, per --other-files.

Run 'file-filters filters' for the filter names and 'file-filters gen-config'
for a documented config.toml.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter every file under INPUT into OUTPUT
    Run(RunArgs),
    /// List the available filters
    Filters,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Image file or directory to filter
    input: PathBuf,

    /// Directory for the filtered results
    output: PathBuf,

    /// Comma-separated filter names (default: all)
    #[arg(short, long, value_delimiter = ',')]
    filters: Option<Vec<String>>,

    /// Number of parallel workers (1-61)
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Group output by filter instead of by source file
    #[arg(short, long)]
    sort_by_filter: bool,

    /// What to do with non-image files: copy, template or skip
    #[arg(long)]
    other_files: Option<OtherFilePolicy>,

    /// Text encoding for templated files
    #[arg(long)]
    encoding: Option<String>,

    /// Config file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON report of every outcome to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Apply filters but write nothing
    #[arg(long)]
    dry_run: bool,
}

impl RunArgs {
    /// Layer command-line flags over the loaded config.
    fn apply_to(&self, mut config: RunConfig) -> Result<RunConfig, config::ConfigError> {
        if let Some(filters) = &self.filters {
            config.filters = Some(filters.clone());
        }
        if let Some(threads) = self.threads {
            config.workers = threads;
        }
        if self.sort_by_filter {
            config.sort_by_filter = true;
        }
        if let Some(policy) = self.other_files {
            config.other_files = policy;
        }
        if let Some(encoding) = &self.encoding {
            config.encoding = encoding.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(&args)?,
        Command::Filters => output::print_filter_list(),
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }

    Ok(())
}

fn run(args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config = args.apply_to(config::load_config(args.config.as_deref())?)?;
    let request = process::ProcessRequest {
        input: cwd.join(&args.input),
        output: cwd.join(&args.output),
        config,
        dry_run: args.dry_run,
    };
    output::print_run_header(&request);

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = process::process(&request, Some(tx));
    if printer.join().is_err() {
        log::error!("progress printer panicked");
    }

    match result {
        Ok(report) => {
            finish(&report, args.report.as_deref(), &request.output)?;
            Ok(())
        }
        Err(err) => {
            if let Some(report) = err.report() {
                finish(report, args.report.as_deref(), &request.output)?;
            }
            Err(err.into())
        }
    }
}

/// Print the summary and write the JSON report if one was asked for.
fn finish(
    report: &RunReport,
    report_path: Option<&Path>,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json)?;
    }
    output::print_summary(&report.summary, output_dir);
    Ok(())
}
