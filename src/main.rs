use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use docx_reform::batch::{self, Batch};
use docx_reform::config::{Config, DEFAULT_MIN_WORDS, LowWordAction};
use docx_reform::convert::{Converter, Soffice, Unavailable};
use docx_reform::events::{EventLog, EventSink, Fanout, StatusStream};
use docx_reform::model::{AuthorLayout, StyleChoice};
use docx_reform::pipeline::ProcessOptions;
use docx_reform::report::{CsvReport, ReportExporter, WordCountSummary, write_titles_csv};
use docx_reform::{Error, Result};

#[derive(Parser)]
#[command(name = "docx-reform", version, about)]
struct Cli {
    /// JSON configuration file; command-line flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the `soffice` executable, enables legacy .doc input
    #[arg(long, global = true)]
    libreoffice: Option<PathBuf>,

    /// Leading digits of student-id lines and numbered file names
    #[arg(long, global = true)]
    id_prefix: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Re-format documents into the output directory
    Process(ProcessArgs),
    /// List the title of every document
    Titles {
        /// Input file or directory
        input: PathBuf,
        /// Also write the list as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Count words without producing documents
    Count {
        /// Input file or directory
        input: PathBuf,
        #[arg(long, default_value_t = DEFAULT_MIN_WORDS)]
        min_words: usize,
        /// Write a CSV report
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    Default,
    Formal,
}

#[derive(Args)]
struct ProcessArgs {
    /// Input file or directory
    input: PathBuf,

    /// Output root directory
    #[arg(short, long)]
    output: PathBuf,

    #[arg(long, value_enum)]
    style: Option<StyleArg>,

    /// Subtitle and filename suffix text
    #[arg(long, conflicts_with = "no_suffix")]
    suffix: Option<String>,

    #[arg(long)]
    no_suffix: bool,

    /// Do not add an author line or put the author in the file name
    #[arg(long)]
    no_author: bool,

    /// Name files `author-title` instead of `(author)title`
    #[arg(long)]
    hyphenated: bool,

    /// Collect all images at the end of the document
    #[arg(long)]
    images_at_end: bool,

    /// Enable the word-count gate with this threshold
    #[arg(long)]
    min_words: Option<usize>,

    /// Copy documents below the threshold into a separate folder instead of marking them
    #[arg(long)]
    move_low: bool,

    /// Worker threads
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Write a word-count CSV report
    #[arg(long)]
    report: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(path) = &cli.libreoffice {
        config.libreoffice = Some(path.clone());
    }
    if let Some(prefix) = &cli.id_prefix {
        config.id_prefix = prefix.clone();
    }
    Ok(config)
}

fn apply_process_args(config: &mut Config, args: &ProcessArgs) {
    if let Some(style) = args.style {
        config.style = match style {
            StyleArg::Default => StyleChoice::Default,
            StyleArg::Formal => StyleChoice::Formal,
        };
    }
    if let Some(suffix) = &args.suffix {
        config.suffix_enabled = true;
        config.suffix_text = suffix.clone();
    }
    if args.no_suffix {
        config.suffix_enabled = false;
    }
    if args.no_author {
        config.show_author_info = false;
    }
    if args.hyphenated {
        config.author_layout = AuthorLayout::Hyphenated;
    }
    if args.images_at_end {
        config.keep_image_position = false;
    }
    if args.min_words.is_some() {
        config.min_words = args.min_words;
    }
    if args.move_low {
        config.low_word_action = LowWordAction::Move;
        config.min_words.get_or_insert(DEFAULT_MIN_WORDS);
    }
    if args.jobs.is_some() {
        config.jobs = args.jobs;
    }
    if args.report.is_some() {
        config.report = args.report.clone();
    }
}

fn converter(config: &Config) -> Box<dyn Converter> {
    match &config.libreoffice {
        Some(program) => Box::new(Soffice::new(program)),
        None => Box::new(Unavailable),
    }
}

fn inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        batch::discover(path)
    } else if path.is_file() {
        Ok(vec![path.to_path_buf()])
    } else {
        Err(Error::InputNotFound(path.to_path_buf()))
    }
}

fn run(cli: Cli) -> Result<bool> {
    let mut config = load_config(&cli)?;
    let stream = StatusStream::new(std::io::stdout());

    match &cli.command {
        Command::Process(args) => {
            apply_process_args(&mut config, args);
            config.validate()?;
            let files = inputs(&args.input)?;
            let options = ProcessOptions::from_config(&config);
            let converter = converter(&config);
            let log = EventLog::new();
            let sink = Fanout::new(vec![&stream as &dyn EventSink, &log]);
            let summary = Batch::new(&options, converter.as_ref(), &sink)
                .with_jobs(config.jobs)
                .run(&files, &args.output)?;
            if let Some(path) = &config.report {
                let threshold = config.min_words.unwrap_or(DEFAULT_MIN_WORDS);
                CsvReport::new(path).export(&summary.report_rows(), threshold)?;
            }
            println!("\n{summary}");
            let failed = log.error_files();
            if !failed.is_empty() {
                let names: Vec<&str> = failed.iter().map(String::as_str).collect();
                println!("失败文件：{}", names.join("、"));
            }
            Ok(failed.is_empty())
        }
        Command::Titles { input, csv } => {
            let files = inputs(input)?;
            let rows = batch::extract_titles(&files, &config.id_prefix, converter(&config).as_ref(), &stream);
            for row in &rows {
                let author = row.author.as_deref().unwrap_or(docx_reform::report::UNKNOWN_AUTHOR);
                println!("{} ({author}): {}", row.filename, row.title);
            }
            if let Some(path) = csv {
                write_titles_csv(path, &rows)?;
            }
            Ok(rows.len() == files.len())
        }
        Command::Count {
            input,
            min_words,
            report,
        } => {
            let files = inputs(input)?;
            let rows = batch::collect_stats(&files, &config.id_prefix, converter(&config).as_ref(), &stream);
            for row in docx_reform::report::sorted_rows(&rows) {
                let author = row.author.as_deref().unwrap_or(docx_reform::report::UNKNOWN_AUTHOR);
                let status = if row.passes(*min_words) { "合格" } else { "不足" };
                println!(
                    "{} ({author}): {} 字 ({} 段落, {} 字符) - {status}",
                    row.filename, row.stats.word_count, row.stats.paragraph_count, row.stats.character_count
                );
            }
            println!("\n{}", WordCountSummary::from_rows(&rows, *min_words));
            if let Some(path) = report {
                CsvReport::new(path).export(&rows, *min_words)?;
            }
            Ok(rows.len() == files.len())
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}
