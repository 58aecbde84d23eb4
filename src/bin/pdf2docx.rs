//! CLI binary for edgequake-pdf2docx.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and prints results.
//!
//! `pdf2docx convert` keeps a fixed stdout contract for scripts that wrap it:
//! the single line `success`, or `error: <message>` with a non-zero exit.
//! Logs always go to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdf2docx::pipeline::{archive, input};
use edgequake_pdf2docx::server;
use edgequake_pdf2docx::{
    BatchProgressCallback, ConversionConfig, ConversionOutcome, ConvertError, Converter,
    DocumentReport, Failure, PageRange, ProgressCallback, ServerConfig, SourceDocument,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Renders a live progress bar with one log line per finished document.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_documents} documents…"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, report: &DocumentReport) {
        let elapsed = dim(&format!("{:.1}s", report.duration_ms as f64 / 1000.0));
        let line = match &report.outcome {
            ConversionOutcome::Success(doc) => format!(
                "  {} {:>3}/{:<3}  {}  {}  {}",
                green("✓"),
                index + 1,
                total,
                report.output_name,
                dim(&format!("{:?}, pages {}", doc.path, doc.page_range)),
                elapsed,
            ),
            ConversionOutcome::Failure(failure) => format!(
                "  {} {:>3}/{:<3}  {}  {}  {}",
                red("✗"),
                index + 1,
                total,
                report.name,
                red(&failure.reason),
                elapsed,
            ),
        };
        self.bar.println(line);
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total: usize, _succeeded: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one document (prints "success" or "error: <message>")
  pdf2docx convert report.pdf report.docx

  # Only pages 3 to 7 (text-layer documents only; scans are always whole)
  pdf2docx convert --pages 3-7 report.pdf excerpt.docx

  # Convert from URL
  pdf2docx convert https://arxiv.org/pdf/1706.03762 attention.docx

  # Several documents into one zip, or into a directory
  pdf2docx batch a.pdf b.pdf scan.pdf -o converted_files.zip
  pdf2docx batch *.pdf -o out/

  # Page count, encryption, metadata and the path that would be taken
  pdf2docx inspect report.pdf --json

  # HTTP upload service
  pdf2docx serve --host 0.0.0.0 --port 8000

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  PDF2DOCX_*              Every flag, e.g. PDF2DOCX_DPI=300
  RUST_LOG                Override log filtering (logs go to stderr)

SETUP:
  pdfium must be loadable: set PDFIUM_LIB_PATH, place the library in the
  working directory, or install it system-wide. Scanned documents also need
  the tesseract executable (apt install tesseract-ocr).
"#;

/// Convert PDF documents to Word.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2docx",
    version,
    about = "Convert PDF documents to Word (.docx), with OCR for scanned pages",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    engine: EngineArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2DOCX_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Rendering DPI for OCR (72–400).
    #[arg(long, global = true, env = "PDF2DOCX_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Maximum rendered image dimension in pixels.
    #[arg(long, global = true, env = "PDF2DOCX_MAX_PIXELS", default_value_t = 2500)]
    max_pixels: u32,

    /// Tesseract language(s), e.g. eng or eng+fra.
    #[arg(long, global = true, env = "PDF2DOCX_OCR_LANGUAGE", default_value = "eng")]
    ocr_language: String,

    /// Tesseract executable.
    #[arg(long, global = true, env = "PDF2DOCX_TESSERACT", default_value = "tesseract")]
    tesseract: String,

    /// Path to the pdfium library (file or directory).
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Documents converted at the same time in a batch.
    #[arg(short, long, global = true, env = "PDF2DOCX_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Do not rebuild tables from column-aligned text.
    #[arg(long, global = true, env = "PDF2DOCX_NO_TABLES")]
    no_tables: bool,

    /// Do not copy embedded images.
    #[arg(long, global = true, env = "PDF2DOCX_NO_IMAGES")]
    no_images: bool,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, global = true, env = "PDF2DOCX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one PDF to one Word document.
    Convert {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,
        /// Where to write the .docx.
        output: PathBuf,
        /// Page range, e.g. 3-15 or 5 (ignored for scanned documents).
        #[arg(long, env = "PDF2DOCX_PAGES")]
        pages: Option<PageRange>,
    },

    /// Convert several PDFs; write a zip or a directory of .docx files.
    Batch {
        /// Local PDF file paths or HTTP/HTTPS URLs.
        #[arg(required = true)]
        inputs: Vec<String>,
        /// A `.zip` path, or a directory.
        #[arg(short, long, default_value = "converted_files.zip")]
        output: PathBuf,
        /// Disable progress bar.
        #[arg(long, env = "PDF2DOCX_NO_PROGRESS")]
        no_progress: bool,
    },

    /// Print page count, encryption, metadata and the conversion path.
    Inspect {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,
        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP upload service.
    Serve {
        #[arg(long, env = "PDF2DOCX_HOST", default_value = "127.0.0.1")]
        host: String,
        #[arg(long, env = "PDF2DOCX_PORT", default_value_t = 8000)]
        port: u16,
        /// Largest accepted upload, in MiB.
        #[arg(long, env = "PDF2DOCX_MAX_UPLOAD_MB", default_value_t = 50)]
        max_upload_mb: usize,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // `convert` owns stdout and the batch bar owns the terminal, so library
    // INFO logs stay hidden unless asked for.
    let quiet_command = match &cli.command {
        Command::Convert { .. } => true,
        Command::Batch { no_progress, .. } => !no_progress,
        Command::Inspect { .. } | Command::Serve { .. } => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || quiet_command {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Convert {
            input,
            output,
            pages,
        } => Ok(run_convert(&cli.engine, input, output, *pages).await),
        Command::Batch {
            inputs,
            output,
            no_progress,
        } => {
            let show_progress = !cli.quiet && !no_progress;
            run_batch(&cli.engine, inputs, output, show_progress, cli.quiet).await
        }
        Command::Inspect { input, json } => run_inspect(&cli.engine, input, *json).await,
        Command::Serve {
            host,
            port,
            max_upload_mb,
        } => {
            let config = build_config(&cli.engine, None).context("Invalid configuration")?;
            let server_config = ServerConfig {
                host: host.clone(),
                port: *port,
                max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            };
            server::serve(Arc::new(Converter::new(config)), &server_config)
                .await
                .context("Server failed")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `convert`: the `success` / `error: <message>` contract.
async fn run_convert(
    engine: &EngineArgs,
    input_str: &str,
    output: &Path,
    pages: Option<PageRange>,
) -> ExitCode {
    let outcome = async {
        let config = build_config(engine, None).map_err(Failure::from)?;
        let doc = input::load_source(input_str, engine.download_timeout)
            .await
            .map_err(Failure::from)?;
        Converter::new(config)
            .convert_to_file(doc, pages, output)
            .await
    }
    .await;

    match outcome {
        Ok(_) => {
            println!("success");
            ExitCode::SUCCESS
        }
        Err(failure) => {
            println!("error: {failure}");
            ExitCode::FAILURE
        }
    }
}

/// `batch`: convert everything, then write a zip or a directory.
async fn run_batch(
    engine: &EngineArgs,
    inputs: &[String],
    output: &Path,
    show_progress: bool,
    quiet: bool,
) -> Result<ExitCode> {
    let mut docs = Vec::with_capacity(inputs.len());
    let mut unreadable = 0usize;
    for input_str in inputs {
        match input::load_source(input_str, engine.download_timeout).await {
            Ok(doc) => docs.push(doc),
            Err(e) => {
                unreadable += 1;
                eprintln!("  {} {}  {}", red("✗"), input_str, red(&e.to_string()));
            }
        }
    }
    if docs.is_empty() {
        eprintln!("{} no readable inputs", red("✘"));
        return Ok(ExitCode::FAILURE);
    }

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(engine, progress).context("Invalid configuration")?;
    let converter = Converter::new(config);
    let result = converter.run_batch(docs).await;

    if !show_progress && !quiet {
        for report in &result.documents {
            print_report_line(report);
        }
    }

    let succeeded = result.stats.succeeded;
    if succeeded > 0 {
        write_batch_output(&result, output).await?;
    }

    if !quiet {
        let total = result.stats.total + unreadable;
        let failed = total - succeeded;
        eprintln!(
            "{}  {}/{} documents  {}ms{}",
            if failed == 0 { green("✔") } else if succeeded == 0 { red("✘") } else { cyan("⚠") },
            succeeded,
            total,
            result.stats.duration_ms,
            if succeeded > 0 {
                format!("  →  {}", bold(&output.display().to_string()))
            } else {
                String::new()
            },
        );
    }

    Ok(if succeeded == 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_report_line(report: &DocumentReport) {
    match &report.outcome {
        ConversionOutcome::Success(_) => {
            eprintln!("  {} {}  →  {}", green("✓"), report.name, report.output_name)
        }
        ConversionOutcome::Failure(failure) => {
            eprintln!("  {} {}  {}", red("✗"), report.name, red(&failure.reason))
        }
    }
}

async fn write_batch_output(result: &edgequake_pdf2docx::BatchResult, output: &Path) -> Result<()> {
    let is_zip = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));

    if is_zip {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        match &result.archive {
            Some(built) => {
                tokio::fs::copy(&built.path, output)
                    .await
                    .with_context(|| format!("Failed to write {}", output.display()))?;
            }
            None => {
                let entries: Vec<(String, PathBuf)> = result
                    .successes()
                    .map(|(r, d)| (r.output_name.clone(), d.output_path.clone()))
                    .collect();
                archive::write_archive(&entries, output)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
            }
        }
        return Ok(());
    }

    tokio::fs::create_dir_all(output)
        .await
        .with_context(|| format!("Failed to create {}", output.display()))?;
    for (report, doc) in result.successes() {
        let target = output.join(&report.output_name);
        tokio::fs::copy(&doc.output_path, &target)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;
    }
    Ok(())
}

/// `inspect`: metadata plus the classifier's verdict.
async fn run_inspect(engine: &EngineArgs, input_str: &str, json: bool) -> Result<ExitCode> {
    let config = build_config(engine, None).context("Invalid configuration")?;
    let doc: SourceDocument = input::load_source(input_str, engine.download_timeout)
        .await
        .context("Failed to read input")?;
    let report = Converter::new(config)
        .inspect_document(&doc)
        .await
        .context("Failed to inspect PDF")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
        return Ok(ExitCode::SUCCESS);
    }

    let info = &report.info;
    println!("File:         {}", report.name);
    if let Some(ref t) = info.title {
        println!("Title:        {}", t);
    }
    if let Some(ref a) = info.author {
        println!("Author:       {}", a);
    }
    if let Some(ref s) = info.subject {
        println!("Subject:      {}", s);
    }
    println!("Pages:        {}", info.page_count);
    if !info.pdf_version.is_empty() {
        println!("PDF Version:  {}", info.pdf_version);
    }
    println!("Encrypted:    {}", info.is_encrypted);
    println!("Text layer:   {}", report.classification.has_extractable_text);
    match report.planned_path {
        Some(path) => println!("Path:         {:?}", path),
        None => println!("Path:         rejected (password-protected)"),
    }
    if let Some(ref c) = info.creator {
        println!("Creator:      {}", c);
    }
    if let Some(ref p) = info.producer {
        println!("Producer:     {}", p);
    }
    if let Some(ref d) = info.creation_date {
        println!("Created:      {}", d);
    }
    if let Some(ref d) = info.modification_date {
        println!("Modified:     {}", d);
    }
    Ok(ExitCode::SUCCESS)
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    engine: &EngineArgs,
    progress: Option<ProgressCallback>,
) -> Result<ConversionConfig, ConvertError> {
    let mut builder = ConversionConfig::builder()
        .dpi(engine.dpi)
        .max_rendered_pixels(engine.max_pixels)
        .ocr_language(engine.ocr_language.clone())
        .tesseract_command(engine.tesseract.clone())
        .concurrency(engine.concurrency)
        .detect_tables(!engine.no_tables)
        .extract_images(!engine.no_images);
    if let Some(ref path) = engine.pdfium_lib {
        builder = builder.pdfium_library_path(path.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build()
}
