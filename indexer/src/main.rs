use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use filesearch_core::tokenizer::query_terms;
use filesearch_core::{crawl_file_tree, write_index, IndexFileReader, QueryProcessor, QueryResult};
use tracing_subscriber::{fmt, EnvFilter};

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, query and inspect on-disk inverted index files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a directory tree and write its index file
    Build {
        /// Root directory to crawl
        #[arg(long)]
        input: PathBuf,
        /// Index file to write
        #[arg(long)]
        output: PathBuf,
    },
    /// Interactive query loop over one or more index files
    Shell {
        /// Index files to search
        #[arg(required = true)]
        indices: Vec<PathBuf>,
        /// Skip the body checksum when opening index files
        #[arg(long, default_value_t = false)]
        no_validate: bool,
    },
    /// Print an index file's header and region layout
    Inspect {
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build_index(&input, &output),
        Commands::Shell { indices, no_validate } => {
            let qp = QueryProcessor::open(indices.as_slice(), !no_validate);
            if qp.num_indices() == 0 {
                bail!("none of the {} index files could be opened", indices.len());
            }
            let stdin = io::stdin();
            run_shell(&qp, stdin.lock(), io::stdout().lock())?;
            Ok(())
        }
        Commands::Inspect { file } => inspect(&file, &mut io::stdout().lock()),
    }
}

fn build_index(input: &Path, output: &Path) -> Result<()> {
    let (doc_table, index) =
        crawl_file_tree(input).with_context(|| format!("crawling {}", input.display()))?;
    let bytes = write_index(&index, &doc_table, output)
        .with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(output = %output.display(), bytes, "index build complete");
    Ok(())
}

/// Prompt, read a query line, print its results; stop at end of input.
fn run_shell<R: BufRead, W: Write>(qp: &QueryProcessor, input: R, mut out: W) -> io::Result<()> {
    let mut lines = input.lines();
    loop {
        writeln!(out, "Enter query:")?;
        out.flush()?;
        let Some(line) = lines.next() else { break };
        let terms = query_terms(&line?);
        if terms.is_empty() {
            continue;
        }
        print_results(&qp.process_query(&terms), &mut out)?;
    }
    writeln!(out)?;
    Ok(())
}

fn print_results<W: Write>(results: &[QueryResult], out: &mut W) -> io::Result<()> {
    if results.is_empty() {
        return writeln!(out, "  [no results]");
    }
    for r in results {
        writeln!(out, "  {} ({})", r.document_name, r.rank)?;
    }
    Ok(())
}

fn inspect<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    let file = IndexFileReader::open(path, true).with_context(|| format!("opening {}", path.display()))?;
    let h = file.header();
    writeln!(out, "file:            {}", path.display())?;
    writeln!(out, "magic:           {:#010x}", h.magic)?;
    writeln!(out, "checksum:        {:#010x}", h.checksum)?;
    writeln!(out, "doctable bytes:  {} (at {})", h.doctable_bytes, h.doctable_offset())?;
    writeln!(out, "index bytes:     {} (at {})", h.index_bytes, h.index_offset())?;
    writeln!(out, "doctable buckets: {}", file.doc_table_reader()?.num_buckets())?;
    writeln!(out, "index buckets:    {}", file.word_table_reader()?.num_buckets())?;
    Ok(())
}
