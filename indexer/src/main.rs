use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ferret_core::persist::{
    load_index, save_documents, save_meta, save_stats, save_vocabulary, IndexPaths, MetaFile,
};
use ferret_core::{
    merge_all, write_chunk, Chunk, DocId, Document, MemoryIndex, PostingsData, TermId, TermStats,
    Tokenizer, WordTokenizer,
};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, search, and classify over a term-document index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a corpus directory laid out as category/name
    Build {
        /// Corpus directory
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Documents per postings chunk flushed to disk
        #[arg(long, default_value_t = 512)]
        batch_size: usize,
        /// Merge worker threads (0 = all cores)
        #[arg(long, default_value_t = 0)]
        threads: usize,
    },
    /// Rank indexed documents against a query file
    Search {
        /// Index directory
        #[arg(long)]
        index: String,
        /// Query document path
        #[arg(long)]
        query: String,
        /// Number of results to print
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
    /// Assign a category to a query file by k-NN vote over ranked results
    Classify {
        /// Index directory
        #[arg(long)]
        index: String,
        /// Query document path
        #[arg(long)]
        query: String,
        /// Number of neighbors to vote
        #[arg(long, default_value_t = 5)]
        k: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, batch_size, threads } => {
            build_index(&input, &output, batch_size, threads)
        }
        Commands::Search { index, query, k } => search_index(&index, &query, k),
        Commands::Classify { index, query, k } => classify_query(&index, &query, k),
    }
}

fn discover_sources(input: &Path) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();
    // Deterministic doc ids across runs
    sources.sort();
    sources
}

fn build_index(input: &str, output: &str, batch_size: usize, threads: usize) -> Result<()> {
    let sources = discover_sources(Path::new(input));
    anyhow::ensure!(!sources.is_empty(), "no documents found under {input}");

    let paths = IndexPaths::new(output);
    let chunks_dir = paths.chunks_dir();
    fs::create_dir_all(&chunks_dir)?;

    let batch_size = batch_size.max(1);
    let mut tokenizer = WordTokenizer::new();
    let mut stats = TermStats::new();
    let mut documents: Vec<Document> = Vec::with_capacity(sources.len());
    let mut batch: HashMap<TermId, Vec<(DocId, u32)>> = HashMap::new();
    let mut batched_docs = 0usize;
    let mut chunks: Vec<Chunk<TermId, DocId>> = Vec::new();

    for (processed, path) in sources.iter().enumerate() {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let doc_id = documents.len() as DocId;
        let mut document = Document::from_path(path);
        tokenizer.tokenize(&text, &mut document, &mut stats);
        for (&term, &count) in document.frequencies() {
            batch.entry(term).or_default().push((doc_id, count));
        }
        documents.push(document);
        batched_docs += 1;

        if batched_docs == batch_size {
            let chunk = flush_batch(&mut batch, &chunks_dir, chunks.len())?;
            chunks.push(chunk);
            batched_docs = 0;
        }
        if processed % 64 == 0 {
            tracing::info!(percent = processed * 100 / sources.len(), "tokenizing corpus");
        }
    }

    // A trailing partial batch folds into the smallest chunk on disk; with
    // no chunks yet it becomes the only one.
    if !batch.is_empty() {
        let mut records = drain_batch(&mut batch);
        match chunks.iter_mut().min_by_key(|c| c.size()) {
            Some(chunk) => chunk.memory_merge_with(&mut records)?,
            None => {
                let path = chunks_dir.join(chunk_name(0));
                chunks.push(write_chunk(&path, &records)?);
            }
        }
    }

    tracing::info!(
        num_docs = documents.len(),
        num_terms = tokenizer.vocabulary().len(),
        chunks = chunks.len(),
        "tokenized corpus"
    );

    let threads = if threads == 0 {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    } else {
        threads
    };
    let merged = merge_all(chunks, threads, |event| {
        tracing::debug!(left = event.left, right = event.right, merged = event.merged, "merge step");
    })?;
    if let Some(chunk) = merged {
        fs::rename(chunk.path(), paths.postings())?;
    }
    let _ = fs::remove_dir(&chunks_dir);

    let num_docs = documents.len() as u32;
    let avg_doc_length =
        documents.iter().map(|d| d.length()).sum::<u64>() as f64 / documents.len() as f64;
    save_vocabulary(&paths, tokenizer.vocabulary())?;
    save_documents(&paths, &documents)?;
    save_stats(&paths, &stats)?;
    save_meta(
        &paths,
        &MetaFile {
            num_docs,
            avg_doc_length,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "".into()),
            version: 1,
        },
    )?;

    tracing::info!(output, "index build complete");
    Ok(())
}

fn chunk_name(n: usize) -> String {
    format!("chunk_{n:05}.bin")
}

fn drain_batch(batch: &mut HashMap<TermId, Vec<(DocId, u32)>>) -> Vec<PostingsData<TermId, DocId>> {
    let mut records: Vec<PostingsData<TermId, DocId>> = batch
        .drain()
        .map(|(term, counts)| PostingsData { primary: term, counts })
        .collect();
    records.sort();
    records
}

fn flush_batch(
    batch: &mut HashMap<TermId, Vec<(DocId, u32)>>,
    chunks_dir: &Path,
    sequence: usize,
) -> Result<Chunk<TermId, DocId>> {
    let records = drain_batch(batch);
    let path = chunks_dir.join(chunk_name(sequence));
    let chunk = write_chunk(&path, &records)?;
    tracing::debug!(path = %path.display(), size = chunk.size(), "flushed chunk");
    Ok(chunk)
}

fn load_engine(index: &str) -> Result<(MemoryIndex, WordTokenizer)> {
    let paths = IndexPaths::new(index);
    let (vocabulary, documents, stats, meta) = load_index(&paths)?;
    tracing::info!(num_docs = meta.num_docs, "loaded index");
    let engine = MemoryIndex::from_parts(documents, stats)?;
    Ok((engine, WordTokenizer::with_vocabulary(vocabulary)))
}

fn read_query(path: &str, tokenizer: &mut WordTokenizer) -> Result<Document> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let mut query = Document::from_path(path);
    // Query-side tokenization must not disturb the corpus statistics.
    let mut scratch = TermStats::new();
    tokenizer.tokenize(&text, &mut query, &mut scratch);
    Ok(query)
}

fn search_index(index: &str, query: &str, k: usize) -> Result<()> {
    let (engine, mut tokenizer) = load_engine(index)?;
    let query = read_query(query, &mut tokenizer)?;
    let hits = engine.search(&query);
    if hits.is_empty() {
        println!("no results");
        return Ok(());
    }
    for hit in hits.iter().take(k) {
        println!("{:>10.4}  {hit}", hit.score);
    }
    Ok(())
}

fn classify_query(index: &str, query: &str, k: usize) -> Result<()> {
    let (engine, mut tokenizer) = load_engine(index)?;
    let query = read_query(query, &mut tokenizer)?;
    println!("{}", engine.classify_knn(&query, k));
    Ok(())
}
