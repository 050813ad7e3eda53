use crate::document::Document;
use crate::error::{IndexError, Result};
use crate::stats::TermStats;
use crate::tokenizer::Vocabulary;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub avg_doc_length: f64,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.bin") }
    pub fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    pub fn stats(&self) -> PathBuf { self.root.join("stats.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn postings(&self) -> PathBuf { self.root.join("postings.bin") }
    pub fn chunks_dir(&self) -> PathBuf { self.root.join("chunks") }
}

fn save_bin<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| IndexError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, value)?;
    writer.flush().map_err(|e| IndexError::io(path, e))?;
    Ok(())
}

fn load_bin<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| IndexError::io(path, e))?;
    let value = bincode::deserialize_from(BufReader::new(file))?;
    Ok(value)
}

pub fn save_vocabulary(paths: &IndexPaths, vocabulary: &Vocabulary) -> Result<()> {
    create_dir_all(&paths.root).map_err(|e| IndexError::io(&paths.root, e))?;
    save_bin(&paths.vocabulary(), vocabulary)
}

pub fn load_vocabulary(paths: &IndexPaths) -> Result<Vocabulary> {
    load_bin(&paths.vocabulary())
}

pub fn save_documents(paths: &IndexPaths, documents: &[Document]) -> Result<()> {
    save_bin(&paths.docs(), &documents)
}

pub fn load_documents(paths: &IndexPaths) -> Result<Vec<Document>> {
    load_bin(&paths.docs())
}

pub fn save_stats(paths: &IndexPaths, stats: &TermStats) -> Result<()> {
    save_bin(&paths.stats(), stats)
}

pub fn load_stats(paths: &IndexPaths) -> Result<TermStats> {
    load_bin(&paths.stats())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root).map_err(|e| IndexError::io(&paths.root, e))?;
    let path = paths.meta();
    let json = serde_json::to_string_pretty(meta)?;
    std::fs::write(&path, json.as_bytes()).map_err(|e| IndexError::io(&path, e))
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let path = paths.meta();
    let text = std::fs::read_to_string(&path).map_err(|e| IndexError::io(&path, e))?;
    let meta = serde_json::from_str(&text)?;
    Ok(meta)
}

/// Load everything needed to rebuild a query-side engine: vocabulary,
/// documents, term statistics, and the meta file.
pub fn load_index(paths: &IndexPaths) -> Result<(Vocabulary, Vec<Document>, TermStats, MetaFile)> {
    let vocabulary = load_vocabulary(paths)?;
    let documents = load_documents(paths)?;
    let stats = load_stats(paths)?;
    let meta = load_meta(paths)?;
    Ok((vocabulary, documents, stats, meta))
}
