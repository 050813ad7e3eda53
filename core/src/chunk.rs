use crate::error::{IndexError, Result};
use crate::postings::PostingsData;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A sorted run of postings records persisted to a backing file. The file is
/// always a valid sequence of bincode-framed records in strictly increasing
/// primary-key order; `size` is the cached byte size used to order merges.
#[derive(Debug)]
pub struct Chunk<P, S> {
    path: PathBuf,
    size: u64,
    _keys: PhantomData<fn() -> (P, S)>,
}

/// Streaming reader over a chunk file. Records are decoded one at a time so
/// files larger than memory can be merged.
pub struct PostingsReader<P, S> {
    reader: BufReader<File>,
    done: bool,
    _keys: PhantomData<fn() -> (P, S)>,
}

impl<P, S> PostingsReader<P, S>
where
    P: DeserializeOwned,
    S: DeserializeOwned,
{
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| IndexError::io(path, e))?;
        Ok(Self { reader: BufReader::new(file), done: false, _keys: PhantomData })
    }
}

impl<P, S> Iterator for PostingsReader<P, S>
where
    P: DeserializeOwned,
    S: DeserializeOwned,
{
    type Item = Result<PostingsData<P, S>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match bincode::deserialize_from::<_, PostingsData<P, S>>(&mut self.reader) {
            Ok(record) => Some(Ok(record)),
            Err(err) => {
                self.done = true;
                if let bincode::ErrorKind::Io(ref io) = *err {
                    if io.kind() == std::io::ErrorKind::UnexpectedEof {
                        return None;
                    }
                }
                Some(Err(IndexError::Serialize(err)))
            }
        }
    }
}

/// Write a sorted slice of postings records as a new chunk file.
pub fn write_chunk<P, S>(path: &Path, records: &[PostingsData<P, S>]) -> Result<Chunk<P, S>>
where
    P: Serialize + DeserializeOwned + Ord,
    S: Serialize + DeserializeOwned + Ord,
{
    debug_assert!(records.windows(2).all(|w| w[0] < w[1]));
    let file = File::create(path).map_err(|e| IndexError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        bincode::serialize_into(&mut writer, record)?;
    }
    writer.flush().map_err(|e| IndexError::io(path, e))?;
    Chunk::new(path)
}

impl<P, S> Chunk<P, S>
where
    P: Serialize + DeserializeOwned + Ord,
    S: Serialize + DeserializeOwned + Ord,
{
    /// Associate a chunk with an existing sorted postings file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let size = fs::metadata(&path).map_err(|e| IndexError::io(&path, e))?.len();
        Ok(Self { path, size, _keys: PhantomData })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    pub fn reader(&self) -> Result<PostingsReader<P, S>> {
        PostingsReader::open(&self.path)
    }

    /// Sorted-merge `other`'s backing file into this chunk's file, combining
    /// records that share a primary key, then delete `other`'s file. `other`
    /// is consumed on success; on failure it is handed back untouched so the
    /// caller may retry. The merged output is staged in a sibling temp file
    /// and renamed into place, so a failed merge never leaves a partial file.
    pub fn merge_with(&mut self, other: Chunk<P, S>) -> std::result::Result<(), (IndexError, Chunk<P, S>)> {
        let result = (|| {
            let left = PostingsReader::open(&self.path)?;
            let right = PostingsReader::open(&other.path)?;
            self.commit_merged(left, right, Some(&other.path))
        })();
        match result {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), size = self.size, "merged chunk");
                Ok(())
            }
            Err(err) => Err((err, other)),
        }
    }

    /// Sorted-merge an in-memory buffer of records into this chunk's file.
    /// The buffer must be sorted by primary key; it is cleared once its
    /// contents have been absorbed.
    pub fn memory_merge_with(&mut self, buffer: &mut Vec<PostingsData<P, S>>) -> Result<()>
    where
        P: Clone,
        S: Clone,
    {
        debug_assert!(buffer.windows(2).all(|w| w[0] < w[1]));
        let left = PostingsReader::open(&self.path)?;
        let right = buffer.iter().cloned().map(Ok);
        self.commit_merged(left, right, None)?;
        buffer.clear();
        Ok(())
    }

    /// Merge two sorted record streams into a temp file, delete the consumed
    /// input (if any), and rename the temp file over this chunk's path. The
    /// delete happens before the rename: until the rename commits, both
    /// inputs are still intact on disk and the operation can be re-run.
    fn commit_merged<L, R>(&mut self, left: L, right: R, consumed: Option<&Path>) -> Result<()>
    where
        L: Iterator<Item = Result<PostingsData<P, S>>>,
        R: Iterator<Item = Result<PostingsData<P, S>>>,
    {
        let tmp = self.path.with_extension("tmp");
        let staged = (|| {
            let file = File::create(&tmp).map_err(|e| IndexError::io(&tmp, e))?;
            let mut writer = BufWriter::new(file);
            merge_streams(left, right, &mut writer)?;
            writer.flush().map_err(|e| IndexError::io(&tmp, e))
        })();
        if let Err(err) = staged {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        if let Some(path) = consumed {
            if let Err(e) = fs::remove_file(path) {
                let _ = fs::remove_file(&tmp);
                return Err(IndexError::io(path, e));
            }
        }
        fs::rename(&tmp, &self.path).map_err(|e| IndexError::io(&self.path, e))?;
        self.size = fs::metadata(&self.path).map_err(|e| IndexError::io(&self.path, e))?.len();
        Ok(())
    }
}

/// Two-pointer merge of sorted record streams. Implemented once and shared
/// by file-to-file and memory-to-file merges.
fn merge_streams<P, S, L, R, W>(mut left: L, mut right: R, out: &mut W) -> Result<()>
where
    P: Serialize + Ord,
    S: Serialize + Ord,
    L: Iterator<Item = Result<PostingsData<P, S>>>,
    R: Iterator<Item = Result<PostingsData<P, S>>>,
    W: Write,
{
    let mut l = left.next().transpose()?;
    let mut r = right.next().transpose()?;
    loop {
        match (l.take(), r.take()) {
            (Some(a), Some(b)) => match a.primary.cmp(&b.primary) {
                Ordering::Less => {
                    bincode::serialize_into(&mut *out, &a)?;
                    l = left.next().transpose()?;
                    r = Some(b);
                }
                Ordering::Greater => {
                    bincode::serialize_into(&mut *out, &b)?;
                    r = right.next().transpose()?;
                    l = Some(a);
                }
                Ordering::Equal => {
                    let mut a = a;
                    a.combine(b);
                    bincode::serialize_into(&mut *out, &a)?;
                    l = left.next().transpose()?;
                    r = right.next().transpose()?;
                }
            },
            (Some(a), None) => {
                bincode::serialize_into(&mut *out, &a)?;
                l = left.next().transpose()?;
            }
            (None, Some(b)) => {
                bincode::serialize_into(&mut *out, &b)?;
                r = right.next().transpose()?;
            }
            (None, None) => break,
        }
    }
    Ok(())
}

// Chunks order by size alone so a priority structure always surfaces the
// smallest pending runs first.
impl<P, S> PartialEq for Chunk<P, S> {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size
    }
}

impl<P, S> Eq for Chunk<P, S> {}

impl<P, S> PartialOrd for Chunk<P, S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P, S> Ord for Chunk<P, S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.size.cmp(&other.size)
    }
}
