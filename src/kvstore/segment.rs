/*!
 * append-only segment files
 *
 * A data directory holds `<generation>.log` files, each a back-to-back run of
 * JSON encoded [`Command`]s. Only the highest generation is appended to.
 * Compaction output is staged as `<generation>.compact` and renamed once durable.
 */

use std::{
    collections::{BTreeMap, VecDeque},
    ffi::OsStr,
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use serde_json::{de::IoRead, Deserializer, StreamDeserializer};

use super::command::{Command, LogPointer};
use crate::{KvsError, Result};

const LOG_EXTENSION: &str = "log";
const COMPACTION_EXTENSION: &str = "compact";

pub(crate) struct SegmentStore {
    dir_path: PathBuf,
    /// size in bytes of every finished segment on disk, the active one included
    sizes: BTreeMap<u64, u64>,
    active: Option<SegmentWriter>,
    next_generation: u64,
    size_limit: u64,
}

impl SegmentStore {
    /// scan `dir_path`, creating it and a first segment when empty
    pub(crate) fn open(dir_path: &Path, size_limit: u64) -> Result<Self> {
        fs::create_dir_all(dir_path)?;

        let mut sizes = BTreeMap::new();
        for generation in scan_generations(dir_path)? {
            let size = fs::metadata(segment_path(dir_path, generation))?.len();
            sizes.insert(generation, size);
        }

        let mut store = Self {
            dir_path: dir_path.to_owned(),
            next_generation: sizes.keys().next_back().map_or(1, |x| x + 1),
            sizes,
            active: None,
            size_limit,
        };

        let newest = store.sizes.iter().next_back().map(|(g, s)| (*g, *s));
        match newest {
            Some((generation, size)) => {
                store.active = Some(SegmentWriter::append_to(
                    segment_path(dir_path, generation),
                    generation,
                    size,
                )?);
            }
            None => store.start_active()?,
        }

        Ok(store)
    }

    /// durably append `command` to the active segment
    pub(crate) fn append(&mut self, command: &Command) -> Result<LogPointer> {
        let needs_roll = match &self.active {
            Some(active) => active.offset >= self.size_limit,
            None => true,
        };
        if needs_roll {
            self.roll_segment()?;
        }

        let active = self
            .active
            .as_mut()
            .ok_or_else(|| KvsError::StringError("no active segment".to_owned()))?;
        let pointer = active.write(command)?;
        active.commit()?;
        self.sizes.insert(active.generation, active.offset);

        Ok(pointer)
    }

    /// read back the command `pointer` addresses
    pub(crate) fn read(&self, pointer: LogPointer) -> Result<Command> {
        let mut file = File::open(segment_path(&self.dir_path, pointer.generation))?;
        file.seek(SeekFrom::Start(pointer.offset))?;

        let mut buf = vec![0u8; pointer.length as usize];
        file.read_exact(&mut buf)?;
        Ok(serde_json::from_slice(&buf)?)
    }

    /// seal the active segment and open the next generation for appends
    pub(crate) fn roll_segment(&mut self) -> Result<()> {
        self.seal_active()?;
        self.start_active()
    }

    /// stop appending to the active segment, leaving no active segment
    pub(crate) fn seal_active(&mut self) -> Result<()> {
        if let Some(mut active) = self.active.take() {
            active.commit()?;
            log::debug!(
                "sealed segment {} at {} bytes",
                active.generation,
                active.offset
            );
        }
        Ok(())
    }

    pub(crate) fn start_active(&mut self) -> Result<()> {
        let generation = self.allocate_generation();
        let writer = SegmentWriter::create(segment_path(&self.dir_path, generation), generation)?;
        self.sizes.insert(generation, 0);
        self.active = Some(writer);
        self.sync_dir()
    }

    /// start a staging file for compaction output
    pub(crate) fn create_compaction_segment(&mut self) -> Result<SegmentWriter> {
        let generation = self.allocate_generation();
        SegmentWriter::create(compaction_path(&self.dir_path, generation), generation)
    }

    /// make a finished compaction segment durable and visible under its final name
    pub(crate) fn install(&mut self, segment: &mut SegmentWriter) -> Result<()> {
        segment.commit()?;
        let path = segment_path(&self.dir_path, segment.generation);
        fs::rename(&segment.path, &path)?;
        segment.path = path;
        self.sizes.insert(segment.generation, segment.offset);
        Ok(())
    }

    /// delete a compaction segment that was never installed
    pub(crate) fn discard(&mut self, segment: SegmentWriter) -> Result<()> {
        let path = segment.path.clone();
        drop(segment);
        fs::remove_file(path)?;
        Ok(())
    }

    /// persist renames, creations and unlinks in the data directory
    pub(crate) fn sync_dir(&self) -> Result<()> {
        File::open(&self.dir_path)?.sync_all()?;
        Ok(())
    }

    /// delete sealed segments, never the active one
    pub(crate) fn remove_segments(&mut self, generations: &[u64]) -> Result<()> {
        let active = self.active_generation();
        for &generation in generations {
            if Some(generation) == active {
                continue;
            }
            if self.sizes.remove(&generation).is_some() {
                fs::remove_file(segment_path(&self.dir_path, generation))?;
            }
        }
        self.sync_dir()
    }

    pub(crate) fn generations(&self) -> Vec<u64> {
        self.sizes.keys().copied().collect()
    }

    pub(crate) fn active_generation(&self) -> Option<u64> {
        self.active.as_ref().map(|active| active.generation)
    }

    pub(crate) fn size_limit(&self) -> u64 {
        self.size_limit
    }

    /// total bytes held by segment files
    pub(crate) fn disk_size(&self) -> u64 {
        self.sizes.values().sum()
    }

    /// every command of every segment, oldest first
    pub(crate) fn replay_all(&self) -> SegmentReplay {
        SegmentReplay {
            dir_path: self.dir_path.clone(),
            pending: self.sizes.keys().copied().collect(),
            current: None,
        }
    }

    fn allocate_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}

/// buffered appender for one segment file
pub(crate) struct SegmentWriter {
    generation: u64,
    path: PathBuf,
    writer: BufWriter<File>,
    offset: u64,
}

impl SegmentWriter {
    fn create(path: PathBuf, generation: u64) -> Result<Self> {
        let file = File::options().create_new(true).append(true).open(&path)?;
        Ok(Self {
            generation,
            path,
            writer: BufWriter::new(file),
            offset: 0,
        })
    }

    fn append_to(path: PathBuf, generation: u64, offset: u64) -> Result<Self> {
        let file = File::options().append(true).open(&path)?;
        Ok(Self {
            generation,
            path,
            writer: BufWriter::new(file),
            offset,
        })
    }

    /// buffer `command`, call [`Self::commit`] to make it durable
    pub(crate) fn write(&mut self, command: &Command) -> Result<LogPointer> {
        let bytes = command.encode()?;
        self.writer.write_all(&bytes)?;

        let pointer = LogPointer {
            generation: self.generation,
            offset: self.offset,
            length: bytes.len() as u64,
        };
        self.offset += pointer.length;
        Ok(pointer)
    }

    fn commit(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }

    pub(crate) fn len(&self) -> u64 {
        self.offset
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

struct ReplayCursor {
    generation: u64,
    stream: StreamDeserializer<'static, IoRead<BufReader<File>>, Command>,
}

/// lazy walk over all segments, see [`SegmentStore::replay_all`]
pub(crate) struct SegmentReplay {
    dir_path: PathBuf,
    pending: VecDeque<u64>,
    current: Option<ReplayCursor>,
}

impl SegmentReplay {
    fn fail(&mut self, err: KvsError) -> Option<Result<(LogPointer, Command)>> {
        self.pending.clear();
        self.current = None;
        Some(Err(err))
    }
}

impl Iterator for SegmentReplay {
    type Item = Result<(LogPointer, Command)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(cursor) = self.current.as_mut() {
                let offset = cursor.stream.byte_offset() as u64;
                let generation = cursor.generation;
                match cursor.stream.next() {
                    Some(Ok(command)) => {
                        let length = cursor.stream.byte_offset() as u64 - offset;
                        let pointer = LogPointer {
                            generation,
                            offset,
                            length,
                        };
                        return Some(Ok((pointer, command)));
                    }
                    Some(Err(e)) => return self.fail(e.into()),
                    None => self.current = None,
                }
            }

            let generation = self.pending.pop_front()?;
            match File::open(segment_path(&self.dir_path, generation)) {
                Ok(file) => {
                    self.current = Some(ReplayCursor {
                        generation,
                        stream: Deserializer::from_reader(BufReader::new(file)).into_iter(),
                    })
                }
                Err(e) => return self.fail(e.into()),
            }
        }
    }
}

fn segment_path(dir_path: &Path, generation: u64) -> PathBuf {
    dir_path.join(format!("{generation}.{LOG_EXTENSION}"))
}

fn compaction_path(dir_path: &Path, generation: u64) -> PathBuf {
    dir_path.join(format!("{generation}.{COMPACTION_EXTENSION}"))
}

/// sorted generations of the `.log` files in `dir_path`
///
/// Leftover compaction staging files belong to a pass that never finished and are deleted.
fn scan_generations(dir_path: &Path) -> Result<Vec<u64>> {
    let mut result = Vec::new();

    for entry in fs::read_dir(dir_path)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        match path.extension().and_then(OsStr::to_str) {
            Some(LOG_EXTENSION) => {
                let stem = path.file_stem().and_then(OsStr::to_str).ok_or_else(|| {
                    KvsError::StringError(format!("invalid segment name {}", path.display()))
                })?;
                result.push(stem.parse::<u64>()?);
            }
            Some(COMPACTION_EXTENSION) => {
                log::warn!("removing unfinished compaction output {}", path.display());
                fs::remove_file(&path)?;
            }
            _ => {}
        }
    }

    result.sort_unstable();
    Ok(result)
}
