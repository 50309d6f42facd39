use super::{
    command::{Command, LogPointer},
    index::KeyIndex,
    segment::{SegmentStore, SegmentWriter},
};
use crate::{KvsError, Result};

/// outcome of one compaction pass
#[derive(Debug)]
pub(crate) struct CompactionReport {
    pub(crate) live_keys: usize,
    pub(crate) removed_segments: usize,
    pub(crate) bytes_before: u64,
    pub(crate) bytes_after: u64,
}

/// rewrite every live `Set` into fresh segments and delete everything older
///
/// The caller must hold exclusive access to the store so the index swap is
/// never observed half way. A failed pass removes its own output and leaves
/// the store appending to a new active segment.
pub(crate) fn compact(segments: &mut SegmentStore, index: &KeyIndex) -> Result<CompactionReport> {
    let bytes_before = segments.disk_size();

    if let Err(e) = segments.seal_active() {
        segments.start_active()?;
        return Err(e);
    }
    let stale = segments.generations();

    let mut staged = None;
    let mut installed = Vec::new();
    let relocated = match copy_live(segments, index, &mut staged, &mut installed) {
        Ok(relocated) => relocated,
        Err(e) => {
            abandon(segments, staged, &installed);
            segments.start_active()?;
            return Err(e);
        }
    };

    let live_keys = relocated.len();
    for (key, pointer) in relocated {
        index.update_on_set(key, pointer);
    }

    let removed = segments.remove_segments(&stale);
    segments.start_active()?;
    removed?;

    Ok(CompactionReport {
        live_keys,
        removed_segments: stale.len(),
        bytes_before,
        bytes_after: segments.disk_size(),
    })
}

/// copy live values in key order into compaction segments of bounded size
///
/// The segment being filled stays in `staged` so a failure can clean it up.
fn copy_live(
    segments: &mut SegmentStore,
    index: &KeyIndex,
    staged: &mut Option<SegmentWriter>,
    installed: &mut Vec<u64>,
) -> Result<Vec<(String, LogPointer)>> {
    let mut relocated = Vec::with_capacity(index.len());

    for (key, pointer) in index.entries() {
        let value = read_live_value(segments, &key, pointer)?;

        let full = matches!(staged.as_ref(), Some(writer) if writer.len() >= segments.size_limit());
        if full {
            install_staged(segments, staged, installed)?;
        }
        if staged.is_none() {
            *staged = Some(segments.create_compaction_segment()?);
        }

        let writer = staged
            .as_mut()
            .ok_or_else(|| KvsError::StringError("no compaction segment".to_owned()))?;
        let command = Command::Set { key, value };
        let pointer = writer.write(&command)?;
        relocated.push((command.into_key(), pointer));
    }

    install_staged(segments, staged, installed)?;
    segments.sync_dir()?;
    Ok(relocated)
}

fn install_staged(
    segments: &mut SegmentStore,
    staged: &mut Option<SegmentWriter>,
    installed: &mut Vec<u64>,
) -> Result<()> {
    if let Some(mut writer) = staged.take() {
        if let Err(e) = segments.install(&mut writer) {
            *staged = Some(writer);
            return Err(e);
        }
        installed.push(writer.generation());
    }
    Ok(())
}

/// drop everything a failed pass produced, the index still points at the old segments
fn abandon(segments: &mut SegmentStore, staged: Option<SegmentWriter>, installed: &[u64]) {
    if let Some(writer) = staged {
        if let Err(e) = segments.discard(writer) {
            log::error!("failed to remove staged compaction output: {}", e);
        }
    }
    if let Err(e) = segments.remove_segments(installed) {
        log::error!("failed to remove installed compaction output: {}", e);
    }
}

/// load the value of the `Set` behind `pointer`, rejecting anything the index should never point at
pub(crate) fn read_live_value(
    segments: &SegmentStore,
    key: &str,
    pointer: LogPointer,
) -> Result<String> {
    match segments.read(pointer)? {
        Command::Set { key: found, value } if found == key => Ok(value),
        _ => Err(KvsError::UnexpectedCommandType {
            generation: pointer.generation,
            offset: pointer.offset,
        }),
    }
}
