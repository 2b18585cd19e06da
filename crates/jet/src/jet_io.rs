//! Persistence of jet lists.
//!
//! A list is stored as `NumberOfJets` plus one group per jet. Groups are
//! named `Jet_<i>` (1-based) with the index zero-padded to the number of
//! digits of the list length, e.g. `Jet_01` … `Jet_12`. Older files always
//! used three digits (`Jet_001`); those are still read.

use gabor_record::RecordStore;
use tracing::warn;

use crate::error::JetError;
use crate::jet::Jet;

const LEGACY_WIDTH: usize = 3;

/// Writes `jets` into the current group of `store`.
pub fn save_jets<S: RecordStore + ?Sized>(jets: &[Jet], store: &mut S) -> Result<(), JetError> {
    store.set_i64("NumberOfJets", jets.len() as i64)?;
    let width = digit_width(jets.len());
    for (i, jet) in jets.iter().enumerate() {
        let name = group_name(i, width);
        store.create_group(&name)?;
        store.cd(&name)?;
        let saved = jet.save(store);
        store.cd("..")?;
        saved?;
    }
    Ok(())
}

/// Reads a jet list written by [`save_jets`] from the current group.
///
/// # Errors
///
/// Propagates record errors, e.g. a missing `Jet_<i>` group, and
/// [`JetError::InvalidArgument`] for a negative `NumberOfJets`.
pub fn load_jets<S: RecordStore + ?Sized>(store: &mut S) -> Result<Vec<Jet>, JetError> {
    let stored = store.read_i64("NumberOfJets")?;
    let count = usize::try_from(stored)
        .map_err(|_| JetError::InvalidArgument(format!("invalid NumberOfJets {stored}")))?;

    let width = if count > 0 && store.has_group(&group_name(0, LEGACY_WIDTH)) {
        if digit_width(count) != LEGACY_WIDTH {
            warn!(jets = count, "reading jet list with three-digit group names");
        }
        LEGACY_WIDTH
    } else {
        digit_width(count)
    };

    let mut jets = Vec::with_capacity(count);
    for i in 0..count {
        store.cd(&group_name(i, width))?;
        let loaded = Jet::load(&*store);
        store.cd("..")?;
        jets.push(loaded?);
    }
    Ok(jets)
}

fn digit_width(count: usize) -> usize {
    count.checked_ilog10().map_or(1, |d| d as usize + 1)
}

fn group_name(index: usize, width: usize) -> String {
    format!("Jet_{:0width$}", index + 1)
}
