// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Position matcher: binds annotations to the block that contains them.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::bindings::{Binding, BindingTable};
use crate::error::{Error, Result};
use crate::index::{BlockIndex, BlockRange, InstrumentedBlock};
use crate::instrument::{Counter, Mode};
use crate::position::Position;
use crate::scan::Annotation;

/// True if `pos` lies in `block`, both ends inclusive.
pub fn contains(block: &InstrumentedBlock, pos: Position) -> bool {
    contains_range(block.range(), pos)
}

pub fn contains_range(range: BlockRange, pos: Position) -> bool {
    let BlockRange { start, end } = range;
    let after_start =
        start.line < pos.line || (start.line == pos.line && start.column <= pos.column);
    let before_end = pos.line < end.line || (pos.line == end.line && pos.column <= end.column);
    after_start && before_end
}

/// The unique block of one file containing `pos`.
///
/// `blocks` must be ordered by start. More than one match means the index
/// broke its ordering guarantee and is reported as [`Error::Internal`].
pub fn find_block(blocks: &[InstrumentedBlock], pos: Position) -> Result<Option<&InstrumentedBlock>> {
    let mut found: Option<&InstrumentedBlock> = None;
    for block in blocks {
        if block.start.line > pos.line {
            break;
        }
        if !contains(block, pos) {
            continue;
        }
        if let Some(previous) = found {
            return Err(Error::Internal(format!(
                "{}:{} lies in overlapping blocks {}..{} and {}..{}",
                block.file.display(),
                pos,
                previous.start,
                previous.end,
                block.start,
                block.end
            )));
        }
        found = Some(block);
    }
    Ok(found)
}

/// Bind every annotation to a counter cell.
///
/// Unless `mode` counts executions, every tag is bound to `None` and the index
/// is not consulted. Otherwise each annotation must fall inside exactly one
/// block, and repeated tags must resolve to the same cell.
pub fn bind(annotations: &[Annotation], index: &BlockIndex, mode: Mode) -> Result<BindingTable> {
    let enabled = mode.is_counting();
    let mut bindings: BTreeMap<String, Binding> = BTreeMap::new();

    for annotation in annotations {
        let counter = if enabled {
            let blocks = index.blocks(annotation.location.file());
            match find_block(blocks, annotation.location.position)? {
                Some(block) => Some(block.counter),
                None => {
                    return Err(Error::Unbound {
                        tag: annotation.tag.clone(),
                        location: annotation.location.clone(),
                    });
                }
            }
        } else {
            None
        };

        match bindings.entry(annotation.tag.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(Binding {
                    tag: annotation.tag.clone(),
                    counter,
                    locations: vec![annotation.location.clone()],
                });
            }
            Entry::Occupied(mut entry) => {
                let binding = entry.get_mut();
                if !same_cell(binding.counter, counter) {
                    return Err(Error::DuplicateTag {
                        tag: annotation.tag.clone(),
                        first: binding.first_location().clone(),
                        second: annotation.location.clone(),
                    });
                }
                binding.locations.push(annotation.location.clone());
            }
        }
    }

    Ok(BindingTable::new(bindings, mode))
}

fn same_cell(a: Option<&Counter>, b: Option<&Counter>) -> bool {
    a.map(Counter::id) == b.map(Counter::id)
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
