// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Instrumented block index.
//!
//! Parses every source file that mentions `probe!` and turns each probe site
//! into a block: from the invocation to the closing brace of the innermost
//! enclosing block, cut short where the next probe begins. A closure or match
//! arm whose body has no braces bounds its probes at the end of that body.
//! Blocks of one file are therefore ordered by start and never overlap.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use proc_macro2::{LineColumn, Span};
use rayon::prelude::*;
use syn::spanned::Spanned;
use syn::visit::{self, Visit};

use crate::error::{Error, Result};
use crate::instrument::{Counter, ProbeRegistry};
use crate::position::{Location, Position};
use crate::source::SourceFile;

/// The source range owned by one probe, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockRange {
    pub start: Position,
    pub end: Position,
}

/// A counted range in one file together with its counter cell.
#[derive(Debug, Clone)]
pub struct InstrumentedBlock {
    pub file: PathBuf,
    pub start: Position,
    pub end: Position,
    pub counter: &'static Counter,
}

impl InstrumentedBlock {
    pub fn range(&self) -> BlockRange {
        BlockRange {
            start: self.start,
            end: self.end,
        }
    }
}

/// Blocks of every instrumented file, each file's list ordered by start.
#[derive(Debug, Default)]
pub struct BlockIndex {
    files: BTreeMap<PathBuf, Vec<InstrumentedBlock>>,
}

impl BlockIndex {
    /// Parse the probe-bearing files among `sources` and attach registry cells.
    ///
    /// Cells are created for probes that have not run yet, so every block has
    /// an observable counter.
    pub fn build(sources: &[SourceFile], registry: &ProbeRegistry) -> Result<Self> {
        let parsed = sources
            .par_iter()
            .filter(|s| s.has_probes)
            .map(|s| {
                let ranges = block_ranges(&s.text).map_err(|e| Error::Parse {
                    path: s.path.clone(),
                    reason: format!("line {}: {}", e.span().start().line, e),
                })?;
                Ok((s.path.clone(), ranges))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut files = BTreeMap::new();
        for (path, ranges) in parsed {
            if ranges.is_empty() {
                continue;
            }
            let blocks = ranges
                .into_iter()
                .map(|range| InstrumentedBlock {
                    counter: registry.cell(Location {
                        file: path.clone(),
                        position: range.start,
                    }),
                    file: path.clone(),
                    start: range.start,
                    end: range.end,
                })
                .collect();
            files.insert(path, blocks);
        }

        let index = Self { files };
        tracing::debug!(
            "indexed {} blocks across {} files",
            index.len(),
            index.files.len()
        );
        Ok(index)
    }

    /// Blocks of `file`, ordered by start. Empty for uninstrumented files.
    pub fn blocks(&self, file: &Path) -> &[InstrumentedBlock] {
        self.files.get(file).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Total block count.
    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Compute the ordered, non-overlapping probe ranges of one file.
pub fn block_ranges(source: &str) -> syn::Result<Vec<BlockRange>> {
    let file = syn::parse_file(source)?;
    let mut visitor = ProbeVisitor::default();
    visitor.visit_file(&file);

    let mut sites = visitor.sites;
    sites.sort();

    let ranges = sites
        .iter()
        .enumerate()
        .map(|(i, site)| {
            let end = match sites.get(i + 1) {
                Some(next) if next.start <= site.end => next.start.predecessor(),
                _ => site.end,
            };
            BlockRange {
                start: site.start,
                end,
            }
        })
        .collect();
    Ok(ranges)
}

/// Collects probe invocations with the last position of their innermost scope.
#[derive(Default)]
struct ProbeVisitor {
    enclosing: Vec<Position>,
    sites: Vec<BlockRange>,
}

impl ProbeVisitor {
    fn scoped(&mut self, end: Position, visit: impl FnOnce(&mut Self)) {
        self.enclosing.push(end);
        visit(self);
        self.enclosing.pop();
    }
}

impl<'ast> Visit<'ast> for ProbeVisitor {
    fn visit_block(&mut self, block: &'ast syn::Block) {
        let end = position(block.brace_token.span.close().start());
        self.scoped(end, |v| visit::visit_block(v, block));
    }

    fn visit_expr_closure(&mut self, closure: &'ast syn::ExprClosure) {
        if matches!(*closure.body, syn::Expr::Block(_)) {
            visit::visit_expr_closure(self, closure);
        } else {
            let end = expr_end(&closure.body);
            self.scoped(end, |v| visit::visit_expr_closure(v, closure));
        }
    }

    fn visit_arm(&mut self, arm: &'ast syn::Arm) {
        if matches!(*arm.body, syn::Expr::Block(_)) {
            visit::visit_arm(self, arm);
        } else {
            let end = expr_end(&arm.body);
            self.scoped(end, |v| visit::visit_arm(v, arm));
        }
    }

    fn visit_macro(&mut self, mac: &'ast syn::Macro) {
        if is_probe(&mac.path) {
            match self.enclosing.last() {
                Some(&end) => self.sites.push(BlockRange {
                    start: position(path_start(&mac.path).start()),
                    end,
                }),
                None => tracing::debug!("probe outside any block ignored"),
            }
        }
        visit::visit_macro(self, mac);
    }
}

/// `probe!`, `covers::probe!`, or `::covers::probe!`.
fn is_probe(path: &syn::Path) -> bool {
    let segments: Vec<_> = path.segments.iter().map(|s| &s.ident).collect();
    match segments.as_slice() {
        [name] => path.leading_colon.is_none() && *name == "probe",
        [krate, name] => *krate == "covers" && *name == "probe",
        _ => false,
    }
}

fn path_start(path: &syn::Path) -> Span {
    match (&path.leading_colon, path.segments.first()) {
        (Some(colon), _) => colon.spans[0],
        (None, Some(first)) => first.ident.span(),
        (None, None) => Span::call_site(),
    }
}

/// Last character of `expr`. Span ends are exclusive.
fn expr_end(expr: &syn::Expr) -> Position {
    position(expr.span().end()).predecessor()
}

/// proc-macro2 columns are 0-based.
fn position(lc: LineColumn) -> Position {
    let line = u32::try_from(lc.line).unwrap_or(u32::MAX);
    let column = u32::try_from(lc.column).unwrap_or(u32::MAX - 1);
    Position::new(line, column + 1)
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
