//! Module propagation.
//!
//! A recursive edit on an aggregator (a document listing `modules`) is applied
//! to each module's document instead, depth first, in the order the modules
//! are listed. The aggregator itself is never edited by a recursive run.

use crate::actions::Action;
use crate::ports::DocumentStore;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::collections::BTreeSet;
use walkmod_edit::{EditResult, document_path, render_patch};
use walkmod_types::DocumentFormat;

/// How far an edit reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagateOptions {
    /// Follow `modules` into child documents.
    pub recursive: bool,
}

/// One document the edit rewrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentChange {
    pub path: Utf8PathBuf,
    /// The document did not exist before.
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    pub after: String,
}

/// Everything one edit touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    /// Documents the action was offered to, in visit order.
    pub visited: Vec<Utf8PathBuf>,
    pub changes: Vec<DocumentChange>,
}

impl EditOutcome {
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Unified diff of every change, in visit order.
    pub fn patch(&self) -> String {
        self.changes
            .iter()
            .map(|c| render_patch(&c.path, c.before.as_deref(), &c.after))
            .collect()
    }
}

/// Runs `action` on the document at `path`, or on its modules when recursive.
///
/// The first failing document aborts the run. Documents already written by
/// then stay written.
pub fn propagate(
    store: &mut dyn DocumentStore,
    path: &Utf8Path,
    format: DocumentFormat,
    action: &dyn Action,
    options: PropagateOptions,
) -> EditResult<EditOutcome> {
    action.validate()?;

    let mut walk = Walk {
        store,
        format,
        action,
        options,
        seen: BTreeSet::new(),
        outcome: EditOutcome::default(),
    };
    walk.visit(path)?;
    Ok(walk.outcome)
}

struct Walk<'a> {
    store: &'a mut dyn DocumentStore,
    format: DocumentFormat,
    action: &'a dyn Action,
    options: PropagateOptions,
    seen: BTreeSet<Utf8PathBuf>,
    outcome: EditOutcome,
}

impl Walk<'_> {
    fn visit(&mut self, path: &Utf8Path) -> EditResult<()> {
        if !self.seen.insert(normalize(path)) {
            tracing::warn!(%path, "module cycle, document already visited");
            return Ok(());
        }

        let mut doc = self.store.load(path, self.format)?;

        if self.options.recursive {
            let modules = doc.modules()?;
            if !modules.is_empty() {
                let dir = path.parent().unwrap_or(Utf8Path::new(""));
                tracing::debug!(%path, modules = modules.len(), "descending into modules");
                for module in &modules {
                    self.visit(&document_path(&dir.join(module), self.format))?;
                }
                return Ok(());
            }
        }

        self.outcome.visited.push(path.to_path_buf());
        if !self.action.apply(doc.as_mut())? {
            tracing::debug!(%path, "already up to date");
            return Ok(());
        }

        let after = doc.render()?;
        if doc.original() == Some(after.as_str()) {
            tracing::debug!(%path, "rendered text unchanged");
            return Ok(());
        }

        self.store.save(doc.as_ref(), &after)?;
        self.outcome.changes.push(DocumentChange {
            path: path.to_path_buf(),
            created: doc.is_skeleton(),
            before: doc.original().map(str::to_string),
            after,
        });
        Ok(())
    }
}

/// Lexical `.`/`..` folding so `a/../a` and `a` count as one document.
fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            camino::Utf8Component::CurDir => {}
            camino::Utf8Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(
            normalize(Utf8Path::new("a/./b/../c")),
            Utf8PathBuf::from("a/c")
        );
        assert_eq!(
            normalize(Utf8Path::new("/r/m/../m/walkmod.xml")),
            Utf8PathBuf::from("/r/m/walkmod.xml")
        );
    }
}
