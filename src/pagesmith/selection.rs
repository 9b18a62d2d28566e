use crate::document::{DocumentModel, MoveDirection};
use crate::error::{EditorError, Result};
use crate::model::Block;
use std::collections::BTreeSet;

/// Block positions picked for a batch operation.
///
/// Batch operations always clear the selection afterwards, whether they
/// succeed or not, since the positions no longer mean the same blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    indices: BTreeSet<usize>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips one position. Returns whether it is now selected.
    pub fn toggle(&mut self, index: usize, len: usize) -> Result<bool> {
        if index >= len {
            return Err(EditorError::IndexOutOfRange { index, len });
        }
        if self.indices.remove(&index) {
            Ok(false)
        } else {
            self.indices.insert(index);
            Ok(true)
        }
    }

    pub fn select_all(&mut self, len: usize) {
        self.indices = (0..len).collect();
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Drops positions that no longer exist.
    pub fn retain_within(&mut self, len: usize) {
        self.indices.retain(|&i| i < len);
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.indices.iter().copied().collect()
    }

    fn take(&mut self) -> Result<Vec<usize>> {
        let indices = self.indices();
        self.clear();
        if indices.is_empty() {
            return Err(EditorError::NothingSelected);
        }
        Ok(indices)
    }

    pub fn duplicate_selected(&mut self, model: &mut DocumentModel) -> Result<usize> {
        let indices = self.take()?;
        model.duplicate(&indices)
    }

    pub fn delete_selected(&mut self, model: &mut DocumentModel) -> Result<Vec<Block>> {
        let indices = self.take()?;
        model.remove_many(&indices)
    }

    pub fn move_selected(
        &mut self,
        model: &mut DocumentModel,
        direction: MoveDirection,
    ) -> Result<usize> {
        let indices = self.take()?;
        model.move_blocks(&indices, direction)?;
        Ok(indices.len())
    }
}
