//! # Document Model
//!
//! The ordered block sequence of the open document, plus the block order it
//! had when it was opened (used by "reset order").
//!
//! Positions are always `0..N-1`. Every structural operation validates its
//! indices before touching anything, so a failed call leaves the sequence
//! exactly as it was.

use crate::error::{EditorError, Result};
use crate::model::{Block, BlockAttributes, BlockKind, Document};
use crate::render;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
    Top,
    Bottom,
}

impl FromStr for MoveDirection {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(MoveDirection::Up),
            "down" => Ok(MoveDirection::Down),
            "top" => Ok(MoveDirection::Top),
            "bottom" => Ok(MoveDirection::Bottom),
            other => Err(EditorError::Validation(format!(
                "Unknown direction: {} (expected up, down, top or bottom)",
                other
            ))),
        }
    }
}

impl fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MoveDirection::Up => "up",
            MoveDirection::Down => "down",
            MoveDirection::Top => "top",
            MoveDirection::Bottom => "bottom",
        };
        f.write_str(s)
    }
}

/// One row of the content list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSummary {
    pub index: usize,
    pub kind: BlockKind,
    pub label: &'static str,
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentModel {
    document: Document,
    original: Vec<Block>,
}

impl DocumentModel {
    /// Opens a document; its current block order becomes the reset target.
    pub fn new(document: Document) -> Self {
        let original = document.blocks.clone();
        Self { document, original }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn blocks(&self) -> &[Block] {
        &self.document.blocks
    }

    pub fn len(&self) -> usize {
        self.document.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.blocks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.document.blocks.get(index)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.document.title = title.into();
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.document.author = author.into();
    }

    pub fn set_tags_line(&mut self, line: &str) {
        self.document.set_tags_line(line);
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(EditorError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }

    /// Validated, de-duplicated, ascending.
    fn checked_set(&self, indices: &[usize]) -> Result<BTreeSet<usize>> {
        for &index in indices {
            self.check_index(index)?;
        }
        Ok(indices.iter().copied().collect())
    }

    pub fn append(&mut self, block: Block) -> usize {
        self.document.blocks.push(block);
        self.len() - 1
    }

    pub fn insert_after(&mut self, index: usize, block: Block) -> Result<usize> {
        self.check_index(index)?;
        self.document.blocks.insert(index + 1, block);
        Ok(index + 1)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Block> {
        self.check_index(index)?;
        Ok(self.document.blocks.remove(index))
    }

    /// Removes all listed blocks, or none if any index is out of range.
    /// Returned blocks are in document order.
    pub fn remove_many(&mut self, indices: &[usize]) -> Result<Vec<Block>> {
        let set = self.checked_set(indices)?;
        let mut removed: Vec<Block> = set
            .iter()
            .rev()
            .map(|&i| self.document.blocks.remove(i))
            .collect();
        removed.reverse();
        Ok(removed)
    }

    /// Inserts a copy of each listed block right after it. Returns the number
    /// of copies made.
    pub fn duplicate(&mut self, indices: &[usize]) -> Result<usize> {
        let set = self.checked_set(indices)?;
        for &i in set.iter().rev() {
            let copy = self.document.blocks[i].duplicate();
            self.document.blocks.insert(i + 1, copy);
        }
        Ok(set.len())
    }

    /// Moves the listed blocks one step or to either end.
    ///
    /// A step swaps a block with its neighbour only when the neighbour is not
    /// moving too, so a contiguous run moves as a group and stops at the edge.
    /// Top and bottom keep the moved blocks in their current relative order.
    pub fn move_blocks(&mut self, indices: &[usize], direction: MoveDirection) -> Result<()> {
        let set = self.checked_set(indices)?;
        let len = self.len();
        let mut moving: Vec<bool> = (0..len).map(|i| set.contains(&i)).collect();
        let blocks = &mut self.document.blocks;

        match direction {
            MoveDirection::Up => {
                for i in 1..len {
                    if moving[i] && !moving[i - 1] {
                        blocks.swap(i - 1, i);
                        moving.swap(i - 1, i);
                    }
                }
            }
            MoveDirection::Down => {
                for i in (0..len.saturating_sub(1)).rev() {
                    if moving[i] && !moving[i + 1] {
                        blocks.swap(i, i + 1);
                        moving.swap(i, i + 1);
                    }
                }
            }
            MoveDirection::Top | MoveDirection::Bottom => {
                let (selected, rest): (Vec<_>, Vec<_>) = std::mem::take(blocks)
                    .into_iter()
                    .zip(moving)
                    .partition(|(_, m)| *m);
                let selected = selected.into_iter().map(|(b, _)| b);
                let rest = rest.into_iter().map(|(b, _)| b);
                *blocks = if direction == MoveDirection::Top {
                    selected.chain(rest).collect()
                } else {
                    rest.chain(selected).collect()
                };
            }
        }
        Ok(())
    }

    /// Inline edit of a text or heading block's text.
    pub fn edit_text(&mut self, index: usize, text: &str) -> Result<()> {
        self.check_index(index)?;
        let block = &mut self.document.blocks[index];
        let updated = match block.attributes().clone() {
            BlockAttributes::Text {
                align,
                style,
                lyrics,
                ..
            } => BlockAttributes::Text {
                content: text.trim().to_string(),
                align,
                style,
                lyrics,
            },
            BlockAttributes::Heading { level, .. } => BlockAttributes::Heading {
                text: text.trim().to_string(),
                level,
            },
            other => {
                return Err(EditorError::Validation(format!(
                    "{} blocks cannot be edited inline",
                    other.kind().label()
                )))
            }
        };
        block.set_attributes(updated)
    }

    pub fn replace_attributes(&mut self, index: usize, attributes: BlockAttributes) -> Result<()> {
        self.check_index(index)?;
        self.document.blocks[index].set_attributes(attributes)
    }

    /// Restores the block order captured when the document was opened.
    pub fn reset_to_original(&mut self) -> Result<()> {
        if self.original.is_empty() {
            return Err(EditorError::NothingToRestore);
        }
        self.document.blocks = self.original.clone();
        Ok(())
    }

    /// Swaps in another document (recovery, import). The reset target stays.
    pub fn replace_all(&mut self, document: Document) {
        self.document = document;
    }

    pub fn summaries(&self) -> Vec<BlockSummary> {
        self.document
            .blocks
            .iter()
            .enumerate()
            .map(|(index, block)| BlockSummary {
                index,
                kind: block.kind(),
                label: block.kind().label(),
                title: block.preview_title(),
            })
            .collect()
    }

    pub fn editor_markup(&self) -> String {
        self.document
            .blocks
            .iter()
            .map(render::editor_markup)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TextAlign, TextStyle};
    use uuid::Uuid;

    fn text(content: &str) -> Block {
        Block::new(BlockAttributes::Text {
            content: content.to_string(),
            align: TextAlign::Left,
            style: TextStyle::Standard,
            lyrics: false,
        })
        .unwrap()
    }

    fn model(items: &[&str]) -> DocumentModel {
        let mut doc = Document::new("Test");
        doc.blocks = items.iter().map(|s| text(s)).collect();
        DocumentModel::new(doc)
    }

    fn contents(model: &DocumentModel) -> Vec<String> {
        model
            .blocks()
            .iter()
            .map(|b| b.attributes().plain_text())
            .collect()
    }

    #[test]
    fn test_append_and_insert_after() {
        let mut m = model(&["a", "b"]);
        assert_eq!(m.append(text("c")), 2);
        assert_eq!(m.insert_after(0, text("x")).unwrap(), 1);
        assert_eq!(contents(&m), ["a", "x", "b", "c"]);
        assert!(m.insert_after(9, text("y")).is_err());
    }

    #[test]
    fn test_remove_at_out_of_range_is_recoverable() {
        let mut m = model(&["a", "b"]);
        let err = m.remove_at(5).unwrap_err();
        assert!(matches!(err, EditorError::IndexOutOfRange { index: 5, len: 2 }));
        assert_eq!(contents(&m), ["a", "b"]);
        assert_eq!(m.remove_at(0).unwrap().attributes().plain_text(), "a");
        assert_eq!(contents(&m), ["b"]);
    }

    #[test]
    fn test_remove_many_is_atomic() {
        let mut m = model(&["a", "b", "c", "d"]);
        assert!(m.remove_many(&[1, 7]).is_err());
        assert_eq!(m.len(), 4);

        let removed = m.remove_many(&[3, 1, 1]).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].attributes().plain_text(), "b");
        assert_eq!(contents(&m), ["a", "c"]);
    }

    #[test]
    fn test_duplicate_inserts_after_each_source() {
        // Sample scenario: [A,B,C,D,E], duplicate {2,4} (1-based).
        let mut m = model(&["A", "B", "C", "D", "E"]);
        let before: Vec<Uuid> = m.blocks().iter().map(|b| b.id()).collect();
        assert_eq!(m.duplicate(&[1, 3]).unwrap(), 2);
        assert_eq!(contents(&m), ["A", "B", "B", "C", "D", "D", "E"]);
        assert_ne!(m.blocks()[1].id(), m.blocks()[2].id());
        assert_eq!(m.blocks()[1].id(), before[1]);
    }

    #[test]
    fn test_move_up_and_down_as_group() {
        let mut m = model(&["a", "b", "c", "d"]);
        m.move_blocks(&[1, 2], MoveDirection::Up).unwrap();
        assert_eq!(contents(&m), ["b", "c", "a", "d"]);
        m.move_blocks(&[0, 1], MoveDirection::Up).unwrap();
        assert_eq!(contents(&m), ["b", "c", "a", "d"]);

        m.move_blocks(&[0, 1], MoveDirection::Down).unwrap();
        assert_eq!(contents(&m), ["a", "b", "c", "d"]);
        m.move_blocks(&[3], MoveDirection::Down).unwrap();
        assert_eq!(contents(&m), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_move_non_contiguous_up() {
        let mut m = model(&["a", "b", "c", "d", "e"]);
        m.move_blocks(&[1, 3], MoveDirection::Up).unwrap();
        assert_eq!(contents(&m), ["b", "a", "d", "c", "e"]);
    }

    #[test]
    fn test_move_top_and_bottom_preserve_order() {
        let mut m = model(&["a", "b", "c", "d", "e"]);
        m.move_blocks(&[3, 1], MoveDirection::Top).unwrap();
        assert_eq!(contents(&m), ["b", "d", "a", "c", "e"]);
        m.move_blocks(&[0, 1], MoveDirection::Top).unwrap();
        assert_eq!(contents(&m), ["b", "d", "a", "c", "e"]);

        m.move_blocks(&[0, 2], MoveDirection::Bottom).unwrap();
        assert_eq!(contents(&m), ["d", "c", "e", "b", "a"]);
    }

    #[test]
    fn test_move_rejects_bad_index() {
        let mut m = model(&["a", "b"]);
        assert!(m.move_blocks(&[0, 2], MoveDirection::Top).is_err());
        assert_eq!(contents(&m), ["a", "b"]);
    }

    #[test]
    fn test_edit_text_only_for_text_and_heading() {
        let mut m = model(&["a"]);
        m.append(
            Block::new(BlockAttributes::Quote {
                text: "q".into(),
                author: None,
            })
            .unwrap(),
        );
        m.edit_text(0, "  edited  ").unwrap();
        assert_eq!(contents(&m)[0], "edited");
        assert!(m.blocks()[0].markup().contains(">edited<"));

        assert!(matches!(
            m.edit_text(1, "x"),
            Err(EditorError::Validation(_))
        ));
        assert!(m.edit_text(0, "   ").is_err());
        assert_eq!(contents(&m)[0], "edited");
    }

    #[test]
    fn test_replace_attributes_keeps_kind() {
        let mut m = model(&["plain"]);
        m.replace_attributes(
            0,
            BlockAttributes::Text {
                content: "centered".into(),
                align: TextAlign::Center,
                style: TextStyle::Bordered,
                lyrics: false,
            },
        )
        .unwrap();
        assert_eq!(contents(&m)[0], "centered");
        assert!(m.blocks()[0].markup().contains("centered"));

        let err = m.replace_attributes(
            0,
            BlockAttributes::Quote {
                text: "q".into(),
                author: None,
            },
        );
        assert!(matches!(err, Err(EditorError::Validation(_))));
        let same = m.blocks()[0].attributes().clone();
        assert!(m.replace_attributes(3, same).is_err());
        assert_eq!(contents(&m)[0], "centered");
    }

    #[test]
    fn test_reset_restores_original_each_time() {
        let mut m = model(&["a", "b", "c"]);
        m.move_blocks(&[2], MoveDirection::Top).unwrap();
        m.remove_at(0).unwrap();
        m.reset_to_original().unwrap();
        assert_eq!(contents(&m), ["a", "b", "c"]);

        m.duplicate(&[0]).unwrap();
        m.reset_to_original().unwrap();
        assert_eq!(contents(&m), ["a", "b", "c"]);
    }

    #[test]
    fn test_reset_with_empty_original_fails() {
        let mut m = DocumentModel::new(Document::new("Empty"));
        m.append(text("new"));
        assert!(matches!(
            m.reset_to_original(),
            Err(EditorError::NothingToRestore)
        ));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_replace_all_keeps_reset_target() {
        let mut m = model(&["a"]);
        let mut other = Document::new("Other");
        other.blocks = vec![text("x"), text("y")];
        m.replace_all(other);
        assert_eq!(m.document().title, "Other");
        m.reset_to_original().unwrap();
        assert_eq!(contents(&m), ["a"]);
    }

    #[test]
    fn test_summaries() {
        let mut m = model(&["hello"]);
        m.append(
            Block::new(BlockAttributes::Image {
                url: "https://x/a.png".into(),
                alt: None,
                caption: None,
            })
            .unwrap(),
        );
        let rows = m.summaries();
        assert_eq!(rows[0].label, "Text");
        assert_eq!(rows[0].title, "hello");
        assert_eq!(rows[1].label, "Media");
        assert_eq!(rows[1].title, "Media Item");
    }

    #[test]
    fn test_editor_markup_has_affordances() {
        let m = model(&["a", "b"]);
        let html = m.editor_markup();
        assert_eq!(html.matches("drag-handle").count(), 2);
        assert_eq!(html.matches("delete-btn").count(), 2);
    }
}
