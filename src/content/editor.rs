use serde::{Deserialize, Deserializer, Serialize};

use super::block::{BlockKind, BlockPatch, ContentBlock};
use super::markup::{self, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Ordered block sequence of a draft plus the one block currently expanded
/// in the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockListEditor {
    blocks: Vec<ContentBlock>,
    expanded: Option<usize>,
    /// Text selection to restore after the last highlight toggle.
    selection: Option<Selection>,
}

/// One editor action, as sent by the admin client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditorCommand {
    Add { kind: BlockKind },
    Update { index: usize, patch: BlockPatch },
    Remove { index: usize },
    Move { index: usize, direction: Direction },
    AddItem { index: usize },
    UpdateItem { index: usize, position: usize, text: String },
    RemoveItem { index: usize, position: usize },
    Expand { index: usize },
    /// `position` picks a list row; other text blocks leave it out.
    ToggleHighlight {
        index: usize,
        position: Option<usize>,
        selection: Selection,
    },
}

impl BlockListEditor {
    pub fn from_blocks(mut blocks: Vec<ContentBlock>) -> Self {
        blocks.iter_mut().for_each(ContentBlock::normalize);
        BlockListEditor {
            blocks,
            expanded: None,
            selection: None,
        }
    }

    /// Restore the expanded block reported by the client; out of range is dropped.
    pub fn with_expanded(mut self, expanded: Option<usize>) -> Self {
        self.expanded = expanded.filter(|i| *i < self.blocks.len());
        self
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<ContentBlock> {
        self.blocks
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Append an empty block and expand it. Returns its index.
    pub fn add_block(&mut self, kind: BlockKind) -> usize {
        self.blocks.push(ContentBlock::empty(kind));
        let index = self.blocks.len() - 1;
        self.expanded = Some(index);
        index
    }

    pub fn update_block(&mut self, index: usize, patch: &BlockPatch) -> bool {
        match self.blocks.get_mut(index) {
            Some(block) => {
                block.apply(patch);
                true
            }
            None => false,
        }
    }

    pub fn remove_block(&mut self, index: usize) -> Option<ContentBlock> {
        if index >= self.blocks.len() {
            return None;
        }
        let removed = self.blocks.remove(index);
        self.expanded = match self.expanded {
            Some(e) if e == index => None,
            Some(e) if e > index => Some(e - 1),
            other => other,
        };
        Some(removed)
    }

    /// Swap with the neighbour in `direction`. Moving past either end is a no-op.
    pub fn move_block(&mut self, index: usize, direction: Direction) -> bool {
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1),
        };
        let Some(target) = target.filter(|t| *t < self.blocks.len() && index < self.blocks.len())
        else {
            return false;
        };
        self.blocks.swap(index, target);
        // The expanded block travels with its content.
        self.expanded = match self.expanded {
            Some(e) if e == index => Some(target),
            Some(e) if e == target => Some(index),
            other => other,
        };
        true
    }

    pub fn add_list_item(&mut self, index: usize) -> bool {
        match self.blocks.get_mut(index) {
            Some(ContentBlock::List { items }) => {
                items.push(String::new());
                true
            }
            _ => false,
        }
    }

    pub fn update_list_item(&mut self, index: usize, position: usize, text: &str) -> bool {
        match self.blocks.get_mut(index) {
            Some(ContentBlock::List { items }) => match items.get_mut(position) {
                Some(item) => {
                    *item = text.to_string();
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Remove one row. The last remaining row is blanked instead of removed.
    pub fn remove_list_item(&mut self, index: usize, position: usize) -> bool {
        match self.blocks.get_mut(index) {
            Some(ContentBlock::List { items }) if position < items.len() => {
                if items.len() == 1 {
                    items[0].clear();
                } else {
                    items.remove(position);
                }
                true
            }
            _ => false,
        }
    }

    /// Expand `index`, or collapse it when it is already expanded.
    pub fn toggle_expanded(&mut self, index: usize) {
        if index >= self.blocks.len() {
            return;
        }
        self.expanded = if self.expanded == Some(index) { None } else { Some(index) };
    }

    /// Wrap or unwrap `**` around `selection` in a block's text, or in one
    /// list row when `position` is given. Images carry no markup.
    pub fn toggle_highlight(
        &mut self,
        index: usize,
        position: Option<usize>,
        selection: Selection,
    ) -> Option<Selection> {
        let text = match (self.blocks.get_mut(index)?, position) {
            (ContentBlock::List { items }, Some(position)) => items.get_mut(position)?,
            (
                ContentBlock::Paragraph { content }
                | ContentBlock::Heading { content, .. }
                | ContentBlock::Quote { content }
                | ContentBlock::Callout { content, .. },
                None,
            ) => content,
            _ => return None,
        };
        let (toggled, restored) = markup::toggle_highlight(text, selection);
        if toggled == *text {
            return None;
        }
        *text = toggled;
        Some(restored)
    }

    /// Returns false when the command did not change anything.
    pub fn apply(&mut self, command: &EditorCommand) -> bool {
        self.selection = None;
        match command {
            EditorCommand::Add { kind } => {
                self.add_block(*kind);
                true
            }
            EditorCommand::Update { index, patch } => self.update_block(*index, patch),
            EditorCommand::Remove { index } => self.remove_block(*index).is_some(),
            EditorCommand::Move { index, direction } => self.move_block(*index, *direction),
            EditorCommand::AddItem { index } => self.add_list_item(*index),
            EditorCommand::UpdateItem { index, position, text } => {
                self.update_list_item(*index, *position, text)
            }
            EditorCommand::RemoveItem { index, position } => {
                self.remove_list_item(*index, *position)
            }
            EditorCommand::Expand { index } => {
                let before = self.expanded;
                self.toggle_expanded(*index);
                before != self.expanded
            }
            EditorCommand::ToggleHighlight { index, position, selection } => {
                self.selection = self.toggle_highlight(*index, *position, *selection);
                self.selection.is_some()
            }
        }
    }
}

/// Blog post as edited in the admin, before it is saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPostDraft {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub category: String,
    pub author_name: String,
    pub date: String,
    pub featured_image: String,
    pub read_time: String,
    pub featured: bool,
    pub is_published: bool,
    #[serde(deserialize_with = "tags_from_input")]
    pub tags: Vec<String>,
    pub content: Vec<ContentBlock>,
}

impl BlogPostDraft {
    /// Validate and fill derived fields before persisting.
    pub fn prepare(&mut self) -> Result<(), String> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err("Title is required".to_string());
        }

        let source = if self.slug.trim().is_empty() { &self.title } else { &self.slug };
        self.slug = slug::slugify(source);
        if self.slug.is_empty() {
            return Err("Slug must contain at least one letter or digit".to_string());
        }

        self.tags = self
            .tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let content = std::mem::take(&mut self.content);
        self.content = BlockListEditor::from_blocks(content).into_blocks();

        if self.read_time.trim().is_empty() {
            self.read_time = super::reading_time(&self.content);
        }
        Ok(())
    }
}

/// Split the comma-separated tag field of the editor form.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsInput {
    List(Vec<String>),
    Text(String),
}

fn tags_from_input<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TagsInput::deserialize(deserializer)? {
        TagsInput::List(list) => list,
        TagsInput::Text(text) => parse_tags(&text),
    })
}
