use serde::{Deserialize, Serialize};

/// Discriminant of a [`ContentBlock`], used when adding a block in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Paragraph,
    Heading,
    List,
    Quote,
    Image,
    Callout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum HeadingLevel {
    #[default]
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    pub fn tag(self) -> &'static str {
        match self {
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
            HeadingLevel::H4 => "h4",
        }
    }
}

// Out-of-range levels snap to the nearest supported one.
impl From<u8> for HeadingLevel {
    fn from(level: u8) -> Self {
        match level {
            0..=2 => HeadingLevel::H2,
            3 => HeadingLevel::H3,
            _ => HeadingLevel::H4,
        }
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        match level {
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalloutVariant {
    #[default]
    Info,
    Warning,
    Tip,
}

impl CalloutVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            CalloutVariant::Info => "info",
            CalloutVariant::Warning => "warning",
            CalloutVariant::Tip => "tip",
        }
    }
}

/// One typed unit of article content. Stored as JSON tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Paragraph {
        #[serde(default)]
        content: String,
    },
    Heading {
        #[serde(default)]
        content: String,
        #[serde(default)]
        level: HeadingLevel,
    },
    List {
        #[serde(default)]
        items: Vec<String>,
    },
    Quote {
        #[serde(default)]
        content: String,
    },
    Image {
        #[serde(default)]
        src: String,
        #[serde(default)]
        alt: String,
        #[serde(default)]
        caption: String,
    },
    Callout {
        #[serde(default)]
        content: String,
        #[serde(default)]
        variant: CalloutVariant,
    },
}

/// Partial field update for a block. Fields that do not belong to the
/// target block's variant are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockPatch {
    pub content: Option<String>,
    pub level: Option<HeadingLevel>,
    pub items: Option<Vec<String>>,
    pub src: Option<String>,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub variant: Option<CalloutVariant>,
}

impl ContentBlock {
    /// A freshly added block: empty text, default options, one empty list row.
    pub fn empty(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Paragraph => ContentBlock::Paragraph { content: String::new() },
            BlockKind::Heading => ContentBlock::Heading {
                content: String::new(),
                level: HeadingLevel::default(),
            },
            BlockKind::List => ContentBlock::List { items: vec![String::new()] },
            BlockKind::Quote => ContentBlock::Quote { content: String::new() },
            BlockKind::Image => ContentBlock::Image {
                src: String::new(),
                alt: String::new(),
                caption: String::new(),
            },
            BlockKind::Callout => ContentBlock::Callout {
                content: String::new(),
                variant: CalloutVariant::default(),
            },
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            ContentBlock::Paragraph { .. } => BlockKind::Paragraph,
            ContentBlock::Heading { .. } => BlockKind::Heading,
            ContentBlock::List { .. } => BlockKind::List,
            ContentBlock::Quote { .. } => BlockKind::Quote,
            ContentBlock::Image { .. } => BlockKind::Image,
            ContentBlock::Callout { .. } => BlockKind::Callout,
        }
    }

    /// Restore invariants on content loaded from storage or the client.
    pub fn normalize(&mut self) {
        if let ContentBlock::List { items } = self {
            if items.is_empty() {
                items.push(String::new());
            }
        }
    }

    pub fn apply(&mut self, patch: &BlockPatch) {
        match self {
            ContentBlock::Paragraph { content } | ContentBlock::Quote { content } => {
                if let Some(c) = &patch.content {
                    *content = c.clone();
                }
            }
            ContentBlock::Heading { content, level } => {
                if let Some(c) = &patch.content {
                    *content = c.clone();
                }
                if let Some(l) = patch.level {
                    *level = l;
                }
            }
            ContentBlock::List { items } => {
                if let Some(new_items) = &patch.items {
                    *items = new_items.clone();
                }
            }
            ContentBlock::Image { src, alt, caption } => {
                if let Some(s) = &patch.src {
                    *src = s.clone();
                }
                if let Some(a) = &patch.alt {
                    *alt = a.clone();
                }
                if let Some(c) = &patch.caption {
                    *caption = c.clone();
                }
            }
            ContentBlock::Callout { content, variant } => {
                if let Some(c) = &patch.content {
                    *content = c.clone();
                }
                if let Some(v) = patch.variant {
                    *variant = v;
                }
            }
        }
        self.normalize();
    }

    /// Visible text with markup markers left in place; used for word counts.
    pub fn plain_text(&self) -> String {
        match self {
            ContentBlock::Paragraph { content }
            | ContentBlock::Heading { content, .. }
            | ContentBlock::Quote { content }
            | ContentBlock::Callout { content, .. } => content.clone(),
            ContentBlock::List { items } => items.join(" "),
            ContentBlock::Image { caption, .. } => caption.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_blocks_with_defaults() {
        let json = r#"[
            {"type": "heading", "content": "Why outsource"},
            {"type": "callout", "content": "Note"},
            {"type": "image", "src": "/uploads/a.png"},
            {"type": "list"}
        ]"#;
        let mut blocks: Vec<ContentBlock> = serde_json::from_str(json).unwrap();
        blocks.iter_mut().for_each(ContentBlock::normalize);

        assert_eq!(
            blocks[0],
            ContentBlock::Heading { content: "Why outsource".into(), level: HeadingLevel::H2 }
        );
        assert_eq!(
            blocks[1],
            ContentBlock::Callout { content: "Note".into(), variant: CalloutVariant::Info }
        );
        assert!(matches!(&blocks[2], ContentBlock::Image { alt, caption, .. } if alt.is_empty() && caption.is_empty()));
        assert_eq!(blocks[3], ContentBlock::List { items: vec![String::new()] });
    }

    #[test]
    fn heading_level_serializes_as_number() {
        let block = ContentBlock::Heading { content: "x".into(), level: HeadingLevel::H3 };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "heading");
        assert_eq!(value["level"], 3);

        let snapped: ContentBlock =
            serde_json::from_str(r#"{"type":"heading","content":"x","level":6}"#).unwrap();
        assert!(matches!(snapped, ContentBlock::Heading { level: HeadingLevel::H4, .. }));
    }

    #[test]
    fn patch_ignores_fields_of_other_variants() {
        let mut block = ContentBlock::Paragraph { content: "old".into() };
        block.apply(&BlockPatch {
            content: Some("new".into()),
            level: Some(HeadingLevel::H4),
            variant: Some(CalloutVariant::Tip),
            ..Default::default()
        });
        assert_eq!(block, ContentBlock::Paragraph { content: "new".into() });
    }

    #[test]
    fn patch_never_empties_a_list() {
        let mut block = ContentBlock::empty(BlockKind::List);
        block.apply(&BlockPatch { items: Some(vec![]), ..Default::default() });
        assert_eq!(block, ContentBlock::List { items: vec![String::new()] });
    }

    #[test]
    fn empty_blocks_keep_their_kind() {
        for kind in [
            BlockKind::Paragraph,
            BlockKind::Heading,
            BlockKind::List,
            BlockKind::Quote,
            BlockKind::Image,
            BlockKind::Callout,
        ] {
            assert_eq!(ContentBlock::empty(kind).kind(), kind);
        }
    }
}
