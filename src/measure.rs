use unicode_width::UnicodeWidthStr;

use crate::graph::{EntityBody, SchemaEntity};

/// Node box dimensions handed to the layout engine.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMetrics {
    pub node_width: f64,
    pub header_height: f64,
    pub field_height: f64,
    pub symbol_height: f64,
    pub record_padding: f64,
    pub enum_padding: f64,
    /// Enum symbols beyond this count are not drawn.
    pub max_visible_symbols: usize,
    pub collapsed_extra: f64,
    pub char_width: f64,
    pub padding_x: f64,
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self {
            node_width: 280.0,
            header_height: 34.0,
            field_height: 28.0,
            symbol_height: 21.0,
            record_padding: 8.0,
            enum_padding: 12.0,
            max_visible_symbols: 8,
            collapsed_extra: 2.0,
            char_width: 8.0,
            padding_x: 12.0,
        }
    }
}

impl NodeMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    pub fn node_height(&self, entity: &SchemaEntity, collapsed: bool) -> f64 {
        if collapsed {
            return self.header_height + self.collapsed_extra;
        }
        match &entity.body {
            EntityBody::Record { fields } => {
                self.header_height + fields.len() as f64 * self.field_height + self.record_padding
            }
            EntityBody::Enum { symbols } => {
                let visible = symbols.len().min(self.max_visible_symbols);
                self.header_height + visible as f64 * self.symbol_height + self.enum_padding
            }
            EntityBody::Fixed { .. } => self.header_height + self.symbol_height + self.enum_padding,
        }
    }

    /// Fixed node width, widened when a label would not fit.
    pub fn node_width(&self, entity: &SchemaEntity, collapsed: bool) -> f64 {
        let header = self.text_width(&entity.name);
        let rows = if collapsed {
            0.0
        } else {
            match &entity.body {
                EntityBody::Record { fields } => fields
                    .iter()
                    .map(|f| self.text_width(&f.name) + self.text_width(&f.field_type.display) + self.char_width * 2.0)
                    .fold(0.0, f64::max),
                EntityBody::Enum { symbols } => symbols
                    .iter()
                    .take(self.max_visible_symbols)
                    .map(|s| self.text_width(s))
                    .fold(0.0, f64::max),
                EntityBody::Fixed { .. } => 0.0,
            }
        };
        (header.max(rows) + self.padding_x * 2.0).max(self.node_width)
    }

    pub fn node_size(&self, entity: &SchemaEntity, collapsed: bool) -> (f64, f64) {
        (self.node_width(entity, collapsed), self.node_height(entity, collapsed))
    }
}
