use std::collections::BTreeSet;

/// What the viewer has picked: highlighted series, the displayed variant and
/// whether auxiliary comparison series are drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub highlighted: BTreeSet<String>,
    pub variant: Option<String>,
    pub show_auxiliary: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            highlighted: BTreeSet::new(),
            variant: None,
            show_auxiliary: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesClass {
    Highlighted,
    Background,
    /// Nothing is highlighted.
    Neutral,
}

impl SeriesClass {
    pub fn css(self) -> &'static str {
        match self {
            SeriesClass::Highlighted => "series-highlighted",
            SeriesClass::Background => "series-background",
            SeriesClass::Neutral => "series-neutral",
        }
    }
}

impl Selection {
    pub fn toggle(&mut self, series_id: &str) {
        if !self.highlighted.remove(series_id) {
            self.highlighted.insert(series_id.to_string());
        }
    }

    pub fn class_of(&self, series_id: &str) -> SeriesClass {
        if self.highlighted.is_empty() {
            SeriesClass::Neutral
        } else if self.highlighted.contains(series_id) {
            SeriesClass::Highlighted
        } else {
            SeriesClass::Background
        }
    }
}
