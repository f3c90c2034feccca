/// Text of one opened file. Replaced wholesale when another file is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    raw_text: String,
    title: String,
}

impl Document {
    pub fn new(title: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            title: title.into(),
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn word_count(&self) -> usize {
        self.raw_text.split_whitespace().count()
    }
}
