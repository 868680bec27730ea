//! Single-line text editing with a character cursor.
//!
//! The cursor counts chars, not bytes, so multi-byte input (accents, emoji)
//! never splits a code point.

/// Editable line of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineEditor {
    value: String,
    cursor: usize,
}

impl LineEditor {
    /// Create an editor with the cursor at the end of `value`.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.value.insert(idx, c);
        self.cursor += 1;
    }

    /// Delete the char before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        self.remove_at_cursor();
    }

    /// Delete the char under the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.remove_at_cursor();
        }
    }

    fn remove_at_cursor(&mut self) {
        if let Some((idx, ch)) = self.value.char_indices().nth(self.cursor) {
            self.value.replace_range(idx..idx + ch.len_utf8(), "");
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_in_middle() {
        let mut editor = LineEditor::new("hllo");
        editor.home();
        editor.move_right();
        editor.insert('e');
        assert_eq!(editor.value(), "hello");
        assert_eq!(editor.cursor(), 2);
    }

    #[test]
    fn test_multibyte_editing() {
        let mut editor = LineEditor::new("añ😀b");
        editor.backspace();
        editor.backspace();
        assert_eq!(editor.value(), "añ");

        editor.home();
        editor.delete();
        assert_eq!(editor.value(), "ñ");
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut editor = LineEditor::new("ab");
        editor.move_right();
        assert_eq!(editor.cursor(), 2);
        editor.delete();
        assert_eq!(editor.value(), "ab");

        editor.home();
        editor.move_left();
        editor.backspace();
        assert_eq!(editor.cursor(), 0);
        assert_eq!(editor.value(), "ab");
    }
}
