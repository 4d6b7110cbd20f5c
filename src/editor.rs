use unicode_width::UnicodeWidthStr;

/// Multi-line text with a cursor. The cursor is a byte offset that always
/// sits on a char boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    content: String,
    cursor: usize,
}

impl TextBuffer {
    /// Cursor starts at the end of `content`.
    pub fn new(content: &str) -> Self {
        TextBuffer {
            content: content.to_string(),
            cursor: content.len(),
        }
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(c) = self.content[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
            self.content.remove(self.cursor);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.content.len() {
            self.content.remove(self.cursor);
        }
    }

    pub fn left(&mut self) {
        if let Some(c) = self.content[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
        }
    }

    pub fn right(&mut self) {
        if let Some(c) = self.content[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn up(&mut self) {
        let line_start = self.line_start(self.cursor);
        if line_start == 0 {
            return;
        }
        let column = self.content[line_start..self.cursor].chars().count();
        let prev_start = self.line_start(line_start - 1);
        self.cursor = self.offset_in_line(prev_start, line_start - 1, column);
    }

    pub fn down(&mut self) {
        let Some(newline) = self.content[self.cursor..].find('\n') else {
            return;
        };
        let line_start = self.line_start(self.cursor);
        let column = self.content[line_start..self.cursor].chars().count();
        let next_start = self.cursor + newline + 1;
        let next_end = self.content[next_start..]
            .find('\n')
            .map(|i| next_start + i)
            .unwrap_or(self.content.len());
        self.cursor = self.offset_in_line(next_start, next_end, column);
    }

    /// Row and display column of the cursor, for placing the terminal cursor.
    pub fn cursor_position(&self) -> (u16, u16) {
        let before = &self.content[..self.cursor];
        let row = before.matches('\n').count();
        let line_start = self.line_start(self.cursor);
        let column = self.content[line_start..self.cursor].width();
        (
            u16::try_from(row).unwrap_or(u16::MAX),
            u16::try_from(column).unwrap_or(u16::MAX),
        )
    }

    fn line_start(&self, offset: usize) -> usize {
        self.content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    fn offset_in_line(&self, start: usize, end: usize, column: usize) -> usize {
        self.content[start..end]
            .char_indices()
            .nth(column)
            .map(|(i, _)| start + i)
            .unwrap_or(end)
    }
}
