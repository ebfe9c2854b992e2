use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Position, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::theme::Theme;

/// Single line editor with a character-based cursor
#[derive(Debug, Default, Clone)]
pub struct TextInput {
    value: String,
    character_index: usize,
}

impl TextInput {
    pub fn with_value(value: impl Into<String>) -> Self {
        let mut input = Self::default();
        input.set_value(value);
        input
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.character_index
    }

    /// Replace the contents, placing the cursor at the end
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.character_index = self.value.chars().count();
    }

    /// Take the contents, leaving the input empty
    pub fn take(&mut self) -> String {
        self.reset_cursor();
        std::mem::take(&mut self.value)
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.reset_cursor();
    }

    /// Apply an editing key, returning whether it was used
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(to_insert) => self.enter_char(to_insert),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Home => self.reset_cursor(),
            KeyCode::End => self.character_index = self.value.chars().count(),
            _ => return false,
        }
        true
    }

    fn move_cursor_right(&mut self) {
        let cursor_moved_right = self.character_index.saturating_add(1);
        self.character_index = self.clamp_cursor(cursor_moved_right);
    }

    fn move_cursor_left(&mut self) {
        let cursor_moved_left = self.character_index.saturating_sub(1);
        self.character_index = self.clamp_cursor(cursor_moved_left);
    }

    fn enter_char(&mut self, new_char: char) {
        let index = self.byte_index();
        self.value.insert(index, new_char);
        self.move_cursor_right();
    }

    fn delete_char(&mut self) {
        if self.character_index == 0 {
            return;
        }
        // String::remove works on bytes, so rebuild from chars
        let before = self.value.chars().take(self.character_index - 1);
        let after = self.value.chars().skip(self.character_index);
        self.value = before.chain(after).collect();
        self.move_cursor_left();
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.character_index)
            .unwrap_or(self.value.len())
    }

    fn clamp_cursor(&self, new_cursor_pos: usize) -> usize {
        new_cursor_pos.clamp(0, self.value.chars().count())
    }

    fn reset_cursor(&mut self) {
        self.character_index = 0;
    }

    /// Draw `prompt` followed by the contents, placing the terminal cursor
    pub fn view(&self, frame: &mut Frame, area: Rect, prompt: &str, theme: &Theme) {
        if area.height == 0 {
            return;
        }
        let line = Line::from(vec![
            Span::styled(prompt.to_string(), theme.prompt),
            Span::styled(self.value.clone(), theme.text),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        let column = prompt.chars().count() + self.character_index;
        let x = (area.x as usize + column).min(area.right().saturating_sub(1) as usize);
        frame.set_cursor_position(Position::new(x as u16, area.y));
    }
}
