use super::{Code, Position};
use once_cell::unsync::OnceCell;

impl<'c> From<&'c [u8]> for Code<'c> {
    fn from(value: &'c [u8]) -> Self {
        Code::new(value)
    }
}
impl<'c> From<&'c str> for Code<'c> {
    fn from(value: &'c str) -> Self {
        Code::new(value.as_bytes())
    }
}

impl<'c> Code<'c> {
    pub fn new(value: &'c [u8]) -> Self {
        Self {
            value,
            line_starts: OnceCell::new(),
        }
    }

    /// Byte offsets at which each line begins. Index 0 is always 0.
    pub fn obtain_line_starts(&self) -> &Vec<usize> {
        self.line_starts.get_or_init(|| {
            let mut starts = vec![0];
            starts.extend(self.value.iter().enumerate().filter_map(|(index, b)| {
                if *b == b'\n' {
                    Some(index + 1)
                } else {
                    None
                }
            }));
            starts
        })
    }

    /// Translate a byte offset into 1-based line and column numbers.
    pub fn obtain_position(&self, pointer: usize) -> Position {
        let starts = self.obtain_line_starts();
        let line = match starts.binary_search(&pointer) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        Position::new(line + 1, pointer - starts[line] + 1)
    }
}
