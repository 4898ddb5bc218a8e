/// Line start table for one buffer.
#[derive(Debug, Clone, Default)]
pub struct LineMap {
    line_starts: Vec<u32>,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0]; // First line starts at offset 0
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        LineMap { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based line of `offset`.
    pub fn line(&self, offset: u32) -> u32 {
        // partition_point is the index of the first line starting after `offset`
        self.line_starts.partition_point(|&start| start <= offset).max(1) as u32
    }

    /// 1-based line and column of `offset`.
    pub fn line_column(&self, offset: u32) -> (u32, u32) {
        let line = self.line(offset);
        let line_start = self.line_starts[line as usize - 1];
        (line, offset - line_start + 1)
    }

    pub fn line_start(&self, line: u32) -> Option<u32> {
        if line == 0 {
            return None;
        }
        self.line_starts.get(line as usize - 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        let map = LineMap::new("int a;\nint b;\n\nx");
        assert_eq!(map.line_column(0), (1, 1));
        assert_eq!(map.line_column(4), (1, 5));
        assert_eq!(map.line_column(7), (2, 1));
        assert_eq!(map.line_column(14), (3, 1));
        assert_eq!(map.line_column(15), (4, 1));
        assert_eq!(map.line_count(), 4);
    }

    #[test]
    fn test_line_start() {
        let map = LineMap::new("a\nbc\n");
        assert_eq!(map.line_start(0), None);
        assert_eq!(map.line_start(2), Some(2));
        assert_eq!(map.line_start(3), Some(5));
        assert_eq!(map.line_start(4), None);
        assert_eq!(map.line(5), 3);
    }
}
