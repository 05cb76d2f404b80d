use std::collections::BTreeMap;

/// Named single-letter bookmarks into the document's line numbering.
///
/// Every structural edit must be reported here so that no mark is ever left
/// pointing at a line that moved or no longer exists.
#[derive(Debug, Clone, Default)]
pub struct MarkTable {
    marks: BTreeMap<char, usize>,
}

impl MarkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` at `line`, replacing any previous mark of that name.
    pub fn set(&mut self, name: char, line: usize) {
        self.marks.insert(name, line);
    }

    pub fn get(&self, name: char) -> Option<usize> {
        self.marks.get(&name).copied()
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, usize)> + '_ {
        self.marks.iter().map(|(name, line)| (*name, *line))
    }

    /// Lines `start..=end` were removed. Marks on them are dropped and handed
    /// back; marks below shift up.
    pub fn lines_deleted(&mut self, start: usize, end: usize) -> Vec<(char, usize)> {
        let count = end + 1 - start;
        let mut removed = Vec::new();
        self.marks.retain(|name, line| {
            if (start..=end).contains(line) {
                removed.push((*name, *line));
                false
            } else {
                if *line > end {
                    *line -= count;
                }
                true
            }
        });
        removed
    }

    /// `count` lines were inserted after line `after`.
    pub fn lines_inserted(&mut self, after: usize, count: usize) {
        for line in self.marks.values_mut() {
            if *line > after {
                *line += count;
            }
        }
    }

    /// Lines `start..=end` were moved to follow line `dest` (numbered before the
    /// move). Marks on the moved lines are dropped and handed back. Marks on
    /// the lines the block jumped over shift by the block length.
    pub fn lines_moved(&mut self, start: usize, end: usize, dest: usize) -> Vec<(char, usize)> {
        let count = end + 1 - start;
        let mut removed = Vec::new();
        self.marks.retain(|name, line| {
            if (start..=end).contains(line) {
                removed.push((*name, *line));
                return false;
            }
            if dest < start && *line > dest && *line < start {
                *line += count;
            } else if dest > end && *line > end && *line <= dest {
                *line -= count;
            }
            true
        });
        removed
    }

    /// Puts back marks an undone command removed.
    pub fn restore(&mut self, marks: &[(char, usize)]) {
        for (name, line) in marks {
            self.marks.insert(*name, *line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(marks: &[(char, usize)]) -> MarkTable {
        let mut table = MarkTable::new();
        table.restore(marks);
        table
    }

    #[test]
    fn test_set_replaces() {
        let mut marks = MarkTable::new();
        marks.set('a', 3);
        marks.set('a', 5);
        assert_eq!(marks.get('a'), Some(5));
        assert_eq!(marks.get('b'), None);
    }

    #[test]
    fn test_delete_first_line_renumbers() {
        let mut marks = table(&[('a', 2), ('b', 4)]);
        let removed = marks.lines_deleted(1, 1);
        assert!(removed.is_empty());
        assert_eq!(marks.get('a'), Some(1));
        assert_eq!(marks.get('b'), Some(3));
    }

    #[test]
    fn test_delete_removes_marks_in_span() {
        let mut marks = table(&[('a', 1), ('b', 3), ('c', 4), ('d', 7)]);
        let removed = marks.lines_deleted(3, 5);
        assert_eq!(removed, vec![('b', 3), ('c', 4)]);
        assert_eq!(marks.get('a'), Some(1));
        assert_eq!(marks.get('d'), Some(4));
    }

    #[test]
    fn test_insert_shifts_lines_below() {
        let mut marks = table(&[('a', 2), ('b', 3)]);
        marks.lines_inserted(2, 4);
        assert_eq!(marks.get('a'), Some(2));
        assert_eq!(marks.get('b'), Some(7));
    }

    #[test]
    fn test_move_up() {
        // 4,6m2 on a..f
        let mut marks = table(&[('a', 1), ('b', 2), ('c', 3), ('e', 5), ('x', 8)]);
        let removed = marks.lines_moved(4, 6, 2);
        assert_eq!(removed, vec![('e', 5)]);
        assert_eq!(marks.get('a'), Some(1));
        assert_eq!(marks.get('b'), Some(2));
        assert_eq!(marks.get('c'), Some(6));
        assert_eq!(marks.get('x'), Some(8));
    }

    #[test]
    fn test_move_down() {
        // 2,3m6
        let mut marks = table(&[('a', 1), ('b', 2), ('d', 4), ('f', 6), ('g', 7)]);
        let removed = marks.lines_moved(2, 3, 6);
        assert_eq!(removed, vec![('b', 2)]);
        assert_eq!(marks.get('a'), Some(1));
        assert_eq!(marks.get('d'), Some(2));
        assert_eq!(marks.get('f'), Some(4));
        assert_eq!(marks.get('g'), Some(7));
    }

    #[test]
    fn test_restore_after_delete() {
        let mut marks = table(&[('a', 2), ('b', 4)]);
        let removed = marks.lines_deleted(2, 2);
        marks.lines_inserted(1, 1);
        marks.restore(&removed);
        assert_eq!(marks.get('a'), Some(2));
        assert_eq!(marks.get('b'), Some(4));
    }
}
