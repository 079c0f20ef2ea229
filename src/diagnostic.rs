/// Computes the 1-based line and column of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Returns the full text of a 1-based line, without its terminator.
pub fn line_text(source: &str, line_num: usize) -> &str {
    source
        .split('\n')
        .nth(line_num.saturating_sub(1))
        .unwrap_or("")
        .trim_end_matches('\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let source = "x = 5;\ny = 10;";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 4), (1, 5));
        assert_eq!(line_col(source, 7), (2, 1));
        assert_eq!(line_col(source, 11), (2, 5));
    }

    #[test]
    fn test_line_text() {
        let source = "first line\nsecond line\n";
        assert_eq!(line_text(source, 1), "first line");
        assert_eq!(line_text(source, 2), "second line");
        assert_eq!(line_text(source, 9), "");
    }
}
