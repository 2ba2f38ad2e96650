use crate::{ColumnSplitter, ParseValue, TableParseError, LIST_DELIMITER};

/// Parses a 32-bit integer cell the way C `atoi` does: leading whitespace
/// is skipped, then an optional sign and the leading digits are read and
/// the rest is ignored, so `12abc` is `12` and `1.5` is `1`. A cell without
/// leading digits, or one that overflows `i32`, reads as `0`.
pub fn parse_int(text: &str) -> i32 {
    let text = text.trim_start();
    let sign_len = usize::from(text.starts_with(&['+', '-'][..]));
    let digit_len = text[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    text[..sign_len + digit_len].parse().unwrap_or(0)
}

/// Decodes a `list{int}` cell.
pub fn read_int_list(col: &str) -> Vec<i32> {
    if col.is_empty() {
        return Vec::new();
    }
    ColumnSplitter::new(col, LIST_DELIMITER).map(parse_int).collect()
}

/// Decodes a `list{string}` cell.
pub fn read_string_list(col: &str) -> Vec<String> {
    if col.is_empty() {
        return Vec::new();
    }
    ColumnSplitter::new(col, LIST_DELIMITER)
        .map(str::to_owned)
        .collect()
}

/// Decodes a `list{Struct}` cell. Fails if any element fails to parse.
pub fn read_struct_list<T: ParseValue>(col: &str) -> Option<Vec<T>> {
    if col.is_empty() {
        return Some(Vec::new());
    }
    ColumnSplitter::new(col, LIST_DELIMITER).map(T::parse).collect()
}

/// Checks that `line` has exactly `expected` cells.
pub fn check_column_count(
    line_number: usize,
    line: &[String],
    expected: usize,
) -> Result<(), TableParseError> {
    if line.len() != expected {
        return Err(TableParseError::ColumnCount {
            line: line_number,
            found: line.len(),
            expected,
        });
    }
    Ok(())
}

/// Checks that the name line cell at `index` (0-based) equals `name`.
pub fn check_column_name(line: &[String], index: usize, name: &str) -> Result<(), TableParseError> {
    match line.get(index) {
        Some(cell) if cell == name => Ok(()),
        _ => Err(TableParseError::ColumnName {
            column: index + 1,
            name: name.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::STRUCT_DELIMITER;

    #[derive(Debug, PartialEq)]
    struct Pair {
        a: i32,
        b: String,
    }

    impl ParseValue for Pair {
        fn parse(text: &str) -> Option<Self> {
            let mut s = ColumnSplitter::new(text, STRUCT_DELIMITER);
            let value = Pair {
                a: s.next_int()?,
                b: s.next_str()?.to_owned(),
            };
            if s.next_str().is_some() {
                return None;
            }
            Some(value)
        }
    }

    #[test]
    fn int_parsing_is_lenient() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int("-7"), -7);
        assert_eq!(parse_int(" 8 "), 8);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int("99999999999"), 0);
        // only the leading number counts
        assert_eq!(parse_int("12abc"), 12);
        assert_eq!(parse_int("1.5"), 1);
        assert_eq!(parse_int("3x"), 3);
        assert_eq!(parse_int(" -4x"), -4);
        assert_eq!(parse_int("+5"), 5);
        assert_eq!(parse_int("-"), 0);
        assert_eq!(parse_int("x3"), 0);
    }

    #[test]
    fn int_lists() {
        assert_eq!(read_int_list(""), Vec::<i32>::new());
        assert_eq!(read_int_list("1|2|3"), vec![1, 2, 3]);
        assert_eq!(read_int_list("1||x"), vec![1, 0, 0]);
    }

    #[test]
    fn string_lists() {
        assert!(read_string_list("").is_empty());
        assert_eq!(read_string_list("a|b|"), vec!["a", "b", ""]);
    }

    #[test]
    fn struct_lists() {
        assert_eq!(read_struct_list::<Pair>(""), Some(vec![]));
        assert_eq!(
            read_struct_list::<Pair>("1;x|2;y"),
            Some(vec![
                Pair { a: 1, b: "x".into() },
                Pair { a: 2, b: "y".into() },
            ])
        );
        // trailing data after the last field
        assert_eq!(read_struct_list::<Pair>("1;x;|2;y"), None);
        // missing field
        assert_eq!(read_struct_list::<Pair>("1"), None);
    }

    #[test]
    fn column_checks() {
        let line = vec!["id".to_string(), "itme".to_string()];
        assert!(check_column_count(3, &line, 2).is_ok());
        assert_eq!(
            check_column_count(3, &line, 3),
            Err(TableParseError::ColumnCount { line: 3, found: 2, expected: 3 })
        );
        assert!(check_column_name(&line, 0, "id").is_ok());
        let err = check_column_name(&line, 1, "item").unwrap_err();
        assert_eq!(err, TableParseError::ColumnName { column: 2, name: "item".into() });
        assert_eq!(err.line(), 2);
    }
}
