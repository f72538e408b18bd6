//! Tests for the parenthesized record reader and writer

#[cfg(test)]
mod tests {
    use photomosaic::io::sexpr::{Value, parse, parse_all};

    // Tests nested lists with every atom kind
    // Verified by reading floats as symbols
    #[test]
    fn test_parse_atoms() {
        let value = parse(r#"(tile (filename "a b.png") (length 1234) (score -2.5) flag)"#)
            .expect("Failed to parse record");

        assert_eq!(value.tag(), Some("tile"));
        let fields = value.fields();
        assert_eq!(fields.len(), 4);
        assert_eq!(
            fields.first().and_then(|f| f.fields().first()).and_then(Value::as_str),
            Some("a b.png")
        );
        assert_eq!(
            fields.get(1).and_then(|f| f.fields().first()).and_then(Value::as_integer),
            Some(1234)
        );
        assert_eq!(
            fields.get(2).and_then(|f| f.fields().first()).and_then(Value::as_float),
            Some(-2.5)
        );
        assert_eq!(fields.get(3).and_then(Value::as_symbol), Some("flag"));
    }

    // Tests u64 values survive without sign loss
    // Verified by narrowing integers to i64
    #[test]
    fn test_wide_integers() {
        let value = parse("18446744073709551615").expect("Failed to parse integer");
        assert_eq!(value.as_int::<u64>(), Some(u64::MAX));
        assert_eq!(value.as_int::<u8>(), None);
        assert_eq!(value.to_string(), "18446744073709551615");
    }

    // Tests comments and whitespace between records
    // Verified by treating ';' as a symbol character
    #[test]
    fn test_comments_and_multiple_values() {
        let values = parse_all("; header\n(a 1) ; trailing\n\n(b 2)\n").expect("Failed to parse");
        let tags: Vec<Option<&str>> = values.iter().map(Value::tag).collect();
        assert_eq!(tags, vec![Some("a"), Some("b")]);
        assert!(parse_all("  ; only a comment").expect("Failed to parse").is_empty());
    }

    // Tests written values read back identically
    // Verified by writing floats with Display
    #[test]
    fn test_write_then_read() {
        let value = Value::tagged(
            "metapixel",
            [
                Value::tagged("filename", [Value::Str(r#"quote " and \ slash"#.to_owned())]),
                Value::tagged("score", [Value::Float(3.0)]),
                Value::tagged("rect", [Value::Integer(-4), Value::Integer(12)]),
                Value::List(Vec::new()),
            ],
        );

        let text = value.to_string();
        assert!(text.contains("3.0"));
        assert_eq!(parse(&text).expect("Failed to reparse"), value);
    }

    // Tests syntax errors report their position
    // Verified by reporting offset zero for every error
    #[test]
    fn test_errors() {
        let unterminated = parse("(a (b 1)").expect_err("Failed to reject open list");
        assert_eq!(unterminated.offset, 8);

        assert!(parse(")").is_err());
        assert!(parse("\"open").is_err());
        assert!(parse("(a) (b)").is_err());
        assert!(parse("").is_err());
        assert!(parse("1.2.3").is_err());
    }

    // Tests symbols that merely start like numbers
    // Verified by requiring only a leading sign for numbers
    #[test]
    fn test_sign_symbols() {
        assert_eq!(parse("-").ok(), Some(Value::Symbol("-".to_owned())));
        assert_eq!(parse("+x").ok(), Some(Value::Symbol("+x".to_owned())));
        assert_eq!(parse("-7").ok(), Some(Value::Integer(-7)));
    }
}
