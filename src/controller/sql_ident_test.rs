//! Tests for SQL identifier quoting

#[cfg(test)]
mod tests {
    use super::super::sql_ident::{sanitize_table_ident, TableIdent, DEFAULT_TABLE};

    #[test]
    fn empty_input_yields_the_default_table() {
        assert_eq!(sanitize_table_ident(""), "\"public\".\"server\"");
        assert_eq!(
            sanitize_table_ident(""),
            sanitize_table_ident(DEFAULT_TABLE)
        );
    }

    #[test]
    fn identical_input_produces_identical_output() {
        let first = sanitize_table_ident("public.endpoints");
        let second = sanitize_table_ident("public.endpoints");
        assert_eq!(first, second);
    }

    #[test]
    fn single_segment_is_quoted() {
        assert_eq!(sanitize_table_ident("server"), "\"server\"");
    }

    #[test]
    fn dotted_input_quotes_each_segment_independently() {
        assert_eq!(
            sanitize_table_ident("db.schema.table"),
            "\"db\".\"schema\".\"table\""
        );
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(
            sanitize_table_ident("bad\"name"),
            "\"bad\"\"name\""
        );
    }

    #[test]
    fn reserved_words_spaces_and_punctuation_are_accepted() {
        assert_eq!(sanitize_table_ident("select"), "\"select\"");
        assert_eq!(sanitize_table_ident("my table"), "\"my table\"");
        assert_eq!(
            sanitize_table_ident("drop table;--"),
            "\"drop table;--\""
        );
    }

    #[test]
    fn table_ident_resolves_and_displays_the_quoted_form() {
        let ident = TableIdent::resolve("public.server");
        assert_eq!(ident.as_sql(), "\"public\".\"server\"");
        assert_eq!(ident.to_string(), "\"public\".\"server\"");

        let defaulted = TableIdent::resolve("");
        assert_eq!(defaulted, TableIdent::resolve(DEFAULT_TABLE));
    }
}
