//! Property tests for the text grammar and merging.

use layerconf::config::{changed_keys, merge_all};
use layerconf::parse::{parse_str, render};
use layerconf::Table;
use proptest::prelude::*;

fn table_strategy() -> impl Strategy<Value = Table> {
    prop::collection::hash_map(
        "[A-Za-z_][A-Za-z0-9_.-]{0,12}",
        "[ -~\t\né]{0,24}",
        0..12,
    )
}

proptest! {
    #[test]
    fn rendered_text_parses_back(table in table_strategy()) {
        let text = render(&table);
        let parsed = parse_str("<render>", &text).unwrap();
        prop_assert_eq!(parsed, table);
    }

    #[test]
    fn later_tables_win(tables in prop::collection::vec(table_strategy(), 1..5)) {
        let merged = merge_all(tables.clone());
        for (key, value) in &merged {
            let last = tables.iter().rev().find_map(|t| t.get(key)).unwrap();
            prop_assert_eq!(value, last);
        }
        for table in &tables {
            for key in table.keys() {
                prop_assert!(merged.contains_key(key));
            }
        }
    }

    #[test]
    fn merging_a_table_into_itself_changes_nothing(table in table_strategy()) {
        let merged = merge_all([table.clone(), table.clone()]);
        prop_assert!(changed_keys(&table, &merged).is_empty());
    }

    #[test]
    fn parser_never_panics(text in "[ -~\n\"\\\\=#]{0,64}") {
        let _ = parse_str("<fuzz>", &text);
    }
}
