//! Property tests: normalized fields survive serialization and reparse.

use std::path::Path;

use proptest::prelude::*;

use seedplan_model::{Dataset, LineTerminator, Record, ResolvedColumns, Schema};
use seedplan_output::{WriteOptions, serialize_dataset, verify_bytes};
use seedplan_transform::{FieldNormalizer, normalize_dataset};

const WIDTH: usize = 4;

fn schema() -> Schema {
    Schema::new(vec![
        "id".to_string(),
        "専門".to_string(),
        "疾患名".to_string(),
        "備考".to_string(),
    ])
    .unwrap()
}

fn payload_rows() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(
        prop::collection::vec("[a,\"\r\n；]{0,8}", WIDTH - 1),
        1..8,
    )
}

fn normalized_dataset(payloads: Vec<Vec<String>>) -> Dataset {
    let records = payloads
        .into_iter()
        .enumerate()
        .map(|(idx, payload)| {
            let mut fields = vec![(idx + 1).to_string()];
            fields.extend(payload);
            Record::new(idx + 2, fields)
        })
        .collect();
    let mut dataset = Dataset::new(schema(), records);
    let columns = ResolvedColumns {
        delimiter_sensitive: [1].into_iter().collect(),
        ..ResolvedColumns::default()
    };
    normalize_dataset(&mut dataset, &columns, &FieldNormalizer::default());
    dataset
}

proptest! {
    #[test]
    fn normalized_fields_reparse_unchanged(
        payloads in payload_rows(),
        quote_all in any::<bool>(),
        crlf in any::<bool>(),
    ) {
        let dataset = normalized_dataset(payloads);
        let line_terminator = if crlf { LineTerminator::Crlf } else { LineTerminator::Lf };
        let options = WriteOptions {
            quote_all,
            line_terminator,
            ..WriteOptions::default()
        };
        let bytes = serialize_dataset(&dataset, &options).unwrap();

        let table = seedplan_ingest::parse_table(&bytes, Path::new("roundtrip.csv")).unwrap();
        prop_assert_eq!(table.header.as_slice(), dataset.header());
        prop_assert_eq!(table.rows.len(), dataset.len());
        for (reparsed, normalized) in table.rows.iter().zip(&dataset.records) {
            prop_assert_eq!(reparsed.fields.len(), WIDTH);
            prop_assert_eq!(&reparsed.fields, &normalized.fields);
        }
        prop_assert!(verify_bytes(&bytes, WIDTH, line_terminator).passed());
    }
}
