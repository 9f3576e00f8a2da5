//! Lazy decoding of CSV feed bodies into records.
//!
//! [`Schema::decode`] returns a [`Records`] iterator. Rows are read one at a
//! time; the iterator ends with `None` at end of input and yields `Some(Err)`
//! for a malformed row, after which it stops.

use csv::{ReaderBuilder, StringRecord, Trim};

use hawatch_types::FieldValue;

use crate::schema::{FieldType, Schema, SchemaMode};
use crate::DecodeError;

/// One decoded row.
///
/// `values` is aligned with [`Schema::fields`] of the schema that decoded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub group: String,
    pub server: String,
    pub values: Vec<FieldValue>,
}

/// How row cells map onto schema fields.
#[derive(Debug)]
enum Binding {
    /// Cell `i` is field `i`; the row length must match the schema.
    Positional,
    /// Field `i` is read from cell `columns[i]`.
    Named(Vec<usize>),
}

/// Iterator over the records of one feed body.
#[derive(Debug)]
pub struct Records<'a> {
    schema: &'a Schema,
    reader: csv::Reader<&'a [u8]>,
    row: StringRecord,
    binding: Binding,
    done: bool,
}

impl Schema {
    /// Start decoding a feed body.
    ///
    /// In tolerant mode the header row is read here, so a header lacking a
    /// whitelisted column fails before any record is produced.
    pub fn decode<'a>(&'a self, body: &'a str) -> Result<Records<'a>, DecodeError> {
        let mut builder = ReaderBuilder::new();
        builder.has_headers(false).flexible(true).trim(Trim::All);

        match self.mode() {
            SchemaMode::Strict => {
                builder.comment(Some(b'#'));
                Ok(Records {
                    schema: self,
                    reader: builder.from_reader(body.as_bytes()),
                    row: StringRecord::new(),
                    binding: Binding::Positional,
                    done: false,
                })
            }
            SchemaMode::Tolerant => {
                let mut reader = builder.from_reader(body.as_bytes());
                let mut header = StringRecord::new();
                if !reader.read_record(&mut header)? {
                    return Ok(Records {
                        schema: self,
                        reader,
                        row: header,
                        binding: Binding::Named(Vec::new()),
                        done: true,
                    });
                }
                let columns = bind_header(self, &header)?;
                Ok(Records {
                    schema: self,
                    reader,
                    row: StringRecord::new(),
                    binding: Binding::Named(columns),
                    done: false,
                })
            }
        }
    }
}

/// Map each schema field to its column in the header.
///
/// The first header cell carries a two-character marker (`# `) that is not
/// part of the column name.
fn bind_header(schema: &Schema, header: &StringRecord) -> Result<Vec<usize>, DecodeError> {
    let names: Vec<&str> = header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if i == 0 {
                name.get(2..).unwrap_or("").trim()
            } else {
                name
            }
        })
        .collect();

    schema
        .fields()
        .iter()
        .map(|field| {
            names
                .iter()
                .position(|name| *name == field.name)
                .ok_or_else(|| DecodeError::MissingColumn(field.name.to_string()))
        })
        .collect()
}

impl Records<'_> {
    fn bind_row(&self) -> Result<RawRecord, DecodeError> {
        let fields = self.schema.fields();
        let values = match &self.binding {
            Binding::Positional => {
                if self.row.len() != fields.len() {
                    return Err(DecodeError::FieldCountMismatch {
                        expected: fields.len(),
                        found: self.row.len(),
                    });
                }
                fields
                    .iter()
                    .zip(self.row.iter())
                    .map(|(field, cell)| match field.kind {
                        FieldType::Int if cell.is_empty() => Ok(FieldValue::Int(0)),
                        FieldType::Int => cell.parse().map(FieldValue::Int).map_err(|_| {
                            DecodeError::InvalidInteger {
                                field: field.name.to_string(),
                                value: cell.to_string(),
                            }
                        }),
                        FieldType::String => Ok(FieldValue::Text(cell.to_string())),
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
            Binding::Named(columns) => fields
                .iter()
                .zip(columns)
                .map(|(field, &column)| {
                    let cell = self.row.get(column).unwrap_or("");
                    match field.kind {
                        FieldType::Int if cell.is_empty() => FieldValue::Text("0".to_string()),
                        _ => FieldValue::Text(cell.to_string()),
                    }
                })
                .collect(),
        };

        Ok(RawRecord {
            group: values[self.schema.group_index()].to_string(),
            server: values[self.schema.server_index()].to_string(),
            values,
        })
    }
}

impl Iterator for Records<'_> {
    type Item = Result<RawRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = match self.reader.read_record(&mut self.row) {
            Ok(true) => self.bind_row(),
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(e.into()),
        };

        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnSpec;

    const TOLERANT_BODY: &str = "\
# pxname,svname,qcur,scur,rate,status,tracked,lastchg,extra
www,FRONTEND,,42,5,OPEN,,,
www,web1,0,7,,UP,,65,x
www,web2,0,,1,DOWN,www/web1,120,
";

    fn strict_row(group: &str, server: &str, scur: &str, status: &str) -> String {
        let mut cells = vec![""; 63];
        cells[0] = group;
        cells[1] = server;
        cells[4] = scur;
        cells[17] = status;
        cells[23] = "10";
        cells.join(",")
    }

    #[test]
    fn test_tolerant_binds_by_name() {
        let schema = Schema::tolerant();
        let records: Vec<RawRecord> = schema
            .decode(TOLERANT_BODY)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(records.len(), 3);

        let frontend = &records[0];
        assert_eq!(frontend.group, "www");
        assert_eq!(frontend.server, "FRONTEND");
        assert_eq!(frontend.values[2], FieldValue::from("42"));
        assert_eq!(frontend.values[3], FieldValue::from("5"));

        let web2 = &records[2];
        assert_eq!(web2.values[2], FieldValue::from("0"));
        assert_eq!(web2.values[4], FieldValue::from("DOWN"));
        assert_eq!(web2.values[5], FieldValue::from("www/web1"));
        assert_eq!(web2.values[6], FieldValue::from("120"));
    }

    #[test]
    fn test_tolerant_ignores_column_order() {
        let body = "# lastchg,tracked,status,rate,scur,svname,pxname\n65,,DOWN,3,12,web1,www\n";
        let schema = Schema::tolerant();
        let record = schema.decode(body).unwrap().next().unwrap().unwrap();

        assert_eq!(record.group, "www");
        assert_eq!(record.server, "web1");
        assert_eq!(
            record.values,
            vec![
                FieldValue::from("www"),
                FieldValue::from("web1"),
                FieldValue::from("12"),
                FieldValue::from("3"),
                FieldValue::from("DOWN"),
                FieldValue::from(""),
                FieldValue::from("65"),
            ]
        );
    }

    #[test]
    fn test_tolerant_empty_text_stays_empty() {
        let body = "# pxname,svname,scur,rate,status,tracked,lastchg\nwww,web1,,,,,\n";
        let schema = Schema::tolerant();
        let record = schema.decode(body).unwrap().next().unwrap().unwrap();

        assert_eq!(record.values[2], FieldValue::from("0"));
        assert_eq!(record.values[3], FieldValue::from("0"));
        assert_eq!(record.values[5], FieldValue::from(""));
    }

    #[test]
    fn test_tolerant_missing_column() {
        let body = "# pxname,svname,scur,status,tracked,lastchg\nwww,web1,1,UP,,3\n";
        let err = Schema::tolerant().decode(body).unwrap_err();
        assert!(matches!(err, DecodeError::MissingColumn(name) if name == "rate"));
    }

    #[test]
    fn test_tolerant_empty_body() {
        let schema = Schema::tolerant();
        let mut records = schema.decode("").unwrap();
        assert!(records.next().is_none());
    }

    #[test]
    fn test_strict_decodes_typed_values() {
        let body = format!(
            "# pxname,svname,...\n{}\n{}\n",
            strict_row("www", "web1", "5", "UP"),
            strict_row("www", "web2", "", "DOWN")
        );
        let schema = Schema::strict();
        let records: Vec<RawRecord> = schema
            .decode(&body)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].server, "web1");
        assert_eq!(records[0].values[4], FieldValue::Int(5));
        assert_eq!(records[0].values[17], FieldValue::from("UP"));
        assert_eq!(records[0].values[23], FieldValue::from("10"));
        assert_eq!(records[1].values[4], FieldValue::Int(0));
    }

    #[test]
    fn test_strict_field_count_mismatch() {
        let short = strict_row("www", "web1", "5", "UP").replacen(",", "", 1);
        let body = format!("{}\n{}\n", strict_row("www", "web1", "5", "UP"), short);
        let schema = Schema::strict();
        let mut records = schema.decode(&body).unwrap();

        assert!(records.next().unwrap().is_ok());
        match records.next().unwrap() {
            Err(DecodeError::FieldCountMismatch { expected, found }) => {
                assert_eq!(expected, 63);
                assert_eq!(found, 62);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(records.next().is_none());
    }

    #[test]
    fn test_strict_too_many_fields() {
        let body = format!("{},extra\n", strict_row("www", "web1", "5", "UP"));
        let schema = Schema::strict();
        let result = schema.decode(&body).unwrap().next().unwrap();
        assert!(matches!(
            result,
            Err(DecodeError::FieldCountMismatch {
                expected: 63,
                found: 64
            })
        ));
    }

    #[test]
    fn test_strict_invalid_integer() {
        let body = strict_row("www", "web1", "many", "UP");
        let schema = Schema::strict();
        let result = schema.decode(&body).unwrap().next().unwrap();
        assert!(matches!(
            result,
            Err(DecodeError::InvalidInteger { field, value }) if field == "scur" && value == "many"
        ));
    }

    #[test]
    fn test_custom_strict_schema_decodes() {
        let columns: Vec<ColumnSpec> = serde_json::from_str(
            r#"[
                {"name": "pxname"},
                {"name": "svname"},
                {"name": "scur", "type": "int"},
                {"name": "status"}
            ]"#,
        )
        .unwrap();
        let schema = Schema::custom_strict(&columns).unwrap();
        let record = schema
            .decode("www,web1, 9 ,UP\n")
            .unwrap()
            .next()
            .unwrap()
            .unwrap();

        assert_eq!(record.values[2], FieldValue::Int(9));
        assert_eq!(record.values[3], FieldValue::from("UP"));
    }
}
