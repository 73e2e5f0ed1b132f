//! Content fingerprint of a schema snapshot.

use sha2::{Digest, Sha256};

use crate::metadata::TableSnapshot;

/// SHA-256 over every table, column and foreign key in order.
///
/// Each field is length-prefixed, so adjacent values cannot alias.
/// Returns a 64-character lowercase hexadecimal string.
pub fn schema_fingerprint(tables: &[TableSnapshot]) -> String {
    let mut hasher = Sha256::new();
    let mut field = |value: &str| {
        hasher.update((value.len() as u64).to_le_bytes());
        hasher.update(value.as_bytes());
    };

    for table in tables {
        field("table");
        field(&table.name);
        for column in &table.columns {
            field("column");
            field(&column.name);
            field(&column.data_type);
            field(if column.is_primary_key { "pk" } else { "" });
            field(if column.nullable { "null" } else { "not null" });
        }
        for fk in &table.foreign_keys {
            field("fk");
            field(&fk.column_name);
            field(&fk.referenced_table);
            field(&fk.referenced_column);
            field(&fk.constraint_name);
        }
    }

    format!("{:x}", hasher.finalize())
}
