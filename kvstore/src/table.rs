//! The reference `Table` back-end (spec §4.G): an embedded, ordered,
//! transactional key-value store (`sled`) keyed on column 0.

use std::sync::Arc;

use common::err::decode_error::EngineError;
use common::err::CResult;
use common::value::{Column, Value};
use engine::table::{
    InsertStatement, ScalarSlot, ScanStep, SlotRef, Table, TableCursor, TableInsert, TableOp, TableScan,
    TableUpdate, UpdateStatement,
};

use crate::encoding::{decode_row, encode_row};
use crate::range::plan_range;

/// A `people(id bytes PRIMARY KEY, ...)`-shaped table backed by one `sled`
/// tree. Row values (columns 1..n) are packed by [`encode_row`]; the
/// primary key is the raw `sled` key.
pub struct KvTable {
    tree: sled::Tree,
    columns: Vec<Column>,
}

impl KvTable {
    /// Opens (creating if absent) the tree named `name` inside `db` (spec §6
    /// "the reference back-end opens one embedded store per catalog entry").
    pub fn open(db: &sled::Db, name: &str, columns: Vec<Column>) -> CResult<Arc<KvTable>> {
        let tree = db.open_tree(name)?;
        tracing::debug!(table = name, "opened kv tree");
        Ok(Arc::new(KvTable { tree, columns }))
    }

}

impl Table for KvTable {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn scan(&self, projection: &[usize], scan: &TableScan) -> CResult<Box<dyn TableCursor>> {
        let plan = plan_range(scan, &self.columns)?;
        let iter = self.tree.range((plan.start, plan.end));
        Ok(Box::new(KvCursor { iter, columns: self.columns.clone(), projection: projection.to_vec() }))
    }

    fn prepare_insert(&self, insert: TableInsert) -> CResult<Box<dyn InsertStatement>> {
        Ok(Box::new(KvInsertStatement { tree: self.tree.clone(), columns: self.columns.clone(), insert }))
    }

    fn prepare_update(&self, update: TableUpdate) -> CResult<Box<dyn UpdateStatement>> {
        Ok(Box::new(KvUpdateStatement { tree: self.tree.clone(), columns: self.columns.clone(), update }))
    }
}

struct KvCursor {
    iter: sled::Iter,
    columns: Vec<Column>,
    projection: Vec<usize>,
}

impl TableCursor for KvCursor {
    fn next(&mut self, out: &mut [Value]) -> CResult<ScanStep> {
        match self.iter.next() {
            None => Ok(ScanStep::Eof),
            Some(entry) => {
                let (key, value) = entry?;
                let mut pk = self.columns[0].kind.zero();
                pk.set_in_key(&key)?;
                let mut row = vec![pk];
                row.extend(decode_row(value.as_ref(), self.columns.len() - 1)?);
                for (i, &idx) in self.projection.iter().enumerate() {
                    out[i] = row[idx].clone();
                }
                Ok(ScanStep::Row)
            }
        }
    }
}

fn resolve_scalar(slot: &SlotRef) -> CResult<Value> {
    match &*slot.borrow() {
        ScalarSlot::Value(v) => Ok(v.clone()),
        ScalarSlot::Placeholder { name } => {
            Err(EngineError::BUG(format!("unbound placeholder `{}` reached execution", name)))
        }
    }
}

struct KvInsertStatement {
    tree: sled::Tree,
    columns: Vec<Column>,
    insert: TableInsert,
}

impl InsertStatement for KvInsertStatement {
    fn execute(&mut self) -> CResult<u64> {
        let mut affected = 0u64;
        for row_slots in &self.insert.values {
            let mut full_row: Vec<Value> = self.columns.iter().map(|c| c.kind.zero()).collect();
            if self.insert.all_cols {
                for (i, slot) in row_slots.iter().enumerate() {
                    full_row[i].set(self.columns[i].kind, resolve_scalar(slot)?)?;
                }
            } else {
                for (&col_idx, slot) in self.insert.cols.iter().zip(row_slots) {
                    full_row[col_idx].set(self.columns[col_idx].kind, resolve_scalar(slot)?)?;
                }
            }

            let key = full_row[0].get_key()?;
            let existing = self.tree.get(&key)?;
            match (existing, self.insert.op) {
                (None, _) => {
                    self.tree.insert(key, encode_row(&full_row[1..]))?;
                    affected += 1;
                }
                (Some(_), TableOp::InsertIgnore) => {}
                (Some(_), TableOp::Replace) => {
                    self.tree.insert(key, encode_row(&full_row[1..]))?;
                    affected += 1;
                }
                (Some(old), TableOp::Insert) if !self.insert.ondup_cols.is_empty() => {
                    let mut row = vec![full_row[0].clone()];
                    row.extend(decode_row(old.as_ref(), self.columns.len() - 1)?);
                    for (&col_idx, slot) in self.insert.ondup_cols.iter().zip(&self.insert.ondup_vals) {
                        row[col_idx].set(self.columns[col_idx].kind, resolve_scalar(slot)?)?;
                    }
                    self.tree.insert(key, encode_row(&row[1..]))?;
                    affected += 1;
                }
                (Some(_), _) => {
                    return Err(EngineError::DuplicateKey(format!("duplicate key {:?}", key)));
                }
            }
        }
        Ok(affected)
    }

    fn close(&mut self) -> CResult<()> {
        self.tree.flush()?;
        Ok(())
    }

    fn abort(&mut self) -> CResult<()> {
        Ok(())
    }
}

struct KvUpdateStatement {
    tree: sled::Tree,
    columns: Vec<Column>,
    update: TableUpdate,
}

impl UpdateStatement for KvUpdateStatement {
    fn execute(&mut self) -> CResult<u64> {
        let plan = plan_range(&self.update.scan, &self.columns)?;
        let keys: Vec<sled::IVec> = self.tree.range((plan.start, plan.end)).keys().collect::<Result<_, _>>()?;

        let mut affected = 0u64;
        for key in keys {
            match self.update.op {
                TableOp::Delete => {
                    if self.tree.remove(&key)?.is_some() {
                        affected += 1;
                    }
                }
                TableOp::Update => {
                    if let Some(old) = self.tree.get(&key)? {
                        let mut row = {
                            let mut pk = self.columns[0].kind.zero();
                            pk.set_in_key(&key)?;
                            let mut r = vec![pk];
                            r.extend(decode_row(old.as_ref(), self.columns.len() - 1)?);
                            r
                        };
                        for (&col_idx, slot) in self.update.upd_cols.iter().zip(&self.update.upd_vals) {
                            row[col_idx].set(self.columns[col_idx].kind, resolve_scalar(slot)?)?;
                        }
                        self.tree.insert(&key, encode_row(&row[1..]))?;
                        affected += 1;
                    }
                }
                _ => return Err(EngineError::BUG("unexpected TableOp reached update execution".to_string())),
            }
        }
        Ok(affected)
    }

    fn close(&mut self) -> CResult<()> {
        self.tree.flush()?;
        Ok(())
    }

    fn abort(&mut self) -> CResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::value::ValueKind;
    use engine::table::value_slot;

    fn open_people() -> Arc<KvTable> {
        let db = sled::Config::new().temporary(true).open().unwrap();
        KvTable::open(
            &db,
            "people",
            vec![Column::new("id", ValueKind::Bytes), Column::new("name", ValueKind::Text), Column::new("age", ValueKind::Int)],
        )
        .unwrap()
    }

    fn insert_one(table: &Arc<KvTable>, id: &str, name: &str, age: i64) {
        let insert = TableInsert {
            all_cols: true,
            cols: Vec::new(),
            values: vec![vec![
                value_slot(Value::Bytes(id.as_bytes().to_vec())),
                value_slot(Value::Text(name.to_string())),
                value_slot(Value::Int(age)),
            ]],
            op: TableOp::Insert,
            ondup_cols: Vec::new(),
            ondup_vals: Vec::new(),
        };
        let mut stmt = table.prepare_insert(insert).unwrap();
        assert_eq!(stmt.execute().unwrap(), 1);
        stmt.close().unwrap();
    }

    #[test]
    fn point_lookup_after_insert() {
        let table = open_people();
        insert_one(&table, "b", "Bob", 25);

        let scan = TableScan {
            filter: vec![engine::table::ColumnFilter {
                col_idx: 0,
                op: engine::table::FilterOp::Eq,
                value: engine::table::FilterValue::Scalar(value_slot(Value::Bytes(b"b".to_vec()))),
                escape: None,
            }],
            order: Vec::new(),
        };
        let mut cursor = table.scan(&[1, 2], &scan).unwrap();
        let mut out = vec![Value::Null; 2];
        assert!(matches!(cursor.next(&mut out).unwrap(), ScanStep::Row));
        assert_eq!(out, vec![Value::Text("Bob".to_string()), Value::Int(25)]);
        assert!(matches!(cursor.next(&mut out).unwrap(), ScanStep::Eof));
    }

    #[test]
    fn duplicate_insert_without_ignore_or_replace_fails() {
        let table = open_people();
        insert_one(&table, "b", "Bob", 25);
        let insert = TableInsert {
            all_cols: true,
            cols: Vec::new(),
            values: vec![vec![
                value_slot(Value::Bytes(b"b".to_vec())),
                value_slot(Value::Text("Bobby".to_string())),
                value_slot(Value::Int(26)),
            ]],
            op: TableOp::Insert,
            ondup_cols: Vec::new(),
            ondup_vals: Vec::new(),
        };
        let mut stmt = table.prepare_insert(insert).unwrap();
        assert!(matches!(stmt.execute(), Err(EngineError::DuplicateKey(_))));
    }

    #[test]
    fn replace_overwrites_existing_row() {
        let table = open_people();
        insert_one(&table, "b", "Bob", 25);
        let insert = TableInsert {
            all_cols: true,
            cols: Vec::new(),
            values: vec![vec![
                value_slot(Value::Bytes(b"b".to_vec())),
                value_slot(Value::Text("Bobby".to_string())),
                value_slot(Value::Int(26)),
            ]],
            op: TableOp::Replace,
            ondup_cols: Vec::new(),
            ondup_vals: Vec::new(),
        };
        let mut stmt = table.prepare_insert(insert).unwrap();
        assert_eq!(stmt.execute().unwrap(), 1);

        let scan = TableScan { filter: Vec::new(), order: Vec::new() };
        let mut cursor = table.scan(&[1, 2], &scan).unwrap();
        let mut out = vec![Value::Null; 2];
        cursor.next(&mut out).unwrap();
        assert_eq!(out, vec![Value::Text("Bobby".to_string()), Value::Int(26)]);
    }

    #[test]
    fn update_on_primary_key_is_rejected_upstream_not_here() {
        // The compiler (spec §4.D) rejects SET on the primary key before a
        // plan ever reaches this back-end, so `TableUpdate.upd_cols` never
        // contains index 0 in practice; this back-end trusts that invariant.
        let table = open_people();
        insert_one(&table, "b", "Bob", 25);
        let update = TableUpdate {
            op: TableOp::Update,
            scan: TableScan {
                filter: vec![engine::table::ColumnFilter {
                    col_idx: 0,
                    op: engine::table::FilterOp::Eq,
                    value: engine::table::FilterValue::Scalar(value_slot(Value::Bytes(b"b".to_vec()))),
                    escape: None,
                }],
                order: Vec::new(),
            },
            upd_cols: vec![2],
            upd_vals: vec![value_slot(Value::Int(26))],
        };
        let mut stmt = table.prepare_update(update).unwrap();
        assert_eq!(stmt.execute().unwrap(), 1);
    }

    #[test]
    fn delete_range_removes_matching_rows() {
        let table = open_people();
        insert_one(&table, "a", "Alice", 30);
        insert_one(&table, "b", "Bob", 25);
        insert_one(&table, "c", "Carol", 40);

        let update = TableUpdate {
            op: TableOp::Delete,
            scan: TableScan {
                filter: vec![engine::table::ColumnFilter {
                    col_idx: 0,
                    op: engine::table::FilterOp::Le,
                    value: engine::table::FilterValue::Scalar(value_slot(Value::Bytes(b"b".to_vec()))),
                    escape: None,
                }],
                order: Vec::new(),
            },
            upd_cols: Vec::new(),
            upd_vals: Vec::new(),
        };
        let mut stmt = table.prepare_update(update).unwrap();
        assert_eq!(stmt.execute().unwrap(), 2);

        let scan = TableScan { filter: Vec::new(), order: Vec::new() };
        let mut cursor = table.scan(&[0], &scan).unwrap();
        let mut out = vec![Value::Null; 1];
        assert!(matches!(cursor.next(&mut out).unwrap(), ScanStep::Row));
        assert_eq!(out, vec![Value::Bytes(b"c".to_vec())]);
        assert!(matches!(cursor.next(&mut out).unwrap(), ScanStep::Eof));
    }
}
