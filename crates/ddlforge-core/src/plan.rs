//! Model comparison and alteration planning.
//!
//! [`diff_models`] compares two schema models and produces the ordered
//! change list that turns the first (typically the live database) into
//! the second (the desired model). Ordering is dependency-safe:
//! constraint drops come before the objects they depend on disappear,
//! and every foreign key addition is deferred to a final pass so
//! cross-table cycles never reference a missing table. Within one
//! table the planner keeps the model's own column order; it only
//! orders between change categories and between tables.

use crate::change::{
    AddColumnChange, AddForeignKeyChange, AddIndexChange, AddPrimaryKeyChange, AddTableChange,
    Change, DropColumnChange, DropForeignKeyChange, DropIndexChange, DropPrimaryKeyChange,
    DropTableChange, ModifyColumnChange,
};
use crate::error::Result;
use crate::model::{Column, Database, Table};

/// Compares two models and returns the ordered change list.
///
/// Both models are validated first, so a malformed model fails here
/// rather than halfway through rendering. `diff_models(m, m)` returns
/// an empty list for any valid `m`.
pub fn diff_models(source: &Database, target: &Database) -> Result<Vec<Change>> {
    source.validate()?;
    target.validate()?;

    let mut buckets = Buckets::default();

    for table in &target.tables {
        match source.get_table(&table.name) {
            Some(existing) => diff_table(existing, table, &mut buckets),
            None => {
                // The created table carries no foreign keys; they all
                // go through the deferred pass.
                let mut stripped = table.clone();
                stripped.foreign_keys.clear();
                buckets.add_tables.push(
                    AddTableChange { table: stripped }.into(),
                );
                for fk in &table.foreign_keys {
                    buckets.add_foreign_keys.push(
                        AddForeignKeyChange {
                            table: table.name.clone(),
                            foreign_key: fk.clone(),
                        }
                        .into(),
                    );
                }
            }
        }
    }

    for table in &source.tables {
        if target.get_table(&table.name).is_none() {
            for fk in &table.foreign_keys {
                buckets.drop_foreign_keys.push(
                    DropForeignKeyChange {
                        table: table.name.clone(),
                        foreign_key: fk.clone(),
                    }
                    .into(),
                );
            }
            buckets
                .drop_tables
                .push(DropTableChange { table: table.clone() }.into());
        }
    }

    Ok(buckets.into_ordered())
}

/// Change buckets, assembled per category and concatenated in
/// dependency-safe order.
#[derive(Default)]
struct Buckets {
    drop_foreign_keys: Vec<Change>,
    drop_indexes: Vec<Change>,
    drop_primary_keys: Vec<Change>,
    add_tables: Vec<Change>,
    column_changes: Vec<Change>,
    add_primary_keys: Vec<Change>,
    add_indexes: Vec<Change>,
    drop_columns: Vec<Change>,
    drop_tables: Vec<Change>,
    add_foreign_keys: Vec<Change>,
}

impl Buckets {
    fn into_ordered(self) -> Vec<Change> {
        let mut changes = Vec::new();
        changes.extend(self.drop_foreign_keys);
        changes.extend(self.drop_indexes);
        changes.extend(self.drop_primary_keys);
        changes.extend(self.add_tables);
        changes.extend(self.column_changes);
        changes.extend(self.add_primary_keys);
        changes.extend(self.add_indexes);
        changes.extend(self.drop_columns);
        changes.extend(self.drop_tables);
        changes.extend(self.add_foreign_keys);
        changes
    }
}

fn diff_table(source: &Table, target: &Table, buckets: &mut Buckets) {
    let table_name = &target.name;

    // ---- columns, in the target model's declaration order ----------
    for column in &target.columns {
        match source.get_column(&column.name) {
            Some(existing) => {
                if columns_differ(existing, column) {
                    buckets.column_changes.push(
                        ModifyColumnChange {
                            table: table_name.clone(),
                            before: existing.clone(),
                            after: column.clone(),
                        }
                        .into(),
                    );
                }
            }
            None => buckets.column_changes.push(
                AddColumnChange {
                    table: table_name.clone(),
                    column: column.clone(),
                }
                .into(),
            ),
        }
    }
    for column in &source.columns {
        if target.get_column(&column.name).is_none() {
            buckets.drop_columns.push(
                DropColumnChange {
                    table: table_name.clone(),
                    column: column.clone(),
                }
                .into(),
            );
        }
    }

    // ---- primary key: any difference is drop-then-add --------------
    if !same_name_list(&source.primary_key, &target.primary_key) {
        if !source.primary_key.is_empty() {
            buckets.drop_primary_keys.push(
                DropPrimaryKeyChange {
                    table: table_name.clone(),
                    columns: source.primary_key.clone(),
                }
                .into(),
            );
        }
        if !target.primary_key.is_empty() {
            buckets.add_primary_keys.push(
                AddPrimaryKeyChange {
                    table: table_name.clone(),
                    columns: target.primary_key.clone(),
                }
                .into(),
            );
        }
    }

    // ---- foreign keys: structural comparison, drop-then-add --------
    for fk in &source.foreign_keys {
        if !target.foreign_keys.iter().any(|t| t.same_reference(fk)) {
            buckets.drop_foreign_keys.push(
                DropForeignKeyChange {
                    table: table_name.clone(),
                    foreign_key: fk.clone(),
                }
                .into(),
            );
        }
    }
    for fk in &target.foreign_keys {
        if !source.foreign_keys.iter().any(|s| s.same_reference(fk)) {
            buckets.add_foreign_keys.push(
                AddForeignKeyChange {
                    table: table_name.clone(),
                    foreign_key: fk.clone(),
                }
                .into(),
            );
        }
    }

    // ---- indexes: structural comparison, drop-then-add -------------
    for index in &source.indexes {
        if !target.indexes.iter().any(|t| t.covers_same(index)) {
            buckets.drop_indexes.push(
                DropIndexChange {
                    table: table_name.clone(),
                    index: index.clone(),
                }
                .into(),
            );
        }
    }
    for index in &target.indexes {
        if !source.indexes.iter().any(|s| s.covers_same(index)) {
            buckets.add_indexes.push(
                AddIndexChange {
                    table: table_name.clone(),
                    index: index.clone(),
                }
                .into(),
            );
        }
    }
}

fn columns_differ(a: &Column, b: &Column) -> bool {
    a.type_code != b.type_code
        || a.size != b.size
        || a.precision != b.precision
        || a.scale != b.scale
        || a.required != b.required
        || a.default != b.default
        || a.auto_increment != b.auto_increment
}

fn same_name_list(a: &[String], b: &[String]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| x.eq_ignore_ascii_case(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForeignKey, Index};
    use crate::types::TypeCode;

    fn customers() -> Table {
        Table::new("customers")
            .column(Column::new("id", TypeCode::Integer).not_null())
            .column(Column::new("name", TypeCode::Varchar).size(40))
            .primary_key(vec!["id".into()])
    }

    fn orders() -> Table {
        Table::new("orders")
            .column(Column::new("id", TypeCode::Integer).not_null())
            .column(Column::new("customer_id", TypeCode::Integer))
            .primary_key(vec!["id".into()])
            .foreign_key(ForeignKey::new(
                vec!["customer_id".into()],
                "customers",
                vec!["id".into()],
            ))
    }

    fn shop() -> Database {
        Database::new("shop").table(customers()).table(orders())
    }

    #[test]
    fn diff_of_identical_models_is_empty() {
        assert!(diff_models(&shop(), &shop()).unwrap().is_empty());
    }

    #[test]
    fn size_change_yields_exactly_one_modify_column() {
        let source = shop();
        let mut target = shop();
        target
            .get_table_mut("customers")
            .unwrap()
            .get_column_mut("name")
            .unwrap()
            .size = Some(80);

        let changes = diff_models(&source, &target).unwrap();
        assert_eq!(changes.len(), 1);
        assert!(matches!(
            &changes[0],
            Change::ModifyColumn(c)
                if c.table == "customers"
                    && c.before.size == Some(40)
                    && c.after.size == Some(80)
        ));
    }

    #[test]
    fn added_and_dropped_tables_are_detected() {
        let source = Database::new("shop").table(customers());
        let target = Database::new("shop").table(orders()).table(customers());

        let changes = diff_models(&source, &target).unwrap();
        assert!(changes.iter().any(|c| matches!(
            c,
            Change::AddTable(t) if t.table.name == "orders"
        )));

        let reverse = diff_models(&target, &source).unwrap();
        assert!(reverse.iter().any(|c| matches!(
            c,
            Change::DropTable(t) if t.table.name == "orders"
        )));
        // The dropped table's foreign key is dropped ahead of it.
        let fk_pos = reverse
            .iter()
            .position(|c| matches!(c, Change::DropForeignKey(_)))
            .unwrap();
        let table_pos = reverse
            .iter()
            .position(|c| matches!(c, Change::DropTable(_)))
            .unwrap();
        assert!(fk_pos < table_pos);
    }

    #[test]
    fn new_tables_never_carry_foreign_keys_directly() {
        let source = Database::new("shop");
        let changes = diff_models(&source, &shop()).unwrap();

        for change in &changes {
            if let Change::AddTable(c) = change {
                assert!(c.table.foreign_keys.is_empty());
            }
        }
        // The key arrives in the deferred pass, after every AddTable.
        let last_add_table = changes
            .iter()
            .rposition(|c| matches!(c, Change::AddTable(_)))
            .unwrap();
        let fk = changes
            .iter()
            .position(|c| matches!(c, Change::AddForeignKey(_)))
            .unwrap();
        assert!(fk > last_add_table);
    }

    #[test]
    fn foreign_key_cycles_are_ordered_safely() {
        let a = Table::new("a")
            .column(Column::new("id", TypeCode::Integer).not_null())
            .column(Column::new("b_id", TypeCode::Integer))
            .primary_key(vec!["id".into()])
            .foreign_key(ForeignKey::new(vec!["b_id".into()], "b", vec!["id".into()]));
        let b = Table::new("b")
            .column(Column::new("id", TypeCode::Integer).not_null())
            .column(Column::new("a_id", TypeCode::Integer))
            .primary_key(vec!["id".into()])
            .foreign_key(ForeignKey::new(vec!["a_id".into()], "a", vec!["id".into()]));
        let target = Database::new("cycle").table(a).table(b);

        let changes = diff_models(&Database::new("cycle"), &target).unwrap();
        let last_add_table = changes
            .iter()
            .rposition(|c| matches!(c, Change::AddTable(_)))
            .unwrap();
        for (idx, change) in changes.iter().enumerate() {
            if matches!(change, Change::AddForeignKey(_)) {
                assert!(idx > last_add_table);
            }
        }
    }

    #[test]
    fn key_and_index_changes_are_drop_then_add() {
        let mut source = shop();
        source
            .get_table_mut("orders")
            .unwrap()
            .indexes
            .push(Index::new("idx_orders_cust", vec!["customer_id".into()]));

        let mut target = shop();
        target.get_table_mut("orders").unwrap().indexes.push(
            Index::new("idx_orders_cust", vec!["customer_id".into()]).unique(),
        );

        let changes = diff_models(&source, &target).unwrap();
        assert_eq!(changes.len(), 2);
        assert!(matches!(changes[0], Change::DropIndex(_)));
        assert!(matches!(changes[1], Change::AddIndex(_)));
    }

    #[test]
    fn primary_key_change_is_drop_then_add() {
        let source = shop();
        let mut target = shop();
        {
            let customers = target.get_table_mut("customers").unwrap();
            customers.get_column_mut("name").unwrap().required = true;
            customers.primary_key = vec!["id".into(), "name".into()];
        }

        let changes = diff_models(&source, &target).unwrap();
        let drop_pos = changes
            .iter()
            .position(|c| matches!(c, Change::DropPrimaryKey(_)))
            .unwrap();
        let add_pos = changes
            .iter()
            .position(|c| matches!(c, Change::AddPrimaryKey(_)))
            .unwrap();
        assert!(drop_pos < add_pos);
    }

    #[test]
    fn applying_the_diff_reaches_the_target() {
        let source = Database::new("shop").table(customers());
        let target = {
            let mut db = shop();
            let customers = db.get_table_mut("customers").unwrap();
            customers.get_column_mut("name").unwrap().size = Some(80);
            customers
                .columns
                .push(Column::new("email", TypeCode::Varchar).size(255));
            db
        };

        let changes = diff_models(&source, &target).unwrap();
        let mut evolved = source.clone();
        for change in &changes {
            change.apply_to(&mut evolved).unwrap();
        }
        assert!(evolved.structurally_eq(&target));
        // And the evolved model has nothing left to change.
        assert!(diff_models(&evolved, &target).unwrap().is_empty());
    }

    #[test]
    fn validation_failures_surface_before_any_changes() {
        let bad = Database::new("bad").table(
            Table::new("t")
                .column(Column::new("id", TypeCode::Integer))
                .primary_key(vec!["id".into()]),
        );
        assert!(diff_models(&bad, &shop()).is_err());
        assert!(diff_models(&shop(), &bad).is_err());
    }
}
