use crate::db::classify_sqlx_error;
use crate::error::{AskError, Result};
use serde::Serialize;
use sqlx::PgConnection;

const TABLES_QUERY: &str = "SELECT table_name::text \
     FROM information_schema.tables \
     WHERE table_schema = 'public' \
     ORDER BY table_name";

const COLUMNS_QUERY: &str = "SELECT column_name::text, data_type::text, is_nullable::text \
     FROM information_schema.columns \
     WHERE table_schema = 'public' AND table_name::text = $1 \
     ORDER BY ordinal_position";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    pub name: String,
    /// in catalog ordinal order
    pub columns: Vec<ColumnDescriptor>,
}

/// every table of the default schema, sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaSnapshot {
    tables: Vec<TableDescriptor>,
}

impl SchemaSnapshot {
    pub fn new(mut tables: Vec<TableDescriptor>) -> Self {
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Self { tables }
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn render(&self) -> String {
        self.tables
            .iter()
            .map(|table| {
                let mut lines = Vec::with_capacity(table.columns.len() + 1);
                lines.push(format!("Table: {}", table.name));
                for col in &table.columns {
                    lines.push(format!(
                        "  - {}: {} {}",
                        col.name,
                        col.data_type,
                        if col.nullable { "NULL" } else { "NOT NULL" }
                    ));
                }
                lines.join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// read the live catalog; every failure here is treated as infrastructure
#[tracing::instrument(skip(conn))]
pub async fn fetch_snapshot(conn: &mut PgConnection) -> Result<SchemaSnapshot> {
    let table_names: Vec<(String,)> = sqlx::query_as(TABLES_QUERY)
        .fetch_all(&mut *conn)
        .await
        .map_err(catalog_error)?;

    let mut tables = Vec::with_capacity(table_names.len());
    for (name,) in table_names {
        let rows: Vec<(String, String, String)> = sqlx::query_as(COLUMNS_QUERY)
            .bind(name.as_str())
            .fetch_all(&mut *conn)
            .await
            .map_err(catalog_error)?;

        let columns = rows
            .into_iter()
            .map(|(name, data_type, is_nullable)| ColumnDescriptor {
                name,
                data_type,
                nullable: is_nullable.eq_ignore_ascii_case("YES"),
            })
            .collect();

        tables.push(TableDescriptor { name, columns });
    }

    tracing::info!(table_count = tables.len(), "schema snapshot fetched");
    Ok(SchemaSnapshot::new(tables))
}

fn catalog_error(e: sqlx::Error) -> AskError {
    match classify_sqlx_error(e) {
        AskError::Execution(msg) => AskError::Connection(format!("catalog query failed: {}", msg)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, data_type: &str, nullable: bool) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable,
        }
    }

    #[test]
    fn test_render_orders_tables_by_name() {
        let snapshot = SchemaSnapshot::new(vec![
            TableDescriptor {
                name: "vendors".to_string(),
                columns: vec![col("id", "uuid", false)],
            },
            TableDescriptor {
                name: "invoices".to_string(),
                columns: vec![
                    col("id", "uuid", false),
                    col("documentId", "uuid", false),
                    col("invoiceTotal", "numeric", true),
                ],
            },
        ]);

        let text = snapshot.render();
        assert_eq!(
            text,
            "Table: invoices\n  \
             - id: uuid NOT NULL\n  \
             - documentId: uuid NOT NULL\n  \
             - invoiceTotal: numeric NULL\n\n\
             Table: vendors\n  \
             - id: uuid NOT NULL"
        );
    }

    #[test]
    fn test_columns_keep_ordinal_order() {
        let snapshot = SchemaSnapshot::new(vec![TableDescriptor {
            name: "payments".to_string(),
            columns: vec![
                col("zeta", "text", true),
                col("alpha", "integer", false),
            ],
        }]);
        let text = snapshot.render();
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
    }

    #[test]
    fn test_empty_snapshot_renders_empty() {
        let snapshot = SchemaSnapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.render(), "");
    }
}
