//! Projection analysis used to trace result columns back to their tables.

use sqlparser::ast::{Expr, Select, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use crate::parser::names::{normalize_identifier, normalize_relation_name};

/// A table named in the FROM / JOIN list of the top-level SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReference {
    /// Normalized (unquoted, lowercased, schema-stripped) table name.
    pub name: String,
    /// Normalized alias, if one was given.
    pub alias: Option<String>,
}

/// What a single projection item refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionItem {
    /// A plain column reference, optionally qualified by a table or alias.
    Column {
        /// Normalized qualifier (`u` in `u.id`).
        qualifier: Option<String>,
        /// Normalized column name.
        column: String,
    },
    /// `*` or `t.*`; expands to an unknown number of result columns.
    Wildcard,
    /// Any computed expression.
    Expression,
}

/// Shape of the top-level SELECT of a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectShape {
    /// Tables in textual FROM / JOIN order.
    pub tables: Vec<TableReference>,
    /// Projection items in declaration order.
    pub projection: Vec<ProjectionItem>,
}

impl SelectShape {
    /// True when any projection item is a wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.projection
            .iter()
            .any(|item| matches!(item, ProjectionItem::Wildcard))
    }

    /// Resolve a qualifier through aliases first, then bare table names.
    pub fn resolve_qualifier(&self, qualifier: &str) -> Option<&TableReference> {
        self.tables
            .iter()
            .find(|table| table.alias.as_deref() == Some(qualifier))
            .or_else(|| self.tables.iter().find(|table| table.name == qualifier))
    }

    /// Distinct table names in FROM / JOIN order.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for table in &self.tables {
            if !names.contains(&table.name.as_str()) {
                names.push(&table.name);
            }
        }
        names
    }
}

/// Parse `sql` with the SQLite dialect and describe its top-level SELECT.
///
/// Returns `None` for anything that is not a single query statement the
/// parser understands; callers fall back to name matching in that case.
pub fn analyze_select(sql: &str) -> Option<SelectShape> {
    let statements = Parser::parse_sql(&SQLiteDialect {}, sql).ok()?;
    let Some(Statement::Query(query)) = statements.first() else {
        return None;
    };
    let select = first_select(&query.body)?;

    let mut shape = SelectShape::default();
    collect_tables(&select.from, &mut shape.tables);
    shape.projection = select.projection.iter().map(projection_item).collect();
    Some(shape)
}

fn first_select(body: &SetExpr) -> Option<&Select> {
    match body {
        SetExpr::Select(select) => Some(&**select),
        SetExpr::Query(inner) => first_select(&inner.body),
        SetExpr::SetOperation { left, .. } => first_select(left),
        _ => None,
    }
}

fn collect_tables(from: &[TableWithJoins], out: &mut Vec<TableReference>) {
    for table in from {
        collect_factor(&table.relation, out);
        for join in &table.joins {
            collect_factor(&join.relation, out);
        }
    }
}

fn collect_factor(factor: &TableFactor, out: &mut Vec<TableReference>) {
    match factor {
        TableFactor::Table { name, alias, .. } => out.push(TableReference {
            name: normalize_relation_name(&name.to_string()),
            alias: alias.as_ref().map(|a| normalize_identifier(&a.name.value)),
        }),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => collect_tables(std::slice::from_ref(&**table_with_joins), out),
        _ => {}
    }
}

fn projection_item(item: &SelectItem) -> ProjectionItem {
    match item {
        SelectItem::Wildcard(..) | SelectItem::QualifiedWildcard(..) => ProjectionItem::Wildcard,
        SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
            column_reference(expr)
        }
    }
}

fn column_reference(expr: &Expr) -> ProjectionItem {
    match expr {
        Expr::Identifier(ident) => ProjectionItem::Column {
            qualifier: None,
            column: normalize_identifier(&ident.value),
        },
        Expr::CompoundIdentifier(idents) => match idents.as_slice() {
            [column] => ProjectionItem::Column {
                qualifier: None,
                column: normalize_identifier(&column.value),
            },
            [.., table, column] => ProjectionItem::Column {
                qualifier: Some(normalize_identifier(&table.value)),
                column: normalize_identifier(&column.value),
            },
            [] => ProjectionItem::Expression,
        },
        Expr::Nested(inner) => column_reference(inner),
        _ => ProjectionItem::Expression,
    }
}
