//! SQLite-backed [`ModelPersistence`].
//!
//! Every write replaces the stored graph inside one transaction, so a
//! reader of the database never sees half of a graph.

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::graph::{Graph, GraphDocument, Literal, Term, Triple};
use crate::persistence::ModelPersistence;

pub struct SqliteModelPersistence {
    pool: SqlitePool,
}

impl SqliteModelPersistence {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn resource_columns(term: &Term) -> Result<(&'static str, &str)> {
    match term {
        Term::Iri(v) => Ok(("iri", v)),
        Term::Blank(v) => Ok(("blank", v)),
        Term::Literal(_) => bail!("literal in subject position"),
    }
}

fn term_from_columns(
    kind: &str,
    value: String,
    lang: Option<String>,
    datatype: Option<String>,
) -> Result<Term> {
    match kind {
        "iri" => Ok(Term::Iri(value)),
        "blank" => Ok(Term::Blank(value)),
        "literal" => Ok(Term::Literal(Literal {
            lexical: value,
            lang,
            datatype,
        })),
        other => bail!("unknown term kind in catalog_statements: '{}'", other),
    }
}

#[async_trait]
impl ModelPersistence for SqliteModelPersistence {
    async fn read(&self) -> Result<Option<Graph>> {
        let written: Option<i64> =
            sqlx::query_scalar("SELECT statements FROM catalog_writes WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        if written.is_none() {
            return Ok(None);
        }

        let mut doc = GraphDocument::default();

        let rows = sqlx::query("SELECT prefix, iri FROM catalog_namespaces")
            .fetch_all(&self.pool)
            .await?;
        for row in rows {
            doc.namespaces.insert(row.get("prefix"), row.get("iri"));
        }

        let rows = sqlx::query(
            "SELECT subject_kind, subject, predicate, object_kind, object, lang, datatype \
             FROM catalog_statements ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        for row in rows {
            let subject_kind: String = row.get("subject_kind");
            let object_kind: String = row.get("object_kind");
            let subject = term_from_columns(&subject_kind, row.get("subject"), None, None)?;
            let object = term_from_columns(
                &object_kind,
                row.get("object"),
                row.get("lang"),
                row.get("datatype"),
            )?;
            doc.statements
                .push(Triple::new(subject, row.get::<String, _>("predicate"), object));
        }

        Ok(Some(Graph::from(doc)))
    }

    async fn write(&self, graph: &Graph) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM catalog_namespaces")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM catalog_statements")
            .execute(&mut *tx)
            .await?;

        for (prefix, iri) in graph.namespaces() {
            sqlx::query("INSERT INTO catalog_namespaces (prefix, iri) VALUES (?, ?)")
                .bind(prefix)
                .bind(iri)
                .execute(&mut *tx)
                .await?;
        }

        for triple in graph.statements() {
            let (subject_kind, subject) = resource_columns(&triple.subject)?;
            let (object_kind, object, lang, datatype) = match &triple.object {
                Term::Iri(v) => ("iri", v.as_str(), None, None),
                Term::Blank(v) => ("blank", v.as_str(), None, None),
                Term::Literal(l) => (
                    "literal",
                    l.lexical.as_str(),
                    l.lang.as_deref(),
                    l.datatype.as_deref(),
                ),
            };
            sqlx::query(
                "INSERT INTO catalog_statements \
                 (subject_kind, subject, predicate, object_kind, object, lang, datatype) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(subject_kind)
            .bind(subject)
            .bind(&triple.predicate)
            .bind(object_kind)
            .bind(object)
            .bind(lang)
            .bind(datatype)
            .execute(&mut *tx)
            .await?;
        }

        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO catalog_writes (id, statements, written_at) VALUES (1, ?, ?)
            ON CONFLICT(id) DO UPDATE SET statements = excluded.statements, written_at = excluded.written_at
            "#,
        )
        .bind(graph.len() as i64)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
