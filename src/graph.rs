//! In-memory triple graph backing the catalog.
//!
//! Statements live in a slab keyed by [`StatementId`] with two secondary
//! indexes, subject → statements and object → statements. The subject index
//! drives [`Graph::reachable_closure`]; the object index answers reverse
//! lookups such as "which resource has type `dcat:Catalog`".
//!
//! Namespace prefixes are kept beside the statements and are never touched
//! by [`Graph::retain_reachable`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::vocab::rdf;

pub type StatementId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri(value.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal(Literal {
            lexical: value.into(),
            lang: None,
            datatype: None,
        })
    }

    /// Language-tagged literal; an empty tag yields a plain literal.
    pub fn lang_literal(value: impl Into<String>, lang: Option<&str>) -> Self {
        Term::Literal(Literal {
            lexical: value.into(),
            lang: lang.filter(|l| !l.is_empty()).map(str::to_string),
            datatype: None,
        })
    }

    pub fn typed_literal(value: impl Into<String>, datatype: &str) -> Self {
        Term::Literal(Literal {
            lexical: value.into(),
            lang: None,
            datatype: Some(datatype.to_string()),
        })
    }

    /// IRIs and blank nodes can be subjects and are followed by the closure.
    pub fn is_resource(&self) -> bool {
        !matches!(self, Term::Literal(_))
    }

    pub fn lexical(&self) -> &str {
        match self {
            Term::Iri(v) | Term::Blank(v) => v,
            Term::Literal(l) => &l.lexical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

/// Serialized form of a [`Graph`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub namespaces: BTreeMap<String, String>,
    #[serde(default)]
    pub statements: Vec<Triple>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "GraphDocument", into = "GraphDocument")]
pub struct Graph {
    statements: BTreeMap<StatementId, Triple>,
    lookup: HashMap<Triple, StatementId>,
    by_subject: HashMap<Term, BTreeSet<StatementId>>,
    by_object: HashMap<Term, BTreeSet<StatementId>>,
    namespaces: BTreeMap<String, String>,
    next_id: StatementId,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_namespace(&mut self, prefix: &str, iri: &str) {
        self.namespaces.insert(prefix.to_string(), iri.to_string());
    }

    pub fn namespaces(&self) -> &BTreeMap<String, String> {
        &self.namespaces
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> impl Iterator<Item = &Triple> {
        self.statements.values()
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.lookup.contains_key(triple)
    }

    /// Add a statement. Returns `false` if it was already present.
    pub fn add(&mut self, subject: &Term, predicate: &str, object: Term) -> bool {
        self.insert(Triple::new(subject.clone(), predicate, object))
    }

    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.lookup.contains_key(&triple) {
            return false;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .insert(id);
        self.by_object
            .entry(triple.object.clone())
            .or_default()
            .insert(id);
        self.lookup.insert(triple.clone(), id);
        self.statements.insert(id, triple);
        true
    }

    pub fn remove(&mut self, triple: &Triple) -> bool {
        match self.lookup.get(triple).copied() {
            Some(id) => {
                self.remove_id(id);
                true
            }
            None => false,
        }
    }

    fn remove_id(&mut self, id: StatementId) {
        let Some(triple) = self.statements.remove(&id) else {
            return;
        };
        self.lookup.remove(&triple);
        if let Some(ids) = self.by_subject.get_mut(&triple.subject) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_subject.remove(&triple.subject);
            }
        }
        if let Some(ids) = self.by_object.get_mut(&triple.object) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_object.remove(&triple.object);
            }
        }
    }

    /// Remove every statement matching the given pattern (`None` = any).
    pub fn remove_matching(
        &mut self,
        subject: Option<&Term>,
        predicate: Option<&str>,
        object: Option<&Term>,
    ) -> usize {
        let ids = self.matching_ids(subject, predicate, object);
        let count = ids.len();
        for id in ids {
            self.remove_id(id);
        }
        count
    }

    fn matching_ids(
        &self,
        subject: Option<&Term>,
        predicate: Option<&str>,
        object: Option<&Term>,
    ) -> Vec<StatementId> {
        let candidates: Vec<StatementId> = match (subject, object) {
            (Some(s), _) => self
                .by_subject
                .get(s)
                .map(|ids| ids.iter().copied().collect())
                .unwrap_or_default(),
            (None, Some(o)) => self
                .by_object
                .get(o)
                .map(|ids| ids.iter().copied().collect())
                .unwrap_or_default(),
            (None, None) => self.statements.keys().copied().collect(),
        };
        candidates
            .into_iter()
            .filter(|id| {
                let t = &self.statements[id];
                subject.map_or(true, |s| &t.subject == s)
                    && predicate.map_or(true, |p| t.predicate == p)
                    && object.map_or(true, |o| &t.object == o)
            })
            .collect()
    }

    pub fn statements_about<'a>(&'a self, subject: &Term) -> impl Iterator<Item = &'a Triple> + 'a {
        self.by_subject
            .get(subject)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .map(move |id| &self.statements[id])
    }

    pub fn objects(&self, subject: &Term, predicate: &str) -> Vec<&Term> {
        self.statements_about(subject)
            .filter(|t| t.predicate == predicate)
            .map(|t| &t.object)
            .collect()
    }

    pub fn first_object(&self, subject: &Term, predicate: &str) -> Option<&Term> {
        self.statements_about(subject)
            .find(|t| t.predicate == predicate)
            .map(|t| &t.object)
    }

    pub fn subjects_with(&self, predicate: &str, object: &Term) -> Vec<&Term> {
        self.by_object
            .get(object)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .map(|id| &self.statements[id])
            .filter(|t| t.predicate == predicate)
            .map(|t| &t.subject)
            .collect()
    }

    /// A fresh blank node.
    pub fn create_blank(&mut self) -> Term {
        Term::Blank(uuid::Uuid::new_v4().simple().to_string())
    }

    /// A fresh blank node typed with `rdf_type`.
    pub fn create_typed(&mut self, rdf_type: &str) -> Term {
        let node = self.create_blank();
        self.add(&node, rdf::TYPE, Term::iri(rdf_type));
        node
    }

    /// The IRI resource `iri`, typed with `rdf_type`.
    pub fn create_resource(&mut self, iri: &str, rdf_type: &str) -> Term {
        let node = Term::iri(iri);
        self.add(&node, rdf::TYPE, Term::iri(rdf_type));
        node
    }

    /// Every statement transitively reachable from `root` by following
    /// resource objects.
    pub fn reachable_closure(&self, root: &Term) -> BTreeSet<StatementId> {
        let mut marked = BTreeSet::new();
        let mut visited: HashSet<&Term> = HashSet::new();
        let mut queue: VecDeque<&Term> = VecDeque::new();
        visited.insert(root);
        queue.push_back(root);

        while let Some(node) = queue.pop_front() {
            let Some(ids) = self.by_subject.get(node) else {
                continue;
            };
            for id in ids {
                marked.insert(*id);
                let object = &self.statements[id].object;
                if object.is_resource() && visited.insert(object) {
                    queue.push_back(object);
                }
            }
        }
        marked
    }

    /// Delete every statement not reachable from `root`. Returns the
    /// number of statements removed.
    pub fn retain_reachable(&mut self, root: &Term) -> usize {
        let reachable = self.reachable_closure(root);
        let garbage: Vec<StatementId> = self
            .statements
            .keys()
            .filter(|id| !reachable.contains(id))
            .copied()
            .collect();
        let count = garbage.len();
        for id in garbage {
            self.remove_id(id);
        }
        count
    }
}

impl From<GraphDocument> for Graph {
    fn from(doc: GraphDocument) -> Self {
        let mut graph = Graph::new();
        graph.namespaces = doc.namespaces;
        for triple in doc.statements {
            graph.insert(triple);
        }
        graph
    }
}

impl From<Graph> for GraphDocument {
    fn from(graph: Graph) -> Self {
        GraphDocument {
            namespaces: graph.namespaces,
            statements: graph.statements.into_values().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(s: &str) -> Term {
        Term::iri(s)
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut g = Graph::new();
        assert!(g.add(&iri("urn:a"), "urn:p", Term::literal("x")));
        assert!(!g.add(&iri("urn:a"), "urn:p", Term::literal("x")));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_indexes_follow_removal() {
        let mut g = Graph::new();
        g.add(&iri("urn:a"), "urn:p", iri("urn:b"));
        g.add(&iri("urn:c"), "urn:p", iri("urn:b"));
        assert_eq!(g.subjects_with("urn:p", &iri("urn:b")).len(), 2);

        assert_eq!(g.remove_matching(Some(&iri("urn:a")), None, None), 1);
        assert_eq!(g.subjects_with("urn:p", &iri("urn:b")), vec![&iri("urn:c")]);
        assert!(g.objects(&iri("urn:a"), "urn:p").is_empty());
    }

    #[test]
    fn test_remove_matching_by_object() {
        let mut g = Graph::new();
        g.add(&iri("urn:a"), "urn:p", iri("urn:b"));
        g.add(&iri("urn:a"), "urn:q", iri("urn:b"));
        g.add(&iri("urn:a"), "urn:p", iri("urn:c"));
        assert_eq!(g.remove_matching(None, Some("urn:p"), Some(&iri("urn:b"))), 1);
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn test_closure_follows_blank_nodes_and_skips_literals() {
        let mut g = Graph::new();
        let root = iri("urn:root");
        let blank = g.create_blank();
        g.add(&root, "urn:has", blank.clone());
        g.add(&blank, "urn:name", Term::literal("urn:island"));
        g.add(&iri("urn:island"), "urn:p", Term::literal("x"));

        let closure = g.reachable_closure(&root);
        assert_eq!(closure.len(), 2);
    }

    #[test]
    fn test_closure_terminates_on_cycles() {
        let mut g = Graph::new();
        g.add(&iri("urn:a"), "urn:p", iri("urn:b"));
        g.add(&iri("urn:b"), "urn:p", iri("urn:a"));
        assert_eq!(g.reachable_closure(&iri("urn:a")).len(), 2);
    }

    #[test]
    fn test_sweep_keeps_shared_and_namespaces() {
        let mut g = Graph::new();
        g.set_namespace("dcat", "http://www.w3.org/ns/dcat#");
        let root = iri("urn:catalog");
        let shared = iri("urn:shared");
        g.add(&root, "urn:title", Term::literal("Catalog"));
        g.add(&root, "urn:dataset", iri("urn:ds1"));
        g.add(&iri("urn:ds1"), "urn:ref", shared.clone());
        g.add(&iri("urn:ds2"), "urn:ref", shared.clone());
        g.add(&shared, "urn:label", Term::literal("shared"));
        g.add(&iri("urn:ds2"), "urn:title", Term::literal("orphan"));

        let removed = g.retain_reachable(&root);
        assert_eq!(removed, 2);
        assert!(g.contains(&Triple::new(shared.clone(), "urn:label", Term::literal("shared"))));
        assert!(g.statements_about(&iri("urn:ds2")).next().is_none());
        assert_eq!(g.namespaces().len(), 1);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut g = Graph::new();
        g.add(&iri("urn:a"), "urn:p", Term::literal("1"));
        let snapshot = g.clone();
        g.add(&iri("urn:a"), "urn:p", Term::literal("2"));
        g.remove_matching(None, None, Some(&Term::literal("1")));
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains(&Triple::new(iri("urn:a"), "urn:p", Term::literal("1"))));
    }

    #[test]
    fn test_serde_round_trip_rebuilds_indexes() {
        let mut g = Graph::new();
        g.set_namespace("ex", "urn:ex:");
        let node = g.create_typed("urn:Type");
        g.add(&node, "urn:p", Term::lang_literal("hallo", Some("de")));

        let json = serde_json::to_string(&g).unwrap();
        let back: Graph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.subjects_with(rdf::TYPE, &iri("urn:Type")), vec![&node]);
        assert_eq!(back.namespaces().get("ex").map(String::as_str), Some("urn:ex:"));
    }

    #[test]
    fn test_empty_language_tag_is_plain_literal() {
        assert_eq!(Term::lang_literal("x", Some("")), Term::literal("x"));
    }
}
