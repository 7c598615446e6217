//! In-memory triple model and the query/construct capability the pipeline
//! stages depend on.
//!
//! Statements are stored in an [`oxrdf::Graph`]. [`Node`] and [`Statement`]
//! are the typed view the stages work with; they convert to and from oxrdf
//! terms at the model boundary. Query results are sorted, so iteration order
//! is deterministic for a given content.
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

use oxrdf::{BlankNode, BlankNodeRef, Graph, NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Term, Triple, TripleRef};

use super::{value_objects::Iri, vocab};

/// A node in subject or object position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Iri(Iri),
    Blank(String),
    Literal(Literal),
}

impl Node {
    /// The IRI, unless the node is blank or a literal.
    #[must_use]
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Returns `true` when the node is the named node `other`.
    #[must_use]
    pub fn is(&self, other: NamedNodeRef<'_>) -> bool {
        matches!(self, Self::Iri(iri) if iri.as_str() == other.as_str())
    }

    /// Subject-position oxrdf term. Literals cannot be subjects.
    fn to_subject(&self) -> Option<NamedOrBlankNode> {
        match self {
            Self::Iri(iri) => Some(NamedNode::new_unchecked(iri.as_str()).into()),
            Self::Blank(id) => Some(BlankNode::new_unchecked(id.as_str()).into()),
            Self::Literal(_) => None,
        }
    }

    fn to_term(&self) -> Term {
        match self {
            Self::Iri(iri) => NamedNode::new_unchecked(iri.as_str()).into(),
            Self::Blank(id) => BlankNode::new_unchecked(id.as_str()).into(),
            Self::Literal(literal) => literal.0.clone().into(),
        }
    }

    fn from_subject(subject: NamedOrBlankNodeRef<'_>) -> Self {
        match subject {
            NamedOrBlankNodeRef::NamedNode(node) => Self::Iri(node.into()),
            NamedOrBlankNodeRef::BlankNode(node) => Self::Blank(node.as_str().to_string()),
        }
    }

    fn from_term(term: oxrdf::TermRef<'_>) -> Option<Self> {
        match term {
            oxrdf::TermRef::NamedNode(node) => Some(Self::Iri(node.into())),
            oxrdf::TermRef::BlankNode(node) => Some(Self::Blank(node.as_str().to_string())),
            oxrdf::TermRef::Literal(literal) => Some(Self::Literal(match literal.language() {
                Some(language) => Literal::new_language_tagged(literal.value(), language),
                None => Literal(literal.into_owned()),
            })),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

impl From<Iri> for Node {
    fn from(iri: Iri) -> Self {
        Self::Iri(iri)
    }
}

impl From<&Iri> for Node {
    fn from(iri: &Iri) -> Self {
        Self::Iri(iri.clone())
    }
}

impl From<NamedNodeRef<'_>> for Node {
    fn from(node: NamedNodeRef<'_>) -> Self {
        Self::Iri(node.into())
    }
}

impl From<Literal> for Node {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => iri.as_named_node().fmt(f),
            Self::Blank(id) => BlankNodeRef::new_unchecked(id).fmt(f),
            Self::Literal(literal) => literal.fmt(f),
        }
    }
}

/// An RDF literal. Language tags are kept lowercase and `xsd:string` literals
/// are simple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Literal(oxrdf::Literal);

impl Literal {
    #[must_use]
    pub fn new_simple(value: impl Into<String>) -> Self {
        Self(oxrdf::Literal::new_simple_literal(value))
    }

    #[must_use]
    pub fn new_language_tagged(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self(oxrdf::Literal::new_language_tagged_literal_unchecked(
            value,
            language.into().to_ascii_lowercase(),
        ))
    }

    /// Creates a typed literal. `xsd:string` collapses to a simple literal.
    #[must_use]
    pub fn new_typed(value: impl Into<String>, datatype: impl Into<Iri>) -> Self {
        let datatype = datatype.into();
        if datatype == vocab::XSD_STRING || datatype == vocab::LANG_STRING {
            return Self::new_simple(value);
        }
        Self(oxrdf::Literal::new_typed_literal(
            value,
            NamedNode::new_unchecked(datatype.as_str()),
        ))
    }

    /// Lexical form.
    #[must_use]
    pub fn value(&self) -> &str {
        self.0.value()
    }

    /// Language tag, lowercase.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.0.language()
    }

    /// Datatype; `xsd:string` for simple literals.
    #[must_use]
    pub fn datatype(&self) -> NamedNodeRef<'_> {
        self.0.datatype()
    }

    fn sort_key(&self) -> (&str, Option<&str>, &str) {
        (self.value(), self.language(), self.datatype().as_str())
    }
}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single `subject predicate object` assertion.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Statement {
    pub subject: Node,
    pub predicate: Iri,
    pub object: Node,
}

impl Statement {
    pub fn new(subject: impl Into<Node>, predicate: impl Into<Iri>, object: impl Into<Node>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Typed view of an oxrdf triple. Triple terms have no view.
    #[must_use]
    pub fn from_triple(triple: TripleRef<'_>) -> Option<Self> {
        Some(Self {
            subject: Node::from_subject(triple.subject),
            predicate: triple.predicate.into(),
            object: Node::from_term(triple.object)?,
        })
    }

    /// The oxrdf triple, unless the subject is a literal.
    #[must_use]
    pub fn to_triple(&self) -> Option<Triple> {
        Some(Triple::new(
            self.subject.to_subject()?,
            NamedNode::new_unchecked(self.predicate.as_str()),
            self.object.to_term(),
        ))
    }
}

/// Formats the statement as an N-Triples line.
impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} .",
            self.subject,
            self.predicate.as_named_node(),
            self.object
        )
    }
}

/// Declarative triple pattern; unset positions match anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    subject: Option<Node>,
    predicate: Option<Iri>,
    object: Option<Node>,
}

impl Pattern {
    /// Matches every statement.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Binds the subject position. The other binders work the same way.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<Node>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn predicate(mut self, predicate: impl Into<Iri>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    #[must_use]
    pub fn object(mut self, object: impl Into<Node>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Whether every bound position equals the statement's.
    #[must_use]
    pub fn matches(&self, statement: &Statement) -> bool {
        self.subject.as_ref().map_or(true, |s| *s == statement.subject)
            && self
                .predicate
                .as_ref()
                .map_or(true, |p| *p == statement.predicate)
            && self.object.as_ref().map_or(true, |o| *o == statement.object)
    }
}

/// Query and construct capability over a set of statements.
///
/// Only [`TripleQuery::select`] is required; the remaining methods are
/// conveniences for the fixed patterns the pipeline uses.
pub trait TripleQuery {
    /// Returns every statement matching `pattern`.
    fn select(&self, pattern: &Pattern) -> Vec<Statement>;

    /// Whether the exact statement is present.
    fn contains(&self, statement: &Statement) -> bool {
        !self
            .select(
                &Pattern::any()
                    .subject(statement.subject.clone())
                    .predicate(statement.predicate.clone())
                    .object(statement.object.clone()),
            )
            .is_empty()
    }

    /// Objects of `subject predicate ?o`, in statement order.
    fn objects(&self, subject: &Node, predicate: NamedNodeRef<'_>) -> Vec<Node> {
        self.select(&Pattern::any().subject(subject.clone()).predicate(predicate))
            .into_iter()
            .map(|statement| statement.object)
            .collect()
    }

    /// Subjects of `?s predicate object`.
    fn subjects(&self, predicate: NamedNodeRef<'_>, object: &Node) -> Vec<Node> {
        self.select(&Pattern::any().predicate(predicate).object(object.clone()))
            .into_iter()
            .map(|statement| statement.subject)
            .collect()
    }

    /// Named objects of `subject predicate ?o`.
    fn object_iris(&self, subject: &Node, predicate: NamedNodeRef<'_>) -> Vec<Iri> {
        self.objects(subject, predicate)
            .into_iter()
            .filter_map(|node| match node {
                Node::Iri(iri) => Some(iri),
                _ => None,
            })
            .collect()
    }

    /// Named subjects of `?s predicate object`.
    fn subject_iris(&self, predicate: NamedNodeRef<'_>, object: &Node) -> Vec<Iri> {
        self.subjects(predicate, object)
            .into_iter()
            .filter_map(|node| match node {
                Node::Iri(iri) => Some(iri),
                _ => None,
            })
            .collect()
    }

    /// Literal objects only.
    fn literals(&self, subject: &Node, predicate: NamedNodeRef<'_>) -> Vec<Literal> {
        self.objects(subject, predicate)
            .into_iter()
            .filter_map(|node| match node {
                Node::Literal(literal) => Some(literal),
                _ => None,
            })
            .collect()
    }

    /// Named individuals typed `class`.
    fn instances_of(&self, class: NamedNodeRef<'_>) -> Vec<Iri> {
        self.subject_iris(vocab::TYPE, &Node::from(class))
    }

    fn has_type(&self, subject: &Node, class: NamedNodeRef<'_>) -> bool {
        self.contains(&Statement::new(subject.clone(), vocab::TYPE, class))
    }

    /// Builds a new model by feeding every match of `pattern` through
    /// `template`.
    fn construct<F, I>(&self, pattern: &Pattern, mut template: F) -> Model
    where
        Self: Sized,
        F: FnMut(&Statement) -> I,
        I: IntoIterator<Item = Statement>,
    {
        let mut model = Model::new();
        for statement in self.select(pattern) {
            model.extend(template(&statement));
        }
        model
    }
}

/// Set of statements backed by an [`oxrdf::Graph`].
#[derive(Clone, Debug, Default)]
pub struct Model {
    graph: Graph,
}

impl Model {
    /// An empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a statement, returning `false` if it was already present or its
    /// subject is a literal.
    pub fn insert(&mut self, statement: Statement) -> bool {
        statement
            .to_triple()
            .is_some_and(|triple| self.graph.insert(&triple))
    }

    /// Removes a statement, returning `true` if it was present.
    pub fn remove(&mut self, statement: &Statement) -> bool {
        statement
            .to_triple()
            .is_some_and(|triple| self.graph.remove(&triple))
    }

    /// Number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Borrows the backing graph.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Iterates statements ordered by subject, predicate, object.
    pub fn statements(&self) -> impl Iterator<Item = Statement> + '_ {
        sorted(self.graph.iter(), &Pattern::any()).into_iter()
    }

    /// Keeps only the statements for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Statement) -> bool) {
        let dropped: Vec<Statement> = self.statements().filter(|s| !keep(s)).collect();
        for statement in &dropped {
            self.remove(statement);
        }
    }

    /// Adds every statement of `other`.
    pub fn merge(&mut self, other: &Model) {
        for triple in other.graph.iter() {
            self.graph.insert(triple);
        }
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.graph.iter().all(|triple| other.graph.contains(triple))
    }
}

impl Eq for Model {}

impl Extend<Statement> for Model {
    fn extend<T: IntoIterator<Item = Statement>>(&mut self, iter: T) {
        for statement in iter {
            self.insert(statement);
        }
    }
}

impl FromIterator<Statement> for Model {
    fn from_iter<T: IntoIterator<Item = Statement>>(iter: T) -> Self {
        let mut model = Self::new();
        model.extend(iter);
        model
    }
}

impl TripleQuery for Model {
    fn select(&self, pattern: &Pattern) -> Vec<Statement> {
        if let Some(subject) = &pattern.subject {
            let Some(subject) = subject.to_subject() else {
                return Vec::new();
            };
            return sorted(self.graph.triples_for_subject(&subject), pattern);
        }
        if let Some(object) = &pattern.object {
            let object = object.to_term();
            return sorted(self.graph.triples_for_object(&object), pattern);
        }
        if let Some(predicate) = &pattern.predicate {
            return sorted(self.graph.triples_for_predicate(predicate.as_named_node()), pattern);
        }
        sorted(self.graph.iter(), pattern)
    }
}

fn sorted<'a>(triples: impl Iterator<Item = TripleRef<'a>>, pattern: &Pattern) -> Vec<Statement> {
    let mut statements: Vec<Statement> = triples
        .filter_map(Statement::from_triple)
        .filter(|statement| pattern.matches(statement))
        .collect();
    statements.sort_unstable();
    statements
}
