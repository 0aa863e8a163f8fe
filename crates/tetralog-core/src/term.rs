//! Canonical tagged terms and their stable textual encoding.
//!
//! The encoding is what the interner keys on: two terms are interchangeable
//! iff their encodings are byte-equal, so everything that distinguishes a
//! term (kind, value, datatype, language) must round-trip through it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// IRI of the default string datatype, assumed when none is given.
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// A canonical value occupying one position of a quad.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// An IRI-identified node.
    NamedNode(String),
    /// A document-scoped anonymous node.
    BlankNode(String),
    /// A literal value with datatype and optional language tag.
    Literal {
        value: String,
        datatype: String,
        language: Option<String>,
    },
    /// A named query variable. Variables never appear in stored facts.
    Variable(String),
    /// The unnamed graph.
    DefaultGraph,
}

impl Term {
    pub fn named(iri: impl Into<String>) -> Self {
        Term::NamedNode(iri.into())
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Term::BlankNode(id.into())
    }

    /// A plain string literal (datatype `xsd:string`, no language).
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: XSD_STRING.to_owned(),
            language: None,
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString".to_owned(),
            language: Some(language.into()),
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Stable textual encoding, unique per structurally distinct term.
    ///
    /// N-Triples-flavored: `<iri>`, `_:id`, `"value"@lang` /
    /// `"value"^^<datatype>`, `?name`, `DEFAULT`. Literal values are
    /// escaped so quotes cannot forge a different term's encoding.
    pub fn encode(&self) -> String {
        match self {
            Term::NamedNode(iri) => format!("<{iri}>"),
            Term::BlankNode(id) => format!("_:{id}"),
            Term::Literal {
                value,
                datatype,
                language,
            } => {
                let escaped = escape_literal(value);
                match language {
                    Some(lang) => format!("\"{escaped}\"@{lang}"),
                    None => format!("\"{escaped}\"^^<{datatype}>"),
                }
            }
            Term::Variable(name) => format!("?{name}"),
            Term::DefaultGraph => "DEFAULT".to_owned(),
        }
    }
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
