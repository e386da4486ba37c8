mod error;
mod solution;

pub use error::*;
pub use solution::*;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::vocab;
pub use oxrdf::{
    BlankNode, BlankNodeRef, GraphName, GraphNameRef, IriParseError, Literal, LiteralRef,
    NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef, Subject,
    SubjectRef, Term, TermRef, Triple, TripleRef, Variable, VariableNameParseError, VariableRef,
};

// Re-export the pattern types of the algebra producer.
pub use spargebra::term::{GroundTerm, NamedNodePattern, TermPattern, TriplePattern};

// Re-export the XSD value types.
pub use oxsdatatypes::{Boolean, DateTime, Decimal, Double, Float, Integer};
