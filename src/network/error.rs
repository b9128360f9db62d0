use thiserror::Error;

/// The result of a circuit construction operation.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error returned when a circuit cannot be built from its definitions.
///
/// Any such error is fatal to the ingest: the partially built circuit must be discarded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Sequential circuits are not supported.
    #[error("latches are not supported ({0} declared)")]
    LatchesUnsupported(usize),

    /// The maximum variable index cannot hold all inputs and gates.
    #[error("number of variables is too small: {max_var} < {inputs} inputs + {gates} gates")]
    TooFewVariables {
        /// Declared maximum variable index
        max_var: usize,
        /// Declared number of inputs
        inputs: usize,
        /// Declared number of gates
        gates: usize,
    },

    /// The variables and outputs cannot all be addressed by a literal.
    #[error("too many variables: {max_var} variables and {outputs} outputs")]
    TooManyVariables {
        /// Declared maximum variable index
        max_var: usize,
        /// Declared number of outputs
        outputs: usize,
    },

    /// Variable 0 is reserved for the constant.
    #[error("cannot redefine constant")]
    ConstantRedefined,

    /// The literal addresses a variable beyond the declared maximum.
    #[error("literal {0} exceeds maximum valid variable {1}")]
    LiteralOutOfRange(u32, usize),

    /// Definitions must use positive literals.
    #[error("literal {0} cannot be inverted")]
    InvertedDefinition(u32),

    /// The variable was already defined.
    #[error("literal {lit} is redefined, previously defined as {kind} at line {line}")]
    Redefinition {
        /// Literal being defined
        lit: u32,
        /// Kind of the previous definition
        kind: &'static str,
        /// Line of the previous definition
        line: usize,
    },

    /// A gate uses its own output as a fanin.
    #[error("gate {0} has itself as fanin")]
    SelfLoop(usize),

    /// More definitions than declared in the header.
    #[error("too many {0} definitions")]
    TooMany(&'static str),

    /// Fewer definitions than declared in the header.
    #[error("missing {0} definition")]
    Missing(&'static str),

    /// A symbol refers to an input or output that does not exist.
    #[error("invalid {kind} index {index}")]
    InvalidSymbolIndex {
        /// "PI" or "PO"
        kind: &'static str,
        /// Index given in the symbol record
        index: usize,
    },

    /// A symbol was already bound to this input or output.
    #[error("symbol of {kind} {index} is already declared at line {line}")]
    DuplicateSymbol {
        /// "PI" or "PO"
        kind: &'static str,
        /// Index given in the symbol record
        index: usize,
        /// Line of the previous declaration
        line: usize,
    },

    /// Symbol names must be printable.
    #[error("symbol name contains non-printable characters")]
    InvalidSymbolName,
}
