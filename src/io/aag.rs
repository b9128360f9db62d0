//! IO for .aag (ASCII AIGER) files

use std::io::{self, BufRead, BufReader, Lines, Read, Write};

use thiserror::Error;

use crate::network::{Circuit, Gate, IngestError, Lit};

/// Error while reading an .aag file
///
/// The partially read circuit is dropped: a new circuit must be read from scratch.
#[derive(Debug, Error)]
pub enum AagError {
    /// The file could not be read
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The text does not follow the format
    #[error("line {line}: {message}")]
    Syntax {
        /// 1-based line of the error
        line: usize,
        /// Description of the error
        message: String,
    },
    /// A definition is rejected by the circuit
    #[error("line {line}: {source}")]
    Ingest {
        /// 1-based line of the error
        line: usize,
        /// Error reported by the circuit
        source: IngestError,
    },
}

/// Line reader that keeps track of the current line number
struct AagLines<R> {
    lines: Lines<BufReader<R>>,
    line: usize,
}

impl<R: Read> AagLines<R> {
    fn new(r: R) -> AagLines<R> {
        AagLines {
            lines: BufReader::new(r).lines(),
            line: 0,
        }
    }

    fn next(&mut self) -> Result<Option<String>, AagError> {
        match self.lines.next() {
            Some(l) => {
                self.line += 1;
                Ok(Some(l?))
            }
            None => Ok(None),
        }
    }

    /// Next line, that must exist for a definition of the given kind
    fn expect(&mut self, kind: &str) -> Result<String, AagError> {
        match self.next()? {
            Some(l) => Ok(l),
            None => Err(AagError::Syntax {
                line: self.line + 1,
                message: format!("missing {kind} definition"),
            }),
        }
    }

    fn syntax(&self, message: impl Into<String>) -> AagError {
        AagError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn ingest(&self, source: IngestError) -> AagError {
        AagError::Ingest {
            line: self.line,
            source,
        }
    }

    /// Parse a line made of exactly n non-negative integers
    fn numbers<T: std::str::FromStr>(&self, text: &str, n: usize, kind: &str) -> Result<Vec<T>, AagError> {
        let ret = text
            .split_whitespace()
            .map(|t| t.parse::<T>().ok())
            .collect::<Option<Vec<T>>>();
        match ret {
            Some(v) if v.len() == n => Ok(v),
            _ => Err(self.syntax(format!("invalid {kind} definition '{text}'"))),
        }
    }
}

/// Check that a literal can be used to define a variable
fn definition_var(lit: u32) -> Result<usize, IngestError> {
    let l = Lit::from_raw(lit);
    if l.is_inverted() {
        return Err(IngestError::InvertedDefinition(lit));
    }
    if l.var() == 0 {
        return Err(IngestError::ConstantRedefined);
    }
    Ok(l.var())
}

/// Parse a symbol record like `i0 name`
fn parse_symbol(text: &str) -> Option<(usize, &str)> {
    let (index, name) = text[1..].split_once(' ')?;
    Some((index.parse().ok()?, name))
}

/// Read a combinational circuit in .aag format
///
/// These files describe the circuit with a header, one line per input, output and And
/// gate, then optional symbols and a comment section:
/// ```text
///     aag 3 2 0 1 1
///     2
///     4
///     7
///     6 2 4
///     i0 a
///     i1 b
///     o0 nand
///     c
///     Free text
/// ```
/// Trivial gates are collapsed and unused gates removed if `optimize` is set.
pub fn read_aag<R: Read>(r: R, optimize: bool) -> Result<Circuit, AagError> {
    let mut lines = AagLines::new(r);

    let header = lines.expect("header")?;
    let mut parts = header.splitn(2, ' ');
    if parts.next() != Some("aag") {
        return Err(lines.syntax(format!("invalid header '{header}'")));
    }
    let counts: Vec<usize> = lines.numbers(parts.next().unwrap_or(""), 5, "header")?;
    let (max_var, nb_inputs, nb_latches, nb_outputs, nb_gates) =
        (counts[0], counts[1], counts[2], counts[3], counts[4]);
    let mut c = Circuit::init(max_var, nb_inputs, nb_latches, nb_outputs, nb_gates)
        .map_err(|e| lines.ingest(e))?;

    for _ in 0..nb_inputs {
        let text = lines.expect("PI")?;
        let lit: Vec<u32> = lines.numbers(&text, 1, "PI")?;
        let var = definition_var(lit[0]).map_err(|e| lines.ingest(e))?;
        c.add_input(var).map_err(|e| lines.ingest(e))?;
        c.set_line(var, lines.line);
    }

    for i in 0..nb_outputs {
        let text = lines.expect("PO")?;
        let lit: Vec<u32> = lines.numbers(&text, 1, "PO")?;
        c.add_output(Lit::from_raw(lit[0]))
            .map_err(|e| lines.ingest(e))?;
        c.set_line(c.output(i), lines.line);
    }

    for _ in 0..nb_gates {
        let text = lines.expect("AIG")?;
        let lits: Vec<u32> = lines.numbers(&text, 3, "AIG")?;
        let var = definition_var(lits[0]).map_err(|e| lines.ingest(e))?;
        c.add_gate(var, Lit::from_raw(lits[1]), Lit::from_raw(lits[2]))
            .map_err(|e| lines.ingest(e))?;
        c.set_line(var, lines.line);
    }

    while let Some(text) = lines.next()? {
        if text == "c" {
            let mut comment = Vec::new();
            while let Some(t) = lines.next()? {
                comment.push(t);
            }
            if !comment.is_empty() {
                c.set_comment(comment.join("\n"));
            }
            break;
        }
        let res = match text.chars().next() {
            Some('i') => parse_symbol(&text).map(|(i, name)| c.set_input_symbol(i, name, lines.line)),
            Some('o') => parse_symbol(&text).map(|(i, name)| c.set_output_symbol(i, name, lines.line)),
            _ => return Err(lines.syntax("invalid character, expected i|o|c")),
        };
        match res {
            None => return Err(lines.syntax(format!("invalid symbol definition '{text}'"))),
            Some(r) => r.map_err(|e| lines.ingest(e))?,
        }
    }

    c.finish_ingest(optimize).map_err(|e| lines.ingest(e))?;
    Ok(c)
}

/// Read a circuit from .aag text
pub fn read_aag_str(text: &str, optimize: bool) -> Result<Circuit, AagError> {
    read_aag(text.as_bytes(), optimize)
}

/// Write a circuit in .aag format
///
/// Removed gates are skipped, and the others are written in their definition order.
/// The variable indices are kept, so that the header keeps the original maximum variable.
pub fn write_aag<W: Write>(w: &mut W, c: &Circuit) -> io::Result<()> {
    writeln!(
        w,
        "aag {} {} 0 {} {}",
        c.max_var(),
        c.nb_inputs(),
        c.nb_outputs(),
        c.nb_live_gates()
    )?;
    for &i in c.inputs() {
        writeln!(w, "{}", Lit::from_var(i).raw())?;
    }
    for o in 0..c.nb_outputs() {
        writeln!(w, "{}", c.output_fanin(o).raw())?;
    }
    for g in c.live_gates() {
        if let Gate::And([a, b]) = c.gate(g) {
            writeln!(w, "{} {} {}", Lit::from_var(g).raw(), a.raw(), b.raw())?;
        }
    }
    for (i, &v) in c.inputs().iter().enumerate() {
        if let Some(s) = c.var(v).symbol() {
            writeln!(w, "i{i} {s}")?;
        }
    }
    for (i, &v) in c.outputs().iter().enumerate() {
        if let Some(s) = c.var(v).symbol() {
            writeln!(w, "o{i} {s}")?;
        }
    }
    writeln!(w, "c")?;
    writeln!(w, "{}", c.comment().unwrap_or("generated by aigfraig"))
}
