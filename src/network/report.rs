//! Text reports on a circuit and its gates
//!
//! ```
//! # use aigfraig::io::read_aag_str;
//! use aigfraig::network::report;
//! let c = read_aag_str("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n", true).unwrap();
//! let mut out = Vec::new();
//! report::write_netlist(&mut out, &c).unwrap();
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     "[0] PI  1\n[1] PI  2\n[2] AIG 3 1 2\n[3] PO  4 3\n"
//! );
//! ```

use std::io::{Result, Write};

use itertools::Itertools;

use crate::network::gate::{Gate, SimWord};
use crate::network::traversal::post_order;
use crate::network::Circuit;

const RULE: &str = "==================================================";

fn word_to_string(w: SimWord) -> String {
    format!("{w:064b}")
}

fn label(c: &Circuit, v: usize) -> String {
    match c.var(v).symbol() {
        Some(s) => format!("{} {v} ({s})", c.gate(v).type_str()),
        None => format!("{} {v}", c.gate(v).type_str()),
    }
}

/// Write the number of inputs, outputs and live And gates
pub fn write_summary<W: Write>(w: &mut W, c: &Circuit) -> Result<()> {
    let nb_gates = c.nb_live_gates();
    writeln!(w, "Circuit Statistics")?;
    writeln!(w, "==================")?;
    writeln!(w, "  PI      {:>6}", c.nb_inputs())?;
    writeln!(w, "  PO      {:>6}", c.nb_outputs())?;
    writeln!(w, "  AIG     {:>6}", nb_gates)?;
    writeln!(w, "==================")?;
    writeln!(w, "  TOTAL   {:>6}", c.nb_inputs() + c.nb_outputs() + nb_gates)
}

/// Write the netlist in depth-first order from the outputs
///
/// Undefined fanins are marked with `*`, and inverted fanins with `!`.
pub fn write_netlist<W: Write>(w: &mut W, c: &Circuit) -> Result<()> {
    let order = post_order(c)
        .into_iter()
        .filter(|&v| *c.gate(v) != Gate::Undefined);
    for (i, v) in order.enumerate() {
        write!(w, "[{i}] {:<3} {v}", c.gate(v).type_str())?;
        for s in c.gate(v).dependencies() {
            let undef = if *c.gate(s.var()) == Gate::Undefined {
                "*"
            } else {
                ""
            };
            write!(w, " {undef}{s}")?;
        }
        if let Some(s) = c.var(v).symbol() {
            write!(w, " ({s})")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Write the variables of the primary inputs
pub fn write_pis<W: Write>(w: &mut W, c: &Circuit) -> Result<()> {
    writeln!(w, "PIs of the circuit: {}", c.inputs().iter().join(" "))
}

/// Write the variables of the primary outputs
pub fn write_pos<W: Write>(w: &mut W, c: &Circuit) -> Result<()> {
    writeln!(w, "POs of the circuit: {}", c.outputs().iter().join(" "))
}

fn or_none(list: Vec<usize>) -> String {
    if list.is_empty() {
        "<none>".to_string()
    } else {
        list.iter().join(" ")
    }
}

/// Write the gates with an undefined fanin, and the gates without any user
pub fn write_floating<W: Write>(w: &mut W, c: &Circuit) -> Result<()> {
    let floating = c
        .live_gates()
        .filter(|&g| {
            c.gate(g)
                .dependencies()
                .iter()
                .any(|s| *c.gate(s.var()) == Gate::Undefined)
        })
        .collect();
    let unused = c.live_gates().filter(|&g| c.var(g).ref_count() == 0).collect();
    writeln!(w, "Gates with floating fanin(s): {}", or_none(floating))?;
    writeln!(w, "Gates defined but not used  : {}", or_none(unused))
}

/// Write the groups of candidate-equivalent gates, one line per group
pub fn write_fec_groups<W: Write>(w: &mut W, c: &Circuit) -> Result<()> {
    if !c.is_simulated() {
        log::warn!("The circuit is not yet simulated");
        return Ok(());
    }
    for (i, g) in c.fec_groups().iter().enumerate() {
        let mut members = g.iter().filter(|m| !c.var(m.var()).is_removed());
        writeln!(w, "[{i}] {}", members.join(" "))?;
    }
    Ok(())
}

/// Write the report of a single variable: kind, symbol, line, candidate equivalences and values
pub fn write_gate<W: Write>(w: &mut W, c: &Circuit, v: usize) -> Result<()> {
    let var = c.var(v);
    let kind = var.gate().type_str();
    writeln!(w, "{RULE}")?;
    match var.symbol() {
        Some(s) => writeln!(w, "= {kind}({v})\"{s}\", line {}", var.line())?,
        None => writeln!(w, "= {kind}({v}), line {}", var.line())?,
    }
    if !c.is_simulated() {
        writeln!(w, "= FECs: <not yet simulated>")?;
    } else {
        let partners = c.fec_partners(v);
        if partners.is_empty() {
            writeln!(w, "= FECs: <none>")?;
        } else {
            writeln!(w, "= FECs: {}", partners.iter().join(" "))?;
        }
    }
    writeln!(w, "= Value: {}", word_to_string(var.value))?;
    for h in var.history().iter().rev() {
        writeln!(w, "=        {}", word_to_string(*h))?;
    }
    writeln!(w, "{RULE}")
}

/// Write one line of a cone report; return whether the variable should be expanded
fn write_cone_line<W: Write>(
    w: &mut W,
    c: &Circuit,
    v: usize,
    inverted: bool,
    level: usize,
    reported: &mut [bool],
) -> Result<bool> {
    let inv = if inverted { "!" } else { "" };
    write!(w, "{}{inv}{}", "  ".repeat(level), label(c, v))?;
    if reported[v] {
        if c.gate(v).is_and() {
            write!(w, " (*)")?;
        }
        writeln!(w)?;
        return Ok(false);
    }
    writeln!(w)?;
    reported[v] = true;
    Ok(true)
}

/// Write the fanin cone of a variable up to the given depth
///
/// A variable already written is not expanded again; And gates are then marked with `(*)`.
pub fn write_fanin<W: Write>(w: &mut W, c: &Circuit, v: usize, depth: usize) -> Result<()> {
    let mut reported = vec![false; c.nb_vars()];
    let mut stack = vec![(v, false, 0)];
    while let Some((v, inverted, level)) = stack.pop() {
        if !write_cone_line(w, c, v, inverted, level, &mut reported)? || level == depth {
            continue;
        }
        for s in c.gate(v).dependencies().iter().rev() {
            stack.push((s.var(), s.is_inverted(), level + 1));
        }
    }
    Ok(())
}

/// Write the fanout cone of a variable up to the given depth
///
/// A variable already written is not expanded again; And gates are then marked with `(*)`.
pub fn write_fanout<W: Write>(w: &mut W, c: &Circuit, v: usize, depth: usize) -> Result<()> {
    let mut reported = vec![false; c.nb_vars()];
    let mut stack = vec![(v, false, 0)];
    while let Some((v, inverted, level)) = stack.pop() {
        if !write_cone_line(w, c, v, inverted, level, &mut reported)? || level == depth {
            continue;
        }
        for &u in c.rev_ref(v).iter().rev() {
            let inverted = c
                .gate(u)
                .dependencies()
                .iter()
                .any(|s| s.var() == v && s.is_inverted());
            stack.push((u, inverted, level + 1));
        }
    }
    Ok(())
}
