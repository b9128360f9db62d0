//! Exhaustive simulation with truth tables, for circuits with few inputs

use volute::Lut;

use crate::network::traversal::post_order;
use crate::network::{Circuit, Gate, Lit};

/// Largest number of inputs handled by exhaustive simulation
pub const MAX_EXHAUSTIVE_INPUTS: usize = 16;

fn lit_table(tables: &[Option<Lut>], l: Lit) -> Lut {
    let t = tables[l.var()]
        .clone()
        .unwrap_or_else(|| panic!("Variable {} has not been simulated", l.var()));
    if l.is_inverted() {
        !t
    } else {
        t
    }
}

/// Truth table of each variable reachable from the outputs, as a function of the inputs
///
/// Input `i` of the circuit is variable `i` of the tables. Variables that are not reachable
/// have no table. Returns `None` if the circuit has too many inputs.
pub fn truth_tables(c: &Circuit) -> Option<Vec<Option<Lut>>> {
    let n = c.nb_inputs();
    if n > MAX_EXHAUSTIVE_INPUTS {
        return None;
    }
    let mut tables: Vec<Option<Lut>> = vec![None; c.nb_vars()];
    for (i, &v) in c.inputs().iter().enumerate() {
        tables[v] = Some(Lut::nth_var(n, i));
    }
    for v in post_order(c) {
        let t = match c.gate(v) {
            Gate::Const | Gate::Undefined => Lut::zero(n),
            Gate::Input => continue,
            Gate::Output(a) => lit_table(&tables, *a),
            Gate::And([a, b]) => lit_table(&tables, *a) & lit_table(&tables, *b),
        };
        tables[v] = Some(t);
    }
    Some(tables)
}

/// Truth table of each output, as a function of the inputs
pub fn output_truth_tables(c: &Circuit) -> Option<Vec<Lut>> {
    let tables = truth_tables(c)?;
    Some(
        c.outputs()
            .iter()
            .map(|&o| lit_table(&tables, Lit::from_var(o)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_aag_str;

    #[test]
    fn test_and_xor() {
        // Output 0 is 1 & 2, output 1 is the xor of 1 and 2
        let aag = "aag 5 2 0 2 3\n2\n4\n6\n10\n6 2 4\n8 3 5\n10 7 9\n";
        let c = read_aag_str(aag, true).unwrap();
        let tables = output_truth_tables(&c).unwrap();
        let a = Lut::nth_var(2, 0);
        let b = Lut::nth_var(2, 1);
        assert_eq!(tables[0], a.clone() & b.clone());
        assert_eq!(tables[1], a ^ b);
    }

    #[test]
    fn test_too_many_inputs() {
        let mut aag = String::from("aag 17 17 0 1 0\n");
        for i in 1..=17 {
            aag.push_str(&format!("{}\n", 2 * i));
        }
        aag.push_str("2\n");
        let c = read_aag_str(&aag, true).unwrap();
        assert!(truth_tables(&c).is_none());
    }
}
