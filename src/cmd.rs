//! Command line interface

use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use aigfraig::equiv::check_equivalence_comb;
use aigfraig::io::{read_aag_file, write_aag_file};
use aigfraig::network::report;
use aigfraig::network::stats::stats;
use aigfraig::optim::{strash, Fraig, FraigConfig};
use aigfraig::sat::MinisatOracle;
use aigfraig::sim::exhaustive::{output_truth_tables, MAX_EXHAUSTIVE_INPUTS};
use aigfraig::sim::{file_sim, random_sim, Effort, SimConfig};
use clap::{Args, Parser, Subcommand};
use kdam::{tqdm, BarExt};

type CmdResult = Result<(), Box<dyn Error>>;

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Show statistics about a circuit
    ///
    /// Will print the number of inputs, outputs and And gates, and optionally the netlist.
    #[clap()]
    Show(ShowArgs),

    /// Report on a single gate of a circuit
    ///
    /// Will print the kind, symbol and definition line of the gate, its candidate
    /// equivalences and simulation values, and optionally its fanin and fanout cones.
    #[clap()]
    Gate(GateArgs),

    /// Merge structurally identical gates
    #[clap()]
    Strash(StrashArgs),

    /// Simulate a circuit and compute groups of candidate-equivalent gates
    ///
    /// Patterns are either random, or read from a file with one 0/1 line per pattern:
    ///    00011101
    ///    01110000
    #[clap(alias = "simulate")]
    Sim(SimArgs),

    /// Optimize a circuit
    ///
    /// Applies structural hashing, random simulation, then merges the gates that are
    /// proven equivalent by a SAT solver.
    #[clap(alias = "optimize")]
    Opt(OptArgs),

    /// Check equivalence between two circuits
    ///
    /// The command will fail if the two circuits are not equivalent, and will output the
    /// failing input pattern.
    #[clap()]
    Equiv(EquivArgs),

    /// Check the consistency of a circuit
    ///
    /// For small circuits, the truth table of each output is printed as well.
    #[clap()]
    Check(CheckArgs),
}

impl Commands {
    pub fn run(&self) -> CmdResult {
        match self {
            Commands::Show(a) => a.run(),
            Commands::Gate(a) => a.run(),
            Commands::Strash(a) => a.run(),
            Commands::Sim(a) => a.run(),
            Commands::Opt(a) => a.run(),
            Commands::Equiv(a) => a.run(),
            Commands::Check(a) => a.run(),
        }
    }
}

/// Command arguments for circuit informations
#[derive(Args)]
pub struct ShowArgs {
    /// Circuit to show
    file: PathBuf,

    /// Print detailed statistics: depth, removed, floating and unused gates
    #[arg(long)]
    stats: bool,

    /// Print the netlist
    #[arg(long)]
    netlist: bool,

    /// Print the primary inputs
    #[arg(long)]
    pi: bool,

    /// Print the primary outputs
    #[arg(long)]
    po: bool,

    /// Print the gates with undefined fanins and the unused gates
    #[arg(long)]
    floating: bool,

    /// Keep trivial and unused gates when reading
    #[arg(long)]
    no_opt: bool,
}

impl ShowArgs {
    pub fn run(&self) -> CmdResult {
        let c = read_aag_file(&self.file, !self.no_opt)?;
        let mut out = io::stdout().lock();
        report::write_summary(&mut out, &c)?;
        if self.stats {
            write!(out, "{}", stats(&c))?;
        }
        if self.netlist {
            report::write_netlist(&mut out, &c)?;
        }
        if self.pi {
            report::write_pis(&mut out, &c)?;
        }
        if self.po {
            report::write_pos(&mut out, &c)?;
        }
        if self.floating {
            report::write_floating(&mut out, &c)?;
        }
        Ok(())
    }
}

/// Command arguments for gate reports
#[derive(Args)]
pub struct GateArgs {
    /// Circuit containing the gate
    file: PathBuf,

    /// Variable index of the gate
    id: usize,

    /// Print the fanin cone up to this depth
    #[arg(long)]
    fanin: Option<usize>,

    /// Print the fanout cone up to this depth
    #[arg(long)]
    fanout: Option<usize>,

    /// Keep trivial and unused gates when reading
    #[arg(long)]
    no_opt: bool,
}

impl GateArgs {
    pub fn run(&self) -> CmdResult {
        let c = read_aag_file(&self.file, !self.no_opt)?;
        if self.id >= c.nb_vars() || c.var(self.id).is_removed() {
            return Err(format!("gate {} does not exist", self.id).into());
        }
        let mut out = io::stdout().lock();
        report::write_gate(&mut out, &c, self.id)?;
        if let Some(depth) = self.fanin {
            report::write_fanin(&mut out, &c, self.id, depth)?;
        }
        if let Some(depth) = self.fanout {
            report::write_fanout(&mut out, &c, self.id, depth)?;
        }
        Ok(())
    }
}

/// Command arguments for structural hashing
#[derive(Args)]
pub struct StrashArgs {
    /// Circuit to process
    file: PathBuf,

    /// Output file for the processed circuit
    #[arg(short = 'o', long)]
    output: PathBuf,
}

impl StrashArgs {
    pub fn run(&self) -> CmdResult {
        let mut c = read_aag_file(&self.file, true)?;
        let nb_merged = strash(&mut c);
        println!("Merged {nb_merged} gates, {} gates left", c.nb_live_gates());
        write_aag_file(&self.output, &c)?;
        Ok(())
    }
}

/// Command arguments for simulation
#[derive(Args)]
pub struct SimArgs {
    /// Circuit to simulate
    file: PathBuf,

    /// Simulate random patterns until the candidate equivalences stop being refined
    #[arg(long, required_unless_present = "patterns", conflicts_with = "patterns")]
    random: bool,

    /// Input patterns file
    #[arg(short = 'p', long)]
    patterns: Option<PathBuf>,

    /// Effort level for random simulation
    #[arg(long, value_enum, default_value_t = Effort::Medium)]
    effort: Effort,

    /// Seed for random simulation
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Output file for the simulated patterns and output values
    #[arg(long)]
    log: Option<PathBuf>,

    /// Print the groups of candidate-equivalent gates
    #[arg(long)]
    fec: bool,
}

impl SimArgs {
    pub fn run(&self) -> CmdResult {
        let mut c = read_aag_file(&self.file, true)?;
        let mut log = match &self.log {
            Some(p) => Some(BufWriter::new(File::create(p)?)),
            None => None,
        };
        let sink = log.as_mut().map(|f| f as &mut dyn Write);
        let res = if self.random {
            let config = SimConfig {
                effort: self.effort,
                seed: self.seed,
            };
            random_sim(&mut c, &config, sink)
        } else if let Some(p) = &self.patterns {
            file_sim(&mut c, BufReader::new(File::open(p)?), sink)
        } else {
            return Err("either --random or --patterns is required".into());
        };
        if let Some(f) = log.as_mut() {
            f.flush()?;
        }
        println!("{}", res?);
        if self.fec {
            report::write_fec_groups(&mut io::stdout().lock(), &c)?;
        }
        Ok(())
    }
}

/// Command arguments for optimization
#[derive(Args)]
pub struct OptArgs {
    /// Circuit to optimize
    file: PathBuf,

    /// Output file for the optimized circuit
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Effort level, for random simulation and counterexample collection
    #[arg(long, value_enum, default_value_t = Effort::Medium)]
    effort: Effort,

    /// Seed for random simulation
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// A pass with fewer merges than this ends the optimization
    #[arg(long, default_value_t = 64)]
    merge_floor: usize,
}

impl OptArgs {
    pub fn run(&self) -> CmdResult {
        let mut c = read_aag_file(&self.file, true)?;
        let nb_initial = c.nb_live_gates();
        strash(&mut c);
        let config = SimConfig {
            effort: self.effort,
            seed: self.seed,
        };
        random_sim(&mut c, &config, None)?;

        let mut engine = Fraig::new(FraigConfig {
            merge_floor: self.merge_floor,
            effort: self.effort,
        });
        let mut progress = tqdm!();
        progress.set_description("Fraig passes");
        while !engine.is_done() {
            engine.run_pass::<MinisatOracle>(&mut c)?;
            let stats = engine.stats();
            progress.set_postfix(format!(
                "merges={} queries={} gates={}",
                stats.nb_merges,
                stats.nb_queries,
                c.nb_live_gates()
            ));
            progress.update(1)?;
        }
        progress.write(format!(
            "Optimized from {} to {} gates: {}",
            nb_initial,
            c.nb_live_gates(),
            engine.stats()
        ))?;
        write_aag_file(&self.output, &c)?;
        Ok(())
    }
}

/// Command arguments for equivalence checking
#[derive(Args)]
pub struct EquivArgs {
    /// First circuit to compare
    file1: PathBuf,
    /// Second circuit to compare
    file2: PathBuf,
}

impl EquivArgs {
    pub fn run(&self) -> CmdResult {
        let c1 = read_aag_file(&self.file1, true)?;
        let c2 = read_aag_file(&self.file2, true)?;
        check_equivalence_comb(&c1, &c2)?;
        println!("Circuits are equivalent");
        Ok(())
    }
}

/// Command arguments for consistency checks
#[derive(Args)]
pub struct CheckArgs {
    /// Circuit to check
    file: PathBuf,

    /// Keep trivial and unused gates when reading
    #[arg(long)]
    no_opt: bool,
}

impl CheckArgs {
    pub fn run(&self) -> CmdResult {
        let c = read_aag_file(&self.file, !self.no_opt)?;
        c.check();
        println!("Circuit is consistent");
        match output_truth_tables(&c) {
            Some(tables) => {
                for (i, t) in tables.iter().enumerate() {
                    println!("o{i}: {}", t.to_hex_string());
                }
            }
            None => println!(
                "More than {MAX_EXHAUSTIVE_INPUTS} inputs, truth tables are not computed"
            ),
        }
        Ok(())
    }
}
