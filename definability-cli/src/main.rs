use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::process;

use anyhow::{Context, Error};
use clap::{App, Arg};
use env_logger::{fmt, Builder, Target};
use log::{error, Level, LevelFilter, Record};

use definability_dimacs::parse_qdimacs;
use definability_interpolation::DefinitionExtractor;
use definability_sat::CdclSolver;

type Extractor = DefinitionExtractor<CdclSolver<definability_interpolation::ProofDagStore>>;

fn init_logging() {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        use std::io::Write;
        if record.level() == Level::Info {
            writeln!(buf, "{}", record.args())
        } else {
            writeln!(buf, "{}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stderr)
        .format(format)
        .filter(None, LevelFilter::Warn);

    if let Ok(env_var) = std::env::var("DEFINABILITY_LOG") {
        builder.parse_filters(&env_var);
    }

    builder.init();
}

/// Render a progress bar to stdout, overwriting the previous one via `\r`.
///
/// Ported from the original tool's `displayProgress`.
fn display_progress(progress: f64) {
    use std::io::Write;
    const BAR_WIDTH: usize = 70;
    let pos = (BAR_WIDTH as f64 * progress) as usize;

    let mut line = String::with_capacity(BAR_WIDTH + 16);
    line.push('[');
    for i in 0..BAR_WIDTH {
        if i < pos {
            line.push('=');
        } else if i == pos {
            line.push('>');
        } else {
            line.push(' ');
        }
    }
    line.push_str(&format!("] {:.1}%\r", progress * 100.0));

    print!("{}", line);
    io::stdout().flush().ok();
}

/// Forward-order strategy (`--basic`): enumerate variables in quantifier
/// order, offering every existential variable every variable seen so far as
/// its candidate defining set.
fn run_basic(
    extractor: &mut Extractor,
    variables: &[isize],
    is_existential: &[bool],
    num_variables: usize,
) -> (usize, usize) {
    let mut nr_defined = 0;
    let mut nr_existential = 0;
    let mut defining_variables: Vec<i64> = Vec::new();

    for (i, &v) in variables.iter().enumerate() {
        display_progress((i + 1) as f64 / num_variables as f64);
        if is_existential[i] {
            nr_existential += 1;
            if extractor.has_definition(v as i64, &defining_variables, &[]) {
                nr_defined += 1;
                let _ = extractor.get_definition(false);
            }
        }
        defining_variables.push(v as i64);
    }

    (nr_defined, nr_existential)
}

/// Default reverse-order strategy: walk the quantifier prefix from the
/// innermost variable outward, offering every universal and every existential
/// variable as a defining candidate, skipping only existentials already
/// known (via their own interpolant's support) to transitively depend on the
/// variable being queried, so a later definition never closes a cycle.
fn run_reverse_with_support(
    extractor: &mut Extractor,
    variables: &[isize],
    is_existential: &[bool],
    num_variables: usize,
) -> (usize, usize) {
    let mut nr_defined = 0;
    let mut nr_existential = 0;

    let mut universal_vars: HashSet<i64> = HashSet::new();
    let mut existential_vars: HashSet<i64> = HashSet::new();
    for (i, &v) in variables.iter().enumerate() {
        if is_existential[i] {
            existential_vars.insert(v as i64);
        } else {
            universal_vars.insert(v as i64);
        }
    }

    let mut defined_existentials: HashSet<i64> = HashSet::new();
    let mut transitive_support: HashMap<i64, HashSet<i64>> = HashMap::new();

    for (done, i) in (0..variables.len()).rev().enumerate() {
        display_progress((done + 1) as f64 / num_variables as f64);
        if !is_existential[i] {
            continue;
        }
        let y = variables[i] as i64;
        nr_existential += 1;

        let mut defining_variables: Vec<i64> = Vec::new();
        for &u in &universal_vars {
            defining_variables.push(u);
        }
        for &e in &existential_vars {
            if e == y {
                continue;
            }
            if defined_existentials.contains(&e) {
                let creates_cycle = transitive_support
                    .get(&e)
                    .map(|support| support.contains(&y))
                    .unwrap_or(false);
                if !creates_cycle {
                    defining_variables.push(e);
                }
            } else {
                defining_variables.push(e);
            }
        }

        if extractor.has_definition(y, &defining_variables, &[]) {
            nr_defined += 1;
            let (definition_clauses, _aux_start) = extractor
                .get_definition(false)
                .expect("has_definition just returned true");

            let defining_set: HashSet<i64> = defining_variables.iter().copied().collect();
            let mut direct_support: HashSet<i64> = HashSet::new();
            for clause in &definition_clauses {
                for &lit in clause {
                    let var = lit.abs();
                    if var != y && defining_set.contains(&var) {
                        direct_support.insert(var);
                    }
                }
            }

            let mut t_support = direct_support.clone();
            for &z in &direct_support {
                if let Some(support) = transitive_support.get(&z) {
                    t_support.extend(support.iter().copied());
                }
            }

            defined_existentials.insert(y);
            transitive_support.insert(y, t_support);
        }
    }

    (nr_defined, nr_existential)
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            1
        }
    };
    process::exit(exit_code);
}

fn run() -> Result<i32, Error> {
    init_logging();

    let matches = App::new("definability")
        .about("Find propositional definitions of existential variables in a QBF matrix")
        .arg(Arg::with_name("input").help("QDIMACS input file").required(true))
        .arg(
            Arg::with_name("basic")
                .long("basic")
                .help("Use the basic forward-order strategy"),
        )
        .get_matches();

    let path = matches.value_of("input").unwrap();
    let basic = matches.is_present("basic");

    let file = fs::File::open(path).with_context(|| format!("failed to open '{}'", path))?;

    let instance = parse_qdimacs(io::BufReader::new(file))?;

    let mut extractor = Extractor::new();
    let clauses: Vec<Vec<i64>> = instance
        .formula()
        .iter()
        .map(|clause| clause.iter().map(|lit| lit.to_dimacs() as i64).collect())
        .collect();
    extractor.append_formula(&clauses);

    let variables: Vec<isize> = instance.quantifier_order().iter().map(|v| v.to_dimacs()).collect();
    let is_existential: Vec<bool> = instance
        .quantifier_order()
        .iter()
        .map(|&v| instance.is_existential(v))
        .collect();
    let num_variables = instance.var_count().max(1);

    let (nr_defined, nr_existential) = if basic {
        run_basic(&mut extractor, &variables, &is_existential, num_variables)
    } else {
        run_reverse_with_support(&mut extractor, &variables, &is_existential, num_variables)
    };

    println!();
    println!(
        "Number of defined existential variables: {}/{}",
        nr_defined, nr_existential
    );

    Ok(0)
}
