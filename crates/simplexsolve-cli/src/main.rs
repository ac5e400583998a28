use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use simplexsolve_lang::{Compiler, Item};
use simplexsolve_solver::{LpProblem, SimplexError, Solution, Solver};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "simplexsolve")]
#[command(about = "Solve maximization LPs with the tableau simplex method", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an LP file and output the AST
    Parse {
        /// The file to parse
        file: PathBuf,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Solve an LP file and output the optimal solution
    Solve {
        /// The file containing the problem
        file: PathBuf,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Show shadow prices and reduced costs
        #[arg(short, long)]
        analysis: bool,
        /// Stop after this many pivots
        #[arg(long)]
        max_iterations: Option<usize>,
    },
    /// Check an LP file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.init();
}

fn read_source(file: &Path) -> String {
    match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    }
}

fn compile(file: &Path) -> LpProblem {
    let source = read_source(file);
    match Compiler::new().compile_source(&source) {
        Ok(problem) => problem,
        Err(e) => {
            eprintln!("Compile error: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Parse { file, format } => {
            let source = read_source(&file);

            match simplexsolve_lang::Parser::parse(&source) {
                Ok(program) => {
                    if format == "json" {
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&program)
                                .unwrap_or_else(|e| format!("Error: {}", e))
                        );
                    } else {
                        println!("{:#?}", program);
                    }
                }
                Err(e) => {
                    eprintln!("Parse error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Solve {
            file,
            format,
            analysis,
            max_iterations,
        } => {
            let problem = compile(&file);

            let mut solver = Solver::new();
            if let Some(max) = max_iterations {
                solver = solver.with_max_iterations(max);
            }

            match solver.solve(&problem) {
                Ok(solution) => {
                    if format == "json" {
                        print_json(&problem, &solution);
                    } else {
                        print_pretty(&problem, &solution, analysis);
                    }
                }
                Err(SimplexError::Unbounded { .. }) => {
                    if format == "json" {
                        println!("{}", serde_json::json!({ "status": "unbounded" }));
                    } else {
                        println!("Status: UNBOUNDED");
                        println!("The objective can increase without limit.");
                    }
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Solve error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { file } => {
            let source = read_source(&file);

            let program = match simplexsolve_lang::Parser::parse(&source) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            };

            match Compiler::new().compile(&program) {
                Ok(problem) => {
                    let objectives = program
                        .items
                        .iter()
                        .filter(|item| matches!(item, Item::Objective(_)))
                        .count();

                    println!("✓ {} is valid", file.display());
                    println!("  {} objective", objectives);
                    println!("  {} variables", problem.num_variables());
                    println!("  {} constraints", problem.num_constraints());
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

fn print_json(problem: &LpProblem, solution: &Solution) {
    let variables: serde_json::Map<String, serde_json::Value> = problem
        .variables
        .iter()
        .zip(&solution.values)
        .map(|(name, &value)| (name.clone(), serde_json::Value::from(value)))
        .collect();

    let output = serde_json::json!({
        "status": "optimal",
        "objective_value": solution.objective_value,
        "iterations": solution.iterations,
        "variables": variables,
        "analysis": solution.analysis,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).unwrap_or_else(|e| format!("Error: {}", e))
    );
}

fn print_pretty(problem: &LpProblem, solution: &Solution, analysis: bool) {
    println!("Status: OPTIMAL");
    println!("Objective: {:.4}", solution.objective_value);
    println!("Pivots: {}", solution.iterations);
    println!();
    println!("Variables:");
    for (name, value) in problem.variables.iter().zip(&solution.values) {
        println!("  {:20} {:12.4}", name, value);
    }

    if !analysis {
        return;
    }

    println!();
    println!("Analysis:");
    println!();

    if !solution.analysis.binding_constraints.is_empty() {
        println!("Binding constraints:");
        for name in &solution.analysis.binding_constraints {
            println!("  - {}", name);
        }
        println!();
    }

    println!("Shadow prices:");
    for sp in &solution.analysis.shadow_prices {
        println!("  {:20} {:12.4}   slack {:.4}", sp.constraint, sp.value, sp.slack);
    }
    println!();

    println!("Reduced costs (variables not in the basis):");
    for rc in &solution.analysis.reduced_costs {
        if !rc.is_basic {
            println!(
                "  {:20} objective must rise by {:.4} to enter",
                rc.variable, rc.reduced_cost
            );
        }
    }
}
