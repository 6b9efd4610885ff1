use clap::{Parser, Subcommand};
use std::path::PathBuf;

use linprog_solver::{Solution, Solver, Status};

#[derive(Parser)]
#[command(name = "linprog")]
#[command(about = "Solve linear programs written as algebraic constraints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem file and print the optimal assignment
    Solve {
        /// File holding the objective and constraints
        file: PathBuf,
        /// Print the solution as JSON
        #[arg(short, long)]
        json: bool,
        /// Show shadow prices and reduced costs
        #[arg(short, long)]
        analysis: bool,
    },
    /// Check a problem file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Parse a problem file and output the problem structure
    Parse {
        /// The file to parse
        file: PathBuf,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
}

fn read_source(file: &PathBuf) -> String {
    match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    }
}

fn parse_problem(file: &PathBuf) -> linprog_solver::Problem {
    let source = read_source(file);
    match linprog_lang::Parser::parse_program(&source) {
        Ok(problem) => problem,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_solution(solution: &Solution, analysis: bool) {
    match solution.status {
        Status::Optimal => {
            println!("Status: OPTIMAL");
            println!("Objective value: {:.4}", solution.objective_value);
            println!();
            println!("Variables:");
            for v in &solution.values {
                println!("  {:20} {:10.4}", v.name, v.value);
            }

            if analysis {
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
                    println!("  {:30} {:10.4}", sp.constraint, sp.value);
                    println!("    {}", sp.interpretation);
                }
                println!();

                println!("Reduced costs (variables out of the basis):");
                for rc in &solution.analysis.reduced_costs {
                    if !rc.is_basic && rc.reduced_cost.abs() > 1e-9 {
                        println!("  {:20} {:10.4}", rc.variable, rc.reduced_cost);
                    }
                }
            }
        }
        Status::Infeasible => {
            println!("Status: INFEASIBLE");
            println!("No assignment satisfies every constraint.");
            std::process::exit(1);
        }
        Status::Unbounded => {
            println!("Status: UNBOUNDED");
            println!("The problem has no finite optimal solution.");
            std::process::exit(1);
        }
        Status::CycleDetected => {
            println!("Status: CYCLE DETECTED");
            println!("The iteration cap was reached; the problem is degenerate or malformed.");
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            file,
            json,
            analysis,
        } => {
            let problem = parse_problem(&file);
            let solver = Solver::new();
            let solution = solver.solve(&problem);

            if json {
                match serde_json::to_string_pretty(&solution) {
                    Ok(out) => println!("{}", out),
                    Err(e) => {
                        eprintln!("Error serializing solution: {}", e);
                        std::process::exit(1);
                    }
                }
                if solution.status != Status::Optimal {
                    std::process::exit(1);
                }
            } else {
                print_solution(&solution, analysis);
            }
        }
        Commands::Check { file } => {
            let source = read_source(&file);
            match linprog_lang::Parser::parse_program(&source) {
                Ok(problem) => {
                    println!("✓ {} is valid", file.display());
                    println!("  {} variables", problem.variables().len());
                    println!("  {} constraints", problem.num_constraints());
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Parse { file, format } => {
            let problem = parse_problem(&file);
            if format == "json" {
                match serde_json::to_string_pretty(&problem) {
                    Ok(out) => println!("{}", out),
                    Err(e) => {
                        eprintln!("Error serializing problem: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                println!("{:#?}", problem);
            }
        }
    }
}
