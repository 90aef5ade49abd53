use std::process::ExitCode;

use kgls::abort::AbortConditions;
use kgls::cli::Args;
use kgls::config::RunParameters;
use kgls::io;
use kgls::solver::Solver;

fn main() -> ExitCode {
    env_logger::Builder::from_default_env().format_module_path(false).init();

    let args = Args::parse();

    let mut params = RunParameters::default();
    if let Some(config_path) = &args.config_path {
        if let Err(e) = params.patch_from_yaml_file(config_path) {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    }

    let mut abort_conditions = AbortConditions::new();
    if args.max_iterations_without_improvement.is_none() && args.time_limit_secs.is_none() {
        abort_conditions = AbortConditions::default_conditions();
    } else {
        if let Some(n) = args.max_iterations_without_improvement {
            if let Err(e) = abort_conditions.add("iterations_without_improvement", n) {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        }
        if let Some(n) = args.time_limit_secs {
            if let Err(e) = abort_conditions.add("max_runtime", n) {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        }
    }

    log::info!("Loading instance: {}", args.instance_path);
    let instance = match io::load_instance(&args.instance_path) {
        Ok(instance) => instance,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let solver = Solver::new(&instance.problem, params, abort_conditions);
    let result = solver.run();

    if let Some(gap) = result.stats.gap(instance.problem.best_known_cost) {
        log::info!("Best cost: {} (gap to best-known: {:.2}%)", result.best_cost, gap);
    } else {
        log::info!("Best cost: {}", result.best_cost);
    }

    if let Err(e) = io::write_solution_file(
        &args.solution_path,
        &result.best_solution,
        &instance.problem,
        &instance.original_ids,
    ) {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
