//! Solution file I/O (spec.md §6 "Solution file format"): one route per
//! line, nodes joined by `-`, beginning and ending with the depot id;
//! empty routes are omitted.
//!
//! Grounded on the teacher's `src/utils/serializer.rs` (write-on-improvement
//! idiom) and `original_source/kgls/read_write/solution_reader.py`
//! (`read_vrp_solution`) for the round-trip reader, which the teacher
//! itself doesn't have.

use std::collections::HashMap;
use std::fs;

use crate::errors::KglsError;
use crate::io::instance::Instance;
use crate::model::{Problem, Solution};

/// Renders every non-empty route as `depot-c1-c2-...-depot` using each
/// node's original (file-native) id, one route per line.
pub fn format_solution(solution: &Solution, problem: &Problem, original_ids: &[i64]) -> String {
    let depot_id = original_ids[problem.depot];
    let mut out = String::new();
    for route in &solution.routes {
        if route.is_empty() {
            continue;
        }
        let customers = solution.customers(route.index);
        out.push_str(&depot_id.to_string());
        for c in customers {
            out.push('-');
            out.push_str(&original_ids[c].to_string());
        }
        out.push('-');
        out.push_str(&depot_id.to_string());
        out.push('\n');
    }
    out
}

/// Writes `solution` to `path` in the format [`format_solution`] produces.
pub fn write_solution_file(path: &str, solution: &Solution, problem: &Problem, original_ids: &[i64]) -> Result<(), KglsError> {
    fs::write(path, format_solution(solution, problem, original_ids))
        .map_err(|e| KglsError::Input(format!("cannot write {path}: {e}")))
}

/// Reads a solution file back into a [`Solution`] over `instance.problem`,
/// translating original (file-native) ids through `instance.id_lookup()`.
///
/// Input errors (spec.md §7): a non-integer route entry, a node id absent
/// from the instance, or a route whose demand exceeds capacity.
pub fn read_solution_file(path: &str, instance: &Instance) -> Result<Solution, KglsError> {
    let text = fs::read_to_string(path).map_err(|e| KglsError::Input(format!("cannot read {path}: {e}")))?;
    let id_lookup: HashMap<i64, usize> = instance.id_lookup();
    let depot = instance.problem.depot;

    let mut solution = Solution::new(&instance.problem);
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut customers = Vec::new();
        for token in line.split('-') {
            let original_id: i64 = token
                .parse()
                .map_err(|_| KglsError::Input(format!("route contains a non-integer value: {token}")))?;
            let new_id = *id_lookup
                .get(&original_id)
                .ok_or_else(|| KglsError::Input(format!("node id {original_id} is not in the instance")))?;
            if new_id != depot {
                customers.push(new_id);
            }
        }

        let route_index = solution.add_route(&customers);
        if solution.routes[route_index].volume > instance.problem.capacity {
            return Err(KglsError::Input(format!(
                "route starting at line {:?} exceeds capacity: {} > {}",
                line, solution.routes[route_index].volume, instance.problem.capacity
            )));
        }
    }

    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::instance::load_instance;
    use std::io::Write as _;

    fn write_temp(contents: &str, suffix: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("kgls_solution_test_{}_{}.vrp", std::process::id(), suffix));
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "{contents}").unwrap();
        path
    }

    fn small_instance() -> (Instance, std::path::PathBuf) {
        let contents = "\
CAPACITY : 10
NODE_COORD_SECTION
0 0 0
4 10 0
3 20 0
1 30 0
2 40 0
DEMAND_SECTION
0 0
4 2
3 2
1 2
2 2
EOF
";
        let path = write_temp(contents, "roundtrip");
        let instance = load_instance(path.to_str().unwrap()).unwrap();
        (instance, path)
    }

    #[test]
    fn round_trips_a_solution_file() {
        let (instance, vrp_path) = small_instance();
        let mut solution = Solution::new(&instance.problem);
        let depot = instance.problem.depot;
        let four = instance.id_lookup()[&4];
        let three = instance.id_lookup()[&3];
        let one = instance.id_lookup()[&1];
        let two = instance.id_lookup()[&2];
        solution.add_route(&[four, three, one, two]);
        assert_eq!(depot, instance.problem.depot);

        let text = format_solution(&solution, &instance.problem, &instance.original_ids);
        assert_eq!(text.trim(), "0-4-3-1-2-0");

        let sol_path = vrp_path.with_file_name("roundtrip_out.sol");
        write_solution_file(sol_path.to_str().unwrap(), &solution, &instance.problem, &instance.original_ids).unwrap();
        let reread = read_solution_file(sol_path.to_str().unwrap(), &instance).unwrap();

        assert_eq!(reread.customers(0), solution.customers(0));

        fs::remove_file(&vrp_path).unwrap();
        fs::remove_file(&sol_path).unwrap();
    }

    #[test]
    fn rejects_unknown_node_id() {
        let (instance, vrp_path) = small_instance();
        let sol_path = vrp_path.with_file_name("bad.sol");
        fs::write(&sol_path, "0-999-0\n").unwrap();

        let result = read_solution_file(sol_path.to_str().unwrap(), &instance);
        assert!(result.is_err());

        fs::remove_file(&vrp_path).unwrap();
        fs::remove_file(&sol_path).unwrap();
    }

    #[test]
    fn rejects_capacity_violation() {
        let (instance, vrp_path) = small_instance();
        let sol_path = vrp_path.with_file_name("overcap.sol");
        // All four customers (demand 2 each = 8) fit under capacity 10, so
        // force a violation by writing the same route twice-worth of nodes
        // is not meaningful; instead lower the bar by reusing one route
        // whose total exceeds capacity is not representable in this tiny
        // instance, so assert on a route from a second, smaller-capacity
        // instance instead.
        let tiny = "\
CAPACITY : 3
NODE_COORD_SECTION
0 0 0
1 10 0
2 20 0
DEMAND_SECTION
0 0
1 2
2 2
EOF
";
        let tiny_path = write_temp(tiny, "tiny");
        let tiny_instance = load_instance(tiny_path.to_str().unwrap()).unwrap();
        fs::write(&sol_path, "0-1-2-0\n").unwrap();

        let result = read_solution_file(sol_path.to_str().unwrap(), &tiny_instance);
        assert!(result.is_err());

        fs::remove_file(&vrp_path).unwrap();
        fs::remove_file(&tiny_path).unwrap();
        fs::remove_file(&sol_path).unwrap();
    }
}
