//! `garuda list`: show the registered test cases.

use garuda_dv::{CaseKind, TestCase, TEST_CASES};

use crate::GlobalArgs;

/// Prints every registered case with its vector source.
pub fn run(_global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    for case in TEST_CASES {
        println!("{}", describe(case));
    }
    Ok(0)
}

fn describe(case: &TestCase) -> String {
    let kind = match case.kind {
        CaseKind::Directed(_) => "directed".to_string(),
        CaseKind::Randomized(op) => format!("random {op}"),
    };
    format!("{:<20} {:<18} {}", case.name, kind, case.description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use garuda_dv::select_cases;

    #[test]
    fn describes_directed_case() {
        let case = select_cases(Some("mac8_legacy"), None)[0];
        let line = describe(case);
        assert!(line.starts_with("mac8_legacy "));
        assert!(line.contains("directed"));
    }

    #[test]
    fn describes_randomized_case() {
        let case = select_cases(Some("simd_dot"), None)[0];
        assert!(describe(case).contains("random SIMD_DOT"));
    }
}
