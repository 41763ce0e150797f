// Runs tally on itself: cases declared here register before main, execute in
// name order through the global registry, and all pass.

use std::sync::Mutex;

use tally::{check, check_equal, check_message, check_throws, check_within, test_case, HarnessConfig, Registry};

static ORDER: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

fn visit(name: &'static str) {
    ORDER.lock().unwrap().push(name);
}

#[derive(Debug)]
enum Parse {
    Empty,
}

fn parse(input: &str) -> Result<u32, Parse> {
    input.parse().map_err(|_| Parse::Empty)
}

// Checks made from a helper outside any test body still reach the running case.
fn check_positive(value: i64) {
    check!(value > 0);
}

test_case!(zulu_runs_last, {
    visit("zulu_runs_last");
    check_equal!(tally::current(tally::here!()).name(), "zulu_runs_last");
});

test_case!(alpha_runs_first, weight = 2.0, {
    visit("alpha_runs_first");
    check!(tally::is_active());
    check_equal!(vec![1, 2, 3].len(), 3);
    check_within!(0.1 + 0.2, 0.3, 1e-9);
});

test_case!(mike_uses_helpers, {
    visit("mike_uses_helpers");
    check_positive(7);
    check_message!(parse("42").is_ok(), "could not parse {}", 42);
    check_throws!(parse(""), Parse::Empty);
});

fn main() {
    let declared = Registry::global()
        .all()
        .iter()
        .filter(|case| case.name().ends_with("_runs_first") || case.name().ends_with("_runs_last"))
        .count();
    assert_eq!(declared, 2, "static declarations are registered before main");

    let status = tally::run_with_config(HarnessConfig::default().with_color(tally::ColorMode::Never));
    assert_eq!(status, 0, "every self-hosted case passes");

    assert_eq!(
        *ORDER.lock().unwrap(),
        ["alpha_runs_first", "mike_uses_helpers", "zulu_runs_last"]
    );

    for case in Registry::global().all() {
        assert_eq!(case.passed(), case.checked(), "{}", case.name());
    }
}
