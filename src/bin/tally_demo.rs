// Demonstration suite: every check kind, passing and failing, declared out of
// name order. Exits non-zero because some cases fail on purpose.
// Usage: cargo run --bin tally-demo -- [--log PATH] [--color never] [--strict-expect-error]

use tally::{check, check_equal, check_message, check_throws, check_within, fail, test_case};

#[derive(Debug)]
enum NameError {
    Empty,
    Invalid(String),
}

fn parse_name(input: &str) -> Result<&str, NameError> {
    if input.is_empty() {
        Err(NameError::Empty)
    } else if input.chars().all(char::is_alphabetic) {
        Ok(input)
    } else {
        Err(NameError::Invalid(input.to_string()))
    }
}

fn first(values: &[i32]) -> i32 {
    match values.first() {
        Some(value) => *value,
        None => panic!("no values to inspect"),
    }
}

fn add(a: i32, b: i32) -> i32 {
    a + b
}

test_case!(Zebra, {
    check!(add(2, 2) == 4);
});

test_case!(Apple, weight = 2.0, {
    check!(add(1, 1) == 2);
    check_equal!(add(2, 3), 5);
    check_message!(add(0, 0) == 0, "zero is the identity");
    check_equal!(add(2, 3), 6);
});

test_case!(Banana, {
    check_within!(5.0, 5.05, 0.1);
    check_within!(5.0, 5.2, 0.1);
});

test_case!(Cherry, {
    check!(true);
    if parse_name("").is_err() {
        fail!("giving up: {:?}", parse_name(""));
    }
    check!(false);
});

test_case!(Durian, {
    check!(true);
    check_equal!(first(&[]), 1);
});

test_case!(Eggplant, {
    check_message!(add(1, 2) == 4, "add(1, 2) returned {}", add(1, 2));
});

test_case!(Fig, {
    check_throws!(parse_name(""), NameError::Empty);
    check_throws!(parse_name("9lives"), NameError::Empty);
    check_throws!(parse_name("fig"), NameError::Invalid(_));
});

tally::tally_main!();
