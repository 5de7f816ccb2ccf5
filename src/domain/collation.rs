// Base letters first (accents and case removed, digit runs by value), then
// accents, then case with lowercase first.

use std::cmp::Ordering;
use std::iter::Peekable;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub fn compare_natural(a: &str, b: &str) -> Ordering {
    compare_base(a, b)
        .then_with(|| compare_accents(a, b))
        .then_with(|| compare_case(a, b))
}

pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

fn base_chars(value: &str) -> impl Iterator<Item = char> + '_ {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn compare_base(a: &str, b: &str) -> Ordering {
    let mut left = base_chars(a).peekable();
    let mut right = base_chars(b).peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let left_run = take_digits(&mut left);
                let right_run = take_digits(&mut right);
                let ord = compare_digit_runs(&left_run, &right_run);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                left.next();
                right.next();
                let ord = l.cmp(&r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn take_digits<I: Iterator<Item = char>>(chars: &mut Peekable<I>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

// Decomposed marks sit above the base letters, so unaccented sorts first.
fn compare_accents(a: &str, b: &str) -> Ordering {
    a.nfd()
        .flat_map(char::to_lowercase)
        .cmp(b.nfd().flat_map(char::to_lowercase))
}

fn compare_case(a: &str, b: &str) -> Ordering {
    for (l, r) in a.chars().zip(b.chars()) {
        if l == r {
            continue;
        }
        return match (l.is_lowercase(), r.is_lowercase()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => l.cmp(&r),
        };
    }
    a.len().cmp(&b.len())
}
