//! The matching rule.
//!
//! Three tokens form a set when, for each of shape, fill, color and count, the
//! three values are either all the same or all different. Empty slots never
//! take part in a set.

use crate::Token;

/// Tokens per set.
pub const SET_SIZE: usize = 3;

/// Lexicographic iterator over strictly increasing index triples in `0..n`.
fn triples(n: usize) -> impl Iterator<Item = [usize; SET_SIZE]> {
    (0..n).flat_map(move |i| {
        (i + 1..n).flat_map(move |j| (j + 1..n).map(move |k| [i, j, k]))
    })
}

/// All C(n, 3) strictly increasing index triples drawn from `0..n`.
pub fn combinations(n: usize) -> Vec<[usize; SET_SIZE]> {
    triples(n).collect()
}

fn uniform_or_distinct<T: PartialEq>(a: T, b: T, c: T) -> bool {
    (a == b && b == c) || (a != b && b != c && c != a)
}

/// Returns true iff exactly three non-empty tokens are given and they form a set.
pub fn validate(tokens: &[Option<&Token>]) -> bool {
    let [Some(a), Some(b), Some(c)] = tokens else {
        return false;
    };

    uniform_or_distinct(a.shape, b.shape, c.shape)
        && uniform_or_distinct(a.fill, b.fill, c.fill)
        && uniform_or_distinct(a.color, b.color, c.color)
        && uniform_or_distinct(a.count, b.count, c.count)
}

/// Indices of the first set among `tokens`, if any.
pub fn find_solution(tokens: &[Option<&Token>]) -> Option<[usize; SET_SIZE]> {
    triples(tokens.len())
        .find(|&[i, j, k]| validate(&[tokens[i], tokens[j], tokens[k]]))
}

/// Returns true iff some triple of `tokens` forms a set.
pub fn any_solution(tokens: &[Option<&Token>]) -> bool {
    find_solution(tokens).is_some()
}
