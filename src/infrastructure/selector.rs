//! Interactive repository selection on the terminal.

use console::{Term, style};
use log::warn;
use std::collections::BTreeSet;
use std::io::Write as _;

use crate::domain::{Repository, SelectError, Selector};

/// Asks the operator on the terminal which repositories to update.
#[derive(Debug, Clone)]
pub struct TerminalSelector {
    /// Terminal the list is written to and the answer read from.
    term: Term,
}

impl TerminalSelector {
    /// A selector talking to standard error.
    #[must_use]
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl Selector for TerminalSelector {
    fn select(&self, candidates: Vec<Repository>) -> Result<Vec<Repository>, SelectError> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let mut term = self.term.clone();
        writeln!(term, "{}", style("Select repositories to update:").bold())?;
        for (number, repo) in (1_usize..).zip(&candidates) {
            writeln!(
                term,
                "  {} {}",
                style(format!("[{number}]")).cyan(),
                describe(repo)
            )?;
        }

        loop {
            write!(
                term,
                "Numbers or ranges (e.g. 1,3-5), 'a' for all, empty for none, 'q' to quit: "
            )?;
            let line = term.read_line()?;
            match parse_selection(&line, candidates.len()) {
                Ok(Some(chosen)) => {
                    return Ok(candidates
                        .into_iter()
                        .enumerate()
                        .filter(|(index, _)| chosen.contains(index))
                        .map(|(_, repo)| repo)
                        .collect());
                }
                Ok(None) => return Err(SelectError::Aborted),
                Err(reason) => warn!("{reason}"),
            }
        }
    }
}

/// One line describing a candidate, with the version change when known.
fn describe(repo: &Repository) -> String {
    match repo.dependency_relationship() {
        Some(rel) => format!(
            "{} ({} {} -> {})",
            repo.full_name(),
            rel.package_name,
            rel.current_version,
            style(&rel.package_version).green()
        ),
        None => repo.full_name().to_owned(),
    }
}

/// Parse an answer into zero-based candidate indices.
///
/// Returns `Ok(None)` when the operator quits.
fn parse_selection(input: &str, count: usize) -> Result<Option<BTreeSet<usize>>, String> {
    let answer = input.trim();
    match answer.to_ascii_lowercase().as_str() {
        "q" | "quit" => return Ok(None),
        "a" | "all" => return Ok(Some((0..count).collect())),
        _ => {}
    }

    let mut chosen = BTreeSet::new();
    for token in answer
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let (start, end) = match token.split_once('-') {
            Some((start, end)) => (parse_index(start, count)?, parse_index(end, count)?),
            None => {
                let index = parse_index(token, count)?;
                (index, index)
            }
        };
        if start > end {
            return Err(format!("invalid range: {token}"));
        }
        chosen.extend(start..=end);
    }
    Ok(Some(chosen))
}

/// Turn a 1-based answer into a 0-based index.
fn parse_index(token: &str, count: usize) -> Result<usize, String> {
    let number = token
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("not a number: {token}"))?;
    number
        .checked_sub(1)
        .filter(|index| *index < count)
        .ok_or_else(|| format!("{number} is out of range (1-{count})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(indices: &[usize]) -> Option<BTreeSet<usize>> {
        Some(indices.iter().copied().collect())
    }

    #[test]
    fn test_empty_selects_nothing() {
        assert_eq!(parse_selection("", 3), Ok(set(&[])));
        assert_eq!(parse_selection("  \n", 3), Ok(set(&[])));
    }

    #[test]
    fn test_all_and_quit() {
        assert_eq!(parse_selection("a", 3), Ok(set(&[0, 1, 2])));
        assert_eq!(parse_selection(" ALL \n", 2), Ok(set(&[0, 1])));
        assert_eq!(parse_selection("q", 2), Ok(None));
    }

    #[test]
    fn test_numbers_and_ranges() {
        assert_eq!(parse_selection("1, 3-4", 5), Ok(set(&[0, 2, 3])));
        assert_eq!(parse_selection("2 2 1", 3), Ok(set(&[0, 1])));
    }

    #[test]
    fn test_rejects_out_of_range_and_garbage() {
        assert!(parse_selection("0", 3).is_err());
        assert!(parse_selection("4", 3).is_err());
        assert!(parse_selection("x", 3).is_err());
        assert!(parse_selection("3-1", 3).is_err());
    }
}
