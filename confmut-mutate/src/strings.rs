use crate::MutateError;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

const DEFAULT_CHARSET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";
const DEFAULT_MAX_LEN: usize = 16;
const OVERLENGTH: usize = 4096;

/// Payloads spliced in by [`StringStrategy::InjectEncoding`].
const INJECTIONS: &[&str] = &[
    "\u{0}",
    "\u{feff}",
    "\u{fffd}",
    "%00",
    "\\u0000",
    "\r\n",
    "%s%n",
    "${HOME}",
    "'\"",
    "../",
];

/// Structural corruption applied to strings with no candidate set or rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringStrategy {
    Truncate,
    InvertCase,
    InjectEncoding,
    Empty,
    Overlength,
    AppendRandom,
    DeleteSpan,
}

impl StringStrategy {
    pub const ALL: [StringStrategy; 7] = [
        StringStrategy::Truncate,
        StringStrategy::InvertCase,
        StringStrategy::InjectEncoding,
        StringStrategy::Empty,
        StringStrategy::Overlength,
        StringStrategy::AppendRandom,
        StringStrategy::DeleteSpan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StringStrategy::Truncate => "truncate",
            StringStrategy::InvertCase => "invert_case",
            StringStrategy::InjectEncoding => "inject_encoding",
            StringStrategy::Empty => "empty",
            StringStrategy::Overlength => "overlength",
            StringStrategy::AppendRandom => "append_random",
            StringStrategy::DeleteSpan => "delete_span",
        }
    }

    pub fn apply<R: Rng + ?Sized>(self, original: &str, rng: &mut R) -> String {
        let chars: Vec<char> = original.chars().collect();
        match self {
            StringStrategy::Truncate => chars[..chars.len() / 2].iter().collect(),
            StringStrategy::InvertCase => chars.iter().map(|c| invert_case(*c)).collect(),
            StringStrategy::InjectEncoding => {
                let at = rng.random_range(0..=chars.len());
                let payload = INJECTIONS.choose(rng).copied().unwrap_or("\u{0}");
                let mut out: String = chars[..at].iter().collect();
                out.push_str(payload);
                out.extend(&chars[at..]);
                out
            }
            StringStrategy::Empty => String::new(),
            StringStrategy::Overlength => {
                let mut out = String::with_capacity(original.len() + OVERLENGTH);
                out.push_str(original);
                out.extend(std::iter::repeat_n('A', OVERLENGTH));
                out
            }
            StringStrategy::AppendRandom => {
                let n = rng.random_range(1..=5);
                let charset: Vec<char> = DEFAULT_CHARSET.chars().collect();
                let mut out = original.to_string();
                for _ in 0..n {
                    out.push(*charset.choose(rng).unwrap_or(&'x'));
                }
                out
            }
            StringStrategy::DeleteSpan => {
                if chars.len() <= 2 {
                    return String::new();
                }
                let n = rng.random_range(1..=chars.len() / 2);
                let start = rng.random_range(0..=chars.len() - n);
                chars[..start].iter().chain(&chars[start + n..]).collect()
            }
        }
    }
}

fn invert_case(c: char) -> char {
    if c.is_lowercase() {
        c.to_uppercase().next().unwrap_or(c)
    } else if c.is_uppercase() {
        c.to_lowercase().next().unwrap_or(c)
    } else {
        c
    }
}

/// Pick a strategy uniformly; fall through the others in random order when
/// it leaves the value unchanged.
pub(crate) fn corrupt<R: Rng + ?Sized>(
    original: &str,
    rng: &mut R,
) -> Result<(String, StringStrategy), MutateError> {
    let mut order = StringStrategy::ALL;
    order.shuffle(rng);
    for strategy in order {
        let out = strategy.apply(original, rng);
        if out != original {
            return Ok((out, strategy));
        }
    }
    Err(MutateError::NoMutationPossible(
        "every string strategy left the value unchanged".to_string(),
    ))
}

fn dedup<T: PartialEq + Clone>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Choose a candidate other than `original`.
pub(crate) fn pick_other<T: PartialEq + Clone, R: Rng + ?Sized>(
    candidates: &[T],
    original: &T,
    rng: &mut R,
    what: &str,
) -> Result<T, MutateError> {
    let unique = dedup(candidates);
    match unique.len() {
        0 => Err(MutateError::InvalidBoundary(format!("{what} candidate set is empty"))),
        1 => Err(MutateError::NoMutationPossible(format!(
            "{what} candidate set has a single value"
        ))),
        _ => {
            let others: Vec<&T> = unique.iter().filter(|c| *c != original).collect();
            others
                .choose(rng)
                .map(|c| (*c).clone())
                .ok_or_else(|| MutateError::NoMutationPossible(format!("no other {what} candidate")))
        }
    }
}

/// A length/charset rule for generated strings.
#[derive(Debug, Clone)]
pub(crate) struct StringRule {
    min_len: usize,
    max_len: usize,
    charset: Vec<char>,
}

impl StringRule {
    pub(crate) fn new(
        min_len: Option<usize>,
        max_len: Option<usize>,
        charset: Option<&str>,
    ) -> Result<Self, MutateError> {
        let min_len = min_len.unwrap_or(0);
        let max_len = max_len.unwrap_or(DEFAULT_MAX_LEN.max(min_len));
        if min_len > max_len {
            return Err(MutateError::InvalidBoundary(format!(
                "string min_len {min_len} is greater than max_len {max_len}"
            )));
        }
        let charset = dedup(&charset.unwrap_or(DEFAULT_CHARSET).chars().collect::<Vec<_>>());
        if charset.is_empty() && max_len > 0 {
            return Err(MutateError::InvalidBoundary(
                "string charset is empty".to_string(),
            ));
        }
        Ok(Self {
            min_len,
            max_len,
            charset,
        })
    }

    /// Whether the rule admits exactly one string.
    fn single_value(&self) -> bool {
        self.max_len == 0 || (self.min_len == self.max_len && self.charset.len() == 1)
    }

    pub(crate) fn generate<R: Rng + ?Sized>(
        &self,
        original: &str,
        rng: &mut R,
    ) -> Result<String, MutateError> {
        if self.single_value() {
            return Err(MutateError::NoMutationPossible(
                "string rule admits a single value".to_string(),
            ));
        }
        for _ in 0..8 {
            let candidate = self.random_string(rng);
            if candidate != original {
                return Ok(candidate);
            }
        }
        Ok(self.perturb(original))
    }

    fn random_string<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let len = rng.random_range(self.min_len..=self.max_len);
        (0..len)
            .map(|_| *self.charset.choose(rng).unwrap_or(&'x'))
            .collect()
    }

    /// Deterministic in-rule edit of a value that is itself in the rule.
    fn perturb(&self, original: &str) -> String {
        let mut chars: Vec<char> = original.chars().collect();
        if chars.len() < self.max_len {
            chars.push(self.charset[0]);
        } else if chars.len() > self.min_len {
            chars.pop();
        } else if let Some(first) = chars.first_mut() {
            let replacement = self.charset.iter().copied().find(|c| c != first);
            if let Some(c) = replacement {
                *first = c;
            }
        }
        chars.into_iter().collect()
    }
}
