//! Placeholder text for seeded titles and content.

use rand::seq::IndexedRandom;
use rand::Rng;

pub(crate) const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit",
    "sed", "do", "eiusmod", "tempor", "incididunt", "labore", "dolore", "magna",
    "aliqua", "enim", "minim", "veniam", "quis", "nostrud", "exercitation",
    "ullamco", "laboris", "nisi", "aliquip", "commodo", "consequat", "duis",
    "aute", "irure", "reprehenderit", "voluptate", "velit", "esse", "cillum",
    "fugiat", "nulla", "pariatur", "excepteur", "sint", "occaecat", "cupidatat",
    "proident", "sunt", "culpa", "officia", "deserunt", "mollit", "anim", "laborum",
];

fn words<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> Vec<&'static str> {
    let count = rng.random_range(min..=max);
    (0..count)
        .filter_map(|_| WORDS.choose(rng).copied())
        .collect()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Capitalized phrase of `min..=max` words without trailing punctuation.
pub(crate) fn title<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> String {
    let text = words(rng, min, max).join(" ");
    let text = capitalize(&text);
    // Short picks like "do" would fail the 3-char title minimum.
    if text.chars().count() < 3 {
        format!("{text} lorem")
    } else {
        text
    }
}

pub(crate) fn sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}.", title(rng, 4, 9))
}

pub(crate) fn paragraph<R: Rng + ?Sized>(rng: &mut R) -> String {
    let count = rng.random_range(3..=6);
    (0..count)
        .map(|_| sentence(rng))
        .collect::<Vec<_>>()
        .join(" ")
}
