use super::{ScoreComponent, ScoringRule};

pub const PUNCTUATION_POINTS: u32 = 1;
pub const PALINDROME_POINTS: u32 = 2;
pub const PALINDROME_MIN_CHARS: usize = 3;
pub const JOYFUL_WORD_POINTS: u32 = 1;
pub const JOYFUL_WORD_CAP: usize = 3;
pub const REPETITION_POINTS: u32 = 3;

const PUNCTUATION: [char; 4] = ['.', ',', '?', '!'];

/// Case-sensitive vocabulary for the joyful-words rule.
pub const JOYFUL_WORDS: [&str; 7] = [
    "Joyful",
    "Happy",
    "Vibrant",
    "Thrilled",
    "Euphoric",
    "Cheerful",
    "Delighted",
];

pub(super) fn punctuation(text: &str) -> Option<ScoreComponent> {
    text.contains(PUNCTUATION).then(|| ScoreComponent {
        rule: ScoringRule::Punctuation,
        points: PUNCTUATION_POINTS,
        notes: "submission contains punctuation".to_string(),
    })
}

pub(super) fn palindrome(text: &str) -> Option<ScoreComponent> {
    text.split_whitespace()
        .find(|token| is_palindrome(token))
        .map(|token| ScoreComponent {
            rule: ScoringRule::Palindrome,
            points: PALINDROME_POINTS,
            notes: format!("palindrome '{token}'"),
        })
}

fn is_palindrome(token: &str) -> bool {
    token.chars().count() >= PALINDROME_MIN_CHARS && token.chars().eq(token.chars().rev())
}

pub(super) fn joyful_words(text: &str) -> Option<ScoreComponent> {
    let matched: Vec<&str> = text
        .split_whitespace()
        .filter(|token| JOYFUL_WORDS.contains(token))
        .take(JOYFUL_WORD_CAP)
        .collect();

    if matched.is_empty() {
        return None;
    }

    Some(ScoreComponent {
        rule: ScoringRule::JoyfulWords,
        points: JOYFUL_WORD_POINTS * matched.len() as u32,
        notes: format!("joyful words: {}", matched.join(", ")),
    })
}

pub(super) fn repetition(text: &str) -> Option<ScoreComponent> {
    let words = word_runs(text);
    words
        .windows(2)
        .find(|pair| {
            let (first, second) = (pair[0], pair[1]);
            let gap = &text[first.end..second.start];
            first.word == second.word
                && !gap.is_empty()
                && gap.chars().all(char::is_whitespace)
        })
        .map(|pair| ScoreComponent {
            rule: ScoringRule::Repetition,
            points: REPETITION_POINTS,
            notes: format!("repeated word '{}'", pair[0].word),
        })
}

#[derive(Debug, Clone, Copy)]
struct WordRun<'a> {
    word: &'a str,
    start: usize,
    end: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Maximal runs of word characters with their byte spans.
fn word_runs(text: &str) -> Vec<WordRun<'_>> {
    let mut runs = Vec::new();
    let mut start = None;

    for (index, c) in text.char_indices() {
        match (is_word_char(c), start) {
            (true, None) => start = Some(index),
            (false, Some(begin)) => {
                runs.push(WordRun {
                    word: &text[begin..index],
                    start: begin,
                    end: index,
                });
                start = None;
            }
            _ => {}
        }
    }

    if let Some(begin) = start {
        runs.push(WordRun {
            word: &text[begin..],
            start: begin,
            end: text.len(),
        });
    }

    runs
}
