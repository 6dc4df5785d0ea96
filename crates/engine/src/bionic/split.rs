// ABOUTME: Pure word splitting for the reading aid: space-separated tokens and ceil(L/2) split points.
// ABOUTME: Pieces reassemble to exactly the input, so annotation can always be undone.

/// One output unit of a segmented text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece<'a> {
    /// A word long enough to split: emphasized prefix plus plain suffix.
    Emphasis { prefix: &'a str, suffix: &'a str },
    /// A word too short to split, emitted unchanged.
    Plain(&'a str),
    /// The single space between two tokens.
    Separator,
}

/// Split a word at `ceil(len / 2)` characters, or `None` when it has fewer
/// than two characters.
pub fn split_word(word: &str) -> Option<(&str, &str)> {
    let len = word.chars().count();
    if len < 2 {
        return None;
    }
    let at = len.div_ceil(2);
    let byte = word
        .char_indices()
        .nth(at)
        .map(|(i, _)| i)
        .unwrap_or(word.len());
    Some(word.split_at(byte))
}

/// Segment text on single spaces.
///
/// Runs of spaces produce empty tokens, which emit nothing; the separator
/// between every pair of tokens is always emitted, so the spacing survives.
pub fn segment(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    for (i, token) in text.split(' ').enumerate() {
        if i > 0 {
            pieces.push(Piece::Separator);
        }
        if token.is_empty() {
            continue;
        }
        match split_word(token) {
            Some((prefix, suffix)) => pieces.push(Piece::Emphasis { prefix, suffix }),
            None => pieces.push(Piece::Plain(token)),
        }
    }
    pieces
}

/// Concatenate pieces back into text.
pub fn reassemble(pieces: &[Piece<'_>]) -> String {
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Emphasis { prefix, suffix } => {
                out.push_str(prefix);
                out.push_str(suffix);
            }
            Piece::Plain(word) => out.push_str(word),
            Piece::Separator => out.push(' '),
        }
    }
    out
}
