//! File name patterns such as `%track% - %song%.spc`
//!
//! A pattern is a run of literal delimiters and `%name%` tokens. It can be
//! matched against a file name to pull tag values out of it, or rendered
//! from tag values to build a new file name.

use std::fmt;

use crate::error::PatternError;

/// Tag value a pattern token stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenName {
    Song,
    Game,
    Artist,
    Track,
}

impl TokenName {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "song" => Some(TokenName::Song),
            "game" => Some(TokenName::Game),
            "artist" => Some(TokenName::Artist),
            "track" => Some(TokenName::Track),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenName::Song => "song",
            TokenName::Game => "game",
            TokenName::Artist => "artist",
            TokenName::Track => "track",
        }
    }

    /// Numeric tokens match runs of digits when no delimiter bounds them.
    pub fn is_numeric(self) -> bool {
        matches!(self, TokenName::Track)
    }
}

impl fmt::Display for TokenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}%", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Token(TokenName),
}

/// A parsed file name pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        let mut rest = pattern;
        let mut consumed = 0;

        while let Some(start) = rest.find('%') {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }

            let after = &rest[start + 1..];
            let end = after.find('%').ok_or(PatternError::UnterminatedToken {
                start: consumed + start,
            })?;
            let name = &after[..end];
            let token = TokenName::from_name(name).ok_or_else(|| PatternError::UnknownToken {
                name: name.to_string(),
            })?;
            segments.push(Segment::Token(token));

            let advance = start + end + 2;
            consumed += advance;
            rest = &rest[advance..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        if !segments.iter().any(|s| matches!(s, Segment::Token(_))) {
            return Err(PatternError::NoTokens);
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn tokens(&self) -> impl Iterator<Item = TokenName> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Token(token) => Some(*token),
            Segment::Literal(_) => None,
        })
    }

    /// Split `text` into token values.
    ///
    /// A token followed by a delimiter takes everything up to the first
    /// occurrence of that delimiter. Otherwise it takes the longest run of
    /// digits (numeric tokens) or non-digits (text tokens).
    pub fn tokenize(&self, text: &str) -> Result<Vec<(TokenName, String)>, PatternError> {
        let mismatch = || PatternError::Mismatch {
            text: text.to_string(),
        };

        let mut values = Vec::new();
        let mut rest = text;
        let mut segments = self.segments.iter().peekable();

        while let Some(segment) = segments.next() {
            match segment {
                Segment::Literal(literal) => {
                    rest = rest.strip_prefix(literal.as_str()).ok_or_else(mismatch)?;
                }
                Segment::Token(token) => {
                    let end = match segments.peek() {
                        Some(Segment::Literal(delimiter)) => {
                            rest.find(delimiter.as_str()).ok_or_else(mismatch)?
                        }
                        _ if token.is_numeric() => run_end(rest, |c| c.is_ascii_digit()),
                        _ => run_end(rest, |c| !c.is_ascii_digit()),
                    };
                    if end == 0 {
                        return Err(mismatch());
                    }
                    values.push((*token, rest[..end].to_string()));
                    rest = &rest[end..];
                }
            }
        }

        if !rest.is_empty() || values.is_empty() {
            return Err(mismatch());
        }
        Ok(values)
    }

    /// Build text from the pattern, asking `lookup` for each token's value.
    pub fn render<F>(&self, mut lookup: F) -> String
    where
        F: FnMut(TokenName) -> String,
    {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => output.push_str(literal),
                Segment::Token(token) => output.push_str(&lookup(*token)),
            }
        }
        output
    }
}

fn run_end(text: &str, matches: impl Fn(char) -> bool) -> usize {
    text.find(|c: char| !matches(c)).unwrap_or(text.len())
}
