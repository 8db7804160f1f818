use std::collections::HashMap;

/// A `$`-placeholder message template.
///
/// Supported syntax:
/// - `$name` and `${name}`, where `name` is `[_A-Za-z][_A-Za-z0-9]*`
/// - `$$` for a literal `$`
///
/// Any other `$` is kept as literal text. Placeholders without a value are
/// rendered exactly as written, so rendering never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder { name: String, braced: bool },
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(pos) = rest.find('$') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix('$') {
                literal.push('$');
                rest = tail;
                continue;
            }

            let placeholder = match after.strip_prefix('{') {
                Some(inner) => inner.find('}').and_then(|end| {
                    let name = &inner[..end];
                    is_identifier(name).then(|| (name, true, &inner[end + 1..]))
                }),
                None => {
                    let len = identifier_len(after);
                    (len > 0).then(|| (&after[..len], false, &after[len..]))
                }
            };

            match placeholder {
                Some((name, braced, tail)) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder {
                        name: name.to_string(),
                        braced,
                    });
                    rest = tail;
                }
                None => {
                    literal.push('$');
                    rest = after;
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    /// The template text as configured.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names referenced by the template, in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder { name, .. } = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Substitute `variables` into the template.
    pub fn render(&self, variables: &HashMap<String, String>) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { name, braced } => match variables.get(name) {
                    Some(value) => out.push_str(value),
                    None if *braced => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    }
                    None => {
                        out.push('$');
                        out.push_str(name);
                    }
                },
            }
        }
        out
    }
}

fn identifier_len(s: &str) -> usize {
    let mut len = 0;
    for (i, c) in s.char_indices() {
        let valid = if i == 0 {
            c == '_' || c.is_ascii_alphabetic()
        } else {
            c == '_' || c.is_ascii_alphanumeric()
        };
        if !valid {
            break;
        }
        len = i + c.len_utf8();
    }
    len
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && identifier_len(s) == s.len()
}
