use super::escape::unescape_literal;
use crate::error::{RdfError, RdfResult};
use crate::model::*;

/// Parses an N-Quads document into a [`Dataset`].
///
/// Blank nodes are accepted in predicate position so generalized datasets
/// written by this crate can be read back. Duplicate statements collapse.
pub fn parse(input: &str) -> RdfResult<Dataset> {
    let mut dataset = Dataset::new();
    for (idx, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        dataset.add(Scanner::new(trimmed, idx + 1).statement()?);
    }
    Ok(dataset)
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str, line: usize) -> Self {
        Self {
            input,
            pos: 0,
            line,
        }
    }

    fn statement(&mut self) -> RdfResult<Quad> {
        let subject = self.resource("subject")?;
        self.skip_ws();
        let predicate = self.resource("predicate")?;
        self.skip_ws();
        let object = self.object()?;
        self.skip_ws();

        let graph = match self.peek() {
            Some('<') => GraphLabel::Named(self.iri()?),
            Some('_') => GraphLabel::Blank(self.blank_node()?),
            _ => GraphLabel::Default,
        };
        self.skip_ws();
        self.expect('.')?;
        self.skip_ws();

        if let Some(ch) = self.peek()
            && ch != '#'
        {
            return Err(self.error(format!("unexpected '{ch}' after '.'")));
        }

        Ok(Quad {
            subject,
            predicate,
            object,
            graph,
        })
    }

    fn error(&self, msg: impl std::fmt::Display) -> RdfError {
        RdfError::parse(format!("line {}: {msg}", self.line))
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self, ch: char) {
        self.pos += ch.len_utf8();
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek()
            && (ch == ' ' || ch == '\t')
        {
            self.bump(ch);
        }
    }

    fn expect(&mut self, expected: char) -> RdfResult<()> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.bump(ch);
                Ok(())
            }
            Some(ch) => Err(self.error(format!("expected '{expected}', found '{ch}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of line"))),
        }
    }

    fn iri(&mut self) -> RdfResult<NamedNode> {
        self.expect('<')?;
        let Some(end) = self.rest().find('>') else {
            return Err(self.error("unterminated IRI"));
        };
        let raw = &self.rest()[..end];
        if raw.chars().any(|c| c == ' ' || c == '<' || c == '"') {
            return Err(self.error(format!("invalid character in IRI <{raw}>")));
        }
        let iri = if raw.contains('\\') {
            unescape_literal(raw).map_err(|e| self.error(e))?
        } else {
            raw.to_string()
        };
        self.pos += end + 1;
        Ok(NamedNode::new(iri))
    }

    fn blank_node(&mut self) -> RdfResult<BlankNode> {
        self.expect('_')?;
        self.expect(':')?;
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '<' || ch == '"' {
                break;
            }
            // A dot only ends the label when it terminates the statement.
            if ch == '.' {
                let after = &self.rest()[1..];
                if after.is_empty() || after.starts_with([' ', '\t', '#']) {
                    break;
                }
            }
            self.bump(ch);
        }
        let label = &self.input[start..self.pos];
        if label.is_empty() {
            return Err(self.error("empty blank node label"));
        }
        Ok(BlankNode::new(label))
    }

    fn resource(&mut self, position: &str) -> RdfResult<Resource> {
        match self.peek() {
            Some('<') => Ok(Resource::Named(self.iri()?)),
            Some('_') => Ok(Resource::Blank(self.blank_node()?)),
            Some(ch) => Err(self.error(format!("unexpected '{ch}' in {position} position"))),
            None => Err(self.error(format!("missing {position}"))),
        }
    }

    fn object(&mut self) -> RdfResult<Object> {
        match self.peek() {
            Some('"') => Ok(Object::Literal(self.literal()?)),
            Some(_) => self.resource("object").map(Object::from),
            None => Err(self.error("missing object")),
        }
    }

    fn literal(&mut self) -> RdfResult<Literal> {
        self.expect('"')?;
        let start = self.pos;
        let mut escaped = false;
        loop {
            match self.peek() {
                Some('"') if !escaped => break,
                Some(ch) => {
                    escaped = ch == '\\' && !escaped;
                    self.bump(ch);
                }
                None => return Err(self.error("unterminated string literal")),
            }
        }
        let raw = &self.input[start..self.pos];
        self.bump('"');
        let value = unescape_literal(raw).map_err(|e| self.error(e))?;

        match self.peek() {
            Some('@') => {
                self.bump('@');
                let start = self.pos;
                while let Some(ch) = self.peek()
                    && (ch.is_ascii_alphanumeric() || ch == '-')
                {
                    self.bump(ch);
                }
                let lang = &self.input[start..self.pos];
                if lang.is_empty() {
                    return Err(self.error("empty language tag"));
                }
                Ok(Literal::lang(value, lang))
            }
            Some('^') => {
                self.bump('^');
                self.expect('^')?;
                Ok(Literal::typed(value, self.iri()?))
            }
            _ => Ok(Literal::new(value)),
        }
    }
}
