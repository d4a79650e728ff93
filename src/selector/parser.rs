//! Recursive descent parser for selector strings.

use super::{Axis, LocationPath, NodeTest, Predicate, Selector, Step};
use crate::core::TemplateError;

pub(crate) fn parse(input: &str) -> Result<Selector, TemplateError> {
    let mut parser = Parser {
        input,
        pos: 0,
    };
    let selector = parser.union()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(selector)
}

struct Parser<'s> {
    input: &'s str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::InvalidSelector {
            selector: self.input.to_string(),
            position: self.pos,
            message: message.into(),
        }
    }

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), TemplateError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{token}'")))
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn union(&mut self) -> Result<Selector, TemplateError> {
        let mut paths = vec![self.path()?];
        loop {
            self.skip_ws();
            if !self.eat("|") {
                break;
            }
            paths.push(self.path()?);
        }
        Ok(Selector {
            paths,
        })
    }

    fn path(&mut self) -> Result<LocationPath, TemplateError> {
        self.skip_ws();
        let mut steps = Vec::new();
        let absolute = if self.eat("//") {
            steps.push(Step::descendant_or_self());
            true
        } else if self.eat("/") {
            self.skip_ws();
            if self.at_end() || matches!(self.peek(), Some('|')) {
                return Ok(LocationPath {
                    absolute: true,
                    steps,
                });
            }
            true
        } else {
            false
        };

        steps.push(self.step()?);
        loop {
            self.skip_ws();
            if self.eat("//") {
                steps.push(Step::descendant_or_self());
            } else if !self.eat("/") {
                break;
            }
            steps.push(self.step()?);
        }

        Ok(LocationPath {
            absolute,
            steps,
        })
    }

    fn step(&mut self) -> Result<Step, TemplateError> {
        self.skip_ws();
        if self.eat("..") {
            return Ok(Step::new(Axis::Parent, NodeTest::AnyNode));
        }
        if self.eat(".") {
            return Ok(Step::new(Axis::SelfNode, NodeTest::AnyNode));
        }

        let test = self.node_test()?;
        let mut step = Step::new(Axis::Child, test);
        loop {
            self.skip_ws();
            if !self.eat("[") {
                break;
            }
            self.skip_ws();
            step.predicates.push(self.predicate()?);
            self.skip_ws();
            self.expect("]")?;
        }
        Ok(step)
    }

    fn node_test(&mut self) -> Result<NodeTest, TemplateError> {
        if self.eat("*") {
            return Ok(NodeTest::AnyElement);
        }
        let name = self.name()?;
        if self.eat("(") {
            self.skip_ws();
            self.expect(")")?;
            return match name.as_str() {
                "text" => Ok(NodeTest::Text),
                "comment" => Ok(NodeTest::Comment),
                "node" => Ok(NodeTest::AnyNode),
                other => Err(self.error(format!("unsupported node test '{other}()'"))),
            };
        }
        if self.eat(":") {
            if self.eat("*") {
                return Ok(NodeTest::PrefixWildcard(name));
            }
            let local = self.name()?;
            return Ok(NodeTest::Qualified {
                prefix: name,
                local,
            });
        }
        Ok(NodeTest::Name(name))
    }

    fn predicate(&mut self) -> Result<Predicate, TemplateError> {
        if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            let start = self.pos;
            while matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                self.pos += 1;
            }
            let position: usize = self.input[start..self.pos]
                .parse()
                .map_err(|_| self.error("position out of range"))?;
            if position == 0 {
                return Err(self.error("positions start at 1"));
            }
            return Ok(Predicate::Position(position));
        }

        if self.rest().starts_with("last(") {
            self.pos += "last(".len();
            self.skip_ws();
            self.expect(")")?;
            return Ok(Predicate::Last);
        }

        if self.eat("@") {
            let name = self.qualified_name()?;
            self.skip_ws();
            return Ok(match self.comparison()? {
                Some((negate, value)) => Predicate::AttributeEquals {
                    name,
                    value,
                    negate,
                },
                None => Predicate::HasAttribute(name),
            });
        }

        let name = self.qualified_name()?;
        self.skip_ws();
        Ok(match self.comparison()? {
            Some((false, value)) => Predicate::ChildEquals {
                name,
                value,
            },
            Some((true, _)) => return Err(self.error("'!=' is only supported on attributes")),
            None => Predicate::HasChild(name),
        })
    }

    /// Optional `= 'literal'` or `!= 'literal'`; returns `(negated, literal)`.
    fn comparison(&mut self) -> Result<Option<(bool, String)>, TemplateError> {
        let negate = if self.eat("!=") {
            true
        } else if self.eat("=") {
            false
        } else {
            return Ok(None);
        };
        self.skip_ws();
        Ok(Some((negate, self.literal()?)))
    }

    fn literal(&mut self) -> Result<String, TemplateError> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected quoted string")),
        };
        self.pos += 1;
        let end = self.rest().find(quote).ok_or_else(|| self.error("unterminated string"))?;
        let value = self.rest()[..end].to_string();
        self.pos += end + 1;
        Ok(value)
    }

    fn qualified_name(&mut self) -> Result<String, TemplateError> {
        let mut name = self.name()?;
        if self.eat(":") {
            name.push(':');
            name.push_str(&self.name()?);
        }
        Ok(name)
    }

    fn name(&mut self) -> Result<String, TemplateError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => self.pos += c.len_utf8(),
            _ => return Err(self.error("expected a name")),
        }
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        Ok(self.input[start..self.pos].to_string())
    }
}
