//! Parser for the textual graph format.
//!
//! ```text
//! opset 13
//! input %x: f32[2,?,4], %k: i64[]
//! %y: i64[2,4] = ArgMax(%x) @argmax_0 {axis = 1, keepdims = 0}
//! output %y
//! ```
//!
//! Values must be declared (as a graph input or a node output) before they
//! are consumed, and each name may be declared once.

use super::{AttributeValue, Attributes, DataType, Dim, Graph, Node, TensorRef};
use crate::core::{LowerError, LowerResult};
use hashbrown::HashMap;

pub fn parse_graph(text: &str) -> LowerResult<Graph> {
    Parser::new(text).parse()
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    graph: Graph,
    values: HashMap<&'a str, TensorRef>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            graph: Graph::new(),
            values: HashMap::new(),
        }
    }

    fn parse(mut self) -> LowerResult<Graph> {
        self.skip_whitespace();
        while !self.is_eof() {
            self.parse_statement()?;
            self.skip_whitespace();
        }
        Ok(self.graph)
    }

    fn parse_statement(&mut self) -> LowerResult<()> {
        if self.peek() == Some(b'%') {
            return self.parse_node();
        }
        let keyword = self.read_identifier()?;
        match keyword {
            "opset" => {
                let version = self.read_integer()?;
                if version < 1 {
                    return Err(self.error(format!("Invalid opset version {version}")));
                }
                self.graph.opset = version;
            }
            "input" => loop {
                let (name, tensor) = self.parse_tensor_decl()?;
                self.define(name, tensor.clone(), self.pos)?;
                self.graph.inputs.push(tensor);
                if !self.try_read(b',') {
                    break;
                }
            },
            "output" => loop {
                let name = self.read_value_name()?;
                let tensor = self.lookup(name)?;
                self.graph.outputs.push(tensor);
                if !self.try_read(b',') {
                    break;
                }
            },
            other => return Err(self.error(format!("Unknown statement '{other}'"))),
        }
        Ok(())
    }

    fn parse_node(&mut self) -> LowerResult<()> {
        // Outputs are defined once the whole statement is read; errors point at its start.
        let start = self.pos;
        let mut outputs = Vec::new();
        loop {
            outputs.push(self.parse_tensor_decl()?);
            if !self.try_read(b',') {
                break;
            }
        }
        self.expect(b'=')?;

        let op_type = self.read_identifier()?;
        let mut node = Node::new(op_type).with_since_version(self.graph.opset);

        self.expect(b'(')?;
        if !self.try_read(b')') {
            loop {
                let name = self.read_value_name()?;
                node.inputs.push(self.lookup(name)?);
                if !self.try_read(b',') {
                    break;
                }
            }
            self.expect(b')')?;
        }

        if self.try_read(b'@') {
            node.name = self.read_identifier()?.to_string();
        }

        if self.try_read(b'{') {
            node.attributes = self.parse_attributes()?;
        }

        for (name, output) in outputs {
            self.define(name, output.clone(), start)?;
            node.outputs.push(output);
        }
        self.graph.nodes.push(node);
        Ok(())
    }

    fn parse_tensor_decl(&mut self) -> LowerResult<(&'a str, TensorRef)> {
        let name = self.read_value_name()?;
        let mut tensor = TensorRef::new(name);
        if self.try_read(b':') {
            let ty_name = self.read_identifier()?;
            let ty = DataType::from_short_name(ty_name)
                .ok_or_else(|| self.error(format!("Unknown data type '{ty_name}'")))?;
            tensor.data_type = Some(ty);
            if self.try_read(b'[') {
                tensor.shape = Some(self.parse_dims()?);
            }
        }
        Ok((name, tensor))
    }

    fn parse_dims(&mut self) -> LowerResult<Vec<Dim>> {
        let mut dims = Vec::new();
        if self.try_read(b']') {
            return Ok(dims);
        }
        loop {
            self.skip_whitespace();
            let dim = match self.peek() {
                Some(b'?') => {
                    self.pos += 1;
                    Dim::Dynamic(String::new())
                }
                Some(ch) if ch.is_ascii_digit() => {
                    let value = self.read_integer()?;
                    let size = u32::try_from(value)
                        .map_err(|_| self.error(format!("Dimension {value} out of range")))?;
                    Dim::Fixed(size)
                }
                _ => Dim::Dynamic(self.read_identifier()?.to_string()),
            };
            dims.push(dim);
            if !self.try_read(b',') {
                break;
            }
        }
        self.expect(b']')?;
        Ok(dims)
    }

    fn parse_attributes(&mut self) -> LowerResult<Attributes> {
        let mut attributes = Attributes::new();
        if self.try_read(b'}') {
            return Ok(attributes);
        }
        loop {
            let name = self.read_identifier()?;
            self.expect(b'=')?;
            let value = self.parse_attribute_value()?;
            if attributes.insert(name.to_string(), value).is_some() {
                return Err(self.error(format!("Duplicate attribute '{name}'")));
            }
            if !self.try_read(b',') {
                break;
            }
        }
        self.expect(b'}')?;
        Ok(attributes)
    }

    fn parse_attribute_value(&mut self) -> LowerResult<AttributeValue> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'"') => Ok(AttributeValue::String(self.read_string()?)),
            Some(b'[') => {
                self.pos += 1;
                let mut numbers = Vec::new();
                if !self.try_read(b']') {
                    loop {
                        numbers.push(self.read_number()?);
                        if !self.try_read(b',') {
                            break;
                        }
                    }
                    self.expect(b']')?;
                }
                if numbers.iter().any(|n| matches!(n, Number::Float(_))) {
                    Ok(AttributeValue::Floats(numbers.into_iter().map(Number::as_f32).collect()))
                } else {
                    Ok(AttributeValue::Ints(numbers.into_iter().map(Number::as_i64).collect()))
                }
            }
            _ => match self.read_number()? {
                Number::Int(v) => Ok(AttributeValue::Int(v)),
                Number::Float(v) => Ok(AttributeValue::Float(v)),
            },
        }
    }

    fn define(&mut self, name: &'a str, tensor: TensorRef, pos: usize) -> LowerResult<()> {
        if self.values.contains_key(name) {
            return Err(self.error_at(pos, format!("Value '%{name}' is defined more than once")));
        }
        self.values.insert(name, tensor);
        Ok(())
    }

    fn lookup(&self, name: &str) -> LowerResult<TensorRef> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| self.error(format!("Use of undefined value '%{name}'")))
    }

    // ---------- lexing ----------

    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == b';' {
                while let Some(ch) = self.peek() {
                    self.pos += 1;
                    if ch == b'\n' {
                        break;
                    }
                }
            } else if ch.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn try_read(&mut self, ch: u8) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: u8) -> LowerResult<()> {
        if !self.try_read(ch) {
            let found = self.peek().map(char::from);
            return Err(self.error(format!("Expected '{}' but found {:?}", ch as char, found)));
        }
        Ok(())
    }

    fn read_identifier(&mut self) -> LowerResult<&'a str> {
        self.skip_whitespace();
        let start = self.pos;
        match self.peek() {
            Some(ch) if ch.is_ascii_alphabetic() || ch == b'_' => {}
            Some(ch) => {
                return Err(self.error(format!("Expected identifier but found '{}'", ch as char)))
            }
            None => return Err(self.error("Expected identifier but found EOF")),
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(&self.text[start..self.pos])
    }

    fn read_value_name(&mut self) -> LowerResult<&'a str> {
        self.expect(b'%')?;
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("Expected value name after '%'"));
        }
        Ok(&self.text[start..self.pos])
    }

    fn read_integer(&mut self) -> LowerResult<i64> {
        match self.read_number()? {
            Number::Int(v) => Ok(v),
            Number::Float(v) => Err(self.error(format!("Expected integer but found {v}"))),
        }
    }

    fn read_number(&mut self) -> LowerResult<Number> {
        self.skip_whitespace();
        let start = self.pos;
        let mut is_float = false;
        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.pos += 1;
        }
        while let Some(ch) = self.peek() {
            match ch {
                b'0'..=b'9' => self.pos += 1,
                b'.' | b'e' | b'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(ch, b'e' | b'E') && matches!(self.peek(), Some(b'-') | Some(b'+')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }

        let literal = &self.text[start..self.pos];
        if is_float {
            literal
                .parse::<f32>()
                .map(Number::Float)
                .map_err(|e| self.error(format!("Failed to parse number '{literal}': {e}")))
        } else {
            literal
                .parse::<i64>()
                .map(Number::Int)
                .map_err(|e| self.error(format!("Failed to parse number '{literal}': {e}")))
        }
    }

    fn read_string(&mut self) -> LowerResult<String> {
        self.expect(b'"')?;
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == b'"' {
                let value = self.text[start..self.pos].to_string();
                self.pos += 1;
                return Ok(value);
            }
            if ch == b'\n' {
                break;
            }
            self.pos += 1;
        }
        Err(self.error("Unterminated string literal"))
    }

    fn error(&self, message: impl Into<String>) -> LowerError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, pos: usize, message: impl Into<String>) -> LowerError {
        let consumed = &self.text[..pos.min(self.text.len())];
        LowerError::Parse {
            line: consumed.matches('\n').count() + 1,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f32),
}

impl Number {
    fn as_i64(self) -> i64 {
        match self {
            Number::Int(v) => v,
            Number::Float(v) => v as i64,
        }
    }

    fn as_f32(self) -> f32 {
        match self {
            Number::Int(v) => v as f32,
            Number::Float(v) => v,
        }
    }
}
