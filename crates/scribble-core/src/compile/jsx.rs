//! JSX lowering.
//!
//! Rewrites JSX elements into `React.createElement` calls and leaves every
//! other token of the surrounding JavaScript untouched. The embedded engine
//! understands modern syntax natively, so JSX is the only thing that needs
//! lowering.
//!
//! The scanner is token-aware enough to tell JSX apart from comparisons,
//! strings, template literals, comments and regular expressions: a `<` only
//! opens an element where an expression may begin.

use crate::error::{Error, Result};

/// Keywords after which an expression (and therefore JSX) may start.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return",
    "yield",
    "await",
    "typeof",
    "case",
    "default",
    "else",
    "do",
    "in",
    "of",
    "new",
    "void",
    "delete",
    "throw",
    "instanceof",
];

/// Keywords whose parenthesized header is followed by a statement, so a
/// `/` after the closing `)` starts a regular expression.
const HEADER_KEYWORDS: &[&str] = &["if", "while", "for", "with"];

/// Lower all JSX in `source` to `React.createElement` calls.
pub fn transform_jsx(source: &str) -> Result<String> {
    let mut transformer = Transformer {
        chars: source.chars().collect(),
        pos: 0,
    };
    transformer.javascript(Stop::Eof)
}

/// What the previous significant token was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Operator,
    Keyword,
    Value,
}

impl Prev {
    /// Whether an expression may begin here.
    fn expects_expression(self) -> bool {
        !matches!(self, Prev::Value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// Run to end of input.
    Eof,
    /// Stop at the first unbalanced `}` (consumed, not emitted).
    Brace,
}

enum Attr {
    Named(String, String),
    Spread(String),
}

struct Transformer {
    chars: Vec<char>,
    pos: usize,
}

impl Transformer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            let found = self
                .peek()
                .map(|f| format!("'{}'", f))
                .unwrap_or_else(|| "end of input".to_string());
            Err(self.error(format!("expected '{}', found {}", c, found)))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Whitespace and comments between the parts of a JSX tag.
    fn skip_tag_trivia(&mut self) -> Result<()> {
        loop {
            self.skip_whitespace();
            match (self.peek(), self.peek_at(1)) {
                (Some('/'), Some('/')) => {
                    self.line_comment();
                }
                (Some('/'), Some('*')) => {
                    self.block_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, pos: usize, message: impl Into<String>) -> Error {
        let before = &self.chars[..pos.min(self.chars.len())];
        let line = before.iter().filter(|&&c| c == '\n').count() + 1;
        let column = before.iter().rev().take_while(|&&c| c != '\n').count() + 1;
        Error::Compile {
            message: message.into(),
            line,
            column,
        }
    }

    /// Copy JavaScript through, lowering any JSX found along the way.
    fn javascript(&mut self, stop: Stop) -> Result<String> {
        let mut out = String::new();
        let mut depth = 0usize;
        let mut prev = Prev::Start;
        // One entry per open `(`: whether it follows a statement header keyword.
        let mut parens: Vec<bool> = Vec::new();
        let mut header = false;

        while let Some(c) = self.peek() {
            let significant =
                !c.is_whitespace() && !(c == '/' && matches!(self.peek_at(1), Some('/' | '*')));
            let after_header = significant && std::mem::take(&mut header);

            match c {
                '\'' | '"' => {
                    out.push_str(&self.string_literal(c)?);
                    prev = Prev::Value;
                }
                '`' => {
                    out.push_str(&self.template_literal()?);
                    prev = Prev::Value;
                }
                '/' if self.peek_at(1) == Some('/') => out.push_str(&self.line_comment()),
                '/' if self.peek_at(1) == Some('*') => out.push_str(&self.block_comment()?),
                '/' if prev.expects_expression() => {
                    out.push_str(&self.regex_literal()?);
                    prev = Prev::Value;
                }
                '<' if prev.expects_expression() && self.at_element_start() => {
                    out.push_str(&self.element()?);
                    prev = Prev::Value;
                }
                '{' => {
                    depth += 1;
                    out.push(c);
                    self.pos += 1;
                    prev = Prev::Operator;
                }
                '}' => {
                    self.pos += 1;
                    if depth == 0 && stop == Stop::Brace {
                        return Ok(out);
                    }
                    depth = depth.saturating_sub(1);
                    out.push(c);
                    prev = Prev::Operator;
                }
                '(' => {
                    parens.push(after_header);
                    out.push(c);
                    self.pos += 1;
                    prev = Prev::Operator;
                }
                ')' => {
                    out.push(c);
                    self.pos += 1;
                    prev = if parens.pop().unwrap_or(false) {
                        Prev::Operator
                    } else {
                        Prev::Value
                    };
                }
                ']' => {
                    out.push(c);
                    self.pos += 1;
                    prev = Prev::Value;
                }
                '+' | '-' if self.peek_at(1) == Some(c) => {
                    out.push(c);
                    out.push(c);
                    self.pos += 2;
                    // Postfix leaves the operand as the last value.
                    if prev != Prev::Value {
                        prev = Prev::Operator;
                    }
                }
                c if is_ident_start(c) => {
                    let word = self.take_while(is_ident_continue);
                    header = HEADER_KEYWORDS.contains(&word.as_str()) || (after_header && word == "await");
                    prev = if EXPRESSION_KEYWORDS.contains(&word.as_str()) {
                        Prev::Keyword
                    } else {
                        Prev::Value
                    };
                    out.push_str(&word);
                }
                c if c.is_ascii_digit() => {
                    out.push_str(&self.take_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_'));
                    prev = Prev::Value;
                }
                c if c.is_whitespace() => {
                    out.push(c);
                    self.pos += 1;
                }
                _ => {
                    out.push(c);
                    self.pos += 1;
                    prev = Prev::Operator;
                }
            }
        }

        match stop {
            Stop::Eof => Ok(out),
            Stop::Brace => Err(self.error("unexpected end of input, expected '}'")),
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&keep) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn string_literal(&mut self, quote: char) -> Result<String> {
        let start = self.pos;
        let mut out = String::from(quote);
        self.pos += 1;
        loop {
            match self.peek() {
                None | Some('\n') => return Err(self.error_at(start, "unterminated string literal")),
                Some('\\') => {
                    out.push('\\');
                    self.pos += 1;
                    if let Some(escaped) = self.peek() {
                        out.push(escaped);
                        self.pos += 1;
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                    if c == quote {
                        return Ok(out);
                    }
                }
            }
        }
    }

    fn template_literal(&mut self) -> Result<String> {
        let start = self.pos;
        let mut out = String::from('`');
        self.pos += 1;
        loop {
            match self.peek() {
                None => return Err(self.error_at(start, "unterminated template literal")),
                Some('\\') => {
                    out.push('\\');
                    self.pos += 1;
                    if let Some(escaped) = self.peek() {
                        out.push(escaped);
                        self.pos += 1;
                    }
                }
                Some('`') => {
                    out.push('`');
                    self.pos += 1;
                    return Ok(out);
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    self.pos += 2;
                    out.push_str("${");
                    out.push_str(&self.javascript(Stop::Brace)?);
                    out.push('}');
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn line_comment(&mut self) -> String {
        self.take_while(|c| c != '\n')
    }

    fn block_comment(&mut self) -> Result<String> {
        let start = self.pos;
        self.pos += 2;
        while self.pos < self.chars.len() {
            if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                self.pos += 2;
                return Ok(self.chars[start..self.pos].iter().collect());
            }
            self.pos += 1;
        }
        Err(self.error_at(start, "unterminated comment"))
    }

    fn regex_literal(&mut self) -> Result<String> {
        let start = self.pos;
        let mut out = String::from('/');
        let mut in_class = false;
        self.pos += 1;
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(self.error_at(start, "unterminated regular expression"));
                }
                Some('\\') => {
                    out.push('\\');
                    self.pos += 1;
                    if let Some(escaped) = self.peek() {
                        out.push(escaped);
                        self.pos += 1;
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                    match c {
                        '[' => in_class = true,
                        ']' => in_class = false,
                        '/' if !in_class => break,
                        _ => {}
                    }
                }
            }
        }
        out.push_str(&self.take_while(is_ident_continue));
        Ok(out)
    }

    /// Whether the `<` at the cursor opens an element or fragment.
    fn at_element_start(&self) -> bool {
        matches!(self.peek_at(1), Some(c) if is_ident_start(c) || c == '>')
    }

    fn element(&mut self) -> Result<String> {
        let start = self.pos;
        self.expect('<')?;

        if self.eat('>') {
            let children = self.children(start, "")?;
            return Ok(create_element("React.Fragment", "null", &children));
        }

        let name = self.tag_name()?;
        let mut attrs = Vec::new();

        loop {
            self.skip_tag_trivia()?;
            match self.peek() {
                Some('/') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    self.expect('>')?;
                    return Ok(create_element(&tag_expression(&name), &props(&attrs), &[]));
                }
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                Some('{') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    if !(self.eat('.') && self.eat('.') && self.eat('.')) {
                        return Err(self.error("expected '...' in JSX spread attribute"));
                    }
                    let expr = self.javascript(Stop::Brace)?;
                    attrs.push(Attr::Spread(expr.trim().to_string()));
                }
                Some(c) if is_ident_start(c) => {
                    let key = self.take_while(|c| is_ident_continue(c) || c == '-' || c == ':');
                    self.skip_tag_trivia()?;
                    let value = if self.eat('=') {
                        self.skip_tag_trivia()?;
                        self.attr_value()?
                    } else {
                        "true".to_string()
                    };
                    attrs.push(Attr::Named(key, value));
                }
                Some(c) => {
                    return Err(self.error(format!("unexpected '{}' in JSX tag <{}>", c, name)));
                }
                None => return Err(self.error_at(start, format!("unterminated JSX tag <{}>", name))),
            }
        }

        let children = self.children(start, &name)?;
        Ok(create_element(&tag_expression(&name), &props(&attrs), &children))
    }

    fn tag_name(&mut self) -> Result<String> {
        match self.peek() {
            Some(c) if is_ident_start(c) => {
                Ok(self.take_while(|c| is_ident_continue(c) || matches!(c, '-' | '.' | ':')))
            }
            _ => Err(self.error("expected JSX tag name")),
        }
    }

    fn attr_value(&mut self) -> Result<String> {
        let start = self.pos;
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let raw = self.take_while(|c| c != quote);
                if !self.eat(quote) {
                    return Err(self.error_at(start, "unterminated JSX attribute string"));
                }
                Ok(string_literal(&decode_entities(&raw)))
            }
            Some('{') => {
                self.pos += 1;
                let expr = self.javascript(Stop::Brace)?;
                if is_empty_expression(&expr) {
                    return Err(self.error_at(
                        start,
                        "JSX attributes must only be assigned a non-empty expression",
                    ));
                }
                Ok(expression(&expr))
            }
            Some('<') => self.element(),
            _ => Err(self.error("expected JSX attribute value")),
        }
    }

    /// Parse children up to the closing tag for `name` ("" for fragments).
    fn children(&mut self, open: usize, name: &str) -> Result<Vec<String>> {
        let mut children = Vec::new();
        let mut text = String::new();

        loop {
            match self.peek() {
                None => {
                    return Err(self.error_at(open, format!("unterminated JSX contents for <{}>", name)));
                }
                Some('<') => {
                    let close_start = self.pos;
                    let mut lookahead = self.pos + 1;
                    while self.chars.get(lookahead).is_some_and(|c| c.is_whitespace()) {
                        lookahead += 1;
                    }

                    if self.chars.get(lookahead) == Some(&'/') {
                        push_text(&mut text, &mut children);
                        self.pos = lookahead + 1;
                        self.skip_whitespace();
                        let closing = if self.peek() == Some('>') {
                            String::new()
                        } else {
                            self.tag_name()?
                        };
                        self.skip_whitespace();
                        self.expect('>')?;
                        if closing != name {
                            return Err(self.error_at(
                                close_start,
                                format!("expected corresponding JSX closing tag for <{}>", name),
                            ));
                        }
                        return Ok(children);
                    }

                    push_text(&mut text, &mut children);
                    children.push(self.element()?);
                }
                Some('{') => {
                    push_text(&mut text, &mut children);
                    self.pos += 1;
                    let expr = self.javascript(Stop::Brace)?;
                    if !is_empty_expression(&expr) {
                        children.push(expression(&expr));
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Lowercase names are host elements; everything else is a reference.
fn tag_expression(name: &str) -> String {
    let first = name.chars().next().unwrap_or('a');
    if name.contains('.') || first.is_uppercase() || first == '_' || first == '$' {
        name.to_string()
    } else {
        string_literal(name)
    }
}

fn props(attrs: &[Attr]) -> String {
    if attrs.is_empty() {
        return "null".to_string();
    }

    let mut segments: Vec<String> = Vec::new();
    let mut named: Vec<String> = Vec::new();
    let has_spread = attrs.iter().any(|a| matches!(a, Attr::Spread(_)));

    for attr in attrs {
        match attr {
            Attr::Named(key, value) => named.push(format!("{}: {}", string_literal(key), value)),
            Attr::Spread(expr) => {
                if !named.is_empty() {
                    segments.push(format!("{{{}}}", named.join(", ")));
                    named.clear();
                }
                segments.push(expr.clone());
            }
        }
    }
    if !named.is_empty() {
        segments.push(format!("{{{}}}", named.join(", ")));
    }

    if has_spread {
        format!("Object.assign({{}}, {})", segments.join(", "))
    } else {
        segments.join(", ")
    }
}

fn create_element(tag: &str, props: &str, children: &[String]) -> String {
    if children.is_empty() {
        format!("React.createElement({}, {})", tag, props)
    } else {
        format!("React.createElement({}, {}, {})", tag, props, children.join(", "))
    }
}

/// An embedded expression, kept on its own line if it ends in a line comment.
fn expression(expr: &str) -> String {
    let trimmed = expr.trim();
    if trimmed.contains("//") {
        format!("{}\n", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Whether an expression container holds only whitespace and comments.
fn is_empty_expression(expr: &str) -> bool {
    let mut rest = expr.trim_start();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("/*") {
            match after.find("*/") {
                Some(end) => rest = after[end + 2..].trim_start(),
                None => return true,
            }
        } else if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map_or("", |end| &after[end..]).trim_start();
        } else {
            return false;
        }
    }
    true
}

/// Collapse JSX text whitespace and queue it as a string child.
///
/// Lines are trimmed (except the outer edges of the first and last line),
/// blank lines dropped, and the rest joined with single spaces.
fn push_text(text: &mut String, children: &mut Vec<String>) {
    if text.is_empty() {
        return;
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    let mut collapsed = String::new();

    for (i, line) in lines.iter().enumerate() {
        let mut line = line.trim_end_matches('\r');
        if i != 0 {
            line = line.trim_start();
        }
        if i != last {
            line = line.trim_end();
        }
        if line.is_empty() {
            continue;
        }
        if !collapsed.is_empty() {
            collapsed.push(' ');
        }
        collapsed.push_str(line);
    }

    if !collapsed.is_empty() {
        children.push(string_literal(&decode_entities(&collapsed)));
    }
    text.clear();
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&candidate[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "copy" => Some('©'),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Double-quoted JavaScript string literal for `value`.
fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower(source: &str) -> String {
        transform_jsx(source).unwrap()
    }

    #[test]
    fn test_host_element_with_attribute_and_text() {
        assert_eq!(
            lower(r#"<div id="a">hi</div>"#),
            r#"React.createElement("div", {"id": "a"}, "hi")"#
        );
    }

    #[test]
    fn test_component_with_expression_attribute() {
        assert_eq!(
            lower("const el = <App name={user.name} />;"),
            r#"const el = React.createElement(App, {"name": user.name});"#
        );
    }

    #[test]
    fn test_whitespace_between_children_is_dropped() {
        let source = "<ul>\n  <li>one</li>\n  <li>{two}</li>\n</ul>";
        assert_eq!(
            lower(source),
            r#"React.createElement("ul", null, React.createElement("li", null, "one"), React.createElement("li", null, two))"#
        );
    }

    #[test]
    fn test_multiline_text_collapses() {
        assert_eq!(
            lower("<p>\n  Hello\n  world\n</p>"),
            r#"React.createElement("p", null, "Hello world")"#
        );
    }

    #[test]
    fn test_mixed_text_and_expressions() {
        assert_eq!(
            lower("return <p>Hi, {name}!</p>;"),
            r#"return React.createElement("p", null, "Hi, ", name, "!");"#
        );
    }

    #[test]
    fn test_fragment() {
        assert_eq!(
            lower("<><b>x</b></>"),
            r#"React.createElement(React.Fragment, null, React.createElement("b", null, "x"))"#
        );
    }

    #[test]
    fn test_spread_and_boolean_attributes() {
        assert_eq!(
            lower(r#"<div {...props} key="k" />"#),
            r#"React.createElement("div", Object.assign({}, props, {"key": "k"}))"#
        );
        assert_eq!(
            lower("<input disabled />"),
            r#"React.createElement("input", {"disabled": true})"#
        );
    }

    #[test]
    fn test_member_and_hyphenated_names() {
        assert_eq!(lower("<Foo.Bar />"), "React.createElement(Foo.Bar, null)");
        assert_eq!(
            lower(r#"<my-el data-x="1" />"#),
            r#"React.createElement("my-el", {"data-x": "1"})"#
        );
    }

    #[test]
    fn test_jsx_inside_callbacks_and_conditionals() {
        assert_eq!(
            lower("items.map(i => <li key={i}>{i}</li>)"),
            r#"items.map(i => React.createElement("li", {"key": i}, i))"#
        );
        assert_eq!(
            lower("ok ? <a /> : <b />"),
            r#"ok ? React.createElement("a", null) : React.createElement("b", null)"#
        );
        assert_eq!(
            lower("`total: ${<b>1</b>}`"),
            r#"`total: ${React.createElement("b", null, "1")}`"#
        );
    }

    #[test]
    fn test_plain_javascript_is_untouched() {
        let sources = [
            "if (a < b && c > d) { x = a << 2; }",
            "for (let i = 0; i<n; i++) {}",
            r#"const s = "<div>"; const t = '<b>';"#,
            "const r = /<div>[/]/g.test(x);",
            "// <div>\n/* <span> */ y = 1 / 2 / 3;",
            "const o = { a: 1 }; f(o);",
        ];
        for source in sources {
            assert_eq!(lower(source), source);
        }
    }

    #[test]
    fn test_division_after_postfix_update() {
        let sources = [
            r#"let i = 4; let h = i++ / 2; const s = "it/s";"#,
            "let j = 9; const k = j-- / 3 / 1;",
            "arr[0]++ / 2;",
        ];
        for source in sources {
            assert_eq!(lower(source), source);
        }
        assert_eq!(
            lower("let n = 0; ++n; const el = <b>{n}</b>;"),
            r#"let n = 0; ++n; const el = React.createElement("b", null, n);"#
        );
    }

    #[test]
    fn test_regex_after_statement_header() {
        let sources = [
            r#"let x = 1; if (x) /'/.test("'");"#,
            r#"while (f(a)) /"/.exec(s);"#,
            "const q = (a + b) / 2 / (c);",
        ];
        for source in sources {
            assert_eq!(lower(source), source);
        }
        assert_eq!(
            lower("if (ok) <p>yes</p>;"),
            r#"if (ok) React.createElement("p", null, "yes");"#
        );
    }

    #[test]
    fn test_comments_between_attributes() {
        assert_eq!(
            lower(r#"<div /* note */ id="a" // why
  title={t} />"#),
            r#"React.createElement("div", {"id": "a", "title": t})"#
        );
        assert_eq!(
            lower(r#"<p id /* flag */ = "x">hi</p>"#),
            r#"React.createElement("p", {"id": "x"}, "hi")"#
        );
    }

    #[test]
    fn test_entities_and_comments_in_children() {
        assert_eq!(
            lower("<p>a &amp; b &#169;{/* note */}</p>"),
            r#"React.createElement("p", null, "a & b ©")"#
        );
    }

    #[test]
    fn test_nested_jsx_inside_attribute_expression() {
        assert_eq!(
            lower("<Layout header={<h1>T</h1>} />"),
            r#"React.createElement(Layout, {"header": React.createElement("h1", null, "T")})"#
        );
    }

    #[test]
    fn test_mismatched_closing_tag() {
        match transform_jsx("<div>\n  text</span>") {
            Err(Error::Compile { message, line, .. }) => {
                assert!(message.contains("closing tag for <div>"), "{}", message);
                assert_eq!(line, 2);
            }
            other => panic!("expected compile error, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_input() {
        assert!(matches!(transform_jsx("<div>open"), Err(Error::Compile { .. })));
        assert!(matches!(transform_jsx("<div id=\"x"), Err(Error::Compile { .. })));
        assert!(matches!(transform_jsx("<p>{value</p>"), Err(Error::Compile { .. })));
        assert!(matches!(transform_jsx("const s = 'open"), Err(Error::Compile { .. })));
    }

    #[test]
    fn test_error_position() {
        match transform_jsx("x;\n<div attr=5 />") {
            Err(Error::Compile { line, column, .. }) => assert_eq!((line, column), (2, 11)),
            other => panic!("expected compile error, got {:?}", other),
        }
    }

    #[test]
    fn test_string_literal_escaping() {
        assert_eq!(string_literal("a\"b\\c\nd"), r#""a\"b\\c\nd""#);
    }
}
