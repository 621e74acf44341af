//! Indentation-based template compiler.
//!
//! Supports the static part of the Pug syntax: tags with `.class#id`
//! shorthand and `(attr="value")` lists, inline/piped/dotted text,
//! `tag: child` expansion, `= "literal"` output, comments and includes.
//! There is no expression evaluation; attribute values and `=` output must
//! be string literals.
//!
//! ```text
//! doctype html                 <!DOCTYPE html>
//! html(lang="en")              <html lang="en">
//!   body                         <body>
//!     h1.title Hello               <h1 class="title">Hello</h1>
//!                                </body>
//!                              </html>
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use super::TemplateError;
use crate::utils::html::{escape, escape_attr, is_void_element};

/// Compile a template file to pretty-printed HTML.
pub fn compile_file(path: &Path) -> Result<String, TemplateError> {
    let source = fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    compile_str(&source, path)
}

/// Compile template source. `path` anchors includes and error messages.
pub fn compile_str(source: &str, path: &Path) -> Result<String, TemplateError> {
    let mut compiler = Compiler {
        stack: vec![path.to_path_buf()],
    };
    let nodes = compiler.parse_source(path, source)?;

    let mut out = String::new();
    for node in &nodes {
        render_node(node, 0, &mut out);
    }
    Ok(out)
}

// ============================================================================
// Tree
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Doctype(String),
    Element(Element),
    Text(String),
    Comment(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Element {
    tag: String,
    /// `None` value = boolean attribute.
    attrs: Vec<(String, Option<String>)>,
    children: Vec<Node>,
    self_closing: bool,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    fn add_class(&mut self, class: &str) {
        match self.attrs.iter_mut().find(|(name, _)| name == "class") {
            Some((_, Some(value))) => {
                value.push(' ');
                value.push_str(class);
            }
            Some((_, value)) => *value = Some(class.to_string()),
            None => self.attrs.push(("class".into(), Some(class.to_string()))),
        }
    }

    fn set_attr(&mut self, name: &str, value: Option<String>) {
        if name == "class" {
            if let Some(value) = value {
                self.add_class(&value);
            }
            return;
        }
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }
}

/// What follows the tag head on its line.
enum Tail<'a> {
    None,
    Text(&'a str),
    /// `tag.`: nested lines are plain text.
    Dotted,
    /// `tag: child`
    Expansion(&'a str),
    /// `tag= "literal"` (escaped) or `tag!= "literal"` (raw)
    Output { code: &'a str, raw: bool },
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    indent: usize,
    text: &'a str,
    /// 1-based
    number: usize,
}

impl Line<'_> {
    fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

fn split_lines(source: &str) -> Vec<Line<'_>> {
    source
        .lines()
        .enumerate()
        .map(|(i, raw)| {
            let text = raw.trim_start_matches([' ', '\t']);
            Line {
                indent: raw.len() - text.len(),
                text: text.trim_end(),
                number: i + 1,
            }
        })
        .collect()
}

struct Compiler {
    /// Files currently being parsed, outermost first.
    stack: Vec<PathBuf>,
}

impl Compiler {
    fn parse_source(&mut self, path: &Path, source: &str) -> Result<Vec<Node>, TemplateError> {
        let lines = split_lines(source);
        let mut pos = 0;
        self.parse_block(path, &lines, &mut pos, None)
    }

    /// Parse sibling lines indented deeper than `parent`.
    fn parse_block(
        &mut self,
        path: &Path,
        lines: &[Line<'_>],
        pos: &mut usize,
        parent: Option<usize>,
    ) -> Result<Vec<Node>, TemplateError> {
        let mut nodes = Vec::new();
        let mut block_indent = None;

        while let Some(line) = lines.get(*pos).copied() {
            if line.is_blank() {
                *pos += 1;
                continue;
            }
            if parent.is_some_and(|p| line.indent <= p) {
                break;
            }
            match block_indent {
                None => block_indent = Some(line.indent),
                Some(indent) if indent != line.indent => {
                    return Err(TemplateError::syntax(
                        path,
                        line.number,
                        "inconsistent indentation",
                    ));
                }
                Some(_) => {}
            }
            *pos += 1;
            self.parse_line(path, lines, pos, line, &mut nodes)?;
        }
        Ok(nodes)
    }

    fn parse_line(
        &mut self,
        path: &Path,
        lines: &[Line<'_>],
        pos: &mut usize,
        line: Line<'_>,
        nodes: &mut Vec<Node>,
    ) -> Result<(), TemplateError> {
        let text = line.text;

        if text.starts_with("//-") {
            skip_nested(lines, pos, line.indent);
            return Ok(());
        }

        if let Some(rest) = text.strip_prefix("//") {
            let mut body: Vec<String> = Vec::new();
            if !rest.trim().is_empty() {
                body.push(rest.trim().to_string());
            }
            body.extend(collect_text(lines, pos, line.indent));
            nodes.push(Node::Comment(body));
            return Ok(());
        }

        if let Some(rest) = text.strip_prefix('|') {
            no_nested(path, lines, *pos, line)?;
            nodes.push(Node::Text(rest.strip_prefix(' ').unwrap_or(rest).to_string()));
            return Ok(());
        }

        if text.starts_with('<') {
            nodes.push(Node::Text(text.to_string()));
            nodes.extend(self.parse_block(path, lines, pos, Some(line.indent))?);
            return Ok(());
        }

        let (keyword, arg) = text.split_once(' ').unwrap_or((text, ""));
        match keyword {
            "doctype" => {
                no_nested(path, lines, *pos, line)?;
                nodes.push(Node::Doctype(arg.trim().to_string()));
            }
            "include" => {
                no_nested(path, lines, *pos, line)?;
                nodes.extend(self.include(path, line, arg.trim())?);
            }
            _ => {
                let element = self.parse_element(path, lines, pos, line, text)?;
                nodes.push(Node::Element(element));
            }
        }
        Ok(())
    }

    /// Parse `text` as an element; nested lines become its children.
    fn parse_element(
        &mut self,
        path: &Path,
        lines: &[Line<'_>],
        pos: &mut usize,
        line: Line<'_>,
        text: &str,
    ) -> Result<Element, TemplateError> {
        let (mut element, tail) = parse_tag(path, line.number, text)?;

        match tail {
            Tail::Expansion(rest) => {
                let child = self.parse_element(path, lines, pos, line, rest)?;
                element.children.push(Node::Element(child));
                return Ok(element);
            }
            Tail::Dotted => {
                let body = collect_text(lines, pos, line.indent);
                element.children.extend(body.into_iter().map(Node::Text));
                return Ok(element);
            }
            Tail::Text(inline) => element.children.push(Node::Text(inline.to_string())),
            Tail::Output { code, raw } => {
                let value = parse_string_literal(code).ok_or_else(|| {
                    TemplateError::syntax(
                        path,
                        line.number,
                        format!("expected a string literal after `=`, found `{}`", code.trim()),
                    )
                })?;
                let value = if raw { value } else { escape(&value).into_owned() };
                element.children.push(Node::Text(value));
            }
            Tail::None => {}
        }

        let nested = self.parse_block(path, lines, pos, Some(line.indent))?;
        if !nested.is_empty() && (element.self_closing || is_void_element(&element.tag)) {
            return Err(TemplateError::syntax(
                path,
                line.number,
                format!("`{}` is a void element and cannot have content", element.tag),
            ));
        }
        element.children.extend(nested);
        Ok(element)
    }

    fn include(&mut self, path: &Path, line: Line<'_>, arg: &str) -> Result<Vec<Node>, TemplateError> {
        if arg.is_empty() {
            return Err(TemplateError::syntax(path, line.number, "missing include path"));
        }

        let mut target = path.parent().unwrap_or(Path::new("")).join(arg);
        if target.extension().is_none() {
            target.set_extension("pug");
        }

        let source = fs::read_to_string(&target).map_err(|source| TemplateError::Include {
            path: path.to_path_buf(),
            line: line.number,
            include: target.clone(),
            source,
        })?;

        // non-template files are pasted verbatim
        if target.extension().is_some_and(|ext| ext != "pug") {
            return Ok(vec![Node::Text(source.trim_end().to_string())]);
        }

        if self.stack.contains(&target) {
            return Err(TemplateError::IncludeCycle {
                path: path.to_path_buf(),
                line: line.number,
                include: target,
            });
        }

        self.stack.push(target.clone());
        let nodes = self.parse_source(&target, &source);
        self.stack.pop();
        nodes
    }
}

/// Consume lines nested under `indent` without parsing them.
fn skip_nested(lines: &[Line<'_>], pos: &mut usize, indent: usize) {
    while lines
        .get(*pos)
        .is_some_and(|l| l.is_blank() || l.indent > indent)
    {
        *pos += 1;
    }
}

/// Consume lines nested under `indent` as plain text, keeping relative
/// indentation.
fn collect_text(lines: &[Line<'_>], pos: &mut usize, indent: usize) -> Vec<String> {
    let start = *pos;
    skip_nested(lines, pos, indent);
    let block = &lines[start..*pos];

    let base = block
        .iter()
        .filter(|l| !l.is_blank())
        .map(|l| l.indent)
        .min()
        .unwrap_or(0);

    let mut out: Vec<String> = block
        .iter()
        .map(|l| {
            if l.is_blank() {
                String::new()
            } else {
                format!("{}{}", " ".repeat(l.indent - base), l.text)
            }
        })
        .collect();
    while out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    out
}

/// Error if the next non-blank line is nested under `line`.
fn no_nested(path: &Path, lines: &[Line<'_>], pos: usize, line: Line<'_>) -> Result<(), TemplateError> {
    match lines[pos..].iter().find(|l| !l.is_blank()) {
        Some(next) if next.indent > line.indent => Err(TemplateError::syntax(
            path,
            next.number,
            "unexpected nested content",
        )),
        _ => Ok(()),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Parse `tag.class#id(attrs)` and classify the rest of the line.
fn parse_tag<'a>(path: &Path, number: usize, text: &'a str) -> Result<(Element, Tail<'a>), TemplateError> {
    let err = |message: String| TemplateError::syntax(path, number, message);

    let name_end = text.find(|c: char| !is_name_char(c)).unwrap_or(text.len());
    let mut element = match &text[..name_end] {
        "" if text.starts_with(['.', '#']) => Element::new("div"),
        "" => {
            return Err(err(format!(
                "unexpected `{}`",
                text.chars().next().unwrap_or(' ')
            )));
        }
        tag => Element::new(tag),
    };

    let mut rest = &text[name_end..];
    loop {
        if let Some(after) = rest.strip_prefix('.')
            && after.starts_with(is_name_char)
        {
            let end = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());
            element.add_class(&after[..end]);
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('#')
            && after.starts_with(is_name_char)
        {
            let end = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());
            element.set_attr("id", Some(after[..end].to_string()));
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('(') {
            let close = find_closing_paren(after)
                .ok_or_else(|| err("unclosed attribute list".to_string()))?;
            parse_attrs(&after[..close], &mut element).map_err(err)?;
            rest = &after[close + 1..];
        } else {
            break;
        }
    }

    let tail = if rest.is_empty() {
        Tail::None
    } else if rest == "." {
        Tail::Dotted
    } else if rest == "/" {
        element.self_closing = true;
        Tail::None
    } else if let Some(child) = rest.strip_prefix(": ") {
        Tail::Expansion(child.trim_start())
    } else if let Some(code) = rest.strip_prefix("!=") {
        Tail::Output { code, raw: true }
    } else if let Some(code) = rest.strip_prefix('=') {
        Tail::Output { code, raw: false }
    } else if let Some(inline) = rest.strip_prefix(' ') {
        Tail::Text(inline)
    } else {
        return Err(err(format!("unexpected `{rest}` after `{}`", element.tag)));
    };

    Ok((element, tail))
}

/// Index of the `)` closing an attribute list, skipping quoted values.
fn find_closing_paren(s: &str) -> Option<usize> {
    let mut quote = None;
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' | '`' => quote = Some(c),
                '(' => depth += 1,
                ')' if depth == 0 => return Some(i),
                ')' => depth -= 1,
                _ => {}
            },
        }
    }
    None
}

fn parse_attrs(s: &str, element: &mut Element) -> Result<(), String> {
    let mut rest = s;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            return Ok(());
        }

        let name_end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '=' | ',' | '!'))
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        if name.is_empty() {
            let stray = rest.chars().next().unwrap_or_default();
            return Err(format!("unexpected `{stray}` in attribute list"));
        }
        rest = rest[name_end..].trim_start();

        let assigned = rest
            .strip_prefix("!=")
            .or_else(|| rest.strip_prefix('='));
        let Some(after) = assigned else {
            element.set_attr(name, None);
            continue;
        };
        let after = after.trim_start();

        let (raw, remaining) = match after.chars().next() {
            Some(q @ ('"' | '\'' | '`')) => {
                let end = closing_quote(&after[1..], q)
                    .ok_or_else(|| format!("unclosed string in attribute `{name}`"))?;
                after.split_at(end + 2)
            }
            _ => {
                let end = after
                    .find(|c: char| c.is_whitespace() || c == ',')
                    .unwrap_or(after.len());
                after.split_at(end)
            }
        };
        rest = remaining;

        if let Some(value) = parse_string_literal(raw) {
            element.set_attr(name, Some(value));
        } else {
            match raw {
                "true" => element.set_attr(name, None),
                "false" | "null" | "undefined" => {}
                number if number.parse::<f64>().is_ok() => {
                    element.set_attr(name, Some(number.to_string()));
                }
                other => {
                    return Err(format!(
                        "attribute `{name}` must be a string literal, found `{other}`"
                    ));
                }
            }
        }
    }
}

/// Byte index of the unescaped `quote` in `s`.
fn closing_quote(s: &str, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some(i);
        }
    }
    None
}

/// `"a\"b"` → `a"b`. Anything that is not exactly one literal is `None`.
fn parse_string_literal(code: &str) -> Option<String> {
    let code = code.trim();
    let quote = code.chars().next().filter(|c| matches!(c, '"' | '\'' | '`'))?;
    let body = &code[1..];
    let end = closing_quote(body, quote)?;
    if end + 1 != body.len() {
        return None;
    }

    let mut out = String::with_capacity(end);
    let mut chars = body[..end].chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Some(out)
}

// ============================================================================
// Renderer
// ============================================================================

const INDENT: &str = "  ";

fn doctype(value: &str) -> String {
    match value {
        "" | "html" => "<!DOCTYPE html>".to_string(),
        "xml" => r#"<?xml version="1.0" encoding="utf-8" ?>"#.to_string(),
        other => format!("<!DOCTYPE {other}>"),
    }
}

fn open_tag(element: &Element) -> String {
    let mut tag = format!("<{}", element.tag);
    for (name, value) in &element.attrs {
        match value {
            Some(value) => {
                tag.push_str(&format!(" {name}=\"{}\"", escape_attr(value)));
            }
            None => {
                tag.push(' ');
                tag.push_str(name);
            }
        }
    }
    tag.push('>');
    tag
}

fn render_node(node: &Node, depth: usize, out: &mut String) {
    let pad = INDENT.repeat(depth);
    match node {
        Node::Doctype(value) => {
            out.push_str(&format!("{pad}{}\n", doctype(value)));
        }
        Node::Text(text) => {
            for line in text.lines() {
                out.push_str(&format!("{pad}{line}\n"));
            }
        }
        Node::Comment(lines) => match lines.as_slice() {
            [] => out.push_str(&format!("{pad}<!---->\n")),
            [line] => out.push_str(&format!("{pad}<!-- {line} -->\n")),
            lines => {
                out.push_str(&format!("{pad}<!--\n"));
                for line in lines {
                    out.push_str(&format!("{pad}{INDENT}{line}\n"));
                }
                out.push_str(&format!("{pad}-->\n"));
            }
        },
        Node::Element(element) => render_element(element, &pad, depth, out),
    }
}

fn render_element(element: &Element, pad: &str, depth: usize, out: &mut String) {
    let open = open_tag(element);
    if element.self_closing || is_void_element(&element.tag) {
        out.push_str(&format!("{pad}{open}\n"));
        return;
    }

    let close = format!("</{}>", element.tag);

    // whitespace-sensitive content is emitted as written
    if matches!(element.tag.as_str(), "pre" | "textarea") {
        let body: Vec<&str> = element
            .children
            .iter()
            .filter_map(|child| match child {
                Node::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        out.push_str(&format!("{pad}{open}{}{close}\n", body.join("\n")));
        return;
    }

    match element.children.as_slice() {
        [] => out.push_str(&format!("{pad}{open}{close}\n")),
        [Node::Text(text)] if !text.contains('\n') => {
            out.push_str(&format!("{pad}{open}{text}{close}\n"));
        }
        children => {
            out.push_str(&format!("{pad}{open}\n"));
            for child in children {
                render_node(child, depth + 1, out);
            }
            out.push_str(&format!("{pad}{close}\n"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn compile(source: &str) -> String {
        compile_str(source, Path::new("index.pug")).unwrap()
    }

    fn compile_err(source: &str) -> TemplateError {
        compile_str(source, Path::new("index.pug")).unwrap_err()
    }

    #[test]
    fn test_inline_text() {
        assert_eq!(compile("h1 Hello"), "<h1>Hello</h1>\n");
    }

    #[test]
    fn test_document() {
        let source = "\
doctype html
html(lang=\"en\")
  head
    meta(charset=\"utf-8\")
    title Home
  body
    h1 Hello
";
        let expected = "\
<!DOCTYPE html>
<html lang=\"en\">
  <head>
    <meta charset=\"utf-8\">
    <title>Home</title>
  </head>
  <body>
    <h1>Hello</h1>
  </body>
</html>
";
        assert_eq!(compile(source), expected);
    }

    #[test]
    fn test_shorthand_and_attributes() {
        assert_eq!(
            compile("a.btn#go(href=\"/x?a=1&b=2\", target='_blank' class=\"primary\" disabled) Go"),
            "<a class=\"btn primary\" id=\"go\" href=\"/x?a=1&amp;b=2\" target=\"_blank\" disabled>Go</a>\n"
        );
        assert_eq!(compile(".card"), "<div class=\"card\"></div>\n");
        assert_eq!(compile("#main.wide"), "<div id=\"main\" class=\"wide\"></div>\n");
    }

    #[test]
    fn test_attribute_literals() {
        assert_eq!(
            compile("input(type=\"checkbox\" checked=true hidden=false tabindex=2)"),
            "<input type=\"checkbox\" checked tabindex=\"2\">\n"
        );
        assert!(matches!(
            compile_err("a(href=url) x"),
            TemplateError::Syntax { line: 1, .. }
        ));
    }

    #[test]
    fn test_piped_and_dotted_text() {
        let source = "\
p
  | first
  | second
script.
  if (a) {
    go();
  }
";
        let expected = "\
<p>
  first
  second
</p>
<script>
  if (a) {
    go();
  }
</script>
";
        assert_eq!(compile(source), expected);
    }

    #[test]
    fn test_block_expansion() {
        let expected = "\
<ul>
  <li>
    <a href=\"/\">Home</a>
  </li>
</ul>
";
        assert_eq!(compile("ul: li: a(href=\"/\") Home"), expected);
    }

    #[test]
    fn test_output_literal_is_escaped() {
        assert_eq!(compile("p= \"a < b\""), "<p>a &lt; b</p>\n");
        assert_eq!(compile("p!= '<b>bold</b>'"), "<p><b>bold</b></p>\n");
        assert!(matches!(compile_err("p= user.name"), TemplateError::Syntax { .. }));
    }

    #[test]
    fn test_comments() {
        let source = "\
// visible
//- hidden
  p also hidden
p shown
";
        assert_eq!(compile(source), "<!-- visible -->\n<p>shown</p>\n");
    }

    #[test]
    fn test_literal_html_line() {
        assert_eq!(
            compile("div\n  <span>raw</span>"),
            "<div><span>raw</span></div>\n"
        );
        assert_eq!(
            compile("<section>\np inside\n</section>"),
            "<section>\n<p>inside</p>\n</section>\n"
        );
    }

    #[test]
    fn test_pre_keeps_content() {
        assert_eq!(
            compile("pre.\n  line one\n    line two"),
            "<pre>line one\n  line two</pre>\n"
        );
    }

    #[test]
    fn test_indentation_errors() {
        let err = compile_err("div\n    p a\n  p b");
        assert!(matches!(err, TemplateError::Syntax { line: 3, .. }), "{err}");
        assert!(err.to_string().starts_with("index.pug:3:"));

        let err = compile_err("| text\n  p nested");
        assert!(matches!(err, TemplateError::Syntax { line: 2, .. }));

        let err = compile_err("img\n  p child");
        assert!(matches!(err, TemplateError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_stray_attribute_punctuation() {
        for source in ["a(!x) hi", "a(x!y) hi", "a(=x) hi", "a(href=\"/\", !) hi"] {
            let (tx, rx) = std::sync::mpsc::channel();
            std::thread::spawn(move || {
                let _ = tx.send(compile_str(source, Path::new("index.pug")));
            });
            let result = rx
                .recv_timeout(std::time::Duration::from_secs(5))
                .unwrap_or_else(|_| panic!("`{source}` did not finish"));
            match result {
                Err(TemplateError::Syntax { line: 1, message, .. }) => {
                    assert!(message.contains("in attribute list"), "{source}: {message}");
                }
                other => panic!("`{source}`: expected a syntax error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unclosed_attributes() {
        let err = compile_err("body\n  a(href=\"/\" Home");
        assert!(matches!(err, TemplateError::Syntax { line: 2, .. }));
    }

    #[test]
    fn test_include() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_nav.pug"), "nav\n  a(href=\"/\") Home\n").unwrap();
        fs::write(dir.path().join("banner.html"), "<div>banner</div>\n").unwrap();
        let index = dir.path().join("index.pug");
        fs::write(&index, "body\n  include _nav\n  include banner.html\n").unwrap();

        let expected = "\
<body>
  <nav>
    <a href=\"/\">Home</a>
  </nav>
  <div>banner</div>
</body>
";
        assert_eq!(compile_file(&index).unwrap(), expected);
    }

    #[test]
    fn test_missing_include() {
        let dir = TempDir::new().unwrap();
        let index = dir.path().join("index.pug");
        fs::write(&index, "body\n  include missing\n").unwrap();
        let err = compile_file(&index).unwrap_err();
        assert!(matches!(err, TemplateError::Include { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_include_cycle() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pug"), "include b\n").unwrap();
        fs::write(dir.path().join("b.pug"), "include a\n").unwrap();
        let err = compile_file(&dir.path().join("a.pug")).unwrap_err();
        assert!(matches!(err, TemplateError::IncludeCycle { .. }), "{err}");
    }
}
