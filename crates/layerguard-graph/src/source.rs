//! Go source scanning
//!
//! A line-oriented scanner, not a parser. It recognises the package clause,
//! imports, type declarations, interface method specs, function headers and
//! package-qualified identifiers, which is all the rules look at. Anything it
//! does not understand is skipped rather than rejected.

use layerguard_core::{Layer, Location};
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashMap};

use crate::package::{
    is_exported, EdgeKind, FunctionDecl, InterfaceDecl, PackageId, PackageRecord, Param, RawReference, TypeRef,
};

/// Longest function header (in lines) the scanner will join
const MAX_HEADER_LINES: usize = 32;

/// Source file scanning errors. These never abort analysis: the package is
/// recorded as unparseable instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("{file}: missing package clause")]
    MissingPackageClause { file: String },

    #[error("{file}: conflicting layer annotations '{first}' and '{second}'")]
    ConflictingAnnotations {
        file: String,
        first: String,
        second: String,
    },
}

/// One import spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Explicit name, including `_` and `.`
    pub alias: Option<String>,
    pub path: String,
    pub line: usize,
}

impl Import {
    /// Name the file uses to qualify identifiers from this import
    pub fn local_name(&self) -> Option<String> {
        match self.alias.as_deref() {
            Some("_") | Some(".") => None,
            Some(alias) => Some(alias.to_string()),
            None => Some(default_import_name(&self.path)),
        }
    }
}

/// Everything extracted from one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileScan {
    pub file: String,
    pub package: String,
    pub annotation: Option<String>,
    pub imports: Vec<Import>,
    pub type_names: Vec<String>,
    pub interfaces: Vec<InterfaceDecl>,
    pub functions: Vec<FunctionDecl>,
    pub references: Vec<RawReference>,
}

/// A file handed to the scanner; `content` is an error message when the
/// file could not be read as UTF-8 text
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub content: Result<String, String>,
}

/// Compiled scanning patterns, shared by all scanning tasks
#[derive(Debug)]
pub struct SourceScanner {
    package_clause: Regex,
    import_single: Regex,
    import_block: Regex,
    import_spec: Regex,
    type_decl: Regex,
    type_block: Regex,
    type_spec: Regex,
    func_start: Regex,
    method_spec: Regex,
    qualified: Regex,
    annotation: Regex,
}

impl Default for SourceScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceScanner {
    pub fn new() -> Self {
        // Literal patterns only.
        let re = |p: &str| Regex::new(p).unwrap_or_else(|e| panic!("invalid scanner pattern {}: {}", p, e));

        Self {
            package_clause: re(r"^\s*package\s+([A-Za-z_]\w*)"),
            import_single: re(r#"^\s*import\s+(?:([A-Za-z_]\w*|\.)\s+)?"([^"]*)""#),
            import_block: re(r"^\s*import\s*\("),
            import_spec: re(r#"^\s*(?:([A-Za-z_]\w*|\.)\s+)?"([^"]*)""#),
            type_decl: re(r"^type\s+([A-Za-z_]\w*)(?:\[[^\]]*\])?\s*(=\s*)?(.*)$"),
            type_block: re(r"^type\s*\(\s*$"),
            type_spec: re(r"^\s+([A-Za-z_]\w*)(?:\[[^\]]*\])?\s+(=\s*)?(.*)$"),
            func_start: re(r"^func[\s(]"),
            method_spec: re(r"^\s*([A-Za-z_]\w*)\s*(\(.*)$"),
            qualified: re(r"(^|[^\w.])([A-Za-z_]\w*)\.([A-Z]\w*)"),
            annotation: re(r"^\s*//\s*layerguard:layer\s+([A-Za-z]+)\s*$"),
        }
    }

    /// Scan every file of one package into a partial record
    pub fn scan_package(&self, id: PackageId, sources: Vec<SourceFile>) -> PackageRecord {
        let files: Vec<String> = sources.iter().map(|s| s.path.clone()).collect();
        let mut scans = Vec::with_capacity(sources.len());

        for source in &sources {
            let content = match &source.content {
                Ok(content) => content,
                Err(e) => {
                    return PackageRecord::unparseable(id, files, format!("{}: {}", source.path, e));
                }
            };

            match self.scan_file(&source.path, content) {
                Ok(scan) => scans.push(scan),
                Err(e) => return PackageRecord::unparseable(id, files, e.to_string()),
            }
        }

        let names: BTreeSet<&str> = scans
            .iter()
            .map(|s| s.package.strip_suffix("_test").unwrap_or(&s.package))
            .collect();
        if names.len() > 1 {
            let names: Vec<&str> = names.into_iter().collect();
            return PackageRecord::unparseable(
                id,
                files,
                format!("files declare different packages: {}", names.join(", ")),
            );
        }

        let annotations: BTreeSet<&str> = scans.iter().filter_map(|s| s.annotation.as_deref()).collect();
        let annotation = match annotations.len() {
            0 => None,
            1 => {
                let name = annotations.iter().next().copied().unwrap_or_default();
                match name.parse::<Layer>() {
                    Ok(layer) => Some(layer),
                    Err(e) => return PackageRecord::unparseable(id, files, format!("layer annotation: {}", e)),
                }
            }
            _ => {
                let names: Vec<&str> = annotations.into_iter().collect();
                return PackageRecord::unparseable(
                    id,
                    files,
                    format!("conflicting layer annotations: {}", names.join(", ")),
                );
            }
        };

        let mut record = PackageRecord {
            id,
            name: names.into_iter().next().unwrap_or_default().to_string(),
            files,
            annotation,
            ..PackageRecord::default()
        };

        for scan in scans {
            record
                .exported_types
                .extend(scan.type_names.into_iter().filter(|n| is_exported(n)));
            record.interfaces.extend(scan.interfaces);
            record.functions.extend(scan.functions);
            record.references.extend(scan.references);
        }

        record
    }

    /// Scan a single file
    pub fn scan_file(&self, file: &str, content: &str) -> Result<FileScan, ScanError> {
        let annotation = self.find_annotation(file, content)?;
        let code = strip_comments(content);
        let lines: Vec<&str> = code.split('\n').map(|l| l.trim_end_matches('\r')).collect();

        let mut package: Option<String> = None;
        let mut imports = Vec::new();
        let mut type_names = Vec::new();
        let mut interfaces = Vec::new();
        let mut functions = Vec::new();
        // (alias, identifier, kind, line)
        let mut qualified_refs: Vec<(String, String, EdgeKind, usize)> = Vec::new();

        let mut depth: i64 = 0;
        let mut in_import_block = false;
        let mut in_type_block = false;
        let mut open_interface: Option<(InterfaceDecl, i64)> = None;

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            let bare = blank_strings(line);

            if in_import_block {
                if let Some(caps) = self.import_spec.captures(line) {
                    imports.push(import_from(&caps, line_no));
                }
                if bare.contains(')') {
                    in_import_block = false;
                }
                continue;
            }

            if let Some((interface, body_depth)) = open_interface.as_mut() {
                if depth == *body_depth {
                    if let Some(method) = self.parse_method_spec(file, &bare, line_no, &interface.name) {
                        interface.methods.push(method);
                    }
                }
            } else if depth == 0 {
                if package.is_none() {
                    if let Some(caps) = self.package_clause.captures(&bare) {
                        package = Some(caps[1].to_string());
                        continue;
                    }
                }

                if self.import_block.is_match(&bare) {
                    in_import_block = true;
                    if let Some(pos) = bare.find('(') {
                        if let Some(caps) = line.get(pos + 1..).and_then(|rest| self.import_spec.captures(rest)) {
                            imports.push(import_from(&caps, line_no));
                        }
                        if bare[pos..].contains(')') {
                            in_import_block = false;
                        }
                    }
                    continue;
                }

                if let Some(caps) = self.import_single.captures(line) {
                    imports.push(import_from(&caps, line_no));
                    continue;
                }

                let type_pattern = if in_type_block { &self.type_spec } else { &self.type_decl };

                if self.type_block.is_match(&bare) {
                    in_type_block = true;
                } else if in_type_block && bare.trim_start().starts_with(')') {
                    in_type_block = false;
                } else if let Some(caps) = type_pattern.captures(&bare) {
                    let name = caps[1].to_string();
                    let is_alias = caps.get(2).is_some();
                    let rest = caps[3].trim_start();

                    if !is_alias && starts_with_keyword(rest, "interface") {
                        open_interface = Some((
                            InterfaceDecl {
                                name: name.clone(),
                                methods: Vec::new(),
                                location: Some(Location::with_line(file, line_no)),
                            },
                            depth + 1,
                        ));
                    }
                    type_names.push(name);
                } else if self.func_start.is_match(&bare) {
                    let header = collect_header(&lines, idx);
                    if let Some(decl) = self.parse_func_header(file, &header, line_no) {
                        functions.push(decl);
                    }
                }
            }

            for caps in self.qualified.captures_iter(&bare) {
                let after = caps.get(0).map_or("", |m| &bare[m.end()..]);
                let kind = if after.trim_start().starts_with('(') {
                    EdgeKind::Call
                } else {
                    EdgeKind::TypeReference
                };
                qualified_refs.push((caps[2].to_string(), caps[3].to_string(), kind, line_no));
            }

            depth = (depth + brace_delta(&bare)).max(0);

            let closed = matches!(&open_interface, Some((_, body_depth)) if depth < *body_depth);
            if closed {
                if let Some((interface, _)) = open_interface.take() {
                    interfaces.push(interface);
                }
            }
        }

        if let Some((interface, _)) = open_interface.take() {
            interfaces.push(interface);
        }

        let package = package.ok_or_else(|| ScanError::MissingPackageClause {
            file: file.to_string(),
        })?;

        let aliases: HashMap<String, String> = imports
            .iter()
            .filter_map(|i| i.local_name().map(|name| (name, i.path.clone())))
            .collect();

        for decl in &mut functions {
            resolve_type_refs(decl, &aliases);
        }
        for interface in &mut interfaces {
            for method in &mut interface.methods {
                resolve_type_refs(method, &aliases);
            }
        }

        let mut references: Vec<RawReference> = imports
            .iter()
            .map(|i| RawReference {
                import_path: i.path.clone(),
                kind: EdgeKind::Import,
                location: Location::with_line(file, i.line),
            })
            .collect();

        references.extend(qualified_refs.into_iter().filter_map(|(alias, _, kind, line)| {
            aliases.get(&alias).map(|path| RawReference {
                import_path: path.clone(),
                kind,
                location: Location::with_line(file, line),
            })
        }));

        Ok(FileScan {
            file: file.to_string(),
            package,
            annotation,
            imports,
            type_names,
            interfaces,
            functions,
            references,
        })
    }

    fn find_annotation(&self, file: &str, content: &str) -> Result<Option<String>, ScanError> {
        let mut found: Option<String> = None;

        for line in content.lines() {
            if let Some(caps) = self.annotation.captures(line) {
                let layer = caps[1].to_ascii_lowercase();
                match &found {
                    Some(first) if *first != layer => {
                        return Err(ScanError::ConflictingAnnotations {
                            file: file.to_string(),
                            first: first.clone(),
                            second: layer,
                        });
                    }
                    _ => found = Some(layer),
                }
            }
        }

        Ok(found)
    }

    /// Parse `func (r *Recv) Name[T any](params) results {`
    fn parse_func_header(&self, file: &str, header: &str, line_no: usize) -> Option<FunctionDecl> {
        let s = header.trim_start().strip_prefix("func")?.trim_start();

        let (receiver, s) = if s.starts_with('(') {
            let (inner, rest) = split_balanced(s, '(', ')')?;
            (receiver_type(inner), rest.trim_start())
        } else {
            (None, s)
        };

        let name_len = s
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(s.len());
        if name_len == 0 {
            return None;
        }
        let name = &s[..name_len];

        let mut rest = s[name_len..].trim_start();
        if rest.starts_with('[') {
            rest = split_balanced(rest, '[', ']')?.1.trim_start();
        }

        let (params, after) = split_balanced(rest, '(', ')')?;
        Some(self.function_decl(name, receiver, params, result_text(after), Location::with_line(file, line_no)))
    }

    /// Parse an interface method spec `Name(params) results`
    fn parse_method_spec(&self, file: &str, bare: &str, line_no: usize, interface: &str) -> Option<FunctionDecl> {
        let caps = self.method_spec.captures(bare)?;
        let (params, after) = split_balanced(caps.get(2)?.as_str(), '(', ')')?;

        Some(self.function_decl(
            &caps[1],
            Some(interface.to_string()),
            params,
            after.trim().to_string(),
            Location::with_line(file, line_no),
        ))
    }

    fn function_decl(
        &self,
        name: &str,
        receiver: Option<String>,
        params: &str,
        results: String,
        location: Location,
    ) -> FunctionDecl {
        let params = parse_params(params);

        // Holds the qualifying alias until the file's imports are resolved.
        let mut type_refs: Vec<TypeRef> = Vec::new();
        let texts = params.iter().map(|p| p.type_text.as_str()).chain(std::iter::once(results.as_str()));
        for text in texts {
            for caps in self.qualified.captures_iter(text) {
                let type_ref = TypeRef {
                    import_path: caps[2].to_string(),
                    name: caps[3].to_string(),
                };
                if !type_refs.contains(&type_ref) {
                    type_refs.push(type_ref);
                }
            }
        }

        FunctionDecl {
            name: name.to_string(),
            receiver,
            params,
            results,
            type_refs,
            location: Some(location),
        }
    }
}

fn import_from(caps: &Captures<'_>, line: usize) -> Import {
    Import {
        alias: caps.get(1).map(|m| m.as_str().to_string()),
        path: caps[2].to_string(),
        line,
    }
}

fn resolve_type_refs(decl: &mut FunctionDecl, aliases: &HashMap<String, String>) {
    decl.type_refs = std::mem::take(&mut decl.type_refs)
        .into_iter()
        .filter_map(|r| {
            aliases.get(&r.import_path).map(|path| TypeRef {
                import_path: path.clone(),
                name: r.name,
            })
        })
        .collect();
}

/// Package name Go infers for an import path without an explicit alias.
///
/// Handles major-version suffixes (`/v2`) and gopkg.in style (`yaml.v3`).
/// Paths whose package name differs from the last element (`go-redis`) are
/// not recognised; their qualified references are missed, the import edge
/// itself is still recorded.
pub fn default_import_name(path: &str) -> String {
    let mut parts = path.rsplit('/');
    let last = parts.next().unwrap_or(path);

    let is_major = last.len() > 1 && last.starts_with('v') && last[1..].chars().all(|c| c.is_ascii_digit());
    let base = if is_major { parts.next().unwrap_or(last) } else { last };

    match base.rsplit_once(".v") {
        Some((head, tail)) if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) => head.to_string(),
        _ => base.to_string(),
    }
}

fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    text.strip_prefix(keyword)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
}

fn brace_delta(bare: &str) -> i64 {
    bare.chars().fold(0, |acc, ch| match ch {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

/// Join the lines of a function header until its parentheses balance
fn collect_header(lines: &[&str], start: usize) -> String {
    let mut header = String::new();
    let mut balance: i64 = 0;

    for line in lines.iter().skip(start).take(MAX_HEADER_LINES) {
        let bare = blank_strings(line);
        for ch in bare.chars() {
            match ch {
                '(' => balance += 1,
                ')' => balance -= 1,
                _ => {}
            }
        }
        header.push_str(&bare);
        header.push(' ');
        if balance <= 0 {
            break;
        }
    }

    header
}

/// Split `(inner)rest`, honouring nesting of the same bracket kind
fn split_balanced(s: &str, open: char, close: char) -> Option<(&str, &str)> {
    if !s.starts_with(open) {
        return None;
    }

    let mut depth = 0usize;
    for (i, ch) in s.char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                return Some((&s[open.len_utf8()..i], &s[i + close.len_utf8()..]));
            }
        }
    }

    None
}

fn receiver_type(inner: &str) -> Option<String> {
    let ty = inner.split_whitespace().last()?.trim_start_matches('*');
    let ty = ty.split('[').next().unwrap_or(ty);
    if ty.is_empty() {
        None
    } else {
        Some(ty.to_string())
    }
}

/// Everything between the parameter list and the body
fn result_text(after: &str) -> String {
    let mut depth = 0i64;
    for (i, ch) in after.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '{' if depth == 0 => return after[..i].trim().to_string(),
            _ => {}
        }
    }
    after.trim().to_string()
}

fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i64;
    let mut start = 0;

    for (i, ch) in s.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);

    parts
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Parse a Go parameter list, applying the grouping rule (`a, b int`)
fn parse_params(list: &str) -> Vec<Param> {
    let parts: Vec<&str> = split_top_level(list, ',')
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let split: Vec<(Option<&str>, &str)> = parts
        .iter()
        .map(|part| match part.split_once(char::is_whitespace) {
            Some((first, rest)) if is_identifier(first) => (Some(first), rest.trim()),
            _ => (None, *part),
        })
        .collect();

    let named = split.iter().any(|(name, _)| name.is_some());
    if !named {
        return split
            .into_iter()
            .map(|(_, ty)| Param {
                name: None,
                type_text: ty.to_string(),
            })
            .collect();
    }

    // Walk backwards so grouped names pick up the type that follows them.
    let mut params = Vec::with_capacity(split.len());
    let mut carried = String::new();
    for (name, rest) in split.into_iter().rev() {
        match name {
            Some(name) => {
                carried = rest.to_string();
                params.push(Param {
                    name: Some(name.to_string()),
                    type_text: carried.clone(),
                });
            }
            None => params.push(Param {
                name: Some(rest.to_string()),
                type_text: carried.clone(),
            }),
        }
    }
    params.reverse();
    params
}

/// Remove comments, keeping line structure. Interpreted string and rune
/// literals are kept; raw string contents are dropped.
pub fn strip_comments(content: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str,
        RawStr,
        Rune,
    }

    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut state = State::Code;

    while let Some(ch) = chars.next() {
        match state {
            State::Code => match ch {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push(' ');
                    state = State::BlockComment;
                }
                '"' => {
                    out.push(ch);
                    state = State::Str;
                }
                '`' => {
                    out.push(ch);
                    state = State::RawStr;
                }
                '\'' => {
                    out.push(ch);
                    state = State::Rune;
                }
                _ => out.push(ch),
            },
            State::LineComment => {
                if ch == '\n' {
                    out.push('\n');
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                } else if ch == '\n' {
                    out.push('\n');
                }
            }
            State::Str | State::Rune => {
                let quote = if state == State::Str { '"' } else { '\'' };
                out.push(ch);
                if ch == '\\' {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                } else if ch == quote || ch == '\n' {
                    state = State::Code;
                }
            }
            State::RawStr => {
                if ch == '`' {
                    out.push(ch);
                    state = State::Code;
                } else if ch == '\n' {
                    out.push('\n');
                }
            }
        }
    }

    out
}

/// Empty out string and rune literal contents on one comment-free line
pub fn blank_strings(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        match quote {
            None => {
                if matches!(ch, '"' | '\'' | '`') {
                    quote = Some(ch);
                }
                out.push(ch);
            }
            Some(q) => {
                if ch == '\\' && q != '`' {
                    chars.next();
                } else if ch == q {
                    out.push(ch);
                    quote = None;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PRODUCT: &str = r#"// Package catalog holds the product aggregate.
package catalog

import (
	"errors"
	"fmt"
)

// ErrOutOfStock is returned when stock would go negative.
var ErrOutOfStock = errors.New("out of stock: see http://example.com")

type Price struct {
	Amount   int64
	Currency string
}

type Product struct {
	ID    string
	Price Price
	Stock int
}

/* ProductRepository is the output port.
   func fake() {} */
type ProductRepository interface {
	FindByID(ctx context.Context, id string) (*Product, error)
	Save(ctx context.Context, p *Product) error
}

func (p *Product) RemoveStock(n int) error {
	if p.Stock < n {
		return fmt.Errorf("remove %d: %w", n, ErrOutOfStock)
	}
	p.Stock -= n
	return nil
}

func newPrice(amount int64, currency string) Price {
	return Price{Amount: amount, Currency: currency}
}
"#;

    fn scanner() -> SourceScanner {
        SourceScanner::new()
    }

    #[test]
    fn scans_declarations() {
        let scan = scanner().scan_file("domain/catalog/product.go", PRODUCT).unwrap();

        assert_eq!(scan.package, "catalog");
        assert_eq!(
            scan.imports.iter().map(|i| i.path.as_str()).collect::<Vec<_>>(),
            vec!["errors", "fmt"]
        );
        assert_eq!(scan.type_names, vec!["Price", "Product", "ProductRepository"]);
        assert_eq!(scan.interfaces.len(), 1);
        assert_eq!(scan.interfaces[0].name, "ProductRepository");
        assert_eq!(scan.interfaces[0].methods.len(), 2);
        assert_eq!(scan.interfaces[0].methods[0].name, "FindByID");
        assert_eq!(scan.interfaces[0].methods[0].results, "(*Product, error)");

        let names: Vec<String> = scan.functions.iter().map(|f| f.qualified_name()).collect();
        assert_eq!(names, vec!["Product.RemoveStock", "newPrice"]);

        let new_price = &scan.functions[1];
        assert_eq!(new_price.params.len(), 2);
        assert_eq!(new_price.params[0].name.as_deref(), Some("amount"));
        assert_eq!(new_price.params[0].type_text, "int64");
        assert_eq!(new_price.results, "Price");
        assert_eq!(new_price.location, Some(Location::with_line("domain/catalog/product.go", 38)));
    }

    #[test]
    fn references_resolve_through_imports() {
        let scan = scanner().scan_file("domain/catalog/product.go", PRODUCT).unwrap();

        let refs: Vec<(String, EdgeKind, Option<usize>)> = scan
            .references
            .iter()
            .map(|r| (r.import_path.clone(), r.kind, r.location.line))
            .collect();

        // `context` is used but not imported, so it is not a reference.
        assert_eq!(
            refs,
            vec![
                ("errors".to_string(), EdgeKind::Import, Some(5)),
                ("fmt".to_string(), EdgeKind::Import, Some(6)),
                ("errors".to_string(), EdgeKind::Call, Some(10)),
                ("fmt".to_string(), EdgeKind::Call, Some(32)),
            ]
        );
    }

    #[test]
    fn nested_calls_are_each_recorded() {
        let source = r#"package main

import (
	"example.com/shop/interface/out/persistence"
	"example.com/shop/usecase/catalog"
)

func main() {
	svc := catalog.NewService(persistence.NewMemoryStore())
	_ = svc
}
"#;
        let scan = scanner().scan_file("cmd/shop/main.go", source).unwrap();

        let calls: Vec<(&str, Option<usize>)> = scan
            .references
            .iter()
            .filter(|r| r.kind == EdgeKind::Call)
            .map(|r| (r.import_path.as_str(), r.location.line))
            .collect();

        assert_eq!(
            calls,
            vec![
                ("example.com/shop/usecase/catalog", Some(9)),
                ("example.com/shop/interface/out/persistence", Some(9)),
            ]
        );
    }

    #[test]
    fn signature_type_refs_and_aliases() {
        let source = r#"package http

import (
	"context"
	domain "example.com/shop/domain/catalog"
	"example.com/shop/usecase/dto"
	_ "example.com/shop/infrastructure/metrics"
)

type ProductHandler struct{ svc Service }

func (h *ProductHandler) Get(ctx context.Context, id string) (*domain.Product, error) {
	out, err := h.svc.Find(ctx, id)
	return out.ToDomain(), err
}

func (h *ProductHandler) List(
	ctx context.Context,
	filter dto.Filter,
) ([]dto.ProductDTO, error) {
	return nil, nil
}
"#;
        let scan = scanner().scan_file("interface/in/http/handler.go", source).unwrap();

        let get = &scan.functions[0];
        assert_eq!(get.receiver.as_deref(), Some("ProductHandler"));
        assert_eq!(get.first_param_type(), Some("context.Context"));
        assert_eq!(
            get.type_refs,
            vec![
                TypeRef { import_path: "context".to_string(), name: "Context".to_string() },
                TypeRef { import_path: "example.com/shop/domain/catalog".to_string(), name: "Product".to_string() },
            ]
        );

        let list = &scan.functions[1];
        assert_eq!(list.name, "List");
        assert_eq!(list.params.len(), 2);
        assert_eq!(list.results, "([]dto.ProductDTO, error)");
        assert!(list
            .type_refs
            .iter()
            .any(|r| r.import_path == "example.com/shop/usecase/dto" && r.name == "ProductDTO"));

        // Blank imports still produce an import reference.
        assert!(scan
            .references
            .iter()
            .any(|r| r.import_path == "example.com/shop/infrastructure/metrics" && r.kind == EdgeKind::Import));
    }

    #[test]
    fn grouped_and_unnamed_params() {
        let params = parse_params("a, b int, c string");
        assert_eq!(
            params.iter().map(|p| (p.name.clone().unwrap(), p.type_text.as_str())).collect::<Vec<_>>(),
            vec![("a".to_string(), "int"), ("b".to_string(), "int"), ("c".to_string(), "string")]
        );

        let unnamed = parse_params("context.Context, func(a int) error, map[string]int");
        assert!(unnamed.iter().all(|p| p.name.is_none()));
        assert_eq!(unnamed[1].type_text, "func(a int) error");
    }

    #[test]
    fn type_block_and_generics() {
        let source = "package dto\n\ntype (\n\tProductDTO struct {\n\t\tID string\n\t}\n\tLister interface {\n\t\tList() []ProductDTO\n\t}\n\tID = string\n)\n\ntype Page[T any] struct{ Items []T }\n";
        let scan = scanner().scan_file("usecase/dto/dto.go", source).unwrap();

        assert_eq!(scan.type_names, vec!["ProductDTO", "Lister", "ID", "Page"]);
        assert_eq!(scan.interfaces.len(), 1);
        assert_eq!(scan.interfaces[0].methods[0].name, "List");
    }

    #[test]
    fn annotations() {
        let source = "//layerguard:layer usecase\npackage weird\n";
        let scan = scanner().scan_file("lib/weird/a.go", source).unwrap();
        assert_eq!(scan.annotation.as_deref(), Some("usecase"));

        let conflicting = "// layerguard:layer domain\n// layerguard:layer usecase\npackage weird\n";
        assert!(matches!(
            scanner().scan_file("lib/weird/b.go", conflicting),
            Err(ScanError::ConflictingAnnotations { .. })
        ));
    }

    #[test]
    fn unparseable_packages_are_records_not_errors() {
        let s = scanner();

        let missing = s.scan_package(
            "broken".to_string(),
            vec![SourceFile { path: "broken/a.go".to_string(), content: Ok("func main() {}\n".to_string()) }],
        );
        assert!(missing.parse_error.unwrap().contains("missing package clause"));

        let mixed = s.scan_package(
            "mixed".to_string(),
            vec![
                SourceFile { path: "mixed/a.go".to_string(), content: Ok("package a\n".to_string()) },
                SourceFile { path: "mixed/b.go".to_string(), content: Ok("package b\n".to_string()) },
            ],
        );
        assert!(mixed.parse_error.unwrap().contains("different packages"));

        let binary = s.scan_package(
            "bin".to_string(),
            vec![SourceFile { path: "bin/x.go".to_string(), content: Err("not valid UTF-8".to_string()) }],
        );
        assert_eq!(binary.parse_error.as_deref(), Some("bin/x.go: not valid UTF-8"));
        assert_eq!(binary.files, vec!["bin/x.go".to_string()]);
    }

    #[test]
    fn external_test_package_shares_name() {
        let record = scanner().scan_package(
            "domain/catalog".to_string(),
            vec![
                SourceFile { path: "domain/catalog/a.go".to_string(), content: Ok("package catalog\n".to_string()) },
                SourceFile {
                    path: "domain/catalog/a_test.go".to_string(),
                    content: Ok("package catalog_test\n".to_string()),
                },
            ],
        );
        assert_eq!(record.parse_error, None);
        assert_eq!(record.name, "catalog");
    }

    #[test]
    fn import_names() {
        assert_eq!(default_import_name("example.com/shop/domain/catalog"), "catalog");
        assert_eq!(default_import_name("github.com/jackc/pgx/v5"), "pgx");
        assert_eq!(default_import_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(default_import_name("fmt"), "fmt");
    }

    #[test]
    fn comment_and_string_handling() {
        let code = strip_comments("a := \"// not a comment\" // comment\nb := `raw\n{` /* x\n y */ c\n");
        assert_eq!(code, "a := \"// not a comment\" \nb := `\n`  \n c\n");
        assert_eq!(blank_strings(r#"x := "a{b}" + 'c' + "q\"{""#), r#"x := "" + '' + """#);
    }
}
