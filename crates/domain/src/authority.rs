//! Authority templates and the text substitution that turns them into
//! resource record lines.
//!
//! Two syntaxes are accepted and sniffed per template:
//!
//! * `Directive`: `{{ .Name }}`-style actions bound to [`TemplateBindings`]
//! * `Placeholder`: plain text where every `{qname}` is replaced literally
//!
//! Both go through [`render`], so callers never pick an engine themselves.

use crate::DomainError;
use fancy_regex::Regex;
use std::sync::LazyLock;

const QNAME_PLACEHOLDER: &str = "{qname}";
const DIRECTIVE_OPEN: &str = "{{";
const DIRECTIVE_CLOSE: &str = "}}";

const TRIM_SPACE: [char; 4] = [' ', '\t', '\r', '\n'];

// `{{- ` and ` -}}` trim the whitespace of the neighbouring text.
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(?:(-)\s)?\s*(.*?)\s*(?:\s(-))?\}\}")
        .expect("directive pattern is a valid regex")
});

static FIELD_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.([A-Za-z][A-Za-z0-9_]*)$").expect("field pattern is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSyntax {
    Directive,
    Placeholder,
}

impl TemplateSyntax {
    pub fn sniff(template: &str) -> Self {
        if template.contains(DIRECTIVE_OPEN) {
            TemplateSyntax::Directive
        } else {
            TemplateSyntax::Placeholder
        }
    }
}

/// Values a directive template may reference.
///
/// `zone` is bound to the query name, not to the apex of the zone the
/// server is authoritative for. Existing templates rely on that binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateBindings {
    pub name: String,
    pub qname: String,
    pub zone: String,
    pub class: String,
    pub record_type: String,
}

impl TemplateBindings {
    pub fn for_query(qname: &str) -> Self {
        Self {
            name: qname.to_string(),
            qname: qname.to_string(),
            zone: qname.to_string(),
            class: "IN".to_string(),
            record_type: "SOA".to_string(),
        }
    }

    pub fn field(&self, field: &str) -> Option<&str> {
        match field {
            "Name" => Some(&self.name),
            "Qname" => Some(&self.qname),
            "Zone" => Some(&self.zone),
            "Class" => Some(&self.class),
            "Type" => Some(&self.record_type),
            _ => None,
        }
    }
}

/// Render `template` with `bindings`, choosing the strategy by syntax sniff.
pub fn render(template: &str, bindings: &TemplateBindings) -> Result<String, DomainError> {
    match TemplateSyntax::sniff(template) {
        TemplateSyntax::Directive => render_directives(template, bindings),
        TemplateSyntax::Placeholder => Ok(replace_qname(template, &bindings.qname)),
    }
}

/// Literal `{qname}` substitution, no directive processing.
pub fn replace_qname(template: &str, qname: &str) -> String {
    template.replace(QNAME_PLACEHOLDER, qname)
}

fn render_directives(template: &str, bindings: &TemplateBindings) -> Result<String, DomainError> {
    let mut rendered = String::with_capacity(template.len() + bindings.qname.len());
    let mut cursor = 0;
    let mut trim_next = false;

    for captures in DIRECTIVE.captures_iter(template) {
        let captures = captures.map_err(|e| DomainError::AuthorityTemplate(e.to_string()))?;
        let (Some(whole), Some(action)) = (captures.get(0), captures.get(2)) else {
            continue;
        };

        let mut literal = &template[cursor..whole.start()];
        check_literal(literal)?;
        if trim_next {
            literal = literal.trim_start_matches(TRIM_SPACE);
        }
        if captures.get(1).is_some() {
            literal = literal.trim_end_matches(TRIM_SPACE);
        }
        rendered.push_str(literal);
        rendered.push_str(resolve_action(action.as_str(), bindings)?);
        trim_next = captures.get(3).is_some();
        cursor = whole.end();
    }

    let mut tail = &template[cursor..];
    check_literal(tail)?;
    if trim_next {
        tail = tail.trim_start_matches(TRIM_SPACE);
    }
    rendered.push_str(tail);
    Ok(rendered)
}

fn resolve_action<'b>(action: &str, bindings: &'b TemplateBindings) -> Result<&'b str, DomainError> {
    if action.is_empty() {
        return Err(DomainError::AuthorityTemplate(
            "missing value for command".to_string(),
        ));
    }

    let field = FIELD_REFERENCE
        .captures(action)
        .map_err(|e| DomainError::AuthorityTemplate(e.to_string()))?
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| {
            DomainError::AuthorityTemplate(format!("unsupported action {{{{{}}}}}", action))
        })?;

    bindings.field(field.as_str()).ok_or_else(|| {
        DomainError::AuthorityTemplate(format!("can't evaluate field {}", field.as_str()))
    })
}

fn check_literal(literal: &str) -> Result<(), DomainError> {
    if literal.contains(DIRECTIVE_OPEN) {
        return Err(DomainError::AuthorityTemplate(
            "unclosed action".to_string(),
        ));
    }
    if literal.contains(DIRECTIVE_CLOSE) {
        return Err(DomainError::AuthorityTemplate(
            "unexpected \"}}\" outside action".to_string(),
        ));
    }
    Ok(())
}

/// A configured authority entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityTemplate {
    source: String,
    syntax: TemplateSyntax,
}

impl AuthorityTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let syntax = TemplateSyntax::sniff(&source);
        Self { source, syntax }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn syntax(&self) -> TemplateSyntax {
        self.syntax
    }

    pub fn render(&self, bindings: &TemplateBindings) -> Result<String, DomainError> {
        render(&self.source, bindings)
    }

    pub fn render_for(&self, qname: &str) -> Result<String, DomainError> {
        self.render(&TemplateBindings::for_query(qname))
    }

    /// `{qname}` replacement only, regardless of syntax.
    pub fn substitute_qname(&self, qname: &str) -> String {
        replace_qname(&self.source, qname)
    }
}
