use json_dns_domain::authority::{render, replace_qname};
use json_dns_domain::{AuthorityTemplate, DomainError, TemplateBindings, TemplateSyntax};

const SOA_LITERAL: &str =
    "{qname} 3600 IN SOA ns1.example.com. admin.example.com. 1 3600 900 604800 86400";

// ── placeholder strategy ───────────────────────────────────────────────────

#[test]
fn test_placeholder_replaces_every_occurrence() {
    let out = replace_qname("{qname} 60 IN CNAME alias.{qname}", "www.example.com.");
    assert_eq!(out, "www.example.com. 60 IN CNAME alias.www.example.com.");
}

#[test]
fn test_placeholder_template_renders_literally() {
    let template = AuthorityTemplate::new(SOA_LITERAL);
    assert_eq!(template.syntax(), TemplateSyntax::Placeholder);

    let out = template.render_for("example.com.").unwrap();
    assert_eq!(
        out,
        "example.com. 3600 IN SOA ns1.example.com. admin.example.com. 1 3600 900 604800 86400"
    );
}

#[test]
fn test_template_without_markers_is_unchanged() {
    let template = AuthorityTemplate::new("example.com. 3600 IN NS ns1.example.com.");
    assert_eq!(
        template.render_for("other.org.").unwrap(),
        "example.com. 3600 IN NS ns1.example.com."
    );
}

// ── directive strategy ─────────────────────────────────────────────────────

#[test]
fn test_directive_template_binds_all_fields() {
    let template =
        AuthorityTemplate::new("{{ .Name }} {{ .Qname }} {{ .Zone }} {{ .Class }} {{ .Type }}");
    assert_eq!(template.syntax(), TemplateSyntax::Directive);

    let out = template.render_for("host.example.com.").unwrap();
    assert_eq!(
        out,
        "host.example.com. host.example.com. host.example.com. IN SOA"
    );
}

#[test]
fn test_zone_is_bound_to_query_name() {
    let bindings = TemplateBindings::for_query("deep.sub.example.com.");
    assert_eq!(bindings.zone, "deep.sub.example.com.");
    assert_eq!(bindings.class, "IN");
    assert_eq!(bindings.record_type, "SOA");
}

#[test]
fn test_directive_template_ignores_brace_placeholder() {
    // A `{{` template goes through the directive engine only.
    let out = render(
        "{{ .Name }} 60 IN TXT \"{qname}\"",
        &TemplateBindings::for_query("a.example."),
    )
    .unwrap();
    assert_eq!(out, "a.example. 60 IN TXT \"{qname}\"");
}

#[test]
fn test_unknown_field_is_execute_error() {
    let err = AuthorityTemplate::new("{{ .Serial }} 60 IN A 192.0.2.1")
        .render_for("a.example.")
        .unwrap_err();
    assert!(matches!(err, DomainError::AuthorityTemplate(_)));
}

#[test]
fn test_unclosed_action_is_parse_error() {
    let err = AuthorityTemplate::new("{{ .Name 60 IN A 192.0.2.1")
        .render_for("a.example.")
        .unwrap_err();
    assert!(matches!(err, DomainError::AuthorityTemplate(_)));
}

#[test]
fn test_stray_close_is_parse_error() {
    let err = AuthorityTemplate::new("{{ .Name }} 60 IN TXT }}")
        .render_for("a.example.")
        .unwrap_err();
    assert!(matches!(err, DomainError::AuthorityTemplate(_)));
}

#[test]
fn test_function_call_action_rejected() {
    let err = AuthorityTemplate::new("{{ printf \"%s\" .Name }} 60 IN A 192.0.2.1")
        .render_for("a.example.")
        .unwrap_err();
    assert!(matches!(err, DomainError::AuthorityTemplate(_)));
}

#[test]
fn test_substitute_qname_skips_directives() {
    let template = AuthorityTemplate::new("{{ .Name }} 3600 IN SOA ns. admin. 1 2 3 4 5");
    assert_eq!(
        template.substitute_qname("example.com."),
        "{{ .Name }} 3600 IN SOA ns. admin. 1 2 3 4 5"
    );
}
