use ghost_export_core::lint::{fix, lint, Fix};
use ghost_export_core::{LintConfig, Rule};
use pretty_assertions::assert_eq;
use std::sync::Once;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn fix_default(markdown: &str) -> String {
    init_logging();
    fix(markdown, &LintConfig::default())
}

#[test]
fn trailing_spaces_are_removed_but_hard_breaks_survive() {
    assert_eq!(fix_default("text   \nmore\n"), "text\nmore\n");
    assert_eq!(fix_default("a  \nb\n"), "a  \nb\n");
}

#[test]
fn headings_get_blank_lines_and_single_spaces() {
    assert_eq!(fix_default("# Title\nText\n"), "# Title\n\nText\n");
    assert_eq!(fix_default("#Title\n"), "# Title\n");
    assert_eq!(fix_default("##   Title\n"), "## Title\n");
    assert_eq!(fix_default("  # Title\n"), "# Title\n");
}

#[test]
fn trailing_heading_punctuation_is_only_fixed_when_enabled() {
    assert_eq!(fix_default("# Done.\n"), "# Done.\n");
    assert_eq!(fix("# Done.\n", &LintConfig::all_rules()), "# Done\n");
    assert!(!LintConfig::default().is_enabled(Rule::NoTrailingPunctuation));
    assert!(LintConfig::all_rules().is_enabled(Rule::NoTrailingPunctuation));
}

#[test]
fn fixes_on_the_same_line_compose() {
    assert_eq!(fix_default("a\tb \n"), "a b\n");
    assert_eq!(fix_default("#\tTitle \n"), "# Title\n");
}

#[test]
fn runs_of_blank_lines_collapse() {
    assert_eq!(fix_default("a\n\n\n\nb\n"), "a\n\nb\n");
}

#[test]
fn fenced_code_is_exempt_except_for_tabs() {
    assert_eq!(
        fix_default("```\n#not a heading   \n\tcode\n```\n"),
        "```\n#not a heading   \n code\n```\n"
    );
}

#[test]
fn fences_and_lists_are_surrounded_by_blank_lines() {
    assert_eq!(
        fix_default("text\n```\ncode\n```\nafter\n"),
        "text\n\n```\ncode\n```\n\nafter\n"
    );
    assert_eq!(fix_default("Intro\n- a\n- b\n"), "Intro\n\n- a\n- b\n");
}

#[test]
fn markers_take_a_single_space() {
    assert_eq!(fix_default("*   item\n"), "* item\n");
    assert_eq!(fix_default(">   quote\n"), "> quote\n");
}

#[test]
fn missing_final_newline_is_appended() {
    assert_eq!(fix_default("text"), "text\n");
}

#[test]
fn unfixable_violations_are_reported_and_left_alone() {
    let source = "# A\n\n### C\n";
    let violations = lint(source, &LintConfig::default());
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule, Rule::HeadingIncrement);
    assert_eq!(violations[0].line, 3);
    assert_eq!(violations[0].fix, None);
    assert_eq!(fix_default(source), source);
}

#[test]
fn fixable_violations_carry_their_fix() {
    let violations = lint("#Title\n", &LintConfig::default());
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule.id(), "MD018");
    assert_eq!(violations[0].fix, Some(Fix::ReplaceLine("# Title".to_string())));
}
