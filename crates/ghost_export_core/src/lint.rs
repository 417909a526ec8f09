//! Markdown lint pass restricted to automatic fixes.
//!
//! Rule ids and names follow markdownlint. Every rule reports violations per
//! line and a violation may carry a [`Fix`]. [`fix`] applies only violations
//! that carry one; everything else is left as it is.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

use engine_logging::engine_trace;
use regex::Regex;

static MISSING_SPACE_ATX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})([^#\s])").expect("valid pattern"));
static MULTIPLE_SPACE_ATX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})[ \t]{2,}(\S.*)$").expect("valid pattern"));
static MULTIPLE_SPACE_BLOCKQUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^( {0,3}>) {2,}(\S.*)$").expect("valid pattern"));
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)([*+-]|\d{1,9}[.)])(\s+)(\S.*)$").expect("valid pattern"));

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '。', '，', '；', '：', '！'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    HeadingIncrement,
    NoTrailingSpaces,
    NoHardTabs,
    NoMultipleBlanks,
    NoMissingSpaceAtx,
    NoMultipleSpaceAtx,
    BlanksAroundHeadings,
    HeadingStartLeft,
    NoTrailingPunctuation,
    NoMultipleSpaceBlockquote,
    ListMarkerSpace,
    BlanksAroundFences,
    BlanksAroundLists,
    SingleTrailingNewline,
}

impl Rule {
    pub const ALL: [Rule; 14] = [
        Rule::HeadingIncrement,
        Rule::NoTrailingSpaces,
        Rule::NoHardTabs,
        Rule::NoMultipleBlanks,
        Rule::NoMissingSpaceAtx,
        Rule::NoMultipleSpaceAtx,
        Rule::BlanksAroundHeadings,
        Rule::HeadingStartLeft,
        Rule::NoTrailingPunctuation,
        Rule::NoMultipleSpaceBlockquote,
        Rule::ListMarkerSpace,
        Rule::BlanksAroundFences,
        Rule::BlanksAroundLists,
        Rule::SingleTrailingNewline,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Rule::HeadingIncrement => "MD001",
            Rule::NoTrailingSpaces => "MD009",
            Rule::NoHardTabs => "MD010",
            Rule::NoMultipleBlanks => "MD012",
            Rule::NoMissingSpaceAtx => "MD018",
            Rule::NoMultipleSpaceAtx => "MD019",
            Rule::BlanksAroundHeadings => "MD022",
            Rule::HeadingStartLeft => "MD023",
            Rule::NoTrailingPunctuation => "MD026",
            Rule::NoMultipleSpaceBlockquote => "MD027",
            Rule::ListMarkerSpace => "MD030",
            Rule::BlanksAroundFences => "MD031",
            Rule::BlanksAroundLists => "MD032",
            Rule::SingleTrailingNewline => "MD047",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rule::HeadingIncrement => "heading-increment",
            Rule::NoTrailingSpaces => "no-trailing-spaces",
            Rule::NoHardTabs => "no-hard-tabs",
            Rule::NoMultipleBlanks => "no-multiple-blanks",
            Rule::NoMissingSpaceAtx => "no-missing-space-atx",
            Rule::NoMultipleSpaceAtx => "no-multiple-space-atx",
            Rule::BlanksAroundHeadings => "blanks-around-headings",
            Rule::HeadingStartLeft => "heading-start-left",
            Rule::NoTrailingPunctuation => "no-trailing-punctuation",
            Rule::NoMultipleSpaceBlockquote => "no-multiple-space-blockquote",
            Rule::ListMarkerSpace => "list-marker-space",
            Rule::BlanksAroundFences => "blanks-around-fences",
            Rule::BlanksAroundLists => "blanks-around-lists",
            Rule::SingleTrailingNewline => "single-trailing-newline",
        }
    }

    fn check(self, lines: &[Line<'_>], source: &str) -> Vec<Violation> {
        match self {
            Rule::HeadingIncrement => heading_increment(lines),
            Rule::NoTrailingSpaces => trailing_spaces(lines),
            Rule::NoHardTabs => hard_tabs(lines),
            Rule::NoMultipleBlanks => multiple_blanks(lines),
            Rule::NoMissingSpaceAtx => missing_space_atx(lines),
            Rule::NoMultipleSpaceAtx => per_text_line(lines, self, |text| {
                MULTIPLE_SPACE_ATX
                    .captures(text)
                    .map(|c| format!("{} {}", &c[1], &c[2]))
            }),
            Rule::BlanksAroundHeadings => blanks_around_headings(lines),
            Rule::HeadingStartLeft => heading_start_left(lines),
            Rule::NoTrailingPunctuation => trailing_punctuation(lines),
            Rule::NoMultipleSpaceBlockquote => per_text_line(lines, self, |text| {
                MULTIPLE_SPACE_BLOCKQUOTE
                    .captures(text)
                    .map(|c| format!("{} {}", &c[1], &c[2]))
            }),
            Rule::ListMarkerSpace => per_text_line(lines, self, fix_list_marker_space),
            Rule::BlanksAroundFences => blanks_around_fences(lines),
            Rule::BlanksAroundLists => blanks_around_lists(lines),
            Rule::SingleTrailingNewline => {
                if source.is_empty() || source.ends_with('\n') {
                    Vec::new()
                } else {
                    vec![Violation::fixable(self, lines.len() - 1, Fix::AppendNewline)]
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fix {
    ReplaceLine(String),
    DeleteLine,
    InsertBlankBefore,
    InsertBlankAfter,
    AppendNewline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: Rule,
    /// 1-based line number.
    pub line: usize,
    pub fix: Option<Fix>,
}

impl Violation {
    fn fixable(rule: Rule, index: usize, fix: Fix) -> Self {
        Self {
            rule,
            line: index + 1,
            fix: Some(fix),
        }
    }

    fn unfixable(rule: Rule, index: usize) -> Self {
        Self {
            rule,
            line: index + 1,
            fix: None,
        }
    }
}

/// Which rules run. The default disables `no-trailing-punctuation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintConfig {
    disabled: HashSet<Rule>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self::all_rules().disable(Rule::NoTrailingPunctuation)
    }
}

impl LintConfig {
    pub fn all_rules() -> Self {
        Self {
            disabled: HashSet::new(),
        }
    }

    pub fn disable(mut self, rule: Rule) -> Self {
        self.disabled.insert(rule);
        self
    }

    pub fn is_enabled(&self, rule: Rule) -> bool {
        !self.disabled.contains(&rule)
    }
}

/// Reports every violation of the enabled rules, ordered by line.
pub fn lint(markdown: &str, config: &LintConfig) -> Vec<Violation> {
    let lines = classify_lines(markdown);
    let mut violations: Vec<Violation> = Rule::ALL
        .iter()
        .filter(|rule| config.is_enabled(**rule))
        .flat_map(|rule| rule.check(&lines, markdown))
        .collect();
    violations.sort_by_key(|v| (v.line, v.rule));
    violations
}

/// Upper bound on lint and fix rounds, for rule sets that never settle.
const MAX_FIX_PASSES: usize = 8;

/// Lints `markdown` and applies every available fix, re-linting until no
/// fixable violation is left so that fixes on the same line compose.
pub fn fix(markdown: &str, config: &LintConfig) -> String {
    let mut text = markdown.to_string();
    for pass in 0..MAX_FIX_PASSES {
        let (fixable, unfixable): (Vec<Violation>, Vec<Violation>) = lint(&text, config)
            .into_iter()
            .partition(|v| v.fix.is_some());
        if fixable.is_empty() {
            for v in &unfixable {
                engine_trace!(
                    "{}/{} at line {} has no automatic fix",
                    v.rule.id(),
                    v.rule.name(),
                    v.line
                );
            }
            return text;
        }
        engine_trace!("lint pass {} applies {} fixes", pass + 1, fixable.len());
        text = apply_fixes(&text, &fixable);
    }
    text
}

/// Applies one round of fixes line by line. The first replacement of a line
/// wins; blank line insertions are never doubled.
pub fn apply_fixes(markdown: &str, violations: &[Violation]) -> String {
    let lines: Vec<&str> = markdown.split('\n').collect();
    let mut replacements: HashMap<usize, &str> = HashMap::new();
    let mut deleted: HashSet<usize> = HashSet::new();
    // Gap `i` sits right before line index `i`.
    let mut blank_gaps: BTreeSet<usize> = BTreeSet::new();
    let mut append_newline = false;

    for violation in violations {
        let index = violation.line.saturating_sub(1);
        match &violation.fix {
            None => {}
            Some(Fix::ReplaceLine(text)) => {
                replacements.entry(index).or_insert(text.as_str());
            }
            Some(Fix::DeleteLine) => {
                deleted.insert(index);
            }
            Some(Fix::InsertBlankBefore) => {
                blank_gaps.insert(index);
            }
            Some(Fix::InsertBlankAfter) => {
                blank_gaps.insert(index + 1);
            }
            Some(Fix::AppendNewline) => append_newline = true,
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(lines.len() + blank_gaps.len());
    for (index, line) in lines.iter().enumerate() {
        if blank_gaps.contains(&index) && !line.trim().is_empty() {
            push_blank(&mut out);
        }
        if deleted.contains(&index) {
            continue;
        }
        let text = replacements.get(&index).copied().unwrap_or(*line);
        out.push(text.to_string());
    }
    if blank_gaps.contains(&lines.len()) {
        push_blank(&mut out);
    }

    let mut text = out.join("\n");
    if append_newline && !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn push_blank(out: &mut Vec<String>) {
    if out.last().is_some_and(|last| !last.trim().is_empty()) {
        out.push(String::new());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Text,
    FenceOpen,
    FenceClose,
    Code,
}

#[derive(Debug)]
struct Line<'a> {
    text: &'a str,
    kind: LineKind,
}

impl Line<'_> {
    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn is_text(&self) -> bool {
        self.kind == LineKind::Text
    }
}

fn classify_lines(markdown: &str) -> Vec<Line<'_>> {
    let mut open: Option<(char, usize)> = None;
    markdown
        .split('\n')
        .map(|text| {
            let trimmed = text.trim();
            let kind = match open {
                Some((fence_char, fence_len)) => match fence_run(trimmed) {
                    Some((c, n))
                        if c == fence_char && n >= fence_len && trimmed.chars().all(|x| x == c) =>
                    {
                        open = None;
                        LineKind::FenceClose
                    }
                    _ => LineKind::Code,
                },
                None => match fence_run(trimmed) {
                    Some(run) => {
                        open = Some(run);
                        LineKind::FenceOpen
                    }
                    None => LineKind::Text,
                },
            };
            Line { text, kind }
        })
        .collect()
}

fn fence_run(text: &str) -> Option<(char, usize)> {
    let first = text.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let len = text.chars().take_while(|c| *c == first).count();
    (len >= 3).then_some((first, len))
}

fn heading_level(text: &str) -> Option<usize> {
    let indent = text.len() - text.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &text[indent..];
    let level = rest.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let after = &rest[level..];
    (after.is_empty() || after.starts_with([' ', '\t'])).then_some(level)
}

fn heading_text(text: &str) -> &str {
    text.trim().trim_start_matches('#').trim()
}

fn is_list_item(text: &str) -> bool {
    LIST_MARKER.is_match(text) && !is_thematic_break(text)
}

fn is_thematic_break(text: &str) -> bool {
    let marks: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    marks.len() >= 3
        && matches!(marks[0], '-' | '*' | '_')
        && marks.iter().all(|c| *c == marks[0])
}

fn per_text_line(
    lines: &[Line<'_>],
    rule: Rule,
    fixer: impl Fn(&str) -> Option<String>,
) -> Vec<Violation> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.is_text())
        .filter_map(|(index, line)| {
            fixer(line.text)
                .filter(|fixed| fixed != line.text)
                .map(|fixed| Violation::fixable(rule, index, Fix::ReplaceLine(fixed)))
        })
        .collect()
}

fn fix_list_marker_space(text: &str) -> Option<String> {
    if is_thematic_break(text) {
        return None;
    }
    let caps = LIST_MARKER.captures(text)?;
    if &caps[3] == " " {
        return None;
    }
    Some(format!("{}{} {}", &caps[1], &caps[2], &caps[4]))
}

fn heading_increment(lines: &[Line<'_>]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut previous: Option<usize> = None;
    for (index, line) in lines.iter().enumerate().filter(|(_, l)| l.is_text()) {
        if let Some(level) = heading_level(line.text) {
            if previous.is_some_and(|prev| level > prev + 1) {
                violations.push(Violation::unfixable(Rule::HeadingIncrement, index));
            }
            previous = Some(level);
        }
    }
    violations
}

fn trailing_spaces(lines: &[Line<'_>]) -> Vec<Violation> {
    per_text_line(lines, Rule::NoTrailingSpaces, |text| {
        let trimmed = text.trim_end();
        let trailing = &text[trimmed.len()..];
        // Two spaces after content is a hard line break.
        if trailing.is_empty() || (trailing == "  " && !trimmed.is_empty()) {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn hard_tabs(lines: &[Line<'_>]) -> Vec<Violation> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.text.contains('\t'))
        .map(|(index, line)| {
            Violation::fixable(
                Rule::NoHardTabs,
                index,
                Fix::ReplaceLine(line.text.replace('\t', " ")),
            )
        })
        .collect()
}

fn multiple_blanks(lines: &[Line<'_>]) -> Vec<Violation> {
    lines
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair.iter().all(|l| l.is_text() && l.is_blank()))
        .map(|(index, _)| Violation::fixable(Rule::NoMultipleBlanks, index + 1, Fix::DeleteLine))
        .collect()
}

fn missing_space_atx(lines: &[Line<'_>]) -> Vec<Violation> {
    per_text_line(lines, Rule::NoMissingSpaceAtx, |text| {
        MISSING_SPACE_ATX
            .captures(text)
            .map(|c| format!("{} {}", &c[1], &text[c[1].len()..]))
    })
}

fn blanks_around_headings(lines: &[Line<'_>]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        if !line.is_text() || heading_level(line.text).is_none() {
            continue;
        }
        if index > 0 && !lines[index - 1].is_blank() {
            violations.push(Violation::fixable(
                Rule::BlanksAroundHeadings,
                index,
                Fix::InsertBlankBefore,
            ));
        }
        if lines.get(index + 1).is_some_and(|next| !next.is_blank()) {
            violations.push(Violation::fixable(
                Rule::BlanksAroundHeadings,
                index,
                Fix::InsertBlankAfter,
            ));
        }
    }
    violations
}

fn heading_start_left(lines: &[Line<'_>]) -> Vec<Violation> {
    lines
        .iter()
        .enumerate()
        .filter(|(index, line)| {
            line.is_text()
                && line.text.starts_with(' ')
                && heading_level(line.text).is_some()
                // Indented headings directly under list content belong to the item.
                && (*index == 0 || lines[index - 1].is_blank())
        })
        .map(|(index, line)| {
            Violation::fixable(
                Rule::HeadingStartLeft,
                index,
                Fix::ReplaceLine(line.text.trim_start().to_string()),
            )
        })
        .collect()
}

fn trailing_punctuation(lines: &[Line<'_>]) -> Vec<Violation> {
    per_text_line(lines, Rule::NoTrailingPunctuation, |text| {
        heading_level(text)?;
        let content = heading_text(text);
        if !content.ends_with(TRAILING_PUNCTUATION) {
            return None;
        }
        Some(text.trim_end().trim_end_matches(TRAILING_PUNCTUATION).to_string())
    })
}

fn blanks_around_fences(lines: &[Line<'_>]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        match line.kind {
            LineKind::FenceOpen if index > 0 && !lines[index - 1].is_blank() => {
                violations.push(Violation::fixable(
                    Rule::BlanksAroundFences,
                    index,
                    Fix::InsertBlankBefore,
                ));
            }
            LineKind::FenceClose if lines.get(index + 1).is_some_and(|n| !n.is_blank()) => {
                violations.push(Violation::fixable(
                    Rule::BlanksAroundFences,
                    index,
                    Fix::InsertBlankAfter,
                ));
            }
            _ => {}
        }
    }
    violations
}

fn blanks_around_lists(lines: &[Line<'_>]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (index, line) in lines.iter().enumerate().skip(1) {
        if !line.is_text() || line.text.starts_with(char::is_whitespace) || !is_list_item(line.text)
        {
            continue;
        }
        let previous = &lines[index - 1];
        let continues_list = previous.is_blank()
            || (previous.is_text() && is_list_item(previous.text))
            || previous.text.starts_with(char::is_whitespace);
        if !continues_list {
            violations.push(Violation::fixable(
                Rule::BlanksAroundLists,
                index,
                Fix::InsertBlankBefore,
            ));
        }
    }
    violations
}
