//! Human-readable diagnostics for structured-text sources.

use std::fmt;

use miette::{GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use thiserror::Error;

use super::{Format, Plain};

pub use miette::Severity;

/// A lint finding, located by one-based line and column and by byte span.
///
/// Implements [`miette::Diagnostic`], so it can be rendered with any
/// report handler; the loader uses a plain-text graphical one.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
    pub message: String,
    label: &'static str,
    help: Option<&'static str>,
    span: SourceSpan,
    source_code: NamedSource<String>,
}

impl Diagnostic {
    fn new(
        origin: &str,
        text: &str,
        offset: usize,
        len: usize,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        let (line, column) = line_column(text, offset);
        Self {
            line,
            column,
            severity,
            message: message.into(),
            label: "here",
            help: None,
            span: SourceSpan::new(offset.into(), len.into()),
            source_code: NamedSource::new(origin, text.to_owned()),
        }
    }

    fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    /// Byte span of the finding in the linted text.
    pub fn span(&self) -> SourceSpan {
        self.span
    }

    /// Name of the linted source, such as a path or `<text>`.
    pub fn origin(&self) -> &str {
        self.source_code.name()
    }
}

impl miette::Diagnostic for Diagnostic {
    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .map(|help| Box::new(help) as Box<dyn fmt::Display + 'a>)
    }

    fn labels<'a>(&'a self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + 'a>> {
        let label = LabeledSpan::new_primary_with_span(Some(self.label.to_owned()), self.span);
        Some(Box::new(std::iter::once(label)))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.source_code)
    }
}

/// Lints `text`, reporting layout problems and the first syntax error.
///
/// `origin` names the source in rendered reports.
pub fn lint(origin: &str, text: &str, format: Format) -> Vec<Diagnostic> {
    let mut findings = Vec::new();

    let mut line_start = 0;
    for line in text.split_inclusive('\n') {
        let body = line.trim_end_matches(['\n', '\r']);
        let indent_len = body.len() - body.trim_start().len();
        if format == Format::Yaml {
            if let Some(tab) = body[..indent_len].find('\t') {
                findings.push(
                    Diagnostic::new(
                        origin,
                        text,
                        line_start + tab,
                        1,
                        Severity::Warning,
                        "tab character used for indentation",
                    )
                    .with_label("tab")
                    .with_help("indent with spaces"),
                );
            }
        }
        let content_len = body.trim_end().len();
        if content_len < body.len() && content_len > 0 {
            findings.push(
                Diagnostic::new(
                    origin,
                    text,
                    line_start + content_len,
                    body.len() - content_len,
                    Severity::Warning,
                    "trailing spaces",
                )
                .with_label("trailing"),
            );
        }
        line_start += line.len();
    }

    if let Some(error) = syntax_error(origin, text, format) {
        findings.push(error);
    }

    findings.sort_by_key(|d| (d.line, d.column));
    findings
}

fn syntax_error(origin: &str, text: &str, format: Format) -> Option<Diagnostic> {
    let (offset, message) = match format {
        Format::Yaml => {
            let err = serde_yaml::from_str::<Plain>(text).err()?;
            let offset = err
                .location()
                .map_or(0, |loc| offset_of(text, loc.line(), loc.column()));
            (offset, err.to_string())
        }
        Format::Toml => {
            let err = toml::from_str::<Plain>(text).err()?;
            let offset = err.span().map_or(0, |span| span.start);
            (offset, err.message().to_owned())
        }
    };
    let offset = offset.min(text.len());
    let len = text
        .get(offset..)
        .and_then(|rest| rest.chars().next())
        .map_or(0, char::len_utf8);
    Some(Diagnostic::new(origin, text, offset, len, Severity::Error, message).with_label("syntax error"))
}

/// One-based line and column of a byte offset.
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = text.get(..offset).unwrap_or(text);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map_or(0, |tail| tail.chars().count())
        + 1;
    (line, column)
}

/// Byte offset of a one-based line and column; clamps to the end of `text`.
fn offset_of(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    text[line_start..]
        .char_indices()
        .nth(column.saturating_sub(1))
        .map_or(text.len(), |(idx, _)| line_start + idx)
}

/// Renders every finding as a plain-text report and returns its lines.
pub(crate) fn render(findings: &[Diagnostic]) -> Vec<String> {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::none())
        .with_links(false)
        .with_width(120);
    let mut lines = Vec::new();
    for finding in findings {
        let mut report = String::new();
        if handler.render_report(&mut report, finding).is_err() {
            report = format!("{}:{}:{}: {finding}", finding.origin(), finding.line, finding.column);
        }
        lines.extend(
            report
                .lines()
                .map(str::trim_end)
                .filter(|line| !line.is_empty())
                .map(str::to_owned),
        );
    }
    lines
}
