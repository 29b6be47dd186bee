//! Tool output parsers.
//!
//! Every parser turns one command's output into [`Finding`]s with absolute
//! paths. Relative paths in tool output are resolved against the repository
//! root the tool ran in.

use std::path::{Path, PathBuf};

use gatekeep_core::command::CommandResult;
use gatekeep_core::{Engine, Finding, Severity, ToolExecutionError};
use regex::Regex;
use serde::Deserialize;

use crate::tool::{OutputFormat, ToolSpec};

/// `file:line:col: message [Severity/rule]`
const UNIX_PATTERN: &str =
    r"^(?P<file>[^:]+):(?P<line>\d+):(?P<col>\d+):\s*(?P<msg>.*?)(?:\s*\[(?P<sev>[A-Za-z]+)/(?P<rule>[^\]]+)\])?\s*$";

/// `file(line,col): error TS2322: message`
const TSC_PATTERN: &str =
    r"^(?P<file>.+?)\((?P<line>\d+),(?P<col>\d+)\):\s*(?P<sev>error|warning|message)\s+(?P<rule>TS\d+):\s*(?P<msg>.*)$";

fn malformed(spec: &ToolSpec, reason: impl Into<String>) -> ToolExecutionError {
    ToolExecutionError::MalformedOutput {
        tool: spec.name.clone(),
        reason: reason.into(),
    }
}

fn compile(spec: &ToolSpec, pattern: &str) -> Result<Regex, ToolExecutionError> {
    Regex::new(pattern).map_err(|e| malformed(spec, e.to_string()))
}

fn resolve(root: &Path, file: &str) -> PathBuf {
    let path = Path::new(file.trim());
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn severity_from(text: &str) -> Severity {
    match text.to_ascii_lowercase().as_str() {
        "error" | "fatal" => Severity::Error,
        "warning" | "warn" => Severity::Warning,
        _ => Severity::Info,
    }
}

/// Severity for a finding whose tool gave none.
fn default_severity(engine: Engine) -> Severity {
    match engine {
        Engine::Format => Severity::Warning,
        Engine::Lint | Engine::Typecheck => Severity::Error,
    }
}

/// Parse `result` according to the tool's output format.
///
/// Only findings for `files` are returned.
pub fn parse_output(
    spec: &ToolSpec,
    root: &Path,
    files: &[PathBuf],
    result: &CommandResult,
) -> Result<Vec<Finding>, ToolExecutionError> {
    let findings = match spec.output {
        OutputFormat::ExitStatus => parse_exit_status(spec, root, files, result),
        OutputFormat::Unix => parse_unix(spec, root, &combined(result))?,
        OutputFormat::Tsc => parse_tsc(spec, root, &combined(result))?,
        OutputFormat::Json => parse_json(spec, root, &result.stdout)?,
    };

    Ok(findings
        .into_iter()
        .filter(|finding| files.iter().any(|file| finding.is_for(file)))
        .collect())
}

fn combined(result: &CommandResult) -> String {
    format!("{}\n{}", result.stdout, result.stderr)
}

/// One finding per file the output mentions, or per input file when the
/// output names none.
pub fn parse_exit_status(
    spec: &ToolSpec,
    root: &Path,
    files: &[PathBuf],
    result: &CommandResult,
) -> Vec<Finding> {
    if result.success {
        return Vec::new();
    }

    let output = combined(result);
    let names = |file: &Path| -> [String; 2] {
        let relative = file.strip_prefix(root).unwrap_or(file);
        [
            file.to_string_lossy().into_owned(),
            relative.to_string_lossy().into_owned(),
        ]
    };
    let mentioned: Vec<&PathBuf> = files
        .iter()
        .filter(|file| names(file.as_path()).iter().any(|name| output.contains(name.as_str())))
        .collect();
    let targets = if mentioned.is_empty() {
        files.iter().collect()
    } else {
        mentioned
    };

    let message = output
        .lines()
        .map(str::trim)
        .find(|line| {
            !line.is_empty()
                && !files
                    .iter()
                    .any(|f| names(f.as_path()).iter().any(|name| line.ends_with(name.as_str())))
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} reported a problem", spec.name));

    targets
        .into_iter()
        .map(|file| {
            Finding::new(
                spec.engine,
                default_severity(spec.engine),
                file.clone(),
                1,
                1,
                message.clone(),
            )
            .with_rule(spec.name.clone())
        })
        .collect()
}

pub fn parse_unix(
    spec: &ToolSpec,
    root: &Path,
    output: &str,
) -> Result<Vec<Finding>, ToolExecutionError> {
    let re = compile(spec, UNIX_PATTERN)?;
    let mut findings = Vec::new();

    for line in output.lines() {
        let Some(caps) = re.captures(line.trim_end()) else {
            continue;
        };
        let severity = caps
            .name("sev")
            .map(|m| severity_from(m.as_str()))
            .unwrap_or_else(|| default_severity(spec.engine));
        let mut finding = Finding::new(
            spec.engine,
            severity,
            resolve(root, &caps["file"]),
            caps["line"].parse().unwrap_or(1),
            caps["col"].parse().unwrap_or(1),
            caps["msg"].trim(),
        );
        if let Some(rule) = caps.name("rule") {
            finding = finding.with_rule(rule.as_str());
        }
        findings.push(finding);
    }

    Ok(findings)
}

pub fn parse_tsc(
    spec: &ToolSpec,
    root: &Path,
    output: &str,
) -> Result<Vec<Finding>, ToolExecutionError> {
    let re = compile(spec, TSC_PATTERN)?;
    Ok(output
        .lines()
        .filter_map(|line| re.captures(line.trim_end()))
        .map(|caps| {
            Finding::new(
                spec.engine,
                severity_from(&caps["sev"]),
                resolve(root, &caps["file"]),
                caps["line"].parse().unwrap_or(1),
                caps["col"].parse().unwrap_or(1),
                caps["msg"].trim(),
            )
            .with_rule(&caps["rule"])
        })
        .collect())
}

/// A finding as custom tools report it; engine and severity are optional.
#[derive(Debug, Deserialize)]
struct ReportedFinding {
    file: String,
    #[serde(default = "first")]
    line: u32,
    #[serde(default = "first", alias = "column")]
    col: u32,
    #[serde(default)]
    end_line: Option<u32>,
    #[serde(default, alias = "end_column")]
    end_col: Option<u32>,
    #[serde(default)]
    engine: Option<Engine>,
    #[serde(default)]
    severity: Option<Severity>,
    #[serde(default, alias = "rule")]
    rule_id: Option<String>,
    message: String,
    #[serde(default)]
    suggestion: Option<String>,
}

fn first() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonReport {
    Bare(Vec<ReportedFinding>),
    Wrapped { findings: Vec<ReportedFinding> },
}

pub fn parse_json(
    spec: &ToolSpec,
    root: &Path,
    stdout: &str,
) -> Result<Vec<Finding>, ToolExecutionError> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }

    let report: JsonReport =
        serde_json::from_str(stdout).map_err(|e| malformed(spec, format!("invalid JSON: {e}")))?;
    let reported = match report {
        JsonReport::Bare(findings) | JsonReport::Wrapped { findings } => findings,
    };

    Ok(reported
        .into_iter()
        .map(|r| {
            let engine = r.engine.unwrap_or(spec.engine);
            Finding {
                file: resolve(root, &r.file),
                line: r.line,
                col: r.col,
                end_line: r.end_line,
                end_col: r.end_col,
                engine,
                severity: r.severity.unwrap_or_else(|| default_severity(engine)),
                rule_id: r.rule_id,
                message: r.message,
                suggestion: r.suggestion,
            }
        })
        .collect())
}
