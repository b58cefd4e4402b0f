//! Allure `environment.properties` reconciliation
//!
//! Parallel workers each append their own facts to the environment file, so
//! it accumulates duplicate keys (and spelling variants such as
//! `BrowserVersionChromium`). The reconciler collapses them:
//!
//! 1. Parse `key=value` / `key:value` lines; comments and blanks pass through
//! 2. Map each key to a canonical name through an ordered rule table
//! 3. Bucket values per canonical key and pick one with the key's policy
//! 4. Emit each canonical key once, at the position it was first seen
//! 5. Back up the original, then write the result in its place

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// File name Allure reads environment facts from
pub const ENVIRONMENT_FILE: &str = "environment.properties";

/// Canonical key for browser version variants
pub const BROWSER_VERSION_KEY: &str = "BrowserVersion";

static BROWSER_VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^BrowserVersion.*").expect("browser version pattern compiles"));

static VERSION_COMPONENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)*").expect("version pattern compiles"));

/// A parsed `key<sep>value` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub separator: char,
    pub value: String,
}

/// Parse one raw line. `None` means the line is kept verbatim.
pub fn parse_line(line: &str) -> Option<Entry> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
        return None;
    }

    let sep_idx = line.find(|c: char| c == '=' || c == ':')?;
    let key = line[..sep_idx].trim();
    if key.is_empty() {
        return None;
    }

    let separator = line[sep_idx..].chars().next()?;
    Some(Entry {
        key: key.to_string(),
        separator,
        value: line[sep_idx + separator.len_utf8()..].to_string(),
    })
}

/// Maps raw keys matching `pattern` to `canonical`
#[derive(Debug, Clone)]
pub struct NormalizationRule {
    pattern: Regex,
    canonical: String,
}

impl NormalizationRule {
    pub fn new(pattern: &str, canonical: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::InvalidConfig(format!("bad normalization pattern {:?}: {}", pattern, e)))?;
        Ok(Self {
            pattern,
            canonical: canonical.into(),
        })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.pattern.is_match(key)
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

/// Rule table used when none is supplied
pub fn default_rules() -> Vec<NormalizationRule> {
    vec![NormalizationRule {
        pattern: BROWSER_VERSION_PATTERN.clone(),
        canonical: BROWSER_VERSION_KEY.to_string(),
    }]
}

/// How a bucket's surviving value is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    #[default]
    LastWins,
    /// Greatest dotted version wins; ties go to the later value
    MaxVersion,
}

impl SelectionPolicy {
    /// Pick one value; the result is trimmed.
    pub fn select(&self, values: &[String]) -> String {
        let Some(last) = values.last() else {
            return String::new();
        };

        let chosen = match self {
            SelectionPolicy::LastWins => last,
            SelectionPolicy::MaxVersion => {
                let mut best: Option<(Vec<u64>, &String)> = None;
                for value in values {
                    let Some(components) = version_components(value) else {
                        continue;
                    };
                    let replace = match &best {
                        Some((best_components, _)) => {
                            compare_versions(&components, best_components) != std::cmp::Ordering::Less
                        }
                        None => true,
                    };
                    if replace {
                        best = Some((components, value));
                    }
                }
                best.map(|(_, value)| value).unwrap_or(last)
            }
        };
        chosen.trim().to_string()
    }
}

/// Numeric components of the first dotted-number run in `value`.
/// Components too large for `u64` saturate.
pub fn version_components(value: &str) -> Option<Vec<u64>> {
    let run = VERSION_COMPONENTS.find(value)?;
    Some(
        run.as_str()
            .split('.')
            .map(|part| part.parse::<u64>().unwrap_or(u64::MAX))
            .collect(),
    )
}

/// Component-wise comparison, missing components count as zero.
pub fn compare_versions(a: &[u64], b: &[u64]) -> std::cmp::Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(std::cmp::Ordering::Equal)
}

#[derive(Debug, Clone)]
struct Bucket {
    values: Vec<String>,
    separator: char,
}

/// Outcome of reconciling one file
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub path: PathBuf,
    pub backup_path: PathBuf,
    /// Distinct canonical keys in the output
    pub keys: usize,
    /// Entry lines dropped as duplicates
    pub duplicates_removed: usize,
    /// False when the rewrite was refused because the file exists
    pub written: bool,
}

/// Collapses duplicate keys in a properties file
#[derive(Debug, Clone)]
pub struct PropertiesReconciler {
    rules: Vec<NormalizationRule>,
    policies: HashMap<String, SelectionPolicy>,
    overwrite_existing: bool,
}

impl Default for PropertiesReconciler {
    fn default() -> Self {
        let mut policies = HashMap::new();
        policies.insert(BROWSER_VERSION_KEY.to_string(), SelectionPolicy::MaxVersion);
        Self {
            rules: default_rules(),
            policies,
            overwrite_existing: true,
        }
    }
}

impl PropertiesReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rule table. Rules are tried in order.
    pub fn with_rules(mut self, rules: Vec<NormalizationRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_policy(mut self, key: impl Into<String>, policy: SelectionPolicy) -> Self {
        self.policies.insert(key.into(), policy);
        self
    }

    /// When false, the rewrite uses exclusive create and is skipped (with a
    /// warning) if the file is still present.
    pub fn overwrite_existing(mut self, overwrite: bool) -> Self {
        self.overwrite_existing = overwrite;
        self
    }

    pub fn normalize_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.rules
            .iter()
            .find(|rule| rule.matches(key))
            .map(NormalizationRule::canonical)
            .unwrap_or(key)
    }

    fn policy_for(&self, key: &str) -> SelectionPolicy {
        self.policies.get(key).copied().unwrap_or_default()
    }

    /// Reconcile file contents in memory.
    pub fn reconcile_text(&self, input: &str) -> String {
        self.reconcile_lines(input).0
    }

    fn reconcile_lines(&self, input: &str) -> (String, usize, usize) {
        let line_ending = if input.contains("\r\n") { "\r\n" } else { "\n" };
        let lines: Vec<&str> = input
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        let parsed: Vec<Option<Entry>> = lines.iter().map(|line| parse_line(line)).collect();

        let mut order: Vec<String> = Vec::new();
        let mut buckets: HashMap<String, Bucket> = HashMap::new();
        for entry in parsed.iter().flatten() {
            let key = self.normalize_key(&entry.key).to_string();
            let bucket = buckets.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                Bucket {
                    values: Vec::new(),
                    separator: entry.separator,
                }
            });
            bucket.values.push(entry.value.clone());
            bucket.separator = entry.separator;
        }

        let chosen: HashMap<&str, String> = buckets
            .iter()
            .map(|(key, bucket)| (key.as_str(), self.policy_for(key).select(&bucket.values)))
            .collect();

        let mut emitted: Vec<&str> = Vec::new();
        let mut output: Vec<String> = Vec::with_capacity(lines.len());
        let mut dropped = 0;

        for (line, entry) in lines.iter().zip(&parsed) {
            let Some(entry) = entry else {
                output.push((*line).to_string());
                continue;
            };
            let key = self.normalize_key(&entry.key);
            if emitted.contains(&key) {
                dropped += 1;
                continue;
            }
            match (buckets.get(key), chosen.get(key)) {
                (Some(bucket), Some(value)) => {
                    output.push(format_entry(key, bucket.separator, value));
                }
                _ => output.push((*line).to_string()),
            }
            emitted.push(key);
        }

        for key in &order {
            if emitted.contains(&key.as_str()) {
                continue;
            }
            if let (Some(bucket), Some(value)) = (buckets.get(key), chosen.get(key.as_str())) {
                output.push(format_entry(key, bucket.separator, value));
            }
        }

        (output.join(line_ending), order.len(), dropped)
    }

    /// Reconcile the file at `path` in place, keeping a timestamped backup.
    pub fn reconcile(&self, path: &Path) -> Result<ReconcileReport> {
        self.reconcile_at(path, Utc::now())
    }

    /// Like [`reconcile`](Self::reconcile) with an explicit backup timestamp.
    pub fn reconcile_at(&self, path: &Path, now: DateTime<Utc>) -> Result<ReconcileReport> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let raw = std::fs::read_to_string(path)?;
        let (content, keys, duplicates_removed) = self.reconcile_lines(&raw);
        debug!(
            path = %path.display(),
            keys,
            duplicates_removed,
            "Reconciled environment properties"
        );

        let backup_path = backup_path_for(path, now);
        std::fs::copy(path, &backup_path)?;

        let written = self.write_back(path, &content)?;
        if written {
            info!("Cleaned {} - duplicates collapsed", path.display());
        }
        info!("Backup written to: {}", backup_path.display());

        Ok(ReconcileReport {
            path: path.to_path_buf(),
            backup_path,
            keys,
            duplicates_removed,
            written,
        })
    }

    fn write_back(&self, path: &Path, content: &str) -> Result<bool> {
        if self.overwrite_existing {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            tmp.write_all(content.as_bytes())?;
            let permissions = std::fs::metadata(path)?.permissions();
            std::fs::set_permissions(tmp.path(), permissions)?;
            tmp.persist(path).map_err(|e| Error::Io(e.error))?;
            return Ok(true);
        }

        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                file.write_all(content.as_bytes())?;
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(
                    path = %path.display(),
                    "File exists and overwrite is disabled, reconciled output not written"
                );
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn format_entry(key: &str, separator: char, value: &str) -> String {
    format!("{}{}{}", key, separator, value).trim_end().to_string()
}

/// `<path>.backup.<YYYY-MM-DDTHH-MM-SS-mmm>` next to the original
pub fn backup_path_for(path: &Path, now: DateTime<Utc>) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| ENVIRONMENT_FILE.to_string());
    let stamp = now.format("%Y-%m-%dT%H-%M-%S-%3f");
    path.with_file_name(format!("{}.backup.{}", name, stamp))
}
