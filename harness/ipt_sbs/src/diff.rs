//! Line-oriented diff.
//!
//! Computes a longest-common-subsequence edit script between the expected
//! (reference) and actual (candidate) line sequences and groups it into
//! unified-diff hunks.

use std::fmt::Write;

/// Lines of unchanged context kept around each change.
const CONTEXT: usize = 3;

/// Largest LCS table (in cells) computed exactly. Beyond this the changed
/// region is compared position by position.
const MAX_TABLE_CELLS: usize = 4_000_000;

/// One line of a hunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    /// Present in both outputs.
    Same(String),
    /// Only in the expected (reference) output.
    Removed(String),
    /// Only in the actual (candidate) output.
    Added(String),
}

/// A contiguous changed region with surrounding context.
///
/// Line numbers are 1-based. A side with zero lines reports the line after
/// which the change applies, as in unified diff headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hunk {
    pub expected_start: usize,
    pub expected_len: usize,
    pub actual_start: usize,
    pub actual_len: usize,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.expected_start, self.expected_len, self.actual_start, self.actual_len
        )
    }
}

/// Result of diffing two outputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineDiff {
    hunks: Vec<Hunk>,
    first_change: Option<usize>,
}

impl LineDiff {
    /// True when both outputs are line-for-line identical.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// 1-based line number of the first difference.
    ///
    /// Counted in the expected output for removed lines and in the actual
    /// output for added lines.
    pub fn first_changed_line(&self) -> Option<usize> {
        self.first_change
    }

    /// Number of removed plus added lines.
    pub fn changed_lines(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| !matches!(l, DiffLine::Same(_)))
            .count()
    }

    /// Render in unified diff format.
    pub fn render_unified(&self, expected_label: &str, actual_label: &str) -> String {
        if self.hunks.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        let _ = writeln!(out, "--- {expected_label}");
        let _ = writeln!(out, "+++ {actual_label}");
        for hunk in &self.hunks {
            let _ = writeln!(out, "{}", hunk.header());
            for line in &hunk.lines {
                let _ = match line {
                    DiffLine::Same(text) => writeln!(out, " {text}"),
                    DiffLine::Removed(text) => writeln!(out, "-{text}"),
                    DiffLine::Added(text) => writeln!(out, "+{text}"),
                };
            }
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OpKind {
    Equal,
    Delete,
    Insert,
}

/// One edit step, with the positions in each input before the step.
#[derive(Clone, Copy, Debug)]
struct Op {
    kind: OpKind,
    a: usize,
    b: usize,
}

/// Diff `expected` against `actual` line by line.
pub fn line_diff(expected: &str, actual: &str) -> LineDiff {
    let a: Vec<&str> = expected.lines().collect();
    let b: Vec<&str> = actual.lines().collect();
    let ops = edit_script(&a, &b);

    let first_change = ops.iter().find_map(|op| match op.kind {
        OpKind::Equal => None,
        OpKind::Delete => Some(op.a + 1),
        OpKind::Insert => Some(op.b + 1),
    });

    LineDiff {
        hunks: build_hunks(&ops, &a, &b),
        first_change,
    }
}

fn edit_script(a: &[&str], b: &[&str]) -> Vec<Op> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mut ops = Vec::with_capacity(a.len().max(b.len()) + 1);
    for i in 0..prefix {
        ops.push(Op {
            kind: OpKind::Equal,
            a: i,
            b: i,
        });
    }

    let mid_a = &a[prefix..a.len() - suffix];
    let mid_b = &b[prefix..b.len() - suffix];
    if mid_a.len().saturating_mul(mid_b.len()) <= MAX_TABLE_CELLS {
        lcs_script(mid_a, mid_b, prefix, &mut ops);
    } else {
        tracing::debug!(
            expected = mid_a.len(),
            actual = mid_b.len(),
            "changed region too large for LCS, comparing by position"
        );
        positional_script(mid_a, mid_b, prefix, &mut ops);
    }

    for k in 0..suffix {
        ops.push(Op {
            kind: OpKind::Equal,
            a: a.len() - suffix + k,
            b: b.len() - suffix + k,
        });
    }
    ops
}

fn lcs_script(a: &[&str], b: &[&str], offset: usize, ops: &mut Vec<Op>) {
    let (n, m) = (a.len(), b.len());
    let width = m + 1;
    // table[i * width + j] = LCS length of a[i..] and b[j..]
    let mut table = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if a[i] == b[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        let kind = if i < n && j < m && a[i] == b[j] {
            OpKind::Equal
        } else if j == m || (i < n && table[(i + 1) * width + j] >= table[i * width + j + 1]) {
            OpKind::Delete
        } else {
            OpKind::Insert
        };
        ops.push(Op {
            kind,
            a: offset + i,
            b: offset + j,
        });
        match kind {
            OpKind::Equal => {
                i += 1;
                j += 1;
            }
            OpKind::Delete => i += 1,
            OpKind::Insert => j += 1,
        }
    }
}

fn positional_script(a: &[&str], b: &[&str], offset: usize, ops: &mut Vec<Op>) {
    for k in 0..a.len().max(b.len()) {
        let (x, y) = (a.get(k), b.get(k));
        let at = |kind| Op {
            kind,
            a: offset + k.min(a.len()),
            b: offset + k.min(b.len()),
        };
        if x.is_some() && x == y {
            ops.push(at(OpKind::Equal));
            continue;
        }
        if x.is_some() {
            ops.push(at(OpKind::Delete));
        }
        if y.is_some() {
            let mut insert = at(OpKind::Insert);
            insert.a = offset + (k + 1).min(a.len());
            ops.push(insert);
        }
    }
}

fn build_hunks(ops: &[Op], a: &[&str], b: &[&str]) -> Vec<Hunk> {
    let changes: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| op.kind != OpKind::Equal)
        .map(|(idx, _)| idx)
        .collect();
    let Some(&first) = changes.first() else {
        return Vec::new();
    };

    // Group change indices whose context windows touch or overlap.
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut start = first;
    let mut end = first;
    for &idx in &changes[1..] {
        if idx - end > 2 * CONTEXT {
            ranges.push((start, end));
            start = idx;
        }
        end = idx;
    }
    ranges.push((start, end));

    ranges
        .into_iter()
        .map(|(start, end)| {
            let lo = start.saturating_sub(CONTEXT);
            let hi = (end + CONTEXT).min(ops.len() - 1);
            let window = &ops[lo..=hi];

            let mut lines = Vec::with_capacity(window.len());
            let (mut expected_len, mut actual_len) = (0, 0);
            for op in window {
                match op.kind {
                    OpKind::Equal => {
                        lines.push(DiffLine::Same(a[op.a].to_string()));
                        expected_len += 1;
                        actual_len += 1;
                    }
                    OpKind::Delete => {
                        lines.push(DiffLine::Removed(a[op.a].to_string()));
                        expected_len += 1;
                    }
                    OpKind::Insert => {
                        lines.push(DiffLine::Added(b[op.b].to_string()));
                        actual_len += 1;
                    }
                }
            }

            let head = window[0];
            Hunk {
                expected_start: if expected_len == 0 { head.a } else { head.a + 1 },
                expected_len,
                actual_start: if actual_len == 0 { head.b } else { head.b + 1 },
                actual_len,
                lines,
            }
        })
        .collect()
}
