//! Resampling of a memory profile into fixed windows.
//!
//! The requested sample range is split by `window_size` linearly spaced
//! integer edges into `window_size - 1` bins. Each bin reports the mean and
//! maximum memory of its samples and a compact summary of their stacks:
//! the prefix shared by all stacks plus the most frequent stack with that
//! prefix stripped.
//!
//! Bins are closed on the right: bin 0 holds `[edges[0], edges[1]]` and
//! every later bin `(edges[k], edges[k + 1]]`. The last edge is `end`, which
//! itself lies outside the range, so the last bin stops at `end - 1`.

use crate::profile::{ProfileSession, Sample};
use crate::utils::config::DEFAULT_WINDOW_SIZE;
use log::debug;
use serde::ser::{Serialize, SerializeTuple, Serializer};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

/// Compact description of the stacks that fell into one bin
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackSummary {
    /// Number of samples in the bin
    pub samples: usize,

    /// Longest frame sequence every non-empty stack starts with
    pub common_prefix: Vec<u64>,

    /// How often the most frequent stack occurred
    pub mode_count: usize,

    /// Most frequent stack, without the common prefix
    pub mode_suffix: Vec<u64>,
}

impl StackSummary {
    /// Summary of a bin without samples
    pub fn empty() -> Self {
        Self::default()
    }
}

impl Serialize for StackSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(4)?;
        tuple.serialize_element(&self.samples)?;
        tuple.serialize_element(&self.common_prefix)?;
        tuple.serialize_element(&self.mode_count)?;
        tuple.serialize_element(&self.mode_suffix)?;
        tuple.end()
    }
}

/// Per-bin series, all of the same length
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct MemoryWindows {
    /// Left edge of every bin
    pub x: Vec<usize>,
    pub mean: Vec<u64>,
    pub max: Vec<u64>,
    pub trace: Vec<StackSummary>,
}

impl MemoryWindows {
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Memory view of a session
#[derive(Debug, Clone, serde::Serialize)]
pub struct MemoryGraph {
    pub mem_profile: MemoryWindows,
    pub addr_name_map: BTreeMap<u64, String>,
}

/// Resample `[start, end)` of a session with the default window size
pub fn serialize_memory(session: &ProfileSession, start: i64, end: i64) -> MemoryGraph {
    serialize_memory_with_window(session, start, end, DEFAULT_WINDOW_SIZE)
}

pub fn serialize_memory_with_window(
    session: &ProfileSession,
    start: i64,
    end: i64,
    window_size: usize,
) -> MemoryGraph {
    MemoryGraph {
        mem_profile: resample(&session.samples, start, end, window_size),
        addr_name_map: session.addr_names.clone(),
    }
}

/// Bin the samples of `[start, end)` and reduce every bin
///
/// `start` and `end` are clamped to the sample range and `window_size` to
/// the length of the clamped range. With fewer than two edges there is no
/// bin and every series is empty.
pub fn resample(samples: &[Sample], start: i64, end: i64, window_size: usize) -> MemoryWindows {
    let start = start.max(0) as usize;
    let end = (end.max(0) as usize).min(samples.len());
    let span = end.saturating_sub(start);
    let window_size = window_size.min(span);

    debug!(
        "Resampling samples [{}, {}) into {} edges",
        start, end, window_size
    );

    if window_size < 2 {
        return MemoryWindows::default();
    }

    let edges = linspace_edges(start, end, window_size);
    let bins = edges.len() - 1;
    let mut windows = MemoryWindows {
        x: edges[..bins].to_vec(),
        mean: Vec::with_capacity(bins),
        max: Vec::with_capacity(bins),
        trace: Vec::with_capacity(bins),
    };

    for (k, bounds) in edges.windows(2).enumerate() {
        let members = bin_members(samples, k, bounds[0], bounds[1], end);

        let (mean, max) = mean_and_max(members);
        windows.mean.push(mean);
        windows.max.push(max);
        windows
            .trace
            .push(summarize_stacks(members.iter().map(|s| s.stack.as_slice())));
    }

    windows
}

/// Samples of bin `k` between edges `left` and `right`, never reaching `end`
fn bin_members(samples: &[Sample], k: usize, left: usize, right: usize, end: usize) -> &[Sample] {
    let first = if k == 0 { left } else { left + 1 };
    let last = right.min(end - 1);
    samples.get(first..=last).unwrap_or(&[])
}

/// `count` integer edges evenly spaced from `start` to `end` inclusive
///
/// Intermediate edges are truncated towards zero; the last edge is `end`.
pub fn linspace_edges(start: usize, end: usize, count: usize) -> Vec<usize> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) as f64 / (count - 1) as f64;
            (0..count)
                .map(|k| {
                    if k == count - 1 {
                        end
                    } else {
                        (start as f64 + k as f64 * step) as usize
                    }
                })
                .collect()
        }
    }
}

/// Truncated mean and maximum memory; `(0, 0)` for an empty bin
fn mean_and_max(members: &[Sample]) -> (u64, u64) {
    if members.is_empty() {
        return (0, 0);
    }
    let total: u128 = members.iter().map(|s| s.mem as u128).sum();
    let mean = (total / members.len() as u128) as u64;
    let max = members.iter().map(|s| s.mem).max().unwrap_or(0);
    (mean, max)
}

/// Summarize the stacks of one bin
///
/// The first stack seeds both the common prefix and the frequency table.
/// Later empty stacks are counted as samples but otherwise ignored. The
/// most frequent stack wins; on a tie the one seen first wins.
pub fn summarize_stacks<'a, I>(stacks: I) -> StackSummary
where
    I: IntoIterator<Item = &'a [u64]>,
{
    let mut stacks = stacks.into_iter();
    let Some(first) = stacks.next() else {
        return StackSummary::empty();
    };

    let mut samples = 1;
    let mut prefix: &[u64] = first;

    // counts in first-seen order, plus a slot index per distinct stack
    let mut counts: Vec<(&[u64], usize)> = vec![(first, 1)];
    let mut slots: HashMap<&[u64], usize> = HashMap::from([(first, 0)]);

    for stack in stacks {
        samples += 1;
        if stack.is_empty() {
            continue;
        }

        match slots.entry(stack) {
            Entry::Occupied(slot) => counts[*slot.get()].1 += 1,
            Entry::Vacant(slot) => {
                slot.insert(counts.len());
                counts.push((stack, 1));
            }
        }

        prefix = common_prefix(prefix, stack);
    }

    let (mode, mode_count) = counts
        .iter()
        .fold(counts[0], |best, &candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        });

    StackSummary {
        samples,
        common_prefix: prefix.to_vec(),
        mode_count,
        mode_suffix: mode[prefix.len()..].to_vec(),
    }
}

/// Longest sequence that starts both `a` and `b`
fn common_prefix<'a>(a: &'a [u64], b: &[u64]) -> &'a [u64] {
    let shared = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    &a[..shared]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarize(stacks: &[Vec<u64>]) -> StackSummary {
        summarize_stacks(stacks.iter().map(Vec::as_slice))
    }

    #[test]
    fn test_linspace_edges() {
        assert_eq!(linspace_edges(0, 10, 3), vec![0, 5, 10]);
        assert_eq!(linspace_edges(0, 10, 4), vec![0, 3, 6, 10]);
        assert_eq!(linspace_edges(5, 8, 3), vec![5, 6, 8]);
        assert_eq!(linspace_edges(2, 2, 1), vec![2]);
        assert!(linspace_edges(0, 10, 0).is_empty());
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix(&[1, 2, 3], &[1, 2, 4]), &[1, 2]);
        assert_eq!(common_prefix(&[1, 2, 3], &[1, 2]), &[1, 2]);
        assert_eq!(common_prefix(&[1], &[1, 2]), &[1]);
        assert_eq!(common_prefix(&[1, 2], &[3]), &[] as &[u64]);
    }

    #[test]
    fn test_summary_prefix_and_mode() {
        let summary = summarize(&[vec![1, 2, 3], vec![1, 2, 4], vec![1, 2, 4]]);
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.common_prefix, vec![1, 2]);
        assert_eq!(summary.mode_count, 2);
        assert_eq!(summary.mode_suffix, vec![4]);
    }

    #[test]
    fn test_summary_tie_keeps_first_seen() {
        let summary = summarize(&[vec![9, 1], vec![9, 2], vec![9, 2], vec![9, 1]]);
        assert_eq!(summary.mode_count, 2);
        assert_eq!(summary.mode_suffix, vec![1]);
    }

    #[test]
    fn test_summary_skips_later_empty_stacks() {
        let summary = summarize(&[vec![1, 2], vec![], vec![1, 3]]);
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.common_prefix, vec![1]);
        assert_eq!(summary.mode_count, 1);
        assert_eq!(summary.mode_suffix, vec![2]);
    }

    #[test]
    fn test_summary_empty_first_stack_clears_prefix() {
        let summary = summarize(&[vec![], vec![5, 6], vec![5, 6]]);
        assert_eq!(summary.common_prefix, Vec::<u64>::new());
        assert_eq!(summary.mode_count, 2);
        assert_eq!(summary.mode_suffix, vec![5, 6]);
    }

    #[test]
    fn test_summary_of_empty_bin() {
        let summary = summarize(&[]);
        assert_eq!(summary, StackSummary::empty());
        assert!(summary.common_prefix.is_empty());
        assert!(summary.mode_suffix.is_empty());
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!([0, [], 0, []])
        );
    }

    #[test]
    fn test_interior_edges_close_the_left_bin() {
        let data: Vec<Sample> = (1..=6).map(|mem| Sample::new(vec![1], mem)).collect();

        // edges 0, 3, 6
        assert_eq!(mean_and_max(bin_members(&data, 0, 0, 3, 6)), (2, 4));
        assert_eq!(bin_members(&data, 0, 0, 3, 6).len(), 4);
        assert_eq!(mean_and_max(bin_members(&data, 1, 3, 6, 6)), (5, 6));
        assert_eq!(bin_members(&data, 1, 3, 6, 6).len(), 2);
    }

    #[test]
    fn test_mean_is_truncated() {
        let members = vec![Sample::new(vec![], 1), Sample::new(vec![], 2)];
        assert_eq!(mean_and_max(&members), (1, 2));
    }
}
