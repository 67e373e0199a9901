//! Clip ordering and per-action grouping.

use matchcut_export_model::ClipSpec;

/// Indices of `clips` in ascending start-time order. Ties keep the
/// original relative order.
pub fn sort_by_start_time(clips: &[ClipSpec]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..clips.len()).collect();
    order.sort_by(|&a, &b| clips[a].start_time.total_cmp(&clips[b].start_time));
    order
}

/// Group clips by action name, preserving first-seen group order and
/// original relative order within each group.
pub fn group_by_action(clips: &[ClipSpec]) -> Vec<(String, Vec<&ClipSpec>)> {
    let mut groups: Vec<(String, Vec<&ClipSpec>)> = Vec::new();
    for clip in clips {
        match groups.iter_mut().find(|(name, _)| *name == clip.action_name) {
            Some((_, members)) => members.push(clip),
            None => groups.push((clip.action_name.clone(), vec![clip])),
        }
    }
    groups
}

/// Make an action name safe for use in an output file name.
pub fn sanitize_action_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if sanitized.is_empty() {
        "clip".to_string()
    } else {
        sanitized
    }
}
